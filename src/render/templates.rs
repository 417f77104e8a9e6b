//! Askama templates for chat markup. Plain text goes through askama's HTML
//! escaping; only fragments that were themselves produced by a template are
//! passed with `|safe`.

use askama::Template;
use tracing::error;

/// Escaped text, no wrapper.
#[derive(Template)]
#[template(source = "{{ content }}", ext = "html")]
pub(crate) struct TextTemplate<'a> {
    pub content: &'a str,
}

/// Escaped text inside a single element.
#[derive(Template)]
#[template(
    source = r#"<{{ tag }}{% if !class.is_empty() %} class="{{ class }}"{% endif %}>{{ content }}</{{ tag }}>"#,
    ext = "html"
)]
pub(crate) struct ElementTemplate<'a> {
    pub tag: &'a str,
    pub class: &'a str,
    pub content: &'a str,
}

/// Already rendered markup inside a single element.
#[derive(Template)]
#[template(
    source = r#"<{{ tag }}{% if !class.is_empty() %} class="{{ class }}"{% endif %}>{{ body|safe }}</{{ tag }}>"#,
    ext = "html"
)]
pub(crate) struct ContainerTemplate<'a> {
    pub tag: &'a str,
    pub class: &'a str,
    pub body: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<a href="{{ url }}" target="_blank" rel="noopener noreferrer">{{ label }}</a>"#,
    ext = "html"
)]
pub(crate) struct LinkTemplate<'a> {
    pub url: &'a str,
    pub label: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<{{ tag }}{% if start != 1 %} start="{{ start }}"{% endif %}>{% for item in items %}<li>{{ item|safe }}</li>{% endfor %}</{{ tag }}>"#,
    ext = "html"
)]
pub(crate) struct ListTemplate<'a> {
    pub tag: &'a str,
    pub start: u32,
    pub items: Vec<String>,
}

#[derive(Template)]
#[template(
    source = r#"<table class="chat-table">{% if has_header %}<thead><tr>{% for cell in header %}<th>{{ cell|safe }}</th>{% endfor %}</tr></thead>{% endif %}<tbody>{% for row in rows %}<tr>{% for cell in row %}<td>{{ cell|safe }}</td>{% endfor %}</tr>{% endfor %}</tbody></table>"#,
    ext = "html"
)]
pub(crate) struct TableTemplate {
    pub has_header: bool,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Template)]
#[template(
    source = r#"<span class="math-error">Erro ao renderizar fórmula: {{ source }}</span>"#,
    ext = "html"
)]
pub(crate) struct MathErrorTemplate<'a> {
    pub source: &'a str,
}

/// Renders `template`, logging and yielding nothing if askama fails.
pub(crate) fn render(template: &impl Template) -> String {
    template.render().unwrap_or_else(|e| {
        error!("Template rendering failed: {e}");
        String::new()
    })
}
