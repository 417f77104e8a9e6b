//! Math delegate.
//!
//! Wraps a LaTeX renderer behind [`MathBackend`] and guarantees the caller
//! always gets markup back: failures turn into a visible inline error
//! fragment that shows the formula source.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::warn;

use crate::errors::MathRenderError;
use crate::render::templates::{render, ElementTemplate, MathErrorTemplate};

/// Renders normalized LaTeX into safe markup.
pub trait MathBackend: Send + Sync {
    fn render(&self, latex: &str, display_mode: bool) -> Result<String, MathRenderError>;
}

/// Fail-soft front door used by the renderer.
pub struct MathDelegate {
    backend: Box<dyn MathBackend>,
}

impl Default for MathDelegate {
    fn default() -> Self {
        Self::new(UnicodeMathBackend)
    }
}

impl MathDelegate {
    pub fn new(backend: impl MathBackend + 'static) -> Self {
        Self { backend: Box::new(backend) }
    }

    pub fn render(&self, latex: &str, display_mode: bool) -> String {
        let normalized = normalize(latex);
        match self.backend.render(&normalized, display_mode) {
            Ok(markup) => markup,
            Err(e) => {
                warn!(error = %e, display_mode, "math render failed, showing source");
                error_fragment(latex)
            }
        }
    }
}

/// Inline marker shown in place of a formula that could not be rendered.
pub fn error_fragment(source: &str) -> String {
    render(&MathErrorTemplate { source })
}

fn re_spaced_operator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*\\(times|geq|leq|approx)\b\s*")
            .expect("re_spaced_operator: pattern is valid and should always compile")
    })
}

fn re_bare_currency() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"R\$").expect("re_bare_currency: pattern is valid and should always compile")
    })
}

fn re_multi_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r" {2,}").expect("re_multi_space: pattern is valid and should always compile")
    })
}

/// Fixes the spacing slips common in model output before rendering:
/// relational operators get one space on each side and a bare `R$` is
/// escaped so the dollar is not read as a math delimiter.
pub fn normalize(latex: &str) -> String {
    let spaced = re_spaced_operator().replace_all(latex, |caps: &Captures<'_>| format!(" \\{} ", &caps[1]));
    let escaped = re_bare_currency().replace_all(&spaced, r"R\$$");
    re_multi_space().replace_all(escaped.trim(), " ").into_owned()
}

// ---------------------------------------------------------------------------
// Default backend
// ---------------------------------------------------------------------------

/// Converts LaTeX to a Unicode approximation with `unicodeit`, after
/// checking the brace structure and expanding constructs it does not handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeMathBackend;

impl MathBackend for UnicodeMathBackend {
    fn render(&self, latex: &str, display_mode: bool) -> Result<String, MathRenderError> {
        let latex = latex.trim();
        if latex.is_empty() {
            return Err(MathRenderError::Empty);
        }
        check_braces(latex)?;

        let expanded = expand_fallbacks(latex)?;
        let converted = unicodeit::replace(&expanded).replace(r"\$", "$");

        // Display math is still a span; block placement is up to the caller.
        let class = if display_mode { "math math-display" } else { "math math-inline" };
        Ok(render(&ElementTemplate { tag: "span", class, content: converted.trim() }))
    }
}

fn check_braces(latex: &str) -> Result<(), MathRenderError> {
    let mut depth = 0i32;
    let mut escaped = false;
    for ch in latex.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    if depth == 0 {
        Ok(())
    } else {
        Err(MathRenderError::UnbalancedBraces { source_text: latex.to_string() })
    }
}

/// Byte offset of the `}` closing a group whose `{` sits just before `s`.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

const COMMON_FRACTIONS: [(&str, &str); 6] = [
    (r"\frac{1}{2}", "½"),
    (r"\frac{1}{3}", "⅓"),
    (r"\frac{2}{3}", "⅔"),
    (r"\frac{1}{4}", "¼"),
    (r"\frac{3}{4}", "¾"),
    (r"\frac{1}{10}", "⅒"),
];

/// Parenthesizes a fraction or root operand made of more than one term.
fn group(operand: &str) -> String {
    let compound = operand.chars().any(|c| {
        c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '=' | '<' | '>' | '^' | '_' | '\\')
    });
    if compound {
        format!("({})", operand.trim())
    } else {
        operand.to_string()
    }
}

/// Expands `\frac{a}{b}` to `a/b`, `\sqrt{x}` to `√x` and `\text{t}` to `t`.
fn expand_fallbacks(latex: &str) -> Result<String, MathRenderError> {
    let mut result = latex.to_string();
    for (frac, glyph) in COMMON_FRACTIONS {
        result = result.replace(frac, glyph);
    }

    while let Some(start) = result.find(r"\frac") {
        let missing = || MathRenderError::MissingFractionArgument { source_text: latex.to_string() };
        let after = &result[start + r"\frac".len()..];
        let after = after.trim_start();
        if !after.starts_with('{') {
            return Err(missing());
        }
        let num_end = find_matching_brace(&after[1..]).ok_or_else(&missing)?;
        let numerator = group(&after[1..1 + num_end]);
        let rest = after[num_end + 2..].trim_start();
        let rest_offset = result.len() - rest.len();
        if !rest.starts_with('{') {
            return Err(missing());
        }
        let den_end = find_matching_brace(&rest[1..]).ok_or_else(&missing)?;
        let denominator = group(&rest[1..1 + den_end]);
        let full_end = rest_offset + den_end + 2;

        result = format!("{}{numerator}/{denominator}{}", &result[..start], &result[full_end..]);
    }

    while let Some(start) = result.find(r"\sqrt{") {
        let inner_start = start + r"\sqrt{".len();
        let Some(end) = find_matching_brace(&result[inner_start..]) else {
            return Err(MathRenderError::UnbalancedBraces { source_text: latex.to_string() });
        };
        let radicand = group(&result[inner_start..inner_start + end]);
        result = format!("{}√{radicand}{}", &result[..start], &result[inner_start + end + 1..]);
    }
    result = result.replace(r"\sqrt", "√");

    while let Some(start) = result.find(r"\text{") {
        let inner_start = start + r"\text{".len();
        let Some(end) = find_matching_brace(&result[inner_start..]) else {
            return Err(MathRenderError::UnbalancedBraces { source_text: latex.to_string() });
        };
        let inner = result[inner_start..inner_start + end].to_string();
        result = format!("{}{inner}{}", &result[..start], &result[inner_start + end + 1..]);
    }

    Ok(result)
}
