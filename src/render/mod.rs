//! HTML rendering of classified messages.
//!
//! Every [`SegmentKind`] and [`BlockRole`] is matched exhaustively here, so a
//! new kind cannot be added without deciding how it renders.

pub(crate) mod templates;

use crate::markup::{classify, Block, BlockRole, Inline, Segment, SegmentKind};
use crate::math::MathDelegate;

use templates::{
    render, ContainerTemplate, ElementTemplate, LinkTemplate, ListTemplate, TableTemplate,
    TextTemplate,
};

/// Only these schemes become clickable links; anything else renders as text.
fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
}

fn container(tag: &str, class: &str, body: &str) -> String {
    render(&ContainerTemplate { tag, class, body })
}

/// Classifies and renders a whole assistant message.
pub fn render_message(text: &str, math: &MathDelegate) -> String {
    let body: String = classify(text).iter().map(|block| render_block(block, math)).collect();
    container("div", "chat-message", &body)
}

pub fn render_block(block: &Block, math: &MathDelegate) -> String {
    match &block.role {
        BlockRole::Math { latex } => container("div", "math-block", &math.render(latex, true)),
        BlockRole::Table { header, rows } => {
            let cells = |row: &[Inline]| -> Vec<String> {
                row.iter().map(|cell| render_inline(cell, math)).collect()
            };
            render(&TableTemplate {
                has_header: header.is_some(),
                header: header.as_deref().map(cells).unwrap_or_default(),
                rows: rows.iter().map(|row| cells(row)).collect(),
            })
        }
        BlockRole::Heading { level, content } => {
            container(&format!("h{level}"), "", &render_inline(content, math))
        }
        BlockRole::OrderedList { start, items } => render(&ListTemplate {
            tag: "ol",
            start: *start,
            items: render_items(items, math),
        }),
        BlockRole::BulletList { items } => render(&ListTemplate {
            tag: "ul",
            start: 1,
            items: render_items(items, math),
        }),
        BlockRole::LabeledSection { content } => {
            container("h4", "section", &render_inline(content, math))
        }
        BlockRole::IndentedParagraph { content } => {
            container("p", "indented", &render_inline(content, math))
        }
        BlockRole::Paragraph { content } => container("p", "", &render_inline(content, math)),
    }
}

fn render_items(items: &[Inline], math: &MathDelegate) -> Vec<String> {
    items.iter().map(|item| render_inline(item, math)).collect()
}

pub fn render_inline(inline: &Inline, math: &MathDelegate) -> String {
    inline.segments.iter().map(|segment| render_segment(segment, math)).collect()
}

pub fn render_segment(segment: &Segment, math: &MathDelegate) -> String {
    let content = segment.content.as_str();
    let element = |tag, class| render(&ElementTemplate { tag, class, content });
    match &segment.kind {
        SegmentKind::Text => render(&TextTemplate { content }),
        SegmentKind::Bold => element("strong", ""),
        SegmentKind::Italic => element("em", ""),
        SegmentKind::Code => element("code", ""),
        SegmentKind::Link { url } if is_safe_url(url) => {
            render(&LinkTemplate { url: url.trim(), label: content })
        }
        SegmentKind::Link { .. } => render(&TextTemplate { content }),
        SegmentKind::Money => element("span", "money"),
        SegmentKind::Percent => element("span", "percent"),
        SegmentKind::Rating => element("span", "rating"),
        // Both stay inline elements so they can sit inside a paragraph.
        SegmentKind::Math => math.render(content, false),
        SegmentKind::MathBlock => math.render(content, true),
    }
}
