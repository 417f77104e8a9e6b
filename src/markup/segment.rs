use std::ops::Range;

use serde::Serialize;

/// What a [`Segment`] is, and so how the host must render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SegmentKind {
    Text,
    Bold,
    Italic,
    Code,
    Link { url: String },
    Money,
    Percent,
    Rating,
    Math,
    MathBlock,
}

impl SegmentKind {
    /// Prefix used when building segment keys.
    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::Text => "text",
            SegmentKind::Bold => "bold",
            SegmentKind::Italic => "italic",
            SegmentKind::Code => "code",
            SegmentKind::Link { .. } => "link",
            SegmentKind::Money => "money",
            SegmentKind::Percent => "percent",
            SegmentKind::Rating => "rating",
            SegmentKind::Math => "math",
            SegmentKind::MathBlock => "mathBlock",
        }
    }
}

/// Smallest renderable unit of inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Payload with delimiter syntax stripped.
    pub content: String,
    /// Unique within one tokenize pass.
    pub key: String,
    /// Byte range of the source string this segment consumed.
    pub span: Range<usize>,
}

impl Segment {
    pub fn new(kind: SegmentKind, content: impl Into<String>, counter: usize, span: Range<usize>) -> Self {
        let key = format!("{}-{counter}", kind.label());
        Self { kind, content: content.into(), key, span }
    }

    pub fn text(content: impl Into<String>, counter: usize, span: Range<usize>) -> Self {
        Self::new(SegmentKind::Text, content, counter, span)
    }
}
