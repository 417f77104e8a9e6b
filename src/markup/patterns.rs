//! Compiled regular expressions shared by the tokenizer and the block
//! classifier.
//!
//! Each accessor uses a `OnceLock` to compile the pattern at most once.

use regex::Regex;
use std::sync::OnceLock;

use super::segment::SegmentKind;

// ---------------------------------------------------------------------------
// Inline rules
// ---------------------------------------------------------------------------

/// One entry of the inline priority list. Declaration order is the
/// tie-break for matches starting at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InlineRule {
    MathBlockBracket,
    MathInlineParen,
    MathBlockDollar,
    MathInlineDollar,
    Fraction,
    TextWrapper,
    Link,
    Bold,
    Italic,
    Code,
    Money,
    Percent,
    RatingFraction,
    RatingWords,
}

impl InlineRule {
    const ALL: [InlineRule; 14] = [
        InlineRule::MathBlockBracket,
        InlineRule::MathInlineParen,
        InlineRule::MathBlockDollar,
        InlineRule::MathInlineDollar,
        InlineRule::Fraction,
        InlineRule::TextWrapper,
        InlineRule::Link,
        InlineRule::Bold,
        InlineRule::Italic,
        InlineRule::Code,
        InlineRule::Money,
        InlineRule::Percent,
        InlineRule::RatingFraction,
        InlineRule::RatingWords,
    ];

    fn pattern(self) -> &'static str {
        match self {
            InlineRule::MathBlockBracket => r"(?s)\\\[(.*?)\\\]",
            InlineRule::MathInlineParen => r"\\\((.*?)\\\)",
            InlineRule::MathBlockDollar => r"(?s)\$\$(.*?)\$\$",
            InlineRule::MathInlineDollar => r"\$([^$]+)\$",
            InlineRule::Fraction => r"\\frac\{([^}]+)\}\{([^}]+)\}",
            InlineRule::TextWrapper => r"\\text\{([^}]+)\}",
            InlineRule::Link => r"\[([^\]]+)\]\(([^)]+)\)",
            InlineRule::Bold => r"\*\*([^*]+)\*\*",
            InlineRule::Italic => r"\*([^*]+)\*",
            InlineRule::Code => r"`([^`]+)`",
            InlineRule::Money => r"R\$\s*(\d[\d.,]*\d|\d)",
            InlineRule::Percent => r"(\d+(?:,\d+)?%)",
            InlineRule::RatingFraction => r"(\d+/\d+)",
            InlineRule::RatingWords => r"(\d+\s+em\s+\d+)",
        }
    }

    /// Builds the segment kind and payload from a successful match.
    pub(crate) fn extract(self, caps: &regex::Captures<'_>) -> (SegmentKind, String) {
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        match self {
            InlineRule::MathBlockBracket | InlineRule::MathBlockDollar => {
                (SegmentKind::MathBlock, group(1).to_string())
            }
            InlineRule::MathInlineParen | InlineRule::MathInlineDollar => {
                (SegmentKind::Math, group(1).to_string())
            }
            InlineRule::Fraction => {
                (SegmentKind::Math, format!("\\frac{{{}}}{{{}}}", group(1), group(2)))
            }
            InlineRule::TextWrapper => (SegmentKind::Math, format!("\\text{{{}}}", group(1))),
            InlineRule::Link => (
                SegmentKind::Link { url: group(2).to_string() },
                group(1).to_string(),
            ),
            InlineRule::Bold => (SegmentKind::Bold, group(1).to_string()),
            InlineRule::Italic => (SegmentKind::Italic, group(1).to_string()),
            InlineRule::Code => (SegmentKind::Code, group(1).to_string()),
            InlineRule::Money => (SegmentKind::Money, format!("R$ {}", group(1))),
            InlineRule::Percent => (SegmentKind::Percent, group(1).to_string()),
            InlineRule::RatingFraction | InlineRule::RatingWords => {
                (SegmentKind::Rating, group(1).to_string())
            }
        }
    }
}

/// A rule paired with its compiled regex.
pub(crate) struct InlinePattern {
    pub(crate) rule: InlineRule,
    pub(crate) regex: Regex,
}

/// The inline patterns in priority order.
pub(crate) fn inline_patterns() -> &'static [InlinePattern] {
    static PATTERNS: OnceLock<Vec<InlinePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        InlineRule::ALL
            .iter()
            .map(|&rule| InlinePattern {
                rule,
                regex: Regex::new(rule.pattern())
                    .expect("inline pattern is valid and should always compile"),
            })
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Block-level regexes
// ---------------------------------------------------------------------------

pub(crate) fn re_citation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"【[^】]*】").expect("re_citation: pattern is valid and should always compile")
    })
}

pub(crate) fn re_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:-{3,}|_{3,}|\*{3,})$")
            .expect("re_separator: pattern is valid and should always compile")
    })
}

pub(crate) fn re_math_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z\s]*=\s*\\?frac|^[0-9,.\s]+\s*[+\-×]\s*[0-9,.\s]+|^[A-Za-z]\s*\\(?:leq|geq|times)",
        )
        .expect("re_math_line: pattern is valid and should always compile")
    })
}

pub(crate) fn re_equals() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*=\s*").expect("re_equals: pattern is valid and should always compile")
    })
}

pub(crate) fn re_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^(#{1,6})[ \t]+([^\n]+?)[ \t]*(?:\n(.*))?$")
            .expect("re_heading: pattern is valid and should always compile")
    })
}

pub(crate) fn re_ordered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\.\s(.+)$")
            .expect("re_ordered_item: pattern is valid and should always compile")
    })
}

pub(crate) fn re_bullet_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[-*•] (\S.*)$")
            .expect("re_bullet_item: pattern is valid and should always compile")
    })
}

pub(crate) fn re_labeled_section() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\*\*[^*]+\*\*:")
            .expect("re_labeled_section: pattern is valid and should always compile")
    })
}

pub(crate) fn re_dash_cell() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^:?-+:?$").expect("re_dash_cell: pattern is valid and should always compile")
    })
}
