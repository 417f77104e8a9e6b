//! Inline tokenizer.
//!
//! Scans a string left to right. At each step every inline pattern is tried
//! against the unconsumed suffix; the match with the smallest start offset
//! wins, and on equal offsets the pattern declared first in
//! [`InlineRule`](super::patterns::InlineRule) wins. Text before the match is
//! emitted as a `text` segment unless it is whitespace only.

use super::patterns::{inline_patterns, InlinePattern};
use super::segment::Segment;

/// Tokenizes `text` into an ordered sequence of segments.
pub fn tokenize(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut counter = 0usize;
    let mut pos = 0usize;

    while pos < text.len() {
        let rest = &text[pos..];

        let Some((pattern, caps)) = earliest_match(rest) else {
            push_text(&mut segments, &mut counter, text, pos..text.len());
            break;
        };

        // Group 0 is always present after a successful match.
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        let start = pos + whole.start;
        let end = pos + whole.end;

        push_text(&mut segments, &mut counter, text, pos..start);

        let (kind, content) = pattern.rule.extract(&caps);
        segments.push(Segment::new(kind, content, counter, start..end));
        counter += 1;

        // Every inline pattern consumes at least one character.
        pos = end;
    }

    segments
}

fn earliest_match(rest: &str) -> Option<(&'static InlinePattern, regex::Captures<'_>)> {
    let mut best: Option<(&'static InlinePattern, regex::Captures<'_>)> = None;
    for pattern in inline_patterns() {
        let Some(caps) = pattern.regex.captures(rest) else {
            continue;
        };
        let start = caps.get(0).map(|m| m.start()).unwrap_or(usize::MAX);
        let better = match &best {
            Some((_, current)) => start < current.get(0).map(|m| m.start()).unwrap_or(usize::MAX),
            None => true,
        };
        if better {
            best = Some((pattern, caps));
        }
    }
    best
}

fn push_text(segments: &mut Vec<Segment>, counter: &mut usize, text: &str, range: std::ops::Range<usize>) {
    let slice = &text[range.clone()];
    if slice.trim().is_empty() {
        return;
    }
    segments.push(Segment::text(slice, *counter, range));
    *counter += 1;
}
