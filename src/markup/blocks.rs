//! Block-level classification.
//!
//! A message is split on blank lines; each chunk gets exactly one
//! [`BlockRole`]. Classification never fails: anything that does not fit a
//! structured role ends up as a paragraph.

use serde::Serialize;

use super::patterns::{
    re_bullet_item, re_citation, re_dash_cell, re_equals, re_heading, re_labeled_section,
    re_math_line, re_ordered_item, re_separator,
};
use super::segment::Segment;
use super::tokenizer::tokenize;

/// A piece of inline text together with its tokenized segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inline {
    pub raw: String,
    pub segments: Vec<Segment>,
}

impl Inline {
    pub fn parse(raw: &str) -> Self {
        Self { raw: raw.to_string(), segments: tokenize(raw) }
    }
}

/// Structural role of a block, carrying its tokenized children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockRole {
    /// A line that is a formula on its own, rendered in display mode.
    Math { latex: String },
    Table { header: Option<Vec<Inline>>, rows: Vec<Vec<Inline>> },
    Heading { level: u8, content: Inline },
    OrderedList { start: u32, items: Vec<Inline> },
    BulletList { items: Vec<Inline> },
    /// `**Label**: ...` rendered as a minor heading.
    LabeledSection { content: Inline },
    IndentedParagraph { content: Inline },
    Paragraph { content: Inline },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub raw_text: String,
    pub role: BlockRole,
}

impl Block {
    fn new(raw_text: &str, role: BlockRole) -> Self {
        Self { raw_text: raw_text.to_string(), role }
    }
}

/// Removes `【…】` source annotations.
pub fn strip_citations(message: &str) -> String {
    re_citation().replace_all(message, "").into_owned()
}

/// True for pure horizontal rules (`---`, `***`, `___` and longer).
pub fn is_separator(block: &str) -> bool {
    re_separator().is_match(block.trim())
}

/// Splits `message` into classified blocks, in source order.
pub fn classify(message: &str) -> Vec<Block> {
    let cleaned = strip_citations(&message.replace("\r\n", "\n"));
    let mut blocks = Vec::new();

    for chunk in cleaned.trim().split("\n\n") {
        let trimmed = chunk.trim();
        if trimmed.is_empty() || is_separator(trimmed) {
            continue;
        }
        classify_block(trimmed, &mut blocks);
    }

    blocks
}

fn classify_block(block: &str, out: &mut Vec<Block>) {
    if re_math_line().is_match(block) {
        let latex = re_equals().replace_all(block, " = ").into_owned();
        out.push(Block::new(block, BlockRole::Math { latex }));
        return;
    }

    if let Some(role) = parse_table(block) {
        out.push(Block::new(block, role));
        return;
    }

    if let Some(caps) = re_heading().captures(block) {
        let level = caps.get(1).map(|m| m.as_str().len()).unwrap_or(1) as u8;
        let text = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let first_line = block.lines().next().unwrap_or(block);
        out.push(Block::new(
            first_line,
            BlockRole::Heading { level, content: Inline::parse(text) },
        ));
        if let Some(trailing) = caps.get(3).map(|m| m.as_str().trim()) {
            if !trailing.is_empty() {
                out.push(Block::new(
                    trailing,
                    BlockRole::Paragraph { content: Inline::parse(trailing) },
                ));
            }
        }
        return;
    }

    let first_line = block.lines().next().unwrap_or_default();

    if let Some(caps) = re_ordered_item().captures(first_line) {
        let start = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
        let items = fold_items(block, |line| {
            re_ordered_item()
                .captures(line)
                .and_then(|c| c.get(2))
                .map(|m| m.as_str().to_string())
        });
        if !items.is_empty() {
            out.push(Block::new(block, BlockRole::OrderedList { start, items }));
            return;
        }
    }

    if re_bullet_item().is_match(first_line) {
        let items = fold_items(block, |line| {
            re_bullet_item()
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        });
        if !items.is_empty() {
            out.push(Block::new(block, BlockRole::BulletList { items }));
            return;
        }
    }

    if re_labeled_section().is_match(block) {
        out.push(Block::new(block, BlockRole::LabeledSection { content: Inline::parse(block) }));
        return;
    }

    if let Some(rest) = block.strip_prefix("- ") {
        out.push(Block::new(
            block,
            BlockRole::IndentedParagraph { content: Inline::parse(rest.trim()) },
        ));
        return;
    }

    out.push(Block::new(block, BlockRole::Paragraph { content: Inline::parse(block) }));
}

/// Groups lines into list items. `marker` returns the item text when a line
/// opens a new item; other non-empty lines are folded into the previous item.
fn fold_items(block: &str, marker: impl Fn(&str) -> Option<String>) -> Vec<Inline> {
    let mut items: Vec<String> = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match marker(line) {
            Some(text) => items.push(text),
            None => {
                if let Some(last) = items.last_mut() {
                    last.push(' ');
                    last.push_str(line);
                }
            }
        }
    }
    items.iter().map(|item| Inline::parse(item.trim())).collect()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn parse_table(block: &str) -> Option<BlockRole> {
    if !block.contains(" | ") || !block.lines().all(|line| line.contains('|')) {
        return None;
    }

    let rows: Vec<Vec<String>> = block
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_table_cells)
        .collect();

    let has_separator = rows.len() > 1
        && !rows[1].is_empty()
        && rows[1].iter().all(|cell| re_dash_cell().is_match(cell));

    let to_inline = |row: &Vec<String>| row.iter().map(|cell| Inline::parse(cell)).collect::<Vec<_>>();

    let (header, body) = if has_separator {
        (Some(to_inline(&rows[0])), &rows[2..])
    } else {
        (None, &rows[..])
    };

    Some(BlockRole::Table { header, rows: body.iter().map(to_inline).collect() })
}

/// Splits a row on `|`, dropping the empty cells produced by edge pipes.
fn parse_table_cells(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = line.trim().split('|').map(|c| c.trim().to_string()).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}
