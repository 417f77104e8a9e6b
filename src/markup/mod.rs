//! Assistant text → typed, renderable structure.
//!
//! [`classify`] splits a message into [`Block`]s; the text inside each block
//! is run through [`tokenize`] independently. Both are pure.

pub mod blocks;
mod patterns;
pub mod segment;
pub mod tokenizer;

pub use blocks::{classify, is_separator, strip_citations, Block, BlockRole, Inline};
pub use segment::{Segment, SegmentKind};
pub use tokenizer::tokenize;
