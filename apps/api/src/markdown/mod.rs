//! Markdown-like resume source format.
//!
//! Parsing is line oriented: the lexer classifies every line, the parser
//! assembles sections and rejects anything it cannot place. Input that
//! fails to parse can still be kept verbatim through [`parse_or_raw`].

pub mod lexer;
pub mod parser;
pub mod writer;

use tracing::warn;

pub use parser::{parse, ParseError};
pub use writer::to_markdown;

use crate::models::resume::ResumeDocument;

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    Structured(ResumeDocument),
    /// The original text, with the error that prevented structuring it.
    Raw { text: String, error: ParseError },
}

pub fn parse_or_raw(input: &str) -> ParsedContent {
    match parse(input) {
        Ok(doc) => ParsedContent::Structured(doc),
        Err(error) => {
            warn!("Resume source kept as raw text: {error}");
            ParsedContent::Raw {
                text: input.to_string(),
                error,
            }
        }
    }
}
