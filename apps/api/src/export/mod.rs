//! Export formatter: deterministic rich-text and plain-text renderings.
//!
//! Output depends on the document only. No timestamps, ids or map
//! iteration order leak in, so two calls on the same document are
//! byte-identical.

pub mod html;
pub mod text;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::editor::ports::{Clipboard, ClipboardError};
use crate::markdown::to_markdown;
use crate::models::resume::{ContactInfo, ResumeDocument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPayload {
    pub rich_text: String,
    pub plain_text: String,
}

pub fn serialize(doc: &ResumeDocument) -> ExportPayload {
    ExportPayload {
        rich_text: html::render_fragment(doc),
        plain_text: text::render_plain(doc),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Html,
    Text,
    Markdown,
    Docx,
    Pdf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVariant {
    #[default]
    Classic,
    Compact,
}

impl LayoutVariant {
    pub fn stylesheet(self) -> &'static str {
        match self {
            LayoutVariant::Classic => {
                "body{font-family:Georgia,serif;font-size:11pt;line-height:1.4;max-width:8in;margin:0.75in auto;}"
            }
            LayoutVariant::Compact => {
                "body{font-family:Helvetica,Arial,sans-serif;font-size:9.5pt;line-height:1.2;max-width:8in;margin:0.5in auto;}ul{margin:2pt 0;}"
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("{0:?} export is produced by the document rendering service")]
    Unsupported(ExportFormat),
}

/// A downloadable export body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExport {
    pub content_type: &'static str,
    pub extension: &'static str,
    pub body: String,
}

pub fn render(
    doc: &ResumeDocument,
    format: ExportFormat,
    layout: LayoutVariant,
) -> Result<RenderedExport, ExportError> {
    match format {
        ExportFormat::Html => Ok(RenderedExport {
            content_type: "text/html; charset=utf-8",
            extension: "html",
            body: html::render_document(doc, layout),
        }),
        ExportFormat::Text => Ok(RenderedExport {
            content_type: "text/plain; charset=utf-8",
            extension: "txt",
            body: text::render_plain(doc),
        }),
        ExportFormat::Markdown => Ok(RenderedExport {
            content_type: "text/markdown; charset=utf-8",
            extension: "md",
            body: to_markdown(doc),
        }),
        ExportFormat::Docx | ExportFormat::Pdf => Err(ExportError::Unsupported(format)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    RichText,
    /// The platform refused the HTML payload; plain text was written instead.
    PlainTextFallback,
}

/// Writes both formats, falling back to plain text if the rich write is
/// rejected.
pub fn copy_to_clipboard(
    doc: &ResumeDocument,
    clipboard: &mut dyn Clipboard,
) -> Result<CopyOutcome, ClipboardError> {
    let payload = serialize(doc);
    match clipboard.write_rich(&payload.rich_text, &payload.plain_text) {
        Ok(()) => Ok(CopyOutcome::RichText),
        Err(e) => {
            warn!("Rich clipboard write failed ({e}); falling back to plain text");
            clipboard.write_plain(&payload.plain_text)?;
            Ok(CopyOutcome::PlainTextFallback)
        }
    }
}

pub(crate) fn contact_line(contact: &ContactInfo) -> Vec<String> {
    contact
        .email
        .iter()
        .chain(contact.phone.iter())
        .chain(contact.location.iter())
        .chain(contact.links.iter())
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect()
}

pub(crate) fn date_range(start: &str, end: Option<&str>) -> String {
    let end = end.unwrap_or("Present");
    if start.trim().is_empty() {
        return if end == "Present" {
            String::new()
        } else {
            end.to_string()
        };
    }
    format!("{start} - {end}")
}
