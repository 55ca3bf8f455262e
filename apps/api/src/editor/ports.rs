//! Side-effect capabilities injected into the editing engine.
//!
//! The engine never reaches for a global clipboard, toast queue or HTTP
//! client; callers hand it implementations of these traits.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::resume::{ResumeRecord, Revision, SaveResumeRequest, SaveResumeResponse};

// ────────────────────────────────────────────────────────────────────────────
// Save endpoint
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SaveError {
    #[error("revision conflict: server is at {current}")]
    Conflict { current: Revision },

    #[error("network error: {0}")]
    Network(String),

    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("resume {0} not found")]
    NotFound(Uuid),
}

/// The remote store the autosave coordinator writes to.
#[async_trait]
pub trait SaveBackend: Send + Sync {
    async fn save(
        &self,
        resume_id: Uuid,
        request: &SaveResumeRequest,
    ) -> Result<SaveResumeResponse, SaveError>;

    async fn fetch(&self, resume_id: Uuid) -> Result<ResumeRecord, SaveError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Notifications
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
    /// Needs an explicit user choice; never dismissed automatically.
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Conflict,
            message: message.into(),
        }
    }
}

/// Transient user-facing messages (toasts).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Routes notices to the log. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
            NoticeLevel::Conflict => warn!("{}", notice.message),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Clipboard
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("clipboard rejected rich text payload: {0}")]
    RichTextRejected(String),

    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

pub trait Clipboard {
    /// Writes HTML with a plain-text alternative in one clipboard item.
    fn write_rich(&mut self, html: &str, plain: &str) -> Result<(), ClipboardError>;

    fn write_plain(&mut self, plain: &str) -> Result<(), ClipboardError>;
}
