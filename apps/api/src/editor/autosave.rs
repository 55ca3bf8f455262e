//! Autosave / conflict coordinator.
//!
//! State flow:
//!
//! ```text
//! Saved ──edit──▶ Unsaved ──debounce elapsed──▶ Saving ─┬─ok──────▶ Saved
//!                    ▲                                  ├─error───▶ Unsaved
//!                    └──────────────────────────────────┘
//!                                                       └─stale───▶ Conflict
//! ```
//!
//! `Saving` doubles as the mutual-exclusion flag: at most one save per
//! document is in flight. An in-flight save is never cancelled; its result
//! applies when it resolves, even if newer edits landed meanwhile.
//! Failed saves are not retried on a schedule. The next edit rearms the
//! debounce, or the user saves manually.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::ports::{Notice, Notifier, SaveBackend, SaveError};
use crate::editor::state::DocumentEditor;
use crate::models::resume::{Revision, SaveResumeRequest, SaveResumeResponse};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Saved,
    Unsaved,
    Saving,
    Conflict,
}

/// How the user chose to settle a revision conflict. There is no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Re-save the local document over the server's newer revision.
    KeepLocal,
    /// Drop local edits and reload the server's document.
    DiscardLocal,
}

/// A save that has been started but not yet completed.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub resume_id: Uuid,
    pub request: SaveResumeRequest,
    /// Editor generation captured when the ticket was cut.
    pub generation: u64,
}

pub struct AutosaveCoordinator {
    resume_id: Uuid,
    status: SaveStatus,
    revision: Revision,
    match_score: Option<f64>,
    debounce: Duration,
    deadline: Option<Instant>,
    last_error: Option<SaveError>,
    notifier: Arc<dyn Notifier>,
}

impl AutosaveCoordinator {
    pub fn new(
        resume_id: Uuid,
        revision: Revision,
        debounce: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resume_id,
            status: SaveStatus::Saved,
            revision,
            match_score: None,
            debounce,
            deadline: None,
            last_error: None,
            notifier,
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn last_error(&self) -> Option<&SaveError> {
        self.last_error.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Score sent along with the next save.
    pub fn set_match_score(&mut self, score: Option<f64>) {
        self.match_score = score;
    }

    /// Takes the server's token after a clean reload. Ignored unless the
    /// coordinator is `Saved`.
    pub fn adopt_revision(&mut self, revision: Revision) -> bool {
        if self.status != SaveStatus::Saved {
            return false;
        }
        self.revision = revision;
        true
    }

    /// Call after every dirty-marking edit. Restarts the debounce window.
    pub fn note_edit(&mut self, now: Instant) {
        if self.status == SaveStatus::Saved {
            self.status = SaveStatus::Unsaved;
        }
        self.deadline = Some(now + self.debounce);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.status == SaveStatus::Unsaved && self.deadline.is_some_and(|at| now >= at)
    }

    /// Starts a save if one is allowed. `force` is only for accepting the
    /// local side of a conflict.
    pub fn begin_save(&mut self, editor: &DocumentEditor, force: bool) -> Option<SaveTicket> {
        match self.status {
            SaveStatus::Saving => {
                debug!("save already in flight for resume {}", self.resume_id);
                return None;
            }
            SaveStatus::Conflict if !force => return None,
            _ => {}
        }
        if !editor.is_dirty() && self.status != SaveStatus::Conflict {
            return None;
        }

        self.status = SaveStatus::Saving;
        self.deadline = None;
        Some(SaveTicket {
            resume_id: self.resume_id,
            request: SaveResumeRequest {
                document: editor.document().clone(),
                revision: self.revision.clone(),
                match_score: self.match_score,
            },
            generation: editor.generation(),
        })
    }

    /// Applies the server's answer for `ticket`.
    pub fn complete_save(
        &mut self,
        editor: &mut DocumentEditor,
        ticket: SaveTicket,
        outcome: Result<SaveResumeResponse, SaveError>,
    ) -> SaveStatus {
        match outcome {
            Ok(ack) => {
                info!(
                    "Saved resume {} at revision {}",
                    ticket.resume_id, ack.revision
                );
                self.revision = ack.revision;
                self.last_error = None;
                self.status = if editor.mark_saved(ticket.generation) {
                    SaveStatus::Saved
                } else {
                    // Edits arrived while in flight; their debounce stays armed.
                    SaveStatus::Unsaved
                };
            }
            Err(SaveError::Conflict { current }) => {
                warn!(
                    "Revision conflict on resume {}: sent {}, server at {}",
                    ticket.resume_id, ticket.request.revision, current
                );
                self.notifier.notify(Notice::conflict(
                    "This resume was changed elsewhere. Keep your version or reload the saved one.",
                ));
                self.last_error = Some(SaveError::Conflict {
                    current: current.clone(),
                });
                self.revision = current;
                self.status = SaveStatus::Conflict;
                self.deadline = None;
            }
            Err(e) => {
                warn!("Save failed for resume {}: {e}", ticket.resume_id);
                self.notifier
                    .notify(Notice::error(format!("Could not save your changes: {e}")));
                self.last_error = Some(e);
                self.status = SaveStatus::Unsaved;
            }
        }
        self.status
    }

    /// Manual save. Does nothing when there is nothing dirty and no conflict
    /// pending; with a conflict pending it re-saves the local document over
    /// the server's revision, same as `ConflictResolution::KeepLocal`.
    pub async fn save_now(
        &mut self,
        editor: &mut DocumentEditor,
        backend: &dyn SaveBackend,
    ) -> SaveStatus {
        let force = self.status == SaveStatus::Conflict;
        if force {
            info!("Manual save overrides conflict on resume {}", self.resume_id);
        }
        self.run_save(editor, backend, force).await
    }

    /// Fires the debounced save once its window has elapsed.
    pub async fn tick(
        &mut self,
        editor: &mut DocumentEditor,
        backend: &dyn SaveBackend,
        now: Instant,
    ) -> SaveStatus {
        if !self.is_due(now) {
            return self.status;
        }
        self.run_save(editor, backend, false).await
    }

    pub async fn resolve_conflict(
        &mut self,
        resolution: ConflictResolution,
        editor: &mut DocumentEditor,
        backend: &dyn SaveBackend,
    ) -> SaveStatus {
        if self.status != SaveStatus::Conflict {
            return self.status;
        }
        match resolution {
            ConflictResolution::KeepLocal => self.run_save(editor, backend, true).await,
            ConflictResolution::DiscardLocal => match backend.fetch(self.resume_id).await {
                Ok(record) => {
                    editor.discard_and_replace(record.document);
                    self.revision = record.revision;
                    self.status = SaveStatus::Saved;
                    self.last_error = None;
                    self.deadline = None;
                    self.notifier
                        .notify(Notice::info("Reloaded the saved version."));
                    self.status
                }
                Err(e) => {
                    warn!("Reload failed for resume {}: {e}", self.resume_id);
                    self.notifier
                        .notify(Notice::error(format!("Could not reload: {e}")));
                    self.status
                }
            },
        }
    }

    /// Best-effort save when the editor is closing. Spawns the request and
    /// returns without waiting; the outcome is only logged.
    pub fn flush_on_close(
        &mut self,
        editor: &DocumentEditor,
        backend: Arc<dyn SaveBackend>,
    ) -> bool {
        if !editor.is_dirty() || self.status != SaveStatus::Unsaved {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; skipping save-on-close");
            return false;
        };
        let resume_id = self.resume_id;
        let request = SaveResumeRequest {
            document: editor.document().clone(),
            revision: self.revision.clone(),
            match_score: self.match_score,
        };
        runtime.spawn(async move {
            match backend.save(resume_id, &request).await {
                Ok(ack) => info!("Save-on-close stored resume {resume_id} at {}", ack.revision),
                Err(e) => warn!("Save-on-close failed for resume {resume_id}: {e}"),
            }
        });
        true
    }

    async fn run_save(
        &mut self,
        editor: &mut DocumentEditor,
        backend: &dyn SaveBackend,
        force: bool,
    ) -> SaveStatus {
        let Some(ticket) = self.begin_save(editor, force) else {
            return self.status;
        };
        let outcome = backend.save(ticket.resume_id, &ticket.request).await;
        self.complete_save(editor, ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ports::testing::{RecordingNotifier, ScriptedBackend};
    use crate::editor::ports::NoticeLevel;
    use crate::editor::state::DocumentPatch;
    use crate::models::resume::fixtures::sample_document;
    use crate::models::resume::ResumeRecord;

    struct Harness {
        editor: DocumentEditor,
        coordinator: AutosaveCoordinator,
        backend: Arc<ScriptedBackend>,
        notifier: Arc<RecordingNotifier>,
        start: Instant,
    }

    fn harness(revision: &str) -> Harness {
        let notifier = Arc::new(RecordingNotifier::default());
        Harness {
            editor: DocumentEditor::new(sample_document(), 10),
            coordinator: AutosaveCoordinator::new(
                Uuid::new_v4(),
                Revision::new(revision),
                DEFAULT_DEBOUNCE,
                notifier.clone(),
            ),
            backend: Arc::new(ScriptedBackend::default()),
            notifier,
            start: Instant::now(),
        }
    }

    /// Edits the summary `offset` after the harness clock start.
    fn edit_summary(h: &mut Harness, text: &str, offset: Duration) {
        h.editor.update(DocumentPatch {
            summary: Some(text.to_string()),
            ..Default::default()
        });
        let at = h.start + offset;
        h.coordinator.note_edit(at);
    }

    #[tokio::test]
    async fn test_debounced_save_transitions_to_saved() {
        let mut h = harness("v1");
        edit_summary(&mut h, "edited", Duration::ZERO);
        assert_eq!(h.coordinator.status(), SaveStatus::Unsaved);

        let early = h.start + Duration::from_millis(500);
        let status = h.coordinator.tick(&mut h.editor, h.backend.as_ref(), early).await;
        assert_eq!(status, SaveStatus::Unsaved);
        assert_eq!(h.backend.save_count(), 0);

        let late = h.start + DEFAULT_DEBOUNCE;
        let status = h.coordinator.tick(&mut h.editor, h.backend.as_ref(), late).await;
        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(h.coordinator.revision().as_str(), "v2");
        assert!(!h.editor.is_dirty());
    }

    #[tokio::test]
    async fn test_new_edit_restarts_debounce() {
        let mut h = harness("v1");
        edit_summary(&mut h, "a", Duration::ZERO);
        let second = h.start + Duration::from_millis(1500);
        edit_summary(&mut h, "b", Duration::from_millis(1500));

        let first_deadline = h.start + DEFAULT_DEBOUNCE;
        assert!(!h.coordinator.is_due(first_deadline));
        assert!(h.coordinator.is_due(second + DEFAULT_DEBOUNCE));
    }

    #[tokio::test]
    async fn test_stale_revision_enters_conflict_without_touching_document() {
        let mut h = harness("v1");
        h.backend.push_outcome(Err(SaveError::Conflict {
            current: Revision::new("v2"),
        }));
        edit_summary(&mut h, "local edit", Duration::ZERO);
        let before = h.editor.document().clone();

        let status = h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;

        assert_eq!(status, SaveStatus::Conflict);
        assert_eq!(*h.editor.document(), before);
        assert!(h.editor.is_dirty());
        assert_eq!(h.coordinator.revision().as_str(), "v2");
        assert_eq!(h.notifier.levels(), vec![NoticeLevel::Conflict]);
    }

    #[tokio::test]
    async fn test_conflict_blocks_autosave_until_resolved() {
        let mut h = harness("v1");
        h.backend.push_outcome(Err(SaveError::Conflict {
            current: Revision::new("v2"),
        }));
        edit_summary(&mut h, "local", Duration::ZERO);
        h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;

        edit_summary(&mut h, "more local", Duration::ZERO);
        let status = h
            .coordinator
            .tick(&mut h.editor, h.backend.as_ref(), h.start + DEFAULT_DEBOUNCE)
            .await;
        assert_eq!(status, SaveStatus::Conflict);
        assert_eq!(h.backend.save_count(), 1);

    }

    #[tokio::test]
    async fn test_manual_save_during_conflict_overwrites_server() {
        let mut h = harness("v1");
        h.backend.push_outcome(Err(SaveError::Conflict {
            current: Revision::new("v2"),
        }));
        edit_summary(&mut h, "local", Duration::ZERO);
        h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;
        assert_eq!(h.coordinator.status(), SaveStatus::Conflict);

        let status = h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;

        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(h.backend.save_count(), 2);
        let saves = h.backend.saves.lock().unwrap();
        assert_eq!(saves[1].revision.as_str(), "v2");
        assert_eq!(saves[1].document.summary.as_deref(), Some("local"));
        drop(saves);
        assert_eq!(h.coordinator.revision().as_str(), "v3");
        assert!(!h.editor.is_dirty());
    }

    #[tokio::test]
    async fn test_keep_local_resaves_with_adopted_token() {
        let mut h = harness("v1");
        h.backend.push_outcome(Err(SaveError::Conflict {
            current: Revision::new("v2"),
        }));
        edit_summary(&mut h, "mine", Duration::ZERO);
        h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;

        let status = h
            .coordinator
            .resolve_conflict(
                ConflictResolution::KeepLocal,
                &mut h.editor,
                h.backend.as_ref(),
            )
            .await;

        assert_eq!(status, SaveStatus::Saved);
        let saves = h.backend.saves.lock().unwrap();
        assert_eq!(saves[1].revision.as_str(), "v2");
        assert_eq!(saves[1].document.summary.as_deref(), Some("mine"));
        drop(saves);
        assert_eq!(h.coordinator.revision().as_str(), "v3");
    }

    #[tokio::test]
    async fn test_discard_local_reloads_server_document() {
        let mut h = harness("v1");
        let remote = ResumeRecord {
            id: h.coordinator.resume_id,
            title: "Remote".to_string(),
            document: crate::models::resume::ResumeDocument::default(),
            revision: Revision::new("v2"),
            match_score: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        h.backend.put_record(remote);
        h.backend.push_outcome(Err(SaveError::Conflict {
            current: Revision::new("v2"),
        }));
        edit_summary(&mut h, "mine", Duration::ZERO);
        h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;

        let status = h
            .coordinator
            .resolve_conflict(
                ConflictResolution::DiscardLocal,
                &mut h.editor,
                h.backend.as_ref(),
            )
            .await;

        assert_eq!(status, SaveStatus::Saved);
        assert!(!h.editor.is_dirty());
        assert_eq!(h.editor.document().summary, None);
        assert_eq!(h.coordinator.revision().as_str(), "v2");
    }

    #[tokio::test]
    async fn test_network_failure_leaves_unsaved_without_retry() {
        let mut h = harness("v1");
        h.backend
            .push_outcome(Err(SaveError::Network("connection refused".to_string())));
        edit_summary(&mut h, "x", Duration::ZERO);

        let status = h
            .coordinator
            .tick(&mut h.editor, h.backend.as_ref(), h.start + DEFAULT_DEBOUNCE)
            .await;
        assert_eq!(status, SaveStatus::Unsaved);
        assert_eq!(h.coordinator.revision().as_str(), "v1");
        assert!(h.coordinator.last_error().is_some());

        // No background retry: later ticks do nothing until the next edit.
        let much_later = h.start + DEFAULT_DEBOUNCE * 10;
        h.coordinator
            .tick(&mut h.editor, h.backend.as_ref(), much_later)
            .await;
        assert_eq!(h.backend.save_count(), 1);

        edit_summary(&mut h, "y", DEFAULT_DEBOUNCE * 10);
        let status = h
            .coordinator
            .tick(&mut h.editor, h.backend.as_ref(), much_later + DEFAULT_DEBOUNCE)
            .await;
        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(h.backend.save_count(), 2);
    }

    #[tokio::test]
    async fn test_manual_save_noop_when_clean() {
        let mut h = harness("v1");
        let status = h.coordinator.save_now(&mut h.editor, h.backend.as_ref()).await;
        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(h.backend.save_count(), 0);
    }

    #[test]
    fn test_only_one_save_in_flight() {
        let mut h = harness("v1");
        edit_summary(&mut h, "x", Duration::ZERO);
        let ticket = h.coordinator.begin_save(&h.editor, false);
        assert!(ticket.is_some());
        assert_eq!(h.coordinator.status(), SaveStatus::Saving);
        assert!(h.coordinator.begin_save(&h.editor, false).is_none());
        assert!(h.coordinator.begin_save(&h.editor, true).is_none());
    }

    #[test]
    fn test_edits_during_flight_keep_document_unsaved() {
        let mut h = harness("v1");
        edit_summary(&mut h, "first", Duration::ZERO);
        let ticket = h.coordinator.begin_save(&h.editor, false).unwrap();

        edit_summary(&mut h, "second", Duration::from_millis(100));
        assert_eq!(h.coordinator.status(), SaveStatus::Saving);

        let status = h.coordinator.complete_save(
            &mut h.editor,
            ticket,
            Ok(SaveResumeResponse {
                revision: Revision::new("v2"),
                updated_at: chrono::Utc::now(),
            }),
        );
        assert_eq!(status, SaveStatus::Unsaved);
        assert!(h.editor.is_dirty());
        assert!(h.coordinator.deadline().is_some());
        assert_eq!(h.coordinator.revision().as_str(), "v2");
    }

    #[tokio::test]
    async fn test_flush_on_close_spawns_best_effort_save() {
        let mut h = harness("v1");
        edit_summary(&mut h, "closing", Duration::ZERO);
        let backend: Arc<dyn SaveBackend> = h.backend.clone();
        assert!(h.coordinator.flush_on_close(&h.editor, backend));
        for _ in 0..10 {
            if h.backend.save_count() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(h.backend.save_count(), 1);
    }

    #[test]
    fn test_flush_on_close_skipped_when_clean() {
        let mut h = harness("v1");
        let backend: Arc<dyn SaveBackend> = h.backend.clone();
        assert!(!h.coordinator.flush_on_close(&h.editor, backend));
    }
}
