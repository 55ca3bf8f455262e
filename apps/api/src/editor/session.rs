use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::editor::autosave::{AutosaveCoordinator, ConflictResolution, SaveStatus};
use crate::editor::dialog::{DialogError, DialogOrchestrator};
use crate::editor::ports::{Clipboard, ClipboardError, Notice, Notifier, SaveBackend, SaveError};
use crate::editor::shortcuts::EditorCommand;
use crate::editor::state::{DocumentEditor, DocumentPatch, EditorError};
use crate::export::{self, CopyOutcome, ExportError, ExportFormat, LayoutVariant, RenderedExport};
use crate::models::resume::{ResumeDocument, Revision, SectionId, SectionItem};

/// What a shortcut command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Saved(SaveStatus),
    Copied(CopyOutcome),
    /// Undo/redo; false when there was nothing to apply.
    HistoryStep(bool),
    Exported(RenderedExport),
    Preview(String),
    Failed,
}

/// One open resume: editor, autosave, dialogs and their collaborators.
pub struct EditorSession {
    resume_id: Uuid,
    editor: DocumentEditor,
    autosave: AutosaveCoordinator,
    dialogs: DialogOrchestrator,
    backend: Arc<dyn SaveBackend>,
    notifier: Arc<dyn Notifier>,
}

impl EditorSession {
    /// Loads the server copy and starts clean.
    pub async fn open(
        backend: Arc<dyn SaveBackend>,
        notifier: Arc<dyn Notifier>,
        resume_id: Uuid,
        config: EditorConfig,
    ) -> Result<Self, SaveError> {
        let record = backend.fetch(resume_id).await?;
        info!("Opened resume {resume_id} at {}", record.revision);
        Ok(Self::from_document(
            backend,
            notifier,
            resume_id,
            record.document,
            record.revision,
            config,
        ))
    }

    pub fn from_document(
        backend: Arc<dyn SaveBackend>,
        notifier: Arc<dyn Notifier>,
        resume_id: Uuid,
        document: ResumeDocument,
        revision: Revision,
        config: EditorConfig,
    ) -> Self {
        Self {
            resume_id,
            editor: DocumentEditor::new(document, config.history_capacity),
            autosave: AutosaveCoordinator::new(
                resume_id,
                revision,
                config.autosave_debounce,
                notifier.clone(),
            ),
            dialogs: DialogOrchestrator::default(),
            backend,
            notifier,
        }
    }

    pub fn resume_id(&self) -> Uuid {
        self.resume_id
    }

    pub fn document(&self) -> &ResumeDocument {
        self.editor.document()
    }

    pub fn editor(&self) -> &DocumentEditor {
        &self.editor
    }

    pub fn autosave(&self) -> &AutosaveCoordinator {
        &self.autosave
    }

    pub fn dialogs(&self) -> &DialogOrchestrator {
        &self.dialogs
    }

    pub fn status(&self) -> SaveStatus {
        self.autosave.status()
    }

    pub fn set_match_score(&mut self, score: Option<f64>) {
        self.autosave.set_match_score(score);
    }

    // ── Editing ────────────────────────────────────────────────────────────

    pub fn update(&mut self, patch: DocumentPatch, now: Instant) -> bool {
        let changed = self.editor.update(patch);
        if changed {
            self.autosave.note_edit(now);
        }
        changed
    }

    pub fn undo(&mut self, now: Instant) -> bool {
        let applied = self.editor.undo();
        if applied {
            self.autosave.note_edit(now);
        }
        applied
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        let applied = self.editor.redo();
        if applied {
            self.autosave.note_edit(now);
        }
        applied
    }

    // ── Dialogs ────────────────────────────────────────────────────────────

    pub fn open_for_edit(&mut self, section: SectionId) -> bool {
        self.dialogs.open_for_edit(section, self.editor.document())
    }

    pub fn open_for_add(&mut self, section: SectionId) -> bool {
        self.dialogs.open_for_add(section)
    }

    pub fn open_item(&mut self, section: SectionId, index: usize) -> bool {
        self.dialogs.open_item(section, index, self.editor.document())
    }

    pub fn close_dialog(&mut self) {
        self.dialogs.close();
    }

    pub fn dialog_form(&self) -> Option<SectionItem> {
        self.dialogs.form(self.editor.document())
    }

    pub fn commit_dialog(&mut self, item: SectionItem, now: Instant) -> Result<(), DialogError> {
        self.dialogs.commit(&mut self.editor, item)?;
        self.autosave.note_edit(now);
        Ok(())
    }

    pub fn remove_item(&mut self, section: SectionId, index: usize, now: Instant) -> bool {
        let removed = self.dialogs.remove_item(&mut self.editor, section, index);
        if removed {
            self.autosave.note_edit(now);
        }
        removed
    }

    // ── Persistence ────────────────────────────────────────────────────────

    pub async fn tick(&mut self, now: Instant) -> SaveStatus {
        self.autosave
            .tick(&mut self.editor, self.backend.as_ref(), now)
            .await
    }

    pub async fn save(&mut self) -> SaveStatus {
        self.autosave
            .save_now(&mut self.editor, self.backend.as_ref())
            .await
    }

    pub async fn resolve_conflict(&mut self, resolution: ConflictResolution) -> SaveStatus {
        self.autosave
            .resolve_conflict(resolution, &mut self.editor, self.backend.as_ref())
            .await
    }

    /// Pulls the server copy. Local unsaved edits always win: the remote
    /// copy is only adopted when the editor is clean.
    pub async fn sync_remote(&mut self) -> Result<bool, EditorError> {
        if self.editor.is_dirty() || self.autosave.status() != SaveStatus::Saved {
            warn!(
                "Refusing to refresh resume {} over unsaved edits ({:?})",
                self.resume_id,
                self.autosave.status()
            );
            return Err(EditorError::UnsavedChanges);
        }
        let record = match self.backend.fetch(self.resume_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Refresh failed for resume {}: {e}", self.resume_id);
                self.notifier
                    .notify(Notice::error(format!("Could not refresh: {e}")));
                return Ok(false);
            }
        };
        if record.revision == *self.autosave.revision() {
            return Ok(false);
        }
        self.editor.replace_wholesale(record.document)?;
        self.autosave.adopt_revision(record.revision);
        self.dialogs.close();
        Ok(true)
    }

    /// Best-effort save when the editor goes away.
    pub fn close(&mut self) -> bool {
        self.dialogs.close();
        self.autosave
            .flush_on_close(&self.editor, self.backend.clone())
    }

    // ── Output ─────────────────────────────────────────────────────────────

    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> Result<CopyOutcome, ClipboardError> {
        match export::copy_to_clipboard(self.editor.document(), clipboard) {
            Ok(outcome) => {
                self.notifier.notify(Notice::info("Copied resume to clipboard."));
                Ok(outcome)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Could not copy: {e}")));
                Err(e)
            }
        }
    }

    pub fn preview(&self, layout: LayoutVariant) -> String {
        export::html::render_document(self.editor.document(), layout)
    }

    pub fn export(
        &self,
        format: ExportFormat,
        layout: LayoutVariant,
    ) -> Result<RenderedExport, ExportError> {
        export::render(self.editor.document(), format, layout)
    }

    /// Runs a bound shortcut. Failures are reported through the notifier.
    pub async fn handle_command(
        &mut self,
        command: EditorCommand,
        clipboard: &mut dyn Clipboard,
        now: Instant,
    ) -> CommandOutcome {
        match command {
            EditorCommand::Save => CommandOutcome::Saved(self.save().await),
            EditorCommand::Copy => match self.copy(clipboard) {
                Ok(outcome) => CommandOutcome::Copied(outcome),
                Err(_) => CommandOutcome::Failed,
            },
            EditorCommand::Undo => CommandOutcome::HistoryStep(self.undo(now)),
            EditorCommand::Redo => CommandOutcome::HistoryStep(self.redo(now)),
            EditorCommand::Export => {
                match self.export(ExportFormat::default(), LayoutVariant::default()) {
                    Ok(rendered) => CommandOutcome::Exported(rendered),
                    Err(e) => {
                        self.notifier.notify(Notice::error(e.to_string()));
                        CommandOutcome::Failed
                    }
                }
            }
            EditorCommand::Preview => {
                CommandOutcome::Preview(self.preview(LayoutVariant::default()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::editor::ports::testing::{MemoryClipboard, RecordingNotifier, ScriptedBackend};
    use crate::editor::ports::NoticeLevel;
    use crate::editor::shortcuts::dispatch;
    use crate::models::resume::fixtures::sample_document;
    use crate::models::resume::{ResumeRecord, SkillGroup};

    struct Fixture {
        session: EditorSession,
        backend: Arc<ScriptedBackend>,
        notifier: Arc<RecordingNotifier>,
        start: Instant,
    }

    fn record(id: Uuid, document: ResumeDocument, revision: &str) -> ResumeRecord {
        ResumeRecord {
            id,
            title: "Backend roles".to_string(),
            document,
            revision: Revision::new(revision),
            match_score: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn fixture() -> Fixture {
        let id = Uuid::new_v4();
        let backend = Arc::new(ScriptedBackend::default());
        backend.put_record(record(id, sample_document(), "v1"));
        let notifier = Arc::new(RecordingNotifier::default());
        let session = EditorSession::open(
            backend.clone(),
            notifier.clone(),
            id,
            EditorConfig {
                autosave_debounce: Duration::from_millis(100),
                history_capacity: 5,
            },
        )
        .await
        .unwrap();
        Fixture {
            session,
            backend,
            notifier,
            start: Instant::now(),
        }
    }

    fn summary(text: &str) -> DocumentPatch {
        DocumentPatch {
            summary: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_missing_resume_fails() {
        let backend = Arc::new(ScriptedBackend::default());
        let result = EditorSession::open(
            backend,
            Arc::new(RecordingNotifier::default()),
            Uuid::new_v4(),
            EditorConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(SaveError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_then_tick_saves() {
        let mut f = fixture().await;
        assert_eq!(f.session.status(), SaveStatus::Saved);
        assert!(f.session.update(summary("new summary"), f.start));
        assert_eq!(f.session.status(), SaveStatus::Unsaved);

        let status = f.session.tick(f.start + Duration::from_millis(100)).await;
        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(f.backend.save_count(), 1);
        assert_eq!(f.session.autosave().revision().as_str(), "v2");
    }

    #[tokio::test]
    async fn test_dialog_commit_arms_autosave() {
        let mut f = fixture().await;
        assert!(f.session.open_for_add(SectionId::Skills));
        let item = SectionItem::Skills(SkillGroup {
            category: "Tools".to_string(),
            items: vec!["Git".to_string()],
        });
        f.session.commit_dialog(item, f.start).unwrap();

        assert_eq!(f.session.document().skills.len(), 2);
        assert!(!f.session.dialogs().is_open());
        assert!(f.session.autosave().is_due(f.start + Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_invalid_dialog_commit_leaves_session_clean() {
        let mut f = fixture().await;
        f.session.open_for_add(SectionId::Skills);
        let err = f
            .session
            .commit_dialog(SectionItem::Skills(SkillGroup::default()), f.start)
            .unwrap_err();
        assert!(matches!(err, DialogError::Invalid(_)));
        assert_eq!(f.session.status(), SaveStatus::Saved);
        assert!(f.session.dialogs().is_open());
    }

    #[tokio::test]
    async fn test_sync_remote_refuses_with_unsaved_edits() {
        let mut f = fixture().await;
        let id = f.session.resume_id();
        f.session.update(summary("local"), f.start);
        f.backend.put_record(record(id, ResumeDocument::default(), "v7"));

        assert_eq!(f.session.sync_remote().await, Err(EditorError::UnsavedChanges));
        assert_eq!(f.session.document().summary.as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_sync_remote_adopts_newer_copy_when_clean() {
        let mut f = fixture().await;
        let id = f.session.resume_id();
        let mut remote = sample_document();
        remote.summary = Some("edited in another tab".to_string());
        f.backend.put_record(record(id, remote.clone(), "v3"));

        assert_eq!(f.session.sync_remote().await, Ok(true));
        assert_eq!(*f.session.document(), remote);
        assert_eq!(f.session.autosave().revision().as_str(), "v3");
        assert!(!f.session.editor().can_undo());
    }

    #[tokio::test]
    async fn test_conflict_then_discard_local() {
        let mut f = fixture().await;
        let id = f.session.resume_id();
        f.backend.push_outcome(Err(SaveError::Conflict {
            current: Revision::new("v4"),
        }));
        let mut remote = sample_document();
        remote.target_title = Some("Principal Engineer".to_string());
        f.backend.put_record(record(id, remote.clone(), "v4"));

        f.session.update(summary("mine"), f.start);
        assert_eq!(f.session.save().await, SaveStatus::Conflict);

        let status = f
            .session
            .resolve_conflict(ConflictResolution::DiscardLocal)
            .await;
        assert_eq!(status, SaveStatus::Saved);
        assert_eq!(*f.session.document(), remote);
        assert!(!f.session.editor().is_dirty());
    }

    #[tokio::test]
    async fn test_shortcut_commands() {
        let mut f = fixture().await;
        let mut clipboard = MemoryClipboard::default();
        f.session.update(summary("first"), f.start);

        let undo = dispatch("Mod+Z").unwrap();
        let outcome = f.session.handle_command(undo, &mut clipboard, f.start).await;
        assert_eq!(outcome, CommandOutcome::HistoryStep(true));
        assert_eq!(
            f.session.document().summary.as_deref(),
            Some("Engineer focused on analytical engines.")
        );

        let copy = dispatch("Mod+Shift+C").unwrap();
        let outcome = f.session.handle_command(copy, &mut clipboard, f.start).await;
        assert_eq!(outcome, CommandOutcome::Copied(CopyOutcome::RichText));
        assert_eq!(f.notifier.levels(), vec![NoticeLevel::Info]);

        let preview = dispatch("Mod+P").unwrap();
        match f.session.handle_command(preview, &mut clipboard, f.start).await {
            CommandOutcome::Preview(html) => assert!(html.contains("Ada Lovelace")),
            other => panic!("expected preview, got {other:?}"),
        }

        let save = dispatch("Mod+S").unwrap();
        let outcome = f.session.handle_command(save, &mut clipboard, f.start).await;
        assert_eq!(outcome, CommandOutcome::Saved(SaveStatus::Saved));
    }

    #[tokio::test]
    async fn test_close_flushes_pending_edits() {
        let mut f = fixture().await;
        f.session.update(summary("unsaved on close"), f.start);
        assert!(f.session.close());

        for _ in 0..10 {
            if f.backend.save_count() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(f.backend.save_count(), 1);
    }

    #[tokio::test]
    async fn test_close_when_clean_does_nothing() {
        let mut f = fixture().await;
        assert!(!f.session.close());
    }
}
