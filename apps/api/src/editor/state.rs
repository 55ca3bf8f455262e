//! Document editor state: the single owner of the resume being edited.
//!
//! Every mutation goes through `update` or `edit`, which snapshot the
//! pre-edit document into history and mark it dirty. The history buffer and
//! autosave coordinator only observe or replace the document through here.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::editor::history::HistoryBuffer;
use crate::models::resume::{
    CertificationEntry, ContactInfo, EducationEntry, ExperienceEntry, ProjectEntry,
    ResumeDocument, SkillGroup,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("document has unsaved local edits; refusing to replace it")]
    UnsavedChanges,
}

/// Partial field update. Absent fields are left untouched; an empty string
/// clears `target_title` / `summary`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentPatch {
    pub contact: Option<ContactInfo>,
    pub target_title: Option<String>,
    pub summary: Option<String>,
    pub experience: Option<Vec<ExperienceEntry>>,
    pub education: Option<Vec<EducationEntry>>,
    pub skills: Option<Vec<SkillGroup>>,
    pub projects: Option<Vec<ProjectEntry>>,
    pub certifications: Option<Vec<CertificationEntry>>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        *self == DocumentPatch::default()
    }

    fn apply_to(self, doc: &mut ResumeDocument) {
        if let Some(contact) = self.contact {
            doc.contact = contact;
        }
        if let Some(title) = self.target_title {
            doc.target_title = non_blank(title);
        }
        if let Some(summary) = self.summary {
            doc.summary = non_blank(summary);
        }
        if let Some(items) = self.experience {
            doc.experience = items.into();
        }
        if let Some(items) = self.education {
            doc.education = items.into();
        }
        if let Some(items) = self.skills {
            doc.skills = items.into();
        }
        if let Some(items) = self.projects {
            doc.projects = items.into();
        }
        if let Some(items) = self.certifications {
            doc.certifications = items.into();
        }
    }
}

pub(crate) fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

#[derive(Debug)]
pub struct DocumentEditor {
    document: ResumeDocument,
    history: HistoryBuffer<ResumeDocument>,
    dirty: bool,
    /// Bumped on every dirty-marking change; lets a save acknowledge only
    /// the edits it actually carried.
    generation: u64,
}

impl DocumentEditor {
    pub fn new(document: ResumeDocument, history_capacity: usize) -> Self {
        Self {
            document,
            history: HistoryBuffer::with_capacity(history_capacity),
            dirty: false,
            generation: 0,
        }
    }

    pub fn document(&self) -> &ResumeDocument {
        &self.document
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Merges `patch` into the document. Returns false for an empty patch.
    pub fn update(&mut self, patch: DocumentPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        self.edit(|doc| patch.apply_to(doc));
        true
    }

    /// Applies an arbitrary mutation as one undoable step.
    pub fn edit<F>(&mut self, mutate: F)
    where
        F: FnOnce(&mut ResumeDocument),
    {
        self.history.record(self.document.clone());
        mutate(&mut self.document);
        self.touch();
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.document.clone()) {
            Some(previous) => {
                self.document = previous;
                self.touch();
                debug!("undo applied; {} steps left", self.history.undo_len());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.document.clone()) {
            Some(next) => {
                self.document = next;
                self.touch();
                debug!("redo applied; {} steps left", self.history.redo_len());
                true
            }
            None => false,
        }
    }

    /// Swaps in externally changed content. Refuses while local edits are
    /// unsaved.
    pub fn replace_wholesale(&mut self, document: ResumeDocument) -> Result<(), EditorError> {
        if self.dirty {
            warn!("ignoring external document change: local edits are unsaved");
            return Err(EditorError::UnsavedChanges);
        }
        self.document = document;
        self.history.clear();
        Ok(())
    }

    /// Drops unsaved edits and adopts `document`. Only for an explicit
    /// user decision to discard local work.
    pub fn discard_and_replace(&mut self, document: ResumeDocument) {
        if self.dirty {
            warn!("discarding unsaved local edits at user request");
        }
        self.dirty = false;
        self.generation += 1;
        self.document = document;
        self.history.clear();
    }

    /// Clears dirty if nothing changed since `generation` was observed.
    pub fn mark_saved(&mut self, generation: u64) -> bool {
        if self.generation == generation {
            self.dirty = false;
        }
        !self.dirty
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }
}
