//! Dialog/drawer orchestration for structured section editing.
//!
//! At most one editing surface is open. Opening another replaces it.
//! List saves branch on `is_new`: new items append, existing items are
//! replaced by index. Index replacement assumes the list was not reordered
//! or truncated while the dialog was open (single user, single tab).

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::editor::state::{non_blank, DocumentEditor};
use crate::editor::validation::{validate_item, FieldError};
use crate::models::resume::{ResumeDocument, SectionId, SectionItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DialogState {
    pub section: SectionId,
    /// `None` for singleton sections and for new list items.
    pub index: Option<usize>,
    pub is_new: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum DialogError {
    #[error("no dialog is open")]
    NotOpen,

    #[error("dialog is editing {expected:?}, got a {got:?} item")]
    SectionMismatch { expected: SectionId, got: SectionId },

    #[error("item {0} no longer exists")]
    IndexOutOfRange(usize),

    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<FieldError>),
}

#[derive(Debug, Default)]
pub struct DialogOrchestrator {
    active: Option<DialogState>,
}

impl DialogOrchestrator {
    pub fn active(&self) -> Option<DialogState> {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Singletons open directly; list sections open their first item, or
    /// do nothing when the list is empty.
    pub fn open_for_edit(&mut self, section: SectionId, doc: &ResumeDocument) -> bool {
        if !section.is_list() {
            self.open(section, None, false);
            return true;
        }
        if doc.is_section_empty(section) {
            debug!("edit requested for empty section {section:?}; ignoring");
            return false;
        }
        self.open(section, Some(0), false);
        true
    }

    /// Always opens a blank new-item form, whatever the list length.
    pub fn open_for_add(&mut self, section: SectionId) -> bool {
        if section.is_list() {
            self.open(section, None, true);
        } else {
            self.open(section, None, false);
        }
        true
    }

    pub fn open_item(&mut self, section: SectionId, index: usize, doc: &ResumeDocument) -> bool {
        if !section.is_list() {
            return self.open_for_edit(section, doc);
        }
        if index >= doc.section_len(section) {
            return false;
        }
        self.open(section, Some(index), false);
        true
    }

    pub fn close(&mut self) {
        self.active = None;
    }

    /// Initial form contents for the open dialog.
    pub fn form(&self, doc: &ResumeDocument) -> Option<SectionItem> {
        let state = self.active?;
        if state.is_new {
            return Some(SectionItem::blank(state.section));
        }
        doc.item(state.section, state.index.unwrap_or(0))
    }

    /// Validates and applies a submission, then closes the dialog. On error
    /// the dialog stays open and the document is untouched.
    pub fn commit(
        &mut self,
        editor: &mut DocumentEditor,
        item: SectionItem,
    ) -> Result<(), DialogError> {
        let state = self.active.ok_or(DialogError::NotOpen)?;
        if item.section() != state.section {
            return Err(DialogError::SectionMismatch {
                expected: state.section,
                got: item.section(),
            });
        }
        let errors = validate_item(&item);
        if !errors.is_empty() {
            return Err(DialogError::Invalid(errors));
        }

        let target = match (state.is_new, state.index) {
            (false, Some(index)) => {
                if index >= editor.document().section_len(state.section) {
                    return Err(DialogError::IndexOutOfRange(index));
                }
                Some(index)
            }
            _ => None,
        };
        editor.edit(move |doc| apply_item(doc, item, target));
        self.active = None;
        Ok(())
    }

    /// Deletes a list item as one undoable step.
    pub fn remove_item(
        &mut self,
        editor: &mut DocumentEditor,
        section: SectionId,
        index: usize,
    ) -> bool {
        if !section.is_list() || index >= editor.document().section_len(section) {
            return false;
        }
        editor.edit(|doc| match section {
            SectionId::Experience => {
                Arc::make_mut(&mut doc.experience).remove(index);
            }
            SectionId::Education => {
                Arc::make_mut(&mut doc.education).remove(index);
            }
            SectionId::Skills => {
                Arc::make_mut(&mut doc.skills).remove(index);
            }
            SectionId::Projects => {
                Arc::make_mut(&mut doc.projects).remove(index);
            }
            SectionId::Certifications => {
                Arc::make_mut(&mut doc.certifications).remove(index);
            }
            SectionId::Contact | SectionId::TargetTitle | SectionId::Summary => {}
        });
        if self
            .active
            .is_some_and(|s| s.section == section && s.index == Some(index))
        {
            self.active = None;
        }
        true
    }

    fn open(&mut self, section: SectionId, index: Option<usize>, is_new: bool) {
        if let Some(previous) = self.active {
            debug!("closing {:?} dialog to open {section:?}", previous.section);
        }
        self.active = Some(DialogState {
            section,
            index,
            is_new,
        });
    }
}

fn apply_item(doc: &mut ResumeDocument, item: SectionItem, target: Option<usize>) {
    match item {
        SectionItem::Contact(contact) => doc.contact = contact,
        SectionItem::TargetTitle(title) => doc.target_title = non_blank(title),
        SectionItem::Summary(summary) => doc.summary = non_blank(summary),
        SectionItem::Experience(entry) => place(&mut doc.experience, target, entry),
        SectionItem::Education(entry) => place(&mut doc.education, target, entry),
        SectionItem::Skills(group) => place(&mut doc.skills, target, group),
        SectionItem::Projects(project) => place(&mut doc.projects, target, project),
        SectionItem::Certifications(cert) => place(&mut doc.certifications, target, cert),
    }
}

fn place<T: Clone>(list: &mut Arc<Vec<T>>, target: Option<usize>, item: T) {
    let list = Arc::make_mut(list);
    match target.and_then(|index| list.get_mut(index)) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}
