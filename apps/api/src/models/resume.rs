use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Document sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.email.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.links.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    /// Free-form, e.g. "Jan 2021".
    #[serde(default)]
    pub date_start: String,
    /// `None` means the position is current.
    #[serde(default)]
    pub date_end: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub date_start: String,
    #[serde(default)]
    pub date_end: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// The structured resume being edited.
///
/// List sections sit behind `Arc` so a history snapshot is a handful of
/// refcount bumps. Editing a section goes through `Arc::make_mut`, which
/// copies only that section when a snapshot still shares it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub target_title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub experience: Arc<Vec<ExperienceEntry>>,
    #[serde(default)]
    pub education: Arc<Vec<EducationEntry>>,
    #[serde(default)]
    pub skills: Arc<Vec<SkillGroup>>,
    #[serde(default)]
    pub projects: Arc<Vec<ProjectEntry>>,
    #[serde(default)]
    pub certifications: Arc<Vec<CertificationEntry>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Section addressing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Contact,
    TargetTitle,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
}

impl SectionId {
    /// Fixed rendering order used by export and the markdown writer.
    pub const ORDER: [SectionId; 8] = [
        SectionId::Contact,
        SectionId::TargetTitle,
        SectionId::Summary,
        SectionId::Experience,
        SectionId::Education,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Certifications,
    ];

    pub fn is_list(self) -> bool {
        !matches!(
            self,
            SectionId::Contact | SectionId::TargetTitle | SectionId::Summary
        )
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionId::Contact => "Contact",
            SectionId::TargetTitle => "Target Title",
            SectionId::Summary => "Summary",
            SectionId::Experience => "Experience",
            SectionId::Education => "Education",
            SectionId::Skills => "Skills",
            SectionId::Projects => "Projects",
            SectionId::Certifications => "Certifications",
        }
    }
}

/// One editable unit of a section, as submitted by an editing dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "item", rename_all = "snake_case")]
pub enum SectionItem {
    Contact(ContactInfo),
    TargetTitle(String),
    Summary(String),
    Experience(ExperienceEntry),
    Education(EducationEntry),
    Skills(SkillGroup),
    Projects(ProjectEntry),
    Certifications(CertificationEntry),
}

impl SectionItem {
    pub fn section(&self) -> SectionId {
        match self {
            SectionItem::Contact(_) => SectionId::Contact,
            SectionItem::TargetTitle(_) => SectionId::TargetTitle,
            SectionItem::Summary(_) => SectionId::Summary,
            SectionItem::Experience(_) => SectionId::Experience,
            SectionItem::Education(_) => SectionId::Education,
            SectionItem::Skills(_) => SectionId::Skills,
            SectionItem::Projects(_) => SectionId::Projects,
            SectionItem::Certifications(_) => SectionId::Certifications,
        }
    }

    /// A blank form for the given section.
    pub fn blank(section: SectionId) -> Self {
        match section {
            SectionId::Contact => SectionItem::Contact(ContactInfo::default()),
            SectionId::TargetTitle => SectionItem::TargetTitle(String::new()),
            SectionId::Summary => SectionItem::Summary(String::new()),
            SectionId::Experience => SectionItem::Experience(ExperienceEntry::default()),
            SectionId::Education => SectionItem::Education(EducationEntry::default()),
            SectionId::Skills => SectionItem::Skills(SkillGroup::default()),
            SectionId::Projects => SectionItem::Projects(ProjectEntry::default()),
            SectionId::Certifications => {
                SectionItem::Certifications(CertificationEntry::default())
            }
        }
    }
}

impl ResumeDocument {
    /// Number of items in a list section. Singletons report 1 when populated.
    pub fn section_len(&self, section: SectionId) -> usize {
        match section {
            SectionId::Contact => usize::from(!self.contact.is_empty()),
            SectionId::TargetTitle => usize::from(has_text(&self.target_title)),
            SectionId::Summary => usize::from(has_text(&self.summary)),
            SectionId::Experience => self.experience.len(),
            SectionId::Education => self.education.len(),
            SectionId::Skills => self.skills.len(),
            SectionId::Projects => self.projects.len(),
            SectionId::Certifications => self.certifications.len(),
        }
    }

    pub fn is_section_empty(&self, section: SectionId) -> bool {
        self.section_len(section) == 0
    }

    /// Reads an item for editing. Singleton sections ignore `index`.
    pub fn item(&self, section: SectionId, index: usize) -> Option<SectionItem> {
        match section {
            SectionId::Contact => Some(SectionItem::Contact(self.contact.clone())),
            SectionId::TargetTitle => Some(SectionItem::TargetTitle(
                self.target_title.clone().unwrap_or_default(),
            )),
            SectionId::Summary => Some(SectionItem::Summary(
                self.summary.clone().unwrap_or_default(),
            )),
            SectionId::Experience => self
                .experience
                .get(index)
                .cloned()
                .map(SectionItem::Experience),
            SectionId::Education => self
                .education
                .get(index)
                .cloned()
                .map(SectionItem::Education),
            SectionId::Skills => self.skills.get(index).cloned().map(SectionItem::Skills),
            SectionId::Projects => self.projects.get(index).cloned().map(SectionItem::Projects),
            SectionId::Certifications => self
                .certifications
                .get(index)
                .cloned()
                .map(SectionItem::Certifications),
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Revision token
// ────────────────────────────────────────────────────────────────────────────

/// Opaque marker for the last server-acknowledged version of a resume.
///
/// The server renders its integer counter as `v{n}`; clients only compare
/// tokens for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_counter(counter: i64) -> Self {
        Self(format!("v{counter}"))
    }

    /// Server-side only: recovers the counter from a token it issued.
    /// Non-canonical spellings such as `v01` or `v+1` are not tokens it
    /// issues and yield `None`.
    pub fn counter(&self) -> Option<i64> {
        let counter: i64 = self.0.strip_prefix('v')?.parse().ok()?;
        (Self::from_counter(counter) == *self).then_some(counter)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub title: String,
    pub document: Json<ResumeDocument>,
    pub revision: i64,
    pub match_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored resume as exposed over the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub title: String,
    pub document: ResumeDocument,
    pub revision: Revision,
    pub match_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for ResumeRecord {
    fn from(row: ResumeRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            document: row.document.0,
            revision: Revision::from_counter(row.revision),
            match_score: row.match_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Save endpoint payloads
// ────────────────────────────────────────────────────────────────────────────

/// PATCH body: the full document plus the caller's last-known revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResumeRequest {
    pub document: ResumeDocument,
    pub revision: Revision,
    #[serde(default)]
    pub match_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResumeResponse {
    pub revision: Revision,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// One experience entry with two bullets, plus a little of everything else.
    pub fn sample_document() -> ResumeDocument {
        ResumeDocument {
            contact: ContactInfo {
                name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                phone: Some("+44 20 7946 0000".to_string()),
                location: Some("London".to_string()),
                links: vec!["https://ada.dev".to_string()],
            },
            target_title: Some("Staff Software Engineer".to_string()),
            summary: Some("Engineer focused on analytical engines.".to_string()),
            experience: Arc::new(vec![ExperienceEntry {
                company: "Analytical Engines Ltd".to_string(),
                role: "Lead Programmer".to_string(),
                date_start: "Jan 1842".to_string(),
                date_end: Some("Dec 1843".to_string()),
                location: Some("London".to_string()),
                bullets: vec![
                    "Wrote the first published algorithm for 1 machine".to_string(),
                    "Cut computation time by 40% with loop notation".to_string(),
                ],
            }]),
            education: Arc::new(vec![EducationEntry {
                institution: "University of London".to_string(),
                degree: "Private tutoring".to_string(),
                field: Some("Mathematics".to_string()),
                date_start: "1829".to_string(),
                date_end: Some("1835".to_string()),
                details: vec![],
            }]),
            skills: Arc::new(vec![SkillGroup {
                category: "Languages".to_string(),
                items: vec!["Rust".to_string(), "SQL".to_string()],
            }]),
            projects: Arc::new(vec![]),
            certifications: Arc::new(vec![]),
        }
    }
}
