//! Grammar:
//!
//! ```text
//! document  := blank* contact? section*
//! contact   := "# " name NL (field NL | blank)*
//! field     := ("Email" | "Phone" | "Location" | "Links" | "Title") ": " value
//! section   := "## " section-name NL body
//! entry     := "### " col (" | " col)* NL (field | text | bullet | blank)*
//! ```
//!
//! Entry columns are positional: experience is `role | company | dates |
//! location`, education is `degree | institution | dates`. Dates are
//! `start - end`, with `Present` for an open end.

use std::sync::Arc;

use thiserror::Error;

use crate::markdown::lexer::{split_field, tokenize, Line, Token};
use crate::models::resume::{
    CertificationEntry, ContactInfo, EducationEntry, ExperienceEntry, ProjectEntry,
    ResumeDocument, SectionId, SkillGroup,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown section '{name}'")]
    UnknownSection { line: usize, name: String },

    #[error("line {line}: unexpected content '{text}'")]
    UnexpectedContent { line: usize, text: String },
}

pub fn section_for_heading(name: &str) -> Option<SectionId> {
    let name = name.trim().to_ascii_lowercase();
    let section = match name.as_str() {
        "summary" | "profile" | "professional summary" | "about" | "about me" => {
            SectionId::Summary
        }
        "experience" | "work experience" | "professional experience" | "employment"
        | "work history" => SectionId::Experience,
        "education" => SectionId::Education,
        "skills" | "technical skills" | "core skills" => SectionId::Skills,
        "projects" | "selected projects" => SectionId::Projects,
        "certifications" | "certificates" | "licenses & certifications" => {
            SectionId::Certifications
        }
        _ => return None,
    };
    Some(section)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Preamble,
    Contact,
    Section(SectionId),
}

#[derive(Default)]
struct Builder {
    contact: ContactInfo,
    target_title: Option<String>,
    summary: Vec<Vec<String>>,
    experience: Vec<ExperienceEntry>,
    education: Vec<EducationEntry>,
    skills: Vec<SkillGroup>,
    projects: Vec<ProjectEntry>,
    certifications: Vec<CertificationEntry>,
}

impl Builder {
    fn finish(self) -> ResumeDocument {
        let summary = self
            .summary
            .into_iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        ResumeDocument {
            contact: self.contact,
            target_title: self.target_title,
            summary: (!summary.is_empty()).then_some(summary),
            experience: Arc::new(self.experience),
            education: Arc::new(self.education),
            skills: Arc::new(self.skills),
            projects: Arc::new(self.projects),
            certifications: Arc::new(self.certifications),
        }
    }
}

pub fn parse(input: &str) -> Result<ResumeDocument, ParseError> {
    let mut block = Block::Preamble;
    let mut out = Builder::default();

    for Line { number, raw, token } in tokenize(input) {
        let unexpected = |text: &str| ParseError::UnexpectedContent {
            line: number,
            text: text.to_string(),
        };

        match token {
            Token::Blank => {
                if block == Block::Section(SectionId::Summary) {
                    out.summary.push(Vec::new());
                }
            }
            Token::Heading { level: 1, text } if block == Block::Preamble => {
                out.contact.name = text.to_string();
                block = Block::Contact;
            }
            Token::Heading { level: 2, text } => {
                let section = section_for_heading(text).ok_or(ParseError::UnknownSection {
                    line: number,
                    name: text.to_string(),
                })?;
                block = Block::Section(section);
            }
            Token::Heading { level: 3, text } => match block {
                Block::Section(SectionId::Experience) => out.experience.push(experience_heading(text)),
                Block::Section(SectionId::Education) => out.education.push(education_heading(text)),
                Block::Section(SectionId::Projects) => out.projects.push(ProjectEntry {
                    name: text.to_string(),
                    ..Default::default()
                }),
                _ => return Err(unexpected(text)),
            },
            Token::Heading { text, .. } => return Err(unexpected(text)),
            Token::Text(text) => match block {
                Block::Contact => contact_field(&mut out, text).ok_or_else(|| unexpected(text))?,
                Block::Section(SectionId::Summary) => summary_line(&mut out, text),
                Block::Section(SectionId::Education) => {
                    let entry = out.education.last_mut().ok_or_else(|| unexpected(text))?;
                    match split_field(text) {
                        Some((key, value)) if key.eq_ignore_ascii_case("field") => {
                            entry.field = Some(value.to_string());
                        }
                        _ => return Err(unexpected(text)),
                    }
                }
                Block::Section(SectionId::Projects) => {
                    let project = out.projects.last_mut().ok_or_else(|| unexpected(text))?;
                    match split_field(text) {
                        Some((key, value)) if key.eq_ignore_ascii_case("url") => {
                            project.url = Some(value.to_string());
                        }
                        _ => {
                            let description = project.description.get_or_insert_with(String::new);
                            if !description.is_empty() {
                                description.push('\n');
                            }
                            description.push_str(text);
                        }
                    }
                }
                _ => return Err(unexpected(text)),
            },
            Token::Bullet(text) => match block {
                Block::Section(SectionId::Experience) => out
                    .experience
                    .last_mut()
                    .ok_or_else(|| unexpected(text))?
                    .bullets
                    .push(text.to_string()),
                Block::Section(SectionId::Education) => out
                    .education
                    .last_mut()
                    .ok_or_else(|| unexpected(text))?
                    .details
                    .push(text.to_string()),
                Block::Section(SectionId::Projects) => out
                    .projects
                    .last_mut()
                    .ok_or_else(|| unexpected(text))?
                    .bullets
                    .push(text.to_string()),
                Block::Section(SectionId::Skills) => out.skills.push(skill_group(text)),
                Block::Section(SectionId::Certifications) => {
                    out.certifications.push(certification(text))
                }
                // Summary prose may itself be a list; keep the marker.
                Block::Section(SectionId::Summary) => summary_line(&mut out, raw),
                _ => return Err(unexpected(text)),
            },
        }
    }

    Ok(out.finish())
}

fn summary_line(out: &mut Builder, line: &str) {
    match out.summary.last_mut() {
        Some(paragraph) => paragraph.push(line.to_string()),
        None => out.summary.push(vec![line.to_string()]),
    }
}

fn contact_field(out: &mut Builder, text: &str) -> Option<()> {
    let (key, value) = split_field(text)?;
    let value = value.to_string();
    match key.to_ascii_lowercase().as_str() {
        "email" => out.contact.email = Some(value),
        "phone" => out.contact.phone = Some(value),
        "location" => out.contact.location = Some(value),
        "links" | "link" => out.contact.links.extend(split_list(&value)),
        "title" => out.target_title = Some(value),
        _ => return None,
    }
    Some(())
}

fn columns(text: &str) -> Vec<String> {
    text.split('|').map(|c| c.trim().to_string()).collect()
}

fn column(cols: &[String], index: usize) -> Option<String> {
    cols.get(index).filter(|c| !c.is_empty()).cloned()
}

pub(crate) fn split_dates(text: &str) -> (String, Option<String>) {
    let (start, end) = match text.split_once(" - ") {
        Some((start, end)) => (start.trim(), Some(end.trim())),
        None => match text.strip_prefix("- ") {
            Some(end) => ("", Some(end.trim())),
            None => (text.trim(), None),
        },
    };
    let end = end
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("present"))
        .map(str::to_string);
    (start.to_string(), end)
}

fn experience_heading(text: &str) -> ExperienceEntry {
    let cols = columns(text);
    let (date_start, date_end) = split_dates(&column(&cols, 2).unwrap_or_default());
    ExperienceEntry {
        role: column(&cols, 0).unwrap_or_default(),
        company: column(&cols, 1).unwrap_or_default(),
        date_start,
        date_end,
        location: column(&cols, 3),
        bullets: Vec::new(),
    }
}

fn education_heading(text: &str) -> EducationEntry {
    let cols = columns(text);
    let (date_start, date_end) = split_dates(&column(&cols, 2).unwrap_or_default());
    EducationEntry {
        degree: column(&cols, 0).unwrap_or_default(),
        institution: column(&cols, 1).unwrap_or_default(),
        field: None,
        date_start,
        date_end,
        details: Vec::new(),
    }
}

fn skill_group(text: &str) -> SkillGroup {
    match find_unescaped(text, ':') {
        Some(at) => SkillGroup {
            category: unescape(text[..at].trim()),
            items: split_list(&text[at + 1..]),
        },
        None => SkillGroup {
            category: String::new(),
            items: split_list(text),
        },
    }
}

fn certification(text: &str) -> CertificationEntry {
    let cols = columns(text);
    CertificationEntry {
        name: column(&cols, 0).unwrap_or_default(),
        issuer: column(&cols, 1).unwrap_or_default(),
        date: column(&cols, 2),
    }
}

/// Comma-separated items; `\,` and `\:` are literal.
fn split_list(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = text;
    loop {
        let (item, next) = match find_unescaped(rest, ',') {
            Some(at) => (&rest[..at], Some(&rest[at + 1..])),
            None => (rest, None),
        };
        let item = item.trim();
        if !item.is_empty() {
            items.push(unescape(item));
        }
        match next {
            Some(next) => rest = next,
            None => return items,
        }
    }
}

fn find_unescaped(text: &str, separator: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            return Some(i);
        }
    }
    None
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next().unwrap_or('\\')),
            c => out.push(c),
        }
    }
    out
}
