use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::resume::{ContactInfo, SectionItem};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// An inline form error. Blocks submission of the dialog it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn required(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{field} is required"),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Validates a dialog submission. An empty result means it may be saved.
pub fn validate_item(item: &SectionItem) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match item {
        SectionItem::Contact(contact) => validate_contact(contact, &mut errors),
        // Blank title / summary is how the user clears them.
        SectionItem::TargetTitle(_) | SectionItem::Summary(_) => {}
        SectionItem::Experience(entry) => {
            require(&entry.company, "company", &mut errors);
            require(&entry.role, "role", &mut errors);
        }
        SectionItem::Education(entry) => {
            require(&entry.institution, "institution", &mut errors);
            require(&entry.degree, "degree", &mut errors);
        }
        SectionItem::Skills(group) => {
            require(&group.category, "category", &mut errors);
            if group.items.iter().all(|s| s.trim().is_empty()) {
                errors.push(FieldError {
                    field: "items",
                    message: "add at least one skill".to_string(),
                });
            }
        }
        SectionItem::Projects(project) => require(&project.name, "name", &mut errors),
        SectionItem::Certifications(cert) => require(&cert.name, "name", &mut errors),
    }
    errors
}

fn validate_contact(contact: &ContactInfo, errors: &mut Vec<FieldError>) {
    require(&contact.name, "name", errors);
    // A cleared email field is the same as no email.
    if let Some(email) = contact.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !is_valid_email(email) {
            errors.push(FieldError {
                field: "email",
                message: format!("'{email}' is not a valid email address"),
            });
        }
    }
}

fn require(value: &str, field: &'static str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::required(field));
    }
}
