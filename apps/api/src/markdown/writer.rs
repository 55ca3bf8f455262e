use std::fmt::Write;

use crate::models::resume::{ResumeDocument, SectionId};

/// Writes the document in the format `parse` reads back.
pub fn to_markdown(doc: &ResumeDocument) -> String {
    let mut blocks: Vec<String> = Vec::new();

    let mut head = String::new();
    let contact = &doc.contact;
    if !contact.is_empty() || doc.target_title.is_some() {
        let _ = writeln!(head, "# {}", contact.name);
        field(&mut head, "Email", contact.email.as_deref());
        field(&mut head, "Phone", contact.phone.as_deref());
        field(&mut head, "Location", contact.location.as_deref());
        if !contact.links.is_empty() {
            field(&mut head, "Links", Some(&list(&contact.links, &[','])));
        }
        field(&mut head, "Title", doc.target_title.as_deref());
        blocks.push(head);
    }

    for section in SectionId::ORDER {
        if !section.is_list() && section != SectionId::Summary {
            continue;
        }
        if doc.is_section_empty(section) {
            continue;
        }
        let mut out = format!("## {}\n", section.title());
        write_section(&mut out, doc, section);
        blocks.push(out);
    }

    blocks.join("\n")
}

fn write_section(out: &mut String, doc: &ResumeDocument, section: SectionId) {
    match section {
        SectionId::Summary => {
            if let Some(summary) = &doc.summary {
                let _ = writeln!(out, "{}", summary.trim());
            }
        }
        SectionId::Experience => {
            for (i, entry) in doc.experience.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let mut cols = vec![
                    entry.role.as_str(),
                    entry.company.as_str(),
                ];
                let dates = dates(&entry.date_start, entry.date_end.as_deref());
                cols.push(&dates);
                if let Some(location) = &entry.location {
                    cols.push(location);
                }
                let _ = writeln!(out, "### {}", cols.join(" | "));
                bullets(out, &entry.bullets);
            }
        }
        SectionId::Education => {
            for (i, entry) in doc.education.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = writeln!(
                    out,
                    "### {} | {} | {}",
                    entry.degree,
                    entry.institution,
                    dates(&entry.date_start, entry.date_end.as_deref())
                );
                field(out, "Field", entry.field.as_deref());
                bullets(out, &entry.details);
            }
        }
        SectionId::Skills => {
            for group in doc.skills.iter() {
                if group.category.is_empty() {
                    let _ = writeln!(out, "- {}", list(&group.items, &[',', ':']));
                } else {
                    let _ = writeln!(
                        out,
                        "- {}: {}",
                        escape(&group.category, &[':']),
                        list(&group.items, &[',', ':'])
                    );
                }
            }
        }
        SectionId::Projects => {
            for (i, project) in doc.projects.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                let _ = writeln!(out, "### {}", project.name);
                field(out, "URL", project.url.as_deref());
                if let Some(description) = &project.description {
                    let _ = writeln!(out, "{}", description.trim());
                }
                bullets(out, &project.bullets);
            }
        }
        SectionId::Certifications => {
            for cert in doc.certifications.iter() {
                let mut cols = vec![cert.name.as_str(), cert.issuer.as_str()];
                if let Some(date) = &cert.date {
                    cols.push(date);
                }
                let _ = writeln!(out, "- {}", cols.join(" | "));
            }
        }
        SectionId::Contact | SectionId::TargetTitle => {}
    }
}

fn field(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        let _ = writeln!(out, "{key}: {value}");
    }
}

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

/// Joins items with `, `, escaping the separators the parser splits on.
fn list(items: &[String], specials: &[char]) -> String {
    items
        .iter()
        .map(|item| escape(item, specials))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(text: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn dates(start: &str, end: Option<&str>) -> String {
    match (start.trim().is_empty(), end) {
        (true, None) => String::new(),
        (true, Some(end)) => format!("- {end}"),
        (false, end) => format!("{start} - {}", end.unwrap_or("Present")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::markdown::parse;
    use crate::models::resume::fixtures::sample_document;
    use crate::models::resume::{CertificationEntry, ProjectEntry, SkillGroup};

    #[test]
    fn test_sample_document_markdown() {
        let md = to_markdown(&sample_document());
        assert!(md.starts_with(
            "# Ada Lovelace\nEmail: ada@example.com\nPhone: +44 20 7946 0000\nLocation: London\nLinks: https://ada.dev\nTitle: Staff Software Engineer\n\n## Summary\n"
        ));
        assert!(md.contains(
            "### Lead Programmer | Analytical Engines Ltd | Jan 1842 - Dec 1843 | London\n"
        ));
        assert!(md.ends_with("## Skills\n- Languages: Rust, SQL\n"));
    }

    #[test]
    fn test_parse_reads_back_written_document() {
        let mut doc = sample_document();
        doc.projects = Arc::new(vec![ProjectEntry {
            name: "Difference Engine notes".to_string(),
            url: Some("https://notes.example.com".to_string()),
            description: Some("Annotated translation.\nSeven appendices.".to_string()),
            bullets: vec!["Note G".to_string()],
        }]);
        doc.certifications = Arc::new(vec![CertificationEntry {
            name: "Royal Society Reader".to_string(),
            issuer: String::new(),
            date: Some("1843".to_string()),
        }]);
        Arc::make_mut(&mut doc.experience)[0].date_end = None;

        let parsed = parse(&to_markdown(&doc)).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_parse_reads_back_bulleted_summary() {
        let mut doc = sample_document();
        doc.summary = Some("- 10 years building compilers\n- Led a team of 6".to_string());
        let parsed = parse(&to_markdown(&doc)).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_parse_reads_back_separators_in_list_items() {
        let mut doc = sample_document();
        doc.skills = Arc::new(vec![
            SkillGroup {
                category: "Languages: systems".to_string(),
                items: vec!["C, C++".to_string(), "Rust".to_string()],
            },
            SkillGroup {
                category: String::new(),
                items: vec!["Ratio 3:1".to_string(), r"back\slash".to_string()],
            },
        ]);
        doc.contact.links = vec!["https://ada.dev/a,b".to_string()];

        let md = to_markdown(&doc);
        assert!(md.contains("- Languages\\: systems: C\\, C++, Rust\n"));
        assert_eq!(parse(&md).unwrap(), doc);
    }

    #[test]
    fn test_empty_document_writes_nothing() {
        assert_eq!(to_markdown(&ResumeDocument::default()), "");
    }

    #[test]
    fn test_dates_keep_open_start() {
        assert_eq!(dates("", Some("2021")), "- 2021");
        assert_eq!(dates("2020", None), "2020 - Present");
        assert_eq!(dates("", None), "");
    }
}
