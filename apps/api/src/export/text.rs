use crate::export::{contact_line, date_range};
use crate::models::resume::{ResumeDocument, SectionId};

/// Plain-text fallback. Sections are separated by one blank line.
pub fn render_plain(doc: &ResumeDocument) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for section in SectionId::ORDER {
        if doc.is_section_empty(section) {
            continue;
        }
        let block = render_section(doc, section);
        if !block.is_empty() {
            blocks.push(block);
        }
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn render_section(doc: &ResumeDocument, section: SectionId) -> String {
    let mut lines: Vec<String> = Vec::new();
    match section {
        SectionId::Contact => {
            if !doc.contact.name.trim().is_empty() {
                lines.push(doc.contact.name.to_uppercase());
            }
            let contact = contact_line(&doc.contact);
            if !contact.is_empty() {
                lines.push(contact.join(" | "));
            }
        }
        SectionId::TargetTitle => lines.extend(doc.target_title.clone()),
        SectionId::Summary => {
            lines.push(heading(section));
            lines.extend(doc.summary.as_deref().map(|s| s.trim().to_string()));
        }
        SectionId::Experience => {
            lines.push(heading(section));
            for (i, entry) in doc.experience.iter().enumerate() {
                if i > 0 {
                    lines.push(String::new());
                }
                lines.push(title_line(&entry.role, &entry.company));
                let mut meta = vec![date_range(&entry.date_start, entry.date_end.as_deref())];
                meta.extend(entry.location.clone());
                push_meta(&mut lines, &meta);
                push_bullets(&mut lines, &entry.bullets);
            }
        }
        SectionId::Education => {
            lines.push(heading(section));
            for (i, entry) in doc.education.iter().enumerate() {
                if i > 0 {
                    lines.push(String::new());
                }
                let degree = match &entry.field {
                    Some(field) => format!("{} in {}", entry.degree, field),
                    None => entry.degree.clone(),
                };
                lines.push(title_line(&degree, &entry.institution));
                push_meta(
                    &mut lines,
                    &[date_range(&entry.date_start, entry.date_end.as_deref())],
                );
                push_bullets(&mut lines, &entry.details);
            }
        }
        SectionId::Skills => {
            lines.push(heading(section));
            for group in doc.skills.iter() {
                lines.push(format!("{}: {}", group.category, group.items.join(", ")));
            }
        }
        SectionId::Projects => {
            lines.push(heading(section));
            for (i, project) in doc.projects.iter().enumerate() {
                if i > 0 {
                    lines.push(String::new());
                }
                lines.push(project.name.clone());
                push_meta(&mut lines, &project.url.clone().into_iter().collect::<Vec<_>>());
                lines.extend(project.description.clone());
                push_bullets(&mut lines, &project.bullets);
            }
        }
        SectionId::Certifications => {
            lines.push(heading(section));
            for cert in doc.certifications.iter() {
                let mut line = format!("- {}", cert.name);
                if !cert.issuer.trim().is_empty() {
                    line.push_str(", ");
                    line.push_str(&cert.issuer);
                }
                if let Some(date) = &cert.date {
                    line.push_str(&format!(" ({date})"));
                }
                lines.push(line);
            }
        }
    }
    lines.join("\n")
}

fn heading(section: SectionId) -> String {
    section.title().to_uppercase()
}

fn title_line(title: &str, org: &str) -> String {
    if org.trim().is_empty() {
        title.to_string()
    } else {
        format!("{title}, {org}")
    }
}

fn push_meta(lines: &mut Vec<String>, parts: &[String]) {
    let parts: Vec<&str> = parts
        .iter()
        .map(String::as_str)
        .filter(|p| !p.trim().is_empty())
        .collect();
    if !parts.is_empty() {
        lines.push(parts.join(" | "));
    }
}

fn push_bullets(lines: &mut Vec<String>, bullets: &[String]) {
    lines.extend(
        bullets
            .iter()
            .filter(|b| !b.trim().is_empty())
            .map(|b| format!("- {}", b.trim())),
    );
}
