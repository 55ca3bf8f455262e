//! Rich-text rendering. Inline styles only, so the fragment survives a
//! paste into word processors that drop `<style>` blocks.

use std::fmt::Write;

use crate::export::{contact_line, date_range, LayoutVariant};
use crate::models::resume::{ResumeDocument, SectionId};

const H1_STYLE: &str = "font-size:20pt;margin:0 0 4pt 0;";
const H2_STYLE: &str = "font-size:13pt;border-bottom:1px solid #444;margin:12pt 0 4pt 0;";
const H3_STYLE: &str = "font-size:11pt;margin:6pt 0 0 0;";
const META_STYLE: &str = "color:#555;margin:0;";
const P_STYLE: &str = "margin:0 0 4pt 0;";

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the clipboard fragment.
pub fn render_fragment(doc: &ResumeDocument) -> String {
    let mut html = String::from("<div class=\"resume\">");
    for section in SectionId::ORDER {
        if doc.is_section_empty(section) {
            continue;
        }
        render_section(&mut html, doc, section);
    }
    html.push_str("</div>");
    html
}

/// A standalone page for download. The layout only changes the stylesheet.
pub fn render_document(doc: &ResumeDocument, layout: LayoutVariant) -> String {
    let title = if doc.contact.name.trim().is_empty() {
        "Resume".to_string()
    } else {
        escape(&doc.contact.name)
    };
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        layout.stylesheet(),
        render_fragment(doc)
    );
    html
}

fn render_section(html: &mut String, doc: &ResumeDocument, section: SectionId) {
    match section {
        SectionId::Contact => {
            let contact = &doc.contact;
            if !contact.name.trim().is_empty() {
                let _ = write!(html, "<h1 style=\"{H1_STYLE}\">{}</h1>", escape(&contact.name));
            }
            let line = contact_line(contact);
            if !line.is_empty() {
                let _ = write!(
                    html,
                    "<p class=\"contact\" style=\"{META_STYLE}\">{}</p>",
                    escape(&line.join(" | "))
                );
            }
        }
        SectionId::TargetTitle => {
            if let Some(title) = &doc.target_title {
                let _ = write!(
                    html,
                    "<p class=\"target-title\" style=\"{P_STYLE}\"><strong>{}</strong></p>",
                    escape(title)
                );
            }
        }
        SectionId::Summary => {
            heading(html, section);
            if let Some(summary) = &doc.summary {
                for paragraph in summary.split("\n\n").filter(|p| !p.trim().is_empty()) {
                    let _ = write!(html, "<p style=\"{P_STYLE}\">{}</p>", escape(paragraph.trim()));
                }
            }
        }
        SectionId::Experience => {
            heading(html, section);
            for entry in doc.experience.iter() {
                entry_heading(html, &entry.role, Some(&entry.company));
                let mut meta = vec![date_range(&entry.date_start, entry.date_end.as_deref())];
                meta.extend(entry.location.clone());
                meta_line(html, &meta);
                bullet_list(html, &entry.bullets);
            }
        }
        SectionId::Education => {
            heading(html, section);
            for entry in doc.education.iter() {
                let degree = match &entry.field {
                    Some(field) => format!("{} in {}", entry.degree, field),
                    None => entry.degree.clone(),
                };
                entry_heading(html, &degree, Some(&entry.institution));
                meta_line(html, &[date_range(&entry.date_start, entry.date_end.as_deref())]);
                bullet_list(html, &entry.details);
            }
        }
        SectionId::Skills => {
            heading(html, section);
            html.push_str("<ul>");
            for group in doc.skills.iter() {
                let _ = write!(
                    html,
                    "<li><strong>{}:</strong> {}</li>",
                    escape(&group.category),
                    escape(&group.items.join(", "))
                );
            }
            html.push_str("</ul>");
        }
        SectionId::Projects => {
            heading(html, section);
            for project in doc.projects.iter() {
                entry_heading(html, &project.name, None);
                if let Some(url) = &project.url {
                    meta_line(html, std::slice::from_ref(url));
                }
                if let Some(description) = &project.description {
                    let _ = write!(html, "<p style=\"{P_STYLE}\">{}</p>", escape(description));
                }
                bullet_list(html, &project.bullets);
            }
        }
        SectionId::Certifications => {
            heading(html, section);
            html.push_str("<ul>");
            for cert in doc.certifications.iter() {
                let mut line = cert.name.clone();
                if !cert.issuer.trim().is_empty() {
                    let _ = write!(line, ", {}", cert.issuer);
                }
                if let Some(date) = &cert.date {
                    let _ = write!(line, " ({date})");
                }
                let _ = write!(html, "<li>{}</li>", escape(&line));
            }
            html.push_str("</ul>");
        }
    }
}

fn heading(html: &mut String, section: SectionId) {
    let _ = write!(html, "<h2 style=\"{H2_STYLE}\">{}</h2>", section.title());
}

fn entry_heading(html: &mut String, title: &str, org: Option<&str>) {
    match org.filter(|o| !o.trim().is_empty()) {
        Some(org) => {
            let _ = write!(
                html,
                "<h3 style=\"{H3_STYLE}\">{}, <em>{}</em></h3>",
                escape(title),
                escape(org)
            );
        }
        None => {
            let _ = write!(html, "<h3 style=\"{H3_STYLE}\">{}</h3>", escape(title));
        }
    }
}

fn meta_line(html: &mut String, parts: &[String]) {
    let parts: Vec<&str> = parts
        .iter()
        .map(String::as_str)
        .filter(|p| !p.trim().is_empty())
        .collect();
    if parts.is_empty() {
        return;
    }
    let _ = write!(
        html,
        "<p class=\"meta\" style=\"{META_STYLE}\">{}</p>",
        escape(&parts.join(" | "))
    );
}

fn bullet_list(html: &mut String, bullets: &[String]) {
    let bullets: Vec<&String> = bullets.iter().filter(|b| !b.trim().is_empty()).collect();
    if bullets.is_empty() {
        return;
    }
    html.push_str("<ul>");
    for bullet in bullets {
        let _ = write!(html, "<li>{}</li>", escape(bullet.trim()));
    }
    html.push_str("</ul>");
}
