//! Batch export of stored entries as one TEI document or as BibLaTeX.

use std::collections::HashSet;

use anyhow::anyhow;
use biblatex::Bibliography;
use tracing::info;

use crate::config::TEI_LIST_TAG;
use crate::derive::{Role, family_name};
use crate::entry::BibliographicEntry;
use crate::error::ExportError;
use crate::markup::Fragment;

/// Wrap the TEI of every entry in one `<listBibl>` document.
///
/// Each stored TEI string must be well-formed on its own; the first one that is
/// not fails the whole export.
pub fn export_tei<'a>(
    entries: impl IntoIterator<Item = &'a BibliographicEntry>,
) -> Result<String, ExportError> {
    let mut body = format!("<{TEI_LIST_TAG}>");
    let mut count = 0usize;
    for entry in entries {
        Fragment::parse(&entry.tei_entry).map_err(|source| ExportError::MalformedEntry {
            id: entry.id.unwrap_or_default(),
            source,
        })?;
        body.push_str(&entry.tei_entry);
        count += 1;
    }
    body.push_str(&format!("</{TEI_LIST_TAG}>"));

    let document = Fragment::parse(&body).map_err(ExportError::Malformed)?;
    info!(count, "exported TEI bibliography");
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n",
        document.to_markup()
    ))
}

/// Render every entry as a BibLaTeX record.
pub fn export_biblatex<'a>(
    entries: impl IntoIterator<Item = &'a BibliographicEntry>,
) -> anyhow::Result<String> {
    let mut keys = HashSet::new();
    let mut out = Vec::new();
    for entry in entries {
        let key = unique_key(&mut keys, citation_key(entry));
        let source = build_biblatex(entry, &key);
        let bib = Bibliography::parse(&source)
            .map_err(|e| anyhow!("failed to parse BibLaTeX for {key}: {e}"))?;
        let record = bib
            .iter()
            .next()
            .ok_or_else(|| anyhow!("empty bibliography built for {key}"))?;
        out.push(record.to_biblatex_string());
    }
    info!(count = out.len(), "exported BibLaTeX bibliography");
    Ok(out.join("\n\n"))
}

/// Family name plus year, reduced to lowercase ASCII alphanumerics.
fn citation_key(entry: &BibliographicEntry) -> String {
    let year = entry
        .publication_date
        .map(|y| y.to_string())
        .unwrap_or_default();
    let key: String = format!("{}{}", family_name(&entry.author), year)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if key.is_empty() {
        format!("entry{}", entry.id.unwrap_or_default())
    } else {
        key
    }
}

fn unique_key(seen: &mut HashSet<String>, key: String) -> String {
    let mut candidate = key.clone();
    let mut n = 2;
    while !seen.insert(candidate.clone()) {
        candidate = format!("{key}-{n}");
        n += 1;
    }
    candidate
}

fn build_biblatex(entry: &BibliographicEntry, key: &str) -> String {
    // Reserved characters are escaped so free text reads back literally.
    fn clean(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if matches!(c, '{' | '}' | '\\' | '#' | '&' | '%' | '$' | '_') {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    let article = clean(&entry.title_article);
    let monograph = clean(&entry.title_monograph);
    let mut fields = Vec::new();
    let kind = match (article.is_empty(), monograph.is_empty()) {
        (false, false) => {
            fields.push(format!("title = {{{article}}}"));
            fields.push(format!("booktitle = {{{monograph}}}"));
            "incollection"
        }
        (false, true) => {
            fields.push(format!("title = {{{article}}}"));
            "article"
        }
        (true, false) => {
            fields.push(format!("title = {{{monograph}}}"));
            "book"
        }
        (true, true) => "misc",
    };
    if !entry.author.is_empty() {
        let field = match entry.role {
            Some(Role::Editor) => "editor",
            _ => "author",
        };
        fields.push(format!("{field} = {{{}}}", clean(&entry.author)));
    }
    if let Some(year) = entry.publication_date {
        fields.push(format!("date = {{{year}}}"));
    }

    let mut out = format!("@{kind}{{{key},\n");
    for f in fields {
        out.push_str("    ");
        out.push_str(&f);
        out.push_str(",\n");
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(id: u64, reference: &str) -> BibliographicEntry {
        let mut entry = BibliographicEntry::new(reference);
        entry.id = Some(id);
        entry.save().unwrap();
        entry
    }

    const FIRE: &str = concat!(
        r#"<p><span class="tei-author">James, P. D.</span>, "#,
        r#"<span class="tei-title teia-level__m">Fire in the Belly</span>, "#,
        r#"<span class="tei-date">1997</span></p>"#,
    );

    #[test]
    fn tei_wraps_entries_in_list() {
        let a = saved(1, FIRE);
        let b = saved(2, r#"<p><span class="tei-editor">Noel, G.</span></p>"#);
        let xml = export_tei([&a, &b]).unwrap();
        assert_eq!(
            xml,
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<listBibl><bibl><author>James, P. D.</author>, ",
                r#"<title level="m">Fire in the Belly</title>, <date>1997</date></bibl>"#,
                "<bibl><editor>Noel, G.</editor></bibl></listBibl>\n",
            )
        );
    }

    #[test]
    fn empty_export_is_an_empty_list() {
        let xml = export_tei(std::iter::empty()).unwrap();
        assert!(xml.ends_with("<listBibl/>\n"));
    }

    #[test]
    fn hand_edited_tei_fails_the_whole_export() {
        let a = saved(1, FIRE);
        let mut b = saved(2, FIRE);
        b.tei_entry = "<bibl><author>James</bibl>".into();
        let err = export_tei([&a, &b]).unwrap_err();
        assert!(matches!(err, ExportError::MalformedEntry { id: 2, .. }));

        b.tei_entry = "loose text".into();
        assert!(matches!(
            export_tei([&a, &b]).unwrap_err(),
            ExportError::MalformedEntry { id: 2, .. }
        ));
    }

    #[test]
    fn biblatex_kinds_follow_title_levels() {
        let book = saved(1, FIRE);
        let chapter = saved(
            2,
            concat!(
                r#"<p><span class="tei-editor">Noel, G.</span> "#,
                r#"<span class="tei-title teia-level__a">Chapter</span> in "#,
                r#"<span class="tei-title teia-level__m">Volume</span></p>"#,
            ),
        );
        let bare = saved(3, "<p>nothing marked</p>");
        let out = export_biblatex([&book, &chapter, &bare]).unwrap();
        assert!(out.contains("@book{james1997"), "{out}");
        assert!(out.contains("@incollection{noel"), "{out}");
        assert!(out.contains("@misc{entry3"), "{out}");
        assert!(out.contains("Fire in the Belly"));
        assert!(out.contains("editor") && out.contains("Noel"), "{out}");
    }

    #[test]
    fn reserved_characters_in_free_text_are_escaped() {
        let entry = saved(
            1,
            concat!(
                r#"<p><span class="tei-author">Smith\</span>, "#,
                r#"<span class="tei-title teia-level__a">50% of $5 &amp; {more}_\</span>, "#,
                r#"<span class="tei-title teia-level__m">C:\#1</span></p>"#,
            ),
        );
        let out = export_biblatex([&entry]).unwrap();
        assert!(out.contains("@incollection{smith"), "{out}");
        assert!(out.contains("Smith"), "{out}");

        let bib = Bibliography::parse(&out).unwrap();
        let record = bib.iter().next().unwrap();
        let title: String = record
            .get("title")
            .unwrap()
            .iter()
            .map(|chunk| chunk.v.get())
            .collect();
        assert_eq!(title, "50% of $5 & {more}_\\");
    }

    #[test]
    fn duplicate_keys_get_a_suffix() {
        let a = saved(1, FIRE);
        let b = saved(2, FIRE);
        let out = export_biblatex([&a, &b]).unwrap();
        assert_eq!(out.matches("@book{james1997").count(), 2, "{out}");
        assert!(out.contains("@book{james1997-2"), "{out}");
    }
}
