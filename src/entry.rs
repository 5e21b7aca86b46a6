use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::derive::{DerivedFields, Role};
use crate::error::ParseError;

/// A bibliography entry. `styled_reference` is the source of truth; every other
/// reference field is overwritten from it by [`BibliographicEntry::save`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicEntry {
    pub id: Option<u64>,
    pub styled_reference: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub title_article: String,
    #[serde(default)]
    pub title_monograph: String,
    #[serde(default)]
    pub publication_date: Option<u32>,
    #[serde(default)]
    pub reference_name: String,
    #[serde(default)]
    pub tei_entry: String,
    #[serde(default)]
    pub created: Option<NaiveDate>,
    #[serde(default)]
    pub language: Option<u64>,
    #[serde(default)]
    pub categories: Vec<u64>,
}

impl BibliographicEntry {
    pub fn new(styled_reference: impl Into<String>) -> Self {
        BibliographicEntry {
            styled_reference: styled_reference.into(),
            ..Default::default()
        }
    }

    /// Recompute all derived fields from `styled_reference`.
    ///
    /// Either every field is replaced or, on a parse error, none is. The creation
    /// date is stamped on the first successful save only.
    pub fn save(&mut self) -> Result<(), ParseError> {
        let fields = DerivedFields::from_markup(&self.styled_reference)?;
        self.apply(fields);
        if self.created.is_none() {
            self.created = Some(chrono::Local::now().date_naive());
        }
        Ok(())
    }

    fn apply(&mut self, fields: DerivedFields) {
        self.publication_date = if fields.publication_date.is_empty() {
            None
        } else {
            match fields.publication_date.parse() {
                Ok(year) => Some(year),
                Err(_) => {
                    warn!(digits = %fields.publication_date, "publication year out of range, storing none");
                    None
                }
            }
        };
        self.author = fields.author;
        self.role = fields.role;
        self.title_article = fields.title_article;
        self.title_monograph = fields.title_monograph;
        self.reference_name = fields.reference_name;
        self.tei_entry = fields.tei_entry;
    }
}

impl fmt::Display for BibliographicEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{} {}", self.title_article, self.reference_name);
        f.write_str(name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicCategory {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl fmt::Display for BibliographicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRE: &str = concat!(
        r#"<p><span class="tei-author">James, P. D.</span>, "#,
        r#"<span class="tei-title teia-level__a">Foreword</span>, in "#,
        r#"<span class="tei-title teia-level__m">Fire in the Belly</span>, "#,
        r#"<span class="tei-date">1997</span></p>"#,
    );

    #[test]
    fn save_fills_every_field() {
        let mut entry = BibliographicEntry::new(FIRE);
        entry.save().unwrap();
        assert_eq!(entry.author, "James, P. D.");
        assert_eq!(entry.title_article, "Foreword");
        assert_eq!(entry.title_monograph, "Fire in the Belly");
        assert_eq!(entry.publication_date, Some(1997));
        assert_eq!(entry.reference_name, "(James 1997)");
        assert!(entry.tei_entry.starts_with("<bibl><author>"));
        assert!(entry.created.is_some());
        assert_eq!(entry.to_string(), "Foreword (James 1997)");
    }

    #[test]
    fn resave_recomputes_from_scratch_and_keeps_created() {
        let mut entry = BibliographicEntry::new(FIRE);
        entry.save().unwrap();
        let created = NaiveDate::from_ymd_opt(2001, 2, 3);
        entry.created = created;

        entry.styled_reference = r#"<p><span class="tei-editor">Noel, G.</span></p>"#.into();
        entry.save().unwrap();
        assert_eq!(entry.author, "Noel, G.");
        assert_eq!(entry.role, Some(Role::Editor));
        assert_eq!(entry.title_article, "");
        assert_eq!(entry.publication_date, None);
        assert_eq!(entry.reference_name, "(Noel)");
        assert_eq!(entry.created, created);
        assert_eq!(entry.to_string(), "(Noel)");
    }

    #[test]
    fn failed_save_leaves_previous_fields() {
        let mut entry = BibliographicEntry::new(FIRE);
        entry.save().unwrap();
        let before = entry.clone();
        entry.styled_reference = "<p><span>broken</p>".into();
        assert!(entry.save().is_err());
        assert_eq!(entry.reference_name, before.reference_name);
        assert_eq!(entry.tei_entry, before.tei_entry);
    }

    #[test]
    fn overlong_year_is_stored_as_none() {
        let mut entry =
            BibliographicEntry::new(r#"<p><span class="tei-date">19971998199920002001</span></p>"#);
        entry.save().unwrap();
        assert_eq!(entry.publication_date, None);
        assert_eq!(entry.reference_name, "(19971998199920002001)");
    }

    #[test]
    fn unsaved_entry_has_no_created_date() {
        assert!(BibliographicEntry::new("<p/>").created.is_none());
    }
}
