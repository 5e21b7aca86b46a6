//! A single-file JSON store for entries, categories and languages.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{MAX_CATEGORY_NAME, MAX_LANGUAGE_COLOR, MAX_LANGUAGE_NAME};
use crate::entry::{BibliographicCategory, BibliographicEntry, Language};
use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    entries: Vec<BibliographicEntry>,
    #[serde(default)]
    categories: Vec<BibliographicCategory>,
    #[serde(default)]
    languages: Vec<Language>,
}

impl Store {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(body) => Ok(serde_json::from_str(&body)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Store::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body)?;
        Ok(())
    }

    /// Derive the entry's fields and store it, assigning an id on first save.
    ///
    /// A reference that does not parse is rejected and the store is unchanged.
    pub fn save_entry(&mut self, mut entry: BibliographicEntry) -> Result<u64> {
        entry.save()?;
        let id = match entry.id {
            Some(id) => {
                let slot = self
                    .entries
                    .iter_mut()
                    .find(|e| e.id == Some(id))
                    .ok_or(StoreError::UnknownEntry(id))?;
                *slot = entry;
                id
            }
            None => {
                let id = next_id(self.entries.iter().filter_map(|e| e.id));
                entry.id = Some(id);
                self.entries.push(entry);
                id
            }
        };
        info!(id, "saved entry");
        Ok(id)
    }

    pub fn entry(&self, id: u64) -> Option<&BibliographicEntry> {
        self.entries.iter().find(|e| e.id == Some(id))
    }

    /// Entries ordered by their raw reference, optionally limited to one language.
    pub fn entries(&self, language: Option<u64>) -> Vec<&BibliographicEntry> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .filter(|e| language.is_none() || e.language == language)
            .collect();
        out.sort_by(|a, b| a.styled_reference.cmp(&b.styled_reference));
        out
    }

    pub fn add_category(&mut self, name: &str) -> Result<u64> {
        check_len("category name", name, MAX_CATEGORY_NAME)?;
        if self.category_by_name(name).is_some() {
            return Err(StoreError::Duplicate {
                kind: "category",
                name: name.to_string(),
            });
        }
        let id = next_id(self.categories.iter().map(|c| c.id));
        self.categories.push(BibliographicCategory {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    pub fn add_language(&mut self, name: &str, color: &str) -> Result<u64> {
        check_len("language name", name, MAX_LANGUAGE_NAME)?;
        check_len("language color", color, MAX_LANGUAGE_COLOR)?;
        if self.language_by_name(name).is_some() {
            return Err(StoreError::Duplicate {
                kind: "language",
                name: name.to_string(),
            });
        }
        let id = next_id(self.languages.iter().map(|l| l.id));
        self.languages.push(Language {
            id,
            name: name.to_string(),
            color: color.to_string(),
        });
        Ok(id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&BibliographicCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn language_by_name(&self, name: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.name == name)
    }

    pub fn language(&self, id: u64) -> Option<&Language> {
        self.languages.iter().find(|l| l.id == id)
    }

    /// Case-insensitive substring search on category names.
    pub fn search_categories(&self, query: &str) -> Vec<&BibliographicCategory> {
        let query = query.to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Case-insensitive substring search on language names.
    pub fn search_languages(&self, query: &str) -> Vec<&Language> {
        let query = query.to_lowercase();
        self.languages
            .iter()
            .filter(|l| l.name.to_lowercase().contains(&query))
            .collect()
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(StoreError::TooLong {
            field,
            max,
            value: value.to_string(),
        });
    }
    Ok(())
}
