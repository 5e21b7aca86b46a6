//! Structured fields derived from an annotated reference.
//!
//! Every function here reads a single parsed [`Fragment`]; callers parse once
//! and run all queries against the same tree.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{TITLE_SEPARATOR, classes};
use crate::error::ParseError;
use crate::extract::extract;
use crate::markup::Fragment;
use crate::tei::to_tei;

/// Which annotation supplied the citation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Author,
    Editor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub role: Role,
    pub name: String,
}

/// Classes that can name the work, in order of precedence.
///
/// NOTE: Ordering is important here. An author always beats an editor; the
/// editor only names works that have no author at all.
static CREDIT_CLASSES: &[(&str, Role)] = &[
    (classes::AUTHOR, Role::Author),
    (classes::EDITOR, Role::Editor),
];

/// First name under the highest-priority class that has any.
pub fn credit(fragment: &Fragment) -> Option<Credit> {
    CREDIT_CLASSES.iter().find_map(|&(class, role)| {
        extract(fragment, class)
            .into_iter()
            .next()
            .map(|name| Credit { role, name })
    })
}

pub fn author_or_editor(fragment: &Fragment) -> String {
    credit(fragment).map(|c| c.name).unwrap_or_default()
}

/// Digits of the last date in the reference.
///
/// The last one wins because editors append corrections after the original
/// date ("1997, rev. 2000").
pub fn publication_year(fragment: &Fragment) -> String {
    static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").unwrap());
    extract(fragment, classes::DATE)
        .pop()
        .map(|date| NON_DIGITS.replace_all(&date, "").into_owned())
        .unwrap_or_default()
}

pub fn article_titles(fragment: &Fragment) -> String {
    extract(fragment, classes::TITLE_ARTICLE).join(TITLE_SEPARATOR)
}

pub fn monograph_titles(fragment: &Fragment) -> String {
    extract(fragment, classes::TITLE_MONOGRAPH).join(TITLE_SEPARATOR)
}

/// The part of an author string before its first comma.
///
/// Names are entered as "FAMILY, GIVEN", possibly repeated; only the first
/// family name survives.
pub fn family_name(author: &str) -> Cow<'_, str> {
    static EXTRA_AUTHOR_NAMES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\s*,.*$").unwrap());
    EXTRA_AUTHOR_NAMES.replace(author, "")
}

/// Short label such as `(James 1997)`.
///
/// An empty family name or year leaves no stray space: `(1997)`, `(James)`, `()`.
pub fn reference_label(author: &str, year: &str) -> String {
    let family = family_name(author);
    match (family.is_empty(), year.is_empty()) {
        (_, true) => format!("({family})"),
        (true, false) => format!("({year})"),
        (false, false) => format!("({family} {year})"),
    }
}

/// All values recomputed from the raw markup on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedFields {
    pub author: String,
    pub role: Option<Role>,
    pub title_article: String,
    pub title_monograph: String,
    pub publication_date: String,
    pub reference_name: String,
    pub tei_entry: String,
}

impl DerivedFields {
    pub fn from_markup(raw: &str) -> Result<Self, ParseError> {
        let fragment = Fragment::parse(raw)?;
        Ok(Self::from_fragment(&fragment))
    }

    pub fn from_fragment(fragment: &Fragment) -> Self {
        let credit = credit(fragment);
        let role = credit.as_ref().map(|c| c.role);
        let author = credit.map(|c| c.name).unwrap_or_default();
        let publication_date = publication_year(fragment);
        let fields = DerivedFields {
            reference_name: reference_label(&author, &publication_date),
            title_article: article_titles(fragment),
            title_monograph: monograph_titles(fragment),
            tei_entry: to_tei(fragment),
            author,
            role,
            publication_date,
        };
        debug!(
            author = %fields.author,
            year = %fields.publication_date,
            label = %fields.reference_name,
            "derived reference fields"
        );
        fields
    }
}
