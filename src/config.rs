//! Constants shared by the derivation pipeline, the store and the CLI.

/// Tag given to the root element of every TEI entry.
pub const TEI_ROOT_TAG: &str = "bibl";

/// Element wrapping the entries of a batch export.
pub const TEI_LIST_TAG: &str = "listBibl";

/// Class token prefix selecting the output tag (`tei-title`).
pub const TAG_PREFIX: &str = "tei-";

/// Class token prefix selecting an output attribute (`teia-level__m`).
pub const ATTRIBUTE_PREFIX: &str = "teia-";

/// Separates attribute name and value inside a `teia-` token.
pub const ATTRIBUTE_SEPARATOR: &str = "__";

/// Joins multiple titles of the same level.
pub const TITLE_SEPARATOR: &str = ", ";

/// Class values written by the reference editor's toolbar.
pub mod classes {
    pub const AUTHOR: &str = "tei-author";
    pub const EDITOR: &str = "tei-editor";
    pub const DATE: &str = "tei-date";
    pub const TITLE_ARTICLE: &str = "tei-title teia-level__a";
    pub const TITLE_MONOGRAPH: &str = "tei-title teia-level__m";
}

/// Store file used when neither `--store` nor the environment names one.
pub const DEFAULT_STORE_FILE: &str = "biblentry.json";

/// Environment variable overriding the store file.
pub const STORE_ENV: &str = "BIBLENTRY_STORE";

/// Length limits carried over from the entry tables.
pub const MAX_CATEGORY_NAME: usize = 255;
pub const MAX_LANGUAGE_NAME: usize = 32;
pub const MAX_LANGUAGE_COLOR: usize = 8;
