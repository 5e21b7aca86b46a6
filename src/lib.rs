//! Derive structured fields and TEI markup from annotated bibliography references.
//!
//! References are entered as rich-text fragments whose spans carry class
//! tokens (`tei-author`, `tei-title teia-level__m`, ...). On every save the
//! fragment is parsed once, queried for the citation fields and rewritten into
//! a TEI `<bibl>` element.

pub mod annotation;
pub mod cli;
pub mod config;
pub mod derive;
pub mod entry;
pub mod error;
pub mod export;
pub mod extract;
pub mod markup;
pub mod store;
pub mod tei;
