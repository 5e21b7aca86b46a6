//! The class-token convention used by the reference editor.
//!
//! An element's `class` attribute doubles as a tiny annotation language:
//!
//! - `tei-<name>` renames the element to `<name>` on output, and
//! - `teia-<name>__<value>` sets the output attribute `name="value"`.
//!
//! Anything else in the attribute is ignored here, as is any token whose name
//! could not be written as an XML name.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::{ATTRIBUTE_PREFIX, ATTRIBUTE_SEPARATOR, TAG_PREFIX};

/// ASCII subset of the XML `Name` production.
static XML_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._:-]*$").unwrap());

/// What a `class` attribute asks the TEI output to look like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Output tag; `None` keeps the element's own tag.
    pub tag: Option<String>,
    /// Output attributes in first-seen order.
    pub attributes: Vec<(String, String)>,
}

impl Annotation {
    /// Read the tokens of a `class` attribute value.
    ///
    /// NOTE: Several `tei-` tokens are tolerated and the last one wins. A repeated
    /// `teia-` attribute name keeps its first position but takes the last value.
    pub fn parse(class_value: &str) -> Self {
        let mut annotation = Annotation::default();
        for token in class_value.split_whitespace() {
            // `teia-` also starts with `tei`, so it must be tried first.
            if let Some(spec) = token.strip_prefix(ATTRIBUTE_PREFIX) {
                match spec.split_once(ATTRIBUTE_SEPARATOR) {
                    Some((name, value)) if XML_NAME.is_match(name) => annotation.set(name, value),
                    Some(_) => debug!(token, "ignoring attribute token with an invalid name"),
                    None => debug!(token, "ignoring attribute token without a name__value pair"),
                }
            } else if let Some(tag) = token.strip_prefix(TAG_PREFIX) {
                if XML_NAME.is_match(tag) {
                    annotation.tag = Some(tag.to_string());
                } else {
                    debug!(token, "ignoring tag token without a valid name");
                }
            }
        }
        annotation
    }

    fn set(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn title_with_level() {
        let a = Annotation::parse("tei-title teia-level__m");
        assert_eq!(a.tag.as_deref(), Some("title"));
        assert_eq!(a.attributes, attrs(&[("level", "m")]));
    }

    #[test]
    fn attribute_only_keeps_tag_unset() {
        let a = Annotation::parse("teia-rend__italic");
        assert_eq!(a.tag, None);
        assert_eq!(a.attributes, attrs(&[("rend", "italic")]));
    }

    #[test]
    fn last_tag_token_wins() {
        let a = Annotation::parse("tei-author tei-editor");
        assert_eq!(a.tag.as_deref(), Some("editor"));
    }

    #[test]
    fn unrelated_and_malformed_tokens_are_ignored() {
        let a = Annotation::parse("  highlight tei- teia-level teia-__x  teia-type__a__b ");
        assert_eq!(a.tag, None);
        assert_eq!(a.attributes, attrs(&[("type", "a__b")]));
    }

    #[test]
    fn names_that_are_not_xml_names_are_ignored() {
        for class in ["teia-x=y__1", "tei-1st", "tei-a=b", "tei-p&q", "teia-1n__2", "teia-a\"b__c"] {
            assert_eq!(Annotation::parse(class), Annotation::default(), "{class}");
        }
        let a = Annotation::parse("tei-1st tei-title teia-x=y__1 teia-xml:id__t1");
        assert_eq!(a.tag.as_deref(), Some("title"));
        assert_eq!(a.attributes, attrs(&[("xml:id", "t1")]));
    }

    #[test]
    fn invalid_tag_does_not_override_earlier_one() {
        let a = Annotation::parse("tei-title tei-a=b");
        assert_eq!(a.tag.as_deref(), Some("title"));
    }

    #[test]
    fn repeated_attribute_takes_last_value() {
        let a = Annotation::parse("teia-level__a tei-title teia-n__1 teia-level__m");
        assert_eq!(a.attributes, attrs(&[("level", "m"), ("n", "1")]));
    }

    #[test]
    fn tokens_without_prefixes_never_produce_output() {
        proptest::proptest!(|(words in proptest::collection::vec("[a-z][a-z0-9_-]{0,10}", 0..6))| {
            proptest::prop_assume!(words.iter().all(|w| !w.starts_with("tei")));
            let a = Annotation::parse(&words.join(" "));
            proptest::prop_assert_eq!(a, Annotation::default());
        })
    }
}
