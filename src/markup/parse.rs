use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::{resolve_xml_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};

use super::{Attribute, Element, Fragment, NodeId};
use crate::error::ParseError;

pub(super) fn parse(input: &str) -> Result<Fragment, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut builder = Builder::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(&e)?,
            Event::Empty(e) => {
                builder.open(&e)?;
                builder.close();
            }
            Event::End(_) => builder.close(),
            Event::Text(t) => builder.text(&String::from_utf8_lossy(&t))?,
            Event::CData(t) => builder.text(&String::from_utf8_lossy(&t))?,
            Event::GeneralRef(r) => {
                let resolved = resolve_entity(&String::from_utf8_lossy(&r))?;
                builder.text(&resolved)?
            }
            Event::Eof => break,
            // Comments, declarations, doctypes and processing instructions carry no text.
            _ => {}
        }
    }
    builder.finish()
}

/// Entities a rich-text editor emits besides the XML ones.
fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        _ => return None,
    })
}

/// Named entities accepted in text and attribute values alike.
fn named_entity(name: &str) -> Option<&'static str> {
    html_entity(name).or_else(|| resolve_xml_entity(name))
}

fn resolve_entity(name: &str) -> Result<Cow<'static, str>, ParseError> {
    if let Some(text) = named_entity(name) {
        return Ok(Cow::Borrowed(text));
    }
    // Numeric character references.
    unescape_with(&format!("&{name};"), named_entity)
        .map(|s| Cow::Owned(s.into_owned()))
        .map_err(|_| ParseError::UnknownEntity(name.to_string()))
}

#[derive(Default)]
struct Builder {
    fragment: Option<Fragment>,
    current: Option<NodeId>,
}

impl Builder {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), ParseError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape_with(&raw, named_entity)
                .map_err(|e| ParseError::AttributeValue(e.to_string()))?;
            attributes.push(Attribute {
                name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value: value.into_owned(),
            });
        }

        let element = Element::new(tag, attributes, self.current);
        let id = match self.fragment.as_mut() {
            None => {
                self.fragment = Some(Fragment {
                    nodes: vec![element],
                });
                NodeId(0)
            }
            Some(_) if self.current.is_none() => {
                return Err(ParseError::MultipleRoots(element.tag));
            }
            Some(fragment) => fragment.push(element),
        };
        self.current = Some(id);
        Ok(())
    }

    fn close(&mut self) {
        if let (Some(fragment), Some(current)) = (&self.fragment, self.current) {
            self.current = fragment.get(current).parent;
        }
    }

    fn text(&mut self, text: &str) -> Result<(), ParseError> {
        match (&mut self.fragment, self.current) {
            (Some(fragment), Some(current)) => {
                let last_child = fragment.get(current).children.last().copied();
                let target = match last_child {
                    Some(last) => &mut fragment.get_mut(last).tail,
                    None => &mut fragment.get_mut(current).text,
                };
                target.push_str(text);
                Ok(())
            }
            _ if text.trim().is_empty() => Ok(()),
            _ => Err(ParseError::TextOutsideRoot(text.trim().to_string())),
        }
    }

    fn finish(self) -> Result<Fragment, ParseError> {
        let fragment = self.fragment.ok_or(ParseError::Empty)?;
        if let Some(open) = self.current {
            return Err(ParseError::Unclosed(fragment.get(open).tag.clone()));
        }
        Ok(fragment)
    }
}
