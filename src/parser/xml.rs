//! Charset-aware XML loading into a small element tree.
//!
//! The feed parsers only need a handful of fields per element, so the whole
//! document is read into [`Element`]s once and then queried by local name.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::parser::ParseError;

pub const MEDIA_NS: &str = "http://search.yahoo.com/mrss/";

#[derive(Debug, Default, Clone)]
pub struct Element {
    /// Local name, prefix stripped.
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    /// Direct character data (text and CDATA), unescaped.
    pub text: String,
    /// Raw markup between the start and end tag.
    pub inner_xml: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first same-named child with non-blank text, or an empty string.
    /// Media RSS elements never count.
    pub fn child_text(&self, name: &str) -> String {
        self.children_named(name)
            .filter(|c| c.namespace.as_deref() != Some(MEDIA_NS))
            .find(|c| !c.text.trim().is_empty())
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }

    /// Children bound to the Media RSS namespace.
    pub fn media_children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children_named(name)
            .filter(|c| c.namespace.as_deref() == Some(MEDIA_NS))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Decode `data` honoring a byte-order mark or the declared `encoding`, then
/// build the element tree.
pub fn read_document(data: &[u8]) -> Result<Element, ParseError> {
    let source = decode(data)?;
    parse_tree(&source)
}

fn decode(data: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    let encoding = match Encoding::for_bom(data) {
        Some((encoding, _)) => encoding,
        None => match declared_encoding(data) {
            Some(label) => {
                let declared = Encoding::for_label(label.as_bytes())
                    .ok_or(ParseError::UnsupportedCharset(label))?;
                // An ASCII-readable prolog cannot be UTF-16 without a BOM.
                if declared == UTF_16LE || declared == UTF_16BE {
                    UTF_8
                } else {
                    declared
                }
            }
            None => UTF_8,
        },
    };

    // `decode` strips a BOM for us and replaces malformed sequences.
    let (text, _, had_errors) = encoding.decode(data);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Replaced malformed byte sequences");
    }
    Ok(text)
}

/// Pull the `encoding="..."` pseudo-attribute out of an `<?xml ...?>` prolog.
fn declared_encoding(data: &[u8]) -> Option<String> {
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let prolog = data.get(start..)?;
    if !prolog.starts_with(b"<?xml") {
        return None;
    }
    let end = prolog.windows(2).position(|w| w == b"?>")?;
    let decl = String::from_utf8_lossy(&prolog[..end]);

    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let label = &value[..value.find(quote)?];
    Some(label.trim().to_string())
}

fn parse_tree(source: &str) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_str(source);
    let mut stack: Vec<(Element, usize)> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            _ => None,
        };

        match event {
            Event::Start(start) => {
                let element = open_element(&start, namespace);
                let inner_start = reader.buffer_position() as usize;
                stack.push((element, inner_start));
            }
            Event::Empty(start) => {
                let element = open_element(&start, namespace);
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some((mut element, inner_start)) = stack.pop() {
                    element.inner_xml = source
                        .get(inner_start..before)
                        .unwrap_or_default()
                        .to_string();
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some((element, _)) = stack.last_mut() {
                    match text.unescape() {
                        Ok(unescaped) => element.text.push_str(&unescaped),
                        Err(_) => element.text.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Event::CData(data) => {
                if let Some((element, _)) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((open, _)) = stack.last() {
        return Err(ParseError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| ParseError::Malformed("document has no root element".into()))
}

fn open_element(start: &BytesStart<'_>, namespace: Option<String>) -> Element {
    let attributes = start
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            (key, value)
        })
        .collect();

    Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        namespace,
        attributes,
        ..Default::default()
    }
}

fn attach(stack: &mut [(Element, usize)], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some((parent, _)) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
