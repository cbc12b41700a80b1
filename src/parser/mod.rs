//! Feed format detection and parsing.
//!
//! Three parsers (RSS 2.0, RSS 1.0, Atom) share one contract: raw bytes in,
//! [`FeedDocument`] or [`ParseError`] out. [`FeedFormat::sniff`] picks one
//! with a cheap substring test; malformed input is left for the chosen parser
//! to reject.

pub mod atom;
pub mod date;
pub mod html;
pub mod rss1;
pub mod rss2;
pub mod xml;

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::{FeedDocument, FeedImage, RawItem};
use xml::Element;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error("Expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot { expected: &'static str, found: String },

    #[error("No channel found")]
    NoChannel,

    #[error("No items found")]
    NoItems,

    #[error("Invalid date: {0:?}")]
    InvalidDate(String),
}

const RSS2_TOKEN: &[u8] = b"<rss";
const RSS1_TOKEN: &[u8] = br#"xmlns="http://purl.org/rss/1.0/""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss2,
    Rss1,
    Atom,
}

impl FeedFormat {
    pub fn sniff(body: &[u8]) -> Self {
        if contains(body, RSS2_TOKEN) {
            FeedFormat::Rss2
        } else if contains(body, RSS1_TOKEN) {
            FeedFormat::Rss1
        } else {
            FeedFormat::Atom
        }
    }

    pub fn parse(self, body: &[u8]) -> Result<FeedDocument, ParseError> {
        match self {
            FeedFormat::Rss2 => rss2::parse(body),
            FeedFormat::Rss1 => rss1::parse(body),
            FeedFormat::Atom => atom::parse(body),
        }
    }
}

/// Sniff the format of `body` and parse it.
pub fn parse(body: &[u8]) -> Result<FeedDocument, ParseError> {
    let format = FeedFormat::sniff(body);
    tracing::trace!(?format, bytes = body.len(), "Parsing feed");
    format.parse(body)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn expect_root(root: &Element, expected: &'static str) -> Result<(), ParseError> {
    if root.name == expected {
        Ok(())
    } else {
        Err(ParseError::UnexpectedRoot {
            expected,
            found: root.name.clone(),
        })
    }
}

fn read_image(element: &Element) -> Option<FeedImage> {
    let image = FeedImage {
        title: element.child_text("title").trim().to_string(),
        url: element.child_text("url").trim().to_string(),
        height: element.child_text("height").trim().parse().unwrap_or(0),
        width: element.child_text("width").trim().parse().unwrap_or(0),
    };
    (!image.url.is_empty()).then_some(image)
}

/// Tracks identifiers already accepted from one document.
#[derive(Default)]
struct Accepted {
    seen: HashSet<String>,
}

impl Accepted {
    /// Push `item` unless its identifier was already accepted.
    fn push(&mut self, doc: &mut FeedDocument, item: RawItem) {
        if !self.seen.insert(item.guid.clone()) {
            tracing::warn!(title = %item.title, guid = %item.guid, "Item has duplicate ID, skipping");
            return;
        }
        doc.items.push(item);
        doc.unread += 1;
    }
}
