use crate::domain::{Enclosure, FeedDocument, FeedImage, RawItem};
use crate::parser::date::{parse_time, parse_time_lenient};
use crate::parser::html::first_image_src;
use crate::parser::rss2::{last_url, media_urls};
use crate::parser::xml::{read_document, Element, MEDIA_NS};
use crate::parser::{expect_root, read_image, Accepted, ParseError};

/// Entries past this index are never looked at.
pub const ATOM_ENTRY_LIMIT: usize = 6;

pub fn parse(data: &[u8]) -> Result<FeedDocument, ParseError> {
    let root = read_document(data)?;
    expect_root(&root, "feed")?;

    let image = root.children_named("image").find_map(read_image).or_else(|| {
        let logo = root.child_text("logo").trim().to_string();
        (!logo.is_empty()).then(|| FeedImage {
            url: logo,
            ..Default::default()
        })
    });

    let mut doc = FeedDocument {
        title: root.child_text("title"),
        description: root.child_text("subtitle"),
        link: select_link(&root).unwrap_or_default(),
        image,
        updated: parse_time_lenient(&root.child_text("updated")),
        ..Default::default()
    };

    let entries: Vec<&Element> = root.children_named("entry").collect();
    if entries.is_empty() {
        return Err(ParseError::NoItems);
    }

    let mut accepted = Accepted::default();
    for entry in entries.into_iter().take(ATOM_ENTRY_LIMIT) {
        if let Some(raw) = read_entry(entry)? {
            accepted.push(&mut doc, raw);
        }
    }

    Ok(doc)
}

fn read_entry(entry: &Element) -> Result<Option<RawItem>, ParseError> {
    let title = entry.child_text("title");
    let guid = entry.child_text("id");
    if guid.trim().is_empty() {
        tracing::warn!(title = %title, "Entry has no ID, skipping");
        return Ok(None);
    }

    let summary = entry.child_text("summary");
    let content_element = entry
        .children_named("content")
        .find(|c| c.namespace.as_deref() != Some(MEDIA_NS));
    let content_body = content_element.map(content_markup).unwrap_or_default();
    let content = if summary.trim().is_empty() {
        content_body.clone()
    } else {
        summary.clone()
    };

    let published = entry.child_text("published");
    let updated = entry.child_text("updated");
    let published = if !published.trim().is_empty() {
        Some(parse_time(&published)?)
    } else if !updated.trim().is_empty() {
        Some(parse_time(&updated)?)
    } else {
        None
    };

    let thumbnails = media_urls(entry, "thumbnail");
    let enclosure = explicit_enclosure(entry)
        .or_else(|| last_url(&thumbnails).map(Enclosure::new))
        .or_else(|| first_image_src(&summary).map(Enclosure::new))
        .or_else(|| first_image_src(&entry.inner_xml).map(Enclosure::new))
        .or_else(|| first_image_src(&content_body).map(Enclosure::new));

    Ok(Some(RawItem {
        title,
        content,
        link: select_link(entry).unwrap_or_default(),
        published,
        guid,
        enclosure,
        thumbnails: thumbnails.into_iter().filter(|u| !u.is_empty()).collect(),
    }))
}

/// XHTML content keeps its raw markup; text and html content use the
/// unescaped text.
fn content_markup(content: &Element) -> String {
    if content.children.is_empty() {
        content.text.clone()
    } else {
        content.inner_xml.trim().to_string()
    }
}

/// The `alternate` link (or one without `rel`), else the first link with an href.
fn select_link(element: &Element) -> Option<String> {
    let links: Vec<&Element> = element
        .children_named("link")
        .filter(|l| l.attr("href").is_some_and(|h| !h.trim().is_empty()))
        .collect();

    links
        .iter()
        .find(|l| matches!(l.attr("rel"), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|l| l.attr("href"))
        .map(|h| h.trim().to_string())
}

fn explicit_enclosure(entry: &Element) -> Option<Enclosure> {
    if let Some(url) = entry
        .child("enclosure")
        .and_then(|e| e.attr("url"))
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        return Some(Enclosure {
            url: url.to_string(),
            mime_type: entry
                .child("enclosure")
                .and_then(|e| e.attr("type"))
                .map(str::to_owned),
        });
    }

    entry
        .children_named("link")
        .find(|l| l.attr("rel") == Some("enclosure"))
        .and_then(|l| {
            let href = l.attr("href")?.trim();
            (!href.is_empty()).then(|| Enclosure {
                url: href.to_string(),
                mime_type: l.attr("type").map(str::to_owned),
            })
        })
}
