use crate::domain::FeedDocument;
use crate::parser::rss2::{channel_updated, read_item};
use crate::parser::xml::{read_document, Element};
use crate::parser::{expect_root, read_image, Accepted, ParseError};

/// Parse an RSS 1.0 (RDF) document. Items and the image live next to the
/// channel under the `rdf:RDF` root rather than inside it.
pub fn parse(data: &[u8]) -> Result<FeedDocument, ParseError> {
    let root = read_document(data)?;
    expect_root(&root, "RDF")?;
    let channel = root.child("channel").ok_or(ParseError::NoChannel)?;

    let image = root
        .children_named("image")
        .find_map(read_image)
        .or_else(|| channel.children_named("image").find_map(read_image));

    let mut doc = FeedDocument {
        title: channel.child_text("title"),
        description: channel.child_text("description"),
        link: channel.child_text("link"),
        image,
        updated: channel_updated(channel),
        ..Default::default()
    };

    let items: Vec<&Element> = root.children_named("item").collect();
    if items.is_empty() {
        return Err(ParseError::NoItems);
    }

    let fallback_image = doc.image_url().map(str::to_owned);
    let mut accepted = Accepted::default();
    for item in items {
        if let Some(raw) = read_item(item, fallback_image.as_deref())? {
            accepted.push(&mut doc, raw);
        }
    }

    Ok(doc)
}
