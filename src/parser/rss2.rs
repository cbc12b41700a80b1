use crate::domain::{Enclosure, FeedDocument, RawItem};
use crate::parser::date::{parse_time, parse_time_lenient};
use crate::parser::html::first_image_src;
use crate::parser::xml::{read_document, Element};
use crate::parser::{expect_root, read_image, Accepted, ParseError};

pub fn parse(data: &[u8]) -> Result<FeedDocument, ParseError> {
    let root = read_document(data)?;
    expect_root(&root, "rss")?;
    let channel = root.child("channel").ok_or(ParseError::NoChannel)?;

    let mut doc = FeedDocument {
        title: channel.child_text("title"),
        description: channel.child_text("description"),
        link: channel.child_text("link"),
        image: channel.children_named("image").find_map(read_image),
        updated: channel_updated(channel),
        ..Default::default()
    };

    let items: Vec<&Element> = channel.children_named("item").collect();
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

/// `lastBuildDate`, `pubDate` or `dc:date` of a channel, if any parses.
pub(crate) fn channel_updated(channel: &Element) -> Option<chrono::DateTime<chrono::Utc>> {
    ["lastBuildDate", "pubDate", "date"]
        .iter()
        .find_map(|name| parse_time_lenient(&channel.child_text(name)))
}

/// Read one RSS `<item>`. Shared by the RSS 1.0 and 2.0 parsers.
///
/// Returns `Ok(None)` for items that have neither a guid nor a link. A date
/// that is present but unparseable fails the whole feed.
pub(crate) fn read_item(
    item: &Element,
    fallback_image: Option<&str>,
) -> Result<Option<RawItem>, ParseError> {
    let title = item.child_text("title");
    let link = item.child_text("link");

    let mut guid = item.child_text("guid");
    if guid.trim().is_empty() {
        if link.trim().is_empty() {
            tracing::warn!(title = %title, "Item has no ID or link, skipping");
            return Ok(None);
        }
        guid = link.clone();
    }

    let mut content = item.child_text("description");
    if content.trim().is_empty() {
        content = item.child_text("encoded");
    }

    let date = item.child_text("date");
    let pub_date = item.child_text("pubDate");
    let published = if !date.trim().is_empty() {
        Some(parse_time(&date)?)
    } else if !pub_date.trim().is_empty() {
        Some(parse_time(&pub_date)?)
    } else {
        None
    };

    let thumbnails = media_urls(item, "thumbnail");
    let enclosure = explicit_enclosure(item)
        .or_else(|| last_url(&thumbnails).map(Enclosure::new))
        .or_else(|| last_url(&media_urls(item, "content")).map(Enclosure::new))
        .or_else(|| first_image_src(&content).map(Enclosure::new))
        .or_else(|| fallback_image.map(Enclosure::new));

    Ok(Some(RawItem {
        title,
        content,
        link,
        published,
        guid,
        enclosure,
        thumbnails: thumbnails.into_iter().filter(|u| !u.is_empty()).collect(),
    }))
}

fn explicit_enclosure(item: &Element) -> Option<Enclosure> {
    let element = item.child("enclosure")?;
    let url = element.attr("url")?.trim();
    if url.is_empty() {
        return None;
    }
    Some(Enclosure {
        url: url.to_string(),
        mime_type: element.attr("type").map(str::to_owned),
    })
}

/// Urls of media elements in document order; missing urls stay as empty strings.
pub(crate) fn media_urls(item: &Element, name: &str) -> Vec<String> {
    item.media_children(name)
        .map(|m| m.attr("url").unwrap_or_default().trim().to_string())
        .collect()
}

/// Only the last media element counts; an empty url there is no match.
pub(crate) fn last_url(urls: &[String]) -> Option<&str> {
    urls.last().map(String::as_str).filter(|u| !u.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn feed(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Test Feed</title>
    <description>A test feed</description>
    <link>https://example.com/</link>
    <image><title>Logo</title><url>https://example.com/logo.png</url><height>32</height><width>88</width></image>
    {items}
  </channel>
</rss>"#
        )
    }

    #[test]
    fn test_parse_channel_and_items() {
        let body = feed(
            r#"<item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <description>This is item 2</description>
    </item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();

        assert_eq!(doc.title, "Test Feed");
        assert_eq!(doc.description, "A test feed");
        assert_eq!(doc.link, "https://example.com/");
        let image = doc.image.as_ref().unwrap();
        assert_eq!((image.height, image.width), (32, 88));

        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.unread, 2);
        assert_eq!(doc.items[0].guid, "item-1");
        assert_eq!(
            doc.items[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        // guid falls back to link
        assert_eq!(doc.items[1].guid, "https://example.com/item2");
        assert_eq!(doc.items[1].published, None);
    }

    #[test]
    fn test_item_without_guid_or_link_is_dropped() {
        let body = feed(
            r#"<item><title>Orphan</title></item>
    <item><title>Kept</title><guid>k</guid></item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].title, "Kept");
    }

    #[test]
    fn test_duplicate_guids_keep_first() {
        let body = feed(
            r#"<item><title>First</title><guid>same</guid></item>
    <item><title>Second</title><guid>same</guid></item>
    <item><title>Other</title><guid>other</guid></item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();
        let titles: Vec<_> = doc.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Other"]);
        assert_eq!(doc.unread, 2);
    }

    #[test]
    fn test_date_field_preferred_over_pub_date() {
        let body = feed(
            r#"<item><guid>a</guid>
      <dc:date>2024-03-01T10:00:00Z</dc:date>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate></item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();
        assert_eq!(
            doc.items[0].published,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_date_fails_feed() {
        let body = feed(r#"<item><guid>a</guid><pubDate>not a date</pubDate></item>"#);
        assert!(matches!(
            parse(body.as_bytes()),
            Err(ParseError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_no_channel() {
        let body = r#"<rss version="2.0"></rss>"#;
        assert!(matches!(parse(body.as_bytes()), Err(ParseError::NoChannel)));
    }

    #[test]
    fn test_no_items() {
        let body = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        assert!(matches!(parse(body.as_bytes()), Err(ParseError::NoItems)));
    }

    #[test]
    fn test_enclosure_resolution_order() {
        let body = feed(
            r#"<item><guid>explicit</guid>
      <enclosure url="https://example.com/e.jpg" type="image/jpeg"/>
      <media:thumbnail url="https://example.com/t.jpg"/>
    </item>
    <item><guid>thumbs</guid>
      <media:thumbnail url="https://example.com/t1.jpg"/>
      <media:thumbnail url="https://example.com/t2.jpg"/>
      <media:content url="https://example.com/c.jpg"/>
    </item>
    <item><guid>content</guid>
      <media:content url="https://example.com/c1.jpg"/>
      <media:content url="https://example.com/c2.jpg"/>
    </item>
    <item><guid>scraped</guid>
      <description>&lt;p&gt;&lt;img src="https://example.com/s.jpg"&gt;&lt;/p&gt;</description>
    </item>
    <item><guid>channel</guid><description>plain</description></item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();
        let urls: Vec<_> = doc
            .items
            .iter()
            .map(|i| i.enclosure.as_ref().map(|e| e.url.as_str()))
            .collect();

        assert_eq!(
            urls,
            vec![
                Some("https://example.com/e.jpg"),
                Some("https://example.com/t2.jpg"),
                Some("https://example.com/c2.jpg"),
                Some("https://example.com/s.jpg"),
                Some("https://example.com/logo.png"),
            ]
        );
        assert_eq!(
            doc.items[0].enclosure.as_ref().unwrap().mime_type.as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(doc.items[1].thumbnails.len(), 2);
    }

    #[test]
    fn test_media_metadata_does_not_replace_item_fields() {
        let body = feed(
            r#"<item><media:title>media title</media:title>
      <media:description>media desc</media:description>
      <guid>a</guid><title>A</title><link>https://example.com/a</link>
      <description>real</description></item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();
        assert_eq!(doc.items[0].title, "A");
        assert_eq!(doc.items[0].content, "real");
    }

    #[test]
    fn test_declared_utf16_without_bom_still_parses() {
        let body = r#"<?xml version="1.0" encoding="UTF-16"?><rss version="2.0"><channel>
    <item><guid>a</guid><title>A</title><link>https://example.com/a</link></item>
</channel></rss>"#;
        let doc = crate::parser::parse(body.as_bytes()).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].title, "A");
    }

    #[test]
    fn test_content_encoded_fallback() {
        let body = feed(
            r#"<item xmlns:content="http://purl.org/rss/1.0/modules/content/"><guid>a</guid>
      <content:encoded><![CDATA[<p>Full</p>]]></content:encoded></item>"#,
        );
        let doc = parse(body.as_bytes()).unwrap();
        assert_eq!(doc.items[0].content, "<p>Full</p>");
    }

    #[test]
    fn test_channel_updated() {
        let body = feed(r#"<item><guid>a</guid></item>"#).replace(
            "<title>Test Feed</title>",
            "<title>Test Feed</title><lastBuildDate>Mon, 01 Jan 2024 00:00:00 GMT</lastBuildDate>",
        );
        let doc = parse(body.as_bytes()).unwrap();
        assert_eq!(
            doc.updated,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }
}
