use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

static IMG_SRC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

/// `src` of the first `<img>` in an HTML fragment.
pub fn first_image_src(html: &str) -> Option<String> {
    if !html.contains("<img") && !html.contains("<IMG") {
        return None;
    }

    let caps = IMG_SRC_PATTERN.captures(html)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    let src = decode_html_entities(raw.as_str().trim()).into_owned();

    (!src.is_empty()).then_some(src)
}
