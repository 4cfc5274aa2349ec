//! Selection of the HTML fragment that gets rendered to Markdown.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

/// Pick the HTML to convert from a full page.
///
/// When the parsed document has a `<body>`, this is the outer HTML of each of
/// its direct child elements, concatenated in document order. Text nodes and
/// comments sitting directly under `<body>` are not included. Without a
/// `<body>` (e.g. a frameset page) the whole parsed document is returned.
pub fn extract_body_fragment(html: &str) -> String {
    let doc = Html::parse_document(html);

    match doc.select(&BODY_SEL).next() {
        Some(body) => body
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| child.html())
            .collect(),
        None => doc.html(),
    }
}
