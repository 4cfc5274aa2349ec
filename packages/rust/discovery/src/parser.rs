//! Sitemap XML parser.
//!
//! Streams the document with a namespace-aware `quick-xml` reader and collects
//! the text of every `<loc>` element that is either unqualified or bound to the
//! sitemaps.org namespace. Any other namespace is ignored.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use docmirror_shared::{DocMirrorError, Result};

/// The sitemap protocol namespace.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Parse sitemap XML into trimmed `<loc>` values in document order.
///
/// `source_name` is only used in error messages.
pub(crate) fn parse_locs(xml: &str, source_name: &str) -> Result<Vec<String>> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = NsReader::from_str(xml);

    let err = |msg: String| DocMirrorError::sitemap(source_name, msg);

    let mut urls = Vec::new();
    let mut depth: usize = 0;
    let mut seen_root = false;
    // Depth of the `<loc>` we are currently inside, and its text so far.
    let mut loc_depth: Option<usize> = None;
    let mut loc_text = String::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| err(format!("at byte {position}: {e}")))?;

        match event {
            Event::Start(ref e) => {
                if depth == 0 && seen_root {
                    return Err(err("content after the root element".into()));
                }
                seen_root = true;
                depth += 1;

                if loc_depth.is_none() && is_sitemap_loc(&reader, e.name(), source_name)? {
                    loc_depth = Some(depth);
                    loc_text.clear();
                }
            }
            Event::Empty(ref e) => {
                if depth == 0 && seen_root {
                    return Err(err("content after the root element".into()));
                }
                seen_root = true;
                // `<loc/>` has no text and is skipped, but its prefix must still resolve.
                is_sitemap_loc(&reader, e.name(), source_name)?;
            }
            Event::End(_) => {
                if loc_depth == Some(depth) {
                    loc_depth = None;
                    let trimmed = loc_text.trim();
                    if !trimmed.is_empty() {
                        urls.push(trimmed.to_string());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(ref t) => {
                let text = t
                    .unescape()
                    .map_err(|e| err(format!("invalid text at byte {position}: {e}")))?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return Err(err("text outside the root element".into()));
                    }
                } else if loc_depth.is_some() {
                    loc_text.push_str(&text);
                }
            }
            Event::CData(ref c) => {
                if depth == 0 {
                    return Err(err("CDATA outside the root element".into()));
                }
                if loc_depth.is_some() {
                    let text = std::str::from_utf8(c)
                        .map_err(|e| err(format!("invalid UTF-8 in CDATA: {e}")))?;
                    loc_text.push_str(text);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if !seen_root {
        return Err(err("no root element found".into()));
    }
    if depth > 0 {
        return Err(err(format!(
            "unexpected end of input: {depth} element(s) left unclosed"
        )));
    }

    Ok(urls)
}

/// Whether `name` is a `loc` element in the sitemap namespace or in no namespace.
fn is_sitemap_loc(
    reader: &NsReader<&[u8]>,
    name: quick_xml::name::QName<'_>,
    source_name: &str,
) -> Result<bool> {
    let (ns, local) = reader.resolve_element(name);

    let in_scope = match ns {
        ResolveResult::Unbound => true,
        ResolveResult::Bound(Namespace(uri)) => uri == SITEMAP_NS.as_bytes(),
        ResolveResult::Unknown(prefix) => {
            return Err(DocMirrorError::sitemap(
                source_name,
                format!(
                    "unbound namespace prefix '{}'",
                    String::from_utf8_lossy(&prefix)
                ),
            ));
        }
    };

    Ok(in_scope && local.as_ref() == b"loc")
}
