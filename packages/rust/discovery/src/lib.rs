//! Sitemap discovery: turn a sitemap file into the list of page URLs to mirror.
//!
//! Both namespaced (`http://www.sitemaps.org/schemas/sitemap/0.9`) and
//! unqualified `<loc>` elements are accepted, since real-world sitemap files
//! vary. Nested sitemap indexes are not followed.

mod parser;

use std::io::Write;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::Event;
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info, instrument};

use docmirror_shared::{DocMirrorError, Result};

pub use parser::SITEMAP_NS;

/// Parse the sitemap at `path` and return every non-blank `<loc>` value,
/// trimmed, in document order.
///
/// The bytes are decoded using a byte order mark if present, else the
/// `encoding` of the XML declaration, else UTF-8.
///
/// Fails with [`DocMirrorError::Io`] if the file cannot be read and with
/// [`DocMirrorError::Sitemap`] if it is not well-formed XML or not valid in
/// its encoding.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn parse_sitemap(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| DocMirrorError::io(path, e))?;
    let source_name = path.display().to_string();

    let xml = decode_sitemap(&bytes, &source_name)?;

    let urls = parser::parse_locs(&xml, &source_name)?;
    info!(urls = urls.len(), "sitemap parsed");
    Ok(urls)
}

fn decode_sitemap(bytes: &[u8], source_name: &str) -> Result<String> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(UTF_8);

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(DocMirrorError::sitemap(
            source_name,
            format!("not valid {}", encoding.name()),
        ));
    }
    if encoding != UTF_8 {
        debug!(encoding = encoding.name(), "decoded sitemap");
    }
    Ok(text.into_owned())
}

/// Encoding named by a leading `<?xml ... encoding="..."?>`, if any.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut reader = Reader::from_reader(bytes);
    let Ok(Event::Decl(decl)) = reader.read_event() else {
        return None;
    };
    let label = decl.encoding()?.ok()?;
    // The declaration was readable as ASCII, so a UTF-16 label cannot be right.
    Encoding::for_label(&label).map(Encoding::output_encoding)
}

/// Parse sitemap XML that is already in memory.
pub fn parse_sitemap_str(xml: &str) -> Result<Vec<String>> {
    parser::parse_locs(xml, "<memory>")
}

/// Persist uploaded sitemap bytes to a scoped temporary file.
///
/// The file handle is closed before this returns, so the caller can parse the
/// path immediately. The file is deleted when the returned [`TempPath`] drops.
pub fn persist_upload(bytes: &[u8]) -> Result<TempPath> {
    let tmp_dir = std::env::temp_dir();
    let mut file = NamedTempFile::new().map_err(|e| DocMirrorError::io(&tmp_dir, e))?;

    let file_path = file.path().to_path_buf();
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| DocMirrorError::io(&file_path, e))?;

    let path = file.into_temp_path();
    debug!(path = %path.display(), size = bytes.len(), "persisted uploaded sitemap");
    Ok(path)
}
