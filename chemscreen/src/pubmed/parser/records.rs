//! Splitting an EFetch document into individual article records

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::{ChemScreenError, Result};

const ARTICLE_TAG: &[u8] = b"PubmedArticle";
const BOOK_ARTICLE_TAG: &[u8] = b"PubmedBookArticle";

/// Inner XML of every `<PubmedArticle>` in the document, in document order
///
/// Book records (`<PubmedBookArticle>`) and any other elements are skipped.
/// Each slice is the content between the start and end tags, so it can be
/// deserialized on its own and one bad record never affects its neighbours.
///
/// # Errors
///
/// Returns `ChemScreenError::XmlError` if the document is not well-formed.
pub(super) fn article_records(xml: &str) -> Result<Vec<&str>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut skipped_books = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == ARTICLE_TAG => {
                let span = reader.read_to_end(e.name()).map_err(xml_error)?;
                let start = usize::try_from(span.start).unwrap_or(usize::MAX);
                let end = usize::try_from(span.end).unwrap_or(usize::MAX);
                let inner = xml.get(start..end).ok_or_else(|| {
                    ChemScreenError::XmlError(format!(
                        "PubmedArticle span {start}..{end} outside document"
                    ))
                })?;
                records.push(inner);
            }
            Ok(Event::Start(ref e)) if e.name().as_ref() == BOOK_ARTICLE_TAG => {
                reader.read_to_end(e.name()).map_err(xml_error)?;
                skipped_books += 1;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    if skipped_books > 0 {
        debug!(skipped_books, "Skipped PubmedBookArticle records");
    }

    Ok(records)
}

fn xml_error(e: quick_xml::Error) -> ChemScreenError {
    ChemScreenError::XmlError(format!("Malformed EFetch document: {e}"))
}
