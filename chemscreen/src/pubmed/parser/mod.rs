//! PubMed EFetch XML parser
//!
//! Turns an EFetch `PubmedArticleSet` document into [`Publication`] records.
//!
//! # Module Organization
//!
//! - `preprocessing` - inline formatting tag removal
//! - `records` - splitting the document into `<PubmedArticle>` records
//! - `deserializers` - text-node deserializer tolerant of attributes
//! - `xml_types` - serde schema types and their conversion to `Publication`

mod deserializers;
mod preprocessing;
mod records;
mod xml_types;

use quick_xml::de::from_str;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::models::Publication;
use preprocessing::strip_inline_html_tags;
use records::article_records;
use xml_types::PubmedArticleXml;

/// Parse every `<PubmedArticle>` in an EFetch XML response
///
/// Each record is deserialized on its own. Records that fail to deserialize or
/// lack a PMID or an `Article` element are logged and skipped, as are
/// `<PubmedBookArticle>` records; the rest are returned in document order.
///
/// # Errors
///
/// Returns `ChemScreenError::XmlError` if the document is not well-formed XML.
///
/// # Example
///
/// ```
/// use chemscreen::pubmed::parse_publications_from_xml;
///
/// let xml = r#"<?xml version="1.0"?>
/// <PubmedArticleSet>
///   <PubmedArticle>
///     <MedlineCitation>
///       <PMID Version="1">12345678</PMID>
///       <Article>
///         <Journal><Title>Toxicology Letters</Title></Journal>
///         <ArticleTitle>Benzene exposure and C<sub>6</sub>H<sub>6</sub> metabolism</ArticleTitle>
///       </Article>
///     </MedlineCitation>
///   </PubmedArticle>
/// </PubmedArticleSet>"#;
///
/// let publications = parse_publications_from_xml(xml)?;
/// assert_eq!(publications[0].title, "Benzene exposure and C6H6 metabolism");
/// # Ok::<(), chemscreen::ChemScreenError>(())
/// ```
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn parse_publications_from_xml(xml: &str) -> Result<Vec<Publication>> {
    let cleaned_xml = strip_inline_html_tags(xml);

    let records = article_records(&cleaned_xml)?;

    let total = records.len();
    let publications: Vec<Publication> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| parse_record(index, record))
        .collect();

    debug!(
        records = total,
        parsed = publications.len(),
        "Parsed EFetch document"
    );

    Ok(publications)
}

fn parse_record(index: usize, record: &str) -> Option<Publication> {
    let article_xml: PubmedArticleXml =
        match from_str(&format!("<PubmedArticle>{record}</PubmedArticle>")) {
            Ok(article_xml) => article_xml,
            Err(e) => {
                warn!(index, error = %e, "Failed to deserialize PubmedArticle, skipping");
                return None;
            }
        };

    let Some(pmid) = article_xml.pmid() else {
        warn!(index, "PubmedArticle without PMID, skipping");
        return None;
    };

    match article_xml.into_publication(&pmid) {
        Ok(publication) => Some(publication),
        Err(e) => {
            warn!(pmid = %pmid, error = %e, "Failed to parse article, skipping");
            None
        }
    }
}
