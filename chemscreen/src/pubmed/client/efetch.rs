use tracing::{debug, info, instrument, warn};

use super::{PubMedClient, without_url};
use crate::error::Result;
use crate::models::Publication;
use crate::pubmed::parser::parse_publications_from_xml;

impl PubMedClient {
    /// Fetch publication details for a list of PMIDs in one EFetch request
    ///
    /// The IDs are always sent as a POST form body. A document that cannot be
    /// parsed at all is logged and yields no publications; individual bad
    /// records are skipped.
    ///
    /// # Errors
    ///
    /// * `ChemScreenError::RequestError` - If the HTTP request fails
    /// * `ChemScreenError::ApiError` - On a non-2xx status
    #[instrument(skip(self, pmids), fields(pmids_count = pmids.len()))]
    pub async fn fetch_publications(&self, pmids: &[String]) -> Result<Vec<Publication>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/efetch.fcgi", self.base_url);

        debug!(ids = pmids.len(), "Making EFetch POST request");
        let form = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("id".to_string(), pmids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
            ("rettype".to_string(), "abstract".to_string()),
        ];
        let response = self.make_form_request(&url, form).await?;

        let xml_text = response.text().await.map_err(without_url)?;
        if xml_text.trim().is_empty() {
            warn!("EFetch returned an empty body");
            return Ok(Vec::new());
        }

        let publications = parse_publications_from_xml(&xml_text).unwrap_or_else(|e| {
            warn!(error = %e, "Could not parse EFetch response, returning no publications");
            Vec::new()
        });

        info!(
            requested = pmids.len(),
            parsed = publications.len(),
            "Fetch completed"
        );

        Ok(publications)
    }
}
