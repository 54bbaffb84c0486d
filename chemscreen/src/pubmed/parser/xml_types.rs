//! Internal EFetch XML schema types
//!
//! Only the parts of the PubMed DTD that end up in a [`Publication`] are
//! modelled; every other element is skipped by serde. Deserialization starts
//! at a single `<PubmedArticle>` record.

use serde::Deserialize;

use super::deserializers::TextContent;
use crate::error::{ChemScreenError, Result};
use crate::models::Publication;

#[derive(Debug, Deserialize)]
pub(super) struct PubmedArticleXml {
    #[serde(rename = "MedlineCitation", default)]
    pub medline_citation: Option<MedlineCitation>,
    #[serde(rename = "PubmedData", default)]
    pub pubmed_data: Option<PubmedData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MedlineCitation {
    #[serde(rename = "PMID", default)]
    pub pmid: Option<TextContent>,
    #[serde(rename = "Article", default)]
    pub article: Option<ArticleXml>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArticleXml {
    #[serde(rename = "Journal", default)]
    pub journal: Option<Journal>,
    #[serde(rename = "ArticleTitle", default)]
    pub title: Option<TextContent>,
    #[serde(rename = "ELocationID", default)]
    pub elocation_ids: Vec<ELocationId>,
    #[serde(rename = "Abstract", default)]
    pub abstract_section: Option<AbstractXml>,
    #[serde(rename = "AuthorList", default)]
    pub author_list: Option<AuthorList>,
    #[serde(rename = "PublicationTypeList", default)]
    pub publication_types: Option<PublicationTypeList>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Journal {
    #[serde(rename = "Title", default)]
    pub title: Option<TextContent>,
    #[serde(rename = "JournalIssue", default)]
    pub issue: Option<JournalIssue>,
}

#[derive(Debug, Deserialize)]
pub(super) struct JournalIssue {
    #[serde(rename = "PubDate", default)]
    pub pub_date: Option<PubDate>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PubDate {
    #[serde(rename = "Year", default)]
    pub year: Option<TextContent>,
    #[serde(rename = "MedlineDate", default)]
    pub medline_date: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ELocationId {
    #[serde(rename = "@EIdType", default)]
    pub id_type: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AbstractXml {
    #[serde(rename = "AbstractText", default)]
    pub sections: Vec<TextContent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthorList {
    #[serde(rename = "Author", default)]
    pub authors: Vec<AuthorXml>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthorXml {
    #[serde(rename = "LastName", default)]
    pub last_name: Option<TextContent>,
    #[serde(rename = "ForeName", default)]
    pub fore_name: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PublicationTypeList {
    #[serde(rename = "PublicationType", default)]
    pub types: Vec<TextContent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PubmedData {
    #[serde(rename = "ArticleIdList", default)]
    pub article_ids: Option<ArticleIdList>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArticleIdList {
    #[serde(rename = "ArticleId", default)]
    pub ids: Vec<ArticleId>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ArticleId {
    #[serde(rename = "@IdType", default)]
    pub id_type: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl PubmedArticleXml {
    /// PMID of this record, if present and non-blank
    pub fn pmid(&self) -> Option<String> {
        self.medline_citation
            .as_ref()
            .and_then(|citation| citation.pmid.as_ref())
            .and_then(TextContent::trimmed)
    }

    pub fn into_publication(self, pmid: &str) -> Result<Publication> {
        let article = self
            .medline_citation
            .and_then(|citation| citation.article)
            .ok_or_else(|| {
                ChemScreenError::XmlError(format!("PubmedArticle {pmid} has no Article element"))
            })?;

        let doi = self
            .pubmed_data
            .and_then(|data| data.article_ids)
            .and_then(|list| {
                list.ids
                    .into_iter()
                    .find(|id| id.id_type.as_deref() == Some("doi"))
                    .map(|id| id.value.trim().to_string())
            })
            .filter(|doi| !doi.is_empty())
            .or_else(|| article.elocation_doi());

        let year = article.publication_year();
        let is_review = article.is_review();
        let authors = article.author_names();
        let abstract_text = article.abstract_text();

        let journal = article
            .journal
            .as_ref()
            .and_then(|journal| journal.title.as_ref())
            .and_then(TextContent::trimmed);

        let title = article
            .title
            .as_ref()
            .and_then(TextContent::trimmed)
            .unwrap_or_default();

        Ok(Publication {
            pmid: pmid.to_string(),
            title,
            authors,
            journal,
            year,
            abstract_text,
            doi,
            is_review,
        })
    }
}

impl ArticleXml {
    fn publication_year(&self) -> Option<i32> {
        let pub_date = self.journal.as_ref()?.issue.as_ref()?.pub_date.as_ref()?;

        if let Some(year) = pub_date
            .year
            .as_ref()
            .and_then(|y| y.0.trim().parse::<i32>().ok())
        {
            return Some(year);
        }

        pub_date
            .medline_date
            .as_ref()
            .and_then(|date| first_four_digits(&date.0))
    }

    fn author_names(&self) -> Vec<String> {
        let Some(list) = &self.author_list else {
            return Vec::new();
        };

        list.authors
            .iter()
            .filter_map(|author| {
                let last = author.last_name.as_ref().and_then(TextContent::trimmed)?;
                match author.fore_name.as_ref().and_then(TextContent::trimmed) {
                    Some(fore) => Some(format!("{last} {fore}")),
                    None => Some(last),
                }
            })
            .collect()
    }

    fn abstract_text(&self) -> Option<String> {
        let sections: Vec<String> = self
            .abstract_section
            .as_ref()?
            .sections
            .iter()
            .filter_map(TextContent::trimmed)
            .collect();

        (!sections.is_empty()).then(|| sections.join(" "))
    }

    fn elocation_doi(&self) -> Option<String> {
        self.elocation_ids
            .iter()
            .find(|id| id.id_type.as_deref() == Some("doi"))
            .map(|id| id.value.trim().to_string())
            .filter(|doi| !doi.is_empty())
    }

    fn is_review(&self) -> bool {
        self.publication_types
            .as_ref()
            .is_some_and(|list| list.types.iter().any(|t| t.0.contains("Review")))
    }
}

/// First run of four consecutive ASCII digits, e.g. `1998` in `"1998 Dec-1999 Jan"`
fn first_four_digits(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    bytes
        .windows(4)
        .find(|window| window.iter().all(u8::is_ascii_digit))
        .and_then(|window| std::str::from_utf8(window).ok())
        .and_then(|digits| digits.parse().ok())
}
