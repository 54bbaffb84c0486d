//! PubMed query construction for chemical searches

use chrono::{Days, NaiveDate, Utc};

use crate::chemical::Chemical;
use crate::models::SearchParameters;

/// Builder for the ESearch `term` of one chemical
///
/// Every identifier (name, registry number, synonyms) becomes a quoted
/// `[Title/Abstract]` phrase, the phrases are OR-ed together and the result is
/// limited to publications dated within the requested range.
#[derive(Debug, Clone)]
pub struct ChemicalQuery {
    terms: Vec<String>,
    date_range_years: u32,
    include_reviews: bool,
}

impl ChemicalQuery {
    /// Create a query for a chemical under the given search parameters
    ///
    /// # Example
    ///
    /// ```
    /// use chemscreen::{Chemical, SearchParameters};
    /// use chemscreen::pubmed::ChemicalQuery;
    /// use chrono::NaiveDate;
    ///
    /// let benzene = Chemical::new("Benzene", Some("71-43-2"))?;
    /// let params = SearchParameters::new(1, 100, false, true)?;
    /// let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    ///
    /// assert_eq!(
    ///     ChemicalQuery::new(&benzene, &params).build_at(today),
    ///     "(\"Benzene\"[Title/Abstract] OR \"71-43-2\"[Title/Abstract]) \
    ///      AND 2023/06/16[PDAT] : 3000[PDAT] NOT Review[PT]"
    /// );
    /// # Ok::<(), chemscreen::ChemScreenError>(())
    /// ```
    pub fn new(chemical: &Chemical, params: &SearchParameters) -> Self {
        let terms = std::iter::once(chemical.name())
            .chain(chemical.registry_number())
            .chain(chemical.synonyms().iter().map(String::as_str))
            .map(quote_term)
            .collect();

        Self {
            terms,
            date_range_years: params.date_range_years(),
            include_reviews: params.include_reviews(),
        }
    }

    /// Build the query using today's date (UTC) for the date filter
    pub fn build(&self) -> String {
        self.build_at(Utc::now().date_naive())
    }

    /// Build the query with an explicit reference date
    ///
    /// The range starts `date_range_years * 365` days before `today`.
    pub fn build_at(&self, today: NaiveDate) -> String {
        let days = u64::from(self.date_range_years) * 365;
        let start = today
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN);

        let mut query = format!(
            "({}) AND {}[PDAT] : 3000[PDAT]",
            self.terms.join(" OR "),
            start.format("%Y/%m/%d")
        );

        if !self.include_reviews {
            query.push_str(" NOT Review[PT]");
        }

        query
    }
}

/// Quote a term as a `[Title/Abstract]` phrase
///
/// Embedded double quotes would end the phrase early, so they become spaces.
fn quote_term(term: &str) -> String {
    format!("\"{}\"[Title/Abstract]", term.replace('"', " "))
}
