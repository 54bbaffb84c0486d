//! PubMed client for chemical literature searches
//!
//! A search is two E-utilities calls: ESearch to collect PMIDs for a
//! chemical's query, then EFetch for the publication details.
//!
//! - `client/mod.rs` - Client struct, constructors, ESearch and the request helpers
//! - `client/efetch` - Batched EFetch as a single form POST
//! - `query` - Query term construction for a chemical
//! - `parser` - EFetch XML to [`Publication`](crate::models::Publication)
//! - `responses` - ESearch JSON response types

pub mod client;
pub mod parser;
pub mod query;
pub(crate) mod responses;

pub use client::PubMedClient;
pub use parser::parse_publications_from_xml;
pub use query::ChemicalQuery;
