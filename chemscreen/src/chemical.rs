//! Chemical identity records and list utilities
//!
//! A [`Chemical`] is validated when it is built: the name must be non-empty and
//! a registry (CAS) number, when given, must have the `XXXXXXX-XX-X` shape.
//! The check digit is verified separately and recorded in
//! [`Chemical::validated`], so a mistyped number still gets searched by name.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ChemScreenError, Result};

fn registry_number_regex() -> &'static Regex {
    static CAS_REGEX: OnceLock<Regex> = OnceLock::new();
    CAS_REGEX.get_or_init(|| {
        Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("Failed to compile CAS number regex")
    })
}

/// Check a CAS Registry Number's format and check digit
///
/// The check digit is the sum of every other digit weighted by its position
/// from the right (starting at 1), modulo 10.
///
/// # Example
///
/// ```
/// use chemscreen::chemical::validate_registry_number;
///
/// assert!(validate_registry_number("75-09-2"));
/// assert!(!validate_registry_number("75-09-3"));
/// assert!(!validate_registry_number("7509-2"));
/// ```
pub fn validate_registry_number(cas: &str) -> bool {
    let cas: String = cas.trim().chars().filter(|c| *c != ' ').collect();

    if !registry_number_regex().is_match(&cas) {
        return false;
    }

    let mut parts = cas.split('-');
    let (Some(first), Some(second), Some(check)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Some(check_digit) = check.chars().next().and_then(|c| c.to_digit(10)) else {
        return false;
    };

    let total: u32 = first
        .chars()
        .chain(second.chars())
        .rev()
        .enumerate()
        .filter_map(|(i, c)| c.to_digit(10).map(|d| (i as u32 + 1) * d))
        .sum();

    total % 10 == check_digit
}

/// A chemical to search for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chemical {
    name: String,
    #[serde(rename = "cas_number")]
    registry_number: Option<String>,
    synonyms: Vec<String>,
    notes: Option<String>,
    validated: bool,
}

impl Chemical {
    /// Build a chemical from a name and optional registry number
    ///
    /// # Errors
    ///
    /// * `ChemScreenError::InvalidChemical` - the name is empty after trimming
    /// * `ChemScreenError::InvalidRegistryNumber` - the registry number is not
    ///   in `\d{2,7}-\d{2}-\d` form
    ///
    /// # Example
    ///
    /// ```
    /// use chemscreen::Chemical;
    ///
    /// let benzene = Chemical::new("Benzene", Some("71-43-2"))?;
    /// assert!(benzene.validated());
    ///
    /// let typo = Chemical::new("Benzene", Some("71-43-3"))?;
    /// assert!(!typo.validated());
    /// # Ok::<(), chemscreen::ChemScreenError>(())
    /// ```
    pub fn new<S: Into<String>>(name: S, registry_number: Option<&str>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ChemScreenError::InvalidChemical(
                "Chemical name cannot be empty".to_string(),
            ));
        }

        let registry_number = match registry_number.map(str::trim) {
            None | Some("") => None,
            Some(cas) => {
                if !registry_number_regex().is_match(cas) {
                    return Err(ChemScreenError::InvalidRegistryNumber {
                        cas: cas.to_string(),
                    });
                }
                Some(cas.to_string())
            }
        };

        let validated = registry_number
            .as_deref()
            .is_none_or(validate_registry_number);

        Ok(Self {
            name,
            registry_number,
            synonyms: Vec::new(),
            notes: None,
            validated,
        })
    }

    /// Replace the synonym list; blank entries are dropped
    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry_number(&self) -> Option<&str> {
        self.registry_number.as_deref()
    }

    pub fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// True if there is no registry number or its check digit is correct
    pub fn validated(&self) -> bool {
        self.validated
    }
}

/// Trim and collapse internal whitespace in a chemical name
pub fn standardize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

const CHEMICAL_ABBREVIATIONS: &[(&str, &str)] = &[
    ("TCE", "Trichloroethylene"),
    ("PCE", "Tetrachloroethylene"),
    ("DCM", "Dichloromethane"),
    ("MEK", "Methyl ethyl ketone"),
    ("NMP", "N-Methylpyrrolidone"),
    ("THF", "Tetrahydrofuran"),
    ("DMF", "Dimethylformamide"),
    ("DMSO", "Dimethyl sulfoxide"),
    ("IPA", "Isopropyl alcohol"),
    ("EtOH", "Ethanol"),
    ("MeOH", "Methanol"),
    ("ACN", "Acetonitrile"),
];

/// Expand a common solvent abbreviation
///
/// Returns the full name and, when the input was an abbreviation, the input
/// itself as a synonym so searches still match papers that only use the short
/// form.
///
/// ```
/// use chemscreen::chemical::expand_abbreviation;
///
/// assert_eq!(
///     expand_abbreviation("tce"),
///     ("Trichloroethylene".to_string(), vec!["tce".to_string()])
/// );
/// assert_eq!(expand_abbreviation("Benzene"), ("Benzene".to_string(), vec![]));
/// ```
pub fn expand_abbreviation(name: &str) -> (String, Vec<String>) {
    let trimmed = name.trim();
    CHEMICAL_ABBREVIATIONS
        .iter()
        .find(|(abbrev, _)| abbrev.eq_ignore_ascii_case(trimmed))
        .map(|(_, full)| (full.to_string(), vec![trimmed.to_string()]))
        .unwrap_or_else(|| (trimmed.to_string(), Vec::new()))
}

/// Find duplicate chemicals as `(first_index, duplicate_index)` pairs
///
/// Registry numbers are compared first. Names are then compared
/// case-insensitively, skipping entries already flagged by registry number, so
/// each duplicate index appears at most once.
pub fn detect_duplicates(chemicals: &[Chemical]) -> Vec<(usize, usize)> {
    let mut duplicates = Vec::new();

    let mut by_registry: HashMap<&str, usize> = HashMap::new();
    for (i, chemical) in chemicals.iter().enumerate() {
        if let Some(cas) = chemical.registry_number() {
            match by_registry.get(cas) {
                Some(&first) => duplicates.push((first, i)),
                None => {
                    by_registry.insert(cas, i);
                }
            }
        }
    }

    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (i, chemical) in chemicals.iter().enumerate() {
        let key = chemical.name().to_lowercase();
        match by_name.get(&key) {
            Some(&first) => {
                if !duplicates.iter().any(|&(_, dup)| dup == i) {
                    duplicates.push((first, i));
                }
            }
            None => {
                by_name.insert(key, i);
            }
        }
    }

    duplicates
}

/// Drop duplicates, keeping the first occurrence of each chemical
pub fn merge_duplicates(chemicals: Vec<Chemical>) -> Vec<Chemical> {
    let duplicates = detect_duplicates(&chemicals);
    if duplicates.is_empty() {
        return chemicals;
    }

    for (first, dup) in &duplicates {
        warn!(
            kept = chemicals[*first].name(),
            dropped = chemicals[*dup].name(),
            "Duplicate chemical"
        );
    }

    let skip: Vec<usize> = duplicates.iter().map(|&(_, dup)| dup).collect();
    let merged: Vec<Chemical> = chemicals
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .map(|(_, chemical)| chemical)
        .collect();

    info!(count = duplicates.len(), "Merged duplicate chemicals");
    merged
}
