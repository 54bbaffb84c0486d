use serde::Deserialize;

// ESearch API response structures
#[derive(Debug, Deserialize)]
pub(crate) struct ESearchResult {
    pub esearchresult: ESearchData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ESearchData {
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    /// Total matches, string-encoded by NCBI
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
}

impl ESearchData {
    /// Server-reported match count; unparseable or missing counts read as 0
    pub fn total_count(&self) -> u64 {
        self.count
            .as_deref()
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0)
    }
}
