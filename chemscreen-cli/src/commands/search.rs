use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use chemscreen::chemical::{expand_abbreviation, merge_duplicates, standardize_name};
use chemscreen::summary::{HIGH_QUALITY_SCORE, group_by_quality_tier};
use chemscreen::{
    BatchCoordinator, Chemical, QualityMetrics, SearchParameters, SearchResult, ScoredResult,
    SummaryStatistics, generate_summary_statistics, identify_high_priority, score_results,
};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use super::{create_cache, create_pubmed_client};
use crate::Cli;

#[derive(Args, Debug)]
pub struct Search {
    /// Chemicals to search, each as NAME or NAME,CAS
    #[arg(value_name = "CHEMICAL")]
    chemicals: Vec<String>,

    /// Read chemicals from a file, one NAME[,CAS] per line
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Maximum publications fetched per chemical
    #[arg(short, long, default_value_t = 100)]
    max_results: u32,

    /// Only publications from the last N years
    #[arg(short, long, default_value_t = 10)]
    years: u32,

    /// Leave review articles out of the search
    #[arg(long)]
    exclude_reviews: bool,

    /// Skip the response cache for this run
    #[arg(long)]
    no_cache: bool,

    /// Replace common solvent abbreviations (TCE, DCM, ...) with full names
    #[arg(long)]
    expand_abbreviations: bool,

    /// Drop duplicate chemicals before searching
    #[arg(long)]
    dedupe: bool,

    /// Minimum quality score for the priority list
    #[arg(long, default_value_t = HIGH_QUALITY_SCORE)]
    min_score: f64,

    /// Minimum publication count for the priority list
    #[arg(long, default_value_t = 20)]
    min_publications: usize,

    /// Save the report to a file instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ChemicalReport<'a> {
    tier: &'static str,
    metrics: &'a QualityMetrics,
    result: &'a SearchResult,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: SummaryStatistics,
    high_priority: Vec<&'a str>,
    chemicals: Vec<ChemicalReport<'a>>,
}

impl Search {
    pub async fn execute(&self, cli: &Cli) -> Result<()> {
        let chemicals = self.load_chemicals().await?;
        if chemicals.is_empty() {
            bail!("No chemicals given; pass them as arguments or with --file");
        }

        let params = SearchParameters::new(
            self.years,
            self.max_results,
            !self.exclude_reviews,
            !self.no_cache,
        )?;

        let client = create_pubmed_client(cli)?;
        for advisory in client.config().advisories() {
            tracing::warn!("{advisory}");
        }

        let coordinator = BatchCoordinator::for_client(client).with_cache(create_cache(cli));

        let total = chemicals.len() as u64;
        let progress_bar = ProgressBar::new(total);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chemicals ({msg})")
                .context("Failed to set progress bar style")?
                .progress_chars("#>-"),
        );

        let progress = |fraction: f64, chemical: &Chemical| {
            progress_bar.set_position((fraction * total as f64).round() as u64);
            progress_bar.set_message(chemical.name().to_string());
        };

        let results = coordinator
            .run(&chemicals, &params, Some(&progress))
            .await;
        progress_bar.finish_with_message("done");

        let scored = score_results(results);
        let output = serde_json::to_string_pretty(&self.build_report(&scored))?;
        self.output_results(&output).await
    }

    async fn load_chemicals(&self) -> Result<Vec<Chemical>> {
        let mut lines: Vec<(String, String)> = self
            .chemicals
            .iter()
            .enumerate()
            .map(|(i, arg)| (format!("argument {}", i + 1), arg.clone()))
            .collect();

        if let Some(path) = &self.file {
            let contents = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            lines.extend(
                contents
                    .lines()
                    .enumerate()
                    .map(|(i, line)| (format!("{}:{}", path.display(), i + 1), line.to_string())),
            );
        }

        let mut chemicals = Vec::new();
        for (origin, line) in &lines {
            if let Some(chemical) = parse_chemical_line(line, self.expand_abbreviations)
                .with_context(|| format!("Invalid chemical at {origin}"))?
            {
                chemicals.push(chemical);
            }
        }

        if self.dedupe {
            let before = chemicals.len();
            chemicals = merge_duplicates(chemicals);
            info!(before, after = chemicals.len(), "Removed duplicate chemicals");
        }

        Ok(chemicals)
    }

    fn build_report<'a>(&self, scored: &'a [ScoredResult]) -> Report<'a> {
        let tiers = group_by_quality_tier(scored);
        let tier_of = |entry: &ScoredResult| {
            let named = [
                ("high", &tiers.high),
                ("medium", &tiers.medium),
                ("low", &tiers.low),
                ("minimal", &tiers.minimal),
                ("failed", &tiers.failed),
            ];
            named
                .into_iter()
                .find(|(_, members)| members.iter().any(|member| std::ptr::eq(*member, entry)))
                .map_or("failed", |(name, _)| name)
        };

        let chemicals = scored
            .iter()
            .map(|entry| ChemicalReport {
                tier: tier_of(entry),
                metrics: &entry.1,
                result: &entry.0,
            })
            .collect();

        let high_priority = identify_high_priority(scored, self.min_score, self.min_publications)
            .into_iter()
            .map(|(result, _)| result.chemical().name())
            .collect();

        Report {
            summary: generate_summary_statistics(scored),
            high_priority,
            chemicals,
        }
    }

    async fn output_results(&self, content: &str) -> Result<()> {
        match &self.output {
            Some(path) => {
                tokio::fs::write(path, content).await?;
                info!(path = %path.display(), "Report saved to file");
            }
            None => {
                println!("{}", content);
            }
        }
        Ok(())
    }
}

/// Parse one `NAME[,CAS]` entry; blank lines and `#` comments yield `None`
fn parse_chemical_line(line: &str, expand_abbreviations: bool) -> Result<Option<Chemical>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, registry_number) = match line.split_once(',') {
        Some((name, cas)) => (name, Some(cas.trim()).filter(|cas| !cas.is_empty())),
        None => (line, None),
    };

    let name = standardize_name(name);
    let (name, synonyms) = if expand_abbreviations {
        expand_abbreviation(&name)
    } else {
        (name, Vec::new())
    };

    let chemical = Chemical::new(name, registry_number)?.with_synonyms(synonyms);
    Ok(Some(chemical))
}
