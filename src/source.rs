use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::model::RawRecord;

/// List items carrying the directory's per-craftsperson data
/// attributes: opening tag (group 1) and element body (group 2).
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)(<li[^>]*data-nom="[^"]*"[^>]*>)(.*?)</li>"#).unwrap()
});

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

static WEBSITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(https?://[^"]+)""#).unwrap());

const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Fetch the directory listing page and extract raw records from it.
pub async fn fetch_directory(url: &str, categories: &[String]) -> Result<Vec<RawRecord>> {
    info!("Fetching directory page: {}", url);
    let client = reqwest::Client::builder()
        .user_agent(PAGE_USER_AGENT)
        .timeout(PAGE_TIMEOUT)
        .build()?;
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("Failed to fetch directory page")?;

    let records = extract_records(&html, categories);
    info!("Directory page yielded {} food-trade records", records.len());
    Ok(records)
}

/// Extract records from directory HTML. Each entry element exposes its
/// fields as `data-nom` / `data-metier` / `data-ville` /
/// `data-departement` attributes; city + department are joined into a
/// coarse address, and the element body is mined for an award year and
/// a website link. Elements missing a name are skipped; trades outside
/// the configured category list are filtered out; duplicate names
/// within the page keep their first occurrence.
pub fn extract_records(html: &str, categories: &[String]) -> Vec<RawRecord> {
    let mut records: Vec<RawRecord> = Vec::new();

    for entry in ENTRY_RE.captures_iter(html) {
        let tag = &entry[1];
        let body = &entry[2];

        let Some(name) = attr(tag, "data-nom").map(|n| clean_text(&n)).filter(|n| !n.is_empty())
        else {
            debug!("Skipping directory entry without a name");
            continue;
        };

        let specialty = attr(tag, "data-metier").map(|s| clean_text(&s));
        match &specialty {
            Some(s) if is_food_specialty(s, categories) => {}
            _ => continue,
        }

        if records.iter().any(|r| r.name.to_lowercase() == name.to_lowercase()) {
            debug!("Duplicate directory entry for '{}', keeping first", name);
            continue;
        }

        let city = attr(tag, "data-ville").map(|c| clean_text(&c)).filter(|c| !c.is_empty());
        let department = attr(tag, "data-departement")
            .map(|d| clean_text(&d))
            .filter(|d| !d.is_empty());
        let address = match (city, department) {
            (Some(c), Some(d)) => Some(format!("{}, {}", c, d)),
            (Some(c), None) => Some(c),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };

        // Not exposed as data attributes; mined from the element body.
        let year = extract_year(body);
        let website = WEBSITE_RE.captures(body).map(|c| c[1].to_string());

        records.push(RawRecord {
            name,
            specialty,
            address,
            year,
            website,
        });
    }

    records
}

/// Load a curated seed file: a JSON array of raw records.
pub fn load_seed(path: &Path) -> Result<Vec<RawRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let records: Vec<RawRecord> = serde_json::from_str(&text)
        .with_context(|| format!("Seed file {} is not a JSON array of records", path.display()))?;
    Ok(records)
}

/// Load a trust list: a JSON array of names whose addresses are
/// considered verified.
pub fn load_trust_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trust list {}", path.display()))?;
    let names: Vec<String> = serde_json::from_str(&text)
        .with_context(|| format!("Trust list {} is not a JSON array of names", path.display()))?;
    Ok(names)
}

fn attr(tag: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"{}="([^"]*)""#, name)).ok()?;
    re.captures(tag).map(|c| c[1].to_string())
}

/// True when the specialty label contains one of the configured food
/// trade keywords.
pub fn is_food_specialty(specialty: &str, categories: &[String]) -> bool {
    let lower = specialty.to_lowercase();
    categories.iter().any(|cat| lower.contains(cat.as_str()))
}

/// First plausible award year (19xx/20xx) found in a text fragment.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
