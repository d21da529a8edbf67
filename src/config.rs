use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

const DEFAULT_DATA_PATH: &str = "data/mof-data.json";
const DEFAULT_PUBLIC_PATH: &str = "public/data.json";
const DEFAULT_DIRECTORY_URL: &str = "https://www.meilleursouvriersdefrance.info/annuaire-mof";

/// Pipeline configuration. Every field has a compiled default so the
/// binary runs without any config file; a JSON file passed via
/// `--config` overrides individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Canonical dataset path.
    pub data_path: PathBuf,
    /// Published mirror consumed by the front-end.
    pub public_path: PathBuf,
    /// Directory listing page to scrape.
    pub directory_url: String,
    /// Keywords identifying food trades; specialty labels are matched
    /// case-insensitively against these.
    pub food_categories: Vec<String>,
    /// Optional cap on geocoding lookups per run.
    pub max_geocode: Option<usize>,
    /// City catalog used by the placeholder pass.
    pub city_catalog: Vec<City>,
    /// Street names used by the placeholder pass.
    pub street_names: Vec<String>,
}

/// A catalog city: display name, department code, and center
/// coordinates placeholder addresses are scattered around.
#[derive(Debug, Clone, Deserialize)]
pub struct City {
    pub name: String,
    pub dept: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            public_path: PathBuf::from(DEFAULT_PUBLIC_PATH),
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            food_categories: default_food_categories(),
            max_geocode: None,
            city_catalog: default_city_catalog(),
            street_names: default_street_names(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(PipelineConfig::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("Config file {} is not valid", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// The food-trade keyword list ("métiers de bouche").
pub fn default_food_categories() -> Vec<String> {
    [
        "boulanger", "pâtissier", "chocolatier", "confiseur",
        "traiteur", "cuisinier", "chef", "fromager", "crémier",
        "boucher", "charcutier", "poissonnier", "sommelier",
        "glacier", "primeur", "maraîcher",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// The larger French cities with department codes and center
/// coordinates.
pub fn default_city_catalog() -> Vec<City> {
    let cities = [
        ("Paris", "75", 48.8566, 2.3522),
        ("Lyon", "69", 45.7640, 4.8357),
        ("Marseille", "13", 43.2965, 5.3698),
        ("Toulouse", "31", 43.6047, 1.4442),
        ("Nice", "06", 43.7102, 7.2620),
        ("Nantes", "44", 47.2184, -1.5536),
        ("Strasbourg", "67", 48.5734, 7.7521),
        ("Montpellier", "34", 43.6108, 3.8767),
        ("Bordeaux", "33", 44.8378, -0.5792),
        ("Lille", "59", 50.6292, 3.0573),
        ("Rennes", "35", 48.1173, -1.6778),
        ("Reims", "51", 49.2583, 4.0317),
        ("Le Havre", "76", 49.4944, 0.1079),
        ("Saint-Étienne", "42", 45.4397, 4.3872),
        ("Toulon", "83", 43.1242, 5.9280),
        ("Grenoble", "38", 45.1885, 5.7245),
        ("Dijon", "21", 47.3220, 5.0415),
        ("Angers", "49", 47.4784, -0.5632),
        ("Nîmes", "30", 43.8367, 4.3601),
        ("Aix-en-Provence", "13", 43.5297, 5.4474),
    ];
    cities
        .iter()
        .map(|(name, dept, lat, lon)| City {
            name: name.to_string(),
            dept: dept.to_string(),
            lat: *lat,
            lon: *lon,
        })
        .collect()
}

/// Typical street names for placeholder addresses.
pub fn default_street_names() -> Vec<String> {
    [
        "Rue de la République", "Avenue Victor Hugo", "Boulevard Jean Jaurès",
        "Rue du Commerce", "Place de la Mairie", "Rue Nationale",
        "Avenue de la Liberté", "Rue du Marché", "Boulevard Gambetta",
        "Rue Saint-Jean", "Avenue des Champs", "Rue de l'Église",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let config = PipelineConfig::load(None).unwrap();
        assert_eq!(config.data_path, PathBuf::from("data/mof-data.json"));
        assert_eq!(config.food_categories.len(), 16);
        assert_eq!(config.max_geocode, None);
        assert_eq!(config.city_catalog.len(), 20);
        assert_eq!(config.street_names.len(), 12);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let dir = std::env::temp_dir().join(format!("mof_config_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, r#"{"data_path": "out/dataset.json", "max_geocode": 25}"#).unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data_path, PathBuf::from("out/dataset.json"));
        assert_eq!(config.max_geocode, Some(25));
        assert_eq!(config.public_path, PathBuf::from("public/data.json"));
        assert!(!config.food_categories.is_empty());
    }

    #[test]
    fn bad_config_is_an_error() {
        let dir = std::env::temp_dir().join(format!("mof_config_bad_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(PipelineConfig::load(Some(&path)).is_err());
    }
}
