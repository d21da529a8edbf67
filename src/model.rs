use serde::{Deserialize, Serialize};

/// Geographic coordinates. Both fields are null until an address has
/// been geocoded successfully.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coordinates {
    pub fn none() -> Self {
        Coordinates { lat: None, lon: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Coordinates::none()
    }
}

/// One craftsperson entry in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub specialty: Option<String>,
    pub address: Option<String>,
    pub year: Option<i32>,
    pub website: Option<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
}

impl Record {
    /// Identity comparison: case-insensitive name equality.
    pub fn name_matches(&self, other: &str) -> bool {
        self.name.to_lowercase() == other.to_lowercase()
    }
}

/// Raw candidate record as produced by a record source, before it has
/// been reconciled into the collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub total: usize,
    pub generated_at: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The persisted dataset: metadata plus the ordered record list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub meta: Meta,
    pub mof: Vec<Record>,
}

impl Collection {
    /// Fresh collection with no records, used when bootstrapping from
    /// a first scrape.
    pub fn empty(source: &str) -> Self {
        Collection {
            meta: Meta {
                total: 0,
                generated_at: String::new(),
                source: source.to_string(),
                note: None,
            },
            mof: Vec::new(),
        }
    }

    /// Next id to mint: strictly greater than every id ever assigned.
    pub fn next_id(&self) -> u64 {
        self.mof.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.mof.iter().position(|r| r.name_matches(name))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, name: &str) -> Record {
        Record {
            id,
            name: name.to_string(),
            specialty: None,
            address: None,
            year: None,
            website: None,
            coordinates: Coordinates::none(),
        }
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let r = record(1, "Arnaud Larher");
        assert!(r.name_matches("ARNAUD LARHER"));
        assert!(r.name_matches("arnaud larher"));
        assert!(!r.name_matches("Arnaud Lahrer"));
    }

    #[test]
    fn name_match_handles_accents() {
        let r = record(1, "Frédéric Lalos");
        assert!(r.name_matches("FRÉDÉRIC LALOS"));
    }

    #[test]
    fn next_id_is_max_plus_one() {
        let mut c = Collection::empty("test");
        assert_eq!(c.next_id(), 1);
        c.mof.push(record(3, "A"));
        c.mof.push(record(7, "B"));
        assert_eq!(c.next_id(), 8);
    }

    #[test]
    fn record_json_keeps_null_fields() {
        let r = record(1, "Jean Dupont");
        let json = serde_json::to_string(&r).unwrap();
        // Downstream consumers rely on nulls being present, not absent.
        assert!(json.contains("\"address\":null"));
        assert!(json.contains("\"lat\":null"));
    }

    #[test]
    fn meta_note_absent_when_unset() {
        let c = Collection::empty("src");
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("note"));
    }
}
