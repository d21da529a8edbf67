use tracing::{info, warn};

use crate::model::{Collection, Coordinates, RawRecord, Record};

/// Outcome of one reconciliation pass.
pub struct ReconcileSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Indices into the collection of records that were inserted with
    /// an address or whose address changed, i.e. the ones the caller
    /// must (re-)geocode.
    pub needs_geocode: Vec<usize>,
}

impl ReconcileSummary {
    pub fn print(&self) {
        println!(
            "Reconciled: {} inserted, {} updated, {} unchanged ({} to geocode).",
            self.inserted,
            self.updated,
            self.skipped,
            self.needs_geocode.len(),
        );
    }
}

/// Merge incoming raw records into the collection.
///
/// Identity is case-insensitive name equality, nothing else: two
/// distinct people sharing a name merge into one record. Matched
/// records only take the fields the incoming side actually supplies;
/// an address change invalidates cached coordinates. Unmatched records
/// are appended with fresh ids, strictly greater than every prior id.
pub fn reconcile(collection: &mut Collection, incoming: &[RawRecord]) -> ReconcileSummary {
    let mut summary = ReconcileSummary {
        inserted: 0,
        updated: 0,
        skipped: 0,
        needs_geocode: Vec::new(),
    };
    let mut next_id = collection.next_id();

    for raw in incoming {
        if raw.name.trim().is_empty() {
            warn!("Skipping incoming record with empty name");
            summary.skipped += 1;
            continue;
        }

        match collection.find_by_name(&raw.name) {
            Some(idx) => {
                let record = &mut collection.mof[idx];
                let mut changed = false;
                let mut address_changed = false;

                if let Some(addr) = &raw.address {
                    if record.address.as_deref() != Some(addr.as_str()) {
                        record.address = Some(addr.clone());
                        address_changed = true;
                        changed = true;
                    }
                }
                if let Some(site) = &raw.website {
                    if record.website.as_deref() != Some(site.as_str()) {
                        record.website = Some(site.clone());
                        changed = true;
                    }
                }
                if record.specialty.is_none() && raw.specialty.is_some() {
                    record.specialty = raw.specialty.clone();
                    changed = true;
                } else if let (Some(old), Some(new)) = (&record.specialty, &raw.specialty) {
                    if !old.eq_ignore_ascii_case(new) {
                        // Possible same-name collision between two people.
                        info!(
                            "'{}' seen with specialty '{}' (kept '{}')",
                            record.name, new, old
                        );
                    }
                }
                if record.year.is_none() && raw.year.is_some() {
                    record.year = raw.year;
                    changed = true;
                }

                if address_changed {
                    record.coordinates = Coordinates::none();
                    summary.needs_geocode.push(idx);
                }
                if changed {
                    summary.updated += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            None => {
                let has_address = raw.address.is_some();
                collection.mof.push(Record {
                    id: next_id,
                    name: raw.name.clone(),
                    specialty: raw.specialty.clone(),
                    address: raw.address.clone(),
                    year: raw.year,
                    website: raw.website.clone(),
                    coordinates: Coordinates::none(),
                });
                next_id += 1;
                summary.inserted += 1;
                if has_address {
                    summary.needs_geocode.push(collection.mof.len() - 1);
                }
            }
        }
    }

    summary
}

/// Trust-list cleansing pass: any record whose name is not on the
/// allow-list has its address and coordinates forcibly cleared.
/// Returns the number of records cleared. Runs on its own, never in
/// the same pass as `reconcile`.
pub fn cleanse(collection: &mut Collection, trust: &[String]) -> usize {
    let mut cleared = 0;
    for record in &mut collection.mof {
        if trust.iter().any(|name| record.name_matches(name)) {
            continue;
        }
        if record.address.is_some() || record.coordinates.is_resolved() {
            record.address = None;
            record.coordinates = Coordinates::none();
            cleared += 1;
        }
    }
    cleared
}

// ── Tests ──
