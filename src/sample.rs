use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::info;

use crate::config::City;
use crate::model::{Collection, Coordinates};

/// Fill every record with a synthetic placeholder address and jittered
/// coordinates near a catalog city. Demonstration data only: the
/// caller must mark the save with the synthetic-provenance note so
/// downstream consumers know not to trust these.
///
/// All values derive from the record id, so repeated passes over the
/// same collection produce the same placeholders. Returns the number
/// of records filled.
pub fn fill_placeholders(
    collection: &mut Collection,
    cities: &[City],
    streets: &[String],
) -> usize {
    if cities.is_empty() || streets.is_empty() {
        info!("Empty city catalog or street list; nothing to fill");
        return 0;
    }

    for record in &mut collection.mof {
        let city = &cities[(mix(record.id, 0) % cities.len() as u64) as usize];
        let street = &streets[(mix(record.id, 1) % streets.len() as u64) as usize];
        let street_number = 1 + mix(record.id, 2) % 200;
        let postcode_suffix = 100 + mix(record.id, 3) % 900;

        record.address = Some(format!(
            "{} {}, {}{} {}",
            street_number, street, city.dept, postcode_suffix, city.name
        ));
        record.coordinates = Coordinates {
            lat: Some(round6(city.lat + jitter(record.id, 4))),
            lon: Some(round6(city.lon + jitter(record.id, 5))),
        };
    }

    collection.mof.len()
}

fn mix(id: u64, salt: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    (id, salt).hash(&mut hasher);
    hasher.finish()
}

/// Deterministic offset in [-0.05, 0.05] degrees.
fn jitter(id: u64, salt: u64) -> f64 {
    let unit = (mix(id, salt) % 100_001) as f64 / 100_000.0;
    unit * 0.1 - 0.05
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_city_catalog, default_street_names};
    use crate::model::Record;

    fn collection(ids: &[u64]) -> Collection {
        let mut c = Collection::empty("test");
        for &id in ids {
            c.mof.push(Record {
                id,
                name: format!("Person {}", id),
                specialty: None,
                address: None,
                year: None,
                website: None,
                coordinates: Coordinates::none(),
            });
        }
        c
    }

    #[test]
    fn every_record_gets_address_and_coordinates() {
        let mut c = collection(&[1, 2, 3, 40, 500]);
        let filled =
            fill_placeholders(&mut c, &default_city_catalog(), &default_street_names());

        assert_eq!(filled, 5);
        for record in &c.mof {
            assert!(record.address.is_some());
            assert!(record.coordinates.is_resolved());
        }
    }

    #[test]
    fn placeholders_are_deterministic() {
        let cities = default_city_catalog();
        let streets = default_street_names();
        let mut a = collection(&[1, 2, 3]);
        let mut b = collection(&[1, 2, 3]);
        fill_placeholders(&mut a, &cities, &streets);
        fill_placeholders(&mut b, &cities, &streets);
        assert_eq!(a.mof, b.mof);
    }

    #[test]
    fn coordinates_stay_near_a_catalog_city() {
        let cities = default_city_catalog();
        let mut c = collection(&[7]);
        fill_placeholders(&mut c, &cities, &default_street_names());

        let coords = c.mof[0].coordinates;
        let near = cities.iter().any(|city| {
            (coords.lat.unwrap() - city.lat).abs() <= 0.05 + 1e-6
                && (coords.lon.unwrap() - city.lon).abs() <= 0.05 + 1e-6
        });
        assert!(near, "placeholder coordinates not near any catalog city");
    }

    #[test]
    fn existing_addresses_are_replaced() {
        // The pass overwrites the whole collection, verified or not;
        // the synthetic note is what flags the result as untrusted.
        let mut c = collection(&[1]);
        c.mof[0].address = Some("9 place de la Madeleine, 75008 Paris".to_string());
        c.mof[0].coordinates = Coordinates { lat: Some(48.87), lon: Some(2.32) };

        fill_placeholders(&mut c, &default_city_catalog(), &default_street_names());
        assert_ne!(
            c.mof[0].address.as_deref(),
            Some("9 place de la Madeleine, 75008 Paris")
        );
    }

    #[test]
    fn empty_catalog_is_a_no_op() {
        let mut c = collection(&[1]);
        let filled = fill_placeholders(&mut c, &[], &default_street_names());
        assert_eq!(filled, 0);
        assert_eq!(c.mof[0].address, None);
    }
}
