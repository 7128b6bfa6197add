//! Place normalization: caller records into one indexed place table.
//!
//! Hotels come first, then attractions, so indices are dense over `[0, n)`
//! and the hotel/attraction split is a single boundary.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Visit duration assumed for an attraction that does not state one.
pub const DEFAULT_VISIT_HOURS: f64 = 1.0;

/// Name and coordinates of the stand-in hotel used when the caller supplies none.
pub const FALLBACK_HOTEL_NAME: &str = "Default Hotel";
pub const FALLBACK_HOTEL_LOCATION: (f64, f64) = (0.0, 0.0);

/// A loosely-typed place record as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceInput {
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Visit duration in hours. Ignored for hotels.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl PlaceInput {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: Some(name.into()),
            lat,
            lon,
            duration: None,
        }
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = Some(hours);
        self
    }

    fn usable_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

/// A validated place with its dense index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub index: usize,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Hours spent at the place; always zero for hotels.
    pub visit_duration: f64,
    pub is_hotel: bool,
}

impl Place {
    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// The indexed place table for one optimization call.
#[derive(Debug, Clone)]
pub struct PlaceTable {
    places: Vec<Place>,
    hotel_count: usize,
    synthetic_hotel: bool,
}

impl PlaceTable {
    /// Merges hotels and attractions into one table.
    ///
    /// Returns `None` when no attraction survives name filtering. Hotels
    /// without a usable name are dropped; if none remain a synthetic hotel
    /// at [`FALLBACK_HOTEL_LOCATION`] takes their place.
    pub fn normalize(hotels: &[PlaceInput], attractions: &[PlaceInput]) -> Option<Self> {
        let mut places = Vec::with_capacity(hotels.len() + attractions.len() + 1);

        for input in hotels {
            let Some(name) = input.usable_name() else {
                warn!(lat = input.lat, lon = input.lon, "dropping hotel without a name");
                continue;
            };
            places.push(Place {
                index: places.len(),
                name: name.to_string(),
                lat: input.lat,
                lon: input.lon,
                visit_duration: 0.0,
                is_hotel: true,
            });
        }

        let synthetic_hotel = places.is_empty();
        if synthetic_hotel {
            warn!("no named hotel supplied, falling back to {}", FALLBACK_HOTEL_NAME);
            places.push(Place {
                index: 0,
                name: FALLBACK_HOTEL_NAME.to_string(),
                lat: FALLBACK_HOTEL_LOCATION.0,
                lon: FALLBACK_HOTEL_LOCATION.1,
                visit_duration: 0.0,
                is_hotel: true,
            });
        }
        let hotel_count = places.len();

        for input in attractions {
            let Some(name) = input.usable_name() else {
                warn!(lat = input.lat, lon = input.lon, "dropping attraction without a name");
                continue;
            };
            let visit_duration = input
                .duration
                .filter(|hours| hours.is_finite() && *hours >= 0.0)
                .unwrap_or(DEFAULT_VISIT_HOURS);
            places.push(Place {
                index: places.len(),
                name: name.to_string(),
                lat: input.lat,
                lon: input.lon,
                visit_duration,
                is_hotel: false,
            });
        }

        if places.len() == hotel_count {
            return None;
        }

        Some(Self {
            places,
            hotel_count,
            synthetic_hotel,
        })
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn get(&self, index: usize) -> Option<&Place> {
        self.places.get(index)
    }

    /// Index set `H`.
    pub fn hotels(&self) -> std::ops::Range<usize> {
        0..self.hotel_count
    }

    /// Index set `A`.
    pub fn attractions(&self) -> std::ops::Range<usize> {
        self.hotel_count..self.places.len()
    }

    pub fn is_hotel(&self, index: usize) -> bool {
        index < self.hotel_count
    }

    /// True when the caller supplied no usable hotel.
    pub fn has_synthetic_hotel(&self) -> bool {
        self.synthetic_hotel
    }

    pub fn locations(&self) -> Vec<(f64, f64)> {
        self.places.iter().map(Place::location).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotels_come_first_and_indices_are_dense() {
        let hotels = vec![PlaceInput::new("Hotel A", 13.75, 100.50)];
        let attractions = vec![
            PlaceInput::new("Wat Pho", 13.7465, 100.4927).with_duration(2.0),
            PlaceInput::new("Grand Palace", 13.75, 100.4913).with_duration(1.5),
        ];

        let table = PlaceTable::normalize(&hotels, &attractions).unwrap();

        assert_eq!(table.hotels(), 0..1);
        assert_eq!(table.attractions(), 1..3);
        for (i, place) in table.places().iter().enumerate() {
            assert_eq!(place.index, i);
        }
        assert!(table.is_hotel(0));
        assert!(!table.is_hotel(1));
    }

    #[test]
    fn test_hotel_duration_forced_to_zero() {
        let hotels = vec![PlaceInput::new("Hotel A", 0.0, 0.0).with_duration(5.0)];
        let attractions = vec![PlaceInput::new("Museum", 0.1, 0.1)];

        let table = PlaceTable::normalize(&hotels, &attractions).unwrap();

        assert_eq!(table.places()[0].visit_duration, 0.0);
        assert!(table.places()[0].is_hotel);
    }

    #[test]
    fn test_attraction_duration_defaults() {
        let hotels = vec![PlaceInput::new("Hotel A", 0.0, 0.0)];
        let attractions = vec![
            PlaceInput::new("No Duration", 0.1, 0.1),
            PlaceInput::new("Negative", 0.2, 0.2).with_duration(-3.0),
            PlaceInput::new("NaN", 0.3, 0.3).with_duration(f64::NAN),
            PlaceInput::new("Zero", 0.4, 0.4).with_duration(0.0),
        ];

        let table = PlaceTable::normalize(&hotels, &attractions).unwrap();
        let durations: Vec<f64> = table.places()[1..].iter().map(|p| p.visit_duration).collect();

        assert_eq!(durations, vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_nameless_places_are_rejected() {
        let hotels = vec![PlaceInput::new("Hotel A", 0.0, 0.0)];
        let attractions = vec![
            PlaceInput {
                name: None,
                lat: 0.1,
                lon: 0.1,
                duration: Some(1.0),
            },
            PlaceInput::new("   ", 0.2, 0.2),
        ];

        assert!(PlaceTable::normalize(&hotels, &attractions).is_none());
    }

    #[test]
    fn test_missing_hotels_fall_back_to_synthetic() {
        let attractions = vec![PlaceInput::new("Museum", 0.1, 0.1)];

        let table = PlaceTable::normalize(&[], &attractions).unwrap();

        assert!(table.has_synthetic_hotel());
        assert_eq!(table.places()[0].name, FALLBACK_HOTEL_NAME);
        assert_eq!(table.places()[0].location(), FALLBACK_HOTEL_LOCATION);
        assert_eq!(table.attractions(), 1..2);
    }

    #[test]
    fn test_duplicate_names_keep_distinct_indices() {
        let hotels = vec![PlaceInput::new("Twin", 0.0, 0.0)];
        let attractions = vec![PlaceInput::new("Twin", 1.0, 1.0)];

        let table = PlaceTable::normalize(&hotels, &attractions).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).map(|p| p.location()), Some((1.0, 1.0)));
        assert!(!table.get(1).unwrap().is_hotel);
    }

    #[test]
    fn test_names_are_trimmed() {
        let hotels = vec![PlaceInput::new("  Hotel A ", 0.0, 0.0)];
        let attractions = vec![PlaceInput::new("Museum\n", 0.1, 0.1)];

        let table = PlaceTable::normalize(&hotels, &attractions).unwrap();

        assert_eq!(table.places()[0].name, "Hotel A");
        assert_eq!(table.places()[1].name, "Museum");
    }
}
