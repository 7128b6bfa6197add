//! Real Bangkok locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

/// A named location with coordinates and a typical visit length.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub visit_hours: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64, visit_hours: f64) -> Self {
        Self {
            name,
            lat,
            lon,
            visit_hours,
        }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

// ============================================================================
// Hotels (depots)
// ============================================================================

pub const HOTELS: &[Location] = &[
    Location::new("Democracy Monument Inn", 13.7563, 100.5018, 0.0),
    Location::new("Mandarin Oriental", 13.7237, 100.5147, 0.0),
    Location::new("Siam Kempinski", 13.7490, 100.5347, 0.0),
];

// ============================================================================
// Old Town attractions
// ============================================================================

pub const OLD_TOWN: &[Location] = &[
    Location::new("Grand Palace", 13.7500, 100.4913, 1.0),
    Location::new("Wat Arun", 13.7437, 100.4889, 2.0),
    Location::new("Wat Pho", 13.7465, 100.4927, 1.5),
    Location::new("Wat Saket", 13.7538, 100.5066, 1.0),
    Location::new("Khao San Road", 13.7588, 100.4973, 1.0),
];

// ============================================================================
// Downtown attractions
// ============================================================================

pub const DOWNTOWN: &[Location] = &[
    Location::new("Jim Thompson House", 13.7492, 100.5281, 1.5),
    Location::new("Lumphini Park", 13.7314, 100.5414, 1.0),
    Location::new("Erawan Shrine", 13.7444, 100.5404, 0.5),
    Location::new("Chatuchak Market", 13.7999, 100.5500, 3.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_bangkok_area() {
        for loc in HOTELS.iter().chain(OLD_TOWN).chain(DOWNTOWN) {
            assert!(loc.lat > 13.6 && loc.lat < 13.9, "{} lat out of range: {}", loc.name, loc.lat);
            assert!(loc.lon > 100.4 && loc.lon < 100.7, "{} lon out of range: {}", loc.name, loc.lon);
        }
    }
}
