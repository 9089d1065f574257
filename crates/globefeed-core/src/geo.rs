//! Country centroid lookup for heuristic event placement.
//!
//! Used when the model cannot supply coordinates: the fallback path anchors an
//! event at the centroid of its country (ISO-2 code), defaulting to the US
//! when the country is unknown.

use crate::types::Coordinates;

/// Approximate geographic centroids, ISO 3166-1 alpha-2 keyed.
///
/// Covers the markets the upstream providers actually tag; anything else
/// falls back to [`DEFAULT_CENTROID`].
const CENTROIDS: &[(&str, f64, f64)] = &[
    ("US", 39.8283, -98.5795),
    ("GB", 55.3781, -3.4360),
    ("DE", 51.1657, 10.4515),
    ("FR", 46.2276, 2.2137),
    ("IT", 41.8719, 12.5674),
    ("ES", 40.4637, -3.7492),
    ("CH", 46.8182, 8.2275),
    ("NL", 52.1326, 5.2913),
    ("SE", 60.1282, 18.6435),
    ("JP", 36.2048, 138.2529),
    ("CN", 35.8617, 104.1954),
    ("HK", 22.3193, 114.1694),
    ("SG", 1.3521, 103.8198),
    ("IN", 20.5937, 78.9629),
    ("KR", 35.9078, 127.7669),
    ("TW", 23.6978, 120.9605),
    ("AU", -25.2744, 133.7751),
    ("NZ", -40.9006, 174.8860),
    ("CA", 56.1304, -106.3468),
    ("MX", 23.6345, -102.5528),
    ("BR", -14.2350, -51.9253),
    ("AR", -38.4161, -63.6167),
    ("ZA", -30.5595, 22.9375),
    ("NG", 9.0820, 8.6753),
    ("EG", 26.8206, 30.8025),
    ("SA", 23.8859, 45.0792),
    ("AE", 23.4241, 53.8478),
    ("IL", 31.0461, 34.8516),
    ("TR", 38.9637, 35.2433),
    ("RU", 61.5240, 105.3188),
    ("UA", 48.3794, 31.1656),
    ("PL", 51.9194, 19.1451),
    ("NO", 60.4720, 8.4689),
    ("DK", 56.2639, 9.5018),
    ("FI", 61.9241, 25.7482),
    ("IE", 53.4129, -8.2439),
    ("BE", 50.5039, 4.4699),
    ("AT", 47.5162, 14.5501),
    ("PT", 39.3999, -8.2245),
    ("GR", 39.0742, 21.8243),
    ("ID", -0.7893, 113.9213),
    ("MY", 4.2105, 101.9758),
    ("TH", 15.8700, 100.9925),
    ("PH", 12.8797, 121.7740),
    ("VN", 14.0583, 108.2772),
    ("CL", -35.6751, -71.5430),
    ("CO", 4.5709, -74.2973),
    ("PE", -9.1900, -75.0152),
];

/// Centroid used when the country is unknown or unmapped (continental US).
pub const DEFAULT_CENTROID: Coordinates = Coordinates {
    lat: 39.8283,
    lng: -98.5795,
};

/// Look up the centroid for an ISO-2 country code (case-insensitive).
#[must_use]
pub fn country_centroid(code: &str) -> Option<Coordinates> {
    let upper = code.to_ascii_uppercase();
    CENTROIDS
        .iter()
        .find(|(cc, _, _)| *cc == upper)
        .map(|&(_, lat, lng)| Coordinates { lat, lng })
}

/// Centroid for a country code, or [`DEFAULT_CENTROID`] when unmapped.
#[must_use]
pub fn centroid_or_default(code: Option<&str>) -> Coordinates {
    code.and_then(country_centroid).unwrap_or(DEFAULT_CENTROID)
}
