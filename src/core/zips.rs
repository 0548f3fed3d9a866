use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors loading the zip-centroid data asset
#[derive(Debug, Error)]
pub enum CentroidError {
    #[error("Failed to read centroid table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse centroid table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Geographic center of one zip code
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lng: f64,
}

/// Zip -> centroid lookup for the served metro.
///
/// Loaded from a TOML asset at startup so the serving region can change
/// without a code edit. Zips missing from the table are dropped from
/// geographic output; that is an expected gap, not an error.
#[derive(Debug, Clone, Default)]
pub struct ZipCentroids {
    centroids: HashMap<String, Centroid>,
}

#[derive(Debug, Deserialize)]
struct CentroidFile {
    centroids: HashMap<String, Centroid>,
}

impl ZipCentroids {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CentroidError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CentroidError> {
        let file: CentroidFile = toml::from_str(raw)?;
        Ok(Self { centroids: file.centroids })
    }

    pub fn get(&self, zip: &str) -> Option<Centroid> {
        self.centroids.get(zip.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[centroids]
78704 = { lat = 30.2430, lng = -97.7650 }
78745 = { lat = 30.2070, lng = -97.7950 }
"#;

    #[test]
    fn test_parse_and_lookup() {
        let table = ZipCentroids::from_toml_str(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);

        let centroid = table.get("78704").unwrap();
        assert!((centroid.lat - 30.2430).abs() < 1e-9);
        assert!((centroid.lng - -97.7650).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_zip_is_none() {
        let table = ZipCentroids::from_toml_str(SAMPLE).unwrap();
        assert!(table.get("10001").is_none());
    }

    #[test]
    fn test_lookup_trims_whitespace() {
        let table = ZipCentroids::from_toml_str(SAMPLE).unwrap();
        assert!(table.get(" 78745 ").is_some());
    }

    #[test]
    fn test_malformed_table_rejected() {
        assert!(ZipCentroids::from_toml_str("centroids = 4").is_err());
    }

    #[test]
    fn test_shipped_asset_parses() {
        let table = ZipCentroids::from_toml_str(include_str!("../../config/zip_centroids.toml")).unwrap();
        assert!(table.len() >= 60);
        assert!(table.get("78739").is_some());
    }
}
