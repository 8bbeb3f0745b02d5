use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sources::SourceFormat;

/// Where one city's raw export lives and which layout it uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CitySource {
    pub format: SourceFormat,
    pub path: PathBuf,
}

/// Maps city names to their raw exports.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "NYC": { "format": "nyc", "path": "data/NYC-CitiBike-2016.csv" },
///   "Chicago": { "format": "chicago", "path": "data/Chicago-Divvy-2016.csv" },
///   "Washington": { "format": "washington", "path": "data/Washington-CapitalBikeshare-2016.csv" }
/// }
/// ```
/// Relative paths are resolved against the manifest's own directory.
#[derive(Debug, Clone, Default)]
pub struct CityManifest {
    entries: BTreeMap<String, CitySource>,
}

impl CityManifest {
    /// Loads the manifest from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?;
        let mut manifest = Self::from_json(&content)
            .with_context(|| format!("invalid manifest '{}'", path.display()))?;

        if let Some(base) = path.parent() {
            for source in manifest.entries.values_mut() {
                if source.path.is_relative() {
                    source.path = base.join(&source.path);
                }
            }
        }
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: BTreeMap<String, CitySource> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    /// Iterates over all `(city, source)` pairs in city-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CitySource)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = r#"{
            "Washington": { "format": "washington", "path": "dc.csv" },
            "Chicago": { "format": "chicago", "path": "/data/chicago.csv" }
        }"#;
        let manifest = CityManifest::from_json(json).unwrap();
        assert_eq!(manifest.len(), 2);

        let cities: Vec<_> = manifest.iter().collect();
        assert_eq!(cities[0].0, "Chicago");
        assert_eq!(cities[0].1.format, SourceFormat::Chicago);
        assert_eq!(cities[1].0, "Washington");
        assert_eq!(cities[1].1.path, PathBuf::from("dc.csv"));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let json = r#"{ "Boston": { "format": "boston", "path": "b.csv" } }"#;
        assert!(CityManifest::from_json(json).is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.json");
        let json = r#"{ "NYC": { "format": "nyc", "path": "nyc.csv" } }"#;
        std::fs::write(&path, json).unwrap();

        let manifest = CityManifest::load(&path).unwrap();
        let (city, source) = manifest.iter().next().unwrap();
        assert_eq!(city, "NYC");
        assert_eq!(source.path, dir.path().join("nyc.csv"));
    }
}
