use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub(crate) const PATCH_CATALOG_ENV: &str = "COH2STATS_PATCH_CATALOG";
const PATCH_CATALOG_FILE_NAME: &str = "patches.json";

/// One shipped game version and the time span it was live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePeriod {
    pub identifier: String,
    pub reference_link: String,
    /// Inclusive, seconds since the unix epoch.
    pub start_instant: i64,
    /// Exclusive. `None` means the patch is still live.
    #[serde(default)]
    pub end_instant: Option<i64>,
}

impl ReleasePeriod {
    pub fn contains(&self, instant: i64) -> bool {
        if instant < self.start_instant {
            return false;
        }

        self.end_instant.map_or(true, |end| instant < end)
    }

    /// True when the period shares at least one instant with `[from, to)`.
    /// A missing bound extends the range without limit on that side.
    pub fn intersects(&self, from: Option<i64>, to: Option<i64>) -> bool {
        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return false;
            }
        }

        let starts_before_range_end = to.map_or(true, |to| self.start_instant < to);
        let ends_after_range_start = match (self.end_instant, from) {
            (Some(end), Some(from)) => end > from,
            _ => true,
        };

        starts_before_range_end && ends_after_range_start
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read patch catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse patch catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Patch catalog contains a period without identifier")]
    MissingIdentifier,
    #[error("Patch '{0}' is listed more than once")]
    DuplicateIdentifier(String),
    #[error("Patch '{identifier}' ends ({end}) before it starts ({start})")]
    InvalidBounds {
        identifier: String,
        start: i64,
        end: i64,
    },
}

/// Read-only set of release periods, validated once when loaded.
#[derive(Debug, Clone, Default)]
pub struct PatchCatalog {
    periods: Vec<ReleasePeriod>,
}

impl PatchCatalog {
    pub fn new(periods: Vec<ReleasePeriod>) -> Result<Self, CatalogError> {
        let mut seen_identifiers = BTreeSet::new();

        for period in &periods {
            if period.identifier.trim().is_empty() {
                return Err(CatalogError::MissingIdentifier);
            }

            if !seen_identifiers.insert(period.identifier.as_str()) {
                return Err(CatalogError::DuplicateIdentifier(period.identifier.clone()));
            }

            if let Some(end) = period.end_instant {
                if period.start_instant >= end {
                    return Err(CatalogError::InvalidBounds {
                        identifier: period.identifier.clone(),
                        start: period.start_instant,
                        end,
                    });
                }
            }
        }

        Ok(Self { periods })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw_json: &str) -> Result<Self, CatalogError> {
        let periods = serde_json::from_str::<Vec<ReleasePeriod>>(raw_json)?;
        Self::new(periods)
    }

    /// Loads the catalog file, falling back to an empty catalog when the
    /// file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw_json = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    catalog_path = %path.display(),
                    "Patch catalog not found, timeline annotations are disabled"
                );
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(CatalogError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let catalog = Self::from_json_str(&raw_json)?;
        tracing::info!(
            catalog_path = %path.display(),
            period_count = catalog.len(),
            "Loaded patch catalog"
        );

        Ok(catalog)
    }

    pub fn periods(&self) -> &[ReleasePeriod] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Every period live at `instant`, in catalog order. An absent instant
    /// matches nothing.
    pub fn periods_overlapping(&self, instant: Option<i64>) -> Vec<&ReleasePeriod> {
        let Some(instant) = instant else {
            return Vec::new();
        };

        self.periods
            .iter()
            .filter(|period| period.contains(instant))
            .collect()
    }
}

pub(crate) fn resolve_catalog_path(data_directory: &Path) -> PathBuf {
    catalog_path_with_override(data_directory, std::env::var_os(PATCH_CATALOG_ENV))
}

fn catalog_path_with_override(data_directory: &Path, override_path: Option<OsString>) -> PathBuf {
    override_path
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| data_directory.join(PATCH_CATALOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{catalog_path_with_override, CatalogError, PatchCatalog, ReleasePeriod};
    use std::ffi::OsString;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn period(identifier: &str, start: i64, end: Option<i64>) -> ReleasePeriod {
        ReleasePeriod {
            identifier: identifier.to_string(),
            reference_link: format!("https://example.com/patches/{identifier}"),
            start_instant: start,
            end_instant: end,
        }
    }

    #[test]
    fn containment_respects_inclusive_start_and_exclusive_end() {
        let bounded = period("4.0", 1000, Some(2000));
        assert!(!bounded.contains(999));
        assert!(bounded.contains(1000));
        assert!(bounded.contains(1999));
        assert!(!bounded.contains(2000));

        let live = period("4.1", 2000, None);
        assert!(!live.contains(1999));
        assert!(live.contains(2000));
        assert!(live.contains(i64::MAX));
    }

    #[test]
    fn intersection_treats_missing_bounds_as_unbounded() {
        let short_lived = period("4.05", 1600, Some(1700));
        assert!(short_lived.intersects(Some(1500), Some(2500)));
        assert!(short_lived.intersects(None, Some(1650)));
        assert!(short_lived.intersects(Some(1650), None));
        assert!(!short_lived.intersects(Some(1700), Some(2500)));
        assert!(!short_lived.intersects(Some(1000), Some(1600)));
        assert!(!short_lived.intersects(Some(1650), Some(1650)));
    }

    #[test]
    fn absent_instant_matches_nothing() {
        let catalog = PatchCatalog::new(vec![period("4.0", i64::MIN, None)])
            .expect("Expected catalog to be valid");

        assert!(catalog.periods_overlapping(None).is_empty());
        assert_eq!(catalog.periods_overlapping(Some(0)).len(), 1);
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let result = PatchCatalog::new(vec![
            period("4.0", 1000, Some(2000)),
            period("4.0", 3000, None),
        ]);

        assert!(matches!(
            result,
            Err(CatalogError::DuplicateIdentifier(identifier)) if identifier == "4.0"
        ));
    }

    #[test]
    fn rejects_periods_that_end_before_they_start() {
        let result = PatchCatalog::new(vec![period("4.0", 2000, Some(2000))]);
        assert!(matches!(result, Err(CatalogError::InvalidBounds { .. })));

        let result = PatchCatalog::new(vec![period("  ", 1000, None)]);
        assert!(matches!(result, Err(CatalogError::MissingIdentifier)));
    }

    #[test]
    fn parses_catalog_with_open_ended_patch() {
        let catalog = PatchCatalog::from_json_str(
            r#"[
                {"identifier": "4.0", "referenceLink": "https://example.com/4.0", "startInstant": 1000, "endInstant": 2000},
                {"identifier": "4.1", "referenceLink": "https://example.com/4.1", "startInstant": 2000, "endInstant": null},
                {"identifier": "4.2", "referenceLink": "https://example.com/4.2", "startInstant": 3000}
            ]"#,
        )
        .expect("Expected catalog JSON to parse");

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.periods()[0].end_instant, Some(2000));
        assert_eq!(catalog.periods()[1].end_instant, None);
        assert_eq!(catalog.periods()[2].end_instant, None);
    }

    #[test]
    fn catalog_path_override_wins_over_data_directory() {
        let data_directory = Path::new("/data/coh2stats");

        assert_eq!(
            catalog_path_with_override(data_directory, None),
            data_directory.join("patches.json")
        );
        assert_eq!(
            catalog_path_with_override(data_directory, Some(OsString::new())),
            data_directory.join("patches.json")
        );
        assert_eq!(
            catalog_path_with_override(data_directory, Some(OsString::from("/etc/patches.json"))),
            Path::new("/etc/patches.json")
        );
    }

    #[test]
    fn missing_catalog_file_loads_as_empty() {
        let timestamp_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let missing_path = std::env::temp_dir().join(format!(
            "coh2stats_missing_catalog_{}_{timestamp_nanos}.json",
            std::process::id()
        ));

        let catalog =
            PatchCatalog::load_from_path(&missing_path).expect("Expected missing file to be fine");
        assert!(catalog.is_empty());
    }

    #[test]
    fn loads_catalog_from_file() {
        let timestamp_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let catalog_path = std::env::temp_dir().join(format!(
            "coh2stats_catalog_{}_{timestamp_nanos}.json",
            std::process::id()
        ));
        std::fs::write(
            &catalog_path,
            r#"[{"identifier": "4.0", "referenceLink": "", "startInstant": 1000}]"#,
        )
        .expect("Failed to write test catalog");

        let catalog =
            PatchCatalog::load_from_path(&catalog_path).expect("Expected catalog file to load");
        assert_eq!(catalog.len(), 1);

        std::fs::remove_file(&catalog_path).expect("Failed to remove test catalog");
    }
}
