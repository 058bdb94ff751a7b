//! Persisted resume markers
//!
//! After each written tweet the store records the newest tweet id and the
//! latest creation date seen, so a later run can pass them as `since_id`
//! and `since` to fetch only newer results.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dates;
use crate::types::Tweet;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeMarkers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_id: Option<u64>,
    /// `%Y-%m-%d`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_date: Option<String>,
}

/// JSON file holding [`ResumeMarkers`]
#[derive(Debug, Clone)]
pub struct ResumeStore {
    path: PathBuf,
    markers: ResumeMarkers,
}

impl ResumeStore {
    /// Load the store, starting empty when the file is absent or blank
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let markers = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => ResumeMarkers::default(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| Error::Json {
                message: format!("corrupt resume file {}: {}", path.display(), source),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ResumeMarkers::default(),
            Err(source) => {
                return Err(Error::Io {
                    message: format!("cannot read resume file {}: {}", path.display(), source),
                    source,
                })
            }
        };
        tracing::debug!(path = %path.display(), ?markers, "Resume markers loaded");
        Ok(Self { path, markers })
    }

    /// Discard stored markers and start over
    pub fn reset(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            path: path.into(),
            markers: ResumeMarkers::default(),
        };
        store.persist()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn markers(&self) -> &ResumeMarkers {
        &self.markers
    }

    /// Raise the markers to cover `tweet`; persists when anything moved
    pub fn observe(&mut self, tweet: &Tweet) -> Result<bool> {
        let mut changed = false;

        if let Some(id) = tweet.id() {
            if self.markers.since_id.map_or(true, |current| id > current) {
                self.markers.since_id = Some(id);
                changed = true;
            }
        }

        if let Some(created_at) = tweet.created_at() {
            let date = dates::to_date_string(&dates::parse_created_at(created_at)?);
            if self
                .markers
                .since_date
                .as_deref()
                .map_or(true, |current| date.as_str() > current)
            {
                self.markers.since_date = Some(date);
                changed = true;
            }
        }

        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    /// Command-line value first, stored marker second
    pub fn effective_since_id(&self, option: Option<u64>) -> Option<u64> {
        option.or(self.markers.since_id)
    }

    pub fn effective_since_date(&self, option: Option<&str>) -> Option<String> {
        option
            .map(str::to_string)
            .or_else(|| self.markers.since_date.clone())
    }

    fn persist(&self) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.markers)?;
        fs::write(&self.path, body).map_err(|source| Error::Io {
            message: format!("cannot write resume file {}: {}", self.path.display(), source),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tweet(id: u64, created_at: &str) -> Tweet {
        Tweet::new(json!({"id": id, "created_at": created_at}))
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::open(dir.path().join("resume.json")).unwrap();
        assert_eq!(store.markers(), &ResumeMarkers::default());
    }

    #[test]
    fn test_observe_is_monotonic_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.json");
        let mut store = ResumeStore::open(&path).unwrap();

        assert!(store.observe(&tweet(20, "Thu Jun 04 01:00:01 +0000 2020")).unwrap());
        assert!(!store.observe(&tweet(10, "Wed Jun 03 01:00:01 +0000 2020")).unwrap());
        assert!(store.observe(&tweet(30, "Thu Jun 04 02:00:00 +0000 2020")).unwrap());

        let reloaded = ResumeStore::open(&path).unwrap();
        assert_eq!(reloaded.markers().since_id, Some(30));
        assert_eq!(reloaded.markers().since_date.as_deref(), Some("2020-06-04"));
    }

    #[test]
    fn test_reset_discards_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.json");
        fs::write(&path, r#"{"since_id": 5, "since_date": "2020-01-01"}"#).unwrap();

        assert_eq!(ResumeStore::open(&path).unwrap().markers().since_id, Some(5));
        let store = ResumeStore::reset(&path).unwrap();
        assert_eq!(store.markers(), &ResumeMarkers::default());
        assert_eq!(ResumeStore::open(&path).unwrap().markers().since_id, None);
    }

    #[test]
    fn test_option_overrides_stored_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.json");
        fs::write(&path, r#"{"since_id": 5, "since_date": "2020-01-01"}"#).unwrap();
        let store = ResumeStore::open(&path).unwrap();

        assert_eq!(store.effective_since_id(Some(9)), Some(9));
        assert_eq!(store.effective_since_id(None), Some(5));
        assert_eq!(store.effective_since_date(None).as_deref(), Some("2020-01-01"));
        assert_eq!(store.effective_since_date(Some("2021-02-03")).as_deref(), Some("2021-02-03"));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(ResumeStore::open(&path), Err(Error::Json { .. })));
    }
}
