//! # Station Map
//!
//! Binds ranges of the tuner dial to streaming radio stations.
//!
//! ## File Format
//!
//! Stations live in a JSON file (default `stations.json`):
//!
//! ```json
//! {
//!   "stations": [
//!     { "min": 10.0, "max": 18.0, "url": "http://stream.example.org/jazz" },
//!     { "min": 40.0, "max": 47.5, "url": "http://stream.example.org/news" }
//!   ]
//! }
//! ```
//!
//! A bare top-level array of the same records is accepted as well. Files are
//! always written back in the object form.
//!
//! ## Resolution
//!
//! Ranges are percentages of the dial (0 to 100), inclusive at both ends. They
//! may overlap or leave gaps. The **first** binding in file order that contains
//! the tuner position wins; positions that hit no binding resolve to `None`,
//! which the console plays as static. Station lists are short, so a linear
//! scan per tick is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading, validating or editing the station list.
#[derive(Error, Debug)]
pub enum StationError {
    /// Station file could not be read or written
    #[error("station file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Station file is not valid JSON in either accepted shape
    #[error("station file is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// A binding failed validation
    #[error("station {index}: {reason}")]
    Invalid { index: usize, reason: String },

    /// An edit referenced a station that does not exist
    #[error("no station at index {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One tuner range bound to a stream URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationBinding {
    /// Lower edge of the range in dial percent (inclusive)
    pub min: f64,
    /// Upper edge of the range in dial percent (inclusive)
    pub max: f64,
    /// Stream URL handed to the player
    pub url: String,
}

impl StationBinding {
    pub fn new(min: f64, max: f64, url: impl Into<String>) -> Self {
        Self {
            min,
            max,
            url: url.into(),
        }
    }

    /// True if `tuner_value` lies within `[min, max]`.
    pub fn contains(&self, tuner_value: f64) -> bool {
        self.min <= tuner_value && tuner_value <= self.max
    }

    fn validate(&self, index: usize) -> Result<(), StationError> {
        let invalid = |reason: String| StationError::Invalid { index, reason };

        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid(format!(
                "range bounds must be finite (min={}, max={})",
                self.min, self.max
            )));
        }
        if !(0.0..=100.0).contains(&self.min) || !(0.0..=100.0).contains(&self.max) {
            return Err(invalid(format!(
                "range {}..{} is outside 0..100",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(invalid(format!(
                "min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if self.url.trim().is_empty() {
            return Err(invalid("url is empty".to_string()));
        }
        Ok(())
    }
}

/// On-disk layout written by [`StationMap::save`].
#[derive(Serialize, Deserialize)]
struct StationFile {
    stations: Vec<StationBinding>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StationFileShape {
    Wrapped(StationFile),
    Bare(Vec<StationBinding>),
}

/// Ordered, validated list of station bindings.
///
/// An empty map is valid: every tuner position resolves to static.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StationMap {
    bindings: Vec<StationBinding>,
}

impl StationMap {
    /// Build a map from bindings, validating each one.
    pub fn new(bindings: Vec<StationBinding>) -> Result<Self, StationError> {
        for (index, binding) in bindings.iter().enumerate() {
            binding.validate(index)?;
        }
        Ok(Self { bindings })
    }

    /// Load and validate the station file at `path`.
    ///
    /// A missing file is an error: the console must not start without a map.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| StationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_json(&contents)?;
        log::info!(
            "Loaded {} station(s) from {}",
            map.bindings.len(),
            path.display()
        );
        Ok(map)
    }

    /// Parse and validate station JSON in either accepted shape.
    pub fn from_json(contents: &str) -> Result<Self, StationError> {
        let bindings = match serde_json::from_str::<StationFileShape>(contents)? {
            StationFileShape::Wrapped(file) => file.stations,
            StationFileShape::Bare(list) => list,
        };
        Self::new(bindings)
    }

    /// Serialize to pretty JSON in the object form.
    pub fn to_json(&self) -> Result<String, StationError> {
        let file = StationFile {
            stations: self.bindings.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Write the map to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StationError> {
        let path = path.as_ref();
        let mut contents = self.to_json()?;
        contents.push('\n');
        fs::write(path, contents).map_err(|source| StationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn bindings(&self) -> &[StationBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Stream URL of the first binding containing `tuner_value`.
    pub fn resolve(&self, tuner_value: f64) -> Option<&str> {
        self.bindings
            .iter()
            .find(|binding| binding.contains(tuner_value))
            .map(|binding| binding.url.as_str())
    }

    /// Append a binding. New stations go last so they never shadow
    /// an existing overlap.
    pub fn add(&mut self, binding: StationBinding) -> Result<(), StationError> {
        binding.validate(self.bindings.len())?;
        self.bindings.push(binding);
        Ok(())
    }

    /// Remove and return the binding at `index`.
    pub fn remove(&mut self, index: usize) -> Result<StationBinding, StationError> {
        self.check_index(index)?;
        Ok(self.bindings.remove(index))
    }

    /// Replace the binding at `index` in place and return the old one.
    ///
    /// The station keeps its position, so overlap priority is unchanged.
    pub fn update(
        &mut self,
        index: usize,
        binding: StationBinding,
    ) -> Result<StationBinding, StationError> {
        self.check_index(index)?;
        binding.validate(index)?;
        Ok(std::mem::replace(&mut self.bindings[index], binding))
    }

    /// Move a binding to a new position, shifting the ones in between.
    ///
    /// Position matters: it decides which station wins an overlap.
    pub fn move_binding(&mut self, from: usize, to: usize) -> Result<(), StationError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let binding = self.bindings.remove(from);
            self.bindings.insert(to, binding);
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), StationError> {
        if index < self.bindings.len() {
            Ok(())
        } else {
            Err(StationError::IndexOutOfRange {
                index,
                len: self.bindings.len(),
            })
        }
    }
}

/// Resolve a tuner position (dial percent) against `map`.
///
/// Returns `None` when no binding matches; that is the static path, not an error.
pub fn resolve(tuner_value: f64, map: &StationMap) -> Option<&str> {
    map.resolve(tuner_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn overlapping() -> StationMap {
        StationMap::new(vec![
            StationBinding::new(0.0, 50.0, "A"),
            StationBinding::new(25.0, 75.0, "B"),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let map = overlapping();
        assert_eq!(resolve(30.0, &map), Some("A"));
        assert_eq!(resolve(50.0, &map), Some("A"));
        assert_eq!(resolve(50.5, &map), Some("B"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let map = StationMap::new(vec![StationBinding::new(10.0, 20.0, "X")]).unwrap();
        assert_eq!(map.resolve(10.0), Some("X"));
        assert_eq!(map.resolve(20.0), Some("X"));
        assert_eq!(map.resolve(9.999), None);
        assert_eq!(map.resolve(20.001), None);
    }

    #[test]
    fn test_gap_resolves_to_none() {
        let map = StationMap::new(vec![
            StationBinding::new(0.0, 10.0, "low"),
            StationBinding::new(90.0, 100.0, "high"),
        ])
        .unwrap();
        assert_eq!(map.resolve(50.0), None);
    }

    #[test]
    fn test_empty_map_never_matches() {
        let map = StationMap::default();
        for value in [0.0, 33.3, 100.0] {
            assert_eq!(resolve(value, &map), None);
        }
    }

    #[test]
    fn test_order_not_width_decides() {
        // Narrow range listed first still beats the wide one
        let map = StationMap::new(vec![
            StationBinding::new(40.0, 45.0, "narrow"),
            StationBinding::new(0.0, 100.0, "wide"),
        ])
        .unwrap();
        assert_eq!(map.resolve(42.0), Some("narrow"));
        assert_eq!(map.resolve(60.0), Some("wide"));
    }

    #[test]
    fn test_parse_wrapped_and_bare_shapes() {
        let wrapped = r#"{"stations":[{"min":0,"max":10,"url":"http://a"}]}"#;
        let bare = r#"[{"min":0,"max":10,"url":"http://a"}]"#;
        let a = StationMap::from_json(wrapped).unwrap();
        let b = StationMap::from_json(bare).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.resolve(5.0), Some("http://a"));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let map = StationMap::from_json(r#"{"stations":[]}"#).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = StationMap::from_json(r#"{"stations": [ {"min": 1 "#).unwrap_err();
        assert!(matches!(err, StationError::Json(_)));

        let err = StationMap::from_json(r#"[{"min": 1, "max": 2}]"#).unwrap_err();
        assert!(matches!(err, StationError::Json(_)));
    }

    #[test]
    fn test_validation_names_entry() {
        let json = r#"[
            {"min": 0, "max": 10, "url": "http://ok"},
            {"min": 30, "max": 20, "url": "http://backwards"}
        ]"#;
        match StationMap::from_json(json).unwrap_err() {
            StationError::Invalid { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("greater than"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_rejects_out_of_range_and_empty_url() {
        assert!(StationMap::new(vec![StationBinding::new(-1.0, 10.0, "u")]).is_err());
        assert!(StationMap::new(vec![StationBinding::new(0.0, 100.5, "u")]).is_err());
        assert!(StationMap::new(vec![StationBinding::new(0.0, f64::NAN, "u")]).is_err());
        assert!(StationMap::new(vec![StationBinding::new(0.0, 10.0, "  ")]).is_err());
        // Zero-width range is allowed
        assert!(StationMap::new(vec![StationBinding::new(5.0, 5.0, "u")]).is_ok());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = StationMap::load("/nonexistent/stations.json").unwrap_err();
        assert!(matches!(err, StationError::Io { .. }));
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let file = NamedTempFile::new().unwrap();
        let map = overlapping();
        map.save(file.path()).unwrap();

        let loaded = StationMap::load(file.path()).unwrap();
        assert_eq!(loaded, map);
        let written = fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("\"stations\""));
    }

    #[test]
    fn test_add_appends_last() {
        let mut map = overlapping();
        map.add(StationBinding::new(20.0, 30.0, "C")).unwrap();
        assert_eq!(map.len(), 3);
        // Existing overlap winner is unchanged
        assert_eq!(map.resolve(25.0), Some("A"));
        assert!(map.add(StationBinding::new(50.0, 40.0, "bad")).is_err());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_remove_and_move() {
        let mut map = overlapping();
        map.move_binding(1, 0).unwrap();
        assert_eq!(map.resolve(30.0), Some("B"));

        let removed = map.remove(0).unwrap();
        assert_eq!(removed.url, "B");
        assert_eq!(map.resolve(30.0), Some("A"));

        assert!(matches!(
            map.remove(5),
            Err(StationError::IndexOutOfRange { index: 5, len: 1 })
        ));
        assert!(map.move_binding(0, 3).is_err());
    }

    #[test]
    fn test_update_keeps_position() {
        let mut map = overlapping();
        let old = map.update(0, StationBinding::new(20.0, 40.0, "C")).unwrap();
        assert_eq!(old.url, "A");
        assert_eq!(map.len(), 2);
        // Still first, so it still wins the overlap with B
        assert_eq!(map.bindings()[0].url, "C");
        assert_eq!(map.resolve(30.0), Some("C"));
        assert_eq!(map.resolve(10.0), None);
    }

    #[test]
    fn test_update_rejects_bad_entries() {
        let mut map = overlapping();
        assert!(matches!(
            map.update(1, StationBinding::new(80.0, 60.0, "C")),
            Err(StationError::Invalid { index: 1, .. })
        ));
        assert!(matches!(
            map.update(2, StationBinding::new(0.0, 10.0, "C")),
            Err(StationError::IndexOutOfRange { index: 2, len: 2 })
        ));
        // Rejected edits leave the map untouched
        assert_eq!(map, overlapping());
    }
}
