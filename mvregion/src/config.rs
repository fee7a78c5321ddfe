//! # Live analyser configuration

use crate::error::Error;
use crate::properties::{Properties, Property};
use anyhow::Result;
use log::*;
use std::sync::{Arc, Mutex, PoisonError};

/// Highest accepted SAD threshold.
pub const MAX_SAD_THRESHOLD: usize = 16383;

/// Upper bound reported for unbounded integer properties.
const PROP_MAX: usize = u16::MAX as usize;

/// Thresholds steering the region extraction pipeline.
///
/// Fields may be read directly, but should be changed through the setters, which silently
/// ignore values breaking the invariants between them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct AnalyserConfig {
    /// Exclusive lower bound of the block motion magnitude.
    pub v_min: usize,
    /// Exclusive upper bound of the block motion magnitude.
    pub v_max: usize,
    pub min_area: usize,
    /// Largest rectangle area (in blocks) still considered to be an object.
    pub max_area: usize,
    /// SAD confidence floor.
    pub sad_threshold: usize,
    /// Forward raw frames to the diagnostic sink.
    pub debug: bool,
    /// Require blocks to exceed `sad_threshold` to be considered moving.
    pub confidence_mask: bool,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            v_min: 2,
            v_max: 40,
            min_area: 1,
            max_area: 40,
            sad_threshold: 60,
            debug: false,
            confidence_mask: true,
        }
    }
}

impl AnalyserConfig {
    /// Set the lower magnitude bound. Values below 1 are raised to 1.
    pub fn set_v_min(&mut self, value: usize) -> bool {
        self.v_min = std::cmp::max(value, 1);
        true
    }

    /// Set the upper magnitude bound. Must exceed `v_min`.
    pub fn set_v_max(&mut self, value: usize) -> bool {
        if value > self.v_min {
            self.v_max = value;
            true
        } else {
            debug!("ignoring vMax {value} (vMin is {})", self.v_min);
            false
        }
    }

    /// Set the minimum area. Values below 1 are raised to 1.
    pub fn set_min_area(&mut self, value: usize) -> bool {
        self.min_area = std::cmp::max(value, 1);
        true
    }

    /// Set the maximum area. Must exceed `min_area`.
    pub fn set_max_area(&mut self, value: usize) -> bool {
        if value > self.min_area {
            self.max_area = value;
            true
        } else {
            debug!("ignoring maxArea {value} (minArea is {})", self.min_area);
            false
        }
    }

    /// Set the SAD threshold. Must be within `0..=MAX_SAD_THRESHOLD`.
    pub fn set_sad_threshold(&mut self, value: usize) -> bool {
        if value <= MAX_SAD_THRESHOLD {
            self.sad_threshold = value;
            true
        } else {
            debug!("ignoring sadThreshold {value}");
            false
        }
    }

    pub fn set_debug(&mut self, value: bool) -> bool {
        self.debug = value;
        true
    }

    pub fn set_confidence_mask(&mut self, value: bool) -> bool {
        self.confidence_mask = value;
        true
    }
}

impl Properties for AnalyserConfig {
    fn props(&self) -> Vec<(&'static str, Property)> {
        vec![
            ("vMin", Property::usize(self.v_min, 1, PROP_MAX)),
            ("vMax", Property::usize(self.v_max, self.v_min + 1, PROP_MAX)),
            ("minArea", Property::usize(self.min_area, 1, PROP_MAX)),
            (
                "maxArea",
                Property::usize(self.max_area, self.min_area + 1, PROP_MAX),
            ),
            (
                "sadThreshold",
                Property::usize(self.sad_threshold, 0, MAX_SAD_THRESHOLD),
            ),
            ("debug", Property::Bool(self.debug)),
            ("confidenceMask", Property::Bool(self.confidence_mask)),
        ]
    }

    fn set_prop(&mut self, name: &str, prop: &Property) -> Result<bool> {
        let kind = || Error::PropertyKind(name.into());

        let applied = match name {
            "vMin" => self.set_v_min(prop.as_usize().ok_or_else(kind)?),
            "vMax" => self.set_v_max(prop.as_usize().ok_or_else(kind)?),
            "minArea" => self.set_min_area(prop.as_usize().ok_or_else(kind)?),
            "maxArea" => self.set_max_area(prop.as_usize().ok_or_else(kind)?),
            "sadThreshold" => self.set_sad_threshold(prop.as_usize().ok_or_else(kind)?),
            "debug" => self.set_debug(prop.as_bool().ok_or_else(kind)?),
            "confidenceMask" => self.set_confidence_mask(prop.as_bool().ok_or_else(kind)?),
            _ => return Err(Error::UnknownProperty(name.into()).into()),
        };

        Ok(applied)
    }
}

/// Configuration shared between the analyser and a control surface.
///
/// Cloning the handle shares the same underlying configuration.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig {
    inner: Arc<Mutex<AnalyserConfig>>,
}

impl From<AnalyserConfig> for SharedConfig {
    fn from(config: AnalyserConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }
}

impl SharedConfig {
    pub fn new(config: AnalyserConfig) -> Self {
        config.into()
    }

    /// Take a copy of the current configuration.
    pub fn snapshot(&self) -> AnalyserConfig {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Modify the configuration under the lock.
    pub fn update<T>(&self, f: impl FnOnce(&mut AnalyserConfig) -> T) -> T {
        let mut config = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *config)
    }

    /// Replace the whole configuration.
    pub fn replace(&self, config: AnalyserConfig) {
        self.update(|c| *c = config);
    }

    pub fn set_prop(&self, name: &str, prop: &Property) -> Result<bool> {
        self.update(|c| c.set_prop(name, prop))
    }

    pub fn set_prop_str(&self, name: &str, value: &str) -> Result<bool> {
        self.update(|c| c.set_prop_str(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_values_keep_previous() {
        let mut config = AnalyserConfig::default();

        assert!(!config.set_v_max(2));
        assert!(!config.set_v_max(1));
        assert_eq!(config.v_max, 40);
        assert!(config.set_v_max(3));
        assert_eq!(config.v_max, 3);

        assert!(!config.set_max_area(1));
        assert_eq!(config.max_area, 40);

        assert!(!config.set_sad_threshold(16384));
        assert!(config.set_sad_threshold(16383));
        assert!(config.set_sad_threshold(0));
        assert_eq!(config.sad_threshold, 0);
    }

    #[test]
    fn lower_bounds_are_raised() {
        let mut config = AnalyserConfig::default();
        config.set_v_min(0);
        config.set_min_area(0);
        assert_eq!(config.v_min, 1);
        assert_eq!(config.min_area, 1);
    }

    #[test]
    fn properties_by_name() {
        let mut config = AnalyserConfig::default();

        assert!(config.set_prop_str("vMax", "50").unwrap());
        assert!(config.set_prop_str("debug", "true").unwrap());
        assert!(!config.set_prop_str("vMax", "1").unwrap());
        assert_eq!(config.v_max, 50);
        assert!(config.debug);

        assert_eq!(config.prop("sadThreshold"), Some(Property::usize(60, 0, 16383)));

        let err = config.set_prop("nope", &Property::Bool(true)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnknownProperty(_))
        ));

        let err = config.set_prop("vMin", &Property::Bool(true)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PropertyKind(_))
        ));

        assert!(config.set_prop_str("vMin", "abc").is_err());
    }

    #[test]
    fn shared_updates_are_visible() {
        let shared = SharedConfig::default();
        let other = shared.clone();

        other.update(|c| c.set_sad_threshold(100));
        assert_eq!(shared.snapshot().sad_threshold, 100);

        other.replace(AnalyserConfig {
            v_min: 5,
            ..Default::default()
        });
        assert_eq!(shared.snapshot().v_min, 5);
        assert_eq!(shared.snapshot().sad_threshold, 60);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn camel_case_keys() {
        let config: AnalyserConfig =
            serde_json::from_str(r#"{ "vMin": 3, "sadThreshold": 120, "debug": true }"#).unwrap();

        assert_eq!(config.v_min, 3);
        assert_eq!(config.sad_threshold, 120);
        assert!(config.debug);
        assert_eq!(config.v_max, 40);
        assert!(config.confidence_mask);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["maxArea"], 40);
        assert_eq!(json["confidenceMask"], true);
    }
}
