//! Settings record and its pure update functions.

use minimap_common::{Bound, BoundUpdate};
use serde::{Deserialize, Serialize};

/// Minimap page loaded when the URL list is empty.
pub const DEFAULT_CONTENT_URL: &str = "https://www.newworldminimap.com/map";

/// The persisted element settings.
///
/// Field order here is the key order written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    /// When set the overlay is never auto-hidden.
    pub debug: bool,
    /// Candidate content sources; `index` picks the active one.
    pub url: Vec<String>,
    pub index: i64,
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            w: 300,
            h: 300,
            debug: false,
            url: vec![DEFAULT_CONTENT_URL.to_string()],
            index: 0,
            opacity: 1.0,
        }
    }
}

impl Configuration {
    pub fn bound(&self) -> Bound {
        Bound {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    /// The active content URL.
    ///
    /// Falls back to the first entry when `index` is out of range and to
    /// [`DEFAULT_CONTENT_URL`] when the list is empty.
    pub fn content_url(&self) -> &str {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.url.get(i))
            .or_else(|| self.url.first())
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONTENT_URL)
    }

    /// New record with `update` applied to the geometry.
    pub fn with_bound(&self, update: &BoundUpdate) -> Self {
        let bound = update.apply(self.bound());
        Self {
            x: bound.x,
            y: bound.y,
            w: bound.w,
            h: bound.h,
            ..self.clone()
        }
    }

    /// New record with the given opacity, clamped to `[0.0, 1.0]`.
    pub fn with_opacity(&self, opacity: f64) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Configuration::default();
        assert_eq!(config.bound(), Bound { x: 100, y: 100, w: 300, h: 300 });
        assert!(!config.debug);
        assert_eq!(config.url, vec![DEFAULT_CONTENT_URL.to_string()]);
        assert_eq!(config.index, 0);
        assert_eq!(config.opacity, 1.0);
    }

    #[test]
    fn content_url_selects_by_index() {
        let config = Configuration {
            url: vec!["https://a.example".into(), "https://b.example".into()],
            index: 1,
            ..Default::default()
        };
        assert_eq!(config.content_url(), "https://b.example");
    }

    #[test]
    fn content_url_out_of_range_uses_first() {
        let mut config = Configuration {
            url: vec!["https://a.example".into(), "https://b.example".into()],
            index: 7,
            ..Default::default()
        };
        assert_eq!(config.content_url(), "https://a.example");

        config.index = -1;
        assert_eq!(config.content_url(), "https://a.example");
    }

    #[test]
    fn content_url_empty_list_uses_default() {
        let config = Configuration {
            url: Vec::new(),
            ..Default::default()
        };
        assert_eq!(config.content_url(), DEFAULT_CONTENT_URL);
    }

    #[test]
    fn with_bound_keeps_other_fields() {
        let config = Configuration {
            debug: true,
            opacity: 0.5,
            ..Default::default()
        };
        let updated = config.with_bound(&BoundUpdate {
            x: Some(10),
            w: Some(640),
            ..Default::default()
        });
        assert_eq!(updated.bound(), Bound { x: 10, y: 100, w: 640, h: 300 });
        assert!(updated.debug);
        assert_eq!(updated.opacity, 0.5);
        // source untouched
        assert_eq!(config.x, 100);
    }

    #[test]
    fn with_opacity_clamps() {
        let config = Configuration::default();
        assert_eq!(config.with_opacity(0.4).opacity, 0.4);
        assert_eq!(config.with_opacity(1.7).opacity, 1.0);
        assert_eq!(config.with_opacity(-0.2).opacity, 0.0);
    }

    #[test]
    fn serializes_in_declared_key_order() {
        let json = serde_json::to_string(&Configuration::default()).unwrap();
        let keys: Vec<usize> = ["\"x\"", "\"y\"", "\"w\"", "\"h\"", "\"debug\"", "\"url\"", "\"index\"", "\"opacity\""]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
