//! Tour definitions and their configuration surface.
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use crate::station::Station;

/// Unique tour identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourId(pub String);

impl TourId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TourId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TourId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl Borrow<str> for TourId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Button and tooltip captions. Missing entries fall back to English defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    pub previous: String,
    pub next: String,
    pub finish: String,
    pub close_tooltip: String,
    pub station_delimiter: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            previous: "Previous".to_string(),
            next: "Next".to_string(),
            finish: "Finish".to_string(),
            close_tooltip: "Close".to_string(),
            station_delimiter: "/".to_string(),
        }
    }
}

impl Labels {
    /// Caption of the forward button: `finish` on the last station.
    #[must_use]
    pub fn advance(&self, is_last: bool) -> &str {
        if is_last { &self.finish } else { &self.next }
    }
}

/// Callback invoked after a tour closes.
#[derive(Clone)]
pub struct CloseHandler(Rc<dyn Fn()>);

impl CloseHandler {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn emit(&self) {
        (self.0)();
    }
}

impl PartialEq for CloseHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CloseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CloseHandler(..)")
    }
}

/// Externally controlled start flag plus a close notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(default)]
    pub running: bool,
    #[serde(skip)]
    pub on_close: Option<CloseHandler>,
}

/// Per-tour options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TourConfig {
    pub auto_start: bool,
    pub trigger: Option<Trigger>,
    pub labels: Labels,
    /// Inline style appended to the popover paper.
    pub paper_style: Option<String>,
}

impl TourConfig {
    /// Parse a configuration block such as `{"autoStart": true, "labels": {"next": "Weiter"}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Timing and spacing knobs for the step engine and presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// Wait after a smooth scroll before re-measuring.
    pub settle_ms: u32,
    /// Extra space around the highlighted element.
    pub highlight_padding: f64,
    /// Distance between a highlighted element and its popover.
    pub popover_offset: f64,
    /// Minimum gap kept between the popover and the viewport edge.
    pub overflow_padding: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            settle_ms: 350,
            highlight_padding: 8.0,
            popover_offset: 12.0,
            overflow_padding: 4.0,
        }
    }
}

/// A named, ordered sequence of stations.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour<C = String> {
    pub id: TourId,
    pub stations: Vec<Station<C>>,
    pub config: TourConfig,
}

impl<C> Tour<C> {
    pub fn new(id: impl Into<TourId>, stations: Vec<Station<C>>) -> Self {
        Self {
            id: id.into(),
            stations,
            config: TourConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: TourConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.stations.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_partial_labels() {
        let cfg = TourConfig::from_json(
            r#"{"autoStart": true, "labels": {"next": "Weiter", "stationDelimiter": "von"}}"#,
        )
        .unwrap();
        assert!(cfg.auto_start);
        assert_eq!(cfg.labels.next, "Weiter");
        assert_eq!(cfg.labels.station_delimiter, "von");
        assert_eq!(cfg.labels.previous, "Previous");
        assert!(cfg.trigger.is_none());
    }

    #[test]
    fn advance_label_switches_on_last_station() {
        let labels = Labels::default();
        assert_eq!(labels.advance(false), "Next");
        assert_eq!(labels.advance(true), "Finish");
    }

    #[test]
    fn tour_ids_are_trimmed() {
        assert_eq!(TourId::from(" intro "), TourId::from("intro"));
    }

    #[test]
    fn engine_settings_default_to_smooth_scroll_settle() {
        let settings: EngineSettings = serde_json::from_str(r#"{"popoverOffset": 16}"#).unwrap();
        assert_eq!(settings.settle_ms, 350);
        assert!((settings.popover_offset - 16.0).abs() < f64::EPSILON);
    }
}
