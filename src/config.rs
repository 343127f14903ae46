//! Router configuration loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};
use streetrouter_core::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Snapping radius for origins and destinations
    pub search_radius_meters: f64,
    /// Walk limit used when a request does not set one
    pub default_max_walk_meters: f64,
    /// Upper bound applied to any requested walk limit
    pub clamp_max_walk_meters: f64,
    pub walk_speed_mps: f64,
    pub bike_speed_mps: f64,
    /// Caller-side search timeouts, longest first
    pub timeouts_seconds: Vec<f64>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: DEFAULT_SEARCH_RADIUS_METERS,
            default_max_walk_meters: f64::from(DEFAULT_DISTANCE_LIMIT_METERS),
            clamp_max_walk_meters: 15_000.0,
            walk_speed_mps: 1.33,
            bike_speed_mps: 5.0,
            timeouts_seconds: vec![5.0, 2.0, 1.0, 0.5, 0.1],
        }
    }
}

impl RouterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(source).map_err(|e| Error::Config(format!("Invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loading router configuration from {}", path.as_ref().display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("search_radius_meters", self.search_radius_meters),
            ("default_max_walk_meters", self.default_max_walk_meters),
            ("clamp_max_walk_meters", self.clamp_max_walk_meters),
            ("walk_speed_mps", self.walk_speed_mps),
            ("bike_speed_mps", self.bike_speed_mps),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{name} must be positive, got {value}")));
            }
        }

        if self.timeouts_seconds.is_empty() {
            return Err(Error::Config("timeouts_seconds must not be empty".into()));
        }
        if let Some(t) = self
            .timeouts_seconds
            .iter()
            .find(|t| !(t.is_finite() && **t > 0.0))
        {
            return Err(Error::Config(format!("timeouts must be positive, got {t}")));
        }
        Ok(())
    }

    /// Search parameters for a single query
    pub fn routing_request(&self, mode: Option<TransportMode>, arrive_by: bool) -> RoutingRequest {
        RoutingRequest {
            arrive_by,
            mode,
            walk_speed_mps: self.walk_speed_mps,
            bike_speed_mps: self.bike_speed_mps,
        }
    }

    /// Effective walk limit: the default when none is requested, clamped above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn walk_limit_meters(&self, requested: Option<f64>) -> u32 {
        let requested = requested
            .filter(|m| m.is_finite() && *m >= 0.0)
            .unwrap_or(self.default_max_walk_meters);
        requested.min(self.clamp_max_walk_meters).round() as u32
    }
}
