use anyhow::Result;
use geom::{Distance, Duration};
use serde::{Deserialize, Serialize};

/// Tunables for the animation. Every field has a default, so a config file only needs to list
/// what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// How long a car takes to cover one kilometer of track. Scales every car's speed.
    pub seconds_per_km: f64,
    /// How long a car waits at each station
    pub dwell_seconds: f64,
    /// Distance from a car's center to its corners at `reference_zoom`
    pub footprint_meters: f64,
    pub reference_zoom: f64,
    /// The tracking camera turns one degree this often
    pub orbit_ms_per_degree: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            seconds_per_km: 5.0,
            dwell_seconds: 1.0,
            footprint_meters: 100.0,
            reference_zoom: 14.0,
            orbit_ms_per_degree: 100.0,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("seconds_per_km", self.seconds_per_km),
            ("dwell_seconds", self.dwell_seconds),
            ("footprint_meters", self.footprint_meters),
            ("orbit_ms_per_degree", self.orbit_ms_per_degree),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number, not {value}");
            }
        }
        if self.orbit_ms_per_degree == 0.0 {
            bail!("orbit_ms_per_degree can't be 0");
        }
        if !self.reference_zoom.is_finite() {
            bail!("reference_zoom must be a number, not {}", self.reference_zoom);
        }
        Ok(())
    }

    /// How long to cover the stretch of track between two distances, in either direction.
    pub fn segment_duration(&self, from: Distance, to: Distance) -> Duration {
        let km = (to.inner_meters() - from.inner_meters()).abs() / 1000.0;
        Duration::seconds(self.seconds_per_km * km)
    }

    pub fn dwell(&self) -> Duration {
        Duration::seconds(self.dwell_seconds)
    }

    /// Cars shrink in map space as the camera zooms in, so they stay about the same size on the
    /// screen.
    pub fn footprint_size(&self, zoom: f64) -> Distance {
        Distance::meters(self.footprint_meters * 2.0_f64.powf(self.reference_zoom - zoom))
    }

    /// The tracking camera's compass bearing after some time has passed.
    pub fn orbit_bearing(&self, elapsed: Duration) -> f64 {
        (elapsed.inner_seconds() * 1000.0 / self.orbit_ms_per_degree).rem_euclid(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_configs_use_defaults() {
        let config: AnimationConfig = serde_json::from_str(r#"{"dwell_seconds": 3.0}"#).unwrap();
        assert_eq!(config.dwell_seconds, 3.0);
        assert_eq!(config.seconds_per_km, 5.0);
        assert!(config.validate().is_ok());

        let bad: AnimationConfig = serde_json::from_str(r#"{"seconds_per_km": -1.0}"#).unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn durations_scale_with_distance() {
        let config = AnimationConfig::default();
        let there = config.segment_duration(Distance::meters(1000.0), Distance::meters(3000.0));
        let back = config.segment_duration(Distance::meters(3000.0), Distance::meters(1000.0));
        assert_eq!(there, Duration::seconds(10.0));
        assert_eq!(there, back);
    }

    #[test]
    fn footprints_halve_per_zoom_level() {
        let config = AnimationConfig::default();
        assert_eq!(config.footprint_size(14.0), Distance::meters(100.0));
        assert_eq!(config.footprint_size(15.0), Distance::meters(50.0));
        assert_eq!(config.footprint_size(13.0), Distance::meters(200.0));
    }

    #[test]
    fn orbit_wraps() {
        let config = AnimationConfig::default();
        assert!((config.orbit_bearing(Duration::seconds(1.0)) - 10.0).abs() < 1e-9);
        assert!((config.orbit_bearing(Duration::seconds(37.0)) - 10.0).abs() < 1e-9);
    }
}
