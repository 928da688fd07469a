use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson};
use geom::{GPSBounds, LonLat, Pt2D, Time};

use railway::CarID;

use crate::{AnimationConfig, Fleet, Footprint, Tracking};

/// One car as the render engine sees it
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleFeature {
    pub car: CarID,
    pub color: String,
    pub footprint: Footprint,
}

/// The render engine's side of a frame.
pub trait RenderSink {
    /// Replaces every car drawn so far. Never patched incrementally.
    fn replace_vehicles(&mut self, vehicles: Vec<VehicleFeature>);
    /// Moves the camera immediately, without animating the pan. `bearing` is in compass degrees.
    fn jump_to(&mut self, center: Pt2D, bearing: f64);
}

/// Pushes the fleet to the render engine once per frame. The tracking camera orbits on the wall
/// clock, so it keeps turning at the same rate whatever the animation speed, even when paused.
pub struct SceneDriver {
    start: Time,
    config: AnimationConfig,
}

impl SceneDriver {
    /// The orbit is measured from `start`, on the wall clock.
    pub fn new(start: Time, config: AnimationConfig) -> Self {
        Self { start, config }
    }

    /// `wall_clock` is real time, independent of the clock driving `fleet`.
    pub fn render(
        &self,
        wall_clock: Time,
        fleet: &Fleet,
        tracking: Tracking,
        sink: &mut dyn RenderSink,
    ) {
        sink.replace_vehicles(
            fleet
                .vehicles()
                .map(|vehicle| VehicleFeature {
                    car: vehicle.id,
                    color: vehicle.color.clone(),
                    footprint: *vehicle.footprint(),
                })
                .collect(),
        );

        if let Some(id) = tracking.car() {
            match fleet.vehicle(id) {
                Some(vehicle) => {
                    sink.jump_to(vehicle.pos(), self.orbit_bearing(wall_clock));
                }
                None => {
                    warn!("Can't track {id:?}; it isn't part of the fleet");
                }
            }
        }
    }

    fn orbit_bearing(&self, wall_clock: Time) -> f64 {
        if wall_clock <= self.start {
            return 0.0;
        }
        self.config.orbit_bearing(wall_clock - self.start)
    }
}

/// Keeps the latest frame as GeoJSON, in WGS84.
pub struct GeoJsonSink {
    gps_bounds: GPSBounds,
    vehicles: Vec<Feature>,
    camera: Option<(LonLat, f64)>,
}

impl GeoJsonSink {
    pub fn new(gps_bounds: GPSBounds) -> Self {
        Self {
            gps_bounds,
            vehicles: Vec::new(),
            camera: None,
        }
    }

    /// The last camera position and bearing, if a car was tracked
    pub fn camera(&self) -> Option<(LonLat, f64)> {
        self.camera
    }

    /// The camera, if any, is kept as a foreign member of the collection.
    pub fn to_geojson(&self) -> GeoJson {
        let foreign_members = self.camera().map(|(center, bearing)| {
            let mut members = serde_json::Map::new();
            members.insert(
                "camera".to_string(),
                serde_json::json!({
                    "center": [center.x(), center.y()],
                    "bearing": bearing,
                }),
            );
            members
        });
        GeoJson::FeatureCollection(FeatureCollection {
            features: self.vehicles.clone(),
            bbox: None,
            foreign_members,
        })
    }

    pub fn write(&self, path: &str) -> Result<()> {
        fs_err::write(path, serde_json::to_string_pretty(&self.to_geojson())?)?;
        info!("Wrote {} cars to {path}", self.vehicles.len());
        Ok(())
    }
}

impl RenderSink for GeoJsonSink {
    fn replace_vehicles(&mut self, vehicles: Vec<VehicleFeature>) {
        self.vehicles = vehicles
            .into_iter()
            .map(|vehicle| {
                let mut feature = Feature {
                    bbox: None,
                    geometry: Some(vehicle.footprint.to_geojson(&self.gps_bounds)),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                feature.set_property("car", vehicle.car.0);
                feature.set_property("color", vehicle.color);
                feature
            })
            .collect();
    }

    fn jump_to(&mut self, center: Pt2D, bearing: f64) {
        self.camera = Some((center.to_gps(&self.gps_bounds), bearing));
    }
}
