use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::Network;

impl Network {
    /// The static layers: one LineString per line and the pieces of every station footprint.
    pub fn to_geojson(&self) -> GeoJson {
        let mut features = Vec::new();

        for line in self.lines.values() {
            let mut feature = Feature {
                bbox: None,
                geometry: Some(line.path.to_geojson(&self.gps_bounds)),
                id: None,
                properties: None,
                foreign_members: None,
            };
            feature.set_property("type", "line");
            feature.set_property("name", line.name.clone());
            feature.set_property("color", line.color.clone());
            feature.set_property("width", 8);
            features.push(feature);
        }

        for station in self.stations.values() {
            for polygon in &station.footprint {
                let mut feature = Feature {
                    bbox: None,
                    geometry: Some(polygon.to_geojson(Some(&self.gps_bounds))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                feature.set_property("type", "station");
                feature.set_property("name", station.name.clone());
                feature.set_property("color", "#FFFFFF");
                feature.set_property("outlineColor", "#000000");
                features.push(feature);
            }
        }

        GeoJson::FeatureCollection(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn export_geojson(&self, path: &str) -> Result<()> {
        fs_err::write(path, serde_json::to_string_pretty(&self.to_geojson())?)?;
        info!("Wrote {path}");
        Ok(())
    }
}
