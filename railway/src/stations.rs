use std::collections::BTreeMap;

use anyhow::Result;
use geom::{Circle, Distance, GPSBounds, LonLat, PolyLine, Polygon, Pt2D};
use serde::Deserialize;

use crate::path::translate;
use crate::{IDMapping, StationID};

// Stations are drawn as a disc, or a capsule along the platform span, this wide on each side
const FOOTPRINT_RADIUS_METERS: f64 = 100.0;

pub struct Station {
    pub id: StationID,
    pub name: String,
    pub alias: Option<String>,
    pub pos: Pt2D,
    /// The pieces covering the station. Overlapping, so draw them with the same color.
    pub footprint: Vec<Polygon>,
}

#[derive(Deserialize)]
pub(crate) struct RawStations {
    pub stations: Vec<RawStation>,
}

#[derive(Deserialize)]
pub(crate) struct RawStation {
    name: String,
    alias: Option<String>,
    /// lon, lat
    pub coords: [f64; 2],
    /// How far the platform extends before and after the station's position, in multiples of the
    /// footprint radius
    span: Option<[f64; 2]>,
    /// Clockwise rotation of the platform axis from east, in degrees
    angle: Option<f64>,
}

impl RawStation {
    pub fn lon_lat(&self) -> LonLat {
        LonLat::new(self.coords[0], self.coords[1])
    }
}

pub(crate) fn load(
    raw: Vec<RawStation>,
    gps_bounds: &GPSBounds,
) -> Result<(BTreeMap<StationID, Station>, IDMapping<StationID>)> {
    let mut ids = IDMapping::new();
    let mut stations = BTreeMap::new();
    for rec in raw {
        let id = ids.insert_new(&rec.name)?;
        if let Some(ref alias) = rec.alias {
            ids.insert_alias(alias, id)?;
        }
        let pos = rec.lon_lat().to_pt(gps_bounds);
        stations.insert(
            id,
            Station {
                id,
                footprint: footprint(pos, rec.span, rec.angle.unwrap_or(0.0)),
                name: rec.name,
                alias: rec.alias,
                pos,
            },
        );
    }
    Ok((stations, ids))
}

fn footprint(pos: Pt2D, span: Option<[f64; 2]>, angle: f64) -> Vec<Polygon> {
    let radius = Distance::meters(FOOTPRINT_RADIUS_METERS);
    let disc = || vec![Circle::new(pos, radius).to_polygon()];

    let [before, after] = match span {
        Some(span) => span,
        None => {
            return disc();
        }
    };
    let axis = 90.0 + angle;
    let pt1 = shift(pos, before * FOOTPRINT_RADIUS_METERS, axis);
    let pt2 = shift(pos, after * FOOTPRINT_RADIUS_METERS, axis);
    match PolyLine::new(vec![pt1, pt2]) {
        Ok(pl) => vec![
            pl.make_polygons(radius * 2.0),
            Circle::new(pt1, radius).to_polygon(),
            Circle::new(pt2, radius).to_polygon(),
        ],
        // A span of zero length
        Err(_) => disc(),
    }
}

// Negative amounts move against the bearing
fn shift(pt: Pt2D, meters: f64, bearing: f64) -> Pt2D {
    if meters < 0.0 {
        translate(pt, Distance::meters(-meters), bearing + 180.0)
    } else {
        translate(pt, Distance::meters(meters), bearing)
    }
}
