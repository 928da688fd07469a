use std::collections::BTreeMap;

use anyhow::{Context, Result};
use geom::{GPSBounds, LonLat, Pt2D};
use serde::Deserialize;

use crate::{IDMapping, LineID, OffsetTable, Path, Station, StationID};

pub struct Line {
    pub id: LineID,
    pub name: String,
    /// Like `#80c241`
    pub color: String,
    /// The path is closed, and cars circle around instead of turning back at the ends.
    pub is_loop: bool,
    pub stations: Vec<StationID>,
    pub path: Path,
    pub offsets: OffsetTable,
}

#[derive(Deserialize)]
pub(crate) struct RawLines {
    pub lines: Vec<RawLine>,
}

#[derive(Deserialize)]
pub(crate) struct RawLine {
    name: String,
    color: String,
    #[serde(rename = "loop", default)]
    is_loop: bool,
    stations: Vec<String>,
    pub sublines: Vec<RawSubline>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawSubline {
    /// Follows an earlier line between two of its stations
    Shared {
        line: String,
        start: String,
        end: String,
    },
    /// lon, lat pairs
    Own { coordinates: Vec<[f64; 2]> },
}

impl RawSubline {
    pub fn own_coordinates(&self) -> impl Iterator<Item = LonLat> + '_ {
        let coords: &[[f64; 2]] = match self {
            RawSubline::Own { coordinates } => coordinates,
            RawSubline::Shared { .. } => &[],
        };
        coords.iter().map(|pair| LonLat::new(pair[0], pair[1]))
    }
}

pub(crate) fn load(
    raw: Vec<RawLine>,
    stations: &BTreeMap<StationID, Station>,
    station_ids: &IDMapping<StationID>,
    gps_bounds: &GPSBounds,
) -> Result<(BTreeMap<LineID, Line>, IDMapping<LineID>)> {
    let mut ids = IDMapping::new();
    let mut lines = BTreeMap::new();
    for rec in raw {
        let name = rec.name.clone();
        let id = ids.insert_new(&name)?;
        let line = build_line(id, rec, &lines, &ids, stations, station_ids, gps_bounds)
            .with_context(|| format!("line {name}"))?;
        lines.insert(id, line);
    }
    Ok((lines, ids))
}

fn build_line(
    id: LineID,
    rec: RawLine,
    lines: &BTreeMap<LineID, Line>,
    line_ids: &IDMapping<LineID>,
    stations: &BTreeMap<StationID, Station>,
    station_ids: &IDMapping<StationID>,
    gps_bounds: &GPSBounds,
) -> Result<Line> {
    check_color(&rec.color)?;

    let mut station_list = Vec::new();
    for name in &rec.stations {
        station_list.push(station_ids.lookup(name)?);
    }

    let mut pts: Vec<Pt2D> = Vec::new();
    for subline in &rec.sublines {
        match subline {
            RawSubline::Own { .. } => {
                pts.extend(subline.own_coordinates().map(|ll| ll.to_pt(gps_bounds)));
            }
            RawSubline::Shared { line, start, end } => {
                let other = match lines.get(&line_ids.lookup(line)?) {
                    Some(other) => other,
                    None => bail!("{line} must be defined before it can be shared"),
                };
                let mut dists = Vec::new();
                for station in [start, end] {
                    let pos = stations[&station_ids.lookup(station)?].pos;
                    match other.path.dist_along_of_nearest(pos) {
                        Some(dist) => dists.push(dist),
                        None => bail!("{station} can't be matched to {line}"),
                    }
                }
                pts.extend(other.path.slice_points(dists[0], dists[1])?);
            }
        }
    }
    let path = Path::new(pts, rec.is_loop)?;

    let station_pts: Vec<Pt2D> = station_list.iter().map(|id| stations[id].pos).collect();
    let offsets = OffsetTable::new(&path, &station_pts)?;

    Ok(Line {
        id,
        name: rec.name,
        color: rec.color,
        is_loop: rec.is_loop,
        stations: station_list,
        path,
        offsets,
    })
}

fn check_color(color: &str) -> Result<()> {
    let hex = match color.strip_prefix('#') {
        Some(hex) => hex,
        None => bail!("Color {color} doesn't start with #"),
    };
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Color {color} isn't like #rrggbb");
    }
    Ok(())
}
