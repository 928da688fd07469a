#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod cars;
mod export;
mod ids;
mod lines;
mod offsets;
mod path;
mod stations;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use geom::{Bounds, GPSBounds};
use serde::de::DeserializeOwned;
use zip::ZipArchive;

pub use cars::CarSpec;
pub use ids::{CarID, CheapID, IDMapping, LineID, StationID};
pub use lines::Line;
pub use offsets::OffsetTable;
pub use path::{bearing, translate, Direction, Path};
pub use stations::Station;

use cars::{RawCar, RawCars};
use lines::{RawLine, RawLines};
use stations::{RawStation, RawStations};

/// Everything static about the rail network: stations, finished line paths with their offset
/// tables, and where every car starts. Read-only once built.
pub struct Network {
    pub gps_bounds: GPSBounds,
    pub bounds: Bounds,
    pub stations: BTreeMap<StationID, Station>,
    pub lines: BTreeMap<LineID, Line>,
    pub cars: Vec<CarSpec>,
}

impl Network {
    pub fn empty() -> Self {
        Self {
            gps_bounds: GPSBounds::new(),
            bounds: Bounds::new(),
            stations: BTreeMap::new(),
            lines: BTreeMap::new(),
            cars: Vec::new(),
        }
    }

    /// Reads `lines.json`, `stations.json`, and `cars.json` from a directory.
    pub fn load_from_dir(dir: &str) -> Result<Self> {
        Self::load_from_readers(
            fs_err::File::open(format!("{dir}/lines.json"))?,
            fs_err::File::open(format!("{dir}/stations.json"))?,
            fs_err::File::open(format!("{dir}/cars.json"))?,
        )
    }

    /// Reads the same files from the `data/` directory of a zip archive.
    pub fn load_from_zip<R: std::io::Read + std::io::Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<Self> {
        let lines: RawLines = parse(get_zip_file(archive, "data/lines.json")?, "lines.json")?;
        let stations: RawStations =
            parse(get_zip_file(archive, "data/stations.json")?, "stations.json")?;
        let cars: RawCars = parse(get_zip_file(archive, "data/cars.json")?, "cars.json")?;
        Self::from_raw(lines.lines, stations.stations, cars.cars)
    }

    pub fn load_from_readers<R1: std::io::Read, R2: std::io::Read, R3: std::io::Read>(
        lines: R1,
        stations: R2,
        cars: R3,
    ) -> Result<Self> {
        let lines: RawLines = parse(lines, "lines.json")?;
        let stations: RawStations = parse(stations, "stations.json")?;
        let cars: RawCars = parse(cars, "cars.json")?;
        Self::from_raw(lines.lines, stations.stations, cars.cars)
    }

    fn from_raw(
        raw_lines: Vec<RawLine>,
        raw_stations: Vec<RawStation>,
        raw_cars: Vec<RawCar>,
    ) -> Result<Self> {
        let mut gps_bounds = GPSBounds::new();
        for station in &raw_stations {
            gps_bounds.update(station.lon_lat());
        }
        for line in &raw_lines {
            for subline in &line.sublines {
                for pt in subline.own_coordinates() {
                    gps_bounds.update(pt);
                }
            }
        }

        let (stations, station_ids) = stations::load(raw_stations, &gps_bounds)?;
        let (lines, line_ids) = lines::load(raw_lines, &stations, &station_ids, &gps_bounds)?;
        let cars = cars::load(raw_cars, &lines, &line_ids)?;
        info!(
            "Loaded {} stations, {} lines, {} cars",
            stations.len(),
            lines.len(),
            cars.len()
        );

        Ok(Self {
            bounds: gps_bounds.to_bounds(),
            gps_bounds,
            stations,
            lines,
            cars,
        })
    }

    pub fn line(&self, id: LineID) -> &Line {
        &self.lines[&id]
    }
}

fn parse<R: std::io::Read, T: DeserializeOwned>(reader: R, name: &str) -> Result<T> {
    serde_json::from_reader(reader).with_context(|| format!("parsing {name}"))
}

fn get_zip_file<'a, R: std::io::Read + std::io::Seek>(
    archive: &'a mut ZipArchive<R>,
    path: &str,
) -> Result<zip::read::ZipFile<'a>> {
    archive
        .by_name(path)
        .map_err(|err| anyhow!("{path}: {err}"))
}
