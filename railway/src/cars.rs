use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{CarID, Direction, IDMapping, Line, LineID};

/// Where a car starts. The car moves from station boundary `section` towards
/// `section + direction`.
#[derive(Clone, Debug, PartialEq)]
pub struct CarSpec {
    pub id: CarID,
    pub line: LineID,
    pub section: usize,
    pub direction: Direction,
}

#[derive(Deserialize)]
pub(crate) struct RawCars {
    pub cars: Vec<RawCar>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCar {
    line: String,
    section_index: usize,
    direction: Direction,
}

pub(crate) fn load(
    raw: Vec<RawCar>,
    lines: &BTreeMap<LineID, Line>,
    line_ids: &IDMapping<LineID>,
) -> Result<Vec<CarSpec>> {
    let mut cars = Vec::new();
    for rec in raw {
        let id = CarID(cars.len());
        let line = line_ids
            .lookup(&rec.line)
            .with_context(|| format!("{id:?}"))?;
        if !lines[&line].offsets.has_segment(rec.section_index, rec.direction) {
            bail!(
                "{id:?} starts at section {} heading {:?}, but {} has {} station boundaries",
                rec.section_index,
                rec.direction,
                rec.line,
                lines[&line].offsets.len()
            );
        }
        cars.push(CarSpec {
            id,
            line,
            section: rec.section_index,
            direction: rec.direction,
        });
    }
    Ok(cars)
}
