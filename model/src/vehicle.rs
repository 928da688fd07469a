use anyhow::Result;
use geom::{Distance, GPSBounds, Polygon, Pt2D, Ring};

use railway::{translate, CarID, CarSpec, Direction, Line, LineID};

use crate::TaskID;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    /// Travelling along the current segment
    Moving { task: TaskID },
    /// Dwelling at the station it just reached
    Paused { task: TaskID },
    /// Cancelled mid-flight; stays put until resumed
    Stopped,
}

/// A small quadrilateral pointing in the direction of travel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub corners: [Pt2D; 4],
}

impl Footprint {
    pub fn new(center: Pt2D, bearing: f64, size: Distance) -> Self {
        let corners = [-150.0, -30.0, 30.0, 150.0].map(|rel| translate(center, size, bearing + rel));
        Self { corners }
    }

    #[cfg(test)]
    pub fn center(&self) -> Pt2D {
        Pt2D::center(&self.corners)
    }

    pub fn to_polygon(&self) -> Result<Polygon> {
        let mut pts = self.corners.to_vec();
        pts.push(self.corners[0]);
        Ok(Ring::new(pts)?.into_polygon())
    }

    pub fn to_geojson(&self, gps_bounds: &GPSBounds) -> geojson::Geometry {
        let mut ring = Vec::new();
        for pt in self.corners.iter().chain(std::iter::once(&self.corners[0])) {
            let gps = pt.to_gps(gps_bounds);
            ring.push(vec![gps.x(), gps.y()]);
        }
        geojson::Geometry::new(geojson::Value::Polygon(vec![ring]))
    }
}

pub struct Vehicle {
    pub id: CarID,
    pub line: LineID,
    /// Inherited from the line
    pub color: String,

    section: usize,
    direction: Direction,
    // The current segment runs from `from` to `to` along the line's path
    from: Distance,
    to: Distance,

    pos: Pt2D,
    bearing: f64,
    footprint: Footprint,
    pub(crate) state: MotionState,
}

impl Vehicle {
    pub(crate) fn new(spec: &CarSpec, line: &Line, size: Distance) -> Result<Self> {
        if spec.line != line.id {
            bail!("{:?} belongs to {:?}, not {:?}", spec.id, spec.line, line.id);
        }
        if !line.offsets.has_segment(spec.section, spec.direction) {
            bail!(
                "{:?} starts at section {} heading {:?}, but {} has {} station boundaries",
                spec.id,
                spec.section,
                spec.direction,
                line.name,
                line.offsets.len()
            );
        }

        let (from, to) = line.offsets.segment(spec.section, spec.direction);
        let (pos, bearing) = line.path.sample_at(from, spec.direction);
        Ok(Self {
            id: spec.id,
            line: spec.line,
            color: line.color.clone(),
            section: spec.section,
            direction: spec.direction,
            from,
            to,
            pos,
            bearing,
            footprint: Footprint::new(pos, bearing, size),
            // The fleet immediately starts the first transition
            state: MotionState::Stopped,
        })
    }

    /// The station boundary the car last left
    pub fn section(&self) -> usize {
        self.section
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// (start, end) distance along the line's path of the current segment
    pub fn segment(&self) -> (Distance, Distance) {
        (self.from, self.to)
    }

    pub fn pos(&self) -> Pt2D {
        self.pos
    }

    /// Compass degrees
    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Moves the car `eased` of the way through its current segment.
    pub(crate) fn on_step(&mut self, line: &Line, eased: f64, size: Distance) {
        let from = self.from.inner_meters();
        let dist = Distance::meters(from + eased * (self.to.inner_meters() - from));
        let (pos, bearing) = line.path.sample_at(dist, self.direction);
        self.pos = pos;
        self.bearing = bearing;
        self.footprint = Footprint::new(pos, bearing, size);
    }

    /// The car reached the end of its segment. Pick the next one, turning back at the ends of the
    /// line or circling around a loop.
    pub(crate) fn arrive(&mut self, line: &Line) {
        let last = line.offsets.len() - 1;
        let mut section = (self.section as isize + self.direction.sign()) as usize;

        if line.is_loop {
            // The first and last boundaries are the same place on a closed path
            match self.direction {
                Direction::Forwards if section >= last => {
                    section = 0;
                }
                Direction::Backwards if section == 0 => {
                    section = last;
                }
                _ => {}
            }
        } else if section == 0 || section >= last {
            self.direction = self.direction.opposite();
        }

        self.section = section;
        let (from, to) = line.offsets.segment(section, self.direction);
        self.from = from;
        self.to = to;
        debug!(
            "{:?} reached boundary {} of {}, heading {:?}",
            self.id, section, line.name, self.direction
        );
    }

    /// Back to the start of the current segment, for resuming after a cancellation.
    pub(crate) fn rewind(&mut self, line: &Line, size: Distance) {
        self.on_step(line, 0.0, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprints_point_along_the_bearing() {
        let center = Pt2D::new(100.0, 100.0);
        let footprint = Footprint::new(center, 90.0, Distance::meters(10.0));
        // The two front corners are east of the center, the back two west
        assert!(footprint.corners[1].x() > center.x());
        assert!(footprint.corners[2].x() > center.x());
        assert!(footprint.corners[0].x() < center.x());
        assert!(footprint.corners[3].x() < center.x());
        for pt in footprint.corners {
            assert!((pt.dist_to(center).inner_meters() - 10.0).abs() < 1e-3);
        }
        assert!(footprint.center().dist_to(center) < Distance::meters(0.01));
        assert!(footprint.to_polygon().is_ok());
    }
}
