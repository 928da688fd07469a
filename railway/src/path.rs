use anyhow::Result;
use geom::{Angle, Distance, GPSBounds, PolyLine, Pt2D};
use serde::Deserialize;

// Points closer than this are collapsed when building a path
const DEDUPE_METERS: f64 = 0.1;
// How far apart the two samples used to estimate a tangent are
const TANGENT_METERS: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub enum Direction {
    Forwards,
    Backwards,
}

impl Direction {
    pub fn sign(self) -> isize {
        match self {
            Direction::Forwards => 1,
            Direction::Backwards => -1,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forwards => Direction::Backwards,
            Direction::Backwards => Direction::Forwards,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = String;

    fn try_from(x: i64) -> Result<Self, Self::Error> {
        match x {
            1 => Ok(Direction::Forwards),
            -1 => Ok(Direction::Backwards),
            _ => Err(format!("direction must be 1 or -1, not {x}")),
        }
    }
}

/// The finished route of one line. Immutable once built.
#[derive(Clone, Debug)]
pub struct Path {
    pl: PolyLine,
}

impl Path {
    /// Collapses adjacent near-duplicate points. A closed path ends exactly where it starts.
    pub fn new(pts: Vec<Pt2D>, closed: bool) -> Result<Path> {
        let threshold = Distance::meters(DEDUPE_METERS);
        let mut pts = Pt2D::approx_dedupe(pts, threshold);
        if closed && pts.len() >= 2 {
            let first = pts[0];
            let last = pts.len() - 1;
            if pts[last].dist_to(first) < threshold {
                pts[last] = first;
            } else {
                pts.push(first);
            }
        }
        if pts.len() < 2 {
            bail!("A path needs at least 2 distinct points, but has {}", pts.len());
        }

        // A closed path repeats its first point, which PolyLine::new rejects
        let pl = PolyLine::unchecked_new(pts);
        if pl.length() < threshold {
            bail!("Path is only {} long", pl.length());
        }
        Ok(Path { pl })
    }

    pub fn length(&self) -> Distance {
        self.pl.length()
    }

    pub fn first_pt(&self) -> Pt2D {
        self.pl.first_pt()
    }

    pub fn last_pt(&self) -> Pt2D {
        self.pl.last_pt()
    }

    pub fn polyline(&self) -> &PolyLine {
        &self.pl
    }

    fn clamp(&self, dist: Distance) -> Distance {
        if dist < Distance::ZERO {
            Distance::ZERO
        } else if dist > self.length() {
            self.length()
        } else {
            dist
        }
    }

    /// The point `dist` along the path, clamped to the path's extremities.
    pub fn along(&self, dist: Distance) -> Pt2D {
        let dist = self.clamp(dist);
        match self.pl.dist_along(dist) {
            Ok((pt, _)) => pt,
            Err(err) => {
                warn!("Sampling {dist} along a path of {} failed: {err}", self.length());
                if dist.inner_meters() < self.length().inner_meters() / 2.0 {
                    self.first_pt()
                } else {
                    self.last_pt()
                }
            }
        }
    }

    /// The point `dist` along the path and the compass bearing of travel there. Going
    /// `Backwards`, the bearing points towards the start of the path.
    pub fn sample_at(&self, dist: Distance, direction: Direction) -> (Pt2D, f64) {
        let dist = self.clamp(dist);
        let delta = if dist.inner_meters() >= TANGENT_METERS {
            -TANGENT_METERS
        } else {
            TANGENT_METERS
        };
        let pt1 = self.along(dist);
        let pt2 = self.along(Distance::meters(dist.inner_meters() + delta));

        let bearing = if (direction.sign() as f64) * delta > 0.0 {
            bearing(pt1, pt2)
        } else {
            bearing(pt2, pt1)
        };
        (pt1, bearing)
    }

    /// How far along the path the point nearest to `pt` is. None if the projection can't be
    /// matched back onto the path.
    pub fn dist_along_of_nearest(&self, pt: Pt2D) -> Option<Distance> {
        let projected = self.pl.project_pt(pt);
        self.pl
            .dist_along_of_point(projected)
            .map(|(dist, _)| dist)
    }

    /// The points between two distances. If `to` comes before `from`, the result runs backwards.
    pub fn slice_points(&self, from: Distance, to: Distance) -> Result<Vec<Pt2D>> {
        let from = self.clamp(from);
        let to = self.clamp(to);
        if from <= to {
            Ok(self.pl.maybe_exact_slice(from, to)?.into_points())
        } else {
            Ok(self.pl.maybe_exact_slice(to, from)?.reversed().into_points())
        }
    }

    pub fn to_geojson(&self, gps_bounds: &GPSBounds) -> geojson::Geometry {
        self.pl.to_geojson(Some(gps_bounds))
    }
}

/// Compass bearing in degrees from one point to another: 0 is north, 90 is east. Map space has Y
/// growing southwards.
pub fn bearing(from: Pt2D, to: Pt2D) -> f64 {
    let degrees = (to.y() - from.y()).atan2(to.x() - from.x()).to_degrees();
    (degrees + 90.0).rem_euclid(360.0)
}

/// Moves a point some distance towards a compass bearing.
pub fn translate(pt: Pt2D, dist: Distance, bearing: f64) -> Pt2D {
    pt.project_away(dist, Angle::degrees(bearing - 90.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> Path {
        Path::new(
            vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0), Pt2D::new(2.0, 0.0)],
            false,
        )
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn samples_midway_heading_east() {
        let path = straight();
        assert!(close(path.length().inner_meters(), 2.0));

        let (pt, bearing) = path.sample_at(Distance::meters(0.5), Direction::Forwards);
        assert!(close(pt.x(), 0.5));
        assert!(close(pt.y(), 0.0));
        assert!(close(bearing, 90.0));

        let (_, bearing) = path.sample_at(Distance::meters(0.5), Direction::Backwards);
        assert!(close(bearing, 270.0));
    }

    #[test]
    fn sampling_is_idempotent() {
        let path = straight();
        let first = path.sample_at(Distance::meters(1.3), Direction::Backwards);
        let second = path.sample_at(Distance::meters(1.3), Direction::Backwards);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn extremities_clamp() {
        let path = straight();
        let (start, bearing) = path.sample_at(Distance::ZERO, Direction::Forwards);
        assert_eq!(start, Pt2D::new(0.0, 0.0));
        assert!(close(bearing, 90.0));

        let (end, bearing) = path.sample_at(Distance::meters(10.0), Direction::Forwards);
        assert_eq!(end, Pt2D::new(2.0, 0.0));
        assert!(close(bearing, 90.0));

        let (before, _) = path.sample_at(Distance::meters(-3.0), Direction::Backwards);
        assert_eq!(before, Pt2D::new(0.0, 0.0));
    }

    #[test]
    fn bearings_follow_the_compass() {
        let origin = Pt2D::new(0.0, 0.0);
        assert!(close(bearing(origin, Pt2D::new(0.0, -1.0)), 0.0));
        assert!(close(bearing(origin, Pt2D::new(1.0, 0.0)), 90.0));
        assert!(close(bearing(origin, Pt2D::new(0.0, 1.0)), 180.0));
        assert!(close(bearing(origin, Pt2D::new(-1.0, 0.0)), 270.0));

        let north = translate(origin, Distance::meters(10.0), 0.0);
        assert!(close(north.x(), 0.0));
        assert!(close(north.y(), -10.0));
    }

    #[test]
    fn closed_paths_end_at_the_start() {
        let path = Path::new(
            vec![
                Pt2D::new(0.0, 0.0),
                Pt2D::new(10.0, 0.0),
                Pt2D::new(10.0, 10.0),
            ],
            true,
        )
        .unwrap();
        assert_eq!(path.first_pt(), path.last_pt());
        assert_eq!(path.polyline().points().len(), 4);
    }

    #[test]
    fn degenerate_paths_fail() {
        assert!(Path::new(vec![Pt2D::new(1.0, 1.0)], false).is_err());
        assert!(Path::new(vec![Pt2D::new(1.0, 1.0), Pt2D::new(1.0, 1.0)], false).is_err());
    }

    #[test]
    fn nearest_distance_and_slices() {
        let path = straight();
        let dist = path.dist_along_of_nearest(Pt2D::new(1.5, 3.0)).unwrap();
        assert!(close(dist.inner_meters(), 1.5));

        let pts = path
            .slice_points(Distance::meters(1.5), Distance::meters(0.5))
            .unwrap();
        assert_eq!(pts.first().unwrap().x(), 1.5);
        assert_eq!(pts.last().unwrap().x(), 0.5);
    }

    #[test]
    fn directions_parse_from_signs() {
        assert_eq!(Direction::try_from(1).unwrap(), Direction::Forwards);
        assert_eq!(Direction::try_from(-1).unwrap(), Direction::Backwards);
        assert!(Direction::try_from(0).is_err());
        assert_eq!(Direction::Forwards.opposite().sign(), -1);
    }
}
