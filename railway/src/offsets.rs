use anyhow::Result;
use geom::{Distance, Pt2D};

use crate::{Direction, Path};

// A station may project slightly behind its predecessor because of noise; beyond this, the
// station order and the path disagree.
const BACKTRACK_TOLERANCE_METERS: f64 = 1.0;

/// Cumulative distance along a path to each station boundary. The last entry is always the total
/// length of the path.
#[derive(Clone, Debug)]
pub struct OffsetTable {
    offsets: Vec<Distance>,
}

impl OffsetTable {
    /// Measures every station but the last along the path, then appends the path's length. A line
    /// whose last station sits elsewhere still runs to the end of its path.
    pub fn new(path: &Path, stations: &[Pt2D]) -> Result<Self> {
        if stations.len() < 2 {
            bail!("A line needs at least 2 stations, but has {}", stations.len());
        }

        let mut offsets = Vec::new();
        for (idx, pt) in stations[0..stations.len() - 1].iter().enumerate() {
            match path.dist_along_of_nearest(*pt) {
                Some(dist) => offsets.push(dist),
                None => bail!("Station #{idx} at {pt} can't be matched to the path"),
            }
        }
        offsets.push(path.length());
        Self::from_offsets(offsets)
    }

    /// Clamps small backwards steps, and fails on anything worse.
    pub fn from_offsets(raw: Vec<Distance>) -> Result<Self> {
        if raw.len() < 2 {
            bail!("An offset table needs at least 2 entries, but has {}", raw.len());
        }

        let mut offsets: Vec<Distance> = Vec::new();
        for (idx, dist) in raw.into_iter().enumerate() {
            let dist = if dist < Distance::ZERO {
                Distance::ZERO
            } else {
                dist
            };
            if let Some(prev) = offsets.last().cloned() {
                if dist < prev {
                    if prev.inner_meters() - dist.inner_meters() > BACKTRACK_TOLERANCE_METERS {
                        bail!(
                            "Station #{idx} is at {dist} along the path, before the previous one at {prev}"
                        );
                    }
                    offsets.push(prev);
                    continue;
                }
            }
            offsets.push(dist);
        }
        Ok(Self { offsets })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn get(&self, idx: usize) -> Distance {
        self.offsets[idx]
    }

    pub fn total(&self) -> Distance {
        self.offsets[self.offsets.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Distance> {
        self.offsets.iter()
    }

    /// Is there a segment starting at this boundary and heading this way?
    pub fn has_segment(&self, idx: usize, direction: Direction) -> bool {
        let next = idx as isize + direction.sign();
        idx < self.len() && next >= 0 && (next as usize) < self.len()
    }

    /// The (start, end) distances of the segment leaving boundary `idx` in `direction`. Going
    /// backwards, end comes before start. Callers check `has_segment` first.
    pub fn segment(&self, idx: usize, direction: Direction) -> (Distance, Distance) {
        let next = (idx as isize + direction.sign()) as usize;
        (self.offsets[idx], self.offsets[next])
    }

    /// The forward length of every segment.
    pub fn segment_lengths(&self) -> Vec<Distance> {
        self.offsets
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meters(x: f64) -> Distance {
        Distance::meters(x)
    }

    fn straight_line() -> (Path, Vec<Pt2D>) {
        let stations = vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0), Pt2D::new(2.0, 0.0)];
        (Path::new(stations.clone(), false).unwrap(), stations)
    }

    #[test]
    fn one_offset_per_station() {
        let (path, stations) = straight_line();
        let table = OffsetTable::new(&path, &stations).unwrap();
        assert_eq!(table.len(), 3);
        let offsets: Vec<f64> = table.iter().map(|d| d.inner_meters()).collect();
        for (actual, expected) in offsets.iter().zip([0.0, 1.0, 2.0]) {
            assert!((actual - expected).abs() < 1e-3);
        }
        assert_eq!(table.total(), path.length());
    }

    #[test]
    fn segment_lengths_sum_to_the_path() {
        let path = Path::new(
            vec![Pt2D::new(0.0, 0.0), Pt2D::new(30.0, 0.0), Pt2D::new(30.0, 40.0)],
            false,
        )
        .unwrap();
        let stations = vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(12.0, 2.0),
            Pt2D::new(31.0, 20.0),
            Pt2D::new(30.0, 40.0),
        ];
        let table = OffsetTable::new(&path, &stations).unwrap();
        assert_eq!(table.len(), 4);
        for pair in table.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        let sum: f64 = table
            .segment_lengths()
            .into_iter()
            .map(|d| d.inner_meters())
            .sum();
        assert!((sum - path.length().inner_meters()).abs() < 1e-6);
    }

    #[test]
    fn last_station_is_replaced_by_path_length() {
        // The last station projects to the middle of the path; the line still runs to the end.
        let (path, _) = straight_line();
        let stations = vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 5.0)];
        let table = OffsetTable::new(&path, &stations).unwrap();
        assert_eq!(table.total(), path.length());
    }

    #[test]
    fn small_backtracks_clamp_and_big_ones_fail() {
        let table =
            OffsetTable::from_offsets(vec![meters(0.0), meters(10.0), meters(9.5), meters(20.0)])
                .unwrap();
        assert_eq!(table.get(2), meters(10.0));

        assert!(OffsetTable::from_offsets(vec![
            meters(0.0),
            meters(10.0),
            meters(5.0),
            meters(20.0)
        ])
        .is_err());
        assert!(OffsetTable::from_offsets(vec![meters(0.0)]).is_err());
    }

    #[test]
    fn segments_in_both_directions() {
        let table =
            OffsetTable::from_offsets(vec![meters(0.0), meters(10.0), meters(25.0)]).unwrap();
        assert_eq!(
            table.segment(1, Direction::Forwards),
            (meters(10.0), meters(25.0))
        );
        assert_eq!(
            table.segment(1, Direction::Backwards),
            (meters(10.0), meters(0.0))
        );
        assert!(table.has_segment(0, Direction::Forwards));
        assert!(!table.has_segment(0, Direction::Backwards));
        assert!(!table.has_segment(2, Direction::Forwards));
        assert!(!table.has_segment(3, Direction::Backwards));
    }

    #[test]
    fn too_few_stations() {
        let (path, _) = straight_line();
        assert!(OffsetTable::new(&path, &[Pt2D::new(0.0, 0.0)]).is_err());
    }
}
