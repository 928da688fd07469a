use serde::{Deserialize, Serialize};

use railway::CarID;

/// Which car, if any, the camera follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracking(pub Option<CarID>);

impl Tracking {
    pub fn car(self) -> Option<CarID> {
        self.0
    }

    /// Nothing, then every car in turn, then nothing again.
    pub fn cycle(self, num_cars: usize) -> Tracking {
        match self.0 {
            None if num_cars > 0 => Tracking(Some(CarID(0))),
            None => Tracking(None),
            Some(CarID(idx)) if idx + 1 < num_cars => Tracking(Some(CarID(idx + 1))),
            Some(_) => Tracking(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_presses_with_ten_cars_wraps_around() {
        let mut tracking = Tracking::default();
        let mut seen = Vec::new();
        for _ in 0..11 {
            tracking = tracking.cycle(10);
            seen.push(tracking.car());
        }
        assert_eq!(tracking, Tracking(None));
        let expected: Vec<Option<CarID>> = (0..10).map(|idx| Some(CarID(idx))).collect();
        assert_eq!(seen[0..10], expected[..]);
    }

    #[test]
    fn no_cars_means_nothing_to_track() {
        assert_eq!(Tracking(None).cycle(0), Tracking(None));
        // A stale selection from a bigger fleet gets cleared
        assert_eq!(Tracking(Some(CarID(20))).cycle(3), Tracking(None));
    }
}
