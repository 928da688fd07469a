use std::collections::BTreeMap;

use anyhow::Result;
use geom::Time;

use railway::{CarID, Network};

use crate::{AnimationConfig, Footprint, MotionState, Progress, Scheduler, Vehicle};

/// Every car in the network, plus the scheduler driving them. Each car cycles between moving
/// along a segment and dwelling at the station it reaches.
pub struct Fleet {
    vehicles: BTreeMap<CarID, Vehicle>,
    scheduler: Scheduler<CarID>,
    config: AnimationConfig,
}

impl Fleet {
    /// Fails if any car doesn't fit the network. Every car starts moving on the first tick.
    pub fn new(network: &Network, config: AnimationConfig) -> Result<Self> {
        config.validate()?;

        let mut fleet = Self {
            vehicles: BTreeMap::new(),
            scheduler: Scheduler::new(),
            config,
        };
        let size = fleet.config.footprint_size(fleet.config.reference_zoom);
        for spec in &network.cars {
            let line = match network.lines.get(&spec.line) {
                Some(line) => line,
                None => bail!("{:?} belongs to unknown {:?}", spec.id, spec.line),
            };
            if fleet.vehicles.contains_key(&spec.id) {
                bail!("{:?} is defined twice", spec.id);
            }
            let mut vehicle = Vehicle::new(spec, line, size)?;
            let (from, to) = vehicle.segment();
            let task = fleet
                .scheduler
                .run_transition(spec.id, fleet.config.segment_duration(from, to));
            vehicle.state = MotionState::Moving { task };
            fleet.vehicles.insert(spec.id, vehicle);
        }
        info!("Animating {} cars", fleet.vehicles.len());
        Ok(fleet)
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Advance every car to `now`. `zoom` is the render engine's current zoom level, used to size
    /// the footprints.
    pub fn tick(&mut self, network: &Network, now: Time, zoom: f64) {
        let size = self.config.footprint_size(zoom);
        for progress in self.scheduler.tick(now) {
            match progress {
                Progress::Step { owner, task, eased } => {
                    let vehicle = match self.vehicles.get_mut(&owner) {
                        Some(vehicle) => vehicle,
                        None => continue,
                    };
                    if vehicle.state == (MotionState::Moving { task }) {
                        vehicle.on_step(network.line(vehicle.line), eased, size);
                    }
                }
                Progress::Done { owner, task } => {
                    let vehicle = match self.vehicles.get_mut(&owner) {
                        Some(vehicle) => vehicle,
                        None => continue,
                    };
                    match vehicle.state {
                        MotionState::Moving { task: current } if current == task => {
                            vehicle.arrive(network.line(vehicle.line));
                            let dwell = self.scheduler.delay(owner, self.config.dwell());
                            vehicle.state = MotionState::Paused { task: dwell };
                        }
                        MotionState::Paused { task: current } if current == task => {
                            let (from, to) = vehicle.segment();
                            let next = self
                                .scheduler
                                .run_transition(owner, self.config.segment_duration(from, to));
                            vehicle.state = MotionState::Moving { task: next };
                        }
                        // Stale
                        _ => {}
                    }
                }
            }
        }
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn vehicle(&self, id: CarID) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    pub fn footprints(&self) -> impl Iterator<Item = (CarID, &Footprint)> {
        self.vehicles.values().map(|vehicle| (vehicle.id, vehicle.footprint()))
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Stop a car where it is, abandoning its current transition or dwell. False if the car
    /// doesn't exist or is already stopped.
    pub fn cancel(&mut self, id: CarID) -> bool {
        let vehicle = match self.vehicles.get_mut(&id) {
            Some(vehicle) => vehicle,
            None => return false,
        };
        match vehicle.state {
            MotionState::Moving { task } | MotionState::Paused { task } => {
                self.scheduler.cancel(task);
                vehicle.state = MotionState::Stopped;
                true
            }
            MotionState::Stopped => false,
        }
    }

    /// Restart a stopped car from the beginning of its current segment.
    pub fn resume(&mut self, network: &Network, id: CarID) -> bool {
        let vehicle = match self.vehicles.get_mut(&id) {
            Some(vehicle) => vehicle,
            None => return false,
        };
        if vehicle.state != MotionState::Stopped {
            return false;
        }
        vehicle.rewind(
            network.line(vehicle.line),
            self.config.footprint_size(self.config.reference_zoom),
        );
        let (from, to) = vehicle.segment();
        let task = self
            .scheduler
            .run_transition(id, self.config.segment_duration(from, to));
        vehicle.state = MotionState::Moving { task };
        true
    }
}
