#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod easing;
mod fleet;
mod scene;
mod tracking;
mod vehicle;

pub use self::config::AnimationConfig;
pub use self::easing::{ease_sin, Progress, Scheduler, TaskID};
pub use self::fleet::Fleet;
pub use self::scene::{GeoJsonSink, RenderSink, SceneDriver, VehicleFeature};
pub use self::tracking::Tracking;
pub use self::vehicle::{Footprint, MotionState, Vehicle};
