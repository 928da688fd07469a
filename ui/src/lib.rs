#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod speed;
mod viewer;

use abstutil::Timer;
use anyhow::Result;
use geom::{Duration, Time};
use serde::{Deserialize, Serialize};
use structopt::StructOpt;
use widgetry::{Canvas, Color, EventCtx, GfxCtx, Settings, SharedAppState};

use model::{AnimationConfig, Fleet, GeoJsonSink, SceneDriver, Tracking};
use railway::Network;

#[derive(StructOpt)]
struct Args {
    /// A directory containing lines.json, stations.json, and cars.json
    #[structopt(long)]
    data_dir: Option<String>,
    /// A .zip file with the same files under data/
    #[structopt(long)]
    data_zip: Option<String>,
    /// A JSON file overriding animation settings
    #[structopt(long)]
    config: Option<String>,
    /// Write the static lines and stations as GeoJSON to this path, then quit
    #[structopt(long)]
    export_geojson: Option<String>,
    /// Run the animation without a window and write the cars as GeoJSON to this path, then quit
    #[structopt(long)]
    dump_frame: Option<String>,
    /// How far to run the animation before --dump-frame
    #[structopt(long, default_value = "10")]
    dump_after_secs: f64,
}

impl Args {
    // TODO These args only make sense on native, because they read files
    fn load_network(&self) -> Result<Network> {
        match (&self.data_dir, &self.data_zip) {
            (Some(_), Some(_)) => bail!("You can't specify both --data-dir and --data-zip"),
            (Some(dir), None) => Network::load_from_dir(dir),
            (None, Some(path)) => {
                let mut archive = zip::ZipArchive::new(fs_err::File::open(path)?)?;
                Network::load_from_zip(&mut archive)
            }
            (None, None) => Ok(Network::empty()),
        }
    }

    fn load_config(&self) -> Result<AnimationConfig> {
        let config = match self.config {
            Some(ref path) => {
                abstio::maybe_read_json::<AnimationConfig>(path.clone(), &mut Timer::throwaway())?
            }
            None => AnimationConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Handles the modes that never open a window. Returns true if one ran.
    fn run_headless(&self, network: &Network, config: &AnimationConfig) -> Result<bool> {
        let mut ran = false;
        if let Some(ref path) = self.export_geojson {
            network.export_geojson(path)?;
            ran = true;
        }
        if let Some(ref path) = self.dump_frame {
            dump_frame(network, config.clone(), self.dump_after_secs, path)?;
            ran = true;
        }
        Ok(ran)
    }
}

/// Steps the fleet at a fixed frame rate, then writes the final frame.
fn dump_frame(network: &Network, config: AnimationConfig, secs: f64, path: &str) -> Result<()> {
    if secs.is_nan() || secs < 0.0 {
        bail!("--dump-after-secs must be non-negative, not {secs}");
    }
    let start = Time::START_OF_DAY;
    let end = start + Duration::seconds(secs);
    let frame = Duration::seconds(1.0 / 60.0);

    let mut fleet = Fleet::new(network, config.clone())?;
    let scene = SceneDriver::new(start, config.clone());
    let mut now = start;
    loop {
        fleet.tick(network, now, config.reference_zoom);
        if now >= end {
            break;
        }
        now = if now + frame > end { end } else { now + frame };
    }

    let mut sink = GeoJsonSink::new(network.gps_bounds.clone());
    scene.render(now, &fleet, Tracking::default(), &mut sink);
    sink.write(path)
}

fn run(settings: Settings) {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    // Fail fast on bad input, before any window opens
    let network = match args.load_network() {
        Ok(network) => network,
        Err(err) => panic!("Couldn't load the rail network: {err:?}"),
    };
    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => panic!("Bad --config: {err:?}"),
    };
    match args.run_headless(&network, &config) {
        Ok(true) => return,
        Ok(false) => {}
        Err(err) => panic!("{err:?}"),
    }

    widgetry::run(settings, move |ctx| {
        let mut app = match App::new(ctx, network, config) {
            Ok(app) => app,
            Err(err) => panic!("Couldn't start the animation: {err:?}"),
        };

        // Only makes sense with the same network used across different runs
        if let Ok(savestate) = abstio::maybe_read_json::<Savestate>(
            "data/save.json".to_string(),
            &mut Timer::throwaway(),
        ) {
            ctx.canvas.cam_x = savestate.cam_x;
            ctx.canvas.cam_y = savestate.cam_y;
            ctx.canvas.cam_zoom = savestate.cam_zoom;
            if savestate
                .tracking
                .car()
                .map(|id| app.fleet.vehicle(id).is_some())
                .unwrap_or(true)
            {
                app.tracking = savestate.tracking;
            }
        }

        let states = vec![crate::viewer::Viewer::new_state(ctx, &app)];
        (app, states)
    });
}

pub fn main() {
    let settings = Settings::new("Rail Network");
    run(settings);
}

pub struct App {
    network: Network,
    fleet: Fleet,
    scene: SceneDriver,
    tracking: Tracking,

    /// Drives the fleet; runs faster or slower than real time, or stops
    time: Time,
    /// Real time since startup, for the tracking camera's orbit
    wall_clock: Time,
}

impl SharedAppState for App {
    fn draw_default(&self, g: &mut GfxCtx) {
        g.clear(Color::BLACK);
    }

    fn before_quit(&self, canvas: &Canvas) {
        let ss = Savestate {
            cam_x: canvas.cam_x,
            cam_y: canvas.cam_y,
            cam_zoom: canvas.cam_zoom,
            tracking: self.tracking,
        };
        abstio::write_json("data/save.json".to_string(), &ss);
    }
}

pub type Transition = widgetry::Transition<App>;

impl App {
    pub fn new(ctx: &mut EventCtx, network: Network, config: AnimationConfig) -> Result<Self> {
        let bounds = &network.bounds;
        ctx.canvas.map_dims = (bounds.max_x, bounds.max_y);
        ctx.canvas.center_on_map_pt(bounds.center());

        let time = Time::START_OF_DAY;
        let fleet = Fleet::new(&network, config.clone())?;
        Ok(Self {
            network,
            fleet,
            scene: SceneDriver::new(time, config),
            tracking: Tracking::default(),

            time,
            wall_clock: time,
        })
    }

    /// The canvas zoom, expressed as a web-map zoom level
    pub fn zoom_level(&self, canvas: &Canvas) -> f64 {
        self.fleet.config().reference_zoom + canvas.cam_zoom.log2()
    }
}

#[derive(Serialize, Deserialize)]
pub struct Savestate {
    cam_x: f64,
    cam_y: f64,
    cam_zoom: f64,
    tracking: Tracking,
}
