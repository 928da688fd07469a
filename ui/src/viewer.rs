use std::collections::BTreeMap;

use geom::{Distance, Polygon, Pt2D, Time};
use widgetry::{
    Color, Drawable, EventCtx, GeomBatch, GfxCtx, Key, Line, State, Text, UpdateType, Widget,
};

use model::{RenderSink, VehicleFeature};
use railway::{CarID, Network};

use crate::speed::TimeControls;
use crate::{App, Transition};

pub struct Viewer {
    time_controls: TimeControls,
    network_layer: Drawable,
    vehicle_layer: Drawable,
    // Drawn in place of a footprint that can't be turned into a polygon
    last_good_footprints: BTreeMap<CarID, Polygon>,
    camera_bearing: Option<f64>,

    // The vehicle layer only needs rebuilding when one of these changes
    last_time: Option<Time>,
    last_zoom: f64,
    last_wall_clock: Option<Time>,
}

impl Viewer {
    pub fn new_state(ctx: &mut EventCtx, app: &App) -> Box<dyn State<App>> {
        let mut state = Self {
            time_controls: TimeControls::new(ctx, app),
            network_layer: ctx.upload(draw_network(&app.network)),
            vehicle_layer: Drawable::empty(ctx),
            last_good_footprints: BTreeMap::new(),
            camera_bearing: None,

            last_time: None,
            last_zoom: 0.0,
            last_wall_clock: None,
        };
        state.update_tracking_panel(ctx, app);
        Box::new(state)
    }

    fn update_tracking_panel(&mut self, ctx: &mut EventCtx, app: &App) {
        let mut txt = Text::new();
        match app.tracking.car() {
            Some(id) => {
                txt.add_line(Line(format!("Following car {} of {}", id.0 + 1, app.fleet.len())));
                if let Some(bearing) = self.camera_bearing {
                    txt.add_line(
                        Line(format!("Camera bearing: {}°", bearing.round())).secondary(),
                    );
                }
            }
            None => {
                txt.add_line(Line(format!("{} cars running", app.fleet.len())));
            }
        }

        let widget = Widget::col(vec![
            txt.into_widget(ctx),
            ctx.style()
                .btn_outline
                .text("track next car")
                .hotkey(Key::T)
                .disabled(app.fleet.is_empty())
                .build_def(ctx),
        ]);
        self.time_controls.panel.replace(ctx, "tracking", widget);
    }

    fn on_frame(&mut self, ctx: &mut EventCtx, app: &mut App) {
        let zoom = app.zoom_level(&ctx.canvas);
        let moved = self.last_time != Some(app.time) || self.last_zoom != zoom;
        let orbiting =
            app.tracking.car().is_some() && self.last_wall_clock != Some(app.wall_clock);
        if !moved && !orbiting {
            return;
        }
        self.last_time = Some(app.time);
        self.last_zoom = zoom;
        self.last_wall_clock = Some(app.wall_clock);

        if moved {
            app.fleet.tick(&app.network, app.time, zoom);
        }

        let was_tracking = self.camera_bearing.is_some();
        self.camera_bearing = None;
        let mut sink = CanvasSink {
            ctx,
            vehicles: &mut self.vehicle_layer,
            last_good_footprints: &mut self.last_good_footprints,
            camera_bearing: &mut self.camera_bearing,
        };
        app.scene.render(app.wall_clock, &app.fleet, app.tracking, &mut sink);

        if was_tracking || self.camera_bearing.is_some() {
            self.update_tracking_panel(ctx, app);
        }
    }
}

impl State<App> for Viewer {
    fn event(&mut self, ctx: &mut EventCtx, app: &mut App) -> Transition {
        ctx.canvas_movement();

        if let Some(x) = self.time_controls.event(ctx, app) {
            match x.as_ref() {
                "track next car" => {
                    app.tracking = app.tracking.cycle(app.fleet.len());
                    info!("Now tracking {:?}", app.tracking.car());
                    self.update_tracking_panel(ctx, app);
                    // Jump to the newly tracked car even if paused
                    self.last_time = None;
                }
                _ => unreachable!(),
            }
        }

        self.on_frame(ctx, app);

        // The tracking camera keeps orbiting while paused
        if !self.time_controls.is_paused() || app.tracking.car().is_some() {
            ctx.request_update(UpdateType::Game);
        }

        Transition::Keep
    }

    fn draw(&self, g: &mut GfxCtx, _: &App) {
        g.redraw(&self.network_layer);
        g.redraw(&self.vehicle_layer);
        self.time_controls.draw(g);
    }
}

/// Draws frames onto the canvas.
struct CanvasSink<'a, 'b> {
    ctx: &'a mut EventCtx<'b>,
    vehicles: &'a mut Drawable,
    last_good_footprints: &'a mut BTreeMap<CarID, Polygon>,
    camera_bearing: &'a mut Option<f64>,
}

impl RenderSink for CanvasSink<'_, '_> {
    fn replace_vehicles(&mut self, vehicles: Vec<VehicleFeature>) {
        let batch = draw_vehicles(vehicles, self.last_good_footprints);
        *self.vehicles = self.ctx.upload(batch);
    }

    // The canvas can't rotate, so the bearing is only displayed
    fn jump_to(&mut self, center: Pt2D, bearing: f64) {
        self.ctx.canvas.center_on_map_pt(center);
        *self.camera_bearing = Some(bearing);
    }
}

/// A car whose footprint can't become a polygon keeps the last one it had.
fn draw_vehicles(
    vehicles: Vec<VehicleFeature>,
    last_good_footprints: &mut BTreeMap<CarID, Polygon>,
) -> GeomBatch {
    let mut batch = GeomBatch::new();
    for vehicle in vehicles {
        let polygon = match vehicle.footprint.to_polygon() {
            Ok(polygon) => {
                last_good_footprints.insert(vehicle.car, polygon.clone());
                polygon
            }
            Err(err) => {
                warn!("Couldn't rebuild the footprint of {:?}: {}", vehicle.car, err);
                match last_good_footprints.get(&vehicle.car) {
                    Some(polygon) => polygon.clone(),
                    None => continue,
                }
            }
        };
        batch.push(Color::hex(&vehicle.color), polygon);
    }
    batch
}

/// Lines and stations never change, so they're drawn once.
fn draw_network(network: &Network) -> GeomBatch {
    let mut batch = GeomBatch::new();
    if network.stations.is_empty() {
        return batch;
    }
    // Show the bounds of the world
    batch.push(Color::grey(0.1), network.bounds.get_rectangle());

    for line in network.lines.values() {
        batch.push(
            Color::hex(&line.color),
            line.path.polyline().make_polygons(Distance::meters(8.0)),
        );
    }
    for station in network.stations.values() {
        for polygon in &station.footprint {
            batch.push(Color::WHITE, polygon.clone());
        }
    }
    batch
}
