use geom::{Duration, Time, UnitFmt};
use widgetry::{
    EventCtx, GfxCtx, HorizontalAlignment, Key, Line, Outcome, Panel, Text, VerticalAlignment,
    Widget,
};

use crate::App;

pub struct TimeControls {
    pub panel: Panel,
    time: Time,
    paused: bool,
    setting: SpeedSetting,
}

#[derive(Clone, Copy, PartialEq)]
pub enum SpeedSetting {
    /// 1 animation second per real second
    Realtime,
    /// 2 animation seconds per real second
    Fast,
    /// 5 animation seconds per real second
    Faster,
    /// 10 animation seconds per real second
    Fastest,
}

impl SpeedSetting {
    fn multiplier(self) -> f64 {
        match self {
            SpeedSetting::Realtime => 1.0,
            SpeedSetting::Fast => 2.0,
            SpeedSetting::Faster => 5.0,
            SpeedSetting::Fastest => 10.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SpeedSetting::Realtime => "real-time speed",
            SpeedSetting::Fast => "2x speed",
            SpeedSetting::Faster => "5x speed",
            SpeedSetting::Fastest => "10x speed",
        }
    }

    fn slower(self) -> Option<SpeedSetting> {
        match self {
            SpeedSetting::Realtime => None,
            SpeedSetting::Fast => Some(SpeedSetting::Realtime),
            SpeedSetting::Faster => Some(SpeedSetting::Fast),
            SpeedSetting::Fastest => Some(SpeedSetting::Faster),
        }
    }

    fn faster(self) -> Option<SpeedSetting> {
        match self {
            SpeedSetting::Realtime => Some(SpeedSetting::Fast),
            SpeedSetting::Fast => Some(SpeedSetting::Faster),
            SpeedSetting::Faster => Some(SpeedSetting::Fastest),
            SpeedSetting::Fastest => None,
        }
    }
}

const ALL_SPEEDS: [SpeedSetting; 4] = [
    SpeedSetting::Realtime,
    SpeedSetting::Fast,
    SpeedSetting::Faster,
    SpeedSetting::Fastest,
];

impl TimeControls {
    pub fn new(ctx: &mut EventCtx, app: &App) -> Self {
        let mut time = Self {
            panel: Panel::new_builder(Widget::col(vec![
                Widget::placeholder(ctx, "clock"),
                Widget::placeholder(ctx, "controls"),
                Widget::placeholder(ctx, "tracking"),
            ]))
            .aligned(HorizontalAlignment::Left, VerticalAlignment::Bottom)
            .build(ctx),
            time: app.time,
            paused: false,
            setting: SpeedSetting::Realtime,
        };
        time.update_controls(ctx);
        time
    }

    fn update_controls(&mut self, ctx: &mut EventCtx) {
        self.on_time_change(ctx);

        let mut row = Vec::new();
        row.push(
            ctx.style()
                .btn_plain
                .text(if self.paused { "play" } else { "pause" })
                .hotkey(Key::Space)
                .build_def(ctx)
                .margin_right(16),
        );

        for s in ALL_SPEEDS {
            let mut txt = Text::from(Line(s.label()).small());
            txt.extend(Text::tooltip(ctx, Key::LeftArrow, "slow down"));
            txt.extend(Text::tooltip(ctx, Key::RightArrow, "speed up"));

            let btn = if self.setting == s {
                ctx.style().btn_solid_primary.text(s.label())
            } else {
                ctx.style().btn_outline.text(s.label())
            };
            row.push(btn.tooltip(txt).build_def(ctx));
        }

        self.panel.replace(ctx, "controls", Widget::custom_row(row));
    }

    fn on_time_change(&mut self, ctx: &mut EventCtx) {
        let metric = UnitFmt {
            round_durations: false,
            metric: true,
        };
        let elapsed = self.time - Time::START_OF_DAY;
        let clock =
            Text::from(Line(elapsed.to_string(&metric)).big_monospaced()).into_widget(ctx);
        self.panel.replace(ctx, "clock", clock);
    }

    // May update app.time and app.wall_clock. Clicks on buttons that other callers put in the
    // panel are returned.
    pub fn event(&mut self, ctx: &mut EventCtx, app: &mut App) -> Option<String> {
        if self.time != app.time {
            self.time = app.time;
            self.on_time_change(ctx);
        }

        let mut unhandled = None;
        if let Outcome::Clicked(x) = self.panel.event(ctx) {
            match x.as_ref() {
                "play" => {
                    self.paused = false;
                    self.update_controls(ctx);
                }
                "pause" => {
                    self.pause(ctx);
                }
                x => {
                    if let Some(s) = ALL_SPEEDS.into_iter().find(|s| s.label() == x) {
                        self.setting = s;
                        self.update_controls(ctx);
                    } else {
                        unhandled = Some(x.to_string());
                    }
                }
            }
        }

        if ctx.input.pressed(Key::LeftArrow) {
            match self.setting.slower() {
                Some(s) => {
                    self.setting = s;
                    self.update_controls(ctx);
                }
                None => self.pause(ctx),
            }
        }
        if ctx.input.pressed(Key::RightArrow) {
            if self.paused {
                self.paused = false;
                self.update_controls(ctx);
            } else if let Some(s) = self.setting.faster() {
                self.setting = s;
                self.update_controls(ctx);
            }
        }

        if let Some(real_dt) = ctx.input.nonblocking_is_update_event() {
            ctx.input.use_update_event();
            app.wall_clock += real_dt;
            if !self.paused {
                let dt: Duration = self.setting.multiplier() * real_dt;
                app.time += dt;
            }
        }

        unhandled
    }

    pub fn draw(&self, g: &mut GfxCtx) {
        self.panel.draw(g);
    }

    pub fn pause(&mut self, ctx: &mut EventCtx) {
        if !self.paused {
            self.paused = true;
            self.update_controls(ctx);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
