use crate::core::track::TrackView;
use crate::interfaces::arcadesim_interface::ArcadesimInterface;
use arcadesim::core::controller::{InputState, Key};
use arcadesim::core::race::{RacePars, RacePhase};
use arcadesim::core::track::TrackPars;
use arcadesim::interfaces::gui_interface::{ObjectState, RaceState, RgbColor};
use arcadesim::interfaces::platform::Overlay;
use eframe::egui;
use flume::{Receiver, Sender};
use helpers::buffer::RingBuffer;
use helpers::geometry::{Point2d, Vector2d};
use std::fmt::Write;
use std::time::Instant;

const KEY_MAP: [(egui::Key, Key); 9] = [
    (egui::Key::W, Key::W),
    (egui::Key::A, Key::A),
    (egui::Key::S, Key::S),
    (egui::Key::D, Key::D),
    (egui::Key::ArrowUp, Key::ArrowUp),
    (egui::Key::ArrowDown, Key::ArrowDown),
    (egui::Key::ArrowLeft, Key::ArrowLeft),
    (egui::Key::ArrowRight, Key::ArrowRight),
    (egui::Key::Space, Key::Space),
];

#[derive(Debug)]
pub struct RaceInfo {
    pub tot_no_laps: u32,
}

#[derive(Debug)]
pub struct RacePlot {
    pub arcadesim_interface: ArcadesimInterface,
    pub race_info: RaceInfo,
    pub track_view: TrackView,
    pub prev_update: Instant,
    pub prev_update_durations: RingBuffer<u32>,
}

impl RacePlot {
    pub fn new(
        rx: Receiver<RaceState>,
        tx_input: Sender<InputState>,
        race_pars: &RacePars,
        track_pars: &TrackPars,
    ) -> RacePlot {
        RacePlot {
            arcadesim_interface: ArcadesimInterface::new(rx, tx_input),
            race_info: RaceInfo {
                tot_no_laps: race_pars.tot_no_laps,
            },
            track_view: TrackView::new(track_pars),
            prev_update: Instant::now(),
            prev_update_durations: RingBuffer::new(10),
        }
    }

    /// read_input collects the currently pressed keys that control the player vehicle.
    fn read_input(ctx: &egui::Context) -> InputState {
        let mut input = InputState::default();

        ctx.input(|i| {
            for (egui_key, key) in KEY_MAP.iter() {
                if i.key_down(*egui_key) {
                    input.press(*key);
                }
            }
        });

        input
    }

    pub fn set_ui_content(&mut self, ui: &mut egui::Ui) -> egui::Response {
        // PREPARATIONS ----------------------------------------------------------------------------
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());

        // get transformation from x/z to pixels in the window (z axis must be inverted)
        let [x_min, x_max, z_min, z_max] = self.track_view.get_axes_expansion(50.0);

        let to_screen = egui::emath::RectTransform::from_to(
            egui::Rect::from_min_max(
                egui::pos2(x_min as f32, z_max as f32),
                egui::pos2(x_max as f32, z_min as f32),
            ),
            response.rect,
        );
        let scale = response.rect.width() / (x_max - x_min) as f32;
        let to_pos = |x: f64, z: f64| to_screen * egui::pos2(x as f32, z as f32);

        let hud_text = self.create_hud_text();
        let mut shapes = vec![];
        let race_state = &self.arcadesim_interface.race_state;

        // TRACK DRAWING ---------------------------------------------------------------------------
        let centerline: Vec<egui::Pos2> = self
            .track_view
            .centerline
            .iter()
            .map(|p| to_pos(p.x, p.y))
            .collect();

        shapes.push(egui::Shape::line(
            centerline.to_owned(),
            egui::Stroke::new(
                self.track_view.road_width as f32 * scale,
                egui::Color32::from_gray(50),
            ),
        ));
        shapes.push(egui::Shape::line(
            centerline,
            egui::Stroke::new(1.0, egui::Color32::from_gray(110)),
        ));

        let [sf_1, sf_2] = self.track_view.start_line;
        shapes.push(egui::Shape::line_segment(
            [to_pos(sf_1.x, sf_1.y), to_pos(sf_2.x, sf_2.y)],
            egui::Stroke::new(3.0, egui::Color32::WHITE),
        ));

        // OBJECTS DRAWING -------------------------------------------------------------------------
        let mut draw_objects = |objects: &[ObjectState], radius: f32, color: egui::Color32| {
            for obj in objects.iter().filter(|obj| obj.visible) {
                shapes.push(egui::Shape::circle_filled(
                    to_pos(obj.x, obj.z),
                    (radius * obj.size as f32).max(1.5),
                    color,
                ));
            }
        };

        draw_objects(
            &race_state.health_pickups,
            2.0 * scale,
            egui::Color32::from_rgb(0, 255, 100),
        );
        draw_objects(
            &race_state.shield_pickups,
            2.0 * scale,
            egui::Color32::from_rgb(0, 200, 255),
        );
        draw_objects(
            &race_state.ghosts,
            2.0 * scale,
            egui::Color32::from_rgba_unmultiplied(220, 220, 255, 140),
        );
        draw_objects(
            &race_state.effects,
            scale,
            egui::Color32::from_rgb(255, 170, 0),
        );

        // VEHICLES DRAWING ------------------------------------------------------------------------
        for veh in race_state.vehicle_states.iter() {
            let pos = to_pos(veh.x, veh.z);
            let radius = (if veh.is_player { 4.0 } else { 3.0 }) * scale.max(1.0);
            let color = if veh.destroyed {
                egui::Color32::from_gray(70)
            } else {
                to_color32(veh.color)
            };

            shapes.push(egui::Shape::circle_filled(pos, radius, color));

            if !veh.destroyed {
                let fwd = Vector2d::from_heading(veh.heading).mult(8.0);
                let tip = Point2d { x: veh.x, y: veh.z }.shift(&fwd);
                shapes.push(egui::Shape::line_segment(
                    [pos, to_pos(tip.x, tip.y)],
                    egui::Stroke::new(2.0, color),
                ));
            }
            if veh.shielded {
                shapes.push(egui::Shape::circle_stroke(
                    pos,
                    radius + 4.0,
                    egui::Stroke::new(2.0, egui::Color32::from_rgb(0, 200, 255)),
                ));
            }
            if veh.boosting {
                shapes.push(egui::Shape::circle_stroke(
                    pos,
                    radius + 2.0,
                    egui::Stroke::new(1.5, egui::Color32::from_rgb(255, 100, 0)),
                ));
            }
        }

        // helicopters and missiles fly above everything else
        for heli in race_state.helicopters.iter().filter(|heli| heli.visible) {
            shapes.push(egui::Shape::circle_stroke(
                to_pos(heli.x, heli.z),
                heli.size as f32 * scale.max(1.0),
                egui::Stroke::new(2.0, egui::Color32::from_gray(200)),
            ));
        }
        for missile in race_state.missiles.iter().filter(|missile| missile.visible) {
            shapes.push(egui::Shape::circle_filled(
                to_pos(missile.x, missile.z),
                2.5,
                egui::Color32::from_rgb(255, 60, 0),
            ));
        }

        painter.extend(shapes);

        // HUD -------------------------------------------------------------------------------------
        let rect = response.rect;
        let hud_font = egui::FontId::monospace(14.0);

        painter.text(
            rect.left_top() + egui::vec2(10.0, 10.0),
            egui::Align2::LEFT_TOP,
            hud_text,
            hud_font.to_owned(),
            egui::Color32::WHITE,
        );
        painter.text(
            rect.right_top() + egui::vec2(-10.0, 10.0),
            egui::Align2::RIGHT_TOP,
            create_leaderboard_text(race_state),
            hud_font,
            egui::Color32::WHITE,
        );

        if let Some(overlay) = &race_state.overlay {
            let (text, color) = overlay_text(overlay);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(36.0),
                color,
            );
        }

        response
    }

    fn create_hud_text(&mut self) -> String {
        let race_state = &self.arcadesim_interface.race_state;
        let hud = &race_state.hud;
        let mut hud_text = format!(
            "{} ({})\n",
            self.track_view.name,
            phase_label(&race_state.phase)
        );

        // writing to a String cannot fail
        let _ = writeln!(&mut hud_text, "Time:   {:.1}s", race_state.race_time);
        let _ = writeln!(
            &mut hud_text,
            "Lap:    {}/{}",
            hud.lap.max(1),
            self.race_info.tot_no_laps
        );
        let _ = writeln!(
            &mut hud_text,
            "Rank:   {}{}/{}",
            hud.rank, hud.rank_ordinal, hud.no_vehicles
        );
        let _ = writeln!(&mut hud_text, "Speed:  {:.0}", hud.speed);
        let _ = writeln!(&mut hud_text, "RPM:    {:.0}", hud.rpm);
        let _ = writeln!(&mut hud_text, "Nitro:  {}", text_bar(hud.nitro / 100.0));
        let _ = writeln!(
            &mut hud_text,
            "Health: {}{}",
            text_bar(hud.health_frac),
            if hud.health_danger { " !" } else { "" }
        );

        if let Some(secs) = hud.invincibility {
            let _ = writeln!(&mut hud_text, "Invincible: {:.0}s", secs);
        }

        // calculate current UI update duration, append it to the buffer, and set update time
        self.prev_update_durations
            .push(self.prev_update.elapsed().as_millis() as u32);
        self.prev_update = Instant::now();

        if let Some(avg) = self.prev_update_durations.get_avg() {
            let _ = write!(
                &mut hud_text,
                "GUI update frequency: {:.0} Hz",
                1000.0 / avg.max(1.0)
            );
        }

        hud_text
    }
}

impl eframe::App for RacePlot {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // forward the pressed keys and obtain the latest race state
        self.arcadesim_interface.send_input(RacePlot::read_input(ctx));
        self.arcadesim_interface.update();

        // update UI content
        egui::CentralPanel::default()
            .frame(egui::Frame::dark_canvas(&ctx.style()))
            .show(ctx, |ui| {
                self.set_ui_content(ui);
            });

        // request repaint of the UI
        ctx.request_repaint();
    }
}

fn to_color32(color: RgbColor) -> egui::Color32 {
    egui::Color32::from_rgb(color.r, color.g, color.b)
}

fn text_bar(frac: f64) -> String {
    let no_filled = (frac.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(no_filled), ".".repeat(10 - no_filled))
}

fn create_leaderboard_text(race_state: &RaceState) -> String {
    let mut text = String::new();

    for entry in race_state.hud.leaderboard.iter() {
        let status = if entry.destroyed {
            String::from("OUT")
        } else {
            format!("{:3.0}%", entry.health_frac * 100.0)
        };
        let _ = writeln!(
            &mut text,
            "{}{:2}. {:8} {}",
            if entry.is_player { ">" } else { " " },
            entry.rank,
            entry.name,
            status
        );
    }

    text
}

fn overlay_text(overlay: &Overlay) -> (String, egui::Color32) {
    match overlay {
        Overlay::Countdown(text) => (text.to_owned(), egui::Color32::YELLOW),
        Overlay::Toast(text) => (text.to_owned(), egui::Color32::from_rgb(0, 255, 200)),
        Overlay::GameOver { title, message } => {
            (format!("{}\n{}", title, message), egui::Color32::RED)
        }
        Overlay::Victory { race_time } => (
            format!("VICTORY!\nRace time {:.1}s", race_time),
            egui::Color32::GOLD,
        ),
        Overlay::RaceOver {
            winner,
            player_rank,
        } => (
            format!("RACE OVER\n{} won, you finished {}", winner, player_rank),
            egui::Color32::LIGHT_RED,
        ),
    }
}

fn phase_label(phase: &RacePhase) -> &'static str {
    match phase {
        RacePhase::Countdown { .. } => "countdown",
        RacePhase::Racing => "racing",
        RacePhase::Won => "won",
        RacePhase::Lost(_) => "lost",
        RacePhase::RaceOver { .. } => "race over",
    }
}
