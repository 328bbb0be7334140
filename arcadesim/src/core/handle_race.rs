use crate::core::controller::InputState;
use crate::core::effects::EffectKind;
use crate::core::hazards::PickupKind;
use crate::core::race::Race;
use crate::interfaces::gui_interface::{
    ObjectState, RaceState, RgbColor, VehicleState, MAX_GUI_UPDATE_FREQUENCY,
};
use crate::interfaces::platform::HeadlessPlatform;
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::{Receiver, Sender};
use helpers::buffer::RingBuffer;
use helpers::geometry::Point3d;
use log::{debug, info, warn};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. If a sender is inserted, the race is simulated in real-time
/// (scaled by the real-time factor), snapshots are sent to the GUI, and the latest pressed-key set
/// received from the GUI controls the player vehicle.
pub fn handle_race(
    sim_pars: &SimPars,
    seed: Option<u64>,
    autopilot: bool,
    tx: Option<&Sender<RaceState>>,
    rx_input: Option<&Receiver<InputState>>,
    realtime_factor: f64,
) -> anyhow::Result<RaceResult> {
    // create the race
    let mut race = Race::new(sim_pars, seed, autopilot);
    let mut platform = HeadlessPlatform::new();
    let mut input = InputState::default();
    let max_race_time_ms = sim_pars.race_pars.max_race_time * 1000.0;

    // simulate the race -> execute frames until the race reached a terminal phase
    match tx {
        None => {
            // NORMAL SIMULATION -------------------------------------------------------------------
            while !race.is_finished() && race.state.now < max_race_time_ms {
                race.simulate_frame(&input, &mut platform);
            }
        }
        Some(tx) => {
            // REAL-TIME SIMULATION ----------------------------------------------------------------
            let frame_duration_ms = 1000.0 / sim_pars.race_pars.frame_rate;
            let mut t_update_print = 0.0;
            let mut t_update_gui = f64::NEG_INFINITY;
            let mut calc_times = RingBuffer::new(sim_pars.race_pars.frame_rate.round() as usize);

            while !race.is_finished() && race.state.now < max_race_time_ms {
                let t_start = Instant::now();

                // use the latest pressed-key set sent by the GUI
                if let Some(latest) = rx_input.and_then(|rx| rx.try_iter().last()) {
                    input = latest;
                }

                // simulate frame
                race.simulate_frame(&input, &mut platform);

                // print status (with a maximum of 1 Hz)
                if race.state.now > t_update_print + 999.9 {
                    let player = race.state.player();
                    info!(
                        "Simulating... Current race time is {:.3}s, player is in lap {} with {:.0} HP",
                        race.get_race_time(),
                        player.lap,
                        player.health()
                    );

                    if let Some(avg) = calc_times.get_avg() {
                        debug!("Average frame calculation time: {:.3}ms", avg);
                    }
                    t_update_print = race.state.now;
                }

                // update GUI
                if race.state.now > t_update_gui + 1000.0 / MAX_GUI_UPDATE_FREQUENCY - 0.001 {
                    let race_state = create_race_state(&race, &mut platform)?;
                    tx.send(race_state)
                        .context("Failed to send race state to GUI!")?;
                    t_update_gui = race.state.now;
                }

                // sleep until the frame is finished in real-time as well
                let t_calc = t_start.elapsed().as_secs_f64() * 1000.0;
                calc_times.push(t_calc);
                let t_sleep = frame_duration_ms / realtime_factor - t_calc;

                if t_sleep > 0.0 {
                    sleep(Duration::from_secs_f64(t_sleep / 1000.0));
                } else {
                    warn!("Could not keep up with real-time!")
                }
            }

            // send the final state such that the GUI shows the outcome
            let race_state = create_race_state(&race, &mut platform)?;
            tx.send(race_state)
                .context("Failed to send final race state to GUI!")?;
        }
    }

    if !race.is_finished() {
        warn!(
            "Race aborted after the maximum race time of {:.0}s",
            sim_pars.race_pars.max_race_time
        );
    }

    debug!(
        "Race ended after {} frames with {} eliminations",
        race.state.frame,
        race.eliminations.len()
    );

    // return race result
    Ok(race.get_race_result())
}

/// create_race_state converts the current simulation state and the latest HUD values into the
/// snapshot that is sent to the GUI.
pub fn create_race_state(
    race: &Race,
    platform: &mut HeadlessPlatform,
) -> anyhow::Result<RaceState> {
    let state = &race.state;
    let mut vehicle_states = Vec::with_capacity(state.vehicles.len());

    for veh in state.vehicles.iter() {
        // convert hex color to a rgb color
        let tmp_color = veh
            .color
            .parse::<css_color_parser::Color>()
            .context(format!("Could not parse hex color {}!", veh.color))?;

        vehicle_states.push(VehicleState {
            id: veh.id,
            name: veh.name.to_owned(),
            color: RgbColor {
                r: tmp_color.r,
                g: tmp_color.g,
                b: tmp_color.b,
            },
            is_player: veh.is_player(),
            x: veh.position.x,
            z: veh.position.z,
            heading: veh.heading,
            speed: veh.speed,
            health_frac: veh.health_frac(),
            destroyed: veh.is_destroyed(),
            shielded: veh.is_shielded(state.now),
            boosting: veh.nitro.is_boosting(),
            lap: veh.lap,
            visible: veh.visible,
        });
    }

    let pickups_of = |kind: PickupKind| -> Vec<ObjectState> {
        state
            .pickups
            .iter()
            .filter(|pickup| pickup.kind == kind)
            .map(|pickup| object_state(&pickup.position, 1.0, pickup.visible))
            .collect()
    };

    Ok(RaceState {
        frame: state.frame,
        race_time: race.get_race_time(),
        phase: state.phase.to_owned(),
        vehicle_states,
        helicopters: state
            .helicopters
            .iter()
            .map(|heli| object_state(&heli.position, 3.0, heli.visible))
            .collect(),
        missiles: state
            .missiles
            .iter()
            .map(|missile| object_state(&missile.position, 0.5, missile.visible))
            .collect(),
        ghosts: state
            .ghosts
            .iter()
            .map(|ghost| object_state(&ghost.position, ghost.size as f64, ghost.visible))
            .collect(),
        health_pickups: pickups_of(PickupKind::Health),
        shield_pickups: pickups_of(PickupKind::Shield),
        effects: state
            .effects
            .list
            .iter()
            .filter(|effect| !matches!(effect.kind, EffectKind::FloatingText(_)))
            .map(|effect| {
                let size = match effect.kind {
                    EffectKind::Explosion => 6.0 * (1.0 - effect.progress()),
                    EffectKind::CollectBurst => 3.0 * (1.0 - effect.progress()),
                    _ => 0.5,
                };
                object_state(&effect.position, size, effect.visible)
            })
            .collect(),
        camera: [state.camera.position.x, state.camera.position.z],
        hud: platform.hud.to_owned(),
        overlay: platform.overlay.to_owned(),
        sounds: platform.take_sounds(),
    })
}

fn object_state(position: &Point3d, size: f64, visible: bool) -> ObjectState {
    ObjectState {
        x: position.x,
        y: position.y,
        z: position.z,
        size,
        visible,
    }
}
