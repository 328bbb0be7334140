use crate::core::track::Track;
use crate::core::vehicle::{Vehicle, VehicleKind, VehiclePars};
use helpers::general::wrap_angle;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
}

/// InputState is the set of currently pressed keys. It is level-triggered, i.e. a key acts in
/// every frame for as long as it is contained in the set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pressed: HashSet<Key>,
}

impl InputState {
    pub fn from_keys(keys: &[Key]) -> InputState {
        InputState {
            pressed: keys.iter().copied().collect(),
        }
    }

    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.remove(&key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn throttle(&self) -> bool {
        self.is_pressed(Key::W) || self.is_pressed(Key::ArrowUp)
    }

    pub fn brake(&self) -> bool {
        self.is_pressed(Key::S) || self.is_pressed(Key::ArrowDown)
    }

    pub fn left(&self) -> bool {
        self.is_pressed(Key::A) || self.is_pressed(Key::ArrowLeft)
    }

    pub fn right(&self) -> bool {
        self.is_pressed(Key::D) || self.is_pressed(Key::ArrowRight)
    }

    pub fn nitro(&self) -> bool {
        self.is_pressed(Key::Space)
    }
}

/// ControllerEvents reports what happened during a controller update that the caller has to react
/// to (sounds, effects).
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerEvents {
    pub nitro_started: bool,
    pub nitro_ended: bool,
}

/// update_player advances the player vehicle by one frame based on the pressed keys. Collision
/// handling is left to the caller.
pub fn update_player(
    vehicle: &mut Vehicle,
    input: &InputState,
    vehicle_pars: &VehiclePars,
    now: f64,
) -> ControllerEvents {
    let mut events = ControllerEvents::default();

    if vehicle.is_destroyed() {
        return events;
    }

    // longitudinal
    if input.throttle() {
        vehicle.speed = (vehicle.speed + vehicle_pars.acceleration).min(vehicle_pars.max_speed);
    } else if input.brake() {
        vehicle.speed = (vehicle.speed - 2.0 * vehicle_pars.acceleration)
            .max(-vehicle_pars.max_reverse_speed);
    } else if vehicle.speed > 0.0 {
        vehicle.speed = (vehicle.speed - vehicle_pars.deceleration).max(0.0);
    } else if vehicle.speed < 0.0 {
        vehicle.speed = (vehicle.speed + vehicle_pars.deceleration).min(0.0);
    }

    // nitro
    events.nitro_ended = vehicle.nitro.update(now);

    if input.nitro() {
        events.nitro_started = vehicle.nitro.try_activate(now);
    }

    if vehicle.nitro.is_boosting() {
        vehicle.speed = vehicle.nitro.boost_speed;
    }

    // steering (slow turning at low speed)
    let turn_amount = vehicle_pars.turn_speed * vehicle.speed.abs() / 100.0;

    if input.left() {
        vehicle.heading += turn_amount;
    }
    if input.right() {
        vehicle.heading -= turn_amount;
    }

    drive(vehicle, vehicle_pars.speed_to_distance);
    events
}

/// update_ai advances an AI vehicle by one frame: it steers towards its waypoint, adapts its speed
/// to the heading error, and randomly uses its nitro on straights. Collision handling is left to
/// the caller.
pub fn update_ai<R: Rng>(
    vehicle: &mut Vehicle,
    track: &Track,
    vehicle_pars: &VehiclePars,
    now: f64,
    rng: &mut R,
) -> ControllerEvents {
    let mut events = ControllerEvents::default();

    if vehicle.is_destroyed() {
        return events;
    }

    let position = vehicle.position;
    let heading = vehicle.heading;

    let (angle_diff, skill_level, max_velocity) = match &mut vehicle.kind {
        VehicleKind::Ai(driver) => {
            let angle_diff = steer_towards_waypoint(
                &mut driver.target_point,
                &position,
                heading,
                track,
                vehicle_pars.ai_capture_radius,
            );
            (angle_diff, driver.skill_level, driver.max_velocity)
        }
        VehicleKind::Player => return events,
    };

    vehicle.heading += angle_diff * vehicle_pars.ai_turn_gain * skill_level;

    // nitro
    let nitro_pars = &vehicle_pars.nitro_pars;
    events.nitro_ended = vehicle.nitro.update(now);

    if vehicle.nitro.is_ready()
        && angle_diff.abs() < nitro_pars.ai_straight_threshold
        && rng.gen::<f64>() < nitro_pars.ai_activation_prob
    {
        events.nitro_started = vehicle.nitro.try_activate(now);
    }

    // speed
    if vehicle.nitro.is_boosting() {
        vehicle.speed = vehicle.nitro.boost_speed;
    } else {
        let speed_factor = 1.0 - angle_diff.abs() * vehicle_pars.ai_curve_slowdown;
        vehicle.speed =
            (vehicle.speed + vehicle_pars.ai_acceleration).min(max_velocity * speed_factor);
    }

    drive(vehicle, vehicle_pars.speed_to_distance);
    events
}

/// autopilot_input converts the AI steering law into pressed keys, such that the player vehicle
/// can be driven without a human.
pub fn autopilot_input(
    vehicle: &Vehicle,
    target_point: &mut usize,
    track: &Track,
    vehicle_pars: &VehiclePars,
) -> InputState {
    let mut input = InputState::default();

    let angle_diff = steer_towards_waypoint(
        target_point,
        &vehicle.position,
        vehicle.heading,
        track,
        vehicle_pars.ai_capture_radius,
    );

    // steer only if the correction exceeds half a turn step to avoid oscillating
    let turn_amount = vehicle_pars.turn_speed * vehicle.speed.abs() / 100.0;

    if angle_diff > 0.5 * turn_amount {
        input.press(Key::A);
    } else if angle_diff < -0.5 * turn_amount {
        input.press(Key::D);
    }

    if angle_diff.abs() < 0.6 || vehicle.speed < 0.4 * vehicle_pars.max_speed {
        input.press(Key::W);
    }

    if angle_diff.abs() < vehicle_pars.nitro_pars.ai_straight_threshold && vehicle.nitro.is_ready()
    {
        input.press(Key::Space);
    }

    input
}

/// steer_towards_waypoint returns the heading error towards the current waypoint. The waypoint is
/// advanced once the vehicle is within the capture radius, the heading error still refers to the
/// waypoint that was reached.
fn steer_towards_waypoint(
    target_point: &mut usize,
    position: &helpers::geometry::Point3d,
    heading: f64,
    track: &Track,
    capture_radius: f64,
) -> f64 {
    let to_target = position.ground().vector_to(&track.point_at(*target_point).ground());

    if to_target.abs() < capture_radius {
        *target_point = (*target_point + 1) % track.no_points();
    }

    wrap_angle(to_target.heading() - heading)
}

/// drive moves the vehicle along its heading. The height is pinned to the road surface.
fn drive(vehicle: &mut Vehicle, speed_to_distance: f64) {
    let step = vehicle.forward().mult(vehicle.speed * speed_to_distance);
    let height = vehicle.position.y;
    vehicle.position = vehicle.position.ground().shift(&step).as_point3d(height);
}
