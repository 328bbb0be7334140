use crate::core::vehicle::Vehicle;
use helpers::geometry::{Point3d, Vector3d};
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::PI;

/// * `no_helicopters` - Number of helicopters
/// * `spawn_radius` - Radius of the circle the helicopters are spawned on
/// * `spawn_height` - Height of the first helicopter (the others are stacked above)
/// * `spawn_height_step` - Height difference between two helicopters at spawn
/// * `chase_offset_spread` - Horizontal chase offset is drawn from [-spread/2, spread/2)
/// * `chase_height_range` - [min, max] of the randomized chase height above the target
/// * `approach_step` - Step size numerator, the helicopter moves approach_step / distance of the
/// remaining distance per frame
/// * `arrival_dist_sq` - Squared distance below which the helicopter stops approaching
/// * `fire_cooldown_range` - (ms) [min, max] of the randomized firing cooldown
/// * `fire_range_sq` - Squared horizontal distance to the chase position below which the
/// helicopter fires
/// * `relinquish_prob` - Probability to drop the current target after firing
/// * `launch_drop` - Missiles are launched this far below the helicopter
/// * `hover_amplitude` - Height change per frame of the hover motion
/// * `hover_frequency` - (1/ms) Angular frequency of the hover motion
/// * `missile_speed` - Speed the missile velocity is steered towards
/// * `homing_blend` - Fraction of the velocity error corrected per frame
/// * `missile_max_lifetime` - (frames) Lifetime after which a missile self-destructs
/// * `missile_aim_height` - Missiles aim this far above the target position
/// * `missile_hit_radius_sq` - Squared hit radius of a missile
/// * `missile_damage` - Damage of a missile hit
/// * `ground_explosion_height` - Expiring missiles below this height explode
/// * `trail_interval` - (frames) A smoke puff is emitted every n-th frame
/// * `trail_max_puffs` - Maximum number of smoke puffs of a missile
/// * `trail_puff_lifetime` - (frames) Lifetime of a smoke puff
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AerialPars {
    pub no_helicopters: usize,
    pub spawn_radius: f64,
    pub spawn_height: f64,
    pub spawn_height_step: f64,
    pub chase_offset_spread: f64,
    pub chase_height_range: [f64; 2],
    pub approach_step: f64,
    pub arrival_dist_sq: f64,
    pub fire_cooldown_range: [f64; 2],
    pub fire_range_sq: f64,
    pub relinquish_prob: f64,
    pub launch_drop: f64,
    pub hover_amplitude: f64,
    pub hover_frequency: f64,
    pub missile_speed: f64,
    pub homing_blend: f64,
    pub missile_max_lifetime: u32,
    pub missile_aim_height: f64,
    pub missile_hit_radius_sq: f64,
    pub missile_damage: f64,
    pub ground_explosion_height: f64,
    pub trail_interval: u32,
    pub trail_max_puffs: usize,
    pub trail_puff_lifetime: u32,
}

impl Default for AerialPars {
    fn default() -> Self {
        AerialPars {
            no_helicopters: 2,
            spawn_radius: 150.0,
            spawn_height: 40.0,
            spawn_height_step: 10.0,
            chase_offset_spread: 10.0,
            chase_height_range: [25.0, 35.0],
            approach_step: 1.8,
            arrival_dist_sq: 25.0,
            fire_cooldown_range: [3000.0, 5000.0],
            fire_range_sq: 10000.0,
            relinquish_prob: 0.3,
            launch_drop: 2.0,
            hover_amplitude: 0.02,
            hover_frequency: 0.002,
            missile_speed: 2.0,
            homing_blend: 0.05,
            missile_max_lifetime: 300,
            missile_aim_height: 1.0,
            missile_hit_radius_sq: 16.0,
            missile_damage: 35.0,
            ground_explosion_height: 2.0,
            trail_interval: 6,
            trail_max_puffs: 10,
            trail_puff_lifetime: 20,
        }
    }
}

// HELICOPTER --------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelicopterState {
    SeekingTarget,
    Pursuing { target: usize },
}

#[derive(Debug, Clone)]
pub struct Helicopter {
    pub idx: usize,
    pub position: Point3d,
    pub target: Option<usize>,
    pub chase_offset: Vector3d,
    pub fire_cooldown: f64,
    pub last_fire: f64,
    pub visible: bool,
}

impl Helicopter {
    pub fn state(&self) -> HelicopterState {
        match self.target {
            Some(target) => HelicopterState::Pursuing { target },
            None => HelicopterState::SeekingTarget,
        }
    }
}

/// spawn_helicopters places the helicopters evenly on a circle (in thirds of a turn) with
/// increasing height and randomized chase offsets and firing cooldowns.
pub fn spawn_helicopters<R: Rng>(aerial_pars: &AerialPars, rng: &mut R) -> Vec<Helicopter> {
    (0..aerial_pars.no_helicopters)
        .map(|i| {
            let angle = i as f64 / 3.0 * 2.0 * PI;
            let spread = aerial_pars.chase_offset_spread;
            let [h_min, h_max] = aerial_pars.chase_height_range;
            let [cd_min, cd_max] = aerial_pars.fire_cooldown_range;

            Helicopter {
                idx: i,
                position: Point3d {
                    x: angle.cos() * aerial_pars.spawn_radius,
                    y: aerial_pars.spawn_height + i as f64 * aerial_pars.spawn_height_step,
                    z: angle.sin() * aerial_pars.spawn_radius,
                },
                target: None,
                chase_offset: Vector3d {
                    dx: (rng.gen::<f64>() - 0.5) * spread,
                    dy: h_min + rng.gen::<f64>() * (h_max - h_min),
                    dz: (rng.gen::<f64>() - 0.5) * spread,
                },
                fire_cooldown: cd_min + rng.gen::<f64>() * (cd_max - cd_min),
                last_fire: 0.0,
                visible: true,
            }
        })
        .collect()
}

/// select_target picks a live vehicle for the helicopter. The index rotation makes different
/// helicopters tend to chase different vehicles. None is returned if all vehicles are destroyed.
pub fn select_target<R: Rng>(heli_idx: usize, vehicles: &[Vehicle], rng: &mut R) -> Option<usize> {
    let alive: Vec<usize> = vehicles
        .iter()
        .filter(|veh| !veh.is_destroyed())
        .map(|veh| veh.id)
        .collect();

    if alive.is_empty() {
        return None;
    }

    Some(alive[(heli_idx + rng.gen_range(0..2)) % alive.len()])
}

/// MissileLaunch is returned when a helicopter fires.
#[derive(Debug, Clone, Copy)]
pub struct MissileLaunch {
    pub heli_idx: usize,
    pub position: Point3d,
    pub target: usize,
}

/// update_helicopters moves every helicopter towards its target's chase position and fires a
/// missile if its cooldown elapsed and the target is in range.
pub fn update_helicopters<R: Rng>(
    helicopters: &mut [Helicopter],
    vehicles: &[Vehicle],
    aerial_pars: &AerialPars,
    now: f64,
    rng: &mut R,
) -> Vec<MissileLaunch> {
    let mut launches = vec![];

    for heli in helicopters.iter_mut() {
        // (re-)select the target if it is missing or was destroyed
        let target_alive = heli
            .target
            .and_then(|target| vehicles.get(target))
            .map_or(false, |veh| !veh.is_destroyed());

        if !target_alive {
            heli.target = select_target(heli.idx, vehicles, rng);
        }

        let target = match heli.target {
            Some(target) => target,
            None => continue,
        };

        let chase_pos = vehicles[target].position.shift(&heli.chase_offset);
        let delta = heli.position.vector_to(&chase_pos);
        let dist_sq = delta.abs_sq();

        if dist_sq > aerial_pars.arrival_dist_sq {
            let step = aerial_pars.approach_step / dist_sq.sqrt();
            heli.position = heli.position.shift(&delta.mult(step));
        }

        if now - heli.last_fire > heli.fire_cooldown
            && delta.ground().abs_sq() < aerial_pars.fire_range_sq
        {
            launches.push(MissileLaunch {
                heli_idx: heli.idx,
                position: heli.position.shift(&Vector3d {
                    dx: 0.0,
                    dy: -aerial_pars.launch_drop,
                    dz: 0.0,
                }),
                target,
            });

            let [cd_min, cd_max] = aerial_pars.fire_cooldown_range;
            heli.last_fire = now;
            heli.fire_cooldown = cd_min + rng.gen::<f64>() * (cd_max - cd_min);

            if rng.gen::<f64>() < aerial_pars.relinquish_prob {
                heli.target = None;
            }
        }

        // hover motion is purely visual
        if heli.visible {
            heli.position.y += (now * aerial_pars.hover_frequency + heli.idx as f64).sin()
                * aerial_pars.hover_amplitude;
        }
    }

    launches
}

// MISSILE -----------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SmokePuff {
    pub position: Point3d,
    pub age: u32,
}

#[derive(Debug, Clone)]
pub struct Missile {
    pub id: u64,
    pub position: Point3d,
    pub velocity: Vector3d,
    pub target: usize,
    pub lifetime: u32,
    pub trail: Vec<SmokePuff>,
    pub visible: bool,
}

impl Missile {
    pub fn new(id: u64, launch: &MissileLaunch, aerial_pars: &AerialPars) -> Missile {
        Missile {
            id,
            position: launch.position,
            velocity: Vector3d {
                dx: 0.0,
                dy: -aerial_pars.missile_speed,
                dz: 0.0,
            },
            target: launch.target,
            lifetime: 0,
            trail: vec![],
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissileFate {
    Flying,
    Hit { vehicle_id: usize },
    /// expired by lifetime or ground contact, explodes only if close to the ground
    Expired { explode: bool },
}

/// update_missile advances a missile by one frame: homing towards its live target, moving, aging
/// the smoke trail, and checking for hits (player vehicle first) and expiry.
pub fn update_missile(
    missile: &mut Missile,
    vehicles: &[Vehicle],
    aerial_pars: &AerialPars,
) -> MissileFate {
    missile.lifetime += 1;

    // homing (lagging proportional correction)
    if let Some(target) = vehicles.get(missile.target) {
        if !target.is_destroyed() {
            let aim = target.position.shift(&Vector3d {
                dx: 0.0,
                dy: aerial_pars.missile_aim_height,
                dz: 0.0,
            });
            let delta = missile.position.vector_to(&aim);
            let dist = delta.abs();

            if dist > 0.1 {
                let desired = delta.mult(aerial_pars.missile_speed / dist);
                missile.velocity = missile
                    .velocity
                    .add(&desired.sub(&missile.velocity).mult(aerial_pars.homing_blend));
            }
        }
    }

    missile.position = missile.position.shift(&missile.velocity);

    // smoke trail is only emitted while visible but always ages
    if missile.visible
        && missile.lifetime % aerial_pars.trail_interval.max(1) == 0
        && missile.trail.len() < aerial_pars.trail_max_puffs
    {
        missile.trail.push(SmokePuff {
            position: missile.position,
            age: 0,
        });
    }

    for puff in missile.trail.iter_mut() {
        puff.age += 1;
    }
    missile
        .trail
        .retain(|puff| puff.age <= aerial_pars.trail_puff_lifetime);

    // hits (player is checked first)
    let mut order: Vec<&Vehicle> = vehicles.iter().filter(|veh| veh.is_player()).collect();
    order.extend(vehicles.iter().filter(|veh| !veh.is_player()));

    for veh in order {
        if !veh.is_destroyed()
            && missile.position.dist_sq(&veh.position) < aerial_pars.missile_hit_radius_sq
        {
            return MissileFate::Hit { vehicle_id: veh.id };
        }
    }

    if missile.lifetime > aerial_pars.missile_max_lifetime || missile.position.y < 0.0 {
        return MissileFate::Expired {
            explode: missile.position.y < aerial_pars.ground_explosion_height,
        };
    }

    MissileFate::Flying
}
