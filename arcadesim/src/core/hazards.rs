use crate::core::track::Track;
use crate::core::vehicle::Vehicle;
use helpers::geometry::Point3d;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::PI;

/// * `max_ghosts` - Ghost population cap
/// * `ghost_respawn_delay` - (ms) Delay until a collected ghost is replaced
/// * `ghost_offset_spread` - Lateral ghost offset is drawn from [-spread/2, spread/2)
/// * `ghost_base_height` - Ghosts float at this height plus their size
/// * `max_pickups` - Pickup population cap
/// * `pickup_respawn_delay` - (ms) Delay until a collected pickup is replaced
/// * `pickup_offset_spread` - Lateral pickup offset is drawn from [-spread/2, spread/2)
/// * `pickup_height` - Base height of the pickups
/// * `pickup_hit_radius_sq` - Squared (horizontal) pickup radius
/// * `health_prob` - Probability that a spawned pickup is a health pickup
/// * `heal_range` - [min, max) of the health restored by a health pickup
/// * `shield_duration` - (ms) Duration of the shield granted by a shield pickup
/// * `float_amplitude` - Amplitude of the floating animation
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HazardPars {
    pub max_ghosts: usize,
    pub ghost_respawn_delay: f64,
    pub ghost_offset_spread: f64,
    pub ghost_base_height: f64,
    pub max_pickups: usize,
    pub pickup_respawn_delay: f64,
    pub pickup_offset_spread: f64,
    pub pickup_height: f64,
    pub pickup_hit_radius_sq: f64,
    pub health_prob: f64,
    pub heal_range: [u32; 2],
    pub shield_duration: f64,
    pub float_amplitude: f64,
}

impl Default for HazardPars {
    fn default() -> Self {
        HazardPars {
            max_ghosts: 6,
            ghost_respawn_delay: 5000.0,
            ghost_offset_spread: 15.0,
            ghost_base_height: 2.0,
            max_pickups: 15,
            pickup_respawn_delay: 8000.0,
            pickup_offset_spread: 25.0,
            pickup_height: 2.0,
            pickup_hit_radius_sq: 16.0,
            health_prob: 0.6,
            heal_range: [15, 35],
            shield_duration: 5000.0,
            float_amplitude: 0.5,
        }
    }
}

// GHOSTS ------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Ghost {
    pub id: u64,
    pub position: Point3d,
    pub size: u32,
    pub tier: u32,
    pub collected: bool,
    pub visible: bool,
    float_phase: f64,
    base_height: f64,
}

impl Ghost {
    pub fn damage(&self) -> f64 {
        ghost_damage(self.size, self.tier)
    }

    pub fn hit_radius_sq(&self) -> f64 {
        (3.0 + self.size as f64 * 1.5).powi(2)
    }

    /// animate lets visible ghosts float up and down.
    pub fn animate(&mut self, now: f64, amplitude: f64) {
        if self.visible {
            self.position.y = self.base_height
                + self.size as f64
                + (now * 0.002 + self.float_phase).sin() * amplitude;
        }
    }
}

/// ghost_damage returns the damage a ghost of the inserted size and scariness tier deals.
pub fn ghost_damage(size: u32, tier: u32) -> f64 {
    (5 + tier * 8 + size * 5) as f64
}

/// roll_ghost_class draws size (1 to 4) and tier (1 to 5) of a ghost. Small ghosts are the most
/// common, one in ten ghosts is a giant of maximum scariness.
pub fn roll_ghost_class<R: Rng>(rng: &mut R) -> (u32, u32) {
    let size_roll = rng.gen::<f64>();

    let (size, tier) = if size_roll < 0.5 {
        (1, 1 + rng.gen_range(0..2))
    } else if size_roll < 0.8 {
        (2, 2 + rng.gen_range(0..2))
    } else {
        (3, 3 + rng.gen_range(0..2))
    };

    if rng.gen::<f64>() < 0.1 {
        (4, 5)
    } else {
        (size, tier)
    }
}

pub fn spawn_ghost<R: Rng>(id: u64, track: &Track, hazard_pars: &HazardPars, rng: &mut R) -> Ghost {
    let idx = random_spawn_index(track, rng);
    let offset = (rng.gen::<f64>() - 0.5) * hazard_pars.ghost_offset_spread;
    let (size, tier) = roll_ghost_class(rng);

    Ghost {
        id,
        position: track.offset_position(idx, offset, hazard_pars.ghost_base_height + size as f64),
        size,
        tier,
        collected: false,
        visible: true,
        float_phase: rng.gen::<f64>() * 2.0 * PI,
        base_height: hazard_pars.ghost_base_height,
    }
}

// PICKUPS -----------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Health,
    Shield,
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: u64,
    pub position: Point3d,
    pub kind: PickupKind,
    pub collected: bool,
    pub visible: bool,
    float_phase: f64,
    base_height: f64,
}

impl Pickup {
    pub fn animate(&mut self, now: f64, amplitude: f64) {
        self.position.y = self.base_height + (now * 0.002 + self.float_phase).sin() * amplitude;
    }
}

pub fn spawn_pickup<R: Rng>(id: u64, track: &Track, hazard_pars: &HazardPars, rng: &mut R) -> Pickup {
    let idx = random_spawn_index(track, rng);
    let offset = (rng.gen::<f64>() - 0.5) * hazard_pars.pickup_offset_spread;
    let kind = if rng.gen::<f64>() < hazard_pars.health_prob {
        PickupKind::Health
    } else {
        PickupKind::Shield
    };

    Pickup {
        id,
        position: track.offset_position(idx, offset, hazard_pars.pickup_height),
        kind,
        collected: false,
        visible: true,
        float_phase: rng.gen::<f64>() * 2.0 * PI,
        base_height: hazard_pars.pickup_height,
    }
}

/// roll_heal_amount draws the health restored by a health pickup.
pub fn roll_heal_amount<R: Rng>(hazard_pars: &HazardPars, rng: &mut R) -> f64 {
    let [min, max] = hazard_pars.heal_range;
    rng.gen_range(min..max.max(min + 1)) as f64
}

// CONTACTS ----------------------------------------------------------------------------------------

/// find_contact returns the id of the vehicle touching the object at the inserted position (the
/// horizontal distance is decisive). The player is checked first, then the AI vehicles in
/// registry order, destroyed vehicles are ignored.
pub fn find_contact(position: &Point3d, radius_sq: f64, vehicles: &[Vehicle]) -> Option<usize> {
    let player = vehicles.iter().filter(|veh| veh.is_player());
    let ai = vehicles.iter().filter(|veh| !veh.is_player());

    player
        .chain(ai)
        .find(|veh| !veh.is_destroyed() && position.ground_dist_sq(&veh.position) < radius_sq)
        .map(|veh| veh.id)
}

// PENDING RESPAWNS --------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnKind {
    Ghost,
    Pickup,
}

#[derive(Debug, Clone, Copy)]
pub struct RespawnRequest {
    pub kind: RespawnKind,
    pub due: f64,
}

/// PendingRespawns is a deadline queue of scheduled respawns that is drained once per frame.
#[derive(Debug, Default)]
pub struct PendingRespawns {
    requests: Vec<RespawnRequest>,
}

impl PendingRespawns {
    pub fn schedule(&mut self, kind: RespawnKind, due: f64) {
        self.requests.push(RespawnRequest { kind, due });
    }

    /// take_due removes and returns all requests whose deadline is reached (in scheduling order).
    pub fn take_due(&mut self, now: f64) -> Vec<RespawnRequest> {
        let (due, pending): (Vec<RespawnRequest>, Vec<RespawnRequest>) =
            std::mem::take(&mut self.requests)
                .into_iter()
                .partition(|req| req.due <= now);
        self.requests = pending;
        due
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// random_spawn_index draws a track point outside the start/finish straight.
fn random_spawn_index<R: Rng>(track: &Track, rng: &mut R) -> usize {
    let candidates: Vec<usize> = (0..track.no_points())
        .filter(|idx| !track.is_start_section(*idx))
        .collect();

    candidates
        .choose(rng)
        .copied()
        .unwrap_or(track.no_points() - 1)
}
