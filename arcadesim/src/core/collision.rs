use crate::core::damage::DamageSource;
use crate::core::track::Track;
use crate::core::vehicle::Vehicle;
use helpers::geometry::{Point3d, Vector2d};
use serde::Deserialize;
use std::collections::HashSet;

/// * `vehicle_radius` - Radius of the circular vehicle footprint
/// * `push_factor` - Fraction of the overlap each vehicle is pushed away
/// * `contact_speed_factor` - Speed factor applied to both vehicles on contact
/// * `damage_speed_threshold` - Speed (magnitude) above which contacts and barrier hits damage
/// * `base_damage` - Base damage of a vehicle-vehicle contact
/// * `rammer_mult` - Damage multiplier of the rammer in a rear-end contact
/// * `victim_mult` - Damage multiplier of the victim in a rear-end contact
/// * `side_mult` - Damage multiplier of both vehicles in a side contact
/// * `rammer_alignment` - Minimum alignment of the rammer's forward vector with the contact
/// direction
/// * `victim_alignment` - Minimum alignment of the victim's forward vector with the contact
/// direction
/// * `barrier_overcorrection` - Factor applied to the barrier penetration when pushing back
/// * `barrier_speed_factor` - Speed factor applied on a barrier hit
/// * `barrier_damage` - Damage of a barrier hit
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollisionPars {
    pub vehicle_radius: f64,
    pub push_factor: f64,
    pub contact_speed_factor: f64,
    pub damage_speed_threshold: f64,
    pub base_damage: f64,
    pub rammer_mult: f64,
    pub victim_mult: f64,
    pub side_mult: f64,
    pub rammer_alignment: f64,
    pub victim_alignment: f64,
    pub barrier_overcorrection: f64,
    pub barrier_speed_factor: f64,
    pub barrier_damage: f64,
}

impl Default for CollisionPars {
    fn default() -> Self {
        CollisionPars {
            vehicle_radius: 2.5,
            push_factor: 0.5,
            contact_speed_factor: 0.8,
            damage_speed_threshold: 20.0,
            base_damage: 2.0,
            rammer_mult: 10.0,
            victim_mult: 1.0,
            side_mult: 2.5,
            rammer_alignment: 0.5,
            victim_alignment: 0.3,
            barrier_overcorrection: 1.2,
            barrier_speed_factor: 0.6,
            barrier_damage: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub vehicle_id: usize,
    pub amount: f64,
    pub source: DamageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactClass {
    /// the moving vehicle drove into the back of the other one
    MoverRammed,
    /// the other vehicle drove into the back of the moving one
    OtherRammed,
    Side,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub mover: usize,
    pub other: usize,
    pub class: Option<ContactClass>,
    pub damage: Vec<DamageRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarrierHit {
    pub penetration: f64,
    pub damage: Option<DamageRequest>,
}

/// classify_contact determines who rammed whom. A vehicle is the rammer if its forward vector
/// points towards the other vehicle and the other vehicle faces away from it (i.e. it drove into
/// the other's back). None is returned for coincident positions.
pub fn classify_contact(
    mover_pos: &Point3d,
    mover_fwd: &Vector2d,
    other_pos: &Point3d,
    other_fwd: &Vector2d,
    collision_pars: &CollisionPars,
) -> Option<ContactClass> {
    let to_other = mover_pos.ground().vector_to(&other_pos.ground()).normalized()?;
    let to_mover = to_other.mult(-1.0);

    if mover_fwd.dot(&to_other) > collision_pars.rammer_alignment
        && other_fwd.dot(&to_other) > collision_pars.victim_alignment
    {
        Some(ContactClass::MoverRammed)
    } else if other_fwd.dot(&to_mover) > collision_pars.rammer_alignment
        && mover_fwd.dot(&to_mover) > collision_pars.victim_alignment
    {
        Some(ContactClass::OtherRammed)
    } else {
        Some(ContactClass::Side)
    }
}

/// resolve_vehicle_contacts checks the moved vehicle against all other non-destroyed vehicles.
/// Overlapping vehicles are pushed apart (the player is never pushed by another vehicle's move),
/// both are slowed down, and damage is requested according to the contact class if either of them
/// is fast. Every pair is resolved at most once per frame, which is tracked in handled_pairs.
pub fn resolve_vehicle_contacts(
    vehicles: &mut [Vehicle],
    mover: usize,
    handled_pairs: &mut HashSet<(usize, usize)>,
    collision_pars: &CollisionPars,
) -> Vec<Contact> {
    let mut contacts = vec![];

    if vehicles[mover].is_destroyed() {
        return contacts;
    }

    let min_dist = 2.0 * collision_pars.vehicle_radius;

    for other in 0..vehicles.len() {
        if other == mover || vehicles[other].is_destroyed() {
            continue;
        }

        let pair = (mover.min(other), mover.max(other));

        if handled_pairs.contains(&pair) {
            continue;
        }

        let (veh_m, veh_o) = pair_mut(vehicles, mover, other);

        // vector pointing from the other vehicle to the moved one
        let sep = veh_o.position.ground().vector_to(&veh_m.position.ground());
        let dist_sq = sep.abs_sq();

        if dist_sq >= min_dist.powi(2) || dist_sq <= 0.0 {
            continue;
        }

        handled_pairs.insert(pair);

        let dist = dist_sq.sqrt();
        let push = sep.mult((min_dist - dist) * collision_pars.push_factor / dist);
        veh_m.position = veh_m.position.shift(&push.as_vector3d());

        if !veh_o.is_player() {
            veh_o.position = veh_o.position.shift(&push.mult(-1.0).as_vector3d());
        }

        veh_m.speed *= collision_pars.contact_speed_factor;
        veh_o.speed *= collision_pars.contact_speed_factor;

        let fast = veh_m.speed.abs() > collision_pars.damage_speed_threshold
            || veh_o.speed.abs() > collision_pars.damage_speed_threshold;

        let class = if fast {
            classify_contact(
                &veh_m.position,
                &veh_m.forward(),
                &veh_o.position,
                &veh_o.forward(),
                collision_pars,
            )
        } else {
            None
        };

        let (mult_m, mult_o) = match class {
            Some(ContactClass::MoverRammed) => {
                (collision_pars.rammer_mult, collision_pars.victim_mult)
            }
            Some(ContactClass::OtherRammed) => {
                (collision_pars.victim_mult, collision_pars.rammer_mult)
            }
            Some(ContactClass::Side) => (collision_pars.side_mult, collision_pars.side_mult),
            None => (0.0, 0.0),
        };

        let damage = if class.is_some() {
            vec![
                DamageRequest {
                    vehicle_id: mover,
                    amount: collision_pars.base_damage * mult_m,
                    source: DamageSource::Collision,
                },
                DamageRequest {
                    vehicle_id: other,
                    amount: collision_pars.base_damage * mult_o,
                    source: DamageSource::Collision,
                },
            ]
        } else {
            vec![]
        };

        contacts.push(Contact {
            mover,
            other,
            class,
            damage,
        })
    }

    contacts
}

/// resolve_barrier pushes a vehicle that left the road back inside (with overcorrection) and
/// slows it down. Damage is requested if the vehicle is still fast after the bounce.
pub fn resolve_barrier(
    vehicle: &mut Vehicle,
    track: &Track,
    collision_pars: &CollisionPars,
) -> Option<BarrierHit> {
    if vehicle.is_destroyed() {
        return None;
    }

    let frame = track.lateral_frame(&vehicle.position)?;

    if frame.offset.abs() <= track.half_road_width {
        return None;
    }

    let penetration = frame.offset.abs() - track.half_road_width;
    let correction = frame
        .perp
        .mult(-frame.offset.signum() * penetration * collision_pars.barrier_overcorrection);

    vehicle.position = vehicle.position.shift(&correction.as_vector3d());
    vehicle.speed *= collision_pars.barrier_speed_factor;

    let damage = if vehicle.speed.abs() > collision_pars.damage_speed_threshold {
        Some(DamageRequest {
            vehicle_id: vehicle.id,
            amount: collision_pars.barrier_damage,
            source: DamageSource::Barrier,
        })
    } else {
        None
    };

    Some(BarrierHit {
        penetration,
        damage,
    })
}

/// pair_mut returns mutable references to two distinct vehicles.
fn pair_mut(vehicles: &mut [Vehicle], a: usize, b: usize) -> (&mut Vehicle, &mut Vehicle) {
    if a < b {
        let (head, tail) = vehicles.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = vehicles.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}
