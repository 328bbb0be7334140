use crate::core::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageSource {
    Ghost,
    Helicopter,
    Collision,
    Barrier,
}

impl DamageSource {
    /// title returns the headline shown when the player was destroyed by this source.
    pub fn title(&self) -> &'static str {
        match self {
            DamageSource::Ghost => "HAUNTED",
            DamageSource::Helicopter => "WASTED",
            DamageSource::Collision => "CRASHED",
            DamageSource::Barrier => "TOTALED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DamageSource::Ghost => "The ghosts of the track claimed your car",
            DamageSource::Helicopter => "Shot down by a helicopter missile",
            DamageSource::Collision => "Wrecked in a collision with another racer",
            DamageSource::Barrier => "Smashed against the barriers one time too often",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    AlreadyDestroyed,
    Invincible,
    Shielded,
    Damaged { amount: f64 },
    Destroyed,
}

impl DamageOutcome {
    pub fn changed_health(&self) -> bool {
        matches!(
            self,
            DamageOutcome::Damaged { .. } | DamageOutcome::Destroyed
        )
    }
}

/// DamageContext contains the race-wide information needed to decide whether damage applies.
///
/// * `now` - (ms) Current simulation time
/// * `race_start` - (ms) Point in time the race started (None while counting down)
/// * `invincibility` - (ms) Duration of the damage-free period after the race start
#[derive(Debug, Clone, Copy)]
pub struct DamageContext {
    pub now: f64,
    pub race_start: Option<f64>,
    pub invincibility: f64,
}

impl DamageContext {
    pub fn is_invincible(&self) -> bool {
        match self.race_start {
            Some(race_start) => self.now - race_start < self.invincibility,
            None => true,
        }
    }

    /// invincibility_left returns the remaining damage-free time in ms (None once it is over).
    pub fn invincibility_left(&self) -> Option<f64> {
        let race_start = self.race_start?;
        let left = race_start + self.invincibility - self.now;

        if left > 0.0 {
            Some(left)
        } else {
            None
        }
    }
}

/// apply_damage is the single entry point for damaging a vehicle. Destroyed vehicles and the
/// invincibility window turn it into a no-op, an active shield absorbs the damage completely.
/// Otherwise the health is reduced (clamped at zero) and the vehicle is destroyed when zero is
/// reached.
pub fn apply_damage(vehicle: &mut Vehicle, amount: f64, ctx: &DamageContext) -> DamageOutcome {
    if vehicle.is_destroyed() {
        return DamageOutcome::AlreadyDestroyed;
    }

    if ctx.is_invincible() {
        return DamageOutcome::Invincible;
    }

    if vehicle.is_shielded(ctx.now) {
        return DamageOutcome::Shielded;
    }

    if vehicle.reduce_health(amount) {
        DamageOutcome::Destroyed
    } else {
        DamageOutcome::Damaged { amount }
    }
}
