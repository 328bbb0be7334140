use crate::core::nitro::{Nitro, NitroPars};
use helpers::geometry::{Point3d, Vector2d};
use serde::Deserialize;

/// * `name` - Display name of the vehicle
/// * `color` - Hex-code of the vehicle color (used for plotting)
#[derive(Debug, Deserialize, Clone)]
pub struct Livery {
    pub name: String,
    pub color: String,
}

/// * `no_ai_vehicles` - Number of AI opponents
/// * `player` - Livery of the player vehicle
/// * `ai_liveries` - Liveries of the AI vehicles (used cyclically if there are more AI vehicles
/// than liveries)
/// * `max_health` - Health at the race start
/// * `max_speed` - Maximum forward speed of the player vehicle (without nitro)
/// * `max_reverse_speed` - Maximum reverse speed of the player vehicle (positive value)
/// * `acceleration` - Speed increase per frame while accelerating (braking is twice as strong)
/// * `deceleration` - Speed decay per frame towards zero without input
/// * `turn_speed` - (rad/frame) Turn rate at a speed of 100
/// * `speed_to_distance` - Distance per frame and unit of speed
/// * `ai_max_velocity_range` - [min, max] of the randomized AI maximum velocity
/// * `ai_skill_range` - [min, max] of the randomized AI skill level
/// * `ai_acceleration` - Speed increase per frame of the AI vehicles
/// * `ai_capture_radius` - Distance below which an AI vehicle advances to the next waypoint
/// * `ai_turn_gain` - Heading error fraction corrected per frame (scaled by the skill level)
/// * `ai_curve_slowdown` - Relative speed reduction per radian of heading error
/// * `grid_row_spacing` - Distance between two grid rows
/// * `grid_side_spacing` - Lateral distance of a grid slot from the centerline
/// * `nitro_pars` - Nitro parameters
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VehiclePars {
    pub no_ai_vehicles: usize,
    pub player: Livery,
    pub ai_liveries: Vec<Livery>,
    pub max_health: f64,
    pub max_speed: f64,
    pub max_reverse_speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    pub turn_speed: f64,
    pub speed_to_distance: f64,
    pub ai_max_velocity_range: [f64; 2],
    pub ai_skill_range: [f64; 2],
    pub ai_acceleration: f64,
    pub ai_capture_radius: f64,
    pub ai_turn_gain: f64,
    pub ai_curve_slowdown: f64,
    pub grid_row_spacing: f64,
    pub grid_side_spacing: f64,
    pub nitro_pars: NitroPars,
}

impl Default for VehiclePars {
    fn default() -> Self {
        let ai_liveries = [
            ("VIPER", "#ff4400"),
            ("SHADOW", "#ffff00"),
            ("NITRO", "#ff0066"),
            ("BLAZE", "#00ff00"),
            ("THUNDER", "#9900ff"),
            ("GHOST", "#ff0000"),
            ("PHOENIX", "#ffffff"),
            ("STORM", "#ff4400"),
            ("DEMON", "#ffff00"),
        ]
        .iter()
        .map(|(name, color)| Livery {
            name: name.to_string(),
            color: color.to_string(),
        })
        .collect();

        VehiclePars {
            no_ai_vehicles: 7,
            player: Livery {
                name: String::from("PLAYER"),
                color: String::from("#00aaff"),
            },
            ai_liveries,
            max_health: 100.0,
            max_speed: 100.0,
            max_reverse_speed: 50.0,
            acceleration: 0.5,
            deceleration: 0.3,
            turn_speed: 0.03,
            speed_to_distance: 0.01,
            ai_max_velocity_range: [80.0, 100.0],
            ai_skill_range: [0.7, 1.0],
            ai_acceleration: 0.3,
            ai_capture_radius: 20.0,
            ai_turn_gain: 0.05,
            ai_curve_slowdown: 0.3,
            grid_row_spacing: 8.0,
            grid_side_spacing: 4.0,
            nitro_pars: NitroPars::default(),
        }
    }
}

/// AiDriver contains the state that only AI vehicles own.
///
/// * `target_point` - Index of the waypoint the vehicle is steering towards
/// * `skill_level` - Scales the turn responsiveness, in [0.7, 1.0] by default
/// * `max_velocity` - Speed cap of the vehicle
#[derive(Debug, Clone)]
pub struct AiDriver {
    pub target_point: usize,
    pub skill_level: f64,
    pub max_velocity: f64,
}

#[derive(Debug, Clone)]
pub enum VehicleKind {
    Player,
    Ai(AiDriver),
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: usize,
    pub name: String,
    pub color: String,
    pub kind: VehicleKind,
    pub position: Point3d,
    pub heading: f64,
    pub speed: f64,
    health: f64,
    max_health: f64,
    destroyed: bool,
    /// Current lap. Vehicles on or ahead of the start line start in lap 1, grid slots behind it
    /// start in lap 0 so that their first crossing of the line does not count as a finished lap.
    pub lap: u32,
    pub track_progress: usize,
    shield_until: Option<f64>,
    pub nitro: Nitro,
    pub visible: bool,
}

impl Vehicle {
    pub fn new(
        id: usize,
        livery: &Livery,
        kind: VehicleKind,
        position: Point3d,
        heading: f64,
        max_health: f64,
        nitro: Nitro,
    ) -> Vehicle {
        Vehicle {
            id,
            name: livery.name.to_owned(),
            color: livery.color.to_owned(),
            kind,
            position,
            heading,
            speed: 0.0,
            health: max_health,
            max_health,
            destroyed: false,
            lap: 1,
            track_progress: 0,
            shield_until: None,
            nitro,
            visible: true,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, VehicleKind::Player)
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    pub fn health_frac(&self) -> f64 {
        self.health / self.max_health
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// forward returns the unit vector of the driving direction on the ground plane.
    pub fn forward(&self) -> Vector2d {
        Vector2d::from_heading(self.heading)
    }

    /// The method reduces the health (clamped at zero) and destroys the vehicle when zero is
    /// reached. It returns true if the vehicle was destroyed by this call.
    pub fn reduce_health(&mut self, amount: f64) -> bool {
        if self.destroyed {
            return false;
        }

        self.health = (self.health - amount).max(0.0);

        if self.health <= 0.0 {
            self.destroy()
        } else {
            false
        }
    }

    /// The method marks the vehicle as destroyed. Destroying a destroyed vehicle is a no-op, in
    /// which case false is returned.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }

        self.destroyed = true;
        self.health = 0.0;
        self.speed = 0.0;
        self.shield_until = None;
        true
    }

    /// The method heals the vehicle (capped at its maximum health) and returns the health that was
    /// actually gained.
    pub fn heal(&mut self, amount: f64) -> f64 {
        if self.destroyed {
            return 0.0;
        }

        let prev = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - prev
    }

    pub fn grant_shield(&mut self, until: f64) {
        if !self.destroyed {
            self.shield_until = Some(until);
        }
    }

    pub fn is_shielded(&self, now: f64) -> bool {
        self.shield_until.map_or(false, |until| now < until)
    }

    pub fn has_shield(&self) -> bool {
        self.shield_until.is_some()
    }

    /// The method removes an expired shield and returns true in that case.
    pub fn expire_shield(&mut self, now: f64) -> bool {
        match self.shield_until {
            Some(until) if now >= until => {
                self.shield_until = None;
                true
            }
            _ => false,
        }
    }

    /// shield_remaining returns the remaining shield time in ms.
    pub fn shield_remaining(&self, now: f64) -> f64 {
        self.shield_until.map_or(0.0, |until| (until - now).max(0.0))
    }
}
