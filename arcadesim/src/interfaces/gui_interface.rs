use crate::core::race::RacePhase;
use crate::interfaces::platform::{HudState, Overlay, SoundEffect};

pub const MAX_GUI_UPDATE_FREQUENCY: f64 = 60.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleState {
    pub id: usize,
    pub name: String,
    pub color: RgbColor,
    pub is_player: bool,
    pub x: f64,
    pub z: f64,
    pub heading: f64,
    pub speed: f64,
    pub health_frac: f64,
    pub destroyed: bool,
    pub shielded: bool,
    pub boosting: bool,
    pub lap: u32,
    pub visible: bool,
}

/// ObjectState is used for helicopters, missiles, ghosts, pickups and effects, which only need a
/// position, a size class, and a visibility flag for drawing.
#[derive(Debug, Clone, Default)]
pub struct ObjectState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub size: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RaceState {
    pub frame: u64,
    pub race_time: f64,
    pub phase: RacePhase,
    pub vehicle_states: Vec<VehicleState>,
    pub helicopters: Vec<ObjectState>,
    pub missiles: Vec<ObjectState>,
    pub ghosts: Vec<ObjectState>,
    pub health_pickups: Vec<ObjectState>,
    pub shield_pickups: Vec<ObjectState>,
    pub effects: Vec<ObjectState>,
    pub camera: [f64; 2],
    pub hud: HudState,
    pub overlay: Option<Overlay>,
    pub sounds: Vec<SoundEffect>,
}
