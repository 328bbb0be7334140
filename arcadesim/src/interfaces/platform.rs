use helpers::geometry::Point3d;
use std::collections::HashMap;

/// VisualHandle is an opaque reference to a visual representation owned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// EntityKey identifies a simulated entity independent of its visual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Vehicle(usize),
    ShieldBubble(usize),
    Helicopter(usize),
    Missile(u64),
    Ghost(u64),
    Pickup(u64),
    Effect(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Vehicle { color: String, is_player: bool },
    ShieldBubble,
    Helicopter,
    Missile,
    Ghost { size: u32 },
    HealthPickup,
    ShieldPickup,
    Explosion,
    NitroFlame,
    ShieldSpark,
    CollectBurst,
    FloatingText(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Point3d,
    pub heading: f64,
    pub scale: f64,
}

impl Transform {
    pub fn at(position: Point3d) -> Transform {
        Transform {
            position,
            heading: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Hit,
    Nitro,
    Ghost,
    Health,
    Shield,
    Lap,
    Explosion,
    Countdown,
    CountdownGo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub health_frac: f64,
    pub is_player: bool,
    pub destroyed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HudField {
    Speed(f64),
    Nitro(f64),
    Lap { cur: u32, tot: u32 },
    Rank { rank: usize, ordinal: &'static str, no_vehicles: usize },
    Health { frac: f64, danger: bool },
    Invincibility(Option<f64>),
    Rpm(f64),
    Leaderboard(Vec<LeaderboardEntry>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Countdown(String),
    Toast(String),
    GameOver { title: String, message: String },
    Victory { race_time: f64 },
    RaceOver { winner: String, player_rank: usize },
}

/// Platform is the rendering/audio/HUD collaborator of the simulation. The simulation only ever
/// holds the opaque handles returned by spawn_visual.
pub trait Platform {
    fn spawn_visual(&mut self, kind: EntityKind, transform: Transform) -> VisualHandle;
    fn destroy_visual(&mut self, handle: VisualHandle);
    fn set_visible(&mut self, handle: VisualHandle, visible: bool);
    fn play_sound(&mut self, effect: SoundEffect, volume: f64);
    fn update_hud(&mut self, field: HudField);
    fn show_overlay(&mut self, overlay: Overlay);
}

// VISUAL TABLE ------------------------------------------------------------------------------------

/// VisualTable associates simulated entities with the visual handles spawned for them.
#[derive(Debug, Default)]
pub struct VisualTable {
    handles: HashMap<EntityKey, VisualHandle>,
}

impl VisualTable {
    /// attach spawns a visual for the entity unless one is attached already.
    pub fn attach(
        &mut self,
        platform: &mut dyn Platform,
        key: EntityKey,
        kind: EntityKind,
        transform: Transform,
    ) -> VisualHandle {
        if let Some(handle) = self.handles.get(&key) {
            return *handle;
        }

        let handle = platform.spawn_visual(kind, transform);
        self.handles.insert(key, handle);
        handle
    }

    /// detach destroys the visual of the entity (no-op if none is attached).
    pub fn detach(&mut self, platform: &mut dyn Platform, key: EntityKey) {
        if let Some(handle) = self.handles.remove(&key) {
            platform.destroy_visual(handle);
        }
    }

    pub fn get(&self, key: EntityKey) -> Option<VisualHandle> {
        self.handles.get(&key).copied()
    }

    pub fn set_visible(&self, platform: &mut dyn Platform, key: EntityKey, visible: bool) {
        if let Some(handle) = self.handles.get(&key) {
            platform.set_visible(*handle, visible);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

// HEADLESS PLATFORM -------------------------------------------------------------------------------

/// HudState keeps the latest value of every HUD field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudState {
    pub speed: f64,
    pub nitro: f64,
    pub lap: u32,
    pub tot_no_laps: u32,
    pub rank: usize,
    pub rank_ordinal: &'static str,
    pub no_vehicles: usize,
    pub health_frac: f64,
    pub health_danger: bool,
    pub invincibility: Option<f64>,
    pub rpm: f64,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// HeadlessPlatform records everything the simulation asks for. It is used for headless runs, as
/// the source of the HUD part of the GUI snapshots, and in tests.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    next_handle: u64,
    pub visuals: HashMap<VisualHandle, (EntityKind, bool)>,
    pub hud: HudState,
    pub overlay: Option<Overlay>,
    pub overlay_log: Vec<Overlay>,
    pub sound_counts: HashMap<SoundEffect, u32>,
    pending_sounds: Vec<SoundEffect>,
}

impl HeadlessPlatform {
    pub fn new() -> HeadlessPlatform {
        HeadlessPlatform::default()
    }

    pub fn sound_count(&self, effect: SoundEffect) -> u32 {
        self.sound_counts.get(&effect).copied().unwrap_or(0)
    }

    /// take_sounds returns the sounds played since the last call.
    pub fn take_sounds(&mut self) -> Vec<SoundEffect> {
        std::mem::take(&mut self.pending_sounds)
    }
}

impl Platform for HeadlessPlatform {
    fn spawn_visual(&mut self, kind: EntityKind, _transform: Transform) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        self.visuals.insert(handle, (kind, true));
        handle
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        self.visuals.remove(&handle);
    }

    fn set_visible(&mut self, handle: VisualHandle, visible: bool) {
        if let Some(entry) = self.visuals.get_mut(&handle) {
            entry.1 = visible;
        }
    }

    fn play_sound(&mut self, effect: SoundEffect, _volume: f64) {
        *self.sound_counts.entry(effect).or_insert(0) += 1;
        self.pending_sounds.push(effect);
    }

    fn update_hud(&mut self, field: HudField) {
        match field {
            HudField::Speed(speed) => self.hud.speed = speed,
            HudField::Nitro(nitro) => self.hud.nitro = nitro,
            HudField::Lap { cur, tot } => {
                self.hud.lap = cur;
                self.hud.tot_no_laps = tot;
            }
            HudField::Rank {
                rank,
                ordinal,
                no_vehicles,
            } => {
                self.hud.rank = rank;
                self.hud.rank_ordinal = ordinal;
                self.hud.no_vehicles = no_vehicles;
            }
            HudField::Health { frac, danger } => {
                self.hud.health_frac = frac;
                self.hud.health_danger = danger;
            }
            HudField::Invincibility(secs) => self.hud.invincibility = secs,
            HudField::Rpm(rpm) => self.hud.rpm = rpm,
            HudField::Leaderboard(entries) => self.hud.leaderboard = entries,
        }
    }

    fn show_overlay(&mut self, overlay: Overlay) {
        self.overlay_log.push(overlay.clone());
        self.overlay = Some(overlay);
    }
}
