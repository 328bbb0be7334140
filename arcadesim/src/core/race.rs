use crate::core::aerial::{spawn_helicopters, update_helicopters, update_missile, Helicopter, Missile, MissileFate};
use crate::core::collision::{resolve_barrier, resolve_vehicle_contacts, ContactClass};
use crate::core::controller::{self, autopilot_input, InputState};
use crate::core::culling::{update_culling, Camera};
use crate::core::damage::{apply_damage, DamageContext, DamageOutcome, DamageSource};
use crate::core::effects::{
    EffectKind, Effects, BURST_FRAMES, EXPLOSION_FRAMES, FLOATING_TEXT_FRAMES, SPARK_FRAMES,
};
use crate::core::hazards::{
    find_contact, roll_heal_amount, spawn_ghost, spawn_pickup, Ghost, PendingRespawns, Pickup,
    PickupKind, RespawnKind,
};
use crate::core::nitro::Nitro;
use crate::core::progress::{grid_progress, rank_of, ranking, update_progress};
use crate::core::track::Track;
use crate::core::vehicle::{AiDriver, Livery, Vehicle, VehicleKind, VehiclePars};
use crate::interfaces::platform::{
    EntityKey, EntityKind, HudField, LeaderboardEntry, Overlay, Platform, SoundEffect, Transform,
    VisualTable,
};
use crate::post::race_result::{RaceResult, StandingsEntry};
use crate::pre::read_sim_pars::SimPars;
use helpers::general::ordinal_suffix;
use helpers::geometry::{Point3d, Vector3d};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashSet;

/// The player vehicle is always the first vehicle in the registry.
pub const PLAYER_ID: usize = 0;

/// * `tot_no_laps` - Total number of laps in the race
/// * `frame_rate` - (Hz) Simulated frames per second, the clock advances 1000 / frame_rate ms
/// per frame
/// * `invincibility_duration` - (ms) Damage-free period after the race start
/// * `countdown_delay` - (ms) Delay until the countdown starts
/// * `countdown_step` - (ms) Duration of a countdown step
/// * `countdown_from` - First number of the countdown
/// * `progress_sample_interval` - (frames) Track progress is sampled every n-th frame
/// * `max_race_time` - (s) Races are aborted after this time (unfinished)
/// * `health_danger_frac` - Health fraction below which the health bar signals danger
/// * `idle_rpm` - Engine RPM at standstill
/// * `max_rpm` - Engine RPM at the reference speed
/// * `rpm_ref_speed` - Speed at which the engine reaches its maximum RPM
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RacePars {
    pub tot_no_laps: u32,
    pub frame_rate: f64,
    pub invincibility_duration: f64,
    pub countdown_delay: f64,
    pub countdown_step: f64,
    pub countdown_from: u32,
    pub progress_sample_interval: u64,
    pub max_race_time: f64,
    pub health_danger_frac: f64,
    pub idle_rpm: f64,
    pub max_rpm: f64,
    pub rpm_ref_speed: f64,
}

impl Default for RacePars {
    fn default() -> Self {
        RacePars {
            tot_no_laps: 10,
            frame_rate: 60.0,
            invincibility_duration: 10000.0,
            countdown_delay: 800.0,
            countdown_step: 1000.0,
            countdown_from: 3,
            progress_sample_interval: 10,
            max_race_time: 900.0,
            health_danger_frac: 0.4,
            idle_rpm: 800.0,
            max_rpm: 8000.0,
            rpm_ref_speed: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RacePhase {
    Countdown { next_step: u32 },
    Racing,
    Won,
    Lost(DamageSource),
    RaceOver { winner: String, player_rank: usize },
}

impl Default for RacePhase {
    fn default() -> Self {
        RacePhase::Countdown { next_step: 0 }
    }
}

impl RacePhase {
    pub fn is_racing(&self) -> bool {
        *self == RacePhase::Racing
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RacePhase::Won | RacePhase::Lost(_) | RacePhase::RaceOver { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct Elimination {
    pub vehicle_id: usize,
    pub source: DamageSource,
    pub time: f64,
}

/// SimulationState contains all entities and timers of a race. It is owned by the race and the
/// subsystems only receive the parts they need.
#[derive(Debug)]
pub struct SimulationState {
    pub now: f64,
    pub frame: u64,
    pub phase: RacePhase,
    pub race_start: Option<f64>,
    pub finish_time: Option<f64>,
    pub vehicles: Vec<Vehicle>,
    pub helicopters: Vec<Helicopter>,
    pub missiles: Vec<Missile>,
    pub ghosts: Vec<Ghost>,
    pub pickups: Vec<Pickup>,
    pub effects: Effects,
    pub respawns: PendingRespawns,
    pub camera: Camera,
    pub ranking: Vec<usize>,
    next_entity_id: u64,
}

impl SimulationState {
    fn next_id(&mut self) -> u64 {
        self.next_entity_id += 1;
        self.next_entity_id
    }

    pub fn player(&self) -> &Vehicle {
        &self.vehicles[PLAYER_ID]
    }
}

#[derive(Debug)]
pub struct Race {
    pub race_pars: RacePars,
    pub track: Track,
    sim_pars: SimPars,
    pub state: SimulationState,
    visuals: VisualTable,
    visuals_spawned: bool,
    rng: StdRng,
    autopilot_target: Option<usize>,
    pub eliminations: Vec<Elimination>,
    pub last_player_damage: Option<DamageSource>,
}

impl Race {
    /// new creates a race with all vehicles on the grid, the helicopters, and the initial ghost and
    /// pickup populations. A seed makes the race reproducible. With autopilot, the player vehicle
    /// ignores the inserted keys and is driven by the AI steering law.
    pub fn new(sim_pars: &SimPars, seed: Option<u64>, autopilot: bool) -> Race {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let track = Track::new(&sim_pars.track_pars);
        let vehicles = create_vehicles(&track, &sim_pars.vehicle_pars, &mut rng);
        let helicopters = spawn_helicopters(&sim_pars.aerial_pars, &mut rng);
        let camera = Camera::behind(&vehicles[PLAYER_ID], &sim_pars.culling_pars);
        let ranking = (0..vehicles.len()).collect();

        let mut state = SimulationState {
            now: 0.0,
            frame: 0,
            phase: RacePhase::default(),
            race_start: None,
            finish_time: None,
            vehicles,
            helicopters,
            missiles: vec![],
            ghosts: Vec::with_capacity(sim_pars.hazard_pars.max_ghosts),
            pickups: Vec::with_capacity(sim_pars.hazard_pars.max_pickups),
            effects: Effects::default(),
            respawns: PendingRespawns::default(),
            camera,
            ranking,
            next_entity_id: 0,
        };

        for _ in 0..sim_pars.hazard_pars.max_ghosts {
            let id = state.next_id();
            state
                .ghosts
                .push(spawn_ghost(id, &track, &sim_pars.hazard_pars, &mut rng));
        }

        for _ in 0..sim_pars.hazard_pars.max_pickups {
            let id = state.next_id();
            state
                .pickups
                .push(spawn_pickup(id, &track, &sim_pars.hazard_pars, &mut rng));
        }

        Race {
            race_pars: sim_pars.race_pars.to_owned(),
            track,
            sim_pars: sim_pars.to_owned(),
            state,
            visuals: VisualTable::default(),
            visuals_spawned: false,
            rng,
            autopilot_target: if autopilot { Some(0) } else { None },
            eliminations: vec![],
            last_player_damage: None,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// The method simulates one frame. Execution order:
    /// 1. Advance the simulation clock by one frame.
    /// 2. Handle the countdown and the race start.
    /// 3. Classify all entities as visible or not based on the camera position.
    /// 4. Update the player and AI vehicles including vehicle-vehicle and barrier collisions
    /// (racing only).
    /// 5. Update the helicopters (racing only) and the missiles.
    /// 6. Age the ephemeral effects.
    /// 7. Process the respawns that are due.
    /// 8. Handle ghost and pickup contacts (racing only).
    /// 9. Remove expired shields.
    /// 10. Update the HUD and the camera.
    /// 11. Sample the track progress, detect lap crossings and the race end, and rank the
    /// vehicles (every n-th frame).
    pub fn simulate_frame(&mut self, input: &InputState, platform: &mut dyn Platform) {
        if !self.visuals_spawned {
            self.spawn_visuals(platform);
        }

        self.state.frame += 1;
        self.state.now += 1000.0 / self.race_pars.frame_rate;

        self.update_phase(platform);
        self.update_culling(platform);

        if self.state.phase.is_racing() {
            let mut handled_pairs = HashSet::new();
            self.update_player(input, &mut handled_pairs, platform);
            self.update_ai_vehicles(&mut handled_pairs, platform);
            self.update_helicopters(platform);
        }

        self.update_missiles(platform);
        self.update_effects(platform);
        self.handle_respawns(platform);

        if self.state.phase.is_racing() {
            self.update_ghosts(platform);
            self.update_pickups(platform);
        }

        self.update_shields(platform);
        self.sync_effect_visuals(platform);
        self.update_hud(platform);
        self.state
            .camera
            .follow(&self.state.vehicles[PLAYER_ID], &self.sim_pars.culling_pars);

        if self.state.frame % self.race_pars.progress_sample_interval.max(1) == 0 {
            self.update_progress(platform);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (PHASES) ----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_phase(&mut self, platform: &mut dyn Platform) {
        let next_step = match self.state.phase {
            RacePhase::Countdown { next_step } => next_step,
            _ => return,
        };

        let elapsed = self.state.now - self.race_pars.countdown_delay;

        if elapsed < next_step as f64 * self.race_pars.countdown_step {
            return;
        }

        if next_step < self.race_pars.countdown_from {
            let count = self.race_pars.countdown_from - next_step;
            info!("Countdown... {}", count);
            platform.show_overlay(Overlay::Countdown(count.to_string()));
            platform.play_sound(SoundEffect::Countdown, 0.5);
            self.state.phase = RacePhase::Countdown {
                next_step: next_step + 1,
            };
        } else {
            info!("GO! Race started on {}", self.track.name);
            platform.show_overlay(Overlay::Countdown(String::from("GO!")));
            platform.play_sound(SoundEffect::CountdownGo, 0.6);
            self.state.phase = RacePhase::Racing;
            self.state.race_start = Some(self.state.now);
        }
    }

    fn finish_race(&mut self, winner_id: usize, platform: &mut dyn Platform) {
        self.state.finish_time = Some(self.state.now);
        let race_time = self.get_race_time();
        let winner = &self.state.vehicles[winner_id];

        if winner.is_player() {
            info!("Player won the race after {:.3}s", race_time);
            self.state.phase = RacePhase::Won;
            platform.show_overlay(Overlay::Victory { race_time });
        } else {
            let player_rank = rank_of(&self.state.ranking, PLAYER_ID);
            info!(
                "{} won the race after {:.3}s, player finished {}{}",
                winner.name,
                race_time,
                player_rank,
                ordinal_suffix(player_rank)
            );
            let winner_name = winner.name.to_owned();
            self.state.phase = RacePhase::RaceOver {
                winner: winner_name.to_owned(),
                player_rank,
            };
            platform.show_overlay(Overlay::RaceOver {
                winner: winner_name,
                player_rank,
            });
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (VEHICLES) --------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_player(
        &mut self,
        input: &InputState,
        handled_pairs: &mut HashSet<(usize, usize)>,
        platform: &mut dyn Platform,
    ) {
        let auto_input;
        let input = match self.autopilot_target.as_mut() {
            Some(target_point) => {
                auto_input = autopilot_input(
                    &self.state.vehicles[PLAYER_ID],
                    target_point,
                    &self.track,
                    &self.sim_pars.vehicle_pars,
                );
                &auto_input
            }
            None => input,
        };

        let events = controller::update_player(
            &mut self.state.vehicles[PLAYER_ID],
            input,
            &self.sim_pars.vehicle_pars,
            self.state.now,
        );

        if events.nitro_started {
            debug!("Player activated nitro");
            platform.play_sound(SoundEffect::Nitro, 0.5);
        }

        self.resolve_collisions(PLAYER_ID, handled_pairs, platform);
    }

    fn update_ai_vehicles(
        &mut self,
        handled_pairs: &mut HashSet<(usize, usize)>,
        platform: &mut dyn Platform,
    ) {
        for idx in 0..self.state.vehicles.len() {
            if self.state.vehicles[idx].is_player() {
                continue;
            }

            let events = controller::update_ai(
                &mut self.state.vehicles[idx],
                &self.track,
                &self.sim_pars.vehicle_pars,
                self.state.now,
                &mut self.rng,
            );

            if events.nitro_started {
                debug!("{} activated nitro", self.state.vehicles[idx].name);
            }

            self.resolve_collisions(idx, handled_pairs, platform);
        }
    }

    /// The method resolves the collisions of a vehicle that was just moved, applies the resulting
    /// damage, and emits the nitro flames if the vehicle is boosting.
    fn resolve_collisions(
        &mut self,
        idx: usize,
        handled_pairs: &mut HashSet<(usize, usize)>,
        platform: &mut dyn Platform,
    ) {
        if self.state.vehicles[idx].is_destroyed() {
            return;
        }

        let contacts = resolve_vehicle_contacts(
            &mut self.state.vehicles,
            idx,
            handled_pairs,
            &self.sim_pars.collision_pars,
        );

        for contact in contacts {
            match contact.class {
                Some(ContactClass::Side) => platform.play_sound(SoundEffect::Hit, 0.3),
                Some(_) => platform.play_sound(SoundEffect::Hit, 0.5),
                None => {}
            }

            for req in contact.damage.iter() {
                self.damage_vehicle(req.vehicle_id, req.amount, req.source, platform);
            }
        }

        let barrier_hit = resolve_barrier(
            &mut self.state.vehicles[idx],
            &self.track,
            &self.sim_pars.collision_pars,
        );

        if let Some(req) = barrier_hit.and_then(|hit| hit.damage) {
            self.damage_vehicle(req.vehicle_id, req.amount, req.source, platform);
        }

        let veh = &self.state.vehicles[idx];

        if veh.nitro.is_boosting() && veh.visible && !veh.is_destroyed() {
            let (position, heading) = (veh.position, veh.heading);
            self.state
                .effects
                .nitro_flames(&position, heading, &mut self.rng);
        }
    }

    /// damage_vehicle passes the damage to the unified damage entry point and handles the
    /// consequences (effects, eliminations, and the end of the race if the player is destroyed).
    fn damage_vehicle(
        &mut self,
        vehicle_id: usize,
        amount: f64,
        source: DamageSource,
        platform: &mut dyn Platform,
    ) -> DamageOutcome {
        let ctx = self.damage_context();
        let veh = &mut self.state.vehicles[vehicle_id];
        let outcome = apply_damage(veh, amount, &ctx);
        let position = veh.position;
        let is_player = veh.is_player();
        let name = veh.name.to_owned();

        match outcome {
            DamageOutcome::Shielded => self.shield_sparks(position),
            DamageOutcome::Damaged { amount } => {
                self.floating_text(position, format!("-{}", amount.round()));

                if is_player {
                    self.last_player_damage = Some(source);
                }
            }
            DamageOutcome::Destroyed => {
                self.floating_text(position, format!("-{}", amount.round()));
                self.explosion(position, platform);
                self.visuals
                    .detach(platform, EntityKey::ShieldBubble(vehicle_id));
                self.eliminations.push(Elimination {
                    vehicle_id,
                    source,
                    time: self.get_race_time(),
                });
                info!("{} was eliminated ({})", name, source.title());

                if is_player {
                    self.last_player_damage = Some(source);

                    if !self.state.phase.is_terminal() {
                        info!("Race lost: {}", source.message());
                        self.state.finish_time = Some(self.state.now);
                        self.state.phase = RacePhase::Lost(source);
                        platform.show_overlay(Overlay::GameOver {
                            title: source.title().to_owned(),
                            message: source.message().to_owned(),
                        });
                    }
                }
            }
            DamageOutcome::AlreadyDestroyed | DamageOutcome::Invincible => {}
        }

        outcome
    }

    fn update_shields(&mut self, platform: &mut dyn Platform) {
        for veh in self.state.vehicles.iter_mut() {
            if veh.expire_shield(self.state.now) {
                self.visuals.detach(platform, EntityKey::ShieldBubble(veh.id));
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (AERIAL THREATS) --------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_helicopters(&mut self, platform: &mut dyn Platform) {
        let launches = update_helicopters(
            &mut self.state.helicopters,
            &self.state.vehicles,
            &self.sim_pars.aerial_pars,
            self.state.now,
            &mut self.rng,
        );

        for launch in launches.iter() {
            debug!(
                "Helicopter {} fired a missile at {}",
                launch.heli_idx, self.state.vehicles[launch.target].name
            );
            let id = self.state.next_id();
            let missile = Missile::new(id, launch, &self.sim_pars.aerial_pars);
            self.visuals.attach(
                platform,
                EntityKey::Missile(id),
                EntityKind::Missile,
                Transform::at(missile.position),
            );
            self.state.missiles.push(missile);
        }
    }

    fn update_missiles(&mut self, platform: &mut dyn Platform) {
        let missiles = std::mem::take(&mut self.state.missiles);
        let mut remaining = Vec::with_capacity(missiles.len());

        for mut missile in missiles {
            let fate = update_missile(&mut missile, &self.state.vehicles, &self.sim_pars.aerial_pars);

            match fate {
                MissileFate::Flying => {
                    remaining.push(missile);
                    continue;
                }
                MissileFate::Hit { vehicle_id } => {
                    debug!("Missile hit {}", self.state.vehicles[vehicle_id].name);
                    self.explosion(missile.position, platform);
                    self.damage_vehicle(
                        vehicle_id,
                        self.sim_pars.aerial_pars.missile_damage,
                        DamageSource::Helicopter,
                        platform,
                    );
                }
                MissileFate::Expired { explode } => {
                    if explode {
                        self.explosion(missile.position, platform);
                    }
                }
            }

            self.visuals.detach(platform, EntityKey::Missile(missile.id));
        }

        self.state.missiles = remaining;
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HAZARDS AND PICKUPS) ---------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_ghosts(&mut self, platform: &mut dyn Platform) {
        let now = self.state.now;

        for ghost in self.state.ghosts.iter_mut() {
            ghost.animate(now, self.sim_pars.hazard_pars.float_amplitude);
        }

        // damage is applied per ghost such that a vehicle destroyed by one ghost cannot collect
        // the next one in the same frame
        for idx in 0..self.state.ghosts.len() {
            let ghost = &self.state.ghosts[idx];

            if ghost.collected {
                continue;
            }

            let vehicle_id =
                match find_contact(&ghost.position, ghost.hit_radius_sq(), &self.state.vehicles) {
                    Some(vehicle_id) => vehicle_id,
                    None => continue,
                };
            let (ghost_id, position, damage) = (ghost.id, ghost.position, ghost.damage());
            self.state.ghosts[idx].collected = true;

            debug!(
                "{} hit a ghost ({} damage)",
                self.state.vehicles[vehicle_id].name, damage
            );
            self.visuals.detach(platform, EntityKey::Ghost(ghost_id));
            self.collect_burst(position);
            self.state.respawns.schedule(
                RespawnKind::Ghost,
                now + self.sim_pars.hazard_pars.ghost_respawn_delay,
            );

            self.damage_vehicle(vehicle_id, damage, DamageSource::Ghost, platform);

            let veh_pos = self.state.vehicles[vehicle_id].position;
            self.floating_text(veh_pos, String::from("HAUNTED!"));
            platform.play_sound(SoundEffect::Ghost, 0.4);
        }

        self.state.ghosts.retain(|ghost| !ghost.collected);
    }

    fn update_pickups(&mut self, platform: &mut dyn Platform) {
        let now = self.state.now;
        let mut contacts = vec![];

        for pickup in self.state.pickups.iter_mut() {
            pickup.animate(now, self.sim_pars.hazard_pars.float_amplitude);

            if pickup.collected {
                continue;
            }

            if let Some(vehicle_id) = find_contact(
                &pickup.position,
                self.sim_pars.hazard_pars.pickup_hit_radius_sq,
                &self.state.vehicles,
            ) {
                pickup.collected = true;
                contacts.push((pickup.id, pickup.position, pickup.kind, vehicle_id));
            }
        }

        self.state.pickups.retain(|pickup| !pickup.collected);

        for (pickup_id, position, kind, vehicle_id) in contacts {
            self.visuals.detach(platform, EntityKey::Pickup(pickup_id));
            self.collect_burst(position);
            self.collect_pickup(kind, vehicle_id, platform);
            self.state.respawns.schedule(
                RespawnKind::Pickup,
                now + self.sim_pars.hazard_pars.pickup_respawn_delay,
            );
        }
    }

    fn collect_pickup(&mut self, kind: PickupKind, vehicle_id: usize, platform: &mut dyn Platform) {
        let hazard_pars = &self.sim_pars.hazard_pars;
        let now = self.state.now;

        let text = match kind {
            PickupKind::Health => {
                let amount = roll_heal_amount(hazard_pars, &mut self.rng);
                self.state.vehicles[vehicle_id].heal(amount);
                platform.play_sound(SoundEffect::Health, 0.4);
                format!("+{} HP", amount)
            }
            PickupKind::Shield => {
                let veh = &mut self.state.vehicles[vehicle_id];
                veh.grant_shield(now + hazard_pars.shield_duration);
                self.visuals.attach(
                    platform,
                    EntityKey::ShieldBubble(vehicle_id),
                    EntityKind::ShieldBubble,
                    Transform::at(veh.position),
                );
                platform.play_sound(SoundEffect::Shield, 0.4);
                String::from("SHIELD")
            }
        };

        let veh = &self.state.vehicles[vehicle_id];
        debug!("{} collected a {:?} pickup", veh.name, kind);

        if veh.is_player() {
            let toast = match kind {
                PickupKind::Health => text.to_owned(),
                PickupKind::Shield => format!("SHIELD {}s", hazard_pars.shield_duration / 1000.0),
            };
            platform.show_overlay(Overlay::Toast(toast));
        }

        let position = veh.position;
        self.floating_text(position, text);
    }

    /// handle_respawns spawns the ghosts and pickups whose respawn deadline is reached. Respawns
    /// that become due after the race ended are dropped.
    fn handle_respawns(&mut self, platform: &mut dyn Platform) {
        for req in self.state.respawns.take_due(self.state.now) {
            if self.state.phase.is_terminal() {
                debug!("Dropped {:?} respawn, race is over", req.kind);
                continue;
            }

            let id = self.state.next_id();

            match req.kind {
                RespawnKind::Ghost => {
                    let ghost = spawn_ghost(id, &self.track, &self.sim_pars.hazard_pars, &mut self.rng);
                    self.visuals.attach(
                        platform,
                        EntityKey::Ghost(id),
                        EntityKind::Ghost { size: ghost.size },
                        Transform::at(ghost.position),
                    );
                    self.state.ghosts.push(ghost);
                }
                RespawnKind::Pickup => {
                    let pickup =
                        spawn_pickup(id, &self.track, &self.sim_pars.hazard_pars, &mut self.rng);
                    self.visuals.attach(
                        platform,
                        EntityKey::Pickup(id),
                        pickup_entity_kind(pickup.kind),
                        Transform::at(pickup.position),
                    );
                    self.state.pickups.push(pickup);
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (EFFECTS AND VISUALS) ---------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn spawn_visuals(&mut self, platform: &mut dyn Platform) {
        for veh in self.state.vehicles.iter() {
            self.visuals.attach(
                platform,
                EntityKey::Vehicle(veh.id),
                EntityKind::Vehicle {
                    color: veh.color.to_owned(),
                    is_player: veh.is_player(),
                },
                Transform {
                    position: veh.position,
                    heading: veh.heading,
                    scale: 1.0,
                },
            );
        }
        for heli in self.state.helicopters.iter() {
            self.visuals.attach(
                platform,
                EntityKey::Helicopter(heli.idx),
                EntityKind::Helicopter,
                Transform::at(heli.position),
            );
        }
        for ghost in self.state.ghosts.iter() {
            self.visuals.attach(
                platform,
                EntityKey::Ghost(ghost.id),
                EntityKind::Ghost { size: ghost.size },
                Transform::at(ghost.position),
            );
        }
        for pickup in self.state.pickups.iter() {
            self.visuals.attach(
                platform,
                EntityKey::Pickup(pickup.id),
                pickup_entity_kind(pickup.kind),
                Transform::at(pickup.position),
            );
        }

        self.visuals_spawned = true;
    }

    fn update_culling(&mut self, platform: &mut dyn Platform) {
        let state = &mut self.state;
        let changes = update_culling(
            &state.camera,
            &self.sim_pars.culling_pars,
            &mut state.vehicles,
            &mut state.helicopters,
            &mut state.missiles,
            &mut state.ghosts,
            &mut state.pickups,
            &mut state.effects.list,
        );

        for (key, visible) in changes {
            self.visuals.set_visible(platform, key, visible);

            if let EntityKey::Vehicle(id) = key {
                self.visuals
                    .set_visible(platform, EntityKey::ShieldBubble(id), visible);
            }
        }
    }

    fn update_effects(&mut self, platform: &mut dyn Platform) {
        for effect_id in self.state.effects.decay() {
            self.visuals.detach(platform, EntityKey::Effect(effect_id));
        }
    }

    /// sync_effect_visuals attaches visuals to the effects spawned in this frame.
    fn sync_effect_visuals(&mut self, platform: &mut dyn Platform) {
        for effect in self.state.effects.list.iter() {
            self.visuals.attach(
                platform,
                EntityKey::Effect(effect.id),
                effect.kind.entity_kind(),
                Transform::at(effect.position),
            );
        }
    }

    fn explosion(&mut self, position: Point3d, platform: &mut dyn Platform) {
        self.state.effects.spawn(
            EffectKind::Explosion,
            position,
            Vector3d::default(),
            EXPLOSION_FRAMES,
        );
        platform.play_sound(SoundEffect::Explosion, 0.6);
    }

    fn shield_sparks(&mut self, position: Point3d) {
        for _ in 0..10 {
            let velocity = Vector3d {
                dx: (self.rng.gen::<f64>() - 0.5) * 0.8,
                dy: self.rng.gen::<f64>() * 0.5,
                dz: (self.rng.gen::<f64>() - 0.5) * 0.8,
            };
            self.state.effects.spawn(
                EffectKind::ShieldSpark,
                position.shift(&Vector3d {
                    dx: 0.0,
                    dy: 2.0,
                    dz: 0.0,
                }),
                velocity,
                SPARK_FRAMES,
            );
        }
    }

    fn collect_burst(&mut self, position: Point3d) {
        self.state.effects.spawn(
            EffectKind::CollectBurst,
            position,
            Vector3d::default(),
            BURST_FRAMES,
        );
    }

    fn floating_text(&mut self, position: Point3d, text: String) {
        self.state.effects.spawn(
            EffectKind::FloatingText(text),
            position.shift(&Vector3d {
                dx: 0.0,
                dy: 5.0,
                dz: 0.0,
            }),
            Vector3d {
                dx: 0.0,
                dy: 6.0 / FLOATING_TEXT_FRAMES as f64,
                dz: 0.0,
            },
            FLOATING_TEXT_FRAMES,
        );
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HUD AND PROGRESS) ------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_hud(&mut self, platform: &mut dyn Platform) {
        let now = self.state.now;
        let ctx = self.damage_context();
        let player = &self.state.vehicles[PLAYER_ID];

        platform.update_hud(HudField::Speed(player.speed.abs().round()));
        platform.update_hud(HudField::Nitro(player.nitro.bar(now)));
        platform.update_hud(HudField::Lap {
            cur: player.lap.min(self.race_pars.tot_no_laps),
            tot: self.race_pars.tot_no_laps,
        });
        platform.update_hud(HudField::Health {
            frac: player.health_frac(),
            danger: player.health_frac() < self.race_pars.health_danger_frac,
        });
        platform.update_hud(HudField::Invincibility(
            ctx.invincibility_left().map(|left| (left / 1000.0).ceil()),
        ));
        platform.update_hud(HudField::Rpm(engine_rpm(player.speed, &self.race_pars)));
    }

    fn update_progress(&mut self, platform: &mut dyn Platform) {
        let tot_no_laps = self.race_pars.tot_no_laps;
        let lap_events = update_progress(&mut self.state.vehicles, &self.track, tot_no_laps);
        self.state.ranking = ranking(&self.state.vehicles, self.track.no_points());

        for event in lap_events {
            let veh = &self.state.vehicles[event.vehicle_id];

            if veh.is_player() {
                platform.play_sound(SoundEffect::Lap, 0.4);

                if event.lap <= tot_no_laps {
                    info!("Player started lap {}/{}", event.lap, tot_no_laps);
                    let text = if event.lap == tot_no_laps {
                        String::from("FINAL LAP!")
                    } else {
                        format!("LAP {}!", event.lap)
                    };
                    let position = veh.position;
                    self.floating_text(position, text);
                }
            } else {
                debug!("{} started lap {}", veh.name, event.lap);
            }

            if event.finished && !self.state.phase.is_terminal() {
                self.finish_race(event.vehicle_id, platform);
            }
        }

        let player_rank = rank_of(&self.state.ranking, PLAYER_ID);
        platform.update_hud(HudField::Rank {
            rank: player_rank,
            ordinal: ordinal_suffix(player_rank),
            no_vehicles: self.state.vehicles.len(),
        });
        platform.update_hud(HudField::Leaderboard(
            self.state
                .ranking
                .iter()
                .enumerate()
                .map(|(i, &id)| {
                    let veh = &self.state.vehicles[id];
                    LeaderboardEntry {
                        rank: i + 1,
                        name: veh.name.to_owned(),
                        health_frac: veh.health_frac(),
                        is_player: veh.is_player(),
                        destroyed: veh.is_destroyed(),
                    }
                })
                .collect(),
        ));
    }

    // ---------------------------------------------------------------------------------------------
    // GETTERS -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn is_finished(&self) -> bool {
        self.state.phase.is_terminal()
    }

    /// get_race_time returns the time since the race start in seconds (frozen at the race end).
    pub fn get_race_time(&self) -> f64 {
        match self.state.race_start {
            Some(race_start) => {
                (self.state.finish_time.unwrap_or(self.state.now) - race_start) / 1000.0
            }
            None => 0.0,
        }
    }

    /// get_race_result returns a race result struct of the race.
    pub fn get_race_result(&self) -> RaceResult {
        let standings = ranking(&self.state.vehicles, self.track.no_points())
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let veh = &self.state.vehicles[id];
                StandingsEntry {
                    rank: i + 1,
                    name: veh.name.to_owned(),
                    is_player: veh.is_player(),
                    lap: veh.lap,
                    track_progress: veh.track_progress,
                    health: veh.health(),
                    destroyed: veh.is_destroyed(),
                }
            })
            .collect();

        RaceResult {
            track_name: self.track.name.to_owned(),
            tot_no_laps: self.race_pars.tot_no_laps,
            outcome: self.state.phase.to_owned(),
            race_time: self.get_race_time(),
            no_frames: self.state.frame,
            standings,
        }
    }

    /// damage_context returns the context the damage entry point currently works with.
    pub fn damage_context(&self) -> DamageContext {
        DamageContext {
            now: self.state.now,
            race_start: self.state.race_start,
            invincibility: self.race_pars.invincibility_duration,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// HELPERS -----------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// create_vehicles places the player on the start/finish line and the AI vehicles behind it in
/// rows of two. An odd last AI vehicle is placed in the center of its row.
fn create_vehicles<R: Rng>(track: &Track, vehicle_pars: &VehiclePars, rng: &mut R) -> Vec<Vehicle> {
    let no_ai = vehicle_pars.no_ai_vehicles;
    let heading = track.start_heading();
    let nitro_pars = &vehicle_pars.nitro_pars;
    let mut vehicles = Vec::with_capacity(no_ai + 1);

    vehicles.push(Vehicle::new(
        PLAYER_ID,
        &vehicle_pars.player,
        VehicleKind::Player,
        track.grid_position(0, 0.0, vehicle_pars.grid_row_spacing, vehicle_pars.grid_side_spacing),
        heading,
        vehicle_pars.max_health,
        Nitro::new(nitro_pars),
    ));

    for i in 0..no_ai {
        let row = (i / 2 + 1) as u32;
        let side = if i == no_ai - 1 && no_ai % 2 == 1 {
            0.0
        } else if i % 2 == 0 {
            1.0
        } else {
            -1.0
        };

        let livery = vehicle_pars
            .ai_liveries
            .get(i % vehicle_pars.ai_liveries.len().max(1))
            .cloned()
            .unwrap_or_else(|| Livery {
                name: format!("AI {}", i + 1),
                color: String::from("#ff4400"),
            });

        let [vel_min, vel_max] = vehicle_pars.ai_max_velocity_range;
        let [skill_min, skill_max] = vehicle_pars.ai_skill_range;
        let max_velocity = vel_min + rng.gen::<f64>() * (vel_max - vel_min);
        let skill_level = skill_min + rng.gen::<f64>() * (skill_max - skill_min);
        let nitro = Nitro::with_cooldown(
            nitro_pars,
            rng.gen::<f64>() * nitro_pars.ai_max_initial_cooldown,
        );

        vehicles.push(Vehicle::new(
            i + 1,
            &livery,
            VehicleKind::Ai(AiDriver {
                target_point: 0,
                skill_level,
                max_velocity,
            }),
            track.grid_position(
                row,
                side,
                vehicle_pars.grid_row_spacing,
                vehicle_pars.grid_side_spacing,
            ),
            heading,
            vehicle_pars.max_health,
            nitro,
        ));
    }

    for veh in vehicles.iter_mut() {
        let (lap, track_progress) = grid_progress(track, &veh.position);
        veh.lap = lap;
        veh.track_progress = track_progress;
    }

    vehicles
}

fn pickup_entity_kind(kind: PickupKind) -> EntityKind {
    match kind {
        PickupKind::Health => EntityKind::HealthPickup,
        PickupKind::Shield => EntityKind::ShieldPickup,
    }
}

/// engine_rpm maps the speed magnitude linearly to the engine RPM.
pub fn engine_rpm(speed: f64, race_pars: &RacePars) -> f64 {
    race_pars.idle_rpm
        + speed.abs() / race_pars.rpm_ref_speed * (race_pars.max_rpm - race_pars.idle_rpm)
}
