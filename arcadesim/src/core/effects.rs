use crate::interfaces::platform::EntityKind;
use helpers::geometry::{Point3d, Vector2d, Vector3d};
use rand::Rng;

pub const EXPLOSION_FRAMES: u32 = 60;
pub const SPARK_FRAMES: u32 = 20;
pub const BURST_FRAMES: u32 = 30;
pub const FLOATING_TEXT_FRAMES: u32 = 90;
const NITRO_PARTICLES_PER_FRAME: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    Explosion,
    NitroFlame,
    ShieldSpark,
    CollectBurst,
    FloatingText(String),
}

impl EffectKind {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            EffectKind::Explosion => EntityKind::Explosion,
            EffectKind::NitroFlame => EntityKind::NitroFlame,
            EffectKind::ShieldSpark => EntityKind::ShieldSpark,
            EffectKind::CollectBurst => EntityKind::CollectBurst,
            EffectKind::FloatingText(text) => EntityKind::FloatingText(text.to_owned()),
        }
    }
}

/// Effect is a purely visual, short-lived object. It ages in every frame but only moves while
/// visible.
#[derive(Debug, Clone)]
pub struct Effect {
    pub id: u64,
    pub kind: EffectKind,
    pub position: Point3d,
    pub velocity: Vector3d,
    pub age: u32,
    pub max_age: u32,
    pub visible: bool,
}

impl Effect {
    /// progress returns the fraction of the lifetime that has passed.
    pub fn progress(&self) -> f64 {
        self.age as f64 / self.max_age.max(1) as f64
    }
}

#[derive(Debug, Default)]
pub struct Effects {
    next_id: u64,
    pub list: Vec<Effect>,
}

impl Effects {
    pub fn spawn(
        &mut self,
        kind: EffectKind,
        position: Point3d,
        velocity: Vector3d,
        max_age: u32,
    ) -> u64 {
        self.next_id += 1;
        self.list.push(Effect {
            id: self.next_id,
            kind,
            position,
            velocity,
            age: 0,
            max_age,
            visible: true,
        });
        self.next_id
    }

    /// nitro_flames creates the flame particles behind a boosting vehicle and returns their
    /// number.
    pub fn nitro_flames<R: Rng>(
        &mut self,
        position: &Point3d,
        heading: f64,
        rng: &mut R,
    ) -> usize {
        let fwd = Vector2d::from_heading(heading);
        let side = fwd.normal_vector();

        for _ in 0..NITRO_PARTICLES_PER_FRAME {
            let back = 2.0 + rng.gen::<f64>();
            let lateral = (rng.gen::<f64>() - 0.5) * 1.5;
            let pos = position
                .ground()
                .shift(&fwd.mult(-back))
                .shift(&side.mult(lateral))
                .as_point3d(position.y + 0.3 + rng.gen::<f64>() * 0.3);

            let drift = fwd.mult(-(0.3 + rng.gen::<f64>() * 0.2));
            let velocity = Vector3d {
                dx: drift.dx + (rng.gen::<f64>() - 0.5) * 0.1,
                dy: 0.05 + rng.gen::<f64>() * 0.05,
                dz: drift.dy + (rng.gen::<f64>() - 0.5) * 0.1,
            };

            let max_age = 20 + rng.gen_range(0..10);
            self.spawn(EffectKind::NitroFlame, pos, velocity, max_age);
        }

        NITRO_PARTICLES_PER_FRAME
    }

    /// decay ages all effects, moves the visible ones, and removes the expired ones. The ids of
    /// the expired effects are returned such that their visuals can be destroyed.
    pub fn decay(&mut self) -> Vec<u64> {
        let mut expired = vec![];

        for effect in self.list.iter_mut() {
            effect.age += 1;

            if effect.age >= effect.max_age {
                expired.push(effect.id);
            } else if effect.visible {
                effect.position = effect.position.shift(&effect.velocity);
            }
        }

        self.list.retain(|effect| effect.age < effect.max_age);
        expired
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
