use crate::core::aerial::{Helicopter, Missile};
use crate::core::effects::Effect;
use crate::core::hazards::{Ghost, Pickup};
use crate::core::vehicle::Vehicle;
use crate::interfaces::platform::EntityKey;
use helpers::general::lerp;
use helpers::geometry::Point3d;
use serde::Deserialize;

/// * `view_dist` - View distance of all entities except for the helicopters
/// * `helicopter_view_dist` - View distance of the helicopters
/// * `camera_distance` - Distance of the chase camera behind the player vehicle
/// * `camera_height` - Height of the chase camera above the player vehicle
/// * `camera_blend_ground` - Fraction of the horizontal camera error corrected per frame
/// * `camera_blend_height` - Fraction of the vertical camera error corrected per frame
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CullingPars {
    pub view_dist: f64,
    pub helicopter_view_dist: f64,
    pub camera_distance: f64,
    pub camera_height: f64,
    pub camera_blend_ground: f64,
    pub camera_blend_height: f64,
}

impl Default for CullingPars {
    fn default() -> Self {
        CullingPars {
            view_dist: 500.0,
            helicopter_view_dist: 200.0,
            camera_distance: 15.0,
            camera_height: 6.0,
            camera_blend_ground: 0.1,
            camera_blend_height: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullCategory {
    Vehicle,
    Helicopter,
    Missile,
    Ghost,
    Pickup,
    Effect,
}

impl CullingPars {
    pub fn threshold_sq(&self, category: CullCategory) -> f64 {
        match category {
            CullCategory::Helicopter => self.helicopter_view_dist.powi(2),
            _ => self.view_dist.powi(2),
        }
    }
}

/// Camera is the third-person chase camera following the player vehicle.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3d,
}

impl Camera {
    /// behind returns a camera located exactly at its target position behind the vehicle.
    pub fn behind(vehicle: &Vehicle, culling_pars: &CullingPars) -> Camera {
        Camera {
            position: Camera::target(vehicle, culling_pars),
        }
    }

    /// The method moves the camera smoothly towards its target position behind the vehicle.
    pub fn follow(&mut self, vehicle: &Vehicle, culling_pars: &CullingPars) {
        let target = Camera::target(vehicle, culling_pars);
        self.position.x = lerp(self.position.x, target.x, culling_pars.camera_blend_ground);
        self.position.z = lerp(self.position.z, target.z, culling_pars.camera_blend_ground);
        self.position.y = lerp(self.position.y, target.y, culling_pars.camera_blend_height);
    }

    fn target(vehicle: &Vehicle, culling_pars: &CullingPars) -> Point3d {
        vehicle
            .position
            .ground()
            .shift(&vehicle.forward().mult(-culling_pars.camera_distance))
            .as_point3d(vehicle.position.y + culling_pars.camera_height)
    }
}

/// is_near checks the horizontal squared distance against the threshold.
pub fn is_near(camera: &Point3d, position: &Point3d, threshold_sq: f64) -> bool {
    camera.ground_dist_sq(position) < threshold_sq
}

/// update_culling classifies all entities as visible or not and returns those whose visibility
/// changed.
#[allow(clippy::too_many_arguments)]
pub fn update_culling(
    camera: &Camera,
    culling_pars: &CullingPars,
    vehicles: &mut [Vehicle],
    helicopters: &mut [Helicopter],
    missiles: &mut [Missile],
    ghosts: &mut [Ghost],
    pickups: &mut [Pickup],
    effects: &mut [Effect],
) -> Vec<(EntityKey, bool)> {
    let mut changes = vec![];
    let cam = &camera.position;

    let mut classify = |visible: &mut bool, pos: &Point3d, cat: CullCategory, key: EntityKey| {
        let near = is_near(cam, pos, culling_pars.threshold_sq(cat));

        if near != *visible {
            *visible = near;
            changes.push((key, near));
        }
    };

    for veh in vehicles.iter_mut() {
        classify(
            &mut veh.visible,
            &veh.position,
            CullCategory::Vehicle,
            EntityKey::Vehicle(veh.id),
        );
    }
    for heli in helicopters.iter_mut() {
        classify(
            &mut heli.visible,
            &heli.position,
            CullCategory::Helicopter,
            EntityKey::Helicopter(heli.idx),
        );
    }
    for missile in missiles.iter_mut() {
        classify(
            &mut missile.visible,
            &missile.position,
            CullCategory::Missile,
            EntityKey::Missile(missile.id),
        );
    }
    for ghost in ghosts.iter_mut().filter(|ghost| !ghost.collected) {
        classify(
            &mut ghost.visible,
            &ghost.position,
            CullCategory::Ghost,
            EntityKey::Ghost(ghost.id),
        );
    }
    for pickup in pickups.iter_mut().filter(|pickup| !pickup.collected) {
        classify(
            &mut pickup.visible,
            &pickup.position,
            CullCategory::Pickup,
            EntityKey::Pickup(pickup.id),
        );
    }
    for effect in effects.iter_mut() {
        classify(
            &mut effect.visible,
            &effect.position,
            CullCategory::Effect,
            EntityKey::Effect(effect.id),
        );
    }

    changes
}
