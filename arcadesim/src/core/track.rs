use helpers::geometry::{Point2d, Point3d, Vector2d};
use serde::Deserialize;
use std::f64::consts::PI;

/// * `name` - Track name
/// * `no_points` - Number of centerline points of the closed loop
/// * `straight_length` - Length of the straights along the z axis (the curves span the same
/// length, i.e. the oval reaches from -straight_length/2 to straight_length/2 in z)
/// * `curve_radius` - Radius of the curves in x direction (the straights span 2 * curve_radius)
/// * `road_width` - Full road width, half of it is the lateral out-of-bounds threshold
/// * `road_height` - Height of the road surface
/// * `vehicle_height` - Height at which the vehicles are pinned (flat track)
/// * `search_stride` - Stride of the coarse closest point search (every n-th point is checked)
/// * `start_section_frac` - Lap fraction at the beginning of the loop that belongs to the
/// start/finish straight
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackPars {
    pub name: String,
    pub no_points: usize,
    pub straight_length: f64,
    pub curve_radius: f64,
    pub road_width: f64,
    pub road_height: f64,
    pub vehicle_height: f64,
    pub search_stride: usize,
    pub start_section_frac: f64,
}

impl Default for TrackPars {
    fn default() -> Self {
        TrackPars {
            name: String::from("Night Oval"),
            no_points: 200,
            straight_length: 600.0,
            curve_radius: 80.0,
            road_width: 40.0,
            road_height: 0.5,
            vehicle_height: 0.8,
            search_stride: 5,
            start_section_frac: 0.25,
        }
    }
}

/// LateralFrame describes the position of an object relative to the centerline point that was
/// found by the coarse closest point search.
#[derive(Debug, Clone, Copy)]
pub struct LateralFrame {
    pub idx: usize,
    pub offset: f64,
    pub perp: Vector2d,
}

#[derive(Debug)]
pub struct Track {
    pub name: String,
    points: Vec<Point3d>,
    pub half_road_width: f64,
    pub road_height: f64,
    pub vehicle_height: f64,
    pub search_stride: usize,
    pub start_section_end: usize,
}

impl Track {
    /// The stadium oval is parameterized by t in [0, 1) which is mapped piecewise to the top
    /// straight (+x direction), the right curve, the bottom straight (-x direction), and the left
    /// curve.
    pub fn new(track_pars: &TrackPars) -> Track {
        let no_points = track_pars.no_points;
        let r = track_pars.curve_radius;
        let half_straight = track_pars.straight_length / 2.0;
        let mut points = Vec::with_capacity(no_points);

        for i in 0..no_points {
            let t = i as f64 / no_points as f64;

            let (x, z) = if t < 0.25 {
                let p = t / 0.25;
                (-r + p * 2.0 * r, half_straight)
            } else if t < 0.5 {
                let p = (t - 0.25) / 0.25;
                let angle = PI / 2.0 - p * PI;
                (r + angle.cos() * r, angle.sin() * half_straight)
            } else if t < 0.75 {
                let p = (t - 0.5) / 0.25;
                (r - p * 2.0 * r, -half_straight)
            } else {
                let p = (t - 0.75) / 0.25;
                let angle = -PI / 2.0 - p * PI;
                (-r + angle.cos() * r, angle.sin() * half_straight)
            };

            points.push(Point3d {
                x,
                y: track_pars.road_height,
                z,
            });
        }

        Track {
            name: track_pars.name.to_owned(),
            points,
            half_road_width: track_pars.road_width / 2.0,
            road_height: track_pars.road_height,
            vehicle_height: track_pars.vehicle_height,
            search_stride: track_pars.search_stride.max(1),
            start_section_end: (no_points as f64 * track_pars.start_section_frac).floor() as usize,
        }
    }

    pub fn no_points(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    /// point_at returns the centerline point, the index wraps around the closed loop.
    pub fn point_at(&self, idx: usize) -> Point3d {
        self.points[idx % self.points.len()]
    }

    /// direction_at returns the normalized direction from the point to its successor.
    pub fn direction_at(&self, idx: usize) -> Option<Vector2d> {
        let cur = self.point_at(idx).ground();
        let next = self.point_at(idx + 1).ground();
        cur.vector_to(&next).normalized()
    }

    /// perpendicular_at returns the normalized lateral direction at the point (pointing to the
    /// right of the driving direction).
    pub fn perpendicular_at(&self, idx: usize) -> Option<Vector2d> {
        self.direction_at(idx).map(|dir| dir.normal_vector())
    }

    /// closest_point_index scans every stride-th centerline point and returns the index of the
    /// closest one (ground distance). No interpolation between points takes place, i.e. the
    /// result is only accurate to within stride points.
    pub fn closest_point_index(&self, pos: &Point3d, stride: usize) -> usize {
        let pos = pos.ground();
        let mut min_dist_sq = f64::INFINITY;
        let mut closest_idx = 0;

        for i in (0..self.points.len()).step_by(stride.max(1)) {
            let dist_sq = self.points[i].ground().dist_sq(&pos);

            if dist_sq < min_dist_sq {
                min_dist_sq = dist_sq;
                closest_idx = i;
            }
        }

        closest_idx
    }

    /// lateral_frame returns the closest centerline point (coarse search), the perpendicular
    /// direction there, and the signed lateral distance of the position from the centerline. None
    /// is returned if the track direction cannot be determined at that point.
    pub fn lateral_frame(&self, pos: &Point3d) -> Option<LateralFrame> {
        let idx = self.closest_point_index(pos, self.search_stride);
        let perp = self.perpendicular_at(idx)?;
        let offset = self.point_at(idx).ground().vector_to(&pos.ground()).dot(&perp);

        Some(LateralFrame { idx, offset, perp })
    }

    /// lateral_offset returns the signed distance of the position from the centerline (positive
    /// to the right of the driving direction).
    pub fn lateral_offset(&self, pos: &Point3d) -> f64 {
        self.lateral_frame(pos).map_or(0.0, |frame| frame.offset)
    }

    /// is_start_section returns true if the point belongs to the start/finish straight, where no
    /// hazards or pickups are placed.
    pub fn is_start_section(&self, idx: usize) -> bool {
        idx % self.points.len() < self.start_section_end
    }

    /// offset_position returns the centerline point shifted laterally by the inserted distance
    /// and lifted to the inserted height.
    pub fn offset_position(&self, idx: usize, lateral: f64, height: f64) -> Point3d {
        let base = self.point_at(idx).ground();
        let shifted = match self.perpendicular_at(idx) {
            Some(perp) => base.shift(&perp.mult(lateral)),
            None => base,
        };
        shifted.as_point3d(height)
    }

    /// grid_direction returns the driving direction at the start/finish line. It is taken from
    /// the last point to the first point after the line such that it is centered on the line.
    pub fn grid_direction(&self) -> Option<Vector2d> {
        let prev = self.point_at(self.points.len() - 1).ground();
        let next = self.point_at(1).ground();
        prev.vector_to(&next).normalized()
    }

    /// start_heading returns the heading of the driving direction at the start/finish line.
    pub fn start_heading(&self) -> f64 {
        self.grid_direction().map_or(0.0, |dir| dir.heading())
    }

    /// grid_position returns the position of a grid slot behind the start/finish line (row 0 is
    /// the line itself, positive sides are to the right of the driving direction).
    pub fn grid_position(&self, row: u32, side: f64, row_spacing: f64, side_spacing: f64) -> Point3d {
        let start = self.point_at(0).ground();

        let pos = match self.grid_direction() {
            Some(dir) => start
                .shift(&dir.mult(-(row as f64) * row_spacing))
                .shift(&dir.normal_vector().mult(side * side_spacing)),
            None => start,
        };

        pos.as_point3d(self.vehicle_height)
    }

    /// ground_bounds returns [x_min, x_max, z_min, z_max] of the centerline.
    pub fn ground_bounds(&self) -> [f64; 4] {
        self.points.iter().fold(
            [
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
            ],
            |[x_min, x_max, z_min, z_max], p| {
                [x_min.min(p.x), x_max.max(p.x), z_min.min(p.z), z_max.max(p.z)]
            },
        )
    }

    /// centerline_2d returns the centerline on the ground plane (used for drawing).
    pub fn centerline_2d(&self) -> Vec<Point2d> {
        self.points.iter().map(|p| p.ground()).collect()
    }
}
