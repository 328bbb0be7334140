use crate::core::track::Track;
use crate::core::vehicle::Vehicle;
use helpers::general::{argsort, SortOrder};
use helpers::geometry::Point3d;

const SEARCH_RANGE_FRAC: f64 = 0.25;
const HEAD_FRAC: f64 = 0.2;
const TAIL_FRAC: f64 = 0.8;

/// find_progress returns the track point closest to the position. Only every stride-th point is
/// considered, and only if it lies within a quarter lap of the previous progress, or if both the
/// point and the previous progress lie in the head (first 20 %) or tail (last 20 %) of the loop.
/// This keeps vehicles behind the start line from matching points at the end of the lap.
pub fn find_progress(track: &Track, position: &Point3d, prev_progress: usize) -> usize {
    let no_points = track.no_points();
    let n = no_points as f64;
    let search_range = (n * SEARCH_RANGE_FRAC).floor() as usize;
    let search_start = prev_progress.saturating_sub(search_range);
    let search_end = (prev_progress + search_range).min(no_points);

    let prev_near_head = (prev_progress as f64) < n * HEAD_FRAC;
    let prev_near_tail = (prev_progress as f64) > n * TAIL_FRAC;

    let pos = position.ground();
    let mut min_dist_sq = f64::INFINITY;
    let mut closest = prev_progress;

    for i in (0..no_points).step_by(track.search_stride) {
        let in_range = i >= search_start && i <= search_end;
        let near_head = (i as f64) < n * HEAD_FRAC;
        let near_tail = (i as f64) > n * TAIL_FRAC;

        if !in_range && !((near_head || near_tail) && (prev_near_head || prev_near_tail)) {
            continue;
        }

        let dist_sq = track.point_at(i).ground().dist_sq(&pos);

        if dist_sq < min_dist_sq {
            min_dist_sq = dist_sq;
            closest = i;
        }
    }

    closest
}

/// grid_progress returns the initial lap counter and track progress of a vehicle on the starting
/// grid. Vehicles behind the start/finish line start in lap 0, their first crossing completes no
/// lap.
pub fn grid_progress(track: &Track, position: &Point3d) -> (u32, usize) {
    let idx = track.closest_point_index(position, 1);

    if idx as f64 > track.no_points() as f64 * TAIL_FRAC {
        (0, idx)
    } else {
        (1, 0)
    }
}

/// is_lap_crossing returns true if the progress jumped from the tail to the head of the loop.
pub fn is_lap_crossing(prev_progress: usize, new_progress: usize, no_points: usize) -> bool {
    let n = no_points as f64;
    prev_progress as f64 > n * TAIL_FRAC && (new_progress as f64) < n * HEAD_FRAC
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapEvent {
    pub vehicle_id: usize,
    pub lap: u32,
    pub finished: bool,
}

/// update_progress samples the track progress of all non-destroyed vehicles and increments their
/// lap counters on a crossing. A vehicle has finished when its lap counter exceeds the total
/// number of laps.
pub fn update_progress(vehicles: &mut [Vehicle], track: &Track, tot_no_laps: u32) -> Vec<LapEvent> {
    let mut events = vec![];

    for veh in vehicles.iter_mut().filter(|veh| !veh.is_destroyed()) {
        let prev_progress = veh.track_progress;
        let new_progress = find_progress(track, &veh.position, prev_progress);
        veh.track_progress = new_progress;

        if is_lap_crossing(prev_progress, new_progress, track.no_points()) {
            veh.lap += 1;
            events.push(LapEvent {
                vehicle_id: veh.id,
                lap: veh.lap,
                finished: veh.lap > tot_no_laps,
            });
        }
    }

    events
}

/// ranking returns the vehicle ids ordered by race position. Destroyed vehicles are placed last,
/// all others are ordered by descending total progress (lap * no_points + progress). Ties keep the
/// registry order.
pub fn ranking(vehicles: &[Vehicle], no_points: usize) -> Vec<usize> {
    let total_progress: Vec<f64> = vehicles
        .iter()
        .map(|veh| {
            if veh.is_destroyed() {
                f64::NEG_INFINITY
            } else {
                (veh.lap as usize * no_points + veh.track_progress) as f64
            }
        })
        .collect();

    argsort(&total_progress, SortOrder::Descending)
        .into_iter()
        .map(|idx| vehicles[idx].id)
        .collect()
}

/// rank_of returns the 1-based race position of the vehicle.
pub fn rank_of(ranking: &[usize], vehicle_id: usize) -> usize {
    ranking
        .iter()
        .position(|&id| id == vehicle_id)
        .map_or(ranking.len(), |pos| pos + 1)
}
