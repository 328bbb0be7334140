use arcadesim::core::track::{Track, TrackPars};
use helpers::geometry::Point2d;

/// TrackView contains the track information required for drawing the race from above.
#[derive(Debug)]
pub struct TrackView {
    pub name: String,
    pub centerline: Vec<Point2d>,
    pub road_width: f64,
    pub start_line: [Point2d; 2],
    bounds: [f64; 4],
}

impl TrackView {
    pub fn new(track_pars: &TrackPars) -> TrackView {
        let track = Track::new(track_pars);
        let mut centerline = track.centerline_2d();

        // close the loop for drawing
        if let Some(first) = centerline.first().copied() {
            centerline.push(first);
        }

        // start/finish line across the full road width
        let start = track.point_at(0).ground();
        let half_width = track.half_road_width;
        let start_line = match track.perpendicular_at(0) {
            Some(perp) => [
                start.shift(&perp.mult(half_width)),
                start.shift(&perp.mult(-half_width)),
            ],
            None => [start, start],
        };

        TrackView {
            name: track.name.to_owned(),
            centerline,
            road_width: 2.0 * half_width,
            start_line,
            bounds: track.ground_bounds(),
        }
    }

    /// get_axes_expansion returns [x_min, x_max, z_min, z_max] of the drawing area, i.e. the track
    /// bounds plus padding, expanded to a square shape.
    pub fn get_axes_expansion(&self, padding_size: f64) -> [f64; 4] {
        let [mut x_min, mut x_max, mut z_min, mut z_max] = self.bounds;

        // apply padding
        x_min -= padding_size;
        x_max += padding_size;
        z_min -= padding_size;
        z_max += padding_size;

        // update min and max values such that its a square shape
        let width = x_max - x_min;
        let height = z_max - z_min;

        if width > height {
            let diff = width - height;
            z_min -= diff / 2.0;
            z_max += diff / 2.0;
        } else {
            let diff = height - width;
            x_min -= diff / 2.0;
            x_max += diff / 2.0;
        }

        [x_min, x_max, z_min, z_max]
    }
}

