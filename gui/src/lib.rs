pub mod core {
    pub mod gui;
    pub mod track;
}
pub mod interfaces {
    pub mod arcadesim_interface;
}

#[cfg(test)]
mod track_view_tests {
    use crate::core::track::TrackView;
    use approx::assert_relative_eq;
    use arcadesim::core::track::TrackPars;

    #[test]
    fn test_axes_are_square() {
        let track_view = TrackView::new(&TrackPars::default());
        let [x_min, x_max, z_min, z_max] = track_view.get_axes_expansion(50.0);
        assert_relative_eq!(x_max - x_min, z_max - z_min, epsilon = 1e-9);
        assert_relative_eq!(z_max - z_min, 700.0, epsilon = 1e-9);
        assert_eq!(track_view.centerline.len(), 201);
        assert_relative_eq!(track_view.road_width, 40.0);
    }
}
