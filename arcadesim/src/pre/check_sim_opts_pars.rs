use crate::pre::read_sim_pars::SimPars;
use crate::pre::sim_opts::SimOpts;
use anyhow::Context;
use helpers::general::InputValueError;

/// check_sim_opts_pars assures that the inserted options and parameters are within reasonable
/// limits and raises an error if not.
pub fn check_sim_opts_pars(sim_opts: &SimOpts, sim_pars: &SimPars) -> anyhow::Result<()> {
    // PART 1: SIMULATION OPTIONS
    if sim_opts.no_sim_runs < 1 {
        return Err(InputValueError).context(format!(
            "no_sim_runs must be at least equal to one, but is {}!",
            sim_opts.no_sim_runs
        ));
    }

    if sim_opts.gui && sim_opts.no_sim_runs != 1 {
        return Err(InputValueError)
            .context("If gui is activated, no_sim_runs must be equal to one!");
    }

    if sim_opts.gui && !(0.1 <= sim_opts.realtime_factor && sim_opts.realtime_factor <= 100.0) {
        return Err(InputValueError).context(format!(
            "realtime_factor is {:.3}, which is not within the reasonable range of [0.1, 100.0]!",
            sim_opts.realtime_factor
        ));
    }

    check_sim_pars(sim_pars)
}

/// check_sim_pars checks the simulation parameters only (used if no options are given, e.g. in
/// tests).
pub fn check_sim_pars(sim_pars: &SimPars) -> anyhow::Result<()> {
    // PART 2: SIMULATION PARAMETERS
    // RACE ----------------------------------------------------------------------------------------
    let race_pars = &sim_pars.race_pars;

    if !(30.0 <= race_pars.frame_rate && race_pars.frame_rate <= 240.0) {
        return Err(InputValueError).context(format!(
            "frame_rate is {:.1}Hz, which is not within the reasonable range of [30.0, 240.0]Hz!",
            race_pars.frame_rate
        ));
    }

    if race_pars.tot_no_laps < 1 {
        return Err(InputValueError).context("tot_no_laps must be at least equal to one!");
    }

    if race_pars.progress_sample_interval < 1 {
        return Err(InputValueError)
            .context("progress_sample_interval must be at least equal to one!");
    }

    if race_pars.invincibility_duration < 0.0
        || race_pars.countdown_delay < 0.0
        || race_pars.countdown_step <= 0.0
    {
        return Err(InputValueError).context(
            "invincibility_duration and countdown_delay must not be negative, countdown_step must \
            be positive!",
        );
    }

    if race_pars.max_race_time <= 0.0 {
        return Err(InputValueError).context(format!(
            "max_race_time is {:.1}s, but must be positive!",
            race_pars.max_race_time
        ));
    }

    // TRACK ---------------------------------------------------------------------------------------
    let track_pars = &sim_pars.track_pars;

    if track_pars.no_points < 20 {
        return Err(InputValueError).context(format!(
            "The track must consist of at least 20 points, but no_points is {}!",
            track_pars.no_points
        ));
    }

    if track_pars.search_stride < 1 || track_pars.search_stride >= track_pars.no_points {
        return Err(InputValueError)
            .context("search_stride is not within the required range [1, no_points)!");
    }

    if !(0.0 < track_pars.start_section_frac && track_pars.start_section_frac < 1.0) {
        return Err(InputValueError).context(format!(
            "start_section_frac is {:.3}, which is not within the required range (0.0, 1.0)!",
            track_pars.start_section_frac
        ));
    }

    if track_pars.straight_length <= 0.0
        || track_pars.curve_radius <= 0.0
        || track_pars.road_width <= 0.0
    {
        return Err(InputValueError)
            .context("straight_length, curve_radius and road_width must be positive!");
    }

    // VEHICLES ------------------------------------------------------------------------------------
    let vehicle_pars = &sim_pars.vehicle_pars;

    if vehicle_pars.no_ai_vehicles > 0 && vehicle_pars.ai_liveries.is_empty() {
        return Err(InputValueError)
            .context("At least one AI livery must be given if there are AI vehicles!");
    }

    if vehicle_pars.max_health <= 0.0 {
        return Err(InputValueError).context(format!(
            "max_health is {:.1}, but must be positive!",
            vehicle_pars.max_health
        ));
    }

    check_range(vehicle_pars.ai_max_velocity_range, "ai_max_velocity_range")?;
    check_range(vehicle_pars.ai_skill_range, "ai_skill_range")?;

    let nitro_pars = &vehicle_pars.nitro_pars;

    if nitro_pars.boost_duration <= 0.0 || nitro_pars.cooldown_duration <= 0.0 {
        return Err(InputValueError)
            .context("Nitro boost_duration and cooldown_duration must be positive!");
    }

    if !(0.0..=1.0).contains(&nitro_pars.ai_activation_prob) {
        return Err(InputValueError)
            .context("Nitro ai_activation_prob is not within the required range [0.0, 1.0]!");
    }

    for livery in vehicle_pars.ai_liveries.iter().chain([&vehicle_pars.player]) {
        if livery.color.parse::<css_color_parser::Color>().is_err() {
            return Err(InputValueError).context(format!(
                "The color {} of vehicle {} is not a valid hex color!",
                livery.color, livery.name
            ));
        }
    }

    // AERIAL THREATS ------------------------------------------------------------------------------
    let aerial_pars = &sim_pars.aerial_pars;

    check_range(aerial_pars.chase_height_range, "chase_height_range")?;
    check_range(aerial_pars.fire_cooldown_range, "fire_cooldown_range")?;

    if !(0.0..=1.0).contains(&aerial_pars.relinquish_prob)
        || !(0.0..=1.0).contains(&aerial_pars.homing_blend)
    {
        return Err(InputValueError).context(
            "relinquish_prob and homing_blend must be within the required range [0.0, 1.0]!",
        );
    }

    // HAZARDS -------------------------------------------------------------------------------------
    let hazard_pars = &sim_pars.hazard_pars;

    if hazard_pars.heal_range[0] > hazard_pars.heal_range[1] {
        return Err(InputValueError).context(format!(
            "The minimum of heal_range ({}) exceeds its maximum ({})!",
            hazard_pars.heal_range[0], hazard_pars.heal_range[1]
        ));
    }

    if !(0.0..=1.0).contains(&hazard_pars.health_prob) {
        return Err(InputValueError)
            .context("health_prob is not within the required range [0.0, 1.0]!");
    }

    // CULLING -------------------------------------------------------------------------------------
    let culling_pars = &sim_pars.culling_pars;

    if !(0.0 < culling_pars.camera_blend_ground && culling_pars.camera_blend_ground <= 1.0)
        || !(0.0 < culling_pars.camera_blend_height && culling_pars.camera_blend_height <= 1.0)
    {
        return Err(InputValueError)
            .context("The camera blend factors must be within the range (0.0, 1.0]!");
    }

    Ok(())
}

fn check_range(range: [f64; 2], name: &str) -> anyhow::Result<()> {
    if range[0] > range[1] {
        return Err(InputValueError).context(format!(
            "The minimum of {} ({:.3}) exceeds its maximum ({:.3})!",
            name, range[0], range[1]
        ));
    }
    Ok(())
}
