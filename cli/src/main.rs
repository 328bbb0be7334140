use anyhow::anyhow;
use arcadesim::core::handle_race::handle_race;
use arcadesim::post::race_result::{print_batch_summary, RaceResult};
use arcadesim::pre::check_sim_opts_pars::check_sim_opts_pars;
use arcadesim::pre::read_sim_pars::read_sim_pars;
use arcadesim::pre::sim_opts::SimOpts;
use clap::Parser;
use gui::core::gui::RacePlot;
use log::{info, warn, LevelFilter};
use rayon::prelude::*;
use std::cmp::min;
use std::thread;
use std::time::Instant;

// set maximum number of concurrently running jobs in case of running more than a single simulation
const MAX_NO_CONCURRENT_JOBS: u32 = 200;

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts = SimOpts::parse();

    // set up logging (debug output only if requested, RUST_LOG can still override it)
    env_logger::Builder::new()
        .filter_level(if sim_opts.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    // read simulation parameters and check them together with the options
    let sim_pars = read_sim_pars(sim_opts.parfile_path.as_path())?;
    check_sim_opts_pars(&sim_opts, &sim_pars)?;

    // create vector for the race results and simulate race(s)
    let mut race_results: Vec<RaceResult> = Vec::with_capacity(sim_opts.no_sim_runs as usize);

    info!(
        "Simulating {} laps on {} against {} AI vehicles at {:.0} fps",
        sim_pars.race_pars.tot_no_laps,
        sim_pars.track_pars.name,
        sim_pars.vehicle_pars.no_ai_vehicles,
        sim_pars.race_pars.frame_rate
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.gui {
        // NON-GUI CASE ----------------------------------------------------------------------------
        // without a GUI nobody can press keys, therefore the player always drives on autopilot
        let t_start = Instant::now();

        if sim_opts.no_sim_runs == 1 {
            // SINGLE THREAD -----------------------------------------------------------------------
            race_results.push(handle_race(&sim_pars, sim_opts.seed, true, None, None, 1.0)?);
        } else {
            // MULTIPLE THREADS --------------------------------------------------------------------
            let mut no_races_left = sim_opts.no_sim_runs;

            while no_races_left > 0 {
                // calculate number of simulation runs to execute in current loop
                let tmp_no_sim_runs = min(no_races_left, MAX_NO_CONCURRENT_JOBS);
                let first_run = sim_opts.no_sim_runs - no_races_left;

                // simulate the races and save the results (every run gets its own seed)
                let tmp_results = (first_run..first_run + tmp_no_sim_runs)
                    .into_par_iter()
                    .map(|run| {
                        let seed = sim_opts.seed.map(|seed| seed + run as u64);
                        handle_race(&sim_pars, seed, true, None, None, 1.0)
                    })
                    .collect::<anyhow::Result<Vec<RaceResult>>>()?;
                race_results.extend(tmp_results);

                // reduce remaining simulation runs
                no_races_left -= tmp_no_sim_runs;
            }
        }

        info!(
            "Execution time (total): {}ms",
            t_start.elapsed().as_millis()
        );
    } else {
        // GUI CASE --------------------------------------------------------------------------------
        // create channels for the communication between GUI and simulator (race states from the
        // simulator to the GUI, pressed keys from the GUI to the simulator)
        let (tx, rx) = flume::unbounded();
        let (tx_input, rx_input) = flume::unbounded();

        // create a separate thread for the simulator (executed in real-time) -> sim_opts and
        // sim_pars get moved and must therefore be copied to be still available afterwards
        let sim_opts_thread = sim_opts.clone();
        let sim_pars_thread = sim_pars.clone();

        let sim_thread = thread::spawn(move || {
            handle_race(
                &sim_pars_thread,
                sim_opts_thread.seed,
                sim_opts_thread.autopilot,
                Some(&tx),
                Some(&rx_input),
                sim_opts_thread.realtime_factor,
            )
        });

        // start GUI (must be done in the main thread)
        let gui = RacePlot::new(
            rx,
            tx_input,
            &sim_pars.race_pars,
            &sim_pars.track_pars,
        );
        let native_options = eframe::NativeOptions::default();
        eframe::run_native(
            "ARCADE-SIM",
            native_options,
            Box::new(|_cc| Ok(Box::new(gui))),
        )
        .map_err(|e| anyhow!("Failed to run the GUI: {}", e))?;

        // the simulator stops with an error if the window was closed before the race ended
        match sim_thread.join() {
            Ok(Ok(race_result)) => race_results.push(race_result),
            Ok(Err(e)) => warn!("Race was not completed: {:#}", e),
            Err(_) => anyhow::bail!("Simulator thread panicked!"),
        }
    }

    // POST-PROCESSING -----------------------------------------------------------------------------
    // print results
    match race_results.as_slice() {
        [] => {}
        [race_result] => race_result.print_standings(),
        _ => print_batch_summary(&race_results),
    }

    Ok(())
}
