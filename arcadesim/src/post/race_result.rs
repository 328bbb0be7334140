use crate::core::race::RacePhase;
use helpers::general::ordinal_suffix;
use std::collections::BTreeMap;
use std::fmt::Write;

/// StandingsEntry contains the final state of a vehicle for post-processing the results.
#[derive(Debug, Clone)]
pub struct StandingsEntry {
    pub rank: usize,
    pub name: String,
    pub is_player: bool,
    pub lap: u32,
    pub track_progress: usize,
    pub health: f64,
    pub destroyed: bool,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Clone)]
pub struct RaceResult {
    pub track_name: String,
    pub tot_no_laps: u32,
    pub outcome: RacePhase,
    pub race_time: f64,
    pub no_frames: u64,
    pub standings: Vec<StandingsEntry>,
}

impl RaceResult {
    pub fn player_rank(&self) -> Option<usize> {
        self.standings
            .iter()
            .find(|entry| entry.is_player)
            .map(|entry| entry.rank)
    }

    /// outcome_label returns a short description of how the race ended.
    pub fn outcome_label(&self) -> String {
        match &self.outcome {
            RacePhase::Won => String::from("won"),
            RacePhase::Lost(source) => format!("lost ({})", source.title()),
            RacePhase::RaceOver { winner, .. } => format!("race over ({} won)", winner),
            RacePhase::Countdown { .. } | RacePhase::Racing => String::from("unfinished"),
        }
    }

    /// print_standings prints the final standings to the console output.
    pub fn print_standings(&self) {
        let mut tmp_string = String::new();

        writeln!(
            &mut tmp_string,
            "pos, {:10}, lap, prog, health, status",
            "name"
        )
        .unwrap();

        for entry in self.standings.iter() {
            let status = if entry.destroyed {
                "eliminated"
            } else if entry.lap > self.tot_no_laps {
                "finished"
            } else {
                "running"
            };

            writeln!(
                &mut tmp_string,
                "{:2}{}, {:10}, {:3}, {:4}, {:6.1}, {}{}",
                entry.rank,
                ordinal_suffix(entry.rank),
                entry.name,
                entry.lap.min(self.tot_no_laps),
                entry.track_progress,
                entry.health,
                status,
                if entry.is_player { " (player)" } else { "" }
            )
            .unwrap();
        }

        println!(
            "RESULT: {} on {} after {:.3}s ({} frames)",
            self.outcome_label(),
            self.track_name,
            self.race_time,
            self.no_frames
        );
        println!("{}", tmp_string);
    }
}

/// print_batch_summary prints how often each outcome occurred in a batch of races, and the average
/// rank of the player.
pub fn print_batch_summary(race_results: &[RaceResult]) {
    let mut outcome_counts: BTreeMap<String, u32> = BTreeMap::new();

    for race_result in race_results.iter() {
        let key = match &race_result.outcome {
            RacePhase::Lost(source) => format!("lost ({})", source.title()),
            RacePhase::RaceOver { .. } => String::from("race over"),
            _ => race_result.outcome_label(),
        };
        *outcome_counts.entry(key).or_insert(0) += 1;
    }

    let ranks: Vec<usize> = race_results
        .iter()
        .filter_map(|race_result| race_result.player_rank())
        .collect();

    println!("RESULT: Summary of {} races", race_results.len());

    for (outcome, count) in outcome_counts.iter() {
        println!("{:>20}: {}", outcome, count);
    }

    if !ranks.is_empty() {
        println!(
            "{:>20}: {:.2}",
            "avg. player rank",
            ranks.iter().sum::<usize>() as f64 / ranks.len() as f64
        );
    }
}
