use crate::core::aerial::AerialPars;
use crate::core::collision::CollisionPars;
use crate::core::culling::CullingPars;
use crate::core::hazards::HazardPars;
use crate::core::race::RacePars;
use crate::core::track::TrackPars;
use crate::core::vehicle::VehiclePars;
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// SimPars is used to store all other parameter structs. Every section may be omitted in the
/// parameter file, in which case its defaults are used.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SimPars {
    pub race_pars: RacePars,
    pub track_pars: TrackPars,
    pub vehicle_pars: VehiclePars,
    pub collision_pars: CollisionPars,
    pub aerial_pars: AerialPars,
    pub hazard_pars: HazardPars,
    pub culling_pars: CullingPars,
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    // open file
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;

    // read and parse parameter file content
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}
