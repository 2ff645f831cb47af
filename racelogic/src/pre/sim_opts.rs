use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "racelogic",
    about = "An event-driven championship simulator for race series"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing (per-lap log output)
    #[clap(short, long)]
    pub debug: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the roster file (id,name,team,baseSpeed[,basePitTime[,consistency[,wetSkill]]])
    #[clap(short, long, default_value = "data/drivers.txt")]
    pub roster: PathBuf,

    /// Set path to the race event feed
    #[clap(short, long, default_value = "data/race_events.txt")]
    pub events: PathBuf,

    /// Set path to the simulation constants file (OPTIONAL: if not set, uses built-in defaults)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Set number of races to simulate (OPTIONAL: if not set, all races of the feed)
    #[clap(long)]
    pub races: Option<u32>,

    /// Set number of laps per race (OPTIONAL: if not set, uses race_laps of the constants)
    #[clap(short, long)]
    pub laps: Option<u32>,

    /// Set path of the season export, a .js target is wrapped for the dashboard
    #[clap(short, long, default_value = "dashboard/data.js")]
    pub output: PathBuf,

    /// Set seed for synthetic lap times (overrides the constants file)
    #[clap(short, long)]
    pub seed: Option<u64>,
}
