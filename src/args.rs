use clap::Parser;
use std::path::PathBuf;

use uwb_das::scene::PointTarget;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_AXIS_X: &str = "-0.5:0.5:41";
pub const DEFAULT_AXIS_Y: &str = "-0.5:0.5:41";
pub const DEFAULT_AXIS_Z: &str = "0.5:1.5:41";
pub const DEFAULT_TX: &str = "-0.06,0,0;0.06,0,0";
pub const DEFAULT_RX: &str = "-0.02,0,0;0.02,0,0;0,-0.04,0;0,0.04,0";

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Delay-and-sum imaging of simulated UWB point targets",
    long_about = None,
    after_help = "Examples:\n  uwb_das --target 0.1,0,1\n  uwb_das --x -1:1:81 --z 0.5:2.5:81 --target 0.2,0,1.2 --target -0.3,0,1.8,0.5 --plot slice.png\n  uwb_das --freq 7.29 --tx 0,0,0 --rx 0.05,0,0 --target 0,0,1 --fs 2000 --samples 1024\n"
)]
pub struct Args {
    /// Grid x axis as start:stop:count (metres)
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_AXIS_X)]
    pub x: String,

    /// Grid y axis as start:stop:count (metres)
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_AXIS_Y)]
    pub y: String,

    /// Grid z axis as start:stop:count (metres)
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_AXIS_Z)]
    pub z: String,

    /// Carrier frequency in GHz
    #[arg(long, visible_alias = "frf", default_value_t = 7.29)]
    pub freq: f64,

    /// Transmit antennas as x,y,z triplets separated by ';' (metres)
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_TX)]
    pub tx: String,

    /// Receive antennas as x,y,z triplets separated by ';' (metres)
    #[arg(long, allow_hyphen_values = true, default_value = DEFAULT_RX)]
    pub rx: String,

    /// Point target as x,y,z[,amplitude]; repeat for several targets
    #[arg(long = "target", allow_hyphen_values = true)]
    pub targets: Vec<String>,

    /// Baseband sampling frequency in MHz
    #[arg(long = "fs", visible_alias = "sampling", default_value_t = 4000.0)]
    pub fs: f64,

    /// Number of baseband samples per channel
    #[arg(long, default_value_t = 512)]
    pub samples: usize,

    /// Delay of the first baseband sample in nanoseconds
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub t0: f64,

    /// Half-power pulse bandwidth in MHz
    #[arg(long, visible_alias = "bw", default_value_t = 500.0)]
    pub bandwidth: f64,

    /// Range-compress the baseband with the pulse matched filter before imaging
    #[arg(long)]
    pub compress: bool,

    /// Number of parallel worker threads
    #[arg(long, default_value_t = 2)]
    pub cpu: usize,

    /// Optional PNG with the x-y slice through the map peak
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Enable debug logging on top of any RUST_LOG directives
    #[arg(long)]
    pub debug: bool,
}

/// Parses `start:stop:count` into `count` evenly spaced coordinates.
pub fn parse_axis(spec: &str, label: &str) -> Result<Vec<f64>, DynError> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    match parts.len() {
        1 => Ok(vec![parts[0].parse::<f64>()?]),
        3 => {
            let start = parts[0].parse::<f64>()?;
            let stop = parts[1].parse::<f64>()?;
            let count = parts[2].parse::<usize>()?;
            if count == 0 {
                return Err(format!("{label} axis needs at least one point").into());
            }
            Ok(uwb_das::VoxelGrid::linspace(start, stop, count))
        }
        _ => Err(format!("{label} axis must be start:stop:count or a single value").into()),
    }
}

fn parse_values(spec: &str) -> Result<Vec<f64>, DynError> {
    Ok(spec
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()?)
}

/// Parses `x,y,z;x,y,z;...` into position rows.
pub fn parse_positions(spec: &str, label: &str) -> Result<Vec<[f64; 3]>, DynError> {
    let mut rows = Vec::new();
    for (idx, entry) in spec.split(';').filter(|e| !e.trim().is_empty()).enumerate() {
        let values = parse_values(entry)?;
        if values.len() != 3 {
            return Err(format!(
                "{label} entry {idx} must have 3 coordinates, received {}",
                values.len()
            )
            .into());
        }
        rows.push([values[0], values[1], values[2]]);
    }
    if rows.is_empty() {
        return Err(format!("{label} needs at least one antenna").into());
    }
    Ok(rows)
}

/// Parses `x,y,z[,amplitude]`; amplitude defaults to 1.
pub fn parse_target(spec: &str) -> Result<PointTarget, DynError> {
    let values = parse_values(spec)?;
    match values.len() {
        3 => Ok(PointTarget::new([values[0], values[1], values[2]], 1.0)),
        4 => Ok(PointTarget::new([values[0], values[1], values[2]], values[3])),
        n => Err(format!("target '{spec}' must have 3 or 4 values, received {n}").into()),
    }
}
