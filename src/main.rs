mod args;
mod plot;

use std::f64::consts::PI;

use clap::{CommandFactory, Parser};
use tracing::{debug, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use uwb_das::matched_filter::{range_compress, CorrelationKernel};
use uwb_das::scene::{synthesize_baseband, GaussianPulse};
use uwb_das::utils::wrap_phase;
use uwb_das::{AntennaPositions, DelayMapCache, TimeSupport, VoxelGrid, VoxelIndex};

use args::{parse_axis, parse_positions, parse_target, DynError};
use plot::plot_slice_heatmap;

// Pulse is sampled over +/- this many sigma when building the kernel.
const KERNEL_SPAN_SIGMA: f64 = 6.0;

// RUST_LOG directives apply first; --debug then raises the default level.
fn log_filter(env: Option<EnvFilter>, debug: bool) -> EnvFilter {
    let filter = env.unwrap_or_else(|| EnvFilter::new("info"));
    if debug {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn init_logging(debug: bool) {
    let filter = log_filter(EnvFilter::try_from_default_env().ok(), debug);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<(), DynError> {
    if std::env::args_os().len() == 1 {
        args::Args::command().print_help()?;
        println!();
        return Ok(());
    }

    let args = args::Args::parse();
    init_logging(args.debug);

    if args.cpu == 0 {
        return Err("--cpu must be at least 1".into());
    }
    if args.samples < 2 {
        return Err("--samples must be at least 2".into());
    }
    if !args.fs.is_finite() || args.fs <= 0.0 {
        return Err("--fs must be positive".into());
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.cpu)
        .build_global()
        .map_err(|_| "Failed to initialise rayon thread pool")?;

    let grid = VoxelGrid::new(
        parse_axis(&args.x, "x")?,
        parse_axis(&args.y, "y")?,
        parse_axis(&args.z, "z")?,
    )?;
    let pos_tx = AntennaPositions::new(parse_positions(&args.tx, "tx")?)?;
    let pos_rx = AntennaPositions::new(parse_positions(&args.rx, "rx")?)?;
    let targets = args
        .targets
        .iter()
        .map(|t| parse_target(t))
        .collect::<Result<Vec<_>, _>>()?;

    let carrier_hz = args.freq * 1e9;
    let fs_hz = args.fs * 1e6;
    let time = TimeSupport::uniform(args.t0 * 1e-9, 1.0 / fs_hz, args.samples)?;
    let pulse = GaussianPulse::from_bandwidth(args.bandwidth * 1e6)?;

    let shape = grid.shape();
    info!(
        "grid {}x{}x{}, {} tx x {} rx, carrier {:.3} GHz",
        shape.nx(),
        shape.ny(),
        shape.nz(),
        pos_tx.len(),
        pos_rx.len(),
        args.freq
    );
    info!(
        "time support {:.3} .. {:.3} ns ({} samples)",
        time.first() * 1e9,
        time.last() * 1e9,
        time.len()
    );
    if targets.is_empty() {
        warn!("no --target given; the baseband is silent and the map will be zero");
    }

    let mut signal = synthesize_baseband(&targets, &pos_tx, &pos_rx, &time, carrier_hz, &pulse)?;

    if args.compress {
        let half = (KERNEL_SPAN_SIGMA * pulse.sigma() * fs_hz).ceil() as usize;
        let pulse_time =
            TimeSupport::uniform(-(half as f64) / fs_hz, 1.0 / fs_hz, 2 * half + 1)?;
        let kernel = CorrelationKernel::build(&pulse.sample(&pulse_time), &pulse_time, fs_hz)?;
        debug!(taps = kernel.len(), "matched filter ready");
        signal = range_compress(&signal, &kernel)?;
        info!("range compressed with a {}-tap matched filter", kernel.len());
    }

    let mut cache = DelayMapCache::new(grid.clone(), carrier_hz, pos_tx, pos_rx)?;
    let map = cache.beamformer()?.form(&signal, &time)?;

    let (min_val, max_val) = map
        .as_slice()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    info!("map range [{min_val:.6e}, {max_val:.6e}]");

    let Some((peak, peak_val)) = map.argmax() else {
        return Err("radar map has no finite values".into());
    };
    if let Some([px, py, pz]) = grid.point(peak) {
        info!(
            "peak {peak_val:.6e} at voxel ({}, {}, {}) = ({px:.4}, {py:.4}, {pz:.4}) m",
            peak.x, peak.y, peak.z
        );
    }

    // Expected carrier phase of each (tx, rx) echo from the peak voxel.
    if let Some(delays) = cache.beamformer()?.maps().delay.voxel_channels(peak) {
        let phases: Vec<String> = delays
            .iter()
            .map(|&d| format!("{:+.3}", wrap_phase(2.0 * PI * carrier_hz * d)))
            .collect();
        debug!("carrier phase at peak per channel (rad): [{}]", phases.join(", "));
    }
    for target in &targets {
        let [tx, ty, tz] = target.position;
        debug!("target at ({tx:.4}, {ty:.4}, {tz:.4}) m, amplitude {}", target.amplitude);
    }

    if let Some(path) = &args.plot {
        let slice: Vec<Vec<f64>> = (0..shape.nx())
            .map(|ix| {
                (0..shape.ny())
                    .map(|iy| map[VoxelIndex::new(ix, iy, peak.z)])
                    .collect()
            })
            .collect();
        let title = format!("DAS map, z = {:.3} m", grid.z()[peak.z]);
        let filename = path.to_string_lossy();
        plot_slice_heatmap(
            grid.x(),
            grid.y(),
            &slice,
            &title,
            &filename,
            "x [m]",
            "y [m]",
        )?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
