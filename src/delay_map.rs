//! Geometric delay map and delay-weighted phase factors.

use std::f64::consts::PI;

use num_complex::Complex;
use rayon::prelude::*;
use tracing::debug;

use crate::array::{ChannelArray, ChannelLayout, MapShape};
use crate::error::{ImagingError, Result};
use crate::geom::{round_trip_delay, AntennaPositions, VoxelGrid};

/// Round-trip delay in seconds per `(voxel, tx, rx)`.
pub type DelayMap = ChannelArray<f64>;

/// `delay * exp(i * 2 pi f * delay)` per `(voxel, tx, rx)`.
///
/// The delay magnitude stays folded into each factor: the beamformer weights
/// every contribution by its range and applies the carrier phase with one
/// multiply.
pub type PhaseFactorMap = ChannelArray<Complex<f64>>;

#[derive(Clone, Debug, PartialEq)]
pub struct FocusingMaps {
    pub delay: DelayMap,
    pub phase_factor: PhaseFactorMap,
}

/// `delay * (cos(phase) + i sin(phase))` with `phase = 2 pi f delay`.
#[inline(always)]
pub fn phase_factor(carrier_hz: f64, delay: f64) -> Complex<f64> {
    let phase = 2.0 * PI * carrier_hz * delay;
    Complex::new(delay * phase.cos(), delay * phase.sin())
}

pub fn check_carrier(carrier_hz: f64) -> Result<()> {
    if !carrier_hz.is_finite() || carrier_hz <= 0.0 {
        return Err(ImagingError::domain(format!(
            "carrier frequency must be a single positive value, got {carrier_hz}"
        )));
    }
    Ok(())
}

/// Builds the delay and phase factor maps for every voxel of `grid` and every
/// `(tx, rx)` pair. A single pair yields rank-3 maps.
pub fn build_delay_map(
    grid: &VoxelGrid,
    carrier_hz: f64,
    pos_tx: &AntennaPositions,
    pos_rx: &AntennaPositions,
) -> Result<FocusingMaps> {
    check_carrier(carrier_hz)?;
    let channels = ChannelLayout::new(pos_tx.len(), pos_rx.len())?;
    let grid_shape = grid.shape();
    let shape = MapShape::new(grid_shape, channels);
    let pairs = channels.pairs();
    let n_rx = channels.n_rx();

    debug!(
        dims = ?shape.dims(),
        carrier_hz,
        "building delay map for {} voxels x {} channel pairs",
        grid_shape.len(),
        pairs
    );

    let mut delays = vec![0.0f64; shape.len()];
    let mut factors = vec![Complex::new(0.0, 0.0); shape.len()];
    let (xs, ys, zs) = (grid.x(), grid.y(), grid.z());
    let tx_rows = pos_tx.rows();
    let rx_rows = pos_rx.rows();

    delays
        .par_chunks_mut(pairs)
        .zip(factors.par_chunks_mut(pairs))
        .enumerate()
        .for_each(|(offset, (delay_block, factor_block))| {
            let idx = grid_shape.voxel_at(offset);
            let voxel = [xs[idx.x], ys[idx.y], zs[idx.z]];
            for (t, &tx) in tx_rows.iter().enumerate() {
                for (r, &rx) in rx_rows.iter().enumerate() {
                    let delay = round_trip_delay(voxel, tx, rx);
                    delay_block[t * n_rx + r] = delay;
                    factor_block[t * n_rx + r] = phase_factor(carrier_hz, delay);
                }
            }
        });

    Ok(FocusingMaps {
        delay: ChannelArray::from_vec(shape, delays)?,
        phase_factor: ChannelArray::from_vec(shape, factors)?,
    })
}
