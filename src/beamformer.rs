//! Delay-and-sum beamformer.
//!
//! Every voxel picks, for each `(tx, rx)` pair, the baseband sample at the
//! pair's round-trip delay and projects it onto the expected carrier phase:
//! `Re(sample * conj(phase_factor))`. The projections are summed over all
//! pairs into one real value per voxel.

use num_complex::Complex;
use rayon::prelude::*;
use tracing::debug;

use crate::array::{ChannelLayout, GridShape, MapShape, VoxelArray};
use crate::delay_map::{DelayMap, FocusingMaps, PhaseFactorMap};
use crate::error::{ImagingError, Result};
use crate::interp::{check_paired, interp1_unchecked, sample_at, OutOfRange};
use crate::time_align::TimeSupport;

/// Real-valued reflectivity over the voxel grid.
pub type RadarMap = VoxelArray<f64>;

/// Complex baseband samples indexed `[time, tx, rx]`.
///
/// Stored as one contiguous trace per channel pair. A single pair is the
/// plain-sequence form.
#[derive(Clone, Debug, PartialEq)]
pub struct BasebandSignal {
    n_samples: usize,
    channels: ChannelLayout,
    traces: Vec<Complex<f64>>,
}

impl BasebandSignal {
    pub fn single(samples: Vec<Complex<f64>>) -> Result<Self> {
        if samples.is_empty() {
            return Err(ImagingError::shape("baseband signal has no samples"));
        }
        Ok(Self {
            n_samples: samples.len(),
            channels: ChannelLayout::SINGLE,
            traces: samples,
        })
    }

    /// `data` is row-major `[time][tx][rx]`, i.e. `n_samples * n_tx * n_rx`
    /// values with `rx` fastest.
    pub fn from_time_major(
        n_samples: usize,
        n_tx: usize,
        n_rx: usize,
        data: &[Complex<f64>],
    ) -> Result<Self> {
        let channels = ChannelLayout::new(n_tx, n_rx)?;
        if n_samples == 0 {
            return Err(ImagingError::shape("baseband signal has no samples"));
        }
        let pairs = channels.pairs();
        if data.len() != n_samples * pairs {
            return Err(ImagingError::shape(format!(
                "baseband of shape ({n_samples}, {n_tx}, {n_rx}) needs {} values, got {}",
                n_samples * pairs,
                data.len()
            )));
        }
        let mut traces = vec![Complex::new(0.0, 0.0); data.len()];
        for (n, frame) in data.chunks_exact(pairs).enumerate() {
            for (pair, &value) in frame.iter().enumerate() {
                traces[pair * n_samples + n] = value;
            }
        }
        Ok(Self {
            n_samples,
            channels,
            traces,
        })
    }

    /// One trace per `(tx, rx)` pair, `tx` major.
    pub fn from_traces(n_tx: usize, n_rx: usize, traces: Vec<Vec<Complex<f64>>>) -> Result<Self> {
        let channels = ChannelLayout::new(n_tx, n_rx)?;
        if traces.len() != channels.pairs() {
            return Err(ImagingError::shape(format!(
                "expected {} channel traces for {n_tx} x {n_rx} antennas, got {}",
                channels.pairs(),
                traces.len()
            )));
        }
        let n_samples = traces[0].len();
        if n_samples == 0 {
            return Err(ImagingError::shape("baseband signal has no samples"));
        }
        if let Some(bad) = traces.iter().position(|t| t.len() != n_samples) {
            return Err(ImagingError::shape(format!(
                "trace {bad} has {} samples, expected {n_samples}",
                traces[bad].len()
            )));
        }
        Ok(Self {
            n_samples,
            channels,
            traces: traces.into_iter().flatten().collect(),
        })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn channels(&self) -> ChannelLayout {
        self.channels
    }

    pub fn trace(&self, tx: usize, rx: usize) -> Option<&[Complex<f64>]> {
        if tx >= self.channels.n_tx() || rx >= self.channels.n_rx() {
            return None;
        }
        let start = (tx * self.channels.n_rx() + rx) * self.n_samples;
        Some(&self.traces[start..start + self.n_samples])
    }

    pub fn get(&self, time: usize, tx: usize, rx: usize) -> Option<Complex<f64>> {
        self.trace(tx, rx)?.get(time).copied()
    }

    pub fn traces(&self) -> std::slice::ChunksExact<'_, Complex<f64>> {
        self.traces.chunks_exact(self.n_samples)
    }

    pub(crate) fn par_traces_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = &mut [Complex<f64>]> + '_ {
        self.traces.par_chunks_exact_mut(self.n_samples)
    }

    pub fn is_zero(&self) -> bool {
        self.traces.iter().all(|c| c.re == 0.0 && c.im == 0.0)
    }
}

pub fn check_maps(delay: &DelayMap, phase_factor: &PhaseFactorMap) -> Result<()> {
    if delay.shape() != phase_factor.shape() {
        return Err(ImagingError::mismatch(format!(
            "phase factor map shape {:?} not consistent with delay map shape {:?}",
            phase_factor.dims(),
            delay.dims()
        )));
    }
    if let Some(pos) = delay
        .as_slice()
        .iter()
        .position(|d| !d.is_finite() || *d < 0.0)
    {
        return Err(ImagingError::domain(format!(
            "delay map entry {pos} is {}, delays must be finite and non-negative",
            delay.as_slice()[pos]
        )));
    }
    Ok(())
}

pub fn check_signal(shape: MapShape, signal: &BasebandSignal, time: &TimeSupport) -> Result<()> {
    check_paired(time, signal.n_samples())?;
    let map_channels = shape.channels;
    let signal_channels = signal.channels();
    if map_channels != signal_channels {
        return Err(ImagingError::mismatch(format!(
            "delay map of rank {} with dims {:?} not consistent with baseband data of {} tx x {} rx",
            shape.rank(),
            shape.dims(),
            signal_channels.n_tx(),
            signal_channels.n_rx()
        )));
    }
    Ok(())
}

fn image(
    delay: &DelayMap,
    phase_factor: &PhaseFactorMap,
    signal: &BasebandSignal,
    time: &TimeSupport,
) -> Result<RadarMap> {
    let shape = delay.shape();
    let grid: GridShape = shape.grid;
    let mut out = RadarMap::filled(grid, 0.0);

    debug!(
        dims = ?shape.dims(),
        samples = signal.n_samples(),
        "delay-and-sum over {} voxels",
        grid.len()
    );

    if shape.channels.is_single() {
        let samples = &signal.traces[..signal.n_samples];
        out.as_mut_slice()
            .par_iter_mut()
            .zip(delay.as_slice().par_iter())
            .zip(phase_factor.as_slice().par_iter())
            .for_each(|((slot, &d), &pf)| {
                let cin = interp1_unchecked(time, samples, d, OutOfRange::Clamp);
                *slot = cin.re * pf.re + cin.im * pf.im;
            });
    } else {
        let pairs = shape.channels.pairs();
        let n_samples = signal.n_samples();
        let traces = signal.traces.as_slice();
        out.as_mut_slice()
            .par_iter_mut()
            .zip(delay.as_slice().par_chunks_exact(pairs))
            .zip(phase_factor.as_slice().par_chunks_exact(pairs))
            .for_each(|((slot, delays), factors)| {
                let mut out_sample = 0.0;
                // Pair order is tx major, rx minor, matching the map layout.
                for (pair, (&d, &pf)) in delays.iter().zip(factors.iter()).enumerate() {
                    let trace = &traces[pair * n_samples..(pair + 1) * n_samples];
                    let cin = sample_at(time.bracket(d), d, |i| trace[i]);
                    out_sample += cin.re * pf.re + cin.im * pf.im;
                }
                *slot = out_sample;
            });
    }

    Ok(out)
}

/// One-shot delay-and-sum: validates every input, then images.
pub fn delay_and_sum(
    signal: &BasebandSignal,
    time: &TimeSupport,
    delay: &DelayMap,
    phase_factor: &PhaseFactorMap,
) -> Result<RadarMap> {
    check_maps(delay, phase_factor)?;
    check_signal(delay.shape(), signal, time)?;
    image(delay, phase_factor, signal, time)
}

/// Holds validated focusing maps and images successive frames against them.
#[derive(Clone, Debug)]
pub struct Beamformer {
    maps: FocusingMaps,
}

impl Beamformer {
    pub fn new(maps: FocusingMaps) -> Result<Self> {
        check_maps(&maps.delay, &maps.phase_factor)?;
        Ok(Self { maps })
    }

    pub fn shape(&self) -> MapShape {
        self.maps.delay.shape()
    }

    pub fn maps(&self) -> &FocusingMaps {
        &self.maps
    }

    pub fn form(&self, signal: &BasebandSignal, time: &TimeSupport) -> Result<RadarMap> {
        check_signal(self.shape(), signal, time)?;
        image(&self.maps.delay, &self.maps.phase_factor, signal, time)
    }
}
