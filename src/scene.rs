//! Ideal point-target echoes for driving the imager.

use std::f64::consts::{LN_2, PI};

use num_complex::Complex;
use rayon::prelude::*;
use tracing::debug;

use crate::beamformer::BasebandSignal;
use crate::delay_map::check_carrier;
use crate::error::{ImagingError, Result};
use crate::geom::{round_trip_delay, AntennaPositions};
use crate::time_align::TimeSupport;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointTarget {
    pub position: [f64; 3],
    pub amplitude: f64,
}

impl PointTarget {
    pub fn new(position: [f64; 3], amplitude: f64) -> Self {
        Self {
            position,
            amplitude,
        }
    }
}

/// Gaussian envelope `exp(-t^2 / (2 sigma^2))`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianPulse {
    sigma_s: f64,
}

impl GaussianPulse {
    pub fn new(sigma_s: f64) -> Result<Self> {
        if !sigma_s.is_finite() || sigma_s <= 0.0 {
            return Err(ImagingError::domain(format!(
                "pulse width must be positive, got {sigma_s}"
            )));
        }
        Ok(Self { sigma_s })
    }

    /// `bandwidth_hz` is the half-power width of the pulse spectrum.
    pub fn from_bandwidth(bandwidth_hz: f64) -> Result<Self> {
        if !bandwidth_hz.is_finite() || bandwidth_hz <= 0.0 {
            return Err(ImagingError::domain(format!(
                "pulse bandwidth must be positive, got {bandwidth_hz}"
            )));
        }
        Self::new(LN_2.sqrt() / (PI * bandwidth_hz))
    }

    pub fn sigma(&self) -> f64 {
        self.sigma_s
    }

    #[inline(always)]
    pub fn envelope(&self, t: f64) -> f64 {
        let u = t / self.sigma_s;
        (-0.5 * u * u).exp()
    }

    /// Envelope sampled on `time`, as complex baseband.
    pub fn sample(&self, time: &TimeSupport) -> Vec<Complex<f64>> {
        time.as_slice()
            .iter()
            .map(|&t| Complex::new(self.envelope(t), 0.0))
            .collect()
    }
}

/// Baseband echoes of `targets` for every `(tx, rx)` pair, sampled on `time`.
///
/// Each target contributes `amplitude * envelope(t - tau) * exp(i 2 pi f tau)`,
/// with the carrier phase sign the phase factor maps expect.
pub fn synthesize_baseband(
    targets: &[PointTarget],
    pos_tx: &AntennaPositions,
    pos_rx: &AntennaPositions,
    time: &TimeSupport,
    carrier_hz: f64,
    pulse: &GaussianPulse,
) -> Result<BasebandSignal> {
    check_carrier(carrier_hz)?;
    if let Some(bad) = targets
        .iter()
        .position(|t| t.position.iter().any(|v| !v.is_finite()) || !t.amplitude.is_finite())
    {
        return Err(ImagingError::domain(format!("target {bad} is not finite")));
    }

    let n_rx = pos_rx.len();
    let pairs: Vec<(usize, usize)> = (0..pos_tx.len())
        .flat_map(|t| (0..n_rx).map(move |r| (t, r)))
        .collect();
    debug!(
        targets = targets.len(),
        channels = pairs.len(),
        samples = time.len(),
        "synthesising point-target echoes"
    );

    let traces: Vec<Vec<Complex<f64>>> = pairs
        .par_iter()
        .map(|&(t, r)| {
            let tx = pos_tx.rows()[t];
            let rx = pos_rx.rows()[r];
            let echoes: Vec<(f64, Complex<f64>)> = targets
                .iter()
                .map(|target| {
                    let tau = round_trip_delay(target.position, tx, rx);
                    let phase = 2.0 * PI * carrier_hz * tau;
                    (tau, Complex::from_polar(target.amplitude, phase))
                })
                .collect();
            time.as_slice()
                .iter()
                .map(|&ts| {
                    echoes
                        .iter()
                        .map(|&(tau, rot)| rot * pulse.envelope(ts - tau))
                        .sum::<Complex<f64>>()
                })
                .collect()
        })
        .collect();

    BasebandSignal::from_traces(pos_tx.len(), n_rx, traces)
}
