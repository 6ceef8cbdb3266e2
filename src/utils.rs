use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{ImagingError, Result};

pub struct FftHelper {
    len: usize,
    pub forward_c2c: Arc<dyn Fft<f64>>,
    pub inverse_c2c: Arc<dyn Fft<f64>>,
}

impl FftHelper {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward_c2c = planner.plan_fft_forward(len);
        let inverse_c2c = planner.plan_fft_inverse(len);
        Self {
            len,
            forward_c2c,
            inverse_c2c,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn forward(&self, buffer: &mut [Complex<f64>]) -> Result<()> {
        if buffer.len() != self.len {
            return Err(ImagingError::shape(
                "buffer length does not match FFT configuration for forward C2C",
            ));
        }
        self.forward_c2c.process(buffer);
        Ok(())
    }

    /// Inverse transform scaled by `1/len`, so `inverse(forward(x)) == x`.
    pub fn inverse(&self, spectrum: &mut [Complex<f64>]) -> Result<()> {
        if spectrum.len() != self.len {
            return Err(ImagingError::shape(
                "spectrum length does not match FFT configuration for inverse C2C",
            ));
        }
        self.inverse_c2c.process(spectrum);
        let scale = 1.0 / self.len as f64;
        for value in spectrum.iter_mut() {
            *value *= scale;
        }
        Ok(())
    }
}

/// Wraps `phase` into `[-pi, pi)`.
pub fn wrap_phase(phase: f64) -> f64 {
    (phase + PI).rem_euclid(2.0 * PI) - PI
}
