//! Matched-filter kernel construction and FFT range compression.

use num_complex::Complex;
use rayon::prelude::*;
use tracing::debug;

use crate::beamformer::BasebandSignal;
use crate::error::{ImagingError, Result};
use crate::interp::{check_paired, interp1_many, OutOfRange};
use crate::time_align::TimeSupport;
use crate::utils::FftHelper;

// Samples below rms / SUPPORT_RATIO do not belong to the pulse.
const SUPPORT_RATIO: f64 = 1e8;
// Resampled values at or below this are trimmed from the kernel ends.
const TRIM_LEVEL: f64 = 1e-9;

// Whole ADC periods needed to span `periods`, forgiving rounding just above
// an integer.
fn sample_count(periods: f64) -> usize {
    (periods - 1e-6).ceil().max(0.0) as usize
}

/// Time-reversed, conjugated copy of a pulse, sampled at the ADC rate.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationKernel {
    taps: Vec<Complex<f64>>,
    fadc_hz: f64,
}

impl CorrelationKernel {
    /// Resamples `pulse` (paired with `time`) at `fadc_hz` around the pulse
    /// centre and reverses it.
    pub fn build(pulse: &[Complex<f64>], time: &TimeSupport, fadc_hz: f64) -> Result<Self> {
        check_paired(time, pulse.len())?;
        if !fadc_hz.is_finite() || fadc_hz <= 0.0 {
            return Err(ImagingError::domain(format!(
                "ADC frequency must be positive, got {fadc_hz}"
            )));
        }

        let rms = (pulse.iter().map(|c| c.norm_sqr()).sum::<f64>() / pulse.len() as f64).sqrt();
        let threshold = rms / SUPPORT_RATIO;
        let n_min = pulse.iter().position(|c| c.norm() > threshold);
        let n_max = pulse.iter().rposition(|c| c.norm() > threshold);
        let (n_min, n_max) = match (n_min, n_max) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Err(ImagingError::domain("pulse has no support above zero")),
        };

        let times = time.as_slice();
        let n_length = n_max - n_min + 1;
        let t_half = if n_length % 2 == 0 {
            let n1 = (n_max + n_min - 1) / 2;
            let n2 = (n_max + n_min + 2) / 2;
            (times[n1] + times[n2]) / 2.0
        } else {
            times[(n_max + n_min) / 2]
        };

        // ADC grid through t_half, covering the pulse support.
        let ts = 1.0 / fadc_hz;
        let n_before = sample_count((t_half - times[n_min]) * fadc_hz);
        let n_after = sample_count((times[n_max] - t_half) * fadc_hz);
        let tadc: Vec<f64> = (0..n_before + n_after + 1)
            .map(|n| t_half + (n as f64 - n_before as f64) * ts)
            .collect();
        let resampled = interp1_many(time, pulse, &tadc, OutOfRange::Fill(Complex::new(0.0, 0.0)))?;

        let first = resampled.iter().position(|c| c.norm() > TRIM_LEVEL);
        let last = resampled.iter().rposition(|c| c.norm() > TRIM_LEVEL);
        let taps: Vec<Complex<f64>> = match (first, last) {
            (Some(lo), Some(hi)) => resampled[lo..=hi].iter().rev().map(|c| c.conj()).collect(),
            _ => {
                return Err(ImagingError::domain(
                    "pulse vanishes when resampled at the ADC frequency",
                ))
            }
        };

        debug!(
            taps = taps.len(),
            fadc_hz,
            "built correlation kernel from {} pulse samples",
            pulse.len()
        );
        Ok(Self { taps, fadc_hz })
    }

    pub fn taps(&self) -> &[Complex<f64>] {
        &self.taps
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn fadc_hz(&self) -> f64 {
        self.fadc_hz
    }

    /// Lag of the correlation peak in a full-length convolution.
    pub fn delay(&self) -> f64 {
        (self.taps.len() as f64 / 2.0) / self.fadc_hz
    }
}

/// Convolves every channel trace with `kernel`, keeping the centred part of
/// the full convolution so the output stays paired with the input time
/// support.
pub fn range_compress(signal: &BasebandSignal, kernel: &CorrelationKernel) -> Result<BasebandSignal> {
    let n = signal.n_samples();
    let k = kernel.len();
    let fft_len = (n + k - 1).next_power_of_two();
    let helper = FftHelper::new(fft_len);
    let offset = (k - 1) / 2;

    let mut kernel_spec = vec![Complex::new(0.0, 0.0); fft_len];
    kernel_spec[..k].copy_from_slice(kernel.taps());
    helper.forward(&mut kernel_spec)?;

    debug!(
        fft_len,
        channels = signal.channels().pairs(),
        "range compressing {n} samples per channel"
    );

    let mut out = signal.clone();
    out.par_traces_mut().try_for_each(|trace| -> Result<()> {
        let mut buffer = vec![Complex::new(0.0, 0.0); fft_len];
        buffer[..n].copy_from_slice(trace);
        helper.forward(&mut buffer)?;
        for (bin, &h) in buffer.iter_mut().zip(kernel_spec.iter()) {
            *bin *= h;
        }
        helper.inverse(&mut buffer)?;
        trace.copy_from_slice(&buffer[offset..offset + n]);
        Ok(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scene::GaussianPulse;

    #[test]
    fn symmetric_real_pulse_gives_reversed_taps_and_half_length_delay() {
        let fadc = 1e9;
        let time = TimeSupport::uniform(-4e-9, 1e-9, 9).unwrap();
        let pulse: Vec<Complex<f64>> = [0.0, 0.0, 1.0, 2.0, 4.0, 2.0, 1.0, 0.0, 0.0]
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        let kernel = CorrelationKernel::build(&pulse, &time, fadc).unwrap();
        let taps: Vec<f64> = kernel.taps().iter().map(|c| c.re).collect();
        assert_eq!(taps.len(), 5);
        for (a, b) in taps.iter().zip([1.0, 2.0, 4.0, 2.0, 1.0]) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((kernel.delay() - 2.5e-9).abs() < 1e-21);
    }

    #[test]
    fn complex_pulse_is_conjugated_and_reversed() {
        let time = TimeSupport::uniform(0.0, 1.0, 3).unwrap();
        let pulse = vec![
            Complex::new(1.0, 1.0),
            Complex::new(2.0, 0.5),
            Complex::new(3.0, -1.0),
        ];
        let kernel = CorrelationKernel::build(&pulse, &time, 1.0).unwrap();
        assert_eq!(
            kernel.taps(),
            &[
                Complex::new(3.0, 1.0),
                Complex::new(2.0, -0.5),
                Complex::new(1.0, -1.0)
            ]
        );
    }

    #[test]
    fn silent_pulse_and_bad_rate_are_rejected() {
        let time = TimeSupport::uniform(0.0, 1.0, 4).unwrap();
        let zeros = vec![Complex::new(0.0, 0.0); 4];
        let err = CorrelationKernel::build(&zeros, &time, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputDomain);
        let ones = vec![Complex::new(1.0, 0.0); 4];
        let err = CorrelationKernel::build(&ones, &time, 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputDomain);
        let err = CorrelationKernel::build(&ones[..3], &time, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputShape);
    }

    #[test]
    fn compressed_echo_peaks_at_echo_centre() {
        let fadc = 1e9;
        let pulse = GaussianPulse::new(3e-9).unwrap();
        let pulse_time = TimeSupport::uniform(-30e-9, 1e-9, 61).unwrap();
        let kernel = CorrelationKernel::build(&pulse.sample(&pulse_time), &pulse_time, fadc).unwrap();
        assert_eq!(kernel.len() % 2, 1);

        let time = TimeSupport::uniform(0.0, 1e-9, 200).unwrap();
        let echo: Vec<Complex<f64>> = time
            .as_slice()
            .iter()
            .map(|&t| Complex::new(0.0, 1.0) * pulse.envelope(t - 100e-9))
            .collect();
        let signal = BasebandSignal::single(echo).unwrap();
        let compressed = range_compress(&signal, &kernel).unwrap();
        assert_eq!(compressed.n_samples(), 200);

        let trace = compressed.trace(0, 0).unwrap();
        let peak = trace
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(peak, 100);
        // The carrier phase of the echo survives compression.
        assert!(trace[100].re.abs() < 1e-9 * trace[100].norm().max(1.0));
        assert!(trace[100].im > 0.0);
    }
}
