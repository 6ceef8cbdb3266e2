//! Linear interpolation of complex samples over a [`TimeSupport`].

use num_complex::Complex;

use crate::error::{ImagingError, Result};
use crate::time_align::{Bracket, TimeSupport};

/// What to return for query times outside the support.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutOfRange {
    /// Hold the first or last sample.
    Clamp,
    /// Return a fixed value.
    Fill(Complex<f64>),
}

/// Exact at both ends: `w == 0` yields `c0` and `w == 1` yields `c1`.
#[inline(always)]
pub fn lerp(c0: Complex<f64>, c1: Complex<f64>, w: f64) -> Complex<f64> {
    c0 * (1.0 - w) + c1 * w
}

/// Sample value for an already computed bracket, clamping at both ends.
#[inline(always)]
pub fn sample_at<F>(bracket: Bracket, delay: f64, sample: F) -> Complex<f64>
where
    F: Fn(usize) -> Complex<f64>,
{
    match bracket {
        Bracket::BeforeFirst => sample(0),
        Bracket::AfterLast { index, .. } => sample(index),
        Bracket::Within { t_lo, t_hi, index } => {
            lerp(sample(index), sample(index + 1), (delay - t_lo) / (t_hi - t_lo))
        }
    }
}

pub fn check_paired(time: &TimeSupport, samples: usize) -> Result<()> {
    if time.len() != samples {
        return Err(ImagingError::shape(format!(
            "time support has {} samples but the signal has {}",
            time.len(),
            samples
        )));
    }
    Ok(())
}

/// Complex linear interpolation of `samples` (paired with `time`) at `query`.
pub fn interp1(
    time: &TimeSupport,
    samples: &[Complex<f64>],
    query: f64,
    out_of_range: OutOfRange,
) -> Result<Complex<f64>> {
    check_paired(time, samples.len())?;
    Ok(interp1_unchecked(time, samples, query, out_of_range))
}

/// As [`interp1`] over many query times.
pub fn interp1_many(
    time: &TimeSupport,
    samples: &[Complex<f64>],
    queries: &[f64],
    out_of_range: OutOfRange,
) -> Result<Vec<Complex<f64>>> {
    check_paired(time, samples.len())?;
    Ok(queries
        .iter()
        .map(|&q| interp1_unchecked(time, samples, q, out_of_range))
        .collect())
}

pub(crate) fn interp1_unchecked(
    time: &TimeSupport,
    samples: &[Complex<f64>],
    query: f64,
    out_of_range: OutOfRange,
) -> Complex<f64> {
    let bracket = time.bracket(query);
    match (bracket, out_of_range) {
        (Bracket::BeforeFirst | Bracket::AfterLast { .. }, OutOfRange::Fill(value)) => value,
        _ => sample_at(bracket, query, |i| samples[i]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    fn fixture() -> (TimeSupport, Vec<Complex<f64>>) {
        let time = TimeSupport::new(vec![0.0, 0.1, 0.3, 0.6]).unwrap();
        let samples = vec![c(1.0, -1.0), c(0.3, 0.7), c(-2.0, 0.25), c(0.1, 0.9)];
        (time, samples)
    }

    #[test]
    fn sample_times_return_samples_exactly() {
        let (time, samples) = fixture();
        for (k, &t) in time.as_slice().iter().enumerate() {
            assert_eq!(interp1(&time, &samples, t, OutOfRange::Clamp).unwrap(), samples[k]);
        }
    }

    #[test]
    fn midpoint_is_the_average() {
        let (time, samples) = fixture();
        let mid = interp1(&time, &samples, 0.2, OutOfRange::Clamp).unwrap();
        let expected = (samples[1] + samples[2]) * 0.5;
        assert!((mid - expected).norm() < 1e-12);
    }

    #[test]
    fn out_of_range_policy_is_honoured() {
        let (time, samples) = fixture();
        assert_eq!(interp1(&time, &samples, -1.0, OutOfRange::Clamp).unwrap(), samples[0]);
        assert_eq!(interp1(&time, &samples, 9.0, OutOfRange::Clamp).unwrap(), samples[3]);
        let zero = c(0.0, 0.0);
        let filled = interp1_many(&time, &samples, &[-1.0, 9.0], OutOfRange::Fill(zero)).unwrap();
        assert_eq!(filled, vec![zero, zero]);
    }

    #[test]
    fn length_mismatch_is_a_shape_error() {
        let (time, samples) = fixture();
        let err = interp1(&time, &samples[..3], 0.2, OutOfRange::Clamp).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InputShape);
    }
}
