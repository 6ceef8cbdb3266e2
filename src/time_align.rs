//! Sample-time support and bracketing search.

use crate::error::{ImagingError, Result};

/// Strictly ascending, finite sample times, at least two of them.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSupport {
    times: Vec<f64>,
}

/// Where a delay falls on a [`TimeSupport`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bracket {
    /// Before the first sample; callers use sample 0.
    BeforeFirst,
    /// After the last sample; callers use sample `index == N - 1`.
    AfterLast { t: f64, index: usize },
    /// `times[index] = t_lo <= delay <= t_hi = times[index + 1]`
    Within { t_lo: f64, t_hi: f64, index: usize },
}

impl Bracket {
    /// `(t_lo, t_hi, index_lo)`, with `None` for the before-first sentinel.
    pub fn as_tuple(&self) -> Option<(f64, f64, usize)> {
        match *self {
            Bracket::BeforeFirst => None,
            Bracket::AfterLast { t, index } => Some((t, t, index)),
            Bracket::Within { t_lo, t_hi, index } => Some((t_lo, t_hi, index)),
        }
    }
}

impl TimeSupport {
    pub fn new(times: Vec<f64>) -> Result<Self> {
        if times.len() < 2 {
            return Err(ImagingError::shape(format!(
                "time support needs at least 2 samples, got {}",
                times.len()
            )));
        }
        if let Some(pos) = times.iter().position(|t| !t.is_finite()) {
            return Err(ImagingError::domain(format!("time[{pos}] is not finite")));
        }
        if let Some(pos) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ImagingError::domain(format!(
                "time support must be strictly ascending: time[{}] = {} >= time[{}] = {}",
                pos,
                times[pos],
                pos + 1,
                times[pos + 1]
            )));
        }
        Ok(Self { times })
    }

    /// `count` samples starting at `start`, spaced by `step`.
    pub fn uniform(start: f64, step: f64, count: usize) -> Result<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ImagingError::domain(format!(
                "sample step must be positive, got {step}"
            )));
        }
        Self::new((0..count).map(|n| start + step * n as f64).collect())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    pub fn first(&self) -> f64 {
        self.times[0]
    }

    pub fn last(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Locates `delay` by halving the candidate window, never by scanning.
    pub fn bracket(&self, delay: f64) -> Bracket {
        let times = &self.times;
        let mut i_min = 0usize;
        let mut i_max = times.len() - 1;
        let mut t_min = times[i_min];
        let mut t_max = times[i_max];

        if delay > t_max {
            return Bracket::AfterLast {
                t: t_max,
                index: i_max,
            };
        }
        if delay < t_min {
            return Bracket::BeforeFirst;
        }

        while i_max - i_min > 1 {
            let i_half = (i_min + i_max) >> 1;
            let t_half = times[i_half];
            if delay < t_half {
                i_max = i_half;
                t_max = t_half;
            } else {
                i_min = i_half;
                t_min = t_half;
            }
        }

        Bracket::Within {
            t_lo: t_min,
            t_hi: t_max,
            index: i_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn support() -> TimeSupport {
        TimeSupport::new(vec![0.0, 1.0, 2.5, 3.0, 7.0, 8.0]).unwrap()
    }

    #[test]
    fn interior_delay_is_bracketed() {
        let ts = support();
        assert_eq!(
            ts.bracket(2.7),
            Bracket::Within {
                t_lo: 2.5,
                t_hi: 3.0,
                index: 2
            }
        );
        assert_eq!(ts.bracket(7.5).as_tuple(), Some((7.0, 8.0, 4)));
    }

    #[test]
    fn exact_sample_time_starts_its_own_bracket() {
        let ts = support();
        for (k, &t) in ts.as_slice().iter().enumerate().take(ts.len() - 1) {
            assert_eq!(ts.bracket(t).as_tuple().map(|b| (b.0, b.2)), Some((t, k)));
        }
        // The last sample closes the final bracket.
        assert_eq!(ts.bracket(8.0).as_tuple(), Some((7.0, 8.0, 4)));
    }

    #[test]
    fn boundaries_clamp_without_extrapolation() {
        let ts = support();
        assert_eq!(ts.bracket(8.0001), Bracket::AfterLast { t: 8.0, index: 5 });
        assert_eq!(ts.bracket(8.0001).as_tuple(), Some((8.0, 8.0, 5)));
        assert_eq!(ts.bracket(-0.5), Bracket::BeforeFirst);
        assert_eq!(ts.bracket(-0.5).as_tuple(), None);
    }

    #[test]
    fn two_sample_support_works() {
        let ts = TimeSupport::new(vec![1.0, 2.0]).unwrap();
        assert_eq!(ts.bracket(1.5).as_tuple(), Some((1.0, 2.0, 0)));
    }

    #[test]
    fn search_agrees_with_linear_scan() {
        let ts = TimeSupport::new((0..257).map(|n| (n as f64).powf(1.3)).collect()).unwrap();
        let times = ts.as_slice();
        let mut query = 0.0;
        while query < ts.last() {
            let expected = times.windows(2).rposition(|w| w[0] <= query).unwrap();
            let (_, _, index) = ts.bracket(query).as_tuple().unwrap();
            assert_eq!(index, expected, "query {query}");
            query += 0.37;
        }
    }

    #[test]
    fn invalid_supports_are_rejected() {
        assert_eq!(TimeSupport::new(vec![0.0]).unwrap_err().kind(), ErrorKind::InputShape);
        assert_eq!(
            TimeSupport::new(vec![0.0, 1.0, 1.0]).unwrap_err().kind(),
            ErrorKind::InputDomain
        );
        assert_eq!(
            TimeSupport::new(vec![0.0, 2.0, 1.0]).unwrap_err().kind(),
            ErrorKind::InputDomain
        );
        assert!(TimeSupport::uniform(0.0, 0.0, 4).is_err());
    }
}
