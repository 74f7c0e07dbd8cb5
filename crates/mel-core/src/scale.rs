//! Échelle mel (HTK, logarithme naturel).
//!
//! `mel = Q * ln(1 + hz / F0)` with `F0 = 700 Hz` and `Q = 1127`.

/// Break frequency of the mel warp, in hertz.
pub const MEL_BREAK_FREQUENCY_HERTZ: f64 = 700.0;

/// Scale factor of the natural-log mel warp.
pub const MEL_HIGH_FREQUENCY_Q: f64 = 1127.0;

/// Hz to Mel conversion.
///
/// # Example
/// ```
/// use mel_core::scale::hertz_to_mel;
/// assert_eq!(hertz_to_mel(0.0), 0.0);
/// assert!((hertz_to_mel(700.0) - 1127.0 * 2.0_f64.ln()).abs() < 1e-9);
/// ```
#[inline]
#[must_use]
pub fn hertz_to_mel(hz: f64) -> f64 {
    MEL_HIGH_FREQUENCY_Q * (1.0 + hz / MEL_BREAK_FREQUENCY_HERTZ).ln()
}

/// Mel to Hz conversion.
///
/// # Example
/// ```
/// use mel_core::scale::mel_to_hertz;
/// assert_eq!(mel_to_hertz(0.0), 0.0);
/// ```
#[inline]
#[must_use]
pub fn mel_to_hertz(mel: f64) -> f64 {
    MEL_BREAK_FREQUENCY_HERTZ * ((mel / MEL_HIGH_FREQUENCY_Q).exp() - 1.0)
}

/// `n` evenly spaced samples over `[start, stop]`, endpoint included.
///
/// `n == 1` yields `[start]`, `n == 0` yields nothing.
///
/// # Example
/// ```
/// use mel_core::scale::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
/// ```
#[must_use]
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            // Le dernier point doit tomber exactement sur `stop`.
            out[n - 1] = stop;
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_err(a: f64, b: f64) -> f64 {
        if b == 0.0 {
            a.abs()
        } else {
            (a - b).abs() / b.abs()
        }
    }

    #[test]
    fn round_trip_holds_below_one_hertz() {
        for hz in [1e-3, 0.05, 0.5] {
            let back = mel_to_hertz(hertz_to_mel(hz));
            assert!(rel_err(back, hz) < 1e-6, "{hz} Hz -> {back} Hz");
        }
        assert_eq!(rel_err(mel_to_hertz(hertz_to_mel(0.0)), 0.0), 0.0);
    }

    #[test]
    fn hertz_round_trip() {
        for i in 0..=2400 {
            let hz = f64::from(i) * 10.0;
            let back = mel_to_hertz(hertz_to_mel(hz));
            assert!(rel_err(back, hz) < 1e-6, "{hz} Hz -> {back} Hz");
        }
    }

    #[test]
    fn mel_round_trip() {
        let top = hertz_to_mel(24_000.0);
        for mel in linspace(0.0, top, 1000) {
            let back = hertz_to_mel(mel_to_hertz(mel));
            assert!(rel_err(back, mel) < 1e-6, "{mel} mel -> {back} mel");
        }
    }

    #[test]
    fn zero_hertz_is_zero_mel() {
        let mel = hertz_to_mel(0.0);
        assert!(mel.is_finite());
        assert_eq!(mel, 0.0);
    }

    #[test]
    fn mel_is_monotonic() {
        let mut prev = hertz_to_mel(0.0);
        for i in 1..=800 {
            let mel = hertz_to_mel(f64::from(i) * 10.0);
            assert!(mel > prev);
            prev = mel;
        }
    }

    #[test]
    fn linspace_hits_both_ends() {
        let pts = linspace(hertz_to_mel(0.0), hertz_to_mel(8000.0), 130);
        assert_eq!(pts.len(), 130);
        assert_eq!(pts[0], 0.0);
        assert_eq!(pts[129], hertz_to_mel(8000.0));
        assert!(pts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert_eq!(linspace(2.0, 5.0, 2), vec![2.0, 5.0]);
    }
}
