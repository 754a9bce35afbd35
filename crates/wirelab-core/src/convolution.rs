//! Linear Convolution — tapped-delay-line channel application
//!
//! Direct-form linear convolution over the full output support. For a
//! signal of length `m` and a filter of length `n` the result has
//! exactly `m + n - 1` samples:
//!
//! ```text
//! y[k] = Σ_j x[k-j]·h[j]
//! ```
//!
//! The signal lengths in the teaching pipeline are tens to low hundreds
//! of samples, so the O(m·n) direct form is both the simplest and the
//! fastest option; the FFT only enters later, for equalization.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_core::convolution::convolve;
//!
//! let y = convolve(&[1.0, 2.0, 3.0], &[1.0, 0.5]);
//! assert_eq!(y.len(), 4);
//! assert_eq!(y, vec![1.0, 2.5, 4.0, 1.5]);
//! ```

/// Full linear convolution of `x` with `h`.
///
/// # Panics
///
/// Panics if either input is empty.
pub fn convolve(x: &[f64], h: &[f64]) -> Vec<f64> {
    assert!(!x.is_empty(), "convolution signal must not be empty");
    assert!(!h.is_empty(), "convolution filter must not be empty");

    let mut y = vec![0.0; x.len() + h.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        for (j, &hj) in h.iter().enumerate() {
            y[i + j] += xi * hj;
        }
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_output_length_invariant() {
        for (m, n) in [(1, 1), (5, 1), (1, 7), (70, 13), (128, 33)] {
            let x = vec![1.0; m];
            let h = vec![1.0; n];
            assert_eq!(convolve(&x, &h).len(), m + n - 1);
        }
    }

    #[test]
    fn test_identity_filter() {
        let x = [3.0, -1.0, 0.5, 2.0];
        let y = convolve(&x, &[1.0]);
        assert_eq!(y, x.to_vec());
    }

    #[test]
    fn test_unit_delay() {
        let y = convolve(&[1.0, 2.0, 3.0], &[0.0, 1.0]);
        assert_eq!(y, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_known_product() {
        // (1 + 2z⁻¹)(3 + 4z⁻¹) = 3 + 10z⁻¹ + 8z⁻²
        let y = convolve(&[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(y, vec![3.0, 10.0, 8.0]);
    }

    #[test]
    fn test_commutative() {
        let x = [1.0, -2.0, 0.5, 3.0, 1.5];
        let h = [0.25, 1.0, -0.75];
        let a = convolve(&x, &h);
        let b = convolve(&h, &x);
        assert_eq!(a.len(), b.len());
        for (u, v) in a.iter().zip(b.iter()) {
            assert_relative_eq!(u, v, epsilon = 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn test_empty_signal_panics() {
        convolve(&[], &[1.0]);
    }
}
