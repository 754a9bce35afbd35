//! FFT Utilities for the signal-recovery pipeline
//!
//! Thin wrapper around `rustfft` planner instances with a reusable
//! scratch buffer. The pipeline's block length is whatever the linear
//! convolution produced (`m + n - 1`), so the processor must accept
//! arbitrary sizes — no power-of-two restriction.
//!
//! The inverse transform applies the conventional `1/N` scaling, so
//! `ifft(fft(x)) == x` within floating tolerance.

use std::fmt;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner};

use crate::types::Complex;

/// FFT processor for a fixed block size.
pub struct FftProcessor {
    /// Transform size.
    size: usize,
    /// Forward FFT instance.
    fft_forward: Arc<dyn Fft<f64>>,
    /// Inverse FFT instance.
    fft_inverse: Arc<dyn Fft<f64>>,
    /// Scratch buffer shared by both directions.
    scratch: Vec<Complex>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    /// Create a processor for the given transform size.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "FFT size must be positive");

        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let fft_inverse = planner.plan_fft_inverse(size);
        let scratch_len = fft_forward
            .get_inplace_scratch_len()
            .max(fft_inverse.get_inplace_scratch_len());
        let scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        Self {
            size,
            fft_forward,
            fft_inverse,
            scratch,
        }
    }

    /// The configured transform size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward FFT of a complex block. Inputs shorter than the transform
    /// size are zero-padded.
    ///
    /// # Panics
    ///
    /// Panics if the input is longer than the transform size.
    pub fn fft(&mut self, input: &[Complex]) -> Vec<Complex> {
        assert!(
            input.len() <= self.size,
            "input length {} exceeds FFT size {}",
            input.len(),
            self.size
        );
        let mut buffer = input.to_vec();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.fft_forward
            .process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Forward FFT of a real-valued block, widened to complex and
    /// zero-padded to the transform size.
    pub fn fft_real(&mut self, input: &[f64]) -> Vec<Complex> {
        let complex: Vec<Complex> = input.iter().map(|&re| Complex::new(re, 0.0)).collect();
        self.fft(&complex)
    }

    /// Inverse FFT with `1/N` scaling.
    ///
    /// # Panics
    ///
    /// Panics if the input is longer than the transform size.
    pub fn ifft(&mut self, input: &[Complex]) -> Vec<Complex> {
        assert!(
            input.len() <= self.size,
            "input length {} exceeds FFT size {}",
            input.len(),
            self.size
        );
        let mut buffer = input.to_vec();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.fft_inverse
            .process_with_scratch(&mut buffer, &mut self.scratch);

        let scale = 1.0 / self.size as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
        buffer
    }
}
