//! Signal Recovery Pipeline — convolve, corrupt, equalize, decode
//!
//! The equalization teaching module walks a bit string through a
//! five-stage pipeline and shows every intermediate artifact:
//!
//! ```text
//! Generate  bits → ±1 rectangular pulses x[n]
//! Channel   taps → finite impulse response h[n]
//! Convolve  y = x * h, then additive Gaussian noise
//! Transform Y(f), H(f), and the zero-forcing response E(f) = 1/H(f)
//! Equalize  x̂ = Re(IFFT(Y·E)), mid-symbol threshold decisions
//! ```
//!
//! Stages advance strictly forward; the only way back is [`RecoveryPipeline::reset`],
//! which clears every artifact. The zero-forcing equalizer is kept
//! deliberately naive: wherever the channel has a deep spectral null the
//! inversion amplifies noise, and showing that failure mode is the whole
//! point of the module. The epsilon floor below only keeps the arithmetic
//! finite; it does not rescue recovery quality.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_core::recovery_pipeline::{ChannelTap, RecoveryPipeline};
//!
//! let mut pipeline = RecoveryPipeline::with_seed(10, 42).unwrap();
//! pipeline.generate("10110").unwrap();
//! pipeline.build_channel(&[
//!     ChannelTap { delay: 0, amplitude: 1.0 },
//!     ChannelTap { delay: 5, amplitude: 0.5 },
//!     ChannelTap { delay: 12, amplitude: -0.3 },
//! ]).unwrap();
//! pipeline.transmit().unwrap();
//! pipeline.transform().unwrap();
//! let decoded = pipeline.equalize().unwrap();
//!
//! // Noiseless + invertible channel: perfect recovery
//! assert_eq!(decoded, "10110");
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::convolution::convolve;
use crate::fft_utils::FftProcessor;
use crate::types::{Complex, ModelError, ModelResult};

/// Magnitude floor below which the channel response is perturbed before
/// inversion, keeping `1/H` finite at spectral nulls.
const EQUALIZER_EPSILON: f64 = 1e-10;

/// Pipeline position. Each variant names the stage that will run next;
/// `Complete` means the decoded bits are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Generate,
    Channel,
    Convolve,
    Transform,
    Equalize,
    Complete,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Generate => "Generate",
            Stage::Channel => "Channel",
            Stage::Convolve => "Convolve",
            Stage::Transform => "Transform",
            Stage::Equalize => "Equalize",
            Stage::Complete => "Complete",
        }
    }
}

/// One channel tap: `amplitude` arriving `delay` samples late.
///
/// Multiple taps may share a delay; their amplitudes accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelTap {
    pub delay: usize,
    pub amplitude: f64,
}

/// Frequency-domain artifacts of the transform stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectra {
    /// Y(f): spectrum of the noisy received signal.
    pub signal: Vec<Complex>,
    /// H(f): spectrum of the zero-padded channel response.
    pub channel: Vec<Complex>,
    /// E(f) = 1/H(f) with the epsilon floor applied.
    pub equalizer: Vec<Complex>,
}

/// The five-stage recovery pipeline. Owns every per-stage artifact;
/// accessors expose them read-only (empty until their stage has run).
#[derive(Debug)]
pub struct RecoveryPipeline {
    samples_per_symbol: usize,
    noise_variance: f64,
    stage: Stage,
    bits: String,
    waveform: Vec<f64>,
    impulse_response: Vec<f64>,
    convolved: Vec<f64>,
    noisy: Vec<f64>,
    spectra: Spectra,
    recovered: Vec<f64>,
    decoded: String,
    rng: StdRng,
    seed: Option<u64>,
}

impl RecoveryPipeline {
    /// Create a pipeline with entropy-seeded noise.
    pub fn new(samples_per_symbol: usize) -> ModelResult<Self> {
        Self::build(samples_per_symbol, StdRng::from_entropy(), None)
    }

    /// Create a pipeline with a fixed noise seed for reproducible runs.
    pub fn with_seed(samples_per_symbol: usize, seed: u64) -> ModelResult<Self> {
        Self::build(samples_per_symbol, StdRng::seed_from_u64(seed), Some(seed))
    }

    fn build(samples_per_symbol: usize, rng: StdRng, seed: Option<u64>) -> ModelResult<Self> {
        if samples_per_symbol == 0 {
            return Err(ModelError::NonPositiveParameter {
                name: "samples_per_symbol",
                value: 0.0,
            });
        }
        Ok(Self {
            samples_per_symbol,
            noise_variance: 0.0,
            stage: Stage::Generate,
            bits: String::new(),
            waveform: Vec::new(),
            impulse_response: Vec::new(),
            convolved: Vec::new(),
            noisy: Vec::new(),
            spectra: Spectra::default(),
            recovered: Vec::new(),
            decoded: String::new(),
            rng,
            seed,
        })
    }

    /// The stage that will run next.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Configured symbol width in samples.
    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Current noise variance.
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    /// Adjust the noise variance. Accepted only while the pipeline still
    /// sits before the convolution stage — once the signal has passed
    /// through the channel the noise that corrupted it is fixed.
    pub fn set_noise_variance(&mut self, variance: f64) -> ModelResult<()> {
        if variance < 0.0 {
            return Err(ModelError::NegativeParameter {
                name: "noise_variance",
                value: variance,
            });
        }
        match self.stage {
            Stage::Generate | Stage::Channel | Stage::Convolve => {
                self.noise_variance = variance;
                Ok(())
            }
            _ => Err(ModelError::NoiseLocked),
        }
    }

    fn expect_stage(&self, expected: Stage) -> ModelResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ModelError::StageOrder {
                expected: expected.name(),
                actual: self.stage.name(),
            })
        }
    }

    /// Stage 1 — map bits to a rectangular-pulse waveform.
    ///
    /// Each bit becomes `+1`/`-1` held for `samples_per_symbol` samples,
    /// followed by a `2·samples_per_symbol` zero tail so the channel's
    /// ringing settles inside the analysis window.
    pub fn generate(&mut self, bits: &str) -> ModelResult<&[f64]> {
        self.expect_stage(Stage::Generate)?;
        if bits.is_empty() {
            return Err(ModelError::EmptyBitString);
        }
        for (offset, found) in bits.char_indices() {
            if found != '0' && found != '1' {
                return Err(ModelError::InvalidBit { offset, found });
            }
        }

        let sps = self.samples_per_symbol;
        let mut waveform = Vec::with_capacity(bits.len() * sps + 2 * sps);
        for bit in bits.chars() {
            let level = if bit == '1' { 1.0 } else { -1.0 };
            waveform.extend(std::iter::repeat(level).take(sps));
        }
        waveform.extend(std::iter::repeat(0.0).take(2 * sps));

        self.bits = bits.to_string();
        self.waveform = waveform;
        self.stage = Stage::Channel;
        Ok(&self.waveform)
    }

    /// Stage 2 — build the channel impulse response from its taps.
    ///
    /// The response spans `max(delay) + 1` samples; taps colliding at
    /// the same delay accumulate.
    pub fn build_channel(&mut self, taps: &[ChannelTap]) -> ModelResult<&[f64]> {
        self.expect_stage(Stage::Channel)?;
        if taps.is_empty() {
            return Err(ModelError::EmptyTaps);
        }

        let len = taps.iter().map(|t| t.delay).max().unwrap_or(0) + 1;
        let mut response = vec![0.0; len];
        for tap in taps {
            response[tap.delay] += tap.amplitude;
        }

        self.impulse_response = response;
        self.stage = Stage::Convolve;
        Ok(&self.impulse_response)
    }

    /// Stage 3 — pass the waveform through the channel and corrupt it.
    ///
    /// Full linear convolution (`m + n - 1` output samples), then
    /// per-sample Gaussian noise drawn by Box–Muller from two uniform
    /// draws, scaled by `sqrt(variance)`. Variance zero leaves the
    /// signal exactly as the channel produced it.
    pub fn transmit(&mut self) -> ModelResult<&[f64]> {
        self.expect_stage(Stage::Convolve)?;

        let convolved = convolve(&self.waveform, &self.impulse_response);
        let noisy = if self.noise_variance > 0.0 {
            let sigma = self.noise_variance.sqrt();
            convolved
                .iter()
                .map(|&s| s + sigma * gaussian(&mut self.rng))
                .collect()
        } else {
            convolved.clone()
        };

        self.convolved = convolved;
        self.noisy = noisy;
        self.stage = Stage::Transform;
        Ok(&self.noisy)
    }

    /// Stage 4 — move to the frequency domain and invert the channel.
    ///
    /// Both the noisy signal and the (zero-padded) channel response are
    /// transformed at the signal's length. Bins where `|H|` falls below
    /// the epsilon floor get epsilon added to the real part of the
    /// denominator before inversion, so `E = 1/H` stays finite at
    /// spectral nulls.
    pub fn transform(&mut self) -> ModelResult<&Spectra> {
        self.expect_stage(Stage::Transform)?;

        let mut fft = FftProcessor::new(self.noisy.len());
        let signal = fft.fft_real(&self.noisy);
        let channel = fft.fft_real(&self.impulse_response);
        let equalizer = channel
            .iter()
            .map(|&h| {
                let mut denom = h;
                if denom.norm() < EQUALIZER_EPSILON {
                    denom.re += EQUALIZER_EPSILON;
                }
                Complex::new(1.0, 0.0) / denom
            })
            .collect();

        self.spectra = Spectra {
            signal,
            channel,
            equalizer,
        };
        self.stage = Stage::Equalize;
        Ok(&self.spectra)
    }

    /// Stage 5 — equalize, return to the time domain, and decode.
    ///
    /// `X̂ = Y·E` pointwise, inverse FFT, discard the imaginary residue,
    /// then decide each bit at the midpoint sample of its symbol period
    /// with a zero threshold.
    pub fn equalize(&mut self) -> ModelResult<&str> {
        self.expect_stage(Stage::Equalize)?;

        let mut fft = FftProcessor::new(self.spectra.signal.len());
        let equalized: Vec<Complex> = self
            .spectra
            .signal
            .iter()
            .zip(self.spectra.equalizer.iter())
            .map(|(&y, &e)| y * e)
            .collect();
        let time = fft.ifft(&equalized);
        let recovered: Vec<f64> = time.iter().map(|c| c.re).collect();

        let sps = self.samples_per_symbol;
        let mut decoded = String::with_capacity(self.bits.len());
        for i in 0..self.bits.len() {
            let midpoint = ((i * sps) as f64 + sps as f64 / 2.0).round() as usize;
            decoded.push(if recovered[midpoint] > 0.0 { '1' } else { '0' });
        }

        self.recovered = recovered;
        self.decoded = decoded;
        self.stage = Stage::Complete;
        Ok(&self.decoded)
    }

    /// Discard every artifact and return to the generate stage. The
    /// noise variance setting survives; a fixed seed (if any) is
    /// reapplied so a re-run reproduces the same noise.
    pub fn reset(&mut self) {
        self.stage = Stage::Generate;
        self.bits.clear();
        self.waveform.clear();
        self.impulse_response.clear();
        self.convolved.clear();
        self.noisy.clear();
        self.spectra = Spectra::default();
        self.recovered.clear();
        self.decoded.clear();
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }

    // -- read-only artifact accessors (empty until their stage has run) --

    /// The input bit string.
    pub fn bits(&self) -> &str {
        &self.bits
    }

    /// x[n]: the transmitted rectangular-pulse waveform.
    pub fn waveform(&self) -> &[f64] {
        &self.waveform
    }

    /// h[n]: the channel impulse response.
    pub fn impulse_response(&self) -> &[f64] {
        &self.impulse_response
    }

    /// y[n]: the clean channel output before noise.
    pub fn convolved(&self) -> &[f64] {
        &self.convolved
    }

    /// The received signal after noise injection.
    pub fn noisy(&self) -> &[f64] {
        &self.noisy
    }

    /// Y(f), H(f), E(f).
    pub fn spectra(&self) -> &Spectra {
        &self.spectra
    }

    /// x̂[n]: the equalized time-domain estimate.
    pub fn recovered(&self) -> &[f64] {
        &self.recovered
    }

    /// The decoded bit string.
    pub fn decoded(&self) -> &str {
        &self.decoded
    }
}

/// One standard-normal sample via the Box–Muller transform.
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-30);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
