use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use tract_onnx::prelude::tract_ndarray::Array2;

use crate::{Error, FeatureTransform, LfccConfig};

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// Linear-frequency cepstral coefficients.
///
/// Each frame is a centred, Hann-windowed FFT whose power spectrum goes
/// through a bank of triangular filters spaced linearly up to Nyquist. The
/// filter energies are taken to decibels and decorrelated with an orthonormal
/// DCT-II. Output rows are frames, one every `hop_length` samples.
pub struct Lfcc {
    sample_rate: u32,
    n_fft: usize,
    hop_length: usize,
    n_lfcc: usize,

    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    filter_bank: Vec<Vec<f32>>, // [filter][freq_bin]
    dct: Vec<Vec<f32>>,         // [coeff][filter]
}

impl Lfcc {
    pub fn new(sample_rate: u32, config: &LfccConfig) -> Result<Self, Error> {
        let LfccConfig {
            n_lfcc,
            n_fft,
            hop_length,
            n_filter,
        } = *config;
        if sample_rate == 0 || n_fft < 2 || hop_length == 0 || n_filter == 0 {
            return Err(Error::Configuration(format!(
                "bad lfcc parameters: sr={sample_rate} n_fft={n_fft} hop={hop_length} n_filter={n_filter}"
            )));
        }
        if n_lfcc == 0 || n_lfcc > n_filter {
            return Err(Error::Configuration(format!(
                "n_lfcc ({n_lfcc}) must be in 1..={n_filter}"
            )));
        }

        let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
        // periodic Hann: the symmetric window one sample longer, minus its last point
        let window = apodize::hanning_iter(n_fft + 1)
            .take(n_fft)
            .map(|x| x as f32)
            .collect();

        Ok(Self {
            sample_rate,
            n_fft,
            hop_length,
            n_lfcc,
            fft,
            window,
            filter_bank: linear_filter_bank(sample_rate, n_fft / 2 + 1, n_filter),
            dct: dct_ortho(n_lfcc, n_filter),
        })
    }

    pub fn n_lfcc(&self) -> usize {
        self.n_lfcc
    }

    /// Number of frames produced for a segment of `len` samples.
    pub fn frames_for(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    fn filter_energies(&self, segment: &[f32]) -> Vec<Vec<f32>> {
        let pad = self.n_fft / 2;
        let len = segment.len() as isize;
        let reflect = |i: isize| -> f32 {
            let mut j = i - pad as isize;
            if j < 0 {
                j = -j;
            }
            if j >= len {
                j = 2 * (len - 1) - j;
            }
            segment[j as usize]
        };

        let n_bins = self.n_fft / 2 + 1;
        let mut buf = vec![Complex32::new(0.0, 0.0); self.n_fft];
        let mut power = vec![0f32; n_bins];

        (0..self.frames_for(segment.len()))
            .map(|frame| {
                let start = (frame * self.hop_length) as isize;
                for (i, (dst, w)) in buf.iter_mut().zip(&self.window).enumerate() {
                    *dst = Complex32::new(reflect(start + i as isize) * w, 0.0);
                }
                self.fft.process(&mut buf);
                for (p, c) in power.iter_mut().zip(&buf) {
                    *p = c.norm_sqr();
                }

                self.filter_bank
                    .iter()
                    .map(|filt| filt.iter().zip(&power).map(|(f, p)| f * p).sum::<f32>())
                    .collect::<Vec<f32>>()
            })
            .collect()
    }
}

impl FeatureTransform for Lfcc {
    fn apply(&self, segment: &[f32], sample_rate: u32) -> Result<Array2<f32>, Error> {
        if sample_rate != self.sample_rate {
            return Err(Error::Configuration(format!(
                "lfcc built for {}Hz got a {}Hz segment",
                self.sample_rate, sample_rate
            )));
        }
        if segment.len() <= self.n_fft / 2 {
            return Err(Error::Configuration(format!(
                "segment of {} samples is too short for n_fft={}",
                segment.len(),
                self.n_fft
            )));
        }

        let mut energies = self.filter_energies(segment);

        // power -> dB, floored at TOP_DB below the loudest cell of the segment
        let mut max_db = f32::NEG_INFINITY;
        for e in energies.iter_mut().flatten() {
            *e = 10.0 * e.max(AMIN).log10();
            max_db = max_db.max(*e);
        }
        let floor = max_db - TOP_DB;
        for e in energies.iter_mut().flatten() {
            *e = e.max(floor);
        }

        let frames = energies.len();
        let mut out = Array2::<f32>::zeros((frames, self.n_lfcc));
        for (t, db) in energies.iter().enumerate() {
            for (k, basis) in self.dct.iter().enumerate() {
                out[[t, k]] = basis.iter().zip(db).map(|(b, d)| b * d).sum();
            }
        }
        Ok(out)
    }
}

/// Triangular filters with linearly spaced centres between 0 Hz and Nyquist.
fn linear_filter_bank(sample_rate: u32, n_freqs: usize, n_filter: usize) -> Vec<Vec<f32>> {
    let f_max = sample_rate as f32 / 2.0;
    let bin_freq = |k: usize| k as f32 * f_max / (n_freqs - 1).max(1) as f32;
    let points: Vec<f32> = (0..n_filter + 2)
        .map(|i| i as f32 * f_max / (n_filter + 1) as f32)
        .collect();

    (0..n_filter)
        .map(|i| {
            let (left, centre, right) = (points[i], points[i + 1], points[i + 2]);
            (0..n_freqs)
                .map(|k| {
                    let f = bin_freq(k);
                    let up = (f - left) / (centre - left);
                    let down = (right - f) / (right - centre);
                    up.min(down).max(0.0)
                })
                .collect()
        })
        .collect()
}

/// Orthonormal DCT-II basis, `n_coeffs` rows of `n_in` taps.
fn dct_ortho(n_coeffs: usize, n_in: usize) -> Vec<Vec<f32>> {
    let n = n_in as f32;
    (0..n_coeffs)
        .map(|k| {
            let scale = if k == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            (0..n_in)
                .map(|m| scale * (PI / n * (m as f32 + 0.5) * k as f32).cos())
                .collect()
        })
        .collect()
}
