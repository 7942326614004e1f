// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Kaiser-windowed sinc filter design for band-limited resampling.

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::PI;

use crate::math;
use crate::SamplingError;

/// Capacity of the sample history ring buffer.
pub const RINGSIZE: usize = 16384;

/// Coefficients are stored as fixed point with this many fractional bits.
///
/// The absolute sum of a table stays below 2^16, so convolving a full-scale
/// 16-bit history never leaves the i32 range.
pub const FIR_SHIFT: u32 = 14;

// The error in interpolated lookup is bounded by 1.234/L^2, see
// http://www-ccrma.stanford.edu/~jos/resample/Choice_Table_Size.html
// For a resolution of 16 bits this yields L >= 285.
const FIR_RES_INTERPOLATE: f64 = 285.0;

const PASS_FREQ_MAX: f64 = 20_000.0;

// Max error acceptable in I0.
const I0_EPSILON: f64 = 1e-10;

pub(crate) fn check_frequencies(clock_freq: f64, sample_freq: f64) -> Result<(), SamplingError> {
    if !(clock_freq > 0.0) {
        return Err(SamplingError::ZeroClockFreq);
    }
    if !(sample_freq > 0.0) {
        return Err(SamplingError::ZeroSampleFreq);
    }
    Ok(())
}

/// A bank of `resolution` FIR tables of `len` taps each. Table `i` holds the
/// impulse response shifted by `i / resolution` of an output sample.
pub struct Fir {
    data: Vec<i16>,
    n: usize,
    res: usize,
}

impl Fir {
    pub fn new(
        clock_freq: f64,
        sample_freq: f64,
        pass_freq: Option<f64>,
    ) -> Result<Self, SamplingError> {
        check_frequencies(clock_freq, sample_freq)?;
        let mut pass_freq = match pass_freq {
            Some(freq) if freq > 0.0 => freq,
            Some(_) => return Err(SamplingError::InvalidPassFreq),
            None => PASS_FREQ_MAX,
        };
        if pass_freq > PASS_FREQ_MAX {
            pass_freq = PASS_FREQ_MAX;
        }
        if 2.0 * pass_freq / sample_freq >= 0.9 {
            pass_freq = 0.9 * sample_freq / 2.0;
        }

        let samples_per_cycle = sample_freq / clock_freq;
        let cycles_per_sample = clock_freq / sample_freq;

        // 16 bits -> -96dB stopband attenuation.
        let atten = -20.0 * math::log10(1.0 / (1u32 << 16) as f64);
        // The transition band spans from the pass band edge to the Nyquist
        // frequency of the output and is mirrored beyond it.
        let dw = (1.0 - 2.0 * pass_freq / sample_freq) * PI * 2.0;
        // Cutoff at the output Nyquist frequency.
        let wc = PI;

        // For calculation of beta and N see the reference for the kaiserord
        // function in the MATLAB Signal Processing Toolbox.
        let beta = 0.1102 * (atten - 8.7);
        let io_beta = i0(beta);

        // The filter order equals the number of zero crossings and is even,
        // since sinc is symmetric about x = 0.
        let mut order = ((atten - 7.95) / (2.285 * dw) + 0.5) as usize;
        order += order & 1;

        // The filter length is the order + 1 scaled to cycles, forced odd.
        let n = ((order as f64 * cycles_per_sample) as usize + 1) | 1;
        if n > RINGSIZE - 1 {
            return Err(SamplingError::FirTooLong {
                length: n,
                capacity: RINGSIZE - 1,
            });
        }

        // The table resolution is clamped to 2^k, making the fixpoint sample
        // offset a whole multiple of the resolution.
        let steps = math::ceil(math::log2(FIR_RES_INTERPOLATE / cycles_per_sample));
        let res = if steps > 0.0 { 1usize << steps as u32 } else { 1 };

        let mut data = vec![0i16; n * res];
        let half = (n / 2) as isize;
        for i in 0..res {
            let fir_offset = (i * n) as isize + half;
            let j_offset = i as f64 / res as f64;
            // Sinc weighted by the Kaiser window.
            for j in -half..=half {
                let jx = j as f64 - j_offset;
                let wt = wc * jx / cycles_per_sample;
                let temp = jx / half as f64;
                let kaiser = if math::abs(temp) <= 1.0 {
                    i0(beta * math::sqrt(1.0 - temp * temp)) / io_beta
                } else {
                    0.0
                };
                let sincwt = if math::abs(wt) >= 1e-6 {
                    math::sin(wt) / wt
                } else {
                    1.0
                };
                let val = (1u32 << FIR_SHIFT) as f64 * samples_per_cycle * wc / PI
                    * sincwt
                    * kaiser;
                data[(fir_offset + j) as usize] = math::round(val) as i16;
            }
        }

        let fir = Fir { data, n, res };
        debug_assert!((0..res).all(|i| fir.abs_sum(i) << 15 <= i32::max_value() as u64));
        Ok(fir)
    }

    /// Absolute sum of the coefficients in table `phase`.
    pub fn abs_sum(&self, phase: usize) -> u64 {
        self.table(phase)
            .iter()
            .map(|&c| (c as i32).abs() as u64)
            .sum()
    }

    /// Number of taps per table, always odd.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Number of phase tables.
    pub fn resolution(&self) -> usize {
        self.res
    }

    #[inline]
    pub fn table(&self, phase: usize) -> &[i16] {
        &self.data[phase * self.n..(phase + 1) * self.n]
    }
}

/// Zeroth order modified Bessel function of the first kind.
pub fn i0(x: f64) -> f64 {
    let halfx = x / 2.0;
    let mut sum = 1.0;
    let mut u = 1.0;
    let mut n = 1;
    loop {
        let temp = halfx / n as f64;
        n += 1;
        u *= temp * temp;
        sum += u;
        if u < I0_EPSILON * sum {
            break;
        }
    }
    sum
}
