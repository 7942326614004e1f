// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Portions (c) 2008 Antti S. Lankila
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#![cfg_attr(feature = "cargo-clippy", allow(clippy::cast_lossless))]

pub mod convolve;
pub mod fir;

use alloc::vec;
use alloc::vec::Vec;

use self::convolve::Kernel;
use self::fir::{Fir, FIR_SHIFT, RINGSIZE};
use super::synth::{saturate, Synth};
use super::SamplingError;

const RING_MASK: usize = RINGSIZE - 1;

const FIXP_SHIFT: u32 = 16;
const FIXP_MASK: i64 = 0xffff;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingMethod {
    /// Linear interpolation between the two chip outputs around each sample point.
    Interpolate,
    /// Band-limited resampling through a Kaiser-windowed sinc filter.
    Resample,
}

pub struct Sampler {
    // Dependencies
    pub synth: Synth,
    // Configuration
    cycles_per_sample: i64,
    fir: Option<Fir>,
    sampling_method: SamplingMethod,
    kernel: Kernel,
    // Runtime State
    sample_buffer: Vec<i16>,
    sample_index: usize,
    sample_offset: i64,
    sample_prev: f32,
}

impl Sampler {
    pub fn new(synth: Synth) -> Self {
        let kernel = convolve::detect();
        debug!(target: "sid", "using {} convolution kernel", kernel.name);
        Sampler {
            synth,
            cycles_per_sample: 0,
            fir: None,
            sampling_method: SamplingMethod::Interpolate,
            kernel,
            sample_buffer: vec![0; RINGSIZE * 2],
            sample_index: 0,
            sample_offset: 0,
            sample_prev: 0.0,
        }
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Replaces the convolution kernel. Every kernel yields identical samples.
    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.kernel = kernel;
    }

    pub fn sampling_method(&self) -> SamplingMethod {
        self.sampling_method
    }

    pub fn fir(&self) -> Option<&Fir> {
        self.fir.as_ref()
    }

    /// Configures sampling. On error the previous configuration stays active.
    pub fn set_parameters(
        &mut self,
        method: SamplingMethod,
        clock_freq: u32,
        sample_freq: u32,
        pass_freq: Option<f64>,
    ) -> Result<(), SamplingError> {
        let fir = match method {
            SamplingMethod::Resample => Some(Fir::new(
                clock_freq as f64,
                sample_freq as f64,
                pass_freq,
            )?),
            SamplingMethod::Interpolate => {
                fir::check_frequencies(clock_freq as f64, sample_freq as f64)?;
                None
            }
        };
        if let Some(ref fir) = fir {
            debug!(
                target: "sid",
                "resampling {} Hz -> {} Hz, fir length {}, resolution {}",
                clock_freq,
                sample_freq,
                fir.len(),
                fir.resolution()
            );
        } else {
            debug!(target: "sid", "interpolating {} Hz -> {} Hz", clock_freq, sample_freq);
        }
        self.cycles_per_sample =
            (clock_freq as f64 / sample_freq as f64 * (1 << FIXP_SHIFT) as f64 + 0.5) as i64;
        self.sampling_method = method;
        self.fir = fir;
        self.synth.set_clock_frequency(clock_freq as f32);
        // Clear state
        for sample in self.sample_buffer.iter_mut() {
            *sample = 0;
        }
        self.sample_index = 0;
        self.sample_offset = 0;
        self.sample_prev = 0.0;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.synth.reset();
        for sample in self.sample_buffer.iter_mut() {
            *sample = 0;
        }
        self.sample_index = 0;
        self.sample_offset = 0;
        self.sample_prev = 0.0;
    }

    /// Clocks the chip for up to `delta` cycles writing every `interleave`-th slot
    /// of `buffer`. Returns the number of samples written and the cycles left
    /// over when the buffer filled up first.
    #[inline]
    pub fn clock(&mut self, delta: u32, buffer: &mut [i16], interleave: usize) -> (usize, u32) {
        let interleave = if interleave == 0 { 1 } else { interleave };
        let capacity = (buffer.len() + interleave - 1) / interleave;
        match (self.sampling_method, self.fir.take()) {
            (SamplingMethod::Resample, Some(fir)) => {
                let result = self.clock_resample(&fir, delta, buffer, capacity, interleave);
                self.fir = Some(fir);
                result
            }
            (_, fir) => {
                self.fir = fir;
                self.clock_interpolate(delta, buffer, capacity, interleave)
            }
        }
    }

    /// SID clocking with audio sampling - cycle based with linear sample
    /// interpolation.
    ///
    /// The chip is clocked every cycle, which together with the external filter
    /// keeps sampling noise well below that of picking the nearest output.
    #[inline]
    fn clock_interpolate(
        &mut self,
        mut delta: u32,
        buffer: &mut [i16],
        capacity: usize,
        interleave: usize,
    ) -> (usize, u32) {
        let mut index = 0;
        loop {
            let next_sample_offset = self.sample_offset + self.cycles_per_sample;
            let delta_sample = (next_sample_offset >> FIXP_SHIFT) as u32;
            if delta_sample > delta {
                break;
            }
            if index >= capacity {
                return (index, delta);
            }
            self.clock_interpolate_cycles(delta_sample);
            delta -= delta_sample;
            self.sample_offset = next_sample_offset & FIXP_MASK;

            let sample_now = self.synth.output();
            let frac = self.sample_offset as f32 / (1 << FIXP_SHIFT) as f32;
            buffer[index * interleave] =
                saturate(self.sample_prev + frac * (sample_now - self.sample_prev));
            index += 1;
            self.sample_prev = sample_now;
        }
        self.clock_interpolate_cycles(delta);
        self.sample_offset -= (delta as i64) << FIXP_SHIFT;
        (index, 0)
    }

    // The output before the last cycle is kept for interpolation.
    #[inline]
    fn clock_interpolate_cycles(&mut self, cycles: u32) {
        if cycles == 0 {
            return;
        }
        for _i in 0..(cycles - 1) {
            self.synth.clock();
        }
        self.sample_prev = self.synth.output();
        self.synth.clock();
    }

    /// SID clocking with audio sampling - cycle based with audio resampling.
    ///
    /// This is the theoretically correct (and computationally intensive) audio
    /// sample generation. The samples are generated by resampling to the specified
    /// sampling frequency. The work rate is inversely proportional to the
    /// percentage of the bandwidth allocated to the filter transition band.
    ///
    /// This implementation is based on the paper "A Flexible Sampling-Rate
    /// Conversion Method", by J. O. Smith and P. Gosset, or rather on the
    /// expanded tutorial on the "Digital Audio Resampling Home Page":
    /// http://www-ccrma.stanford.edu/~jos/resample/
    ///
    /// By building shifted FIR tables with samples according to the
    /// sampling frequency, this implementation dramatically reduces the
    /// computational effort in the filter convolutions, without any loss
    /// of accuracy. The filter convolutions are also vectorizable on
    /// current hardware.
    #[inline]
    fn clock_resample(
        &mut self,
        fir: &Fir,
        mut delta: u32,
        buffer: &mut [i16],
        capacity: usize,
        interleave: usize,
    ) -> (usize, u32) {
        let mut index = 0;
        loop {
            let next_sample_offset = self.sample_offset + self.cycles_per_sample;
            // Full clocks left to next sample.
            let delta_sample = (next_sample_offset >> FIXP_SHIFT) as u32;
            if delta_sample > delta {
                break;
            }
            if index >= capacity {
                return (index, delta);
            }
            for _i in 0..delta_sample {
                self.synth.clock();
                self.push_sample();
            }
            delta -= delta_sample;
            // Phase of the sample in terms of clock, [0 .. 1[.
            self.sample_offset = next_sample_offset & FIXP_MASK;
            buffer[index * interleave] = self.resample_output(fir);
            index += 1;
        }
        for _i in 0..delta {
            self.synth.clock();
            self.push_sample();
        }
        self.sample_offset -= (delta as i64) << FIXP_SHIFT;
        (index, 0)
    }

    #[inline]
    fn push_sample(&mut self) {
        let output = self.synth.output_i16();
        self.sample_buffer[self.sample_index] = output;
        self.sample_buffer[self.sample_index + RINGSIZE] = output;
        self.sample_index = (self.sample_index + 1) & RING_MASK;
    }

    #[inline]
    fn resample_output(&self, fir: &Fir) -> i16 {
        let n = fir.len();
        let res = fir.resolution();
        // Find the first of the nearest fir tables close to the phase.
        let phase = self.sample_offset * res as i64;
        let mut fir_offset = (phase >> FIXP_SHIFT) as usize;
        let fir_offset_rmd = phase & FIXP_MASK;

        // The n most recent samples, plus one extra in case the table wraps.
        let mut sample_start = self.sample_index + RINGSIZE - n - 1;
        let v1 = self.kernel.convolve(
            &self.sample_buffer[sample_start..sample_start + n],
            fir.table(fir_offset),
        );

        // Use next FIR table, wrap around to first FIR table using the next sample.
        fir_offset += 1;
        if fir_offset == res {
            fir_offset = 0;
            sample_start += 1;
        }
        let v2 = self.kernel.convolve(
            &self.sample_buffer[sample_start..sample_start + n],
            fir.table(fir_offset),
        );

        // Linear interpolation between the sinc tables yields a good
        // approximation of the exact value.
        let v1 = v1 as i64;
        let v = (v1 + ((fir_offset_rmd * (v2 as i64 - v1)) >> FIXP_SHIFT)) >> FIR_SHIFT;

        // Saturated arithmetics to guard against 16 bit sample overflow.
        let half = 1i64 << 15;
        if v >= half {
            (half - 1) as i16
        } else if v < -half {
            (-half) as i16
        } else {
            v as i16
        }
    }
}
