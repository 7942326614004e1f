// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2008 Antti S. Lankila
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Kinked DAC model.
//!
//! The SID DACs are R-2R ladders whose resistor ratio is not exactly two, so each
//! bit weighs a little less (or more) than twice the bit below it. A nonlinearity
//! of 1.0 yields an ideal binary-weighted DAC.

/// Converts the low `bits` bits of `input` to an analog level in `[0, 2^bits)`.
pub fn kinked_dac(input: u32, nonlinearity: f32, bits: u32) -> f32 {
    let dir = 2.0 * nonlinearity;
    let mut value = 0.0f32;
    let mut weight = 1.0f32;
    for i in 0..bits {
        if input & (1 << i) != 0 {
            value += weight;
        }
        weight *= dir;
    }
    value / (weight / nonlinearity / nonlinearity) * (1u32 << bits) as f32
}

/// Per-bit weights of the 12-bit waveform DAC.
pub fn build_wave_dac(nonlinearity: f32) -> [f32; 12] {
    let mut dac = [0.0; 12];
    for (i, weight) in dac.iter_mut().enumerate() {
        *weight = kinked_dac(1 << i, nonlinearity, 12);
    }
    dac
}

/// Analog level for every 8-bit envelope counter value.
pub fn build_envelope_dac(nonlinearity: f32) -> [f32; 256] {
    let mut dac = [0.0; 256];
    for (i, level) in dac.iter_mut().enumerate() {
        *level = kinked_dac(i as u32, nonlinearity, 8);
    }
    dac
}
