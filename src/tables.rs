// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2008 Antti S. Lankila
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Per-model lookup tables.
//!
//! When more than one waveform is selected the SID output transistors pull on each
//! other, so combined waveforms are not a bitwise AND of the pure ones. Each output
//! bit is modeled as an analog level which is blended with its neighbours and then
//! pushed through a steep transfer curve. The results are tabulated per waveform code
//! over the top 12 accumulator bits.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use super::dac::{build_envelope_dac, build_wave_dac};
use super::ChipModel;

pub const TABLE_SIZE: usize = 4096;

/// Number of table slots: codes 1-7 with pulse low, codes 4-7 with pulse high.
pub const TABLE_SLOTS: usize = 11;

/// Pulse threshold that no 24-bit accumulator value reaches.
pub const PULSE_THRESHOLD_LOW: u32 = 0x0100_0000;

const SHARPNESS: f32 = 12.0;

struct CombinationConfig {
    bias: f32,
    pulse_strength: f32,
    top_bit: f32,
    distance: f32,
    st_mix: f32,
}

const fn config(
    bias: f32,
    pulse_strength: f32,
    top_bit: f32,
    distance: f32,
    st_mix: f32,
) -> CombinationConfig {
    CombinationConfig {
        bias,
        pulse_strength,
        top_bit,
        distance,
        st_mix,
    }
}

// Indexed by ST, PT, PS, PST.
static CONFIG_6581: [CombinationConfig; 4] = [
    config(0.880_815, 0.0, 0.0, 0.327_961_4, 0.599_954_5),
    config(0.892_461_8, 2.014_781, 1.003_332, 0.029_923_22, 0.0),
    config(0.864_650_1, 1.712_586, 1.137_704, 0.028_454_23, 0.0),
    config(0.952_783_4, 1.794_777, 0.0, 0.098_062_72, 0.775_248_2),
];

static CONFIG_8580: [CombinationConfig; 4] = [
    config(0.978_166_5, 0.0, 0.989_946_9, 8.087_667, 0.822_641_2),
    config(0.909_776_9, 2.039_997, 0.958_409_6, 0.176_544_7, 0.0),
    config(0.923_121_2, 2.084_788, 0.949_389_5, 0.171_251_8, 0.0),
    config(0.984_555_2, 1.415_612, 0.970_388_3, 3.688_29, 0.826_500_8),
];

// Pure waveforms pass through unchanged.
static CONFIG_PURE: CombinationConfig = config(0.5, 0.0, 1.0, 0.0, 0.0);

fn combination_config(chip_model: ChipModel, waveform: u8) -> &'static CombinationConfig {
    let table = match chip_model {
        ChipModel::Mos6581 => &CONFIG_6581,
        ChipModel::Mos8580 => &CONFIG_8580,
    };
    match waveform {
        3 => &table[0],
        5 => &table[1],
        6 => &table[2],
        7 => &table[3],
        _ => &CONFIG_PURE,
    }
}

/// Computes the analog level (0.0 to 1.0) of each of the 12 waveform output bits
/// for waveform codes 1 to 7.
pub fn combine_waveform(
    chip_model: ChipModel,
    waveform: u8,
    acc: u32,
    pulse_threshold: u32,
) -> [f32; 12] {
    let pulse_high = acc >= pulse_threshold;
    if waveform == 4 {
        return [if pulse_high { 1.0 } else { 0.0 }; 12];
    }
    let config = combination_config(chip_model, waveform);
    let phase = acc >> 12;
    let mut o = [0.0f32; 12];
    for (i, bit) in o.iter_mut().enumerate() {
        *bit = if phase & (1 << i) != 0 { 1.0 } else { 0.0 };
    }

    // Triangle folds the lower bits with the top bit and drops one bit of resolution.
    if waveform & 3 == 1 {
        let top = phase & 0x800 != 0;
        for i in (1..12).rev() {
            o[i] = if top { 1.0 - o[i - 1] } else { o[i - 1] };
        }
        o[0] = 0.0;
    }

    // In S+T the triangle bits are the sawtooth bits shifted one up, both drive the bit.
    if waveform & 3 == 3 {
        o[0] *= config.st_mix;
        for i in 1..12 {
            o[i] = o[i - 1] * (1.0 - config.st_mix) + o[i] * config.st_mix;
        }
    }

    o[11] *= config.top_bit;

    if waveform == 3 || waveform > 4 {
        let mut distance = [0.0f32; 25];
        for i in 0..=12 {
            let weight = 1.0 / (1.0 + (i * i) as f32 * config.distance);
            distance[12 - i] = weight;
            distance[12 + i] = weight;
        }
        let pulse = if pulse_high { 1.0 } else { -1.0 } * config.pulse_strength;
        let mut blended = [0.0f32; 12];
        for i in 0..12 {
            let mut avg = 0.0;
            let mut n = 0.0;
            for j in 0..12 {
                let weight = distance[i + 12 - j];
                avg += o[j] * weight;
                n += weight;
            }
            // The pulse comparator acts as a virtual neighbour above bit 11.
            if waveform > 4 {
                let weight = distance[i];
                avg += pulse * weight;
                n += weight;
            }
            blended[i] = (o[i] + avg / n) * 0.5;
        }
        o = blended;
    }

    for bit in o.iter_mut() {
        let level = (*bit - config.bias) * SHARPNESS + 0.5;
        *bit = if level < 0.0 {
            0.0
        } else if level > 1.0 {
            1.0
        } else {
            level
        };
    }
    o
}

/// Immutable DAC and combined-waveform tables for one (model, nonlinearity) pair.
///
/// A table set is built once and shared by reference count between the voices of
/// a chip, so changing the model never touches tables that are in use elsewhere.
pub struct ChipTables {
    // Configuration
    chip_model: ChipModel,
    nonlinearity: f32,
    wave_zero: f32,
    // Static Data
    wave_dac: [f32; 12],
    envelope_dac: [f32; 256],
    waveforms: Vec<[f32; TABLE_SIZE]>,
}

impl ChipTables {
    pub fn new(chip_model: ChipModel, nonlinearity: f32) -> Self {
        let wave_zero = match chip_model {
            ChipModel::Mos6581 => -(0x380 as f32),
            ChipModel::Mos8580 => -(0x800 as f32),
        };
        let mut tables = ChipTables {
            chip_model,
            nonlinearity,
            wave_zero,
            wave_dac: build_wave_dac(nonlinearity),
            envelope_dac: build_envelope_dac(nonlinearity),
            waveforms: vec![[0.0; TABLE_SIZE]; TABLE_SLOTS],
        };
        for waveform in 1..=7u8 {
            tables.fill_slot(waveform as usize - 1, waveform, PULSE_THRESHOLD_LOW);
        }
        for waveform in 4..=7u8 {
            tables.fill_slot(waveform as usize + 3, waveform, 0);
        }
        tables
    }

    /// Table set with the model's default DAC nonlinearity.
    pub fn shared(chip_model: ChipModel) -> Arc<Self> {
        Arc::new(ChipTables::new(
            chip_model,
            chip_model.default_nonlinearity(),
        ))
    }

    fn fill_slot(&mut self, slot: usize, waveform: u8, pulse_threshold: u32) {
        for phase in 0..TABLE_SIZE {
            let bits = combine_waveform(
                self.chip_model,
                waveform,
                (phase as u32) << 12,
                pulse_threshold,
            );
            self.waveforms[slot][phase] = self.dac_level(&bits) + self.wave_zero;
        }
    }

    pub fn chip_model(&self) -> ChipModel {
        self.chip_model
    }

    pub fn nonlinearity(&self) -> f32 {
        self.nonlinearity
    }

    pub fn wave_zero(&self) -> f32 {
        self.wave_zero
    }

    pub fn wave_dac(&self) -> &[f32; 12] {
        &self.wave_dac
    }

    /// Converts 12 bit levels to an analog value through the waveform DAC.
    #[inline]
    pub fn dac_level(&self, bits: &[f32; 12]) -> f32 {
        bits.iter()
            .zip(self.wave_dac.iter())
            .fold(0.0, |sum, (&bit, &weight)| sum + bit * weight)
    }

    /// Analog level of the 8 noise bits, which drive DAC bits 4 to 11.
    pub fn noise_level(&self, noise: u8) -> f32 {
        let mut level = self.wave_zero;
        for i in 0..8 {
            if noise & (1 << i) != 0 {
                level += self.wave_dac[i + 4];
            }
        }
        level
    }

    #[inline]
    pub fn envelope_level(&self, counter: u8) -> f32 {
        self.envelope_dac[counter as usize]
    }

    #[inline]
    pub fn waveform(&self, slot: usize, phase: usize) -> f32 {
        self.waveforms[slot][phase & (TABLE_SIZE - 1)]
    }
}
