// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use core::f32::consts::PI;

use bit_field::BitField;

use super::math;
use super::ChipModel;

// The mixer has a small input DC offset in the 6581.
const MIXER_DC_6581: f32 = -((0xfff * 0xff / 18) as f32);

// 6581 cutoff: the integrator resistance is a fixed resistor in parallel with a
// FET whose resistance falls exponentially with the cutoff register.
const FC_6581_BASE_RESISTANCE: f64 = 1_147_036.44;
const FC_6581_OFFSET: f64 = 274_228_796.98;
const FC_6581_STEEPNESS: f64 = 1.006_663_4;
const FC_6581_MIN_FET_RESISTANCE: f64 = 16_125.15;
const FC_CAPACITANCE: f64 = 470e-12;

// 8580 cutoff is close to linear in the register value.
const FC_8580_BASE: f64 = 30.0;
const FC_8580_SLOPE: f64 = 5.8;

// Limit f0 to 16kHz to keep the one cycle integration stable.
const F0_MAX: f32 = 16_000.0;

const DENORMAL_LIMIT: f32 = 1e-20;

/// Cutoff frequency in Hz for an 11-bit FC register value.
pub fn cutoff_frequency(chip_model: ChipModel, fc: u16) -> f32 {
    let fc = (fc & 0x7ff) as f64;
    match chip_model {
        ChipModel::Mos6581 => {
            let fet = FC_6581_MIN_FET_RESISTANCE + FC_6581_OFFSET / math::pow(FC_6581_STEEPNESS, fc);
            let r = FC_6581_BASE_RESISTANCE * fet / (FC_6581_BASE_RESISTANCE + fet);
            (1.0 / (2.0 * core::f64::consts::PI * r * FC_CAPACITANCE)) as f32
        }
        ChipModel::Mos8580 => (FC_8580_BASE + FC_8580_SLOPE * fc) as f32,
    }
}

/// The SID filter is a two-integrator-loop biquadratic filter. The summer output
/// is the highpass, the first integrator the bandpass and the second integrator
/// the lowpass output. Outputs are inverted, with levels independent of Q.
///
/// Voices routed around the filter go straight to the mixer, where filtered and
/// unfiltered signals are summed and scaled by the master volume.
pub struct Filter {
    // Configuration
    chip_model: ChipModel,
    clock_freq: f32,
    enabled: bool,
    fc: u16,
    filt: u8,
    res: u8,
    // Mode
    voice3_off: bool,
    hp_bp_lp: u8,
    vol: u8,
    // Runtime State
    vhp: f32,
    vbp: f32,
    vlp: f32,
    vnf: f32,
    // Cutoff Freq/Res
    mixer_dc: f32,
    q_inv: f32,
    w0: f32,
}

impl Filter {
    pub fn new(chip_model: ChipModel) -> Self {
        let mut filter = Filter {
            chip_model,
            clock_freq: super::clock::PAL as f32,
            enabled: true,
            fc: 0,
            filt: 0,
            res: 0,
            voice3_off: false,
            hp_bp_lp: 0,
            vol: 0,
            vhp: 0.0,
            vbp: 0.0,
            vlp: 0.0,
            vnf: 0.0,
            mixer_dc: 0.0,
            q_inv: 0.0,
            w0: 0.0,
        };
        filter.set_chip_model(chip_model);
        filter.reset();
        filter
    }

    pub fn set_chip_model(&mut self, chip_model: ChipModel) {
        self.chip_model = chip_model;
        self.mixer_dc = match chip_model {
            ChipModel::Mos6581 => MIXER_DC_6581,
            ChipModel::Mos8580 => 0.0,
        };
        self.set_w0();
    }

    pub fn set_clock_frequency(&mut self, clock_freq: f32) {
        self.clock_freq = clock_freq;
        self.set_w0();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    // -- Register Access

    pub fn get_fc_hi(&self) -> u8 {
        (self.fc >> 3) as u8
    }

    pub fn get_fc_lo(&self) -> u8 {
        (self.fc & 0x007) as u8
    }

    pub fn get_mode_vol(&self) -> u8 {
        let mut value = (self.hp_bp_lp << 4) | (self.vol & 0x0f);
        value.set_bit(7, self.voice3_off);
        value
    }

    pub fn get_res_filt(&self) -> u8 {
        (self.res << 4) | (self.filt & 0x0f)
    }

    pub fn set_fc_hi(&mut self, value: u8) {
        self.fc = (((value as u16) << 3) & 0x7f8) | (self.fc & 0x007);
        self.set_w0();
    }

    pub fn set_fc_lo(&mut self, value: u8) {
        self.fc = (self.fc & 0x7f8) | ((value as u16) & 0x007);
        self.set_w0();
    }

    pub fn set_mode_vol(&mut self, value: u8) {
        self.voice3_off = value.get_bit(7);
        self.hp_bp_lp = value.get_bits(4..7);
        self.vol = value.get_bits(0..4);
    }

    pub fn set_res_filt(&mut self, value: u8) {
        self.res = value.get_bits(4..8);
        self.filt = value.get_bits(0..4);
        self.set_q();
    }

    #[inline]
    pub fn clock(&mut self, voice1: f32, voice2: f32, voice3: f32, ext_in: f32) {
        // NB! Voice 3 is not silenced by voice3off if it is routed through
        // the filter.
        let voice3 = if self.voice3_off && !self.filt.get_bit(2) {
            0.0
        } else {
            voice3
        };

        if !self.enabled {
            self.vnf = voice1 + voice2 + voice3 + ext_in;
            self.vhp = 0.0;
            self.vbp = 0.0;
            self.vlp = 0.0;
            return;
        }

        // Route voices into or around filter.
        let mut vi = 0.0;
        let mut vnf = 0.0;
        for (i, &v) in [voice1, voice2, voice3, ext_in].iter().enumerate() {
            if self.filt.get_bit(i) {
                vi += v;
            } else {
                vnf += v;
            }
        }
        self.vnf = vnf;

        // Vhp = Vbp/Q - Vlp - Vi;
        // dVbp = -w0*Vhp*dt;
        // dVlp = -w0*Vbp*dt;
        self.vbp -= self.w0 * self.vhp;
        self.vlp -= self.w0 * self.vbp;
        self.vhp = self.vbp * self.q_inv - self.vlp - vi;
    }

    #[inline]
    pub fn output(&self) -> f32 {
        let vf = if self.enabled {
            // The mode outputs are summed unweighted.
            let mut vf = 0.0;
            if self.hp_bp_lp.get_bit(0) {
                vf += self.vlp;
            }
            if self.hp_bp_lp.get_bit(1) {
                vf += self.vbp;
            }
            if self.hp_bp_lp.get_bit(2) {
                vf += self.vhp;
            }
            vf
        } else {
            0.0
        };
        (self.vnf + vf + self.mixer_dc) * self.vol as f32 / 15.0
    }

    /// Flushes near-zero integrator state so idle filters never run on denormals.
    pub fn nuke_denormals(&mut self) {
        for v in [&mut self.vhp, &mut self.vbp, &mut self.vlp].iter_mut() {
            if **v > -DENORMAL_LIMIT && **v < DENORMAL_LIMIT {
                **v = 0.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.fc = 0;
        self.filt = 0;
        self.res = 0;
        self.voice3_off = false;
        self.hp_bp_lp = 0;
        self.vol = 0;
        self.vhp = 0.0;
        self.vbp = 0.0;
        self.vlp = 0.0;
        self.vnf = 0.0;
        self.set_w0();
        self.set_q();
    }

    fn set_q(&mut self) {
        // Q is controlled linearly by res. Q has approximate range [0.707, 1.7].
        self.q_inv = 1.0 / (0.707 + self.res as f32 / 15.0);
    }

    fn set_w0(&mut self) {
        let f0 = cutoff_frequency(self.chip_model, self.fc);
        let f0 = if f0 < F0_MAX { f0 } else { F0_MAX };
        self.w0 = 2.0 * PI * f0 / self.clock_freq;
    }
}
