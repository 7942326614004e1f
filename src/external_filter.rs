// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use super::ChipModel;

// Mixer DC at full volume, subtracted when the output stage is bypassed:
// (wave DC + voice DC) * 3 voices + mixer DC.
const MIXER_DC_6581: f32 = (((0x800 - 0x380) + 0x800) * 0xff * 3 - 0xfff * 0xff / 18) as f32;

// Low-pass:  R = 10kOhm, C = 1000pF; w0l = 1/RC = 1/(1e4*1e-9) = 100000
// High-pass: R =  1kOhm, C =   10uF; w0h = 1/RC = 1/(1e3*1e-5) =    100
const W0_LP: f32 = 100_000.0;
const W0_HP: f32 = 100.0;

const DENORMAL_LIMIT: f32 = 1e-20;

/// C64 audio output stage: an RC low-pass at 16kHz followed by an RC high-pass
/// at 16Hz, given a 1kOhm input impedance on the amplifier side.
pub struct ExternalFilter {
    // Configuration
    enabled: bool,
    mixer_dc: f32,
    w0lp: f32,
    w0hp: f32,
    // Runtime State
    vlp: f32,
    vhp: f32,
    vo: f32,
}

impl ExternalFilter {
    pub fn new(chip_model: ChipModel) -> Self {
        let mut filter = ExternalFilter {
            enabled: true,
            mixer_dc: 0.0,
            w0lp: 0.0,
            w0hp: 0.0,
            vlp: 0.0,
            vhp: 0.0,
            vo: 0.0,
        };
        filter.set_chip_model(chip_model);
        filter.set_clock_frequency(super::clock::PAL as f32);
        filter
    }

    pub fn set_chip_model(&mut self, chip_model: ChipModel) {
        self.mixer_dc = match chip_model {
            ChipModel::Mos6581 => MIXER_DC_6581,
            ChipModel::Mos8580 => 0.0,
        };
    }

    /// Discretizes the RC networks for one step per clock cycle.
    pub fn set_clock_frequency(&mut self, clock_freq: f32) {
        self.w0lp = W0_LP / clock_freq;
        self.w0hp = W0_HP / clock_freq;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[inline]
    pub fn clock(&mut self, vi: f32) {
        // Vo  = Vlp - Vhp;
        // Vlp = Vlp + w0lp*(Vi - Vlp)*delta_t;
        // Vhp = Vhp + w0hp*(Vlp - Vhp)*delta_t;
        if self.enabled {
            self.vo = self.vlp - self.vhp;
            self.vlp += self.w0lp * (vi - self.vlp);
            self.vhp += self.w0hp * (self.vlp - self.vhp);
        } else {
            self.vlp = 0.0;
            self.vhp = 0.0;
            self.vo = vi - self.mixer_dc;
        }
    }

    #[inline]
    pub fn output(&self) -> f32 {
        self.vo
    }

    pub fn nuke_denormals(&mut self) {
        if self.vlp > -DENORMAL_LIMIT && self.vlp < DENORMAL_LIMIT {
            self.vlp = 0.0;
        }
        if self.vhp > -DENORMAL_LIMIT && self.vhp < DENORMAL_LIMIT {
            self.vhp = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.vlp = 0.0;
        self.vhp = 0.0;
        self.vo = 0.0;
    }
}
