// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use alloc::sync::Arc;

use super::sampler::{Sampler, SamplingMethod};
use super::synth::Synth;
use super::tables::ChipTables;
use super::voice::Voice;
use super::{clock, ChipModel, SamplingError};

/// Register addresses.
pub mod reg {
    pub const FREQLO1: u8 = 0x00;
    pub const FREQHI1: u8 = 0x01;
    pub const PWLO1: u8 = 0x02;
    pub const PWHI1: u8 = 0x03;
    pub const CR1: u8 = 0x04;
    pub const AD1: u8 = 0x05;
    pub const SR1: u8 = 0x06;
    pub const FREQLO2: u8 = 0x07;
    pub const FREQHI2: u8 = 0x08;
    pub const PWLO2: u8 = 0x09;
    pub const PWHI2: u8 = 0x0a;
    pub const CR2: u8 = 0x0b;
    pub const AD2: u8 = 0x0c;
    pub const SR2: u8 = 0x0d;
    pub const FREQLO3: u8 = 0x0e;
    pub const FREQHI3: u8 = 0x0f;
    pub const PWLO3: u8 = 0x10;
    pub const PWHI3: u8 = 0x11;
    pub const CR3: u8 = 0x12;
    pub const AD3: u8 = 0x13;
    pub const SR3: u8 = 0x14;
    pub const FCLO: u8 = 0x15;
    pub const FCHI: u8 = 0x16;
    pub const RESFILT: u8 = 0x17;
    pub const MODVOL: u8 = 0x18;
    pub const POTX: u8 = 0x19;
    pub const POTY: u8 = 0x1a;
    pub const OSC3: u8 = 0x1b;
    pub const ENV3: u8 = 0x1c;
}

// Cycles until the floating bus value written last fades to 0.
const BUS_VALUE_TTL: u32 = 34_000;

const DEFAULT_SAMPLE_FREQ: u32 = 44_100;

/// Register-level snapshot of a chip.
///
/// Reads 0x1B and 0x1C are derived from live oscillator and envelope state, so
/// two snapshots only compare equal when taken at the same cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    pub sid_register: [u8; 32],
    pub bus_value: u8,
    pub bus_value_ttl: u32,
}

pub struct Sid {
    // Functional Units
    sampler: Sampler,
    // Configuration
    nonlinearity: f32,
    // Runtime State
    bus_value: u8,
    bus_value_ttl: u32,
}

impl Sid {
    pub fn new(chip_model: ChipModel) -> Self {
        let nonlinearity = chip_model.default_nonlinearity();
        let tables = Arc::new(ChipTables::new(chip_model, nonlinearity));
        let synth = Synth::new(chip_model, tables);
        let mut sid = Sid {
            sampler: Sampler::new(synth),
            nonlinearity,
            bus_value: 0,
            bus_value_ttl: 0,
        };
        if let Err(err) = sid.set_sampling_parameters(
            SamplingMethod::Interpolate,
            clock::PAL,
            DEFAULT_SAMPLE_FREQ,
            None,
        ) {
            warn!(target: "sid", "default sampling parameters rejected: {}", err);
        }
        sid
    }

    pub fn chip_model(&self) -> ChipModel {
        self.sampler.synth.chip_model()
    }

    /// Selects the chip model, building a fresh table set with the model's
    /// default DAC nonlinearity.
    pub fn set_chip_model(&mut self, chip_model: ChipModel) {
        self.nonlinearity = chip_model.default_nonlinearity();
        self.rebuild_tables(chip_model);
    }

    /// Overrides the DAC nonlinearity of the current model.
    pub fn set_voice_nonlinearity(&mut self, nonlinearity: f32) {
        self.nonlinearity = nonlinearity;
        let chip_model = self.chip_model();
        self.rebuild_tables(chip_model);
    }

    fn rebuild_tables(&mut self, chip_model: ChipModel) {
        debug!(
            target: "sid",
            "building tables for {:?}, nonlinearity {}",
            chip_model,
            self.nonlinearity
        );
        let tables = Arc::new(ChipTables::new(chip_model, self.nonlinearity));
        self.sampler.synth.set_chip_model(chip_model, tables);
    }

    /// Configures clock and sample rates. A rejected configuration leaves the
    /// previous one in effect.
    pub fn set_sampling_parameters(
        &mut self,
        method: SamplingMethod,
        clock_freq: u32,
        sample_freq: u32,
        pass_freq: Option<f64>,
    ) -> Result<(), SamplingError> {
        self.sampler
            .set_parameters(method, clock_freq, sample_freq, pass_freq)
            .map_err(|err| {
                warn!(target: "sid", "sampling parameters rejected: {}", err);
                err
            })
    }

    pub fn sampling_method(&self) -> SamplingMethod {
        self.sampler.sampling_method()
    }

    /// Clocks the chip a single cycle. The bus value is only aged by `sample`.
    pub fn clock(&mut self) {
        self.sampler.synth.clock();
    }

    pub fn enable_external_filter(&mut self, enabled: bool) {
        self.sampler.synth.ext_filter.set_enabled(enabled);
    }

    pub fn enable_filter(&mut self, enabled: bool) {
        self.sampler.synth.filter.set_enabled(enabled);
    }

    /// Mutes or unmutes a voice. Indices past the third voice are ignored.
    pub fn mute(&mut self, voice: usize, enable: bool) {
        if let Some(voice) = self.sampler.synth.voices.get_mut(voice) {
            voice.mute(enable);
        }
    }

    pub fn set_pot_x(&mut self, value: u8) {
        self.sampler.synth.pot_x.set(value);
    }

    pub fn set_pot_y(&mut self, value: u8) {
        self.sampler.synth.pot_y.set(value);
    }

    /// Voice `i`, or `None` past the third voice.
    pub fn voice(&self, i: usize) -> Option<&Voice> {
        self.sampler.synth.voices.get(i)
    }

    pub fn input(&mut self, sample: i16) {
        // Voice outputs are 20 bits. Scale up to match three voices in order
        // to facilitate simulation of the MOS8580 "digi boost" hardware hack.
        self.sampler.synth.ext_in = (((sample as i32) << 4) * 3) as f32;
    }

    pub fn output(&self) -> i16 {
        self.sampler.synth.output_i16()
    }

    pub fn reset(&mut self) {
        self.sampler.reset();
        self.bus_value = 0;
        self.bus_value_ttl = 0;
    }

    /// SID clocking with audio sampling.
    ///
    /// Clocks up to `delta` cycles, writing one sample to every `interleave`-th
    /// slot of `buffer`. Returns the samples written and the cycles left, which
    /// are non-zero only when the buffer filled first.
    ///
    /// ```ignore
    /// let mut delta = cycles;
    /// while delta > 0 {
    ///     let (samples, left) = sid.sample(delta, &mut buffer, 1);
    ///     output.write(&buffer[..samples]);
    ///     delta = left;
    /// }
    /// ```
    pub fn sample(&mut self, delta: u32, buffer: &mut [i16], interleave: usize) -> (usize, u32) {
        self.age_bus_value(delta);
        let result = self.sampler.clock(delta, buffer, interleave);
        self.sampler.synth.nuke_denormals();
        result
    }

    fn age_bus_value(&mut self, cycles: u32) {
        if self.bus_value_ttl != 0 {
            if self.bus_value_ttl > cycles {
                self.bus_value_ttl -= cycles;
            } else {
                self.bus_value = 0;
                self.bus_value_ttl = 0;
            }
        }
    }

    // -- Device I/O

    pub fn read(&self, reg: u8) -> u8 {
        match reg {
            reg::POTX..=reg::ENV3 => self.sampler.synth.read(reg, self.bus_value),
            _ => self.bus_value,
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        self.bus_value = value;
        self.bus_value_ttl = BUS_VALUE_TTL;
        self.sampler.synth.write(reg, value);
    }

    // -- State

    pub fn read_state(&self) -> State {
        let mut state = State::default();
        for i in 0..3 {
            let j = i * 7;
            let voice = &self.sampler.synth.voices[i];
            let wave = &voice.wave;
            let envelope = &voice.envelope;
            state.sid_register[j] = wave.get_frequency_lo();
            state.sid_register[j + 1] = wave.get_frequency_hi();
            state.sid_register[j + 2] = wave.get_pulse_width_lo();
            state.sid_register[j + 3] = wave.get_pulse_width_hi();
            state.sid_register[j + 4] = wave.get_control() | envelope.get_gate() as u8;
            state.sid_register[j + 5] = envelope.get_attack_decay();
            state.sid_register[j + 6] = envelope.get_sustain_release();
        }
        let filter = &self.sampler.synth.filter;
        state.sid_register[reg::FCLO as usize] = filter.get_fc_lo();
        state.sid_register[reg::FCHI as usize] = filter.get_fc_hi();
        state.sid_register[reg::RESFILT as usize] = filter.get_res_filt();
        state.sid_register[reg::MODVOL as usize] = filter.get_mode_vol();
        for i in reg::POTX..0x20 {
            state.sid_register[i as usize] = self.read(i);
        }
        state.bus_value = self.bus_value;
        state.bus_value_ttl = self.bus_value_ttl;
        state
    }

    pub fn write_state(&mut self, state: &State) {
        self.reset();
        for i in 0..=reg::MODVOL {
            self.write(i, state.sid_register[i as usize]);
        }
        self.bus_value = state.bus_value;
        self.bus_value_ttl = state.bus_value_ttl;
    }
}
