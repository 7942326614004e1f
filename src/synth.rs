// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#![cfg_attr(feature = "cargo-clippy", allow(clippy::cast_lossless))]

use alloc::sync::Arc;

use super::external_filter::ExternalFilter;
use super::filter::Filter;
use super::pot::Potentiometer;
use super::sid::reg;
use super::tables::ChipTables;
use super::voice::Voice;
use super::wave::Syncable;
use super::ChipModel;

/// Divisor taking the mixer output to 16-bit sample range. Three full-scale voices
/// map to half of full scale, which leaves headroom for filter resonance.
const OUTPUT_SCALE: f32 = (2047 * 255 * 3 * 2) as f32 / 32768.0;

const OUTPUT_HALF: f32 = 32768.0;

pub struct Synth {
    pub ext_filter: ExternalFilter,
    pub filter: Filter,
    pub voices: [Voice; 3],
    pub ext_in: f32,
    pub pot_x: Potentiometer,
    pub pot_y: Potentiometer,
    chip_model: ChipModel,
    tables: Arc<ChipTables>,
}

// slice::rotate_left is inefficient for small arrays:
// https://github.com/rust-lang/rust/issues/89714
fn rotate3<T>([a, b, c]: [T; 3], i: usize) -> [T; 3] {
    match i {
        0 => [a, b, c],
        1 => [b, c, a],
        _ => [c, a, b],
    }
}

impl Synth {
    pub fn new(chip_model: ChipModel, tables: Arc<ChipTables>) -> Self {
        Synth {
            ext_filter: ExternalFilter::new(chip_model),
            filter: Filter::new(chip_model),
            voices: [
                Voice::new(chip_model, tables.clone()),
                Voice::new(chip_model, tables.clone()),
                Voice::new(chip_model, tables.clone()),
            ],
            ext_in: 0.0,
            pot_x: Potentiometer::default(),
            pot_y: Potentiometer::default(),
            chip_model,
            tables,
        }
    }

    pub fn chip_model(&self) -> ChipModel {
        self.chip_model
    }

    pub fn tables(&self) -> &Arc<ChipTables> {
        &self.tables
    }

    /// Switches every component to a new model and table set.
    pub fn set_chip_model(&mut self, chip_model: ChipModel, tables: Arc<ChipTables>) {
        self.chip_model = chip_model;
        for voice in self.voices.iter_mut() {
            voice.set_chip_model(chip_model, tables.clone());
        }
        self.filter.set_chip_model(chip_model);
        self.ext_filter.set_chip_model(chip_model);
        self.tables = tables;
    }

    pub fn set_clock_frequency(&mut self, clock_freq: f32) {
        self.filter.set_clock_frequency(clock_freq);
        self.ext_filter.set_clock_frequency(clock_freq);
    }

    /// Voice `i` with its sync destination (voice i+1) and its ring/sync source
    /// (voice i-1).
    pub fn syncable_voice(&self, i: usize) -> Syncable<&'_ Voice> {
        let [a, b, c] = &self.voices;
        let [main, sync_dest, sync_source] = rotate3([a, b, c], i);
        Syncable {
            main,
            sync_dest,
            sync_source,
        }
    }

    pub fn syncable_voice_mut(&mut self, i: usize) -> Syncable<&'_ mut Voice> {
        let [a, b, c] = &mut self.voices;
        let [main, sync_dest, sync_source] = rotate3([a, b, c], i);
        Syncable {
            main,
            sync_dest,
            sync_source,
        }
    }

    pub fn clock(&mut self) {
        // Envelope first so the waveform sees the current control state.
        for voice in self.voices.iter_mut() {
            voice.envelope.clock();
            voice.wave.clock();
        }
        // Synchronize oscillators once all accumulators have moved.
        for i in 0..3 {
            self.syncable_voice_mut(i).wave().synchronize();
        }
        // Clock filter.
        self.filter.clock(
            self.syncable_voice(0).output(),
            self.syncable_voice(1).output(),
            self.syncable_voice(2).output(),
            self.ext_in,
        );
        // Clock external filter.
        self.ext_filter.clock(self.filter.output());
    }

    /// Unclamped output in 16-bit sample units.
    #[inline]
    pub fn output(&self) -> f32 {
        self.ext_filter.output() / OUTPUT_SCALE
    }

    /// Output saturated to a 16-bit sample.
    #[inline]
    pub fn output_i16(&self) -> i16 {
        saturate(self.output())
    }

    pub fn nuke_denormals(&mut self) {
        self.filter.nuke_denormals();
        self.ext_filter.nuke_denormals();
    }

    pub fn reset(&mut self) {
        self.ext_filter.reset();
        self.filter.reset();
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        self.ext_in = 0.0;
    }

    pub fn read(&self, reg: u8, bus_value: u8) -> u8 {
        match reg {
            reg::POTX => self.pot_x.read(),
            reg::POTY => self.pot_y.read(),
            reg::OSC3 => {
                let wave = self.syncable_voice(2).wave();
                wave.main.read_osc(wave.sync_dest, self.chip_model.osc3_delayed())
            }
            reg::ENV3 => self.voices[2].envelope.read_env(),
            _ => bus_value,
        }
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        match reg {
            reg::FREQLO1 => self.voices[0].wave.set_frequency_lo(value),
            reg::FREQHI1 => self.voices[0].wave.set_frequency_hi(value),
            reg::PWLO1 => self.voices[0].wave.set_pulse_width_lo(value),
            reg::PWHI1 => self.voices[0].wave.set_pulse_width_hi(value),
            reg::CR1 => self.write_control(0, value),
            reg::AD1 => self.voices[0].envelope.set_attack_decay(value),
            reg::SR1 => self.voices[0].envelope.set_sustain_release(value),
            reg::FREQLO2 => self.voices[1].wave.set_frequency_lo(value),
            reg::FREQHI2 => self.voices[1].wave.set_frequency_hi(value),
            reg::PWLO2 => self.voices[1].wave.set_pulse_width_lo(value),
            reg::PWHI2 => self.voices[1].wave.set_pulse_width_hi(value),
            reg::CR2 => self.write_control(1, value),
            reg::AD2 => self.voices[1].envelope.set_attack_decay(value),
            reg::SR2 => self.voices[1].envelope.set_sustain_release(value),
            reg::FREQLO3 => self.voices[2].wave.set_frequency_lo(value),
            reg::FREQHI3 => self.voices[2].wave.set_frequency_hi(value),
            reg::PWLO3 => self.voices[2].wave.set_pulse_width_lo(value),
            reg::PWHI3 => self.voices[2].wave.set_pulse_width_hi(value),
            reg::CR3 => self.write_control(2, value),
            reg::AD3 => self.voices[2].envelope.set_attack_decay(value),
            reg::SR3 => self.voices[2].envelope.set_sustain_release(value),
            reg::FCLO => self.filter.set_fc_lo(value),
            reg::FCHI => self.filter.set_fc_hi(value),
            reg::RESFILT => self.filter.set_res_filt(value),
            reg::MODVOL => self.filter.set_mode_vol(value),
            _ => {}
        }
    }

    // The register path hands the next voice's generator to the control write.
    fn write_control(&mut self, i: usize, value: u8) {
        let Syncable { main, sync_dest, .. } = self.syncable_voice_mut(i);
        main.set_control(value, &sync_dest.wave);
    }
}

#[inline]
pub fn saturate(sample: f32) -> i16 {
    if sample >= OUTPUT_HALF - 1.0 {
        i16::max_value()
    } else if sample <= -OUTPUT_HALF {
        i16::min_value()
    } else {
        sample as i16
    }
}
