// This file is part of resid-fp.
// Copyright (c) 2017-2018 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use alloc::sync::Arc;

use super::envelope::EnvelopeGenerator;
use super::tables::ChipTables;
use super::wave::{Syncable, WaveformGenerator};
use super::ChipModel;

/// The envelope multiplying D/A converter of the 6581 adds a DC offset of about
/// half the dynamic range of one voice. There is no such offset in the MOS8580.
const VOICE_DC_6581: f32 = (0x800 * 0xff) as f32;

pub struct Voice {
    // Configuration
    voice_dc: f32,
    // Generators
    pub envelope: EnvelopeGenerator,
    pub wave: WaveformGenerator,
}

impl Voice {
    pub fn new(chip_model: ChipModel, tables: Arc<ChipTables>) -> Self {
        Voice {
            voice_dc: Self::voice_dc(chip_model),
            envelope: EnvelopeGenerator::new(tables.clone()),
            wave: WaveformGenerator::new(tables),
        }
    }

    fn voice_dc(chip_model: ChipModel) -> f32 {
        match chip_model {
            ChipModel::Mos6581 => VOICE_DC_6581,
            ChipModel::Mos8580 => 0.0,
        }
    }

    pub fn set_chip_model(&mut self, chip_model: ChipModel, tables: Arc<ChipTables>) {
        self.voice_dc = Self::voice_dc(chip_model);
        self.envelope.set_tables(tables.clone());
        self.wave.set_tables(tables);
    }

    /// Control register write; `source` is the generator wired as ring/sync source
    /// for the register path.
    pub fn set_control(&mut self, value: u8, source: &WaveformGenerator) {
        self.envelope.set_control(value);
        self.wave.set_control(value, source);
    }

    /// Amplitude modulated waveform output.
    /// Range [-2048*255, 2047*255] plus the voice DC offset.
    #[inline]
    pub fn output(&self, source: &WaveformGenerator) -> f32 {
        self.wave.output(source) * self.envelope.output() + self.voice_dc
    }

    pub fn mute(&mut self, enable: bool) {
        self.envelope.mute(enable);
        self.wave.mute(enable);
    }

    pub fn reset(&mut self) {
        self.envelope.reset();
        self.wave.reset();
    }
}

impl<'a> Syncable<&'a Voice> {
    pub fn output(&self) -> f32 {
        self.main.output(&self.sync_source.wave)
    }

    pub fn wave(self) -> Syncable<&'a WaveformGenerator> {
        let Syncable {
            main,
            sync_dest,
            sync_source,
        } = self;
        Syncable {
            main: &main.wave,
            sync_dest: &sync_dest.wave,
            sync_source: &sync_source.wave,
        }
    }
}

impl<'a> Syncable<&'a mut Voice> {
    pub fn wave(self) -> Syncable<&'a mut WaveformGenerator> {
        let Syncable {
            main,
            sync_dest,
            sync_source,
        } = self;
        Syncable {
            main: &mut main.wave,
            sync_dest: &mut sync_dest.wave,
            sync_source: &mut sync_source.wave,
        }
    }
}
