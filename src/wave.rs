/*
 * Copyright (c) 2017 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
 * Portions (c) 2004 Dag Lem <resid@nimrod.no>
 * Portions (c) 2008 Antti S. Lankila
 *
 * This file is part of resid-fp.
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use alloc::sync::Arc;

use bit_field::BitField;

use super::tables::{combine_waveform, ChipTables};

const ACC_MASK: u32 = 0x00ff_ffff;
const ACC_BIT19_MASK: u32 = 0x0008_0000;
const ACC_MSB_MASK: u32 = 0x0080_0000;
const SHIFT_MASK: u32 = 0x007f_ffff;
const SHIFT_RESET: u32 = 0x007f_fff8;

// Noise register taps feeding OSC3 bits 7..0.
const NOISE_TAPS: [u32; 8] = [2, 4, 7, 11, 13, 16, 20, 22];
const NOISE_TAP_MASK: u32 =
    (1 << 22) | (1 << 20) | (1 << 16) | (1 << 13) | (1 << 11) | (1 << 7) | (1 << 4) | (1 << 2);

/// Cycles the test bit must be held before the noise register bleeds to all ones.
pub const NOISE_OVERWRITE_DELAY: u32 = 200_000;

/// A waveform generator together with the generators it is wired to.
///
/// `main` resets `sync_dest` on its MSB edge and is itself modulated and synced
/// by `sync_source`.
pub struct Syncable<T> {
    pub main: T,
    pub sync_dest: T,
    pub sync_source: T,
}

impl Syncable<&'_ mut WaveformGenerator> {
    /// Hard sync, run after all three generators have been clocked.
    pub fn synchronize(&mut self) {
        // A special case occurs when a sync source is synced itself on the same
        // cycle as when its MSB is set high. In this case the destination will
        // not be synced. This has been verified by sampling OSC3.
        if self.main.is_msb_rising()
            && self.sync_dest.is_sync()
            && !(self.main.is_sync() && self.sync_source.is_msb_rising())
        {
            self.sync_dest.set_acc(0);
        }
    }
}

// ----------------------------------------------------------------------------
// A 24 bit accumulator is the basis for waveform generation. FREQ is added to
// the lower 16 bits of the accumulator each cycle.
// The accumulator is set to zero when TEST is set, and starts counting
// when TEST is cleared.
// The noise waveform is taken from intermediate bits of a 23 bit shift
// register. This register is clocked by bit 19 of the accumulator.
// ----------------------------------------------------------------------------

pub struct WaveformGenerator {
    // Static Data
    tables: Arc<ChipTables>,
    // Configuration
    frequency: u16,
    pulse_width: u16,
    muted: bool,
    // Control
    waveform: u8,
    ring: bool,
    sync: bool,
    test: bool,
    // Runtime State
    acc: u32,
    acc_prev: u32,
    shift: u32,
    msb_rising: bool,
    noise_overwrite_delay: u32,
    previous: u8,
    previous_dac: f32,
}

impl WaveformGenerator {
    pub fn new(tables: Arc<ChipTables>) -> Self {
        let mut wave = WaveformGenerator {
            tables,
            frequency: 0,
            pulse_width: 0,
            muted: false,
            waveform: 0,
            ring: false,
            sync: false,
            test: false,
            acc: 0,
            acc_prev: 0,
            shift: 0,
            msb_rising: false,
            noise_overwrite_delay: 0,
            previous: 0,
            previous_dac: 0.0,
        };
        wave.reset();
        wave
    }

    pub fn set_tables(&mut self, tables: Arc<ChipTables>) {
        self.tables = tables;
    }

    pub fn tables(&self) -> &ChipTables {
        &self.tables
    }

    // -- Register Access

    pub fn get_control(&self) -> u8 {
        let mut value = self.waveform << 4;
        value.set_bit(3, self.test);
        value.set_bit(2, self.ring);
        value.set_bit(1, self.sync);
        value
    }

    pub fn get_frequency(&self) -> u16 {
        self.frequency
    }

    pub fn get_frequency_hi(&self) -> u8 {
        (self.frequency >> 8) as u8
    }

    pub fn get_frequency_lo(&self) -> u8 {
        (self.frequency & 0x00ff) as u8
    }

    pub fn get_pulse_width(&self) -> u16 {
        self.pulse_width
    }

    pub fn get_pulse_width_hi(&self) -> u8 {
        (self.pulse_width >> 8) as u8
    }

    pub fn get_pulse_width_lo(&self) -> u8 {
        (self.pulse_width & 0x00ff) as u8
    }

    pub fn set_frequency_hi(&mut self, value: u8) {
        self.frequency = (self.frequency & 0x00ff) | ((value as u16) << 8);
    }

    pub fn set_frequency_lo(&mut self, value: u8) {
        self.frequency = (self.frequency & 0xff00) | (value as u16);
    }

    pub fn set_pulse_width_hi(&mut self, value: u8) {
        self.pulse_width = (self.pulse_width & 0x00ff) | (((value & 0x0f) as u16) << 8);
    }

    pub fn set_pulse_width_lo(&mut self, value: u8) {
        self.pulse_width = (self.pulse_width & 0x0f00) | (value as u16);
    }

    /// Control register write. `source` is only read, to latch the held output
    /// when the waveform is switched off.
    pub fn set_control(&mut self, value: u8, source: &WaveformGenerator) {
        let waveform = value.get_bits(4..8);
        let test = value.get_bit(3);

        // Waveform 0 holds the last output level rather than dropping to zero.
        if waveform == 0 && self.waveform != 0 && self.waveform <= 7 {
            self.previous = self.read_osc(source, false);
            self.previous_dac = self.level(source);
        }

        let test_prev = self.test;
        self.waveform = waveform;
        self.ring = value.get_bit(2);
        self.sync = value.get_bit(1);
        self.test = test;

        if test && !test_prev {
            // Test bit set. The accumulator is cleared, while the noise register
            // slowly bleeds towards all ones.
            self.acc = 0;
            self.acc_prev = 0;
            self.msb_rising = false;
            self.noise_overwrite_delay = NOISE_OVERWRITE_DELAY;
        } else {
            // Releasing the test bit clocks the noise register once.
            self.clock_noise(!test && test_prev);
        }
    }

    // -- Accessors

    pub fn get_acc(&self) -> u32 {
        self.acc
    }

    /// Accumulator value before the last clock.
    pub fn get_acc_prev(&self) -> u32 {
        self.acc_prev
    }

    pub fn get_shift(&self) -> u32 {
        self.shift
    }

    pub fn get_waveform(&self) -> u8 {
        self.waveform
    }

    pub fn get_noise_overwrite_delay(&self) -> u32 {
        self.noise_overwrite_delay
    }

    /// 24-bit threshold the accumulator is compared against for the pulse waveform.
    pub fn pulse_threshold(&self) -> u32 {
        (self.pulse_width as u32) << 12
    }

    pub fn is_msb_rising(&self) -> bool {
        self.msb_rising
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }

    pub fn is_test(&self) -> bool {
        self.test
    }

    pub fn is_ring_mod(&self) -> bool {
        self.ring
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_acc(&mut self, value: u32) {
        self.acc = value & ACC_MASK;
    }

    pub fn mute(&mut self, enable: bool) {
        self.muted = enable;
    }

    // -- Clocking

    pub fn clock(&mut self) {
        if self.test {
            self.acc_prev = self.acc;
            self.msb_rising = false;
            if self.noise_overwrite_delay != 0 {
                self.noise_overwrite_delay -= 1;
                if self.noise_overwrite_delay == 0 {
                    self.shift = SHIFT_MASK;
                    self.clock_noise(false);
                }
            }
            return;
        }
        self.acc_prev = self.acc;
        self.acc = (self.acc + self.frequency as u32) & ACC_MASK;
        let bits_set = !self.acc_prev & self.acc;
        // Check whether the MSB is set high. This is used for synchronization.
        self.msb_rising = bits_set & ACC_MSB_MASK != 0;
        // Shift noise register once for each time accumulator bit 19 is set high.
        if bits_set & ACC_BIT19_MASK != 0 {
            self.clock_noise(true);
        }
    }

    fn clock_noise(&mut self, clock: bool) {
        if clock {
            let bit0 = ((self.shift >> 22) ^ (self.shift >> 17) | self.test as u32) & 0x01;
            self.shift = ((self.shift << 1) | bit0) & SHIFT_MASK;
        }
        // Combined noise waveforms pull the tapped register bits low.
        if self.waveform > 8 {
            self.shift &= SHIFT_MASK ^ NOISE_TAP_MASK;
        }
        if self.waveform >= 8 {
            self.previous = self.noise_output();
            self.previous_dac = self.tables.noise_level(self.previous);
        }
    }

    // Noise:
    // The noise output is taken from intermediate bits of a 23-bit shift register
    // which is clocked by bit 19 of the accumulator.
    //
    //                   2 2 2 1 1 1 1 1 1 1 1 1 1
    // Register bits:    2 1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0
    //                   |   |       |     |   |       |     |   |
    // OSC3 bits  :      7   6       5     4   3       2     1   0
    fn noise_output(&self) -> u8 {
        NOISE_TAPS
            .iter()
            .enumerate()
            .fold(0u8, |value, (i, &tap)| {
                value | ((((self.shift >> tap) & 0x01) as u8) << i)
            })
    }

    // -- Output Functions

    /// Analog waveform level. `source` modulates the triangle when ring
    /// modulation is enabled.
    #[inline]
    pub fn output(&self, source: &WaveformGenerator) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level(source)
        }
    }

    // DAC level regardless of mute.
    #[inline]
    fn level(&self, source: &WaveformGenerator) -> f32 {
        if self.waveform == 0 || self.waveform > 7 {
            return self.previous_dac;
        }
        let mut phase = (self.acc >> 12) as usize;
        let slot = if self.waveform >= 4 && (self.test || self.acc >= self.pulse_threshold()) {
            self.waveform as usize + 3
        } else {
            self.waveform as usize - 1
        };
        if self.is_ring_modulated_by(source.acc) {
            phase ^= 0x800;
        }
        self.tables.waveform(slot, phase)
    }

    /// OSC3 style read-back of the upper 8 output bits. Does not alter any state.
    pub fn read_osc(&self, source: &WaveformGenerator, delayed: bool) -> u8 {
        if self.waveform == 0 || self.waveform > 7 {
            return self.previous;
        }
        let (mut acc, source_acc) = if delayed {
            (self.acc_prev, source.acc_prev)
        } else {
            (self.acc, source.acc)
        };
        let threshold = if self.test { 0 } else { self.pulse_threshold() };
        if self.is_ring_modulated_by(source_acc) {
            acc ^= ACC_MSB_MASK;
        }
        let bits = combine_waveform(self.tables.chip_model(), self.waveform, acc, threshold);
        bits[4..]
            .iter()
            .enumerate()
            .fold(0u8, |value, (i, &bit)| {
                if bit > 0.5 {
                    value | (1 << i)
                } else {
                    value
                }
            })
    }

    #[inline]
    fn is_ring_modulated_by(&self, source_acc: u32) -> bool {
        self.waveform & 3 == 1 && self.ring && source_acc & ACC_MSB_MASK != 0
    }

    pub fn reset(&mut self) {
        self.frequency = 0;
        self.pulse_width = 0;
        self.waveform = 0;
        self.ring = false;
        self.sync = false;
        self.test = false;
        self.acc = 0;
        self.acc_prev = 0;
        self.shift = SHIFT_RESET;
        self.msb_rising = false;
        self.noise_overwrite_delay = 0;
        self.previous = 0;
        self.previous_dac = 0.0;
    }
}
