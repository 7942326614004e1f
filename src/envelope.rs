// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use alloc::sync::Arc;

use bit_field::BitField;

use super::tables::ChipTables;

const RATE_COUNTER_MASK: u16 = 0x7fff;
const RATE_COUNTER_MSB_MASK: u16 = 0x8000;

// Rate counter periods, in cycles between envelope counter steps, derived from
// the Envelope Rates table in the Programmer's Reference Guide. Measured on real
// chips, each value is the rounded-down quotient plus one: the comparison value
// is used directly and the counter reset costs an extra cycle.
static RATE_COUNTER_PERIOD: [u16; 16] = [
    9,     // 2ms
    32,    // 8ms
    63,    // 16ms
    95,    // 24ms
    149,   // 38ms
    220,   // 56ms
    267,   // 68ms
    313,   // 80ms
    392,   // 100ms
    977,   // 250ms
    1954,  // 500ms
    3126,  // 800ms
    3907,  // 1s
    11720, // 3s
    19532, // 5s
    31251, // 8s
];

// Both nibbles of the envelope counter are compared with the sustain value.
static SUSTAIN_LEVEL: [u8; 16] = [
    0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
    0xff,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Attack,
    DecaySustain,
    Release,
}

// ----------------------------------------------------------------------------
// A 15 bit rate counter divides the clock down to the selected envelope rate.
// During decay and release a second, exponential counter divides it further;
// its period is 1, 2, 4, 8, 16, 30 at envelope levels 255, 93, 54, 26, 14, 6,
// which approximates the exponential discharge of the real chip.
// ----------------------------------------------------------------------------

pub struct EnvelopeGenerator {
    // Static Data
    tables: Arc<ChipTables>,
    // Configuration
    attack: u8,
    decay: u8,
    sustain: u8,
    release: u8,
    muted: bool,
    // Control
    gate: bool,
    // Runtime State
    state: State,
    envelope_counter: u8,
    exponential_counter: u8,
    exponential_counter_period: u8,
    hold_zero: bool,
    rate_counter: u16,
    rate_period: u16,
}

impl EnvelopeGenerator {
    pub fn new(tables: Arc<ChipTables>) -> Self {
        let mut envelope = EnvelopeGenerator {
            tables,
            attack: 0,
            decay: 0,
            sustain: 0,
            release: 0,
            muted: false,
            gate: false,
            state: State::Release,
            envelope_counter: 0,
            exponential_counter: 0,
            exponential_counter_period: 1,
            hold_zero: true,
            rate_counter: 0,
            rate_period: 0,
        };
        envelope.reset();
        envelope
    }

    pub fn set_tables(&mut self, tables: Arc<ChipTables>) {
        self.tables = tables;
    }

    // -- Register Access

    pub fn get_attack_decay(&self) -> u8 {
        (self.attack << 4) | self.decay
    }

    pub fn get_sustain_release(&self) -> u8 {
        (self.sustain << 4) | self.release
    }

    pub fn get_gate(&self) -> bool {
        self.gate
    }

    pub fn get_state(&self) -> State {
        self.state
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_attack_decay(&mut self, value: u8) {
        self.attack = value.get_bits(4..8);
        self.decay = value.get_bits(0..4);
        match self.state {
            State::Attack => self.rate_period = RATE_COUNTER_PERIOD[self.attack as usize],
            State::DecaySustain => self.rate_period = RATE_COUNTER_PERIOD[self.decay as usize],
            State::Release => {}
        }
    }

    pub fn set_sustain_release(&mut self, value: u8) {
        self.sustain = value.get_bits(4..8);
        self.release = value.get_bits(0..4);
        if self.state == State::Release {
            self.rate_period = RATE_COUNTER_PERIOD[self.release as usize];
        }
    }

    pub fn set_control(&mut self, value: u8) {
        let gate = value.get_bit(0);
        if !self.gate && gate {
            // Gate on starts attack, which also unlocks the zero freeze.
            self.state = State::Attack;
            self.rate_period = RATE_COUNTER_PERIOD[self.attack as usize];
            self.hold_zero = false;
        } else if self.gate && !gate {
            self.state = State::Release;
            self.rate_period = RATE_COUNTER_PERIOD[self.release as usize];
        }
        self.gate = gate;
    }

    pub fn mute(&mut self, enable: bool) {
        self.muted = enable;
    }

    pub fn clock(&mut self) {
        // ADSR delay bug: when the period is lowered below the current count, the
        // counter runs on until it wraps at 0x8000 before the next step.
        self.rate_counter = self.rate_counter.wrapping_add(1);
        if self.rate_counter & RATE_COUNTER_MSB_MASK != 0 {
            self.rate_counter = (self.rate_counter + 1) & RATE_COUNTER_MASK;
        }
        if self.rate_counter != self.rate_period {
            return;
        }
        self.rate_counter = 0;

        // The first step in attack also resets the exponential counter.
        self.exponential_counter = self.exponential_counter.wrapping_add(1);
        if self.state != State::Attack
            && self.exponential_counter != self.exponential_counter_period
        {
            return;
        }
        self.exponential_counter = 0;

        if self.hold_zero {
            return;
        }

        match self.state {
            State::Attack => {
                // Counting past 0xff wraps to zero, which then freezes the counter
                // until the gate goes through release and back into attack.
                self.envelope_counter = self.envelope_counter.wrapping_add(1);
                if self.envelope_counter == 0xff {
                    self.state = State::DecaySustain;
                    self.rate_period = RATE_COUNTER_PERIOD[self.decay as usize];
                }
            }
            State::DecaySustain => {
                if self.envelope_counter != SUSTAIN_LEVEL[self.sustain as usize] {
                    self.envelope_counter = self.envelope_counter.wrapping_sub(1);
                }
            }
            State::Release => {
                // Going attack then release at zero makes the counter wrap to 0xff
                // and keep counting down.
                self.envelope_counter = self.envelope_counter.wrapping_sub(1);
            }
        }

        self.exponential_counter_period = match self.envelope_counter {
            0xff => 1,
            0x5d => 2,
            0x36 => 4,
            0x1a => 8,
            0x0e => 16,
            0x06 => 30,
            0x00 => {
                // Reaching zero freezes the counter.
                self.hold_zero = true;
                1
            }
            _ => self.exponential_counter_period,
        };
    }

    /// Analog envelope level as seen by the voice multiplier.
    #[inline]
    pub fn output(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.tables.envelope_level(self.envelope_counter)
        }
    }

    /// Raw envelope counter, as read from ENV3.
    pub fn read_env(&self) -> u8 {
        self.envelope_counter
    }

    pub fn reset(&mut self) {
        self.attack = 0;
        self.decay = 0;
        self.sustain = 0;
        self.release = 0;
        self.gate = false;
        self.state = State::Release;
        self.envelope_counter = 0;
        self.exponential_counter = 0;
        self.exponential_counter_period = 1;
        self.hold_zero = true;
        self.rate_counter = 0;
        self.rate_period = RATE_COUNTER_PERIOD[self.release as usize];
    }
}
