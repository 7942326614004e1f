// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

/// Paddle input sampled by the POTX/POTY registers.
///
/// With nothing connected the sampling capacitor never charges within the
/// measurement window, so an unset potentiometer reads 0xff.
#[derive(Clone, Copy, Debug)]
pub struct Potentiometer {
    value: u8,
}

impl Default for Potentiometer {
    fn default() -> Self {
        Potentiometer { value: 0xff }
    }
}

impl Potentiometer {
    pub fn read(&self) -> u8 {
        self.value
    }

    pub fn set(&mut self, value: u8) {
        self.value = value;
    }
}
