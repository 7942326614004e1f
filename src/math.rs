// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

// Transcendental functions are only needed while building tables and filter
// coefficients; libm stands in for them without std.

#[cfg(feature = "std")]
mod imp {
    pub fn ceil(x: f64) -> f64 {
        x.ceil()
    }
    pub fn log10(x: f64) -> f64 {
        x.log10()
    }
    pub fn log2(x: f64) -> f64 {
        x.log2()
    }
    pub fn pow(x: f64, y: f64) -> f64 {
        x.powf(y)
    }
    pub fn round(x: f64) -> f64 {
        x.round()
    }
    pub fn sin(x: f64) -> f64 {
        x.sin()
    }
    pub fn sqrt(x: f64) -> f64 {
        x.sqrt()
    }
}

#[cfg(not(feature = "std"))]
mod imp {
    pub fn ceil(x: f64) -> f64 {
        libm::ceil(x)
    }
    pub fn log10(x: f64) -> f64 {
        libm::log10(x)
    }
    pub fn log2(x: f64) -> f64 {
        libm::log2(x)
    }
    pub fn pow(x: f64, y: f64) -> f64 {
        libm::pow(x, y)
    }
    pub fn round(x: f64) -> f64 {
        libm::round(x)
    }
    pub fn sin(x: f64) -> f64 {
        libm::sin(x)
    }
    pub fn sqrt(x: f64) -> f64 {
        libm::sqrt(x)
    }
}

pub use self::imp::*;

#[inline]
pub fn abs(x: f64) -> f64 {
    if x < 0.0 {
        -x
    } else {
        x
    }
}
