// This file is part of resid-fp.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! FIR convolution kernels.
//!
//! All kernels accumulate in wrapping 32-bit integer arithmetic. Addition modulo
//! 2^32 is associative, so the vector kernels return exactly the scalar result
//! regardless of how they split and reorder the sum.

#![cfg_attr(feature = "cargo-clippy", allow(clippy::cast_ptr_alignment))]

use alloc::vec;
use alloc::vec::Vec;

pub type ConvolveFn = fn(&[i16], &[i16]) -> i32;

/// A convolution implementation selected for the host CPU.
#[derive(Clone, Copy)]
pub struct Kernel {
    pub name: &'static str,
    pub func: ConvolveFn,
}

impl Kernel {
    #[inline]
    pub fn convolve(&self, samples: &[i16], fir: &[i16]) -> i32 {
        (self.func)(samples, fir)
    }
}

pub const SCALAR: Kernel = Kernel {
    name: "scalar",
    func: convolve_scalar,
};

/// Picks the fastest kernel the host supports.
pub fn detect() -> Kernel {
    available().pop().unwrap_or(SCALAR)
}

/// Every kernel usable on this host, slowest first.
pub fn available() -> Vec<Kernel> {
    #[allow(unused_mut)]
    let mut kernels = vec![SCALAR];
    #[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
    {
        if is_x86_feature_detected!("sse2") {
            kernels.push(Kernel {
                name: "sse2",
                func: x86::convolve_sse2,
            });
        }
        if is_x86_feature_detected!("avx2") {
            kernels.push(Kernel {
                name: "avx2",
                func: x86::convolve_avx2,
            });
        }
    }
    kernels
}

pub fn convolve_scalar(samples: &[i16], fir: &[i16]) -> i32 {
    samples
        .iter()
        .zip(fir.iter())
        .fold(0i32, |sum, (&s, &f)| sum.wrapping_add(s as i32 * f as i32))
}

#[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
mod x86 {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::*;
    use core::cmp;

    use super::convolve_scalar;

    // These wrappers are only handed out by `available` after the matching
    // feature has been detected at runtime.
    pub fn convolve_avx2(samples: &[i16], fir: &[i16]) -> i32 {
        unsafe { convolve_avx2_impl(samples, fir) }
    }

    pub fn convolve_sse2(samples: &[i16], fir: &[i16]) -> i32 {
        unsafe { convolve_sse2_impl(samples, fir) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn convolve_avx2_impl(samples: &[i16], fir: &[i16]) -> i32 {
        let len = cmp::min(samples.len(), fir.len());
        let mut fs = &fir[..len];
        let mut ss = &samples[..len];
        let mut v1 = _mm256_setzero_si256();
        let mut v2 = _mm256_setzero_si256();
        let mut v3 = _mm256_setzero_si256();
        let mut v4 = _mm256_setzero_si256();
        while fs.len() >= 64 {
            let sv1 = _mm256_loadu_si256(ss.as_ptr() as *const _);
            let sv2 = _mm256_loadu_si256(ss[16..].as_ptr() as *const _);
            let sv3 = _mm256_loadu_si256(ss[32..].as_ptr() as *const _);
            let sv4 = _mm256_loadu_si256(ss[48..].as_ptr() as *const _);
            let fv1 = _mm256_loadu_si256(fs.as_ptr() as *const _);
            let fv2 = _mm256_loadu_si256(fs[16..].as_ptr() as *const _);
            let fv3 = _mm256_loadu_si256(fs[32..].as_ptr() as *const _);
            let fv4 = _mm256_loadu_si256(fs[48..].as_ptr() as *const _);
            v1 = _mm256_add_epi32(v1, _mm256_madd_epi16(sv1, fv1));
            v2 = _mm256_add_epi32(v2, _mm256_madd_epi16(sv2, fv2));
            v3 = _mm256_add_epi32(v3, _mm256_madd_epi16(sv3, fv3));
            v4 = _mm256_add_epi32(v4, _mm256_madd_epi16(sv4, fv4));
            fs = &fs[64..];
            ss = &ss[64..];
        }
        v1 = _mm256_add_epi32(v1, v2);
        v3 = _mm256_add_epi32(v3, v4);
        v1 = _mm256_add_epi32(v1, v3);
        let mut va = [0i32; 8];
        _mm256_storeu_si256(va.as_mut_ptr() as *mut _, v1);
        let v = va.iter().fold(0i32, |sum, &x| sum.wrapping_add(x));
        v.wrapping_add(convolve_scalar(ss, fs))
    }

    #[target_feature(enable = "sse2")]
    unsafe fn convolve_sse2_impl(samples: &[i16], fir: &[i16]) -> i32 {
        let len = cmp::min(samples.len(), fir.len());
        let mut fs = &fir[..len];
        let mut ss = &samples[..len];
        let mut v1 = _mm_setzero_si128();
        let mut v2 = _mm_setzero_si128();
        let mut v3 = _mm_setzero_si128();
        let mut v4 = _mm_setzero_si128();
        while fs.len() >= 32 {
            let sv1 = _mm_loadu_si128(ss.as_ptr() as *const _);
            let sv2 = _mm_loadu_si128(ss[8..].as_ptr() as *const _);
            let sv3 = _mm_loadu_si128(ss[16..].as_ptr() as *const _);
            let sv4 = _mm_loadu_si128(ss[24..].as_ptr() as *const _);
            let fv1 = _mm_loadu_si128(fs.as_ptr() as *const _);
            let fv2 = _mm_loadu_si128(fs[8..].as_ptr() as *const _);
            let fv3 = _mm_loadu_si128(fs[16..].as_ptr() as *const _);
            let fv4 = _mm_loadu_si128(fs[24..].as_ptr() as *const _);
            v1 = _mm_add_epi32(v1, _mm_madd_epi16(sv1, fv1));
            v2 = _mm_add_epi32(v2, _mm_madd_epi16(sv2, fv2));
            v3 = _mm_add_epi32(v3, _mm_madd_epi16(sv3, fv3));
            v4 = _mm_add_epi32(v4, _mm_madd_epi16(sv4, fv4));
            fs = &fs[32..];
            ss = &ss[32..];
        }
        v1 = _mm_add_epi32(v1, v2);
        v3 = _mm_add_epi32(v3, v4);
        v1 = _mm_add_epi32(v1, v3);
        let mut va = [0i32; 4];
        _mm_storeu_si128(va.as_mut_ptr() as *mut _, v1);
        let v = va.iter().fold(0i32, |sum, &x| sum.wrapping_add(x));
        v.wrapping_add(convolve_scalar(ss, fs))
    }
}
