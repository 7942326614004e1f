extern crate rand;
extern crate resid_fp;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use resid_fp::tables::ChipTables;
use resid_fp::wave::{Syncable, WaveformGenerator, NOISE_OVERWRITE_DELAY};
use resid_fp::ChipModel;

fn setup(wave: &mut WaveformGenerator, source: &WaveformGenerator, control: u8, freq: u16, pw: u16) {
    wave.set_control(control, source);
    wave.set_frequency_hi((freq >> 8) as u8);
    wave.set_frequency_lo((freq & 0xff) as u8);
    wave.set_pulse_width_hi((pw >> 8) as u8);
    wave.set_pulse_width_lo((pw & 0xff) as u8);
}

fn generators(chip_model: ChipModel) -> (WaveformGenerator, WaveformGenerator) {
    let tables = ChipTables::shared(chip_model);
    (
        WaveformGenerator::new(tables.clone()),
        WaveformGenerator::new(tables),
    )
}

#[test]
fn accumulator_and_pulse_width_stay_masked() {
    let (mut wave, _) = generators(ChipModel::Mos6581);
    let mut rng = StdRng::seed_from_u64(6581);
    for _ in 0..2000 {
        match rng.gen_range(0..5) {
            0 => wave.set_frequency_lo(rng.gen()),
            1 => wave.set_frequency_hi(rng.gen()),
            2 => wave.set_pulse_width_lo(rng.gen()),
            3 => wave.set_pulse_width_hi(rng.gen()),
            _ => wave.set_acc(rng.gen()),
        }
        for _ in 0..rng.gen_range(1..100) {
            wave.clock();
            assert!(wave.get_acc() < 1 << 24);
        }
        assert!(wave.get_pulse_width() <= 0x0fff);
        assert!(wave.pulse_threshold() <= 1 << 24);
    }
}

#[test]
fn waveform_zero_holds_last_level() {
    let (mut wave, source) = generators(ChipModel::Mos6581);
    setup(&mut wave, &source, 0x20, 0x1234, 0);
    for _ in 0..5000 {
        wave.clock();
    }
    let level = wave.output(&source);
    let osc = wave.read_osc(&source, false);
    wave.set_control(0x00, &source);
    for _ in 0..100_000 {
        wave.clock();
        assert_eq!(wave.output(&source), level);
        assert_eq!(wave.read_osc(&source, false), osc);
    }
    wave.set_control(0x20, &source);
    assert_eq!(
        wave.read_osc(&source, false),
        (wave.get_acc() >> 16) as u8
    );
}

#[test]
fn sync_exception() {
    let tables = ChipTables::shared(ChipModel::Mos6581);
    let mut main = WaveformGenerator::new(tables.clone());
    let mut dest = WaveformGenerator::new(tables.clone());
    let mut source = WaveformGenerator::new(tables);
    // All three generators are about to cross bit 23 on the next cycle.
    for wave in [&mut main, &mut source].iter_mut() {
        wave.set_frequency_lo(1);
        wave.set_acc(0x7f_ffff);
    }
    let idle = WaveformGenerator::new(ChipTables::shared(ChipModel::Mos6581));
    dest.set_control(0x22, &idle);
    dest.set_frequency_hi(0x10);
    dest.set_acc(0x12_3456);

    // The sync source is itself synced on the cycle its MSB rises.
    main.set_control(0x22, &idle);
    main.clock();
    dest.clock();
    source.clock();
    assert!(main.is_msb_rising());
    assert!(source.is_msb_rising());
    Syncable {
        main: &mut main,
        sync_dest: &mut dest,
        sync_source: &mut source,
    }
    .synchronize();
    assert_eq!(dest.get_acc(), 0x12_3456 + 0x1000);

    // Same edge without the source being synced resets the destination.
    main.set_control(0x20, &idle);
    main.set_acc(0x7f_ffff);
    source.set_acc(0x7f_ffff);
    main.clock();
    dest.clock();
    source.clock();
    Syncable {
        main: &mut main,
        sync_dest: &mut dest,
        sync_source: &mut source,
    }
    .synchronize();
    assert_eq!(dest.get_acc(), 0);
}

#[test]
fn ring_modulation_flips_triangle_phase() {
    let (mut wave, mut source) = generators(ChipModel::Mos8580);
    let (mut reference, idle) = generators(ChipModel::Mos8580);
    wave.set_control(0x14, &idle);
    wave.set_acc(0x20_0000);
    reference.set_control(0x10, &idle);
    reference.set_acc(0xa0_0000);

    assert_ne!(wave.output(&idle), reference.output(&idle));
    source.set_acc(0x80_0000);
    assert_eq!(wave.output(&source), reference.output(&idle));
    assert_eq!(
        wave.read_osc(&source, false),
        reference.read_osc(&idle, false)
    );

    // Ring modulation has no effect without triangle.
    wave.set_control(0x24, &idle);
    assert_eq!(wave.read_osc(&source, false), 0x20);
}

#[test]
fn sawtooth_read_back_tracks_accumulator() {
    for &chip_model in [ChipModel::Mos6581, ChipModel::Mos8580].iter() {
        let (mut wave, source) = generators(chip_model);
        setup(&mut wave, &source, 0x20, 0x0f1d, 0);
        for _ in 0..20_000 {
            let prev = wave.get_acc();
            wave.clock();
            assert_eq!(wave.read_osc(&source, false), (wave.get_acc() >> 16) as u8);
            assert_eq!(wave.read_osc(&source, true), (prev >> 16) as u8);
        }
    }
}

#[test]
fn sawtooth_is_linear_with_ideal_dac() {
    let (mut wave, source) = generators(ChipModel::Mos8580);
    wave.set_control(0x20, &source);
    for phase in (0..4096u32).step_by(37) {
        wave.set_acc(phase << 12);
        assert_eq!(wave.output(&source), phase as f32 - 2048.0);
    }
}

#[test]
fn pulse_compares_against_threshold() {
    let (mut wave, source) = generators(ChipModel::Mos8580);
    setup(&mut wave, &source, 0x40, 0, 0x800);
    wave.set_acc(0x7f_f000);
    assert_eq!(wave.read_osc(&source, false), 0x00);
    assert_eq!(wave.output(&source), -2048.0);
    wave.set_acc(0x80_0000);
    assert_eq!(wave.read_osc(&source, false), 0xff);
    assert_eq!(wave.output(&source), 2047.0);
    // Test bit forces the comparator high.
    wave.set_acc(0);
    wave.set_control(0x48, &source);
    assert_eq!(wave.read_osc(&source, false), 0xff);
}

#[test]
fn noise_output_taps() {
    let (mut wave, source) = generators(ChipModel::Mos6581);
    assert_eq!(wave.get_shift(), 0x7f_fff8);
    wave.set_control(0x80, &source);
    // Bit 2 of the reset register is the only clear tap.
    assert_eq!(wave.read_osc(&source, false), 0xfe);
    let level = wave.output(&source);
    assert_eq!(level, wave.tables().noise_level(0xfe));
}

#[test]
fn combined_noise_clears_taps() {
    let (mut wave, source) = generators(ChipModel::Mos6581);
    wave.set_control(0x90, &source);
    assert_eq!(wave.read_osc(&source, false), 0x00);
}

#[test]
fn noise_clocked_by_accumulator_bit_19() {
    let (mut wave, source) = generators(ChipModel::Mos6581);
    setup(&mut wave, &source, 0x80, 0x1000, 0);
    let shift = wave.get_shift();
    // Bit 19 rises after 0x80 cycles.
    for _ in 0..0x7f {
        wave.clock();
    }
    assert_eq!(wave.get_shift(), shift);
    wave.clock();
    assert_ne!(wave.get_shift(), shift);
}

#[test]
fn test_bit_holds_and_bleeds_noise() {
    let (mut wave, source) = generators(ChipModel::Mos6581);
    setup(&mut wave, &source, 0x20, 0x4000, 0);
    for _ in 0..1000 {
        wave.clock();
    }
    wave.set_control(0x08, &source);
    assert_eq!(wave.get_acc(), 0);
    assert_eq!(wave.get_noise_overwrite_delay(), NOISE_OVERWRITE_DELAY);
    for _ in 0..NOISE_OVERWRITE_DELAY {
        wave.clock();
        assert_eq!(wave.get_acc(), 0);
        assert!(!wave.is_msb_rising());
    }
    assert_eq!(wave.get_shift(), 0x7f_ffff);

    // Releasing test clocks the register once with a zero feedback bit.
    wave.set_control(0x00, &source);
    assert_eq!(wave.get_shift(), 0x7f_fffe);
    wave.clock();
    assert_eq!(wave.get_acc(), 0x4000);
}

#[test]
fn mute_silences_output_only() {
    let (mut wave, source) = generators(ChipModel::Mos8580);
    setup(&mut wave, &source, 0x20, 0x1000, 0);
    for _ in 0..300 {
        wave.clock();
    }
    wave.mute(true);
    assert_eq!(wave.output(&source), 0.0);
    assert_eq!(wave.read_osc(&source, false), (wave.get_acc() >> 16) as u8);
    wave.mute(false);
    assert_ne!(wave.output(&source), 0.0);
}

#[test]
fn reset_clears_registers() {
    let (mut wave, source) = generators(ChipModel::Mos6581);
    setup(&mut wave, &source, 0x4e, 0xffff, 0xfff);
    wave.clock();
    wave.reset();
    assert_eq!(wave.get_acc(), 0);
    assert_eq!(wave.get_frequency(), 0);
    assert_eq!(wave.get_pulse_width(), 0);
    assert_eq!(wave.get_control(), 0);
    assert_eq!(wave.get_shift(), 0x7f_fff8);
}

#[test]
fn combined_waveform_read_back() {
    // (waveform, test bit, phase, OSC3)
    let cases_6581 = [
        (3u8, false, 0x0ffu32, 0x07u8),
        (3, false, 0x7ff, 0x7f),
        (5, true, 0x1ff, 0x3f),
        (5, true, 0x5ff, 0xbf),
        (6, true, 0x1ff, 0x1f),
        (6, true, 0xf00, 0x80),
        (7, true, 0x0ff, 0x00),
        (7, true, 0x7ff, 0x7f),
    ];
    let cases_8580 = [
        (3u8, false, 0x7ffu32, 0x3fu8),
        (3, false, 0xfff, 0xff),
        (5, true, 0x0ff, 0x07),
        (5, true, 0x1ff, 0x1f),
        (6, true, 0x3ff, 0x1f),
        (6, true, 0xf00, 0xc0),
        (7, true, 0x3ff, 0x0f),
        (7, true, 0xfff, 0xff),
    ];
    for &(chip_model, cases) in [
        (ChipModel::Mos6581, &cases_6581),
        (ChipModel::Mos8580, &cases_8580),
    ]
    .iter()
    {
        let (mut wave, source) = generators(chip_model);
        for &(waveform, test, phase, expected) in cases.iter() {
            let control = (waveform << 4) | if test { 0x08 } else { 0x00 };
            wave.set_control(control, &source);
            wave.set_acc(phase << 12);
            assert_eq!(
                wave.read_osc(&source, false),
                expected,
                "{:?} waveform {} phase {:03x}",
                chip_model,
                waveform,
                phase
            );
            wave.reset();
        }
    }
}

#[test]
fn waveform_zero_latches_level_while_muted() {
    let (mut wave, source) = generators(ChipModel::Mos8580);
    setup(&mut wave, &source, 0x20, 0x1234, 0);
    for _ in 0..5000 {
        wave.clock();
    }
    let level = wave.output(&source);
    assert!(level != 0.0);
    wave.mute(true);
    wave.set_control(0x00, &source);
    assert_eq!(wave.output(&source), 0.0);
    wave.mute(false);
    assert_eq!(wave.output(&source), level);
}
