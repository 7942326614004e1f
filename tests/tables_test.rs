extern crate resid_fp;

use resid_fp::dac::{build_wave_dac, kinked_dac};
use resid_fp::tables::{combine_waveform, ChipTables, PULSE_THRESHOLD_LOW, TABLE_SIZE};
use resid_fp::ChipModel;

#[test]
fn ideal_dac_is_binary_weighted() {
    for input in 0..4096 {
        assert_eq!(kinked_dac(input, 1.0, 12), input as f32);
    }
    let dac = build_wave_dac(1.0);
    for (i, &weight) in dac.iter().enumerate() {
        assert_eq!(weight, (1 << i) as f32);
    }
}

#[test]
fn kinked_dac_is_monotonic_per_bit() {
    let dac = build_wave_dac(0.96);
    for pair in dac.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    // Top bit weighs less than twice the bit below it.
    assert!(dac[11] < 2.0 * dac[10]);
}

#[test]
fn pulse_slots() {
    let tables = ChipTables::new(ChipModel::Mos8580, 1.0);
    for phase in 0..TABLE_SIZE {
        assert_eq!(tables.waveform(3, phase), -2048.0);
        assert_eq!(tables.waveform(7, phase), 2047.0);
    }
}

#[test]
fn pure_waveforms_are_digital() {
    for &chip_model in [ChipModel::Mos6581, ChipModel::Mos8580].iter() {
        for &waveform in [1u8, 2, 4].iter() {
            for phase in (0..4096u32).step_by(13) {
                let bits = combine_waveform(chip_model, waveform, phase << 12, PULSE_THRESHOLD_LOW);
                for &bit in bits.iter() {
                    assert!(bit == 0.0 || bit == 1.0);
                }
            }
        }
    }
}

#[test]
fn shared_tables_use_model_defaults() {
    let tables = ChipTables::shared(ChipModel::Mos6581);
    assert_eq!(tables.chip_model(), ChipModel::Mos6581);
    assert_eq!(tables.nonlinearity(), 0.96);
    assert_eq!(tables.wave_zero(), -896.0);
    let tables = ChipTables::shared(ChipModel::Mos8580);
    assert_eq!(tables.nonlinearity(), 1.0);
    assert_eq!(tables.wave_zero(), -2048.0);
}

#[test]
fn envelope_dac_range() {
    let tables = ChipTables::new(ChipModel::Mos8580, 1.0);
    for counter in 0..=255u8 {
        assert_eq!(tables.envelope_level(counter), counter as f32);
    }
}

fn osc_byte(chip_model: ChipModel, waveform: u8, phase: u32, pulse_threshold: u32) -> u8 {
    combine_waveform(chip_model, waveform, phase << 12, pulse_threshold)[4..]
        .iter()
        .enumerate()
        .fold(0, |value, (i, &bit)| if bit > 0.5 { value | (1 << i) } else { value })
}

fn count_phases<F: Fn(u32) -> bool>(pred: F) -> usize {
    (0..TABLE_SIZE as u32).filter(|&phase| pred(phase)).count()
}

#[test]
fn combined_waveforms_differ_between_models() {
    for &(waveform, threshold) in [(3u8, PULSE_THRESHOLD_LOW), (5, 0), (6, 0), (7, 0)].iter() {
        let differing = count_phases(|phase| {
            osc_byte(ChipModel::Mos6581, waveform, phase, threshold)
                != osc_byte(ChipModel::Mos8580, waveform, phase, threshold)
        });
        assert!(differing > 100, "waveform {} differs at {} phases", waveform, differing);
    }
}

#[test]
fn combined_waveforms_are_not_bitwise_and() {
    for &chip_model in [ChipModel::Mos6581, ChipModel::Mos8580].iter() {
        for waveform in [3u8, 5, 6, 7].iter().cloned() {
            let differing = count_phases(|phase| {
                let and = [1u8, 2, 4]
                    .iter()
                    .filter(|&&pure| waveform & pure != 0)
                    .fold(0xff, |value, &pure| value & osc_byte(chip_model, pure, phase, 0));
                osc_byte(chip_model, waveform, phase, 0) != and
            });
            assert!(
                differing > 2000,
                "{:?} waveform {} differs at {} phases",
                chip_model,
                waveform,
                differing
            );
        }
    }
}

#[test]
fn pulse_slots_differ_for_combined_pulse() {
    for &chip_model in [ChipModel::Mos6581, ChipModel::Mos8580].iter() {
        for waveform in 5..=7u8 {
            let differing = count_phases(|phase| {
                osc_byte(chip_model, waveform, phase, 0)
                    != osc_byte(chip_model, waveform, phase, PULSE_THRESHOLD_LOW)
            });
            assert!(differing >= 10, "{:?} waveform {}", chip_model, waveform);
        }
        let tables = ChipTables::new(chip_model, chip_model.default_nonlinearity());
        for waveform in 5..=7usize {
            assert!((0..TABLE_SIZE)
                .any(|phase| tables.waveform(waveform - 1, phase) != tables.waveform(waveform + 3, phase)));
        }
    }
}

#[test]
fn saw_triangle_rises_with_phase() {
    for &chip_model in [ChipModel::Mos6581, ChipModel::Mos8580].iter() {
        assert_eq!(osc_byte(chip_model, 3, 0x000, PULSE_THRESHOLD_LOW), 0x00);
        assert_eq!(osc_byte(chip_model, 3, 0x800, PULSE_THRESHOLD_LOW), 0x00);
        assert!(
            osc_byte(chip_model, 3, 0x7ff, PULSE_THRESHOLD_LOW)
                > osc_byte(chip_model, 3, 0x0ff, PULSE_THRESHOLD_LOW)
        );
    }
}

#[test]
fn combined_levels_stay_in_unit_range() {
    for &chip_model in [ChipModel::Mos6581, ChipModel::Mos8580].iter() {
        for waveform in 1..=7u8 {
            for phase in (0..4096u32).step_by(7) {
                for &threshold in [0, PULSE_THRESHOLD_LOW].iter() {
                    for &bit in combine_waveform(chip_model, waveform, phase << 12, threshold).iter() {
                        assert!(bit >= 0.0 && bit <= 1.0);
                    }
                }
            }
        }
    }
}
