extern crate resid_fp;

use resid_fp::clock;
use resid_fp::external_filter::ExternalFilter;
use resid_fp::ChipModel;

#[test]
fn low_pass_charges_then_high_pass_decays() {
    let mut ext_filter = ExternalFilter::new(ChipModel::Mos8580);
    ext_filter.clock(1000.0);
    assert_eq!(ext_filter.output(), 0.0);
    let mut peak = 0.0f32;
    for _ in 0..100 {
        ext_filter.clock(1000.0);
        peak = peak.max(ext_filter.output());
    }
    assert!(peak > 900.0);
    // One second is many high-pass time constants.
    for _ in 0..clock::PAL {
        ext_filter.clock(1000.0);
    }
    assert!(ext_filter.output().abs() < 1.0);
}

#[test]
fn disabled_passes_input_minus_mixer_dc() {
    let mut ext_filter = ExternalFilter::new(ChipModel::Mos8580);
    ext_filter.set_enabled(false);
    ext_filter.clock(1234.0);
    assert_eq!(ext_filter.output(), 1234.0);

    let mut ext_filter = ExternalFilter::new(ChipModel::Mos6581);
    ext_filter.set_enabled(false);
    ext_filter.clock(1234.0);
    assert!(ext_filter.output() < 0.0);
}

#[test]
fn reset_clears_state() {
    let mut ext_filter = ExternalFilter::new(ChipModel::Mos6581);
    for _ in 0..1000 {
        ext_filter.clock(-5000.0);
    }
    assert!(ext_filter.output() != 0.0);
    ext_filter.reset();
    assert_eq!(ext_filter.output(), 0.0);
    ext_filter.clock(0.0);
    assert_eq!(ext_filter.output(), 0.0);
}

#[test]
fn denormals_are_flushed() {
    let mut ext_filter = ExternalFilter::new(ChipModel::Mos8580);
    ext_filter.clock(1e-25);
    ext_filter.clock(1e-25);
    ext_filter.nuke_denormals();
    ext_filter.clock(0.0);
    assert_eq!(ext_filter.output(), 0.0);
}
