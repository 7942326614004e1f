use criterion::Criterion;
use resid_fp::{clock, ChipModel, SamplingMethod, Sid};

fn setup(sid: &mut Sid) {
    sid.write(0x05, 0x09); // AD1
    sid.write(0x06, 0x00); // SR1
    sid.write(0x18, 0x0f); // MODVOL
    sid.write(0x01, 25); // FREQHI1
    sid.write(0x00, 177); // FREQLO1
    sid.write(0x04, 0x21); // CR1
}

pub fn bench_sid(c: &mut Criterion) {
    c.bench_function("clock", |b| {
        let mut sid = Sid::new(ChipModel::Mos6581);
        setup(&mut sid);
        b.iter(|| sid.clock())
    });
}

pub fn bench_sample(c: &mut Criterion) {
    c.bench_function("sample_interpolate", |b| {
        let mut sid = Sid::new(ChipModel::Mos6581);
        setup(&mut sid);
        let mut buffer = [0i16; 64];
        b.iter(|| sid.sample(1000, &mut buffer, 1))
    });
    c.bench_function("sample_resample", |b| {
        let mut sid = Sid::new(ChipModel::Mos8580);
        let _ = sid.set_sampling_parameters(SamplingMethod::Resample, clock::PAL, 44100, None);
        setup(&mut sid);
        let mut buffer = [0i16; 64];
        b.iter(|| sid.sample(1000, &mut buffer, 1))
    });
}
