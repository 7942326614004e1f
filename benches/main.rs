#[macro_use]
extern crate criterion;
extern crate resid_fp;

mod sid_bench;

criterion_group!(
    benches,
    sid_bench::bench_sid,
    sid_bench::bench_sample,
    sampler_bench::bench_convolve,
    sampler_bench::bench_fir
);

criterion_main!(benches);
