use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    driver::bench_classify,
    driver::bench_reply_value,
    driver::bench_connect_disconnect,
    driver::bench_profile_report
);
criterion_main!(benches);
