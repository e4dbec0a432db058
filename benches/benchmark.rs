use criterion::{criterion_group, criterion_main, Criterion};

use format_preserving::traits::IntegerCipher;
use format_preserving::{
    Eme2IntegerCipher, FfxIntegerCipher, IntegerMessageSpace, Key, RankThenEncipher,
    StringMessageSpace,
};
use format_preserving::Dfa;
use num_bigint::BigInt;
use num_traits::One;

#[allow(clippy::redundant_closure)]
pub fn criterion_benchmark(c: &mut Criterion) {
    let key16 = Key::new(&[0x2Bu8; 16]);
    let key = Key::new(b"a benchmark key of arbitrary length");

    let ffx = FfxIntegerCipher::new(IntegerMessageSpace::new(BigInt::from(u64::MAX)).unwrap())
        .unwrap();
    let ffx_pt = BigInt::from(0xDEAD_BEEFu64);
    let ffx_ct = ffx.encrypt(&ffx_pt, &key16, b"tweak").unwrap();

    let eme2 = Eme2IntegerCipher::new(
        IntegerMessageSpace::new((BigInt::one() << (500 * 8)) - 1).unwrap(),
    )
    .unwrap();
    let eme2_pt = BigInt::one() << 3000;
    let eme2_ct = eme2.encrypt(&eme2_pt, &key, b"tweak").unwrap();

    let fpe = RankThenEncipher::new(
        StringMessageSpace::new(Dfa::interval(0, 99_999_999, 8).unwrap()).unwrap(),
    )
    .unwrap();
    let card = "04732158".to_string();

    c.bench_function("ffx encrypt", |b| b.iter(|| ffx.encrypt(&ffx_pt, &key16, b"tweak")));
    c.bench_function("ffx decrypt", |b| b.iter(|| ffx.decrypt(&ffx_ct, &key16, b"tweak")));

    c.bench_function("eme2 encrypt", |b| b.iter(|| eme2.encrypt(&eme2_pt, &key, b"tweak")));
    c.bench_function("eme2 decrypt", |b| b.iter(|| eme2.decrypt(&eme2_ct, &key, b"tweak")));

    c.bench_function("rank-then-encipher 8 digits", |b| {
        b.iter(|| fpe.encrypt(&card, &key16, b"tweak"))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
