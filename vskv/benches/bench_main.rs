use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vskv::codec;
use vskv::model::{Address, KeyMap, ValueDescriptor, ValueStore};

fn sample_map(num_keys: usize) -> KeyMap {
    let mut map = KeyMap::default();
    for i in 0..num_keys {
        map.insert(
            format!("dir_{}/item_{}", i % 10, i),
            ValueDescriptor {
                current: Some(ValueStore { address: Address(vec![i as u8; 16]) }),
                edits: vec![],
            },
        );
    }
    map
}

fn criterion_benchmark(c: &mut Criterion) {
    let map = sample_map(1000);
    let encoded = codec::encode(&map).unwrap();

    c.bench_function("codec encode 1000 keys", |b| {
        b.iter(|| codec::encode(black_box(&map)).unwrap())
    });

    c.bench_function("codec decode 1000 keys", |b| {
        b.iter(|| codec::decode(black_box(&encoded)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
