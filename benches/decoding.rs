use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sheet_intake::intake::{decode_rows, IntakeFormat};

fn csv_payload(rows: usize) -> Vec<u8> {
    let mut out = String::from("id,name,score,active\n");
    for i in 0..rows {
        out.push_str(&format!("{i},name-{i},{}.5,{}\n", i % 100, i % 2 == 0));
    }
    out.into_bytes()
}

fn bench_csv_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_csv");
    for rows in [1_000usize, 10_000, 100_000] {
        let payload = csv_payload(rows);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &payload, |b, payload| {
            b.iter(|| decode_rows(IntakeFormat::Csv, black_box(payload)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_csv_decoding);
criterion_main!(benches);
