//! Performance benchmarks for gffmerge
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gffmerge::core::{FeatureCombiner, FeatureRecord, SchemaFormat};
use gffmerge::formats::parse_record;

/// Build a synthetic GTF-style record set: `n` transcripts of three
/// exons and two CDS fragments each, plus scattered pass-through rows.
fn synthetic_records(n: usize) -> Vec<FeatureRecord> {
    let mut records = Vec::with_capacity(n * 6);
    for i in 0..n {
        let base = (i as u64) * 10_000;
        let id = format!("tx{}", i);
        for (ty, start, end) in [
            ("transcript", base, base + 5_000),
            ("exon", base, base + 1_000),
            ("exon", base + 2_000, base + 3_000),
            ("exon", base + 4_000, base + 5_000),
            ("CDS", base + 500, base + 1_000),
            ("CDS", base + 2_000, base + 2_500),
        ] {
            let mut f = FeatureRecord::new("chr1", ty, start, end);
            f.id = Some(id.clone());
            records.push(f);
        }
        if i % 10 == 0 {
            records.push(FeatureRecord::new("chr1", "region", base, base + 100));
        }
    }
    records
}

/// Benchmark GTF combining end to end
fn bench_combine_gtf(c: &mut Criterion) {
    let combiner = FeatureCombiner::new(SchemaFormat::Gtf);
    let mut group = c.benchmark_group("combine_gtf");

    for size in [100, 1_000, 10_000].iter() {
        let records = synthetic_records(*size);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let combined = combiner.combine(black_box(records.clone()));
                black_box(combined)
            })
        });
    }

    group.finish();
}

/// Benchmark GFF3 combining, including the by-id pre-merge
fn bench_combine_gff3(c: &mut Criterion) {
    let combiner = FeatureCombiner::new(SchemaFormat::Gff3);
    let mut records = synthetic_records(1_000);
    for f in records.iter_mut() {
        if f.ty != "transcript" {
            f.parent = f.id.take();
        }
    }

    c.bench_function("combine_gff3_1000", |b| {
        b.iter(|| {
            let combined = combiner.combine(black_box(records.clone()));
            black_box(combined)
        })
    });
}

/// Benchmark GFF/GTF line parsing
fn bench_line_parsing(c: &mut Criterion) {
    let lines: [(&str, &[u8]); 2] = [
        (
            "gff3",
            b"chr1\thavana\tmRNA\t11869\t14409\t.\t+\t.\tID=ENST00000456328;Parent=ENSG00000223972;Name=DDX11L1-202",
        ),
        (
            "gtf",
            b"chr1\thavana\ttranscript\t11869\t14409\t.\t+\t.\tgene_id \"ENSG00000223972\"; transcript_id \"ENST00000456328\"; gene_name \"DDX11L1\";",
        ),
    ];

    let mut group = c.benchmark_group("line_parsing");
    for (name, line) in lines {
        let format = SchemaFormat::from_name(name);
        group.bench_with_input(BenchmarkId::from_parameter(name), &line, |b, line| {
            b.iter(|| {
                let record = parse_record(black_box(line), format);
                black_box(record)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_combine_gtf,
    bench_combine_gff3,
    bench_line_parsing,
);

criterion_main!(benches);
