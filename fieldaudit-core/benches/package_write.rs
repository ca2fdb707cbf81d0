use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fieldaudit_core::{
    annotate, read_table, write_package_to_bytes, AuditConfig, CompressionLevel, Package, Table,
};

const FIELD_STEMS: &[&str] = &[
    "candidate_status",
    "ssn_last4",
    "resume_url",
    "contact_id",
    "email",
    "home_phone",
    "business_unit",
    "first_name",
];

fn build_table(rows: usize) -> Table {
    let mut table = Table::new(["Field Analysis: Field Name", "Owner", "Description"]);
    for i in 0..rows {
        let stem = FIELD_STEMS[i % FIELD_STEMS.len()];
        table
            .push_row(vec![
                format!("{}_{}", stem, i),
                "crm".to_string(),
                format!("Field {} & notes <{}>", i, stem),
            ])
            .unwrap();
    }
    table
}

fn build_index(rows: usize) -> Table {
    let mut table = Table::new(["Name"]);
    for i in (0..rows).step_by(2) {
        let stem = FIELD_STEMS[i % FIELD_STEMS.len()];
        table.push_row(vec![format!("{}_{}", stem, i)]).unwrap();
    }
    table
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_package");
    for rows in [100usize, 1_000, 10_000] {
        let table = build_table(rows);
        group.throughput(Throughput::Elements(rows as u64));
        for level in [CompressionLevel::None, CompressionLevel::Default] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", level), rows),
                &table,
                |b, table| {
                    b.iter(|| write_package_to_bytes("Governance Audit", black_box(table), level).unwrap())
                },
            );
        }
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_table");
    for rows in [100usize, 1_000, 10_000] {
        let bytes = write_package_to_bytes("Fields", &build_table(rows), CompressionLevel::Default).unwrap();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &bytes, |b, bytes| {
            b.iter(|| {
                let package = Package::from_bytes(black_box(bytes)).unwrap();
                read_table(&package, Some("Fields")).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_annotate(c: &mut Criterion) {
    let config = AuditConfig::default();
    let rows = 10_000;
    let source = build_table(rows);
    let index = build_index(rows);
    c.bench_function("annotate_10k", |b| {
        b.iter(|| annotate(black_box(source.clone()), &index, &config).unwrap())
    });
}

criterion_group!(benches, bench_write, bench_read, bench_annotate);
criterion_main!(benches);
