use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use groupmeans::aggregator::table::Table;
use std::io::Write;
use tempfile::NamedTempFile;

const ROWS: usize = 1_000_000;

fn write_sample_csv() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    let categories = ["blood", "urine", "saliva", "plasma"];
    writeln!(tmp, "id,category,value").unwrap();
    for i in 0..ROWS {
        writeln!(
            tmp,
            "{},{},{}",
            i,
            categories[i % categories.len()],
            (i % 1000) as f64 * 0.5
        )
        .unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

fn load_and_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("groupmeans");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    let tmp = write_sample_csv();

    group.bench_function("load_csv", |b| {
        b.iter(|| {
            let (table, _) = Table::load_csv(tmp.path()).unwrap();
            table
        })
    });

    group.bench_function("load_csv + column_means", |b| {
        b.iter(|| {
            let (table, _) = Table::load_csv(tmp.path()).unwrap();
            table.column_means(None).unwrap()
        })
    });

    group.bench_function("column_means_only", |b| {
        // Preload once outside the iterator
        let (table, _) = Table::load_csv(tmp.path()).unwrap();
        b.iter(|| table.column_means(None).unwrap());
    });

    group.bench_function("grouped_means_by_category", |b| {
        let (table, _) = Table::load_csv(tmp.path()).unwrap();
        b.iter(|| table.column_means(Some("category")).unwrap());
    });

    group.finish();
}

criterion_group!(benches, load_and_mean);
criterion_main!(benches);
