// Table performance benchmarks for aitable

use aitable::fs::{DiskFileSystem, FileSystem, MemFile, MemFileSystem};
use aitable::{CompressionType, Options, TableReader, TableWriter};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tempfile::TempDir;

fn build_table(fs: &MemFileSystem, size: usize, options: Options) -> TableReader<MemFile> {
    let mut writer = TableWriter::new(fs.create("bench.sst").unwrap(), options).unwrap();
    for i in 0..size {
        let key = format!("key{:08}", i);
        let value = format!("value{:08}", i);
        writer.set(key.as_bytes(), value.as_bytes()).unwrap();
    }
    writer.close().unwrap();
    TableReader::open(fs.open("bench.sst").unwrap(), Options::default()).unwrap()
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_write");

    for compression in [CompressionType::None, CompressionType::default()] {
        for size in [1000, 10000].iter() {
            group.throughput(Throughput::Elements(*size as u64));
            let id = format!("{}/{}", compression.name(), size);
            group.bench_with_input(BenchmarkId::from_parameter(id), size, |b, &size| {
                b.iter(|| {
                    let fs = MemFileSystem::new();
                    let options = Options::default().compression(compression);
                    let reader = build_table(&fs, size, options);
                    black_box(reader.file_size());
                });
            });
        }
    }

    group.finish();
}

fn benchmark_write_disk(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_write_disk");
    let size = 10000;
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let temp_dir = TempDir::new().unwrap();
            let fs = DiskFileSystem::new(temp_dir.path()).unwrap();
            let file = fs.create("bench.sst").unwrap();
            let mut writer = TableWriter::new(file, Options::default()).unwrap();
            for i in 0..size {
                let key = format!("key{:08}", i);
                let value = format!("value{:08}", i);
                writer.set(key.as_bytes(), value.as_bytes()).unwrap();
            }
            black_box(writer.close().unwrap());
        });
    });

    group.finish();
}

fn benchmark_random_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_random_get");

    for verify in [true, false] {
        let size = 10000;
        let fs = MemFileSystem::new();
        build_table(&fs, size, Options::default());
        let options = Options::default().verify_checksums(verify);
        let reader = TableReader::open(fs.open("bench.sst").unwrap(), options).unwrap();

        group.throughput(Throughput::Elements(1000));
        group.bench_function(BenchmarkId::new("verify", verify), |b| {
            b.iter(|| {
                use rand::Rng;
                let mut rng = rand::rng();

                for _ in 0..1000 {
                    let key_num: usize = rng.random_range(0..size);
                    let key = format!("key{:08}", key_num);
                    black_box(reader.get(key.as_bytes()).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_read_missing_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_missing_get");
    let fs = MemFileSystem::new();
    let reader = build_table(&fs, 1000, Options::default());

    group.bench_function("after_last", |b| {
        b.iter(|| {
            for i in 1000..2000 {
                let key = format!("key{:08}", i);
                black_box(reader.get(key.as_bytes()).is_err());
            }
        });
    });

    group.bench_function("between", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let key = format!("key{:08}x", i);
                black_box(reader.get(key.as_bytes()).is_err());
            }
        });
    });

    group.finish();
}

fn benchmark_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_scan");

    for size in [1000, 10000].iter() {
        let fs = MemFileSystem::new();
        let reader = build_table(&fs, *size, Options::default());

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut iter = reader.iter().unwrap();
                let mut n = 0;
                while iter.advance().unwrap() {
                    black_box(iter.value());
                    n += 1;
                }
                black_box(n);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_write,
    benchmark_write_disk,
    benchmark_random_get,
    benchmark_read_missing_keys,
    benchmark_scan
);
criterion_main!(benches);
