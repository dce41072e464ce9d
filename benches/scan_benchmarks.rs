use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sampledupe::config::ScanConfig;
use sampledupe::scanner::worker::TerminationMode;
use sampledupe::scanner::{Aggregation, FingerprintPolicy, FingerprintStrategy, Scanner};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup_test_dir(depth: usize, files_per_dir: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    create_dir_recursive(temp_dir.path(), depth, files_per_dir);
    temp_dir
}

fn create_dir_recursive(path: &Path, depth: usize, files_per_dir: usize) {
    if depth == 0 {
        return;
    }
    fs::create_dir_all(path).expect("Failed to create dir");

    for i in 0..files_per_dir {
        let content = format!("file content number {}", i % 5);
        fs::write(path.join(format!("file_{}.txt", i)), content).expect("Failed to write file");
    }

    if depth > 1 {
        for i in 0..2 {
            create_dir_recursive(&path.join(format!("dir_{}", i)), depth - 1, files_per_dir);
        }
    }
}

// 1. Fingerprint strategies over single files
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let temp_dir = TempDir::new().unwrap();

    for size_kb in [1, 1024, 10240] {
        let file_path = temp_dir.path().join(format!("bench_{}.dat", size_kb));
        fs::write(&file_path, vec![b'a'; size_kb * 1024]).expect("Failed to write bench file");

        for strategy in [
            FingerprintStrategy::AlternateSampling,
            FingerprintStrategy::SizeCapped,
            FingerprintStrategy::FixedChunkCount,
        ] {
            // Threshold below the largest file so size-capped takes its short path there
            let policy = FingerprintPolicy::new(strategy).with_size_threshold(4 * 1024 * 1024);
            group.bench_with_input(
                format!("{}_{}KB", strategy, size_kb),
                &file_path,
                |b, path: &PathBuf| {
                    b.iter(|| black_box(policy.fingerprint(path).unwrap()));
                },
            );
        }
    }
    group.finish();
}

// 2. Full scans through the worker pool
fn bench_scan(c: &mut Criterion) {
    let temp_dir = setup_test_dir(6, 10); // 63 dirs, 630 files
    let mut group = c.benchmark_group("scan");
    group.sample_size(10);

    for (name, termination) in [
        ("in_flight", TerminationMode::InFlight),
        ("polling", TerminationMode::Polling),
    ] {
        let config = ScanConfig {
            roots: vec![temp_dir.path().to_path_buf()],
            worker_count: Some(4),
            poll_interval_ms: 10,
            termination,
            ..Default::default()
        };
        group.bench_function(format!("scan_630_files_{}", name), |b| {
            b.iter(|| {
                let (aggregation, _) = Scanner::new(config.clone()).unwrap().run().unwrap();
                black_box(aggregation.len());
            })
        });
    }
    group.finish();
}

// 3. Concurrent aggregation under contention
fn bench_aggregation(c: &mut Criterion) {
    let policy = FingerprintPolicy::new(FingerprintStrategy::AlternateSampling);
    let fingerprints: Vec<_> = (0..64)
        .map(|i| {
            let content = format!("content {}", i);
            policy
                .fingerprint_reader(content.as_bytes(), content.len() as u64)
                .unwrap()
        })
        .collect();

    c.bench_function("aggregation_10k_records", |b| {
        b.iter(|| {
            let aggregation = Aggregation::new();
            rayon::scope(|s| {
                for t in 0..4 {
                    let aggregation = &aggregation;
                    let fingerprints = &fingerprints;
                    s.spawn(move |_| {
                        for i in 0..2500 {
                            let fp = fingerprints[(i + t) % fingerprints.len()];
                            aggregation.record(fp, PathBuf::from(format!("/t{}/f{}", t, i)));
                        }
                    });
                }
            });
            black_box(aggregation.total_paths());
        })
    });
}

criterion_group!(benches, bench_fingerprint, bench_scan, bench_aggregation);
criterion_main!(benches);
