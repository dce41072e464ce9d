use proptest::prelude::*;
use sampledupe::scanner::{FingerprintPolicy, FingerprintStrategy, EMPTY_FINGERPRINT_HEX};
use std::fs;
use tempfile::TempDir;

fn strategy() -> impl Strategy<Value = FingerprintStrategy> {
    prop_oneof![
        Just(FingerprintStrategy::AlternateSampling),
        Just(FingerprintStrategy::SizeCapped),
        Just(FingerprintStrategy::FixedChunkCount),
    ]
}

fn policy(
    strategy: FingerprintStrategy,
    chunk_size: usize,
    threshold: u64,
    count: usize,
) -> FingerprintPolicy {
    FingerprintPolicy::new(strategy)
        .with_chunk_size(chunk_size)
        .with_size_threshold(threshold)
        .with_chunk_count(count)
}

proptest! {
    #[test]
    fn test_identical_files_identical_fingerprints(
        content in prop::collection::vec(any::<u8>(), 0..4096),
        strategy in strategy(),
        chunk_size in 1usize..512,
        threshold in 0u64..4096,
        count in 1usize..8,
    ) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, &content).unwrap();
        fs::write(&b, &content).unwrap();

        let policy = policy(strategy, chunk_size, threshold, count);
        let fa = policy.fingerprint(&a).unwrap();
        let fb = policy.fingerprint(&b).unwrap();
        prop_assert_eq!(fa, fb);

        // Same file again
        prop_assert_eq!(policy.fingerprint(&a).unwrap(), fa);
    }

    #[test]
    fn test_file_and_reader_agree(
        content in prop::collection::vec(any::<u8>(), 0..2048),
        strategy in strategy(),
        chunk_size in 1usize..256,
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.bin");
        fs::write(&path, &content).unwrap();

        let policy = policy(strategy, chunk_size, 1024, 3);
        let from_file = policy.fingerprint(&path).unwrap();
        let from_reader = policy
            .fingerprint_reader(&content[..], content.len() as u64)
            .unwrap();
        prop_assert_eq!(from_file, from_reader);
    }

    #[test]
    fn test_sampled_difference_changes_fingerprint(
        content in prop::collection::vec(any::<u8>(), 1..64),
        strategy in strategy(),
        index in any::<prop::sample::Index>(),
    ) {
        // Chunk size covers the whole input, so every strategy samples every byte
        let policy = policy(strategy, 64, 64, 1);
        let mut changed = content.clone();
        let i = index.index(changed.len());
        changed[i] = changed[i].wrapping_add(1);

        let a = policy.fingerprint_reader(&content[..], content.len() as u64).unwrap();
        let b = policy.fingerprint_reader(&changed[..], changed.len() as u64).unwrap();
        prop_assert_ne!(a, b);
    }

    #[test]
    fn test_empty_digest_independent_of_parameters(
        strategy in strategy(),
        chunk_size in 1usize..100_000,
        threshold in any::<u64>(),
        count in 1usize..100,
    ) {
        let fp = policy(strategy, chunk_size, threshold, count)
            .fingerprint_reader(std::io::empty(), 0)
            .unwrap();
        prop_assert_eq!(fp.to_hex(), EMPTY_FINGERPRINT_HEX);
    }
}
