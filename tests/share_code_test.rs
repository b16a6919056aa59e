mod common;

use std::collections::HashSet;

use movemycar_dispatch::{
    InMemoryStorage, ShareCodeGenerator, SHARE_CODE_ALPHABET, SHARE_CODE_LEN,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use common::{target, CountingStorage};

#[tokio::test]
async fn test_generated_codes_use_only_the_alphabet() {
    let storage = InMemoryStorage::new();
    let mut generator = ShareCodeGenerator::new();

    for _ in 0..1_000 {
        let code = generator.generate(&storage).await.unwrap();
        assert_eq!(code.as_str().len(), SHARE_CODE_LEN);
        assert!(
            code.as_str().bytes().all(|b| SHARE_CODE_ALPHABET.contains(&b)),
            "unexpected symbol in {code}"
        );
        assert_eq!(code.as_str(), code.as_str().to_uppercase());
    }
}

#[tokio::test]
async fn test_collision_forces_exactly_one_retry() {
    // Learn the first draw of a seeded generator, then mark it as taken.
    let taken = ShareCodeGenerator::with_rng(StdRng::seed_from_u64(7)).draw();

    let storage = CountingStorage::default();
    storage
        .inner
        .insert_target(target(taken.as_str(), "BARK", "k||bark.me"))
        .await;

    let mut generator = ShareCodeGenerator::with_rng(StdRng::seed_from_u64(7));
    let code = generator.generate(&storage).await.unwrap();

    assert_ne!(code, taken);
    assert_eq!(storage.lookups(), 2);
}

#[tokio::test]
async fn test_no_collision_means_single_lookup() {
    let storage = CountingStorage::default();
    let mut generator = ShareCodeGenerator::with_rng(StdRng::seed_from_u64(11));
    generator.generate(&storage).await.unwrap();
    assert_eq!(storage.lookups(), 1);
}

#[test]
fn test_draws_are_spread_over_the_alphabet() {
    let mut generator = ShareCodeGenerator::with_rng(StdRng::seed_from_u64(3));
    let mut seen = HashSet::new();
    for _ in 0..500 {
        seen.extend(generator.draw().as_str().bytes());
    }
    assert_eq!(seen.len(), SHARE_CODE_ALPHABET.len());
}
