use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates the message vector of `rank`: one value in `[1, size * size]` per destination.
///
/// With a seed, every rank draws from its own stream `seed + rank`, so a run can be repeated.
/// Without a seed the generator is seeded from the operating system.
pub fn create_messages(rank: u32, size: u32, seed: Option<u64>) -> Vec<i32> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(rank as u64)),
        None => StdRng::from_os_rng(),
    };
    let limit = (size as i64 * size as i64).min(i32::MAX as i64) as i32;
    (0..size).map(|_| rng.random_range(1..=limit)).collect()
}
