use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// `permutation[new_row] = old_state`, its inverse, sampled uniformly at
/// random with an externally-supplied RNG seed so builds are reproducible
/// for the same `(master, rng_seed)` pair (spec §8 "determinism").
pub fn sample_permutation(num_states: usize, rng_seed: u64) -> (Vec<u32>, Vec<u32>) {
    let mut permutation: Vec<u32> = (0..num_states as u32).collect();
    let mut rng = StdRng::seed_from_u64(rng_seed);
    permutation.shuffle(&mut rng);
    let inverse = invert(&permutation);
    (permutation, inverse)
}

pub fn invert(permutation: &[u32]) -> Vec<u32> {
    let mut inverse = vec![0u32; permutation.len()];
    for (new_row, &old_state) in permutation.iter().enumerate() {
        inverse[old_state as usize] = new_row as u32;
    }
    inverse
}
