use crate::params::ConfigCandidate;
use itertools::Itertools;

/// Generates the launch configurations worth benchmarking.
///
/// Forms the Cartesian product of the two candidate lists, thread options on
/// the outer axis and block options on the inner axis, and drops every pair
/// whose grid size (`threads * blocks`) is below `min_grid_size`. Survivors
/// keep enumeration order. A pair produced more than once by repeated
/// options is only kept at its first position.
///
/// # Arguments
///
/// * `thread_options`: Threads-per-block candidates, in the order they should be tried.
/// * `block_options`: Blocks-per-grid candidates, in the order they should be tried.
/// * `min_grid_size`: Smallest grid size that is still meaningful to measure.
///
/// # Returns
///
/// A `Vec<ConfigCandidate>`. Empty if either candidate list is empty or no
/// pair reaches the threshold.
///
/// # Example
///
/// ```
/// use rng_bench_matrix::combinations::generate_config_candidates;
/// use rng_bench_matrix::params::ConfigCandidate;
///
/// let candidates = generate_config_candidates(&[64, 128], &[8], 600);
///
/// // (64, 8) has a grid size of 512 and is dropped.
/// assert_eq!(candidates, vec![ConfigCandidate::new(128, 8)]);
/// ```
pub fn generate_config_candidates(
  thread_options: &[u32],
  block_options: &[u32],
  min_grid_size: u64,
) -> Vec<ConfigCandidate> {
  thread_options
    .iter()
    .cartesian_product(block_options.iter())
    .map(|(&threads, &blocks)| ConfigCandidate::new(threads, blocks))
    .filter(|candidate| candidate.grid_size() >= min_grid_size)
    .unique()
    .collect()
}
