//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a session produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sessions must be 100% reproducible for replays and batch analysis.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   Simulation state uses fixed-point arithmetic via
//!   [`palisade_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entity iteration always goes through sorted IDs or the subscription
//!   list, never raw map order.
//!
//! - **System randomness**: Nothing calls the OS RNG. All "random"
//!   behavior flows through the session's seeded ChaCha8 stream, and the
//!   number of draws from that stream never depends on map layout.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual module determinism (combat, deck, waves)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full session scenarios are reproducible
//! 4. **Parallel tests**: Running N sessions in parallel all match

use std::thread;

use palisade_core::session::Session;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic session).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Session is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel session runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each session.
    pub hashes: Vec<u64>,
    /// Number of steps each session ran.
    pub steps: u64,
    /// Number of sessions run.
    pub num_sessions: usize,
}

impl ParallelRunResult {
    /// Check if all sessions produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all sessions matched.
    ///
    /// # Panics
    ///
    /// Panics if sessions produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel sessions diverged!\n\
                 Sessions: {}\n\
                 Steps: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sessions,
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute a state hash
///
/// # Example
///
/// ```ignore
/// use palisade_test_utils::determinism::verify_determinism;
/// use palisade_test_utils::fixtures::standard_session;
/// use std::time::Duration;
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     100, // 100 frames each
///     || standard_session(42),
///     |s| { s.update(Duration::from_millis(250)); },
///     |s| s.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Simplified determinism verification for [`Session`].
///
/// Runs the session twice with identical setup, stepping one tick
/// interval per frame, and verifies the final state hashes match.
pub fn verify_session_determinism<F>(setup_fn: F, num_frames: u64) -> bool
where
    F: Fn() -> Session,
{
    let result = verify_determinism(
        2,
        num_frames,
        &setup_fn,
        |session| {
            let frame = session.config().tick_interval;
            let _ = session.update(frame);
        },
        Session::state_hash,
    );
    result.is_deterministic
}

/// Run N sessions in parallel using scoped threads and collect final hashes.
///
/// This catches non-determinism that only manifests under thread
/// scheduling variations or memory layout differences.
pub fn run_parallel_sessions<F>(setup_fn: F, num_sessions: usize, num_frames: u64) -> ParallelRunResult
where
    F: Fn() -> Session + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sessions)
            .map(|_| {
                s.spawn(|| {
                    let mut session = setup_fn();
                    let frame = session.config().tick_interval;
                    for _ in 0..num_frames {
                        let _ = session.update(frame);
                    }
                    session.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult {
        hashes,
        steps: num_frames,
        num_sessions,
    }
}

/// Compare two session runs frame-by-frame, finding the first divergence.
///
/// Useful for debugging non-determinism by finding exactly when the
/// sessions start to differ.
///
/// # Returns
///
/// `None` if the sessions are deterministic, `Some(frame)` if they
/// diverge at that frame.
pub fn find_first_divergence<F>(setup_fn: F, num_frames: u64) -> Option<u64>
where
    F: Fn() -> Session,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    // Check initial state
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    let frame = a.config().tick_interval;
    for n in 1..=num_frames {
        let _ = a.update(frame);
        let _ = b.update(frame);

        if a.state_hash() != b.state_hash() {
            return Some(n);
        }
    }

    None
}

/// Verify that a serialization round-trip preserves session state exactly.
///
/// This is critical for snapshots and replay verification.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_frames: u64) -> bool
where
    F: Fn() -> Session,
{
    let mut session = setup_fn();

    let frame = session.config().tick_interval;
    for _ in 0..num_frames {
        let _ = session.update(frame);
    }

    let hash_before = session.state_hash();

    let Ok(bytes) = session.serialize() else {
        return false;
    };
    let Ok(restored) = Session::deserialize(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of session determinism.
pub mod strategies {
    use palisade_core::deck::DrawPolicy;
    use palisade_core::grid::GridPos;
    use proptest::prelude::*;

    /// Generate an RNG seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Generate a grid position within the given dimensions.
    pub fn arb_grid_pos(width: u32, height: u32) -> impl Strategy<Value = GridPos> {
        let (w, h) = (width.max(1) as i32, height.max(1) as i32);
        (0..w, 0..h).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Generate a valid spawn code string (digits 0-3, non-empty).
    pub fn arb_spawn_code() -> impl Strategy<Value = String> {
        proptest::collection::vec(0u32..4, 1..12).prop_map(|digits| {
            digits
                .iter()
                .map(|d| char::from_digit(*d, 10).unwrap_or('0'))
                .collect()
        })
    }

    /// Generate a draw policy with sane cost bounds.
    pub fn arb_draw_policy() -> impl Strategy<Value = DrawPolicy> {
        (1u32..20, 0u32..5).prop_map(|(base_cost, cost_increment)| DrawPolicy {
            base_cost,
            cost_increment,
            discount: None,
        })
    }

    /// Generate a frame duration between 50ms and 2s.
    pub fn arb_frame_millis() -> impl Strategy<Value = u64> {
        50u64..2000
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fixtures::{peaceful_config, quick_start_config, single_wave_config, standard_session};
    use palisade_core::grid::GridPos;
    use palisade_core::session::Session;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_idle_session_determinism() {
        assert!(verify_session_determinism(|| standard_session(7), 60));
    }

    #[test]
    fn test_scripted_session_determinism() {
        let setup = || {
            let mut config = peaceful_config(3);
            // Whatever kind comes up, the deploy must be affordable
            config.starting_tokens = 30;
            let mut session = Session::new(config).unwrap();
            let _ = session.draw_unit().unwrap();
            let _ = session.deploy_from_hand(0, GridPos::new(4, 1)).unwrap();
            session
        };
        let result = verify_determinism(
            5,
            120,
            setup,
            |s| {
                let frame = s.config().tick_interval;
                let _ = s.update(frame);
            },
            Session::state_hash,
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_find_divergence_on_deterministic_session() {
        let divergence = find_first_divergence(|| standard_session(11), 80);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_fresh_session() {
        assert!(verify_serialization_determinism(|| standard_session(0), 0));
    }

    #[test]
    fn test_serialization_preserves_mid_wave_state() {
        assert!(verify_serialization_determinism(
            || Session::new(quick_start_config(99)).unwrap(),
            30,
        ));
    }

    // =========================================================================
    // Parallel session tests
    // =========================================================================

    #[test]
    fn test_parallel_idle_sessions() {
        let result = run_parallel_sessions(|| standard_session(5), 4, 60);
        result.assert_deterministic();
    }

    #[test]
    fn test_parallel_wave_sessions() {
        let result = run_parallel_sessions(|| Session::new(single_wave_config(21, "1121")).unwrap(), 4, 90);
        result.assert_deterministic();
    }

    // =========================================================================
    // Property-based tests using proptest
    // =========================================================================

    proptest! {
        /// Any seed must replay to the same hash.
        ///
        /// This catches hidden use of unseeded randomness.
        #[test]
        fn prop_random_seeds_are_deterministic(seed in strategies::arb_seed()) {
            prop_assert!(verify_session_determinism(
                move || Session::new(quick_start_config(seed)).unwrap(),
                40,
            ));
        }

        /// Any valid spawn code must replay to the same hash.
        ///
        /// This catches ordering issues in wave spawning.
        #[test]
        fn prop_spawn_codes_are_deterministic(code in strategies::arb_spawn_code(), seed in strategies::arb_seed()) {
            let code_clone = code.clone();
            prop_assert!(verify_session_determinism(
                move || Session::new(single_wave_config(seed, &code_clone)).unwrap(),
                40,
            ));
        }

        /// Odd frame sizes must not change the outcome of a fixed amount
        /// of simulated time.
        ///
        /// This catches accumulator bugs in the interval clock.
        #[test]
        fn prop_frame_size_does_not_change_ticks(frame_ms in strategies::arb_frame_millis()) {
            let total_ms: u64 = 20_000;

            let run = |step_ms: u64| {
                let mut session = Session::new(quick_start_config(17)).unwrap();
                let mut elapsed = 0u64;
                while elapsed + step_ms <= total_ms {
                    let _ = session.update(Duration::from_millis(step_ms));
                    elapsed += step_ms;
                }
                // Top up the remainder so both runs see identical sim time
                if elapsed < total_ms {
                    let _ = session.update(Duration::from_millis(total_ms - elapsed));
                }
                session
            };

            let coarse = run(1000);
            let fine = run(frame_ms);
            prop_assert_eq!(coarse.current_tick(), fine.current_tick());
        }

        /// Serialization round-trips must be exact for any seed.
        #[test]
        fn prop_serialization_roundtrip_is_exact(
            seed in strategies::arb_seed(),
            frames in 0u64..60,
        ) {
            prop_assert!(verify_serialization_determinism(
                move || Session::new(quick_start_config(seed)).unwrap(),
                frames,
            ));
        }
    }
}
