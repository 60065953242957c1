//! Property-based invariant tests.
//!
//! Run with: `cargo test --test property`

mod lock_invariants;
