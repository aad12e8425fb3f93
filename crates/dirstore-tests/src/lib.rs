//! End-to-end tests for the dirstore-* crates.
