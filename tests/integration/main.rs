//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host with no real
//! thermal zone or PWM chip required.

mod concurrency_tests;
mod controller_tests;
