//! Response testing infrastructure.
//!
//! This module provides the runner that evaluates assertions against responses.

mod runner;

pub use runner::TestRunner;
