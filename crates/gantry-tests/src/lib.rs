//! Scheduling scenario tests for Gantry.
//!
//! This crate provides a [`ScheduleFixture`] that keeps pipeline
//! configuration and an in-memory history side by side, so scenarios can
//! be written as a sequence of check-ins and runs followed by a resolve.
//!
//! # Usage
//!
//! ```ignore
//! use gantry_tests::{dep, git, ScheduleFixture};
//!
//! let mut u = ScheduleFixture::new();
//! let repo = git("repo");
//! u.checkin_in_order(&repo, &["g1"]);
//! let up = u.save_config_with("up", [repo.clone()]);
//! let up_1 = u.run_and_pass(&up, &["g1"])?;
//! ```

pub mod fixtures;

pub use fixtures::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,gantry=debug")),
        )
        .with_test_writer()
        .try_init();
}
