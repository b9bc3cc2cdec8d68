//! Tracing initialization
//!
//! Library crates only emit events; binaries and test harnesses install the
//! subscriber through one of these functions.

mod tracing_setup;

pub use tracing_setup::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
