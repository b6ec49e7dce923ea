//! Background Tasks Module
//!
//! # Tasks
//! - Cache purge: sweeps expired listing and secret entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
