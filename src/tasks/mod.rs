//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: Removes expired entries from the embedded backend

mod cleanup;

pub use cleanup::spawn_cleanup_task;
