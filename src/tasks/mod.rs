//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the life of the process.
//!
//! # Tasks
//! - Cache Sweep: Removes expired and invalid domain cache entries at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
