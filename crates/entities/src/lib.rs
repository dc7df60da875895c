//! Core entity definitions for the task API.
//!
//! This crate defines the task entity stored by the data-access layer and
//! the DTOs exchanged with clients, along with the conversions between them.

mod task;
mod update;

pub use task::*;
pub use update::*;
