//! Import coordinator: validates a whole bundle, then applies it atomically.
//!
//! # Module Organization
//!
//! * [`core`] - the [`ImportCoordinator`] structure and construction
//! * [`builder`] - [`ImportCoordinatorBuilder`] for config and listeners
//! * [`phase`] - the run state machine
//! * [`operations`] - preview, import, and the apply loop

pub mod builder;
pub mod core;
pub mod operations;
pub mod phase;

pub use builder::ImportCoordinatorBuilder;
pub use self::core::ImportCoordinator;
pub use phase::ImportPhase;
