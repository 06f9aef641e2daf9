//! Core types and the FSRS scheduling engine for Tempo.
//!
//! This crate is deliberately free of HTTP dependencies. Every operation is a
//! pure function of its inputs (card, instant, parameters); nothing is cached
//! between calls and nothing is persisted.

pub mod card;
pub mod error;
pub mod fsrs;
pub mod parameters;
pub mod reschedule;
pub mod strategy;
pub mod time;

mod algorithm;
mod scheduler;

pub use card::{Card, Grade, Rating, RecordLog, RecordLogItem, ReviewLog, State};
pub use error::{Error, Result};
pub use fsrs::{Fsrs, format_retrievability};
pub use parameters::{Parameters, Step};
pub use reschedule::{HistoryEntry, RescheduleOptions, RescheduleResult};
pub use strategy::{CardIdSeed, DefaultSeed, SeedInput, SeedStrategy};

/// Engine name reported by the project index.
pub const ENGINE_NAME: &str = "fsrs";

/// Version of the FSRS model this engine implements.
pub const FSRS_VERSION: &str = "v5";

#[cfg(test)]
mod tests;
