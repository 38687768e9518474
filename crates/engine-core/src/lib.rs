//! Deterministic decision engine for a card-driven kingdom management game:
//! event selection, bounded resource resolution, terminal detection, and
//! ending/legacy derivation. Pure and synchronous; all randomness is drawn
//! from an explicitly seeded source.

pub mod catalog;
pub mod condition;
pub mod daily;
pub mod ending;
pub mod engine;
pub mod ledger;
pub mod legacy;
pub mod modifier;
pub mod rng;
pub mod selector;
