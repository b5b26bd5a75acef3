//! restbox: 2D rigid-rectangle physics with SAT contacts, warm-started resting contacts and Coulomb friction

pub mod types;
pub mod api;
pub mod error;
pub mod math;
pub mod rng;
pub mod body;
pub mod narrowphase;
pub mod contact;
pub mod cache;
pub mod solver;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::WorldError;
pub use crate::world::PhysicsWorld;
