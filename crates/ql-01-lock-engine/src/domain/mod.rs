//! Domain module for the lock engine
//!
//! Contains core entities, kind policies, value objects, errors, and invariants.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod policy;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use policy::*;
pub use value_objects::*;
