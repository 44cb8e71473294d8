//! # Repository Layer
//!
//! One repository per aggregate. Methods taking `&mut SqliteConnection`
//! participate in a transaction owned by the caller; methods on the pool
//! are stand-alone reads (or seed-time inserts).

pub mod employee;
pub mod movement;
pub mod product;
pub mod sale;
