//! Client utilities.

pub mod persistence;
