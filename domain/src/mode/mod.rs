//! Mode selection.
//!
//! - [`catalog::ModeCatalog`]: mode key → backend model identifier
//! - [`catalog::ModeKey`]: a key validated against the catalog

pub mod catalog;
