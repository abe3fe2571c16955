//! Configuration validation types shared by the loader and the CLI.

pub mod validation;
