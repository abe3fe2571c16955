//! Progress and streaming output

pub mod reporter;
