//! Application-level configuration.
//!
//! - [`StreamSettings`]: inactivity timeout applied to each streaming turn

pub mod stream_settings;

pub use stream_settings::StreamSettings;
