//! Infrastructure adapters: remote API, HTTP surface, telemetry, embedded assets.

pub mod assets;
pub mod error;
pub mod http;
pub mod telemetry;
pub mod upstream;
