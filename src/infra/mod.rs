//! Infrastructure adapters: upstream HTTP client, HTTP surface, telemetry.

pub mod directus;
pub mod error;
pub mod http;
pub mod telemetry;
