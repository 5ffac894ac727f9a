//! Portico: a caching content API gateway for headless CMS deployments.
//!
//! Public read endpoints for a fixed set of content entity types, served
//! through an in-process read-through cache with per-entity TTL policy and
//! tag-based invalidation, fed by a Directus-style item API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
