//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external services, currently the media store.

pub mod media_store;
