//! Backend for sharing geocoded places.
//!
//! `domain` holds the entities, `ports` the traits the workflows in `commands` depend on, and
//! `adapters` the concrete implementations of those ports. `inbound::http` exposes the
//! workflows over HTTP.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod inbound;
pub mod ports;
