//! KAI train schedule server.
//!
//! Scrapes train schedules from the KAI booking site and serves them over
//! a small JSON API, with a result cache and a periodically refreshed
//! station directory used to validate searches.

pub mod cache;
pub mod config;
pub mod kai;
pub mod schedule;
pub mod stations;
pub mod web;
