//! Lifecycle services — release catalog, archive fetch, agent control.

pub mod catalog;
pub mod controller;
pub mod fetcher;
pub mod provision;
