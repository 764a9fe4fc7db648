//! Journey server.
//!
//! Tracks a moving person or device and keeps two things fresh: the place
//! name of where they are, and how long it would take them to drive to each
//! configured destination under current traffic.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod gmaps;
pub mod location;
pub mod nominatim;
pub mod remote;
pub mod sensors;
pub mod web;
