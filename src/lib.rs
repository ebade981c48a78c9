//! Balloon constellation analytics: reconstructs continuous tracks from
//! hourly position snapshots, derives per-track kinematics, clusters the
//! fleet in 3-D, and enriches each cluster with a pressure-level forecast.

pub mod cluster;
pub mod constellation;
pub mod geo;
pub mod kinematics;
pub mod pipeline;
pub mod weather;
pub mod web;
