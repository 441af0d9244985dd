//! Formation AI - leader/follower formations with predictive follower movement

pub mod core;
pub mod formation;
pub mod movement;
pub mod world;
