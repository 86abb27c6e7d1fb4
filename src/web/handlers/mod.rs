//! # Web API Handlers

pub mod health;
pub mod jobs;
pub mod triggers;
