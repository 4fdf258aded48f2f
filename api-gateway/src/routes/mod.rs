//! HTTP routes

pub mod dashboard;
pub mod notify;
pub mod voice;
