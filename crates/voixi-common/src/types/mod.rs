//! Core data types for call metering

pub mod account;
pub mod decision;
pub mod tier;
