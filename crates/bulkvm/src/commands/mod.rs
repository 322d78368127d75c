//! Command handlers, one module per top-level command group

pub mod async_utils;
pub mod instances;
pub mod operations;
pub mod profile;
pub mod zones;
