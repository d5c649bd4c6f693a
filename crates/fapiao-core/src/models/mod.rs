//! Data models for parsed invoices and configuration.

pub mod config;
pub mod invoice;
