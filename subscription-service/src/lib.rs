//! Subscription Service - subscription billing records and monthly revenue summaries.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
