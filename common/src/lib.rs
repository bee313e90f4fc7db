// Common library for shared code across the API and the reminder daemon

pub mod calendar;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod notify;
pub mod reminder;
pub mod telemetry;
