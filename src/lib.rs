// src/lib.rs
pub mod config;
pub mod data;
pub mod errors;
pub mod indicators;
pub mod monitor;
pub mod notifications;
pub mod realtime;
pub mod signals;
pub mod types;
