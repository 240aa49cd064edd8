//! Sensor dashboard client.
//!
//! Polls a ThingSpeak channel for the latest soil moisture, temperature,
//! humidity and light reading, evaluates the threshold alerts and keeps a
//! rendered view that the HTTP layer serves. The binary entrypoint lives in
//! `main.rs`.

pub mod alerts;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod poller;
pub mod rest;
pub mod view;
