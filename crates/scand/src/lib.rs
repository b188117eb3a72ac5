//! Wi-Fi scan daemon
//!
//! Hosts one scan engine per radio and exposes the scan boundary, health
//! checks and Prometheus metrics over HTTP.

pub mod api;
pub mod config;
pub mod daemon;
