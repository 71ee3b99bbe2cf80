//! Test fixtures for park-tour.
//!
//! Provides:
//! - Real national park coordinates (contiguous US)
//! - A one-shot HTTP stub standing in for an OSRM server
//! - A tracing subscriber that captures warnings

#![allow(dead_code)]

pub mod log_capture;
pub mod national_parks;
pub mod stub_server;

pub use national_parks::*;
