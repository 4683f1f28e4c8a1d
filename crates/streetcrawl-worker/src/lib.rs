//! Street View crawl pipeline.
//!
//! This crate provides:
//! - Environment configuration and structured run logging
//! - Single and grid image capture over an itinerary
//! - Command handlers for every pipeline step
//! - The `streetcrawl` command-line interface

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use capture::{
    CaptureOptions, CaptureOutcome, CaptureReport, GridCapture, PhotoLayout, SingleCapture,
};
pub use config::CrawlConfig;
pub use error::{CrawlError, CrawlResult};
pub use logging::CrawlLogger;
