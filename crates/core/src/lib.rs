//! Synthetic Precipitation Forecast Core Library
//!
//! A deterministic precipitation forecast over the contiguous United States.
//! Every value comes from a request-seeded pseudo-random generator and a
//! hand-tuned analytic climate model; identical requests always produce
//! identical forecasts.
//!
//! ## Pipeline
//!
//! - [`core_types`]: request, seed derivation, generator, unit types
//! - [`climate`]: per-cell precipitation model
//! - [`forecast`]: lattice traversal, per-day aggregates, summary text
//! - [`geo`]: boundary topology, containment, map projection
//! - [`render`]: colour ramp, raster surface and map renderer
//!
//! ## Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use precip_forecast_core::{
//!     render, BoundaryLayers, ForecastRequest, MapContext, RenderConfig, ScreenExtent,
//!     TrainingPeriod,
//! };
//!
//! let ctx = MapContext::load(
//!     "us-states.topojson",
//!     &BoundaryLayers::default(),
//!     ScreenExtent::default(),
//! )?;
//! let request = ForecastRequest::new(
//!     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
//!     3,
//!     TrainingPeriod::Recent,
//! );
//! let result = precip_forecast_core::synthesize(&request, Some(&ctx));
//! render::render_png("day1.png", &result, 0, Some(&ctx), &RenderConfig::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core types and utilities
pub mod core_types;

// Forecast model
pub mod climate;
pub mod forecast;

// Map data and output
pub mod geo;
pub mod render;

// Re-export core types
pub use core_types::{
    CalendarBounds, ForecastRequest, Millimeters, Mulberry32, Seed, TrainingPeriod,
};

// Re-export forecast types
pub use forecast::{
    synthesize, Cell, DayCard, DaySummary, ForecastResult, ForecastSummary, ForecastSynthesizer,
    GridSpec,
};

// Re-export map and rendering types
pub use geo::{BoundaryError, BoundaryLayers, LandMask, MapContext, ScreenExtent};
pub use render::{render_day, RasterSurface, RenderConfig, RenderError, Surface};
