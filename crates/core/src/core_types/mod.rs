//! Core types and utilities

pub mod request;
pub mod rng;
pub mod seed;
pub mod units;

pub use request::{
    clamp_day_selector, clamp_window, CalendarBounds, ForecastRequest, TrainingPeriod,
    FORECAST_YEAR, MAX_WINDOW, MIN_WINDOW,
};
pub use rng::Mulberry32;
pub use seed::Seed;
pub use units::Millimeters;
