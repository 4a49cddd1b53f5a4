#![forbid(unsafe_code)]

pub mod error;
pub mod gate;
pub mod model;
pub mod progress;
pub mod report;
pub mod scoring;
pub mod time;

pub use error::Error;
pub use time::Clock;
