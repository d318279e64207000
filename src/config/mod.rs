//! all logic related to building/using application configuration
mod container;
mod utils;

pub use self::container::Configuration;
pub use self::utils::{determine_output_level, OutputLevel};
