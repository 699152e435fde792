#![forbid(unsafe_code)]

pub mod model;
pub mod policy;
pub mod program;
pub mod share_code;
pub mod time;

pub use program::{Phase, REQUIRED_MICROBREAKS, TOTAL_DAYS};
pub use time::Clock;
