pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;

pub use cancel::CancelSignal;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::*;
pub use model::*;
