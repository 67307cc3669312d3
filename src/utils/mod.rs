//! Utility module: errors, logging, metrics and the injected clock.

pub mod errors;
pub mod metrics;
pub mod logging;
pub mod clock;

pub use errors::{LedgerError, Result};
pub use metrics::{MetricsRegistry, METRICS};
pub use logging::init_logging;
pub use clock::{Clock, ManualClock, SystemClock};
