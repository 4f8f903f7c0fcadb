#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Policies für nextplace.
//!
//! [`CategorySelector`] balanciert zwischen bekannten Vorlieben und neuen
//! Kategorien, [`QAgent`] lernt Handlungswerte per Temporal-Difference-Update
//! und achtet bei der Auswahl auf Abwechslung.

/// Warnung über `tracing` (Feature `telemetry`) oder `stderr`.
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        {
            tracing::warn!($($arg)*);
        }
        #[cfg(not(feature = "telemetry"))]
        {
            eprintln!($($arg)*);
        }
    }};
}

/// Ob Warnungen über `tracing` laufen.
pub const TELEMETRY: bool = cfg!(feature = "telemetry");

pub mod error;
pub mod qlearn;
pub mod select;

pub use error::{BanditError, Result};
pub use qlearn::{action_kind, QAgent, SharedAgent};
pub use select::{weighted_pick, CategorySelector, Selection, SelectionMode};
