//! AppForge Realtime - Main Library
//!
//! This crate ties the workspace together for the diagnostic binaries:
//!
//! - **bin_common**: common utilities for binary executables (logging setup)
//! - **livesockets**: the realtime client library (re-exported from the
//!   workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use appforge_realtime::bin_common::logging::init_tracing;
//! use appforge_realtime::livesockets::MessageRouter;
//! ```

// Re-export the workspace library for convenience
pub use livesockets;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod logging;
}
