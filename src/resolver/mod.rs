//! Seams between the bridge loop and the host environment.
//!
//! The loop talks to the process table only through [`GameDetector`], so
//! it can be driven by scripted detectors in tests.

pub mod detector;

pub use detector::{DetectedGame, GameDetector, ScanError, ScanReport};
