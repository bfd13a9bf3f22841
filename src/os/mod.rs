//! Platform-specific extensions to the platform-independent API.
//!
//! Each module adds an extension trait on [`Library`](crate::Library) that
//! is only functional when the matching backend is active; on any other
//! backend the methods fail with
//! [`FeatureUnavailable`](crate::ErrorKind::FeatureUnavailable).

pub mod headless;
