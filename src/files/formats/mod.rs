//! Container format handlers
//!
//! Each handler knows where its container keeps metadata and how to rewrite
//! it without touching anything else. Handlers work on byte slices only.

#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
