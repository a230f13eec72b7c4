//! Services module - file-level operations behind the command surface.
//!
//! The codecs in [`crate::codec`] only transform bytes. This layer adds the
//! file system: it checks that inputs exist, picks output paths, keeps the
//! solution index beside each build project in step, and records
//! [`Metrics`](crate::metrics::Metrics).
//!
//! Errors are `anyhow::Error` carrying the file path as context. The
//! underlying [`ModError`](crate::error::ModError) is still reachable with
//! `downcast_ref`.
//!
//! # Usage Example
//!
//! ```ignore
//! use modtools::services::ConversionService;
//!
//! let service = ConversionService::new(settings);
//! let written = service.manifest_to_build_project("My Mod (v 1).modinfo".into(), None, true)?;
//! println!("wrote {}", written);
//! ```

pub mod conversion;

pub use conversion::{ConversionService, SyncReport};
