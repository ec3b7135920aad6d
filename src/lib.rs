//! A segmented time-of-day entry field for the Tessera UI framework.
//!
//! The [`time_field`](time_field::time_field) component lets users edit
//! hours, minutes, seconds, milliseconds and AM/PM as independently
//! addressable segments: digits accumulate into multi-digit values, arrow
//! keys step and navigate, partial input is buffered until the record is
//! complete, and the owner is notified only when the field clears or a
//! full timestamp can be composed.
//!
//! # Usage
//!
//! The field renders with the Material components of `tessera-components`,
//! so a `MaterialTheme` must be provided:
//!
//! ```no_run
//! use tessera_components::theme::{
//!     MaterialTheme, MaterialThemeProviderArgs, material_theme,
//! };
//! use tessera_time_field::time_field::{TimeFieldArgs, TimePrecision, time_field};
//!
//! fn app() {
//!     let args = MaterialThemeProviderArgs::new(
//!         || MaterialTheme::default(),
//!         || {
//!             time_field(&TimeFieldArgs::new(TimePrecision::Seconds));
//!         },
//!     );
//!     material_theme(&args);
//! }
//!
//! tessera_ui::entry!(app, pipelines = [tessera_components]);
//! ```
//!
//! The editing core (value decomposition, per-segment validation,
//! keystroke accumulation and composition) is plain data code and can be
//! used without a renderer:
//!
//! ```
//! use tessera_time_field::time_field::{TimeFormat, TimeParts, TimePrecision};
//!
//! let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
//! let parts = TimeParts::decompose(None, format);
//! assert!(parts.is_empty(format.precision));
//! ```
#![deny(missing_docs, clippy::unwrap_used)]

pub mod time_field;
