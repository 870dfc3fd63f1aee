//! # photo-mover
//!
//! Organize photos and videos into a folder tree derived from their own metadata: capture
//! date, camera make and model, and the place name behind their GPS coordinates.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through [`pipeline::Organizer`], which handles
//! the full classify → extract → geocode → resolve → place flow for a whole tree:
//!
//! ```rust,no_run
//! use photo_mover::config::Config;
//! use photo_mover::pipeline::Organizer;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load(None)?;
//!     config.pattern = "/{year}/{month}/{camera}/{filename}{extension}".into();
//!
//!     let mut organizer = Organizer::new(config);
//!     let summary = organizer.run(Path::new("./inbox"), Path::new("./library")).await?;
//!     println!("{summary}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! Each step is usable on its own:
//!
//! ```rust,no_run
//! use photo_mover::config::Config;
//! use photo_mover::metadata::{MediaKind, extract};
//! use photo_mover::pattern::resolve_pattern;
//! use photo_mover::placement::{Transfer, place};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let path = Path::new("IMG_0001.JPG");
//! let config = Config::default();
//!
//! if let Some(kind) = MediaKind::probe(path)? {
//!     let extracted = extract(path, kind, &config)?;
//!     let relative = resolve_pattern(&config.pattern, &extracted.fields);
//!     let result = place(path, Path::new("./library"), &relative, Transfer::Copy);
//!     println!("{relative}: {result:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pattern Tokens
//!
//! | Token | Value |
//! |-------|-------|
//! | `{year}` | Capture year |
//! | `{month}` | Capture month, two digits |
//! | `{camera}` | `"{make} - {model}"`, empty unless both are known |
//! | `{filename}` | File name without extension |
//! | `{extension}` | Extension including the dot |
//! | `{location}` | Place name resolved from GPS, empty without geocoding |
//! | `{separator}` | Separator, only when a location is present |
//! | `{fixedpath}` | Fixed sub-path for the media kind (`video` for videos) |
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`diagnostics`] — Optional append-only debug file
//! - [`geocode`] — Reverse geocoding with a quantized per-run cache
//! - [`metadata`] — Content sniffing and capture metadata extraction
//! - [`pattern`] — Destination pattern resolution
//! - [`pipeline`] — Source tree walk, per-file orchestration and run counters
//! - [`placement`] — Move or copy with duplicate detection

pub mod config;
pub mod diagnostics;
pub mod geocode;
pub mod metadata;
pub mod pattern;
pub mod pipeline;
pub mod placement;
