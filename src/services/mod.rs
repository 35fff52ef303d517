//! Services module - the `.ini` rewriting engine.
//!
//! Everything here is synchronous and works on one file at a time. Stages run
//! in strict sequence, each consuming the complete output of the previous one:
//!
//! - [`SectionParser`]: raw text to named sections, each with a conditional-aware
//!   [`Template`](crate::models::Template). Malformed key/value blocks become
//!   empty parts instead of failing the scan.
//! - [`SectionGraph`]: sections reachable from a set of roots through `run`,
//!   in pre-order, with the generated name of each section per variant.
//! - [`RemapFixer`]: the blend, non-blend and resource fill policies and the
//!   boilerplate-fenced text they are assembled into.
//! - [`IniRemover`]: removal of generated blocks and generated sections, with
//!   the buffer files they referenced.
//! - [`IniFile`]: the per-file model running the apply/undo protocol.
//! - [`RemapService`]: undo then apply over a list of files, skipping and
//!   reporting the ones that fail.
//!
//! # Usage Example
//!
//! ```ignore
//! use iniremap::services::{ApplyOutcome, IniFile};
//!
//! let mut ini = IniFile::from_path("Mods/Raiden/Raiden.ini")
//!     .with_mod_types(mod_types.all().to_vec())
//!     .with_variants(["RaidenBoss"]);
//!
//! if let ApplyOutcome::Applied { variants } = ini.apply()? {
//!     ini.write()?;
//!     println!("Generated {variants:?}");
//! }
//! ```
//!
//! # Idempotence
//!
//! Generated content is fenced by a `; --------------- <Type> Remap ---------------`
//! heading. A file containing that heading, or a `TextureOverride...RemapBlend`
//! section, is treated as already fixed and never generated twice.

pub mod errors;
pub mod generator;
pub mod graph;
pub mod ini_file;
pub mod keyvalue;
pub mod names;
pub mod parser;
pub mod remap_service;
pub mod remover;

pub use errors::RemapError;
pub use generator::{fill_template, generate, FillContext, RemapFixer};
pub use graph::SectionGraph;
pub use ini_file::{ApplyOutcome, IniFile};
pub use keyvalue::{parse_key_values, KeyValueError};
pub use parser::{ParsedIni, SectionParser};
pub use remap_service::{FileResult, FileStatus, RemapOptions, RemapService, RemapSummary};
pub use remover::{IniRemover, UndoReport};
