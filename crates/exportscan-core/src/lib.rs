//! # exportscan-core
//!
//! A library for resolving which Android application components are
//! reachable from other applications, from the text printed by
//! `aapt dump xmltree <apk> AndroidManifest.xml`.
//!
//! This crate provides the core functionality for:
//! - Classifying dump lines and locating component blocks by indentation
//! - Reading attributes in both their string and typed hex encodings
//! - Resolving the `exported` flag the way the platform does, including
//!   the implicit-export change at API level 31
//! - Extracting intent filters, their data elements, and deep links
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dump`]: Line classification, block location and attribute parsing
//! - [`manifest`]: Component records, export resolution and intent filters
//! - [`metadata`]: Entry point that fills a metadata document from a dump
//!   source, with the fail-closed fallback
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use exportscan_core::{LinkStats, ManifestParser};
//! use std::fs;
//!
//! // Output of `aapt dump xmltree app.apk AndroidManifest.xml`
//! let dump = fs::read_to_string("./manifest.txt")?;
//!
//! let components = ManifestParser::new().parse(&dump, 34);
//! for activity in components.activities.iter().filter(|a| a.exported) {
//!     println!("exported activity: {}", activity.name);
//! }
//!
//! let links = LinkStats::collect(&components);
//! println!("{} deep links, {} app links", links.deep_link_count(), links.app_link_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`ComponentVisitor`]: Derive custom views over parsed components
//! - [`DumpSource`]: Plug in whatever produces the dump text
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod dump;
pub mod error;
pub mod manifest;
pub mod metadata;

// Re-export primary types for convenience
pub use dump::{is_hex_value_true, HEX_TRUE};
pub use error::{Error, Result};
pub use manifest::{
    parse_components, Component, ComponentCounts, ComponentInfo, ComponentKind, ComponentVisitor,
    Components, DeepLink, ExportDecision, ExportSource, FilterData, IntentFilter, LinkStats,
    ManifestParser, ParserConfig, PathPrefixMode, ProviderInfo,
};
pub use metadata::{
    apply_default_exported_values, extract_component_export_info, DumpSource, ExtractionOutcome,
    FileDumpSource, ManifestMetadata, StaticDump,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// First API level at which an intent filter no longer exports a component
/// implicitly
pub const IMPLICIT_EXPORT_CUTOFF_SDK: u32 = 31;
