//! Metadata entry point.
//!
//! Ties a [`DumpSource`] to the parser and stores the result on a
//! [`ManifestMetadata`] document. When the source cannot produce a dump,
//! every component already known to the document is forced to
//! `exported=false` instead.

use crate::error::{Error, Result};
use crate::manifest::{ComponentCounts, ComponentInfo, Components, LinkStats, ManifestParser, ProviderInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Manifest section of an application metadata document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestMetadata {
    /// Application package name
    pub package_name: String,
    /// Declared target SDK, as text
    pub uses_target_sdk_version: String,
    /// Activities
    pub activities: Vec<ComponentInfo>,
    /// Services
    pub services: Vec<ComponentInfo>,
    /// Broadcast receivers
    pub broadcast_receivers: Vec<ComponentInfo>,
    /// Content providers
    pub content_providers: Vec<ProviderInfo>,
}

impl ManifestMetadata {
    /// Parses a metadata document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::MetadataParse)
    }

    /// Reads a metadata document from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_json(&json)
    }

    /// Serializes the document as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::MetadataSerialize)
    }

    /// Target SDK as an integer; absent or unparsable text is 0
    pub fn target_sdk(&self) -> u32 {
        parse_target_sdk(&self.uses_target_sdk_version)
    }

    /// Replaces the four component sequences
    pub fn set_components(&mut self, components: Components) {
        self.activities = components.activities;
        self.services = components.services;
        self.broadcast_receivers = components.receivers;
        self.content_providers = components.providers;
    }

    /// Copies the four component sequences out of the document
    pub fn components(&self) -> Components {
        Components {
            activities: self.activities.clone(),
            services: self.services.clone(),
            receivers: self.broadcast_receivers.clone(),
            providers: self.content_providers.clone(),
        }
    }
}

/// Parses a target SDK string; absent or unparsable text is 0
pub fn parse_target_sdk(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

/// Producer of `aapt dump xmltree` text
///
/// Implementations run or read whatever produces the dump. A failure is
/// reported as an error and handled by the caller with the fail-closed
/// fallback.
pub trait DumpSource {
    /// Produce the dump text
    fn dump(&self) -> Result<String>;

    /// Human-readable description used in logs
    fn describe(&self) -> String {
        "manifest dump".to_string()
    }
}

/// A dump already held in memory
#[derive(Debug, Clone)]
pub struct StaticDump {
    text: String,
}

impl StaticDump {
    /// Wraps dump text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DumpSource for StaticDump {
    fn dump(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        "in-memory dump".to_string()
    }
}

/// A dump saved to a file
#[derive(Debug, Clone)]
pub struct FileDumpSource {
    path: PathBuf,
}

impl FileDumpSource {
    /// Creates a source reading the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DumpSource for FileDumpSource {
    fn dump(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| Error::file_read(&self.path, e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// What [`extract_component_export_info`] did
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    /// The dump was parsed and the components replaced
    Parsed {
        /// Per-kind totals
        counts: ComponentCounts,
        /// Deep links and App Links of activities
        links: LinkStats,
    },
    /// The dump was unavailable and every known component was marked
    /// not exported
    FailClosed {
        /// Why the dump could not be obtained
        reason: String,
    },
}

impl ExtractionOutcome {
    /// Returns true if the fallback path ran
    pub fn is_fail_closed(&self) -> bool {
        matches!(self, ExtractionOutcome::FailClosed { .. })
    }
}

/// Populates the component sequences of `metadata` from a dump source
///
/// The target SDK comes from `metadata.uses_target_sdk_version`. If the
/// source fails, [`apply_default_exported_values`] runs instead and the
/// outcome is [`ExtractionOutcome::FailClosed`].
pub fn extract_component_export_info(
    source: &dyn DumpSource,
    metadata: &mut ManifestMetadata,
    parser: &ManifestParser,
) -> ExtractionOutcome {
    info!("Starting component extraction from {}", source.describe());

    let dump = match source.dump() {
        Ok(dump) => dump,
        Err(e) => {
            error!("Error extracting manifest dump: {}", e);
            apply_default_exported_values(metadata);
            return ExtractionOutcome::FailClosed {
                reason: e.to_string(),
            };
        }
    };
    debug!("Obtained manifest dump ({} bytes)", dump.len());

    let target_sdk = metadata.target_sdk();
    info!("Target SDK version: {}", target_sdk);

    let components = parser.parse(&dump, target_sdk);
    let counts = ComponentCounts::collect(&components);
    let links = LinkStats::collect(&components);

    info!("Extracted {} activities", counts.activities);
    info!("Extracted {} services", counts.services);
    info!("Extracted {} receivers", counts.receivers);
    info!("Extracted {} providers", counts.providers);

    for link in &links.links {
        info!(
            "Found deeplink in {}: scheme={}, host={}, path={}, pathPattern={}",
            link.component,
            link.scheme,
            link.host.as_deref().unwrap_or(""),
            link.path.as_deref().unwrap_or(""),
            link.path_pattern.as_deref().unwrap_or("")
        );
        if link.app_link {
            info!("App Link found: {}", link.uri());
        }
    }
    info!("Total deeplinks found: {}", links.deep_link_count());
    info!("Total app links found: {}", links.app_link_count());

    metadata.set_components(components);
    ExtractionOutcome::Parsed { counts, links }
}

/// Marks every component already known to `metadata` as not exported
///
/// Only names survive; intent filters and authorities are dropped.
pub fn apply_default_exported_values(metadata: &mut ManifestMetadata) {
    warn!(
        "Falling back to exported=false for {} known components",
        metadata.activities.len()
            + metadata.services.len()
            + metadata.broadcast_receivers.len()
            + metadata.content_providers.len()
    );

    let unexported = |infos: &[ComponentInfo]| -> Vec<ComponentInfo> {
        infos
            .iter()
            .map(|info| ComponentInfo::unexported(info.name.clone()))
            .collect()
    };

    metadata.activities = unexported(&metadata.activities);
    metadata.services = unexported(&metadata.services);
    metadata.broadcast_receivers = unexported(&metadata.broadcast_receivers);
    metadata.content_providers = metadata
        .content_providers
        .iter()
        .map(|provider| ProviderInfo::unexported(provider.name.clone()))
        .collect();
}
