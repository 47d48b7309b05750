//! Component extraction from a classified dump.
//!
//! [`ManifestParser`] is a pure function from dump text and a target SDK to
//! four ordered component sequences. One generic walk handles every
//! [`ComponentKind`]; the kind only decides the element tag, the export
//! policy and whether intent filters or authorities are collected.
//!
//! Nothing here fails. A block without a `name` is skipped, an empty
//! filter or data element is dropped, and an undecidable exported flag
//! resolves to `false`.

mod export;
mod filter;
mod model;
mod visitor;

use crate::dump::{Block, Dump};
use tracing::{debug, trace};

pub use export::{implicitly_exported, resolve_exported, ExportDecision, ExportPolicy, ExportSource};
pub use model::{
    Component, ComponentInfo, ComponentKind, ComponentRef, Components, FilterData, IntentFilter,
    ProviderInfo,
};
pub use visitor::{ComponentCounts, ComponentVisitor, DeepLink, LinkStats};

/// Default attribute namespace prefix
pub const ANDROID_NAMESPACE: &str = "android";

/// How `pathPrefix` values are attached to the data entries of a filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathPrefixMode {
    /// Every data entry of a filter carries all prefixes declared anywhere
    /// in that filter, in source order
    #[default]
    Shared,
    /// Each data entry carries only the prefixes of its own element
    PerData,
}

/// Configuration for the manifest parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Attribute namespace prefix (default: `android`)
    pub namespace: String,
    /// Attachment of `pathPrefix` values
    pub path_prefix_mode: PathPrefixMode,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            namespace: ANDROID_NAMESPACE.to_string(),
            path_prefix_mode: PathPrefixMode::default(),
        }
    }
}

impl ParserConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attribute namespace prefix
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets how `pathPrefix` values are attached
    pub fn path_prefix_mode(mut self, mode: PathPrefixMode) -> Self {
        self.path_prefix_mode = mode;
        self
    }
}

/// Parses `aapt dump xmltree` output into component records
#[derive(Debug, Clone, Default)]
pub struct ManifestParser {
    config: ParserConfig,
}

impl ManifestParser {
    /// Creates a new parser with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new parser with custom configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses every component kind
    pub fn parse(&self, dump_text: &str, target_sdk: u32) -> Components {
        let dump = Dump::parse(dump_text);
        debug!(
            "Parsing {} dump lines (target sdk {})",
            dump.lines().len(),
            target_sdk
        );

        ComponentKind::ALL
            .iter()
            .flat_map(|&kind| self.components_in(&dump, kind, target_sdk))
            .collect()
    }

    /// Parses the components of a single kind
    pub fn parse_kind(&self, dump_text: &str, kind: ComponentKind, target_sdk: u32) -> Vec<Component> {
        let dump = Dump::parse(dump_text);
        self.components_in(&dump, kind, target_sdk)
    }

    fn components_in(&self, dump: &Dump<'_>, kind: ComponentKind, target_sdk: u32) -> Vec<Component> {
        let blocks = dump.application_children(kind.tag());
        debug!("Found {} {} blocks", blocks.len(), kind);

        blocks
            .iter()
            .filter_map(|block| self.build_component(block, kind, target_sdk))
            .collect()
    }

    /// Builds one record from a component block
    fn build_component(
        &self,
        block: &Block<'_, '_>,
        kind: ComponentKind,
        target_sdk: u32,
    ) -> Option<Component> {
        let ns = self.config.namespace.as_str();

        let name = match block.string_attribute(ns, "name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                debug!(
                    "Skipping {} block at line {} without name attribute",
                    kind,
                    block.line_number()
                );
                return None;
            }
        };

        let decision = resolve_exported(block, ExportPolicy::from(kind), ns, target_sdk);
        debug!(
            "{} {} exported={} ({})",
            kind, name, decision.exported, decision.source
        );

        let component = match kind {
            ComponentKind::Provider => {
                let authorities: Vec<String> = block
                    .string_attribute(ns, "authorities")
                    .map(|list| list.split(';').map(String::from).collect())
                    .unwrap_or_default();
                trace!("Provider {} authorities: {:?}", name, authorities);

                Component::Provider(ProviderInfo {
                    name,
                    exported: decision.exported,
                    authorities,
                })
            }
            _ => {
                let info = ComponentInfo {
                    intent_filters: filter::extract_intent_filters(block, &self.config),
                    name,
                    exported: decision.exported,
                };
                trace!(
                    "{} {} has {} intent filters",
                    kind,
                    info.name,
                    info.intent_filters.len()
                );
                match kind {
                    ComponentKind::Activity => Component::Activity(info),
                    ComponentKind::Service => Component::Service(info),
                    _ => Component::Receiver(info),
                }
            }
        };

        Some(component)
    }
}

/// Parses a dump with the default configuration
pub fn parse_components(dump_text: &str, target_sdk: u32) -> Components {
    ManifestParser::new().parse(dump_text, target_sdk)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
N: android=http://schemas.android.com/apk/res/android
  E: manifest (line=2)
    A: package=\"com.example\" (Raw: \"com.example\")
    E: application (line=8)
      E: activity (line=10)
        A: android:name(0x01010003)=\"com.example.Main\" (Raw: \"com.example.Main\")
        E: intent-filter (line=12)
          E: action (line=13)
            A: android:name(0x01010003)=\"android.intent.action.MAIN\" (Raw: \"android.intent.action.MAIN\")
          E: category (line=14)
            A: android:name(0x01010003)=\"android.intent.category.LAUNCHER\" (Raw: \"android.intent.category.LAUNCHER\")
      E: activity (line=16)
        A: android:theme(0x01010000)=@0x7f1301a2
      E: service (line=18)
        A: android:name(0x01010003)=\"com.example.Sync\" (Raw: \"com.example.Sync\")
        A: android:exported(0x01010010)=(type 0x12)0x0
      E: receiver (line=20)
        A: android:name(0x01010003)=\"com.example.Boot\" (Raw: \"com.example.Boot\")
        E: intent-filter (line=21)
          A: android:priority(0x0101001c)=(type 0x10)0x3e8
      E: provider (line=23)
        A: android:name(0x01010003)=\"com.example.Files\" (Raw: \"com.example.Files\")
        A: android:authorities(0x01010018)=\"com.example.files;com.example.share\" (Raw: \"com.example.files;com.example.share\")
        A: android:grantUriPermissions(0x0101001b)=(type 0x12)0xffffffff
        E: meta-data (line=26)
          A: android:name(0x01010003)=\"android.support.FILE_PROVIDER_PATHS\" (Raw: \"android.support.FILE_PROVIDER_PATHS\")
";

    #[test]
    fn test_parse_pre_cutoff() {
        let components = parse_components(DUMP, 30);

        assert_eq!(components.activities.len(), 1);
        let main = &components.activities[0];
        assert_eq!(main.name, "com.example.Main");
        assert!(main.exported);
        assert_eq!(main.intent_filters.len(), 1);
        assert_eq!(main.intent_filters[0].categories, vec!["android.intent.category.LAUNCHER"]);

        assert_eq!(components.services.len(), 1);
        assert!(!components.services[0].exported);

        // A filter with only a priority is dropped but still counts as a filter for export
        let boot = &components.receivers[0];
        assert!(boot.exported);
        assert!(boot.intent_filters.is_empty());

        let files = &components.providers[0];
        assert!(files.exported);
        assert_eq!(files.authorities, vec!["com.example.files", "com.example.share"]);
    }

    #[test]
    fn test_parse_post_cutoff() {
        let components = parse_components(DUMP, 31);
        assert!(!components.activities[0].exported);
        assert!(!components.receivers[0].exported);
        assert!(components.providers[0].exported);
    }

    #[test]
    fn test_nameless_block_is_skipped() {
        let activities = ManifestParser::new().parse_kind(DUMP, ComponentKind::Activity, 34);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].name(), "com.example.Main");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = ManifestParser::new();
        assert_eq!(parser.parse(DUMP, 34), parser.parse(DUMP, 34));
    }

    #[test]
    fn test_custom_namespace() {
        let dump = DUMP.replace("android:", "droid:");
        let parser = ManifestParser::with_config(ParserConfig::new().namespace("droid"));
        let components = parser.parse(&dump, 34);
        assert_eq!(components.len(), 4);

        let default_ns = parse_components(&dump, 34);
        assert!(default_ns.is_empty());
    }

    #[test]
    fn test_providers_never_carry_intent_filters() {
        let components = parse_components(DUMP, 20);
        for component in components.iter() {
            if component.kind() == ComponentKind::Provider {
                assert!(matches!(component, ComponentRef::Provider(_)));
            }
        }
    }
}
