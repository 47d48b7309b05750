//! Exported-flag resolution.
//!
//! Activities, services and receivers:
//!
//! 1. explicit string `exported` wins
//! 2. otherwise an explicit hex `exported`, true only for `0xffffffff`
//! 3. otherwise exported iff the block has an `intent-filter` child and the
//!    target SDK is below [`IMPLICIT_EXPORT_CUTOFF_SDK`]
//!
//! Providers replace step 3: absent an explicit flag they are exported
//! only when `grantUriPermissions` resolves true. Neither the target SDK
//! nor intent filters affect providers.

use super::model::ComponentKind;
use crate::dump::{Block, Flag};
use crate::IMPLICIT_EXPORT_CUTOFF_SDK;
use std::fmt;

const EXPORTED_ATTR: &str = "exported";
const GRANT_URI_PERMISSIONS_ATTR: &str = "grantUriPermissions";
const INTENT_FILTER_TAG: &str = "intent-filter";

/// How a component kind defaults when no explicit flag is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPolicy {
    /// Implicitly exported by intent filters before the SDK cutoff
    IntentFilterDefault,
    /// Implicitly exported only through `grantUriPermissions`
    GrantUriPermissions,
}

impl From<ComponentKind> for ExportPolicy {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Provider => ExportPolicy::GrantUriPermissions,
            _ => ExportPolicy::IntentFilterDefault,
        }
    }
}

/// Where an export decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSource {
    /// `exported="true"` / `exported="false"`
    ExplicitString,
    /// `exported=(type 0x12)0x...`
    ExplicitHex,
    /// Implicit export through an intent filter
    IntentFilterDefault,
    /// Provider default driven by `grantUriPermissions`
    GrantUriPermissions,
    /// Nothing declared; not exported
    SecureDefault,
}

impl fmt::Display for ExportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportSource::ExplicitString => "explicit string",
            ExportSource::ExplicitHex => "explicit hex",
            ExportSource::IntentFilterDefault => "intent-filter default",
            ExportSource::GrantUriPermissions => "grantUriPermissions",
            ExportSource::SecureDefault => "secure default",
        };
        f.write_str(label)
    }
}

/// A resolved exported flag and its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportDecision {
    /// Whether the component is exported
    pub exported: bool,
    /// What the decision was based on
    pub source: ExportSource,
}

impl ExportDecision {
    fn new(exported: bool, source: ExportSource) -> Self {
        Self { exported, source }
    }
}

/// Resolves the exported flag of a component block
pub fn resolve_exported(
    block: &Block<'_, '_>,
    policy: ExportPolicy,
    namespace: &str,
    target_sdk: u32,
) -> ExportDecision {
    match block.flag_attribute(namespace, EXPORTED_ATTR) {
        Some(Flag::String(value)) => return ExportDecision::new(value, ExportSource::ExplicitString),
        Some(Flag::Hex(value)) => return ExportDecision::new(value, ExportSource::ExplicitHex),
        None => {}
    }

    match policy {
        ExportPolicy::IntentFilterDefault => {
            if block.contains_element(INTENT_FILTER_TAG) {
                ExportDecision::new(
                    implicitly_exported(target_sdk),
                    ExportSource::IntentFilterDefault,
                )
            } else {
                ExportDecision::new(false, ExportSource::SecureDefault)
            }
        }
        ExportPolicy::GrantUriPermissions => {
            match block.flag_attribute(namespace, GRANT_URI_PERMISSIONS_ATTR) {
                Some(flag) => ExportDecision::new(flag.value(), ExportSource::GrantUriPermissions),
                None => ExportDecision::new(false, ExportSource::SecureDefault),
            }
        }
    }
}

/// Returns true if a component with an intent filter and no explicit flag
/// is exported at this target SDK
pub fn implicitly_exported(target_sdk: u32) -> bool {
    target_sdk < IMPLICIT_EXPORT_CUTOFF_SDK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::Dump;

    fn decide(component: &str, policy: ExportPolicy, target_sdk: u32) -> ExportDecision {
        let text = format!("E: application (line=1)\n{}", component);
        let dump = Dump::parse(&text);
        let tag = match policy {
            ExportPolicy::IntentFilterDefault => "activity",
            ExportPolicy::GrantUriPermissions => "provider",
        };
        let block = dump.application_children(tag)[0];
        resolve_exported(&block, policy, "android", target_sdk)
    }

    const WITH_FILTER: &str = "\
  E: activity (line=2)
    A: android:name(0x01010003)=\"a.Main\"
    E: intent-filter (line=3)
      E: action (line=4)
        A: android:name(0x01010003)=\"android.intent.action.VIEW\"
";

    const WITHOUT_FILTER: &str = "\
  E: activity (line=2)
    A: android:name(0x01010003)=\"a.Main\"
";

    #[test]
    fn test_no_flag_no_filter_is_not_exported() {
        for sdk in [0, 30, 31, 34] {
            let decision = decide(WITHOUT_FILTER, ExportPolicy::IntentFilterDefault, sdk);
            assert_eq!(decision, ExportDecision::new(false, ExportSource::SecureDefault));
        }
    }

    #[test]
    fn test_intent_filter_sdk_cutoff() {
        for (sdk, expected) in [(0, true), (30, true), (31, false), (34, false)] {
            let decision = decide(WITH_FILTER, ExportPolicy::IntentFilterDefault, sdk);
            assert_eq!(decision.exported, expected, "target sdk {}", sdk);
            assert_eq!(decision.source, ExportSource::IntentFilterDefault);
        }
    }

    #[test]
    fn test_explicit_flags_override_defaults() {
        let hex_true = "  E: activity (line=2)\n    A: android:name(0x01010003)=\"a.B\"\n    A: android:exported(0x01010010)=(type 0x12)0xffffffff\n";
        let decision = decide(hex_true, ExportPolicy::IntentFilterDefault, 34);
        assert_eq!(decision, ExportDecision::new(true, ExportSource::ExplicitHex));

        let hex_one = "  E: activity (line=2)\n    A: android:exported(0x01010010)=(type 0x12)0x1\n    E: intent-filter (line=3)\n";
        let decision = decide(hex_one, ExportPolicy::IntentFilterDefault, 20);
        assert_eq!(decision, ExportDecision::new(false, ExportSource::ExplicitHex));

        let string_false = "  E: activity (line=2)\n    A: android:exported(0x01010010)=\"false\"\n    E: intent-filter (line=3)\n";
        let decision = decide(string_false, ExportPolicy::IntentFilterDefault, 20);
        assert_eq!(decision, ExportDecision::new(false, ExportSource::ExplicitString));
    }

    #[test]
    fn test_provider_defaults() {
        let plain = "  E: provider (line=2)\n    A: android:name(0x01010003)=\"a.P\"\n";
        assert_eq!(
            decide(plain, ExportPolicy::GrantUriPermissions, 20),
            ExportDecision::new(false, ExportSource::SecureDefault)
        );

        let granted = "  E: provider (line=2)\n    A: android:grantUriPermissions(0x0101001b)=(type 0x12)0xffffffff\n";
        assert_eq!(
            decide(granted, ExportPolicy::GrantUriPermissions, 34),
            ExportDecision::new(true, ExportSource::GrantUriPermissions)
        );

        let denied = "  E: provider (line=2)\n    A: android:grantUriPermissions(0x0101001b)=\"false\"\n";
        assert!(!decide(denied, ExportPolicy::GrantUriPermissions, 34).exported);

        let explicit = "  E: provider (line=2)\n    A: android:exported(0x01010010)=(type 0x12)0x0\n    A: android:grantUriPermissions(0x0101001b)=(type 0x12)0xffffffff\n";
        assert_eq!(
            decide(explicit, ExportPolicy::GrantUriPermissions, 34),
            ExportDecision::new(false, ExportSource::ExplicitHex)
        );
    }

    #[test]
    fn test_provider_ignores_intent_filters_and_sdk() {
        let with_filter = "  E: provider (line=2)\n    E: intent-filter (line=3)\n      E: action (line=4)\n";
        assert!(!decide(with_filter, ExportPolicy::GrantUriPermissions, 0).exported);
    }

    #[test]
    fn test_policy_from_kind() {
        assert_eq!(ExportPolicy::from(ComponentKind::Provider), ExportPolicy::GrantUriPermissions);
        assert_eq!(ExportPolicy::from(ComponentKind::Receiver), ExportPolicy::IntentFilterDefault);
    }
}
