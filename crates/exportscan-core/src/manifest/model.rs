//! Component records produced by the parser.
//!
//! Records are plain values: built once per parse, never mutated by the
//! parser afterwards. Serialized field names follow the camelCase shape
//! used by the metadata document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of application component that can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// `<activity>`
    Activity,
    /// `<service>`
    Service,
    /// `<receiver>`
    Receiver,
    /// `<provider>`
    Provider,
}

impl ComponentKind {
    /// Every kind, in the order components are reported
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Activity,
        ComponentKind::Service,
        ComponentKind::Receiver,
        ComponentKind::Provider,
    ];

    /// Element tag announcing this kind in the dump
    pub fn tag(self) -> &'static str {
        match self {
            ComponentKind::Activity => "activity",
            ComponentKind::Service => "service",
            ComponentKind::Receiver => "receiver",
            ComponentKind::Provider => "provider",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An activity, service or broadcast receiver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    /// Fully-qualified class name from the manifest
    pub name: String,
    /// Whether other applications can reach this component
    #[serde(default)]
    pub exported: bool,
    /// Intent filters in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intent_filters: Vec<IntentFilter>,
}

impl ComponentInfo {
    /// A record carrying only a name and `exported=false`
    pub fn unexported(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exported: false,
            intent_filters: Vec::new(),
        }
    }
}

/// A content provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    /// Fully-qualified class name from the manifest
    pub name: String,
    /// Whether other applications can reach this provider
    #[serde(default)]
    pub exported: bool,
    /// Authorities, split on `;` in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<String>,
}

impl ProviderInfo {
    /// A record carrying only a name and `exported=false`
    pub fn unexported(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exported: false,
            authorities: Vec::new(),
        }
    }
}

/// An `<intent-filter>` of an activity, service or receiver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentFilter {
    /// Action names, duplicates kept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    /// Category names, duplicates kept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// URI matching rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<FilterData>,
    /// Filter priority, 0 when absent or unparsable
    #[serde(default)]
    pub priority: i32,
    /// Whether the filter requests App Link verification
    #[serde(default)]
    pub auto_verify: bool,
}

impl IntentFilter {
    /// Returns true if the filter carries actions, categories or data
    pub fn is_meaningful(&self) -> bool {
        !self.actions.is_empty() || !self.categories.is_empty() || !self.data.is_empty()
    }
}

/// A `<data>` element of an intent filter
///
/// Absent fields stay `None`; an empty string in the dump is kept as
/// `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterData {
    /// URI scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// URI host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// URI port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Exact path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Path prefixes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_prefix: Vec<String>,
    /// Path pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FilterData {
    /// Returns true if no field is set
    pub fn is_empty(&self) -> bool {
        self.scheme.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.path.is_none()
            && self.path_prefix.is_empty()
            && self.path_pattern.is_none()
            && self.mime_type.is_none()
    }

    /// Returns true if this entry declares a non-empty scheme
    pub fn is_deep_link(&self) -> bool {
        self.scheme.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// One parsed component, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// An activity
    Activity(ComponentInfo),
    /// A service
    Service(ComponentInfo),
    /// A broadcast receiver
    Receiver(ComponentInfo),
    /// A content provider
    Provider(ProviderInfo),
}

impl Component {
    /// Kind of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Activity(_) => ComponentKind::Activity,
            Component::Service(_) => ComponentKind::Service,
            Component::Receiver(_) => ComponentKind::Receiver,
            Component::Provider(_) => ComponentKind::Provider,
        }
    }

    /// Class name of this component
    pub fn name(&self) -> &str {
        match self {
            Component::Activity(info) | Component::Service(info) | Component::Receiver(info) => {
                &info.name
            }
            Component::Provider(info) => &info.name,
        }
    }

    /// Resolved exported flag
    pub fn exported(&self) -> bool {
        match self {
            Component::Activity(info) | Component::Service(info) | Component::Receiver(info) => {
                info.exported
            }
            Component::Provider(info) => info.exported,
        }
    }

    /// Intent filters, always empty for providers
    pub fn intent_filters(&self) -> &[IntentFilter] {
        match self {
            Component::Activity(info) | Component::Service(info) | Component::Receiver(info) => {
                &info.intent_filters
            }
            Component::Provider(_) => &[],
        }
    }
}

/// Borrowed view of one record together with its kind
#[derive(Debug, Clone, Copy)]
pub enum ComponentRef<'a> {
    /// An activity, service or receiver
    Filtered(ComponentKind, &'a ComponentInfo),
    /// A content provider
    Provider(&'a ProviderInfo),
}

impl ComponentRef<'_> {
    /// Kind of the referenced component
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentRef::Filtered(kind, _) => *kind,
            ComponentRef::Provider(_) => ComponentKind::Provider,
        }
    }

    /// Class name of the referenced component
    pub fn name(&self) -> &str {
        match self {
            ComponentRef::Filtered(_, info) => &info.name,
            ComponentRef::Provider(info) => &info.name,
        }
    }

    /// Resolved exported flag
    pub fn exported(&self) -> bool {
        match self {
            ComponentRef::Filtered(_, info) => info.exported,
            ComponentRef::Provider(info) => info.exported,
        }
    }
}

/// The four ordered component sequences of one manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Activities in source order
    #[serde(default)]
    pub activities: Vec<ComponentInfo>,
    /// Services in source order
    #[serde(default)]
    pub services: Vec<ComponentInfo>,
    /// Broadcast receivers in source order
    #[serde(default)]
    pub receivers: Vec<ComponentInfo>,
    /// Content providers in source order
    #[serde(default)]
    pub providers: Vec<ProviderInfo>,
}

impl Components {
    /// Creates an empty set of sequences
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component to the sequence of its kind
    pub fn push(&mut self, component: Component) {
        match component {
            Component::Activity(info) => self.activities.push(info),
            Component::Service(info) => self.services.push(info),
            Component::Receiver(info) => self.receivers.push(info),
            Component::Provider(info) => self.providers.push(info),
        }
    }

    /// Number of records of one kind
    pub fn count(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Activity => self.activities.len(),
            ComponentKind::Service => self.services.len(),
            ComponentKind::Receiver => self.receivers.len(),
            ComponentKind::Provider => self.providers.len(),
        }
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        ComponentKind::ALL.iter().map(|&kind| self.count(kind)).sum()
    }

    /// Returns true if no component was found
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every record in reporting order
    pub fn iter(&self) -> impl Iterator<Item = ComponentRef<'_>> {
        let filtered = [
            (ComponentKind::Activity, &self.activities),
            (ComponentKind::Service, &self.services),
            (ComponentKind::Receiver, &self.receivers),
        ];
        filtered
            .into_iter()
            .flat_map(|(kind, infos)| infos.iter().map(move |info| ComponentRef::Filtered(kind, info)))
            .chain(self.providers.iter().map(ComponentRef::Provider))
    }
}

impl FromIterator<Component> for Components {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        let mut components = Components::new();
        for component in iter {
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_routes_by_kind() {
        let components: Components = vec![
            Component::Receiver(ComponentInfo::unexported("a.Receiver")),
            Component::Activity(ComponentInfo::unexported("a.Main")),
            Component::Provider(ProviderInfo::unexported("a.Files")),
            Component::Activity(ComponentInfo::unexported("a.Settings")),
        ]
        .into_iter()
        .collect();

        assert_eq!(components.count(ComponentKind::Activity), 2);
        assert_eq!(components.count(ComponentKind::Service), 0);
        assert_eq!(components.len(), 4);

        let order: Vec<_> = components.iter().map(|c| (c.kind(), c.name().to_string())).collect();
        assert_eq!(
            order,
            vec![
                (ComponentKind::Activity, "a.Main".to_string()),
                (ComponentKind::Activity, "a.Settings".to_string()),
                (ComponentKind::Receiver, "a.Receiver".to_string()),
                (ComponentKind::Provider, "a.Files".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_data_presence() {
        assert!(FilterData::default().is_empty());

        let empty_scheme = FilterData {
            scheme: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty_scheme.is_empty());
        assert!(!empty_scheme.is_deep_link());

        let port_only = FilterData {
            port: Some("8080".into()),
            ..Default::default()
        };
        assert!(!port_only.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let info = ComponentInfo {
            name: "a.Main".into(),
            exported: true,
            intent_filters: vec![IntentFilter {
                actions: vec!["android.intent.action.VIEW".into()],
                data: vec![FilterData {
                    scheme: Some("https".into()),
                    path_prefix: vec!["/p".into()],
                    ..Default::default()
                }],
                auto_verify: true,
                ..Default::default()
            }],
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["intentFilters"][0]["autoVerify"], true);
        assert_eq!(json["intentFilters"][0]["priority"], 0);
        assert_eq!(json["intentFilters"][0]["data"][0]["pathPrefix"][0], "/p");
        assert!(json["intentFilters"][0].get("categories").is_none());
        assert!(json["intentFilters"][0]["data"][0].get("host").is_none());

        let provider = serde_json::to_value(ProviderInfo::unexported("a.Files")).unwrap();
        assert!(provider.get("authorities").is_none());
        assert_eq!(provider["exported"], false);
    }

    #[test]
    fn test_deserialize_name_only_record() {
        let info: ComponentInfo = serde_json::from_str(r#"{"name":"a.Main"}"#).unwrap();
        assert_eq!(info, ComponentInfo::unexported("a.Main"));
    }
}
