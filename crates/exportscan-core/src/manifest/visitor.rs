//! Traversal of parsed components.
//!
//! The [`ComponentVisitor`] trait lets callers derive aggregate views
//! (statistics, reports) without re-walking the sequences by hand.

use super::model::{ComponentInfo, ComponentKind, Components, IntentFilter, ProviderInfo};
use serde::Serialize;

/// Trait for walking parsed components.
///
/// Every method has a no-op default; implement only what you need.
pub trait ComponentVisitor {
    /// Called once per component of every kind, in reporting order
    fn visit_component(&mut self, kind: ComponentKind, name: &str, exported: bool) {
        let _ = (kind, name, exported);
    }

    /// Called once per intent filter of an activity, service or receiver
    fn visit_intent_filter(&mut self, kind: ComponentKind, component: &ComponentInfo, filter: &IntentFilter) {
        let _ = (kind, component, filter);
    }

    /// Called once per content provider
    fn visit_provider(&mut self, provider: &ProviderInfo) {
        let _ = provider;
    }
}

impl Components {
    /// Walks every component, then its filters, with the given visitor
    pub fn accept<V: ComponentVisitor + ?Sized>(&self, visitor: &mut V) {
        let filtered = [
            (ComponentKind::Activity, &self.activities),
            (ComponentKind::Service, &self.services),
            (ComponentKind::Receiver, &self.receivers),
        ];

        for (kind, infos) in filtered {
            for info in infos {
                visitor.visit_component(kind, &info.name, info.exported);
                for filter in &info.intent_filters {
                    visitor.visit_intent_filter(kind, info, filter);
                }
            }
        }

        for provider in &self.providers {
            visitor.visit_component(ComponentKind::Provider, &provider.name, provider.exported);
            visitor.visit_provider(provider);
        }
    }
}

/// A deep link declared by an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepLink {
    /// Activity declaring the link
    pub component: String,
    /// URI scheme (never empty)
    pub scheme: String,
    /// URI host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Exact path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Path pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    /// `https` scheme in a filter with `autoVerify`
    pub app_link: bool,
}

impl DeepLink {
    /// Renders `scheme://host/path` from whatever parts are present
    pub fn uri(&self) -> String {
        format!(
            "{}://{}{}",
            self.scheme,
            self.host.as_deref().unwrap_or(""),
            self.path.as_deref().or(self.path_pattern.as_deref()).unwrap_or("")
        )
    }
}

/// Collects deep links and App Links of activities
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    /// Every deep link in source order
    pub links: Vec<DeepLink>,
}

impl LinkStats {
    /// Collects the links of a component set
    pub fn collect(components: &Components) -> Self {
        let mut stats = Self::default();
        components.accept(&mut stats);
        stats
    }

    /// Number of data entries with a non-empty scheme
    pub fn deep_link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of deep links that are verified App Links
    pub fn app_link_count(&self) -> usize {
        self.links.iter().filter(|link| link.app_link).count()
    }
}

impl ComponentVisitor for LinkStats {
    fn visit_intent_filter(&mut self, kind: ComponentKind, component: &ComponentInfo, filter: &IntentFilter) {
        if kind != ComponentKind::Activity {
            return;
        }

        for data in filter.data.iter().filter(|data| data.is_deep_link()) {
            let scheme = data.scheme.clone().unwrap_or_default();
            let app_link = scheme == "https" && filter.auto_verify;
            self.links.push(DeepLink {
                component: component.name.clone(),
                scheme,
                host: data.host.clone(),
                path: data.path.clone(),
                path_pattern: data.path_pattern.clone(),
                app_link,
            });
        }
    }
}

/// Per-kind totals of parsed and exported components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCounts {
    /// Activities found
    pub activities: usize,
    /// Services found
    pub services: usize,
    /// Receivers found
    pub receivers: usize,
    /// Providers found
    pub providers: usize,
    /// Components of any kind resolved as exported
    pub exported: usize,
}

impl ComponentCounts {
    /// Counts a component set
    pub fn collect(components: &Components) -> Self {
        let mut counts = Self::default();
        components.accept(&mut counts);
        counts
    }

    /// Total number of components
    pub fn total(&self) -> usize {
        self.activities + self.services + self.receivers + self.providers
    }
}

impl ComponentVisitor for ComponentCounts {
    fn visit_component(&mut self, kind: ComponentKind, _name: &str, exported: bool) {
        match kind {
            ComponentKind::Activity => self.activities += 1,
            ComponentKind::Service => self.services += 1,
            ComponentKind::Receiver => self.receivers += 1,
            ComponentKind::Provider => self.providers += 1,
        }
        if exported {
            self.exported += 1;
        }
    }
}
