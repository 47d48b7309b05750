//! Intent-filter and data extraction.

use super::model::{FilterData, IntentFilter};
use super::{ParserConfig, PathPrefixMode};
use crate::dump::Block;
use tracing::{debug, trace};

const INTENT_FILTER_TAG: &str = "intent-filter";
const DATA_TAG: &str = "data";
const ACTION_TAG: &str = "action";
const CATEGORY_TAG: &str = "category";

/// Extracts the meaningful intent filters of a component block
///
/// Filters with no action, category or data entry are dropped.
pub(crate) fn extract_intent_filters(block: &Block<'_, '_>, config: &ParserConfig) -> Vec<IntentFilter> {
    block
        .children(INTENT_FILTER_TAG)
        .iter()
        .filter_map(|filter_block| {
            let filter = extract_intent_filter(filter_block, config);
            if filter.is_meaningful() {
                debug!(
                    "Found intent filter with {} actions, {} categories, {} data elements",
                    filter.actions.len(),
                    filter.categories.len(),
                    filter.data.len()
                );
                Some(filter)
            } else {
                trace!(
                    "Dropping empty intent filter at line {}",
                    filter_block.line_number()
                );
                None
            }
        })
        .collect()
}

/// Builds one intent filter from its block
fn extract_intent_filter(block: &Block<'_, '_>, config: &ParserConfig) -> IntentFilter {
    let ns = config.namespace.as_str();

    let auto_verify = block
        .flag_attribute(ns, "autoVerify")
        .map(|flag| flag.value())
        .unwrap_or(false);

    IntentFilter {
        actions: named_children(block, ACTION_TAG, ns),
        categories: named_children(block, CATEGORY_TAG, ns),
        data: extract_data(block, config),
        priority: priority(block, ns),
        auto_verify,
    }
}

/// Collects `name` values of `tag` elements whose very next line is their
/// `name` attribute
fn named_children(block: &Block<'_, '_>, tag: &str, namespace: &str) -> Vec<String> {
    block
        .lines()
        .windows(2)
        .filter(|pair| pair[0].is_element(tag))
        .filter_map(|pair| pair[1].attribute())
        .filter(|attr| attr.is_named(namespace, "name"))
        .filter_map(|attr| attr.value.as_str())
        .map(String::from)
        .collect()
}

/// Reads the filter priority, string form first, then the typed integer
fn priority(block: &Block<'_, '_>, namespace: &str) -> i32 {
    if let Some(text) = block.string_attribute(namespace, "priority") {
        return text.trim().parse().unwrap_or(0);
    }
    block
        .hex_attribute(namespace, "priority")
        .and_then(|hex| hex.as_i32())
        .unwrap_or(0)
}

/// Resolves every `data` child of a filter block
fn extract_data(block: &Block<'_, '_>, config: &ParserConfig) -> Vec<FilterData> {
    let ns = config.namespace.as_str();
    let mut shared_prefixes = Vec::new();
    let mut entries = Vec::new();

    for data_block in block.children(DATA_TAG) {
        let prefix = text_attribute(&data_block, ns, "pathPrefix");
        if let Some(prefix) = &prefix {
            shared_prefixes.push(prefix.clone());
        }

        let entry = FilterData {
            scheme: text_attribute(&data_block, ns, "scheme"),
            host: text_attribute(&data_block, ns, "host"),
            port: text_attribute(&data_block, ns, "port"),
            path: text_attribute(&data_block, ns, "path"),
            path_prefix: prefix.into_iter().collect(),
            path_pattern: text_attribute(&data_block, ns, "pathPattern"),
            mime_type: text_attribute(&data_block, ns, "mimeType"),
        };

        if entry.is_empty() {
            trace!("Dropping empty data element at line {}", data_block.line_number());
            continue;
        }
        entries.push(entry);
    }

    if config.path_prefix_mode == PathPrefixMode::Shared {
        for entry in &mut entries {
            entry.path_prefix = shared_prefixes.clone();
        }
    }

    entries
}

fn text_attribute(block: &Block<'_, '_>, namespace: &str, local: &str) -> Option<String> {
    block.string_attribute(namespace, local).map(String::from)
}
