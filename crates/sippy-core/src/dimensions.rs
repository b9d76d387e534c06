//! Dimension resolver: expands one test identity into the row keys and
//! column keys it contributes to, at the requested drill-down depth.

use crate::model::{ColumnKey, RowKey, TestAggregate, TestIdentity};
use crate::request::{GroupField, TestIdFilter, VariantFilter};

/// Strategy for mapping a test onto its owning component and capabilities.
/// The production mapping rides along on the aggregate rows; tests inject
/// their own.
pub trait ComponentResolver: Send + Sync {
    fn component_and_capabilities(
        &self,
        identity: &TestIdentity,
        aggregate: &TestAggregate,
    ) -> (String, Vec<String>);
}

/// Trusts the component mapping the warehouse joined onto each row.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappedComponents;

impl ComponentResolver for MappedComponents {
    fn component_and_capabilities(
        &self,
        _identity: &TestIdentity,
        aggregate: &TestAggregate,
    ) -> (String, Vec<String>) {
        (aggregate.component.clone(), aggregate.capabilities.clone())
    }
}

/// Row keys for one test. Different pages have different row granularity:
/// the top page rows are components, a component page fans a test out into
/// one row per capability, and a test page pins a single test row. A
/// component filter that does not match excludes the test entirely.
pub fn resolve_rows(
    filter: &TestIdFilter,
    component: &str,
    capabilities: &[String],
    identity: &TestIdentity,
) -> Vec<RowKey> {
    let mut rows = Vec::new();
    if filter.component.is_empty() {
        rows.push(RowKey {
            component: component.to_string(),
            ..RowKey::default()
        });
    } else if filter.component == component {
        if !filter.test_id.is_empty() {
            rows.push(RowKey {
                component: component.to_string(),
                capability: filter.capability.clone(),
                test_name: identity.test_name.clone(),
                test_id: identity.test_id.clone(),
            });
        } else if !filter.capability.is_empty() {
            // An exact capability match produces exactly one row.
            if capabilities.iter().any(|cap| *cap == filter.capability) {
                rows.push(RowKey {
                    component: component.to_string(),
                    capability: filter.capability.clone(),
                    test_name: identity.test_name.clone(),
                    test_id: identity.test_id.clone(),
                });
            }
        } else {
            for capability in capabilities {
                rows.push(RowKey {
                    component: component.to_string(),
                    capability: capability.clone(),
                    ..RowKey::default()
                });
            }
        }
    }
    rows
}

/// Column keys for one test. When a specific test is requested the group-by
/// set is ignored and every environment dimension is emitted so the test's
/// configurations stay distinguishable; otherwise only the grouped fields
/// are populated. A `variant` grouping fans out one column per variant tag.
pub fn resolve_columns(
    filter: &VariantFilter,
    test_id_requested: bool,
    identity: &TestIdentity,
    aggregate: &TestAggregate,
) -> Vec<ColumnKey> {
    let mut template = ColumnKey::default();
    let fan_out_variants;
    if test_id_requested {
        template.platform = identity.platform.clone();
        template.network = identity.network.clone();
        template.arch = identity.arch.clone();
        template.upgrade = identity.upgrade.clone();
        fan_out_variants = true;
    } else {
        let groups = &filter.group_by;
        if groups.contains(GroupField::Cloud) {
            template.platform = identity.platform.clone();
        }
        if groups.contains(GroupField::Network) {
            template.network = identity.network.clone();
        }
        if groups.contains(GroupField::Arch) {
            template.arch = identity.arch.clone();
        }
        if groups.contains(GroupField::Upgrade) {
            template.upgrade = identity.upgrade.clone();
        }
        fan_out_variants = groups.contains(GroupField::Variant);
    }

    if !fan_out_variants || aggregate.variants.is_empty() {
        return vec![template];
    }
    aggregate
        .variants
        .iter()
        .map(|variant| {
            let mut column = template.clone();
            column.variant = variant.clone();
            column
        })
        .collect()
}
