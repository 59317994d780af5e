//! Include graph command

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{FeatureRegistry, IncludeGraph, VersionedIdentifier};
use crate::storage::{HostConfig, Workspace};
use crate::validator::{builder, supports_host};

/// Prints the include tree of `top`, children before their parents.
///
/// Includes that cannot be resolved are listed as missing.
pub fn run(output: &Output, overrides: &HostConfig, top: &VersionedIdentifier) -> Result<()> {
    let workspace = Workspace::open_current()?;
    let registry = workspace.registry()?;
    let host = workspace.host(overrides)?;

    let feature = registry.resolve(top)?;
    let features = builder::closure(&feature, &registry, true)
        .with_context(|| format!("Failed to walk the includes of {}", top))?;
    let graph = IncludeGraph::from_features(features.iter().map(|f| &**f))?;
    let order = graph.install_order()?;

    let optional = |parent: &VersionedIdentifier, child: &VersionedIdentifier| {
        features
            .get(parent)
            .map(|f| f.includes_feature(child, true))
            .unwrap_or(false)
    };

    if output.is_json() {
        let items: Vec<_> = order
            .iter()
            .filter_map(|id| features.get(id))
            .map(|f| {
                serde_json::json!({
                    "id": f.id,
                    "label": f.label(),
                    "supported": supports_host(f, &host),
                    "includes": graph.children(&f.id),
                })
            })
            .collect();
        let missing: Vec<_> = graph
            .dangling()
            .iter()
            .map(|(parent, child)| {
                serde_json::json!({
                    "parent": parent,
                    "child": child,
                    "optional": optional(parent, child),
                })
            })
            .collect();
        output.data(&serde_json::json!({ "order": items, "missing": missing }));
        return Ok(());
    }

    for f in order.iter().filter_map(|id| features.get(id)) {
        let id = f.id.to_string();
        let support = if supports_host(f, &host) {
            ""
        } else {
            "unsupported on this host"
        };
        output.row(&[id.as_str(), f.label(), support]);
    }

    for (parent, child) in graph.dangling() {
        let edge = format!("{} -> {}", parent, child);
        let kind = if optional(parent, child) { "optional" } else { "" };
        output.row(&["missing", edge.as_str(), kind]);
    }

    Ok(())
}
