// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pagebot import`, `pagebot flows` and `pagebot templates`.

use std::path::Path;

use pagebot_core::types::FlowRecord;
use pagebot_core::{PagebotError, StorageAdapter};
use pagebot_flow::{FlowGraph, templates};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Flow JSON as exported by the editor.
#[derive(Debug, Deserialize)]
struct FlowFile {
    #[serde(default)]
    name: Option<String>,
    nodes: Value,
    edges: Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Mark the flow as the page's default. Implies `activate`.
    pub default: bool,
    /// Make this the page's only active flow.
    pub activate: bool,
}

/// Import a flow file into a page.
pub async fn import_flow(
    storage: &dyn StorageAdapter,
    page_id: &str,
    path: &Path,
    name: Option<String>,
    options: InstallOptions,
) -> Result<FlowRecord, PagebotError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PagebotError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let file: FlowFile = serde_json::from_str(&content).map_err(|e| {
        PagebotError::Config(format!("{} is not a flow file: {e}", path.display()))
    })?;
    let name = name
        .or(file.name)
        .unwrap_or_else(|| path.file_stem().map_or_else(
            || "Imported flow".to_string(),
            |s| s.to_string_lossy().into_owned(),
        ));
    install(storage, page_id, name, file.nodes, file.edges, options).await
}

/// Copy a built-in template into a page.
pub async fn install_template(
    storage: &dyn StorageAdapter,
    page_id: &str,
    template_id: &str,
    options: InstallOptions,
) -> Result<FlowRecord, PagebotError> {
    let template = templates::get(template_id).ok_or_else(|| PagebotError::NotFound {
        kind: "template",
        id: template_id.to_string(),
    })?;
    install(
        storage,
        page_id,
        template.name.to_string(),
        template.nodes,
        template.edges,
        options,
    )
    .await
}

/// One line per built-in template.
pub fn template_listing() -> Vec<String> {
    templates::all()
        .iter()
        .map(|t| format!("{:<10} {:<24} {}", t.id, t.name, t.description))
        .collect()
}

/// One line per flow of a page with its active/default flags.
pub async fn flow_listing(
    storage: &dyn StorageAdapter,
    page_id: &str,
) -> Result<Vec<String>, PagebotError> {
    crate::admin::require_page(storage, page_id).await?;
    let flows = storage.list_flows(page_id).await?;
    if flows.is_empty() {
        return Ok(vec![format!("page {page_id} has no flows")]);
    }
    Ok(flows
        .iter()
        .map(|f| {
            let mut flags = Vec::new();
            if f.is_active {
                flags.push("active");
            }
            if f.is_default {
                flags.push("default");
            }
            format!("{:<36} {:<24} {}", f.id, f.name, flags.join(","))
        })
        .collect())
}

/// Make `flow_id` the page's only active flow.
pub async fn activate_flow(
    storage: &dyn StorageAdapter,
    page_id: &str,
    flow_id: &str,
) -> Result<(), PagebotError> {
    crate::admin::require_page(storage, page_id).await?;
    storage.activate_flow(page_id, flow_id).await?;
    info!(page_id, flow_id, "flow activated");
    Ok(())
}

async fn install(
    storage: &dyn StorageAdapter,
    page_id: &str,
    name: String,
    nodes: Value,
    edges: Value,
    options: InstallOptions,
) -> Result<FlowRecord, PagebotError> {
    crate::admin::require_page(storage, page_id).await?;

    let id = uuid::Uuid::new_v4().to_string();
    let graph = FlowGraph::from_parts(&id, &nodes, &edges).map_err(|e| e.into_pagebot(&id))?;
    graph.trigger().map_err(|e| e.into_pagebot(&id))?;

    let activate = options.activate || options.default;
    let record = FlowRecord {
        id,
        page_id: page_id.to_string(),
        name,
        is_active: activate,
        is_default: options.default,
        nodes,
        edges,
    };
    storage.save_flow(&record).await?;
    if activate {
        storage.activate_flow(page_id, &record.id).await?;
    }
    info!(
        page_id,
        flow_id = record.id.as_str(),
        nodes = graph.nodes().len(),
        "flow installed"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebot_test_utils::TestHarness;
    use std::io::Write;

    #[tokio::test]
    async fn template_becomes_active_default_flow() {
        let harness = TestHarness::new().await;
        harness.insert_page(&TestHarness::page("p1", "t1")).await;
        let storage = harness.storage();

        let record = install_template(
            storage.as_ref(),
            "p1",
            "welcome",
            InstallOptions {
                default: true,
                activate: false,
            },
        )
        .await
        .unwrap();

        let default = storage.find_default_flow("p1").await.unwrap().unwrap();
        assert_eq!(default.id, record.id);
        assert!(default.is_active);
    }

    #[tokio::test]
    async fn import_validates_graph() {
        let harness = TestHarness::new().await;
        harness.insert_page(&TestHarness::page("p1", "t1")).await;
        let storage = harness.storage();

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(
            bad,
            r#"{{"nodes": [{{"id": "a", "type": "message", "data": {{}}}}],
                "edges": [{{"id": "e", "source": "a", "target": "missing"}}]}}"#
        )
        .unwrap();
        let err = import_flow(storage.as_ref(), "p1", bad.path(), None, InstallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PagebotError::Flow { .. }), "got {err:?}");

        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(
            good,
            r#"{{"name": "Hello", "nodes": [
                {{"id": "t", "type": "trigger", "data": {{}}}},
                {{"id": "m", "type": "message", "data": {{"label": "Hi"}}}}
            ], "edges": [{{"id": "e", "source": "t", "target": "m"}}]}}"#
        )
        .unwrap();
        let record = import_flow(storage.as_ref(), "p1", good.path(), None, InstallOptions::default())
            .await
            .unwrap();
        assert_eq!(record.name, "Hello");
        assert!(!record.is_active);
        assert_eq!(storage.list_flows("p1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_page_or_template_is_not_found() {
        let harness = TestHarness::new().await;
        let storage = harness.storage();
        let err = install_template(storage.as_ref(), "nope", "welcome", InstallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PagebotError::NotFound { kind: "page", .. }));

        harness.insert_page(&TestHarness::page("p1", "t1")).await;
        let err = install_template(storage.as_ref(), "p1", "nope", InstallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PagebotError::NotFound { kind: "template", .. }));
    }

    #[tokio::test]
    async fn activation_switches_the_listed_active_flow() {
        let harness = TestHarness::new().await;
        harness.insert_page(&TestHarness::page("p1", "t1")).await;
        let storage = harness.storage();
        let first = install_template(storage.as_ref(), "p1", "welcome", InstallOptions::default())
            .await
            .unwrap();
        let second = install_template(
            storage.as_ref(),
            "p1",
            "support",
            InstallOptions {
                default: false,
                activate: true,
            },
        )
        .await
        .unwrap();

        activate_flow(storage.as_ref(), "p1", &first.id).await.unwrap();

        let listing = flow_listing(storage.as_ref(), "p1").await.unwrap();
        let line = |id: &str| listing.iter().find(|l| l.starts_with(id)).cloned().unwrap();
        assert!(line(&first.id).ends_with("active"));
        assert!(!line(&second.id).contains("active"));

        let err = activate_flow(storage.as_ref(), "p1", "missing").await.unwrap_err();
        assert!(matches!(err, PagebotError::NotFound { .. }), "got {err:?}");
        let err = flow_listing(storage.as_ref(), "nope").await.unwrap_err();
        assert!(matches!(err, PagebotError::NotFound { kind: "page", .. }));
    }

    #[test]
    fn listing_names_every_template() {
        let listing = template_listing();
        assert_eq!(listing.len(), templates::all().len());
        assert!(listing.iter().any(|l| l.starts_with("welcome")));
    }
}
