//! Dry-run rendering of a layer document.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use jlmap_bridge::MapSession;
use jlmap_builder::layer::Layer;
use jlmap_core::config::Config;
use jlmap_core::event::SubscriptionSet;
use jlmap_transport::executor::MemoryExecutor;

/// Layers to create, in order, plus map-level subscriptions.
#[derive(Debug, Deserialize)]
pub struct RenderDocument {
    #[serde(default)]
    pub map_events: SubscriptionSet,
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LayerEntry {
    pub id: String,
    #[serde(default)]
    pub subscriptions: SubscriptionSet,
    pub layer: Layer,
}

impl RenderDocument {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        json5::from_str(text).context("invalid layer document")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text)
    }
}

/// Run the document through a session whose executor only records, and
/// return every script it would have sent.
pub async fn render(document: &RenderDocument, config: &Config) -> anyhow::Result<Vec<String>> {
    let executor = Arc::new(MemoryExecutor::new());
    let session = MapSession::from_config(executor.clone(), config)?;

    session.subscribe_map(&document.map_events).await?;
    for entry in &document.layers {
        session
            .create(&entry.id, &entry.layer, &entry.subscriptions)
            .await
            .with_context(|| format!("failed to render layer '{}'", entry.id))?;
    }
    tracing::debug!(layers = document.layers.len(), "Document rendered");
    Ok(executor.take_scripts())
}
