use crate::error::CatalogError;
use crate::visual::NodeMetadata;
use ahash::AHashMap;
use std::fs;
use std::path::Path;

/// Looks up the metadata of a node type.
///
/// Lookups are pure: the same type name yields the same metadata for the
/// lifetime of the catalog.
pub trait NodeMetadataCatalog: Send + Sync {
    fn get(&self, node_type: &str) -> Option<&NodeMetadata>;
}

/// A catalog held in memory, usually loaded from the backend's node-type document.
///
/// The JSON form maps type names to metadata:
///
/// ```json
/// { "constant": { "displayName": "Constant", "outputs": [{ "type": "number" }] } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: AHashMap<String, NodeMetadata>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_type: &str, metadata: NodeMetadata) {
        self.entries.insert(node_type.to_string(), metadata);
    }

    pub fn with_entry(mut self, node_type: &str, metadata: NodeMetadata) -> Self {
        self.insert(node_type, metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: AHashMap<String, NodeMetadata> =
            serde_json::from_str(json).map_err(|e| CatalogError::JsonParseError(e.to_string()))?;
        tracing::debug!(node_types = entries.len(), "loaded node metadata catalog");
        Ok(Self { entries })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}

impl NodeMetadataCatalog for MemoryCatalog {
    fn get(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::{CanvasShape, HandlePosition, IoType};

    #[test]
    fn test_from_json() {
        let catalog = MemoryCatalog::from_json(
            r#"{
                "constant": {
                    "displayName": "Constant",
                    "outputs": [{ "type": "number" }],
                    "visual": { "layout": [{ "type": "header", "title": "{{_constantValue}}" }] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        let constant = catalog.get("constant").unwrap();
        assert_eq!(constant.display_name.as_deref(), Some("Constant"));
        assert_eq!(constant.outputs[0].io_type, Some(IoType::Number));
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_bad_handle_or_shape_keeps_catalog() {
        let catalog = MemoryCatalog::from_json(
            r#"{
                "good": { "outputs": [{ "type": "number" }] },
                "odd": {
                    "inputs": [{ "type": "string" }],
                    "visual": {
                        "canvas": { "shape": "hexagon" },
                        "handles": { "inputs": [{ "index": 0, "position": "middle" }] }
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("good").is_some());

        let visual = catalog.get("odd").and_then(|m| m.visual.as_ref()).unwrap();
        assert_eq!(visual.canvas.shape, Some(CanvasShape::RoundedRect));
        let handles = visual.handles.as_ref().and_then(|h| h.inputs.as_ref()).unwrap();
        assert_eq!(handles[0].position, HandlePosition::Auto);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            MemoryCatalog::from_json("[1, 2]"),
            Err(CatalogError::JsonParseError(_))
        ));
        assert!(matches!(
            MemoryCatalog::from_file("/nonexistent/catalog.json"),
            Err(CatalogError::Io { .. })
        ));
    }
}
