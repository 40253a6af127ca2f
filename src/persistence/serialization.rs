// Serializer - block graph <-> composition document (JSON)
//
// Serializing walks the graph with a unique traversal so each block is
// written once however many blocks reference it. Deserializing is
// all-or-nothing: the graph is rebuilt and validated aside and only returned
// when every reference resolves.

use crate::blocks::graph::BlockGraph;
use crate::blocks::modifiable::Modifiable;
use crate::blocks::types::{Block, BlockLinks, BlockRole};
use crate::persistence::types::*;
use crate::persistence::{PersistenceError, PersistenceResult};

pub struct Serializer;

impl Serializer {
    /// Flatten the graph into a persistable document
    pub fn to_document(graph: &BlockGraph, view: ViewState) -> CompositionDocument {
        let composition = graph
            .traverse_all()
            .into_iter()
            .filter_map(|id| graph.get(id))
            .map(block_to_record)
            .collect();

        CompositionDocument {
            version: FormatVersion::current(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            view,
            composition,
        }
    }

    /// Serialize the graph and view state to JSON
    pub fn serialize(graph: &BlockGraph, view: ViewState) -> PersistenceResult<String> {
        let document = Self::to_document(graph, view);
        check_finite(&document)?;
        serde_json::to_string(&document).map_err(|e| {
            PersistenceError::Serialization(format!("Failed to serialize composition: {}", e))
        })
    }

    /// Rebuild a save file from a document
    pub fn from_document(document: CompositionDocument) -> PersistenceResult<SaveFile> {
        if !document.version.is_compatible() {
            return Err(PersistenceError::UnsupportedVersion {
                found: document.version,
                expected: FormatVersion::current(),
            });
        }

        let blocks = document
            .composition
            .into_iter()
            .map(record_to_block)
            .collect::<PersistenceResult<Vec<_>>>()?;

        let composition = BlockGraph::from_blocks(blocks)
            .map_err(|e| PersistenceError::Deserialization(e.to_string()))?;
        composition
            .validate()
            .map_err(|e| PersistenceError::Deserialization(e.to_string()))?;

        Ok(SaveFile {
            composition,
            view: document.view,
            saved_at: Some(document.saved_at),
        })
    }

    /// Parse JSON and rebuild the save file
    pub fn deserialize(json: &str) -> PersistenceResult<SaveFile> {
        let document: CompositionDocument = serde_json::from_str(json).map_err(|e| {
            PersistenceError::Deserialization(format!("Failed to parse composition: {}", e))
        })?;
        Self::from_document(document)
    }
}

/// JSON has no NaN or infinity; serde_json would write them as null
fn check_finite(document: &CompositionDocument) -> PersistenceResult<()> {
    if !document.view.zoom_level.is_finite() || !document.view.zoom_position.is_finite() {
        return Err(PersistenceError::Serialization(
            "Non-finite view state".to_string(),
        ));
    }
    for record in &document.composition {
        if !record.position.is_finite() {
            return Err(PersistenceError::Serialization(format!(
                "Non-finite position for block {}",
                record.id
            )));
        }
        if let Some((name, _)) = record.params.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PersistenceError::Serialization(format!(
                "Non-finite {} for block {}",
                name, record.id
            )));
        }
    }
    Ok(())
}

fn block_to_record(block: &Block) -> BlockRecord {
    BlockRecord {
        id: block.id(),
        kind: block.kind(),
        position: block.position(),
        params: block.params().clone(),
        effects: block.effects().to_vec(),
        modifiers: block.modifiers().to_vec(),
        sources: block.sources().to_vec(),
        targets: block.targets().to_vec(),
    }
}

fn record_to_block(record: BlockRecord) -> PersistenceResult<Block> {
    let role = record.kind.role();
    let misplaced = match role {
        BlockRole::Source => !record.sources.is_empty() || !record.targets.is_empty(),
        BlockRole::Effect => {
            !record.effects.is_empty() || !record.modifiers.is_empty() || !record.targets.is_empty()
        }
        BlockRole::Modifier => {
            !record.effects.is_empty() || !record.modifiers.is_empty() || !record.sources.is_empty()
        }
    };
    if misplaced {
        return Err(PersistenceError::Deserialization(format!(
            "Block {} ({}) carries relations a {} cannot have",
            record.id, record.kind, role
        )));
    }

    let links = match role {
        BlockRole::Source => BlockLinks::Source {
            effects: record.effects,
            modifiable: Modifiable::settled(record.modifiers),
        },
        BlockRole::Effect => BlockLinks::Effect {
            sources: record.sources,
        },
        BlockRole::Modifier => BlockLinks::Modifier {
            targets: record.targets,
        },
    };

    Ok(Block::from_parts(
        record.id,
        record.kind,
        record.position,
        record.params,
        links,
    ))
}
