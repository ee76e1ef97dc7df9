use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    Condition, Edge, EdgeKind, FlowMetadata, FlowchartDocument, Node, NodeData, NodeKind, Position,
};

/// Why an untrusted payload could not be turned into a flowchart at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Flowchart payload is not a JSON object")]
    NotAnObject,

    #[error("Flowchart payload has no `{field}` array")]
    MissingArray { field: &'static str },

    #[error("Node #{index} is invalid: {reason}")]
    InvalidNode { index: usize, reason: &'static str },

    #[error("Edge #{index} is invalid: {reason}")]
    InvalidEdge { index: usize, reason: &'static str },
}

/// A repair or advisory finding. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeWarning {
    CoercedNodeKind {
        node_id: String,
        found: Option<String>,
    },
    DanglingEdge {
        edge_id: String,
        source: String,
        target: String,
    },
    DuplicateNodeId(String),
    MissingStart,
    MultipleStarts(usize),
    MissingEnd,
}

impl SanitizeWarning {
    /// Advisory findings describe the graph's shape; the rest record a repair.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            SanitizeWarning::MissingStart
                | SanitizeWarning::MultipleStarts(_)
                | SanitizeWarning::MissingEnd
                | SanitizeWarning::DuplicateNodeId(_)
        )
    }
}

impl fmt::Display for SanitizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanitizeWarning::CoercedNodeKind { node_id, found } => match found {
                Some(found) => write!(
                    f,
                    "Node '{}' has unknown type '{}', using 'process'",
                    node_id, found
                ),
                None => write!(f, "Node '{}' has no type, using 'process'", node_id),
            },
            SanitizeWarning::DanglingEdge {
                edge_id,
                source,
                target,
            } => write!(
                f,
                "Edge '{}' ({} -> {}) dropped: node not found",
                edge_id, source, target
            ),
            SanitizeWarning::DuplicateNodeId(id) => write!(f, "Node id '{}' is used more than once", id),
            SanitizeWarning::MissingStart => write!(f, "Flowchart has no start node"),
            SanitizeWarning::MultipleStarts(n) => write!(f, "Flowchart has {} start nodes", n),
            SanitizeWarning::MissingEnd => write!(f, "Flowchart has no end node"),
        }
    }
}

/// A repaired document plus everything that was repaired or looked off.
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub document: FlowchartDocument,
    pub warnings: Vec<SanitizeWarning>,
}

impl Sanitized {
    pub fn into_document(self) -> FlowchartDocument {
        self.document
    }
}

/// Validate and repair an untrusted flowchart payload.
///
/// Structural problems (no `nodes`/`edges` arrays, nodes without id, data or
/// numeric position, edges without id, source or target) reject the whole
/// payload. Everything else is repaired in place: unknown node types become
/// `process` and edges pointing at missing nodes are dropped. Missing start or
/// end nodes are only reported.
pub fn sanitize(raw: &Value) -> Result<Sanitized, Rejection> {
    let obj = raw.as_object().ok_or(Rejection::NotAnObject)?;
    let raw_nodes = array_field(obj, "nodes")?;
    let raw_edges = array_field(obj, "edges")?;

    let mut warnings = Vec::new();

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (index, raw_node) in raw_nodes.iter().enumerate() {
        let (node, found_kind) =
            read_node(raw_node).map_err(|reason| Rejection::InvalidNode { index, reason })?;
        if let Some(found) = found_kind {
            warnings.push(SanitizeWarning::CoercedNodeKind {
                node_id: node.id.clone(),
                found,
            });
        }
        nodes.push(node);
    }

    let mut edges = Vec::with_capacity(raw_edges.len());
    for (index, raw_edge) in raw_edges.iter().enumerate() {
        let edge = read_edge(raw_edge).map_err(|reason| Rejection::InvalidEdge { index, reason })?;
        edges.push(edge);
    }

    let mut node_ids = HashSet::new();
    for node in &nodes {
        if !node_ids.insert(node.id.as_str()) {
            warnings.push(SanitizeWarning::DuplicateNodeId(node.id.clone()));
        }
    }

    edges.retain(|edge| {
        let keep = node_ids.contains(edge.source.as_str()) && node_ids.contains(edge.target.as_str());
        if !keep {
            warnings.push(SanitizeWarning::DanglingEdge {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
        keep
    });

    let metadata = obj
        .get("metadata")
        .and_then(|m| serde_json::from_value::<FlowMetadata>(m.clone()).ok());

    let document = FlowchartDocument {
        nodes,
        edges,
        metadata,
    };

    let starts = document.start_nodes().count();
    if starts == 0 {
        warnings.push(SanitizeWarning::MissingStart);
    } else if starts > 1 {
        warnings.push(SanitizeWarning::MultipleStarts(starts));
    }
    if document.end_nodes().next().is_none() {
        warnings.push(SanitizeWarning::MissingEnd);
    }

    for warning in &warnings {
        if warning.is_advisory() {
            warn!("{}", warning);
        } else {
            debug!("{}", warning);
        }
    }

    Ok(Sanitized { document, warnings })
}

fn array_field<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Vec<Value>, Rejection> {
    obj.get(field)
        .and_then(Value::as_array)
        .ok_or(Rejection::MissingArray { field })
}

/// Returns the node and, when its type had to be coerced, what was found instead.
fn read_node(raw: &Value) -> Result<(Node, Option<Option<String>>), &'static str> {
    let obj = raw.as_object().ok_or("not an object")?;
    let id = obj.get("id").and_then(id_string).ok_or("missing id")?;
    let data = obj.get("data").filter(|d| is_present(d)).ok_or("missing data")?;
    let position = obj
        .get("position")
        .and_then(Value::as_object)
        .ok_or("missing position")?;
    let x = position
        .get("x")
        .and_then(Value::as_f64)
        .ok_or("position.x is not a number")?;
    let y = position
        .get("y")
        .and_then(Value::as_f64)
        .ok_or("position.y is not a number")?;

    let raw_kind = obj.get("type");
    let (kind, found_kind) = match raw_kind.and_then(Value::as_str).and_then(NodeKind::parse) {
        Some(kind) => (kind, None),
        None => {
            let found = raw_kind.filter(|v| !v.is_null()).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            (NodeKind::Process, Some(found))
        }
    };

    let node = Node {
        id,
        kind,
        data: read_node_data(data),
        position: Position { x, y },
    };
    Ok((node, found_kind))
}

/// Keys of `data` with a typed home in [`NodeData`].
const KNOWN_DATA_KEYS: [&str; 3] = ["label", "description", "conditions"];

/// A bare string payload is taken as the label; other non-object payloads
/// yield empty data.
fn read_node_data(data: &Value) -> NodeData {
    let data = match data {
        Value::Object(map) => map,
        Value::String(label) => {
            return NodeData {
                label: label.clone(),
                ..Default::default()
            };
        }
        _ => return NodeData::default(),
    };

    let conditions = data
        .get("conditions")
        .and_then(Value::as_array)
        .map(|raw| {
            raw.iter()
                .filter_map(|c| match serde_json::from_value::<Condition>(c.clone()) {
                    Ok(condition) => Some(condition),
                    Err(e) => {
                        debug!("Skipping malformed condition: {}", e);
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    NodeData {
        label: data.get("label").and_then(text).unwrap_or_default(),
        description: data.get("description").and_then(text),
        conditions,
        extra: data
            .iter()
            .filter(|(key, _)| !KNOWN_DATA_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

fn read_edge(raw: &Value) -> Result<Edge, &'static str> {
    let obj = raw.as_object().ok_or("not an object")?;
    let id = obj.get("id").and_then(id_string).ok_or("missing id")?;
    let source = obj.get("source").and_then(id_string).ok_or("missing source")?;
    let target = obj.get("target").and_then(id_string).ok_or("missing target")?;

    Ok(Edge {
        id,
        source,
        target,
        source_handle: obj
            .get("sourceHandle")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from),
        kind: obj
            .get("type")
            .and_then(Value::as_str)
            .and_then(EdgeKind::parse),
        label: obj.get("label").and_then(text),
        animated: obj.get("animated").and_then(Value::as_bool).unwrap_or(false),
        data: obj.get("data").and_then(Value::as_object).cloned(),
    })
}

/// `null`, `false`, `0` and `""` count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ids may arrive as strings or numbers; both normalize to a non-empty string.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
