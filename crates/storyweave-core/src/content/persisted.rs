//! Persisted (JSON) form of scenario nodes.
//!
//! The authoring tool stores a scenario as a flat array of node objects:
//!
//! ```json
//! {
//!   "type": {
//!     "library": "H5P.BranchingQuestion 1.0",
//!     "params": { "alternatives": [ { "text": "Yes", "nextContentId": 2 } ] },
//!     "subContentId": "5a7e0d4e-..."
//!   },
//!   "contentTitle": "Question",
//!   "showContentTitle": false,
//!   "nextContentId": 1
//! }
//! ```
//!
//! Branching questions keep their links inside `type.params.alternatives`;
//! on load they are lifted into [`NodeKind::Branching`] and written back on
//! save.

use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::{Alternative, ContentType, Link, Node, NodeKind};

const ALTERNATIVES_KEY: &str = "alternatives";
const NEXT_CONTENT_ID_KEY: &str = "nextContentId";

/// Errors raised while reading persisted content.
#[derive(Debug, Error, PartialEq)]
pub enum ContentError {
    #[error("alternatives of `{library}` must be a list")]
    InvalidAlternatives { library: String },

    #[error("alternative {index} of `{library}` must be an object")]
    InvalidAlternative { library: String, index: usize },

    #[error("invalid nextContentId `{value}`")]
    InvalidLink { value: Value },

    #[error("params of `{library}` must be an object")]
    InvalidParams { library: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawContentType {
    library: String,
    #[serde(default)]
    params: Value,
    #[serde(default = "Uuid::new_v4")]
    sub_content_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawNode {
    #[serde(rename = "type")]
    content_type: RawContentType,
    #[serde(default)]
    content_title: String,
    #[serde(default)]
    show_content_title: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_content_id: Option<i64>,
}

impl TryFrom<RawNode> for Node {
    type Error = ContentError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let content_type = ContentType {
            library: raw.content_type.library,
            params: raw.content_type.params,
            sub_content_id: raw.content_type.sub_content_id,
        };
        let (content_type, kind) = split_kind(content_type, None)?;
        let kind = match kind {
            NodeKind::Plain { .. } => NodeKind::Plain {
                next: Link::from_raw(raw.next_content_id),
            },
            branching => branching,
        };

        Ok(Node {
            content_type,
            title: raw.content_title,
            show_title: raw.show_content_title,
            kind,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let ContentType {
            library,
            mut params,
            sub_content_id,
        } = node.content_type;

        let next_content_id = match node.kind {
            NodeKind::Plain { next } => next.to_raw(),
            NodeKind::Branching { alternatives } => {
                if params.is_null() {
                    params = Value::Object(Map::new());
                }
                if let Value::Object(map) = &mut params {
                    let alternatives = alternatives.into_iter().map(alternative_to_value).collect();
                    map.insert(ALTERNATIVES_KEY.to_string(), Value::Array(alternatives));
                }
                None
            }
        };

        RawNode {
            content_type: RawContentType {
                library,
                params,
                sub_content_id,
            },
            content_title: node.title,
            show_content_title: node.show_title,
            next_content_id,
        }
    }
}

fn alternative_to_value(alternative: Alternative) -> Value {
    let mut map = alternative.data;
    if let Some(raw) = alternative.next.to_raw() {
        map.insert(NEXT_CONTENT_ID_KEY.to_string(), Value::from(raw));
    }
    Value::Object(map)
}

fn link_from_value(value: Value) -> Result<Link, ContentError> {
    match value {
        Value::Null => Ok(Link::None),
        Value::Number(number) => match number.as_i64() {
            Some(raw) => Ok(Link::from_raw(Some(raw))),
            None => Err(ContentError::InvalidLink {
                value: Value::Number(number),
            }),
        },
        value => Err(ContentError::InvalidLink { value }),
    }
}

/// Separates structural data from the parameters of a content type.
///
/// For branching questions the `alternatives` list is removed from the
/// parameters and turned into [`Alternative`]s. An alternative without an
/// explicit `nextContentId` inherits the link at the same position in
/// `previous`, if any.
pub(super) fn split_kind(
    mut content_type: ContentType,
    previous: Option<&NodeKind>,
) -> Result<(ContentType, NodeKind), ContentError> {
    if !content_type.is_branching() {
        return Ok((content_type, NodeKind::Plain { next: Link::None }));
    }

    let library = content_type.library.clone();
    let raw_alternatives = match &mut content_type.params {
        Value::Null => None,
        Value::Object(map) => map.remove(ALTERNATIVES_KEY),
        _ => return Err(ContentError::InvalidParams { library }),
    };

    let previous_links: Vec<Link> = match previous {
        Some(NodeKind::Branching { alternatives }) => {
            alternatives.iter().map(Alternative::next).collect()
        }
        _ => Vec::new(),
    };

    let alternatives = match raw_alternatives {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let Value::Object(mut data) = item else {
                    return Err(ContentError::InvalidAlternative {
                        library: library.clone(),
                        index,
                    });
                };
                let next = match data.remove(NEXT_CONTENT_ID_KEY) {
                    Some(value) => link_from_value(value)?,
                    None => previous_links.get(index).copied().unwrap_or_default(),
                };
                Ok(Alternative { next, data })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(ContentError::InvalidAlternatives { library }),
    };

    trace!(library, alternatives_len = alternatives.len(); "Split branching alternatives");

    Ok((content_type, NodeKind::Branching { alternatives }))
}
