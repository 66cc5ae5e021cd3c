//! Error types for hardness-core

use thiserror::Error;

use crate::node::NodeKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed complexity {text:?}: {reason}")]
    MalformedComplexity { text: String, reason: String },

    #[error("Unresolved {kind} reference from {from_id:?} to {target_id:?}")]
    UnresolvedReference {
        kind: NodeKind,
        from_id: String,
        target_id: String,
    },

    #[error("No known {} attack on {node:?}", threat_model(.quantum))]
    NoKnownAttack { node: String, quantum: bool },

    #[error("Invalid {kind} record {id:?}: {reason}")]
    InvalidRecord {
        kind: NodeKind,
        id: String,
        reason: String,
    },

    #[error("Duplicate {kind} id: {id:?}")]
    DuplicateId { kind: NodeKind, id: String },

    #[error("Unknown {kind}: {id:?}")]
    UnknownNode { kind: NodeKind, id: String },
}

fn threat_model(quantum: &bool) -> &'static str {
    if *quantum {
        "quantum"
    } else {
        "classical"
    }
}

impl Error {
    pub(crate) fn malformed(text: &str, reason: impl Into<String>) -> Self {
        Error::MalformedComplexity {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}
