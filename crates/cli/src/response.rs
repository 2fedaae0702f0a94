use anyhow::Result;
use cljscope_graph::GraphError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Names that do exist, when a lookup by name failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    NotFound,
    Error,
}

impl CommandResponse {
    pub fn ok(data: impl Serialize) -> Result<Self> {
        Ok(Self {
            status: CommandStatus::Ok,
            message: None,
            available: Vec::new(),
            data: serde_json::to_value(data)?,
        })
    }

    pub fn not_found(message: impl Into<String>, available: Vec<String>) -> Self {
        Self {
            status: CommandStatus::NotFound,
            message: Some(message.into()),
            available,
            data: Value::Null,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: Some(message.into()),
            available: Vec::new(),
            data: Value::Null,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, CommandStatus::Ok)
    }

    /// Not-found lookups keep their list of known names; anything else is an error
    pub fn from_graph_error(err: &GraphError) -> Self {
        if err.is_not_found() {
            Self::not_found(err.to_string(), err.available().to_vec())
        } else {
            Self::error(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ok_envelope() {
        let response = CommandResponse::ok(vec!["a", "b"]).unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "ok", "data": ["a", "b"]})
        );
    }

    #[test]
    fn test_not_found_envelope() {
        let err = GraphError::NamespaceNotFound {
            name: "x".to_string(),
            available: vec!["a".to_string()],
        };
        let response = CommandResponse::from_graph_error(&err);
        assert!(!response.is_ok());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "not_found", "message": "Namespace \"x\" not found", "available": ["a"]})
        );
    }
}
