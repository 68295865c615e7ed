//! Left operands, containers and operation descriptors.

use serde::{Deserialize, Serialize};

/// The kind of state a left operand points at. Exactly one handler is
/// registered per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperandKind {
    Data,
    TransientData,
    BusinessData,
    Document,
    DocumentList,
    SearchIndex,
}

impl OperandKind {
    /// Stable string tag, used for dispatch keys and diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            OperandKind::Data => "DATA",
            OperandKind::TransientData => "TRANSIENT_DATA",
            OperandKind::BusinessData => "BUSINESS_DATA",
            OperandKind::Document => "DOCUMENT",
            OperandKind::DocumentList => "DOCUMENT_LIST",
            OperandKind::SearchIndex => "SEARCH_INDEX",
        }
    }

    pub fn all() -> [OperandKind; 6] {
        [
            OperandKind::Data,
            OperandKind::TransientData,
            OperandKind::BusinessData,
            OperandKind::Document,
            OperandKind::DocumentList,
            OperandKind::SearchIndex,
        ]
    }
}

impl std::fmt::Display for OperandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A named, typed reference to process/activity state that an operation
/// assigns into. Created by the invoking engine per operation; handlers never
/// retain it across calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeftOperand {
    name: String,
    kind: OperandKind,
}

impl LeftOperand {
    pub fn new(name: impl Into<String>, kind: OperandKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    /// Private evaluation-context key for the backing record of this operand.
    ///
    /// Distinct from the bare variable name: the bare name holds the value the
    /// expression evaluator sees, the cache key holds whatever the handler
    /// needs to avoid a second read during `update`.
    pub fn cache_key(&self) -> String {
        let tag = self.kind.tag();
        let mut key = String::with_capacity(tag.len() + 1 + self.name.len());
        key.push_str(tag);
        key.push('\0');
        key.push_str(&self.name);
        key
    }
}

/// Scope of a variable: the process instance or flow-node instance it belongs
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    ProcessInstance,
    FlowNodeInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Container {
    pub id: i64,
    pub container_type: ContainerType,
}

impl Container {
    pub fn process_instance(id: i64) -> Self {
        Self {
            id,
            container_type: ContainerType::ProcessInstance,
        }
    }

    pub fn flow_node_instance(id: i64) -> Self {
        Self {
            id,
            container_type: ContainerType::FlowNodeInstance,
        }
    }
}

/// One assignment as handed over by the invoking engine: the target operand
/// plus the operator the strategy layer dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub left_operand: LeftOperand,
    /// Operator name; `"="` for plain assignment, a method name for
    /// method-call operations.
    pub operator: String,
    /// Declared parameter type of a method-call operator, if any.
    pub operator_input_type: Option<String>,
}

impl Operation {
    pub fn assignment(left_operand: LeftOperand) -> Self {
        Self {
            left_operand,
            operator: "=".to_string(),
            operator_input_type: None,
        }
    }

    pub fn method_call(
        left_operand: LeftOperand,
        method: impl Into<String>,
        input_type: Option<String>,
    ) -> Self {
        Self {
            left_operand,
            operator: method.into(),
            operator_input_type: input_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_distinct_from_bare_name() {
        let operand = LeftOperand::new("amount", OperandKind::Data);
        assert_ne!(operand.cache_key(), "amount");
        assert!(operand.cache_key().ends_with("amount"));
    }

    #[test]
    fn test_cache_key_distinguishes_kinds() {
        let data = LeftOperand::new("amount", OperandKind::Data);
        let transient = LeftOperand::new("amount", OperandKind::TransientData);
        assert_ne!(data.cache_key(), transient.cache_key());
    }

    #[test]
    fn test_kind_tag_roundtrip() {
        for kind in OperandKind::all() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.tag()));
            let back: OperandKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }
}
