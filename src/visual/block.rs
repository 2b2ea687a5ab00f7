use crate::condition::evaluate_condition;
use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One renderable unit of a node body.
///
/// The `type` tag selects a renderer from the block registry; the remaining
/// keys form the prop bag that the renderer's prop resolver interprets.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<Condition>,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Block {
    pub fn new(block_type: &str, props: Value) -> Self {
        let props = match props {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            block_type: block_type.to_string(),
            visible: None,
            props,
        }
    }

    pub fn with_visible(mut self, expression: &str) -> Self {
        self.visible = Some(Condition::Expression(expression.to_string()));
        self
    }

    /// Blocks without a `visible` condition are always shown.
    pub fn is_visible(&self, scope: &Scope) -> bool {
        self.visible
            .as_ref()
            .is_none_or(|condition| condition.evaluate(scope))
    }
}

/// A `visible` entry: a literal flag or a condition expression.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Condition {
    Literal(bool),
    Expression(String),
}

impl Condition {
    pub fn evaluate(&self, scope: &Scope) -> bool {
        match self {
            Condition::Literal(flag) => *flag,
            Condition::Expression(expression) => evaluate_condition(expression, scope),
        }
    }
}
