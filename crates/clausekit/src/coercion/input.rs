//! Caller-supplied values handed to the coercion engine.

use crate::node::{Lambda, NodeRef};
use crate::value::BindValue;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// External values that stand for a clause element.
///
/// `clause_element` may hand back another external value; the engine follows
/// such chains a bounded number of times.
pub trait AsClauseElement: Send + Sync {
    fn clause_element(&self) -> Input;

    fn repr(&self) -> String {
        format!("<{} object>", std::any::type_name::<Self>())
    }
}

/// External handles (mapped entities, attribute handles) that can be
/// inspected for an underlying clause element.
pub trait Inspectable: Send + Sync {
    /// `None` when the value is not inspectable at all.
    fn inspect(&self) -> Option<Inspection>;

    fn repr(&self) -> String {
        format!("<{} object>", std::any::type_name::<Self>())
    }
}

/// Result of inspecting an external handle.
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    element: Option<NodeRef>,
}

impl Inspection {
    pub fn new(element: NodeRef) -> Self {
        Self {
            element: Some(element),
        }
    }

    /// An inspection that exposes no clause element.
    pub fn opaque() -> Self {
        Self::default()
    }

    pub fn clause_element(&self) -> Option<&NodeRef> {
        self.element.as_ref()
    }
}

/// An arbitrary value offered to a consumption site.
#[derive(Clone)]
pub enum Input {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    List(Vec<Input>),
    /// String-keyed mapping, in insertion order.
    Map(Vec<(String, Input)>),
    Node(NodeRef),
    Lambda(Lambda),
    Element(Arc<dyn AsClauseElement>),
    Mapped(Arc<dyn Inspectable>),
}

impl Input {
    pub fn element(value: impl AsClauseElement + 'static) -> Self {
        Input::Element(Arc::new(value))
    }

    pub fn mapped(value: impl Inspectable + 'static) -> Self {
        Input::Mapped(Arc::new(value))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Input::None)
    }

    /// Plain data, as opposed to nodes, deferred expressions and external handles.
    pub fn is_literal(&self) -> bool {
        !matches!(
            self,
            Input::Node(_) | Input::Lambda(_) | Input::Element(_) | Input::Mapped(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Input::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Input::Node(n) => Some(n),
            _ => None,
        }
    }

    /// The value a bound parameter built from this input would carry.
    pub fn to_bind_value(&self) -> Option<BindValue> {
        Some(match self {
            Input::None => BindValue::Null,
            Input::Bool(v) => BindValue::Bool(*v),
            Input::Int(v) => BindValue::Int(*v),
            Input::Float(v) => BindValue::Float(*v),
            Input::Str(v) => BindValue::Text(v.clone()),
            Input::Timestamp(v) => BindValue::Timestamp(*v),
            Input::Uuid(v) => BindValue::Uuid(*v),
            Input::List(items) => BindValue::List(
                items
                    .iter()
                    .map(Input::to_bind_value)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Input::Map(_) => BindValue::Json(self.to_json()?),
            Input::Node(_) | Input::Lambda(_) | Input::Element(_) | Input::Mapped(_) => {
                return None;
            }
        })
    }

    fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value;
        Some(match self {
            Input::None => Value::Null,
            Input::Bool(v) => Value::Bool(*v),
            Input::Int(v) => Value::from(*v),
            Input::Float(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Input::Str(v) => Value::String(v.clone()),
            Input::Timestamp(v) => Value::String(v.to_string()),
            Input::Uuid(v) => Value::String(v.to_string()),
            Input::List(items) => Value::Array(
                items
                    .iter()
                    .map(Input::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Input::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| Some((k.clone(), v.to_json()?)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            _ => return None,
        })
    }

    /// Representation used in error messages.
    pub fn repr(&self) -> String {
        match self {
            Input::None => "None".to_string(),
            Input::Bool(v) => v.to_string(),
            Input::Int(v) => v.to_string(),
            Input::Float(v) => format!("{v:?}"),
            Input::Str(v) => format!("'{}'", v.replace('\'', "\\'")),
            Input::Timestamp(v) => format!("datetime('{v}')"),
            Input::Uuid(v) => format!("UUID('{v}')"),
            Input::List(items) => {
                let inner: Vec<String> = items.iter().map(Input::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Input::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("'{k}': {}", v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Input::Node(n) => n.repr(),
            Input::Lambda(_) => "<lambda>".to_string(),
            Input::Element(e) => e.repr(),
            Input::Mapped(m) => m.repr(),
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

macro_rules! input_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Input {
                fn from(value: $ty) -> Self {
                    Input::$variant(<$conv>::from(value))
                }
            }
        )*
    };
}

input_from! {
    bool => Bool as bool,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Str as String,
    &str => Str as String,
    NaiveDateTime => Timestamp as NaiveDateTime,
    Uuid => Uuid as Uuid,
}

impl From<()> for Input {
    fn from(_: ()) -> Self {
        Input::None
    }
}

impl From<NodeRef> for Input {
    fn from(node: NodeRef) -> Self {
        Input::Node(node)
    }
}

impl From<&NodeRef> for Input {
    fn from(node: &NodeRef) -> Self {
        Input::Node(Arc::clone(node))
    }
}

impl From<Lambda> for Input {
    fn from(lambda: Lambda) -> Self {
        Input::Lambda(lambda)
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(value: Option<T>) -> Self {
        value.map_or(Input::None, Into::into)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(values: Vec<T>) -> Self {
        Input::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Input>, const N: usize> From<[T; N]> for Input {
    fn from(values: [T; N]) -> Self {
        Input::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Input>> From<BTreeMap<String, T>> for Input {
    fn from(map: BTreeMap<String, T>) -> Self {
        Input::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Input>> From<HashMap<String, T>> for Input {
    fn from(map: HashMap<String, T>) -> Self {
        // Sorted so the representation and any JSON payload are deterministic.
        let mut entries: Vec<(String, Input)> =
            map.into_iter().map(|(k, v)| (k, v.into())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Input::Map(entries)
    }
}

impl From<BindValue> for Input {
    fn from(value: BindValue) -> Self {
        match value {
            BindValue::Null => Input::None,
            BindValue::Bool(v) => Input::Bool(v),
            BindValue::Int(v) => Input::Int(v),
            BindValue::Float(v) => Input::Float(v),
            BindValue::Text(v) => Input::Str(v),
            BindValue::Timestamp(v) => Input::Timestamp(v),
            BindValue::Uuid(v) => Input::Uuid(v),
            BindValue::Json(v) => Input::from(v),
            BindValue::List(items) => Input::List(items.into_iter().map(Input::from).collect()),
        }
    }
}

impl From<serde_json::Value> for Input {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Input::None,
            Value::Bool(v) => Input::Bool(v),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Input::Int(i),
                None => n.as_f64().map_or(Input::None, Input::Float),
            },
            Value::String(s) => Input::Str(s),
            Value::Array(items) => Input::List(items.into_iter().map(Input::from).collect()),
            Value::Object(map) => {
                Input::Map(map.into_iter().map(|(k, v)| (k, Input::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_repr_names_keys_and_values() {
        let input = Input::from(serde_json::json!({"a": 1, "b": "x"}));
        assert_eq!(input.repr(), "{'a': 1, 'b': 'x'}");
    }

    #[test]
    fn maps_bind_as_json() {
        let input = Input::from(serde_json::json!({"a": [1, 2]}));
        assert_eq!(
            input.to_bind_value(),
            Some(BindValue::Json(serde_json::json!({"a": [1, 2]})))
        );
    }

    #[test]
    fn nodes_have_no_bind_value() {
        let input = Input::from(crate::node::column("x"));
        assert!(!input.is_literal());
        assert_eq!(input.to_bind_value(), None);
    }
}
