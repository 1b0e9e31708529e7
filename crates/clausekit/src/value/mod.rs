//! Runtime values of bound parameters.

#[cfg(feature = "postgres")]
mod postgres;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The resolved value of a bound parameter.
///
/// Values never take part in cache keys; they travel out-of-band and end up
/// in [`Compiled::params`](crate::compiler::Compiled::params) in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    Json(serde_json::Value),
    /// Element list of an expanding parameter (`IN (...)`).
    List(Vec<BindValue>),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }

    /// Elements of an expanding parameter; scalars expand to themselves.
    pub fn expand(&self) -> &[BindValue] {
        match self {
            BindValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Null => f.write_str("None"),
            BindValue::Bool(v) => write!(f, "{v}"),
            BindValue::Int(v) => write!(f, "{v}"),
            BindValue::Float(v) => write!(f, "{v:?}"),
            BindValue::Text(v) => write!(f, "'{v}'"),
            BindValue::Timestamp(v) => write!(f, "{v}"),
            BindValue::Uuid(v) => write!(f, "{v}"),
            BindValue::Json(v) => write!(f, "{v}"),
            BindValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! bind_value_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for BindValue {
                fn from(value: $ty) -> Self {
                    BindValue::$variant(<$conv>::from(value))
                }
            }
        )*
    };
}

bind_value_from! {
    bool => Bool as bool,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
    NaiveDateTime => Timestamp as NaiveDateTime,
    Uuid => Uuid as Uuid,
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindValue::Null, Into::into)
    }
}

impl<T: Into<BindValue>> From<Vec<T>> for BindValue {
    fn from(values: Vec<T>) -> Self {
        BindValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Ordered parameter values collected while assembling a statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParamList {
    values: Vec<BindValue>,
    names: Vec<String>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and return its 1-based position.
    pub fn push(&mut self, name: impl Into<String>, value: BindValue) -> usize {
        self.values.push(value);
        self.names.push(name.into());
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[BindValue] {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn into_parts(self) -> (Vec<BindValue>, Vec<String>) {
        (self.values, self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        assert_eq!(BindValue::from(None::<i32>), BindValue::Null);
        assert_eq!(BindValue::from(Some(3i32)), BindValue::Int(3));
    }

    #[test]
    fn scalars_expand_to_themselves() {
        let v = BindValue::from(5i64);
        assert_eq!(v.expand(), &[BindValue::Int(5)]);

        let list = BindValue::from(vec![1i32, 2, 3]);
        assert_eq!(list.expand().len(), 3);
    }

    #[test]
    fn param_list_positions_are_one_based() {
        let mut params = ParamList::new();
        assert_eq!(params.push("a", BindValue::Int(1)), 1);
        assert_eq!(params.push("b", BindValue::from("x")), 2);
        assert_eq!(params.names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn display_quotes_text() {
        assert_eq!(BindValue::from("x").to_string(), "'x'");
        assert_eq!(BindValue::from(vec![1i32, 2]).to_string(), "[1, 2]");
    }
}
