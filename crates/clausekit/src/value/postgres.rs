//! Hand-off of bind values to tokio-postgres.

use super::BindValue;
use crate::compiler::Compiled;
use bytes::BytesMut;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

impl ToSql for BindValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        // Delegate through `to_sql_checked` so a mismatched column type is
        // reported by the concrete Rust type rather than silently encoded.
        match self {
            BindValue::Null => Ok(IsNull::Yes),
            BindValue::Bool(v) => v.to_sql_checked(ty, out),
            BindValue::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            BindValue::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            BindValue::Text(v) => v.to_sql_checked(ty, out),
            BindValue::Timestamp(v) => v.to_sql_checked(ty, out),
            BindValue::Uuid(v) => v.to_sql_checked(ty, out),
            BindValue::Json(v) => v.to_sql_checked(ty, out),
            BindValue::List(_) => Err(format!(
                "expanding parameter list cannot be bound as a single {ty} value"
            )
            .into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl Compiled {
    /// Parameters as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }
}
