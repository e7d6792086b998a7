//! Oracle. Inserts only; no CREATE TABLE.

use super::{DialectStrategy, TypeName, fixed_length, text_length};
use crate::schema::DataKind;

pub(super) const STRATEGY: DialectStrategy = DialectStrategy {
    dialect: super::Dialect::Oracle,
    name: "Oracle",
    quote_open: "\"",
    quote_close: "\"",
    parameter_prefix: ":",
    qualify_with_schema: false,
    default_values_insert: "VALUES (DEFAULT)",
    type_name,
    create_table: None,
};

const MAX_NVARCHAR2: u32 = 2000;

fn type_name(kind: DataKind, length: Option<i32>) -> Option<TypeName> {
    Some(match kind {
        DataKind::Int32 => TypeName::sized("NUMBER", 10),
        DataKind::Int64 => TypeName::sized("NUMBER", 19),
        DataKind::Text => match text_length(length)? {
            Some(n) if n <= MAX_NVARCHAR2 => TypeName::sized("NVARCHAR2", n),
            _ => TypeName::plain("NCLOB"),
        },
        DataKind::FixedText => {
            let n = fixed_length(length).filter(|n| *n <= MAX_NVARCHAR2)?;
            TypeName::sized("NCHAR", n)
        }
        DataKind::DateTime => TypeName::plain("TIMESTAMP"),
        DataKind::Boolean => TypeName::sized("NUMBER", 1),
        DataKind::Float => TypeName::plain("BINARY_DOUBLE"),
    })
}
