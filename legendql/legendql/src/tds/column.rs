use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::language::{PrecisePrimitiveType, PrimitiveType};
use crate::{Error, Result, WithErrorInfo};

/// Name and type of one column of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TdsColumn {
    name: String,
    #[serde(rename = "type")]
    ty: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    precise_type: Option<PrecisePrimitiveType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enumeration: Option<EnumType>,
}

/// Enumeration a column's values are drawn from. Enum columns behave as
/// strings in expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

impl TdsColumn {
    pub fn new<S: Into<String>>(name: S, ty: PrimitiveType) -> Self {
        TdsColumn {
            name: name.into(),
            ty,
            precise_type: None,
            enumeration: None,
        }
    }

    /// A column typed with a storage refinement; its primitive type is the
    /// refinement's base type.
    pub fn precise<S: Into<String>>(name: S, precise_type: PrecisePrimitiveType) -> Self {
        TdsColumn {
            precise_type: Some(precise_type),
            ..TdsColumn::new(name, precise_type.base_type())
        }
    }

    pub fn enumeration<S: Into<String>>(name: S, enumeration: EnumType) -> Self {
        TdsColumn {
            enumeration: Some(enumeration),
            ..TdsColumn::new(name, PrimitiveType::String)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitive_type(&self) -> PrimitiveType {
        self.ty
    }

    pub fn precise_type(&self) -> Option<PrecisePrimitiveType> {
        self.precise_type
    }

    pub fn enum_type(&self) -> Option<&EnumType> {
        self.enumeration.as_ref()
    }

    /// Same column under another name.
    pub fn renamed<S: Into<String>>(&self, name: S) -> Self {
        TdsColumn {
            name: name.into(),
            ..self.clone()
        }
    }

    fn type_name(&self) -> String {
        match (&self.enumeration, &self.precise_type) {
            (Some(e), _) => e.name.clone(),
            (None, Some(p)) => p.to_string(),
            (None, None) => self.ty.to_string(),
        }
    }
}

impl fmt::Display for TdsColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TdsColumn(Name: {}, Type: {})", self.name, self.type_name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(one) => vec![one],
            OneOrMany::Many(many) => many,
        }
    }
}

#[derive(Deserialize)]
struct SchemaDocument {
    columns: OneOrMany<ColumnDocument>,
    #[serde(default)]
    enums: OneOrMany<EnumDocument>,
}

#[derive(Deserialize)]
struct ColumnDocument {
    #[serde(rename = "_type", default)]
    kind: Option<String>,
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Deserialize)]
struct EnumDocument {
    #[serde(rename = "type")]
    ty: String,
    values: OneOrMany<String>,
}

/// Parses the columns of a schema document:
///
/// ```json
/// {"columns": [{"_type": "primitiveSchemaColumn", "name": "a", "type": "Integer"}], "enums": []}
/// ```
///
/// A single object is accepted wherever a list is expected. Columns whose
/// `_type` is not `primitiveSchemaColumn` are enum columns and take their
/// values from the matching entry of `enums`.
pub fn tds_columns_from_json(s: &str) -> Result<Vec<TdsColumn>> {
    let unparsable = || format!("Unable to parse tds columns from schema: \n{s}");

    let document: SchemaDocument = serde_json::from_str(s)
        .map_err(|e| Error::validation(unparsable()).push_hint(e.to_string()))?;
    let enums = document.enums.into_vec();

    document
        .columns
        .into_vec()
        .into_iter()
        .map(|column| {
            let is_primitive = column
                .kind
                .as_deref()
                .map_or(true, |k| k == "primitiveSchemaColumn");
            if is_primitive {
                column_of_type(column.name, &column.ty)
            } else {
                let values = enums
                    .iter()
                    .find(|e| e.ty == column.ty)
                    .map(|e| match &e.values {
                        OneOrMany::One(v) => vec![v.clone()],
                        OneOrMany::Many(vs) => vs.clone(),
                    })
                    .ok_or_else(|| Error::validation(format!("Unknown enum type: {}", column.ty)))?;
                Ok(TdsColumn::enumeration(
                    column.name,
                    EnumType {
                        name: column.ty,
                        values,
                    },
                ))
            }
        })
        .collect::<Result<Vec<_>>>()
        .push_hint(unparsable())
}

fn column_of_type(name: String, ty: &str) -> Result<TdsColumn> {
    if let Ok(primitive) = ty.parse::<PrimitiveType>() {
        return Ok(TdsColumn::new(name, primitive));
    }
    PrecisePrimitiveType::parse(ty)
        .map(|precise| TdsColumn::precise(name, precise))
        .map_err(|_| Error::validation(format!("Unknown column type - {ty}")))
}
