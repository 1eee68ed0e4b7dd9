//! JSON body binding

use super::{Bindable, Binding, Field, Shape};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Decodes JSON bodies
///
/// The body is first decoded into a generic value so that keys can be checked
/// against the destination's `Schema`: `validate` rejects a body missing a
/// required field, `disallow_unknown_fields` rejects keys the schema does not
/// declare. The checked value is then decoded into the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonBinding {
    pub disallow_unknown_fields: bool,
    pub validate: bool,
}

impl JsonBinding {
    /// Required-field validation only
    pub const fn new() -> Self {
        Self {
            disallow_unknown_fields: false,
            validate: true,
        }
    }

    /// Required-field validation plus unknown-field rejection
    pub const fn strict() -> Self {
        Self {
            disallow_unknown_fields: true,
            validate: true,
        }
    }

    fn check(&self, value: &Value, shape: Shape) -> Result<()> {
        match (shape, value) {
            (Shape::Object(fields), Value::Object(map)) => self.check_object(map, fields),
            (Shape::List(fields), Value::Array(items)) => items.iter().try_for_each(|item| match item {
                Value::Object(map) => self.check_object(map, fields),
                _ => self.check_object(&Map::new(), fields),
            }),
            (Shape::Object(fields), _) => self.check_object(&Map::new(), fields),
            (Shape::List(_) | Shape::Any, _) => Ok(()),
        }
    }

    fn check_object(&self, map: &Map<String, Value>, fields: &[Field]) -> Result<()> {
        if self.validate {
            if let Some(missing) = fields
                .iter()
                .find(|f| f.required && map.get(f.wire).map_or(true, Value::is_null))
            {
                return Err(Error::MissingField(missing.wire.to_string()));
            }
        }
        if self.disallow_unknown_fields {
            if let Some(unknown) = map.keys().find(|k| !fields.iter().any(|f| f.wire == k.as_str())) {
                return Err(Error::UnknownField(unknown.clone()));
            }
        }
        Ok(())
    }
}

impl Default for JsonBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl Binding for JsonBinding {
    fn name(&self) -> &'static str {
        "json"
    }

    fn bind<T: Bindable>(&self, body: &[u8], dest: &mut T) -> Result<()> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::EmptyBody);
        }
        let value: Value = serde_json::from_slice(body)?;
        if self.validate || self.disallow_unknown_fields {
            self.check(&value, T::shape())?;
        }
        *dest = serde_json::from_value(value)?;
        Ok(())
    }
}
