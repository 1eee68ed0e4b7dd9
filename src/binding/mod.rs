//! Request body binding
//!
//! A `Binding` decodes a request body into a destination value. Required-field
//! checks rely on an explicit `Schema` per destination type: a list of wire
//! names with a required flag, written by hand or with [`schema!`](crate::schema).

mod json;
mod xml;

pub use json::JsonBinding;
pub use xml::XmlBinding;

use crate::error::Result;
use serde::de::DeserializeOwned;

/// One declared field of a destination type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name of the field on the wire
    pub wire: &'static str,
    /// Absence (or null) of the field fails binding
    pub required: bool,
}

/// Structure a destination type expects on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// An object with the given fields
    Object(&'static [Field]),
    /// A list of objects, each with the given fields
    List(&'static [Field]),
    /// No field-level checks
    Any,
}

/// Field description of a bindable type
pub trait Schema {
    fn shape() -> Shape;
}

impl<T: Schema> Schema for Vec<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Object(fields) => Shape::List(fields),
            Shape::List(_) | Shape::Any => Shape::Any,
        }
    }
}

impl Schema for serde_json::Value {
    fn shape() -> Shape {
        Shape::Any
    }
}

/// Types a `Binding` can decode into
pub trait Bindable: DeserializeOwned + Schema {}

impl<T: DeserializeOwned + Schema> Bindable for T {}

/// A body decoding strategy
pub trait Binding {
    fn name(&self) -> &'static str;

    fn bind<T: Bindable>(&self, body: &[u8], dest: &mut T) -> Result<()>;
}

/// Implement [`Schema`](crate::binding::Schema) for a struct from its wire names
///
/// ```
/// #[derive(serde::Deserialize)]
/// struct Login {
///     user: String,
///     #[serde(default)]
///     remember: bool,
/// }
///
/// sonata::schema!(Login { "user": required, "remember" });
/// ```
#[macro_export]
macro_rules! schema {
    (@required required) => {
        true
    };
    (@required) => {
        false
    };
    ($ty:ty { $($wire:literal $(: $flag:ident)?),* $(,)? }) => {
        impl $crate::binding::Schema for $ty {
            fn shape() -> $crate::binding::Shape {
                const FIELDS: &[$crate::binding::Field] = &[
                    $($crate::binding::Field {
                        wire: $wire,
                        required: $crate::schema!(@required $($flag)?),
                    }),*
                ];
                $crate::binding::Shape::Object(FIELDS)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Item {
        #[allow(dead_code)]
        id: u32,
    }

    crate::schema!(Item { "id": required, "note" });

    #[test]
    fn test_macro_shape() {
        let Shape::Object(fields) = Item::shape() else {
            panic!("expected object shape");
        };
        assert_eq!(
            fields,
            &[
                Field { wire: "id", required: true },
                Field { wire: "note", required: false },
            ]
        );
    }

    #[test]
    fn test_vec_shape() {
        assert!(matches!(Vec::<Item>::shape(), Shape::List(f) if f.len() == 2));
        assert_eq!(Vec::<Vec<Item>>::shape(), Shape::Any);
    }
}
