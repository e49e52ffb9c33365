//! Newtype names for types, strategy classes, and fields.
//!
//! Metadata refers to everything by name: a domain type names the message
//! types it binds to, and each binding names the strategy classes that govern
//! it. Wrapping each kind of name in its own newtype prevents handing a
//! [`ClassName`] to a lookup that expects a [`TypeName`] even though both are
//! strings under the hood.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display,
// TryFrom<String> (used by serde to reject empty names).
// ---------------------------------------------------------------------------
macro_rules! string_name {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new name, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| {
                    format!("{} must not be empty", stringify!($name))
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_name! {
    /// Names a domain type or a message type (e.g. `"Order"`, `"OrderMsg"`).
    ///
    /// Assignability between type names is answered by
    /// [`crate::TypeHierarchy`].
    TypeName
}

string_name! {
    /// Designates a strategy class registered in a [`crate::ClassTable`].
    ///
    /// The name is also what failure messages report, so it should read like
    /// the simple name of the implementing type (e.g. `"CurrencyConverter"`).
    ClassName
}

impl ClassName {
    /// Wraps a compile-time constant that is known to be non-empty.
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(!value.is_empty());
        Self(value.to_owned())
    }
}

string_name! {
    /// Names a field declared on a domain type.
    FieldName
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_are_rejected() {
        assert!(TypeName::new("").is_none());
        assert!(ClassName::new("").is_none());
        assert_eq!(FieldName::new("total").unwrap().as_str(), "total");
    }

    #[test]
    fn deserialising_an_empty_name_fails() {
        let err = serde_json::from_str::<ClassName>("\"\"").unwrap_err();
        assert!(err.to_string().contains("ClassName must not be empty"));

        let name: TypeName = serde_json::from_str("\"OrderMsg\"").unwrap();
        assert_eq!(name.to_string(), "OrderMsg");
    }
}
