//! Generator for the identifier types used in table definitions.
//!
//! `TableName` and `FieldName` both wrap a non-empty `String` and read like a
//! `&str` everywhere a table or column name is expected (DDL rendering,
//! case-insensitive lookups in `ProjectState`).

/// Declare a non-empty name type.
///
/// The `label` is the phrase used in panics and YAML errors, e.g. an empty
/// `name:` under `create_table` reports "table name must not be empty".
macro_rules! define_newtype_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident($label:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            /// Wrap `name`. Panics when it is empty; use in code and tests
            /// where the value is a literal.
            pub fn new(name: impl Into<String>) -> Self {
                match Self::try_new(name) {
                    Some(n) => n,
                    None => panic!(concat!($label, " must not be empty")),
                }
            }

            /// Wrap `name`, or `None` when it is empty.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let name = name.into();
                (!name.is_empty()).then_some(Self(name))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                Self::try_new(String::deserialize(d)?)
                    .ok_or_else(|| serde::de::Error::custom(concat!($label, " must not be empty")))
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        // Lets names go straight into `quote_ident`, `to_lowercase` and
        // `BTreeMap<String, _>` lookups keyed by `&str`.
        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

pub(crate) use define_newtype_string;
