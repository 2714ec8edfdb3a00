//! Unique identifier of a schema change record.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `(app, name)` pair identifying one record, written as `app.name`.
///
/// Ordering is lexicographic on `app` then `name`, which the dependency graph
/// uses as its tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationKey {
    app: String,
    name: String,
}

impl MigrationKey {
    /// Build a key from its parts, rejecting empty components.
    pub fn try_new(app: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let app = app.into();
        let name = name.into();
        if app.is_empty() || name.is_empty() || app.contains('.') {
            return Err(CoreError::InvalidKey {
                value: format!("{app}.{name}"),
            });
        }
        Ok(Self { app, name })
    }

    /// Owning application label (`main`).
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Record name within the app (`0009_testsignalerror`).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.name)
    }
}

impl FromStr for MigrationKey {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.split_once('.') {
            Some((app, name)) => Self::try_new(app, name),
            None => Err(CoreError::InvalidKey {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for MigrationKey {
    type Error = CoreError;

    fn try_from(s: String) -> CoreResult<Self> {
        s.parse()
    }
}

impl From<MigrationKey> for String {
    fn from(key: MigrationKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_app_and_name() {
        let key: MigrationKey = "main.0008_auto_20180117_0003".parse().unwrap();
        assert_eq!(key.app(), "main");
        assert_eq!(key.name(), "0008_auto_20180117_0003");
        assert_eq!(key.to_string(), "main.0008_auto_20180117_0003");
    }

    #[test]
    fn rejects_missing_dot_and_empty_parts() {
        assert!("0009_testsignalerror".parse::<MigrationKey>().is_err());
        assert!(".0009".parse::<MigrationKey>().is_err());
        assert!("main.".parse::<MigrationKey>().is_err());
    }

    #[test]
    fn orders_by_app_then_name() {
        let a: MigrationKey = "main.0008_a".parse().unwrap();
        let b: MigrationKey = "main.0009_b".parse().unwrap();
        let c: MigrationKey = "aux.0010_c".parse().unwrap();
        let mut keys = vec![b.clone(), a.clone(), c.clone()];
        keys.sort();
        assert_eq!(keys, vec![c, a, b]);
    }

    #[test]
    fn yaml_round_trip_uses_text_form() {
        let key: MigrationKey = serde_yaml::from_str("main.0009_testsignalerror").unwrap();
        assert_eq!(key.name(), "0009_testsignalerror");
        let out = serde_yaml::to_string(&key).unwrap();
        assert_eq!(out.trim(), "main.0009_testsignalerror");
    }
}
