//! Strongly-typed table and field names.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Name of a database table as declared by a migration (e.g. `TestSignalError`).
    pub struct TableName("table name");
}

define_newtype_string! {
    /// Name of a field on a table definition (e.g. `batch`).
    ///
    /// Differs from the stored column name for foreign keys; see
    /// [`FieldDef::column`](crate::schema::FieldDef::column).
    pub struct FieldName("field name");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_empty() {
        assert!(TableName::try_new("").is_none());
        assert_eq!(TableName::try_new("Batch").unwrap(), "Batch");
    }

    #[test]
    fn deserialize_rejects_empty() {
        let err = serde_yaml::from_str::<FieldName>("''").unwrap_err();
        assert!(err.to_string().contains("field name must not be empty"));
    }
}
