//! CLI command implementations

pub(crate) mod common;
pub(crate) mod delete;
pub(crate) mod migrate;
pub(crate) mod showmigrations;
pub(crate) mod sqlmigrate;
pub(crate) mod unapply;
