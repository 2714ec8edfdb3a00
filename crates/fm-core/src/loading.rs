//! Migration file discovery

use crate::catalog::builtin_migrations;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::record::SchemaChangeRecord;
use std::path::{Path, PathBuf};

/// Recursively load every `.yml`/`.yaml` record under `dir`.
///
/// Entries are visited in file-name order. Unreadable files are skipped with a
/// warning; files that fail to parse are errors.
fn discover_recursive(dir: &Path, records: &mut Vec<SchemaChangeRecord>) -> CoreResult<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            discover_recursive(&path, records)?;
            continue;
        }
        if !path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                continue;
            }
        };
        let record =
            SchemaChangeRecord::from_yaml(&content).map_err(|e| CoreError::MigrationParseError {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;
        log::debug!("Loaded migration {}.{} from {}", record.app, record.name, path.display());
        records.push(record);
    }
    Ok(())
}

/// Load records from each directory in `dirs`. Missing directories are skipped.
pub fn discover_migrations(dirs: &[PathBuf]) -> CoreResult<Vec<SchemaChangeRecord>> {
    let mut records = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            log::debug!("Migration directory {} does not exist, skipping", dir.display());
            continue;
        }
        discover_recursive(dir, &mut records)?;
    }
    Ok(records)
}

/// Assemble the full catalog for a project: built-ins (when enabled) followed
/// by records discovered under the configured migration paths.
pub fn load_catalog(config: &Config, root: &Path) -> CoreResult<Vec<SchemaChangeRecord>> {
    let mut records = if config.builtin_migrations {
        builtin_migrations()?
    } else {
        Vec::new()
    };
    records.extend(discover_migrations(&config.migration_dirs(root))?);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PARENTS: &str = r#"
app: main
name: 0008_auto_20180117_0003
operations:
  - op: create_table
    name: Batch
    fields:
      - name: id
        type: auto
"#;

    #[test]
    fn discovers_nested_yaml_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("main");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("0008.yml"), PARENTS).unwrap();
        std::fs::write(nested.join("README.txt"), "not a migration").unwrap();

        let records = discover_migrations(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "0008_auto_20180117_0003");
    }

    #[test]
    fn missing_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        let records = discover_migrations(&[dir.path().join("nope")]).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "app: main\nname: 0001\n").unwrap();
        let err = discover_migrations(&[dir.path().to_path_buf()]).unwrap_err();
        match err {
            CoreError::MigrationParseError { path, .. } => assert!(path.ends_with("bad.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_catalog_merges_builtins_and_files() {
        let dir = TempDir::new().unwrap();
        let migrations = dir.path().join("migrations");
        std::fs::create_dir_all(&migrations).unwrap();
        std::fs::write(migrations.join("0008.yml"), PARENTS).unwrap();

        let config: Config = serde_yaml::from_str("name: fuzzermon").unwrap();
        let records = load_catalog(&config, dir.path()).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["0009_testsignalerror", "0008_auto_20180117_0003"]);

        let config: Config =
            serde_yaml::from_str("name: fuzzermon\nbuiltin_migrations: false").unwrap();
        assert_eq!(load_catalog(&config, dir.path()).unwrap().len(), 1);
    }
}
