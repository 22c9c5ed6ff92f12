//! The config store: writes compiled documents to disk.
//!
//! Persisting is idempotent. Re-persisting a document whose content is
//! already on disk performs no write; different content is a
//! [`StoreError::ConfigConflict`] unless overwriting was requested.
//!
//! Files are written atomically: temp + fsync + rename.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::CompiledDocument;
use crate::error::StoreError;
use crate::uri::Uri;

/// Controls how [`persist`] treats existing content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOptions {
    /// Replace different content instead of failing.
    pub overwrite: bool,
}

impl PersistOptions {
    /// Options that replace existing content.
    #[must_use]
    pub fn overwrite() -> Self {
        Self { overwrite: true }
    }
}

/// What [`persist`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// Nothing was at the path; the document was written.
    Created,
    /// Identical content was already at the path; nothing was written.
    Unchanged,
    /// Existing content was replaced.
    Overwritten,
}

/// The on-disk location of the configuration of the unit at `uri`: its path
/// segments joined under `root`. A link's host is ignored.
#[must_use]
pub fn config_path(root: &Path, uri: &Uri) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in uri.segments() {
        path.push(segment.as_str());
    }
    path
}

/// Persists `document` at `path`, creating parent directories as needed.
///
/// Without `options.overwrite`, content already at `path` is compared
/// structurally and an equal document is left untouched. With it, the
/// document is always written.
///
/// # Errors
///
/// - [`StoreError::ConfigConflict`] if different content (or invalid JSON)
///   is at `path` and `options.overwrite` is false.
/// - [`StoreError::Io`] if reading, writing or renaming fails.
/// - [`StoreError::Encode`] if the document cannot be rendered.
pub fn persist(
    document: &CompiledDocument,
    path: &Path,
    options: PersistOptions,
) -> Result<Persisted, StoreError> {
    let config = document.to_json();

    let replacing = match fs::read(path) {
        Ok(_) if options.overwrite => true,
        Ok(prior) => {
            match serde_json::from_slice::<Value>(&prior) {
                Ok(prior) if prior == config => {
                    debug!(path = %path.display(), "configuration unchanged");
                    return Ok(Persisted::Unchanged);
                }
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "invalid JSON in existing configuration"),
            }

            return Err(StoreError::ConfigConflict {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(StoreError::io(path, e)),
    };

    write_atomic(path, &render(&config)?)?;

    if replacing {
        info!(path = %path.display(), unit = %document.uri(), "overwrote configuration");
        Ok(Persisted::Overwritten)
    } else {
        info!(path = %path.display(), unit = %document.uri(), "wrote configuration");
        Ok(Persisted::Created)
    }
}

/// Persists each document at [`config_path`] under `root`, stopping at the first error.
///
/// # Errors
///
/// Returns the first [`StoreError`] encountered; documents before it stay written.
pub fn persist_all<'a, I>(
    documents: I,
    root: &Path,
    options: PersistOptions,
) -> Result<Vec<(PathBuf, Persisted)>, StoreError>
where
    I: IntoIterator<Item = &'a CompiledDocument>,
{
    documents
        .into_iter()
        .map(|document| {
            let path = config_path(root, document.uri());
            persist(document, &path, options).map(|outcome| (path, outcome))
        })
        .collect()
}

/// Renders a document the way it is stored: four-space indented JSON.
fn render(config: &Value) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    config.serialize(&mut ser)?;
    Ok(buf)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }

    let tmp_path = tmp_path(path);
    let written = fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(&tmp_path, e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })
}

/// The sibling a write is staged in. The `$` prefix is not a valid path
/// segment, so no unit's config path can collide with it.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from("$");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn document(value: i64) -> CompiledDocument {
        let mut members = Map::new();
        members.insert("x".into(), json!(value));
        CompiledDocument::new("/test/app".parse().unwrap(), members)
    }

    #[test]
    fn config_path_follows_uri_segments() {
        let root = Path::new("config");
        assert_eq!(
            config_path(root, &"/test/app".parse().unwrap()),
            Path::new("config/test/app")
        );
        assert_eq!(
            config_path(root, &"http://127.0.0.1:8702/test/app".parse().unwrap()),
            Path::new("config/test/app")
        );
    }

    #[test]
    fn writes_then_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/app");

        assert_eq!(persist(&document(1), &path, PersistOptions::default()).unwrap(), Persisted::Created);
        let written = fs::read(&path).unwrap();

        assert_eq!(persist(&document(1), &path, PersistOptions::default()).unwrap(), Persisted::Unchanged);
        assert_eq!(fs::read(&path).unwrap(), written);
        assert!(!path.with_file_name("$app.tmp").exists());
    }

    #[test]
    fn equal_content_in_another_format_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app");
        fs::write(&path, r#"{"/test/app":{"x":1}}"#).unwrap();

        assert_eq!(persist(&document(1), &path, PersistOptions::default()).unwrap(), Persisted::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"/test/app":{"x":1}}"#);
    }

    #[test]
    fn overwrite_always_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app");
        fs::write(&path, r#"{"/test/app":{"x":1}}"#).unwrap();

        assert_eq!(persist(&document(1), &path, PersistOptions::overwrite()).unwrap(), Persisted::Overwritten);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n    \"/test/app\": {\n        \"x\": 1\n    }\n}"
        );
    }

    #[test]
    fn staging_never_touches_a_sibling_unit() {
        let dir = TempDir::new().unwrap();
        let mut members = Map::new();
        members.insert("y".into(), json!(true));
        let sibling = CompiledDocument::new("/test/app.tmp".parse().unwrap(), members);

        persist_all([&sibling, &document(1)], dir.path(), PersistOptions::default()).unwrap();

        let sibling_path = dir.path().join("test/app.tmp");
        let on_disk: Value = serde_json::from_slice(&fs::read(&sibling_path).unwrap()).unwrap();
        assert_eq!(on_disk, sibling.to_json());
        assert!(dir.path().join("test/app").is_file());
        assert!(!dir.path().join("test/$app.tmp").exists());
    }

    #[test]
    fn output_is_four_space_indented() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app");
        persist(&document(1), &path, PersistOptions::default()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n    \"/test/app\": {\n        \"x\": 1\n    }\n}");
    }

    #[test]
    fn divergent_content_conflicts_unless_overwriting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app");
        persist(&document(1), &path, PersistOptions::default()).unwrap();

        let err = persist(&document(2), &path, PersistOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::ConfigConflict { path: p } if p == path));

        assert_eq!(persist(&document(2), &path, PersistOptions::overwrite()).unwrap(), Persisted::Overwritten);
        let on_disk: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, document(2).to_json());
    }

    #[test]
    fn invalid_json_is_treated_as_divergent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            persist(&document(1), &path, PersistOptions::default()),
            Err(StoreError::ConfigConflict { .. })
        ));
        assert_eq!(persist(&document(1), &path, PersistOptions::overwrite()).unwrap(), Persisted::Overwritten);
    }

    #[test]
    fn persist_all_places_each_unit() {
        let dir = TempDir::new().unwrap();
        let mut members = Map::new();
        members.insert("y".into(), json!(true));
        let lib = CompiledDocument::new("/test/lib".parse().unwrap(), members);

        let outcomes = persist_all([&document(1), &lib], dir.path(), PersistOptions::default()).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(dir.path().join("test/app").is_file());
        assert!(dir.path().join("test/lib").is_file());
        assert!(outcomes.iter().all(|(_, o)| *o == Persisted::Created));
    }
}
