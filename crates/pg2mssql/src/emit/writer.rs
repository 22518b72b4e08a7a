//! Artifact writing.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConvertError, Result};

use super::script::{ArtifactKind, Script};

/// One written script file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub statements: usize,
    pub bytes: u64,
}

/// Write each script to `dir/<file name>`, creating `dir` if needed.
///
/// Each file is written through its own buffered writer, flushed and closed
/// before the next one is opened. Any failure aborts the run.
pub fn write_scripts(dir: &Path, scripts: &[Script]) -> Result<Vec<WrittenArtifact>> {
    if scripts.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir).map_err(|e| ConvertError::output(dir, e))?;

    let mut written = Vec::with_capacity(scripts.len());
    for script in scripts {
        let path = dir.join(script.kind.file_name());
        let file = File::create(&path).map_err(|e| ConvertError::output(&path, e))?;
        let mut out = BufWriter::new(file);
        script
            .write_to(&mut out)
            .and_then(|_| out.flush())
            .map_err(|e| ConvertError::output(&path, e))?;
        drop(out);

        let bytes = fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| ConvertError::output(&path, e))?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes);

        written.push(WrittenArtifact {
            kind: script.kind,
            path,
            statements: script.statement_count(),
            bytes,
        });
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::statement::Statement;

    #[test]
    fn test_write_scripts_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested").join("out");

        let mut schemas = Script::new(ArtifactKind::CreateSchemas, None);
        schemas.push(Statement::CreateSchema("sales".into()));
        let truncate = Script::new(ArtifactKind::TruncateTables, None);

        let written = write_scripts(&out_dir, &[schemas, truncate]).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].statements, 1);
        assert_eq!(written[1].statements, 0);

        let text = fs::read_to_string(out_dir.join("create_schemas.sql")).unwrap();
        assert!(text.contains("CREATE SCHEMA [sales];"));
        assert_eq!(written[0].bytes, text.len() as u64);
        assert!(out_dir.join("truncate_tables.sql").exists());
    }

    #[test]
    fn test_no_scripts_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("unused");
        assert!(write_scripts(&out_dir, &[]).unwrap().is_empty());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_unwritable_directory_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let mut script = Script::new(ArtifactKind::CreateSchemas, None);
        script.push(Statement::CreateSchema("sales".into()));
        let err = write_scripts(&blocker.join("sub"), &[script]).unwrap_err();
        assert!(matches!(err, ConvertError::Output { .. }));
        assert_eq!(err.exit_code(), 4);
    }
}
