// scorewatch-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Replaces `path` with `content` through a sibling temp file, so readers
/// see either the previous artifact or the new one, never half of it.
/// Missing parent directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // Same directory so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Appends one newline-terminated record. A trailing newline is added
/// when `line` lacks one.
pub fn append_line<P: AsRef<Path>>(path: P, line: &str) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut record = String::with_capacity(line.len() + 1);
    record.push_str(line.trim_end_matches('\n'));
    record.push('\n');
    file.write_all(record.as_bytes())?;
    Ok(())
}

/// Last non-blank line of a text file, `None` if the file is absent or blank.
pub fn read_last_line<P: AsRef<Path>>(path: P) -> Result<Option<String>, InfrastructureError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(str::to_string))
}

/// CSV files under `dir` (recursive), sorted by path.
pub fn list_csv_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, InfrastructureError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
        let entry = entry.map_err(|e| InfrastructureError::Io(std::io::Error::other(e)))?;
        let is_csv = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if entry.file_type().is_file() && is_csv {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("monitor").join("metrics_log.json");

        atomic_write(&file_path, "[]")?;

        assert_eq!(fs::read_to_string(file_path)?, "[]");
        Ok(())
    }

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("reference.json");

        atomic_write(&file_path, "Initial")?;
        atomic_write(&file_path, "Updated")?;

        assert_eq!(fs::read_to_string(file_path)?, "Updated");
        Ok(())
    }

    #[test]
    fn test_append_line_grows_file() -> Result<()> {
        let dir = tempdir()?;
        let log = dir.path().join("log.jsonl");

        append_line(&log, r#"{"run":1}"#)?;
        append_line(&log, "{\"run\":2}\n")?;

        assert_eq!(fs::read_to_string(&log)?, "{\"run\":1}\n{\"run\":2}\n");
        assert_eq!(read_last_line(&log)?.as_deref(), Some(r#"{"run":2}"#));
        Ok(())
    }

    #[test]
    fn test_list_csv_files_sorted_and_filtered() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("2026-02"))?;
        fs::write(dir.path().join("b.csv"), "x\n")?;
        fs::write(dir.path().join("a.CSV"), "x\n")?;
        fs::write(dir.path().join("notes.txt"), "")?;
        fs::write(dir.path().join("2026-02").join("c.csv"), "x\n")?;

        let names: Vec<String> = list_csv_files(dir.path())?
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["2026-02/c.csv", "a.CSV", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_read_last_line_missing_or_blank() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(read_last_line(dir.path().join("absent.jsonl"))?, None);

        let blank = dir.path().join("blank.jsonl");
        fs::write(&blank, "\n  \n")?;
        assert_eq!(read_last_line(&blank)?, None);
        Ok(())
    }
}
