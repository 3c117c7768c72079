// blocklog - platform/fs.rs
//
// Filesystem helpers for the run pipeline: opening the input, creating
// export files, and writing the target-name file. Every failure carries the
// path and the operation that failed.

use crate::util::error::BlockLogError;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

fn io_error(path: &Path, operation: &'static str, source: io::Error) -> BlockLogError {
    BlockLogError::Io {
        path: path.to_path_buf(),
        operation,
        source,
    }
}

/// Open the input log for buffered line reading.
pub fn open_input(path: &Path) -> Result<BufReader<File>, BlockLogError> {
    let file = File::open(path).map_err(|e| io_error(path, "open input", e))?;
    Ok(BufReader::new(file))
}

/// Create `dir` and any missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), BlockLogError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, "create output directory", e))
}

/// Create (or truncate) an export file.
pub fn create_output(path: &Path) -> io::Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new)
}

/// Remove an export file left behind by a failed write. A file that is
/// already gone is not an error.
pub fn discard_output(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Record the base output name of a run in `path`, replacing any previous
/// content. Parent directories are created as needed.
pub fn write_target_name(path: &Path, name: &str) -> Result<(), BlockLogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path).map_err(|e| io_error(path, "create target file", e))?;
    writeln!(file, "{name}").map_err(|e| io_error(path, "write target file", e))?;
    tracing::debug!(path = %path.display(), name, "Target name written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn test_open_missing_input_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.log");
        let err = open_input(&missing).unwrap_err();
        match err {
            BlockLogError::Io {
                path, operation, ..
            } => {
                assert_eq!(path, missing);
                assert_eq!(operation, "open input");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_discard_output_removes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.log.unknown.csv");
        std::fs::write(&path, "data\n").unwrap();

        discard_output(&path).unwrap();
        assert!(!path.exists());
        discard_output(&path).unwrap();
    }

    #[test]
    fn test_open_input_reads_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.log");
        std::fs::write(&path, "one\ntwo\n").unwrap();
        let lines: Vec<String> = open_input(&path)
            .unwrap()
            .lines()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_write_target_name_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("state").join("target.txt");
        write_target_name(&target, "first.log").unwrap();
        write_target_name(&target, "node.log.2019-09-25").unwrap();
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "node.log.2019-09-25\n"
        );
    }
}
