//! Saving the downloadable report.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{RenderResult, REPORT_FILE_NAME};

/// Write report bytes to `dir/Eye_Disease_Report.pdf`.
///
/// Bytes go to a temporary file in `dir` first, which is renamed into place
/// once complete. On any failure the temporary file is removed and no
/// partial report is left behind.
pub fn write_report(dir: &Path, bytes: &[u8]) -> RenderResult<PathBuf> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".eye_report_")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let target = dir.join(REPORT_FILE_NAME);
    tmp.persist(&target).map_err(|e| e.error)?;

    tracing::info!(path = %target.display(), bytes = bytes.len(), "Report saved");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RenderError;

    #[test]
    fn test_write_replaces_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), b"%PDF-first").unwrap();
        let path = write_report(dir.path(), b"%PDF-second").unwrap();

        assert_eq!(path.file_name().unwrap(), REPORT_FILE_NAME);
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-second");

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            write_report(&missing, b"%PDF"),
            Err(RenderError::Io(_))
        ));
    }
}
