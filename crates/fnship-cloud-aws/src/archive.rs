//! Deployment package
//!
//! Lambda takes code as a zip file. The archive is written to a temporary
//! file that is removed when the [`DeploymentArchive`] is dropped.

use std::fs::File;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

/// A zipped copy of the project directory
#[derive(Debug)]
pub struct DeploymentArchive {
    file: NamedTempFile,
    entries: usize,
}

impl DeploymentArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `fileb://` URI understood by the AWS CLI
    pub fn fileb_uri(&self) -> String {
        format!("fileb://{}", self.path().display())
    }

    /// Number of files in the archive
    pub fn entries(&self) -> usize {
        self.entries
    }
}

/// Zip every file under `source_dir`, paths relative to it.
///
/// Hidden entries (`.git`, `.venv`, ...) and `__pycache__` are left out.
pub fn package(source_dir: &Path) -> io::Result<DeploymentArchive> {
    if !source_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory not found: {}", source_dir.display()),
        ));
    }

    let mut file = tempfile::Builder::new()
        .prefix("fnship-")
        .suffix(".zip")
        .tempfile()?;

    let mut zip = zip::ZipWriter::new(file.as_file_mut());
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);

    let mut entries = 0;
    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let zip_path = relative
            .to_str()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("non UTF-8 path: {}", relative.display()),
                )
            })?
            .replace('\\', "/");

        tracing::debug!("Adding: {}", zip_path);
        zip.start_file(&zip_path, options)?;
        let mut source = File::open(entry.path())?;
        io::copy(&mut source, &mut zip)?;
        entries += 1;
    }

    zip.finish()?;
    tracing::debug!("Packaged {} files into {}", entries, file.path().display());

    Ok(DeploymentArchive { file, entries })
}

fn is_excluded(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "__pycache__"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;

    fn names(archive: &DeploymentArchive) -> Vec<String> {
        let file = File::open(archive.path()).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_packages_project_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "def handler(event, ctx):\n    return 1\n").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/util.py"), "X = 1\n").unwrap();

        let archive = package(dir.path()).unwrap();

        assert_eq!(archive.entries(), 2);
        assert_eq!(names(&archive), vec!["lib/util.py", "main.py"]);
        assert!(archive.fileb_uri().starts_with("fileb://"));
        assert!(archive.fileb_uri().ends_with(".zip"));

        let file = File::open(archive.path()).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut body = String::new();
        zip.by_name("main.py").unwrap().read_to_string(&mut body).unwrap();
        assert!(body.contains("def handler"));
    }

    #[test]
    fn test_skips_hidden_and_cache_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("__pycache__/main.pyc"), "").unwrap();

        let archive = package(dir.path()).unwrap();
        assert_eq!(names(&archive), vec!["main.py"]);
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = package(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_archive_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "").unwrap();

        let archive = package(dir.path()).unwrap();
        let path = archive.path().to_path_buf();
        assert!(path.exists());
        drop(archive);
        assert!(!path.exists());
    }
}
