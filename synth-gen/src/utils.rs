//! Filesystem helpers.

use crate::common::*;

/// Ensure a directory exists, creating it and its parents on demand.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory '{}'", path.display()))?;
    Ok(())
}

/// List files under `dir` matching a glob pattern, sorted for a
/// deterministic iteration order. A missing directory yields an empty list.
pub fn list_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        warn!("directory does not exist: {}", dir.display());
        return Ok(vec![]);
    }

    let full = dir.join(pattern);
    let pattern = full
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 path: {}", full.display()))?;

    let mut files: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    debug!("found {} files matching '{}'", files.len(), pattern);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn listing_is_recursive_and_sorted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["b/y.glb", "a/z.glb", "a/x.glb"] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap())?;
            writeln!(fs::File::create(&path)?, "data")?;
        }
        fs::write(dir.path().join("a/skip.txt"), "not a model")?;

        let files = list_files(dir.path(), "**/*.glb")?;
        let names: Vec<_> = files
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a/x.glb", "a/z.glb", "b/y.glb"]);
        Ok(())
    }

    #[test]
    fn missing_directory_yields_empty_list() -> Result<()> {
        let files = list_files(Path::new("/nonexistent-dir"), "*.glb")?;
        assert!(files.is_empty());
        Ok(())
    }
}
