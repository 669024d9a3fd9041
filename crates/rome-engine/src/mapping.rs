//! Source to destination path mapping

use rome_types::{Error, Result};
use std::path::{Path, PathBuf};

/// Maps paths under the source root onto the destination root
///
/// The source prefix is stripped component-wise, never by string
/// replacement, so a path outside the source root is rejected instead of
/// being written somewhere unexpected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl PathMapper {
    /// Create a mapper between two roots
    pub fn new<S: Into<PathBuf>, D: Into<PathBuf>>(source_root: S, destination_root: D) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    /// Source root
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Destination root
    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Path of `path` relative to the source root
    pub fn relative<'a>(&self, path: &'a Path) -> Result<&'a Path> {
        path.strip_prefix(&self.source_root)
            .map_err(|_| Error::PathMapping {
                path: path.to_path_buf(),
                root: self.source_root.clone(),
            })
    }

    /// Destination path for a path under the source root
    pub fn map(&self, path: &Path) -> Result<PathBuf> {
        let relative = self.relative(path)?;
        if relative.as_os_str().is_empty() {
            return Ok(self.destination_root.clone());
        }
        Ok(self.destination_root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/src/a.txt", "/dst/a.txt")]
    #[case("/src/sub/b.txt", "/dst/sub/b.txt")]
    #[case("/src", "/dst")]
    fn test_map(#[case] input: &str, #[case] expected: &str) {
        let mapper = PathMapper::new("/src", "/dst");
        assert_eq!(mapper.map(Path::new(input)).unwrap(), PathBuf::from(expected));
    }

    #[test]
    fn test_map_is_component_wise() {
        // "/srcfoo" shares a string prefix with "/src" but is not below it
        let mapper = PathMapper::new("/src", "/dst");
        let error = mapper.map(Path::new("/srcfoo/a.txt")).unwrap_err();
        assert!(matches!(error, Error::PathMapping { .. }));
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_relative_source_root() {
        let mapper = PathMapper::new("project", "build/out");
        assert_eq!(
            mapper.map(Path::new("project/include/a.php")).unwrap(),
            PathBuf::from("build/out/include/a.php")
        );
        assert_eq!(
            mapper.relative(Path::new("project/include")).unwrap(),
            Path::new("include")
        );
    }
}
