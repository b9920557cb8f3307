//! Tool-chain layout: where the front end and analyzer live under an install directory.

use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// Front end location relative to the install directory.
const FRONT_END_PATH: [&str; 3] = ["lib", "1.0", "mapfej"];
/// Analyzer location relative to the install directory.
const ANALYZER_PATH: [&str; 2] = ["bin", "xvsa"];

/// An analysis tool-chain installation.
#[derive(Debug, Clone)]
pub struct ToolchainLayout {
    install_dir: PathBuf,
}

impl ToolchainLayout {
    pub fn new(install_dir: &Path) -> Self {
        Self {
            install_dir: install_dir.to_path_buf(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Path to the front-end translator, verified to be an executable file.
    ///
    /// # Errors
    /// Returns an error if the file is missing, not a regular file, or not executable.
    pub fn front_end(&self) -> Result<PathBuf, ToolError> {
        self.locate("front end", &FRONT_END_PATH)
    }

    /// Path to the analyzer, verified to be an executable file.
    ///
    /// # Errors
    /// Returns an error if the file is missing, not a regular file, or not executable.
    pub fn analyzer(&self) -> Result<PathBuf, ToolError> {
        self.locate("analyzer", &ANALYZER_PATH)
    }

    fn locate(&self, tool: &str, relative: &[&str]) -> Result<PathBuf, ToolError> {
        let path = relative
            .iter()
            .fold(self.install_dir.clone(), |acc, part| acc.join(part));
        if !path.is_file() {
            return Err(ToolError::NotFound {
                tool: tool.to_owned(),
                path,
            });
        }
        check_executable(tool, &path)?;
        Ok(path)
    }
}

fn check_executable(tool: &str, path: &Path) -> Result<(), ToolError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path).map_err(|_| ToolError::NotExecutable {
            tool: tool.to_owned(),
            path: path.to_path_buf(),
        })?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(ToolError::NotExecutable {
                tool: tool.to_owned(),
                path: path.to_path_buf(),
            });
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (tool, path);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    fn install_tool(root: &Path, relative: &[&str], mode: u32) -> PathBuf {
        let path = relative.iter().fold(root.to_path_buf(), |acc, p| acc.join(p));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = mode;
        path
    }

    #[test]
    fn front_end_found_when_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = install_tool(tmp.path(), &FRONT_END_PATH, 0o755);
        let layout = ToolchainLayout::new(tmp.path());
        assert_eq!(layout.front_end().unwrap(), expected);
    }

    #[test]
    fn analyzer_found_when_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let expected = install_tool(tmp.path(), &ANALYZER_PATH, 0o755);
        let layout = ToolchainLayout::new(tmp.path());
        assert_eq!(layout.analyzer().unwrap(), expected);
    }

    #[test]
    fn missing_tool_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ToolchainLayout::new(tmp.path()).front_end().unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[test]
    fn directory_in_place_of_tool_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("bin").join("xvsa")).unwrap();
        let err = ToolchainLayout::new(tmp.path()).analyzer().unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_tool_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        install_tool(tmp.path(), &ANALYZER_PATH, 0o644);
        let err = ToolchainLayout::new(tmp.path()).analyzer().unwrap_err();
        assert!(matches!(err, ToolError::NotExecutable { .. }));
        assert!(err.to_string().contains("permissions"));
    }
}
