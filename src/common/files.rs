//! Utilities for file operations with automatic parent directory creation.

use std::fs;
use std::io;
use std::path::Path;

/// Write a file, creating parent directories as needed.
pub fn write_file_with_dirs<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> io::Result<()> {
    let path = path.as_ref();
    ensure_parent_exists(path)?;
    fs::write(path, content)
}

/// Ensure all parent directories of a file exist.
///
/// Does nothing when the path has no parent.
pub fn ensure_parent_exists(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Set the executable bits (`u+x,g+x,o+x`) on a file.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
}

/// Executable bits do not exist on this host; nothing to do.
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_with_dirs_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("etc/nested/gridargs.dat");

        write_file_with_dirs(&path, "--grid aditi").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "--grid aditi");
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable_sets_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("install.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        make_executable(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
