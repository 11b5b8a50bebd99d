use anyhow::{Context, Result};
use std::path::Path;

/// Program that opens a folder in the desktop file manager.
pub fn opener() -> &'static str {
    if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Opens `path` in the file manager, creating it first so the manager has
/// something to show.
pub fn open_folder<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))?;
    std::process::Command::new(opener())
        .arg(path)
        .spawn()
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_a_no_op() {
        assert!(open_folder("").is_ok());
    }

    #[test]
    fn opener_matches_platform() {
        #[cfg(all(unix, not(target_os = "macos")))]
        assert_eq!(opener(), "xdg-open");
        #[cfg(target_os = "macos")]
        assert_eq!(opener(), "open");
    }
}
