//! Code list export and clipboard copy
//!
//! Copy tries the primary clipboard first and the fallback second. Failures
//! come back as `ExportError`s whose `Display` text is the operator message.

use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Something text can be copied to
pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), String>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("No ZIPs to copy.")]
    NothingToCopy,

    #[error("Copy failed.")]
    CopyFailed { primary: String, fallback: String },
}

/// Comma-joined code list
pub fn export_codes<S: AsRef<str>>(codes: &[S]) -> String {
    codes.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

/// Confirmation shown after a successful copy
pub fn copied_message(count: usize) -> String {
    if count == 1 {
        "Copied 1 ZIP to clipboard.".to_string()
    } else {
        format!("Copied {} ZIPs to clipboard.", count)
    }
}

/// Copy `codes`, falling back to the second clipboard if the first fails
///
/// Returns the confirmation message.
pub fn copy_codes<S: AsRef<str>>(
    primary: &dyn Clipboard,
    fallback: &dyn Clipboard,
    codes: &[S],
) -> Result<String, ExportError> {
    if codes.is_empty() {
        return Err(ExportError::NothingToCopy);
    }
    let text = export_codes(codes);

    let primary_err = match primary.write_text(&text) {
        Ok(()) => return Ok(copied_message(codes.len())),
        Err(e) => e,
    };
    warn!(target: "zipcover-services", "Primary clipboard failed: {}; trying fallback", primary_err);

    match fallback.write_text(&text) {
        Ok(()) => Ok(copied_message(codes.len())),
        Err(fallback_err) => {
            warn!(target: "zipcover-services", "Fallback clipboard failed: {}", fallback_err);
            Err(ExportError::CopyFailed {
                primary: primary_err,
                fallback: fallback_err,
            })
        }
    }
}

/// In-process clipboard, mostly for front ends without a system clipboard
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), String> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

/// Writes the copied text to a file
#[derive(Debug, Clone)]
pub struct FileClipboard {
    path: PathBuf,
}

impl FileClipboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Clipboard for FileClipboard {
    fn write_text(&self, text: &str) -> Result<(), String> {
        fs::write(&self.path, text).map_err(|e| format!("{}: {}", self.path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Clipboard for Broken {
        fn write_text(&self, _text: &str) -> Result<(), String> {
            Err("denied".to_string())
        }
    }

    #[test]
    fn test_export_codes() {
        assert_eq!(export_codes(&["60452", "60453"]), "60452,60453");
        assert_eq!(export_codes::<&str>(&[]), "");
    }

    #[test]
    fn test_copy_uses_primary() {
        let primary = MemoryClipboard::new();
        let fallback = MemoryClipboard::new();
        let msg = copy_codes(&primary, &fallback, &["60452"]).unwrap();
        assert_eq!(msg, "Copied 1 ZIP to clipboard.");
        assert_eq!(primary.contents().as_deref(), Some("60452"));
        assert_eq!(fallback.contents(), None);
    }

    #[test]
    fn test_copy_falls_back() {
        let fallback = MemoryClipboard::new();
        let msg = copy_codes(&Broken, &fallback, &["60452", "60453"]).unwrap();
        assert_eq!(msg, "Copied 2 ZIPs to clipboard.");
        assert_eq!(fallback.contents().as_deref(), Some("60452,60453"));
    }

    #[test]
    fn test_copy_errors_are_operator_messages() {
        let empty: [&str; 0] = [];
        let err = copy_codes(&MemoryClipboard::new(), &MemoryClipboard::new(), &empty).unwrap_err();
        assert_eq!(err.to_string(), "No ZIPs to copy.");

        let err = copy_codes(&Broken, &Broken, &["60452"]).unwrap_err();
        assert_eq!(err.to_string(), "Copy failed.");
    }

    #[test]
    fn test_file_clipboard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.txt");
        copy_codes(&FileClipboard::new(&path), &Broken, &["60452", "60462"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "60452,60462");

        let missing_dir = FileClipboard::new(dir.path().join("absent").join("codes.txt"));
        assert!(missing_dir.write_text("x").is_err());
    }
}
