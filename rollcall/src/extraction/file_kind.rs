//! Upload classification by filename extension.

use crate::errors::Error;

/// How an upload is forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Sent as-is, tagged with its content type
    Document { mime_type: &'static str },
    /// Rendered to CSV and embedded in the prompt
    Spreadsheet,
}

/// Extensions accepted as binary documents and the content type each is declared as.
pub const DOCUMENT_TYPES: &[(&str, &str)] = &[
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".pdf", "application/pdf"),
];

pub const SPREADSHEET_EXTENSION: &str = ".xlsx";

/// Lowercased extension of the final path component, including the leading dot.
///
/// Follows POSIX suffix rules: `"archive.tar.GZ"` gives `".gz"`, while `".xlsx"` (a dotfile),
/// `"notes."` and `"README"` have no extension and give `""`.
pub fn extension(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

impl FileKind {
    /// Classify an upload from its filename.
    pub fn from_filename(filename: &str) -> Result<Self, Error> {
        if filename.is_empty() {
            return Err(Error::MissingFilename);
        }

        let ext = extension(filename);
        if ext == SPREADSHEET_EXTENSION {
            return Ok(FileKind::Spreadsheet);
        }

        DOCUMENT_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|&(_, mime_type)| FileKind::Document { mime_type })
            .ok_or(Error::UnsupportedFileType { extension: ext })
    }
}
