//! Input collection: pasted policy text and uploaded documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TXT: &str = "text/plain";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

const EXTENSION_MIME: &[(&str, &str)] = &[
    ("pdf", MIME_PDF),
    ("doc", MIME_DOC),
    ("docx", MIME_DOCX),
    ("txt", MIME_TXT),
];

/// Two policy bodies to compare. Serialises as `{"policy1": ..., "policy2": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyPair {
    policy1: String,
    policy2: String,
}

impl PolicyPair {
    /// Both bodies must contain something other than whitespace.
    ///
    /// The text is kept as entered; trimming only decides emptiness.
    pub fn new(
        policy1: impl Into<String>,
        policy2: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let policy1 = policy1.into();
        let policy2 = policy2.into();
        if policy1.trim().is_empty() || policy2.trim().is_empty() {
            return Err(ValidationError::MissingPolicies);
        }
        Ok(Self { policy1, policy2 })
    }

    pub fn policy1(&self) -> &str {
        &self.policy1
    }

    pub fn policy2(&self) -> &str {
        &self.policy2
    }
}

/// Which document types an upload accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileAllowList {
    PdfOnly,
    #[default]
    PdfOrWord,
    /// PDF, Word, or plain text.
    Documents,
}

impl FileAllowList {
    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            FileAllowList::PdfOnly => &[MIME_PDF],
            FileAllowList::PdfOrWord => &[MIME_PDF, MIME_DOC, MIME_DOCX],
            FileAllowList::Documents => &[MIME_PDF, MIME_DOC, MIME_DOCX, MIME_TXT],
        }
    }

    /// Compare on the essence only: `text/plain; charset=utf-8` is `text/plain`.
    pub fn allows(self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or("").trim();
        self.mime_types()
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    pub fn describe(self) -> &'static str {
        match self {
            FileAllowList::PdfOnly => "a PDF document",
            FileAllowList::PdfOrWord => "a PDF or Word document",
            FileAllowList::Documents => "a PDF, Word or text document",
        }
    }
}

/// Guess a MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return MIME_UNKNOWN;
    };
    EXTENSION_MIME
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(MIME_UNKNOWN)
}

/// A document selected for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, taking its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(file_name, mime_for_path(path), bytes))
    }

    pub fn validate(&self, allow: FileAllowList) -> Result<(), ValidationError> {
        if !allow.allows(&self.mime) {
            return Err(ValidationError::UnsupportedFileType {
                file_name: self.file_name.clone(),
                mime: self.mime.clone(),
                expected: allow.describe(),
            });
        }
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile(self.file_name.clone()));
        }
        Ok(())
    }
}

/// Validate every file of a batch; the first failure wins.
pub fn validate_batch(files: &[UploadFile], allow: FileAllowList) -> Result<(), ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    files.iter().try_for_each(|f| f.validate(allow))
}
