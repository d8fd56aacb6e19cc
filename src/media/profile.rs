//! Per-resource upload configuration: target folder, accepted kind, and how the stored name is derived.

use crate::error::MediaError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    /// PDFs and office documents.
    Document,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Document => "document",
        }
    }

    pub fn accepts(&self, content_type: &str, file_name: &str) -> bool {
        let ct = content_type.to_ascii_lowercase();
        let ext = extension(file_name).unwrap_or_default();
        match self {
            MediaKind::Image => {
                ct.starts_with("image/")
                    || (ct == "application/octet-stream"
                        && matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg"))
            }
            MediaKind::Document => {
                ct == "application/pdf"
                    || ct.starts_with("application/vnd.")
                    || ct == "application/msword"
                    || ct.starts_with("image/")
                    || (ct == "application/octet-stream"
                        && matches!(ext.as_str(), "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx"))
            }
        }
    }
}

/// How the stored object name is derived from the client's file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileNaming {
    /// `<uuid>-<cleaned original name>`; keeps documents recognisable.
    #[default]
    Sanitized,
    /// `<uuid>.<ext>`; original name dropped.
    Opaque,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadProfile {
    pub folder: String,
    pub kind: MediaKind,
    pub naming: FileNaming,
}

impl UploadProfile {
    pub fn check(&self, content_type: &str, file_name: &str, len: usize) -> Result<(), MediaError> {
        if len == 0 {
            return Err(MediaError::Empty(file_name.to_string()));
        }
        if !self.kind.accepts(content_type, file_name) {
            return Err(MediaError::UnsupportedType {
                kind: self.kind.label(),
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Object key under the profile folder, unique per call.
    pub fn object_key(&self, file_name: &str) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let name = match self.naming {
            FileNaming::Sanitized => format!("{}-{}", id, sanitize_file_name(file_name)),
            FileNaming::Opaque => match extension(file_name) {
                Some(ext) => format!("{}.{}", id, ext),
                None => id,
            },
        };
        format!("{}/{}", self.folder.trim_matches('/'), name)
    }
}

fn extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Keep ASCII letters, digits, dot, dash and underscore; collapse everything else to `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let mut out = String::with_capacity(base.len());
    let mut last_underscore = false;
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    let trimmed = out.trim_matches(|c| c == '_' || c == '.').to_string();
    if trimmed.is_empty() {
        "file".into()
    } else {
        trimmed.chars().take(120).collect()
    }
}
