/**
 * File Attachments
 *
 * Files are uploaded via multipart, stored on disk under the configured
 * upload directory with a `<uuid>-<original-name>` filename, and tracked
 * by a metadata row. Access follows the owning task's rule.
 */

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upload size cap in bytes (50 MB)
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Accepted content types: images, PDF, Word documents
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub task_id: Uuid,
    pub owner_id: Uuid,
    /// Original client-side file name
    pub name: String,
    /// File name on disk, relative to the upload directory
    pub path: String,
    pub size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_allow_list_covers_documents() {
        assert!(ALLOWED_MIME_TYPES.contains(&"application/pdf"));
        assert!(ALLOWED_MIME_TYPES.contains(&"image/png"));
        assert!(!ALLOWED_MIME_TYPES.contains(&"application/zip"));
    }
}
