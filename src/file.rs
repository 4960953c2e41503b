use crate::{ParseClient, ParseError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Represents a file field as stored in a ParseObject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileField {
    pub name: String,
    pub url: String,
    #[serde(rename = "__type")]
    pub _type: String, // Should always be "File"
}

impl FileField {
    pub fn new(name: String, url: String) -> Self {
        FileField {
            name,
            url,
            _type: "File".to_string(),
        }
    }
}

/// A file waiting to be uploaded, or one that already has been.
#[derive(Debug, Clone)]
pub struct ParseFile {
    /// The original filename, or the name Parse Server assigned on upload.
    pub name: String,
    /// `None` until the file has been uploaded.
    pub url: Option<String>,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ParseFile {
    pub fn new(name: String, data: Vec<u8>, mime_type: String) -> Self {
        ParseFile {
            name,
            url: None,
            mime_type,
            data,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ParseError::InvalidInput(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let data = std::fs::read(path)?;
        let mime_type = guess_mime_type(&name).to_string();
        Ok(ParseFile::new(name, data, mime_type))
    }

    /// The `FileField` to embed in an object; `None` until uploaded.
    pub fn to_field(&self) -> Option<FileField> {
        self.url
            .as_ref()
            .map(|u| FileField::new(self.name.clone(), u.clone()))
    }
}

/// MIME type for the handful of extensions an admin typically uploads.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

// Response for file uploads
#[derive(Deserialize, Debug)]
struct FileUploadResponse {
    name: String,
    url: String,
}

impl ParseClient {
    /// `POST /files/<name>`. The server usually prefixes the name to keep it unique;
    /// the returned `FileField` carries the stored name and URL.
    pub async fn upload_file(
        &self,
        file_name: &str,
        data: Vec<u8>,
        mime_type: &str,
    ) -> Result<FileField, ParseError> {
        if file_name.is_empty() {
            return Err(ParseError::InvalidInput(
                "File name cannot be empty".to_string(),
            ));
        }
        let endpoint = format!("files/{}", file_name);
        let upload_response: FileUploadResponse =
            self._post_bytes(&endpoint, data, mime_type).await?;
        Ok(FileField::new(upload_response.name, upload_response.url))
    }

    /// Uploads a `ParseFile` and records the URL on it.
    pub async fn save_file(&self, file: &mut ParseFile) -> Result<FileField, ParseError> {
        let field = self
            .upload_file(&file.name, file.data.clone(), &file.mime_type)
            .await?;
        file.name = field.name.clone();
        file.url = Some(field.url.clone());
        Ok(field)
    }

    /// `DELETE /files/<name>`. Objects still referencing the file keep a dangling reference.
    pub async fn delete_file(&self, file_name: &str) -> Result<(), ParseError> {
        if file_name.is_empty() {
            return Err(ParseError::InvalidInput(
                "File name cannot be empty".to_string(),
            ));
        }
        let endpoint = format!("files/{}", file_name);
        let _response: Value = self.delete(&endpoint).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_common_types() {
        assert_eq!(guess_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("archive"), "application/octet-stream");
    }

    #[test]
    fn field_only_after_upload() {
        let mut file = ParseFile::new("a.txt".into(), b"hi".to_vec(), "text/plain".into());
        assert!(file.to_field().is_none());
        file.url = Some("http://files/a.txt".into());
        let field = file.to_field().unwrap();
        assert_eq!(field._type, "File");
        assert_eq!(field.url, "http://files/a.txt");
    }
}
