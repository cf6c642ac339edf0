/// Multipart form reading shared by upload endpoints
use crate::error::{AppError, Result};
use actix_multipart::Multipart;
use futures_util::StreamExt;
use std::collections::HashMap;

/// File part of a form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn take_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

/// Largest accepted text field
pub const MAX_TEXT_FIELD_SIZE: usize = 64 * 1024;

fn part_limit(is_file: bool, max_file_size: usize) -> usize {
    if is_file {
        max_file_size
    } else {
        MAX_TEXT_FIELD_SIZE
    }
}

/// Read the parts named in `accepted`; any other part fails the request.
/// Files are capped at `max_file_size`, text fields at [`MAX_TEXT_FIELD_SIZE`].
pub async fn read_form(
    mut payload: Multipart,
    accepted: &[&str],
    max_file_size: usize,
) -> Result<FormData> {
    let mut form = FormData::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if !accepted.contains(&name.as_str()) {
            return Err(AppError::BadRequest(format!("Unexpected form field '{}'", name)));
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let limit = part_limit(filename.is_some(), max_file_size);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Error reading upload: {}", e)))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::BadRequest(match filename {
                    Some(_) => format!("File too large. Maximum size is {} bytes", limit),
                    None => format!("Field '{}' exceeds {} bytes", name, limit),
                }));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            // Browsers send an empty file part when nothing was selected.
            Some(filename) if filename.is_empty() && bytes.is_empty() => {}
            Some(filename) => {
                form.files.insert(name, UploadedFile { filename, bytes });
            }
            None => {
                let value = String::from_utf8(bytes)
                    .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::PayloadError;
    use actix_web::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use actix_web::web::Bytes;

    const BOUNDARY: &str = "campusboundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
            b = BOUNDARY
        )
    }

    fn file_part(name: &str, filename: &str, value: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{value}\r\n",
            b = BOUNDARY
        )
    }

    fn payload(parts: &[String]) -> Multipart {
        let body = format!("{}--{}--\r\n", parts.concat(), BOUNDARY);
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={}", BOUNDARY)).unwrap(),
        );
        let stream = futures_util::stream::once(async move { Ok::<_, PayloadError>(Bytes::from(body)) });
        Multipart::new(&headers, stream)
    }

    #[actix_rt::test]
    async fn test_reads_text_and_file_parts() {
        let form = payload(&[
            text_part("content", "Study group at six"),
            file_part("media", "notes.txt", "hello"),
        ]);
        let mut data = read_form(form, &["content", "media"], 1024).await.unwrap();

        assert_eq!(data.take_field("content").as_deref(), Some("Study group at six"));
        let file = data.take_file("media").unwrap();
        assert_eq!(file.filename, "notes.txt");
        assert_eq!(file.bytes, b"hello");
    }

    #[actix_rt::test]
    async fn test_oversized_text_field_is_rejected() {
        let huge = "x".repeat(MAX_TEXT_FIELD_SIZE + 1);
        let form = payload(&[text_part("content", &huge)]);
        let err = read_form(form, &["content", "media"], 10 * 1024 * 1024).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("content")));
    }

    #[actix_rt::test]
    async fn test_oversized_file_is_rejected() {
        let form = payload(&[file_part("media", "big.jpg", &"y".repeat(33))]);
        let err = read_form(form, &["media"], 32).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg.starts_with("File too large")));
    }

    #[actix_rt::test]
    async fn test_unknown_field_is_rejected() {
        let form = payload(&[text_part("junk", "abc")]);
        let err = read_form(form, &["content"], 1024).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("junk")));
    }

    #[test]
    fn test_part_limit() {
        assert_eq!(part_limit(true, 10), 10);
        assert_eq!(part_limit(false, 10), MAX_TEXT_FIELD_SIZE);
    }
}
