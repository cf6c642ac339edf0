/// Media proxy - serves stored uploads from R2 or the local upload directory
use crate::error::Result;
use crate::services::storage::MediaFile;
use crate::services::MediaStorage;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType, CACHE_CONTROL};
use actix_web::{web, HttpResponse};

fn media_response(path: &str, file: MediaFile) -> HttpResponse {
    let content_type = file
        .content_type
        .parse::<mime::Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    let filename = path.rsplit('/').next().unwrap_or(path);

    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((CACHE_CONTROL, "public, max-age=86400"))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(file.bytes)
}

/// `GET /media/{path}`: R2 first, then the upload directory.
pub async fn serve_media(
    storage: web::Data<MediaStorage>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let file = storage.fetch(&path).await?;
    Ok(media_response(&path, file))
}

/// `GET /static/{path}`: upload directory only.
pub async fn serve_static(
    storage: web::Data<MediaStorage>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let file = storage.fetch_local(&path).await?;
    Ok(media_response(&path, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::CONTENT_DISPOSITION;

    #[test]
    fn test_disposition_quotes_filename() {
        let file = MediaFile {
            bytes: b"img".to_vec(),
            content_type: "image/jpeg".to_string(),
        };
        let resp = media_response("post_media/spring formal; night.jpg", file);

        let header = resp.headers().get(CONTENT_DISPOSITION).unwrap();
        let parsed = ContentDisposition::from_raw(header).unwrap();
        assert!(parsed.is_inline());
        assert_eq!(parsed.get_filename(), Some("spring formal; night.jpg"));
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=86400"
        );
    }
}
