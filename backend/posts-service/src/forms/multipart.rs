//! Reading post forms out of `multipart/form-data` bodies.

use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, ContentDisposition};
use futures_util::stream::StreamExt;

use super::{PostForm, UploadedFile};
use crate::error::{AppError, Result};

/// Cap for a single non-file field
const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;

/// Collect the `text`, `group`, `image` and `image-clear` parts of a post
/// submission. Unknown parts are drained and ignored.
pub async fn read_post_form(mut payload: Multipart, max_upload_bytes: usize) -> Result<PostForm> {
    let mut text = String::new();
    let mut group = None;
    let mut image = None;
    let mut image_clear = false;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let disposition = disposition(&field);
        let name = disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "text" => text = read_text(&mut field).await?,
            "group" => group = Some(read_text(&mut field).await?),
            "image-clear" => image_clear = !read_text(&mut field).await?.is_empty(),
            "image" => {
                let filename = disposition
                    .as_ref()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();
                let content_type = field.content_type().map(|mime| mime.to_string());
                let data = read_bytes(&mut field, max_upload_bytes).await?;

                image = Some(UploadedFile {
                    filename,
                    content_type,
                    data,
                });
            }
            _ => drain(&mut field).await?,
        }
    }

    let mut form = PostForm::new(&text, group, image);
    form.image_clear = image_clear;
    Ok(form)
}

fn disposition(field: &Field) -> Option<ContentDisposition> {
    field
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| ContentDisposition::from_raw(value).ok())
}

async fn read_bytes(field: &mut Field, limit: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if data.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "upload exceeds {} bytes",
                limit
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text(field: &mut Field) -> Result<String> {
    let data = read_bytes(field, MAX_TEXT_FIELD_BYTES).await?;
    String::from_utf8(data).map_err(|_| AppError::BadRequest("form field is not UTF-8".into()))
}

async fn drain(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}
