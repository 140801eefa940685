use mime_guess::from_path;
use rust_embed::RustEmbed;
use spin_sdk::http::Response;

use crate::config::media_key;
use crate::core::errors::AppError;
use crate::core::helpers::store;

#[derive(RustEmbed)]
#[folder = "static"]
struct Assets;

pub fn serve_static(path: &str) -> anyhow::Result<Response> {
    let file_path = path.trim_start_matches('/');

    let Some(file) = Assets::get(file_path) else {
        return Ok(AppError::NotFound.into());
    };

    let mime = from_path(file_path).first_or_octet_stream();

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", mime.as_ref())
        .body(file.data.to_vec())
        .build())
}

/// Uploaded images, addressed by the relative path stored on the post.
pub fn serve_media(path: &str) -> anyhow::Result<Response> {
    if path.contains("..") {
        return Ok(AppError::NotFound.into());
    }

    let store = store();
    let Some(data) = store.get(&media_key(path))? else {
        return Ok(AppError::NotFound.into());
    };

    let mime = from_path(path).first_or_octet_stream();

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", mime.as_ref())
        .body(data)
        .build())
}
