use crate::error::GenerationError;
use crate::video::ImageInput;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::Path;
use tokio::fs;

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Turns an image input into the value of the request's `image` field.
///
/// Remote URLs pass through untouched. Local files are inlined as a base64
/// data URI.
pub async fn prepare_image(input: &ImageInput) -> Result<String, GenerationError> {
    match input {
        ImageInput::Remote(url) => Ok(url.clone()),
        ImageInput::Local(path) => {
            let bytes = fs::read(path)
                .await
                .map_err(|err| GenerationError::local_io("Failed to read image", path, err))?;
            let mime = mime_for_path(path);
            Ok(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
        }
    }
}

pub async fn prepare_image_input(reference: &str, is_url: bool) -> Result<String, GenerationError> {
    prepare_image(&ImageInput::from_reference(reference, is_url)).await
}
