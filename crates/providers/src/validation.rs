//! Pre-flight checks run before any network call.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use designlens_core::model_response::ImagePayload;
use image::ImageFormat;

use crate::error::ProviderError;

/// Shorter payloads cannot hold a real screenshot; treat them as corrupt.
pub const MIN_ENCODED_LENGTH: usize = 100;

/// Largest decoded image accepted by any vendor.
pub const MAX_DECODED_BYTES: usize = 20 * 1024 * 1024;

pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Normalize a declared mime type; `image/jpg` is accepted as `image/jpeg`.
pub fn normalize_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    if lowered == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        lowered
    }
}

/// Strip an optional `data:<mime>;base64,` prefix and whitespace.
pub fn strip_data_uri(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => trimmed,
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> ProviderError {
    ProviderError::InvalidImage {
        index,
        reason: reason.into(),
    }
}

/// Validate one image payload.
pub fn validate_image(index: usize, image: &ImagePayload) -> Result<(), ProviderError> {
    let mime = normalize_mime_type(&image.mime_type);
    if !mime.starts_with("image/") {
        return Err(invalid(index, format!("unsupported media type '{}'", image.mime_type)));
    }
    if !SUPPORTED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(invalid(index, format!("unsupported image format '{mime}'")));
    }

    let encoded = strip_data_uri(&image.encoded_payload);
    if encoded.len() < MIN_ENCODED_LENGTH {
        return Err(invalid(
            index,
            format!(
                "base64 payload has {} characters, expected at least {MIN_ENCODED_LENGTH}",
                encoded.len()
            ),
        ));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| invalid(index, format!("base64 decode failed: {e}")))?;
    if bytes.is_empty() || bytes.len() > MAX_DECODED_BYTES {
        return Err(invalid(
            index,
            format!("decoded image is {} bytes, allowed 1..={MAX_DECODED_BYTES}", bytes.len()),
        ));
    }

    // Unknown magic bytes are left for the vendor to judge.
    if let (Ok(detected), Some(declared)) =
        (image::guess_format(&bytes), ImageFormat::from_mime_type(&mime))
    {
        if detected != declared {
            return Err(invalid(
                index,
                format!("declared '{mime}' but the data is {detected:?}"),
            ));
        }
    }

    Ok(())
}

/// Validate a whole request: at least one image, every image valid, a prompt.
pub fn validate_request(images: &[ImagePayload], prompt: &str) -> Result<(), ProviderError> {
    if images.is_empty() {
        return Err(ProviderError::InvalidRequest(
            "at least one image is required".into(),
        ));
    }
    if prompt.trim().is_empty() {
        return Err(ProviderError::InvalidRequest("prompt must not be empty".into()));
    }
    images
        .iter()
        .enumerate()
        .try_for_each(|(index, image)| validate_image(index, image))
}
