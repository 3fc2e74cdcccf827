//! Byte acquisition and decoding for the resolve pipeline.

use bytes::Bytes;
use tracing::debug;

use crate::domain::ports::{CacheError, CacheResult};

/// Default cap on decoded image width in pixels.
pub const DEFAULT_MAX_DECODE_WIDTH: u32 = 1280;

/// Default cap on decoded image height in pixels.
pub const DEFAULT_MAX_DECODE_HEIGHT: u32 = 960;

/// Builds the HTTP client used for remote requests.
///
/// # Errors
/// Returns error if the client cannot be constructed.
pub fn build_client(timeout_secs: u64) -> CacheResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CacheError::NetworkError(format!("Failed to create HTTP client: {e}")))
}

/// Downloads image bytes from a URL.
///
/// # Errors
/// Returns error on request failure or a non-success status.
pub async fn download(client: &reqwest::Client, url: &str) -> CacheResult<Bytes> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CacheError::NetworkError(format!("Request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(CacheError::NetworkError(format!(
            "HTTP {}: {}",
            response.status(),
            response.status().canonical_reason().unwrap_or("Unknown")
        )));
    }

    response
        .bytes()
        .await
        .map_err(|e| CacheError::NetworkError(format!("Failed to read body: {e}")))
}

/// Decodes encoded image bytes on the blocking pool, downscaling to the
/// given bounds when the source exceeds them. The cap bounds both the decode
/// memory retained afterwards and the cost of later protocol encoding.
///
/// # Errors
/// Returns error if the bytes are not a decodable image.
pub async fn decode(bytes: Bytes, max_width: u32, max_height: u32) -> CacheResult<image::DynamicImage> {
    let decoded = tokio::task::spawn_blocking(move || -> CacheResult<image::DynamicImage> {
        let img = image::load_from_memory(&bytes)
            .map_err(|e| CacheError::DecodeError(format!("Failed to decode image: {e}")))?;

        if img.width() > max_width || img.height() > max_height {
            debug!(
                width = img.width(),
                height = img.height(),
                max_width,
                max_height,
                "Downscaling decoded image"
            );
            Ok(img.resize(max_width, max_height, image::imageops::FilterType::Lanczos3))
        } else {
            Ok(img)
        }
    })
    .await
    .map_err(|e| CacheError::DecodeError(format!("Decode task panicked: {e}")))??;

    Ok(decoded)
}

/// Reads image bytes from the local filesystem.
///
/// # Errors
/// Returns error if the file cannot be read.
pub async fn read_file(path: &std::path::Path) -> CacheResult<Bytes> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|e| CacheError::IoError(format!("Failed to read {}: {e}", path.display())))
}


#[cfg(test)]
mod tests {
    use super::test_support::png_bytes;
    use super::*;

    #[tokio::test]
    async fn test_decode_valid_png() {
        let bytes = Bytes::from(png_bytes(8, 6));
        let img = decode(bytes, DEFAULT_MAX_DECODE_WIDTH, DEFAULT_MAX_DECODE_HEIGHT)
            .await
            .unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[tokio::test]
    async fn test_decode_rejects_garbage() {
        let result = decode(
            Bytes::from_static(b"not an image"),
            DEFAULT_MAX_DECODE_WIDTH,
            DEFAULT_MAX_DECODE_HEIGHT,
        )
        .await;
        assert!(matches!(result, Err(CacheError::DecodeError(_))));
    }

    #[tokio::test]
    async fn test_decode_downscales_oversized() {
        let bytes = Bytes::from(png_bytes(100, 40));
        let img = decode(bytes, 50, 50).await.unwrap();
        assert!(img.width() <= 50);
        assert!(img.height() <= 50);
        // Aspect ratio survives the resize.
        assert_eq!(img.width(), 50);
        assert_eq!(img.height(), 20);
    }

    #[tokio::test]
    async fn test_read_file_missing() {
        let result = read_file(std::path::Path::new("/nonexistent/image.png")).await;
        assert!(matches!(result, Err(CacheError::IoError(_))));
    }
}
