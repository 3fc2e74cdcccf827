//! Cacheless one-shot resolvers.
//!
//! Each resolver spawns the fetch/decode onto the runtime and hands back the
//! slot immediately; the widget polls it. Resolves run to completion or
//! failure even if the slot's consumer is discarded.

use std::path::PathBuf;

use bytes::Bytes;
use tracing::warn;

use crate::domain::deferred::ImageSlot;
use crate::domain::entities::ImageRequest;
use crate::domain::ports::CacheResult;

use super::fetch;

/// Resolves any request without cache involvement.
/// Must be called from within a tokio runtime.
pub fn resolve(request: ImageRequest, client: &reqwest::Client) -> ImageSlot {
    match request {
        ImageRequest::File(path) => resolve_path(path),
        ImageRequest::Url(url) => resolve_url(client, url),
        ImageRequest::Bundled { name, bytes } => resolve_bytes(name, bytes),
    }
}

/// Resolves an image file from the local filesystem.
pub fn resolve_path(path: impl Into<PathBuf>) -> ImageSlot {
    let path = path.into();
    spawn_resolve(format!("{}", path.display()), async move {
        let bytes = fetch::read_file(&path).await?;
        decode_default(bytes).await
    })
}

/// Resolves an image from an HTTP(S) URL.
pub fn resolve_url(client: &reqwest::Client, url: impl Into<String>) -> ImageSlot {
    let client = client.clone();
    let url = url.into();
    spawn_resolve(url.clone(), async move {
        let bytes = fetch::download(&client, &url).await?;
        decode_default(bytes).await
    })
}

/// Resolves an image from bytes bundled with the application.
pub fn resolve_bytes(name: impl Into<String>, bytes: impl Into<Bytes>) -> ImageSlot {
    let bytes = bytes.into();
    spawn_resolve(name.into(), async move { decode_default(bytes).await })
}

async fn decode_default(bytes: Bytes) -> CacheResult<image::DynamicImage> {
    fetch::decode(
        bytes,
        fetch::DEFAULT_MAX_DECODE_WIDTH,
        fetch::DEFAULT_MAX_DECODE_HEIGHT,
    )
    .await
}

fn spawn_resolve(
    label: String,
    fut: impl std::future::Future<Output = CacheResult<image::DynamicImage>> + Send + 'static,
) -> ImageSlot {
    let slot = ImageSlot::new();
    let producer = slot.clone();

    tokio::spawn(async move {
        match fut.await {
            Ok(img) => {
                producer.fulfill(std::sync::Arc::new(img));
            }
            Err(e) => {
                warn!(source = %label, error = %e, "Image resolve failed");
                producer.fail(e);
            }
        }
    });

    slot
}
