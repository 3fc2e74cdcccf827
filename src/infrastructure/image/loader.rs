//! Async image resolution orchestrator.
//!
//! Implements a three-tier lookup: Memory -> Disk -> Source. Requests are
//! queued through a worker loop that throttles concurrent fetches and
//! deduplicates in-flight locators: every requester gets its own slot, and
//! one resolve fulfills all of them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use crate::domain::deferred::ImageSlot;
use crate::domain::entities::{ImageId, ImageRequest, ImageSource, LoadedImage};
use crate::domain::ports::{CacheError, CacheResult, ImageCachePort, ImageLoaderPort};

use super::disk_cache::DiskImageCache;
use super::fetch;
use super::memory_cache::MemoryImageCache;

/// Message sent when an image finishes resolving.
#[derive(Debug, Clone)]
pub struct ImageLoadedEvent {
    /// The image ID.
    pub id: ImageId,
    /// The loaded image, or the failure message.
    pub result: Result<LoadedImage, String>,
}

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    /// Maximum images in memory cache.
    pub memory_cache_size: usize,
    /// Maximum disk cache size in bytes.
    pub disk_cache_size: u64,
    /// Maximum concurrent fetches.
    pub max_concurrent_fetches: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Cap on decoded width in pixels.
    pub max_decode_width: u32,
    /// Cap on decoded height in pixels.
    pub max_decode_height: u32,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            memory_cache_size: super::memory_cache::DEFAULT_CACHE_SIZE,
            disk_cache_size: super::disk_cache::DEFAULT_MAX_CACHE_SIZE,
            max_concurrent_fetches: 4,
            timeout_secs: 30,
            max_decode_width: fetch::DEFAULT_MAX_DECODE_WIDTH,
            max_decode_height: fetch::DEFAULT_MAX_DECODE_HEIGHT,
        }
    }
}

/// Orchestrates image resolution from memory, disk, and source.
pub struct ImageLoader {
    memory_cache: Arc<MemoryImageCache>,
    disk_cache: Arc<DiskImageCache>,
    request_tx: mpsc::UnboundedSender<LoaderCommand>,
    config: ImageLoaderConfig,
    http_client: reqwest::Client,
}

enum LoaderCommand {
    Resolve {
        request: ImageRequest,
        slot: Option<ImageSlot>,
    },
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Completion notice from a resolve task back to the worker loop.
struct ResolveDone {
    id: ImageId,
    result: CacheResult<LoadedImage>,
}

/// State for the background worker loop.
struct WorkerState {
    event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    semaphore: Arc<Semaphore>,
    request_rx: mpsc::UnboundedReceiver<LoaderCommand>,
    task: ResolveTask,
}

impl ImageLoader {
    /// Creates a new image loader with the given configuration.
    ///
    /// Must be called from within a tokio runtime; the worker loop is
    /// spawned immediately.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        config: ImageLoaderConfig,
        event_tx: &mpsc::UnboundedSender<ImageLoadedEvent>,
        disk_cache: Arc<DiskImageCache>,
    ) -> CacheResult<Self> {
        let memory_cache = Arc::new(MemoryImageCache::new(config.memory_cache_size));
        let http_client = fetch::build_client(config.timeout_secs)?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_fetches));

        let worker_state = WorkerState {
            event_tx: event_tx.clone(),
            semaphore,
            request_rx,
            task: ResolveTask {
                memory_cache: memory_cache.clone(),
                disk_cache: disk_cache.clone(),
                http_client: http_client.clone(),
                max_decode_width: config.max_decode_width,
                max_decode_height: config.max_decode_height,
            },
        };

        tokio::spawn(Self::run_worker_loop(worker_state));

        Ok(Self {
            memory_cache,
            disk_cache,
            request_tx,
            config,
            http_client,
        })
    }

    /// Creates a loader with default configuration and the default disk
    /// cache location.
    ///
    /// # Errors
    /// Returns error if the disk cache or HTTP client cannot be created.
    pub async fn with_defaults(
        event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    ) -> CacheResult<Self> {
        let disk_cache = Arc::new(DiskImageCache::default_location().await?);
        Self::new(ImageLoaderConfig::default(), &event_tx, disk_cache)
    }

    /// Worker loop handling resolve requests, throttling, and fan-out.
    async fn run_worker_loop(mut state: WorkerState) {
        let mut queue: VecDeque<(ImageId, ImageRequest)> = VecDeque::new();
        // One entry per in-flight locator; each waiting requester's slot
        // hangs off it and is completed from the single resolve.
        let mut waiters: HashMap<ImageId, Vec<ImageSlot>> = HashMap::new();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<ResolveDone>();

        loop {
            tokio::select! {
                // Commands first: a request already in the channel must
                // attach to its in-flight resolve before the completion for
                // that locator is handled.
                biased;

                cmd = state.request_rx.recv() => {
                    match cmd {
                        Some(LoaderCommand::Resolve { request, slot }) => {
                            let id = request.id();
                            if let Some(pending) = waiters.get_mut(&id) {
                                debug!(id = %id, "Attaching to in-flight resolve");
                                pending.extend(slot);
                            } else {
                                waiters.insert(id.clone(), slot.into_iter().collect());
                                queue.push_back((id, request));
                            }
                        }
                        None => break,
                    }
                }
                Some(done) = done_rx.recv() => {
                    let slots = waiters.remove(&done.id).unwrap_or_default();
                    match &done.result {
                        Ok(loaded) => {
                            for slot in &slots {
                                slot.fulfill(loaded.image.clone());
                            }
                        }
                        Err(e) => {
                            warn!(id = %done.id, error = %e, "Image resolve failed");
                            for slot in &slots {
                                slot.fail(e.clone());
                            }
                        }
                    }
                    let event = ImageLoadedEvent {
                        id: done.id,
                        result: done.result.map_err(|e| e.to_string()),
                    };
                    let _ = state.event_tx.send(event);
                }
                Ok(permit) = state.semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    if let Some((id, request)) = queue.pop_front() {
                        let task = state.task.clone();
                        let done_tx = done_tx.clone();

                        tokio::spawn(async move {
                            let result = task.resolve(&id, &request).await;
                            let _ = done_tx.send(ResolveDone { id, result });
                            drop(permit);
                        });
                    }
                }
            }
        }
    }

    /// Loads an image directly, checking caches first.
    ///
    /// This bypasses the worker queue and does not deduplicate against
    /// in-flight resolves; prefer [`ImageLoader::request`] for widgets.
    ///
    /// # Errors
    /// Returns error if the image cannot be resolved from any tier.
    pub async fn load(&self, request: &ImageRequest) -> CacheResult<LoadedImage> {
        let task = ResolveTask {
            memory_cache: self.memory_cache.clone(),
            disk_cache: self.disk_cache.clone(),
            http_client: self.http_client.clone(),
            max_decode_width: self.config.max_decode_width,
            max_decode_height: self.config.max_decode_height,
        };
        task.resolve(&request.id(), request).await
    }

    /// Begins resolving a request and returns the slot the result arrives
    /// through. Requests for a locator already in flight share its resolve.
    pub fn request(&self, request: ImageRequest) -> ImageSlot {
        let slot = ImageSlot::new();
        let cmd = LoaderCommand::Resolve {
            request,
            slot: Some(slot.clone()),
        };
        if self.request_tx.send(cmd).is_err() {
            error!("Image loader worker is gone; failing request");
            slot.fail(CacheError::IoError("loader shut down".into()));
        }
        slot
    }

    /// Prefetches a request into cache without returning a slot.
    pub fn prefetch(&self, request: ImageRequest) {
        let cmd = LoaderCommand::Resolve {
            request,
            slot: None,
        };
        if self.request_tx.send(cmd).is_err() {
            error!("Image loader worker is gone; dropping prefetch");
        }
    }

    /// Checks memory cache without promoting the entry.
    pub async fn check_memory_cache(&self, id: &ImageId) -> Option<Arc<image::DynamicImage>> {
        self.memory_cache.peek(id).await
    }

    /// Returns memory cache statistics.
    #[must_use]
    pub fn memory_cache_stats(&self) -> super::memory_cache::CacheStats {
        self.memory_cache.stats()
    }

    /// Clears all caches.
    pub async fn clear_all(&self) {
        self.memory_cache.clear().await;
        if let Err(e) = self.disk_cache.clear().await {
            warn!(error = %e, "Failed to clear disk cache");
        }
        info!("Cleared all image caches");
    }
}

#[async_trait::async_trait]
impl ImageLoaderPort for ImageLoader {
    async fn load(&self, request: &ImageRequest) -> CacheResult<LoadedImage> {
        Self::load(self, request).await
    }

    fn request(&self, request: ImageRequest) -> ImageSlot {
        Self::request(self, request)
    }

    fn prefetch(&self, request: ImageRequest) {
        Self::prefetch(self, request);
    }
}

/// The cache-tiered resolve shared by the worker tasks and direct loads.
#[derive(Clone)]
struct ResolveTask {
    memory_cache: Arc<MemoryImageCache>,
    disk_cache: Arc<DiskImageCache>,
    http_client: reqwest::Client,
    max_decode_width: u32,
    max_decode_height: u32,
}

impl ResolveTask {
    async fn resolve(&self, id: &ImageId, request: &ImageRequest) -> CacheResult<LoadedImage> {
        if let Some(img) = self.memory_cache.get(id).await {
            return Ok(LoadedImage {
                id: id.clone(),
                image: img,
                source: ImageSource::MemoryCache,
            });
        }

        // Only remote resources are disk-cached; local files already live
        // on disk in their original form.
        if request.is_remote()
            && let Some(img) = self
                .disk_cache
                .get(id, self.max_decode_width, self.max_decode_height)
                .await
        {
            self.memory_cache.put(id.clone(), img.clone()).await;
            return Ok(LoadedImage {
                id: id.clone(),
                image: img,
                source: ImageSource::DiskCache,
            });
        }

        let (bytes, source) = match request {
            ImageRequest::File(path) => (fetch::read_file(path).await?, ImageSource::File),
            ImageRequest::Url(url) => {
                debug!(id = %id, url = %url, "Downloading image");
                let bytes = fetch::download(&self.http_client, url).await?;

                let disk_cache = self.disk_cache.clone();
                let id_for_disk = id.clone();
                let bytes_for_disk = bytes.clone();
                tokio::spawn(async move {
                    if let Err(e) = disk_cache.put_bytes(&id_for_disk, &bytes_for_disk).await {
                        warn!(id = %id_for_disk, error = %e, "Failed to cache to disk");
                    }
                });

                (bytes, ImageSource::Network)
            }
            ImageRequest::Bundled { bytes, .. } => (bytes.clone(), ImageSource::Bundled),
        };

        let decoded = fetch::decode(bytes, self.max_decode_width, self.max_decode_height).await?;
        let img = Arc::new(decoded);

        self.memory_cache.put(id.clone(), img.clone()).await;

        debug!(id = %id, source = %source, "Image resolved");

        Ok(LoadedImage {
            id: id.clone(),
            image: img,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deferred::SlotPoll;
    use crate::infrastructure::image::fetch::test_support::png_bytes;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn test_loader() -> (
        ImageLoader,
        mpsc::UnboundedReceiver<ImageLoadedEvent>,
        tempfile::TempDir,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let disk_cache = Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf(), 1024 * 1024)
                .await
                .unwrap(),
        );
        let loader = ImageLoader::new(ImageLoaderConfig::default(), &tx, disk_cache).unwrap();
        (loader, rx, temp_dir)
    }

    #[tokio::test]
    async fn test_loader_creation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let disk_cache = Arc::new(
            DiskImageCache::new(temp_dir.path().to_path_buf(), 1024 * 1024)
                .await
                .unwrap(),
        );

        let loader = ImageLoader::new(ImageLoaderConfig::default(), &tx, disk_cache);
        assert!(loader.is_ok());
    }

    #[tokio::test]
    async fn test_request_fulfills_slot() {
        let (loader, mut rx, _temp) = test_loader().await;

        let request = ImageRequest::bundled("tiny.png", png_bytes(3, 3));
        let slot = loader.request(request);

        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.result.is_ok());

        assert_eq!(slot.poll(), SlotPoll::Ready);
        let img = slot.take_ready().unwrap();
        assert_eq!((img.width(), img.height()), (3, 3));
    }

    #[tokio::test]
    async fn test_request_failure_fails_slot() {
        let (loader, mut rx, _temp) = test_loader().await;

        let request = ImageRequest::bundled("broken.bin", &b"not an image"[..]);
        let slot = loader.request(request);

        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.result.is_err());

        assert_eq!(slot.poll(), SlotPoll::Failed);
        assert!(slot.error().is_some());
    }

    #[tokio::test]
    async fn test_in_flight_dedupe_single_resolve() {
        let (loader, mut rx, _temp) = test_loader().await;

        let request = ImageRequest::bundled("shared.png", png_bytes(5, 5));
        let slot_a = loader.request(request.clone());
        let slot_b = loader.request(request);

        // Exactly one completion event for the shared locator.
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.result.is_ok());

        assert_eq!(slot_a.poll(), SlotPoll::Ready);
        assert_eq!(slot_b.poll(), SlotPoll::Ready);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file_request() {
        let (loader, _rx, _temp) = test_loader().await;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sample.png");
        std::fs::write(&path, png_bytes(4, 2)).unwrap();

        let request = ImageRequest::file(&path);
        let loaded = loader.load(&request).await.unwrap();
        assert_eq!(loaded.source, ImageSource::File);
        assert_eq!((loaded.image.width(), loaded.image.height()), (4, 2));
    }

    #[tokio::test]
    async fn test_load_hits_memory_cache_second_time() {
        let (loader, _rx, _temp) = test_loader().await;

        let request = ImageRequest::bundled("cached.png", png_bytes(2, 2));

        let first = loader.load(&request).await.unwrap();
        assert_eq!(first.source, ImageSource::Bundled);

        let second = loader.load(&request).await.unwrap();
        assert_eq!(second.source, ImageSource::MemoryCache);
    }

    #[tokio::test]
    async fn test_prefetch_emits_event() {
        let (loader, mut rx, _temp) = test_loader().await;

        loader.prefetch(ImageRequest::bundled("pre.png", png_bytes(2, 2)));

        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.result.is_ok());

        let stats = loader.memory_cache_stats();
        assert_eq!(stats.size, 1);
    }
}
