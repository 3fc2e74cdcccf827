//! Main application orchestrator.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, bail};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures_util::StreamExt;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::entities::ImageRequest;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::image::disk_cache::default_cache_dir;
use crate::infrastructure::image::{DiskImageCache, ImageLoadedEvent, ImageLoader, fetch, source};
use crate::presentation::widgets::{ImageView, ImageViewState, ProtocolSelector, StatusBar, Tint};

const REDRAW_TICK_RATE: Duration = Duration::from_millis(100);

/// One gallery slot: the request it came from and its render state.
struct GalleryEntry {
    request: ImageRequest,
    title: String,
    state: ImageViewState,
}

/// How requests are resolved.
enum ResolveBackend {
    /// Through the cache-tiered loader.
    Cached(Arc<ImageLoader>),
    /// Cacheless one-shot resolves.
    Direct(reqwest::Client),
}

/// The gallery viewer application.
pub struct App {
    entries: Vec<GalleryEntry>,
    current: usize,
    backend: ResolveBackend,
    selector: ProtocolSelector,
    event_rx: mpsc::UnboundedReceiver<ImageLoadedEvent>,
    // Held so the completion channel never closes in cacheless mode.
    _event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    show_status_bar: bool,
    should_quit: bool,
}

impl App {
    /// Builds the viewer and starts resolving every request.
    ///
    /// # Errors
    /// Returns error if no sources were given or the loader cannot be built.
    pub async fn new(config: &AppConfig, requests: Vec<ImageRequest>) -> Result<Self> {
        if requests.is_empty() {
            bail!("no image sources given");
        }

        let selector = ProtocolSelector::new(config.ui.protocol);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let backend = if config.no_cache {
            ResolveBackend::Direct(fetch::build_client(config.cache.timeout_secs)?)
        } else {
            let disk_cache = Arc::new(
                DiskImageCache::new(default_cache_dir(), config.cache.disk_max_bytes).await?,
            );
            let loader = ImageLoader::new(config.loader_config(), &event_tx, disk_cache)?;
            ResolveBackend::Cached(Arc::new(loader))
        };

        let entries = requests
            .into_iter()
            .map(|request| {
                let slot = Self::resolve_slot(&backend, request.clone());
                GalleryEntry {
                    title: request.display_name(),
                    request,
                    state: ImageViewState::new(slot),
                }
            })
            .collect();

        Ok(Self {
            entries,
            current: 0,
            backend,
            selector,
            event_rx,
            _event_tx: event_tx,
            show_status_bar: config.ui.show_status_bar,
            should_quit: false,
        })
    }

    fn resolve_slot(
        backend: &ResolveBackend,
        request: ImageRequest,
    ) -> crate::domain::deferred::ImageSlot {
        match backend {
            ResolveBackend::Cached(loader) => loader.request(request),
            ResolveBackend::Direct(client) => source::resolve(request, client),
        }
    }

    /// Runs the viewer until the user quits.
    ///
    /// # Errors
    /// Returns error if terminal drawing fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(REDRAW_TICK_RATE);

        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(&key);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => warn!(error = %e, "Terminal event error"),
                        None => self.should_quit = true,
                    }
                }
                loaded = self.event_rx.recv() => {
                    if let Some(event) = loaded {
                        debug!(id = %event.id, ok = event.result.is_ok(), "Resolve completed");
                    }
                }
                _ = tick.tick() => {}
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('n' | 'l') | KeyCode::Right => self.next(),
            KeyCode::Char('p' | 'h') | KeyCode::Left => self.previous(),
            KeyCode::Char('r') => self.reload_current(),
            _ => {}
        }
    }

    fn next(&mut self) {
        self.current = (self.current + 1) % self.entries.len();
    }

    fn previous(&mut self) {
        self.current = (self.current + self.entries.len() - 1) % self.entries.len();
    }

    /// Re-requests the current entry. The old protocol is released and a
    /// fresh slot starts pending.
    fn reload_current(&mut self) {
        let request = self.entries[self.current].request.clone();
        let slot = Self::resolve_slot(&self.backend, request);
        self.entries[self.current].state.reset(slot);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let status_height = u16::from(self.show_status_bar);
        let [header_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(status_height),
        ])
        .areas(frame.area());

        let position = self.current + 1;
        let total = self.entries.len();
        let entry = &mut self.entries[self.current];

        let header = Line::styled(
            format!(" {} ({position}/{total})", entry.title),
            Style::default().add_modifier(Modifier::BOLD),
        );
        frame.render_widget(header, header_area);

        let view = ImageView::new(self.selector.picker()).tint(Tint::opaque());
        frame.render_stateful_widget(view, body_area, &mut entry.state);

        if self.show_status_bar {
            let cache_stats = match &self.backend {
                ResolveBackend::Cached(loader) => Some(loader.memory_cache_stats()),
                ResolveBackend::Direct(_) => None,
            };
            let protocol = format!("{:?}", self.selector.protocol_type()).to_lowercase();
            let bar = StatusBar::new(entry.state.status().clone(), protocol)
                .native_size(entry.state.native_size())
                .cache(cache_stats);
            frame.render_widget(bar, status_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ProtocolMode;
    use crate::infrastructure::image::fetch::test_support::png_bytes;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.no_cache = true;
        config.ui.protocol = ProtocolMode::Halfblocks;
        config
    }

    fn test_requests(n: usize) -> Vec<ImageRequest> {
        (0..n)
            .map(|i| ImageRequest::bundled(format!("img-{i}.png"), png_bytes(2, 2)))
            .collect()
    }

    #[tokio::test]
    async fn test_rejects_empty_sources() {
        let result = App::new(&test_config(), Vec::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_navigation_wraps() {
        let mut app = App::new(&test_config(), test_requests(3)).await.unwrap();
        assert_eq!(app.current, 0);

        app.next();
        app.next();
        app.next();
        assert_eq!(app.current, 0);

        app.previous();
        assert_eq!(app.current, 2);
    }

    #[tokio::test]
    async fn test_reload_resets_entry_state() {
        let mut app = App::new(&test_config(), test_requests(1)).await.unwrap();

        app.reload_current();
        assert!(app.entries[0].state.status().is_pending());
        assert!(!app.entries[0].state.is_materialized());
    }

    #[tokio::test]
    async fn test_quit_key() {
        let mut app = App::new(&test_config(), test_requests(1)).await.unwrap();
        app.handle_key(&KeyEvent::from(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
