use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use log::{debug, error};

use crate::error::ViewerError;
use crate::loaders::load_model;
use crate::model::LoadedAsset;

/// Terminal result of one load request
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadedAsset),
    Failed(ViewerError),
}

impl From<crate::error::Result<LoadedAsset>> for LoadOutcome {
    fn from(result: crate::error::Result<LoadedAsset>) -> Self {
        match result {
            Ok(asset) => LoadOutcome::Loaded(asset),
            Err(e) => LoadOutcome::Failed(e),
        }
    }
}

/// Write end of a load request, handed to the asset source
pub struct LoadCompleter {
    url: String,
    sender: oneshot::Sender<LoadOutcome>,
}

impl LoadCompleter {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delivers the outcome; returns false if the request was already abandoned
    pub fn complete(self, outcome: LoadOutcome) -> bool {
        match self.sender.send(outcome) {
            Ok(()) => true,
            Err(_) => {
                debug!("Discarding load result for {}: request abandoned", self.url);
                false
            }
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.sender.is_canceled()
    }
}

/// Read end of a load request
///
/// Resolves exactly once. A source that drops its completer without answering
/// resolves as a fetch failure. Dropping the `PendingLoad` abandons the request.
pub struct PendingLoad {
    url: String,
    receiver: oneshot::Receiver<LoadOutcome>,
    resolved: bool,
}

impl PendingLoad {
    pub fn channel(url: &str) -> (LoadCompleter, PendingLoad) {
        let (sender, receiver) = oneshot::channel();
        (
            LoadCompleter {
                url: url.to_string(),
                sender,
            },
            PendingLoad {
                url: url.to_string(),
                receiver,
                resolved: false,
            },
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Non-blocking check; `Some` at most once
    pub fn try_resolve(&mut self) -> Option<LoadOutcome> {
        if self.resolved {
            return None;
        }

        let outcome = match self.receiver.try_recv() {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return None,
            Err(oneshot::Canceled) => self.dropped(),
        };

        self.resolved = true;
        Some(outcome)
    }

    fn dropped(&self) -> LoadOutcome {
        LoadOutcome::Failed(ViewerError::AssetFetch {
            url: self.url.clone(),
            reason: "loader dropped the request without a result".to_string(),
        })
    }
}

impl Future for PendingLoad {
    type Output = LoadOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<LoadOutcome> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(result) => {
                self.resolved = true;
                Poll::Ready(result.unwrap_or_else(|_| self.dropped()))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Something that can fetch and parse a model by URL
pub trait AssetSource {
    /// Begin fetching `url`; the completer must eventually be completed or dropped
    fn start(&self, url: &str, completer: LoadCompleter);
}

/// Callback run on the loader thread once a result has been delivered
pub type LoadWaker = Arc<dyn Fn() + Send + Sync>;

/// Loads glTF files from disk on a background thread
///
/// The optional waker lets a sleeping host event loop know it should poll.
#[derive(Default, Clone)]
pub struct GltfSource {
    waker: Option<LoadWaker>,
}

impl GltfSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_waker(waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            waker: Some(Arc::new(waker)),
        }
    }

    fn resolve_path(url: &str) -> &str {
        url.strip_prefix("file://").unwrap_or(url)
    }

    fn wake(waker: &Option<LoadWaker>) {
        if let Some(wake) = waker {
            wake();
        }
    }
}

impl AssetSource for GltfSource {
    fn start(&self, url: &str, completer: LoadCompleter) {
        let path = Self::resolve_path(url).to_string();
        let waker = self.waker.clone();

        // a failed spawn drops the completer, which resolves as a fetch failure
        let spawned = std::thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                if completer.is_abandoned() {
                    return;
                }
                if completer.complete(load_model(&path).into()) {
                    Self::wake(&waker);
                }
            });

        if let Err(e) = spawned {
            error!("Could not start loader thread for {}: {}", url, e);
            Self::wake(&self.waker);
        }
    }
}

/// Issues load requests against an asset source
pub struct AssetLoader {
    source: Box<dyn AssetSource>,
}

impl AssetLoader {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn gltf() -> Self {
        Self::new(GltfSource::new())
    }

    /// glTF loader that calls `waker` after each result is delivered
    pub fn gltf_with_waker(waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self::new(GltfSource::with_waker(waker))
    }

    pub fn load(&self, url: &str) -> PendingLoad {
        let (completer, pending) = PendingLoad::channel(url);
        self.source.start(url, completer);
        pending
    }
}
