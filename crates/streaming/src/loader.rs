//! Progressive, cancellable point loading.
//!
//! A load chain fetches pages sequentially and publishes a fresh accumulated
//! snapshot after each one, so rendering can start long before the last page.
//! At most one chain runs per loader: starting another (or reloading, or
//! dropping the loader) aborts the in-flight request and bumps the generation
//! so a late response can never land in the new dataset.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use foundation::{Generation, PointId};
use futures_util::Stream;
use futures_util::future::{AbortHandle, Abortable};
use parking_lot::RwLock;
use scene::ScatterSettings;
use scene::points::RawPoint;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::error::LoadError;
use crate::protocol::{
    DEFAULT_PAGE_SIZE, FilteredIdsRequest, PageRequest, PagedFetchResult, ProjectId,
};
use crate::source::TaskSource;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub page_size: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Immutable view of every record loaded so far.
///
/// Pages are shared, never copied: publishing a new page builds a new
/// snapshot that reuses the previous page buffers.
#[derive(Debug, Clone, Default)]
pub struct Accumulated {
    pages: Vec<Arc<[RawPoint]>>,
    len: usize,
}

impl Accumulated {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawPoint> + '_ {
        self.pages.iter().flat_map(|p| p.iter())
    }

    /// Pages appended after `earlier`, or `None` if `earlier` is not a prefix
    /// of this snapshot (a different load, or a restart).
    pub fn pages_since<'a>(&'a self, earlier: &Accumulated) -> Option<&'a [Arc<[RawPoint]>]> {
        if earlier.pages.len() > self.pages.len() {
            return None;
        }
        let shared = self
            .pages
            .iter()
            .zip(&earlier.pages)
            .all(|(a, b)| Arc::ptr_eq(a, b));
        shared.then(|| &self.pages[earlier.pages.len()..])
    }

    fn with_page(&self, page: Arc<[RawPoint]>) -> Self {
        let mut pages = Vec::with_capacity(self.pages.len() + 1);
        pages.extend(self.pages.iter().cloned());
        let len = self.len + page.len();
        pages.push(page);
        Self { pages, len }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderStatus {
    pub loading: bool,
    pub generation: Generation,
    pub project: Option<ProjectId>,
    pub pages_loaded: u32,
    pub total: Option<u64>,
    pub has_more: bool,
    /// Last non-cancellation failure of the current chain.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct LoaderState {
    status: LoaderStatus,
    points: Arc<Accumulated>,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<LoaderState>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(LoaderState::default()),
            revision,
        }
    }

    fn publish(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    /// Starts a new chain: resets the dataset and returns the chain's generation.
    fn begin(&self, project: ProjectId) -> Generation {
        let generation = {
            let mut st = self.state.write();
            let generation = st.status.generation.next();
            st.status = LoaderStatus {
                loading: true,
                generation,
                project: Some(project),
                ..LoaderStatus::default()
            };
            st.points = Arc::new(Accumulated::default());
            generation
        };
        self.publish();
        generation
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.state.read().status.generation == generation
    }

    /// Appends a page if `generation` is still current. Returns `false` for stale pages.
    fn apply_page(&self, generation: Generation, page: &PagedFetchResult) -> bool {
        {
            let mut st = self.state.write();
            if st.status.generation != generation {
                return false;
            }
            st.points = Arc::new(st.points.with_page(page.points.clone()));
            st.status.pages_loaded += 1;
            st.status.total = Some(page.total);
            st.status.has_more = page.has_more;
        }
        self.publish();
        true
    }

    fn finish(&self, generation: Generation, error: Option<String>) {
        {
            let mut st = self.state.write();
            if st.status.generation != generation {
                return;
            }
            st.status.loading = false;
            if error.is_some() {
                st.status.last_error = error;
            }
        }
        self.publish();
    }

    /// Invalidates the running chain without resetting loaded data.
    fn cancel(&self) {
        {
            let mut st = self.state.write();
            st.status.generation = st.status.generation.next();
            st.status.loading = false;
        }
        self.publish();
    }
}

/// Pages of one chain, in order. Ends when the chain completes, fails or is cancelled.
#[derive(Debug)]
pub struct PageStream {
    rx: mpsc::UnboundedReceiver<PagedFetchResult>,
}

impl PageStream {
    pub async fn next_page(&mut self) -> Option<PagedFetchResult> {
        self.rx.recv().await
    }
}

impl Stream for PageStream {
    type Item = PagedFetchResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

pub struct PointLoader {
    source: Arc<dyn TaskSource>,
    config: LoaderConfig,
    shared: Arc<Shared>,
    chain: Option<AbortHandle>,
    last_request: Option<(ProjectId, ScatterSettings)>,
}

impl PointLoader {
    pub fn new(source: Arc<dyn TaskSource>, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            shared: Arc::new(Shared::new()),
            chain: None,
            last_request: None,
        }
    }

    pub fn status(&self) -> LoaderStatus {
        self.shared.state.read().status.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.read().status.loading
    }

    /// Current accumulated snapshot. Later pages never mutate it.
    pub fn points(&self) -> Arc<Accumulated> {
        self.shared.state.read().points.clone()
    }

    /// Snapshot plus whether more pages may still arrive, read together.
    pub fn snapshot(&self) -> (Arc<Accumulated>, bool) {
        let state = self.shared.state.read();
        (state.points.clone(), state.status.loading)
    }

    /// Receiver that changes whenever status or points are republished.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Starts loading `project`, cancelling any running chain first.
    ///
    /// Without a project nothing happens and no request is issued. Must be
    /// called from within a Tokio runtime.
    pub fn load(
        &mut self,
        project: Option<ProjectId>,
        settings: &ScatterSettings,
    ) -> Option<PageStream> {
        let Some(project) = project else {
            debug!("no project selected; scatter load skipped");
            return None;
        };
        self.abort_chain();

        let generation = self.shared.begin(project);
        self.last_request = Some((project, settings.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        let (handle, registration) = AbortHandle::new_pair();
        let chain = run_chain(
            self.source.clone(),
            self.shared.clone(),
            generation,
            project,
            settings.clone(),
            self.config.page_size,
            tx,
        );
        tokio::spawn(Abortable::new(chain, registration));
        self.chain = Some(handle);

        info!(%project, generation = generation.0, "scatter load started");
        Some(PageStream { rx })
    }

    /// Restarts the last load from page 1.
    pub fn reload(&mut self) -> Option<PageStream> {
        let (project, settings) = self.last_request.clone()?;
        self.load(Some(project), &settings)
    }

    /// Aborts the running chain, keeping whatever was loaded.
    pub fn cancel(&mut self) {
        if self.abort_chain() {
            self.shared.cancel();
        }
    }

    pub async fn fetch_filtered_ids(
        &self,
        req: FilteredIdsRequest,
    ) -> Result<Vec<PointId>, LoadError> {
        let project = req.project;
        let result = self.source.fetch_filtered_ids(req).await;
        match &result {
            Err(err) if !err.is_cancelled() => {
                error!(%project, error = %err, "filtered ids request failed");
            }
            _ => {}
        }
        result
    }

    /// Resolves once `pred` holds for the published status.
    pub async fn wait_until(&self, pred: impl Fn(&LoaderStatus) -> bool) {
        let mut rx = self.subscribe();
        loop {
            if pred(&self.shared.state.read().status) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub async fn wait_idle(&self) {
        self.wait_until(|s| !s.loading).await
    }

    fn abort_chain(&mut self) -> bool {
        match self.chain.take() {
            Some(handle) => {
                handle.abort();
                debug!("previous scatter load chain aborted");
                true
            }
            None => false,
        }
    }
}

impl Drop for PointLoader {
    fn drop(&mut self) {
        self.abort_chain();
    }
}

async fn run_chain(
    source: Arc<dyn TaskSource>,
    shared: Arc<Shared>,
    generation: Generation,
    project: ProjectId,
    settings: ScatterSettings,
    page_size: u32,
    tx: mpsc::UnboundedSender<PagedFetchResult>,
) {
    let mut page = 1u32;
    loop {
        if !shared.is_current(generation) {
            debug!(generation = generation.0, "chain superseded before page {page}");
            return;
        }

        let req = PageRequest::new(project, page, page_size, &settings);
        match source.fetch_page(req).await {
            Ok(p) => {
                let result = PagedFetchResult::from_page(p);
                if !shared.apply_page(generation, &result) {
                    debug!(generation = generation.0, page, "stale page dropped");
                    return;
                }
                let has_more = result.has_more;
                let total = result.total;
                // Nobody listening is fine; the snapshot already has the page.
                let _ = tx.send(result);
                if !has_more {
                    shared.finish(generation, None);
                    info!(%project, pages = page, total, "scatter load complete");
                    return;
                }
                page += 1;
            }
            Err(err) if err.is_cancelled() => {
                debug!(%project, page, "scatter page request cancelled");
                shared.finish(generation, None);
                return;
            }
            Err(err) => {
                error!(
                    %project,
                    page,
                    error = %err,
                    "scatter page fetch failed; keeping partial data"
                );
                shared.finish(generation, Some(err.to_string()));
                return;
            }
        }
    }
}
