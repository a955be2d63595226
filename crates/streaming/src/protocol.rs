//! Wire types for the scatter backend.
//!
//! - `GET  /api/scatter/tasks`         → [`TasksPage`]
//! - `POST /api/scatter/filtered-ids`  → [`FilteredIdsResponse`]

use std::sync::Arc;

use foundation::PointId;
use scene::points::RawPoint;
use serde::{Deserialize, Serialize};

/// Backend project identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 1000;
/// The backend refuses larger pages.
pub const MAX_PAGE_SIZE: u32 = 5000;

/// One page as returned by the tasks endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksPage {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub tasks: Vec<RawPoint>,
}

impl TasksPage {
    /// More pages follow only if this one was full and the total reaches past it.
    pub fn has_more(&self) -> bool {
        self.tasks.len() as u64 == self.page_size as u64
            && (self.page as u64) * (self.page_size as u64) < self.total
    }
}

/// A page handed to loader subscribers.
///
/// `points` is shared with the accumulated snapshot; no copy is made.
#[derive(Debug, Clone)]
pub struct PagedFetchResult {
    pub points: Arc<[RawPoint]>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

impl PagedFetchResult {
    pub fn from_page(page: TasksPage) -> Self {
        let has_more = page.has_more();
        Self {
            points: page.tasks.into(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            has_more,
        }
    }
}

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub project: ProjectId,
    pub page: u32,
    pub page_size: u32,
    /// `(backend alias, data key)` pairs, e.g. `("class", "sentiment")`.
    pub fields: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new(
        project: ProjectId,
        page: u32,
        page_size: u32,
        settings: &scene::ScatterSettings,
    ) -> Self {
        Self {
            project,
            page,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            fields: settings
                .requested_fields()
                .into_iter()
                .map(|(alias, key)| (alias.to_string(), key.to_string()))
                .collect(),
        }
    }

    /// Query string pairs in backend order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.fields.len() + 3);
        out.push(("project".to_string(), self.project.to_string()));
        out.extend(self.fields.iter().cloned());
        out.push(("page".to_string(), self.page.to_string()));
        out.push(("page_size".to_string(), self.page_size.to_string()));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredIdsRequest {
    pub project: ProjectId,
    /// Opaque filter payload owned by the data manager.
    #[serde(default)]
    pub filters: serde_json::Value,
    #[serde(default)]
    pub ordering: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredIdsResponse {
    #[serde(default)]
    pub ids: Vec<PointId>,
}
