//! Task sources feeding the point loader.
//!
//! New backends can be added by implementing [`TaskSource`]:
//! - [`HttpTaskSource`]: the scatter REST endpoints
//! - [`MemoryTaskSource`]: a fixed record list paged locally (files, tests)

use std::future::Future;
use std::pin::Pin;

use foundation::PointId;
use scene::points::RawPoint;
use tracing::debug;

use crate::error::LoadError;
use crate::protocol::{FilteredIdsRequest, FilteredIdsResponse, PageRequest, TasksPage};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for paged task providers.
///
/// Implementations must be `Send + Sync` so a load chain can run on a spawned task.
pub trait TaskSource: Send + Sync {
    fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<TasksPage, LoadError>>;

    fn fetch_filtered_ids(
        &self,
        req: FilteredIdsRequest,
    ) -> BoxFuture<'_, Result<Vec<PointId>, LoadError>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpSourceConfig {
    /// Server root, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Sent as `Authorization: Token <token>` when set.
    pub api_token: Option<String>,
}

pub struct HttpTaskSource {
    config: HttpSourceConfig,
    client: reqwest::Client,
}

impl HttpTaskSource {
    pub fn new(config: HttpSourceConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: HttpSourceConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => req.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
            None => req,
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, LoadError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| LoadError::transport("HTTP request failed", e))?;

        if !resp.status().is_success() {
            return Err(LoadError::Status {
                code: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| LoadError::Decode(e.to_string()))
    }
}

impl TaskSource for HttpTaskSource {
    fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<TasksPage, LoadError>> {
        Box::pin(async move {
            let url = self.url("/api/scatter/tasks");
            debug!(%url, page = req.page, "fetching scatter page");
            let builder = self.client.get(&url).query(&req.query_pairs());
            let mut page: TasksPage = self.send_json(builder, &url).await?;
            restore_data_keys(&mut page.tasks, &req.fields);
            Ok(page)
        })
    }

    fn fetch_filtered_ids(
        &self,
        req: FilteredIdsRequest,
    ) -> BoxFuture<'_, Result<Vec<PointId>, LoadError>> {
        Box::pin(async move {
            let url = self.url("/api/scatter/filtered-ids");
            let builder = self.client.post(&url).json(&req);
            let resp: FilteredIdsResponse = self.send_json(builder, &url).await?;
            Ok(resp.ids)
        })
    }
}

/// The backend answers under its parameter aliases (`class`, `text`, ...).
/// Mirror each value under the data key it was requested for so the mapper
/// can look attributes up by the configured key.
fn restore_data_keys(tasks: &mut [RawPoint], fields: &[(String, String)]) {
    for (alias, key) in fields {
        if alias == "x" || alias == "y" || alias == key {
            continue;
        }
        for task in tasks.iter_mut() {
            if task.fields.contains_key(key) {
                continue;
            }
            if let Some(v) = task.fields.get(alias).cloned() {
                task.fields.insert(key.clone(), v);
            }
        }
    }
}

/// Serves a fixed record list in backend-shaped pages.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskSource {
    tasks: Vec<RawPoint>,
    filtered: Vec<PointId>,
}

impl MemoryTaskSource {
    pub fn new(tasks: Vec<RawPoint>) -> Self {
        Self {
            tasks,
            filtered: Vec::new(),
        }
    }

    pub fn with_filtered_ids(mut self, ids: Vec<PointId>) -> Self {
        self.filtered = ids;
        self
    }

    /// Loads a JSON array of task records.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let tasks: Vec<RawPoint> =
            serde_json::from_str(json).map_err(|e| LoadError::Decode(e.to_string()))?;
        Ok(Self::new(tasks))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskSource for MemoryTaskSource {
    fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<TasksPage, LoadError>> {
        let size = req.page_size.max(1) as usize;
        let start = (req.page.max(1) as usize - 1).saturating_mul(size);
        let tasks = self
            .tasks
            .iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect();
        let page = TasksPage {
            total: self.tasks.len() as u64,
            page: req.page,
            page_size: req.page_size,
            tasks,
        };
        Box::pin(async move { Ok(page) })
    }

    fn fetch_filtered_ids(
        &self,
        _req: FilteredIdsRequest,
    ) -> BoxFuture<'_, Result<Vec<PointId>, LoadError>> {
        let ids = self.filtered.clone();
        Box::pin(async move { Ok(ids) })
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryTaskSource, TaskSource, restore_data_keys};
    use crate::protocol::{PageRequest, ProjectId};
    use scene::{RawPoint, ScatterSettings};
    use serde_json::json;

    #[test]
    fn restores_requested_data_keys() {
        let mut tasks = vec![RawPoint::new(1, 0.0, 0.0).with_field("class", "pos")];
        let fields = vec![
            ("x".to_string(), "emb_x".to_string()),
            ("class".to_string(), "sentiment".to_string()),
        ];
        restore_data_keys(&mut tasks, &fields);
        assert_eq!(tasks[0].field("sentiment"), Some(&json!("pos")));
        assert_eq!(tasks[0].field("class"), Some(&json!("pos")));
        assert!(tasks[0].field("emb_x").is_none());
    }

    #[tokio::test]
    async fn memory_source_pages_like_backend() {
        let tasks = (0..5).map(|i| RawPoint::new(i, 0.0, 0.0)).collect();
        let src = MemoryTaskSource::new(tasks);
        let settings = ScatterSettings::default();

        let p1 = src
            .fetch_page(PageRequest::new(ProjectId(1), 1, 2, &settings))
            .await
            .unwrap();
        assert_eq!(p1.tasks.len(), 2);
        assert!(p1.has_more());

        let p3 = src
            .fetch_page(PageRequest::new(ProjectId(1), 3, 2, &settings))
            .await
            .unwrap();
        assert_eq!(p3.tasks.len(), 1);
        assert_eq!(p3.total, 5);
        assert!(!p3.has_more());
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(MemoryTaskSource::from_json("{not json").is_err());
        let src = MemoryTaskSource::from_json(r#"[{"id":1,"x":1,"y":2}]"#).unwrap();
        assert_eq!(src.len(), 1);
    }
}
