use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use foundation::math::Vec2;
use scene::{Modifiers, ScatterSettings, ViewportSize};
use serde_json::json;
use streaming::{
    DEFAULT_PAGE_SIZE, FilteredIdsRequest, HttpSourceConfig, HttpTaskSource, LoaderConfig,
    MemoryTaskSource, PointLoader, ProjectId, TaskSource,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{JsonFileSettingsStore, NoopEditor, ScatterSession, SessionConfig, SettingsStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scatter view probe: load, map, select and report")]
struct Args {
    /// Backend root URL (default: $SCATTER_BASE_URL or http://localhost:8080)
    #[arg(long)]
    base_url: Option<String>,

    /// API token sent as `Authorization: Token ...` (default: $SCATTER_API_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Settings file (default: $SCATTER_SETTINGS or scatter_settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a project's points and print bucket sizes and the fitted view
    Load {
        #[arg(long)]
        project: u64,

        /// Page size (default: $SCATTER_PAGE_SIZE or 1000)
        #[arg(long)]
        page_size: Option<u32>,

        /// Read task records from a JSON array instead of the backend
        #[arg(long)]
        file: Option<PathBuf>,

        /// World-space rectangle to select: minX,minY,maxX,maxY
        #[arg(long)]
        rect: Option<String>,

        /// Subtract the rectangle from the selection instead of adding
        #[arg(long, default_value_t = false)]
        subtract: bool,

        /// Filter payload (JSON) for the filtered bucket
        #[arg(long)]
        filters: Option<String>,

        #[arg(long, default_value_t = 800.0)]
        width: f64,

        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },

    /// Show a project's settings, or change its class field
    Settings {
        #[arg(long)]
        project: u64,

        #[arg(long)]
        class_field: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings_path = args.settings.unwrap_or_else(|| {
        PathBuf::from(
            env::var("SCATTER_SETTINGS").unwrap_or_else(|_| "scatter_settings.json".to_string()),
        )
    });
    let mut store = JsonFileSettingsStore::new(settings_path);

    match args.command {
        Command::Settings {
            project,
            class_field,
        } => {
            let project = ProjectId(project);
            let mut settings = store.load_or_default(project)?;
            if let Some(field) = class_field {
                settings = settings.with_class_field(field);
                store.save(project, &settings)?;
                info!(%project, class_field = %settings.class_field, "class field updated");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Load {
            project,
            page_size,
            file,
            rect,
            subtract,
            filters,
            width,
            height,
        } => {
            let source: Arc<dyn TaskSource> = match file {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)?;
                    Arc::new(MemoryTaskSource::from_json(&raw)?)
                }
                None => {
                    let base_url = args.base_url.unwrap_or_else(|| {
                        env::var("SCATTER_BASE_URL")
                            .unwrap_or_else(|_| "http://localhost:8080".to_string())
                    });
                    let api_token = args.token.or_else(|| env::var("SCATTER_API_TOKEN").ok());
                    Arc::new(HttpTaskSource::new(HttpSourceConfig { base_url, api_token }))
                }
            };
            let page_size = page_size
                .unwrap_or_else(|| env_var_u32("SCATTER_PAGE_SIZE", DEFAULT_PAGE_SIZE));
            let rect = rect.as_deref().map(parse_rect).transpose()?;
            let filters: Option<serde_json::Value> =
                filters.as_deref().map(serde_json::from_str).transpose()?;

            let project = ProjectId(project);
            let settings = store.load_or_default(project)?;
            let request = LoadRequest {
                project,
                settings,
                page_size,
                rect,
                subtract,
                filters,
                viewport: ViewportSize::new(width, height),
            };
            let report = run_load(source, request).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

struct LoadRequest {
    project: ProjectId,
    settings: ScatterSettings,
    page_size: u32,
    rect: Option<[f64; 4]>,
    subtract: bool,
    filters: Option<serde_json::Value>,
    viewport: ViewportSize,
}

async fn run_load(
    source: Arc<dyn TaskSource>,
    req: LoadRequest,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut loader = PointLoader::new(source, LoaderConfig { page_size: req.page_size });
    let mut pages = loader
        .load(Some(req.project), &req.settings)
        .ok_or("load did not start")?;
    while let Some(page) = pages.next_page().await {
        info!(page = page.page, points = page.points.len(), total = page.total, "page received");
    }
    loader.wait_idle().await;

    let status = loader.status();
    if let Some(err) = &status.last_error {
        warn!(error = %err, "load stopped early; reporting partial data");
    }

    let config = SessionConfig {
        viewport: req.viewport,
        ..SessionConfig::default()
    };
    let mut session = ScatterSession::new(req.settings, config, NoopEditor);
    session.sync(&loader);

    if let Some(filters) = req.filters {
        let ids = loader
            .fetch_filtered_ids(FilteredIdsRequest {
                project: req.project,
                filters,
                ordering: Vec::new(),
            })
            .await?;
        session.set_filtered_ids(ids);
    }

    if let Some([x0, y0, x1, y1]) = req.rect {
        let proj = session.projection();
        let start = proj.world_to_screen(Vec2::new(x0, y0));
        let end = proj.world_to_screen(Vec2::new(x1, y1));
        let release = if req.subtract {
            Modifiers::shift_alt()
        } else {
            Modifiers::shift()
        };
        session.drag_start(start, Modifiers::shift());
        let changed = session.drag_end(Some(end), release);
        info!(changed, subtract = req.subtract, "rectangle applied");
    }
    session.commit(0.0);

    let part = session.partition();
    Ok(json!({
        "project": req.project,
        "loaded": session.raw_len(),
        "valid": session.points().len(),
        "pages": status.pages_loaded,
        "total": status.total,
        "last_error": status.last_error,
        "view": session.view(),
        "selection_version": session.engine().selection_version(),
        "buckets": {
            "base": part.base.len(),
            "filtered": part.filtered.len(),
            "selected": part.selected.len(),
            "active": part.active.len(),
            "hovered": part.hovered.len(),
        },
    }))
}

fn parse_rect(raw: &str) -> Result<[f64; 4], String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid rect {raw:?}: {e}"))?;
    match parts.as_slice() {
        [a, b, c, d] if parts.iter().all(|v| v.is_finite()) => Ok([*a, *b, *c, *d]),
        _ => Err(format!("rect must be four finite numbers: minX,minY,maxX,maxY (got {raw:?})")),
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
