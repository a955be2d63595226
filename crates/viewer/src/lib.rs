//! Host-facing scatter view: loading, mapping, interaction and layering in one session.

pub mod editor;
pub mod session;
pub mod settings;

pub use editor::{EditorBridge, NoopEditor};
pub use session::{ScatterSession, SessionConfig};
pub use settings::{JsonFileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore};
