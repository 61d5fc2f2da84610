#![forbid(unsafe_code)]

//! PayNetLink Runtime
//!
//! Host-driven services that widgets are built on. Nothing here blocks or
//! spawns threads: the embedding host pushes input into the [`Document`],
//! advances the [`TimerQueue`], and flushes the [`RenderQueue`] after it
//! paints.
//!
//! # Key Components
//!
//! - [`Observable`] - Versioned value cell with change subscriptions
//! - [`TimerQueue`] - Deterministic, cancellable one-shot timers
//! - [`Debouncer`] / [`Debounced`] - Last-write-wins delayed propagation
//! - [`Document`] - Element tree, focus, global listeners, scroll lock
//! - [`RenderQueue`] - Deferred "after render" tasks
//! - [`HostContext`] - The bundle a widget is mounted into
//! - [`LocaleContext`] - Supported locales, message catalogs, persistence
//! - [`AppConfig`] - Environment-driven configuration
//! - [`KeyValueStore`] - Pluggable local/session storage

pub mod config;
pub mod debounce;
pub mod document;
pub mod host;
pub mod locale;
pub mod reactive;
pub mod render_queue;
pub mod storage;
pub mod timer;

pub use config::{AppConfig, ConfigError};
pub use debounce::{Debounced, Debouncer};
pub use document::{
    Document, DocumentEvent, ElementId, FOCUS_HISTORY_LIMIT, ListenerId, ListenerKind,
};
pub use host::HostContext;
pub use locale::{
    CatalogSource, DirectoryCatalogs, EmbeddedCatalogs, LOCALE_STORAGE_KEY, LocaleContext,
    LocaleError, LocaleOverride, MessageCatalog, SupportedLocale, detect_system_locale,
};
pub use reactive::{Observable, Subscription};
pub use render_queue::{AfterRender, RenderQueue};
#[cfg(feature = "state-persistence")]
pub use storage::FileStore;
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use timer::{TimerId, TimerQueue};
