#![forbid(unsafe_code)]

//! Locale context: supported locales, message catalogs, persistence.
//!
//! The [`LocaleContext`] owns the current locale and exposes scoped overrides
//! for widget subtrees. Locale changes are versioned so hosts can re-render
//! when the active locale changes. The chosen locale is persisted under
//! [`LOCALE_STORAGE_KEY`] and mirrored onto the document `lang` attribute.
//!
//! Initial locale resolution: stored preference, then the primary subtag of
//! the system/browser language, then [`SupportedLocale::DEFAULT`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::document::Document;
use crate::reactive::{Observable, Subscription};
use crate::storage::KeyValueStore;

/// Storage key for the persisted locale preference.
pub const LOCALE_STORAGE_KEY: &str = "paynetlink-locale";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from locale parsing and catalog loading.
#[derive(Debug)]
pub enum LocaleError {
    /// The code is not one of the supported locales.
    Unsupported(String),
    /// A catalog document is not valid JSON or not a JSON object.
    Parse {
        /// Where the document came from.
        origin: String,
        /// Parser message.
        message: String,
    },
    /// Reading a catalog file failed.
    Io(std::io::Error),
}

impl fmt::Display for LocaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocaleError::Unsupported(code) => write!(f, "unsupported locale: {code:?}"),
            LocaleError::Parse { origin, message } => {
                write!(f, "invalid catalog {origin}: {message}")
            }
            LocaleError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for LocaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocaleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LocaleError {
    fn from(e: std::io::Error) -> Self {
        LocaleError::Io(e)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Supported locales
// ─────────────────────────────────────────────────────────────────────────────

/// The locales the site ships messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SupportedLocale {
    /// Spanish.
    Es,
    /// English.
    En,
}

impl SupportedLocale {
    /// Locale used when nothing else applies.
    pub const DEFAULT: Self = Self::Es;
    /// Locale consulted for messages missing from the current one.
    pub const FALLBACK: Self = Self::Es;
    /// Every supported locale, in menu order.
    pub const ALL: [Self; 2] = [Self::Es, Self::En];

    /// Lowercase code (`"es"`, `"en"`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    /// Short menu label (`"ES"`, `"EN"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Es => "ES",
            Self::En => "EN",
        }
    }

    /// Parse an exact code.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "es" => Some(Self::Es),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Match the primary subtag of a language tag (`"en-US"`, `"es_MX.UTF-8"`).
    #[must_use]
    pub fn from_language_tag(tag: &str) -> Option<Self> {
        let normalized = normalize_locale_raw(tag)?;
        let primary = normalized.split('-').next()?;
        Self::parse(&primary.to_ascii_lowercase())
    }

    /// The other locale of the pair.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Es => Self::En,
            Self::En => Self::Es,
        }
    }
}

impl fmt::Display for SupportedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SupportedLocale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| LocaleError::Unsupported(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message catalogs
// ─────────────────────────────────────────────────────────────────────────────

/// Flat `dotted.key -> message` table for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    /// Build a catalog from JSON documents.
    ///
    /// Each document must be an object. Top-level keys of later documents
    /// replace those of earlier ones; nested objects flatten to dotted keys.
    pub fn from_json_documents<'a>(
        documents: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, LocaleError> {
        let mut merged = serde_json::Map::new();
        for (origin, text) in documents {
            let value: Value = serde_json::from_str(text).map_err(|e| LocaleError::Parse {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
            let Value::Object(object) = value else {
                return Err(LocaleError::Parse {
                    origin: origin.to_string(),
                    message: "top level must be an object".into(),
                });
            };
            merged.extend(object);
        }
        let mut messages = HashMap::new();
        flatten("", &Value::Object(merged), &mut messages);
        Ok(Self { messages })
    }

    /// Look up a message.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the catalog has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&join(key), child, out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten(&join(&idx.to_string()), child, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

/// Where message catalogs come from.
pub trait CatalogSource {
    /// Load the full catalog for `locale`.
    fn load(&self, locale: SupportedLocale) -> Result<MessageCatalog, LocaleError>;
}

/// Catalogs compiled into the binary from `locales/<code>/*.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalogs;

impl EmbeddedCatalogs {
    fn documents(locale: SupportedLocale) -> [(&'static str, &'static str); 2] {
        match locale {
            SupportedLocale::Es => [
                ("es/common.json", include_str!("../locales/es/common.json")),
                ("es/nav.json", include_str!("../locales/es/nav.json")),
            ],
            SupportedLocale::En => [
                ("en/common.json", include_str!("../locales/en/common.json")),
                ("en/nav.json", include_str!("../locales/en/nav.json")),
            ],
        }
    }
}

impl CatalogSource for EmbeddedCatalogs {
    fn load(&self, locale: SupportedLocale) -> Result<MessageCatalog, LocaleError> {
        MessageCatalog::from_json_documents(Self::documents(locale))
    }
}

/// Catalogs read at runtime from `<root>/<code>/*.json`, in file name order.
#[derive(Debug, Clone)]
pub struct DirectoryCatalogs {
    root: PathBuf,
}

impl DirectoryCatalogs {
    /// Read catalogs below `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for DirectoryCatalogs {
    fn load(&self, locale: SupportedLocale) -> Result<MessageCatalog, LocaleError> {
        let dir = self.root.join(locale.code());
        if !dir.is_dir() {
            return Ok(MessageCatalog::default());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path)?;
            documents.push((path.display().to_string(), text));
        }
        MessageCatalog::from_json_documents(
            documents.iter().map(|(o, t)| (o.as_str(), t.as_str())),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locale context
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime locale context with catalogs, persistence and scoped overrides.
///
/// Clones share state.
#[derive(Clone)]
pub struct LocaleContext {
    current: Observable<SupportedLocale>,
    overrides: Rc<RefCell<Vec<SupportedLocale>>>,
    catalogs: Rc<RefCell<HashMap<SupportedLocale, MessageCatalog>>>,
    source: Rc<dyn CatalogSource>,
    storage: Arc<dyn KeyValueStore>,
    document: Option<Document>,
    warn_missing: bool,
}

impl LocaleContext {
    /// Resolve the initial locale and load its catalog plus the fallback's.
    ///
    /// `system_language` is the browser/OS language tag, if known.
    #[must_use]
    pub fn new(
        source: impl CatalogSource + 'static,
        storage: Arc<dyn KeyValueStore>,
        system_language: Option<&str>,
    ) -> Self {
        let initial = initial_locale(storage.as_ref(), system_language);
        let ctx = Self {
            current: Observable::new(initial),
            overrides: Rc::new(RefCell::new(Vec::new())),
            catalogs: Rc::new(RefCell::new(HashMap::new())),
            source: Rc::new(source),
            storage,
            document: None,
            warn_missing: false,
        };
        ctx.ensure_catalog(SupportedLocale::FALLBACK);
        ctx.ensure_catalog(initial);
        tracing::debug!(locale = initial.code(), "locale initialized");
        ctx
    }

    /// Mirror the locale onto `document`'s `lang` attribute, starting now.
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        document.set_lang(self.base_locale().code());
        self.document = Some(document);
        self
    }

    /// Log a warning whenever a key is missing (development builds).
    #[must_use]
    pub fn with_missing_warnings(mut self, enabled: bool) -> Self {
        self.warn_missing = enabled;
        self
    }

    /// Get the active locale, honoring any scoped override.
    #[must_use]
    pub fn current_locale(&self) -> SupportedLocale {
        if let Some(locale) = self.overrides.borrow().last() {
            *locale
        } else {
            self.current.get()
        }
    }

    /// Get the base locale without considering overrides.
    #[must_use]
    pub fn base_locale(&self) -> SupportedLocale {
        self.current.get()
    }

    /// Every supported locale, for a language menu.
    #[must_use]
    pub fn options(&self) -> &'static [SupportedLocale] {
        &SupportedLocale::ALL
    }

    /// Switch the base locale. Returns `false` if it was already active.
    ///
    /// The preference is persisted and the catalog loaded before observers
    /// are notified. A storage failure is logged; the switch still happens.
    pub fn set_locale(&self, locale: SupportedLocale) -> bool {
        if locale == self.base_locale() {
            return false;
        }
        if let Err(err) = self.storage.set(LOCALE_STORAGE_KEY, locale.code()) {
            tracing::warn!(
                store = self.storage.name(),
                error = %err,
                "failed to persist locale preference"
            );
        }
        self.ensure_catalog(locale);
        self.current.set(locale);
        if let Some(document) = &self.document {
            document.set_lang(locale.code());
        }
        tracing::debug!(locale = locale.code(), "locale switched");
        true
    }

    /// Switch by code. Unsupported codes are rejected without side effects.
    pub fn set_locale_code(&self, code: &str) -> Result<bool, LocaleError> {
        let locale: SupportedLocale = code.parse()?;
        Ok(self.set_locale(locale))
    }

    /// Switch between `es` and `en`.
    pub fn toggle_locale(&self) -> SupportedLocale {
        let next = self.base_locale().toggled();
        self.set_locale(next);
        next
    }

    /// Look up `key` in the active locale, then the fallback. A miss returns
    /// the key itself.
    #[must_use]
    pub fn translate(&self, key: &str) -> String {
        let locale = self.current_locale();
        self.ensure_catalog(locale);
        let catalogs = self.catalogs.borrow();
        if let Some(msg) = catalogs.get(&locale).and_then(|c| c.get(key)) {
            return msg.to_string();
        }
        if let Some(msg) = catalogs
            .get(&SupportedLocale::FALLBACK)
            .and_then(|c| c.get(key))
        {
            if self.warn_missing && locale != SupportedLocale::FALLBACK {
                tracing::warn!(key, locale = locale.code(), "message falls back");
            }
            return msg.to_string();
        }
        if self.warn_missing {
            tracing::warn!(key, locale = locale.code(), "message missing");
        }
        key.to_string()
    }

    /// Subscribe to base locale changes.
    pub fn subscribe(&self, callback: impl Fn(&SupportedLocale) + 'static) -> Subscription {
        self.current.subscribe(callback)
    }

    /// Push a scoped locale override. Dropping the guard restores the prior locale.
    #[must_use = "dropping this guard clears the locale override"]
    pub fn push_override(&self, locale: SupportedLocale) -> LocaleOverride {
        self.ensure_catalog(locale);
        self.overrides.borrow_mut().push(locale);
        LocaleOverride {
            stack: Rc::clone(&self.overrides),
            locale,
        }
    }

    /// Current version counter for the base locale.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.version()
    }

    fn ensure_catalog(&self, locale: SupportedLocale) {
        if self.catalogs.borrow().contains_key(&locale) {
            return;
        }
        let catalog = match self.source.load(locale) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(locale = locale.code(), error = %err, "catalog failed to load");
                MessageCatalog::default()
            }
        };
        self.catalogs.borrow_mut().insert(locale, catalog);
    }
}

impl fmt::Debug for LocaleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleContext")
            .field("current", &self.current_locale())
            .field("base", &self.base_locale())
            .field("overrides", &self.overrides.borrow().len())
            .field("storage", &self.storage.name())
            .finish_non_exhaustive()
    }
}

/// RAII guard for scoped locale overrides.
#[must_use = "dropping this guard clears the locale override"]
pub struct LocaleOverride {
    stack: Rc<RefCell<Vec<SupportedLocale>>>,
    locale: SupportedLocale,
}

impl Drop for LocaleOverride {
    fn drop(&mut self) {
        let popped = self.stack.borrow_mut().pop();
        if let Some(popped) = popped {
            debug_assert_eq!(popped, self.locale);
        }
    }
}

fn initial_locale(storage: &dyn KeyValueStore, system_language: Option<&str>) -> SupportedLocale {
    let stored = match storage.get(LOCALE_STORAGE_KEY) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read locale preference");
            None
        }
    };
    stored
        .as_deref()
        .and_then(SupportedLocale::parse)
        .or_else(|| system_language.and_then(SupportedLocale::from_language_tag))
        .unwrap_or(SupportedLocale::DEFAULT)
}

/// Detect the system language tag from environment variables.
///
/// Preference order: `LC_ALL`, then `LANG`.
#[must_use]
pub fn detect_system_locale() -> Option<String> {
    let lc_all = env::var("LC_ALL").ok();
    let lang = env::var("LANG").ok();
    detect_system_locale_from(lc_all.as_deref(), lang.as_deref())
}

fn detect_system_locale_from(lc_all: Option<&str>, lang: Option<&str>) -> Option<String> {
    lc_all
        .and_then(normalize_locale_raw)
        .or_else(|| lang.and_then(normalize_locale_raw))
}

fn normalize_locale_raw(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw).trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("c") || raw.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(raw.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    // ---------------------------------------------------------------------
    // Invariants
    // ---------------------------------------------------------------------
    // 1. Normalized tags contain no '_' '.' or '@' suffixes.
    // 2. Overrides are LIFO and never mutate the base locale.
    // 3. Versions only advance on base locale changes.
    //
    // | Scenario                     | Expected Behavior                 |
    // |-----------------------------|-----------------------------------|
    // | Stored "fr"                 | Ignored, next source consulted    |
    // | "C"/"POSIX" system locale   | Treated as unknown                |
    // | Unknown key                 | Key returned verbatim             |

    fn ctx_with(stored: Option<&str>, system: Option<&str>) -> (LocaleContext, Arc<MemoryStore>) {
        let store = Arc::new(match stored {
            Some(code) => MemoryStore::with_entries([(LOCALE_STORAGE_KEY, code)]),
            None => MemoryStore::new(),
        });
        let ctx = LocaleContext::new(EmbeddedCatalogs, store.clone(), system);
        (ctx, store)
    }

    #[test]
    fn detect_system_locale_prefers_lc_all() {
        let locale = detect_system_locale_from(Some("fr_FR.UTF-8"), Some("en_US.UTF-8"));
        assert_eq!(locale.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn detect_system_locale_uses_lang_when_lc_all_missing() {
        let locale = detect_system_locale_from(None, Some("en_US.UTF-8"));
        assert_eq!(locale.as_deref(), Some("en-US"));
        assert_eq!(detect_system_locale_from(None, None), None);
    }

    #[test]
    fn normalize_strips_codeset_and_modifier() {
        assert_eq!(normalize_locale_raw("en_US.UTF-8@latin").as_deref(), Some("en-US"));
        assert_eq!(normalize_locale_raw("POSIX"), None);
    }

    #[test]
    fn language_tag_uses_primary_subtag() {
        assert_eq!(SupportedLocale::from_language_tag("en-US"), Some(SupportedLocale::En));
        assert_eq!(SupportedLocale::from_language_tag("ES_mx"), Some(SupportedLocale::Es));
        assert_eq!(SupportedLocale::from_language_tag("fr-FR"), None);
    }

    #[test]
    fn stored_preference_wins() {
        let (ctx, _) = ctx_with(Some("en"), Some("es-ES"));
        assert_eq!(ctx.current_locale(), SupportedLocale::En);
    }

    #[test]
    fn unsupported_stored_value_falls_through_to_system() {
        let (ctx, _) = ctx_with(Some("fr"), Some("en-GB"));
        assert_eq!(ctx.current_locale(), SupportedLocale::En);
    }

    #[test]
    fn defaults_to_spanish() {
        let (ctx, _) = ctx_with(None, Some("de-DE"));
        assert_eq!(ctx.current_locale(), SupportedLocale::Es);
        let (ctx, _) = ctx_with(None, None);
        assert_eq!(ctx.current_locale(), SupportedLocale::Es);
    }

    #[test]
    fn set_locale_persists_and_sets_lang() {
        let (ctx, store) = ctx_with(None, None);
        let document = Document::new();
        let ctx = ctx.with_document(document.clone());
        assert_eq!(document.lang(), "es");

        assert!(ctx.set_locale(SupportedLocale::En));
        assert_eq!(document.lang(), "en");
        assert_eq!(
            store.get(LOCALE_STORAGE_KEY).unwrap().as_deref(),
            Some("en")
        );
    }

    #[test]
    fn set_same_locale_is_noop() {
        let (ctx, store) = ctx_with(None, None);
        let v0 = ctx.version();
        assert!(!ctx.set_locale(SupportedLocale::Es));
        assert_eq!(ctx.version(), v0);
        assert_eq!(store.get(LOCALE_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn set_locale_code_rejects_unknown() {
        let (ctx, _) = ctx_with(None, None);
        let err = ctx.set_locale_code("fr").unwrap_err();
        assert!(matches!(err, LocaleError::Unsupported(ref c) if c == "fr"));
        assert_eq!(ctx.current_locale(), SupportedLocale::Es);
        assert!(ctx.set_locale_code("en").unwrap());
    }

    #[test]
    fn toggle_flips_between_pair() {
        let (ctx, _) = ctx_with(None, None);
        assert_eq!(ctx.toggle_locale(), SupportedLocale::En);
        assert_eq!(ctx.toggle_locale(), SupportedLocale::Es);
        assert_eq!(ctx.version(), 2);
    }

    #[test]
    fn translate_falls_back_then_returns_key() {
        let (ctx, _) = ctx_with(Some("en"), None);
        assert_eq!(ctx.translate("nav.search.placeholder"), "Search PayNetLink...");
        assert_eq!(ctx.translate("nav.contactSales"), "Contactar ventas");
        assert_eq!(ctx.translate("nav.unknown"), "nav.unknown");
    }

    #[test]
    fn subscribers_see_switches() {
        let (ctx, _) = ctx_with(None, None);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = ctx.subscribe({
            let seen = Rc::clone(&seen);
            move |l| seen.borrow_mut().push(*l)
        });
        ctx.set_locale(SupportedLocale::En);
        ctx.set_locale(SupportedLocale::En);
        assert_eq!(*seen.borrow(), vec![SupportedLocale::En]);
    }

    #[test]
    fn locale_override_is_scoped() {
        let (ctx, _) = ctx_with(None, None);
        let v0 = ctx.version();
        let guard = ctx.push_override(SupportedLocale::En);
        assert_eq!(ctx.current_locale(), SupportedLocale::En);
        assert_eq!(ctx.base_locale(), SupportedLocale::Es);
        assert_eq!(ctx.translate("common.close"), "Close");
        drop(guard);
        assert_eq!(ctx.current_locale(), SupportedLocale::Es);
        assert_eq!(ctx.version(), v0);
    }

    #[test]
    fn later_documents_replace_top_level_keys() {
        let catalog = MessageCatalog::from_json_documents([
            ("a.json", r#"{"nav": {"a": "1", "b": "2"}, "x": "keep"}"#),
            ("b.json", r#"{"nav": {"a": "3"}, "list": ["p", "q"], "n": 4}"#),
        ])
        .unwrap();
        assert_eq!(catalog.get("nav.a"), Some("3"));
        assert_eq!(catalog.get("nav.b"), None);
        assert_eq!(catalog.get("x"), Some("keep"));
        assert_eq!(catalog.get("list.1"), Some("q"));
        assert_eq!(catalog.get("n"), Some("4"));
    }

    #[test]
    fn non_object_document_is_rejected() {
        let err = MessageCatalog::from_json_documents([("bad.json", "[1, 2]")]).unwrap_err();
        assert!(matches!(err, LocaleError::Parse { .. }));
        let err = MessageCatalog::from_json_documents([("bad.json", "{")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid catalog bad.json"));
    }

    #[test]
    fn directory_catalogs_read_sorted_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let en = dir.path().join("en");
        std::fs::create_dir_all(&en).unwrap();
        std::fs::write(en.join("a.json"), r#"{"greet": "hi"}"#).unwrap();
        std::fs::write(en.join("b.json"), r#"{"greet": "hello"}"#).unwrap();
        std::fs::write(en.join("notes.txt"), "ignored").unwrap();

        let source = DirectoryCatalogs::new(dir.path());
        let catalog = source.load(SupportedLocale::En).unwrap();
        assert_eq!(catalog.get("greet"), Some("hello"));
        assert!(source.load(SupportedLocale::Es).unwrap().is_empty());
    }

    #[test]
    fn embedded_catalogs_parse() {
        for locale in SupportedLocale::ALL {
            let catalog = EmbeddedCatalogs.load(locale).unwrap();
            assert!(catalog.get("nav.search.placeholder").is_some());
        }
    }

    proptest! {
        #[test]
        fn normalize_locale_raw_sanitizes_segments(raw in "[A-Za-z0-9_@.\\-]{1,32}") {
            if let Some(locale) = normalize_locale_raw(&raw) {
                prop_assert!(!locale.trim().is_empty());
                prop_assert!(!locale.contains('@'));
                prop_assert!(!locale.contains('.'));
                prop_assert!(!locale.contains('_'));
            }
        }

        #[test]
        fn overrides_are_lifo(picks in proptest::collection::vec(any::<bool>(), 1..6)) {
            let (ctx, _) = ctx_with(None, None);
            let locales: Vec<SupportedLocale> = picks
                .iter()
                .map(|en| if *en { SupportedLocale::En } else { SupportedLocale::Es })
                .collect();
            let mut guards = Vec::new();
            for locale in &locales {
                guards.push(ctx.push_override(*locale));
            }
            prop_assert_eq!(ctx.current_locale(), locales[locales.len() - 1]);
            guards.pop();
            if locales.len() >= 2 {
                prop_assert_eq!(ctx.current_locale(), locales[locales.len() - 2]);
            } else {
                prop_assert_eq!(ctx.current_locale(), SupportedLocale::Es);
            }
            while guards.pop().is_some() {}
            prop_assert_eq!(ctx.current_locale(), SupportedLocale::Es);
        }
    }
}
