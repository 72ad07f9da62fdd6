use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::event::{Emitter, Subscription};
use crate::host::ConfigStore;

/// Label shown when a buffer has no usable content.
pub const DEFAULT_TITLE: &str = "untitled";
/// Longest title, in characters, before truncation kicks in.
pub const DEFAULT_MAX_LENGTH: usize = 40;

/// The settings the title feature reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    DefaultTitle,
    MaximumTitleLength,
    SearchForFirstRow,
}

impl ConfigKey {
    pub const ALL: [Self; 3] = [
        Self::DefaultTitle,
        Self::MaximumTitleLength,
        Self::SearchForFirstRow,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DefaultTitle => "scratch-title.defaultTitle",
            Self::MaximumTitleLength => "scratch-title.maximumTitleLength",
            Self::SearchForFirstRow => "scratch-title.searchForFirstRow",
        }
    }

    /// Schema default for this key.
    pub fn default_value(self) -> ConfigValue {
        match self {
            Self::DefaultTitle => ConfigValue::Text(DEFAULT_TITLE.to_string()),
            Self::MaximumTitleLength => {
                ConfigValue::Integer(i64::try_from(DEFAULT_MAX_LENGTH).unwrap_or(i64::MAX))
            }
            Self::SearchForFirstRow => ConfigValue::Bool(false),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Snapshot of the title settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleConfig {
    /// Fallback label when no row yields a title.
    pub default_label: String,
    /// Maximum title length in characters; `None` disables truncation.
    pub max_length: Option<usize>,
    /// Look past a blank first row for the first non-blank one.
    pub scan_for_first_row: bool,
}

/// Config snapshot shared between the controller and every title closure.
pub type SharedConfig = Rc<RefCell<TitleConfig>>;

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            default_label: DEFAULT_TITLE.to_string(),
            max_length: Some(DEFAULT_MAX_LENGTH),
            scan_for_first_row: false,
        }
    }
}

impl TitleConfig {
    /// Read all three keys from `store`. Missing or malformed values fall
    /// back to an empty label, no truncation and no scanning.
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let mut config = Self {
            default_label: String::new(),
            max_length: None,
            scan_for_first_row: false,
        };
        for key in ConfigKey::ALL {
            config.apply(key, store.get(key).as_ref());
        }
        config
    }

    /// Update the field behind `key` from a store value.
    pub fn apply(&mut self, key: ConfigKey, value: Option<&ConfigValue>) {
        match key {
            ConfigKey::DefaultTitle => {
                self.default_label = match value {
                    Some(ConfigValue::Text(s)) => s.clone(),
                    None => String::new(),
                    Some(other) => {
                        tracing::warn!(%key, value = %other, "ignoring non-text default title");
                        String::new()
                    }
                };
            }
            ConfigKey::MaximumTitleLength => {
                self.max_length = match value {
                    Some(ConfigValue::Integer(n)) => usize::try_from(*n).ok().or_else(|| {
                        tracing::warn!(%key, value = n, "ignoring negative maximum title length");
                        None
                    }),
                    None => None,
                    Some(other) => {
                        tracing::warn!(%key, value = %other, "ignoring non-integer maximum title length");
                        None
                    }
                };
            }
            ConfigKey::SearchForFirstRow => {
                self.scan_for_first_row = match value {
                    Some(ConfigValue::Bool(b)) => *b,
                    None => false,
                    Some(other) => {
                        tracing::warn!(%key, value = %other, "ignoring non-boolean scan flag");
                        false
                    }
                };
            }
        }
    }

    pub fn shared(self) -> SharedConfig {
        Rc::new(RefCell::new(self))
    }
}

/// In-process [`ConfigStore`] with per-key change notification.
#[derive(Debug)]
pub struct MemoryConfigStore {
    values: RefCell<HashMap<ConfigKey, ConfigValue>>,
    emitters: HashMap<ConfigKey, Emitter<Option<ConfigValue>>>,
}

impl MemoryConfigStore {
    /// An empty store: every key reads as unset.
    pub fn new() -> Self {
        Self {
            values: RefCell::new(HashMap::new()),
            emitters: ConfigKey::ALL
                .into_iter()
                .map(|key| (key, Emitter::new()))
                .collect(),
        }
    }

    /// A store holding the schema defaults.
    pub fn with_defaults() -> Self {
        let store = Self::new();
        {
            let mut values = store.values.borrow_mut();
            for key in ConfigKey::ALL {
                values.insert(key, key.default_value());
            }
        }
        store
    }

    /// Set `key`, notifying subscribers when the value actually changes.
    pub fn set(&self, key: ConfigKey, value: ConfigValue) {
        let previous = self.values.borrow_mut().insert(key, value.clone());
        if previous.as_ref() != Some(&value) {
            tracing::debug!(%key, %value, "config changed");
            self.notify(key, Some(value));
        }
    }

    /// Remove `key`, notifying subscribers if it was set.
    pub fn unset(&self, key: ConfigKey) {
        let previous = self.values.borrow_mut().remove(&key);
        if previous.is_some() {
            tracing::debug!(%key, "config unset");
            self.notify(key, None);
        }
    }

    /// Write every setting present in `settings`.
    pub fn apply_settings(&self, settings: &TitleSettings) {
        if let Some(title) = &settings.default_title {
            self.set(ConfigKey::DefaultTitle, ConfigValue::Text(title.clone()));
        }
        if let Some(max) = settings.max_length {
            self.set(
                ConfigKey::MaximumTitleLength,
                ConfigValue::Integer(i64::try_from(max).unwrap_or(i64::MAX)),
            );
        }
        if let Some(scan) = settings.scan_first_row {
            self.set(ConfigKey::SearchForFirstRow, ConfigValue::Bool(scan));
        }
    }

    fn notify(&self, key: ConfigKey, value: Option<ConfigValue>) {
        if let Some(emitter) = self.emitters.get(&key) {
            emitter.emit(&value);
        }
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: ConfigKey) -> Option<ConfigValue> {
        self.values.borrow().get(&key).cloned()
    }

    fn on_did_change(
        &self,
        key: ConfigKey,
        callback: Box<dyn Fn(Option<&ConfigValue>)>,
    ) -> Subscription {
        self.emitters.get(&key).map_or_else(Subscription::empty, |emitter| {
            emitter.subscribe(move |value: &Option<ConfigValue>| callback(value.as_ref()))
        })
    }
}

/// Title settings as read from a settings file or the command line.
///
/// Each field is `None` when the source does not mention it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TitleSettings {
    pub default_title: Option<String>,
    pub max_length: Option<usize>,
    pub scan_first_row: Option<bool>,
}

impl TitleSettings {
    /// Merge two sources; `other` wins where both set a value.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            default_title: other
                .default_title
                .clone()
                .or_else(|| self.default_title.clone()),
            max_length: other.max_length.or(self.max_length),
            scan_first_row: other.scan_first_row.or(self.scan_first_row),
        }
    }

    /// Schema defaults overlaid with these settings.
    pub fn resolve(&self) -> TitleConfig {
        let defaults = TitleConfig::default();
        TitleConfig {
            default_label: self
                .default_title
                .clone()
                .unwrap_or(defaults.default_label),
            max_length: self.max_length.or(defaults.max_length),
            scan_for_first_row: self.scan_first_row.unwrap_or(defaults.scan_for_first_row),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("scratch-title").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("scratch-title")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("scratch-title").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("scratch-title")
                .join("config");
        }
    }

    PathBuf::from(".scratchtitlerc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".scratchtitlerc")
}

/// Load settings from `path`; a missing file yields empty settings.
///
/// One setting per line. The flag comes first and the rest of the line is
/// its value, so default titles may contain spaces. A value wrapped in
/// double quotes keeps its surrounding whitespace.
pub fn load_settings(path: &Path) -> Result<TitleSettings> {
    if !path.exists() {
        return Ok(TitleSettings::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| match line.split_once(char::is_whitespace) {
            Some((flag, value)) => vec![flag.to_string(), unquote_value(value.trim()).to_string()],
            None => vec![line.to_string()],
        })
        .collect::<Vec<_>>();
    Ok(parse_setting_tokens(&tokens))
}

pub fn save_settings(path: &Path, settings: &TitleSettings) -> Result<()> {
    let mut lines = vec!["# scratch-title defaults (saved with --save)".to_string()];
    if let Some(title) = &settings.default_title {
        lines.push(format!("--default-title {}", quote_value(title)));
    }
    if let Some(max) = settings.max_length {
        lines.push(format!("--max-length {max}"));
    }
    match settings.scan_first_row {
        Some(true) => lines.push("--scan-first-row".to_string()),
        Some(false) => lines.push("--no-scan-first-row".to_string()),
        None => {}
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create settings dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write settings {}", path.display()))
}

/// Quote `value` when loading would otherwise trim or drop part of it.
fn quote_value(value: &str) -> String {
    if value.is_empty() || value.trim() != value || value.starts_with('"') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

fn unquote_value(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

pub fn clear_settings(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract title settings from a token stream; unknown tokens are skipped.
pub fn parse_setting_tokens(tokens: &[String]) -> TitleSettings {
    let mut settings = TitleSettings::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--scan-first-row" {
            settings.scan_first_row = Some(true);
        } else if token == "--no-scan-first-row" {
            settings.scan_first_row = Some(false);
        } else if token == "--default-title" {
            if let Some(next) = tokens.get(i + 1) {
                settings.default_title = Some(next.clone());
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--default-title=") {
            settings.default_title = Some(value.to_string());
        } else if token == "--max-length" {
            if let Some(next) = tokens.get(i + 1) {
                settings.max_length = parse_max_length(next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--max-length=") {
            settings.max_length = parse_max_length(value);
        }
        i += 1;
    }
    settings
}

fn parse_max_length(s: &str) -> Option<usize> {
    let parsed = s.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(value = s, "ignoring invalid --max-length");
    }
    parsed
}
