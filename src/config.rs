use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result};
use toml::Value;
use log::{debug, info, warn};
use crate::data::merger::AliasMap;
use crate::display::{ColourConfig, ColourPalette, ColourTheme, PALETTE_ROLES};
use crate::settings::{ConfigError, ScoringConfig};

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Sections of the scoring configuration, as written in the file
pub const SCORING_SECTIONS: &[&str] = &[
    "weights",
    "commit-quality",
    "contribution",
    "tech-breadth",
    "collaboration",
    "code-review",
    "work-pattern",
    "progress",
    "exclusions",
    "grading",
];

/// List values in this section extend the built-in defaults instead of replacing them
const EXCLUSIONS_SECTION: &str = "exclusions";
const ALIASES_SECTION: &str = "aliases";
const COLOURS_SECTION: &str = "colours";

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
    selected_section: Option<String>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
            selected_section: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::from_config(Configuration::new()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        debug!("Loading configuration from file: {}", path.display());

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
            selected_section: None,
        })
    }

    pub fn config_file_path(&self) -> Option<&PathBuf> {
        self.config_file_path.as_ref()
    }

    /// Get value from configuration with section fallback
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        // Priority: selected_section -> specified section -> base
        if let Some(selected) = &self.selected_section {
            if let Some(value) = self.config.get(selected).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }

        if let Some(value) = self.config.get(section).and_then(|s| s.get(key)) {
            return Some(value);
        }

        self.config.get("base").and_then(|s| s.get(key))
    }

    /// Scoring values never fall back to `[base]`; a selected profile
    /// overrides them through its own `[<profile>.<section>]` table.
    fn get_scoring_value(&self, section: &str, key: &str) -> Option<&String> {
        if let Some(selected) = &self.selected_section {
            let profile = format!("{}.{}", selected, section);
            if let Some(value) = self.config.get(&profile).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }
        self.config.get(section).and_then(|s| s.get(key))
    }

    /// Select configuration section for --config-name
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.selected_section = Some(section);
    }

    /// Get boolean value with type conversion
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!("Invalid boolean value for {}.{}: {}", section, key, value)),
            },
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Scoring configuration: file values overlaid on the calibrated defaults,
    /// then validated. Any bad value is fatal.
    pub fn get_scoring_config(&self) -> Result<ScoringConfig> {
        let defaults = Value::try_from(ScoringConfig::default())
            .context("Failed to serialize default scoring configuration")?;
        let Value::Table(mut table) = defaults else {
            return Err(anyhow::anyhow!("Default scoring configuration is not a table"));
        };

        for section in SCORING_SECTIONS {
            let Some(Value::Table(defaults)) = table.get_mut(*section) else {
                continue;
            };
            for (key, default) in defaults.iter_mut() {
                if let Some(raw) = self.get_scoring_value(section, key) {
                    debug!("Config override {}.{} = {}", section, key, raw);
                    let value = coerce_like(default, raw).ok_or_else(|| ConfigError::InvalidValue {
                        section: section.to_string(),
                        key: key.clone(),
                        value: raw.clone(),
                    })?;
                    match (default, value) {
                        (Value::Array(builtin), Value::Array(extra)) if *section == EXCLUSIONS_SECTION => {
                            for item in extra {
                                if !builtin.contains(&item) {
                                    builtin.push(item);
                                }
                            }
                        }
                        (default, value) => *default = value,
                    }
                }
            }
            self.warn_unknown_keys(section, defaults);
        }

        let config: ScoringConfig = Value::Table(table)
            .try_into()
            .context("Failed to build scoring configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn warn_unknown_keys(&self, section: &str, known: &toml::Table) {
        if let Some(values) = self.config.get(section) {
            for key in values.keys().filter(|k| !known.contains_key(*k)) {
                warn!("Ignoring unknown configuration key {}.{}", section, key);
            }
        }
    }

    /// Identity aliases from the `[aliases]` section (old email = canonical email)
    pub fn get_aliases(&self) -> AliasMap {
        self.config
            .get(ALIASES_SECTION)
            .map(|aliases| aliases.iter().collect())
            .unwrap_or_default()
    }

    /// Colour settings from the `[colours]` section
    pub fn get_colour_config(&self) -> Result<ColourConfig> {
        let mut colour_config = ColourConfig::default();

        if let Some(enabled) = self.get_bool(COLOURS_SECTION, "enabled")? {
            colour_config.set_enabled(enabled);
        }
        if let Some(respect) = self.get_bool(COLOURS_SECTION, "respect-no-color")? {
            colour_config.set_respect_no_color(respect);
        }
        if let Some(theme) = self.get_value(COLOURS_SECTION, "theme") {
            let theme = theme.parse::<ColourTheme>().map_err(|e| anyhow::anyhow!(e))?;
            colour_config.set_theme(theme);
        }
        for role in PALETTE_ROLES {
            if let Some(name) = self.get_value(COLOURS_SECTION, role) {
                let color = ColourPalette::parse_color(name)
                    .ok_or_else(|| anyhow::anyhow!("Invalid colour for colours.{}: {}", role, name))?;
                colour_config.set_role_colour(role, color);
            }
        }

        Ok(colour_config)
    }

    /// Complete configuration: `[base]` as loaded, every scoring section with
    /// its effective values, and the alias table.
    pub fn export_complete_config(&self) -> Result<String> {
        let scoring = self.get_scoring_config()?;
        let mut document = toml::Table::new();

        if let Some(base) = self.config.get("base") {
            let base: toml::Table = base
                .iter()
                .map(|(k, v)| (k.clone(), infer_value(v)))
                .collect();
            document.insert("base".to_string(), Value::Table(base));
        }

        if let Value::Table(sections) = Value::try_from(&scoring)? {
            for (section, values) in sections {
                document.insert(section, values);
            }
        }

        if let Some(colours) = self.config.get(COLOURS_SECTION) {
            let colours: toml::Table = colours
                .iter()
                .map(|(k, v)| (k.clone(), infer_value(v)))
                .collect();
            document.insert(COLOURS_SECTION.to_string(), Value::Table(colours));
        }

        let aliases = self.get_aliases();
        if !aliases.is_empty() {
            let table: toml::Table = aliases
                .iter()
                .map(|(alias, canonical)| (alias.clone(), Value::String(canonical.clone())))
                .collect();
            document.insert(ALIASES_SECTION.to_string(), Value::Table(table));
        }

        let mut content = String::from("# devscore configuration\n\n");
        content.push_str(&toml::to_string_pretty(&document).context("Failed to render configuration")?);
        Ok(content)
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Environment variable $DEVSCORE_CONFIG
    if let Ok(env_path) = env::var("DEVSCORE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("devscore").join("config.toml"));
    }

    // 3. Home directory
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".devscore.toml"));
    }

    // 4. Project local
    paths.push(PathBuf::from("./.devscore.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let table: toml::Table = toml::from_str(content)
        .context("Failed to parse TOML content")?;

    let mut config = Configuration::new();
    flatten_toml_table(&table, String::new(), &mut config);

    debug!("Parsed configuration: {:?}", config);
    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) => {
                let (leaves, nested): (Vec<_>, Vec<_>) =
                    subtable.iter().partition(|(_, v)| !matches!(v, Value::Table(_)));

                if !leaves.is_empty() || nested.is_empty() {
                    let section = config.entry(section_name.clone()).or_default();
                    for (subkey, subvalue) in leaves {
                        section.insert(subkey.clone(), toml_value_to_string(subvalue));
                    }
                }
                if !nested.is_empty() {
                    let nested: toml::Table = nested
                        .into_iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    flatten_toml_table(&nested, section_name, config);
                }
            }
            _ => {
                // Top-level keys outside any table belong to [base]
                config
                    .entry("base".to_string())
                    .or_default()
                    .insert(key.clone(), toml_value_to_string(value));
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => {
            // For complex types, use TOML representation
            value.to_string()
        }
    }
}

/// Parse a flattened string back into the TOML type of `template`.
/// Lists accept TOML array syntax or a comma-separated string.
fn coerce_like(template: &Value, raw: &str) -> Option<Value> {
    let raw = raw.trim();
    match template {
        Value::Float(_) => raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float),
        Value::Integer(_) => raw.parse::<i64>().ok().filter(|i| *i >= 0).map(Value::Integer),
        Value::Boolean(_) => match raw.to_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        Value::String(_) => Some(Value::String(raw.to_string())),
        Value::Array(_) if raw.starts_with('[') => match parse_inline_value(raw)? {
            Value::Array(items) if items.iter().all(|i| matches!(i, Value::String(_))) => Some(Value::Array(items)),
            _ => None,
        },
        Value::Array(_) => Some(Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        _ => None,
    }
}

fn parse_inline_value(raw: &str) -> Option<Value> {
    toml::from_str::<toml::Table>(&format!("value = {}", raw))
        .ok()
        .and_then(|mut table| table.remove("value"))
}

/// Best-effort typed value for export; falls back to a string
fn infer_value(raw: &str) -> Value {
    parse_inline_value(raw).unwrap_or_else(|| Value::String(raw.to_string()))
}
