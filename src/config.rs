use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Tab width used when nothing else is configured.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Editor settings derived from the effective flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    tab_width: usize,
}

impl Settings {
    pub fn from_flags(flags: &ConfigFlags) -> Self {
        let mut settings = Self::default();
        if let Some(width) = flags.tab_width {
            settings.set_tab_width(width);
        }
        settings
    }

    pub const fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Zero is ignored; the previous width stays.
    pub const fn set_tab_width(&mut self, tab_width: usize) {
        if tab_width > 0 {
            self.tab_width = tab_width;
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub tab_width: Option<usize>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            tab_width: other.tab_width.or(self.tab_width),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("tked").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("tked")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("tked").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("tked").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".tkedrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    let flags = parse_flag_tokens(&tokens);
    tracing::debug!(path = %path.display(), ?flags, "loaded config");
    Ok(flags)
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# tked defaults (saved with --save)".to_string()];
    if let Some(width) = flags.tab_width {
        lines.push(format!("--tab-width {width}"));
    }
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if let Some(log_file) = &flags.log_file {
        lines.push(format!("--log-file {}", log_file.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the flags this crate knows out of a token list, ignoring the rest.
///
/// Accepts both `--flag value` and `--flag=value`. A tab width that is not a
/// positive integer is dropped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--watch" {
            flags.watch = true;
        } else if token == "--tab-width" {
            if let Some(next) = tokens.get(i + 1) {
                flags.tab_width = parse_tab_width(next).or(flags.tab_width);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--tab-width=") {
            flags.tab_width = parse_tab_width(value).or(flags.tab_width);
        } else if token == "--log-file" {
            if let Some(next) = tokens.get(i + 1) {
                flags.log_file = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--log-file=") {
            flags.log_file = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}

fn parse_tab_width(s: &str) -> Option<usize> {
    s.parse().ok().filter(|&width| width > 0)
}
