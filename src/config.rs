use std::env;
use std::fs;
use std::path::PathBuf;
use cross_xdg::BaseDirs;

pub const DEFAULT_MEMORY_SIZE: usize = 256;
pub const DEFAULT_MAX_LOOP_DEPTH: usize = 2500;

/// Interpreter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Tape length in cells. Values below 1 are raised to 1 when a run starts;
    /// values above [`crate::MAX_MEMORY_SIZE`] fail the run.
    pub memory_size: usize,
    /// Maximum loop nesting depth; `None` disables the guard.
    pub max_loop_depth: Option<usize>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            max_loop_depth: Some(DEFAULT_MAX_LOOP_DEPTH),
        }
    }
}

impl InterpreterConfig {
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_max_loop_depth(mut self, max_loop_depth: Option<usize>) -> Self {
        self.max_loop_depth = max_loop_depth;
        self
    }

    /// Resolve settings: flags -> env -> `buffalo.toml` -> defaults.
    pub fn resolve(memory_size: Option<usize>, max_loop_depth: Option<usize>) -> Self {
        let base = load_from_toml().unwrap_or_default();
        let base = apply_env(base, |key| env::var(key).ok());

        let mut cfg = base;
        if let Some(n) = memory_size {
            cfg.memory_size = n;
        }
        if let Some(n) = max_loop_depth {
            cfg.max_loop_depth = depth_from(n);
        }
        cfg
    }
}

pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Wall-clock and step limits applied by the command-line runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    pub timeout_ms: u64,
    pub max_steps: Option<usize>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self { timeout_ms: DEFAULT_TIMEOUT_MS, max_steps: None }
    }
}

impl RunLimits {
    /// Resolve limits: flags -> env (`BUFFALO_TIMEOUT_MS`, `BUFFALO_MAX_STEPS`) -> defaults
    pub fn resolve(timeout_ms: Option<u64>, max_steps: Option<usize>) -> Self {
        Self::resolve_with(timeout_ms, max_steps, |key| env::var(key).ok())
    }

    fn resolve_with<F>(timeout_ms: Option<u64>, max_steps: Option<usize>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_ms = timeout_ms
            .or_else(|| lookup("BUFFALO_TIMEOUT_MS").and_then(|s| s.trim().parse::<u64>().ok()))
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let max_steps = max_steps
            .or_else(|| lookup("BUFFALO_MAX_STEPS").and_then(|s| s.trim().parse::<usize>().ok()));
        Self { timeout_ms, max_steps }
    }
}

// 0 means "no limit" wherever a depth is given as a number.
fn depth_from(n: usize) -> Option<usize> {
    if n == 0 { None } else { Some(n) }
}

fn parse_depth(value: &str) -> Option<Option<usize>> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    v.parse::<usize>().ok().map(depth_from)
}

fn apply_env<F>(mut cfg: InterpreterConfig, lookup: F) -> InterpreterConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(n) = lookup("BUFFALO_MEMORY_SIZE").and_then(|s| s.trim().parse::<usize>().ok()) {
        cfg.memory_size = n;
    }
    if let Some(depth) = lookup("BUFFALO_MAX_LOOP_DEPTH").and_then(|s| parse_depth(&s)) {
        cfg.max_loop_depth = depth;
    }
    cfg
}

fn config_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new().into_iter().next()?;

    // ~/.config/buffalo.toml on every platform cross-xdg supports
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("buffalo.toml");
    Some(path)
}

fn load_from_toml() -> Option<InterpreterConfig> {
    let content = fs::read_to_string(config_path()?).ok()?;
    Some(parse_config(&content))
}

/// Parse the `[interpreter]` section of a `buffalo.toml` document.
///
/// Only `key = value` lines are understood; unknown keys, other sections, and
/// malformed values are ignored and leave the default in place.
pub fn parse_config(content: &str) -> InterpreterConfig {
    let mut cfg = InterpreterConfig::default();
    let mut in_section = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            in_section = &line[1..line.len() - 1] == "interpreter";
            continue;
        }
        if !in_section { continue; }

        let Some((key, raw)) = line.split_once('=') else { continue };
        let raw = raw.trim();
        let value = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            &raw[1..raw.len() - 1]
        } else {
            raw
        };

        match key.trim() {
            "memory_size" => {
                if let Ok(n) = value.parse::<usize>() {
                    cfg.memory_size = n;
                }
            }
            "max_loop_depth" => {
                if let Some(depth) = parse_depth(value) {
                    cfg.max_loop_depth = depth;
                }
            }
            _ => {}
        }
    }

    cfg
}
