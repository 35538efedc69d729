use std::env;
use std::path::PathBuf;

// ─── Defaults ────────────────────────────────────────────────────

/// Profiles kept per page log. Override with `PROFILER_RETENTION`.
pub const DEFAULT_RETENTION: usize = 20;

/// Where page logs live unless `PROFILER_STORAGE_PATH` says otherwise.
pub const DEFAULT_STORAGE_PATH: &str = "tmp/performance_profiles";

/// Path prefixes that are never profiled: health checks, static assets,
/// and the profiler's own reporting endpoints.
const DEFAULT_SKIP_PREFIXES: &[&str] = &["/assets", "/up", "/dev/performance_profiles"];

/// Requests for these file extensions bypass capture entirely.
const STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "ico", "svg", "woff", "woff2", "ttf", "eot",
];

// ─── Configuration ───────────────────────────────────────────────

/// Profiler settings, read once at startup. No hot reload.
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Master switch. When false the middleware is a pure pass-through.
    pub enabled: bool,
    /// Directory holding one `<slug>.json` page log per endpoint.
    pub storage_path: PathBuf,
    /// Bounded-log cap applied on every append.
    pub retention_count: usize,
    /// Path prefixes excluded from capture.
    pub skip_prefixes: Vec<String>,
}

impl ProfilerConfig {
    /// Development defaults: enabled, `tmp/performance_profiles`, cap of
    /// [`DEFAULT_RETENTION`].
    pub fn development() -> Self {
        Self {
            enabled: true,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            retention_count: DEFAULT_RETENTION,
            skip_prefixes: DEFAULT_SKIP_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Same defaults with the switch off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::development()
        }
    }

    /// Build from the host environment.
    ///
    /// Profiling is active only in development (`APP_ENV` unset or
    /// `"development"` — this is a development tool, so unset counts as
    /// development) and only while `PROFILER_ENABLED` is not `0`/`false`.
    /// `PROFILER_STORAGE_PATH`, `PROFILER_RETENTION` and
    /// `PROFILER_SKIP_PATHS` (comma-separated prefixes) override the
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::development();

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let flag = env::var("PROFILER_ENABLED").unwrap_or_else(|_| "1".into());
        config.enabled = app_env == "development" && flag != "0" && flag != "false";

        if let Ok(path) = env::var("PROFILER_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(n) = env::var("PROFILER_RETENTION")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.retention_count = n.max(1);
        }
        if let Ok(extra) = env::var("PROFILER_SKIP_PATHS") {
            config
                .skip_prefixes
                .extend(extra.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
        }

        config
    }

    /// Should this request path bypass capture?
    pub fn skips(&self, path: &str) -> bool {
        if self.skip_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        match path.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                STATIC_EXTENSIONS.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_infrastructure_prefixes() {
        let config = ProfilerConfig::development();
        assert!(config.skips("/assets/app.css"));
        assert!(config.skips("/up"));
        assert!(config.skips("/dev/performance_profiles"));
        assert!(config.skips("/dev/performance_profiles/contacts"));
        assert!(!config.skips("/contacts"));
    }

    #[test]
    fn skips_static_asset_extensions() {
        let config = ProfilerConfig::development();
        assert!(config.skips("/favicon.ico"));
        assert!(config.skips("/logo.PNG"));
        assert!(config.skips("/fonts/inter.woff2"));
        assert!(!config.skips("/reports.generate"));
        assert!(!config.skips("/orders"));
    }

    #[test]
    fn disabled_keeps_other_defaults() {
        let config = ProfilerConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.retention_count, DEFAULT_RETENTION);
        assert_eq!(config.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
    }
}
