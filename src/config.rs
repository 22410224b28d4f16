use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default cache time-to-live in hours
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Attempts per request before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Base delay between attempts, multiplied by the attempt number
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

// =============================================================================
// Provider constants
// =============================================================================

pub const CURSEFORGE_API_BASE: &str = "https://api.curseforge.com/v1";
/// CurseForge game id for Minecraft
pub const CURSEFORGE_GAME_ID: u32 = 432;
pub const CURSEFORGE_PAGE_SIZE: usize = 50;
/// Pause after each network-fetched page
pub const CURSEFORGE_PAGE_DELAY_MS: u64 = 300;
/// Consecutive page failures tolerated before pagination is aborted
pub const CURSEFORGE_MAX_PAGE_FAILURES: usize = 3;

pub const MODRINTH_API_BASE: &str = "https://api.modrinth.com/v2";
pub const MODRINTH_PAGE_SIZE: usize = 100;
pub const MODRINTH_PAGE_DELAY_MS: u64 = 200;
/// Upper bound on version pages requested for one project
pub const MODRINTH_MAX_PAGES: usize = 1_000;

/// Parallel projects analysed by the batch runner
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Which [`PageStore`](crate::provider::store::PageStore) backs the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// One JSON file per page
    #[default]
    Fs,
    /// Single SQLite database
    Sqlite,
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fs" | "file" | "files" => Ok(CacheBackend::Fs),
            "sqlite" | "db" => Ok(CacheBackend::Sqlite),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

/// HTTP behaviour shared by both providers
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub dir: PathBuf,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            dir: cache_dir(),
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_HOURS * 60 * 60),
        }
    }
}

/// CurseForge adapter configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CurseForgeConfig {
    /// `None` disables the provider
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: usize,
    pub page_delay: Duration,
    pub max_page_failures: usize,
}

impl Default for CurseForgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: CURSEFORGE_API_BASE.to_string(),
            page_size: CURSEFORGE_PAGE_SIZE,
            page_delay: Duration::from_millis(CURSEFORGE_PAGE_DELAY_MS),
            max_page_failures: CURSEFORGE_MAX_PAGE_FAILURES,
        }
    }
}

/// Modrinth adapter configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModrinthConfig {
    pub base_url: String,
    pub page_size: usize,
    pub page_delay: Duration,
    pub max_pages: usize,
}

impl Default for ModrinthConfig {
    fn default() -> Self {
        Self {
            base_url: MODRINTH_API_BASE.to_string(),
            page_size: MODRINTH_PAGE_SIZE,
            page_delay: Duration::from_millis(MODRINTH_PAGE_DELAY_MS),
            max_pages: MODRINTH_MAX_PAGES,
        }
    }
}

/// Complete runtime configuration, passed explicitly into constructors
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub curseforge: CurseForgeConfig,
    pub modrinth: ModrinthConfig,
    pub debug: bool,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Recognised variables: `CF_API_KEY`, `REQUEST_TIMEOUT` (seconds),
    /// `MODCOMPAT_CACHE_DIR`, `MODCOMPAT_CACHE_BACKEND`,
    /// `MODCOMPAT_CACHE_TTL_HOURS`, `CURSEFORGE_API_BASE`,
    /// `MODRINTH_API_BASE` and `DEBUG`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        config.curseforge.api_key = var("CF_API_KEY").map(|v| v.trim().to_string());

        if let Some(secs) = parse_var::<u64>(&var, "REQUEST_TIMEOUT") {
            config.http.timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = var("MODCOMPAT_CACHE_DIR") {
            config.cache.dir = PathBuf::from(dir);
        } else {
            config.cache.dir = cache_dir_with_env(var("XDG_CACHE_HOME"), dirs::home_dir());
        }
        if let Some(backend) = parse_var::<CacheBackend>(&var, "MODCOMPAT_CACHE_BACKEND") {
            config.cache.backend = backend;
        }
        if let Some(hours) = parse_var::<u64>(&var, "MODCOMPAT_CACHE_TTL_HOURS") {
            let secs = hours.checked_mul(60 * 60).unwrap_or_else(|| {
                warn!(
                    "MODCOMPAT_CACHE_TTL_HOURS={} is too large, using {} seconds",
                    hours,
                    u64::MAX
                );
                u64::MAX
            });
            config.cache.ttl = Duration::from_secs(secs);
        }
        if let Some(base) = var("CURSEFORGE_API_BASE") {
            config.curseforge.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(base) = var("MODRINTH_API_BASE") {
            config.modrinth.base_url = base.trim_end_matches('/').to_string();
        }
        config.debug = debug_from_lookup(&var);

        config
    }
}

/// `DEBUG=true` in the process environment.
///
/// Read on its own so logging can be installed before the rest of the
/// configuration, whose parse warnings then reach the subscriber.
pub fn debug_from_env() -> bool {
    debug_from_lookup(|name| std::env::var(name).ok())
}

fn debug_from_lookup(var: impl Fn(&str) -> Option<String>) -> bool {
    var("DEBUG").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = var(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}

/// Returns the path to the cache directory for modcompat.
/// Uses $XDG_CACHE_HOME/modcompat if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/modcompat,
/// or ./modcompat if neither is available.
pub fn cache_dir() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the data directory for modcompat.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("modcompat.log")
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("modcompat")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("modcompat")
}
