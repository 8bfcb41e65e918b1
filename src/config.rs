//! Runtime configuration from the environment
//!
//! | variable            | default               |
//! |---------------------|-----------------------|
//! | `ROLEGATE_DB`       | `./data/rolegate.mdb` |
//! | `ROLEGATE_MAP_SIZE` | `1073741824` (1 GiB)  |
//! | `PORT`              | `3000`                |

pub const DEFAULT_DB_PATH: &str = "./data/rolegate.mdb";
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
    pub map_size: usize,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: DEFAULT_DB_PATH.to_string(),
            map_size: DEFAULT_MAP_SIZE,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; unparseable numbers fall back to defaults
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = Config::default();
        Config {
            db_path: get("ROLEGATE_DB").unwrap_or(d.db_path),
            map_size: get("ROLEGATE_MAP_SIZE").and_then(|v| v.parse().ok()).unwrap_or(d.map_size),
            port: get("PORT").and_then(|v| v.parse().ok()).unwrap_or(d.port),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
