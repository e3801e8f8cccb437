use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Vectorizer strategy information
#[derive(Debug, Clone)]
pub struct StrategyInfo {
    pub alias: &'static str,
    pub description: &'static str,
}

/// Available matcher strategies
pub static STRATEGIES: &[StrategyInfo] = &[
    StrategyInfo {
        alias: "tfidf",
        description: "Default. Term-weighted lexical match over the corpus vocabulary",
    },
    StrategyInfo {
        alias: "hash",
        description: "N-gram hashing - corpus-independent, tolerates unseen wording",
    },
];

pub const DEFAULT_STRATEGY: &str = "tfidf";

/// Hex key used when HAVEN_ENCRYPTION_KEY is not set. Matches the
/// application's documented development default; production deployments
/// set their own key.
const DEV_ENCRYPTION_KEY: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

// -----------------------------------------------------------------------------
// Environment-provided secrets
// -----------------------------------------------------------------------------

pub fn api_key() -> Option<String> {
    std::env::var("HAVEN_API_KEY")
        .or_else(|_| std::env::var("GROQ_API_KEY"))
        .ok()
        .filter(|k| !k.is_empty())
}

pub fn encryption_key() -> String {
    std::env::var("HAVEN_ENCRYPTION_KEY").unwrap_or_else(|_| DEV_ENCRYPTION_KEY.to_string())
}

pub fn token_secret() -> String {
    std::env::var("HAVEN_TOKEN_SECRET").unwrap_or_else(|_| "your-secret-key".to_string())
}

pub fn anon_salt() -> String {
    std::env::var("HAVEN_ANON_SALT").unwrap_or_else(|_| "default_salt".to_string())
}

/// Optional signed session token identifying the user
pub fn session_token() -> Option<String> {
    std::env::var("HAVEN_TOKEN").ok().filter(|t| !t.is_empty())
}

// -----------------------------------------------------------------------------
// Global config (shared LLM settings)
// -----------------------------------------------------------------------------

fn global_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("haven")
}

fn global_config_file() -> PathBuf {
    global_config_dir().join("config.yaml")
}

/// Get global config
pub fn get_global_config() -> HashMap<String, String> {
    let path = global_config_file();
    if path.exists() {
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(config) = serde_yaml::from_str::<HashMap<String, String>>(&content) {
                return config;
            }
        }
    }
    HashMap::new()
}

/// Set a global config value
pub fn set_global_config(key: &str, value: &str) -> std::io::Result<()> {
    let dir = global_config_dir();
    fs::create_dir_all(&dir)?;

    let mut config = get_global_config();
    config.insert(key.to_string(), value.to_string());

    let content = serde_yaml::to_string(&config).unwrap_or_default();
    fs::write(global_config_file(), content)
}

// -----------------------------------------------------------------------------
// Per-project config
// -----------------------------------------------------------------------------

/// Configuration manager for a .haven directory
pub struct HavenConfig {
    haven_path: PathBuf,
    config_file: PathBuf,
    config: HashMap<String, serde_yaml::Value>,
}

impl HavenConfig {
    pub fn new(haven_path: PathBuf) -> Self {
        let config_file = haven_path.join("_config.yaml");
        let mut instance = Self {
            haven_path,
            config_file,
            config: HashMap::new(),
        };
        instance.load();
        instance
    }

    fn load(&mut self) {
        if self.config_file.exists() {
            if let Ok(content) = fs::read_to_string(&self.config_file) {
                if let Ok(config) =
                    serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content)
                {
                    self.config = config;
                }
            }
        }
    }

    fn save(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.haven_path)?;
        let content = serde_yaml::to_string(&self.config).unwrap_or_default();
        fs::write(&self.config_file, content)
    }

    /// Project value, falling back to the global config
    pub fn get(&self, key: &str) -> Option<String> {
        let local = self.config.get(key).and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        });

        local.or_else(|| get_global_config().get(key).cloned())
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::io::Result<()> {
        self.config
            .insert(key.to_string(), serde_yaml::Value::String(value.to_string()));
        self.save()
    }

    pub fn strategy(&self) -> String {
        self.get("strategy")
            .unwrap_or_else(|| DEFAULT_STRATEGY.to_string())
    }

    pub fn set_strategy(&mut self, value: &str) -> std::io::Result<()> {
        self.set("strategy", value)
    }

    /// Optional external corpus file (label,tip CSV)
    pub fn corpus_file(&self) -> Option<PathBuf> {
        self.get("corpus_file").map(PathBuf::from)
    }

    pub fn llm_base_url(&self) -> String {
        self.get("llm_base_url")
            .unwrap_or_else(|| crate::llm::DEFAULT_BASE_URL.to_string())
    }

    pub fn llm_model(&self) -> String {
        self.get("llm_model")
            .unwrap_or_else(|| crate::llm::DEFAULT_MODEL.to_string())
    }

    /// Optional third-party mood resource endpoint
    pub fn resources_endpoint(&self) -> Option<String> {
        self.get("resources_endpoint")
    }
}

/// Find the .haven directory, searching upward from current directory
pub fn find_haven_path() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let haven = current.join(".haven");
        if haven.is_dir() {
            return Some(haven);
        }

        if !current.pop() {
            break;
        }
    }

    // Check HAVEN_PATH environment variable
    if let Ok(path) = std::env::var("HAVEN_PATH") {
        let haven = PathBuf::from(path);
        if haven.is_dir() {
            return Some(haven);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_haven_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "haven-config-test-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults() {
        let dir = temp_haven_dir("defaults");
        let config = HavenConfig::new(dir.clone());

        assert_eq!(config.strategy(), DEFAULT_STRATEGY);
        assert!(config.corpus_file().is_none());
        assert_eq!(config.llm_base_url(), crate::llm::DEFAULT_BASE_URL);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_set_and_reload() {
        let dir = temp_haven_dir("reload");

        let mut config = HavenConfig::new(dir.clone());
        config.set_strategy("hash").unwrap();
        config.set("corpus_file", "tips.csv").unwrap();

        let reloaded = HavenConfig::new(dir.clone());
        assert_eq!(reloaded.strategy(), "hash");
        assert_eq!(reloaded.corpus_file(), Some(PathBuf::from("tips.csv")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_strategy_table_covers_known_strategies() {
        assert!(STRATEGIES.iter().any(|s| s.alias == DEFAULT_STRATEGY));
        for s in STRATEGIES {
            assert!(crate::vectorizer::for_strategy(s.alias).is_ok());
        }
    }
}
