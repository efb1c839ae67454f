use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}
fn default_max_concurrency() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_chunk_max_tokens(),
        }
    }
}

fn default_chunk_max_tokens() -> usize {
    700
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
    #[serde(default = "default_memory_max_tokens")]
    pub memory_max_tokens: usize,
    #[serde(default = "default_exit_word")]
    pub exit_word: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            retrieval_k: default_retrieval_k(),
            memory_max_tokens: default_memory_max_tokens(),
            exit_word: default_exit_word(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}
fn default_retrieval_k() -> usize {
    4
}
// The Gemini chat API caps memory at 562 tokens, but the default stays
// at the higher figure and lets the provider truncate.
fn default_memory_max_tokens() -> usize {
    3097
}
fn default_exit_word() -> String {
    "sair".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_host")]
    pub host: String,
    #[serde(default = "default_index_port")]
    pub port: u16,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host: default_index_host(),
            port: default_index_port(),
            collection: default_collection(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_host() -> String {
    "localhost".to_string()
}
fn default_index_port() -> u16 {
    6333
}
fn default_collection() -> String {
    "personal_documents".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Load and validate configuration.
///
/// When the file does not exist but `DOCCHAT_DOCS_DIR` is set in the
/// environment, a default configuration rooted at that directory is
/// synthesized so the tool works without any config file at all.
/// `DOCCHAT_DOCS_DIR` also overrides `documents.root` when both are present.
pub fn load_config(path: &Path) -> Result<Config> {
    let docs_dir_env = std::env::var("DOCCHAT_DOCS_DIR").ok();

    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else if let Some(root) = &docs_dir_env {
        Config {
            documents: DocumentsConfig {
                root: PathBuf::from(root),
                include_globs: default_include_globs(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
                max_concurrency: default_max_concurrency(),
            },
            chunking: ChunkingConfig::default(),
            chat: ChatConfig::default(),
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    } else {
        anyhow::bail!(
            "Config file not found: {} (set DOCCHAT_DOCS_DIR to run without one)",
            path.display()
        );
    };

    if let Some(root) = docs_dir_env {
        config.documents.root = PathBuf::from(root);
    }

    if config.chat.retrieval_k < 1 {
        anyhow::bail!("chat.retrieval_k must be >= 1");
    }

    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }

    if config.documents.max_concurrency == 0 {
        anyhow::bail!("documents.max_concurrency must be > 0");
    }

    if config.chat.exit_word.is_empty() {
        anyhow::bail!("chat.exit_word must not be empty");
    }

    Ok(config)
}
