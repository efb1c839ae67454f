//! Document source: recursive filesystem enumeration and chunking.
//!
//! Walks the configured documents root, filters files through include and
//! exclude glob sets, reads each file, and splits it into chunks. File
//! reading and splitting runs under bounded parallelism because it is
//! I/O-bound startup work; the rest of the pipeline is sequential.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::models::DocChunk;

/// Load every matching file under `documents.root` and split it into chunks.
///
/// Output is sorted by source path so ingestion order is deterministic.
pub async fn load_documents(config: &Config) -> Result<Vec<DocChunk>> {
    let docs = &config.documents;
    let root = &docs.root;
    if !root.exists() {
        bail!("Documents directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&docs.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(docs.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files: Vec<(PathBuf, String)> = Vec::new();

    let walker = walkdir::WalkDir::new(root).follow_links(docs.follow_symlinks);
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push((path.to_path_buf(), rel_str));
    }

    // Bounded worker pool for the read+split step
    let semaphore = Arc::new(Semaphore::new(docs.max_concurrency));
    let max_tokens = config.chunking.max_tokens;
    let mut set: JoinSet<Result<Vec<DocChunk>>> = JoinSet::new();

    for (path, rel_str) in files {
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let body = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(chunk_text(&rel_str, &body, max_tokens))
        });
    }

    let mut chunks = Vec::new();
    while let Some(joined) = set.join_next().await {
        chunks.extend(joined??);
    }

    chunks.sort_by(|a, b| a.source.cmp(&b.source));

    Ok(chunks)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_config(root: PathBuf) -> Config {
        let toml = format!("[documents]\nroot = \"{}\"\n", root.display());
        toml::from_str(&toml).unwrap()
    }

    #[tokio::test]
    async fn test_load_recursive_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("b.txt"), "The sky is blue.").unwrap();
        fs::write(tmp.path().join("sub/a.md"), "Grass is green.").unwrap();
        fs::write(tmp.path().join("skip.bin"), "binary").unwrap();

        let cfg = test_config(tmp.path().to_path_buf());
        let chunks = load_documents(&cfg).await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source, "b.txt");
        assert_eq!(chunks[1].source, "sub/a.md");
        assert!(chunks[0].text.contains("blue"));
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let cfg = test_config(PathBuf::from("/nonexistent/docchat-test-root"));
        assert!(load_documents(&cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_exclude_globs_respected() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("node_modules")).unwrap();
        fs::write(tmp.path().join("node_modules/readme.md"), "ignored").unwrap();
        fs::write(tmp.path().join("kept.md"), "kept").unwrap();

        let cfg = test_config(tmp.path().to_path_buf());
        let chunks = load_documents(&cfg).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "kept.md");
    }
}
