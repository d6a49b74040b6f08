//! Repository context collection
//!
//! Enumerates git-tracked files and concatenates their contents into one
//! size-bounded text blob for the PRD prompt.

use std::io;
use std::path::{Path, PathBuf};

use aider_orchestrator_sdk::{log_found, log_info, log_warning};
use thiserror::Error;
use tokio::process::Command;

/// Per-file size ceiling; larger files are listed but not embedded
pub const MAX_FILE_SIZE: u64 = 100 * 1024;

/// Ceiling on the emitted context, headers and placeholders included
pub const MAX_TOTAL_CONTEXT: usize = 500 * 1024;

/// Appended once when files were left out because of the total ceiling
pub const TRUNCATION_MARKER: &str = "\n[Context Truncated: Max total size reached]";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Error: '{}' is not a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("Error: Could not list files in git repository at {} ({status}): {stderr}", .path.display())]
    GitFailed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Error: Could not run git: {0}")]
    GitUnavailable(#[from] io::Error),
}

/// Collect the context blob for a repository root
pub async fn collect_repo_context(repo_path: &Path) -> Result<String, ContextError> {
    log_info!("Gathering repository context from: {}", repo_path.display());

    let files = list_tracked_files(repo_path).await?;
    log_found!(files.len(), "files tracked by git");

    let context = build_context(repo_path, &files).await;
    log_info!(
        "Generated repository context (Size: {:.2} KB)",
        context.len() as f64 / 1024.0
    );
    Ok(context)
}

/// Version-controlled files under `repo_path`, in git's order
pub async fn list_tracked_files(repo_path: &Path) -> Result<Vec<String>, ContextError> {
    if !repo_path.is_dir() {
        return Err(ContextError::NotARepository(repo_path.to_path_buf()));
    }

    let output = Command::new("git")
        .args(["ls-files", "-z"])
        .current_dir(repo_path)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("not a git repository") {
            return Err(ContextError::NotARepository(repo_path.to_path_buf()));
        }
        return Err(ContextError::GitFailed {
            path: repo_path.to_path_buf(),
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect())
}

/// One file's contribution before the total ceiling is applied
enum Entry {
    Placeholder(String),
    Content(String),
}

impl Entry {
    fn placeholder(path: &str, note: &str) -> Self {
        Entry::Placeholder(format!("- {} {}\n", path, note))
    }
}

/// Render `files` (relative to `repo_path`) into a bounded context blob
pub async fn build_context(repo_path: &Path, files: &[String]) -> String {
    let repo_name = repo_path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| repo_path.display().to_string());

    let mut context = format!("Repository Structure (tracked files in {}):\n", repo_name);
    // Set when any file was left out for the total ceiling
    let mut truncated = false;

    for path in files {
        if context.len() >= MAX_TOTAL_CONTEXT {
            truncated = true;
            break;
        }

        let entry = match read_entry(repo_path, path).await {
            Entry::Content(block) if context.len() + block.len() > MAX_TOTAL_CONTEXT => {
                truncated = true;
                Entry::placeholder(path, "(Content skipped: Exceeds total size limit)")
            }
            entry => entry,
        };

        match entry {
            Entry::Content(block) => context.push_str(&block),
            Entry::Placeholder(line) if context.len() + line.len() <= MAX_TOTAL_CONTEXT => {
                context.push_str(&line)
            }
            Entry::Placeholder(_) => {
                log_warning!("Reached maximum total context size limit while adding file name.");
                truncated = true;
                break;
            }
        }
    }

    if truncated {
        log_warning!("Reached maximum total context size limit. Skipping remaining files.");
        context.push_str(TRUNCATION_MARKER);
    }
    context
}

async fn read_entry(repo_path: &Path, path: &str) -> Entry {
    let absolute = repo_path.join(path);

    let metadata = match tokio::fs::metadata(&absolute).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log_warning!("File listed by git not found: {}", absolute.display());
            return Entry::placeholder(path, "(Skipped: Not found)");
        }
        Err(e) => {
            log_warning!("Could not read file {}: {}", absolute.display(), e);
            return Entry::placeholder(path, "(Skipped: Read error)");
        }
    };

    if !metadata.is_file() {
        return Entry::placeholder(path, "(Skipped: Not a regular file)");
    }
    if metadata.len() > MAX_FILE_SIZE {
        return Entry::placeholder(
            path,
            &format!("(Skipped: Too large > {}KB)", MAX_FILE_SIZE / 1024),
        );
    }
    if metadata.len() == 0 {
        return Entry::placeholder(path, "(empty file)");
    }

    match tokio::fs::read(&absolute).await {
        Ok(bytes) => Entry::Content(format!(
            "\n--- File: {} ---\n{}\n--- End File ---\n",
            path,
            decode_lossy(&bytes)
        )),
        Err(e) => {
            log_warning!("Could not read file {}: {}", absolute.display(), e);
            Entry::placeholder(path, "(Skipped: Read error)")
        }
    }
}

/// UTF-8 decode that drops invalid byte sequences instead of replacing them
fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
