//! Display and approval helpers for the orchestrator workflow

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Format a byte count as KB or MB with two decimals
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1.0 {
        format!("{:.2} MB", mb)
    } else {
        format!("{:.2} KB", kb)
    }
}

/// Sizes of existing regular files among `paths` (relative to `repo_path`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSizeInfo {
    pub files: Vec<(String, u64)>,
    pub total_bytes: u64,
}

impl FileSizeInfo {
    pub fn total_display(&self) -> String {
        format_size(self.total_bytes)
    }
}

/// Missing paths and directories are ignored
pub fn file_size_info(repo_path: &Path, paths: &[String]) -> FileSizeInfo {
    let mut info = FileSizeInfo::default();
    for path in paths {
        let Ok(metadata) = std::fs::metadata(repo_path.join(path)) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        info.total_bytes += metadata.len();
        info.files.push((path.clone(), metadata.len()));
    }
    info
}

/// First `limit` non-empty lines of a PRD
pub fn preview_lines(text: &str, limit: usize) -> Vec<&str> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(limit)
        .collect()
}

/// Shorten a task description for one-line display
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Ask a yes/no question, re-asking on unrecognized answers.
///
/// An empty answer takes `default`; end of input declines.
pub fn confirm_action<R: BufRead, W: Write>(
    prompt_text: &str,
    default: bool,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let choices = if default { "Y/n" } else { "y/N" };
    loop {
        write!(output, "{} [{}]: ", prompt_text, choices)?;
        output.flush()?;

        let mut answer = String::new();
        let read = input
            .read_line(&mut answer)
            .context("Failed to read confirmation answer")?;
        if read == 0 {
            return Ok(false);
        }

        match answer.trim().to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "ye" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please respond with 'yes' or 'no' (or 'y' or 'n').")?,
        }
    }
}
