//! Tests for repository context collection

use std::process::Command;

use aider_orchestrator::context::{
    build_context, collect_repo_context, list_tracked_files, ContextError, MAX_TOTAL_CONTEXT,
    TRUNCATION_MARKER,
};

use super::common::write_file;

#[tokio::test]
async fn test_per_file_policy() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "empty.txt", b"");
    write_file(dir.path(), "big.bin", &vec![b'a'; 200 * 1024]);
    write_file(dir.path(), "small.py", &vec![b'b'; 1024]);

    let files = vec![
        "empty.txt".to_string(),
        "big.bin".to_string(),
        "small.py".to_string(),
    ];
    let context = build_context(dir.path(), &files).await;

    assert!(context.starts_with("Repository Structure (tracked files in "));
    assert!(context.contains("- empty.txt (empty file)\n"));
    assert!(context.contains("- big.bin (Skipped: Too large > 100KB)\n"));
    assert!(context.contains(&format!(
        "\n--- File: small.py ---\n{}\n--- End File ---\n",
        "b".repeat(1024)
    )));
    assert!(!context.contains(TRUNCATION_MARKER));
}

#[tokio::test]
async fn test_total_ceiling_truncates_once() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<String> = (0..600).map(|i| format!("file_{:04}.txt", i)).collect();
    for name in &files {
        write_file(dir.path(), name, &vec![b'z'; 1000]);
    }

    let context = build_context(dir.path(), &files).await;

    assert_eq!(context.matches(TRUNCATION_MARKER).count(), 1);
    assert!(context.ends_with(TRUNCATION_MARKER));
    assert!(context.len() <= MAX_TOTAL_CONTEXT + TRUNCATION_MARKER.len());

    // The file that crosses the ceiling is listed with a placeholder
    let first_skipped = files
        .iter()
        .position(|f| !context.contains(&format!("--- File: {} ---", f)))
        .unwrap();
    assert!(first_skipped > 0);
    assert!(context.contains(&format!(
        "- {} (Content skipped: Exceeds total size limit)\n",
        files[first_skipped]
    )));

    // Equal-sized files never fit again after the first one that did not
    for name in &files[first_skipped..] {
        assert!(!context.contains(&format!("--- File: {} ---", name)));
    }

    // Once even a placeholder line no longer fits, the rest is not listed
    assert!(!context.contains(files.last().unwrap().as_str()));
}

#[tokio::test]
async fn test_small_file_after_skipped_one_is_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let mut files: Vec<String> = (0..6).map(|i| format!("big_{}.bin", i)).collect();
    for name in &files {
        write_file(dir.path(), name, &vec![b'q'; 99 * 1024]);
    }
    write_file(dir.path(), "tiny.txt", b"hello");
    files.push("tiny.txt".to_string());

    let context = build_context(dir.path(), &files).await;

    assert!(context.contains("--- File: big_4.bin ---"));
    assert!(context.contains("- big_5.bin (Content skipped: Exceeds total size limit)\n"));
    assert!(context.contains("\n--- File: tiny.txt ---\nhello\n--- End File ---\n"));
    assert_eq!(context.matches(TRUNCATION_MARKER).count(), 1);
    assert!(context.ends_with(TRUNCATION_MARKER));
    assert!(context.len() <= MAX_TOTAL_CONTEXT + TRUNCATION_MARKER.len());
}

#[tokio::test]
async fn test_stops_when_placeholder_no_longer_fits() {
    let dir = tempfile::tempdir().unwrap();
    // Six files fill the budget to within a few bytes of the ceiling
    let mut files: Vec<String> = (0..6).map(|i| format!("fill_{}.txt", i)).collect();
    let repo_name = dir.path().canonicalize().unwrap();
    let header = format!(
        "Repository Structure (tracked files in {}):\n",
        repo_name.file_name().unwrap().to_string_lossy()
    );
    let wrapper = |name: &str| {
        format!("\n--- File: {} ---\n", name).len() + "\n--- End File ---\n".len()
    };
    let slack = 10;
    let budget = MAX_TOTAL_CONTEXT - header.len() - slack;
    for (i, name) in files.iter().enumerate() {
        let block = if i < 5 { budget / 6 } else { budget - 5 * (budget / 6) };
        write_file(dir.path(), name, &vec![b'f'; block - wrapper(name)]);
    }
    write_file(dir.path(), "after.txt", b"late content");
    write_file(dir.path(), "never.txt", b"never listed");
    files.push("after.txt".to_string());
    files.push("never.txt".to_string());

    let context = build_context(dir.path(), &files).await;

    assert_eq!(context.len(), MAX_TOTAL_CONTEXT - slack + TRUNCATION_MARKER.len());
    assert!(context.contains("--- File: fill_5.txt ---"));
    assert!(!context.contains("after.txt"));
    assert!(!context.contains("never.txt"));
    assert!(context.ends_with(TRUNCATION_MARKER));
}

#[tokio::test]
async fn test_undecodable_bytes_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "mixed.txt", b"caf\xc3\xa9 \xff\xfe ok");

    let context = build_context(dir.path(), &["mixed.txt".to_string()]).await;
    assert!(context.contains("café  ok"));
}

fn git_available() -> bool {
    which::which("git").is_ok()
}

#[tokio::test]
async fn test_lists_only_tracked_files() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    let status = Command::new("git").arg("init").arg("-q").current_dir(repo).status().unwrap();
    assert!(status.success());

    write_file(repo, "src/app.py", b"print('hi')\n");
    write_file(repo, "README.md", b"# App\n");
    write_file(repo, "scratch.txt", b"untracked\n");
    let status = Command::new("git")
        .args(["add", "src/app.py", "README.md"])
        .current_dir(repo)
        .status()
        .unwrap();
    assert!(status.success());

    let mut files = list_tracked_files(repo).await.unwrap();
    files.sort();
    assert_eq!(files, vec!["README.md", "src/app.py"]);

    let context = collect_repo_context(repo).await.unwrap();
    assert!(context.contains("--- File: src/app.py ---\nprint('hi')\n"));
    assert!(!context.contains("scratch.txt"));
}

#[tokio::test]
async fn test_plain_directory_is_not_a_repository() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let result = list_tracked_files(dir.path()).await;
    assert!(matches!(result, Err(ContextError::NotARepository(_))));
}
