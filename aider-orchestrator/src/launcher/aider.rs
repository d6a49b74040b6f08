//! Worker-script launcher for aider agents
//!
//! Agents are split into contiguous groups, one bash worker per group. Each
//! worker runs its agents' `aider` invocations one after another, writing
//! every agent's output to its own log file.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use aider_orchestrator_sdk::{async_trait, log_agent_launched, log_info};
use tokio::process::Command;

use super::{agent_log_path, LaunchError, LaunchHandle, LaunchRequest, ProcessLauncher};
use crate::config::Defaults;
use crate::prd::AgentTask;
use crate::workflow_utils::split_evenly;

pub struct AiderLauncher {
    aider_model: String,
    default_context_files: Vec<String>,
    session_prefix: String,
}

impl AiderLauncher {
    pub fn new(
        aider_model: impl Into<String>,
        default_context_files: Vec<String>,
        session_prefix: impl Into<String>,
    ) -> Self {
        Self {
            aider_model: aider_model.into(),
            default_context_files,
            session_prefix: session_prefix.into(),
        }
    }

    pub fn from_defaults(defaults: &Defaults) -> Self {
        Self::new(
            defaults.aider_model.clone(),
            defaults.default_context_files.clone(),
            defaults.tmux_session_prefix.clone(),
        )
    }

    pub fn session_id(&self, run_id: &str) -> String {
        format!("{}{}", self.session_prefix, run_id)
    }

    /// Agent targets plus default context files, de-duplicated and sorted
    fn files_for(&self, agent: &AgentTask) -> Vec<String> {
        agent
            .target_files
            .iter()
            .chain(self.default_context_files.iter())
            .filter(|f| !f.trim().is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn check_executables() -> Result<(), LaunchError> {
        for executable in ["aider", "bash"] {
            which::which(executable)
                .map_err(|_| LaunchError::MissingExecutable(executable.to_string()))?;
        }
        Ok(())
    }
}

/// Quote a value for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render the bash script for one worker
pub fn render_worker_script(
    worker: usize,
    run_id: &str,
    repo_path: &Path,
    aider_model: &str,
    jobs: &[(AgentTask, Vec<String>, PathBuf)],
) -> String {
    let mut script = String::from("#!/usr/bin/env bash\n");
    let _ = writeln!(script, "# Worker {} for run {}", worker, run_id);
    let _ = writeln!(script, "cd {} || exit 1", shell_quote(&repo_path.to_string_lossy()));

    for (agent, files, log_file) in jobs {
        let log = shell_quote(&log_file.to_string_lossy());
        let mut command = format!(
            "aider --yes --model {} --message {}",
            shell_quote(aider_model),
            shell_quote(&agent.task_description)
        );
        for file in files {
            command.push(' ');
            command.push_str(&shell_quote(file));
        }

        let _ = writeln!(script);
        let _ = writeln!(script, "# Agent {}", agent.agent_id);
        let _ = writeln!(script, "{} > {} 2>&1", command, log);
        let _ = writeln!(
            script,
            "echo \"[aider exited with status $?]\" >> {}",
            log
        );
    }
    script
}

/// A worker script on disk and the agents it runs
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerScript {
    pub path: PathBuf,
    /// `(agent_id, log file)` in run order
    pub agents: Vec<(u32, PathBuf)>,
}

/// Render and write one script per group into `log_dir`
pub async fn write_worker_scripts(
    run_id: &str,
    repo_path: &Path,
    log_dir: &Path,
    aider_model: &str,
    groups: &[Vec<(AgentTask, Vec<String>)>],
) -> Result<Vec<WorkerScript>, LaunchError> {
    let mut scripts = Vec::with_capacity(groups.len());
    for (worker, group) in groups.iter().enumerate() {
        let jobs: Vec<_> = group
            .iter()
            .map(|(agent, files)| {
                let log_file = agent_log_path(log_dir, agent.agent_id);
                (agent.clone(), files.clone(), log_file)
            })
            .collect();

        let script = render_worker_script(worker, run_id, repo_path, aider_model, &jobs);
        let path = log_dir.join(format!("worker_{}.sh", worker));
        tokio::fs::write(&path, script)
            .await
            .map_err(|source| LaunchError::Io {
                path: path.clone(),
                source,
            })?;

        scripts.push(WorkerScript {
            path,
            agents: jobs
                .into_iter()
                .map(|(agent, _, log_file)| (agent.agent_id, log_file))
                .collect(),
        });
    }
    Ok(scripts)
}

#[async_trait]
impl ProcessLauncher for AiderLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchHandle, LaunchError> {
        if request.agents.is_empty() {
            return Err(LaunchError::NoAgents);
        }
        Self::check_executables()?;

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| LaunchError::Io { path, source }
        };

        tokio::fs::create_dir_all(&request.log_dir)
            .await
            .map_err(io_err(&request.log_dir))?;

        // Workers cd into the repository, so every path they see is absolute
        let log_dir = tokio::fs::canonicalize(&request.log_dir)
            .await
            .map_err(io_err(&request.log_dir))?;
        let repo_path = tokio::fs::canonicalize(&request.repo_path)
            .await
            .map_err(io_err(&request.repo_path))?;

        let groups: Vec<Vec<(AgentTask, Vec<String>)>> =
            split_evenly(&request.agents, request.concurrency)
                .into_iter()
                .map(|group| {
                    group
                        .into_iter()
                        .map(|agent| {
                            let files = self.files_for(&agent);
                            (agent, files)
                        })
                        .collect()
                })
                .collect();
        log_info!(
            "Launching {} agents across {} workers",
            request.agents.len(),
            groups.len()
        );

        // Every script exists before the first process starts
        let scripts = write_worker_scripts(
            &request.run_id,
            &repo_path,
            &log_dir,
            &self.aider_model,
            &groups,
        )
        .await?;

        let mut handle = LaunchHandle {
            session_id: self.session_id(&request.run_id),
            log_dir,
            log_files: BTreeMap::new(),
        };

        for (worker, script) in scripts.into_iter().enumerate() {
            // Detached: the child keeps running when its handle is dropped
            let spawned = Command::new("bash")
                .arg(&script.path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            if let Err(source) = spawned {
                return Err(LaunchError::Spawn {
                    worker,
                    started: handle,
                    source,
                });
            }

            for (agent_id, log_file) in script.agents {
                log_agent_launched!(request.run_id, agent_id, log_file.display());
                handle.log_files.insert(agent_id, log_file);
            }
        }

        Ok(handle)
    }
}
