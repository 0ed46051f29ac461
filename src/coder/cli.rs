// src/coder/cli.rs
// Coder implementation that drives the engine as a one-shot subprocess

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::git::GitWorkspace;
use super::types::{ChatMessage, CommitRef, Role};
use super::Coder;
use crate::error::{CoderError, Result};

/// Default engine timeout in seconds
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 600;

/// How to invoke the engine process
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Executable to run
    pub command: String,
    /// Arguments placed before `--model` / `--message`
    pub args: Vec<String>,
    pub model: Option<String>,
    pub timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command: "aider".to_string(),
            args: default_engine_args(),
            model: None,
            timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
        }
    }
}

/// Non-interactive flags for the engine
pub fn default_engine_args() -> Vec<String> {
    ["--yes-always", "--no-pretty", "--no-stream"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub struct CliCoder {
    root: PathBuf,
    settings: EngineSettings,
    workspace: Option<GitWorkspace>,
    abs_fnames: BTreeSet<PathBuf>,
    input_history: Vec<String>,
    messages: Vec<ChatMessage>,
    last_commit: Option<CommitRef>,
}

impl CliCoder {
    pub fn new(root: impl AsRef<Path>, settings: EngineSettings) -> Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(CoderError::invalid_input(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let workspace = GitWorkspace::discover(&root);
        if workspace.is_none() {
            warn!(
                "No git repository found in {}; diff and undo are unavailable",
                root.display()
            );
        }

        Ok(Self {
            root,
            settings,
            workspace,
            abs_fnames: BTreeSet::new(),
            input_history: Vec::new(),
            messages: Vec::new(),
            last_commit: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_history(&self) -> &[String] {
        &self.input_history
    }

    fn workspace(&self) -> Result<&GitWorkspace> {
        self.workspace
            .as_ref()
            .ok_or_else(|| CoderError::NoRepository(self.root.display().to_string()))
    }

    fn head_commit(&self) -> Option<CommitRef> {
        let workspace = self.workspace.as_ref()?;
        match workspace.head_commit() {
            Ok(commit) => commit,
            Err(e) => {
                warn!("Failed to read HEAD: {}", e);
                None
            }
        }
    }

    fn record_engine_commit(&mut self, before: Option<CommitRef>) {
        let after = self.head_commit();
        if let Some(commit) = &after
            && after != before
        {
            info!("Engine committed {}: {}", commit.hash, commit.message);
            self.last_commit = after;
        }
    }

    fn engine_command(&self, message: &str) -> Command {
        let mut cmd = Command::new(&self.settings.command);
        cmd.args(&self.settings.args);
        if let Some(model) = &self.settings.model {
            cmd.arg("--model").arg(model);
        }
        cmd.arg("--message").arg(message);
        cmd.args(self.inchat_relative_files());

        cmd.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Lexically normalize a relative path, rejecting anything that leaves the root
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[async_trait]
impl Coder for CliCoder {
    async fn run(&mut self, message: &str) -> Result<Option<String>> {
        let before = self.head_commit();
        self.messages.push(ChatMessage::new(Role::User, message));

        let mut cmd = self.engine_command(message);
        debug!(command = %self.settings.command, files = self.abs_fnames.len(), "Running engine");

        let timeout = self.settings.timeout;
        let outcome = tokio::time::timeout(timeout, cmd.output()).await;

        // The engine may have committed before failing or timing out
        self.record_engine_commit(before);

        let output = outcome.map_err(|_| CoderError::Timeout(timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CoderError::Engine(format!(
                "{} exited with {}: {}",
                self.settings.command, output.status, stderr
            )));
        }

        let reply = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if reply.is_empty() {
            return Ok(None);
        }
        self.messages.push(ChatMessage::new(Role::Assistant, reply.clone()));
        Ok(Some(reply))
    }

    fn add_to_input_history(&mut self, message: &str) {
        self.input_history.push(message.to_string());
    }

    fn inchat_relative_files(&self) -> Vec<String> {
        self.abs_fnames
            .iter()
            .filter_map(|abs| abs.strip_prefix(&self.root).ok())
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn add_rel_fname(&mut self, rel_fname: &str) -> Result<()> {
        let rel = normalize_relative(Path::new(rel_fname)).ok_or_else(|| {
            CoderError::invalid_input(format!("{rel_fname} is outside the workspace"))
        })?;
        let abs = self.root.join(rel);
        if self.abs_fnames.insert(abs) {
            info!("Added {} to the chat", rel_fname);
        }
        Ok(())
    }

    fn abs_root_path(&self, path: &str) -> PathBuf {
        match normalize_relative(Path::new(path)) {
            Some(rel) => self.root.join(rel),
            None => self.root.join(path),
        }
    }

    fn drop_abs_fname(&mut self, abs_fname: &Path) -> bool {
        self.abs_fnames.remove(abs_fname)
    }

    fn last_commit(&self) -> Option<CommitRef> {
        self.last_commit.clone()
    }

    fn diff_commits(&self, from: &str, to: &str) -> Result<String> {
        self.workspace()?.diff_commits(from, to)
    }

    fn undo(&mut self) -> Result<()> {
        let workspace = self.workspace()?;
        let commit = self
            .last_commit
            .clone()
            .ok_or_else(|| CoderError::conflict("No engine commit to undo"))?;

        let restored = workspace.undo_commit(&commit.hash)?;
        info!(
            "Removed commit {} ({}), restored {} file(s)",
            commit.hash,
            commit.message,
            restored.len()
        );
        self.last_commit = None;
        Ok(())
    }

    fn cur_messages(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    fn clear_chat_history(&mut self) -> Result<()> {
        self.messages.clear();
        Ok(())
    }
}
