//! Collaborator contract for the Coder engine
//!
//! The HTTP layer never talks to the engine directly. Everything it needs is
//! expressed by the [`Coder`] trait:
//! - running a chat turn and reading the transcript
//! - managing the set of files in chat
//! - inspecting and undoing the last engine commit

mod cli;
mod git;
pub mod types;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{CoderError, Result};

pub use cli::{CliCoder, DEFAULT_ENGINE_TIMEOUT_SECS, EngineSettings, default_engine_args};
pub use git::GitWorkspace;
pub use types::{ChatMessage, ChatReply, CommitRef, EditRecord, Role};

/// Operations the façade delegates to the engine
#[async_trait]
pub trait Coder: Send {
    /// Run one engine turn with `message`, returning the assistant reply if any
    async fn run(&mut self, message: &str) -> Result<Option<String>>;

    /// Record a line of user input
    fn add_to_input_history(&mut self, message: &str);

    /// Files currently in chat, relative to the workspace root
    fn inchat_relative_files(&self) -> Vec<String>;

    /// Add a workspace-relative file to the chat
    fn add_rel_fname(&mut self, rel_fname: &str) -> Result<()>;

    /// Resolve a relative path against the workspace root
    fn abs_root_path(&self, path: &str) -> PathBuf;

    /// Remove a file from the chat. Returns false if it was not in chat.
    fn drop_abs_fname(&mut self, abs_fname: &Path) -> bool;

    /// The last commit the engine made, if any
    fn last_commit(&self) -> Option<CommitRef>;

    /// Unified diff between two revisions
    fn diff_commits(&self, from: &str, to: &str) -> Result<String>;

    /// Undo the last engine commit
    fn undo(&mut self) -> Result<()>;

    /// Current chat transcript
    fn cur_messages(&self) -> Vec<ChatMessage>;

    fn clear_chat_history(&mut self) -> Result<()> {
        Err(CoderError::Unsupported("Clear chat not supported".to_string()))
    }
}

/// Collaborator handle shared between handlers; the lock serializes requests
pub type SharedCoder = Arc<Mutex<Box<dyn Coder>>>;

pub fn shared<C: Coder + 'static>(coder: C) -> SharedCoder {
    Arc::new(Mutex::new(Box::new(coder)))
}
