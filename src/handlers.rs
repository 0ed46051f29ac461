// src/handlers.rs
// Handler classes for the API endpoint groups, each wrapping the shared Coder

use tracing::{error, info};

use crate::coder::{ChatMessage, ChatReply, EditRecord, Role, SharedCoder};
use crate::error::{CoderError, Result};

/// Chat turns and transcript
#[derive(Clone)]
pub struct ChatHandler {
    coder: SharedCoder,
}

impl ChatHandler {
    pub fn new(coder: SharedCoder) -> Self {
        Self { coder }
    }

    /// Send a message and collect the engine's reply plus any commit it made.
    /// Engine failures are reported in-band as a system message.
    ///
    /// An edit is reported only for a commit made during this turn; an older
    /// engine commit is not repeated on later replies.
    pub async fn send_message(&self, message: &str, role: Role) -> Result<ChatReply> {
        if message.is_empty() {
            return Err(CoderError::invalid_input("Message is required"));
        }

        let mut coder = self.coder.lock().await;
        if role == Role::User {
            coder.add_to_input_history(message);
        }

        let before = coder.last_commit();
        let mut reply = ChatReply::default();

        match coder.run(message).await {
            Ok(Some(content)) => reply
                .messages
                .push(ChatMessage::new(Role::Assistant, content)),
            Ok(None) => {}
            Err(e) => {
                error!("Error running coder: {}", e);
                reply
                    .messages
                    .push(ChatMessage::new(Role::System, format!("Error: {e}")));
            }
        }

        if let Some(commit) = coder.last_commit()
            && before.as_ref() != Some(&commit)
        {
            reply.edits.push(EditRecord {
                commit_hash: commit.hash,
                commit_message: commit.message,
                fnames: coder.inchat_relative_files(),
            });
        }

        Ok(reply)
    }

    pub async fn get_history(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.coder.lock().await.cur_messages())
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.coder.lock().await.clear_chat_history()?;
        info!("Chat history cleared");
        Ok(())
    }
}

/// Files in chat
#[derive(Clone)]
pub struct FilesHandler {
    coder: SharedCoder,
}

impl FilesHandler {
    pub fn new(coder: SharedCoder) -> Self {
        Self { coder }
    }

    pub async fn get_files(&self) -> Result<Vec<String>> {
        Ok(self.coder.lock().await.inchat_relative_files())
    }

    pub async fn add_file(&self, file_path: &str) -> Result<()> {
        if file_path.is_empty() {
            return Err(CoderError::invalid_input("File path is required"));
        }
        self.coder.lock().await.add_rel_fname(file_path)
    }

    /// Fails with `NotInChat` if the file was never added
    pub async fn remove_file(&self, file_path: &str) -> Result<()> {
        if file_path.is_empty() {
            return Err(CoderError::invalid_input("File path is required"));
        }

        let mut coder = self.coder.lock().await;
        let abs_path = coder.abs_root_path(file_path);
        if coder.drop_abs_fname(&abs_path) {
            info!("Removed {} from the chat", file_path);
            Ok(())
        } else {
            Err(CoderError::NotInChat)
        }
    }
}

#[derive(Clone)]
pub struct DiffHandler {
    coder: SharedCoder,
}

impl DiffHandler {
    pub fn new(coder: SharedCoder) -> Self {
        Self { coder }
    }

    /// Diff of the last engine commit against its parent, or "" if none
    pub async fn get_diff(&self) -> Result<String> {
        let coder = self.coder.lock().await;
        match coder.last_commit() {
            Some(commit) => coder.diff_commits(&format!("{}~1", commit.hash), &commit.hash),
            None => Ok(String::new()),
        }
    }
}

#[derive(Clone)]
pub struct UndoHandler {
    coder: SharedCoder,
}

impl UndoHandler {
    pub fn new(coder: SharedCoder) -> Self {
        Self { coder }
    }

    pub async fn undo_last_commit(&self) -> Result<()> {
        self.coder.lock().await.undo()
    }
}
