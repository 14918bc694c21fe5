use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use crate::squash::{self, SquashError};

/// Errors from editor operations
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Failed to create temp file: {0}")]
    TempFileError(#[from] std::io::Error),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("No editor found. Set $EDITOR or $VISUAL environment variable")]
    NoEditorFound,
    #[error("Empty message; keeping the previous text")]
    EmptyMessage,
}

impl From<SquashError> for EditorError {
    fn from(err: SquashError) -> Self {
        match err {
            SquashError::EmptyMessage => EditorError::EmptyMessage,
        }
    }
}

/// Trait for opening an editor - allows mocking in tests
pub trait Editor {
    /// Open editor with initial content, return the edited content with comment
    /// lines removed. `comment_help` is appended as `#` lines for guidance.
    fn edit(&self, initial: &str, comment_help: &str) -> Result<String, EditorError>;
}

/// System editor implementation - uses $EDITOR, $VISUAL, or fallbacks
#[derive(Default)]
pub struct SystemEditor {
    command: Option<String>,
}

impl SystemEditor {
    pub fn new() -> Self {
        Self { command: None }
    }

    /// Use a fixed editor command instead of looking one up
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    fn find_editor(&self) -> Result<String, EditorError> {
        if let Some(command) = &self.command {
            return Ok(command.clone());
        }
        for var in ["GIT_EDITOR", "EDITOR", "VISUAL"] {
            if let Ok(editor) = env::var(var) {
                if !editor.trim().is_empty() {
                    return Ok(editor);
                }
            }
        }

        for editor in &["vim", "vi", "nano", "notepad"] {
            if Command::new("which")
                .arg(editor)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
            {
                return Ok(editor.to_string());
            }
        }

        Err(EditorError::NoEditorFound)
    }
}

impl Editor for SystemEditor {
    fn edit(&self, initial: &str, comment_help: &str) -> Result<String, EditorError> {
        let editor = self.find_editor()?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("git-replan-")
            .suffix(".txt")
            .tempfile()?;

        temp_file.write_all(initial.as_bytes())?;

        if !comment_help.is_empty() {
            temp_file.write_all(b"\n\n")?;
            for line in comment_help.lines() {
                temp_file.write_all(b"# ")?;
                temp_file.write_all(line.as_bytes())?;
                temp_file.write_all(b"\n")?;
            }
        }

        temp_file.flush()?;

        // NamedTempFile deletes on drop; keep only the path while the editor runs
        let temp_path = temp_file.into_temp_path();

        // The command may carry arguments, e.g. "code --wait"
        let mut parts = editor.split_whitespace();
        let cmd = parts.next().ok_or(EditorError::NoEditorFound)?;
        let args: Vec<&str> = parts.collect();

        let status = Command::new(cmd)
            .args(&args)
            .arg(&temp_path)
            .status()
            .map_err(|e| EditorError::EditorFailed(e.to_string()))?;

        if !status.success() {
            return Err(EditorError::EditorFailed(format!(
                "Editor exited with status: {}",
                status
            )));
        }

        let content = fs::read_to_string(&temp_path)?;

        Ok(squash::extract_final(&content)?)
    }
}
