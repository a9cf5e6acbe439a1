//! Interactive folder prompt used as the directory picker tier.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use photostamp_common::{PhotostampError, PhotostampResult};
use photostamp_render_engine::DirectoryPicker;

/// Asks for a destination folder on stdin. An empty answer cancels.
pub struct PromptDirectoryPicker;

#[async_trait::async_trait]
impl DirectoryPicker for PromptDirectoryPicker {
    fn name(&self) -> &str {
        "prompt"
    }

    fn is_available(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    async fn pick_directory(&self) -> PhotostampResult<PathBuf> {
        let answer = tokio::task::spawn_blocking(|| -> std::io::Result<String> {
            print!("Save to folder (empty to cancel): ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim().to_string())
        })
        .await
        .map_err(|e| PhotostampError::export(format!("Folder prompt failed: {e}")))??;

        if answer.is_empty() {
            return Err(PhotostampError::cancelled("No folder chosen"));
        }
        Ok(PathBuf::from(answer))
    }
}
