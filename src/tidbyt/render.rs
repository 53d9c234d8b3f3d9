//! Rendering display applets with the external `pixlet` tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::debug;

use crate::error::RenderError;

/// Produces the image to show on the display.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self) -> Result<Bytes, RenderError>;
}

/// Renders one applet file, optionally rewriting some of its string
/// constants first.
#[derive(Debug, Clone)]
pub struct PixletRenderer {
    binary: String,
    applet: PathBuf,
    replacements: Vec<(String, String)>,
}

impl PixletRenderer {
    pub fn new(binary: impl Into<String>, applet: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            applet: applet.into(),
            replacements: Vec::new(),
        }
    }

    /// Sets `key = "value"` in the applet before rendering. Applets cannot
    /// read the environment, so this is how server URLs reach them.
    pub fn with_replacement(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.replacements.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl Renderer for PixletRenderer {
    #[tracing::instrument(skip(self), fields(applet = %self.applet.display()))]
    async fn render(&self) -> Result<Bytes, RenderError> {
        if self.replacements.is_empty() {
            return render_applet(&self.binary, &self.applet).await;
        }

        let applet_error = |source| RenderError::Applet {
            path: self.applet.display().to_string(),
            source,
        };
        let content = tokio::fs::read_to_string(&self.applet)
            .await
            .map_err(applet_error)?;
        let modified = replace_constants(&content, &self.replacements);

        // Kept alive until the render finishes; removed on drop.
        let rewritten = tempfile::Builder::new()
            .suffix(".star")
            .tempfile()
            .map_err(applet_error)?;
        tokio::fs::write(rewritten.path(), modified)
            .await
            .map_err(applet_error)?;

        render_applet(&self.binary, rewritten.path()).await
    }
}

/// Runs `<binary> render <path> --silent --output -` and returns the image
/// written to stdout.
pub async fn render_applet(binary: &str, path: &Path) -> Result<Bytes, RenderError> {
    debug!(binary, path = %path.display(), "rendering applet");
    let output = Command::new(binary)
        .arg("render")
        .arg(path)
        .args(["--silent", "--output", "-"])
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| RenderError::Spawn {
            binary: binary.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(RenderError::Exit {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }

    Ok(Bytes::from(output.stdout))
}

/// Rewrites every `KEY = "..."` (or single-quoted) assignment of the given
/// keys to `KEY = "value"`. Other lines are left untouched.
pub fn replace_constants(content: &str, replacements: &[(String, String)]) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let replaced = replacements
            .iter()
            .find_map(|(key, value)| replace_assignment(line, key, value));
        match replaced {
            Some(replaced) => out.push_str(&replaced),
            None => out.push_str(line),
        }
    }
    out
}

fn replace_assignment(line: &str, key: &str, value: &str) -> Option<String> {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);

    let rest = rest.strip_prefix(key)?;
    // `API_URL_V2` must not match `API_URL`
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let literal_len = rest[1..].find(quote)? + 2;
    let tail = &rest[literal_len..];

    Some(format!("{indent}{key} = \"{value}\"{tail}"))
}
