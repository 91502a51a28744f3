//! Deprecated full-page vector path through an external rasterizer.
//!
//! The rasterizer is invoked as `executable input output pageNumber`
//! with a 1-based page number and is expected to write one SVG document
//! to `output`. It runs with null stdio and is killed once the configured
//! timeout elapses.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use pdflayer_core::RasterizerConfig;
use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Why a page could not be rasterized.
#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("cannot start rasterizer {executable}: {source}")]
    Spawn {
        executable: String,
        #[source]
        source: io::Error,
    },

    #[error("rasterizer timed out after {0:?}")]
    Timeout(Duration),

    #[error("rasterizer exited with {0}")]
    Failed(ExitStatus),

    #[error("rasterizer wrote no output")]
    MissingOutput,

    #[error("rasterizer I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Render page `page_index` (0-based) of the document at `input` and
/// return the produced SVG markup.
pub fn rasterize_page(
    config: &RasterizerConfig,
    input: &Path,
    page_index: usize,
) -> Result<String, RasterizeError> {
    let workdir = tempfile::tempdir()?;
    let page_number = page_index + 1;
    let output = workdir.path().join(format!("page-{page_number}.svg"));

    let mut child = Command::new(&config.executable)
        .arg(input)
        .arg(&output)
        .arg(page_number.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| RasterizeError::Spawn {
            executable: config.executable.display().to_string(),
            source,
        })?;

    // `None` when the timeout is too large to represent; wait indefinitely.
    let deadline = Instant::now().checked_add(config.timeout);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            // the child may exit between try_wait and kill
            let _ = child.kill();
            let _ = child.wait();
            return Err(RasterizeError::Timeout(config.timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };
    if !status.success() {
        return Err(RasterizeError::Failed(status));
    }

    let svg = match std::fs::read_to_string(&output) {
        Ok(svg) => svg,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(RasterizeError::MissingOutput),
        Err(e) => return Err(e.into()),
    };
    if svg.trim().is_empty() {
        return Err(RasterizeError::MissingOutput);
    }
    debug!(page = page_index, bytes = svg.len(), "rasterized page");
    Ok(svg)
}
