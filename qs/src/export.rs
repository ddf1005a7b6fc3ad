//! Chat transcript export to size-capped markdown files

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::chunk::{Block, Chunk, split};
use crate::error::{StoreError, StoreResult};

/// Date format used in export headers
const HEADER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
struct ChatSession {
    #[serde(default)]
    requests: Vec<ChatRequest>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: ChatMessage,
    #[serde(default)]
    response: Vec<ChatResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponsePart {
    #[serde(default)]
    value: Value,
}

/// Render a chat session JSON document into one block per request
pub fn transcript_blocks(session_json: &str) -> Result<Vec<Block>, serde_json::Error> {
    let session: ChatSession = serde_json::from_str(session_json)?;

    let blocks = session
        .requests
        .into_iter()
        .map(|req| {
            let mut text = format!("\n\n## User\n{}", req.message.text);

            let reply: String = req
                .response
                .iter()
                .filter_map(|part| part.value.as_str())
                .collect();
            if !reply.trim().is_empty() {
                text.push_str("\n\n## Assistant\n");
                text.push_str(&reply);
            }

            text.push_str("\n\n---");
            Block::from_text(text)
        })
        .collect();

    Ok(blocks)
}

/// Export a chat session file to markdown, splitting at `max_lines`
///
/// Returns the written files in order. A single part is written to `output`
/// itself; several parts become `{stem}_partNNN{ext}` beside it.
pub fn export_chat(source: &Path, output: &Path, max_lines: usize, now: DateTime<Local>) -> StoreResult<Vec<PathBuf>> {
    debug!(?source, ?output, %max_lines, "export_chat: called");
    if max_lines == 0 {
        return Err(StoreError::InvalidArgument("max lines must be at least 1".to_string()));
    }
    let content = fs::read_to_string(source).map_err(|e| StoreError::corrupt(source, format!("unreadable: {}", e)))?;
    let blocks = transcript_blocks(&content).map_err(|e| StoreError::corrupt(source, e.to_string()))?;
    let chunks = split(blocks, max_lines)?;
    if chunks.is_empty() {
        debug!("export_chat: session has no requests");
        return Ok(Vec::new());
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::storage(parent, e))?;
    }

    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let date = now.format(HEADER_DATE_FORMAT).to_string();

    let written = if chunks.len() == 1 {
        let header = format!(
            "# Chat History (Auto-Extracted)\nSource: {}\nDate: {}\n---",
            source_name, date
        );
        write_part(output, &header, &chunks[0])?;
        vec![output.to_path_buf()]
    } else {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let idx = i + 1;
                let path = part_path(output, idx);
                let header = format!(
                    "# Chat History (Part {})\nSource: {}\nDate: {}\n---\n",
                    idx, source_name, date
                );
                write_part(&path, &header, chunk)?;
                Ok(path)
            })
            .collect::<StoreResult<Vec<_>>>()?
    };

    info!(parts = written.len(), "Exported chat transcript");
    Ok(written)
}

/// `{stem}_partNNN{ext}` next to `output`
pub fn part_path(output: &Path, idx: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "export".to_string());
    let ext = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    output.with_file_name(format!("{}_part{:03}{}", stem, idx, ext))
}

fn write_part(path: &Path, header: &str, chunk: &Chunk) -> StoreResult<()> {
    let mut body = String::with_capacity(header.len() + chunk.blocks.iter().map(|b| b.text.len()).sum::<usize>());
    body.push_str(header);
    body.push_str(&chunk.text());
    fs::write(path, body).map_err(|e| StoreError::storage(path, e))
}
