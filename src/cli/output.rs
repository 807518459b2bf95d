use std::fmt::Write as FmtWrite;
use std::path::PathBuf;

use crate::models::{OutputFormat, SearchResults};
use crate::services::{IngestSummary, StoreStats};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_ingest_summary(&self, summary: &IngestSummary) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub store_dir: PathBuf,
    pub store: StoreStats,
    pub embedder: String,
    pub embedder_ready: bool,
    /// Model reported by the embedder, or why it is not ready
    pub embedder_detail: Option<String>,
}

fn render(write: impl FnOnce(&mut String) -> std::fmt::Result) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write(&mut output);
    output
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{head}...")
    } else {
        head
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        render(|output| {
            writeln!(output, "Search results for: \"{}\"", results.query)?;
            writeln!(
                output,
                "Top {} of {} chunks in {}ms\n",
                results.len(),
                results.store_size,
                results.duration_ms
            )?;

            for (i, hit) in results.hits.iter().enumerate() {
                writeln!(
                    output,
                    "{}. [Score: {:.3}] {} (doc {}, chunk {})",
                    i + 1,
                    hit.score,
                    hit.chunk.source,
                    hit.chunk.doc_id,
                    hit.chunk.chunk_id
                )?;
                writeln!(output, "   {}", preview(&hit.chunk.text))?;
                writeln!(output)?;
            }
            Ok(())
        })
    }

    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        render(|output| {
            writeln!(output, "Ingestion Complete")?;
            writeln!(output, "------------------")?;
            writeln!(output, "Files found:    {}", summary.files_found)?;
            writeln!(output, "Files ingested: {}", summary.files_ingested)?;
            writeln!(output, "Files skipped:  {}", summary.files_skipped)?;
            writeln!(output, "Chunks indexed: {}", summary.chunks_indexed)?;
            writeln!(output, "Metadata rows:  {}", summary.total_rows)?;
            writeln!(output, "Store:          {}", summary.store_dir.display())?;
            writeln!(output, "Duration:       {}ms", summary.duration_ms)?;
            if !summary.skipped.is_empty() {
                writeln!(output, "\nSkipped:")?;
                for skip in &summary.skipped {
                    writeln!(output, "  {}: {}", skip.source, skip.reason)?;
                }
            }
            Ok(())
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        render(|output| {
            writeln!(output, "Status")?;
            writeln!(output, "------")?;
            writeln!(output, "Vector Store:  {}", status.store_dir.display())?;
            writeln!(output, "  Dimension:   {}", status.store.dimension)?;
            writeln!(output, "  Rows:        {}", status.store.rows)?;
            writeln!(output, "  Documents:   {}", status.store.documents)?;
            writeln!(output, "  Sources:     {}", status.store.sources)?;
            writeln!(
                output,
                "  Index:       {}",
                human_bytes(status.store.index_bytes)
            )?;
            writeln!(
                output,
                "  Metadata:    {}",
                human_bytes(status.store.metadata_bytes)
            )?;
            writeln!(output)?;

            let state = if status.embedder_ready {
                "[READY]"
            } else {
                "[UNAVAILABLE]"
            };
            writeln!(output, "Embedder:      {} {}", status.embedder, state)?;
            if let Some(ref detail) = status.embedder_detail {
                writeln!(output, "  {detail}")?;
            }
            Ok(())
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        match encoded {
            Ok(json) => format!("{json}\n"),
            Err(e) => format!("{}\n", serde_json::json!({ "error": e.to_string() })),
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        self.to_json(results)
    }

    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        self.to_json(summary)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "store": {
                "dir": status.store_dir,
                "dimension": status.store.dimension,
                "rows": status.store.rows,
                "documents": status.store.documents,
                "sources": status.store.sources,
                "index_bytes": status.store.index_bytes,
                "metadata_bytes": status.store.metadata_bytes,
            },
            "embedder": {
                "name": status.embedder,
                "ready": status.embedder_ready,
                "detail": status.embedder_detail,
            }
        });
        self.to_json(&json)
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", serde_json::json!({"message": message}))
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({"error": error}))
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        render(|output| {
            writeln!(output, "## Search Results\n")?;
            writeln!(output, "**Query:** `{}`\n", results.query)?;
            writeln!(
                output,
                "Top {} of {} chunks in {}ms\n",
                results.len(),
                results.store_size,
                results.duration_ms
            )?;

            for (i, hit) in results.hits.iter().enumerate() {
                writeln!(output, "### {}. Score: {:.3}\n", i + 1, hit.score)?;
                writeln!(
                    output,
                    "**Source:** `{}` (doc {}, chunk {})\n",
                    hit.chunk.source, hit.chunk.doc_id, hit.chunk.chunk_id
                )?;
                writeln!(output, "```")?;
                writeln!(output, "{}", hit.chunk.text)?;
                writeln!(output, "```\n")?;
            }
            Ok(())
        })
    }

    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        render(|output| {
            writeln!(output, "## Ingestion Complete\n")?;
            writeln!(output, "| Metric | Value |")?;
            writeln!(output, "|--------|-------|")?;
            writeln!(output, "| Files found | {} |", summary.files_found)?;
            writeln!(output, "| Files ingested | {} |", summary.files_ingested)?;
            writeln!(output, "| Files skipped | {} |", summary.files_skipped)?;
            writeln!(output, "| Chunks indexed | {} |", summary.chunks_indexed)?;
            writeln!(output, "| Metadata rows | {} |", summary.total_rows)?;
            writeln!(output, "| Store | `{}` |", summary.store_dir.display())?;
            writeln!(output, "| Duration | {}ms |", summary.duration_ms)?;
            if !summary.skipped.is_empty() {
                writeln!(output, "\n### Skipped\n")?;
                for skip in &summary.skipped {
                    writeln!(output, "- `{}`: {}", skip.source, skip.reason)?;
                }
            }
            Ok(())
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        render(|output| {
            writeln!(output, "## Status\n")?;
            writeln!(output, "### Vector Store\n")?;
            writeln!(output, "- **Directory:** `{}`", status.store_dir.display())?;
            writeln!(output, "- **Dimension:** {}", status.store.dimension)?;
            writeln!(output, "- **Rows:** {}", status.store.rows)?;
            writeln!(output, "- **Documents:** {}", status.store.documents)?;
            writeln!(output, "- **Sources:** {}", status.store.sources)?;
            writeln!(
                output,
                "- **Index:** {}",
                human_bytes(status.store.index_bytes)
            )?;
            writeln!(
                output,
                "- **Metadata:** {}\n",
                human_bytes(status.store.metadata_bytes)
            )?;

            let state = if status.embedder_ready { "✅" } else { "❌" };
            writeln!(output, "### Embedder {}\n", state)?;
            writeln!(output, "- **Adapter:** {}", status.embedder)?;
            if let Some(ref detail) = status.embedder_detail {
                writeln!(output, "- **Detail:** {}", detail)?;
            }
            Ok(())
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
