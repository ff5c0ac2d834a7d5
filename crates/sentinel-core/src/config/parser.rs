//! Loading sentinel.toml, with positioned parse errors

use super::schema::SentinelConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse sentinel.toml with detailed error messages
pub fn parse_sentinel_toml(path: &Path) -> Result<SentinelConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_sentinel_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse sentinel.toml content from string
pub fn parse_sentinel_toml_str(content: &str) -> Result<SentinelConfig> {
    let config: SentinelConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Turn a `toml` error into `line:column: message` followed by an excerpt.
///
/// The position comes from the error's byte span; errors without a span
/// (rare, mostly from custom deserializers) fall back to the bare message.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().trim_end();
    match error.span() {
        Some(span) => {
            let (line, column) = position_of(content, span.start);
            anyhow::anyhow!(
                "TOML parsing error at line {line}, column {column}: {message}\n{}",
                excerpt(content, line, column)
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {message}"),
    }
}

/// 1-based line and column of a byte offset, clamped to the content.
fn position_of(content: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(content.len());
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &content[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line = before.matches('\n').count() + 1;
    let column = before[line_start..].chars().count() + 1;
    (line.min(content.lines().count().max(1)), column)
}

/// The offending line with one line either side and a caret under the column.
fn excerpt(content: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let first = line.saturating_sub(2).min(lines.len());
    let last = (line + 1).min(lines.len());

    let mut out = Vec::new();
    for (idx, text) in lines[first..last].iter().enumerate() {
        let num = first + idx + 1;
        let marker = if num == line { ">>>" } else { "   " };
        out.push(format!("{marker} {num:4} | {text}"));
        if num == line {
            out.push(format!("         | {}^", " ".repeat(column.saturating_sub(1))));
        }
    }
    out.join("\n")
}
