// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment errors into miette diagnostics.
//!
//! Unknown keys and unknown enum values (`device_map = "tpu"`) get a
//! "did you mean" suggestion and, when the offending file is known, a span
//! pointing at the key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must beat to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with enough context for miette to render.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in [{section}]")]
    #[diagnostic(
        code(myai::config::unknown_key),
        help("{}", suggestion_help(suggestion.as_deref(), "keys", allowed))
    )]
    UnknownKey {
        key: String,
        section: String,
        suggestion: Option<String>,
        allowed: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` does not accept `{value}`")]
    #[diagnostic(
        code(myai::config::unknown_value),
        help("{}", suggestion_help(suggestion.as_deref(), "values", allowed))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        allowed: String,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(myai::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    /// A value that parsed but failed validation.
    #[error("{message}")]
    #[diagnostic(code(myai::config::validation))]
    Validation { message: String },

    /// The bootstrap JSON resource could not be read or parsed.
    #[error("bootstrap resource `{path}`: {message}")]
    #[diagnostic(
        code(myai::config::bootstrap),
        help("expected a JSON object like {{\"seed\": 67, \"startup_prompt\": \"...\"}}")
    )]
    Bootstrap { path: String, message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(myai::config::other))]
    Other(String),
}

fn suggestion_help(suggestion: Option<&str>, noun: &str, allowed: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid {noun}: {allowed}"),
        None => format!("valid {noun}: {allowed}"),
    }
}

/// Dotted key path of a figment error, e.g. `gateway.port`.
fn dotted_path(error: &figment::Error) -> String {
    error.path.join(".")
}

/// Converts every error carried by `err` into a [`ConfigError`].
///
/// `toml_sources` pairs each loaded file path with its content so unknown
/// keys can be located.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate_key(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    section: error.path.first().cloned().unwrap_or_else(|| "root".into()),
                    suggestion: suggest_key(field, expected),
                    allowed: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::UnknownVariant(value, expected) => ConfigError::UnknownValue {
                key: dotted_path(&error),
                value: value.clone(),
                suggestion: suggest_key(value, expected),
                allowed: expected.join(", "),
            },
            Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                key: dotted_path(&error),
                found: found.to_string(),
                expected: expected.clone(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Span of `field` in the file the error came from, when that file is one of
/// `toml_sources`.
fn locate_key(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(origin)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let origin = origin.display().to_string();

    toml_sources
        .iter()
        .find(|(path, _)| *path == origin)
        .and_then(|(path, content)| {
            let offset = find_key_offset(content, &error.path, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(path, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` as a key inside the `[path[0]]` table (or the
/// top level when `path` is empty).
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_section = path.is_empty();

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            in_section = path
                .first()
                .is_some_and(|section| trimmed.trim_end().trim_end_matches('\r') == format!("[{section}]"));
        } else if in_section {
            let is_key = trimmed
                .strip_prefix(field)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_key {
                return Some(offset + (line.len() - trimmed.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// Closest entry of `candidates` to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|&candidate| (strsim::jaro_winkler(unknown, candidate), candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
