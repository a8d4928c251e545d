//! What commands print: a JSON envelope for `--json`, a plain-text report
//! otherwise, and a matching pair for errors.

use std::fmt;

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};
use crate::storage::StorageError;

pub const SCHEMA_VERSION: &str = "taskdeck.v1";

/// Flags that take a value and may appear before the subcommand.
const VALUE_FLAGS: [&str; 3] = ["--data-dir", "--config", "--events"];

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text result of a command.
#[derive(Debug, Clone, Default)]
pub struct Report {
    headline: String,
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    warnings: Vec<String>,
    hints: Vec<String>,
}

impl Report {
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            ..Self::default()
        }
    }

    pub fn field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.warnings.push(text.into());
    }

    pub fn warn_all(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    pub fn hint(&mut self, command: impl Into<String>) {
        self.hints.push(command.into());
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline)?;

        if !self.fields.is_empty() {
            let width = self
                .fields
                .iter()
                .map(|(name, _)| name.chars().count())
                .max()
                .unwrap_or(0);
            writeln!(f)?;
            for (name, value) in &self.fields {
                write!(f, "\n  {name:<width$}  {value}")?;
            }
        }

        if !self.lines.is_empty() {
            writeln!(f)?;
            for line in &self.lines {
                write!(f, "\n  {line}")?;
            }
        }

        if !self.warnings.is_empty() || !self.hints.is_empty() {
            writeln!(f)?;
        }
        for warning in &self.warnings {
            write!(f, "\nwarning: {warning}")?;
        }
        for hint in &self.hints {
            write!(f, "\nnext: {hint}")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    #[serde(flatten)]
    outcome: Outcome<'a, T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Outcome<'a, T: Serialize> {
    Success { data: &'a T },
    Error { error: ErrorBody },
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn print_json<T: Serialize>(envelope: &Envelope<'_, T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: Option<&Report>,
) -> Result<()> {
    if options.json {
        return print_json(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            outcome: Outcome::Success { data },
            warnings: report.map(|r| r.warnings.clone()).unwrap_or_default(),
            next_steps: report.map(|r| r.hints.clone()).unwrap_or_default(),
        });
    }

    match report {
        Some(report) if !options.quiet => println!("{report}"),
        // Warnings still reach the terminal when regular output is quiet.
        Some(report) => {
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
        }
        None => {}
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints = error_next_steps(err);

    if json {
        return print_json(&Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            outcome: Outcome::Error {
                error: ErrorBody {
                    message: err.to_string(),
                    code: err.exit_code(),
                    kind: error_kind(err),
                    details: err.details(),
                },
            },
            warnings: Vec::new(),
            next_steps: hints,
        });
    }

    eprintln!("error: {err}");
    if let Some(hint) = hints.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// First positional argument, skipping global flags and their values, or
/// `taskdeck` when there is none.
pub fn command_name<I>(args: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
        } else if !arg.starts_with('-') {
            return arg;
        }
    }
    "taskdeck".to_string()
}

pub(crate) fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::Validation { .. } => "validation",
        Error::TaskNotFound(_) => "not_found",
        Error::Storage(_) => "storage",
        _ if err.exit_code() == exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    let steps: &[&str] = match err {
        Error::TaskNotFound(_) => &["taskdeck list"],
        Error::Storage(StorageError::QuotaExceeded { .. }) => &[
            "delete finished tasks with `taskdeck rm <id>`",
            "raise storage.quota_bytes in taskdeck.toml",
        ],
        Error::InvalidConfig(_) => &["fix taskdeck.toml then retry"],
        Error::Server(_) => &["build the web client or pass --static-dir"],
        _ => &[],
    };
    steps.iter().map(|step| step.to_string()).collect()
}
