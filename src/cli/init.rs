//! taskdeck init command implementation
//!
//! Creates the data directory and a default `taskdeck.toml` inside it.

use std::path::{Path, PathBuf};

use crate::cli::Context;
use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, Report};

#[derive(serde::Serialize)]
struct InitReport {
    data_dir: PathBuf,
    config: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    data_dir: bool,
    config: bool,
}

pub fn run(ctx: &Context) -> Result<()> {
    let created_data_dir = !ctx.data_dir.exists();
    if ctx.data_dir.exists() && !ctx.data_dir.is_dir() {
        return Err(Error::InvalidConfig(format!(
            "data directory path is not a directory: {}",
            ctx.data_dir.display()
        )));
    }
    ctx.medium().init()?;

    let config_path = ctx.data_dir.join(CONFIG_FILE);
    let created_config = ensure_config(&config_path, &ctx.config)?;

    let data = InitReport {
        data_dir: ctx.data_dir.clone(),
        config: config_path.clone(),
        created: InitCreated {
            data_dir: created_data_dir,
            config: created_config,
        },
    };

    let mut created_items = Vec::new();
    if created_data_dir {
        created_items.push("data dir");
    }
    if created_config {
        created_items.push(CONFIG_FILE);
    }

    let header = if created_items.is_empty() {
        "taskdeck init: nothing to do"
    } else {
        "taskdeck init: initialized data directory"
    };

    let mut report = Report::new(header);
    report.field("data dir", ctx.data_dir.display().to_string());
    report.field(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    report.hint("taskdeck add \"<title>\"");

    emit_success(ctx.output(false), "init", &data, Some(&report))
}

fn ensure_config(path: &Path, config: &Config) -> Result<bool> {
    if path.exists() {
        if !path.is_file() {
            return Err(Error::InvalidConfig(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                path.display()
            )));
        }
        return Ok(false);
    }

    config.save(path)?;
    Ok(true)
}
