#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Throwaway data directory for one test.
pub struct TestDeck {
    dir: TempDir,
}

impl TestDeck {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let dir = self.data_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join("taskdeck.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn tasks_blob(&self) -> Option<String> {
        fs::read_to_string(self.data_dir().join("task-manager-tasks.json")).ok()
    }

    pub fn write_tasks_blob(&self, contents: &str) -> std::io::Result<()> {
        let dir = self.data_dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("task-manager-tasks.json"), contents)
    }

    /// `taskdeck` pinned to this data directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskdeck_cmd();
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd.current_dir(self.path());
        cmd
    }

    /// Run with `--json` and return the `data` member of the envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run taskdeck");
        assert!(
            output.status.success(),
            "taskdeck {args:?} failed: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        envelope["data"].clone()
    }

    /// Add a task and return its id.
    pub fn add(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let data = self.json(&full);
        data["id"].as_str().expect("task id").to_string()
    }
}

pub fn taskdeck_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskdeck").expect("binary");
    cmd.env_remove("TASKDECK_DATA_DIR")
        .env_remove("PORT")
        .env_remove("HOST")
        .env_remove("RUST_LOG");
    cmd
}
