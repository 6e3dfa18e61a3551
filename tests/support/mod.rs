use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Scratch home for running the `tk` binary against a private task document.
pub struct TkEnv {
    dir: TempDir,
}

impl TkEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn read_data(&self) -> String {
        fs::read_to_string(self.data_path()).expect("read task document")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        fs::write(&path, contents).expect("write file");
        path
    }

    /// `tk` with `--data` pointed at this env and the user's config hidden.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tk").expect("binary");
        cmd.env_remove("TK_DATA")
            .env_remove("TK_CONFIG")
            .env_remove("RUST_LOG")
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .arg("--data")
            .arg(self.data_path());
        cmd
    }

    /// Run with `--json`, assert success, and return the envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run tk");
        assert!(
            output.status.success(),
            "tk {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    pub fn add(&self, id: &str, title: &str) {
        self.json(&["add", title, "--id", id]);
    }
}

pub fn ids(list: &Value) -> Vec<String> {
    list["data"]["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["id"].as_str().expect("id").to_string())
        .collect()
}
