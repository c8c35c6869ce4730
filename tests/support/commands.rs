//! Helpers for running the vpnpod binary.

use std::path::PathBuf;

use assert_cmd::Command;

use super::Test;

impl Test {
    /// The vpnpod binary, isolated from the user's environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("vpnpod").expect("binary not built");
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("NO_COLOR", "1")
            .env_remove("VPNPOD_PASSWORD")
            .env_remove("VPNPOD_LOG");
        cmd
    }

    /// Write a settings file and return its path.
    pub fn settings_file(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("settings.toml");
        std::fs::write(&path, contents).expect("failed to write settings");
        path
    }

    /// Settings using `binary` as the container runtime.
    ///
    /// `true` makes every object exist and every call succeed; `false`
    /// makes nothing exist.
    pub fn with_runtime(&self, binary: &str) -> PathBuf {
        self.settings_file(&format!("[runtime]\nbinary = \"{}\"\n", binary))
    }
}
