//! A throwaway lab directory with shell-script stand-ins for the allocator
//! tools.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct Lab {
    dir: TempDir,
}

impl Lab {
    /// Tools that pass every trace with the given utilization and elapsed time.
    pub fn passing(utilization: &str, elapsed_us: u64) -> Self {
        let lab = Self::empty();
        lab.script("runner", &runner_script(utilization, true));
        lab.script("performance", &format!("echo \"Success: {elapsed_us}\"\n"));
        lab
    }

    /// A checker that fails correctness for every trace.
    pub fn failing() -> Self {
        let lab = Self::empty();
        lab.script("runner", &runner_script("60.00", false));
        lab.script("performance", "echo \"Success: 1000\"\n");
        lab
    }

    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("traces")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn trace(&self, name: &str, operation_count: u64) -> PathBuf {
        self.trace_raw(name, &format!("4096\n{operation_count}\n1\na 0 2040\n"))
    }

    pub fn trace_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join("traces").join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.file(name, &format!("#!/bin/sh\n{body}"));
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// `mml` running inside the lab directory.
    pub fn mml(&self) -> Command {
        let mut cmd = Command::cargo_bin("mml").unwrap();
        cmd.current_dir(self.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

fn runner_script(utilization: &str, pass: bool) -> String {
    let marker = if pass {
        "umalloc package passed correctness check."
    } else {
        "umalloc package failed correctness check."
    };
    format!(
        "echo \"Welcome to the MM lab runner\"\n\
         echo \"\"\n\
         echo \"Author: Mock Student\"\n\
         echo \"{marker}\"\n\
         if [ \"$1\" = \"-ru\" ]; then echo \"Final Utilization percentage: {utilization}\"; fi\n"
    )
}
