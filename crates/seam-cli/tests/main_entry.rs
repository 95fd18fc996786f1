//! Integration tests for the `seam` binary entry point.
//!
//! Verifies exit codes, the stdout summary, user-facing error messages and
//! the files left on disk. Most tests select the Tree-sitter provider so they
//! run without libclang; the libclang test is skipped when it cannot load.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use seam_syntax::ClangProvider;
use tempfile::TempDir;

const RENDER_PASS_SOURCE: &str = include_str!("../../seam-syntax/tests/fixtures/render_pass.c");
const RENDER_PASS_HEADER: &str = include_str!("../../seam-syntax/tests/fixtures/render_pass.h");

const DEVICE_SOURCE: &str = "\
#include <stdlib.h>

static int helper(void) {
    return 0;
}

void wgpuDeviceRelease(void *device) {
    free(device);
}

void wgpuDeviceTick(void *device) {
}
";

const DEVICE_INSTRUMENTED: &str = "\
#include <stdlib.h>

static int helper(void) {
    return 0;
}

void wgpuDeviceRelease(void *device) {
    ENTRY();
    free(device);
    EXIT();
}

void wgpuDeviceTick(void *device) {
    ENTRY();
    EXIT();
}
";

/// The `seam` binary configured for the Tree-sitter provider.
fn seam() -> Command {
    let mut command = cargo_bin_cmd!("seam");
    command.env("SEAM_PROVIDER", "tree-sitter");
    command
}

fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(error) => panic!("failed to create temporary directory: {error}"),
    }
}

#[test]
fn instruments_file_and_reports_output() {
    let dir = temp_dir();
    let input = dir.path().join("device.c");
    fs::write(&input, DEVICE_SOURCE).unwrap_or_else(|error| panic!("write input: {error}"));

    let mut command = seam();
    command.arg(&input).arg("-Iinclude");
    command
        .assert()
        .success()
        .stdout(contains("Successfully wrote instrumented file to").and(contains(
            "device_instrumented.c",
        )));

    let output = fs::read_to_string(dir.path().join("device_instrumented.c"))
        .unwrap_or_else(|error| panic!("read output: {error}"));
    assert_eq!(output, DEVICE_INSTRUMENTED);
    let original =
        fs::read_to_string(&input).unwrap_or_else(|error| panic!("read input: {error}"));
    assert_eq!(original, DEVICE_SOURCE);
}

#[test]
fn environment_selects_prefix() {
    let dir = temp_dir();
    let input = dir.path().join("device.c");
    fs::write(&input, DEVICE_SOURCE).unwrap_or_else(|error| panic!("write input: {error}"));

    let mut command = seam();
    command.env("SEAM_PREFIX", "help").arg(&input);
    command.assert().success();

    let output = fs::read_to_string(dir.path().join("device_instrumented.c"))
        .unwrap_or_else(|error| panic!("read output: {error}"));
    assert!(output.contains("static int helper(void) {\n    ENTRY();\n    return 0;\n    EXIT();\n}"));
    assert!(output.contains("void wgpuDeviceTick(void *device) {\n}"));
}

#[test]
fn missing_file_exits_with_failure() {
    let dir = temp_dir();
    let missing = dir.path().join("absent.c");

    let mut command = cargo_bin_cmd!("seam");
    command.arg(&missing);
    command
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error: File not found at"));
}

#[test]
fn nothing_to_instrument_writes_no_file() {
    let dir = temp_dir();
    let input = dir.path().join("main.c");
    fs::write(&input, "int main(void) {\n    return 0;\n}\n")
        .unwrap_or_else(|error| panic!("write input: {error}"));

    let mut command = seam();
    command.arg(&input);
    command
        .assert()
        .success()
        .stdout(contains("No 'wgpu' function definitions found to instrument."));

    assert!(!dir.path().join("main_instrumented.c").exists());
}

#[test]
fn parse_errors_exit_with_failure() {
    let dir = temp_dir();
    let input = dir.path().join("broken.c");
    fs::write(&input, "void wgpuBroken(void) {\n    int x = ;\n}\n")
        .unwrap_or_else(|error| panic!("write input: {error}"));

    let mut command = seam();
    command.arg(&input);
    command
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Parsing Error:").and(contains("-isystem")));

    assert!(!dir.path().join("broken_instrumented.c").exists());
}

#[test]
fn missing_arguments_exit_with_failure() {
    let mut command = cargo_bin_cmd!("seam");
    command.assert().failure().code(1).stderr(contains("<FILE>"));
}

#[test]
fn default_provider_preprocesses_macros() {
    if let Err(error) = ClangProvider::check_available() {
        eprintln!("skipping libclang test: {error}");
        return;
    }
    let dir = temp_dir();
    fs::write(dir.path().join("render_pass.h"), RENDER_PASS_HEADER)
        .unwrap_or_else(|error| panic!("write header: {error}"));
    let input = dir.path().join("render_pass.c");
    fs::write(&input, RENDER_PASS_SOURCE).unwrap_or_else(|error| panic!("write input: {error}"));

    let mut command = cargo_bin_cmd!("seam");
    command.env_remove("SEAM_PROVIDER").arg(&input).arg("-DNDEBUG");
    command
        .assert()
        .success()
        .stdout(contains("render_pass_instrumented.c"));

    let output = fs::read_to_string(dir.path().join("render_pass_instrumented.c"))
        .unwrap_or_else(|error| panic!("read output: {error}"));
    assert!(output.contains("{\n    ENTRY();\n    RenderPassLayout ret zeroinit;\n"));
    assert_eq!(output.matches("ENTRY();").count(), 2);
    assert_eq!(output.matches("EXIT();").count(), 2);
}
