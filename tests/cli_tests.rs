//! Integration tests for the aztfmap CLI
//!
//! These tests verify CLI commands work correctly end-to-end.

use std::process::Command;

const DISK_ID: &str =
    "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Compute/disks/disk-1";

/// Get the path to the aztfmap binary
fn aztfmap_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test executable name
    path.pop(); // Remove deps directory

    // In debug mode, binary is at target/debug/aztfmap
    path.push("aztfmap");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

/// Run aztfmap with a clean environment and return output
fn run_aztfmap(args: &[&str]) -> std::process::Output {
    Command::new(aztfmap_binary())
        .args(args)
        .env_remove("AZTFMAP_ACCESS_TOKEN")
        .env_remove("AZTFMAP_SUBSCRIPTION_ID")
        .env_remove("RUST_BACKTRACE")
        .output()
        .expect("Failed to execute aztfmap")
}

#[test]
fn test_aztfmap_version() {
    let output = run_aztfmap(&["--version"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aztfmap"));
}

#[test]
fn test_aztfmap_help() {
    let output = run_aztfmap(&["--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("Commands:"));
    assert!(stdout.contains("resource"));
    assert!(stdout.contains("query"));
}

#[test]
fn test_aztfmap_resource_help() {
    let output = run_aztfmap(&["resource", "--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--type"));
    assert!(stdout.contains("--name"));
}

#[test]
fn test_aztfmap_resource_group_help() {
    let output = run_aztfmap(&["resource-group", "--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("resource-group"));
}

#[test]
fn test_aztfmap_query_help() {
    let output = run_aztfmap(&["query", "--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("predicate"));
}

#[test]
fn test_aztfmap_mapping_file_help() {
    let output = run_aztfmap(&["mapping-file", "--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mapping"));
}

#[test]
fn test_resource_requires_ids() {
    let output = run_aztfmap(&["resource"]);

    assert!(!output.status.success());
}

#[test]
fn test_invalid_provider_pairing_is_reported() {
    let output = run_aztfmap(&["--provider-name", "azuread", "resource", DISK_ID]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("provider name expect to be one of"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_unknown_provider_is_reported() {
    let output = run_aztfmap(&["--provider-name", "google", "resource", DISK_ID]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown resource provider type: google"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_msgraph_ids_require_a_type() {
    let output = run_aztfmap(&[
        "--platform",
        "msgraph",
        "--provider-name",
        "azuread",
        "resource",
        "00000000-0000-0000-0000-000000000001",
    ]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("TF resource type must be specified"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_resource_group_requires_a_token() {
    let output = run_aztfmap(&["--subscription-id", "sub-1", "resource-group", "rg-1"]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("access token"), "stderr: {}", stderr);
}

// ============================================================================
// End-to-end workflow tests with temp directories
// ============================================================================

mod workflow_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Helper to verify no panic occurred in command output
    fn assert_no_panic(output: &std::process::Output, context: &str) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            !stderr.contains("panic") && !stderr.contains("RUST_BACKTRACE"),
            "{} panicked.\nstderr: {}",
            context,
            stderr
        );
    }

    #[test]
    fn test_explicit_resource_offline() {
        let output = run_aztfmap(&["resource", DISK_ID]);

        assert_no_panic(&output, "resource with explicit id");
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("azurerm_managed_disk.res-0"),
            "stdout: {}",
            stdout
        );
    }

    #[test]
    fn test_generate_mapping_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("mapping.json");

        let output = run_aztfmap(&[
            "resource",
            DISK_ID,
            "--generate-mapping-file",
            path.to_str().unwrap(),
        ]);

        assert_no_panic(&output, "resource with mapping file generation");
        assert!(output.status.success());

        let contents = fs::read_to_string(&path).expect("Mapping file was not written");
        assert!(contents.contains("azurerm_managed_disk"));
        assert!(contents.contains(DISK_ID));
    }

    #[test]
    fn test_mapping_file_replay() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("mapping.json");
        fs::write(
            &path,
            format!(
                r#"{{
  "{disk}": {{
    "resource_id": "{disk}",
    "resource_type": "azurerm_managed_disk",
    "resource_name": "data"
  }}
}}"#,
                disk = DISK_ID
            ),
        )
        .expect("Failed to write mapping file");

        let output = run_aztfmap(&["mapping-file", path.to_str().unwrap()]);

        assert_no_panic(&output, "mapping file replay");
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("azurerm_managed_disk.data"),
            "stdout: {}",
            stdout
        );
    }

    #[test]
    fn test_missing_mapping_file_fails_gracefully() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.json");

        let output = run_aztfmap(&["mapping-file", path.to_str().unwrap()]);

        assert_no_panic(&output, "mapping file replay with a missing file");
        assert!(!output.status.success());
    }

    #[test]
    fn test_explicit_type_override() {
        let output = run_aztfmap(&[
            "resource",
            DISK_ID,
            "--type",
            "azurerm_managed_disk",
            "--name",
            "data",
        ]);

        assert_no_panic(&output, "resource with explicit type and name");
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("azurerm_managed_disk.data"),
            "stdout: {}",
            stdout
        );
    }
}
