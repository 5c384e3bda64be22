//! Integration tests for CLI argument handling
//!
//! Runs the binary for commands that need no network access: help output,
//! argument errors and image URL building.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_folio"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute folio")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("folio"), "Help should mention folio");
    assert!(stdout.contains("projects"), "Help should list the projects command");
    assert!(stdout.contains("image"), "Help should list the image command");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Expected missing subcommand to fail");
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["forecast"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unrecognized") || stderr.contains("invalid"),
        "Should print error message about the subcommand: {}",
        stderr
    );
}

#[test]
fn test_image_command_prints_json() {
    let output = run_cli(&["image", "image-abc123-800x600-jpg", "--preset", "project.card"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["width"], 500);
    assert_eq!(value["height"], 300);
    assert!(value["src"]
        .as_str()
        .unwrap()
        .contains("abc123-800x600.jpg?w=500&h=300&q=85&fm=webp&fit=crop"));
}

#[test]
fn test_image_command_invalid_preset_prints_error_and_exits() {
    let output = run_cli(&["image", "image-abc123-800x600-jpg", "--preset", "poster"]);
    assert!(!output.status.success(), "Expected invalid preset to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid preset"),
        "Should print error message about the preset: {}",
        stderr
    );
}

#[test]
fn test_image_command_with_env_file_uses_its_project() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let env_path = dir.path().join("site.env");
    std::fs::write(&env_path, "SANITY_PROJECT_ID=envproj\nSANITY_DATASET=staging\n")
        .expect("Failed to write env file");

    let output = run_cli(&[
        "--env-file",
        env_path.to_str().unwrap(),
        "image",
        "image-abc123-800x600-jpg",
        "--width",
        "10",
        "--height",
        "10",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/images/envproj/staging/"), "stdout: {}", stdout);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use folio::cli::{Cli, CliError, Command};
    use folio::image::{Dimensions, ImageSize};

    #[test]
    fn test_cli_parse_recent() {
        let cli = Cli::parse_from(["folio", "recent"]);
        assert_eq!(cli.command, Command::Recent);
    }

    #[test]
    fn test_cli_parse_home_pretty() {
        let cli = Cli::parse_from(["folio", "--pretty", "home"]);
        assert!(cli.pretty);
        assert_eq!(cli.command, Command::Home);
    }

    #[test]
    fn test_cli_project_requires_slug() {
        assert!(Cli::try_parse_from(["folio", "project"]).is_err());
    }

    #[test]
    fn test_image_args_size_resolution() {
        let cli = Cli::parse_from([
            "folio",
            "image",
            "image-abc-1x1-png",
            "--width",
            "32",
            "--height",
            "16",
        ]);
        let Command::Image(args) = cli.command else {
            panic!("expected image command");
        };
        assert_eq!(args.size(), Ok(ImageSize::Custom(Dimensions::new(32, 16))));
    }

    #[test]
    fn test_image_args_without_size_is_rejected() {
        let cli = Cli::parse_from(["folio", "image", "image-abc-1x1-png"]);
        let Command::Image(args) = cli.command else {
            panic!("expected image command");
        };
        assert_eq!(args.size(), Err(CliError::MissingImageSize));
    }
}
