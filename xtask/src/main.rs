use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Lambda binaries shipped as `<name>.zip` with a single `bootstrap` entry.
const LAMBDA_BINARIES: [&str; 3] = ["size_tracker_lambda", "plotting_lambda", "driver_lambda"];
const DIST_DIR: &str = "infra/size_history/dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the bucket size-history workspace",
    long_about = "A unified CLI for packaging the size-history Lambda functions,\n\
                  provisioning the backing bucket and table, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci,
    /// Create the bucket and history table (reads SIZE_HISTORY_BUCKET / SIZE_HISTORY_TABLE)
    Provision,
    /// Build and package Rust Lambda artifacts as bootstrap zips
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambdas(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build size-history lambda binaries");

    let mut cargo_args = vec!["build", "-p", "size_history_lambda", "--target", target];
    for binary in LAMBDA_BINARIES {
        cargo_args.push("--bin");
        cargo_args.push(binary);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    if let Err(error) = fs::create_dir_all(dist_dir) {
        eprintln!("error: cannot create {DIST_DIR}: {error}");
        exit(1);
    }

    for binary in LAMBDA_BINARIES {
        let zip_path = dist_dir.join(format!("{binary}.zip"));
        match package_lambda_zip(&target_dir.join(binary), &zip_path) {
            Ok(()) => eprintln!("packaged {}", zip_path.display()),
            Err(error) => {
                eprintln!("error: {error}");
                exit(1);
            }
        }
    }
}

/// Fails early when the Lambda target triple is missing; skips the check without rustup.
fn ensure_rust_target_installed(target: &str) {
    let installed = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output.stdout,
        Ok(output) => {
            eprintln!(
                "warning: rustup could not list installed targets ({}); skipping target check",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return;
        }
        Err(error) => {
            eprintln!("warning: rustup unavailable ({error}); skipping target check");
            return;
        }
    };

    if !String::from_utf8_lossy(&installed)
        .lines()
        .any(|line| line.trim() == target)
    {
        eprintln!("error: rust target `{target}` is not installed; run `rustup target add {target}`");
        exit(1);
    }
}

/// Writes `binary_path` into `zip_path` as the executable `bootstrap` entry the Lambda runtime expects.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) -> Result<(), String> {
    let binary = fs::read(binary_path)
        .map_err(|error| format!("cannot read lambda binary {}: {error}", binary_path.display()))?;
    let file = fs::File::create(zip_path)
        .map_err(|error| format!("cannot create {}: {error}", zip_path.display()))?;

    write_bootstrap_entry(file, &binary)
        .map_err(|error| format!("cannot write {}: {error}", zip_path.display()))
}

fn write_bootstrap_entry(file: fs::File, binary: &[u8]) -> ZipResult<()> {
    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    archive.start_file("bootstrap", options)?;
    archive.write_all(binary)?;
    archive.finish()?;
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test size_history_core");
    run_cargo(&["test", "-p", "size_history_core"]);

    step("Test size_history_lambda");
    run_cargo(&["test", "-p", "size_history_lambda"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => {
            ci_check();
            eprintln!("\nCI checks passed.");
        }
        Commands::Provision => {
            run_cargo(&["run", "-p", "size_history_lambda", "--bin", "provision_stack"]);
        }
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambdas(&target, profile);
        }
    }
}
