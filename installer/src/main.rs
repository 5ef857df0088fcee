//! Splitvault installer CLI entrypoint.
//!
//! This binary prepares split packages for loading: it locks each split's
//! directory, copies built-in splits out of the host bundle, and verifies
//! artifacts against the digest manifest. One line per split is printed on
//! stdout; progress and errors go to stderr.

use clap::Parser;
use env_logger::Builder;
use splitvault_installer::bundle::{BundleAssets, EmptyBundle};
use splitvault_installer::cli::{Cli, Command, GlobalArgs, LoadArgs, StatusArgs};
use splitvault_installer::config::PreprocessorConfig;
use splitvault_installer::dirs::{BaseDirs, SystemBaseDirs};
use splitvault_installer::error::Result;
use splitvault_installer::flow::{preprocess_split, split_status};
use splitvault_installer::output::{load_summary, outcome_line, status_line};
use splitvault_installer::preprocessor::PreprocessContext;
use splitvault_installer::split::{SplitInfo, SplitOrigin};
use splitvault_installer::validator::DigestValidator;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemBaseDirs, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs `env_logger`, letting `RUST_LOG` override the CLI level.
fn init_logging(global: &GlobalArgs) {
    Builder::new()
        .filter_level(global.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(
    cli: &Cli,
    dirs: &dyn BaseDirs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let config = PreprocessorConfig::discover(cli.global.config.as_deref())?
        .with_overrides(cli.global.config_overrides());

    match &cli.command {
        Command::Load(args) => run_load(&config, args, &cli.global, dirs, stdout, stderr),
        Command::Status(args) => run_status(&config, args, dirs, stdout),
    }
}

fn run_load(
    config: &PreprocessorConfig,
    args: &LoadArgs,
    global: &GlobalArgs,
    dirs: &dyn BaseDirs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let paths = config.path_manager(dirs)?;
    let validator = DigestValidator::new(config.load_manifest()?);
    // Downloaded splits never read the bundle.
    let (bundle, origin): (Box<dyn BundleAssets>, _) = if args.built_in {
        (config.open_bundle()?, SplitOrigin::BuiltIn)
    } else {
        (Box::new(EmptyBundle), SplitOrigin::Downloaded)
    };
    let tmp_dir = paths.tmp_dir();
    let context = PreprocessContext::new(&validator, bundle.as_ref(), &tmp_dir);

    if !global.quiet {
        write_line(
            stderr,
            format!("Preparing {} split(s) in {}...", args.splits.len(), paths.root()),
        );
    }

    for name in &args.splits {
        let split = SplitInfo::new(name.clone(), origin);
        let outcome = preprocess_split(&paths, &context, &split)?;
        write_line(stdout, outcome_line(name, &outcome));
    }

    if !global.quiet {
        write_line(stderr, load_summary(args.splits.len()));
    }
    Ok(())
}

fn run_status(
    config: &PreprocessorConfig,
    args: &StatusArgs,
    dirs: &dyn BaseDirs,
    stdout: &mut dyn Write,
) -> Result<()> {
    let paths = config.path_manager(dirs)?;
    for name in &args.splits {
        write_line(stdout, status_line(name, split_status(&paths, name)));
    }
    Ok(())
}

/// Maps a run result to the process exit code, reporting any error.
///
/// Configuration and usage errors exit with 2, every other failure with 1.
fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_line(stderr, format!("error: {err}"));
            if err.is_usage_error() { 2 } else { 1 }
        }
    }
}

fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use splitvault_installer::error::PreprocessError;
    use splitvault_installer::manifest::Sha256Digest;
    use splitvault_installer::split::SplitName;
    use std::fs;
    use std::path::PathBuf;

    const PAYLOAD: &[u8] = b"java split";

    struct Workspace {
        _temp: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = tempfile::tempdir().expect("temp dir");
            let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
            let assets = root.join("assets");
            fs::create_dir_all(&assets).expect("assets dir");
            fs::write(assets.join("java.zip"), PAYLOAD).expect("write asset");
            let manifest = format!(
                r#"{{"schema_version": 1, "splits": {{"java": "{}"}}}}"#,
                Sha256Digest::of_bytes(PAYLOAD)
            );
            fs::write(root.join("splits.json"), manifest).expect("write manifest");
            Self { _temp: temp, root }
        }

        fn cli(&self, subcommand: &[&str]) -> Cli {
            let mut args = vec![
                "splitvault-installer".to_owned(),
                "--storage-root".to_owned(),
                self.root.join("splits").to_string(),
                "--bundle".to_owned(),
                self.root.join("assets").to_string(),
                "--manifest".to_owned(),
                self.root.join("splits.json").to_string(),
                "--quiet".to_owned(),
            ];
            args.extend(subcommand.iter().map(|arg| (*arg).to_owned()));
            Cli::parse_from(args)
        }
    }

    /// Every test passes `--storage-root`, so no data directory is needed.
    struct NoDataDir;

    impl BaseDirs for NoDataDir {
        fn splitvault_data_dir(&self) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[rstest]
    #[case::load_failure(
        PreprocessError::VerificationFailed {
            split_name: SplitName::new("java").expect("valid split name"),
        },
        1
    )]
    #[case::usage_failure(
        PreprocessError::InvalidSplitName { value: String::new(), reason: "name must not be empty" },
        2
    )]
    fn exit_code_for_run_result_prints_error(#[case] err: PreprocessError, #[case] expected: i32) {
        let message = err.to_string();
        let mut stderr = Vec::new();

        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);

        assert_eq!(exit_code, expected);
        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains(&message));
    }

    #[test]
    fn load_copies_and_verifies_built_in_split() {
        let workspace = Workspace::new();
        let cli = workspace.cli(&["load", "--built-in", "java"]);
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());

        run(&cli, &NoDataDir, &mut stdout, &mut stderr).expect("load");

        assert_eq!(String::from_utf8(stdout).expect("UTF-8"), "java: verified\n");
        assert!(stderr.is_empty(), "--quiet suppresses progress");
        let artifact = workspace.root.join("splits/java/java.apk");
        assert_eq!(fs::read(artifact).expect("artifact"), PAYLOAD);
    }

    #[test]
    fn load_reports_missing_downloaded_split() {
        let workspace = Workspace::new();
        let cli = workspace.cli(&["load", "java"]);
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());

        run(&cli, &NoDataDir, &mut stdout, &mut stderr).expect("load");

        assert_eq!(
            String::from_utf8(stdout).expect("UTF-8"),
            "java: not downloaded\n"
        );
    }

    #[test]
    fn load_of_downloaded_split_needs_no_bundle() {
        let workspace = Workspace::new();
        let splits = workspace.root.join("splits");
        let manifest = workspace.root.join("splits.json");
        let cli = Cli::parse_from([
            "splitvault-installer",
            "--storage-root",
            splits.as_str(),
            "--manifest",
            manifest.as_str(),
            "--quiet",
            "load",
            "java",
        ]);
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());

        run(&cli, &NoDataDir, &mut stdout, &mut stderr).expect("load without bundle");

        assert_eq!(
            String::from_utf8(stdout).expect("UTF-8"),
            "java: not downloaded\n"
        );
    }

    #[test]
    fn load_without_manifest_is_a_usage_error() {
        let workspace = Workspace::new();
        fs::remove_file(workspace.root.join("splits.json")).expect("remove manifest");
        let cli = workspace.cli(&["load", "java"]);
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());

        let result = run(&cli, &NoDataDir, &mut stdout, &mut stderr);

        assert_eq!(exit_code_for_run_result(result, &mut stderr), 2);
    }

    #[test]
    fn status_does_not_create_split_directories() {
        let workspace = Workspace::new();
        let cli = workspace.cli(&["status", "java"]);
        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());

        run(&cli, &NoDataDir, &mut stdout, &mut stderr).expect("status");

        assert_eq!(String::from_utf8(stdout).expect("UTF-8"), "java: absent\n");
        assert!(!workspace.root.join("splits").exists());
    }
}
