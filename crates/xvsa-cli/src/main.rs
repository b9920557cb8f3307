#![forbid(unsafe_code)]

mod logging;

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use xvsa_config::{GatherSettings, Reactor};
use xvsa_engine::{GatherReport, ModuleOutcome};
use xvsa_frontend::{ProcessRunner, ToolchainLayout};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(
    name = "xvsa-gather",
    about = "Feed a multi-module build to the xvsa front end and analyzer"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Walk the module tree and run the front end (and analyzer) per module
    Gather {
        #[command(flatten)]
        reactor: ReactorArgs,
        #[command(flatten)]
        tools: ToolArgs,
    },
    /// Print the resolved per-module properties as JSON
    Properties {
        #[command(flatten)]
        reactor: ReactorArgs,
    },
    /// Check the tool-chain installation and the reactor description
    Doctor {
        /// Reactor description to validate
        #[arg(long)]
        reactor: Option<PathBuf>,
        #[command(flatten)]
        tools: ToolArgs,
    },
}

#[derive(Debug, Args)]
struct ReactorArgs {
    /// Reactor description written by the build host (JSON, or TOML by extension)
    #[arg(long)]
    reactor: PathBuf,
    /// User override property, highest precedence (repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
    define: Vec<(String, String)>,
    /// Log debug output, including tool output
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ToolArgs {
    /// Settings file
    #[arg(long, default_value = "xvsa.toml")]
    settings: PathBuf,
    /// Tool-chain install directory
    #[arg(long)]
    install_dir: Option<PathBuf>,
    /// Common working directory for all modules
    #[arg(long)]
    result_dir: Option<PathBuf>,
    /// Shared source registry file
    #[arg(long)]
    source_list: Option<PathBuf>,
    /// Run the analyzer after the front end
    #[arg(long)]
    run_analysis: bool,
    /// Only dump module lists
    #[arg(long)]
    skip_front_end: bool,
    /// Generate per-library v-table artifacts
    #[arg(long)]
    lib_generation: bool,
    /// Downgrade tool failures to warnings
    #[arg(long)]
    ignore_errors: bool,
    /// Ask the analyzer for JSON output
    #[arg(long)]
    json: bool,
    /// Reject references to classes missing from the classpath
    #[arg(long)]
    no_phantom_refs: bool,
}

/// Parse `-D key=value`; a bare `-D key` means `key=true`.
fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').unwrap_or((raw, "true"));
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid property `{raw}` — expected KEY=VALUE"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Gather { reactor, tools } => cmd_gather(&reactor, &tools),
        Command::Properties { reactor } => cmd_properties(&reactor),
        Command::Doctor { reactor, tools } => cmd_doctor(reactor.as_deref(), &tools),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

fn load_reactor(args: &ReactorArgs) -> Result<Reactor, Box<dyn Error>> {
    let mut reactor = Reactor::from_path(&args.reactor)?;
    reactor
        .user_properties
        .extend(args.define.iter().cloned());
    Ok(reactor)
}

fn load_settings(args: &ToolArgs) -> Result<GatherSettings, Box<dyn Error>> {
    let mut settings = GatherSettings::from_path(&args.settings)?;
    apply_overrides(&mut settings, args);
    Ok(settings)
}

/// Layer command-line flags over the settings file.
fn apply_overrides(settings: &mut GatherSettings, args: &ToolArgs) {
    if let Some(dir) = &args.install_dir {
        settings.install_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.result_dir {
        settings.result_dir = Some(dir.clone());
    }
    if let Some(list) = &args.source_list {
        settings.source_list = Some(list.clone());
    }
    settings.run_analysis |= args.run_analysis;
    settings.skip_front_end |= args.skip_front_end;
    settings.lib_generation |= args.lib_generation;
    settings.ignore_errors |= args.ignore_errors;
    settings.json |= args.json;
    if args.no_phantom_refs {
        settings.phantom_refs = false;
    }
}

fn cmd_gather(reactor_args: &ReactorArgs, tools: &ToolArgs) -> CliResult {
    logging::init(reactor_args.verbose);
    let reactor = load_reactor(reactor_args)?;
    let settings = load_settings(tools)?;
    tracing::debug!(?settings, "effective settings");
    let runner = ProcessRunner::new(settings.ignore_errors);

    let report = xvsa_engine::gather(&reactor, &settings, &runner)?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &GatherReport) {
    let mut skipped = 0;
    let mut processed = 0;
    for module in &report.modules {
        match &module.outcome {
            ModuleOutcome::Skipped { .. } => skipped += 1,
            ModuleOutcome::Failed { .. } => {}
            _ => processed += 1,
        }
    }
    let failed: Vec<_> = report.failures().collect();

    for module in &failed {
        eprintln!("  [!!] {}: {}", module.key, module.outcome);
    }
    eprintln!(
        "    Finished {} module(s) under {}: {processed} processed, {skipped} skipped, {} failed",
        report.modules.len(),
        report.top_level_dir.display(),
        failed.len()
    );
}

fn cmd_properties(reactor_args: &ReactorArgs) -> CliResult {
    logging::init(reactor_args.verbose);
    let reactor = load_reactor(reactor_args)?;
    let configs = xvsa_engine::configure::configure_all(&reactor)?;

    let by_module: BTreeMap<String, BTreeMap<String, String>> = configs
        .iter()
        .map(|c| (c.key.clone(), c.to_properties()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&by_module)?);
    Ok(())
}

fn cmd_doctor(reactor: Option<&Path>, tools: &ToolArgs) -> CliResult {
    eprintln!("Checking environment...");
    eprintln!();

    let mut issues = 0u32;

    match load_settings(tools) {
        Ok(settings) => match &settings.install_dir {
            Some(install_dir) => {
                let layout = ToolchainLayout::new(install_dir);
                match layout.front_end() {
                    Ok(path) => eprintln!("  [ok] front end: {}", path.display()),
                    Err(e) => {
                        eprintln!("  [!!] front end: {e}");
                        issues += 1;
                    }
                }
                match layout.analyzer() {
                    Ok(path) => eprintln!("  [ok] analyzer: {}", path.display()),
                    Err(e) => {
                        eprintln!("  [!!] analyzer: {e}");
                        issues += 1;
                    }
                }
            }
            None => {
                eprintln!("  [!!] install directory: not configured — set install_dir or pass --install-dir");
                issues += 1;
            }
        },
        Err(e) => {
            eprintln!("  [!!] {}: {e}", tools.settings.display());
            issues += 1;
        }
    }

    match reactor {
        Some(path) => match Reactor::from_path(path) {
            Ok(reactor) => match reactor.execution_root() {
                Some(root) => eprintln!(
                    "  [ok] reactor: {} module(s), root {root}",
                    reactor.modules.len()
                ),
                None => {
                    eprintln!("  [!!] reactor: no module is flagged as execution root");
                    issues += 1;
                }
            },
            Err(e) => {
                eprintln!("  [!!] reactor: {e}");
                issues += 1;
            }
        },
        None => eprintln!("  [--] No reactor description given"),
    }

    eprintln!();
    if issues > 0 {
        return Err(format!("{issues} issue(s) found — fix them before gathering").into());
    }
    eprintln!("All checks passed");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_gather_with_defines() {
        let cli = Cli::try_parse_from([
            "xvsa-gather",
            "gather",
            "--reactor",
            "reactor.json",
            "-D",
            "xvsa.projectKey=acme",
            "-Dxvsa.skip",
            "--run-analysis",
        ])
        .unwrap();
        match cli.command {
            Command::Gather { reactor, tools } => {
                assert_eq!(reactor.reactor, PathBuf::from("reactor.json"));
                assert_eq!(
                    reactor.define,
                    vec![
                        ("xvsa.projectKey".to_owned(), "acme".to_owned()),
                        ("xvsa.skip".to_owned(), "true".to_owned()),
                    ]
                );
                assert!(tools.run_analysis);
                assert_eq!(tools.settings, PathBuf::from("xvsa.toml"));
            }
            other => panic!("expected Gather, got {other:?}"),
        }
    }

    #[test]
    fn gather_requires_reactor() {
        assert!(Cli::try_parse_from(["xvsa-gather", "gather"]).is_err());
    }

    #[test]
    fn define_without_key_is_rejected() {
        assert!(parse_define("=value").is_err());
        assert_eq!(
            parse_define("a=b=c").unwrap(),
            ("a".to_owned(), "b=c".to_owned())
        );
    }

    #[test]
    fn flags_override_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        let settings_path = tmp.path().join("xvsa.toml");
        std::fs::write(
            &settings_path,
            "install_dir = \"/opt/from-file\"\nlib_generation = true\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "xvsa-gather",
            "doctor",
            "--settings",
            settings_path.to_str().unwrap(),
            "--install-dir",
            "/opt/from-flag",
            "--no-phantom-refs",
        ])
        .unwrap();
        let Command::Doctor { tools, .. } = cli.command else {
            panic!("expected Doctor");
        };

        let settings = load_settings(&tools).unwrap();
        assert_eq!(settings.install_dir, Some(PathBuf::from("/opt/from-flag")));
        assert!(settings.lib_generation);
        assert!(!settings.phantom_refs);
        assert!(!settings.run_analysis);
    }

    #[test]
    fn defines_extend_user_properties() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reactor.json");
        std::fs::write(
            &path,
            r#"{ "modules": [], "user_properties": { "a": "1", "b": "1" } }"#,
        )
        .unwrap();
        let args = ReactorArgs {
            reactor: path,
            define: vec![("b".to_owned(), "2".to_owned())],
            verbose: false,
        };

        let reactor = load_reactor(&args).unwrap();
        assert_eq!(reactor.user_properties.get("a").map(String::as_str), Some("1"));
        assert_eq!(reactor.user_properties.get("b").map(String::as_str), Some("2"));
    }
}
