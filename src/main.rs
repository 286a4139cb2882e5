use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use cpm_advisor::advisor::{ErrorAdvisor, ErrorContext, Lookup};
use cpm_advisor::analysis::BuildLogAnalyzer;
use cpm_advisor::config::{self, Config};
use cpm_advisor::report::{self, SummaryReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_BLOCKING: u8 = 2;
const EXIT_UNKNOWN_CODE: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "cpm-advisor",
    version,
    about = "Build log triage for NuGet Central Package Management migrations"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[arg(long, global = true, help = "Config file (defaults to the user config dir)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Rule table override (.toml, .yaml or .json)")]
    rules: Option<PathBuf>,
    #[arg(long, global = true, help = "Disable colored output")]
    no_color: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan build logs for known restore and build errors
    Analyze {
        #[arg(required_unless_present = "directory")]
        logs: Vec<PathBuf>,
        #[arg(long, conflicts_with = "logs", help = "Analyze every log file in a directory")]
        directory: Option<PathBuf>,
        #[arg(long, help = "Detailed JSON results path")]
        json: Option<PathBuf>,
        #[arg(long, help = "Summary report path")]
        summary: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        fail_on_blocking: bool,
    },
    /// Show the remediation for an error code
    Lookup {
        code: String,
        #[arg(long)]
        package: Option<String>,
        #[arg(long)]
        framework: Option<String>,
        #[arg(long)]
        found: Option<String>,
        #[arg(long)]
        required: Option<String>,
    },
    /// List known error codes in priority order
    List,
    /// Write a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };

    if let Commands::InitConfig = cli.command {
        if config_path.exists() {
            println!("Config already exists at {:?}", config_path);
        } else {
            Config::create_default(&config_path)?;
            println!("Created default config file at {:?}", config_path);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load_or_default(&config_path)?;
    let color = !cli.no_color && config.output.color;
    if !color {
        colored::control::set_override(false);
    }

    let rules_path = cli
        .rules
        .clone()
        .or_else(|| config.rules.path.clone())
        .filter(|p| !p.as_os_str().is_empty());
    let advisor = ErrorAdvisor::from_optional_file(rules_path.as_deref())
        .with_context(|| format!("Failed to load rules from {:?}", rules_path))?;

    match cli.command {
        Commands::Analyze {
            logs,
            directory,
            json,
            summary,
            fail_on_blocking,
        } => {
            let analyzer =
                BuildLogAnalyzer::new(advisor)?.with_extensions(config.analysis.extensions.clone());

            let results = match directory {
                Some(dir) => analyzer.analyze_directory(&dir).await?,
                None => {
                    let mut results = Vec::new();
                    for path in &logs {
                        results.push(analyzer.analyze_log(path).await?);
                    }
                    results
                }
            };

            let summary_report = SummaryReport::from_results(analyzer.advisor(), &results);
            let top = config.analysis.top_packages;
            println!("{}", summary_report.render(top, color));

            let json_path = json.unwrap_or(config.output.json_path);
            report::export_json(&json_path, &summary_report, &results)?;
            println!("\nDetailed results exported to {}", json_path.display());

            let summary_path = summary.unwrap_or(config.output.summary_path);
            report::write_summary(&summary_path, &summary_report, top)?;
            println!("Summary report saved to {}", summary_path.display());

            if fail_on_blocking && summary_report.has_blocking() {
                return Ok(ExitCode::from(EXIT_BLOCKING));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Lookup {
            code,
            package,
            framework,
            found,
            required,
        } => {
            let context = ErrorContext {
                package,
                target_framework: framework,
                version_found: found,
                version_required: required,
            };

            match advisor.lookup(&code) {
                Lookup::Found(rule) => {
                    println!("{} ({:?})", rule.code.green().bold(), rule.severity);
                    println!("{}", rule.description);
                    if !rule.causes.is_empty() {
                        println!("\n{}", "Causes:".bold());
                        for cause in &rule.causes {
                            println!("  - {}", cause);
                        }
                    }
                    println!("\n{}", "Remediation:".bold());
                    for (i, step) in rule.remediation.iter().enumerate() {
                        println!("  {}. {}", i + 1, step);
                    }
                    if context != ErrorContext::default() {
                        let advice = advisor.advise(&code, &context)?;
                        println!("\n{} {}", "Action:".bold(), advice.action);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Lookup::NotFound(code) => {
                    eprintln!(
                        "{}: {} is not in the rule table; escalate it for review",
                        "Unknown code".yellow().bold(),
                        code
                    );
                    Ok(ExitCode::from(EXIT_UNKNOWN_CODE))
                }
            }
        }
        Commands::List => {
            for rule in advisor.rules() {
                println!(
                    "{:<8} {:<9} {}",
                    rule.code.blue(),
                    format!("{:?}", rule.severity).to_lowercase(),
                    rule.description
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::InitConfig => Ok(ExitCode::SUCCESS),
    }
}
