mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbiter-cli")]
#[command(about = "Arbiter CLI - Grade single-function submissions against literal test cases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the source and test cases come from
#[derive(Args)]
pub struct SubmissionArgs {
    /// Language tag (javascript, python, java, cpp or an alias)
    #[arg(short, long)]
    language: String,

    /// File containing the submitted source code
    #[arg(short, long)]
    source: PathBuf,

    /// JSON file with an array of {"input", "output"} test cases
    #[arg(short, long, conflicts_with = "question", required_unless_present = "question")]
    cases: Option<PathBuf>,

    /// JSON question file; its testCases are used
    #[arg(short, long)]
    question: Option<PathBuf>,

    /// Function to call (defaults to the first function defined in the source)
    #[arg(short, long)]
    entry_point: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a submission against the remote execution endpoint
    Submit {
        #[command(flatten)]
        submission: SubmissionArgs,

        /// Execution endpoint URL (overrides ARBITER_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Caller-side timeout in milliseconds (overrides ARBITER_REQUEST_TIMEOUT_MS)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the raw JSON result instead of a summary
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the program that would be sent, without running it
    Synthesize {
        #[command(flatten)]
        submission: SubmissionArgs,
    },

    /// List supported languages and engine versions
    Languages,

    /// Print a question's boilerplate for a language
    Boilerplate {
        /// JSON question file
        #[arg(short, long)]
        question: PathBuf,

        /// Language tag
        #[arg(short, long)]
        language: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            submission,
            endpoint,
            timeout_ms,
            json,
        } => {
            let passed = commands::submit(&submission, endpoint.as_deref(), timeout_ms, json).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Synthesize { submission } => {
            commands::synthesize(&submission)?;
        }
        Commands::Languages => {
            commands::list_languages()?;
        }
        Commands::Boilerplate { question, language } => {
            commands::boilerplate(&question, &language)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_submit_requires_cases_or_question() {
        let missing = Cli::try_parse_from(["arbiter-cli", "submit", "-l", "js", "-s", "sol.js"]);
        assert!(missing.is_err());

        let both = Cli::try_parse_from([
            "arbiter-cli", "submit", "-l", "js", "-s", "sol.js", "-c", "cases.json", "-q", "q.json",
        ]);
        assert!(both.is_err());

        let ok = Cli::try_parse_from([
            "arbiter-cli", "submit", "-l", "js", "-s", "sol.js", "-c", "cases.json", "--json",
        ]);
        assert!(ok.is_ok());
    }
}
