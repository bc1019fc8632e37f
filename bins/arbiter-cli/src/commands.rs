// CLI commands for grading submissions
use anyhow::{bail, Context, Result};
use arbiter_common::config::Config;
use arbiter_common::types::{Language, Question, Submission, SubmissionResult, TestCase};
use arbiter_harness::{harness, ExecutionGateway, LanguageTable};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::signal;

use crate::SubmissionArgs;

fn load_question(path: &Path) -> Result<Question> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read question file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse question file {}", path.display()))
}

fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test cases file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test cases file {}", path.display()))
}

fn load_languages(config: &Config) -> Result<LanguageTable> {
    LanguageTable::load_or_default(&config.languages_file)
        .context("Failed to load language configuration")
}

fn build_submission(args: &SubmissionArgs) -> Result<Submission> {
    let source_code = fs::read_to_string(&args.source)
        .with_context(|| format!("Failed to read source file {}", args.source.display()))?;

    let test_cases = match (&args.cases, &args.question) {
        (Some(cases), None) => load_cases(cases)?,
        (None, Some(question)) => load_question(question)?.test_cases,
        _ => bail!("Provide exactly one of --cases or --question"),
    };

    Ok(Submission {
        language: args.language.clone(),
        source_code,
        test_cases,
        entry_point: args.entry_point.clone(),
    })
}

/// Layer command-line flags over the environment and re-check the result
fn apply_overrides(mut config: Config, endpoint: Option<&str>, timeout_ms: Option<u64>) -> Result<Config> {
    if let Some(endpoint) = endpoint {
        if endpoint.trim().is_empty() {
            bail!("--endpoint must not be empty");
        }
        config.endpoint = endpoint.trim().to_string();
    }
    if let Some(ms) = timeout_ms {
        if ms == 0 {
            bail!("--timeout-ms must be positive");
        }
        config.request_timeout = Duration::from_millis(ms);
    }
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

/// Grade a submission; returns whether it succeeded
pub async fn submit(
    args: &SubmissionArgs,
    endpoint: Option<&str>,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<bool> {
    let config = Config::from_env().context("Invalid ARBITER_* configuration")?;
    let config = apply_overrides(config, endpoint, timeout_ms)?;

    let languages = load_languages(&config)?;
    let gateway = ExecutionGateway::new(&config).context("Failed to build execution gateway")?;
    let submission = build_submission(args)?;

    if !json {
        println!("→ Grading {} test cases ({})", submission.test_cases.len(), submission.language);
        println!("  Endpoint: {}", config.endpoint);
        println!();
    }

    let result = tokio::select! {
        graded = harness::grade(&gateway, &languages, &submission) => graded?,
        _ = signal::ctrl_c() => bail!("Cancelled; no verdicts produced"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    Ok(result.success)
}

fn print_summary(result: &SubmissionResult) {
    if !result.compiler_output.is_empty() {
        println!("Compiler / global output:");
        for line in result.compiler_output.lines() {
            println!("  {}", line);
        }
        println!();
    }

    for (idx, verdict) in result.results.iter().enumerate() {
        let mark = if verdict.passed { "✓" } else { "✗" };
        println!("  {} Test {} ({})", mark, idx + 1, verdict.input);
        if !verdict.passed {
            println!("    Expected: {}", verdict.expected);
            println!("    Got:      {}", verdict.actual);
        }
        if !verdict.stdout.is_empty() {
            println!("    stdout: {}", verdict.stdout.lines().next().unwrap_or(""));
        }
    }

    println!();
    println!(
        "→ {} / {} passed: {}",
        result.passed_count(),
        result.results.len(),
        if result.success { "ACCEPTED" } else { "REJECTED" }
    );
}

/// Print the synthesized program without contacting the endpoint
pub fn synthesize(args: &SubmissionArgs) -> Result<()> {
    let config = Config::from_env().context("Invalid ARBITER_* configuration")?;
    let languages = load_languages(&config)?;
    let submission = build_submission(args)?;

    let prepared = harness::prepare(&languages, &submission)?;
    if prepared.malformed_cases > 0 {
        eprintln!(
            "⚠ {} test case(s) have malformed input and will be reported as failed",
            prepared.malformed_cases
        );
    }
    eprintln!(
        "# {} {} (entry point: {})",
        prepared.program.language,
        prepared.program.version,
        if prepared.entry_point.is_empty() { "none" } else { &prepared.entry_point }
    );
    println!("{}", prepared.program.content);
    Ok(())
}

/// List the allow-list with resolved engine versions
pub fn list_languages() -> Result<()> {
    let config = Config::from_env().context("Invalid ARBITER_* configuration")?;
    let languages = load_languages(&config)?;

    println!("{:<12} {:<12} {:<10} {}", "LANGUAGE", "ENGINE", "VERSION", "DRIVER");
    for info in languages.list() {
        println!(
            "{:<12} {:<12} {:<10} {}",
            info.name.as_str(),
            info.engine.engine_language,
            info.engine.engine_version,
            if info.driver_synthesis { "synthesized" } else { "passthrough" }
        );
    }
    Ok(())
}

/// Print a question's skeleton for the given language
pub fn boilerplate(question: &Path, language: &str) -> Result<()> {
    let language = Language::from_tag(language)
        .with_context(|| format!("Unsupported language: {}", language))?;
    let question = load_question(question)?;

    match question.boilerplate_for(language) {
        Some(skeleton) => {
            println!("{}", skeleton);
            Ok(())
        }
        None => bail!("Question '{}' has no boilerplate for {}", question.title, language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let config = apply_overrides(
            Config::default(),
            Some("  http://localhost:2000/api/v2/execute "),
            Some(30_000),
        )
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:2000/api/v2/execute");
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));

        let untouched = apply_overrides(Config::default(), None, None).unwrap();
        assert_eq!(untouched, Config::default());
    }

    #[test]
    fn test_blank_endpoint_flag_rejected() {
        assert!(apply_overrides(Config::default(), Some(""), None).is_err());
        assert!(apply_overrides(Config::default(), Some("   "), None).is_err());
    }

    #[test]
    fn test_timeout_flag_checked_against_budget() {
        assert!(apply_overrides(Config::default(), None, Some(0)).is_err());
        // Defaults budget 10s compile + 3s run
        assert!(apply_overrides(Config::default(), None, Some(2_000)).is_err());
    }
}
