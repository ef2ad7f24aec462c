// verdict-seal-cli/src/main.rs
// ============================================================================
// Module: Verdict Seal CLI Entry Point
// Description: Command dispatcher for serving and remote verification.
// Purpose: Run the HTTP surface and verify published deployments.
// Dependencies: clap, reqwest, tokio, verdict-seal-{config, core, server}
// ============================================================================

//! ## Overview
//! The CLI has two jobs: `serve` boots the HTTP boundary adapter over the
//! configured artifact root, and `verify` drives a running deployment
//! through the determinism checks a relying party would perform: health,
//! schema, seal, duplicate rejection, digest recomputation, replay, and
//! bundle stability. The verifier recomputes every digest locally with the
//! same canonical codec the core uses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Parser;
use clap::Subcommand;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use verdict_seal_config::SealConfig;
use verdict_seal_core::canonical_json_bytes;
use verdict_seal_core::sha256_hex;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "verdict-seal", version, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP surface over the configured artifact root.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Verify a published deployment end to end.
    Verify {
        /// Base URL of the deployment under test.
        #[arg(long, default_value = "http://localhost:5000")]
        base_url: String,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal CLI errors.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration loading failed.
    #[error("{0}")]
    Config(#[from] verdict_seal_config::ConfigError),
    /// The server failed to start or crashed.
    #[error("{0}")]
    Server(#[from] verdict_seal_server::ServerError),
    /// An HTTP request to the deployment failed outright.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Writing to stdout failed.
    #[error("output error: {0}")]
    Output(String),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            let mut stderr = std::io::stderr();
            let _ = writeln!(&mut stderr, "error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatches the selected subcommand.
async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Command::Serve {
            config,
        } => {
            init_tracing();
            let config = SealConfig::load(config.as_deref())?;
            verdict_seal_server::serve(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            base_url,
        } => {
            let mut runner = VerifyRunner::new(base_url);
            let all_passed = runner.run_all().await?;
            runner.summary()?;
            Ok(if all_passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

/// Installs the tracing subscriber with an env-filter and UTC timestamps.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ============================================================================
// SECTION: Verification Runner
// ============================================================================

/// Drives the remote verification checks and tallies outcomes.
struct VerifyRunner {
    /// Deployment base URL without a trailing slash.
    base_url: String,
    /// Shared HTTP client.
    client: reqwest::Client,
    /// Count of passed checks.
    passed: u32,
    /// Count of failed checks.
    failed: u32,
}

impl VerifyRunner {
    /// Creates a runner for the given base URL.
    fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            passed: 0,
            failed: 0,
        }
    }

    /// Records and prints one check outcome.
    fn check(&mut self, name: &str, condition: bool, details: &str) -> Result<bool, CliError> {
        let status = if condition { "PASS" } else { "FAIL" };
        let suffix = if details.is_empty() { String::new() } else { format!(" ({details})") };
        write_stdout_line(&format!("  [{status}] {name}{suffix}"))?;
        if condition {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        Ok(condition)
    }

    /// Runs every check section; returns true when all passed.
    async fn run_all(&mut self) -> Result<bool, CliError> {
        write_stdout_line(&format!("Verifying deployment at {}", self.base_url))?;
        self.check_health().await?;
        self.check_version().await?;
        self.check_schema().await?;
        if let Some(evaluation_id) = self.check_evaluate().await? {
            self.check_artifacts(&evaluation_id).await?;
            self.check_replay(&evaluation_id).await?;
            self.check_bundle(&evaluation_id).await?;
        }
        Ok(self.failed == 0)
    }

    /// Prints the final tally.
    fn summary(&self) -> Result<(), CliError> {
        write_stdout_line(&format!("\n{} passed, {} failed", self.passed, self.failed))
    }

    /// Checks the health endpoint.
    async fn check_health(&mut self) -> Result<(), CliError> {
        write_stdout_line("\n1. Health")?;
        let response = self.client.get(format!("{}/health", self.base_url)).send().await?;
        let ok = response.status().is_success();
        self.check("GET /health returns 200", ok, &format!("status={}", response.status()))?;
        if ok {
            let body: Value = response.json().await?;
            self.check("status is ok", body["status"] == json!("ok"), "")?;
            self.check("strict mode enabled", body["strict_mode"] == json!(true), "")?;
        }
        Ok(())
    }

    /// Checks the version endpoint.
    async fn check_version(&mut self) -> Result<(), CliError> {
        write_stdout_line("\n2. Version")?;
        let response = self.client.get(format!("{}/version", self.base_url)).send().await?;
        let ok = response.status().is_success();
        self.check("GET /version returns 200", ok, &format!("status={}", response.status()))?;
        if ok {
            let body: Value = response.json().await?;
            self.check("name is verdict-seal", body["name"] == json!("verdict-seal"), "")?;
            self.check("version present", body["version"].is_string(), "")?;
            self.check("commit present", body["commit"].is_string(), "")?;
        }
        Ok(())
    }

    /// Checks the schema endpoint.
    async fn check_schema(&mut self) -> Result<(), CliError> {
        write_stdout_line("\n3. Schema")?;
        let response = self.client.get(format!("{}/schema", self.base_url)).send().await?;
        let ok = response.status().is_success();
        self.check("GET /schema returns 200", ok, &format!("status={}", response.status()))?;
        if ok {
            let body: Value = response.json().await?;
            let required = body["request"]["required"].as_array().map_or(0, Vec::len);
            self.check("five required fields", required == 5, &format!("required={required}"))?;
        }
        Ok(())
    }

    /// Seals a fresh evaluation and checks determinism of the response.
    async fn check_evaluate(&mut self) -> Result<Option<String>, CliError> {
        write_stdout_line("\n4. Evaluate")?;
        let request = self.unique_request();

        let response = self
            .client
            .post(format!("{}/evaluate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let ok = response.status().is_success();
        self.check("POST /evaluate returns 200", ok, &format!("status={}", response.status()))?;
        if !ok {
            return Ok(None);
        }

        let body: Value = response.json().await?;
        let evaluation_id = body["evaluation_id"].as_str().unwrap_or_default().to_string();
        let result = &body["result"];

        let expected_input_sha256 = sha256_hex(
            &canonical_json_bytes(&request).unwrap_or_default(),
        );
        self.check(
            "input digest matches local recomputation",
            result["input_sha256"] == json!(expected_input_sha256),
            "",
        )?;
        self.check(
            "evaluation_id is the digest prefix",
            evaluation_id == expected_input_sha256[..16.min(expected_input_sha256.len())],
            &format!("id={evaluation_id}"),
        )?;
        self.check("decision is ACCEPT", result["decision"] == json!("ACCEPT"), "")?;

        let duplicate = self
            .client
            .post(format!("{}/evaluate", self.base_url))
            .json(&request)
            .send()
            .await?;
        self.check(
            "duplicate submission returns 409",
            duplicate.status() == reqwest::StatusCode::CONFLICT,
            &format!("status={}", duplicate.status()),
        )?;

        Ok(Some(evaluation_id))
    }

    /// Fetches persisted artifacts and recomputes their digests locally.
    async fn check_artifacts(&mut self, evaluation_id: &str) -> Result<(), CliError> {
        write_stdout_line("\n5. Artifacts")?;
        let input_bytes = self
            .client
            .get(format!("{}/evaluations/{evaluation_id}/input", self.base_url))
            .send()
            .await?
            .bytes()
            .await?;
        let output: Value = self
            .client
            .get(format!("{}/evaluations/{evaluation_id}/output", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        self.check(
            "served input bytes hash to the sealed digest",
            json!(sha256_hex(&input_bytes)) == output["input_sha256"],
            "",
        )?;

        let manifest: Value = self
            .client
            .get(format!("{}/evaluations/{evaluation_id}/manifest", self.base_url))
            .send()
            .await?
            .json()
            .await?;
        let embedded = manifest["manifest_sha256"].as_str().unwrap_or_default().to_string();
        let mut unembedded = manifest.clone();
        if let Some(entries) = unembedded.as_object_mut() {
            entries.remove("manifest_sha256");
        }
        let recomputed = sha256_hex(&canonical_json_bytes(&unembedded).unwrap_or_default());
        self.check(
            "manifest digest matches local recomputation",
            embedded == recomputed,
            "",
        )?;
        Ok(())
    }

    /// Replays the sealed evaluation remotely.
    async fn check_replay(&mut self, evaluation_id: &str) -> Result<(), CliError> {
        write_stdout_line("\n6. Replay")?;
        let response = self
            .client
            .post(format!("{}/replay/{evaluation_id}", self.base_url))
            .send()
            .await?;
        let ok = response.status().is_success();
        self.check("POST /replay returns 200", ok, &format!("status={}", response.status()))?;
        if ok {
            let body: Value = response.json().await?;
            self.check("replay_ok is true", body["replay_ok"] == json!(true), "")?;
        }
        Ok(())
    }

    /// Downloads the bundle twice and compares bytes.
    async fn check_bundle(&mut self, evaluation_id: &str) -> Result<(), CliError> {
        write_stdout_line("\n7. Bundle")?;
        let url = format!("{}/evaluations/{evaluation_id}/bundle", self.base_url);
        let first = self.client.get(&url).send().await?.bytes().await?;
        let second = self.client.get(&url).send().await?.bytes().await?;
        self.check("bundle is a ZIP", first.starts_with(b"PK"), "")?;
        self.check("bundle is byte-identical across downloads", first == second, "")?;
        Ok(())
    }

    /// Builds a request whose subject is unique per run, so every
    /// verification pass seals a fresh evaluation.
    fn unique_request(&self) -> Value {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis());
        json!({
            "version": "v1",
            "subject": format!("verify-{nonce}"),
            "ruleset": "verification",
            "payload": {"decision_requested": "ACCEPT", "justification": "verification run"},
            "injected_time_utc": "2024-01-01T00:00:00Z"
        })
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Output(err.to_string()))
}
