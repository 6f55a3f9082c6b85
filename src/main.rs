//! imgserve-client entry point.
//!
//! Builds the page scaffold for the chosen action, fills its inputs from
//! the command line, runs one submission against the backend and writes
//! the rendered page as HTML.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use imgserve_client::client::{FormBinding, QueryClient};
use imgserve_client::config::ClientConfig;
use imgserve_client::dom::Document;
use imgserve_client::endpoint::Endpoint;
use imgserve_client::page;
use imgserve_client::protocol::QueryResponse;

/// Query the imgserve backend and render the reply as HTML.
#[derive(Debug, Parser)]
#[command(name = "imgserve-client", version, about)]
struct Cli {
    /// Page hostname used to derive the endpoint (overrides IMGSERVE_HOSTNAME).
    #[arg(long)]
    hostname: Option<String>,

    /// Explicit ws:// or wss:// endpoint (overrides everything else).
    #[arg(long)]
    endpoint: Option<String>,

    /// Write the rendered HTML here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Suffix of the form's element ids.
    #[arg(long, default_value = "cli")]
    use_id: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up the colorgram of one query term.
    Get {
        /// Query term.
        #[arg(long)]
        term: String,
        /// Experiment name.
        #[arg(long)]
        experiment: String,
        /// Forwarded as the request's `single_value` flag.
        #[arg(long)]
        single_value: Option<bool>,
        /// Also write the decoded colorgram PNG here.
        #[arg(long)]
        save_png: Option<PathBuf>,
    },
    /// Grid search over stored images.
    ListImageUrls {
        /// Filter term as `field=value`; repeatable.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// List the experiments known to the backend.
    ListExperiments,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("empty field name in `{raw}`"));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_page(use_id: &str, command: &Command) -> (Document, FormBinding) {
    match command {
        Command::Get {
            term,
            experiment,
            single_value,
            ..
        } => {
            let mut document = page::search_form(use_id);
            page::fill(
                &mut document,
                use_id,
                &[("get", term.as_str()), ("experiment", experiment.as_str())],
            );
            let mut form = FormBinding::colorgram(use_id);
            if let Some(single_value) = single_value {
                form = form.with_single_value(*single_value);
            }
            (document, form)
        }
        Command::ListImageUrls { filters } => {
            let fields: Vec<&str> = filters.iter().map(|(f, _)| f.as_str()).collect();
            let mut document = page::gallery_page(use_id, &fields);
            let values: Vec<(&str, &str)> = filters
                .iter()
                .map(|(f, v)| (f.as_str(), v.as_str()))
                .collect();
            page::fill(&mut document, use_id, &values);
            (document, FormBinding::gallery(use_id, fields))
        }
        Command::ListExperiments => (
            page::experiment_picker(use_id),
            FormBinding::experiments(use_id),
        ),
    }
}

fn save_colorgram(response: &QueryResponse, path: &Path) -> anyhow::Result<()> {
    if !response.is_success() {
        tracing::warn!(status = ?response.status(), "no colorgram to save");
        return Ok(());
    }
    let png = response.found()?.decode_png()?;
    std::fs::write(path, &png)
        .with_context(|| format!("writing colorgram to {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = png.len(), "colorgram saved");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = ClientConfig::from_env().context("loading configuration")?;
    if let Some(hostname) = cli.hostname {
        config.hostname = hostname;
        config.endpoint_override = None;
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint_override = Some(Endpoint::parse(endpoint)?);
    }
    config.validate()?;

    init_tracing(config.log_json);
    tracing::info!(endpoint = %config.endpoint(), "starting imgserve-client");

    let client = QueryClient::from_config(&config);
    let (mut document, form) = build_page(&cli.use_id, &cli.command);

    let submission = client
        .submit_query(&mut document, &form)
        .await
        .with_context(|| format!("{} query against {}", form.action(), client.endpoint()))?;

    if let Command::Get {
        save_png: Some(path),
        ..
    } = &cli.command
    {
        save_colorgram(&submission.response, path)?;
    }

    let html = format!("<!DOCTYPE html>\n<html>{}</html>\n", document.to_html());
    match &cli.out {
        Some(path) => std::fs::write(path, html)
            .with_context(|| format!("writing page to {}", path.display()))?,
        None => print!("{html}"),
    }

    Ok(())
}
