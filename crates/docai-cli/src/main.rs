use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docai_core::config_file::{self, LOCAL_CONFIG_NAME};
use docai_core::{DocumentProcessor, ProcessError, ProcessorReference, RestConnector};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod output;
mod settings;

use output::ColorMode;
use settings::{Flags, Settings};

/// Document AI client - send a local document to a processor and print its text
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct ProcessorArgs {
    /// Google Cloud project id [env: DOCAI_PROJECT]
    #[arg(long)]
    project: Option<String>,

    /// Processor location, e.g. "us" or "eu" [env: DOCAI_LOCATION]
    #[arg(long)]
    location: Option<String>,

    /// Processor id [env: DOCAI_PROCESSOR]
    #[arg(long)]
    processor: Option<String>,

    /// Base URL replacing the regional endpoint [env: DOCAI_API_ENDPOINT]
    #[arg(long)]
    api_endpoint: Option<String>,
}

impl From<ProcessorArgs> for Flags {
    fn from(args: ProcessorArgs) -> Self {
        Flags {
            project: args.project,
            location: args.location,
            processor: args.processor,
            api_endpoint: args.api_endpoint,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a document to a processor and print the extracted text
    Process {
        /// Path to the document to process
        file_path: PathBuf,

        #[command(flatten)]
        processor: ProcessorArgs,

        /// MIME type of the document (guessed from the extension if omitted)
        #[arg(long)]
        mime_type: Option<String>,

        /// Write the text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print page and entity counts to stderr after the text
        #[arg(long)]
        summary: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the resolved configuration and where it was read from
    Config {
        #[command(flatten)]
        processor: ProcessorArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let no_color = match &cli.command {
        Command::Process { no_color, .. } | Command::Config { no_color, .. } => *no_color,
    };
    let color = ColorMode(!no_color);

    let outcome = match cli.command {
        Command::Process {
            file_path,
            processor,
            mime_type,
            output,
            summary,
            ..
        } => process(file_path, processor.into(), mime_type, output, summary, color).await,
        Command::Config { processor, .. } => show_config(processor.into(), color),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = output::print_error(&mut std::io::stderr(), &err, color);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docai_core=debug,docai=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(flags: Flags) -> Settings {
    let config = config_file::load_config();
    settings::resolve(flags, &config, |name| std::env::var(name).ok())
}

async fn process(
    file_path: PathBuf,
    flags: Flags,
    mime_type: Option<String>,
    output: Option<PathBuf>,
    summary: bool,
    color: ColorMode,
) -> anyhow::Result<()> {
    let settings = load_settings(flags);
    tracing::debug!(?settings, "resolved settings");

    let project = settings.project.as_deref().with_context(|| {
        format!(
            "no project given (use --project, {} or [processor] project in {})",
            settings::ENV_PROJECT,
            LOCAL_CONFIG_NAME
        )
    })?;
    let processor_id = settings.processor.as_deref().with_context(|| {
        format!(
            "no processor given (use --processor, {} or [processor] processor in {})",
            settings::ENV_PROCESSOR,
            LOCAL_CONFIG_NAME
        )
    })?;
    let reference = ProcessorReference::new(project, settings.location.as_str(), processor_id)?;

    let mime_type = settings::mime_type_for(
        &file_path,
        mime_type.as_deref(),
        settings.default_mime_type.as_deref(),
    );
    tracing::debug!(mime_type = %mime_type, "using MIME type");

    let mut connector = RestConnector::new();
    if let Some(ref url) = settings.api_endpoint {
        connector = connector.with_base_url(url.clone());
    }
    if let Some(ref token) = settings.access_token {
        connector = connector.with_access_token(token.clone());
    }

    // Ctrl-C abandons the in-flight request
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let result = DocumentProcessor::new(connector)
        .with_cancellation(cancel)
        .process(&reference, &file_path, &mime_type)
        .await
        .map_err(|e| describe(e, &file_path))?;

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("failed to create {}", output_path.display()))?,
        )
    } else {
        Box::new(std::io::stdout().lock())
    };
    docai_core::write_result(&mut writer, &result)?;

    if summary {
        output::print_summary(&mut std::io::stderr(), &result, color)?;
    }
    Ok(())
}

/// Attach a hint for the failures a user can fix locally.
fn describe(err: ProcessError, file_path: &Path) -> anyhow::Error {
    let hint = match &err {
        ProcessError::ClientInit { .. } => Some(
            "check credentials, e.g. export GOOGLE_OAUTH_ACCESS_TOKEN=$(gcloud auth print-access-token)"
                .to_string(),
        ),
        ProcessError::EmptyDocument => Some(format!("{} has no content", file_path.display())),
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => anyhow::Error::new(err),
    }
}

fn show_config(flags: Flags, color: ColorMode) -> anyhow::Result<()> {
    let settings = load_settings(flags);

    let mut files = Vec::new();
    if let Some(path) = config_file::config_path() {
        let present = path.exists();
        files.push((path, present));
    }
    let local = PathBuf::from(LOCAL_CONFIG_NAME);
    let present = local.exists();
    files.push((local, present));

    output::print_config(&mut std::io::stdout().lock(), &settings, &files, color)?;
    Ok(())
}
