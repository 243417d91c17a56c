mod display;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use policyscope_client::{HttpTransport, Workflow, WorkflowInput};
use policyscope_core::{AnalysisType, UploadFile, WeatherForm, load_config};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "policyscope",
    version,
    about = "Compare and analyse policy documents against a policy analysis backend"
)]
struct Cli {
    /// Backend base URL, e.g. http://127.0.0.1:8000
    #[arg(long, env = "POLICYSCOPE_API_BASE", global = true)]
    api_base: Option<String>,

    /// Path to a TOML config file (defaults to ./policyscope.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the normalised JSON instead of a card
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two policy texts
    Compare {
        policy1: String,
        policy2: String,
        /// Treat POLICY1 and POLICY2 as paths and read the texts from them
        #[arg(long)]
        from_files: bool,
    },
    /// Analyse a single document
    Analyze {
        file: PathBuf,
        #[arg(long = "type", value_enum, default_value_t = DocumentAnalysis::Full)]
        kind: DocumentAnalysis,
    },
    /// Upload documents for processing
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Use the batch endpoint even for a single file
        #[arg(long)]
        batch: bool,
    },
    /// Predict a weather condition from similar historical days
    Recommend {
        #[arg(long)]
        location: String,
        #[arg(long)]
        month: String,
        #[arg(long, allow_hyphen_values = true)]
        temperature: String,
        #[arg(long)]
        humidity: String,
        #[arg(long)]
        wind: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum DocumentAnalysis {
    Full,
    Summarize,
    Ner,
}

impl From<DocumentAnalysis> for AnalysisType {
    fn from(kind: DocumentAnalysis) -> Self {
        match kind {
            DocumentAnalysis::Full => AnalysisType::Full,
            DocumentAnalysis::Summarize => AnalysisType::Summarize,
            DocumentAnalysis::Ner => AnalysisType::Ner,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("policyscope v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(base) = cli.api_base {
        config.api_base = base;
        config.validate()?;
    }

    let (analysis, input) = collect_input(cli.command)?;

    let transport = HttpTransport::from_config(&config).context("failed to create HTTP client")?;
    tracing::info!(base_url = %transport.base_url(), analysis = %analysis, "submitting");
    let workflow = Workflow::new(transport, &config);
    let outcome = workflow.submit(analysis, input).await?;

    let mut stdout = std::io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut stdout, &outcome)?;
        writeln!(stdout)?;
    } else {
        display::print_outcome(&mut stdout, &outcome)?;
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Turn a subcommand into the analysis type and raw workflow input.
///
/// Files are read here; type and emptiness checks happen in the workflow.
fn collect_input(command: Command) -> Result<(AnalysisType, WorkflowInput)> {
    match command {
        Command::Compare {
            policy1,
            policy2,
            from_files,
        } => {
            let (policy1, policy2) = if from_files {
                (read_text(Path::new(&policy1))?, read_text(Path::new(&policy2))?)
            } else {
                (policy1, policy2)
            };
            Ok((AnalysisType::Compare, WorkflowInput::Text { policy1, policy2 }))
        }
        Command::Analyze { file, kind } => {
            Ok((kind.into(), WorkflowInput::File(read_upload(&file)?)))
        }
        Command::Upload { files, batch } => {
            let mut uploads = files
                .iter()
                .map(|p| read_upload(p))
                .collect::<Result<Vec<_>>>()?;
            if batch || uploads.len() > 1 {
                Ok((AnalysisType::BatchUpload, WorkflowInput::Files(uploads)))
            } else {
                let single = uploads.pop().context("no file given")?;
                Ok((AnalysisType::Upload, WorkflowInput::File(single)))
            }
        }
        Command::Recommend {
            location,
            month,
            temperature,
            humidity,
            wind,
        } => {
            let mut form = WeatherForm {
                location,
                month,
                temperature_c: temperature,
                humidity_pct: humidity,
                wind_kmh: wind,
            };
            form.blur_all();
            Ok((AnalysisType::Recommendations, WorkflowInput::Weather(form)))
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_upload(path: &Path) -> Result<UploadFile> {
    UploadFile::from_path(path).with_context(|| format!("failed to read {}", path.display()))
}
