use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sheet_translator::server::{serve, ServerState};
use sheet_translator::translation::{
    handoff_prompt, master_prompt, translate_file, translate_sheet, BatchTranslator, Category,
    ConfiguredLimiter, GeminiClient, Level, Progress, TranslationConfiguration,
};
use sheet_translator::{AppConfig, ColumnPlan, ColumnRef, SheetsClient, WideningPolicy};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sheet-translator", version, about = "English to Korean column translation for spreadsheets")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, env = "SHEET_TRANSLATOR_CONFIG", default_value = "config.toml")]
    config: String,

    /// Gemini API key; falls back to the variable named by `api.api_key_env`
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a single sentence
    Text {
        text: String,
        #[command(flatten)]
        options: TranslationArgs,
    },
    /// Translate one column of a local CSV or XLSX file
    File {
        input: PathBuf,
        #[command(flatten)]
        columns: ColumnArgs,
        #[command(flatten)]
        options: TranslationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Translate one column of a Google Sheet
    Sheet {
        url: String,
        /// Worksheet title (defaults to the first worksheet)
        #[arg(long)]
        worksheet: Option<String>,
        #[command(flatten)]
        columns: ColumnArgs,
        #[command(flatten)]
        options: TranslationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the master prompt and the hand-off prompt
    Prompt {
        #[command(flatten)]
        columns: ColumnArgs,
        #[command(flatten)]
        options: TranslationArgs,
    },
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Args)]
struct TranslationArgs {
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    level: Option<Level>,
    /// Minimum milliseconds between two translation calls
    #[arg(long)]
    rate_limit_ms: Option<u64>,
    /// Append a single column instead of padding up to the target
    #[arg(long)]
    append_column: bool,
}

#[derive(Args)]
struct ColumnArgs {
    /// Source column letter
    #[arg(long)]
    source: Option<String>,
    /// Target column letter
    #[arg(long)]
    target: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for the translated artifact
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(Some(&cli.config));
    init_tracing(&config)?;

    tracing::info!("Loaded configuration: {:?}", config.server.name);

    match cli.command {
        Command::Text { text, options } => {
            let batch = BatchTranslator::new(gemini(&config, cli.api_key.as_deref())?, options.resolve(&config));
            println!("{}", batch.translate_text(&text).await?);
        }
        Command::File {
            input,
            columns,
            options,
            output,
        } => {
            let plan = columns.resolve(&config)?;
            let (batch, printer) = batch_for(&config, &options, gemini(&config, cli.api_key.as_deref())?);
            let report = translate_file(
                &batch,
                &input,
                plan,
                &output.resolve(&config),
                config.output.sanitize_formulas,
            )
            .await;
            drop(batch);
            printer.await?;
            println!("{}", report?);
        }
        Command::Sheet {
            url,
            worksheet,
            columns,
            options,
            output,
        } => {
            let plan = columns.resolve(&config)?;
            let sheets = SheetsClient::new(&config.sheets, config.sheets.access_token(), config.api.timeout())?;
            if !sheets.can_write() {
                tracing::warn!(
                    "{} is not set; reading the public export without write-back",
                    config.sheets.access_token_env
                );
            }
            let (batch, printer) = batch_for(&config, &options, gemini(&config, cli.api_key.as_deref())?);
            let report = translate_sheet(
                &batch,
                &sheets,
                &url,
                worksheet.as_deref(),
                plan,
                &output.resolve(&config),
            )
            .await;
            drop(batch);
            printer.await?;
            println!("{}", report?);
        }
        Command::Prompt { columns, options } => {
            let plan = columns.resolve(&config)?;
            let translation = options.resolve(&config);
            println!("{}", master_prompt(&translation));
            println!();
            println!("{}", handoff_prompt(&translation, plan.source, plan.target));
        }
        Command::Serve { port, bind } => {
            let addr = format!(
                "{}:{}",
                bind.unwrap_or_else(|| config.server.bind_addr.clone()),
                port.unwrap_or(config.server.port)
            );
            let client = gemini(&config, cli.api_key.as_deref())?;
            serve(ServerState::new(config, client), &addr).await?;
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("sheet_translator={}", config.logging.level).parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn gemini(config: &AppConfig, api_key: Option<&str>) -> anyhow::Result<GeminiClient> {
    let key = config.api.resolve_api_key(api_key)?;
    let client = GeminiClient::new(&config.api, key).context("failed to build Gemini client")?;
    tracing::info!(model = client.model(), "Using Gemini model");
    Ok(client)
}

/// Builds the batch with progress printing and Ctrl-C cancellation wired in.
fn batch_for(
    config: &AppConfig,
    options: &TranslationArgs,
    client: GeminiClient,
) -> (BatchTranslator<GeminiClient, ConfiguredLimiter>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current row");
            on_interrupt.cancel();
        }
    });

    let interval = options
        .rate_limit_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.translation.rate_limit());
    let widening = if options.append_column {
        WideningPolicy::AppendOne
    } else {
        config.translation.widening
    };

    let batch = BatchTranslator::new(client, options.resolve(config))
        .with_widening(widening)
        .with_progress(tx)
        .with_cancellation(cancel)
        .with_rate_limiter(ConfiguredLimiter::from_interval(interval));

    (batch, tokio::spawn(print_progress(rx)))
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<Progress>) {
    while let Some(progress) = rx.recv().await {
        eprintln!(
            "[{:>3.0}%] {}",
            progress.fraction() * 100.0,
            progress.description
        );
    }
}

impl TranslationArgs {
    fn resolve(&self, config: &AppConfig) -> TranslationConfiguration {
        TranslationConfiguration::new(
            self.category.unwrap_or(config.translation.category),
            self.level.unwrap_or(config.translation.level),
        )
    }
}

impl ColumnArgs {
    fn resolve(&self, config: &AppConfig) -> anyhow::Result<ColumnPlan> {
        let source = self.source.as_deref().unwrap_or(&config.translation.source_column);
        let target = self.target.as_deref().unwrap_or(&config.translation.target_column);
        Ok(ColumnPlan::new(ColumnRef::parse(source)?, ColumnRef::parse(target)?))
    }
}

impl OutputArgs {
    fn resolve(&self, config: &AppConfig) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone())
    }
}
