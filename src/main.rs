mod config;
mod services;
mod session;

use std::path::{Path, PathBuf};

use canvas::assets::ImageError;
use canvas::doc::{BackgroundFit, Document};
use canvas::engine::Engine;
use canvas::error::CanvasError;
use canvas::input::EngineEvent;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::services::persistence::{StoreError, TemplateStore, spawn_autosave_worker};
use crate::session::{Session, load_fonts};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Canvas(#[from] CanvasError),
    #[error("{0}")]
    Image(#[from] ImageError),
    #[error("cannot access {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid event script: {0}")]
    Script(serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cardsmith", about = "Compose printable cards from text and images")]
struct Cli {
    /// Template store directory (overrides CARDSMITH_STORE_DIR).
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Font directory (overrides CARDSMITH_FONT_DIR).
    #[arg(long)]
    font_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty card template.
    New {
        name: String,
        #[arg(long, default_value_t = 2.5)]
        width: f64,
        #[arg(long, default_value_t = 3.5)]
        height: f64,
        #[arg(long, default_value_t = 300.0)]
        dpi: f64,
    },
    /// Render a template to PNG at the card's resolution.
    Render {
        name: String,
        /// Output file; defaults to `{name}_{w}x{h}in_{dpi}dpi.png`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Apply a JSON array of engine events to a template (or the autosave).
    Replay(ReplayArgs),
    /// Add an image file to a template as a new component.
    AddImage { name: String, file: PathBuf },
    /// Set a template's background image.
    Background {
        name: String,
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = FitArg::Cover)]
        fit: FitArg,
    },
    Templates(TemplatesCommand),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    script: PathBuf,
    /// Start from this template instead of the autosave slot.
    #[arg(long)]
    template: Option<String>,
    /// Save the result as a template.
    #[arg(long)]
    save_as: Option<String>,
    /// Export the result as PNG.
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TemplatesCommand {
    #[command(subcommand)]
    command: TemplatesSubcommand,
}

#[derive(Subcommand, Debug)]
enum TemplatesSubcommand {
    List,
    /// Import a card document JSON file as a template.
    Save { name: String, file: PathBuf },
    /// Print a template's document, or write it to `--out`.
    Load {
        name: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Delete { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FitArg {
    Cover,
    Stretch,
}

impl From<FitArg> for BackgroundFit {
    fn from(fit: FitArg) -> Self {
        match fit {
            FitArg::Cover => Self::Cover,
            FitArg::Stretch => Self::Stretch,
        }
    }
}

struct CliContext {
    config: AppConfig,
    store: TemplateStore,
}

impl CliContext {
    fn session(&self) -> Session {
        Session::new(load_fonts(self.config.font_dir.as_deref()), None)
    }

    async fn open(&self, name: &str) -> Result<Session, CliError> {
        let document = self.store.load_template(name).await?;
        let mut session = self.session();
        session.open(document).await?;
        Ok(session)
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }
    if cli.font_dir.is_some() {
        config.font_dir = cli.font_dir;
    }
    let store = TemplateStore::new(config.store_dir.clone());
    let ctx = CliContext { config, store };

    match cli.command {
        Command::New { name, width, height, dpi } => run_new(&ctx, &name, width, height, dpi).await,
        Command::Render { name, out } => run_render(&ctx, &name, out).await,
        Command::Replay(args) => run_replay(&ctx, args).await,
        Command::AddImage { name, file } => run_add_image(&ctx, &name, &file).await,
        Command::Background { name, file, fit } => run_background(&ctx, &name, &file, fit.into()).await,
        Command::Templates(cmd) => run_templates(&ctx, cmd.command).await,
    }
}

async fn run_new(ctx: &CliContext, name: &str, width: f64, height: f64, dpi: f64) -> Result<(), CliError> {
    let mut session = ctx.session();
    session.rename_card(name);
    session.resize_card(width, height, dpi);
    let card = &session.core().card;
    info!(name, w = card.width_inches, h = card.height_inches, dpi = card.dpi, "card created");
    ctx.store.save_template(name, &session.document()).await?;
    println!("{name}");
    Ok(())
}

async fn run_render(ctx: &CliContext, name: &str, out: Option<PathBuf>) -> Result<(), CliError> {
    let session = ctx.open(name).await?;
    let out = out.unwrap_or_else(|| PathBuf::from(session.core().export_file_name()));
    write_png(session.engine(), &out).await?;
    println!("{}", out.display());
    Ok(())
}

async fn run_replay(ctx: &CliContext, args: ReplayArgs) -> Result<(), CliError> {
    let text = read_text(&args.script).await?;
    let events: Vec<EngineEvent> = serde_json::from_str(&text).map_err(CliError::Script)?;

    let autosave = spawn_autosave_worker(ctx.store.clone(), ctx.config.autosave_debounce());
    let mut session = Session::new(load_fonts(ctx.config.font_dir.as_deref()), Some(autosave));
    let start = match &args.template {
        Some(name) => Some(ctx.store.load_template(name).await?),
        None => ctx.store.load_autosave().await,
    };
    if let Some(document) = start {
        session.open(document).await?;
    }

    for (index, event) in events.iter().enumerate() {
        let actions = session.apply(event);
        debug!(index, actions = actions.len(), "event applied");
    }
    info!(
        events = events.len(),
        components = session.core().doc.len(),
        saves = session.saves_requested(),
        "script replayed"
    );

    if let Some(name) = &args.save_as {
        ctx.store.save_template(name, &session.document()).await?;
    }
    if let Some(path) = &args.png {
        write_png(session.engine(), path).await?;
    }
    session.close().await;
    Ok(())
}

async fn run_add_image(ctx: &CliContext, name: &str, file: &Path) -> Result<(), CliError> {
    let mut session = ctx.open(name).await?;
    session.add_image_file(file).await?;
    ctx.store.save_template(name, &session.document()).await?;
    Ok(())
}

async fn run_background(ctx: &CliContext, name: &str, file: &Path, fit: BackgroundFit) -> Result<(), CliError> {
    let mut session = ctx.open(name).await?;
    session.set_background_file(file, fit).await?;
    ctx.store.save_template(name, &session.document()).await?;
    Ok(())
}

async fn run_templates(ctx: &CliContext, command: TemplatesSubcommand) -> Result<(), CliError> {
    match command {
        TemplatesSubcommand::List => {
            for summary in ctx.store.list_templates().await? {
                println!("{}\t{}", summary.saved_at, summary.name);
            }
        }
        TemplatesSubcommand::Save { name, file } => {
            let document = Document::from_json(&read_text(&file).await?)?;
            ctx.store.save_template(&name, &document).await?;
        }
        TemplatesSubcommand::Load { name, out } => {
            let json = ctx.store.load_template(&name).await?.to_json_pretty()?;
            match out {
                Some(path) => write_bytes(&path, json.into_bytes()).await?,
                None => println!("{json}"),
            }
        }
        TemplatesSubcommand::Delete { name } => ctx.store.delete_template(&name).await?,
    }
    Ok(())
}

async fn write_png(engine: &Engine, path: &Path) -> Result<(), CliError> {
    let bytes = engine.export_png()?;
    write_bytes(path, bytes).await?;
    info!(path = %path.display(), "card exported");
    Ok(())
}

async fn read_text(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path).await.map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}

async fn write_bytes(path: &Path, bytes: Vec<u8>) -> Result<(), CliError> {
    tokio::fs::write(path, bytes).await.map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}
