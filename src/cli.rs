use crate::{
    browser::{Browser, Locator, Readiness, chrome::ChromeBrowser},
    config::{Action, Config},
    extract::TableExtractor,
    report::RunReport,
    store::ResultDocument,
    util::{ensure_parent, now_rfc3339, sha256_hex},
    walker::Walker,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "gnre-tables")]
#[command(about = "Walks the GNRE table lookup portal and exports its per-state tables as JSON")]
pub struct Args {
    /// Defaults to `run`.
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Path to config TOML. If omitted, uses ./gnre-tables.toml if present,
    /// otherwise the built-in portal defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk every category and jurisdiction and save the tables.
    Run {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Open the portal and check that each category link can be found.
    Doctor {},
    /// Extract rows from a saved results table (its outer HTML).
    Parse {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        jurisdiction: Option<String>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let loaded = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path),
        None => Ok(Config::default()),
    };
    // Log with defaults when the config itself is broken so the error is seen.
    let log_cfg = loaded.as_ref().cloned().unwrap_or_default();
    let _guard = init_logging(&args, &log_cfg)?;
    let cfg = loaded?;

    match &args.cmd {
        None => run(&cfg, None),
        Some(Command::Run { out }) => run(&cfg, out.as_deref()),
        Some(Command::Doctor {}) => doctor(&cfg),
        Some(Command::Parse {
            input,
            jurisdiction,
        }) => parse(&cfg, input, jurisdiction.as_deref()),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("gnre-tables.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; diagnostics go to stderr.
    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if cfg.logging.write_to_file && !cfg.logging.file_path.is_empty() {
        let path = Path::new(&cfg.logging.file_path);
        ensure_parent(path)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn run(cfg: &Config, out_override: Option<&Path>) -> Result<()> {
    let out = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.output.path));
    let index = match out_override {
        Some(p) => p.with_extension("index.json"),
        None => PathBuf::from(&cfg.output.index_path),
    };

    let mut doc = ResultDocument::new(&cfg.categories.labels, cfg.extraction.mode);
    let started = now_rfc3339();

    let browser = ChromeBrowser::launch(cfg)?;
    let mut walker = Walker::new(cfg, browser)?;
    let report = walker.run(&mut doc)?;
    // Closes the browser before the file work.
    drop(walker);

    doc.save(&out)
        .with_context(|| format!("saving results to {}", out.display()))?;
    info!("data saved to {} ({} rows)", out.display(), doc.total_rows());

    if cfg.output.write_index_json {
        write_index(&index, &out, &started, &doc, &report)?;
    }
    Ok(())
}

fn write_index(
    index: &Path,
    out: &Path,
    started: &str,
    doc: &ResultDocument,
    report: &RunReport,
) -> Result<()> {
    let json = doc.to_json()?;
    let body = serde_json::json!({
        "started": started,
        "finished": now_rfc3339(),
        "output": out,
        "sha256": sha256_hex(json.as_bytes()),
        "total_rows": doc.total_rows(),
        "summary": report,
    });
    ensure_parent(index)?;
    std::fs::write(index, serde_json::to_string_pretty(&body)?)
        .with_context(|| format!("writing {}", index.display()))?;
    info!("run index written to {}", index.display());
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    let mut browser = ChromeBrowser::launch(cfg)?;
    browser
        .navigate(&cfg.portal.url)
        .with_context(|| format!("opening portal {}", cfg.portal.url))?;
    let report = check_categories(&mut browser, cfg)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Which configured category links the loaded page shows. The page's own
/// link texts are listed too, for fixing a label that no longer matches.
pub fn check_categories(browser: &mut dyn Browser, cfg: &Config) -> Result<serde_json::Value> {
    let mut present = Vec::new();
    let mut missing = Vec::new();
    for label in &cfg.categories.labels {
        let link = cfg.locators.get(Action::CategoryLink).with_label(label);
        if browser.probe(&link, Readiness::Present)? {
            present.push(label.as_str());
        } else {
            warn!("category link {link} not found");
            missing.push(label.as_str());
        }
    }
    let page_links: Vec<String> = browser
        .texts(&Locator::Tag("a".into()))?
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect();

    Ok(serde_json::json!({
        "url": cfg.portal.url,
        "categories_present": present,
        "categories_missing": missing,
        "page_links": page_links,
    }))
}

fn parse(cfg: &Config, input: &Path, jurisdiction: Option<&str>) -> Result<()> {
    let html = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let extractor = TableExtractor::new(cfg)?;
    let rows = extractor.parse(&html, jurisdiction)?;
    info!("{} rows extracted from {}", rows.len(), input.display());
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
