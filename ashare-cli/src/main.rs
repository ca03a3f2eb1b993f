//! ashare CLI: fetch A-share tables, preview them, and optionally save them.
//!
//! Commands:
//! - `history`: daily/weekly/monthly bars for one symbol
//! - `financial`: statements, indicators, valuation and ROE for one symbol
//! - `info`: market snapshot, company profile, holders, boards and members
//! - `search`: stocks whose name (or, with `--code-or-name`, code) contains a keyword
//! - `favorites`: configured symbols and the exchange each trades on

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ashare_core::data::{Adjust, EastmoneyProvider, MarketData, Retrieved, Value};
use ashare_core::persist::{self, PersistenceTarget, SaveOutcome, TextEncoding};
use ashare_core::Settings;

#[derive(Parser)]
#[command(name = "ashare", about = "A-share market data: fetch, preview, save")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price bars for one symbol.
    History {
        /// Six-digit stock code (e.g., 600000).
        symbol: String,

        #[arg(long, value_enum, default_value_t = PeriodArg::Daily)]
        period: PeriodArg,

        /// Start date (YYYYMMDD). Defaults to the configured start date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYYMMDD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Price adjustment: qfq, hfq, or "" for none. Defaults to the configured value.
        #[arg(long)]
        adjust: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Financial statements and indicators for one symbol.
    Financial {
        symbol: String,

        #[arg(long, value_enum, default_value_t = FinancialKind::Summary)]
        kind: FinancialKind,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Market-wide and company information.
    Info {
        #[command(subcommand)]
        action: InfoAction,
    },
    /// Stocks whose name contains KEYWORD.
    Search {
        keyword: String,

        /// Also match the stock code (e.g., 6005 finds 600519).
        #[arg(long, default_value_t = false)]
        code_or_name: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List configured favorite stocks with their exchange.
    Favorites {
        /// Settings file. Defaults to the user config directory.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum InfoAction {
    /// Real-time quotes for every listed stock.
    Snapshot {
        /// Market name. Only A股 is supported.
        #[arg(long)]
        market: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Company profile fields.
    Profile {
        symbol: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Ten largest shareholders.
    Holders {
        symbol: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Board listing.
    Boards {
        #[arg(value_enum)]
        kind: BoardArg,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Constituents of one board.
    Members {
        #[arg(value_enum)]
        kind: BoardArg,

        /// Board name (e.g., 银行) or board code (e.g., BK0475).
        name: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Save the result here; .xlsx/.xls writes a workbook, anything else CSV.
    /// A bare file name is placed in the configured data directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Settings file. Defaults to the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write CSV without the UTF-8 byte-order mark.
    #[arg(long, default_value_t = false)]
    no_bom: bool,

    /// Rows to preview on stdout.
    #[arg(long, default_value_t = 5)]
    rows: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Clone, Copy, ValueEnum)]
enum FinancialKind {
    Summary,
    Balance,
    Income,
    Cashflow,
    Valuation,
    Roe,
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardArg {
    Industry,
    Concept,
    Region,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::History {
            symbol,
            period,
            start,
            end,
            adjust,
            output,
        } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            let adjust = adjust.as_deref().map(Adjust::from_tag);
            let (start, end) = (start.as_deref(), end.as_deref());
            let result = match period {
                PeriodArg::Daily => md.daily_history(&symbol, start, end, adjust),
                PeriodArg::Weekly => md.weekly_history(&symbol, start, end, adjust),
                PeriodArg::Monthly => md.monthly_history(&symbol, start, end, adjust),
            };
            emit(&result, &output, &settings)
        }
        Commands::Financial {
            symbol,
            kind,
            output,
        } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            let result = match kind {
                FinancialKind::Summary => md.financial_summary(&symbol),
                FinancialKind::Balance => md.balance_sheet(&symbol),
                FinancialKind::Income => md.income_statement(&symbol),
                FinancialKind::Cashflow => md.cash_flow(&symbol),
                FinancialKind::Valuation => md.valuation(&symbol),
                FinancialKind::Roe => md.roe_history(&symbol),
            };
            emit(&result, &output, &settings)
        }
        Commands::Info { action } => run_info(action),
        Commands::Search {
            keyword,
            code_or_name,
            output,
        } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            let result = if code_or_name {
                md.search_by_code_or_name(&keyword)
            } else {
                md.search_by_name(&keyword)
            };
            emit(&result, &output, &settings)
        }
        Commands::Favorites { config } => run_favorites(config.as_deref()),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ─── Info ───────────────────────────────────────────────────────────

fn run_info(action: InfoAction) -> Result<()> {
    match action {
        InfoAction::Snapshot { market, output } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            emit(&md.market_snapshot(market.as_deref()), &output, &settings)
        }
        InfoAction::Profile { symbol, output } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            emit(&md.company_profile(&symbol), &output, &settings)
        }
        InfoAction::Holders { symbol, output } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            emit(&md.top_holders(&symbol), &output, &settings)
        }
        InfoAction::Boards { kind, output } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            let result = match kind {
                BoardArg::Industry => md.industry_boards(),
                BoardArg::Concept => md.concept_boards(),
                BoardArg::Region => md.region_boards(),
            };
            emit(&result, &output, &settings)
        }
        InfoAction::Members { kind, name, output } => {
            let (md, settings) = market_data(output.config.as_deref())?;
            let result = match kind {
                BoardArg::Industry => md.stocks_by_industry(&name),
                BoardArg::Concept => md.stocks_by_concept(&name),
                BoardArg::Region => md.stocks_by_region(&name),
            };
            emit(&result, &output, &settings)
        }
    }
}

// ─── Favorites ──────────────────────────────────────────────────────

fn run_favorites(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;

    println!("Stocks:");
    for symbol in &settings.favorite_stocks {
        let market = settings.market_name_for(symbol).unwrap_or("?");
        println!("  {symbol}  {market}");
    }
    println!("Industries: {}", settings.favorite_industries.join(", "));
    println!("Concepts:   {}", settings.favorite_concepts.join(", "));
    println!(
        "Timeout: {}s  Retries (not applied): {}",
        settings.request_timeout_secs, settings.max_retries
    );
    Ok(())
}

// ─── Shared ─────────────────────────────────────────────────────────

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ashare").join("settings.toml"))
}

/// Explicit path must exist; the default path is optional.
fn load_settings(path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = path {
        return Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.exists() => Settings::from_file(&path)
            .with_context(|| format!("loading settings from {}", path.display())),
        _ => Ok(Settings::default()),
    }
}

fn market_data(config: Option<&Path>) -> Result<(MarketData<EastmoneyProvider>, Settings)> {
    let settings = load_settings(config)?;
    let provider = EastmoneyProvider::new(settings.request_timeout())
        .context("creating HTTP client")?;
    let md = MarketData::with_defaults(provider, settings.request_defaults());
    tracing::debug!(
        timeout_secs = md.provider().timeout().as_secs(),
        start = %md.defaults().start_date,
        adjust = %md.defaults().adjust,
        "retrieval configured"
    );
    Ok((md, settings))
}

/// A bare file name lands in the configured data directory.
fn resolve_output(out: &Path, settings: &Settings) -> PathBuf {
    let has_dir = out.parent().is_some_and(|p| !p.as_os_str().is_empty());
    if has_dir || out.is_absolute() {
        out.to_path_buf()
    } else {
        settings.data_dir.join(out)
    }
}

fn emit(result: &Retrieved, output: &OutputArgs, settings: &Settings) -> Result<()> {
    preview(result, output.rows);

    if let Some(out) = &output.out {
        let path = resolve_output(out, settings);
        if !result.is_empty() && path.starts_with(&settings.data_dir) {
            std::fs::create_dir_all(&settings.data_dir)
                .with_context(|| format!("creating {}", settings.data_dir.display()))?;
        }
        let mut target = PersistenceTarget::new(path);
        if output.no_bom {
            target = target.with_encoding(TextEncoding::Utf8);
        }
        match persist::save(result, &target)? {
            SaveOutcome::Written { path, rows } => {
                println!("Saved {rows} rows to {}", path.display());
            }
            SaveOutcome::Skipped => println!("Nothing saved."),
        }
    }
    Ok(())
}

fn preview(result: &Retrieved, rows: usize) {
    let Some(table) = result.table() else {
        println!("No data.");
        return;
    };

    println!("{}", table.columns().join("\t"));
    for row in table.head(rows).rows() {
        let cells: Vec<String> = row.iter().map(Value::to_string).collect();
        println!("{}", cells.join("\t"));
    }
    if table.len() > rows {
        println!("... {} rows total", table.len());
    }
}
