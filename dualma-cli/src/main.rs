//! DualMA CLI: run the triple moving-average crossover over a CSV feed.
//!
//! Commands:
//! - `run`: load a CSV of daily bars, run one backtest and print the summary

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dualma_core::config::{BacktestConfig, FillTiming, ZeroSizePolicy};
use dualma_core::data::CsvSource;
use dualma_core::engine::{run_backtest, RunResult};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "dualma",
    version,
    about = "DualMA: triple moving-average crossover backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest over a CSV of daily bars.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// CSV with header date,time,open,high,low,close,volume,amount.
    #[arg(long)]
    data: PathBuf,

    /// TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting cash.
    #[arg(long)]
    cash: Option<f64>,

    /// Commission rate as a fraction of notional (0.0003 = 3 bps).
    #[arg(long)]
    commission: Option<f64>,

    /// Short moving-average period.
    #[arg(long)]
    short: Option<usize>,

    /// Medium moving-average period.
    #[arg(long)]
    medium: Option<usize>,

    /// Long moving-average period.
    #[arg(long)]
    long: Option<usize>,

    /// When orders are executed.
    #[arg(long, value_enum)]
    fill_timing: Option<FillTimingArg>,

    /// What to do when the computed entry size is zero.
    #[arg(long, value_enum)]
    zero_size: Option<ZeroSizeArg>,

    /// Log every order creation, execution and closed trade.
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Print the summary as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FillTimingArg {
    /// Fill at the close of the signal bar.
    Close,
    /// Fill at the open of the next bar.
    NextOpen,
}

impl From<FillTimingArg> for FillTiming {
    fn from(arg: FillTimingArg) -> Self {
        match arg {
            FillTimingArg::Close => FillTiming::SameBarClose,
            FillTimingArg::NextOpen => FillTiming::NextBarOpen,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ZeroSizeArg {
    Skip,
    Submit,
}

impl From<ZeroSizeArg> for ZeroSizePolicy {
    fn from(arg: ZeroSizeArg) -> Self {
        match arg {
            ZeroSizeArg::Skip => ZeroSizePolicy::Skip,
            ZeroSizeArg::Submit => ZeroSizePolicy::Submit,
        }
    }
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd(args),
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        data = %args.data.display(),
        config_hash = %config.config_hash(),
        "starting backtest"
    );

    let source = CsvSource::from_path(&args.data, &config.date_format)
        .with_context(|| format!("opening {}", args.data.display()))?;
    let result = run_backtest(source, &config)
        .with_context(|| format!("backtest over {}", args.data.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.summary)?);
    } else {
        print_summary(&args.data, &result);
    }
    Ok(())
}

/// Config file (or defaults), then command-line overrides, then validation.
fn build_config(args: &RunArgs) -> Result<BacktestConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BacktestConfig::default(),
    };

    if let Some(cash) = args.cash {
        config.broker.starting_cash = cash;
    }
    if let Some(rate) = args.commission {
        config.broker.commission_rate = rate;
    }
    if let Some(period) = args.short {
        config.strategy.short_period = period;
    }
    if let Some(period) = args.medium {
        config.strategy.medium_period = period;
    }
    if let Some(period) = args.long {
        config.strategy.long_period = period;
    }
    if let Some(timing) = args.fill_timing {
        config.fill_timing = timing.into();
    }
    if let Some(policy) = args.zero_size {
        config.strategy.zero_size = policy.into();
    }
    if args.verbose {
        config.verbose = true;
    }

    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))
}

fn print_summary(data: &Path, result: &RunResult) {
    let s = &result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Data:           {}", data.display());
    println!("Strategy:       {}", result.strategy);
    println!(
        "Bars:           {} ({} warmup)",
        s.bars_processed, s.warmup_bars
    );
    println!(
        "Orders:         {} submitted, {} filled, {} rejected",
        s.orders_submitted, s.orders_filled, s.orders_rejected
    );
    println!("Trades:         {}", s.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Starting Cash:  {:.2}", s.starting_cash);
    println!("Ending Value:   {:.2}", s.ending_value);
    println!("Total Return:   {:.2}%", s.total_return * 100.0);
    println!("Max Drawdown:   {:.2}%", s.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", s.profit_factor);
    println!("Commission:     {:.2}", s.total_commission);
    if let Some(hash) = &s.config_hash {
        println!("Config Hash:    {}", &hash[..16.min(hash.len())]);
    }
    if let Some(order) = &result.unfilled_order {
        println!();
        println!(
            "WARNING: order {} ({} {}) still pending after the last bar",
            order.id, order.side, order.size
        );
    }
}
