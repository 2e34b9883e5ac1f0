use clap::Parser;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use fxsim::config::SimConfig;
use fxsim::engine::TradeEngine;
use fxsim::feed::spawn_quote_stream;
use fxsim::models::format_usd;
use fxsim::session::{parse_line, Command, SessionController, SessionEvent};

/// Simulated EUR/USD margin trading: a synthetic quote stream, one position
/// at a time, margin-call and stop-out rules enforced tick by tick.
#[derive(Parser, Debug)]
#[command(name = "fxsim", version, about)]
struct Args {
    /// Initial account deposit, applied before the session starts
    #[arg(long)]
    deposit: Option<f64>,

    /// Seed for the price walk (reproducible sessions)
    #[arg(long)]
    seed: Option<u64>,

    /// Session length in seconds
    #[arg(long)]
    session_secs: Option<u64>,

    /// Seconds between generated quotes
    #[arg(long)]
    quote_secs: Option<u64>,

    /// Seconds per OHLC bar window
    #[arg(long)]
    bar_secs: Option<u64>,

    /// Print the trade history and bar series as JSON when the session ends
    #[arg(long)]
    dump_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let mut cfg = SimConfig::from_env();
    if let Some(seed) = args.seed {
        cfg.rng_seed = Some(seed);
    }
    if let Some(secs) = args.session_secs {
        cfg.session_limit = Duration::from_secs(secs);
    }
    if let Some(secs) = args.quote_secs {
        cfg.quote_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.bar_secs {
        cfg.bar_window = Duration::from_secs(secs);
    }

    tracing::info!("fxsim starting - EUR/USD margin trading simulator");
    tracing::info!(
        "  session: {}s, quote every {}s, bars every {}s, margin rate {:.0}%",
        cfg.session_limit.as_secs(),
        cfg.quote_interval.as_secs(),
        cfg.bar_window.as_secs(),
        cfg.margin_rate * 100.0
    );

    // Producer -> controller plumbing
    let (stop_tx, stop_rx) = watch::channel(false);
    let (quote_tx, quote_rx) = mpsc::channel(64);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut events) = mpsc::unbounded_channel();

    let producer = spawn_quote_stream(cfg.quote_interval, cfg.rng_seed, quote_tx, stop_rx);
    let engine = TradeEngine::new(cfg.margin_model(), cfg.margin_policy());
    let controller = SessionController::new(
        cfg, engine, quote_rx, command_rx, event_tx, stop_tx, producer,
    );
    let session = tokio::spawn(controller.run());

    if let Some(amount) = args.deposit {
        let _ = command_tx.send(Command::Deposit(amount));
    }

    tracing::info!(
        "Commands: deposit <amount> | open long|short <units> | buy <units> | sell <units> | close | quit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Closed) | None => break,
                Some(event) => print_event(event),
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match parse_line(trimmed) {
                        Ok(command) => {
                            let _ = command_tx.send(command);
                        }
                        Err(msg) => tracing::warn!("{}", msg),
                    }
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down ...");
                let _ = command_tx.send(Command::Quit);
            }
        }
    }

    let report = session.await?;
    tracing::info!(
        "Session over: {} quotes, {} bars, {} history rows, final balance {}",
        report.quotes_processed,
        report.bars.len(),
        report.history.len(),
        format_usd(report.final_balance)
    );

    if args.dump_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn setup_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "fxsim=info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Tick { bid, ask, time } => {
            tracing::info!(
                "tick {} | bid {:.4} ask {:.4}",
                time.format("%H:%M:%S"),
                bid,
                ask
            );
        }
        SessionEvent::Valuation(row) => {
            tracing::info!(
                "balance {} | equity {} | float P&L {} | used margin {} | free margin {} | margin level {:.2}% | realized P&L {}",
                format_usd(row.balance),
                format_usd(row.equity),
                format_usd(row.floating_pl),
                format_usd(row.used_margin),
                format_usd(row.free_margin),
                row.margin_level_pct,
                format_usd(row.realized_pl)
            );
        }
        SessionEvent::Bar(bar) => {
            tracing::info!(
                "bar {} | O {:.4} H {:.4} L {:.4} C {:.4}",
                bar.time.format("%H:%M:%S"),
                bar.open,
                bar.high,
                bar.low,
                bar.close
            );
        }
        SessionEvent::Message(message) => tracing::info!("{}", message),
        SessionEvent::Closed => {}
    }
}
