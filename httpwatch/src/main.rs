use anyhow::Result;
use clap::Parser;
use httpwatch_core::follow::LineFollower;
use httpwatch_core::logging::init_logging;
use httpwatch_core::pipeline::{self, PipelineConfig};
use httpwatch_core::rate::Rate;
use httpwatch_core::render::TerminalSize;

#[derive(Parser, Debug)]
#[command(
    name = "httpwatch",
    version,
    about = "httpwatch: live HTTP access-log monitor"
)]
struct Cli {
    /// Access log file to follow
    #[arg(default_value = "/tmp/access.log")]
    file: String,

    /// Alerting threshold, e.g. 10/s or 100/10m
    #[arg(long, default_value = "10/s")]
    alert: Rate,

    /// Seconds between dashboard refreshes
    #[arg(long, default_value_t = 10)]
    interval: u64,

    /// How many top sections to display
    #[arg(long, default_value_t = 5)]
    top: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "httpwatch failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    anyhow::ensure!(cli.interval > 0, "--interval must be positive");
    anyhow::ensure!(cli.top > 0, "--top must be positive");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime");

    rt.block_on(async {
        let follower = LineFollower::attach(&cli.file).await?;
        tracing::info!(file = %cli.file, alert = %cli.alert, "following access log");

        let cfg = PipelineConfig {
            alert: cli.alert,
            render_interval_secs: cli.interval,
            top_n: cli.top,
            term: terminal_size(),
        };

        tokio::select! {
            res = pipeline::run(follower, cfg) => res.map_err(Into::into),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; shutting down");
                Ok(())
            }
        }
    })
}

/// Terminal size is only a rendering parameter; `$LINES`/`$COLUMNS` with a
/// 24x80 fallback is good enough.
fn terminal_size() -> TerminalSize {
    fn dimension(name: &str, default: u16) -> u16 {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(default)
    }

    TerminalSize {
        rows: dimension("LINES", 24),
        cols: dimension("COLUMNS", 80),
    }
}
