//! Home Status Panel - Host（无头模式）
//!
//! 回放状态事件，驱动格子网格，把面板逐帧写成 PNG。
//!
//! ```bash
//! cargo run -p status-host -- --config config.json --frames 600 --out frames -v
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use status_host::{AppConfig, HostResult, Runner};
use tracing::{Level, error, info};

#[derive(Parser, Debug)]
#[command(name = "status-host")]
#[command(about = "家庭状态面板 - 无头渲染")]
#[command(version)]
struct Cli {
    /// 配置文件
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 布局清单（覆盖配置文件）
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// 状态事件文件（覆盖配置文件）
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// 运行的帧数
    #[arg(short, long, default_value_t = 300)]
    frames: u64,

    /// 帧输出目录（指定后写出 PNG 帧）
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// 日志详细程度（-v: debug，-vv: trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(layout) = &cli.layout {
        config.layout_path = layout.clone();
    }
    if let Some(events) = &cli.events {
        config.events_path = Some(events.clone());
    }
    if let Some(out) = &cli.out {
        config.output.dir = out.clone();
        config.output.write_frames = true;
    }
}

fn run(cli: &Cli) -> HostResult<()> {
    let mut config = AppConfig::load(&cli.config);
    apply_overrides(&mut config, cli);
    config.validate()?;

    let mut runner = Runner::from_config(&config)?;
    let stats = runner.run(cli.frames)?;
    info!(
        full_passes = stats.full_passes,
        event_passes = stats.event_passes,
        expired = stats.expired_keys,
        "统计"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "运行失败");
            ExitCode::FAILURE
        }
    }
}
