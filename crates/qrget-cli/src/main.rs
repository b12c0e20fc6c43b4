//! qrget
//!
//! 通过无线网卡临时分享一个文件或目录，扫描窗口中的二维码即可下载。
//! 超时或关闭窗口后自动停止分享。
//!
//! ```bash
//! qrget                    # 分享当前目录，5 分钟后停止
//! qrget -v -t 0 movie.mkv  # 分享单个文件，直到关闭窗口
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qrget_core::{LifecycleCoordinator, QrgetError, ServingTarget, SessionConfig};
use qrget_preview::EguiPreview;

#[derive(Parser, Debug)]
#[command(name = "qrget", version, about = "Share a file over WiFi using a QR code")]
struct Cli {
    /// 要分享的文件或目录（默认为当前目录）
    paths: Vec<PathBuf>,

    /// 输出地址、分享目标和关闭过程
    #[arg(short, long)]
    verbose: bool,

    /// 分享时长，0 表示直到关闭窗口
    #[arg(short, long, value_parser = parse_duration, default_value = "5m")]
    timeout: Duration,

    /// 关闭 HTTP 服务时等待进行中下载的时长
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    grace: Duration,
}

/// 解析 `5s`、`10m` 等时长，允许不带单位的 `0`
fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    if s.trim() == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(s)
}

fn init_logging(verbose: bool) {
    // 桥接 log crate（qrget-core 使用）到 tracing
    let _ = tracing_log::LogTracer::init();

    let default_filter = if verbose {
        "warn,qrget=info,qrget_core=info,qrget_preview=info"
    } else {
        "warn"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .try_init();
}

/// 启动前失败时注明没有分享任何内容
fn describe_failure(err: QrgetError) -> anyhow::Error {
    if err.is_configuration() {
        anyhow::Error::new(err).context("invalid configuration, nothing was shared")
    } else {
        err.into()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let target =
        ServingTarget::from_args(&cli.paths).map_err(|e| describe_failure(e.into()))?;
    let config = SessionConfig {
        timeout: cli.timeout,
        grace_period: cli.grace,
        ..Default::default()
    };

    let report = LifecycleCoordinator::new(config, target, EguiPreview)
        .run()
        .await
        .map_err(describe_failure)?;

    tracing::debug!("Session for {} ended: {:?}", report.url, report.cause);
    Ok(())
}
