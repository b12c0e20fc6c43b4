//! 错误类型
//!
//! 按阶段划分：配置错误（启动前）、资源错误、关闭错误。
//! 运行期的请求错误只记录日志，不在这里出现。

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// 无线网卡地址解析错误
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("wireless interface detection is not supported on {0}")]
    UnsupportedPlatform(&'static str),

    #[error("no wireless network interface found")]
    NoWirelessInterface,

    #[error("more than one wireless interface found ({}), refusing to guess", .0.join(", "))]
    AmbiguousWirelessInterface(Vec<String>),

    #[error("wireless interface {0} has no assigned address")]
    NoAddress(String),
}

/// 分享目标（命令行参数）错误
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("serving more than one path is not supported (got {0})")]
    TooManyArguments(usize),

    #[error("cannot access {path:?}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot determine current directory: {0}")]
    CurrentDir(#[source] io::Error),
}

/// 二维码生成错误
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("URL is too long to encode as a QR code ({0} bytes)")]
    TooLong(usize),

    #[error("QR encoding failed: {0}")]
    Encode(String),
}

/// HTTP 端点错误
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to allocate a free TCP port: {0}")]
    PortAllocation(#[source] io::Error),

    #[error("failed to bind port {port}: {reason}")]
    Bind { port: u16, reason: String },

    #[error("HTTP server failed: {0}")]
    Serve(String),

    #[error("HTTP server did not stop within {0:?}, the port may still be bound")]
    ShutdownTimeout(Duration),

    #[error("HTTP server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// 预览窗口错误
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("failed to open preview window: {0}")]
    Open(String),
}

/// 会话级错误
#[derive(Debug, thiserror::Error)]
pub enum QrgetError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Qr(#[from] QrError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Preview(#[from] PreviewError),
}

impl QrgetError {
    /// 是否为启动前的配置错误（此时没有打开任何资源）
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QrgetError::Resolve(_) | QrgetError::Target(_) | QrgetError::Qr(_)
        )
    }
}
