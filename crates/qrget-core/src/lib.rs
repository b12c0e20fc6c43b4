//! qrget Core Library
//!
//! 通过无线网卡临时分享一个文件或目录，并把访问地址显示为二维码。
//!
//! # 模块
//!
//! - **net**: 无线网卡地址解析、临时端口分配
//! - **target**: 分享目标（文件/目录）
//! - **url**: 分享地址构造
//! - **qr**: 二维码位图生成
//! - **server**: 临时 HTTP 端点
//! - **lifecycle**: 结束信号、看门狗、会话协调器
//!
//! # 使用示例
//!
//! ```ignore
//! use qrget_core::{LifecycleCoordinator, ServingTarget, SessionConfig};
//!
//! let target = ServingTarget::from_args(&args)?;
//! let report = LifecycleCoordinator::new(SessionConfig::default(), target, opener)
//!     .run()
//!     .await?;
//! println!("session ended: {:?}", report.cause);
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod qr;
pub mod server;
pub mod target;
pub mod url;

pub use config::SessionConfig;
pub use error::{PreviewError, QrError, QrgetError, ResolveError, ServerError, TargetError};
pub use lifecycle::{
    LifecycleCoordinator, PreviewOpener, PreviewRequest, PreviewSurface, SessionEnd,
    SessionReport, SessionState,
};
pub use net::{LocalInterface, ResolvedAddress};
pub use qr::{CodeImage, EcLevel};
pub use server::{EndpointControl, EndpointHandle, HttpEndpoint};
pub use target::{ServeMode, ServingTarget};
pub use url::ServingUrl;
