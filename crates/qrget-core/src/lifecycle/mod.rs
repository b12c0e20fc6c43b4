//! 会话生命周期
//!
//! 三个并发参与者（HTTP 端点、预览窗口、超时看门狗）只向协调器报告"结束"，
//! 协调器收到第一个信号后依次关闭预览窗口和端点。
//!
//! ```text
//! Starting ──► Running ──(首个 SessionEnd)──► ShuttingDown ──► Terminated
//! ```

pub mod coordinator;
pub mod preview;
pub mod signal;
pub mod watchdog;

pub use coordinator::{LifecycleCoordinator, SessionReport, SessionState};
pub use preview::{PreviewOpener, PreviewRequest, PreviewSurface, watch_preview};
pub use signal::{SessionEnd, SignalReceiver, SignalSender, lifecycle_signal};
pub use watchdog::watchdog;
