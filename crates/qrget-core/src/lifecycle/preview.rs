//! 预览窗口接口
//!
//! 窗口事件循环由 GUI 工具包持有，这里只能查询"是否已关闭"和请求关闭。

use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::time::MissedTickBehavior;

use super::signal::{SessionEnd, SignalSender};
use crate::error::PreviewError;
use crate::qr::CodeImage;

/// 打开窗口所需的信息
#[derive(Debug, Clone)]
pub struct PreviewRequest {
    pub image: CodeImage,
    pub title: String,
    pub size: (f32, f32),
}

/// 已打开的预览窗口
///
/// 只有打开窗口的协调器调用 `close`，轮询任务只调用 `is_closed`。
pub trait PreviewSurface: Send + Sync {
    fn is_closed(&self) -> bool;

    /// 请求关闭窗口，可重复调用
    fn close(&self);
}

/// 预览窗口工厂
pub trait PreviewOpener: Send + Sync {
    fn open(&self, request: PreviewRequest) -> Result<Arc<dyn PreviewSurface>, PreviewError>;
}

/// 定时轮询窗口状态，关闭后发布 [`SessionEnd::PreviewClosed`]
pub async fn watch_preview(
    surface: Arc<dyn PreviewSurface>,
    interval: Duration,
    signal: SignalSender,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if surface.is_closed() {
            info!("Preview window closed");
            signal.notify(SessionEnd::PreviewClosed);
            return;
        }
    }
}
