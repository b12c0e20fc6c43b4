//! 会话配置

use std::time::Duration;

use crate::qr::EcLevel;

/// 默认超时（与命令行默认值一致）
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// 预览窗口关闭检测间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// HTTP 服务优雅关闭的等待上限
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// 一次分享会话的参数
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 会话时长，0 表示不限
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub ec_level: EcLevel,
    /// 二维码边长（像素）
    pub qr_size: u32,
    /// 预览窗口尺寸 (宽, 高)
    pub window_size: (f32, f32),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
            ec_level: EcLevel::M,
            qr_size: 256,
            window_size: (276.0, 280.0),
        }
    }
}

impl SessionConfig {
    /// 超时时长；`None` 表示不限时
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout.is_zero() {
            None
        } else {
            Some(self.timeout)
        }
    }
}
