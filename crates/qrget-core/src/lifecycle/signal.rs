//! 会话结束信号
//!
//! 单槽、多生产者、单消费者。只有第一个信号有意义，之后的写入直接丢弃，
//! 生产者永远不会阻塞。

use std::fmt;

use log::debug;
use tokio::sync::mpsc;

/// 会话结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// 用户关闭了预览窗口
    PreviewClosed,
    /// 超时
    TimedOut,
    /// HTTP 端点失败（绑定失败或服务出错）
    EndpointFailed(String),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::PreviewClosed => write!(f, "preview window closed"),
            SessionEnd::TimedOut => write!(f, "timeout elapsed"),
            SessionEnd::EndpointFailed(reason) => write!(f, "endpoint failed: {}", reason),
        }
    }
}

/// 信号发送端，可克隆给各参与者
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<SessionEnd>,
}

impl SignalSender {
    /// 发布结束信号；槽位已满或协调器已退出时返回 `false`
    pub fn notify(&self, end: SessionEnd) -> bool {
        match self.tx.try_send(end) {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping redundant lifecycle signal: {}", e.into_inner());
                false
            }
        }
    }
}

/// 信号接收端（协调器独占）
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::Receiver<SessionEnd>,
}

impl SignalReceiver {
    /// 等待第一个信号
    ///
    /// 返回 `None` 表示所有生产者都已退出且没有发出信号。
    pub async fn wait(mut self) -> Option<SessionEnd> {
        let first = self.rx.recv().await;
        // 关闭通道，后续写入立即失败而不是排队
        self.rx.close();
        first
    }
}

/// 创建容量为 1 的结束信号
pub fn lifecycle_signal() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SignalSender { tx }, SignalReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_signal_wins() {
        let (tx, rx) = lifecycle_signal();
        let tx2 = tx.clone();

        assert!(tx.notify(SessionEnd::TimedOut));
        assert!(!tx2.notify(SessionEnd::PreviewClosed));

        assert_eq!(rx.wait().await, Some(SessionEnd::TimedOut));
    }

    #[tokio::test]
    async fn test_late_writer_does_not_block() {
        let (tx, rx) = lifecycle_signal();
        tx.notify(SessionEnd::PreviewClosed);
        assert_eq!(rx.wait().await, Some(SessionEnd::PreviewClosed));

        // 协调器已经离开，晚到的写入立即返回
        assert!(!tx.notify(SessionEnd::TimedOut));
    }

    #[tokio::test]
    async fn test_all_producers_gone() {
        let (tx, rx) = lifecycle_signal();
        drop(tx);
        assert_eq!(rx.wait().await, None);
    }
}
