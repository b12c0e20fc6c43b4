//! 超时看门狗

use std::time::Duration;

use log::info;

use super::signal::{SessionEnd, SignalSender};

/// 超时后发布 [`SessionEnd::TimedOut`]；`None` 时永不触发
pub async fn watchdog(deadline: Option<Duration>, signal: SignalSender) {
    match deadline {
        Some(after) => {
            tokio::time::sleep(after).await;
            info!("Timeout of {:?} elapsed", after);
            signal.notify(SessionEnd::TimedOut);
        }
        None => std::future::pending::<()>().await,
    }
}
