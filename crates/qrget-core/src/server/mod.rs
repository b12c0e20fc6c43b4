//! 临时 HTTP 分享端点
//!
//! # 功能
//!
//! - 文件模式：任意路径都返回同一个文件
//! - 目录模式：路径映射到目录下的文件，目录优先返回 `index.html`，否则返回列表
//!
//! `start` 不阻塞调用方，监听循环在独立任务中运行。绑定失败通过
//! [`SignalSender`] 异步上报，与正常结束走同一条路径。

mod listing;
mod routes;

pub use routes::router;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ServerError;
use crate::lifecycle::{SessionEnd, SignalSender};
use crate::target::ServingTarget;

/// 可被协调器关闭的端点
#[async_trait]
pub trait EndpointControl: Send {
    /// 停止接收新连接，等待进行中的响应完成（最多 `grace`）
    ///
    /// 可重复调用；第二次调用直接返回 `Ok(())`。
    async fn shutdown(&mut self, grace: Duration) -> Result<(), ServerError>;
}

/// 端点启动器
pub trait EndpointStarter: Send + Sync {
    fn start(
        &self,
        target: ServingTarget,
        addr: SocketAddr,
        signal: SignalSender,
    ) -> Box<dyn EndpointControl>;
}

/// 基于 axum 的文件分享端点
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpEndpoint;

impl EndpointStarter for HttpEndpoint {
    fn start(
        &self,
        target: ServingTarget,
        addr: SocketAddr,
        signal: SignalSender,
    ) -> Box<dyn EndpointControl> {
        Box::new(start(target, addr, signal))
    }
}

/// 运行中的端点句柄
pub struct EndpointHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

/// 启动端点，立即返回句柄
///
/// 必须在 tokio 运行时内调用。
pub fn start(target: ServingTarget, addr: SocketAddr, signal: SignalSender) -> EndpointHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = router(target);

    let task = tokio::spawn(async move {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind {}: {}", addr, e);
                signal.notify(SessionEnd::EndpointFailed(
                    ServerError::Bind {
                        port: addr.port(),
                        reason: e.to_string(),
                    }
                    .to_string(),
                ));
                return;
            }
        };

        info!("HTTP server listening on {}", addr);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
                debug!("HTTP server received shutdown request");
            })
            .await;

        if let Err(e) = result {
            error!("HTTP server error: {}", e);
            signal.notify(SessionEnd::EndpointFailed(e.to_string()));
        }
    });

    EndpointHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

/// 与地址同族的通配地址（IPv6 地址绑定 `[::]`）
pub fn unspecified_for(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
    }
}

impl EndpointHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// 服务任务是否已结束（绑定失败或已关闭）
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }
}

#[async_trait]
impl EndpointControl for EndpointHandle {
    async fn shutdown(&mut self, grace: Duration) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // 任务已结束时接收端已释放，忽略发送失败
            let _ = tx.send(());
        }

        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => {
                info!("HTTP server on port {} stopped", self.addr.port());
                Ok(())
            }
            Ok(Err(e)) => Err(ServerError::Task(e)),
            Err(_) => {
                warn!(
                    "HTTP server on port {} still busy after {:?}, aborting",
                    self.addr.port(),
                    grace
                );
                task.abort();
                Err(ServerError::ShutdownTimeout(grace))
            }
        }
    }
}

impl Drop for EndpointHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::lifecycle_signal;
    use crate::net::allocate_port;

    fn local(port: u16) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, port))
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = lifecycle_signal();
        let port = allocate_port().unwrap();

        let mut handle = start(ServingTarget::directory(dir.path()), local(port), tx);
        tokio::time::sleep(Duration::from_millis(50)).await;

        handle.shutdown(Duration::from_secs(2)).await.unwrap();
        handle.shutdown(Duration::from_secs(2)).await.unwrap();
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_bind_failure_is_signalled() {
        let occupied = std::net::TcpListener::bind(local(0)).unwrap();
        let port = occupied.local_addr().unwrap().port();
        let (tx, rx) = lifecycle_signal();

        let mut handle = start(ServingTarget::directory("."), local(port), tx);
        assert_eq!(handle.port(), port);

        let cause = tokio::time::timeout(Duration::from_secs(2), rx.wait())
            .await
            .unwrap();
        assert!(matches!(cause, Some(SessionEnd::EndpointFailed(_))), "{:?}", cause);

        // 已失败的端点关闭不应报错或阻塞
        handle.shutdown(Duration::from_secs(1)).await.unwrap();
        handle.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[test]
    fn test_unspecified_matches_family() {
        assert_eq!(
            unspecified_for("192.168.1.2".parse().unwrap()),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
        assert!(unspecified_for("fe80::1".parse().unwrap()).is_ipv6());
    }
}
