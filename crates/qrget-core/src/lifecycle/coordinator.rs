//! 会话协调器
//!
//! 启动阶段同步完成地址解析、端口分配、URL 和二维码生成；任何错误都直接返回，
//! 不会打开端点或窗口。之后并发启动端点、窗口轮询和看门狗，等待第一个结束信号，
//! 再按 "关闭窗口 → 关闭端点" 的顺序收尾。

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::watch;

use super::preview::{PreviewOpener, PreviewRequest, PreviewSurface, watch_preview};
use super::signal::{SessionEnd, lifecycle_signal};
use super::watchdog::watchdog;
use crate::config::SessionConfig;
use crate::error::{QrgetError, ServerError};
use crate::net::{AddressSource, EphemeralPortSource, PortSource, ResolvedAddress, SystemAddressSource};
use crate::qr;
use crate::server::{EndpointStarter, HttpEndpoint, unspecified_for};
use crate::target::ServingTarget;
use crate::url::ServingUrl;

/// 协调器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

/// 正常结束的会话摘要
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub address: ResolvedAddress,
    pub url: ServingUrl,
    /// `None` 表示所有参与者都退出了但没有发出信号
    pub cause: Option<SessionEnd>,
}

pub struct LifecycleCoordinator {
    config: SessionConfig,
    target: ServingTarget,
    addresses: Box<dyn AddressSource>,
    ports: Box<dyn PortSource>,
    endpoints: Box<dyn EndpointStarter>,
    previews: Box<dyn PreviewOpener>,
    state: watch::Sender<SessionState>,
}

impl LifecycleCoordinator {
    /// 使用系统网卡、临时端口和 HTTP 端点创建协调器
    pub fn new(
        config: SessionConfig,
        target: ServingTarget,
        previews: impl PreviewOpener + 'static,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Starting);
        Self {
            config,
            target,
            addresses: Box::new(SystemAddressSource),
            ports: Box::new(EphemeralPortSource),
            endpoints: Box::new(HttpEndpoint),
            previews: Box::new(previews),
            state,
        }
    }

    pub fn with_address_source(mut self, source: impl AddressSource + 'static) -> Self {
        self.addresses = Box::new(source);
        self
    }

    pub fn with_port_source(mut self, source: impl PortSource + 'static) -> Self {
        self.ports = Box::new(source);
        self
    }

    pub fn with_endpoint(mut self, starter: impl EndpointStarter + 'static) -> Self {
        self.endpoints = Box::new(starter);
        self
    }

    /// 订阅状态变化
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// 运行一次完整会话
    pub async fn run(self) -> Result<SessionReport, QrgetError> {
        let Self {
            config,
            target,
            addresses,
            ports,
            endpoints,
            previews,
            state,
        } = self;

        state.send_replace(SessionState::Starting);
        if target.is_directory() {
            info!("Serving directory {:?}", target.path());
        } else {
            info!("Serving file {:?}", target.path());
        }

        let address = addresses.resolve()?;
        let port = ports.allocate()?;
        let url = ServingUrl::build(address.ip, port, &target);
        info!("wlan=\"{}\", ip={}, url={}", address.interface, address.ip, url);

        let image = qr::encode(&url, config.ec_level, config.qr_size)?;

        let (signal, lifecycle) = lifecycle_signal();
        let bind = SocketAddr::new(unspecified_for(address.ip), port);
        let mut endpoint = endpoints.start(target.clone(), bind, signal.clone());

        let request = PreviewRequest {
            image,
            title: url.to_string(),
            size: config.window_size,
        };
        let preview: Arc<dyn PreviewSurface> = match previews.open(request) {
            Ok(preview) => preview,
            Err(e) => {
                error!("{}", e);
                state.send_replace(SessionState::ShuttingDown);
                if let Err(stop_err) = endpoint.shutdown(config.grace_period).await {
                    error!("{}", stop_err);
                }
                state.send_replace(SessionState::Terminated);
                return Err(e.into());
            }
        };

        let poller = tokio::spawn(watch_preview(
            preview.clone(),
            config.poll_interval,
            signal.clone(),
        ));

        let deadline = config.deadline();
        match deadline {
            Some(after) => info!("Serving {:?} for {:?}", target.path(), after),
            None => info!("Serving {:?} indefinitely", target.path()),
        }
        let timer = tokio::spawn(watchdog(deadline, signal));

        state.send_replace(SessionState::Running);
        let cause = lifecycle.wait().await;
        match &cause {
            Some(end) => info!("Session ending: {}", end),
            None => warn!("All session tasks exited without a signal"),
        }

        state.send_replace(SessionState::ShuttingDown);
        debug!("Closing preview window");
        preview.close();
        let stopped = endpoint.shutdown(config.grace_period).await;
        poller.abort();
        timer.abort();
        state.send_replace(SessionState::Terminated);
        info!("finished");

        stopped?;
        if let Some(SessionEnd::EndpointFailed(reason)) = cause {
            return Err(ServerError::Serve(reason).into());
        }

        Ok(SessionReport {
            address,
            url,
            cause,
        })
    }
}
