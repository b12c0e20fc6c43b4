//! 临时端口分配

use std::net::{Ipv4Addr, TcpListener};

use crate::error::ServerError;

/// 端口来源
pub trait PortSource: Send + Sync {
    fn allocate(&self) -> Result<u16, ServerError>;
}

/// 由操作系统分配空闲端口
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralPortSource;

impl PortSource for EphemeralPortSource {
    fn allocate(&self) -> Result<u16, ServerError> {
        allocate_port()
    }
}

/// 绑定 0 号端口获取一个空闲端口后立即释放
///
/// 释放后到真正绑定之间端口可能被占用，这种情况由端点异步上报。
pub fn allocate_port() -> Result<u16, ServerError> {
    let listener =
        TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(ServerError::PortAllocation)?;
    let port = listener
        .local_addr()
        .map_err(ServerError::PortAllocation)?
        .port();
    Ok(port)
}
