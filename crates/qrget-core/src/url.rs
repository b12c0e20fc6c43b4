//! 分享地址构造

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::target::{ServeMode, ServingTarget};

/// 对外公布的完整 URL，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingUrl(String);

impl ServingUrl {
    /// 构造 `http://address:port/[name]`
    ///
    /// 文件模式下路径为文件名，方便接收端保存；端点对任意路径都返回该文件。
    /// 文件名不做转义。
    pub fn build(ip: IpAddr, port: u16, target: &ServingTarget) -> Self {
        let authority = SocketAddr::new(ip, port);
        let name = match target.mode() {
            ServeMode::File => target.file_name().unwrap_or_default(),
            ServeMode::Directory => String::new(),
        };
        Self(format!("http://{}/{}", authority, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServingUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
