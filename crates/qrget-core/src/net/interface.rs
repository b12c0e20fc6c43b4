//! 无线网卡地址解析
//!
//! 只支持 Linux：通过 `/sys/class/net/<name>/wireless` 判断网卡是否为无线网卡。
//! 必须恰好存在一个无线网卡，零个或多个都视为配置错误，不做猜测。

use std::net::IpAddr;

#[cfg(target_os = "linux")]
use log::debug;

use crate::error::ResolveError;

/// 本机网卡（启动时读取一次）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
    pub is_wireless: bool,
    pub addrs: Vec<IpAddr>,
}

/// 解析结果：选中的地址与网卡名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub interface: String,
    pub ip: IpAddr,
}

/// 地址来源
pub trait AddressSource: Send + Sync {
    fn resolve(&self) -> Result<ResolvedAddress, ResolveError>;
}

/// 使用操作系统网卡列表的地址来源
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAddressSource;

impl AddressSource for SystemAddressSource {
    fn resolve(&self) -> Result<ResolvedAddress, ResolveError> {
        resolve()
    }
}

/// 从系统网卡中解析无线网卡地址
#[cfg(target_os = "linux")]
pub fn resolve() -> Result<ResolvedAddress, ResolveError> {
    let interfaces: Vec<LocalInterface> = pnet::datalink::interfaces()
        .into_iter()
        .map(|iface| LocalInterface {
            is_wireless: is_wireless(&iface.name),
            addrs: iface.ips.iter().map(|net| net.ip()).collect(),
            name: iface.name,
        })
        .collect();

    debug!("Enumerated {} network interfaces", interfaces.len());
    select_wireless(&interfaces)
}

#[cfg(not(target_os = "linux"))]
pub fn resolve() -> Result<ResolvedAddress, ResolveError> {
    Err(ResolveError::UnsupportedPlatform(std::env::consts::OS))
}

#[cfg(target_os = "linux")]
fn is_wireless(name: &str) -> bool {
    std::fs::symlink_metadata(format!("/sys/class/net/{}/wireless", name))
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

/// 从网卡列表中选出唯一的无线网卡，取其第一个地址
///
/// 不区分 IPv4/IPv6，按枚举顺序取第一个。
pub fn select_wireless(interfaces: &[LocalInterface]) -> Result<ResolvedAddress, ResolveError> {
    let wireless: Vec<&LocalInterface> = interfaces.iter().filter(|i| i.is_wireless).collect();

    let iface = match wireless.as_slice() {
        [] => return Err(ResolveError::NoWirelessInterface),
        [single] => *single,
        many => {
            return Err(ResolveError::AmbiguousWirelessInterface(
                many.iter().map(|i| i.name.clone()).collect(),
            ));
        }
    };

    let ip = iface
        .addrs
        .first()
        .copied()
        .ok_or_else(|| ResolveError::NoAddress(iface.name.clone()))?;

    Ok(ResolvedAddress {
        interface: iface.name.clone(),
        ip,
    })
}
