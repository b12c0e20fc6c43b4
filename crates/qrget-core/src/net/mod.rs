//! 网络模块
//!
//! - **interface**: 查找本机唯一的无线网卡及其地址
//! - **port**: 分配临时 TCP 端口

pub mod interface;
pub mod port;


pub use interface::{
    AddressSource, LocalInterface, ResolvedAddress, SystemAddressSource, resolve, select_wireless,
};
pub use port::{EphemeralPortSource, PortSource, allocate_port};
