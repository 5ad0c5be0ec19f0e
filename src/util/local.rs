//! Decides whether a pooler runs on this machine.
//!
//! Log viewing and config editing open files by the path the pooler
//! reports, which only makes sense when that path is on our filesystem.

use std::net::{IpAddr, ToSocketAddrs, UdpSocket};

use tracing::debug;

/// True if `host` is a Unix socket directory, a loopback name, or an
/// address assigned to one of this machine's interfaces.
pub fn is_local_host(host: &str) -> bool {
    if host.starts_with('/') || host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let addrs: Vec<IpAddr> = match host.parse::<IpAddr>() {
        Ok(ip) => vec![ip],
        Err(_) => match (host, 0).to_socket_addrs() {
            Ok(addrs) => addrs.map(|a| a.ip()).collect(),
            Err(e) => {
                debug!(host, error = %e, "cannot resolve host");
                return false;
            }
        },
    };

    addrs.iter().any(|ip| is_own_address(*ip))
}

/// Binding succeeds only for addresses configured on a local interface.
fn is_own_address(ip: IpAddr) -> bool {
    ip.is_loopback() || UdpSocket::bind((ip, 0)).is_ok()
}
