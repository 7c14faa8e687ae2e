//! Host address lookup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use tracing::debug;

use crate::{RegistrationError, Result};

/// First IPv4 address the host name resolves to.
pub fn first_ipv4_address() -> Result<Ipv4Addr> {
    let host = hostname::get()
        .map_err(|e| RegistrationError::AddressLookup(e.to_string()))?
        .into_string()
        .map_err(|_| RegistrationError::AddressLookup("host name is not valid UTF-8".into()))?;

    let addrs = (host.as_str(), 0)
        .to_socket_addrs()
        .map_err(|e| RegistrationError::AddressLookup(format!("{}: {}", host, e)))?;

    let ip = first_ipv4(addrs).ok_or_else(|| {
        RegistrationError::AddressLookup(format!("{} has no IPv4 address", host))
    })?;

    debug!(host = %host, ip = %ip, "Resolved host address");
    Ok(ip)
}

/// `http://` base URL for the host's first IPv4 address.
pub fn host_base_url() -> Result<String> {
    Ok(format!("http://{}", first_ipv4_address()?))
}

fn first_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_skips_ipv6() {
        let addrs = vec![
            SocketAddr::from((Ipv6Addr::LOCALHOST, 0)),
            SocketAddr::from((Ipv4Addr::new(10, 0, 0, 5), 0)),
            SocketAddr::from((Ipv4Addr::new(10, 0, 0, 6), 0)),
        ];
        assert_eq!(first_ipv4(addrs), Some(Ipv4Addr::new(10, 0, 0, 5)));
    }

    #[test]
    fn test_no_ipv4() {
        let addrs = vec![SocketAddr::from((Ipv6Addr::LOCALHOST, 0))];
        assert_eq!(first_ipv4(addrs), None);
    }
}
