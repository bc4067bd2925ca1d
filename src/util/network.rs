//! Network checks. None of these fail: unreachable means `false` (or the loopback address).

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;
use tokio::net::TcpStream;

/// True when a TCP connection to `host:port` completes within `timeout`.
pub async fn is_port_open(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!(host, port, error = %e, "port closed");
            false
        }
        Err(_) => {
            tracing::debug!(host, port, "port check timed out");
            false
        }
    }
}

/// Address of the interface that routes to the public internet. Connecting a UDP socket
/// sends nothing; it only selects the route.
pub fn local_ip() -> IpAddr {
    let route_addr = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
        Ok(socket.local_addr()?.ip())
    };
    route_addr().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "local ip lookup failed, using loopback");
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    })
}

/// True when a GET of `url` answers 2xx within `timeout`.
pub async fn check_connectivity(url: &str, timeout: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "http client build failed");
            return false;
        }
    };
    match client.get(url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!(url, error = %e, "connectivity check failed");
            false
        }
    }
}
