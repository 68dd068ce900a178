use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

/// Best guess at the address other machines on the LAN reach us on.
///
/// Connecting a UDP socket sends nothing; it only asks the OS which
/// interface would route there. Falls back to loopback.
pub fn local_ipv4() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// The URL producers should dial for a listener bound to `bound`.
pub fn public_url(bound: SocketAddr) -> String {
    let ip = if bound.ip().is_unspecified() {
        local_ipv4()
    } else {
        bound.ip()
    };
    format!("ws://{}", SocketAddr::new(ip, bound.port()))
}
