use std::net::Ipv4Addr;

/// Errors raised while setting up the discovery socket.
#[derive(Debug, thiserror::Error)]
pub enum SsdpError {
    #[error("unable to bind discovery socket on port {port}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to join multicast group {group}")]
    JoinMulticast {
        group: Ipv4Addr,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to hand the discovery socket to the runtime")]
    Runtime(#[source] std::io::Error),
}
