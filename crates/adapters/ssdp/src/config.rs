use std::net::Ipv4Addr;

/// Discovery listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpConfig {
    /// Multicast group to join.
    pub multicast_addr: Ipv4Addr,
    /// UDP port to listen on.
    pub port: u16,
}

impl Default for SsdpConfig {
    fn default() -> Self {
        Self {
            multicast_addr: Ipv4Addr::new(239, 255, 255, 250),
            port: 1900,
        }
    }
}
