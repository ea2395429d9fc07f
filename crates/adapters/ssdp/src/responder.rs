use std::net::{Ipv4Addr, SocketAddr};

use huemu_domain::bridge::{BridgeIdentity, IDENTITY};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::config::SsdpConfig;
use crate::error::SsdpError;

const BASIC_DEVICE: &str = "urn:schemas-upnp-org:device:basic:1";
const ROOT_DEVICE: &str = "upnp:rootdevice";
const ALL: &str = "ssdp:all";

/// Search targets the bridge answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    BasicDevice,
    RootDevice,
    All,
}

impl SearchTarget {
    /// Match the `ST` header value, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(BASIC_DEVICE) {
            Some(Self::BasicDevice)
        } else if value.eq_ignore_ascii_case(ROOT_DEVICE) {
            Some(Self::RootDevice)
        } else if value.eq_ignore_ascii_case(ALL) {
            Some(Self::All)
        } else {
            None
        }
    }

    /// Target echoed back in `ST`; `ssdp:all` is answered as the basic device.
    #[must_use]
    pub const fn reply_target(self) -> &'static str {
        match self {
            Self::BasicDevice | Self::All => BASIC_DEVICE,
            Self::RootDevice => ROOT_DEVICE,
        }
    }
}

/// Builds discovery replies for one advertised address.
#[derive(Debug, Clone)]
pub struct Responder {
    identity: BridgeIdentity,
    location: String,
}

impl Responder {
    #[must_use]
    pub fn new(advertise_ip: &str, http_port: u16) -> Self {
        Self {
            identity: IDENTITY,
            location: format!("http://{advertise_ip}:{http_port}/description.xml"),
        }
    }

    /// `LOCATION` advertised in every reply.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Reply to a datagram, or `None` when it is not a search we answer.
    #[must_use]
    pub fn handle(&self, datagram: &[u8]) -> Option<String> {
        let target = parse_search(&String::from_utf8_lossy(datagram))?;
        Some(self.reply(target))
    }

    /// Render the unicast reply for a search target.
    #[must_use]
    pub fn reply(&self, target: SearchTarget) -> String {
        let st = target.reply_target();
        format!(
            "HTTP/1.1 200 OK\r\n\
             CACHE-CONTROL: max-age=100\r\n\
             EXT:\r\n\
             LOCATION: {location}\r\n\
             SERVER: {server}\r\n\
             hue-bridgeid: {bridge_id}\r\n\
             ST: {st}\r\n\
             USN: {udn}::{st}\r\n\
             \r\n",
            location = self.location,
            server = self.identity.server,
            bridge_id = self.identity.bridge_id,
            udn = self.identity.udn(),
        )
    }
}

/// Extract the search target of an `M-SEARCH` request.
fn parse_search(message: &str) -> Option<SearchTarget> {
    let mut lines = message.lines();
    let request_line = lines.next()?;
    if !request_line.trim_start().starts_with("M-SEARCH") {
        return None;
    }
    lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("ST"))
        .and_then(|(_, value)| SearchTarget::parse(value))
}

/// Bind the discovery port and join the multicast group on all interfaces.
///
/// The address is bound with `SO_REUSEADDR` so the port can be shared with
/// other SSDP listeners on the host. Must be called from within a tokio
/// runtime.
///
/// # Errors
///
/// Returns [`SsdpError`] when the port cannot be bound or the group cannot
/// be joined.
pub fn bind_multicast(config: &SsdpConfig) -> Result<UdpSocket, SsdpError> {
    let bind_error = |source| SsdpError::Bind {
        port: config.port,
        source,
    };
    let socket =
        Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(SsdpError::Runtime)?;
    socket.set_reuse_address(true).map_err(bind_error)?;
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    socket.bind(&addr.into()).map_err(bind_error)?;
    socket
        .join_multicast_v4(&config.multicast_addr, &Ipv4Addr::UNSPECIFIED)
        .map_err(|source| SsdpError::JoinMulticast {
            group: config.multicast_addr,
            source,
        })?;
    socket.set_nonblocking(true).map_err(SsdpError::Runtime)?;
    UdpSocket::from_std(socket.into()).map_err(SsdpError::Runtime)
}

/// Answer searches on `socket` until `cancel` fires.
///
/// Receive and send failures are logged and the loop keeps going.
pub async fn serve(socket: UdpSocket, responder: Responder, cancel: CancellationToken) {
    let mut buf = [0u8; 2048];
    tracing::info!(location = %responder.location(), "discovery responder started");
    loop {
        let (len, peer): (usize, SocketAddr) = tokio::select! {
            () = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(err) => {
                    tracing::warn!(error = %err, "discovery receive failed");
                    continue;
                }
            },
        };

        let Some(reply) = responder.handle(&buf[..len]) else {
            continue;
        };
        match socket.send_to(reply.as_bytes(), peer).await {
            Ok(_) => tracing::debug!(%peer, "discovery reply sent"),
            Err(err) => tracing::warn!(%peer, error = %err, "discovery reply failed"),
        }
    }
    tracing::info!("discovery responder stopped");
}
