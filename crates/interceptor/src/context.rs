//! Call context and route metadata passed through the interceptor.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};
use tonic::transport::server::TcpConnectInfo;
use tracing::warn;

#[cfg(unix)]
use tonic::transport::server::UdsConnectInfo;

/// Network origin of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    Tcp(SocketAddr),
    /// Unix domain socket peer; unnamed sockets carry no path.
    Unix(Option<PathBuf>),
}

impl Peer {
    /// IP of a TCP peer; `None` for every other transport.
    pub fn tcp_ip(&self) -> Option<IpAddr> {
        match self {
            Peer::Tcp(addr) => Some(addr.ip()),
            Peer::Unix(_) => None,
        }
    }
}

/// Snapshot of what the transport knows about a call: inbound metadata and
/// the peer it arrived from.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: MetadataMap,
    peer: Option<Peer>,
}

impl CallContext {
    pub fn new(metadata: MetadataMap, peer: Option<Peer>) -> Self {
        Self { metadata, peer }
    }

    /// Capture the context of a tonic request without consuming it.
    pub fn from_request<T>(request: &tonic::Request<T>) -> Self {
        let peer = request.remote_addr().map(Peer::Tcp);
        #[cfg(unix)]
        let peer = peer.or_else(|| request.extensions().get::<UdsConnectInfo>().map(unix_peer));

        Self::new(request.metadata().clone(), peer)
    }

    /// Capture the context of a raw HTTP/2 request as seen by a tower layer.
    pub fn from_http<B>(request: &http::Request<B>) -> Self {
        let extensions = request.extensions();
        let peer = extensions
            .get::<TcpConnectInfo>()
            .and_then(TcpConnectInfo::remote_addr)
            .map(Peer::Tcp);
        #[cfg(unix)]
        let peer = peer.or_else(|| extensions.get::<UdsConnectInfo>().map(unix_peer));

        Self::new(MetadataMap::from_headers(request.headers().clone()), peer)
    }

    pub fn builder() -> CallContextBuilder {
        CallContextBuilder::default()
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }

    /// Textual IP of a TCP peer, or an empty string.
    pub fn caller_address(&self) -> String {
        self.peer
            .as_ref()
            .and_then(Peer::tcp_ip)
            .map(|ip| ip.to_string())
            .unwrap_or_default()
    }
}

#[cfg(unix)]
fn unix_peer(info: &UdsConnectInfo) -> Peer {
    let path = info
        .peer_addr
        .as_ref()
        .and_then(|addr| addr.as_pathname())
        .map(|path| path.to_path_buf());
    Peer::Unix(path)
}

/// Builder for contexts assembled outside a live transport.
#[derive(Debug, Default)]
pub struct CallContextBuilder {
    metadata: MetadataMap,
    peer: Option<Peer>,
}

impl CallContextBuilder {
    pub fn tcp_peer(mut self, addr: SocketAddr) -> Self {
        self.peer = Some(Peer::Tcp(addr));
        self
    }

    pub fn unix_peer(mut self, path: Option<PathBuf>) -> Self {
        self.peer = Some(Peer::Unix(path));
        self
    }

    /// Append an ASCII metadata entry. Invalid keys or values are skipped.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        match (
            MetadataKey::<Ascii>::from_bytes(key.as_bytes()),
            value.parse::<MetadataValue<Ascii>>(),
        ) {
            (Ok(key), Ok(value)) => {
                self.metadata.append(key, value);
            }
            _ => warn!(key = %key, "Skipping invalid metadata entry"),
        }
        self
    }

    pub fn build(self) -> CallContext {
        CallContext::new(self.metadata, self.peer)
    }
}

/// Route metadata: the fully-qualified method the server resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    full_method: String,
}

impl RouteInfo {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
        }
    }

    pub fn full_method(&self) -> &str {
        &self.full_method
    }

    pub fn service(&self) -> Option<&str> {
        split_route_path(&self.full_method).map(|(service, _)| service)
    }

    pub fn method(&self) -> Option<&str> {
        split_route_path(&self.full_method).map(|(_, method)| method)
    }
}

/// Split `/pkg.Service/Method` into its service and method parts.
pub fn split_route_path(path: &str) -> Option<(&str, &str)> {
    let (service, method) = path.strip_prefix('/')?.split_once('/')?;
    if service.is_empty() || method.is_empty() {
        return None;
    }
    Some((service, method))
}
