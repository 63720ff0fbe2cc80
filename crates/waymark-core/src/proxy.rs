//! Trusted proxy resolution.
//!
//! A deployment behind an edge proxy sees the proxy's address as the peer.
//! The [`TrustedProxies`] table maps proxy networks to the header that proxy
//! uses to forward the original client address, so the real client IP can be
//! recovered without trusting the same header from arbitrary peers.

use std::net::IpAddr;
use std::path::Path;

use http::{HeaderMap, HeaderName};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};

/// The built-in table of well-known edge proxies.
pub const KNOWN_PROXIES: &str = include_str!("known_proxies.txt");

/// Error raised while loading a proxy table.
#[derive(Debug, thiserror::Error)]
pub enum ProxyTableError {
    /// A line does not start with a valid CIDR.
    #[error("line {line}: invalid CIDR {value:?}: {source}")]
    InvalidCidr {
        /// One-based line number.
        line: usize,
        /// The offending text.
        value: String,
        /// Parser error.
        #[source]
        source: ipnet::AddrParseError,
    },

    /// A line has a CIDR but no header name.
    #[error("line {line}: missing header name")]
    MissingHeader {
        /// One-based line number.
        line: usize,
    },

    /// The header name is not a valid HTTP header name.
    #[error("line {line}: invalid header name {value:?}")]
    InvalidHeader {
        /// One-based line number.
        line: usize,
        /// The offending text.
        value: String,
    },

    /// A line has more than two fields.
    #[error("line {line}: unexpected trailing data")]
    TrailingData {
        /// One-based line number.
        line: usize,
    },

    /// The table file could not be read.
    #[error("failed to read proxy table: {0}")]
    Io(#[from] std::io::Error),
}

/// Table of trusted proxy networks, split by address family.
///
/// Lookups are a linear scan and the first matching network wins.
///
/// # Example
///
/// ```
/// use std::net::IpAddr;
/// use waymark_core::TrustedProxies;
///
/// let table = TrustedProxies::parse("10.0.0.0/8 X-Real-IP\n").unwrap();
/// let peer: IpAddr = "10.1.2.3".parse().unwrap();
/// assert_eq!(table.resolve_trusted_header(peer).map(|h| h.as_str()), Some("x-real-ip"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies {
    v4: Vec<(Ipv4Net, HeaderName)>,
    v6: Vec<(Ipv6Net, HeaderName)>,
}

impl TrustedProxies {
    /// Creates an empty table that trusts nobody.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the built-in table of well-known edge proxies.
    pub fn known() -> Result<Self, ProxyTableError> {
        Self::parse(KNOWN_PROXIES)
    }

    /// Reads and parses a table file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProxyTableError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a table: one `<CIDR> <header-name>` pair per line, `#` starts
    /// a comment line. Any malformed line rejects the whole table.
    pub fn parse(table: &str) -> Result<Self, ProxyTableError> {
        let mut proxies = Self::empty();

        for (index, raw) in table.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let mut fields = text.split_whitespace();
            let cidr = fields.next().unwrap_or_default();
            let network: IpNet = cidr.parse().map_err(|source| ProxyTableError::InvalidCidr {
                line,
                value: cidr.to_owned(),
                source,
            })?;
            let header = fields.next().ok_or(ProxyTableError::MissingHeader { line })?;
            let header = HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
                ProxyTableError::InvalidHeader {
                    line,
                    value: header.to_owned(),
                }
            })?;
            if fields.next().is_some() {
                return Err(ProxyTableError::TrailingData { line });
            }

            proxies.insert(network, header);
        }

        Ok(proxies)
    }

    /// Appends a network to the table.
    pub fn insert(&mut self, network: IpNet, header: HeaderName) {
        match network {
            IpNet::V4(net) => self.v4.push((net, header)),
            IpNet::V6(net) => self.v6.push((net, header)),
        }
    }

    /// Returns the number of networks in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// Returns the forwarded-IP header a peer is trusted to supply.
    ///
    /// IPv4-mapped IPv6 peers are looked up in the IPv4 list.
    #[must_use]
    pub fn resolve_trusted_header(&self, ip: IpAddr) -> Option<&HeaderName> {
        match ip {
            IpAddr::V4(v4) => self.lookup_v4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => self.lookup_v4(v4),
                None => self
                    .v6
                    .iter()
                    .find(|(net, _)| net.contains(&v6))
                    .map(|(_, header)| header),
            },
        }
    }

    fn lookup_v4(&self, ip: std::net::Ipv4Addr) -> Option<&HeaderName> {
        self.v4
            .iter()
            .find(|(net, _)| net.contains(&ip))
            .map(|(_, header)| header)
    }

    /// Returns the effective client address for a request from `peer`.
    ///
    /// When `peer` is a trusted proxy and the request carries that proxy's
    /// header with a parseable IP, the header value wins; otherwise `peer` is
    /// returned unchanged.
    #[must_use]
    pub fn effective_ip(&self, peer: IpAddr, headers: &HeaderMap) -> IpAddr {
        self.resolve_trusted_header(peer)
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(peer)
    }
}
