//! The transport seam: the engine speaks to nameservers through this
//! trait, so tests can script responses without sockets, and the
//! default implementation uses real UDP and TCP.

use std::io;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::net::{TcpStream, UdpSocket};

use dns_wire::protocol::types::MAX_EDNS_SIZE;

use crate::util::net::{read_tcp_bytes, send_tcp_bytes, send_udp_bytes};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Protocol {
    Udp,
    Tcp,
}

/// Something which can open a DNS exchange with a nameserver.
pub trait Transport {
    type Socket: TransportSocket + Send;

    /// Connect to a nameserver.  For UDP this is a connected socket,
    /// so datagrams from other source addresses never reach the
    /// engine.
    fn connect(
        &self,
        address: SocketAddr,
        protocol: Protocol,
    ) -> impl std::future::Future<Output = io::Result<Self::Socket>> + Send;
}

/// One connected exchange: send the query once, then receive
/// candidate responses until one validates or time runs out.
pub trait TransportSocket {
    fn send(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = io::Result<()>> + Send;

    fn recv(&mut self) -> impl std::future::Future<Output = io::Result<BytesMut>> + Send;
}

/// The real thing: UDP datagrams with TCP for truncation fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetTransport;

impl Transport for NetTransport {
    type Socket = NetSocket;

    async fn connect(&self, address: SocketAddr, protocol: Protocol) -> io::Result<Self::Socket> {
        match protocol {
            Protocol::Udp => {
                let local = if address.is_ipv4() {
                    "0.0.0.0:0"
                } else {
                    "[::]:0"
                };
                let socket = UdpSocket::bind(local).await?;
                socket.connect(address).await?;
                Ok(NetSocket::Udp(socket))
            }
            Protocol::Tcp => Ok(NetSocket::Tcp(TcpStream::connect(address).await?)),
        }
    }
}

pub enum NetSocket {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

impl TransportSocket for NetSocket {
    async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            NetSocket::Udp(socket) => send_udp_bytes(socket, bytes).await,
            NetSocket::Tcp(stream) => send_tcp_bytes(stream, bytes).await,
        }
    }

    async fn recv(&mut self) -> io::Result<BytesMut> {
        match self {
            NetSocket::Udp(socket) => {
                let mut buf = vec![0u8; MAX_EDNS_SIZE];
                let count = socket.recv(&mut buf).await?;
                buf.truncate(count);
                Ok(BytesMut::from(&buf[..]))
            }
            NetSocket::Tcp(stream) => Ok(read_tcp_bytes(stream).await?),
        }
    }
}
