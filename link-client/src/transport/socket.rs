//! Non-blocking datagram socket shared by the network backends.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use super::TransportError;

/// A lazily opened UDP socket aimed at one controller port.
#[derive(Debug)]
pub(crate) struct DatagramSink {
    socket: Option<UdpSocket>,
    destination: Option<IpAddr>,
    port: u16,
}

impl DatagramSink {
    pub(crate) fn new(port: u16) -> Self {
        Self {
            socket: None,
            destination: None,
            port,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    pub(crate) fn destination(&self) -> Option<IpAddr> {
        self.destination
    }

    pub(crate) fn set_destination(&mut self, destination: Option<IpAddr>) {
        self.destination = destination;
    }

    /// Bind an ephemeral local port of the destination's address family.
    pub(crate) fn open(&mut self) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let destination = self.destination.ok_or(TransportError::NoDestination)?;
        let local: IpAddr = match destination {
            IpAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
            IpAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
        };
        let socket = UdpSocket::bind(SocketAddr::new(local, 0)).map_err(TransportError::Bind)?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::Bind)?;
        self.socket = Some(socket);
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        self.socket = None;
    }

    /// Send one datagram. A full socket buffer drops the packet.
    pub(crate) fn send(&self, packet: &[u8]) -> Result<(), TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotActive)?;
        let destination = self.destination.ok_or(TransportError::NoDestination)?;
        match socket.send_to(packet, SocketAddr::new(destination, self.port)) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                tracing::trace!("Socket buffer full, dropped {} byte packet", packet.len());
                Ok(())
            }
            Err(e) => Err(TransportError::Send(e)),
        }
    }
}
