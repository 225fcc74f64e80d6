//! Distributed Display Protocol backend.
//!
//! Each packet carries a 10-byte header followed by up to 1440 bytes of RGB
//! data. Frames larger than one packet are split; only the final packet has
//! the PUSH flag set, which tells the controller to display the frame.

use std::net::IpAddr;
use wled_link_core::{BackendConfig, DdpSettings, ModeSettings};
use wled_link_types::Rgb;

use super::socket::DatagramSink;
use super::{visible, Backend, TransportError};

/// DDP header length in bytes.
pub const HEADER_LEN: usize = 10;

/// Largest data payload per packet (480 RGB pixels).
pub const MAX_DATA_LEN: usize = 1440;

const VER1: u8 = 0x40;
const PUSH: u8 = 0x01;
const DATATYPE_RGB: u8 = 0x01;
const DEST_DISPLAY: u8 = 0x01;
const MAX_SEQUENCE: u8 = 15;

/// DDP transport.
#[derive(Debug)]
pub struct DdpBackend {
    config: BackendConfig,
    sink: DatagramSink,
    sequence: u8,
}

impl DdpBackend {
    /// Create an inactive backend.
    pub fn new(config: BackendConfig) -> Self {
        let settings = match &config.settings {
            ModeSettings::Ddp(settings) => settings.clone(),
            other => {
                tracing::warn!("DDP backend given {} settings, using defaults", other.mode());
                DdpSettings::default()
            }
        };
        Self {
            config,
            sink: DatagramSink::new(settings.port),
            sequence: 0,
        }
    }

    /// Encode a frame into packets, advancing the sequence number.
    pub fn encode(&mut self, frame: &[Rgb]) -> Vec<Vec<u8>> {
        let frame = visible(frame, self.config.pixel_count);
        if frame.is_empty() {
            return Vec::new();
        }
        self.sequence = self.sequence % MAX_SEQUENCE + 1;
        encode(frame, self.sequence)
    }
}

fn encode(frame: &[Rgb], sequence: u8) -> Vec<Vec<u8>> {
    let data: Vec<u8> = frame.iter().flatten().copied().collect();
    let chunk_count = data.len().div_ceil(MAX_DATA_LEN);

    data.chunks(MAX_DATA_LEN)
        .enumerate()
        .map(|(i, chunk)| {
            let flags = if i + 1 == chunk_count { VER1 | PUSH } else { VER1 };
            let offset = (i * MAX_DATA_LEN) as u32;
            let mut packet = Vec::with_capacity(HEADER_LEN + chunk.len());
            packet.extend_from_slice(&[flags, sequence, DATATYPE_RGB, DEST_DISPLAY]);
            packet.extend_from_slice(&offset.to_be_bytes());
            packet.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
            packet.extend_from_slice(chunk);
            packet
        })
        .collect()
}

impl Backend for DdpBackend {
    fn activate(&mut self) -> Result<(), TransportError> {
        self.sink.open()?;
        tracing::debug!("DDP active for {}", self.config.name);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.sink.close();
    }

    fn flush(&mut self, frame: &[Rgb]) -> Result<(), TransportError> {
        if !self.sink.is_open() {
            return Err(TransportError::NotActive);
        }
        for packet in self.encode(frame) {
            self.sink.send(&packet)?;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.sink.is_open()
    }

    fn destination(&self) -> Option<IpAddr> {
        self.sink.destination()
    }

    fn set_destination(&mut self, destination: Option<IpAddr>) {
        self.sink.set_destination(destination);
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }
}
