//! WLED realtime UDP backend.
//!
//! Packets are the configured data prefix followed by pixel data. With the
//! default DRGB prefix (`[0x02, timeout]`) a packet holds up to 490 pixels;
//! longer frames are split into DNRGB packets carrying a start index. With
//! `include_indexes`, each pixel is sent as `[index, r, g, b]`.

use std::net::IpAddr;
use wled_link_core::template::DRGB_PROTOCOL;
use wled_link_core::{udp_data_prefix, BackendConfig, ModeSettings, UdpSettings};
use wled_link_types::{Rgb, DEFAULT_TIMEOUT};

use super::socket::DatagramSink;
use super::{visible, Backend, TransportError};

/// Most pixels in one DRGB packet.
pub const DRGB_MAX_PIXELS: usize = 490;

/// Most pixels in one DNRGB packet.
pub const DNRGB_MAX_PIXELS: usize = 489;

/// Most pixels addressable with a one-byte index.
pub const INDEXED_MAX_PIXELS: usize = 256;

const DNRGB_PROTOCOL: u8 = 4;

/// WLED realtime UDP transport.
#[derive(Debug)]
pub struct UdpBackend {
    config: BackendConfig,
    settings: UdpSettings,
    sink: DatagramSink,
}

impl UdpBackend {
    /// Create an inactive backend.
    pub fn new(config: BackendConfig) -> Self {
        let settings = match &config.settings {
            ModeSettings::Udp(settings) => settings.clone(),
            other => {
                tracing::warn!("UDP backend given {} settings, using defaults", other.mode());
                UdpSettings::default()
            }
        };
        let sink = DatagramSink::new(settings.port);
        Self {
            config,
            settings,
            sink,
        }
    }

    /// Encode a frame into packets.
    pub fn encode(&self, frame: &[Rgb]) -> Vec<Vec<u8>> {
        encode(&self.settings, visible(frame, self.config.pixel_count))
    }
}

fn encode(settings: &UdpSettings, frame: &[Rgb]) -> Vec<Vec<u8>> {
    if frame.is_empty() {
        return Vec::new();
    }
    let prefix = settings
        .data_prefix
        .clone()
        .unwrap_or_else(|| udp_data_prefix(DEFAULT_TIMEOUT));

    if settings.include_indexes {
        let mut packet = prefix;
        for (index, pixel) in frame.iter().take(INDEXED_MAX_PIXELS).enumerate() {
            packet.push(index as u8);
            packet.extend_from_slice(pixel);
        }
        return vec![packet];
    }

    if prefix.first() == Some(&DRGB_PROTOCOL) && frame.len() > DRGB_MAX_PIXELS {
        let timeout = prefix.get(1).copied().unwrap_or(DEFAULT_TIMEOUT);
        return frame
            .chunks(DNRGB_MAX_PIXELS)
            .enumerate()
            .map_while(|(i, chunk)| {
                let start = u16::try_from(i * DNRGB_MAX_PIXELS).ok()?;
                let mut packet = Vec::with_capacity(4 + chunk.len() * 3);
                packet.extend_from_slice(&[DNRGB_PROTOCOL, timeout]);
                packet.extend_from_slice(&start.to_be_bytes());
                chunk.iter().for_each(|pixel| packet.extend_from_slice(pixel));
                Some(packet)
            })
            .collect();
    }

    let mut packet = Vec::with_capacity(prefix.len() + frame.len() * 3);
    packet.extend_from_slice(&prefix);
    frame.iter().for_each(|pixel| packet.extend_from_slice(pixel));
    vec![packet]
}

impl Backend for UdpBackend {
    fn activate(&mut self) -> Result<(), TransportError> {
        self.sink.open()?;
        tracing::debug!(
            "UDP realtime active for {} on port {}",
            self.config.name,
            self.settings.port
        );
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
