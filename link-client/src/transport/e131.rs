//! ANSI E1.31 (streaming ACN) backend.
//!
//! The frame's RGB channels start at `channel_offset` of the first universe
//! and continue across consecutive universes of `universe_size` channels.
//! Each universe is sent as one E1.31 data packet, unicast to the
//! controller, with its own sequence counter.

use std::net::IpAddr;
use uuid::Uuid;
use wled_link_core::{BackendConfig, E131Settings, ModeSettings};
use wled_link_types::{Rgb, MAX_UNIVERSE};

use super::socket::DatagramSink;
use super::{visible, Backend, TransportError};

/// Length of the root, framing and DMP layer headers plus the start code.
pub const HEADER_LEN: usize = 126;

const ACN_PACKET_IDENTIFIER: &[u8; 12] = b"ASC-E1.17\0\0\0";
const VECTOR_ROOT_E131_DATA: u32 = 0x0000_0004;
const VECTOR_E131_DATA_PACKET: u32 = 0x0000_0002;
const VECTOR_DMP_SET_PROPERTY: u8 = 0x02;
const SOURCE_NAME_LEN: usize = 64;
const DEFAULT_PRIORITY: u8 = 100;

/// E1.31 transport.
#[derive(Debug)]
pub struct E131Backend {
    config: BackendConfig,
    settings: E131Settings,
    sink: DatagramSink,
    cid: [u8; 16],
    sequences: Vec<u8>,
}

impl E131Backend {
    /// Create an inactive backend with a fresh component identifier.
    pub fn new(config: BackendConfig) -> Self {
        let settings = match &config.settings {
            ModeSettings::E131(settings) => settings.clone(),
            other => {
                tracing::warn!("E1.31 backend given {} settings, using defaults", other.mode());
                E131Settings::default()
            }
        };
        Self {
            sink: DatagramSink::new(settings.port),
            settings,
            config,
            cid: *Uuid::new_v4().as_bytes(),
            sequences: Vec::new(),
        }
    }

    /// Number of universes a full frame occupies.
    pub fn universe_count(&self) -> usize {
        self.settings.universe_count(self.config.pixel_count) as usize
    }

    /// Encode a frame into one packet per universe, advancing each
    /// universe's sequence number. Channels past universe 63999 are dropped.
    pub fn encode(&mut self, frame: &[Rgb]) -> Vec<Vec<u8>> {
        let frame = visible(frame, self.config.pixel_count);
        let slots = layout(&self.settings, frame);
        if self.sequences.len() < slots.len() {
            self.sequences.resize(slots.len(), 0);
        }

        let source_name = format!("wled-link {}", self.config.name);
        slots
            .iter()
            .enumerate()
            .map_while(|(i, data)| {
                let universe = u16::try_from(i)
                    .ok()
                    .and_then(|i| self.settings.universe.checked_add(i))
                    .filter(|universe| *universe <= MAX_UNIVERSE)?;
                let sequence = self.sequences[i];
                self.sequences[i] = sequence.wrapping_add(1);
                Some(packet(&self.cid, &source_name, universe, sequence, data))
            })
            .collect()
    }
}

/// Split a frame's channels into per-universe slot data.
fn layout(settings: &E131Settings, frame: &[Rgb]) -> Vec<Vec<u8>> {
    if frame.is_empty() {
        return Vec::new();
    }
    let universe_size = usize::from(settings.universe_size.max(1));
    let mut universes: Vec<Vec<u8>> = Vec::new();

    for (i, channel) in frame.iter().flatten().enumerate() {
        let absolute = usize::from(settings.channel_offset) + i;
        let (universe, slot) = (absolute / universe_size, absolute % universe_size);
        if universes.len() <= universe {
            universes.resize_with(universe + 1, Vec::new);
        }
        let data = &mut universes[universe];
        if data.len() <= slot {
            data.resize(slot + 1, 0);
        }
        data[slot] = *channel;
    }
    universes
}

fn packet(cid: &[u8; 16], source_name: &str, universe: u16, sequence: u8, data: &[u8]) -> Vec<u8> {
    let total = HEADER_LEN + data.len();
    let flags_len = |from: usize| (0x7000 | (total - from) as u16).to_be_bytes();

    let mut name = [0u8; SOURCE_NAME_LEN];
    let name_bytes = source_name.as_bytes();
    let name_len = name_bytes.len().min(SOURCE_NAME_LEN - 1);
    name[..name_len].copy_from_slice(&name_bytes[..name_len]);

    let mut packet = Vec::with_capacity(total);
    // Root layer
    packet.extend_from_slice(&0x0010u16.to_be_bytes());
    packet.extend_from_slice(&0x0000u16.to_be_bytes());
    packet.extend_from_slice(ACN_PACKET_IDENTIFIER);
    packet.extend_from_slice(&flags_len(16));
    packet.extend_from_slice(&VECTOR_ROOT_E131_DATA.to_be_bytes());
    packet.extend_from_slice(cid);
    // Framing layer
    packet.extend_from_slice(&flags_len(38));
    packet.extend_from_slice(&VECTOR_E131_DATA_PACKET.to_be_bytes());
    packet.extend_from_slice(&name);
    packet.push(DEFAULT_PRIORITY);
    packet.extend_from_slice(&0u16.to_be_bytes()); // synchronization address
    packet.push(sequence);
    packet.push(0); // options
    packet.extend_from_slice(&universe.to_be_bytes());
    // DMP layer
    packet.extend_from_slice(&flags_len(115));
    packet.push(VECTOR_DMP_SET_PROPERTY);
    packet.push(0xa1); // address and data type
    packet.extend_from_slice(&0u16.to_be_bytes()); // first property address
    packet.extend_from_slice(&1u16.to_be_bytes()); // address increment
    packet.extend_from_slice(&(data.len() as u16 + 1).to_be_bytes());
    packet.push(0); // DMX start code
    packet.extend_from_slice(data);
    packet
}

impl Backend for E131Backend {
    fn activate(&mut self) -> Result<(), TransportError> {
        self.sink.open()?;
        tracing::debug!(
            "E1.31 active for {} on universes {}..{}",
            self.config.name,
            self.settings.universe,
            usize::from(self.settings.universe) + self.universe_count()
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
