//! Stream a test pattern to a controller.

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use wled_link_client::{CapabilityNegotiator, ControlConnector, WledDevice};
use wled_link_types::{Rgb, SyncMode};

use crate::config::AppConfig;

/// Test pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every pixel the same color.
    Solid(Rgb),
    /// A rainbow moving along the strip.
    Rainbow,
}

impl FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("rainbow") {
            return Ok(Self::Rainbow);
        }
        let bytes = hex::decode(s.trim_start_matches('#'))
            .map_err(|_| format!("expected 'rainbow' or an RRGGBB color, got {s:?}"))?;
        let rgb: Rgb = bytes
            .try_into()
            .map_err(|_| format!("expected 'rainbow' or an RRGGBB color, got {s:?}"))?;
        Ok(Self::Solid(rgb))
    }
}

impl Pattern {
    /// Render frame number `tick` for a strip of `pixel_count` pixels.
    pub fn render(&self, pixel_count: u32, tick: u64) -> Vec<Rgb> {
        match *self {
            Self::Solid(rgb) => vec![rgb; pixel_count as usize],
            Self::Rainbow => {
                let n = u64::from(pixel_count.max(1));
                (0..n)
                    .map(|i| wheel(((i * 256 / n + tick * 4) % 256) as u8))
                    .collect()
            }
        }
    }
}

/// Map a position on the color wheel to RGB.
fn wheel(pos: u8) -> Rgb {
    match pos {
        0..=84 => [255 - pos * 3, pos * 3, 0],
        85..=169 => {
            let p = pos - 85;
            [0, 255 - p * 3, p * 3]
        }
        _ => {
            let p = pos - 170;
            [p * 3, 0, 255 - p * 3]
        }
    }
}

/// Stream command options.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Override the configured sync mode.
    pub mode: Option<SyncMode>,
    /// Pattern to send.
    pub pattern: Pattern,
    /// Frames per second.
    pub fps: u32,
    /// How long to stream.
    pub duration: Duration,
    /// Negotiate with the controller before streaming.
    pub negotiate: bool,
}

/// Run the stream command. Returns the number of frames sent.
pub async fn run<C: ControlConnector>(
    config: &AppConfig,
    connector: &C,
    options: &StreamOptions,
) -> Result<u64> {
    let mut device_config = config.device.clone();
    if let Some(mode) = options.mode {
        device_config.sync_mode = mode;
    }
    let mut device = WledDevice::new(device_config).context("Invalid device configuration")?;

    if options.negotiate {
        let negotiator = CapabilityNegotiator::new(config.negotiation.clone());
        let report = device
            .initialize(connector, &negotiator)
            .await
            .context("Failed to initialize controller")?;
        tracing::info!(
            "negotiated with {} (firmware {})",
            report.identity.name,
            report.identity.firmware_version
        );
    } else {
        device
            .resolve_destination()
            .await
            .context("Failed to resolve controller address")?;
    }

    device.activate().context("Failed to activate device")?;
    println!(
        "Streaming to {} via {} at {} fps for {:?} (Ctrl-C to stop)",
        device.config().name,
        device.config().sync_mode,
        options.fps,
        options.duration
    );

    let period = Duration::from_secs_f64(1.0 / f64::from(options.fps.max(1)));
    let mut interval = tokio::time::interval(period);
    let deadline = Instant::now() + options.duration;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut frames = 0u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
        }
        let frame = options.pattern.render(device.config().pixel_count, frames);
        device.flush(&frame).context("Failed to send frame")?;
        frames += 1;
        if Instant::now() >= deadline {
            break;
        }
    }

    device.deactivate();
    println!("Sent {} frames", frames);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, UdpSocket};
    use wled_link_client::MockControl;
    use wled_link_core::NegotiatorConfig;
    use wled_link_types::{DeviceConfig, ModeOverrides, RemoteIdentity};

    // ===========================================
    // Patterns
    // ===========================================

    #[test]
    fn parse_patterns() {
        assert_eq!("rainbow".parse::<Pattern>(), Ok(Pattern::Rainbow));
        assert_eq!(
            "ff8000".parse::<Pattern>(),
            Ok(Pattern::Solid([0xff, 0x80, 0x00]))
        );
        assert_eq!(
            "#0000ff".parse::<Pattern>(),
            Ok(Pattern::Solid([0, 0, 0xff]))
        );
        assert!("ff80".parse::<Pattern>().is_err());
        assert!("sparkle".parse::<Pattern>().is_err());
    }

    #[test]
    fn solid_fills_strip() {
        let frame = Pattern::Solid([1, 2, 3]).render(5, 0);
        assert_eq!(frame, vec![[1, 2, 3]; 5]);
    }

    #[test]
    fn rainbow_moves() {
        let a = Pattern::Rainbow.render(10, 0);
        let b = Pattern::Rainbow.render(10, 1);
        assert_eq!(a.len(), 10);
        assert_eq!(a[0], [255, 0, 0]);
        assert_ne!(a, b);
    }

    // ===========================================
    // Streaming
    // ===========================================

    fn receiver() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    fn app_config(port: u16) -> AppConfig {
        AppConfig {
            device: DeviceConfig::new("bench", "127.0.0.1", 3)
                .with_timeout(4)
                .with_overrides(ModeOverrides {
                    port: Some(port),
                    ..Default::default()
                }),
            negotiation: NegotiatorConfig::default(),
        }
    }

    fn options(negotiate: bool) -> StreamOptions {
        StreamOptions {
            mode: None,
            pattern: Pattern::Solid([9, 8, 7]),
            fps: 30,
            duration: Duration::ZERO,
            negotiate,
        }
    }

    #[tokio::test]
    async fn streams_one_udp_frame() {
        let (socket, port) = receiver();
        let control = MockControl::default();

        let frames = run(&app_config(port), &control, &options(false))
            .await
            .unwrap();

        assert_eq!(frames, 1);
        let mut buf = [0u8; 64];
        let n = socket.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[2, 4, 9, 8, 7, 9, 8, 7, 9, 8, 7]);
        assert!(control.calls().is_empty());
    }

    #[tokio::test]
    async fn negotiated_geometry_shapes_frames() {
        let (socket, port) = receiver();
        let control = MockControl::new(RemoteIdentity {
            name: "bench".into(),
            pixel_count: 1,
            rgbw: false,
            firmware_version: "0.14.0".into(),
        });

        run(&app_config(port), &control, &options(true))
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let n = socket.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[2, 4, 9, 8, 7]);
        assert_eq!(control.commits().len(), 1);
    }

    #[tokio::test]
    async fn mode_override_selects_ddp() {
        let (socket, port) = receiver();
        let mut opts = options(false);
        opts.mode = Some(SyncMode::Ddp);

        run(&app_config(port), &MockControl::default(), &opts)
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let n = socket.recv(&mut buf).unwrap();
        assert_eq!(n, 10 + 9);
        assert_eq!(buf[0], 0x41);
    }
}
