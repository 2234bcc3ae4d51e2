use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Default GUI / image notification port.
pub const DEFAULT_IMAGE_PORT: u16 = 7890;

/// Default telemetry broadcast port.
pub const DEFAULT_TELEMETRY_PORT: u16 = 55672;

/// Default image output directory.
pub const DEFAULT_RX_IMAGES: &str = "./rx_images";

/// Receive-side configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxConfig {
    /// Directory for completed images, previews and telemetry logs.
    pub rx_images: PathBuf,
    /// Emit a preview every this many chunks. Zero disables previews.
    pub partial_update: usize,
    /// UDP notifications. `None` disables them.
    pub udp: Option<UdpConfig>,
    /// Append decoded telemetry to per-kind JSON-lines logs.
    pub telemetry_log: bool,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            rx_images: PathBuf::from(DEFAULT_RX_IMAGES),
            partial_update: 0,
            udp: Some(UdpConfig::default()),
            telemetry_log: true,
        }
    }
}

impl RxConfig {
    pub fn with_rx_images(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rx_images = dir.into();
        self
    }

    pub fn with_partial_update(mut self, every: usize) -> Self {
        self.partial_update = every;
        self
    }

    pub fn with_udp(mut self, udp: Option<UdpConfig>) -> Self {
        self.udp = udp;
        self
    }

    pub fn with_telemetry_log(mut self, enabled: bool) -> Self {
        self.telemetry_log = enabled;
        self
    }
}

/// Where UDP notifications go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpConfig {
    pub telemetry_addr: Ipv4Addr,
    pub telemetry_port: u16,
    pub gui_addr: Ipv4Addr,
    pub image_port: u16,
    /// Also forward telemetry to the image port, for a GUI with no broadcast listener.
    pub headless: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            telemetry_addr: Ipv4Addr::BROADCAST,
            telemetry_port: DEFAULT_TELEMETRY_PORT,
            gui_addr: Ipv4Addr::LOCALHOST,
            image_port: DEFAULT_IMAGE_PORT,
            headless: false,
        }
    }
}
