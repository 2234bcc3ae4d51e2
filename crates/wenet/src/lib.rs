//! Wenet: high-speed imagery downlink for high-altitude balloons.
//!
//! Telemetry and SSDV image packets are framed into fixed-length radio
//! frames on the payload and reassembled on the ground.
//!
//! # Crate Structure
//!
//! - [`frame`]: checksum, parity and fixed-length framing
//! - [`packets`]: the typed 256-byte packet codec
//! - [`tx`]: transmit scheduler and producer handle (behind `tx` feature)
//! - [`rx`]: receive dispatcher, image reassembly and sinks (behind `rx` feature)

/// Re-export frame types.
pub mod frame {
    pub use wenet_frame::*;
}

/// Re-export packet types.
pub mod packets {
    pub use wenet_packets::*;
}

/// Re-export transmit types (requires `tx` feature).
#[cfg(feature = "tx")]
pub mod tx {
    pub use wenet_tx::*;
}

/// Re-export receive types (requires `rx` feature).
#[cfg(feature = "rx")]
pub mod rx {
    pub use wenet_rx::*;
}
