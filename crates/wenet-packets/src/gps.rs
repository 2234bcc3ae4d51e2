use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::Result;
use crate::gps_time::GpsTime;
use crate::kind::{PacketKind, GPS_TELEMETRY};
use crate::layout::{fixed, get_gps_time, put_gps_time, Navigation};

/// `cpu_speed` value produced by a 0x55-filled housekeeping region.
pub const LEGACY_CPU_SPEED: u16 = 0x5555;

/// Sentinel for temperature-like readings that are unavailable.
pub const UNAVAILABLE: f32 = -999.0;

/// Payload computer and camera housekeeping carried after the GPS fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Housekeeping {
    pub radio_temp: f32,
    pub cpu_temp: f32,
    /// MHz.
    pub cpu_speed: u16,
    pub load_avg_1: f32,
    pub load_avg_5: f32,
    pub load_avg_15: f32,
    pub disk_percent: f32,
    pub lens_position: f32,
    pub sensor_temp: f32,
    pub focus_fom: f32,
}

impl Housekeeping {
    /// Values reported when a sender predates the housekeeping region.
    pub const LEGACY: Self = Self {
        radio_temp: UNAVAILABLE,
        cpu_temp: UNAVAILABLE,
        cpu_speed: 0,
        load_avg_1: 0.0,
        load_avg_5: 0.0,
        load_avg_15: 0.0,
        disk_percent: -1.0,
        lens_position: UNAVAILABLE,
        sensor_temp: UNAVAILABLE,
        focus_fom: UNAVAILABLE,
    };

    fn get(buf: &mut &[u8]) -> Self {
        Self {
            radio_temp: buf.get_f32(),
            cpu_temp: buf.get_f32(),
            cpu_speed: buf.get_u16(),
            load_avg_1: buf.get_f32(),
            load_avg_5: buf.get_f32(),
            load_avg_15: buf.get_f32(),
            disk_percent: buf.get_f32(),
            lens_position: buf.get_f32(),
            sensor_temp: buf.get_f32(),
            focus_fom: buf.get_f32(),
        }
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_f32(self.radio_temp);
        dst.put_f32(self.cpu_temp);
        dst.put_u16(self.cpu_speed);
        dst.put_f32(self.load_avg_1);
        dst.put_f32(self.load_avg_5);
        dst.put_f32(self.load_avg_15);
        dst.put_f32(self.disk_percent);
        dst.put_f32(self.lens_position);
        dst.put_f32(self.sensor_temp);
        dst.put_f32(self.focus_fom);
    }
}

impl Default for Housekeeping {
    fn default() -> Self {
        Self::LEGACY
    }
}

/// 0x01 GPS telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GpsTelemetry {
    #[serde(flatten)]
    pub time: GpsTime,
    #[serde(flatten)]
    pub navigation: Navigation,
    #[serde(flatten)]
    pub housekeeping: Housekeeping,
}

impl GpsTelemetry {
    pub const LENGTH: usize = 73;

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut buf = fixed(PacketKind::GpsTelemetry, packet, Self::LENGTH)?;
        buf.advance(1);

        let time = get_gps_time(&mut buf);
        let navigation = Navigation::get(&mut buf);
        let mut housekeeping = Housekeeping::get(&mut buf);

        if housekeeping.cpu_speed == LEGACY_CPU_SPEED {
            tracing::trace!("gps telemetry without housekeeping region");
            housekeeping = Housekeeping::LEGACY;
        }

        Ok(Self {
            time,
            navigation,
            housekeeping,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(Self::LENGTH);
        dst.put_u8(GPS_TELEMETRY);
        put_gps_time(&mut dst, &self.time);
        self.navigation.put(&mut dst);
        self.housekeeping.put(&mut dst);
        dst.freeze()
    }
}

impl fmt::Display for GpsTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nav = &self.navigation;
        let hk = &self.housekeeping;
        write!(
            f,
            "GPS: {} Lat/Lon: {:.5},{:.5} Alt: {}m, Speed: H {}kph V {:.1}m/s, Heading: {} deg, \
             Fix: {}, SVs: {}, DynModel: {}, Radio Temp: {:.1}, CPU Temp: {:.1}, CPU Speed: {}, \
             Load Avg: {:.2}, {:.2}, {:.2}, Disk Usage: {:.1}%, Lens Pos: {:.4}, Sensor Temp: {:.1}, \
             FocusFoM: {}",
            self.time.to_utc().format("%Y-%m-%dT%H:%M:%S%.f"),
            nav.latitude,
            nav.longitude,
            nav.altitude as i32,
            nav.ground_speed as i32,
            nav.ascent_rate,
            nav.heading as i32,
            nav.fix,
            nav.num_sv,
            nav.dynamic_model,
            hk.radio_temp,
            hk.cpu_temp,
            hk.cpu_speed,
            hk.load_avg_1,
            hk.load_avg_5,
            hk.load_avg_15,
            hk.disk_percent,
            hk.lens_position,
            hk.sensor_temp,
            hk.focus_fom as i32,
        )
    }
}
