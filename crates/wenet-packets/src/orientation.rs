use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::Result;
use crate::gps_time::GpsTime;
use crate::kind::{PacketKind, ORIENTATION_TELEMETRY};
use crate::layout::{fixed, get_gps_time, put_gps_time, Attitude};

/// 0x02 IMU orientation telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OrientationTelemetry {
    #[serde(flatten)]
    pub time: GpsTime,
    #[serde(flatten)]
    pub attitude: Attitude,
}

impl OrientationTelemetry {
    pub const LENGTH: usize = 43;

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut buf = fixed(PacketKind::OrientationTelemetry, packet, Self::LENGTH)?;
        buf.advance(1);

        Ok(Self {
            time: get_gps_time(&mut buf),
            attitude: Attitude::get(&mut buf),
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(Self::LENGTH);
        dst.put_u8(ORIENTATION_TELEMETRY);
        put_gps_time(&mut dst, &self.time);
        self.attitude.put(&mut dst);
        dst.freeze()
    }
}

impl fmt::Display for OrientationTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.attitude;
        write!(
            f,
            "Orientation: {} Status: {} Error: {} Cal: {} {} {} {} Temp: {} \
             Euler: ({:.1},{:.1},{:.1}) Quaternion: ({:.1}, {:.1}, {:.1}, {:.1})",
            self.time.to_utc().format("%Y-%m-%dT%H:%M:%S%.f"),
            a.sys_status,
            a.sys_error,
            a.sys_cal,
            a.gyro_cal,
            a.accel_cal,
            a.magnet_cal,
            a.temp,
            a.euler_heading,
            a.euler_roll,
            a.euler_pitch,
            a.quaternion_x,
            a.quaternion_y,
            a.quaternion_z,
            a.quaternion_w,
        )
    }
}
