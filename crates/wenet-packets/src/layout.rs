//! Shared fixed-offset parsing helpers and field groups.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;

use crate::error::{DecodeError, Result};
use crate::gps_time::{DynamicModel, FixState, GpsTime};
use crate::kind::PacketKind;

/// Check the tag and clip `packet` to the kind's declared length.
///
/// Upstream padding makes over-length input the normal case; anything shorter
/// than the layout is rejected.
pub(crate) fn fixed(kind: PacketKind, packet: &[u8], length: usize) -> Result<&[u8]> {
    let tag = *packet.first().ok_or(DecodeError::Empty)?;
    if tag != kind.tag() {
        return Err(DecodeError::UnexpectedTag {
            expected: kind,
            actual: tag,
        });
    }
    if packet.len() < length {
        return Err(DecodeError::InvalidLength {
            kind,
            expected: length,
            actual: packet.len(),
        });
    }
    Ok(&packet[..length])
}

pub(crate) fn get_gps_time(buf: &mut &[u8]) -> GpsTime {
    GpsTime {
        week: buf.get_u16(),
        itow_ms: buf.get_u32(),
        leap_seconds: buf.get_u8(),
    }
}

pub(crate) fn put_gps_time(dst: &mut BytesMut, time: &GpsTime) {
    dst.put_u16(time.week);
    dst.put_u32(time.itow_ms);
    dst.put_u8(time.leap_seconds);
}

/// Position, velocity and receiver state from a GPS solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Navigation {
    pub latitude: f32,
    pub longitude: f32,
    /// Metres.
    pub altitude: f32,
    /// km/h.
    pub ground_speed: f32,
    /// Degrees.
    pub heading: f32,
    /// m/s.
    pub ascent_rate: f32,
    #[serde(rename = "numSV")]
    pub num_sv: u8,
    #[serde(rename = "gpsFix")]
    pub fix: FixState,
    pub dynamic_model: DynamicModel,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            ground_speed: 0.0,
            heading: 0.0,
            ascent_rate: 0.0,
            num_sv: 0,
            fix: FixState::NoFix,
            dynamic_model: DynamicModel::Airborne1G,
        }
    }
}

impl Navigation {
    /// Wire size of the field group.
    pub const LENGTH: usize = 6 * 4 + 3;

    pub(crate) fn get(buf: &mut &[u8]) -> Self {
        Self {
            latitude: buf.get_f32(),
            longitude: buf.get_f32(),
            altitude: buf.get_f32(),
            ground_speed: buf.get_f32(),
            heading: buf.get_f32(),
            ascent_rate: buf.get_f32(),
            num_sv: buf.get_u8(),
            fix: FixState::from_code(buf.get_u8()),
            dynamic_model: DynamicModel::from_code(buf.get_u8()),
        }
    }

    pub(crate) fn put(&self, dst: &mut BytesMut) {
        dst.put_f32(self.latitude);
        dst.put_f32(self.longitude);
        dst.put_f32(self.altitude);
        dst.put_f32(self.ground_speed);
        dst.put_f32(self.heading);
        dst.put_f32(self.ascent_rate);
        dst.put_u8(self.num_sv);
        dst.put_u8(self.fix.code());
        dst.put_u8(self.dynamic_model.code());
    }
}

/// IMU status, calibration and attitude.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Attitude {
    pub sys_status: u8,
    pub sys_error: u8,
    pub sys_cal: u8,
    pub gyro_cal: u8,
    pub accel_cal: u8,
    pub magnet_cal: u8,
    /// Sensor temperature, °C.
    pub temp: i8,
    pub euler_heading: f32,
    pub euler_roll: f32,
    pub euler_pitch: f32,
    pub quaternion_x: f32,
    pub quaternion_y: f32,
    pub quaternion_z: f32,
    pub quaternion_w: f32,
}

impl Attitude {
    /// Wire size of the field group.
    pub const LENGTH: usize = 7 + 7 * 4;

    pub(crate) fn get(buf: &mut &[u8]) -> Self {
        Self {
            sys_status: buf.get_u8(),
            sys_error: buf.get_u8(),
            sys_cal: buf.get_u8(),
            gyro_cal: buf.get_u8(),
            accel_cal: buf.get_u8(),
            magnet_cal: buf.get_u8(),
            temp: buf.get_i8(),
            euler_heading: buf.get_f32(),
            euler_roll: buf.get_f32(),
            euler_pitch: buf.get_f32(),
            quaternion_x: buf.get_f32(),
            quaternion_y: buf.get_f32(),
            quaternion_z: buf.get_f32(),
            quaternion_w: buf.get_f32(),
        }
    }

    pub(crate) fn put(&self, dst: &mut BytesMut) {
        dst.put_u8(self.sys_status);
        dst.put_u8(self.sys_error);
        dst.put_u8(self.sys_cal);
        dst.put_u8(self.gyro_cal);
        dst.put_u8(self.accel_cal);
        dst.put_u8(self.magnet_cal);
        dst.put_i8(self.temp);
        dst.put_f32(self.euler_heading);
        dst.put_f32(self.euler_roll);
        dst.put_f32(self.euler_pitch);
        dst.put_f32(self.quaternion_x);
        dst.put_f32(self.quaternion_y);
        dst.put_f32(self.quaternion_z);
        dst.put_f32(self.quaternion_w);
    }
}

/// ASCII check shared by the text-bearing layouts.
pub(crate) fn ascii(kind: PacketKind, bytes: &[u8]) -> Result<String> {
    if !bytes.is_ascii() {
        return Err(DecodeError::InvalidText { kind });
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
