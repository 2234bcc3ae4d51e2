//! Host housekeeping for the GPS telemetry extension fields.

use std::fs;
use std::path::Path;

use serde::Serialize;
use wenet_packets::Housekeeping;

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";
const CPU_FREQ: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq";
const LOADAVG: &str = "/proc/loadavg";

/// Reported when the CPU temperature cannot be read.
pub const UNKNOWN_TEMPERATURE: f32 = -999.0;

/// Reported when the CPU clock cannot be read.
pub const UNKNOWN_CPU_SPEED: u16 = 9999;

/// Reported when disk usage cannot be read.
pub const UNKNOWN_DISK_PERCENT: f32 = -1.0;

/// Snapshot of the payload computer's health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HostStats {
    pub cpu_temp: f32,
    pub cpu_speed: u16,
    pub load_avg: [f32; 3],
    pub disk_percent: f32,
}

/// Camera state reported alongside host stats. Unknown values are -999.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub lens_position: f32,
    pub sensor_temp: f32,
    pub focus_fom: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            lens_position: UNKNOWN_TEMPERATURE,
            sensor_temp: UNKNOWN_TEMPERATURE,
            focus_fom: UNKNOWN_TEMPERATURE,
        }
    }
}

impl HostStats {
    /// Collect stats, measuring disk usage of the filesystem holding `disk_path`.
    pub fn collect(disk_path: impl AsRef<Path>) -> Self {
        let cpu_temp = fs::read_to_string(THERMAL_ZONE)
            .ok()
            .and_then(|text| parse_millidegrees(&text))
            .unwrap_or(UNKNOWN_TEMPERATURE);
        let cpu_speed = fs::read_to_string(CPU_FREQ)
            .ok()
            .and_then(|text| parse_khz_as_mhz(&text))
            .unwrap_or(UNKNOWN_CPU_SPEED);
        let load_avg = fs::read_to_string(LOADAVG)
            .ok()
            .and_then(|text| parse_loadavg(&text))
            .unwrap_or_default();
        let disk_percent = disk_usage_percent(disk_path.as_ref()).unwrap_or(UNKNOWN_DISK_PERCENT);

        let stats = Self {
            cpu_temp,
            cpu_speed,
            load_avg,
            disk_percent,
        };
        tracing::trace!(?stats, "collected host stats");
        stats
    }

    /// Fill the GPS telemetry housekeeping region.
    pub fn housekeeping(&self, radio_temp: f32, camera: CameraState) -> Housekeeping {
        Housekeeping {
            radio_temp,
            cpu_temp: self.cpu_temp,
            cpu_speed: self.cpu_speed,
            load_avg_1: self.load_avg[0],
            load_avg_5: self.load_avg[1],
            load_avg_15: self.load_avg[2],
            disk_percent: self.disk_percent,
            lens_position: camera.lens_position,
            sensor_temp: camera.sensor_temp,
            focus_fom: camera.focus_fom,
        }
    }
}

fn parse_millidegrees(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().map(|milli| milli / 1000.0)
}

fn parse_khz_as_mhz(text: &str) -> Option<u16> {
    let khz = text.trim().parse::<u32>().ok()?;
    u16::try_from(khz / 1000).ok()
}

fn parse_loadavg(text: &str) -> Option<[f32; 3]> {
    let mut fields = text.split_whitespace().map(str::parse::<f32>);
    Some([
        fields.next()?.ok()?,
        fields.next()?.ok()?,
        fields.next()?.ok()?,
    ])
}

#[cfg(unix)]
fn disk_usage_percent(path: &Path) -> Option<f32> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    // SAFETY: all-zero is a valid bit pattern for the plain-data `statvfs` struct.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };

    // SAFETY: `c_path` is a valid NUL-terminated string and `stat` is a valid
    // writable `statvfs` for the duration of the call.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }

    let fragment = stat.f_frsize as f64;
    let total = stat.f_blocks as f64 * fragment;
    let used = (stat.f_blocks as f64 - stat.f_bfree as f64) * fragment;
    (total > 0.0).then(|| (100.0 * used / total) as f32)
}

#[cfg(not(unix))]
fn disk_usage_percent(_path: &Path) -> Option<f32> {
    None
}
