//! Conversions between unitful values and the units the laser expects on the wire.
//!
//! Wavelengths go in nanometers and powers in milliwatts. Frequencies use the unit of the
//! respective command: kHz for the sweep rate, MHz for the sample clock, GHz for the sweep step,
//! THz for optical frequencies.

use std::time::Duration;

use measurements::{Frequency, Length, Power};

const NANO: f64 = 1e9;
const MILLI: f64 = 1e3;
const KILO: f64 = 1e3;
const MEGA: f64 = 1e6;
const GIGA: f64 = 1e9;
const TERA: f64 = 1e12;

pub(crate) fn to_nanometers(length: Length) -> f64 {
    length.as_meters() * NANO
}

pub(crate) fn from_nanometers(nm: f64) -> Length {
    Length::from_meters(nm / NANO)
}

pub(crate) fn to_milliwatts(power: Power) -> f64 {
    power.as_watts() * MILLI
}

pub(crate) fn from_milliwatts(mw: f64) -> Power {
    Power::from_watts(mw / MILLI)
}

pub(crate) fn to_kilohertz(freq: Frequency) -> f64 {
    freq.as_hertz() / KILO
}

pub(crate) fn from_kilohertz(khz: f64) -> Frequency {
    Frequency::from_hertz(khz * KILO)
}

pub(crate) fn to_megahertz(freq: Frequency) -> f64 {
    freq.as_hertz() / MEGA
}

pub(crate) fn from_megahertz(mhz: f64) -> Frequency {
    Frequency::from_hertz(mhz * MEGA)
}

pub(crate) fn to_gigahertz(freq: Frequency) -> f64 {
    freq.as_hertz() / GIGA
}

pub(crate) fn from_gigahertz(ghz: f64) -> Frequency {
    Frequency::from_hertz(ghz * GIGA)
}

pub(crate) fn to_terahertz(freq: Frequency) -> f64 {
    freq.as_hertz() / TERA
}

pub(crate) fn from_terahertz(thz: f64) -> Frequency {
    Frequency::from_hertz(thz * TERA)
}

/// Whole nanoseconds, as the laser's dwell times and sweep delays have no finer resolution.
pub(crate) fn to_nanoseconds(duration: Duration) -> f64 {
    duration.as_nanos() as f64
}

/// Negative values, which the laser never reports, saturate to zero.
pub(crate) fn from_nanoseconds(ns: f64) -> Duration {
    Duration::from_nanos(ns.max(0.0).round() as u64)
}

pub(crate) fn to_microseconds(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1e3
}

pub(crate) fn from_microseconds(us: f64) -> Duration {
    from_nanoseconds(us * 1e3)
}
