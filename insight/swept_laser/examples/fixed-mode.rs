use measurements::{Length, Power};
use tracing_subscriber::EnvFilter;

use insight_swept_laser::{Profile, SweptLaser};

fn main() {
    // Show the session's traffic with, e.g., `RUST_LOG=scpirs=debug`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Connect to the laser's telnet service on its default host name and port.
    let laser = SweptLaser::open(&SweptLaser::default_config()).expect("Laser must be available.");
    println!("Instrument name: {}", laser.get_name().unwrap());

    // Configure a constant wavelength of 1550 nm at 0 mW with a flat profile.
    laser
        .set_fixed_wavelength(Length::from_meters(1550e-9))
        .unwrap();
    laser.set_fixed_power(Power::from_watts(0.0)).unwrap();
    laser.set_fixed_profile(Profile::Flat, None).unwrap();

    // Power and profile only take effect after a calibration.
    laser.calibrate_fixed().unwrap();
    println!("Calibration: {}", laser.get_fixed_calibration().unwrap());
    laser.start_fixed().unwrap();

    let wavelength = laser.get_fixed_wavelength().unwrap();
    println!("Emitting at {:.3} nm", wavelength.as_meters() * 1e9);

    // Anything that went wrong on the laser's side ends up in its error queue.
    for err in laser.get_errors().unwrap() {
        println!("Error {}: {}", err.code, err.message);
    }
}
