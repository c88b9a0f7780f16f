use std::time::Duration;

use measurements::{Length, Power};
use tracing_subscriber::EnvFilter;

use insight_swept_laser::{SweptLaser, Switch};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let laser = SweptLaser::open(&SweptLaser::default_config()).expect("Laser must be available.");

    // Build a new sequence: 0.01 nm steps from 1531 nm to 1531.5 nm, 500 ns each, followed by a
    // single stop at 1550 nm for 1 µs.
    laser.clear_sequence().unwrap();
    laser
        .add_sequence_wavelength_steps(
            Length::from_meters(0.01e-9),
            Duration::from_nanos(500),
            Length::from_meters(1531e-9),
            Length::from_meters(1531.5e-9),
            None,
        )
        .unwrap();
    laser
        .add_sequence_wavelength(Length::from_meters(1550e-9), Duration::from_micros(1), None)
        .unwrap();
    laser.set_sequence_interpolation(Switch::Off).unwrap();
    laser.set_sequence_power(Power::from_watts(0.001)).unwrap();

    println!("Sequence table: {:?}", laser.get_sequence().unwrap());

    // Keep a copy of the table on the laser.
    laser.save_sequence("demo.seq").unwrap();

    laser.calibrate_sequence().unwrap();
    println!("Calibration: {}", laser.get_sequence_calibration().unwrap());
    laser.start_sequence().unwrap();
}
