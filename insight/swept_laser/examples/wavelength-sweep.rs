use std::time::Duration;

use measurements::{Frequency, Length, Power};
use tracing_subscriber::EnvFilter;

use insight_swept_laser::{Profile, SweepDirection, SweepEmphasis, SweptLaser, TriggerEdge};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let laser = SweptLaser::open(&SweptLaser::default_config()).expect("Laser must be available.");

    // Sweep from 1530 nm to 1565 nm at 100 kHz with as many points as the laser can do.
    laser
        .set_sweep_wavelength_range(Length::from_meters(1530e-9), Length::from_meters(1565e-9))
        .unwrap();
    laser.set_sweep_direction(SweepDirection::Increasing).unwrap();
    laser.set_sweep_rate(Frequency::from_hertz(100e3)).unwrap();
    laser.set_sweep_points(None).unwrap();
    laser.set_sweep_delay(Duration::from_micros(1)).unwrap();
    laser.set_sweep_power(Power::from_watts(0.002)).unwrap();
    laser.set_sweep_profile(Profile::Flat).unwrap();
    laser.set_sweep_trigger(TriggerEdge::Rising).unwrap();

    println!("Sweep points: {}", laser.get_sweep_points().unwrap());
    println!("Total points: {}", laser.get_sweep_points_total().unwrap());

    // Alternatively, let a preset set up a decreasing sweep with maximum points.
    laser
        .configure_sweep_preset(
            SweepDirection::Decreasing,
            SweepEmphasis::Points,
            "MAX".into(),
            1550.into(),
            1555.into(),
            0.into(),
        )
        .unwrap();
    println!(
        "Preset: {:?}",
        laser
            .get_sweep_preset(SweepDirection::Decreasing, SweepEmphasis::Points)
            .unwrap()
    );

    laser.calibrate_sweep().unwrap();
    laser.start_sweep().unwrap();
    println!("Sweeping, press enter to stop.");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).unwrap();
    laser.abort().unwrap();
}
