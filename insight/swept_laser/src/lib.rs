//! A rust driver for the Insight tunable swept laser.
//!
//! The laser runs a telnet service that accepts SCPI commands, one per line, and ends every reply
//! with the prompt `atlas ready>`. This driver builds on [`scpirs`]: the whole command vocabulary
//! lives in the static [`COMMANDS`] table, and [`SweptLaser`] wraps a [`Session`] with typed
//! methods for the fixed wavelength, sequence, and sweep workflows.
//!
//! Every method validates its arguments before anything is sent. Firmware errors come back as
//! [`InstrumentError::Instrument`] and leave the connection usable. Timeouts and broken
//! connections fault the session, call [`SweptLaser::reconnect`] to continue.
//!
//! Note that settings for power and profile only take effect after the calibration of the
//! respective mode, e.g., [`SweptLaser::calibrate_fixed`].
//!
//! # Example
//!
//! ```no_run
//! use measurements::{Length, Power};
//! use insight_swept_laser::{Profile, SweptLaser};
//!
//! let laser = SweptLaser::open(&SweptLaser::default_config()).unwrap();
//! println!("Connected to {}", laser.get_name().unwrap());
//!
//! laser.set_fixed_wavelength(Length::from_meters(1550e-9)).unwrap();
//! laser.set_fixed_power(Power::from_watts(0.0)).unwrap();
//! laser.set_fixed_profile(Profile::Flat, None).unwrap();
//! laser.calibrate_fixed().unwrap();
//! laser.start_fixed().unwrap();
//! ```

#![warn(missing_docs)]

mod commands;
mod modes;
mod units;

pub use commands::{COMMANDS, registry};
pub use modes::{ControlMode, Profile, SweepDirection, SweepEmphasis, Switch, TriggerEdge};

use std::{sync::Arc, time::Duration};

use measurements::{Frequency, Length, Power};
use scpirs::{
    Arg, CommandRegistry, ConnectionState, Connector, InstrumentError, QueuedError, Response,
    Session, SessionConfig, TcpIpConnector, Value,
};

use units::*;

/// Default host name of the laser on the network.
pub const DEFAULT_HOST: &str = "insight-laser";
/// The ready prompt that ends every reply.
pub const PROMPT: &str = "atlas ready>";
/// Line terminator the laser expects after each command.
pub const TERMINATOR: &str = "\n\r";

/// A rust driver for the Insight swept laser.
///
/// Clones share the same session, so a laser can be handed to several threads. Commands are
/// never interleaved.
///
/// # Example
///
/// ```no_run
/// use insight_swept_laser::SweptLaser;
///
/// let config = SweptLaser::default_config().with_host("192.168.1.20");
/// let laser = SweptLaser::open(&config).unwrap();
/// for err in laser.get_errors().unwrap() {
///     println!("{}: {}", err.code, err.message);
/// }
/// ```
pub struct SweptLaser<C: Connector> {
    session: Session<C>,
    registry: Arc<CommandRegistry>,
}

impl<C: Connector> Clone for SweptLaser<C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<C: Connector> std::fmt::Debug for SweptLaser<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweptLaser")
            .field("session", &self.session)
            .finish()
    }
}

impl SweptLaser<TcpIpConnector> {
    /// The session configuration for the laser: telnet on port 23, its prompt and terminator.
    pub fn default_config() -> SessionConfig {
        SessionConfig::default()
            .with_host(DEFAULT_HOST)
            .with_port(23)
            .with_prompt(PROMPT)
            .with_terminator(TERMINATOR)
    }

    /// Connect to the laser over TCP/IP.
    ///
    /// # Arguments
    /// * `config` - Where and how to reach the laser, usually derived from
    ///   [`SweptLaser::default_config`].
    pub fn open(config: &SessionConfig) -> Result<Self, InstrumentError> {
        Self::try_new(Session::open(config)?)
    }
}

impl<C: Connector> SweptLaser<C> {
    /// Create a new laser driver on top of the given session.
    ///
    /// The session can be connected or not, see [`SweptLaser::connect`].
    pub fn try_new(session: Session<C>) -> Result<Self, InstrumentError> {
        Ok(Self {
            session,
            registry: Arc::new(registry()?),
        })
    }

    /// The underlying session.
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// The registry of all commands the laser understands.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The state of the connection.
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// Open the connection, if it is not already open.
    pub fn connect(&self) -> Result<(), InstrumentError> {
        self.session.connect()
    }

    /// Open a fresh connection, required after a timeout or a lost connection.
    pub fn reconnect(&self) -> Result<(), InstrumentError> {
        self.session.reconnect()
    }

    /// Close the connection.
    pub fn disconnect(&self) {
        self.session.disconnect()
    }

    /// Execute any command of the table by name.
    ///
    /// This is the escape hatch for commands without a typed method.
    ///
    /// # Arguments
    /// * `name` - Name of the command, see [`COMMANDS`].
    /// * `args` - Arguments, validated against the command's parameters.
    pub fn execute(&self, name: &str, args: &[Arg]) -> Result<Response, InstrumentError> {
        self.session.execute_named(&self.registry, name, args)
    }

    // IEEE 488.2 common commands

    /// Get the identification string of the laser.
    pub fn get_name(&self) -> Result<String, InstrumentError> {
        self.text("idn_q")
    }

    /// Clear the status and results queue.
    pub fn clear_status(&self) -> Result<(), InstrumentError> {
        self.act("cls", &[])
    }

    /// Reset the laser to the values of its user configuration and factory calibration files.
    pub fn reset(&self) -> Result<(), InstrumentError> {
        self.act("rst", &[])
    }

    /// Enable or disable the extended status report.
    pub fn set_extended_status(&self, state: Switch) -> Result<(), InstrumentError> {
        self.act("ese", &[state.as_str().into()])
    }

    /// Is the extended status report enabled?
    pub fn get_extended_status_enabled(&self) -> Result<Switch, InstrumentError> {
        Switch::from_cmd_str(&self.token("ese_q")?)
    }

    /// Get the extended status report.
    pub fn get_extended_status(&self) -> Result<i64, InstrumentError> {
        self.integer("esr_q")
    }

    /// Get the status byte.
    ///
    /// Bit 0: emitting, bit 1: status LED on, bit 2: busy, bit 3: LED 2 on, bit 4: optical switch
    /// to user output, bit 5: laser on.
    pub fn get_status_byte(&self) -> Result<u8, InstrumentError> {
        let stb = self.integer("stb_q")?;
        u8::try_from(stb)
            .map_err(|_| protocol("stb_q", &stb.to_string(), "status byte out of range"))
    }

    /// Run the self test and return its result.
    pub fn self_test(&self) -> Result<String, InstrumentError> {
        self.text("tst_q")
    }

    /// Is the last operation complete?
    pub fn is_operation_complete(&self) -> Result<bool, InstrumentError> {
        Ok(self.integer("opc_q")? == 1)
    }

    /// Wait until pending operations are done. Returns what the laser reports, e.g., `Idle`.
    pub fn wait(&self) -> Result<String, InstrumentError> {
        match self.execute("wai", &[])? {
            Response::Acknowledged(text) => Ok(text),
            Response::Value(value) => Ok(format!("{value:?}")),
        }
    }

    // System

    /// Set whether the laser listens to hardware triggers or to software commands.
    pub fn set_control_mode(&self, mode: ControlMode) -> Result<(), InstrumentError> {
        self.act("syst_cont", &[mode.as_str().into()])
    }

    /// Read and remove all entries of the error queue.
    pub fn get_errors(&self) -> Result<Vec<QueuedError>, InstrumentError> {
        match self.value("syst_err_all_q")? {
            Value::Errors(errors) => Ok(errors),
            other => Err(unexpected("syst_err_all_q", &other)),
        }
    }

    /// Read and remove the next entry of the error queue. Returns `None` if the queue is empty.
    pub fn get_next_error(&self) -> Result<Option<QueuedError>, InstrumentError> {
        match self.value("syst_err_next_q")? {
            Value::Errors(errors) => Ok(errors.into_iter().next().filter(|err| err.code != 0)),
            other => Err(unexpected("syst_err_next_q", &other)),
        }
    }

    /// Stop whatever the laser is doing and put it into standby with no light output.
    pub fn abort(&self) -> Result<(), InstrumentError> {
        self.act("abor", &[])
    }

    // Synchronization and trigger delays

    /// Produce a power pulse at constant wavelength to synchronize the acquisition with the sweep.
    ///
    /// # Arguments
    /// * `amplitude` - Power of the pulse.
    /// * `start_delay_ns` - Start of the pulse after the start sweep trigger, in ns.
    /// * `pulse_width_ns` - Width of the pulse, in ns.
    /// * `wavelength` - Constant wavelength during the pulse.
    pub fn set_power_sync(
        &self,
        amplitude: Power,
        start_delay_ns: f64,
        pulse_width_ns: f64,
        wavelength: Length,
    ) -> Result<(), InstrumentError> {
        self.act(
            "sour_sync_pow",
            &[
                to_milliwatts(amplitude).into(),
                start_delay_ns.into(),
                pulse_width_ns.into(),
                to_nanometers(wavelength).into(),
            ],
        )
    }

    /// Get the parameters of the power synchronization pulse, as reported by the laser.
    pub fn get_power_sync(&self) -> Result<Vec<f64>, InstrumentError> {
        self.floats("sour_sync_pow_q")
    }

    /// Set the delay of the data valid pulses in ns. The resolution is 0.15 ns.
    ///
    /// Trigger delays have sub-nanosecond resolution and are therefore given as plain
    /// nanoseconds rather than [`Duration`]s.
    pub fn set_data_valid_delay(&self, delay_ns: f64) -> Result<(), InstrumentError> {
        self.act("sour_corr_dvd", &[delay_ns.into()])
    }

    /// Get the user part of the data valid delay in ns.
    pub fn get_data_valid_delay(&self) -> Result<f64, InstrumentError> {
        self.float("sour_corr_dvd_q")
    }

    /// Get the total data valid delay in ns, user plus factory part.
    pub fn get_data_valid_delay_total(&self) -> Result<f64, InstrumentError> {
        self.float("sour_corr_dvd_tot_q")
    }

    /// Set the delay of the sample clock in ns. The resolution is 0.178 ns.
    pub fn set_sample_clock_delay(&self, delay_ns: f64) -> Result<(), InstrumentError> {
        self.act("sour_corr_scd", &[delay_ns.into()])
    }

    /// Get the delay of the sample clock in ns.
    pub fn get_sample_clock_delay(&self) -> Result<f64, InstrumentError> {
        self.float("sour_corr_scd_q")
    }

    /// Set the delay of the sweep start trigger in ns. The resolution is 0.15 ns.
    pub fn set_sweep_start_delay(&self, delay_ns: f64) -> Result<(), InstrumentError> {
        self.act("sour_corr_ssd", &[delay_ns.into()])
    }

    /// Get the user part of the sweep start delay in ns.
    pub fn get_sweep_start_delay(&self) -> Result<f64, InstrumentError> {
        self.float("sour_corr_ssd_q")
    }

    /// Get the total sweep start delay in ns, user plus factory part.
    pub fn get_sweep_start_delay_total(&self) -> Result<f64, InstrumentError> {
        self.float("sour_corr_ssd_tot_q")
    }

    // Sweep mode

    /// Set the wavelength range of a sweep.
    pub fn set_sweep_wavelength_range(
        &self,
        min: Length,
        max: Length,
    ) -> Result<(), InstrumentError> {
        self.act("conf_swe_wmin", &[to_nanometers(min).into()])?;
        self.act("conf_swe_wmax", &[to_nanometers(max).into()])
    }

    /// Get the wavelength range of a sweep as `(min, max)`.
    pub fn get_sweep_wavelength_range(&self) -> Result<(Length, Length), InstrumentError> {
        let min = self.float("conf_swe_wmin_q")?;
        let max = self.float("conf_swe_wmax_q")?;
        Ok((from_nanometers(min), from_nanometers(max)))
    }

    /// Set the optical frequency range of a sweep.
    pub fn set_sweep_frequency_range(
        &self,
        min: Frequency,
        max: Frequency,
    ) -> Result<(), InstrumentError> {
        self.act("conf_swe_fmin", &[to_terahertz(min).into()])?;
        self.act("conf_swe_fmax", &[to_terahertz(max).into()])
    }

    /// Get the optical frequency range of a sweep as `(min, max)`.
    pub fn get_sweep_frequency_range(&self) -> Result<(Frequency, Frequency), InstrumentError> {
        let min = self.float("conf_swe_fmin_q")?;
        let max = self.float("conf_swe_fmax_q")?;
        Ok((from_terahertz(min), from_terahertz(max)))
    }

    /// Set the direction of the sweep.
    pub fn set_sweep_direction(&self, direction: SweepDirection) -> Result<(), InstrumentError> {
        self.act("conf_swe_dir", &[direction.as_str().into()])
    }

    /// Get the direction of the sweep.
    pub fn get_sweep_direction(&self) -> Result<SweepDirection, InstrumentError> {
        SweepDirection::from_cmd_str(&self.token("conf_swe_dir_q")?)
    }

    /// Set the number of measurement points in a sweep, 1 to 131071.
    ///
    /// Pass `None` for the largest number of points, i.e., a non-decimated sweep.
    pub fn set_sweep_points(&self, points: Option<u32>) -> Result<(), InstrumentError> {
        let arg = match points {
            Some(points) => Arg::from(points),
            None => Arg::from("MAXimum"),
        };
        self.act("conf_swe_poin", &[arg])
    }

    /// Get the number of measurement points in a sweep.
    pub fn get_sweep_points(&self) -> Result<u32, InstrumentError> {
        self.count("conf_swe_poin_q")
    }

    /// Set the number of points by which the sweep must be divisible, 4 to 256 in steps of 4.
    pub fn set_sweep_point_increment(&self, multiple: u32) -> Result<(), InstrumentError> {
        self.act("conf_swe_poin_incr", &[multiple.into()])
    }

    /// Get the number of points by which the sweep is divisible.
    pub fn get_sweep_point_increment(&self) -> Result<u32, InstrumentError> {
        self.count("conf_swe_poin_incr_q")
    }

    /// Get the total number of points in a sweep, valid plus invalid ones.
    pub fn get_sweep_points_total(&self) -> Result<u32, InstrumentError> {
        self.count("conf_swe_poin_tot_q")
    }

    /// Get the data invalid vector: the sample clocks at which the optical frequency has not
    /// stepped.
    pub fn get_data_invalid_vector(&self) -> Result<Vec<f64>, InstrumentError> {
        self.floats("conf_swe_div_q")
    }

    /// Set the sweep repetition rate, 1 to 10000 kHz.
    pub fn set_sweep_rate(&self, rate: Frequency) -> Result<(), InstrumentError> {
        self.act("conf_swe_rat", &[to_kilohertz(rate).into()])
    }

    /// Get the sweep repetition rate.
    pub fn get_sweep_rate(&self) -> Result<Frequency, InstrumentError> {
        Ok(from_kilohertz(self.float("conf_swe_rat_q")?))
    }

    /// Set the delay between sweeps during which the output is attenuated, up to 655.35 µs.
    pub fn set_sweep_delay(&self, delay: Duration) -> Result<(), InstrumentError> {
        self.act("conf_swe_del", &[to_nanoseconds(delay).into()])
    }

    /// Get the delay between sweeps.
    pub fn get_sweep_delay(&self) -> Result<Duration, InstrumentError> {
        Ok(from_nanoseconds(self.float("conf_swe_del_q")?))
    }

    /// Set the average power of the sweep.
    pub fn set_sweep_power(&self, power: Power) -> Result<(), InstrumentError> {
        self.act("conf_swe_pow", &[to_milliwatts(power).into()])
    }

    /// Get the average power of the sweep.
    pub fn get_sweep_power(&self) -> Result<Power, InstrumentError> {
        Ok(from_milliwatts(self.float("conf_swe_pow_q")?))
    }

    /// Set the power profile of the sweep.
    pub fn set_sweep_profile(&self, profile: Profile) -> Result<(), InstrumentError> {
        self.act("conf_swe_prof", &[profile.as_str().into()])
    }

    /// Get the power profile of the sweep.
    pub fn get_sweep_profile(&self) -> Result<Profile, InstrumentError> {
        Profile::from_cmd_str(&self.token("conf_swe_prof_q")?)
    }

    /// Set the edge of the start sweep trigger.
    pub fn set_sweep_trigger(&self, edge: TriggerEdge) -> Result<(), InstrumentError> {
        self.act("conf_swe_trig", &[edge.as_str().into()])
    }

    /// Get the edge of the start sweep trigger.
    pub fn get_sweep_trigger(&self) -> Result<TriggerEdge, InstrumentError> {
        TriggerEdge::from_cmd_str(&self.token("conf_swe_trig_q")?)
    }

    /// Set the optical frequency step between sweep points, 0.05 to 10000 GHz.
    pub fn set_sweep_step(&self, step: Frequency) -> Result<(), InstrumentError> {
        self.act("conf_swe_step", &[to_gigahertz(step).into()])
    }

    /// Get the optical frequency step between sweep points.
    pub fn get_sweep_step(&self) -> Result<Frequency, InstrumentError> {
        Ok(from_gigahertz(self.float("conf_swe_step_q")?))
    }

    /// Set the rate of the external sample clock, 1 to 400 MHz.
    ///
    /// Rates below 112 MHz may result in undefined behavior of the laser.
    pub fn set_sample_clock_rate(&self, rate: Frequency) -> Result<(), InstrumentError> {
        self.act("conf_scl_rat", &[to_megahertz(rate).into()])
    }

    /// Get the rate of the external sample clock.
    pub fn get_sample_clock_rate(&self) -> Result<Frequency, InstrumentError> {
        Ok(from_megahertz(self.float("conf_scl_rat_q")?))
    }

    /// Configure a whole sweep with a preset.
    ///
    /// The leading `value` is interpreted according to `emphasis`: a number of points, a rate in
    /// kHz, or a step in GHz. Any argument can be replaced by `"MIN"` or `"MAX"`. A sweep
    /// calibration is required afterwards.
    ///
    /// # Arguments
    /// * `direction` - Direction of the sweep.
    /// * `emphasis` - What the preset optimizes for.
    /// * `value` - Leading value for the emphasis.
    /// * `min_wavelength` - Lower end of the range in nm.
    /// * `max_wavelength` - Upper end of the range in nm.
    /// * `delay` - Inter-sweep delay in ns.
    pub fn configure_sweep_preset(
        &self,
        direction: SweepDirection,
        emphasis: SweepEmphasis,
        value: Arg,
        min_wavelength: Arg,
        max_wavelength: Arg,
        delay: Arg,
    ) -> Result<(), InstrumentError> {
        let name = preset_command(direction, emphasis, false);
        self.act(name, &[value, min_wavelength, max_wavelength, delay])
    }

    /// Get the current preset configuration as reported by the laser: leading value, minimum and
    /// maximum wavelength, and delay.
    pub fn get_sweep_preset(
        &self,
        direction: SweepDirection,
        emphasis: SweepEmphasis,
    ) -> Result<Vec<f64>, InstrumentError> {
        self.floats(preset_command(direction, emphasis, true))
    }

    /// Calibrate the laser for the configured sweep.
    pub fn calibrate_sweep(&self) -> Result<(), InstrumentError> {
        self.act("cal_swe", &[])
    }

    /// Start sweeping.
    pub fn start_sweep(&self) -> Result<(), InstrumentError> {
        self.act("init_swe", &[])
    }

    // Sequence mode

    /// Get the sequence table: wavelengths or frequencies and the time spent at each of them.
    pub fn get_sequence(&self) -> Result<Vec<f64>, InstrumentError> {
        self.floats("conf_seq_q")
    }

    /// Remove all entries of the sequence table.
    pub fn clear_sequence(&self) -> Result<(), InstrumentError> {
        self.act("conf_seq_clea", &[])
    }

    /// Add evenly spaced wavelengths to the sequence table.
    ///
    /// # Arguments
    /// * `step` - Spacing of the wavelengths.
    /// * `dwell` - Time spent at each wavelength.
    /// * `start` - First wavelength.
    /// * `stop` - Last wavelength.
    /// * `position` - Row at which to insert, `None` or `Some(-1)` appends.
    pub fn add_sequence_wavelength_steps(
        &self,
        step: Length,
        dwell: Duration,
        start: Length,
        stop: Length,
        position: Option<i64>,
    ) -> Result<(), InstrumentError> {
        let mut args = vec![
            to_nanometers(step).into(),
            to_nanoseconds(dwell).into(),
            to_nanometers(start).into(),
            to_nanometers(stop).into(),
        ];
        args.extend(position.map(Arg::from));
        self.act("conf_seq_add_wst", &args)
    }

    /// Add evenly spaced optical frequencies to the sequence table. Frequencies are sent in THz.
    pub fn add_sequence_frequency_steps(
        &self,
        step: Frequency,
        dwell: Duration,
        start: Frequency,
        stop: Frequency,
        position: Option<i64>,
    ) -> Result<(), InstrumentError> {
        let mut args = vec![
            to_terahertz(step).into(),
            to_nanoseconds(dwell).into(),
            to_terahertz(start).into(),
            to_terahertz(stop).into(),
        ];
        args.extend(position.map(Arg::from));
        self.act("conf_seq_add_fst", &args)
    }

    /// Add a single wavelength to the sequence table.
    pub fn add_sequence_wavelength(
        &self,
        wavelength: Length,
        dwell: Duration,
        position: Option<i64>,
    ) -> Result<(), InstrumentError> {
        let mut args = vec![to_nanometers(wavelength).into(), to_nanoseconds(dwell).into()];
        args.extend(position.map(Arg::from));
        self.act("conf_seq_add_wav", &args)
    }

    /// Remove an entry of the sequence table by its zero based row, `-1` removes the last one.
    pub fn remove_sequence_entry(&self, id: i64) -> Result<(), InstrumentError> {
        self.act("conf_seq_rem", &[id.into()])
    }

    /// Enable or disable wavelength interpolation in sequence mode.
    pub fn set_sequence_interpolation(&self, state: Switch) -> Result<(), InstrumentError> {
        self.act("conf_seq_int", &[state.as_str().into()])
    }

    /// Load the sequence table from a file on the laser.
    pub fn load_sequence(&self, filename: &str) -> Result<(), InstrumentError> {
        self.act("conf_seq_load", &[filename.into()])
    }

    /// Save the sequence table to a file on the laser.
    pub fn save_sequence(&self, filename: &str) -> Result<(), InstrumentError> {
        self.act("conf_seq_sav", &[filename.into()])
    }

    /// Set the output power in sequence mode.
    pub fn set_sequence_power(&self, power: Power) -> Result<(), InstrumentError> {
        self.act("conf_seq_pow", &[to_milliwatts(power).into()])
    }

    /// Get the output power in sequence mode.
    pub fn get_sequence_power(&self) -> Result<Power, InstrumentError> {
        Ok(from_milliwatts(self.float("conf_seq_pow_q")?))
    }

    /// Calibrate the laser for the sequence table.
    pub fn calibrate_sequence(&self) -> Result<(), InstrumentError> {
        self.act("cal_seq", &[])
    }

    /// Get the result of the last sequence calibration.
    pub fn get_sequence_calibration(&self) -> Result<String, InstrumentError> {
        self.text("cal_seq_q")
    }

    /// Start sequence mode.
    pub fn start_sequence(&self) -> Result<(), InstrumentError> {
        self.act("init_seq", &[])
    }

    // Fixed wavelength mode

    /// Set the fixed wavelength.
    pub fn set_fixed_wavelength(&self, wavelength: Length) -> Result<(), InstrumentError> {
        self.act("conf_fix_wav", &[to_nanometers(wavelength).into()])
    }

    /// Get the fixed wavelength.
    pub fn get_fixed_wavelength(&self) -> Result<Length, InstrumentError> {
        Ok(from_nanometers(self.float("conf_fix_wav_q")?))
    }

    /// Set the fixed optical frequency.
    pub fn set_fixed_frequency(&self, frequency: Frequency) -> Result<(), InstrumentError> {
        self.act("conf_fix_freq", &[to_terahertz(frequency).into()])
    }

    /// Get the fixed optical frequency.
    pub fn get_fixed_frequency(&self) -> Result<Frequency, InstrumentError> {
        Ok(from_terahertz(self.float("conf_fix_freq_q")?))
    }

    /// Set the output power in fixed wavelength mode.
    pub fn set_fixed_power(&self, power: Power) -> Result<(), InstrumentError> {
        self.act("conf_fix_pow", &[to_milliwatts(power).into()])
    }

    /// Get the output power in fixed wavelength mode.
    pub fn get_fixed_power(&self) -> Result<Power, InstrumentError> {
        Ok(from_milliwatts(self.float("conf_fix_pow_q")?))
    }

    /// Set the power profile in fixed wavelength mode.
    ///
    /// # Arguments
    /// * `profile` - The profile.
    /// * `rolloff_db` - Roll-off at the ends of the range for non-flat profiles, 1 to 10 dB. If
    ///   `None`, the laser keeps the previously set value. Ignored for [`Profile::Flat`].
    pub fn set_fixed_profile(
        &self,
        profile: Profile,
        rolloff_db: Option<f64>,
    ) -> Result<(), InstrumentError> {
        let mut args = vec![Arg::from(profile.as_str())];
        if profile != Profile::Flat {
            args.extend(rolloff_db.map(Arg::from));
        }
        self.act("conf_fix_prof", &args)
    }

    /// Get the power profile in fixed wavelength mode, as reported by the laser.
    pub fn get_fixed_profile(&self) -> Result<String, InstrumentError> {
        self.text("conf_fix_prof_q")
    }

    /// Set the delay between receiving a wavelength and raising data valid, up to 100 ms.
    pub fn set_fixed_delay(&self, delay: Duration) -> Result<(), InstrumentError> {
        self.act("conf_fix_del", &[to_microseconds(delay).into()])
    }

    /// Get the delay between receiving a wavelength and raising data valid.
    pub fn get_fixed_delay(&self) -> Result<Duration, InstrumentError> {
        Ok(from_microseconds(self.float("conf_fix_del_q")?))
    }

    /// Calibrate the laser for the fixed wavelength settings.
    pub fn calibrate_fixed(&self) -> Result<(), InstrumentError> {
        self.act("cal_fix", &[])
    }

    /// Get the state of the last fixed wavelength calibration.
    pub fn get_fixed_calibration(&self) -> Result<String, InstrumentError> {
        self.text("cal_fix_q")
    }

    /// Start fixed wavelength mode.
    pub fn start_fixed(&self) -> Result<(), InstrumentError> {
        self.act("init_fix", &[])
    }

    // Helpers

    fn act(&self, name: &str, args: &[Arg]) -> Result<(), InstrumentError> {
        self.execute(name, args).map(|_| ())
    }

    fn value(&self, name: &str) -> Result<Value, InstrumentError> {
        match self.execute(name, &[])? {
            Response::Value(value) => Ok(value),
            Response::Acknowledged(text) => Err(protocol(name, &text, "expected a value")),
        }
    }

    fn float(&self, name: &str) -> Result<f64, InstrumentError> {
        let value = self.value(name)?;
        value.as_f64().ok_or_else(|| unexpected(name, &value))
    }

    fn integer(&self, name: &str) -> Result<i64, InstrumentError> {
        let value = self.value(name)?;
        value.as_i64().ok_or_else(|| unexpected(name, &value))
    }

    fn count(&self, name: &str) -> Result<u32, InstrumentError> {
        let val = self.integer(name)?;
        u32::try_from(val).map_err(|_| protocol(name, &val.to_string(), "expected a count"))
    }

    fn token(&self, name: &str) -> Result<String, InstrumentError> {
        match self.value(name)? {
            Value::Token(token) => Ok(token),
            other => Err(unexpected(name, &other)),
        }
    }

    fn text(&self, name: &str) -> Result<String, InstrumentError> {
        match self.value(name)? {
            Value::Text(text) => Ok(text),
            other => Err(unexpected(name, &other)),
        }
    }

    fn floats(&self, name: &str) -> Result<Vec<f64>, InstrumentError> {
        match self.value(name)? {
            Value::Floats(vals) => Ok(vals),
            other => Err(unexpected(name, &other)),
        }
    }
}

/// Name of the preset command for the given direction and emphasis.
fn preset_command(direction: SweepDirection, emphasis: SweepEmphasis, query: bool) -> &'static str {
    use SweepDirection::*;
    use SweepEmphasis::*;
    match (direction, emphasis, query) {
        (Increasing, Points, false) => "conf_incr_sbp",
        (Increasing, Points, true) => "conf_incr_sbp_q",
        (Increasing, Rate, false) => "conf_incr_sbr",
        (Increasing, Rate, true) => "conf_incr_sbr_q",
        (Increasing, Step, false) => "conf_incr_sbs",
        (Increasing, Step, true) => "conf_incr_sbs_q",
        (Decreasing, Points, false) => "conf_decr_sbp",
        (Decreasing, Points, true) => "conf_decr_sbp_q",
        (Decreasing, Rate, false) => "conf_decr_sbr",
        (Decreasing, Rate, true) => "conf_decr_sbr_q",
        (Decreasing, Step, false) => "conf_decr_sbs",
        (Decreasing, Step, true) => "conf_decr_sbs_q",
        (Bidirectional, Points, false) => "conf_binc_sbp",
        (Bidirectional, Points, true) => "conf_binc_sbp_q",
        (Bidirectional, Rate, false) => "conf_binc_sbr",
        (Bidirectional, Rate, true) => "conf_binc_sbr_q",
        (Bidirectional, Step, false) => "conf_binc_sbs",
        (Bidirectional, Step, true) => "conf_binc_sbs_q",
    }
}

fn protocol(command: &str, response: &str, reason: &str) -> InstrumentError {
    InstrumentError::Protocol {
        command: command.to_string(),
        response: response.to_string(),
        reason: reason.to_string(),
    }
}

fn unexpected(command: &str, value: &Value) -> InstrumentError {
    protocol(command, &format!("{value:?}"), "unexpected kind of value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    fn test_every_preset_command_exists() {
        let registry = registry().unwrap();
        for direction in [
            SweepDirection::Increasing,
            SweepDirection::Decreasing,
            SweepDirection::Bidirectional,
        ] {
            for emphasis in [SweepEmphasis::Points, SweepEmphasis::Rate, SweepEmphasis::Step] {
                for query in [false, true] {
                    let name = preset_command(direction, emphasis, query);
                    assert_eq!(registry.get(name).unwrap().is_query(), query);
                }
            }
        }
    }

    #[rstest]
    fn test_default_config() {
        let config = SweptLaser::default_config();
        assert_eq!(config.host, "insight-laser");
        assert_eq!(config.port, 23);
        assert_eq!(config.prompt, "atlas ready>");
        assert_eq!(config.terminator, "\n\r");
    }
}
