//! Tests for the command table: wire format, argument validation, and set/query round trips
//! against a fake laser that remembers what it was told.

use std::{
    collections::{HashMap, VecDeque},
    io,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use measurements::{Frequency, Length, Power, test_utils::almost_eq};
use rstest::*;

use scpirs::{
    Arg, Connector, FrameBuffer, InstrumentError, InstrumentInterface, Param, ParamKind, Session,
    Value,
};

use insight_swept_laser::{COMMANDS, PROMPT, Profile, SweepDirection, SweptLaser, registry};

/// Resolution of the trigger correction delays in ns.
const CORRECTION_RESOLUTION: &[(&str, f64)] = &[
    (":SOURce:CORRection:DVDelay", 0.15),
    (":SOURce:CORRection:SCDelay", 0.178),
    (":SOURce:CORRection:SSDelay", 0.15),
];

/// A laser that stores the arguments of every setting and echoes them back when queried.
///
/// Every line written to it is recorded in `sent`. Queries for settings that were never made
/// answer with an error line.
struct FakeLaser {
    settings: HashMap<String, String>,
    sent: Arc<Mutex<Vec<String>>>,
    pending: VecDeque<u8>,
    frames: FrameBuffer,
    terminator: String,
}

impl FakeLaser {
    fn new(sent: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            settings: HashMap::new(),
            sent,
            // The greeting is nothing but the prompt.
            pending: PROMPT.bytes().collect(),
            frames: FrameBuffer::new(),
            terminator: "\n".to_string(),
        }
    }

    fn reply(&mut self, line: &str) -> String {
        if let Some(header) = line.strip_suffix('?') {
            return match self.settings.get(header) {
                Some(value) => match resolution(header) {
                    Some(res) => {
                        let value: f64 = value.parse().unwrap_or(0.0);
                        format!("{:.3} ns", (value / res).round() * res)
                    }
                    None => value.clone(),
                },
                None => "ERROR -113, \"Undefined header\"".to_string(),
            };
        }
        let (header, args) = line.split_once(' ').unwrap_or((line, ""));
        self.settings.insert(header.to_string(), args.to_string());
        String::new()
    }
}

fn resolution(header: &str) -> Option<f64> {
    CORRECTION_RESOLUTION
        .iter()
        .find(|(hdr, _)| *hdr == header)
        .map(|(_, res)| *res)
}

impl InstrumentInterface for FakeLaser {
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        let line = String::from_utf8_lossy(data)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        self.sent.lock().unwrap().push(line.clone());
        let reply = self.reply(&line);
        self.pending.extend(reply.bytes());
        self.pending.extend(PROMPT.bytes());
        Ok(())
    }

    fn receive_until(
        &mut self,
        delimiter: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, InstrumentError> {
        let pending = &mut self.pending;
        self.frames
            .read_until(delimiter, timeout, |buf, remaining| {
                if pending.is_empty() {
                    thread::sleep(remaining);
                    return Err(io::ErrorKind::TimedOut.into());
                }
                let n = buf.len().min(pending.len());
                for (slot, byte) in buf.iter_mut().zip(pending.drain(..n)) {
                    *slot = byte;
                }
                Ok(n)
            })
    }

    fn get_terminator(&self) -> &str {
        &self.terminator
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}

/// Hands out a fresh fake laser on every connect, all recording into the same list.
struct FakeConnector {
    sent: Arc<Mutex<Vec<String>>>,
}

impl Connector for FakeConnector {
    type Interface = FakeLaser;

    fn connect(&mut self) -> Result<FakeLaser, InstrumentError> {
        Ok(FakeLaser::new(Arc::clone(&self.sent)))
    }
}

type Laser = SweptLaser<FakeConnector>;

#[fixture]
fn sent() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn crt_laser(sent: &Arc<Mutex<Vec<String>>>) -> Laser {
    let config = SweptLaser::default_config()
        .with_connect_timeout(Duration::from_millis(50))
        .with_command_timeout(Duration::from_millis(50));
    let connector = FakeConnector {
        sent: Arc::clone(sent),
    };
    let laser = SweptLaser::try_new(Session::new(config, connector)).unwrap();
    laser.connect().unwrap();
    laser
}

fn nm(val: f64) -> Length {
    Length::from_meters(val * 1e-9)
}

/// Build the wire line for a command from the table.
fn format(name: &str, args: &[Arg]) -> Result<String, InstrumentError> {
    registry().unwrap().get(name)?.format(args)
}

#[rstest]
#[case::preset_points("conf_swe_poin", vec!["max".into()], ":CONFigure:SWEep:POINts MAXimum")]
#[case::points("conf_swe_poin", vec![1000.into()], ":CONFigure:SWEep:POINts 1000")]
#[case::increasing_preset(
    "conf_incr_sbp",
    vec!["MAXimum".into(), 1550.into(), 1555.into(), 0.into()],
    ":CONFigure:SBPoints MAXimum,1550,1555,0"
)]
#[case::decreasing_step_preset(
    "conf_decr_sbs",
    vec![0.1.into(), "MIN".into(), "MAX".into(), "MIN".into()],
    ":CONFigure:DECReasing:SBSTep 0.1,MINimum,MAXimum,MINimum"
)]
#[case::fixed_profile("conf_fix_prof", vec!["gaussian".into(), 3.into()], ":CONFigure:FIXed:PROFile GAUSsian,3")]
#[case::fixed_profile_without_rolloff("conf_fix_prof", vec!["FLAT".into()], ":CONFigure:FIXed:PROFile FLAT")]
#[case::load("conf_seq_load", vec!["seq.txt".into()], ":CONFigure:SEQuence:LOAD 'seq.txt'")]
#[case::remove_last("conf_seq_rem", vec![(-1).into()], ":CONFigure:SEQuence:REMove -1")]
#[case::control("syst_cont", vec!["soft".into()], ":SYSTem:CONTrol SOFTware")]
#[case::event_status("ese", vec!["on".into()], "*ESE ON")]
#[case::sequence_wavelength(
    "conf_seq_add_wav",
    vec![1550.5.into(), 100.into()],
    ":CONFigure:SEQuence:ADD:WAVelength 1550.5,100"
)]
#[case::sequence_wavelength_at(
    "conf_seq_add_wav",
    vec![1550.5.into(), 100.into(), 2.into()],
    ":CONFigure:SEQuence:ADD:WAVelength 1550.5,100,2"
)]
#[case::power_sync(
    "sour_sync_pow",
    vec![2.into(), 100.into(), 50.into(), 1550.into()],
    ":SOURce:SYNChronize:POWer 2,100,50,1550"
)]
#[case::direction("conf_swe_dir", vec!["BINC".into()], ":CONFigure:SWEep:DIRection BINCreasing")]
#[case::point_increment("conf_swe_poin_incr", vec![8.into()], ":CONFigure:SWEep:POINts:INCRement 8")]
#[case::identity("idn_q", vec![], "*IDN?")]
fn test_wire_format(#[case] name: &str, #[case] args: Vec<Arg>, #[case] exp: &str) {
    assert_eq!(format(name, &args).unwrap(), exp);
}

#[rstest]
#[case::zero_points("conf_swe_poin", vec![0.into()], "points")]
#[case::too_many_points("conf_swe_poin", vec![131_072.into()], "points")]
#[case::unknown_preset("conf_swe_poin", vec!["all".into()], "points")]
#[case::points_as_float("conf_swe_poin", vec![100.5.into()], "points")]
#[case::increment_off_grid("conf_swe_poin_incr", vec![6.into()], "multiple")]
#[case::increment_too_large("conf_swe_poin_incr", vec![260.into()], "multiple")]
#[case::rate_too_small("conf_swe_rat", vec![0.5.into()], "rate")]
#[case::rate_too_large("conf_swe_rat", vec![10_001.into()], "rate")]
#[case::negative_delay("conf_swe_del", vec![(-1).into()], "delay")]
#[case::step_too_small("conf_swe_step", vec![0.01.into()], "step")]
#[case::sample_clock("conf_scl_rat", vec![401.into()], "rate")]
#[case::fixed_delay("conf_fix_del", vec![100_001.into()], "delay")]
#[case::rolloff("conf_fix_prof", vec!["GAUSsian".into(), 11.into()], "rolloff")]
#[case::profile("conf_swe_prof", vec!["sinc".into()], "profile")]
#[case::remove_id("conf_seq_rem", vec![(-2).into()], "id")]
#[case::quoted_filename("conf_seq_sav", vec!["it's.txt".into()], "filename")]
#[case::empty_filename("conf_seq_load", vec!["".into()], "filename")]
#[case::missing("conf_fix_wav", vec![], "wavelength")]
#[case::extra("conf_fix_wav", vec![1550.into(), 1.into()], "arguments")]
#[case::not_a_number("conf_fix_pow", vec![f64::NAN.into()], "power")]
#[case::infinite_delay("sour_corr_dvd", vec![f64::INFINITY.into()], "delay")]
#[case::position("conf_seq_add_wst", vec![0.01.into(), 500.into(), 1531.into(), 1532.into(), (-2).into()], "position")]
#[case::preset_wavelength("conf_binc_sbr", vec![100.into(), "MAX".into(), (-5).into(), 0.into()], "max_wavelength")]
#[case::query_with_argument("conf_fix_wav_q", vec![1550.into()], "arguments")]
fn test_invalid_arguments(#[case] name: &str, #[case] args: Vec<Arg>, #[case] exp_param: &str) {
    match format(name, &args) {
        Err(InstrumentError::InvalidArgument { command, param, .. }) => {
            assert_eq!(command, name);
            assert_eq!(param, exp_param);
        }
        other => panic!("Expected an invalid argument error, got {other:?}"),
    }
}

/// An invalid argument must not cause any traffic, and the session stays usable.
#[rstest]
fn test_invalid_arguments_send_nothing(sent: Arc<Mutex<Vec<String>>>) {
    let laser = crt_laser(&sent);
    assert!(laser.execute("conf_swe_poin", &[0.into()]).is_err());
    assert!(laser.execute("conf_seq_load", &["a'b".into()]).is_err());
    assert!(sent.lock().unwrap().is_empty());

    laser.set_sweep_points(Some(10)).unwrap();
    assert_eq!(
        *sent.lock().unwrap(),
        vec![":CONFigure:SWEep:POINts 10".to_string()]
    );
}

#[rstest]
fn test_unknown_command(sent: Arc<Mutex<Vec<String>>>) {
    let laser = crt_laser(&sent);
    assert!(matches!(
        laser.execute("conf_swe_colour", &[]),
        Err(InstrumentError::UnknownCommand(_))
    ));
    assert!(sent.lock().unwrap().is_empty());
}

/// Trigger correction delays come back rounded to the resolution of the respective delay.
#[rstest]
#[case::data_valid(Laser::set_data_valid_delay, Laser::get_data_valid_delay, 1.0, 1.05)]
#[case::sample_clock(Laser::set_sample_clock_delay, Laser::get_sample_clock_delay, 1.0, 1.068)]
#[case::sweep_start(Laser::set_sweep_start_delay, Laser::get_sweep_start_delay, 0.2, 0.15)]
#[case::negative(Laser::set_data_valid_delay, Laser::get_data_valid_delay, -0.3, -0.3)]
fn test_correction_delay_round_trip(
    sent: Arc<Mutex<Vec<String>>>,
    #[case] set: fn(&Laser, f64) -> Result<(), InstrumentError>,
    #[case] get: fn(&Laser) -> Result<f64, InstrumentError>,
    #[case] value: f64,
    #[case] exp: f64,
) {
    let laser = crt_laser(&sent);
    set(&laser, value).unwrap();
    assert!((get(&laser).unwrap() - exp).abs() < 1e-9);
}

#[rstest]
fn test_fixed_settings_round_trip(sent: Arc<Mutex<Vec<String>>>) {
    let laser = crt_laser(&sent);

    laser.set_fixed_wavelength(nm(1550.25)).unwrap();
    almost_eq(laser.get_fixed_wavelength().unwrap().as_meters(), 1550.25e-9);

    laser
        .set_fixed_frequency(Frequency::from_hertz(193.4e12))
        .unwrap();
    almost_eq(laser.get_fixed_frequency().unwrap().as_hertz(), 193.4e12);

    laser.set_fixed_power(Power::from_watts(0.0125)).unwrap();
    almost_eq(laser.get_fixed_power().unwrap().as_watts(), 0.0125);

    laser.set_fixed_delay(Duration::from_micros(250)).unwrap();
    assert_eq!(laser.get_fixed_delay().unwrap(), Duration::from_micros(250));

    laser.set_fixed_profile(Profile::Gaussian, Some(2.5)).unwrap();
    assert_eq!(laser.get_fixed_profile().unwrap(), "GAUSsian,2.5");
}

#[rstest]
fn test_sweep_settings_round_trip(sent: Arc<Mutex<Vec<String>>>) {
    let laser = crt_laser(&sent);

    laser
        .set_sweep_wavelength_range(nm(1530.0), nm(1565.5))
        .unwrap();
    let (min, max) = laser.get_sweep_wavelength_range().unwrap();
    almost_eq(min.as_meters(), 1530e-9);
    almost_eq(max.as_meters(), 1565.5e-9);

    laser.set_sweep_direction(SweepDirection::Bidirectional).unwrap();
    assert_eq!(
        laser.get_sweep_direction().unwrap(),
        SweepDirection::Bidirectional
    );

    laser.set_sweep_points(Some(4096)).unwrap();
    assert_eq!(laser.get_sweep_points().unwrap(), 4096);

    laser.set_sweep_rate(Frequency::from_hertz(250e3)).unwrap();
    almost_eq(laser.get_sweep_rate().unwrap().as_hertz(), 250e3);

    laser.set_sweep_delay(Duration::from_nanos(1500)).unwrap();
    assert_eq!(laser.get_sweep_delay().unwrap(), Duration::from_nanos(1500));

    laser.set_sweep_step(Frequency::from_hertz(2.5e9)).unwrap();
    almost_eq(laser.get_sweep_step().unwrap().as_hertz(), 2.5e9);

    laser
        .set_sample_clock_rate(Frequency::from_hertz(200e6))
        .unwrap();
    almost_eq(laser.get_sample_clock_rate().unwrap().as_hertz(), 200e6);

    laser.set_sweep_profile(Profile::Custom).unwrap();
    assert_eq!(laser.get_sweep_profile().unwrap(), Profile::Custom);
}

/// A query for a setting the laser never received is answered with an in-band error.
#[rstest]
fn test_query_without_setting(sent: Arc<Mutex<Vec<String>>>) {
    let laser = crt_laser(&sent);
    match laser.get_sequence_power() {
        Err(InstrumentError::Instrument { code, message }) => {
            assert_eq!(code, Some(-113));
            assert_eq!(message, "Undefined header");
        }
        other => panic!("Expected an instrument error, got {other:?}"),
    }
    laser.set_sequence_power(Power::from_watts(0.001)).unwrap();
    almost_eq(laser.get_sequence_power().unwrap().as_watts(), 0.001);
}

/// Some valid value for a parameter, away from the edges of its range where possible.
fn sample_arg(param: &Param) -> Arg {
    match param.kind {
        ParamKind::Integer { min, max, step } if max.saturating_sub(min) >= 2 * step => {
            Arg::Int(min + step)
        }
        ParamKind::Integer { min, .. } => Arg::Int(min),
        ParamKind::Float { min, max } if min.is_finite() && max.is_finite() => {
            Arg::Float((min + max) / 2.0)
        }
        ParamKind::Float { min, .. } if min.is_finite() => Arg::Float(min + 1.5),
        ParamKind::Float { .. } => Arg::Float(1.5),
        ParamKind::Choice(choices) => Arg::Token(choices[0].to_string()),
        ParamKind::Filename => Arg::Token("a.txt".to_string()),
    }
}

fn parse(field: &str) -> f64 {
    field.parse().unwrap()
}

/// Every setting that can be queried back reads back what was set.
#[rstest]
fn test_every_setting_round_trips(sent: Arc<Mutex<Vec<String>>>) {
    let laser = crt_laser(&sent);
    let registry = registry().unwrap();
    let mut pairs = 0;

    for setter in COMMANDS.iter().filter(|cmd| !cmd.is_query() && !cmd.params.is_empty()) {
        let Ok(query) = registry.get(&format!("{}_q", setter.name)) else {
            continue;
        };
        pairs += 1;

        let args: Vec<Arg> = setter.params.iter().map(sample_arg).collect();
        let rendered = setter.validate(&args).unwrap();
        let tolerance = resolution(setter.header).map_or(1e-9, |res| res / 2.0 + 1e-9);

        laser.execute(setter.name, &args).unwrap();
        let response = laser.execute(query.name, &[]).unwrap();
        let value = response.value().unwrap();
        match value {
            Value::Float(_) | Value::Integer(_) => {
                assert_eq!(rendered.len(), 1, "{}", setter.name);
                let val = value.as_f64().unwrap();
                assert!(
                    (val - parse(&rendered[0])).abs() <= tolerance,
                    "{}: set {rendered:?}, got {val}",
                    setter.name
                );
            }
            Value::Floats(vals) => {
                assert_eq!(vals.len(), rendered.len(), "{}", setter.name);
                for (val, exp) in vals.iter().zip(&rendered) {
                    assert!((val - parse(exp)).abs() <= tolerance, "{}", setter.name);
                }
            }
            Value::Token(text) | Value::Text(text) => {
                assert!(
                    text.eq_ignore_ascii_case(&rendered.join(",")),
                    "{}: set {rendered:?}, got {text}",
                    setter.name
                );
            }
            other => panic!("{}: unexpected reply {other:?}", setter.name),
        }
    }

    assert!(pairs >= 30, "only {pairs} settings can be queried back");
}
