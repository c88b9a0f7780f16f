//! The laser's command vocabulary as a static table of descriptors.
//!
//! Names follow the command headers: `conf_fix_wav` sets the fixed wavelength, `conf_fix_wav_q`
//! queries it. Numeric ranges are the ones documented for the firmware; parameters without a
//! documented range only need to be finite (and non-negative for physical quantities).

use scpirs::{
    CommandDescriptor, CommandDescriptor as Cmd, CommandRegistry, InstrumentError, Param, ParamKind,
    ReplyKind,
};

use crate::{ControlMode, Profile, SweepDirection, Switch, TriggerEdge};

const NON_NEGATIVE: ParamKind = ParamKind::Float {
    min: 0.0,
    max: f64::INFINITY,
};
const FINITE: ParamKind = ParamKind::Float {
    min: f64::NEG_INFINITY,
    max: f64::INFINITY,
};
const SWEEP_POINTS: ParamKind = ParamKind::Integer {
    min: 1,
    max: 131_071,
    step: 1,
};
const SWEEP_RATE_KHZ: ParamKind = ParamKind::Float {
    min: 1.0,
    max: 10_000.0,
};
const SWEEP_DELAY_NS: ParamKind = ParamKind::Float {
    min: 0.0,
    max: 655_350.0,
};
const SWEEP_STEP_GHZ: ParamKind = ParamKind::Float {
    min: 0.05,
    max: 10_000.0,
};
const POSITION: ParamKind = ParamKind::Integer {
    min: -1,
    max: i64::MAX,
    step: 1,
};

const MIN_MAX: &[&str] = &["MINimum", "MAXimum"];

const SWITCH: &[Param] = &[Param::required("state", ParamKind::Choice(Switch::MNEMONICS))];
const WAVELENGTH: &[Param] = &[Param::required("wavelength", NON_NEGATIVE)];
const FREQUENCY: &[Param] = &[Param::required("frequency", NON_NEGATIVE)];
const POWER: &[Param] = &[Param::required("power", NON_NEGATIVE)];
const CORRECTION_DELAY: &[Param] = &[Param::required("delay", FINITE)];
const FILENAME: &[Param] = &[Param::required("filename", ParamKind::Filename)];

const POWER_SYNC: &[Param] = &[
    Param::required("amplitude", NON_NEGATIVE),
    Param::required("start_delay", NON_NEGATIVE),
    Param::required("pulse_width", NON_NEGATIVE),
    Param::required("wavelength", NON_NEGATIVE),
];

const SWEEP_DIRECTION: &[Param] = &[Param::required(
    "direction",
    ParamKind::Choice(SweepDirection::MNEMONICS),
)];
const SWEEP_POINTS_PARAM: &[Param] =
    &[Param::required("points", SWEEP_POINTS).with_presets(&["MAXimum"])];
const SWEEP_RATE: &[Param] = &[Param::required("rate", SWEEP_RATE_KHZ)];
const SWEEP_DELAY: &[Param] = &[Param::required("delay", SWEEP_DELAY_NS)];
const SWEEP_PROFILE: &[Param] = &[Param::required(
    "profile",
    ParamKind::Choice(Profile::MNEMONICS),
)];
const SWEEP_TRIGGER: &[Param] = &[Param::required(
    "edge",
    ParamKind::Choice(TriggerEdge::MNEMONICS),
)];
const SWEEP_STEP: &[Param] = &[Param::required("step", SWEEP_STEP_GHZ)];
const POINT_INCREMENT: &[Param] = &[Param::required(
    "multiple",
    ParamKind::Integer {
        min: 4,
        max: 256,
        step: 4,
    },
)];
const CONTROL_MODE: &[Param] = &[Param::required(
    "mode",
    ParamKind::Choice(ControlMode::MNEMONICS),
)];
const SAMPLE_CLOCK_RATE: &[Param] = &[Param::required(
    "rate",
    ParamKind::Float {
        min: 1.0,
        max: 400.0,
    },
)];

const PRESET_BY_POINTS: &[Param] = &[
    Param::required("points", SWEEP_POINTS).with_presets(MIN_MAX),
    Param::required("min_wavelength", NON_NEGATIVE).with_presets(MIN_MAX),
    Param::required("max_wavelength", NON_NEGATIVE).with_presets(MIN_MAX),
    Param::required("delay", SWEEP_DELAY_NS).with_presets(MIN_MAX),
];
const PRESET_BY_RATE: &[Param] = &[
    Param::required("rate", SWEEP_RATE_KHZ).with_presets(MIN_MAX),
    Param::required("min_wavelength", NON_NEGATIVE).with_presets(MIN_MAX),
    Param::required("max_wavelength", NON_NEGATIVE).with_presets(MIN_MAX),
    Param::required("delay", SWEEP_DELAY_NS).with_presets(MIN_MAX),
];
const PRESET_BY_STEP: &[Param] = &[
    Param::required("step", SWEEP_STEP_GHZ).with_presets(MIN_MAX),
    Param::required("min_wavelength", NON_NEGATIVE).with_presets(MIN_MAX),
    Param::required("max_wavelength", NON_NEGATIVE).with_presets(MIN_MAX),
    Param::required("delay", SWEEP_DELAY_NS).with_presets(MIN_MAX),
];

const SEQUENCE_WAVELENGTH_STEPS: &[Param] = &[
    Param::required("step", NON_NEGATIVE),
    Param::required("length", NON_NEGATIVE),
    Param::required("start", NON_NEGATIVE),
    Param::required("stop", NON_NEGATIVE),
    Param::optional("position", POSITION),
];
const SEQUENCE_FREQUENCY_STEPS: &[Param] = SEQUENCE_WAVELENGTH_STEPS;
const SEQUENCE_WAVELENGTH: &[Param] = &[
    Param::required("wavelength", NON_NEGATIVE),
    Param::required("length", NON_NEGATIVE),
    Param::optional("position", POSITION),
];
const SEQUENCE_REMOVE: &[Param] = &[Param::required("id", POSITION)];

const FIXED_DELAY: &[Param] = &[Param::required(
    "delay",
    ParamKind::Float {
        min: 0.0,
        max: 100_000.0,
    },
)];
const FIXED_PROFILE: &[Param] = &[
    Param::required("profile", ParamKind::Choice(Profile::MNEMONICS)),
    Param::optional("rolloff", ParamKind::Float { min: 1.0, max: 10.0 }),
];

/// Every command the laser understands.
pub static COMMANDS: &[CommandDescriptor] = &[
    // IEEE 488.2 common commands
    Cmd::action("cls", "*CLS", &[]),
    Cmd::action("ese", "*ESE", SWITCH),
    Cmd::query("ese_q", "*ESE?", &[], ReplyKind::Token),
    Cmd::query("esr_q", "*ESR?", &[], ReplyKind::Integer),
    Cmd::query("idn_q", "*IDN?", &[], ReplyKind::Text),
    Cmd::query("opc_q", "*OPC?", &[], ReplyKind::Integer),
    Cmd::action("rst", "*RST", &[]),
    Cmd::query("stb_q", "*STB?", &[], ReplyKind::Integer),
    Cmd::query("tst_q", "*TST?", &[], ReplyKind::Text),
    Cmd::action("wai", "*WAI", &[]),
    // Synchronization and trigger delays
    Cmd::action("sour_sync_pow", ":SOURce:SYNChronize:POWer", POWER_SYNC),
    Cmd::query("sour_sync_pow_q", ":SOURce:SYNChronize:POWer?", &[], ReplyKind::Floats),
    Cmd::action("sour_corr_dvd", ":SOURce:CORRection:DVDelay", CORRECTION_DELAY),
    Cmd::query("sour_corr_dvd_q", ":SOURce:CORRection:DVDelay?", &[], ReplyKind::Float),
    Cmd::query(
        "sour_corr_dvd_tot_q",
        ":SOURce:CORRection:DVDelay:TOTal?",
        &[],
        ReplyKind::Float,
    ),
    Cmd::action("sour_corr_scd", ":SOURce:CORRection:SCDelay", CORRECTION_DELAY),
    Cmd::query("sour_corr_scd_q", ":SOURce:CORRection:SCDelay?", &[], ReplyKind::Float),
    Cmd::action("sour_corr_ssd", ":SOURce:CORRection:SSDelay", CORRECTION_DELAY),
    Cmd::query("sour_corr_ssd_q", ":SOURce:CORRection:SSDelay?", &[], ReplyKind::Float),
    Cmd::query(
        "sour_corr_ssd_tot_q",
        ":SOURce:CORRection:SSDelay:TOTal?",
        &[],
        ReplyKind::Float,
    ),
    // Sweep configuration
    Cmd::action("conf_swe_wmin", ":CONFigure:SWEep:WMINimum", WAVELENGTH),
    Cmd::query("conf_swe_wmin_q", ":CONFigure:SWEep:WMINimum?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_fmin", ":CONFigure:SWEep:FMINimum", FREQUENCY),
    Cmd::query("conf_swe_fmin_q", ":CONFigure:SWEep:FMINimum?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_wmax", ":CONFigure:SWEep:WMAXimum", WAVELENGTH),
    Cmd::query("conf_swe_wmax_q", ":CONFigure:SWEep:WMAXimum?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_fmax", ":CONFigure:SWEep:FMAXimum", FREQUENCY),
    Cmd::query("conf_swe_fmax_q", ":CONFigure:SWEep:FMAXimum?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_dir", ":CONFigure:SWEep:DIRection", SWEEP_DIRECTION),
    Cmd::query("conf_swe_dir_q", ":CONFigure:SWEep:DIRection?", &[], ReplyKind::Token),
    Cmd::action("conf_swe_poin", ":CONFigure:SWEep:POINts", SWEEP_POINTS_PARAM),
    Cmd::query("conf_swe_poin_q", ":CONFigure:SWEep:POINts?", &[], ReplyKind::Integer),
    Cmd::action("conf_swe_rat", ":CONFigure:SWEep:RATe", SWEEP_RATE),
    Cmd::query("conf_swe_rat_q", ":CONFigure:SWEep:RATe?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_del", ":CONFigure:SWEep:DELay", SWEEP_DELAY),
    Cmd::query("conf_swe_del_q", ":CONFigure:SWEep:DELay?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_pow", ":CONFigure:SWEep:POWer", POWER),
    Cmd::query("conf_swe_pow_q", ":CONFigure:SWEep:POWer?", &[], ReplyKind::Float),
    Cmd::action("conf_swe_prof", ":CONFigure:SWEep:PROFile", SWEEP_PROFILE),
    Cmd::query("conf_swe_prof_q", ":CONFigure:SWEep:PROFile?", &[], ReplyKind::Token),
    Cmd::action("conf_swe_trig", ":CONFigure:SWEep:TRIGger", SWEEP_TRIGGER),
    Cmd::query("conf_swe_trig_q", ":CONFigure:SWEep:TRIGger?", &[], ReplyKind::Token),
    Cmd::action("conf_swe_step", ":CONFigure:SWEep:STEP", SWEEP_STEP),
    Cmd::query("conf_swe_step_q", ":CONFigure:SWEep:STEP?", &[], ReplyKind::Float),
    Cmd::action(
        "conf_swe_poin_incr",
        ":CONFigure:SWEep:POINts:INCRement",
        POINT_INCREMENT,
    ),
    Cmd::query(
        "conf_swe_poin_incr_q",
        ":CONFigure:SWEep:POINts:INCRement?",
        &[],
        ReplyKind::Integer,
    ),
    Cmd::query("conf_swe_div_q", ":CONFigure:SWEep:DIVector?", &[], ReplyKind::Floats),
    Cmd::query(
        "conf_swe_poin_tot_q",
        ":CONFigure:SWEep:POINts:TOTal?",
        &[],
        ReplyKind::Integer,
    ),
    Cmd::action("conf_scl_rat", ":CONFigure:SCLock:RATe", SAMPLE_CLOCK_RATE),
    Cmd::query("conf_scl_rat_q", ":CONFigure:SCLock:RATe?", &[], ReplyKind::Float),
    // Sweep presets
    Cmd::action("conf_incr_sbp", ":CONFigure:SBPoints", PRESET_BY_POINTS),
    Cmd::query("conf_incr_sbp_q", ":CONFigure:SBPoints?", &[], ReplyKind::Floats),
    Cmd::action("conf_incr_sbr", ":CONFigure:SBRate", PRESET_BY_RATE),
    Cmd::query("conf_incr_sbr_q", ":CONFigure:SBRate?", &[], ReplyKind::Floats),
    Cmd::action("conf_incr_sbs", ":CONFigure:SBSTep", PRESET_BY_STEP),
    Cmd::query("conf_incr_sbs_q", ":CONFigure:SBSTep?", &[], ReplyKind::Floats),
    Cmd::action("conf_decr_sbp", ":CONFigure:DECReasing:SBPoints", PRESET_BY_POINTS),
    Cmd::query(
        "conf_decr_sbp_q",
        ":CONFigure:DECReasing:SBPoints?",
        &[],
        ReplyKind::Floats,
    ),
    Cmd::action("conf_decr_sbr", ":CONFigure:DECReasing:SBRate", PRESET_BY_RATE),
    Cmd::query(
        "conf_decr_sbr_q",
        ":CONFigure:DECReasing:SBRate?",
        &[],
        ReplyKind::Floats,
    ),
    Cmd::action("conf_decr_sbs", ":CONFigure:DECReasing:SBSTep", PRESET_BY_STEP),
    Cmd::query(
        "conf_decr_sbs_q",
        ":CONFigure:DECReasing:SBSTep?",
        &[],
        ReplyKind::Floats,
    ),
    Cmd::action("conf_binc_sbp", ":CONFigure:BINCreasing:SBPoints", PRESET_BY_POINTS),
    Cmd::query(
        "conf_binc_sbp_q",
        ":CONFigure:BINCreasing:SBPoints?",
        &[],
        ReplyKind::Floats,
    ),
    Cmd::action("conf_binc_sbr", ":CONFigure:BINCreasing:SBRate", PRESET_BY_RATE),
    Cmd::query(
        "conf_binc_sbr_q",
        ":CONFigure:BINCreasing:SBRate?",
        &[],
        ReplyKind::Floats,
    ),
    Cmd::action("conf_binc_sbs", ":CONFigure:BINCreasing:SBSTep", PRESET_BY_STEP),
    Cmd::query(
        "conf_binc_sbs_q",
        ":CONFigure:BINCreasing:SBSTep?",
        &[],
        ReplyKind::Floats,
    ),
    // Sweep mode
    Cmd::action("cal_swe", ":CALibrate:SWEep", &[]),
    Cmd::action("init_swe", ":INITiate:SWEep", &[]),
    Cmd::action("abor", ":ABORt", &[]),
    Cmd::action("syst_cont", ":SYSTem:CONTrol", CONTROL_MODE),
    // Error queue
    Cmd::query("syst_err_all_q", ":SYSTem:ERRor:ALL?", &[], ReplyKind::ErrorQueue),
    Cmd::query("syst_err_q", ":SYSTem:ERRor?", &[], ReplyKind::ErrorQueue),
    Cmd::query("syst_err_next_q", ":SYSTem:ERRor:NEXT?", &[], ReplyKind::ErrorQueue),
    Cmd::query("syst_err_code_q", ":SYSTem:ERRor:CODE?", &[], ReplyKind::Integer),
    Cmd::query(
        "syst_err_code_next_q",
        ":SYSTem:ERRor:CODE:NEXT?",
        &[],
        ReplyKind::Integer,
    ),
    Cmd::query(
        "syst_err_code_all_q",
        ":SYSTem:ERRor:CODE:ALL?",
        &[],
        ReplyKind::Floats,
    ),
    // Sequence mode
    Cmd::query("conf_seq_q", ":CONFigure:SEQuence?", &[], ReplyKind::Floats),
    Cmd::action("conf_seq_clea", ":CONFigure:SEQuence:CLEAr", &[]),
    Cmd::action(
        "conf_seq_add_wst",
        ":CONFigure:SEQuence:ADD:WSTep",
        SEQUENCE_WAVELENGTH_STEPS,
    ),
    Cmd::action(
        "conf_seq_add_fst",
        ":CONFigure:SEQuence:ADD:FSTep",
        SEQUENCE_FREQUENCY_STEPS,
    ),
    Cmd::action(
        "conf_seq_add_wav",
        ":CONFigure:SEQuence:ADD:WAVelength",
        SEQUENCE_WAVELENGTH,
    ),
    Cmd::action("conf_seq_int", ":CONFigure:SEQuence:INTerpolation", SWITCH),
    Cmd::action("conf_seq_load", ":CONFigure:SEQuence:LOAD", FILENAME),
    Cmd::action("conf_seq_sav", ":CONFigure:SEQuence:SAVe", FILENAME),
    Cmd::action("conf_seq_pow", ":CONFigure:SEQuence:POWer", POWER),
    Cmd::query("conf_seq_pow_q", ":CONFigure:SEQuence:POWer?", &[], ReplyKind::Float),
    Cmd::action("conf_seq_rem", ":CONFigure:SEQuence:REMove", SEQUENCE_REMOVE),
    Cmd::action("cal_seq", ":CALibrate:SEQuence", &[]),
    Cmd::query("cal_seq_q", ":CALibrate:SEQuence?", &[], ReplyKind::Text),
    Cmd::action("init_seq", ":INITiate:SEQuence", &[]),
    // Fixed wavelength mode
    Cmd::action("cal_fix", ":CALibrate:FIXed", &[]),
    Cmd::query("cal_fix_q", ":CALibrate:FIXed?", &[], ReplyKind::Text),
    Cmd::action("conf_fix_del", ":CONFigure:FIXed:DELay", FIXED_DELAY),
    Cmd::query("conf_fix_del_q", ":CONFigure:FIXed:DELay?", &[], ReplyKind::Float),
    Cmd::action("conf_fix_freq", ":CONFigure:FIXed:FREQuency", FREQUENCY),
    Cmd::query("conf_fix_freq_q", ":CONFigure:FIXed:FREQuency?", &[], ReplyKind::Float),
    Cmd::action("conf_fix_wav", ":CONFigure:FIXed:WAVelength", WAVELENGTH),
    Cmd::query("conf_fix_wav_q", ":CONFigure:FIXed:WAVelength?", &[], ReplyKind::Float),
    Cmd::action("conf_fix_pow", ":CONFigure:FIXed:POWer", POWER),
    Cmd::query("conf_fix_pow_q", ":CONFigure:FIXed:POWer?", &[], ReplyKind::Float),
    Cmd::action("conf_fix_prof", ":CONFigure:FIXed:PROFile", FIXED_PROFILE),
    Cmd::query("conf_fix_prof_q", ":CONFigure:FIXed:PROFile?", &[], ReplyKind::Text),
    Cmd::action("init_fix", ":INITiate:FIXed", &[]),
];

/// Build the registry for [`COMMANDS`].
pub fn registry() -> Result<CommandRegistry, InstrumentError> {
    CommandRegistry::from_table(COMMANDS)
}
