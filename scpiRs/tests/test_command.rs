//! Tests for command descriptors and the command registry.

use rstest::*;

use scpirs::{Arg, CommandDescriptor, CommandRegistry, InstrumentError, Param, ParamKind, ReplyKind};

const DIRECTIONS: &[&str] = &["INCReasing", "DECReasing", "BINCreasing"];

static TABLE: &[CommandDescriptor] = &[
    CommandDescriptor::action("rst", "*RST", &[]),
    CommandDescriptor::action(
        "swe_dir",
        ":CONFigure:SWEep:DIRection",
        &[Param::required("direction", ParamKind::Choice(DIRECTIONS))],
    ),
    CommandDescriptor::action(
        "swe_poin",
        ":CONFigure:SWEep:POINts",
        &[Param::required(
            "points",
            ParamKind::Integer {
                min: 1,
                max: 131071,
                step: 1,
            },
        )
        .with_presets(&["MAXimum"])],
    ),
    CommandDescriptor::action(
        "poin_incr",
        ":CONFigure:SWEep:POINts:INCRement",
        &[Param::required(
            "increment",
            ParamKind::Integer {
                min: 4,
                max: 256,
                step: 4,
            },
        )],
    ),
    CommandDescriptor::action(
        "seq_add_wst",
        ":CONFigure:SEQuence:ADD:WSTep",
        &[
            Param::required("step", ParamKind::Float { min: 0.0, max: 100.0 }),
            Param::required("dwell", ParamKind::Float { min: 0.0, max: 1e9 }),
            Param::required("start", ParamKind::Float { min: 1000.0, max: 2000.0 }),
            Param::required("stop", ParamKind::Float { min: 1000.0, max: 2000.0 }),
            Param::optional(
                "position",
                ParamKind::Integer {
                    min: -1,
                    max: i64::MAX,
                    step: 1,
                },
            ),
        ],
    ),
    CommandDescriptor::action(
        "fix_prof",
        ":CONFigure:FIXed:PROFile",
        &[
            Param::required("profile", ParamKind::Choice(&["FLAT", "GAUSsian", "CUSTom"])),
            Param::optional("roll_off", ParamKind::Float { min: 1.0, max: 10.0 }),
        ],
    ),
    CommandDescriptor::action(
        "seq_load",
        ":CONFigure:SEQuence:LOAD",
        &[Param::required("filename", ParamKind::Filename)],
    ),
    CommandDescriptor::query("wav_q", ":CONFigure:FIXed:WAVelength?", &[], ReplyKind::Float),
];

#[fixture]
fn registry() -> CommandRegistry {
    CommandRegistry::from_table(TABLE).unwrap()
}

fn format(registry: &CommandRegistry, name: &str, args: Vec<Arg>) -> Result<String, InstrumentError> {
    registry.get(name)?.format(&args)
}

#[rstest]
#[case("rst", vec![], "*RST")]
#[case("swe_dir", vec!["incr".into()], ":CONFigure:SWEep:DIRection INCReasing")]
#[case("swe_dir", vec!["Bincreasing".into()], ":CONFigure:SWEep:DIRection BINCreasing")]
#[case("swe_poin", vec![131071.into()], ":CONFigure:SWEep:POINts 131071")]
#[case("swe_poin", vec!["max".into()], ":CONFigure:SWEep:POINts MAXimum")]
#[case("poin_incr", vec![8.into()], ":CONFigure:SWEep:POINts:INCRement 8")]
#[case(
    "seq_add_wst",
    vec![0.01.into(), 500.into(), 1531.into(), 1531.5.into(), 0.into()],
    ":CONFigure:SEQuence:ADD:WSTep 0.01,500,1531,1531.5,0"
)]
#[case(
    "seq_add_wst",
    vec![0.01.into(), 500.into(), 1531.into(), 1531.5.into()],
    ":CONFigure:SEQuence:ADD:WSTep 0.01,500,1531,1531.5"
)]
#[case("fix_prof", vec!["flat".into()], ":CONFigure:FIXed:PROFile FLAT")]
#[case("fix_prof", vec!["gaus".into(), 3.into()], ":CONFigure:FIXed:PROFile GAUSsian,3")]
#[case("seq_load", vec!["seq1.txt".into()], ":CONFigure:SEQuence:LOAD 'seq1.txt'")]
#[case("wav_q", vec![], ":CONFigure:FIXed:WAVelength?")]
fn test_valid_wire_format(
    registry: CommandRegistry,
    #[case] name: &str,
    #[case] args: Vec<Arg>,
    #[case] exp: &str,
) {
    assert_eq!(format(&registry, name, args).unwrap(), exp);
}

#[rstest]
#[case("rst", vec![1.into()], "arguments")]
#[case("swe_dir", vec![], "direction")]
#[case("swe_dir", vec!["sideways".into()], "direction")]
#[case("swe_dir", vec!["inc".into()], "direction")]
#[case("swe_dir", vec![1.into()], "direction")]
#[case("swe_poin", vec![0.into()], "points")]
#[case("swe_poin", vec![131072.into()], "points")]
#[case("swe_poin", vec![100.5.into()], "points")]
#[case("swe_poin", vec!["min".into()], "points")]
#[case("poin_incr", vec![6.into()], "increment")]
#[case("poin_incr", vec![260.into()], "increment")]
#[case("seq_add_wst", vec![0.01.into(), 500.into(), 1531.into()], "stop")]
#[case("seq_add_wst", vec![0.01.into(), 500.into(), 1531.into(), 1531.5.into(), (-2).into()], "position")]
#[case("seq_add_wst", vec![f64::NAN.into(), 500.into(), 1531.into(), 1531.5.into()], "step")]
#[case("fix_prof", vec!["flat".into(), 11.into()], "roll_off")]
#[case("seq_load", vec!["it's.txt".into()], "filename")]
#[case("seq_load", vec!["".into()], "filename")]
#[case("seq_load", vec!["a\nb".into()], "filename")]
fn test_invalid_arguments(
    registry: CommandRegistry,
    #[case] name: &str,
    #[case] args: Vec<Arg>,
    #[case] exp_param: &str,
) {
    match format(&registry, name, args) {
        Err(InstrumentError::InvalidArgument { command, param, .. }) => {
            assert_eq!(command, name);
            assert_eq!(param, exp_param);
        }
        other => panic!("Expected an invalid argument error, got {other:?}"),
    }
}

#[rstest]
fn test_registry_lookup(registry: CommandRegistry) {
    assert_eq!(registry.len(), TABLE.len());
    assert!(!registry.is_empty());
    assert!(registry.get("wav_q").unwrap().is_query());
    assert!(!registry.get("rst").unwrap().is_query());
    assert!(registry.iter().any(|desc| desc.header == "*RST"));
    assert!(matches!(
        registry.get("does_not_exist"),
        Err(InstrumentError::UnknownCommand(name)) if name == "does_not_exist"
    ));
}

#[rstest]
fn test_registry_validate(registry: CommandRegistry) {
    let desc = registry.get("swe_dir").unwrap();
    assert!(registry.validate(desc, &["DECR".into()]).is_ok());
    assert!(registry.validate(desc, &["UP".into()]).is_err());
}

static DUPLICATE: &[CommandDescriptor] = &[
    CommandDescriptor::action("rst", "*RST", &[]),
    CommandDescriptor::action("rst", "*RST", &[]),
];

static OPTIONAL_FIRST: &[CommandDescriptor] = &[CommandDescriptor::action(
    "bad",
    ":BAD",
    &[
        Param::optional("a", ParamKind::Filename),
        Param::required("b", ParamKind::Filename),
    ],
)];

#[rstest]
#[case(DUPLICATE)]
#[case(OPTIONAL_FIRST)]
fn test_registry_rejects_bad_tables(#[case] table: &'static [CommandDescriptor]) {
    assert!(matches!(
        CommandRegistry::from_table(table),
        Err(InstrumentError::Config(_))
    ));
}
