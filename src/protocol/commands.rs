//! Command catalog and argument encoding.
//!
//! [`CATALOG`] lists every supported command with its positional parameters,
//! the layout of its reply and the receive buffer it needs. [`Command`] is the
//! typed way to build one; [`Command::encode`] renders it as a wire line.
//!
//! Argument rendering:
//! - integers: decimal
//! - fixed floats: six decimals (`1.500000`)
//! - scientific floats: six-decimal mantissa, signed two-digit exponent,
//!   lower case (`1.500000e-06`) or upper case (`1.000000E-04`) per command
//! - booleans: `True` / `False`
//! - enumerated tokens: their literal (`PeakCenter`)
//! - timestamps: `yyyy-mm-dd_HH:MM:SS`
//!
//! Values are not range-checked; the instrument's `ERROR` reply is authoritative.

use super::codec::{encode_command, BufferTier};
use super::parser::Layout;
use super::value::bool_word;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp argument format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

// =============================================================================
// Enumerated argument tokens
// =============================================================================

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[doc = concat!("`", stringify!($variant), "`")]
                $variant
            ),+
        }

        impl $name {
            /// Every token in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire literal.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| format!("invalid {} '{}'", stringify!($name), s))
            }
        }
    };
}

wire_enum! {
    /// Peak filter used by bar chart and peak jump measurements.
    FilterMode { PeakCenter, PeakMax, PeakAverage }
}

wire_enum! {
    /// Zero buffer averaging strategy.
    ZeroBufferMode { SingleScanAverage, MultiScanAverage, MultiScanAverageQuickStart, SingleShot }
}

wire_enum! {
    /// Filament switch.
    OnOff { On, Off }
}

wire_enum! {
    /// Inlet and detector calibration source.
    CalibrationOption { Off, Default, Current }
}

wire_enum! {
    /// Audio output mode.
    AudioMode { Off, Automatic, Manual }
}

wire_enum! {
    /// Cirrus heater setting.
    CirrusHeaterMode { Off, Warm, Bake }
}

wire_enum! {
    /// RVC valve control mode.
    RvcValveMode { Manual, Automatic }
}

// =============================================================================
// Descriptors
// =============================================================================

/// Type and notation of one positional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Decimal integer.
    Int,
    /// Fixed notation float.
    Fixed,
    /// Scientific notation float, lower-case exponent.
    Scientific,
    /// Scientific notation float, upper-case exponent.
    ScientificUpper,
    /// `True` / `False`.
    Bool,
    /// Enumerated literal.
    Token,
    /// Free text, quoted when it contains whitespace.
    Text,
    /// Time in [`TIMESTAMP_FORMAT`].
    Timestamp,
}

/// One named positional parameter of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: &'static str,
    /// Rendering of the value.
    pub kind: ParamKind,
}

/// Static description of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Wire command name.
    pub name: &'static str,
    /// Positional parameters in order.
    pub params: &'static [Param],
    /// Shape of the reply.
    pub layout: Layout,
    /// Receive buffer needed for the reply.
    pub tier: BufferTier,
}

impl CommandDescriptor {
    const fn new(name: &'static str, params: &'static [Param]) -> Self {
        Self {
            name,
            params,
            layout: Layout::Vertical,
            tier: BufferTier::Standard,
        }
    }

    const fn layout(self, layout: Layout) -> Self {
        Self { layout, ..self }
    }

    const fn large(self) -> Self {
        Self {
            tier: BufferTier::Large,
            ..self
        }
    }
}

macro_rules! p {
    ($name:literal, $kind:expr) => {
        Param {
            name: $name,
            kind: $kind,
        }
    };
}

use ParamKind::{
    Bool as B, Fixed as F, Int as I, Scientific as E, ScientificUpper as EU, Text as S,
    Timestamp as D, Token as T,
};

const NONE: &[Param] = &[];

/// Every command the client can issue.
pub static CATALOG: &[CommandDescriptor] = &[
    // Sensor discovery and information
    CommandDescriptor::new("Sensors", NONE).layout(Layout::Horizontal).large(),
    CommandDescriptor::new("Select", &[p!("SerialNumber", S)]),
    CommandDescriptor::new("SensorState", NONE),
    CommandDescriptor::new("Info", NONE).large(),
    CommandDescriptor::new("EGains", NONE).layout(Layout::VerticalOnePerLine),
    CommandDescriptor::new("InletInfo", NONE).layout(Layout::Horizontal).large(),
    CommandDescriptor::new("RFInfo", NONE),
    CommandDescriptor::new("MultiplierInfo", NONE),
    CommandDescriptor::new("SourceInfo", NONE),
    CommandDescriptor::new("DetectorInfo", &[p!("SourceIndex", I)])
        .layout(Layout::Composite)
        .large(),
    CommandDescriptor::new("FilamentInfo", NONE),
    CommandDescriptor::new("TotalPressureInfo", NONE),
    CommandDescriptor::new("AnalogInputInfo", NONE).layout(Layout::Horizontal).large(),
    CommandDescriptor::new("AnalogOutputInfo", NONE).layout(Layout::Horizontal).large(),
    CommandDescriptor::new("DigitalInfo", NONE).large(),
    CommandDescriptor::new("RolloverInfo", NONE),
    CommandDescriptor::new("RVCInfo", NONE),
    CommandDescriptor::new("CirrusInfo", NONE),
    CommandDescriptor::new("PECal_Info", &[p!("SourceIndex", I), p!("DetectorIndex", I)]),
    // Control
    CommandDescriptor::new("Control", &[p!("AppName", S), p!("Version", S)]),
    CommandDescriptor::new("Release", NONE),
    CommandDescriptor::new("FilamentControl", &[p!("State", T)]),
    CommandDescriptor::new("FilamentSelect", &[p!("Number", I)]),
    CommandDescriptor::new("FilamentOnTime", &[p!("Time", I)]),
    // Measurement definition
    CommandDescriptor::new(
        "AddAnalog",
        &[
            p!("Name", S),
            p!("StartMass", I),
            p!("EndMass", I),
            p!("PointsPerPeak", I),
            p!("Accuracy", I),
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
        ],
    ),
    CommandDescriptor::new(
        "AddBarchart",
        &[
            p!("Name", S),
            p!("StartMass", I),
            p!("EndMass", I),
            p!("FilterMode", T),
            p!("Accuracy", I),
            p!("EGainIndex", I),
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
        ],
    ),
    CommandDescriptor::new(
        "AddPeakJump",
        &[
            p!("Name", S),
            p!("FilterMode", T),
            p!("Accuracy", I),
            p!("EGainIndex", I),
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
        ],
    ),
    CommandDescriptor::new(
        "AddSinglePeak",
        &[
            p!("Name", S),
            p!("Mass", F),
            p!("Accuracy", I),
            p!("EGainIndex", I),
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
        ],
    ),
    CommandDescriptor::new("MeasurementAccuracy", &[p!("Accuracy", I)]),
    CommandDescriptor::new("MeasurementAddMass", &[p!("Mass", I)]),
    CommandDescriptor::new("MeasurementChangeMass", &[p!("MassIndex", I), p!("NewMass", I)]),
    CommandDescriptor::new("MeasurementDetectorIndex", &[p!("DetectorIndex", I)]),
    CommandDescriptor::new("MeasurementEGainIndex", &[p!("EGainIndex", I)]),
    CommandDescriptor::new("MeasurementFilterMode", &[p!("FilterMode", T)]),
    CommandDescriptor::new("MeasurementMass", &[p!("Mass", F)]),
    CommandDescriptor::new("MeasurementPointsPerPeak", &[p!("PointsPerPeak", I)]),
    CommandDescriptor::new("MeasurementRemoveMass", &[p!("MassIndex", I)]),
    CommandDescriptor::new("MeasurementSourceIndex", &[p!("SourceIndex", I)]),
    CommandDescriptor::new("MeasurementRolloverCorrection", &[p!("UseCorrection", B)]),
    CommandDescriptor::new("MeasurementZeroBeamOff", &[p!("BeamOff", B)]),
    CommandDescriptor::new("MeasurementZeroBufferDepth", &[p!("ZeroBufferDepth", I)]),
    CommandDescriptor::new("MeasurementZeroBufferMode", &[p!("ZeroBufferMode", T)]),
    CommandDescriptor::new("MeasurementZeroReTrigger", NONE),
    CommandDescriptor::new("MeasurementZeroMass", &[p!("ZeroMass", F)]),
    CommandDescriptor::new("MultiplierProtect", &[p!("Protect", B)]),
    CommandDescriptor::new("RunDiagnostics", NONE).layout(Layout::Horizontal).large(),
    // Calibration
    CommandDescriptor::new("TotalPressure", &[p!("Pressure", EU)]),
    CommandDescriptor::new("TotalPressureCalFactor", &[p!("Factor", F)]),
    CommandDescriptor::new("TotalPressureCalDate", &[p!("Date", D)]),
    CommandDescriptor::new(
        "CalibrationOptions",
        &[p!("InletOption", T), p!("DetectorOption", T)],
    ),
    CommandDescriptor::new(
        "DetectorFactor",
        &[
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
            p!("Filament", I),
            p!("Factor", E),
        ],
    ),
    CommandDescriptor::new(
        "DetectorCalDate",
        &[
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
            p!("Filament", I),
            p!("Date", D),
        ],
    ),
    CommandDescriptor::new(
        "DetectorVoltage",
        &[
            p!("SourceIndex", I),
            p!("DetectorIndex", I),
            p!("Filament", I),
            p!("Voltage", I),
        ],
    ),
    CommandDescriptor::new("InletFactor", &[p!("InletIndex", I), p!("Factor", F)]),
    // Scan control
    CommandDescriptor::new("ScanAdd", &[p!("MeasurementName", S)]),
    CommandDescriptor::new("ScanStart", &[p!("NumScans", I)]),
    CommandDescriptor::new("ScanStop", NONE),
    CommandDescriptor::new("ScanResume", &[p!("NumScans", I)]),
    CommandDescriptor::new("ScanRestart", NONE),
    CommandDescriptor::new("MeasurementSelect", &[p!("MeasurementName", S)]),
    CommandDescriptor::new("MeasurementStartMass", &[p!("Mass", I)]),
    CommandDescriptor::new("MeasurementEndMass", &[p!("Mass", I)]),
    CommandDescriptor::new("MeasurementRemoveAll", NONE),
    CommandDescriptor::new("MeasurementRemove", &[p!("MeasurementName", S)]),
    CommandDescriptor::new("FormatWithTab", &[p!("UseTab", B)]),
    // Source tuning
    CommandDescriptor::new("SourceIonEnergy", &[p!("SourceIndex", I), p!("IonEnergy", F)]),
    CommandDescriptor::new("SourceEmission", &[p!("SourceIndex", I), p!("Emission", F)]),
    CommandDescriptor::new("SourceExtract", &[p!("SourceIndex", I), p!("Extract", I)]),
    CommandDescriptor::new(
        "SourceElectronEnergy",
        &[p!("SourceIndex", I), p!("ElectronEnergy", I)],
    ),
    CommandDescriptor::new(
        "SourceLowMassResolution",
        &[p!("SourceIndex", I), p!("LowMassResolution", I)],
    ),
    CommandDescriptor::new(
        "SourceLowMassAlignment",
        &[p!("SourceIndex", I), p!("LowMassAlignment", I)],
    ),
    CommandDescriptor::new(
        "SourceHighMassAlignment",
        &[p!("SourceIndex", I), p!("HighMassAlignment", I)],
    ),
    CommandDescriptor::new(
        "SourceHighMassResolution",
        &[p!("SourceIndex", I), p!("HighMassResolution", I)],
    ),
    // Analog, audio, digital I/O and accessories
    CommandDescriptor::new(
        "AnalogInputAverageCount",
        &[p!("Index", I), p!("NumberToAverage", I)],
    ),
    CommandDescriptor::new("AnalogInputEnable", &[p!("Index", I), p!("Enable", B)]),
    CommandDescriptor::new("AnalogInputInterval", &[p!("Index", I), p!("Interval", I)]),
    CommandDescriptor::new("AnalogOutput", &[p!("Index", I), p!("Value", I)]),
    CommandDescriptor::new("AudioFrequency", &[p!("Frequency", I)]),
    CommandDescriptor::new("AudioMode", &[p!("Mode", T)]),
    CommandDescriptor::new("CirrusCapillaryHeater", &[p!("HeatOn", B)]),
    CommandDescriptor::new("CirrusHeater", &[p!("Mode", T)]),
    CommandDescriptor::new("CirrusPump", &[p!("PumpOn", B)]),
    CommandDescriptor::new("CirrusValvePosition", &[p!("ValvePos", I)]),
    CommandDescriptor::new("DigitalMaxPB67OnTime", &[p!("Time", I)]),
    CommandDescriptor::new("DigitalOutput", &[p!("Port", S), p!("Value", I)]),
    // Pressure-equivalent calibration
    CommandDescriptor::new("PECal_DateMsg", &[p!("Date", D), p!("Message", S)]),
    CommandDescriptor::new("PECal_Flush", NONE),
    CommandDescriptor::new(
        "PECal_Inlet",
        &[p!("Inlet1", F), p!("Inlet2", F), p!("Inlet3", F)],
    ),
    CommandDescriptor::new(
        "PECal_MassMethodContribution",
        &[p!("Mass", I), p!("Method", I), p!("Contribution", F)],
    ),
    CommandDescriptor::new("PECal_Pressures", NONE),
    CommandDescriptor::new("PECal_Select", &[p!("SourceIndex", I), p!("DetectorIndex", I)]),
    CommandDescriptor::new("RolloverScaleFactor", &[p!("Mass", I), p!("Factor", F)]),
    CommandDescriptor::new(
        "RolloverVariables",
        &[p!("M1", I), p!("M2", I), p!("B1", F), p!("B2", F), p!("BP1", F)],
    ),
    // Rapid vent controller
    CommandDescriptor::new("RVCAlarm", &[p!("State", B)]),
    CommandDescriptor::new("RVCCloseAllValves", NONE),
    CommandDescriptor::new("RVCHeater", &[p!("HeaterOn", B)]),
    CommandDescriptor::new("RVCPump", &[p!("PumpOn", B)]),
    CommandDescriptor::new("RVCValveControl", &[p!("Valve", I), p!("Open", B)]),
    CommandDescriptor::new("RVCValveMode", &[p!("Mode", T)]),
    CommandDescriptor::new("SaveChanges", NONE),
    // Degas
    CommandDescriptor::new(
        "StartDegas",
        &[
            p!("StartPower", I),
            p!("EndPower", I),
            p!("RampPeriod", I),
            p!("MaxPowerPeriod", I),
            p!("ResettlePeriod", I),
        ],
    ),
    CommandDescriptor::new("StopDegas", NONE),
];

/// Looks up a command by its wire name.
pub fn descriptor(name: &str) -> Option<&'static CommandDescriptor> {
    CATALOG.iter().find(|d| d.name == name)
}

// =============================================================================
// Arguments
// =============================================================================

/// One rendered-on-demand argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Integer.
    Int(i64),
    /// Fixed notation float.
    Fixed(f64),
    /// Scientific notation float, lower-case exponent.
    Scientific(f64),
    /// Scientific notation float, upper-case exponent.
    ScientificUpper(f64),
    /// Boolean word.
    Bool(bool),
    /// Enumerated literal.
    Token(&'static str),
    /// Free text.
    Text(String),
    /// Timestamp.
    Timestamp(NaiveDateTime),
}

impl Arg {
    /// Parameter kind this value renders as.
    pub fn kind(&self) -> ParamKind {
        match self {
            Arg::Int(_) => ParamKind::Int,
            Arg::Fixed(_) => ParamKind::Fixed,
            Arg::Scientific(_) => ParamKind::Scientific,
            Arg::ScientificUpper(_) => ParamKind::ScientificUpper,
            Arg::Bool(_) => ParamKind::Bool,
            Arg::Token(_) => ParamKind::Token,
            Arg::Text(_) => ParamKind::Text,
            Arg::Timestamp(_) => ParamKind::Timestamp,
        }
    }

    /// Wire text of the argument.
    pub fn render(&self) -> String {
        match self {
            Arg::Int(v) => v.to_string(),
            Arg::Fixed(v) => format!("{v:.6}"),
            Arg::Scientific(v) => scientific(*v, 'e'),
            Arg::ScientificUpper(v) => scientific(*v, 'E'),
            Arg::Bool(v) => bool_word(*v).to_string(),
            Arg::Token(v) => (*v).to_string(),
            Arg::Text(v) => quote_text(v),
            Arg::Timestamp(v) => v.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Six-digit mantissa, explicit exponent sign, at least two exponent digits.
fn scientific(value: f64, marker: char) -> String {
    let formatted = format!("{value:.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}{marker}{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

fn quote_text(text: &str) -> String {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        format!("\"{text}\"")
    } else {
        text.to_string()
    }
}

// =============================================================================
// Typed commands
// =============================================================================

/// A fully typed command ready to be encoded.
///
/// Variant names are the wire command names and field order is the argument
/// order listed in [`CATALOG`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Sensors,
    Select(String),
    SensorState,
    Info,
    EGains,
    InletInfo,
    RfInfo,
    MultiplierInfo,
    SourceInfo,
    DetectorInfo(i64),
    FilamentInfo,
    TotalPressureInfo,
    AnalogInputInfo,
    AnalogOutputInfo,
    DigitalInfo,
    RolloverInfo,
    RvcInfo,
    CirrusInfo,
    PeCalInfo {
        source_index: i64,
        detector_index: i64,
    },

    Control {
        app_name: String,
        version: String,
    },
    Release,
    FilamentControl(OnOff),
    FilamentSelect(i64),
    FilamentOnTime(i64),

    AddAnalog {
        name: String,
        start_mass: i64,
        end_mass: i64,
        points_per_peak: i64,
        accuracy: i64,
        source_index: i64,
        detector_index: i64,
    },
    AddBarchart {
        name: String,
        start_mass: i64,
        end_mass: i64,
        filter_mode: FilterMode,
        accuracy: i64,
        egain_index: i64,
        source_index: i64,
        detector_index: i64,
    },
    AddPeakJump {
        name: String,
        filter_mode: FilterMode,
        accuracy: i64,
        egain_index: i64,
        source_index: i64,
        detector_index: i64,
    },
    AddSinglePeak {
        name: String,
        mass: f64,
        accuracy: i64,
        egain_index: i64,
        source_index: i64,
        detector_index: i64,
    },
    MeasurementAccuracy(i64),
    MeasurementAddMass(i64),
    MeasurementChangeMass {
        mass_index: i64,
        new_mass: i64,
    },
    MeasurementDetectorIndex(i64),
    MeasurementEGainIndex(i64),
    MeasurementFilterMode(FilterMode),
    MeasurementMass(f64),
    MeasurementPointsPerPeak(i64),
    MeasurementRemoveMass(i64),
    MeasurementSourceIndex(i64),
    MeasurementRolloverCorrection(bool),
    MeasurementZeroBeamOff(bool),
    MeasurementZeroBufferDepth(i64),
    MeasurementZeroBufferMode(ZeroBufferMode),
    MeasurementZeroReTrigger,
    MeasurementZeroMass(f64),
    MultiplierProtect(bool),
    RunDiagnostics,

    /// Sets the external total pressure reading (`TotalPressure` on the wire).
    SetTotalPressure(f64),
    TotalPressureCalFactor(f64),
    TotalPressureCalDate(NaiveDateTime),
    CalibrationOptions {
        inlet: CalibrationOption,
        detector: CalibrationOption,
    },
    DetectorFactor {
        source_index: i64,
        detector_index: i64,
        filament: i64,
        factor: f64,
    },
    DetectorCalDate {
        source_index: i64,
        detector_index: i64,
        filament: i64,
        date: NaiveDateTime,
    },
    DetectorVoltage {
        source_index: i64,
        detector_index: i64,
        filament: i64,
        voltage: i64,
    },
    InletFactor {
        inlet_index: i64,
        factor: f64,
    },

    ScanAdd(String),
    ScanStart(i64),
    ScanStop,
    ScanResume(i64),
    ScanRestart,
    MeasurementSelect(String),
    MeasurementStartMass(i64),
    MeasurementEndMass(i64),
    MeasurementRemoveAll,
    MeasurementRemove(String),
    FormatWithTab(bool),

    SourceIonEnergy {
        source_index: i64,
        ion_energy: f64,
    },
    SourceEmission {
        source_index: i64,
        emission: f64,
    },
    SourceExtract {
        source_index: i64,
        extract: i64,
    },
    SourceElectronEnergy {
        source_index: i64,
        electron_energy: i64,
    },
    SourceLowMassResolution {
        source_index: i64,
        resolution: i64,
    },
    SourceLowMassAlignment {
        source_index: i64,
        alignment: i64,
    },
    SourceHighMassAlignment {
        source_index: i64,
        alignment: i64,
    },
    SourceHighMassResolution {
        source_index: i64,
        resolution: i64,
    },

    AnalogInputAverageCount {
        index: i64,
        count: i64,
    },
    AnalogInputEnable {
        index: i64,
        enable: bool,
    },
    AnalogInputInterval {
        index: i64,
        interval: i64,
    },
    AnalogOutput {
        index: i64,
        value: i64,
    },
    AudioFrequency(i64),
    AudioMode(AudioMode),
    CirrusCapillaryHeater(bool),
    CirrusHeater(CirrusHeaterMode),
    CirrusPump(bool),
    CirrusValvePosition(i64),
    DigitalMaxPB67OnTime(i64),
    DigitalOutput {
        port: String,
        value: i64,
    },

    PeCalDateMsg {
        date: NaiveDateTime,
        message: String,
    },
    PeCalFlush,
    PeCalInlet {
        inlet1: f64,
        inlet2: f64,
        inlet3: f64,
    },
    PeCalMassMethodContribution {
        mass: i64,
        method: i64,
        contribution: f64,
    },
    PeCalPressures,
    PeCalSelect {
        source_index: i64,
        detector_index: i64,
    },
    RolloverScaleFactor {
        mass: i64,
        factor: f64,
    },
    RolloverVariables {
        m1: i64,
        m2: i64,
        b1: f64,
        b2: f64,
        bp1: f64,
    },

    RvcAlarm(bool),
    RvcCloseAllValves,
    RvcHeater(bool),
    RvcPump(bool),
    RvcValveControl {
        valve: i64,
        open: bool,
    },
    RvcValveMode(RvcValveMode),
    SaveChanges,

    StartDegas {
        start_power: i64,
        end_power: i64,
        ramp_period: i64,
        max_power_period: i64,
        resettle_period: i64,
    },
    StopDegas,
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        use Command::*;
        match self {
            Sensors => "Sensors",
            Select(_) => "Select",
            SensorState => "SensorState",
            Info => "Info",
            EGains => "EGains",
            InletInfo => "InletInfo",
            RfInfo => "RFInfo",
            MultiplierInfo => "MultiplierInfo",
            SourceInfo => "SourceInfo",
            DetectorInfo(_) => "DetectorInfo",
            FilamentInfo => "FilamentInfo",
            TotalPressureInfo => "TotalPressureInfo",
            AnalogInputInfo => "AnalogInputInfo",
            AnalogOutputInfo => "AnalogOutputInfo",
            DigitalInfo => "DigitalInfo",
            RolloverInfo => "RolloverInfo",
            RvcInfo => "RVCInfo",
            CirrusInfo => "CirrusInfo",
            PeCalInfo { .. } => "PECal_Info",
            Control { .. } => "Control",
            Release => "Release",
            FilamentControl(_) => "FilamentControl",
            FilamentSelect(_) => "FilamentSelect",
            FilamentOnTime(_) => "FilamentOnTime",
            AddAnalog { .. } => "AddAnalog",
            AddBarchart { .. } => "AddBarchart",
            AddPeakJump { .. } => "AddPeakJump",
            AddSinglePeak { .. } => "AddSinglePeak",
            MeasurementAccuracy(_) => "MeasurementAccuracy",
            MeasurementAddMass(_) => "MeasurementAddMass",
            MeasurementChangeMass { .. } => "MeasurementChangeMass",
            MeasurementDetectorIndex(_) => "MeasurementDetectorIndex",
            MeasurementEGainIndex(_) => "MeasurementEGainIndex",
            MeasurementFilterMode(_) => "MeasurementFilterMode",
            MeasurementMass(_) => "MeasurementMass",
            MeasurementPointsPerPeak(_) => "MeasurementPointsPerPeak",
            MeasurementRemoveMass(_) => "MeasurementRemoveMass",
            MeasurementSourceIndex(_) => "MeasurementSourceIndex",
            MeasurementRolloverCorrection(_) => "MeasurementRolloverCorrection",
            MeasurementZeroBeamOff(_) => "MeasurementZeroBeamOff",
            MeasurementZeroBufferDepth(_) => "MeasurementZeroBufferDepth",
            MeasurementZeroBufferMode(_) => "MeasurementZeroBufferMode",
            MeasurementZeroReTrigger => "MeasurementZeroReTrigger",
            MeasurementZeroMass(_) => "MeasurementZeroMass",
            MultiplierProtect(_) => "MultiplierProtect",
            RunDiagnostics => "RunDiagnostics",
            SetTotalPressure(_) => "TotalPressure",
            TotalPressureCalFactor(_) => "TotalPressureCalFactor",
            TotalPressureCalDate(_) => "TotalPressureCalDate",
            CalibrationOptions { .. } => "CalibrationOptions",
            DetectorFactor { .. } => "DetectorFactor",
            DetectorCalDate { .. } => "DetectorCalDate",
            DetectorVoltage { .. } => "DetectorVoltage",
            InletFactor { .. } => "InletFactor",
            ScanAdd(_) => "ScanAdd",
            ScanStart(_) => "ScanStart",
            ScanStop => "ScanStop",
            ScanResume(_) => "ScanResume",
            ScanRestart => "ScanRestart",
            MeasurementSelect(_) => "MeasurementSelect",
            MeasurementStartMass(_) => "MeasurementStartMass",
            MeasurementEndMass(_) => "MeasurementEndMass",
            MeasurementRemoveAll => "MeasurementRemoveAll",
            MeasurementRemove(_) => "MeasurementRemove",
            FormatWithTab(_) => "FormatWithTab",
            SourceIonEnergy { .. } => "SourceIonEnergy",
            SourceEmission { .. } => "SourceEmission",
            SourceExtract { .. } => "SourceExtract",
            SourceElectronEnergy { .. } => "SourceElectronEnergy",
            SourceLowMassResolution { .. } => "SourceLowMassResolution",
            SourceLowMassAlignment { .. } => "SourceLowMassAlignment",
            SourceHighMassAlignment { .. } => "SourceHighMassAlignment",
            SourceHighMassResolution { .. } => "SourceHighMassResolution",
            AnalogInputAverageCount { .. } => "AnalogInputAverageCount",
            AnalogInputEnable { .. } => "AnalogInputEnable",
            AnalogInputInterval { .. } => "AnalogInputInterval",
            AnalogOutput { .. } => "AnalogOutput",
            AudioFrequency(_) => "AudioFrequency",
            AudioMode(_) => "AudioMode",
            CirrusCapillaryHeater(_) => "CirrusCapillaryHeater",
            CirrusHeater(_) => "CirrusHeater",
            CirrusPump(_) => "CirrusPump",
            CirrusValvePosition(_) => "CirrusValvePosition",
            DigitalMaxPB67OnTime(_) => "DigitalMaxPB67OnTime",
            DigitalOutput { .. } => "DigitalOutput",
            PeCalDateMsg { .. } => "PECal_DateMsg",
            PeCalFlush => "PECal_Flush",
            PeCalInlet { .. } => "PECal_Inlet",
            PeCalMassMethodContribution { .. } => "PECal_MassMethodContribution",
            PeCalPressures => "PECal_Pressures",
            PeCalSelect { .. } => "PECal_Select",
            RolloverScaleFactor { .. } => "RolloverScaleFactor",
            RolloverVariables { .. } => "RolloverVariables",
            RvcAlarm(_) => "RVCAlarm",
            RvcCloseAllValves => "RVCCloseAllValves",
            RvcHeater(_) => "RVCHeater",
            RvcPump(_) => "RVCPump",
            RvcValveControl { .. } => "RVCValveControl",
            RvcValveMode(_) => "RVCValveMode",
            SaveChanges => "SaveChanges",
            StartDegas { .. } => "StartDegas",
            StopDegas => "StopDegas",
        }
    }

    /// Positional arguments in wire order.
    pub fn args(&self) -> Vec<Arg> {
        use Command::*;
        let text = |s: &String| Arg::Text(s.clone());
        match self {
            Sensors | SensorState | Info | EGains | InletInfo | RfInfo | MultiplierInfo
            | SourceInfo | FilamentInfo | TotalPressureInfo | AnalogInputInfo
            | AnalogOutputInfo | DigitalInfo | RolloverInfo | RvcInfo | CirrusInfo | Release
            | MeasurementZeroReTrigger | RunDiagnostics | ScanStop | ScanRestart
            | MeasurementRemoveAll | PeCalFlush | PeCalPressures | RvcCloseAllValves
            | SaveChanges | StopDegas => Vec::new(),

            Select(s) | ScanAdd(s) | MeasurementSelect(s) | MeasurementRemove(s) => vec![text(s)],

            DetectorInfo(v) | FilamentSelect(v) | FilamentOnTime(v) | MeasurementAccuracy(v)
            | MeasurementAddMass(v) | MeasurementDetectorIndex(v) | MeasurementEGainIndex(v)
            | MeasurementPointsPerPeak(v) | MeasurementRemoveMass(v)
            | MeasurementSourceIndex(v) | MeasurementZeroBufferDepth(v) | ScanStart(v)
            | ScanResume(v) | MeasurementStartMass(v) | MeasurementEndMass(v)
            | AudioFrequency(v) | CirrusValvePosition(v) | DigitalMaxPB67OnTime(v) => {
                vec![Arg::Int(*v)]
            }

            MeasurementRolloverCorrection(v) | MeasurementZeroBeamOff(v) | MultiplierProtect(v)
            | FormatWithTab(v) | CirrusCapillaryHeater(v) | CirrusPump(v) | RvcAlarm(v)
            | RvcHeater(v) | RvcPump(v) => vec![Arg::Bool(*v)],

            MeasurementMass(v) | MeasurementZeroMass(v) | TotalPressureCalFactor(v) => {
                vec![Arg::Fixed(*v)]
            }

            PeCalInfo {
                source_index,
                detector_index,
            }
            | PeCalSelect {
                source_index,
                detector_index,
            } => vec![Arg::Int(*source_index), Arg::Int(*detector_index)],

            Control { app_name, version } => vec![text(app_name), text(version)],
            FilamentControl(state) => vec![Arg::Token(state.as_str())],

            AddAnalog {
                name,
                start_mass,
                end_mass,
                points_per_peak,
                accuracy,
                source_index,
                detector_index,
            } => vec![
                text(name),
                Arg::Int(*start_mass),
                Arg::Int(*end_mass),
                Arg::Int(*points_per_peak),
                Arg::Int(*accuracy),
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
            ],
            AddBarchart {
                name,
                start_mass,
                end_mass,
                filter_mode,
                accuracy,
                egain_index,
                source_index,
                detector_index,
            } => vec![
                text(name),
                Arg::Int(*start_mass),
                Arg::Int(*end_mass),
                Arg::Token(filter_mode.as_str()),
                Arg::Int(*accuracy),
                Arg::Int(*egain_index),
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
            ],
            AddPeakJump {
                name,
                filter_mode,
                accuracy,
                egain_index,
                source_index,
                detector_index,
            } => vec![
                text(name),
                Arg::Token(filter_mode.as_str()),
                Arg::Int(*accuracy),
                Arg::Int(*egain_index),
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
            ],
            AddSinglePeak {
                name,
                mass,
                accuracy,
                egain_index,
                source_index,
                detector_index,
            } => vec![
                text(name),
                Arg::Fixed(*mass),
                Arg::Int(*accuracy),
                Arg::Int(*egain_index),
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
            ],
            MeasurementChangeMass {
                mass_index,
                new_mass,
            } => vec![Arg::Int(*mass_index), Arg::Int(*new_mass)],
            MeasurementFilterMode(mode) => vec![Arg::Token(mode.as_str())],
            MeasurementZeroBufferMode(mode) => vec![Arg::Token(mode.as_str())],

            SetTotalPressure(pressure) => vec![Arg::ScientificUpper(*pressure)],
            TotalPressureCalDate(date) => vec![Arg::Timestamp(*date)],
            CalibrationOptions { inlet, detector } => {
                vec![Arg::Token(inlet.as_str()), Arg::Token(detector.as_str())]
            }
            DetectorFactor {
                source_index,
                detector_index,
                filament,
                factor,
            } => vec![
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
                Arg::Int(*filament),
                Arg::Scientific(*factor),
            ],
            DetectorCalDate {
                source_index,
                detector_index,
                filament,
                date,
            } => vec![
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
                Arg::Int(*filament),
                Arg::Timestamp(*date),
            ],
            DetectorVoltage {
                source_index,
                detector_index,
                filament,
                voltage,
            } => vec![
                Arg::Int(*source_index),
                Arg::Int(*detector_index),
                Arg::Int(*filament),
                Arg::Int(*voltage),
            ],
            InletFactor {
                inlet_index,
                factor,
            } => vec![Arg::Int(*inlet_index), Arg::Fixed(*factor)],

            SourceIonEnergy {
                source_index,
                ion_energy: value,
            }
            | SourceEmission {
                source_index,
                emission: value,
            } => vec![Arg::Int(*source_index), Arg::Fixed(*value)],
            SourceExtract {
                source_index,
                extract: value,
            }
            | SourceElectronEnergy {
                source_index,
                electron_energy: value,
            }
            | SourceLowMassResolution {
                source_index,
                resolution: value,
            }
            | SourceLowMassAlignment {
                source_index,
                alignment: value,
            }
            | SourceHighMassAlignment {
                source_index,
                alignment: value,
            }
            | SourceHighMassResolution {
                source_index,
                resolution: value,
            } => vec![Arg::Int(*source_index), Arg::Int(*value)],

            AnalogInputAverageCount { index, count: value }
            | AnalogInputInterval {
                index,
                interval: value,
            }
            | AnalogOutput { index, value } => vec![Arg::Int(*index), Arg::Int(*value)],
            AnalogInputEnable { index, enable } => vec![Arg::Int(*index), Arg::Bool(*enable)],
            AudioMode(mode) => vec![Arg::Token(mode.as_str())],
            CirrusHeater(mode) => vec![Arg::Token(mode.as_str())],
            DigitalOutput { port, value } => vec![text(port), Arg::Int(*value)],

            PeCalDateMsg { date, message } => vec![Arg::Timestamp(*date), text(message)],
            PeCalInlet {
                inlet1,
                inlet2,
                inlet3,
            } => vec![Arg::Fixed(*inlet1), Arg::Fixed(*inlet2), Arg::Fixed(*inlet3)],
            PeCalMassMethodContribution {
                mass,
                method,
                contribution,
            } => vec![Arg::Int(*mass), Arg::Int(*method), Arg::Fixed(*contribution)],
            RolloverScaleFactor { mass, factor } => vec![Arg::Int(*mass), Arg::Fixed(*factor)],
            RolloverVariables { m1, m2, b1, b2, bp1 } => vec![
                Arg::Int(*m1),
                Arg::Int(*m2),
                Arg::Fixed(*b1),
                Arg::Fixed(*b2),
                Arg::Fixed(*bp1),
            ],

            RvcValveControl { valve, open } => vec![Arg::Int(*valve), Arg::Bool(*open)],
            RvcValveMode(mode) => vec![Arg::Token(mode.as_str())],

            StartDegas {
                start_power,
                end_power,
                ramp_period,
                max_power_period,
                resettle_period,
            } => vec![
                Arg::Int(*start_power),
                Arg::Int(*end_power),
                Arg::Int(*ramp_period),
                Arg::Int(*max_power_period),
                Arg::Int(*resettle_period),
            ],
        }
    }

    /// Catalog entry for this command.
    pub fn descriptor(&self) -> Option<&'static CommandDescriptor> {
        descriptor(self.name())
    }

    /// Reply layout; falls back to vertical for names missing from the catalog.
    pub fn layout(&self) -> Layout {
        self.descriptor().map_or(Layout::Vertical, |d| d.layout)
    }

    /// Receive buffer tier for the reply.
    pub fn buffer_tier(&self) -> BufferTier {
        self.descriptor().map_or(BufferTier::Standard, |d| d.tier)
    }

    /// Full wire line including the command suffix.
    pub fn encode(&self) -> String {
        let args: Vec<String> = self.args().iter().map(Arg::render).collect();
        encode_command(self.name(), &args)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        for arg in self.args() {
            write!(f, " {}", arg.render())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    /// One instance of every command, used to cross-check the catalog.
    fn every_command() -> Vec<Command> {
        use Command::*;
        let date = ts(2024, 3, 5, 9, 7, 2);
        vec![
            Sensors,
            Select("LM70-00197021".into()),
            SensorState,
            Info,
            EGains,
            InletInfo,
            RfInfo,
            MultiplierInfo,
            SourceInfo,
            DetectorInfo(0),
            FilamentInfo,
            TotalPressureInfo,
            AnalogInputInfo,
            AnalogOutputInfo,
            DigitalInfo,
            RolloverInfo,
            RvcInfo,
            CirrusInfo,
            PeCalInfo {
                source_index: 0,
                detector_index: 1,
            },
            Control {
                app_name: "Recorder".into(),
                version: "1.0".into(),
            },
            Release,
            FilamentControl(OnOff::On),
            FilamentSelect(1),
            FilamentOnTime(60),
            AddAnalog {
                name: "An1".into(),
                start_mass: 1,
                end_mass: 50,
                points_per_peak: 8,
                accuracy: 5,
                source_index: 0,
                detector_index: 0,
            },
            AddBarchart {
                name: "Bar1".into(),
                start_mass: 1,
                end_mass: 200,
                filter_mode: FilterMode::PeakCenter,
                accuracy: 5,
                egain_index: 0,
                source_index: 0,
                detector_index: 0,
            },
            AddPeakJump {
                name: "PJ1".into(),
                filter_mode: FilterMode::PeakMax,
                accuracy: 5,
                egain_index: 0,
                source_index: 0,
                detector_index: 0,
            },
            AddSinglePeak {
                name: "SP1".into(),
                mass: 28.0,
                accuracy: 5,
                egain_index: 0,
                source_index: 0,
                detector_index: 0,
            },
            MeasurementAccuracy(5),
            MeasurementAddMass(18),
            MeasurementChangeMass {
                mass_index: 0,
                new_mass: 44,
            },
            MeasurementDetectorIndex(1),
            MeasurementEGainIndex(0),
            MeasurementFilterMode(FilterMode::PeakAverage),
            MeasurementMass(28.5),
            MeasurementPointsPerPeak(16),
            MeasurementRemoveMass(2),
            MeasurementSourceIndex(0),
            MeasurementRolloverCorrection(true),
            MeasurementZeroBeamOff(false),
            MeasurementZeroBufferDepth(4),
            MeasurementZeroBufferMode(ZeroBufferMode::SingleShot),
            MeasurementZeroReTrigger,
            MeasurementZeroMass(5.5),
            MultiplierProtect(true),
            RunDiagnostics,
            SetTotalPressure(1.0e-4),
            TotalPressureCalFactor(1.25),
            TotalPressureCalDate(date),
            CalibrationOptions {
                inlet: CalibrationOption::Default,
                detector: CalibrationOption::Current,
            },
            DetectorFactor {
                source_index: 0,
                detector_index: 0,
                filament: 1,
                factor: 1.5e-6,
            },
            DetectorCalDate {
                source_index: 0,
                detector_index: 0,
                filament: 1,
                date,
            },
            DetectorVoltage {
                source_index: 0,
                detector_index: 1,
                filament: 1,
                voltage: 1200,
            },
            InletFactor {
                inlet_index: 0,
                factor: 0.8,
            },
            ScanAdd("Bar1".into()),
            ScanStart(1),
            ScanStop,
            ScanResume(1),
            ScanRestart,
            MeasurementSelect("Bar1".into()),
            MeasurementStartMass(1),
            MeasurementEndMass(100),
            MeasurementRemoveAll,
            MeasurementRemove("Bar1".into()),
            FormatWithTab(false),
            SourceIonEnergy {
                source_index: 0,
                ion_energy: 5.5,
            },
            SourceEmission {
                source_index: 0,
                emission: 1.0,
            },
            SourceExtract {
                source_index: 0,
                extract: -112,
            },
            SourceElectronEnergy {
                source_index: 0,
                electron_energy: 70,
            },
            SourceLowMassResolution {
                source_index: 0,
                resolution: 32767,
            },
            SourceLowMassAlignment {
                source_index: 0,
                alignment: 32767,
            },
            SourceHighMassAlignment {
                source_index: 0,
                alignment: 32767,
            },
            SourceHighMassResolution {
                source_index: 0,
                resolution: 32767,
            },
            AnalogInputAverageCount { index: 0, count: 4 },
            AnalogInputEnable {
                index: 0,
                enable: true,
            },
            AnalogInputInterval {
                index: 0,
                interval: 1000,
            },
            AnalogOutput { index: 1, value: 5 },
            AudioFrequency(440),
            AudioMode(super::AudioMode::Automatic),
            CirrusCapillaryHeater(true),
            CirrusHeater(CirrusHeaterMode::Bake),
            CirrusPump(false),
            CirrusValvePosition(2),
            DigitalMaxPB67OnTime(30),
            DigitalOutput {
                port: "A".into(),
                value: 255,
            },
            PeCalDateMsg {
                date,
                message: "annual check".into(),
            },
            PeCalFlush,
            PeCalInlet {
                inlet1: 1.0,
                inlet2: 2.0,
                inlet3: 3.0,
            },
            PeCalMassMethodContribution {
                mass: 28,
                method: 1,
                contribution: 0.5,
            },
            PeCalPressures,
            PeCalSelect {
                source_index: 0,
                detector_index: 0,
            },
            RolloverScaleFactor {
                mass: 4,
                factor: 1.1,
            },
            RolloverVariables {
                m1: 1,
                m2: 2,
                b1: 0.1,
                b2: 0.2,
                bp1: 0.3,
            },
            RvcAlarm(true),
            RvcCloseAllValves,
            RvcHeater(false),
            RvcPump(true),
            RvcValveControl {
                valve: 2,
                open: true,
            },
            RvcValveMode(super::RvcValveMode::Automatic),
            SaveChanges,
            StartDegas {
                start_power: 10,
                end_power: 50,
                ramp_period: 60,
                max_power_period: 120,
                resettle_period: 30,
            },
            StopDegas,
        ]
    }

    #[test]
    fn catalog_names_are_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn every_command_matches_its_descriptor() {
        let commands = every_command();
        assert_eq!(commands.len(), CATALOG.len());

        for command in commands {
            let desc = command
                .descriptor()
                .unwrap_or_else(|| panic!("{} missing from catalog", command.name()));
            let kinds: Vec<_> = command.args().iter().map(Arg::kind).collect();
            let expected: Vec<_> = desc.params.iter().map(|p| p.kind).collect();
            assert_eq!(kinds, expected, "parameter mismatch for {}", desc.name);
        }
    }

    #[test]
    fn encodes_barchart_definition() {
        let cmd = Command::AddBarchart {
            name: "Bar1".into(),
            start_mass: 1,
            end_mass: 200,
            filter_mode: FilterMode::PeakCenter,
            accuracy: 5,
            egain_index: 0,
            source_index: 0,
            detector_index: 0,
        };
        assert_eq!(cmd.encode(), "AddBarchart Bar1 1 200 PeakCenter 5 0 0 0\n\r");
        assert_eq!(cmd.to_string(), "AddBarchart Bar1 1 200 PeakCenter 5 0 0 0");
    }

    #[test]
    fn analog_definition_has_no_egain_index() {
        let cmd = Command::AddAnalog {
            name: "An1".into(),
            start_mass: 1,
            end_mass: 50,
            points_per_peak: 8,
            accuracy: 5,
            source_index: 0,
            detector_index: 1,
        };
        assert_eq!(cmd.encode(), "AddAnalog An1 1 50 8 5 0 1\n\r");
        assert_eq!(cmd.descriptor().map(|d| d.params.len()), Some(7));
    }

    #[test]
    fn float_notation_is_per_command() {
        assert_eq!(
            Command::SetTotalPressure(1.0e-4).encode(),
            "TotalPressure 1.000000E-04\n\r"
        );
        assert_eq!(
            Command::TotalPressureCalFactor(1.5).encode(),
            "TotalPressureCalFactor 1.500000\n\r"
        );
        assert_eq!(
            Command::DetectorFactor {
                source_index: 0,
                detector_index: 1,
                filament: 1,
                factor: 1.5e-6,
            }
            .encode(),
            "DetectorFactor 0 1 1 1.500000e-06\n\r"
        );
    }

    #[test]
    fn scientific_exponents() {
        assert_eq!(scientific(0.0, 'e'), "0.000000e+00");
        assert_eq!(scientific(12345.678, 'E'), "1.234568E+04");
        assert_eq!(scientific(-2.5e-120, 'e'), "-2.500000e-120");
    }

    #[test]
    fn booleans_render_capitalized() {
        assert_eq!(
            Command::RvcValveControl {
                valve: 3,
                open: false
            }
            .encode(),
            "RVCValveControl 3 False\n\r"
        );
        assert_eq!(
            Command::MultiplierProtect(true).encode(),
            "MultiplierProtect True\n\r"
        );
    }

    #[test]
    fn timestamps_are_zero_padded() {
        let date = ts(2024, 3, 5, 9, 7, 2);
        assert_eq!(
            Command::TotalPressureCalDate(date).encode(),
            "TotalPressureCalDate 2024-03-05_09:07:02\n\r"
        );
        assert_eq!(
            Command::PeCalDateMsg {
                date,
                message: "annual check".into()
            }
            .encode(),
            "PECal_DateMsg 2024-03-05_09:07:02 \"annual check\"\n\r"
        );
    }

    #[test]
    fn argumentless_commands_are_bare() {
        assert_eq!(Command::Sensors.encode(), "Sensors\n\r");
        assert_eq!(Command::Release.encode(), "Release\n\r");
    }

    #[test]
    fn layouts_and_tiers() {
        assert_eq!(Command::Sensors.layout(), Layout::Horizontal);
        assert_eq!(Command::Sensors.buffer_tier(), BufferTier::Large);
        assert_eq!(Command::EGains.layout(), Layout::VerticalOnePerLine);
        assert_eq!(Command::DetectorInfo(0).layout(), Layout::Composite);
        assert_eq!(Command::SensorState.layout(), Layout::Vertical);
        assert_eq!(Command::SensorState.buffer_tier(), BufferTier::Standard);
    }

    #[test]
    fn enum_tokens_parse_case_insensitively() {
        assert_eq!("peakcenter".parse::<FilterMode>(), Ok(FilterMode::PeakCenter));
        assert_eq!("Bake".parse::<CirrusHeaterMode>(), Ok(CirrusHeaterMode::Bake));
        assert!("Sideways".parse::<OnOff>().is_err());
        assert_eq!(ZeroBufferMode::ALL.len(), 4);
    }
}
