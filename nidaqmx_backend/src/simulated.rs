//! In-process [`Interpreter`] backed by deterministic simulated devices.
//!
//! ## Model
//!
//! Every simulated device exposes numbered analog inputs and outputs, 8-line digital ports and
//! counters. Acquired data is a pure function of the channel and the absolute sample index `k`
//! counted from the task start:
//!
//! | Channel | Sample `k` |
//! |---|---|
//! | AI voltage `…/aiN` | `N + 1` volts (unscaled code `round(volts × 1000)`, saturated) |
//! | AI power | `(voltage_setpoint, current_setpoint)` |
//! | DI line `L` | bit `L` of `k mod 256` |
//! | CI count edges | `initial_count ± k` |
//! | CI frequency / pulse | the 100 kHz internal timebase: 100 000 Hz, duty 0.5, 5 µs high, 5 µs low, 50/50 ticks |
//!
//! Finite tasks hold `samps_per_chan` samples per channel, all available as soon as the task
//! starts; reading past the end fails with a timeout carrying the samples transferred, unless the
//! timeout is `0`. Continuous tasks never run dry. The start time of a read is the task start time
//! plus `position / rate`.
//!
//! Writes are accepted in full and appended to a per-channel output record that tests can inspect
//! with [`SimulatedInterpreter::written_samples`].
//!
//! Attributes follow the driver's rules: each has a default, `set` overrides it (rejected while
//! the task runs, except for read and write stream attributes), `reset` restores the default.

use chrono::Utc;
use maplit::hashmap;
use niwaveform_backend::{
    lines_to_port, split_names, timestamp_to_ticks, PropertyValue, CHANNEL_NAME, LINE_NAMES, UNIT_DESCRIPTION,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::attributes::{buffer, channel, device, exported_signal, physical_channel, read, system, task as task_attr, timing, trigger, write};
use crate::constants::*;
use crate::error::{DaqError, DaqWarning, ErrorCode, Result};
use crate::interpreter::*;
use crate::utils::unflatten_channel_string;

const TIMEBASE_FREQUENCY: f64 = 100_000.0;
const TIMEBASE_TICKS_PER_HALF_PERIOD: u32 = 50;
const TICK_RATE: f64 = 10_000_000.0;
const CODES_PER_VOLT: f64 = 1000.0;
const LINES_PER_PORT: u32 = 8;
const PATTERN_PERIOD: u64 = 256;
const VOLTAGE_MEASUREMENT: i32 = 10322;

const NO_CHANNELS: i32 = -200478;
const NOT_RUNNING_AND_NO_AUTO_START: i32 = -200473;
const TASK_ALREADY_RUNNING: i32 = -200479;
const CHANNEL_TYPE_MISMATCH: i32 = -200525;
const SINGLE_CHANNEL_REQUIRED: i32 = -200523;
const INVALID_PHYSICAL_CHANNEL: i32 = -200170;
const CHANNEL_NOT_IN_TASK: i32 = -200486;
const DUPLICATE_CHANNEL: i32 = -200489;
const ROUTE_IN_USE: i32 = -89137;
const FINITE_STOPPED_EARLY: i32 = 200010;

static AI_CHANNEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<dev>[^/]+)/ai(?P<n>\d+)$").expect("ai pattern compiles"));
static AO_CHANNEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<dev>[^/]+)/ao(?P<n>\d+)$").expect("ao pattern compiles"));
static POWER_CHANNEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<dev>[^/]+)/(?:ai|power)(?P<n>\d*)$").expect("power pattern compiles"));
static COUNTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<dev>[^/]+)/ctr(?P<n>\d+)$").expect("counter pattern compiles"));
static DIGITAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<dev>[^/]+)/port(?P<port>\d+)(?:/line(?P<line>\d+))?$").expect("digital pattern compiles")
});

/// A device known to the simulated driver.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatedDevice {
    pub name: String,
    pub product_type: String,
    pub serial_number: u32,
    pub ai_channels: u32,
    pub ao_channels: u32,
    pub ports: u32,
    pub counters: u32,
    pub trigger_usage: TriggerUsage,
}

impl SimulatedDevice {
    pub fn new(name: &str) -> Self {
        let serial_number = name.bytes().fold(0x01A2_0000u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        Self {
            name: name.to_string(),
            product_type: "PCIe-6363".to_string(),
            serial_number,
            ai_channels: 32,
            ao_channels: 4,
            ports: 3,
            counters: 4,
            trigger_usage: TriggerUsage::ADVANCE
                | TriggerUsage::PAUSE
                | TriggerUsage::REFERENCE
                | TriggerUsage::START
                | TriggerUsage::HANDSHAKE
                | TriggerUsage::ARM_START,
        }
    }

    fn numbered(&self, kind: &str, count: u32) -> Vec<String> {
        (0..count).map(|n| format!("{}/{}{}", self.name, kind, n)).collect()
    }

    fn lines(&self) -> Vec<String> {
        (0..self.ports)
            .flat_map(|port| (0..LINES_PER_PORT).map(move |line| (port, line)))
            .map(|(port, line)| format!("{}/port{}/line{}", self.name, port, line))
            .collect()
    }

    fn value(&self, id: i32) -> Option<SimValue> {
        let value = match id {
            id if id == device::PRODUCT_TYPE.id => SimValue::Str(self.product_type.clone()),
            id if id == device::SERIAL_NUM.id => SimValue::U32(self.serial_number),
            id if id == device::IS_SIMULATED.id => SimValue::Bool(true),
            id if id == device::AI_PHYSICAL_CHANS.id => SimValue::list(self.numbered("ai", self.ai_channels)),
            id if id == device::AO_PHYSICAL_CHANS.id => SimValue::list(self.numbered("ao", self.ao_channels)),
            id if id == device::DI_LINES.id || id == device::DO_LINES.id => SimValue::list(self.lines()),
            id if id == device::DI_PORTS.id || id == device::DO_PORTS.id => SimValue::list(self.numbered("port", self.ports)),
            id if id == device::CI_PHYSICAL_CHANS.id || id == device::CO_PHYSICAL_CHANS.id => {
                SimValue::list(self.numbered("ctr", self.counters))
            }
            id if id == device::TRIG_USAGE.id => SimValue::I32(self.trigger_usage.bits() as i32),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum SimValue {
    Bool(bool),
    I32(i32),
    U32(u32),
    U64(u64),
    F64(f64),
    Str(String),
    I32List(Vec<i32>),
}

impl SimValue {
    fn list(names: Vec<String>) -> Self {
        SimValue::Str(names.join(", "))
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            SimValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            SimValue::I32(v) => Some(i64::from(*v)),
            SimValue::U32(v) => Some(i64::from(*v)),
            SimValue::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            SimValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            SimValue::Str(v) => Some(v),
            _ => None,
        }
    }

    fn same_type(&self, other: &SimValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Scope {
    Timing,
    Trigger,
    Read,
    Write,
    Buffer,
    ExportedSignal,
}

impl Scope {
    // Read and write stream attributes may change while the task runs.
    fn settable_while_running(self) -> bool {
        matches!(self, Scope::Read | Scope::Write)
    }
}

static STREAM_DEFAULTS: Lazy<HashMap<(Scope, i32), SimValue>> = Lazy::new(|| {
    hashmap! {
        (Scope::Timing, timing::SAMP_QUANT_SAMP_MODE.id) => SimValue::I32(AcquisitionType::Finite.value()),
        (Scope::Timing, timing::SAMP_QUANT_SAMP_PER_CHAN.id) => SimValue::U64(1000),
        (Scope::Timing, timing::SAMP_CLK_RATE.id) => SimValue::F64(1000.0),
        (Scope::Timing, timing::SAMP_CLK_SRC.id) => SimValue::Str("OnboardClock".to_string()),
        (Scope::Timing, timing::SAMP_CLK_ACTIVE_EDGE.id) => SimValue::I32(Edge::Rising.value()),
        (Scope::Timing, timing::SAMP_TIMING_TYPE.id) => SimValue::I32(SampleTimingType::OnDemand.value()),
        (Scope::Timing, timing::REF_CLK_SRC.id) => SimValue::Str(String::new()),
        (Scope::Timing, timing::REF_CLK_RATE.id) => SimValue::F64(10_000_000.0),
        (Scope::Trigger, trigger::START_TRIG_TYPE.id) => SimValue::I32(TriggerType::None.value()),
        (Scope::Trigger, trigger::DIG_EDGE_START_TRIG_SRC.id) => SimValue::Str(String::new()),
        (Scope::Trigger, trigger::DIG_EDGE_START_TRIG_EDGE.id) => SimValue::I32(Edge::Rising.value()),
        (Scope::Trigger, trigger::ANLG_EDGE_START_TRIG_SRC.id) => SimValue::Str(String::new()),
        (Scope::Trigger, trigger::ANLG_EDGE_START_TRIG_SLOPE.id) => SimValue::I32(Slope::Rising.value()),
        (Scope::Trigger, trigger::ANLG_EDGE_START_TRIG_LVL.id) => SimValue::F64(0.0),
        (Scope::Trigger, trigger::REF_TRIG_TYPE.id) => SimValue::I32(TriggerType::None.value()),
        (Scope::Trigger, trigger::DIG_EDGE_REF_TRIG_SRC.id) => SimValue::Str(String::new()),
        (Scope::Trigger, trigger::DIG_EDGE_REF_TRIG_EDGE.id) => SimValue::I32(Edge::Rising.value()),
        (Scope::Trigger, trigger::REF_TRIG_PRETRIG_SAMPLES.id) => SimValue::U32(2),
        (Scope::Read, read::OVERWRITE.id) => SimValue::I32(OverwriteMode::DoNotOverwriteUnreadSamples.value()),
        (Scope::Read, read::READ_ALL_AVAIL_SAMP.id) => SimValue::Bool(false),
        (Scope::Read, read::AUTO_START.id) => SimValue::Bool(true),
        (Scope::Read, read::RELATIVE_TO.id) => SimValue::I32(ReadRelativeTo::CurrentReadPosition.value()),
        (Scope::Read, read::OFFSET.id) => SimValue::I32(0),
        // Empty means every channel of the task.
        (Scope::Read, read::CHANNELS_TO_READ.id) => SimValue::Str(String::new()),
        (Scope::Read, read::WAIT_MODE.id) => SimValue::I32(WaitMode::WaitForInterrupt.value()),
        (Scope::Read, read::SLEEP_TIME.id) => SimValue::F64(0.001),
        (Scope::Write, write::REGEN_MODE.id) => SimValue::I32(RegenerationMode::AllowRegeneration.value()),
        (Scope::Write, write::RELATIVE_TO.id) => SimValue::I32(WriteRelativeTo::CurrentWritePosition.value()),
        (Scope::Write, write::OFFSET.id) => SimValue::I32(0),
        (Scope::Write, write::WAIT_MODE.id) => SimValue::I32(WaitMode::WaitForInterrupt.value()),
        (Scope::Write, write::SLEEP_TIME.id) => SimValue::F64(0.001),
        // Zero means sized from the timing configuration.
        (Scope::Buffer, buffer::INPUT_BUF_SIZE.id) => SimValue::U32(0),
        (Scope::Buffer, buffer::OUTPUT_BUF_SIZE.id) => SimValue::U32(0),
        (Scope::ExportedSignal, exported_signal::SAMP_CLK_OUTPUT_TERM.id) => SimValue::Str(String::new()),
        (Scope::ExportedSignal, exported_signal::START_TRIG_OUTPUT_TERM.id) => SimValue::Str(String::new()),
        (Scope::ExportedSignal, exported_signal::REF_TRIG_OUTPUT_TERM.id) => SimValue::Str(String::new()),
        (Scope::ExportedSignal, exported_signal::TEN_MHZ_REF_CLK_OUTPUT_TERM.id) => SimValue::Str(String::new()),
    }
});

fn error(code: i32, message: impl Into<String>) -> DaqError {
    DaqError::from_status(code, message)
}

fn unsupported(target: &AttributeTarget<'_>, id: i32) -> DaqError {
    error(
        ErrorCode::AttributeNotSupportedInTaskContext.code(),
        format!(
            "Specified property is not supported by the device or is not applicable to the task.\n\nProperty: {:#06x} ({} scope)",
            id,
            target.scope_name()
        ),
    )
}

fn wrong_type(target: &AttributeTarget<'_>, id: i32) -> DaqError {
    error(
        ErrorCode::InvalidAttributeValue.code(),
        format!("Property {:#06x} of the {} scope has a different data type.", id, target.scope_name()),
    )
}

fn not_settable_while_running(id: i32) -> DaqError {
    error(
        ErrorCode::PropertyNotSettableWhenTaskRunning.code(),
        format!(
            "Specified property cannot be set while the task is running.\n\nSet the property prior to starting the task, or stop the task prior to setting the property.\n\nProperty: {:#06x}",
            id
        ),
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SimLine {
    port: u32,
    line: u32,
}

#[derive(Clone, Debug, PartialEq)]
enum SimKind {
    AiVoltage { index: u32 },
    AiPower { voltage: f64, current: f64 },
    AoVoltage,
    Digital { lines: Vec<SimLine>, output: bool },
    CountEdges,
    Frequency,
    Period,
    PulseFrequency,
    PulseTime,
    PulseTicks,
    CounterOutput,
}

impl SimKind {
    fn channel_type(&self) -> ChannelType {
        match self {
            SimKind::AiVoltage { .. } | SimKind::AiPower { .. } => ChannelType::AnalogInput,
            SimKind::AoVoltage => ChannelType::AnalogOutput,
            SimKind::Digital { output: false, .. } => ChannelType::DigitalInput,
            SimKind::Digital { output: true, .. } => ChannelType::DigitalOutput,
            SimKind::CountEdges
            | SimKind::Frequency
            | SimKind::Period
            | SimKind::PulseFrequency
            | SimKind::PulseTime
            | SimKind::PulseTicks => ChannelType::CounterInput,
            SimKind::CounterOutput => ChannelType::CounterOutput,
        }
    }

    fn is_input(&self) -> bool {
        matches!(
            self.channel_type(),
            ChannelType::AnalogInput | ChannelType::DigitalInput | ChannelType::CounterInput
        )
    }
}

fn is_ai_voltage(kind: &SimKind) -> bool {
    matches!(kind, SimKind::AiVoltage { .. })
}

fn is_ai_power(kind: &SimKind) -> bool {
    matches!(kind, SimKind::AiPower { .. })
}

fn is_digital_input(kind: &SimKind) -> bool {
    matches!(kind, SimKind::Digital { output: false, .. })
}

fn is_counter_input(kind: &SimKind) -> bool {
    kind.channel_type() == ChannelType::CounterInput
}

fn is_analog_output(kind: &SimKind) -> bool {
    matches!(kind, SimKind::AoVoltage)
}

fn is_digital_output(kind: &SimKind) -> bool {
    matches!(kind, SimKind::Digital { output: true, .. })
}

fn is_counter_output(kind: &SimKind) -> bool {
    matches!(kind, SimKind::CounterOutput)
}

#[derive(Clone, Debug)]
struct SimChannel {
    name: String,
    device: String,
    kind: SimKind,
    defaults: HashMap<i32, SimValue>,
    values: HashMap<i32, SimValue>,
    outputs: Vec<[f64; 2]>,
}

impl SimChannel {
    fn new(name: String, physical: String, device: String, kind: SimKind, mut defaults: HashMap<i32, SimValue>) -> Self {
        defaults.insert(channel::CHAN_TYPE.id, SimValue::I32(kind.channel_type().value()));
        defaults.insert(channel::PHYSICAL_CHAN_NAME.id, SimValue::Str(physical));
        defaults.insert(channel::DESCR.id, SimValue::Str(String::new()));
        Self {
            name,
            device,
            kind,
            defaults,
            values: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    fn value(&self, id: i32) -> Option<&SimValue> {
        self.values.get(&id).or_else(|| self.defaults.get(&id))
    }

    fn physical_name(&self) -> &str {
        self.value(channel::PHYSICAL_CHAN_NAME.id).and_then(SimValue::as_str).unwrap_or_default()
    }

    fn is_read_only(id: i32) -> bool {
        id == channel::CHAN_TYPE.id
            || id == channel::PHYSICAL_CHAN_NAME.id
            || id == channel::DI_NUM_LINES.id
            || id == channel::DO_NUM_LINES.id
            || id == channel::CI_COUNT.id
    }

    /// Physical resources the channel reserves while its task is reserved.
    fn resources(&self) -> Vec<String> {
        match &self.kind {
            SimKind::Digital { lines, .. } => lines.iter().map(|l| line_name(&self.device, *l)).collect(),
            _ => vec![self.physical_name().to_string()],
        }
    }

    fn num_lines(&self) -> usize {
        match &self.kind {
            SimKind::Digital { lines, .. } => lines.len(),
            _ => 0,
        }
    }

    fn line_names(&self) -> Vec<String> {
        match &self.kind {
            SimKind::Digital { lines, .. } => lines.iter().map(|l| line_name(&self.device, *l)).collect(),
            _ => Vec::new(),
        }
    }

    fn voltage(&self) -> f64 {
        match self.kind {
            SimKind::AiVoltage { index } => f64::from(index) + 1.0,
            SimKind::AiPower { voltage, .. } => voltage,
            _ => 0.0,
        }
    }

    fn current(&self) -> f64 {
        match self.kind {
            SimKind::AiPower { current, .. } => current,
            _ => 0.0,
        }
    }

    fn line_state(&self, line_index: usize, k: u64) -> u8 {
        match &self.kind {
            SimKind::Digital { lines, .. } => lines
                .get(line_index)
                .map_or(0, |l| (((k % PATTERN_PERIOD) >> l.line) & 1) as u8),
            _ => 0,
        }
    }

    /// Line states packed at their port bit positions, relative to the channel's first port.
    fn port_value(&self, k: u64) -> u32 {
        let SimKind::Digital { lines, .. } = &self.kind else {
            return 0;
        };
        let base_port = lines.iter().map(|l| l.port).min().unwrap_or(0);
        lines.iter().enumerate().fold(0u32, |acc, (i, l)| {
            let bit = (l.port - base_port) * LINES_PER_PORT + l.line;
            if bit < 32 {
                acc | (u32::from(self.line_state(i, k)) << bit)
            } else {
                acc
            }
        })
    }

    fn count(&self, k: u64) -> u32 {
        let initial = self
            .value(channel::CI_COUNT_EDGES_INITIAL_CNT.id)
            .and_then(SimValue::as_u32)
            .unwrap_or(0);
        let down = self
            .value(channel::CI_COUNT_EDGES_DIR.id)
            .and_then(SimValue::as_i32)
            .is_some_and(|dir| dir == CountDirection::CountDown.value());
        let k = k as u32;
        if down {
            initial.wrapping_sub(k)
        } else {
            initial.wrapping_add(k)
        }
    }

    fn counter_value(&self, k: u64) -> f64 {
        match self.kind {
            SimKind::CountEdges => f64::from(self.count(k)),
            SimKind::Frequency | SimKind::PulseFrequency => TIMEBASE_FREQUENCY,
            SimKind::Period => 1.0 / TIMEBASE_FREQUENCY,
            SimKind::PulseTime => 0.5 / TIMEBASE_FREQUENCY,
            SimKind::PulseTicks => f64::from(TIMEBASE_TICKS_PER_HALF_PERIOD),
            _ => 0.0,
        }
    }

    fn counter_value_u32(&self, k: u64) -> u32 {
        match self.kind {
            SimKind::CountEdges => self.count(k),
            _ => self.counter_value(k).round() as u32,
        }
    }
}

fn line_name(device: &str, line: SimLine) -> String {
    format!("{}/port{}/line{}", device, line.port, line.line)
}

fn unscaled(volts: f64) -> f64 {
    (volts * CODES_PER_VOLT).round()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TaskState {
    Unverified,
    Verified,
    Reserved,
    Committed,
    Running,
}

#[derive(Debug)]
struct SimTask {
    name: String,
    channels: Vec<SimChannel>,
    values: HashMap<(Scope, i32), SimValue>,
    state: TaskState,
    start_ticks: i64,
    started: Option<Instant>,
    read_position: u64,
    written: u64,
}

impl SimTask {
    fn new(name: String) -> Self {
        Self {
            name,
            channels: Vec::new(),
            values: HashMap::new(),
            state: TaskState::Unverified,
            start_ticks: 0,
            started: None,
            read_position: 0,
            written: 0,
        }
    }

    fn stream(&self, scope: Scope, id: i32) -> Option<&SimValue> {
        self.values.get(&(scope, id)).or_else(|| STREAM_DEFAULTS.get(&(scope, id)))
    }

    fn timing_type(&self) -> SampleTimingType {
        self.stream(Scope::Timing, timing::SAMP_TIMING_TYPE.id)
            .and_then(SimValue::as_i32)
            .and_then(|v| SampleTimingType::from_value(v).ok())
            .unwrap_or(SampleTimingType::OnDemand)
    }

    fn sample_mode(&self) -> AcquisitionType {
        self.stream(Scope::Timing, timing::SAMP_QUANT_SAMP_MODE.id)
            .and_then(SimValue::as_i32)
            .and_then(|v| AcquisitionType::from_value(v).ok())
            .unwrap_or(AcquisitionType::Finite)
    }

    fn samps_per_chan(&self) -> u64 {
        self.stream(Scope::Timing, timing::SAMP_QUANT_SAMP_PER_CHAN.id)
            .and_then(SimValue::as_u64)
            .unwrap_or(0)
    }

    fn rate(&self) -> f64 {
        self.stream(Scope::Timing, timing::SAMP_CLK_RATE.id)
            .and_then(SimValue::as_f64)
            .unwrap_or(1000.0)
    }

    fn is_clocked(&self) -> bool {
        matches!(
            self.timing_type(),
            SampleTimingType::SampleClock | SampleTimingType::PipelinedSampleClock | SampleTimingType::BurstHandshake
        )
    }

    fn is_finite(&self) -> bool {
        self.timing_type() != SampleTimingType::OnDemand && self.sample_mode() == AcquisitionType::Finite
    }

    fn is_done(&self) -> bool {
        self.state != TaskState::Running || self.is_finite()
    }

    fn has_outputs(&self) -> bool {
        self.channels.iter().any(|c| !c.kind.is_input())
    }

    fn buffer_size(&self, id: i32) -> u32 {
        let configured = self.stream(Scope::Buffer, id).and_then(SimValue::as_u32).unwrap_or(0);
        if configured > 0 {
            return configured;
        }
        if self.timing_type() == SampleTimingType::OnDemand {
            return 0;
        }
        let requested = u32::try_from(self.samps_per_chan()).unwrap_or(u32::MAX);
        if self.is_finite() {
            return requested;
        }
        let by_rate = match self.rate() {
            r if r <= 100.0 => 1_000,
            r if r <= 10_000.0 => 10_000,
            r if r <= 1_000_000.0 => 100_000,
            _ => 1_000_000,
        };
        requested.max(by_rate)
    }

    fn read_channels(&self) -> Result<Vec<SimChannel>> {
        let selected = self
            .stream(Scope::Read, read::CHANNELS_TO_READ.id)
            .and_then(SimValue::as_str)
            .unwrap_or_default();
        let channels: Vec<SimChannel> = if selected.is_empty() {
            self.channels.iter().filter(|c| c.kind.is_input()).cloned().collect()
        } else {
            let indices = self.channel_indices(selected)?;
            indices.into_iter().map(|i| self.channels[i].clone()).collect()
        };
        if channels.is_empty() {
            return Err(error(
                NO_CHANNELS,
                "Specified operation cannot be performed when there are no input channels in the task.",
            ));
        }
        Ok(channels)
    }

    fn channel_indices(&self, names: &str) -> Result<Vec<usize>> {
        if names.trim().is_empty() {
            return Ok((0..self.channels.len()).collect());
        }
        let position = |name: &str| self.channels.iter().position(|c| c.name == name);
        let mut indices = Vec::new();
        // A channel created from a line range keeps the range as its name.
        for token in split_names(names) {
            if let Some(index) = position(&token) {
                indices.push(index);
                continue;
            }
            for name in unflatten_channel_string(&token)? {
                let index = position(&name).ok_or_else(|| {
                    error(
                        CHANNEL_NOT_IN_TASK,
                        format!("Specified channel is not in the task.\n\nChannel Name: {}", name),
                    )
                })?;
                indices.push(index);
            }
        }
        Ok(indices)
    }

    fn avail_samp_per_chan(&self) -> u64 {
        if self.state != TaskState::Running {
            return 0;
        }
        if self.timing_type() == SampleTimingType::OnDemand {
            return 1;
        }
        if self.is_finite() {
            return self.samps_per_chan().saturating_sub(self.read_position);
        }
        let elapsed = self.started.map_or(0.0, |s| s.elapsed().as_secs_f64());
        let acquired = (elapsed * self.rate()) as u64;
        acquired
            .saturating_sub(self.read_position)
            .min(u64::from(self.buffer_size(buffer::INPUT_BUF_SIZE.id)))
    }

    fn total_acquired(&self) -> u64 {
        if self.state != TaskState::Running {
            return self.read_position;
        }
        if self.is_finite() {
            self.samps_per_chan()
        } else {
            self.read_position + self.avail_samp_per_chan()
        }
    }

    /// Start time in ticks and sample interval of the sample at `position`.
    fn sample_timing(&self, position: u64) -> (i64, f64) {
        if !self.is_clocked() {
            return (timestamp_to_ticks(Utc::now()), 0.0);
        }
        let rate = self.rate();
        let offset = (position as f64 * TICK_RATE / rate).round() as i64;
        (self.start_ticks + offset, 1.0 / rate)
    }

    fn task_value(&self, id: i32) -> Option<SimValue> {
        let names: Vec<String> = self.channels.iter().map(|c| c.name.clone()).collect();
        let mut devices: Vec<String> = Vec::new();
        for c in &self.channels {
            if !devices.contains(&c.device) {
                devices.push(c.device.clone());
            }
        }
        let value = match id {
            id if id == task_attr::NAME.id => SimValue::Str(self.name.clone()),
            id if id == task_attr::CHANNELS.id => SimValue::list(names),
            id if id == task_attr::NUM_CHANS.id => SimValue::U32(self.channels.len() as u32),
            id if id == task_attr::DEVICES.id => SimValue::list(devices),
            id if id == task_attr::NUM_DEVICES.id => SimValue::U32(devices.len() as u32),
            id if id == task_attr::COMPLETE.id => SimValue::Bool(self.is_done()),
            _ => return None,
        };
        Some(value)
    }

    fn computed_stream_value(&self, scope: Scope, id: i32) -> Option<SimValue> {
        let outputs: Vec<&SimChannel> = self.channels.iter().filter(|c| !c.kind.is_input()).collect();
        let inputs: Vec<&SimChannel> = self.channels.iter().filter(|c| c.kind.is_input()).collect();
        let raw_width = |channels: &[&SimChannel]| match channels.first().map(|c| c.kind.channel_type()) {
            Some(ChannelType::AnalogInput) | Some(ChannelType::AnalogOutput) => 2,
            Some(ChannelType::DigitalInput) | Some(ChannelType::DigitalOutput) => 1,
            _ => 4,
        };
        let lines = |channels: &[&SimChannel]| channels.iter().map(|c| c.num_lines()).max().unwrap_or(0) as u32;
        let value = match scope {
            Scope::Read => match id {
                id if id == read::CURR_READ_POS.id => SimValue::U64(self.read_position),
                id if id == read::AVAIL_SAMP_PER_CHAN.id => {
                    SimValue::U32(u32::try_from(self.avail_samp_per_chan()).unwrap_or(u32::MAX))
                }
                id if id == read::TOTAL_SAMP_PER_CHAN_ACQUIRED.id => SimValue::U64(self.total_acquired()),
                id if id == read::NUM_CHANS.id => SimValue::U32(self.read_channels().map_or(0, |c| c.len() as u32)),
                id if id == read::RAW_DATA_WIDTH.id => SimValue::U32(raw_width(&inputs)),
                id if id == read::DIGITAL_LINES_BYTES_PER_CHAN.id => SimValue::U32(lines(&inputs)),
                id if id == read::CHANNELS_TO_READ.id => {
                    let channels = self.read_channels().unwrap_or_default();
                    SimValue::list(channels.into_iter().map(|c| c.name).collect())
                }
                _ => return None,
            },
            Scope::Write => match id {
                id if id == write::CURR_WRITE_POS.id || id == write::TOTAL_SAMP_PER_CHAN_GENERATED.id => {
                    SimValue::U64(self.written)
                }
                id if id == write::SPACE_AVAIL.id => SimValue::U32(self.buffer_size(buffer::OUTPUT_BUF_SIZE.id)),
                id if id == write::NUM_CHANS.id => SimValue::U32(outputs.len() as u32),
                id if id == write::RAW_DATA_WIDTH.id => SimValue::U32(raw_width(&outputs)),
                id if id == write::DIGITAL_LINES_BYTES_PER_CHAN.id => SimValue::U32(lines(&outputs)),
                _ => return None,
            },
            Scope::Buffer if id == buffer::INPUT_BUF_SIZE.id || id == buffer::OUTPUT_BUF_SIZE.id => {
                SimValue::U32(self.buffer_size(id))
            }
            _ => return None,
        };
        Some(value)
    }
}

/// One read's worth of simulated samples.
struct Acquisition {
    channels: Vec<SimChannel>,
    first: u64,
    requested: usize,
    transferred: usize,
    t0_ticks: i64,
    sample_interval: f64,
    shortfall: Option<DaqError>,
}

impl Acquisition {
    fn index(&self, fill_mode: FillMode, channel: usize, sample: usize) -> usize {
        match fill_mode {
            FillMode::GroupByChannel => channel * self.requested + sample,
            FillMode::GroupByScanNumber => sample * self.channels.len() + channel,
        }
    }

    fn for_each(&self, fill_mode: FillMode, mut f: impl FnMut(usize, &SimChannel, u64)) {
        for (c, channel) in self.channels.iter().enumerate() {
            for i in 0..self.transferred {
                f(self.index(fill_mode, c, i), channel, self.first + i as u64);
            }
        }
    }

    fn single(&self) -> Result<&SimChannel> {
        match self.channels.as_slice() {
            [channel] => Ok(channel),
            _ => Err(error(
                SINGLE_CHANNEL_REQUIRED,
                "This read function requires a task with exactly one channel.",
            )),
        }
    }

    fn metadata(&self, mode: WaveformAttributeMode, metadata: &mut [WaveformMetadata]) {
        for (meta, channel) in metadata.iter_mut().zip(&self.channels) {
            *meta = WaveformMetadata::default();
            if mode.contains(WaveformAttributeMode::TIMING) {
                meta.t0_ticks = Some(self.t0_ticks);
                meta.sample_interval = Some(self.sample_interval);
            }
            if mode.contains(WaveformAttributeMode::EXTENDED_PROPERTIES) {
                meta.properties.insert(CHANNEL_NAME, PropertyValue::String(channel.name.clone()));
                match &channel.kind {
                    SimKind::Digital { .. } => {
                        meta.properties
                            .insert(LINE_NAMES, PropertyValue::String(channel.line_names().join(", ")));
                    }
                    SimKind::AiVoltage { .. } => {
                        meta.properties.insert(UNIT_DESCRIPTION, PropertyValue::String("Volts".to_string()));
                    }
                    _ => {}
                }
            }
        }
    }

    fn finish(self) -> Result<usize> {
        match self.shortfall {
            Some(err) => Err(err.with_samples_transferred(self.transferred)),
            None => Ok(self.transferred),
        }
    }
}

#[derive(Debug)]
struct SimState {
    devices: Vec<SimulatedDevice>,
    persisted_tasks: Vec<String>,
    tasks: HashMap<usize, SimTask>,
    next_handle: usize,
    unnamed_tasks: usize,
    last_start_ticks: i64,
    routes: HashSet<(String, String)>,
    warnings: Vec<DaqWarning>,
}

impl SimState {
    fn task(&self, handle: TaskHandle) -> Result<&SimTask> {
        self.tasks.get(&handle.as_raw()).ok_or_else(|| invalid_task(handle))
    }

    fn task_mut(&mut self, handle: TaskHandle) -> Result<&mut SimTask> {
        self.tasks.get_mut(&handle.as_raw()).ok_or_else(|| invalid_task(handle))
    }

    fn device(&self, name: &str) -> Result<&SimulatedDevice> {
        self.devices.iter().find(|d| d.name == name).ok_or_else(|| {
            error(
                ErrorCode::DeviceNotFound.code(),
                format!("Device identifier is invalid.\n\nDevice Specified: {}", name),
            )
        })
    }

    fn check_terminal(&self, terminal: &str) -> Result<()> {
        if let Some(rest) = terminal.strip_prefix('/') {
            let device = rest.split('/').next().unwrap_or_default();
            self.device(device)?;
        }
        Ok(())
    }

    fn add_task(&mut self, name: String) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle::from_raw(self.next_handle);
        debug!(task = %name, %handle, "simulated task created");
        self.tasks.insert(handle.as_raw(), SimTask::new(name));
        handle
    }

    fn find_task(&self, name: &str) -> Option<TaskHandle> {
        self.tasks
            .iter()
            .find(|(_, task)| task.name == name)
            .map(|(&raw, _)| TaskHandle::from_raw(raw))
    }

    fn reserve(&mut self, handle: TaskHandle) -> Result<()> {
        let task = self.task(handle)?;
        if task.channels.is_empty() {
            return Err(error(
                NO_CHANNELS,
                "Specified operation cannot be performed when there are no channels in the task.",
            ));
        }
        if task.state >= TaskState::Reserved {
            return Ok(());
        }
        let resources: Vec<String> = task.channels.iter().flat_map(SimChannel::resources).collect();
        for (&other, other_task) in &self.tasks {
            if other == handle.as_raw() || other_task.state < TaskState::Reserved {
                continue;
            }
            let held: Vec<String> = other_task.channels.iter().flat_map(SimChannel::resources).collect();
            if let Some(conflict) = resources.iter().find(|r| held.contains(r)) {
                return Err(error(
                    ErrorCode::ResourceReserved.code(),
                    format!(
                        "The specified resource is reserved. The operation could not be completed as specified.\n\nResource: {}\nReserved by Task: {}",
                        conflict, other_task.name
                    ),
                ));
            }
        }
        self.task_mut(handle)?.state = TaskState::Reserved;
        Ok(())
    }

    fn start(&mut self, handle: TaskHandle) -> Result<()> {
        self.reserve(handle)?;
        let now = timestamp_to_ticks(Utc::now()).max(self.last_start_ticks + 1);
        self.last_start_ticks = now;
        let task = self.task_mut(handle)?;
        task.state = TaskState::Running;
        task.start_ticks = now;
        task.started = Some(Instant::now());
        task.read_position = 0;
        debug!(task = %task.name, "simulated task started");
        Ok(())
    }

    fn stop(&mut self, handle: TaskHandle) -> Result<()> {
        let task = self.task_mut(handle)?;
        if task.state != TaskState::Running {
            return Ok(());
        }
        let warning = (task.has_outputs() && task.is_finite() && task.written < task.samps_per_chan()).then(|| DaqWarning {
            code: FINITE_STOPPED_EARLY,
            message: format!(
                "Finite generation has been stopped before the requested number of samples were generated.\n\nTask Name: {}",
                task.name
            ),
        });
        task.state = TaskState::Verified;
        task.started = None;
        task.written = 0;
        debug!(task = %task.name, "simulated task stopped");
        if let Some(warning) = warning {
            warn!(code = warning.code, "{}", warning.message);
            self.warnings.push(warning);
        }
        Ok(())
    }

    fn ensure_started_for_read(&mut self, handle: TaskHandle) -> Result<()> {
        let task = self.task(handle)?;
        if task.state == TaskState::Running {
            return Ok(());
        }
        let auto_start = task
            .stream(Scope::Read, read::AUTO_START.id)
            .and_then(SimValue::as_bool)
            .unwrap_or(true);
        if !auto_start {
            return Err(error(
                NOT_RUNNING_AND_NO_AUTO_START,
                "Read cannot be performed because the task is not running and auto start is disabled.",
            ));
        }
        self.start(handle)
    }

    fn channels_for_create(&self, spec: &ChannelSpec) -> Result<Vec<SimChannel>> {
        let physical = unflatten_channel_string(spec.physical_channel())?;
        if physical.is_empty() {
            return Err(error(INVALID_PHYSICAL_CHANNEL, "Physical channel not specified."));
        }
        match spec {
            ChannelSpec::Di {
                name_to_assign,
                line_grouping,
                ..
            } => self.digital_channels(spec.physical_channel(), &physical, name_to_assign, *line_grouping, false),
            ChannelSpec::Do {
                name_to_assign,
                line_grouping,
                ..
            } => self.digital_channels(spec.physical_channel(), &physical, name_to_assign, *line_grouping, true),
            _ => {
                let names = assign_names(&physical, spec.name_to_assign())?;
                physical
                    .iter()
                    .zip(names)
                    .map(|(physical, name)| {
                        let (device, kind, defaults) = self.channel_kind(spec, physical)?;
                        Ok(SimChannel::new(name, physical.clone(), device, kind, defaults))
                    })
                    .collect()
            }
        }
    }

    fn digital_channels(
        &self,
        lines_string: &str,
        physical: &[String],
        name_to_assign: &str,
        line_grouping: LineGrouping,
        output: bool,
    ) -> Result<Vec<SimChannel>> {
        let mut all: Vec<(String, SimLine)> = Vec::new();
        for name in physical {
            let caps = DIGITAL.captures(name).ok_or_else(|| no_such_channel(name))?;
            let device = caps.name("dev").map_or("", |m| m.as_str()).to_string();
            let ports = self.device(&device)?.ports;
            let port: u32 = caps["port"].parse().map_err(|_| no_such_channel(name))?;
            if port >= ports {
                return Err(no_such_channel(name));
            }
            match caps.name("line") {
                Some(line) => {
                    let line: u32 = line.as_str().parse().map_err(|_| no_such_channel(name))?;
                    if line >= LINES_PER_PORT {
                        return Err(no_such_channel(name));
                    }
                    all.push((device, SimLine { port, line }));
                }
                None => all.extend((0..LINES_PER_PORT).map(|line| (device.clone(), SimLine { port, line }))),
            }
        }

        let lines_attr = if output { channel::DO_NUM_LINES.id } else { channel::DI_NUM_LINES.id };
        match line_grouping {
            LineGrouping::ChanForAllLines => {
                let device = all.first().map(|(d, _)| d.clone()).unwrap_or_default();
                if all.iter().any(|(d, _)| d != &device) {
                    return Err(error(
                        INVALID_PHYSICAL_CHANNEL,
                        "Lines from different devices cannot be combined into one channel.",
                    ));
                }
                // Without a name, the channel is named after the line list it was created from.
                let physical_name = lines_string.trim().to_string();
                let name = assign_names(std::slice::from_ref(&physical_name), name_to_assign)?
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| physical_name.clone());
                let lines: Vec<SimLine> = all.into_iter().map(|(_, l)| l).collect();
                let defaults = hashmap! { lines_attr => SimValue::U32(lines.len() as u32) };
                Ok(vec![SimChannel::new(
                    name,
                    physical_name,
                    device,
                    SimKind::Digital { lines, output },
                    defaults,
                )])
            }
            LineGrouping::ChanPerLine => {
                let physical_lines: Vec<String> = all.iter().map(|(d, l)| line_name(d, *l)).collect();
                let names = assign_names(&physical_lines, name_to_assign)?;
                Ok(all
                    .into_iter()
                    .zip(names.into_iter().zip(physical_lines))
                    .map(|((device, line), (name, physical))| {
                        let defaults = hashmap! { lines_attr => SimValue::U32(1) };
                        SimChannel::new(
                            name,
                            physical,
                            device,
                            SimKind::Digital {
                                lines: vec![line],
                                output,
                            },
                            defaults,
                        )
                    })
                    .collect())
            }
        }
    }

    /// Device and index of a numbered physical channel such as `Dev1/ai3`.
    fn physical_index(&self, pattern: &Regex, name: &str, count: impl Fn(&SimulatedDevice) -> u32) -> Result<(String, u32)> {
        let caps = pattern.captures(name).ok_or_else(|| no_such_channel(name))?;
        let device = caps.name("dev").map_or("", |m| m.as_str()).to_string();
        let available = count(self.device(&device)?);
        match caps.name("n").and_then(|m| m.as_str().parse::<u32>().ok()) {
            Some(index) if index < available => Ok((device, index)),
            _ => Err(no_such_channel(name)),
        }
    }

    fn channel_kind(&self, spec: &ChannelSpec, physical: &str) -> Result<(String, SimKind, HashMap<i32, SimValue>)> {
        let counter = |physical: &str| self.physical_index(&COUNTER, physical, |d| d.counters).map(|(device, _)| device);
        let channel = match spec {
            ChannelSpec::AiVoltage {
                terminal_config,
                min_val,
                max_val,
                units,
                ..
            } => {
                let (device, index) = self.physical_index(&AI_CHANNEL, physical, |d| d.ai_channels)?;
                let terminal = match terminal_config {
                    TerminalConfiguration::Default => TerminalConfiguration::Differential,
                    other => *other,
                };
                let defaults = hashmap! {
                    channel::AI_MIN.id => SimValue::F64(*min_val),
                    channel::AI_MAX.id => SimValue::F64(*max_val),
                    channel::AI_VOLTAGE_UNITS.id => SimValue::I32(units.value()),
                    channel::AI_TERM_CFG.id => SimValue::I32(terminal.value()),
                };
                (device, SimKind::AiVoltage { index }, defaults)
            }
            ChannelSpec::AiPower {
                voltage_setpoint,
                current_setpoint,
                ..
            } => {
                let caps = POWER_CHANNEL.captures(physical).ok_or_else(|| no_such_channel(physical))?;
                let device = caps.name("dev").map_or("", |m| m.as_str()).to_string();
                self.device(&device)?;
                let kind = SimKind::AiPower {
                    voltage: *voltage_setpoint,
                    current: *current_setpoint,
                };
                (device, kind, HashMap::new())
            }
            ChannelSpec::AoVoltage { min_val, max_val, .. } => {
                let (device, _) = self.physical_index(&AO_CHANNEL, physical, |d| d.ao_channels)?;
                let defaults = hashmap! {
                    channel::AO_MIN.id => SimValue::F64(*min_val),
                    channel::AO_MAX.id => SimValue::F64(*max_val),
                };
                (device, SimKind::AoVoltage, defaults)
            }
            ChannelSpec::CiCountEdges {
                initial_count,
                count_direction,
                ..
            } => {
                let defaults = hashmap! {
                    channel::CI_COUNT_EDGES_INITIAL_CNT.id => SimValue::U32(*initial_count),
                    channel::CI_COUNT_EDGES_DIR.id => SimValue::I32(count_direction.value()),
                };
                (counter(physical)?, SimKind::CountEdges, defaults)
            }
            ChannelSpec::CiFreq {
                min_val, max_val, units, ..
            }
            | ChannelSpec::CiPulseFreq {
                min_val, max_val, units, ..
            } => {
                let defaults = hashmap! {
                    channel::CI_MIN.id => SimValue::F64(*min_val),
                    channel::CI_MAX.id => SimValue::F64(*max_val),
                    channel::CI_FREQ_UNITS.id => SimValue::I32(units.value()),
                };
                let kind = match spec {
                    ChannelSpec::CiFreq { .. } => SimKind::Frequency,
                    _ => SimKind::PulseFrequency,
                };
                (counter(physical)?, kind, defaults)
            }
            ChannelSpec::CiPeriod { min_val, max_val, .. }
            | ChannelSpec::CiPulseTime { min_val, max_val, .. }
            | ChannelSpec::CiPulseTicks { min_val, max_val, .. } => {
                let defaults = hashmap! {
                    channel::CI_MIN.id => SimValue::F64(*min_val),
                    channel::CI_MAX.id => SimValue::F64(*max_val),
                };
                let kind = match spec {
                    ChannelSpec::CiPeriod { .. } => SimKind::Period,
                    ChannelSpec::CiPulseTime { .. } => SimKind::PulseTime,
                    _ => SimKind::PulseTicks,
                };
                (counter(physical)?, kind, defaults)
            }
            ChannelSpec::CoPulseFreq {
                idle_state,
                freq,
                duty_cycle,
                ..
            } => (
                counter(physical)?,
                SimKind::CounterOutput,
                pulse_defaults(*freq, *duty_cycle, *idle_state),
            ),
            ChannelSpec::CoPulseTime {
                idle_state,
                low_time,
                high_time,
                ..
            } => {
                let period = low_time + high_time;
                let (freq, duty) = if period > 0.0 {
                    (1.0 / period, high_time / period)
                } else {
                    (0.0, 0.0)
                };
                (counter(physical)?, SimKind::CounterOutput, pulse_defaults(freq, duty, *idle_state))
            }
            ChannelSpec::CoPulseTicks {
                idle_state,
                low_ticks,
                high_ticks,
                ..
            } => {
                let period = f64::from(*low_ticks) + f64::from(*high_ticks);
                let (freq, duty) = if period > 0.0 {
                    (TICK_RATE / period, f64::from(*high_ticks) / period)
                } else {
                    (0.0, 0.0)
                };
                (counter(physical)?, SimKind::CounterOutput, pulse_defaults(freq, duty, *idle_state))
            }
            ChannelSpec::Di { .. } | ChannelSpec::Do { .. } => return Err(no_such_channel(physical)),
        };
        Ok(channel)
    }
}

fn no_such_channel(name: &str) -> DaqError {
    error(
        INVALID_PHYSICAL_CHANNEL,
        format!("Physical channel specified does not exist on this device.\n\nPhysical Channel Name: {}", name),
    )
}

fn pulse_defaults(freq: f64, duty: f64, idle_state: Level) -> HashMap<i32, SimValue> {
    hashmap! {
        channel::CO_PULSE_FREQ.id => SimValue::F64(freq),
        channel::CO_PULSE_DUTY_CYC.id => SimValue::F64(duty),
        channel::CO_PULSE_IDLE_STATE.id => SimValue::I32(idle_state.value()),
    }
}

/// Virtual channel names for `physical`: the physical names themselves, an explicit list of the
/// same length, or one base name numbered per channel.
fn assign_names(physical: &[String], name_to_assign: &str) -> Result<Vec<String>> {
    let requested = unflatten_channel_string(name_to_assign)?;
    match requested.len() {
        0 => Ok(physical.to_vec()),
        n if n == physical.len() => Ok(requested),
        1 => Ok((0..physical.len()).map(|i| format!("{}{}", requested[0], i)).collect()),
        _ => Err(error(
            INVALID_PHYSICAL_CHANNEL,
            format!(
                "The number of names to assign ({}) does not match the number of physical channels ({}).",
                requested.len(),
                physical.len()
            ),
        )),
    }
}

fn invalid_task(handle: TaskHandle) -> DaqError {
    error(
        ErrorCode::InvalidTask.code(),
        format!("Task specified is invalid or does not exist.\n\nTask Handle: {}", handle),
    )
}

/// Executes driver operations against simulated devices.
#[derive(Debug)]
pub struct SimulatedInterpreter {
    driver_version: (u32, u32, u32),
    state: Mutex<SimState>,
}

impl Default for SimulatedInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedInterpreter {
    /// A simulated driver with one device, `Dev1`.
    pub fn new() -> Self {
        Self {
            driver_version: (24, 5, 0),
            state: Mutex::new(SimState {
                devices: vec![SimulatedDevice::new("Dev1")],
                persisted_tasks: Vec::new(),
                tasks: HashMap::new(),
                next_handle: 0,
                unnamed_tasks: 0,
                last_start_ticks: 0,
                routes: HashSet::new(),
                warnings: Vec::new(),
            }),
        }
    }

    pub fn with_device(self, device: SimulatedDevice) -> Self {
        {
            let mut state = self.state.lock();
            state.devices.retain(|d| d.name != device.name);
            state.devices.push(device);
        }
        self
    }

    /// Adds a task to the persisted-task list; attaching to its name loads it.
    pub fn with_persisted_task(self, name: &str) -> Self {
        self.state.lock().persisted_tasks.push(name.to_string());
        self
    }

    pub fn with_driver_version(mut self, major: u32, minor: u32, update: u32) -> Self {
        self.driver_version = (major, minor, update);
        self
    }

    /// Primary values written to `channel` so far, in write order.
    pub fn written_samples(&self, task: TaskHandle, channel: &str) -> Result<Vec<f64>> {
        Ok(self.written_pairs(task, channel)?.into_iter().map(|[primary, _]| primary).collect())
    }

    /// `(primary, secondary)` values written to `channel`; the secondary value is the duty cycle,
    /// low time or low ticks of counter writes and `0` otherwise.
    pub fn written_pairs(&self, task: TaskHandle, channel: &str) -> Result<Vec<[f64; 2]>> {
        let state = self.state.lock();
        let task = state.task(task)?;
        let index = task.channel_indices(channel)?;
        Ok(index.first().map(|&i| task.channels[i].outputs.clone()).unwrap_or_default())
    }

    fn lookup(&self, target: &AttributeTarget<'_>, id: i32) -> Result<SimValue> {
        let state = self.state.lock();
        let value = match *target {
            AttributeTarget::System => {
                let (major, minor, update) = self.driver_version;
                match id {
                    id if id == system::TASKS.id => Some(SimValue::list(state.persisted_tasks.clone())),
                    id if id == system::DEV_NAMES.id => {
                        Some(SimValue::list(state.devices.iter().map(|d| d.name.clone()).collect()))
                    }
                    id if id == system::GLOBAL_CHANS.id || id == system::SCALES.id => Some(SimValue::Str(String::new())),
                    id if id == system::NIDAQ_MAJOR_VERSION.id => Some(SimValue::U32(major)),
                    id if id == system::NIDAQ_MINOR_VERSION.id => Some(SimValue::U32(minor)),
                    id if id == system::NIDAQ_UPDATE_VERSION.id => Some(SimValue::U32(update)),
                    _ => None,
                }
            }
            AttributeTarget::Device(name) => state.device(name)?.value(id),
            AttributeTarget::PhysicalChannel(name) => {
                let device = name.trim_start_matches('/').split('/').next().unwrap_or_default();
                state.device(device)?;
                match id {
                    id if id == physical_channel::AI_SUPPORTED_MEAS_TYPES.id && AI_CHANNEL.is_match(name) => {
                        Some(SimValue::I32List(vec![VOLTAGE_MEASUREMENT]))
                    }
                    id if (id == physical_channel::DI_PORT_WIDTH.id || id == physical_channel::DO_PORT_WIDTH.id)
                        && DIGITAL.captures(name).is_some_and(|c| c.name("line").is_none()) =>
                    {
                        Some(SimValue::U32(LINES_PER_PORT))
                    }
                    _ => None,
                }
            }
            AttributeTarget::Task(h) => state.task(h)?.task_value(id),
            AttributeTarget::Channel(h, name) => {
                let task = state.task(h)?;
                let index = *task.channel_indices(name)?.first().ok_or_else(|| unsupported(target, id))?;
                let channel = &task.channels[index];
                if id == channel::CI_COUNT.id && channel.kind == SimKind::CountEdges {
                    Some(SimValue::U32(channel.count(task.read_position)))
                } else {
                    channel.value(id).cloned()
                }
            }
            AttributeTarget::Timing(h)
            | AttributeTarget::Trigger(h)
            | AttributeTarget::Read(h)
            | AttributeTarget::Write(h)
            | AttributeTarget::Buffer(h)
            | AttributeTarget::ExportedSignal(h) => {
                let scope = stream_scope(target);
                let task = state.task(h)?;
                task.computed_stream_value(scope, id).or_else(|| task.stream(scope, id).cloned())
            }
        };
        value.ok_or_else(|| unsupported(target, id))
    }

    fn store(&self, target: &AttributeTarget<'_>, id: i32, value: Option<SimValue>) -> Result<()> {
        let mut state = self.state.lock();
        match *target {
            AttributeTarget::Channel(h, name) => {
                let task = state.task_mut(h)?;
                let indices = task.channel_indices(name)?;
                if task.state == TaskState::Running {
                    return Err(not_settable_while_running(id));
                }
                for i in indices {
                    let channel = &mut task.channels[i];
                    let Some(default) = channel.defaults.get(&id) else {
                        return Err(unsupported(target, id));
                    };
                    if SimChannel::is_read_only(id) {
                        return Err(crate::attributes::read_only(*target, id));
                    }
                    match &value {
                        Some(value) if !value.same_type(default) => return Err(wrong_type(target, id)),
                        Some(value) => {
                            channel.values.insert(id, value.clone());
                        }
                        None => {
                            channel.values.remove(&id);
                        }
                    }
                }
                Ok(())
            }
            AttributeTarget::Timing(h)
            | AttributeTarget::Trigger(h)
            | AttributeTarget::Read(h)
            | AttributeTarget::Write(h)
            | AttributeTarget::Buffer(h)
            | AttributeTarget::ExportedSignal(h) => {
                let scope = stream_scope(target);
                let task = state.task_mut(h)?;
                let Some(default) = STREAM_DEFAULTS.get(&(scope, id)) else {
                    return Err(match task.computed_stream_value(scope, id) {
                        Some(_) => crate::attributes::read_only(*target, id),
                        None => unsupported(target, id),
                    });
                };
                if task.state == TaskState::Running && !scope.settable_while_running() {
                    return Err(not_settable_while_running(id));
                }
                match value {
                    Some(value) if !value.same_type(default) => Err(wrong_type(target, id)),
                    Some(SimValue::F64(rate)) if id == timing::SAMP_CLK_RATE.id && rate <= 0.0 => Err(error(
                        ErrorCode::InvalidAttributeValue.code(),
                        format!("Requested sample clock rate must be positive.\n\nRequested Value: {}", rate),
                    )),
                    Some(value) => {
                        task.values.insert((scope, id), value);
                        Ok(())
                    }
                    None => {
                        task.values.remove(&(scope, id));
                        Ok(())
                    }
                }
            }
            AttributeTarget::Task(h) => {
                state.task(h)?;
                Err(crate::attributes::read_only(*target, id))
            }
            AttributeTarget::System | AttributeTarget::Device(_) | AttributeTarget::PhysicalChannel(_) => {
                Err(crate::attributes::read_only(*target, id))
            }
        }
    }

    fn set_many(&self, task: TaskHandle, scope_values: &[(Scope, i32, SimValue)]) -> Result<()> {
        let mut state = self.state.lock();
        let task = state.task_mut(task)?;
        if task.state == TaskState::Running {
            return Err(error(
                TASK_ALREADY_RUNNING,
                "Specified operation cannot be performed while the task is running.",
            ));
        }
        for (scope, id, value) in scope_values {
            task.values.insert((*scope, *id), value.clone());
        }
        Ok(())
    }

    fn acquire(
        &self,
        handle: TaskHandle,
        num_samps_per_chan: i32,
        timeout: f64,
        accepts: fn(&SimKind) -> bool,
        capacity: impl FnOnce(&[SimChannel]) -> Result<usize>,
    ) -> Result<Acquisition> {
        let mut state = self.state.lock();
        let channels = state.task(handle)?.read_channels()?;
        if !channels.iter().all(|c| accepts(&c.kind)) {
            return Err(error(
                CHANNEL_TYPE_MISMATCH,
                "The read function does not match the type of the channels in the task.",
            ));
        }
        state.ensure_started_for_read(handle)?;
        let task = state.task_mut(handle)?;
        let requested = match num_samps_per_chan {
            READ_ALL_AVAILABLE => task.avail_samp_per_chan() as usize,
            n if n < 0 => {
                return Err(error(
                    ErrorCode::InvalidAttributeValue.code(),
                    format!("Number of samples per channel to read is invalid.\n\nRequested Value: {}", n),
                ))
            }
            n => n as usize,
        };
        let capacity = capacity(&channels)?;
        if capacity < requested {
            return Err(DaqError::read_buffer_too_small(format!(
                "The provided buffer holds {} samples per channel, but {} samples per channel were requested.",
                capacity, requested
            )));
        }
        let transferred = if task.is_finite() {
            let remaining = task.samps_per_chan().saturating_sub(task.read_position);
            requested.min(usize::try_from(remaining).unwrap_or(usize::MAX))
        } else {
            requested
        };
        let shortfall = (transferred < requested && timeout != 0.0).then(|| {
            error(
                ErrorCode::SamplesNotYetAvailable.code(),
                "Some or all of the samples requested have not yet been acquired.\n\nTo wait for the samples to become available use a longer read timeout or read later in your program.",
            )
        });
        let first = task.read_position;
        task.read_position += transferred as u64;
        let (t0_ticks, sample_interval) = task.sample_timing(first);
        trace!(task = %task.name, first, requested, transferred, "simulated read");
        Ok(Acquisition {
            channels,
            first,
            requested,
            transferred,
            t0_ticks,
            sample_interval,
            shortfall,
        })
    }

    fn read_with(
        &self,
        task: TaskHandle,
        num_samps_per_chan: i32,
        timeout: f64,
        accepts: fn(&SimKind) -> bool,
        capacity: impl FnOnce(&[SimChannel]) -> Result<usize>,
        fill: impl FnOnce(&Acquisition),
    ) -> Result<usize> {
        let acquisition = self.acquire(task, num_samps_per_chan, timeout, accepts, capacity)?;
        fill(&acquisition);
        acquisition.finish()
    }

    fn read_one<T>(&self, task: TaskHandle, timeout: f64, accepts: fn(&SimKind) -> bool, sample: impl FnOnce(&SimChannel, u64) -> T) -> Result<T> {
        let acquisition = self.acquire(task, 1, timeout, accepts, |_| Ok(1))?;
        let value = sample(acquisition.single()?, acquisition.first);
        acquisition.finish()?;
        Ok(value)
    }

    /// Appends `num_samps_per_chan` samples per output channel.
    fn generate(
        &self,
        handle: TaskHandle,
        num_samps_per_chan: i32,
        auto_start: bool,
        fill_mode: FillMode,
        data_len: usize,
        accepts: fn(&SimKind) -> bool,
        mut sample: impl FnMut(&SimChannel, usize) -> [f64; 2],
    ) -> Result<usize> {
        let mut state = self.state.lock();
        let task = state.task(handle)?;
        let indices: Vec<usize> = (0..task.channels.len()).filter(|&i| !task.channels[i].kind.is_input()).collect();
        if indices.is_empty() {
            return Err(error(
                NO_CHANNELS,
                "Specified operation cannot be performed when there are no output channels in the task.",
            ));
        }
        if !indices.iter().all(|&i| accepts(&task.channels[i].kind)) {
            return Err(error(
                CHANNEL_TYPE_MISMATCH,
                "The write function does not match the type of the channels in the task.",
            ));
        }
        let n = usize::try_from(num_samps_per_chan).map_err(|_| {
            error(
                ErrorCode::InvalidAttributeValue.code(),
                format!("Number of samples per channel to write is invalid.\n\nRequested Value: {}", num_samps_per_chan),
            )
        })?;
        let channels = indices.len();
        if data_len < n * channels {
            return Err(error(
                ErrorCode::WriteBufferTooSmall.code(),
                format!(
                    "The data holds {} samples, but {} samples per channel for {} channels were requested to be written.",
                    data_len, n, channels
                ),
            ));
        }
        if auto_start && task.state != TaskState::Running {
            state.start(handle)?;
        }
        let task = state.task_mut(handle)?;
        for (c, &index) in indices.iter().enumerate() {
            for i in 0..n {
                let at = match fill_mode {
                    FillMode::GroupByChannel => c * n + i,
                    FillMode::GroupByScanNumber => i * channels + c,
                };
                let value = sample(&task.channels[index], at);
                task.channels[index].outputs.push(value);
            }
        }
        task.written += n as u64;
        trace!(task = %task.name, samples = n, "simulated write");
        Ok(n)
    }
}

fn stream_scope(target: &AttributeTarget<'_>) -> Scope {
    match target {
        AttributeTarget::Timing(_) => Scope::Timing,
        AttributeTarget::Trigger(_) => Scope::Trigger,
        AttributeTarget::Read(_) => Scope::Read,
        AttributeTarget::Write(_) => Scope::Write,
        AttributeTarget::Buffer(_) => Scope::Buffer,
        _ => Scope::ExportedSignal,
    }
}

fn check_waveform_count(waveforms: usize, channels: usize) -> Result<()> {
    if waveforms != channels {
        return Err(DaqError::mismatched_sizes(format!(
            "The number of waveforms ({}) does not match the number of channels to read ({}).",
            waveforms, channels
        )));
    }
    Ok(())
}

fn per_chan(len: usize, channels: usize) -> usize {
    if channels == 0 {
        0
    } else {
        len / channels
    }
}

impl Interpreter for SimulatedInterpreter {
    fn create_task(&self, name: &str, behavior: SessionInitializationBehavior) -> Result<(TaskHandle, bool)> {
        let mut state = self.state.lock();
        if name.is_empty() {
            let generated = format!("_unnamedTask<{}>", state.unnamed_tasks);
            state.unnamed_tasks += 1;
            return Ok((state.add_task(generated), true));
        }
        let existing = state.find_task(name);
        match (behavior, existing) {
            (SessionInitializationBehavior::InitializeServerSession, Some(_)) => Err(DaqError::DuplicateTask {
                task_name: name.to_string(),
            }),
            (SessionInitializationBehavior::Auto | SessionInitializationBehavior::AttachToServerSession, Some(handle)) => {
                debug!(task = name, "attached to simulated task");
                Ok((handle, false))
            }
            (SessionInitializationBehavior::AttachToServerSession, None) => {
                if state.persisted_tasks.iter().any(|t| t == name) {
                    Ok((state.add_task(name.to_string()), true))
                } else {
                    Err(DaqError::Driver {
                        code: ErrorCode::InvalidTask,
                        message: format!("Task '{}' does not exist in this session and cannot be attached to.", name),
                        task_name: Some(name.to_string()),
                    })
                }
            }
            (_, None) => Ok((state.add_task(name.to_string()), true)),
        }
    }

    fn clear_task(&self, task: TaskHandle) -> Result<()> {
        let mut state = self.state.lock();
        state.task(task)?;
        state.stop(task)?;
        if let Some(cleared) = state.tasks.remove(&task.as_raw()) {
            debug!(task = %cleared.name, "simulated task cleared");
        }
        Ok(())
    }

    fn start_task(&self, task: TaskHandle) -> Result<()> {
        let mut state = self.state.lock();
        if state.task(task)?.state == TaskState::Running {
            return Err(error(
                TASK_ALREADY_RUNNING,
                "Specified operation cannot be performed while the task is running.",
            ));
        }
        state.start(task)
    }

    fn stop_task(&self, task: TaskHandle) -> Result<()> {
        self.state.lock().stop(task)
    }

    fn task_control(&self, task: TaskHandle, action: TaskMode) -> Result<()> {
        let mut state = self.state.lock();
        match action {
            TaskMode::Start => {
                if state.task(task)?.state == TaskState::Running {
                    return Err(error(
                        TASK_ALREADY_RUNNING,
                        "Specified operation cannot be performed while the task is running.",
                    ));
                }
                state.start(task)
            }
            TaskMode::Stop => state.stop(task),
            TaskMode::Verify => {
                let t = state.task_mut(task)?;
                if t.channels.is_empty() {
                    return Err(error(
                        NO_CHANNELS,
                        "Specified operation cannot be performed when there are no channels in the task.",
                    ));
                }
                t.state = t.state.max(TaskState::Verified);
                Ok(())
            }
            TaskMode::Reserve => state.reserve(task),
            TaskMode::Commit => {
                state.reserve(task)?;
                let t = state.task_mut(task)?;
                t.state = t.state.max(TaskState::Committed);
                Ok(())
            }
            TaskMode::Unreserve => {
                let t = state.task_mut(task)?;
                if t.state == TaskState::Running {
                    return Err(error(
                        TASK_ALREADY_RUNNING,
                        "Specified operation cannot be performed while the task is running.",
                    ));
                }
                t.state = t.state.min(TaskState::Verified);
                Ok(())
            }
            TaskMode::Abort => {
                let t = state.task_mut(task)?;
                t.state = TaskState::Verified;
                t.started = None;
                t.written = 0;
                Ok(())
            }
        }
    }

    fn wait_until_task_done(&self, task: TaskHandle, timeout: f64) -> Result<()> {
        let state = self.state.lock();
        let t = state.task(task)?;
        if t.is_done() {
            return Ok(());
        }
        Err(error(
            ErrorCode::WaitUntilDoneDoesNotIndicateDone.code(),
            format!(
                "Wait Until Done did not indicate that the task was done within the specified timeout.\n\nIncrease the timeout, check the program, and make sure connections for external timing and triggering are in place.\n\nTimeout Specified: {}",
                timeout
            ),
        ))
    }

    fn is_task_done(&self, task: TaskHandle) -> Result<bool> {
        Ok(self.state.lock().task(task)?.is_done())
    }

    fn create_channel(&self, task: TaskHandle, spec: &ChannelSpec) -> Result<()> {
        let mut state = self.state.lock();
        if state.task(task)?.state == TaskState::Running {
            return Err(error(
                TASK_ALREADY_RUNNING,
                "Channels cannot be added while the task is running.",
            ));
        }
        let created = state.channels_for_create(spec)?;
        let t = state.task_mut(task)?;
        for channel in &created {
            if t.channels.iter().any(|c| c.name == channel.name) {
                return Err(error(
                    DUPLICATE_CHANNEL,
                    format!(
                        "Specified channel cannot be added to the task, because a channel with the same name is already in the task.\n\nVirtual Channel Name: {}",
                        channel.name
                    ),
                ));
            }
        }
        debug!(task = %t.name, channels = created.len(), physical = spec.physical_channel(), "simulated channels created");
        t.channels.extend(created);
        t.state = TaskState::Unverified;
        Ok(())
    }

    fn configure_timing(&self, task: TaskHandle, spec: &TimingSpec) -> Result<()> {
        if let Some(rate) = spec.rate() {
            if rate <= 0.0 {
                return Err(error(
                    ErrorCode::InvalidAttributeValue.code(),
                    format!("Requested sample clock rate must be positive.\n\nRequested Value: {}", rate),
                ));
            }
        }
        let mut values = vec![
            (Scope::Timing, timing::SAMP_TIMING_TYPE.id, SimValue::I32(spec.timing_type().value())),
            (Scope::Timing, timing::SAMP_QUANT_SAMP_MODE.id, SimValue::I32(spec.sample_mode().value())),
            (Scope::Timing, timing::SAMP_QUANT_SAMP_PER_CHAN.id, SimValue::U64(spec.samps_per_chan())),
        ];
        if let Some(rate) = spec.rate() {
            values.push((Scope::Timing, timing::SAMP_CLK_RATE.id, SimValue::F64(rate)));
        }
        match spec {
            TimingSpec::SampleClock { source, active_edge, .. } | TimingSpec::PipelinedSampleClock { source, active_edge, .. } => {
                let source = if source.is_empty() { "OnboardClock" } else { source.as_str() };
                values.push((Scope::Timing, timing::SAMP_CLK_SRC.id, SimValue::Str(source.to_string())));
                values.push((Scope::Timing, timing::SAMP_CLK_ACTIVE_EDGE.id, SimValue::I32(active_edge.value())));
            }
            TimingSpec::BurstHandshakingImportClock {
                sample_clk_src,
                sample_clk_active_edge,
                ..
            } => {
                values.push((Scope::Timing, timing::SAMP_CLK_SRC.id, SimValue::Str(sample_clk_src.clone())));
                values.push((
                    Scope::Timing,
                    timing::SAMP_CLK_ACTIVE_EDGE.id,
                    SimValue::I32(sample_clk_active_edge.value()),
                ));
            }
            TimingSpec::BurstHandshakingExportClock { sample_clk_outp_term, .. } => {
                values.push((
                    Scope::ExportedSignal,
                    exported_signal::SAMP_CLK_OUTPUT_TERM.id,
                    SimValue::Str(sample_clk_outp_term.clone()),
                ));
            }
            _ => {}
        }
        self.set_many(task, &values)
    }

    fn configure_trigger(&self, task: TaskHandle, spec: &TriggerSpec) -> Result<()> {
        let values = match spec {
            TriggerSpec::DigitalEdgeStart { source, edge } => {
                self.state.lock().check_terminal(source)?;
                vec![
                    (Scope::Trigger, trigger::START_TRIG_TYPE.id, SimValue::I32(TriggerType::DigitalEdge.value())),
                    (Scope::Trigger, trigger::DIG_EDGE_START_TRIG_SRC.id, SimValue::Str(source.clone())),
                    (Scope::Trigger, trigger::DIG_EDGE_START_TRIG_EDGE.id, SimValue::I32(edge.value())),
                ]
            }
            TriggerSpec::AnalogEdgeStart { source, slope, level } => vec![
                (Scope::Trigger, trigger::START_TRIG_TYPE.id, SimValue::I32(TriggerType::AnalogEdge.value())),
                (Scope::Trigger, trigger::ANLG_EDGE_START_TRIG_SRC.id, SimValue::Str(source.clone())),
                (Scope::Trigger, trigger::ANLG_EDGE_START_TRIG_SLOPE.id, SimValue::I32(slope.value())),
                (Scope::Trigger, trigger::ANLG_EDGE_START_TRIG_LVL.id, SimValue::F64(*level)),
            ],
            TriggerSpec::DisableStart => vec![(
                Scope::Trigger,
                trigger::START_TRIG_TYPE.id,
                SimValue::I32(TriggerType::None.value()),
            )],
            TriggerSpec::DigitalEdgeReference {
                source,
                edge,
                pretrigger_samples,
            } => {
                self.state.lock().check_terminal(source)?;
                vec![
                    (Scope::Trigger, trigger::REF_TRIG_TYPE.id, SimValue::I32(TriggerType::DigitalEdge.value())),
                    (Scope::Trigger, trigger::DIG_EDGE_REF_TRIG_SRC.id, SimValue::Str(source.clone())),
                    (Scope::Trigger, trigger::DIG_EDGE_REF_TRIG_EDGE.id, SimValue::I32(edge.value())),
                    (Scope::Trigger, trigger::REF_TRIG_PRETRIG_SAMPLES.id, SimValue::U32(*pretrigger_samples)),
                ]
            }
            TriggerSpec::DisableReference => vec![(
                Scope::Trigger,
                trigger::REF_TRIG_TYPE.id,
                SimValue::I32(TriggerType::None.value()),
            )],
        };
        self.set_many(task, &values)
    }

    fn export_signal(&self, task: TaskHandle, signal: Signal, output_terminal: &str) -> Result<()> {
        self.state.lock().check_terminal(output_terminal)?;
        let id = match signal {
            Signal::SampleClock => exported_signal::SAMP_CLK_OUTPUT_TERM.id,
            Signal::StartTrigger => exported_signal::START_TRIG_OUTPUT_TERM.id,
            Signal::ReferenceTrigger => exported_signal::REF_TRIG_OUTPUT_TERM.id,
            Signal::TenMhzReferenceClock => exported_signal::TEN_MHZ_REF_CLK_OUTPUT_TERM.id,
        };
        self.set_many(task, &[(Scope::ExportedSignal, id, SimValue::Str(output_terminal.to_string()))])
    }

    fn connect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.check_terminal(source_terminal)?;
        state.check_terminal(destination_terminal)?;
        if let Some((other, _)) = state
            .routes
            .iter()
            .find(|(src, dst)| dst == destination_terminal && src != source_terminal)
        {
            return Err(error(
                ROUTE_IN_USE,
                format!(
                    "Specified route cannot be satisfied, because it requires resources that are currently in use by another route.\n\nSource Device: {}\nDestination Terminal: {}",
                    other, destination_terminal
                ),
            ));
        }
        debug!(source_terminal, destination_terminal, "simulated route connected");
        state
            .routes
            .insert((source_terminal.to_string(), destination_terminal.to_string()));
        Ok(())
    }

    fn disconnect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.check_terminal(source_terminal)?;
        state.check_terminal(destination_terminal)?;
        state
            .routes
            .remove(&(source_terminal.to_string(), destination_terminal.to_string()));
        Ok(())
    }

    fn reset_device(&self, device_name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.device(device_name)?;
        for task in state.tasks.values_mut() {
            if task.channels.iter().any(|c| c.device == device_name) {
                task.state = TaskState::Verified;
                task.started = None;
            }
        }
        let prefix = format!("/{}/", device_name);
        state
            .routes
            .retain(|(src, dst)| !src.starts_with(&prefix) && !dst.starts_with(&prefix));
        debug!(device = device_name, "simulated device reset");
        Ok(())
    }

    fn get_attribute_bool(&self, target: AttributeTarget<'_>, id: i32) -> Result<bool> {
        self.lookup(&target, id)?.as_bool().ok_or_else(|| wrong_type(&target, id))
    }

    fn get_attribute_i32(&self, target: AttributeTarget<'_>, id: i32) -> Result<i32> {
        self.lookup(&target, id)?.as_i32().ok_or_else(|| wrong_type(&target, id))
    }

    fn get_attribute_u32(&self, target: AttributeTarget<'_>, id: i32) -> Result<u32> {
        self.lookup(&target, id)?.as_u32().ok_or_else(|| wrong_type(&target, id))
    }

    fn get_attribute_u64(&self, target: AttributeTarget<'_>, id: i32) -> Result<u64> {
        self.lookup(&target, id)?.as_u64().ok_or_else(|| wrong_type(&target, id))
    }

    fn get_attribute_f64(&self, target: AttributeTarget<'_>, id: i32) -> Result<f64> {
        self.lookup(&target, id)?.as_f64().ok_or_else(|| wrong_type(&target, id))
    }

    fn get_attribute_string(&self, target: AttributeTarget<'_>, id: i32) -> Result<String> {
        match self.lookup(&target, id)? {
            SimValue::Str(value) => Ok(value),
            _ => Err(wrong_type(&target, id)),
        }
    }

    fn get_attribute_i32_list(&self, target: AttributeTarget<'_>, id: i32) -> Result<Vec<i32>> {
        match self.lookup(&target, id)? {
            SimValue::I32List(values) => Ok(values),
            _ => Err(wrong_type(&target, id)),
        }
    }

    fn set_attribute_bool(&self, target: AttributeTarget<'_>, id: i32, value: bool) -> Result<()> {
        self.store(&target, id, Some(SimValue::Bool(value)))
    }

    fn set_attribute_i32(&self, target: AttributeTarget<'_>, id: i32, value: i32) -> Result<()> {
        self.store(&target, id, Some(SimValue::I32(value)))
    }

    fn set_attribute_u32(&self, target: AttributeTarget<'_>, id: i32, value: u32) -> Result<()> {
        self.store(&target, id, Some(SimValue::U32(value)))
    }

    fn set_attribute_u64(&self, target: AttributeTarget<'_>, id: i32, value: u64) -> Result<()> {
        self.store(&target, id, Some(SimValue::U64(value)))
    }

    fn set_attribute_f64(&self, target: AttributeTarget<'_>, id: i32, value: f64) -> Result<()> {
        self.store(&target, id, Some(SimValue::F64(value)))
    }

    fn set_attribute_string(&self, target: AttributeTarget<'_>, id: i32, value: &str) -> Result<()> {
        self.store(&target, id, Some(SimValue::Str(value.to_string())))
    }

    fn reset_attribute(&self, target: AttributeTarget<'_>, id: i32) -> Result<()> {
        self.store(&target, id, None)
    }

    fn read_analog_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: &mut [f64]) -> Result<usize> {
        let len = data.len();
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_ai_voltage,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| acq.for_each(fill_mode, |at, channel, _| data[at] = channel.voltage()),
        )
    }

    fn read_analog_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<f64> {
        self.read_one(task, timeout, is_ai_voltage, |channel, _| channel.voltage())
    }

    fn read_binary(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: BinaryBufferMut<'_>) -> Result<usize> {
        let len = data.len();
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_ai_voltage,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| match data {
                BinaryBufferMut::I16(data) => acq.for_each(fill_mode, |at, c, _| data[at] = unscaled(c.voltage()) as i16),
                BinaryBufferMut::U16(data) => acq.for_each(fill_mode, |at, c, _| data[at] = unscaled(c.voltage()) as u16),
                BinaryBufferMut::I32(data) => acq.for_each(fill_mode, |at, c, _| data[at] = unscaled(c.voltage()) as i32),
                BinaryBufferMut::U32(data) => acq.for_each(fill_mode, |at, c, _| data[at] = unscaled(c.voltage()) as u32),
            },
        )
    }

    fn read_digital_lines(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: &mut [u8]) -> Result<(usize, usize)> {
        let len = data.len();
        let mut bytes_per_samp = 0;
        let acquisition = self.acquire(task, num_samps_per_chan, timeout, is_digital_input, |channels| {
            bytes_per_samp = channels.iter().map(SimChannel::num_lines).max().unwrap_or(0);
            Ok(per_chan(len, channels.len() * bytes_per_samp))
        })?;
        acquisition.for_each(fill_mode, |at, channel, k| {
            for line in 0..channel.num_lines() {
                data[at * bytes_per_samp + line] = channel.line_state(line, k);
            }
        });
        let read = acquisition.finish()?;
        Ok((read, bytes_per_samp))
    }

    fn read_digital_port(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: PortBufferMut<'_>) -> Result<usize> {
        let len = data.len();
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_digital_input,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| match data {
                PortBufferMut::U8(data) => acq.for_each(fill_mode, |at, c, k| data[at] = c.port_value(k) as u8),
                PortBufferMut::U16(data) => acq.for_each(fill_mode, |at, c, k| data[at] = c.port_value(k) as u16),
                PortBufferMut::U32(data) => acq.for_each(fill_mode, |at, c, k| data[at] = c.port_value(k)),
            },
        )
    }

    fn read_digital_scalar_u32(&self, task: TaskHandle, timeout: f64) -> Result<u32> {
        self.read_one(task, timeout, is_digital_input, SimChannel::port_value)
    }

    fn read_counter_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, data: &mut [f64]) -> Result<usize> {
        let len = data.len();
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_counter_input,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| acq.for_each(FillMode::GroupByChannel, |at, c, k| data[at] = c.counter_value(k)),
        )
    }

    fn read_counter_u32(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, data: &mut [u32]) -> Result<usize> {
        let len = data.len();
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_counter_input,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| acq.for_each(FillMode::GroupByChannel, |at, c, k| data[at] = c.counter_value_u32(k)),
        )
    }

    fn read_counter_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<f64> {
        self.read_one(task, timeout, is_counter_input, SimChannel::counter_value)
    }

    fn read_counter_scalar_u32(&self, task: TaskHandle, timeout: f64) -> Result<u32> {
        self.read_one(task, timeout, is_counter_input, SimChannel::counter_value_u32)
    }

    fn read_ctr_freq(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, frequency: &mut [f64], duty_cycle: &mut [f64]) -> Result<usize> {
        let len = frequency.len().min(duty_cycle.len());
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_counter_input,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| {
                acq.for_each(fill_mode, |at, _, _| {
                    frequency[at] = TIMEBASE_FREQUENCY;
                    duty_cycle[at] = 0.5;
                })
            },
        )
    }

    fn read_ctr_time(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, high_time: &mut [f64], low_time: &mut [f64]) -> Result<usize> {
        let len = high_time.len().min(low_time.len());
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_counter_input,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| {
                acq.for_each(fill_mode, |at, _, _| {
                    high_time[at] = 0.5 / TIMEBASE_FREQUENCY;
                    low_time[at] = 0.5 / TIMEBASE_FREQUENCY;
                })
            },
        )
    }

    fn read_ctr_ticks(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, high_ticks: &mut [u32], low_ticks: &mut [u32]) -> Result<usize> {
        let len = high_ticks.len().min(low_ticks.len());
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_counter_input,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| {
                acq.for_each(fill_mode, |at, _, _| {
                    high_ticks[at] = TIMEBASE_TICKS_PER_HALF_PERIOD;
                    low_ticks[at] = TIMEBASE_TICKS_PER_HALF_PERIOD;
                })
            },
        )
    }

    fn read_ctr_freq_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)> {
        self.read_one(task, timeout, is_counter_input, |_, _| (TIMEBASE_FREQUENCY, 0.5))
    }

    fn read_ctr_time_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)> {
        self.read_one(task, timeout, is_counter_input, |_, _| {
            (0.5 / TIMEBASE_FREQUENCY, 0.5 / TIMEBASE_FREQUENCY)
        })
    }

    fn read_ctr_ticks_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(u32, u32)> {
        self.read_one(task, timeout, is_counter_input, |_, _| {
            (TIMEBASE_TICKS_PER_HALF_PERIOD, TIMEBASE_TICKS_PER_HALF_PERIOD)
        })
    }

    fn read_power_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, voltage: &mut [f64], current: &mut [f64]) -> Result<usize> {
        let len = voltage.len().min(current.len());
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_ai_power,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| {
                acq.for_each(fill_mode, |at, c, _| {
                    voltage[at] = c.voltage();
                    current[at] = c.current();
                })
            },
        )
    }

    fn read_power_binary_i16(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, voltage: &mut [i16], current: &mut [i16]) -> Result<usize> {
        let len = voltage.len().min(current.len());
        self.read_with(
            task,
            num_samps_per_chan,
            timeout,
            is_ai_power,
            |channels| Ok(per_chan(len, channels.len())),
            |acq| {
                acq.for_each(fill_mode, |at, c, _| {
                    voltage[at] = unscaled(c.voltage()) as i16;
                    current[at] = unscaled(c.current()) as i16;
                })
            },
        )
    }

    fn read_power_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)> {
        self.read_one(task, timeout, is_ai_power, |c, _| (c.voltage(), c.current()))
    }

    fn read_analog_waveforms(
        &self,
        task: TaskHandle,
        num_samps_per_chan: i32,
        timeout: f64,
        mode: WaveformAttributeMode,
        buffers: &mut [&mut [f64]],
        metadata: &mut [WaveformMetadata],
    ) -> Result<usize> {
        let count = buffers.len();
        let len = buffers.iter().map(|b| b.len()).min().unwrap_or(0);
        let waveforms = metadata.len();
        let acquisition = self.acquire(task, num_samps_per_chan, timeout, is_ai_voltage, |channels| {
            check_waveform_count(count, channels.len())?;
            check_waveform_count(waveforms, channels.len())?;
            Ok(len)
        })?;
        for (buffer, channel) in buffers.iter_mut().zip(&acquisition.channels) {
            for value in buffer.iter_mut().take(acquisition.transferred) {
                *value = channel.voltage();
            }
        }
        acquisition.metadata(mode, metadata);
        acquisition.finish()
    }

    fn read_digital_waveforms(
        &self,
        task: TaskHandle,
        num_samps_per_chan: i32,
        timeout: f64,
        mode: WaveformAttributeMode,
        bytes_per_chan: &[u32],
        data: &mut [u8],
        metadata: &mut [WaveformMetadata],
    ) -> Result<usize> {
        let total_bytes: usize = bytes_per_chan.iter().map(|&b| b as usize).sum();
        let len = data.len();
        let waveforms = metadata.len();
        let acquisition = self.acquire(task, num_samps_per_chan, timeout, is_digital_input, |channels| {
            check_waveform_count(bytes_per_chan.len(), channels.len())?;
            check_waveform_count(waveforms, channels.len())?;
            Ok(per_chan(len, total_bytes))
        })?;
        let mut offset = 0;
        for (channel, &bytes) in acquisition.channels.iter().zip(bytes_per_chan) {
            let bytes = bytes as usize;
            for i in 0..acquisition.transferred {
                for line in 0..channel.num_lines().min(bytes) {
                    data[offset + i * bytes + line] = channel.line_state(line, acquisition.first + i as u64);
                }
            }
            offset += acquisition.requested * bytes;
        }
        acquisition.metadata(mode, metadata);
        acquisition.finish()
    }

    fn write_analog_f64(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, data: &[f64]) -> Result<usize> {
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, data.len(), is_analog_output, |_, at| {
            [data[at], 0.0]
        })
    }

    fn write_analog_scalar_f64(&self, task: TaskHandle, auto_start: bool, _timeout: f64, value: f64) -> Result<()> {
        self.generate(task, 1, auto_start, FillMode::GroupByChannel, 1, is_analog_output, |_, _| [value, 0.0])
            .map(|_| ())
    }

    fn write_binary(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, data: BinaryBuffer<'_>) -> Result<usize> {
        let volts = |code: f64| code / CODES_PER_VOLT;
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, data.len(), is_analog_output, |_, at| {
            let code = match &data {
                BinaryBuffer::I16(d) => f64::from(d[at]),
                BinaryBuffer::U16(d) => f64::from(d[at]),
                BinaryBuffer::I32(d) => f64::from(d[at]),
                BinaryBuffer::U32(d) => f64::from(d[at]),
            };
            [volts(code), 0.0]
        })
    }

    fn write_digital_lines(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, data: &[u8]) -> Result<usize> {
        let bytes_per_samp = {
            let state = self.state.lock();
            let t = state.task(task)?;
            t.channels.iter().filter(|c| !c.kind.is_input()).map(SimChannel::num_lines).max().unwrap_or(0)
        };
        let samples = if bytes_per_samp == 0 { 0 } else { data.len() / bytes_per_samp };
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, samples, is_digital_output, |channel, at| {
            let start = at * bytes_per_samp;
            let lines = &data[start..start + channel.num_lines()];
            [f64::from(lines_to_port(lines)), 0.0]
        })
    }

    fn write_digital_port(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, data: PortBuffer<'_>) -> Result<usize> {
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, data.len(), is_digital_output, |_, at| {
            let value = match &data {
                PortBuffer::U8(d) => u32::from(d[at]),
                PortBuffer::U16(d) => u32::from(d[at]),
                PortBuffer::U32(d) => d[at],
            };
            [f64::from(value), 0.0]
        })
    }

    fn write_digital_scalar_u32(&self, task: TaskHandle, auto_start: bool, _timeout: f64, value: u32) -> Result<()> {
        self.generate(task, 1, auto_start, FillMode::GroupByChannel, 1, is_digital_output, |_, _| {
            [f64::from(value), 0.0]
        })
        .map(|_| ())
    }

    fn write_ctr_freq(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, frequency: &[f64], duty_cycle: &[f64]) -> Result<usize> {
        let len = frequency.len().min(duty_cycle.len());
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, len, is_counter_output, |_, at| {
            [frequency[at], duty_cycle[at]]
        })
    }

    fn write_ctr_time(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, high_time: &[f64], low_time: &[f64]) -> Result<usize> {
        let len = high_time.len().min(low_time.len());
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, len, is_counter_output, |_, at| {
            [high_time[at], low_time[at]]
        })
    }

    fn write_ctr_ticks(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, _timeout: f64, fill_mode: FillMode, high_ticks: &[u32], low_ticks: &[u32]) -> Result<usize> {
        let len = high_ticks.len().min(low_ticks.len());
        self.generate(task, num_samps_per_chan, auto_start, fill_mode, len, is_counter_output, |_, at| {
            [f64::from(high_ticks[at]), f64::from(low_ticks[at])]
        })
    }

    fn write_ctr_freq_scalar(&self, task: TaskHandle, auto_start: bool, _timeout: f64, frequency: f64, duty_cycle: f64) -> Result<()> {
        self.generate(task, 1, auto_start, FillMode::GroupByChannel, 1, is_counter_output, |_, _| [frequency, duty_cycle])
            .map(|_| ())
    }

    fn write_ctr_time_scalar(&self, task: TaskHandle, auto_start: bool, _timeout: f64, high_time: f64, low_time: f64) -> Result<()> {
        self.generate(task, 1, auto_start, FillMode::GroupByChannel, 1, is_counter_output, |_, _| [high_time, low_time])
            .map(|_| ())
    }

    fn write_ctr_ticks_scalar(&self, task: TaskHandle, auto_start: bool, _timeout: f64, high_ticks: u32, low_ticks: u32) -> Result<()> {
        self.generate(task, 1, auto_start, FillMode::GroupByChannel, 1, is_counter_output, |_, _| {
            [f64::from(high_ticks), f64::from(low_ticks)]
        })
        .map(|_| ())
    }

    fn take_warnings(&self) -> Vec<DaqWarning> {
        std::mem::take(&mut self.state.lock().warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai_task(sim: &SimulatedInterpreter, physical: &str) -> TaskHandle {
        let (task, created) = sim.create_task("", SessionInitializationBehavior::Auto).unwrap();
        assert!(created);
        sim.create_channel(
            task,
            &ChannelSpec::AiVoltage {
                physical_channel: physical.to_string(),
                name_to_assign: String::new(),
                terminal_config: TerminalConfiguration::Default,
                min_val: -10.0,
                max_val: 10.0,
                units: VoltageUnits::Volts,
                custom_scale_name: String::new(),
            },
        )
        .unwrap();
        task
    }

    fn finite(sim: &SimulatedInterpreter, task: TaskHandle, rate: f64, samps: u64) {
        sim.configure_timing(
            task,
            &TimingSpec::SampleClock {
                rate,
                source: String::new(),
                active_edge: Edge::Rising,
                sample_mode: AcquisitionType::Finite,
                samps_per_chan: samps,
            },
        )
        .unwrap();
    }

    #[test]
    fn analog_inputs_read_their_index_plus_one() {
        let sim = SimulatedInterpreter::new();
        let task = ai_task(&sim, "Dev1/ai0:2");
        let mut data = vec![0.0; 6];
        let read = sim
            .read_analog_f64(task, 2, 10.0, FillMode::GroupByScanNumber, &mut data)
            .unwrap();
        assert_eq!(read, 2);
        assert_eq!(data, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn finite_read_past_end_times_out_with_partial_count() {
        let sim = SimulatedInterpreter::new();
        let task = ai_task(&sim, "Dev1/ai0");
        finite(&sim, task, 1000.0, 5);
        let mut data = vec![0.0; 8];
        let err = sim
            .read_analog_f64(task, 8, 1.0, FillMode::GroupByChannel, &mut data)
            .unwrap_err();
        assert!(matches!(err, DaqError::Timeout { samples_transferred: 5, .. }));
        // Nothing left; a zero timeout returns what is there.
        assert_eq!(sim.read_analog_f64(task, 8, 0.0, FillMode::GroupByChannel, &mut data).unwrap(), 0);
    }

    #[test]
    fn undersized_buffer_is_rejected_before_reading() {
        let sim = SimulatedInterpreter::new();
        let task = ai_task(&sim, "Dev1/ai0:1");
        let mut data = vec![-7.0; 3];
        let err = sim
            .read_analog_f64(task, 2, 1.0, FillMode::GroupByChannel, &mut data)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReadBufferTooSmall);
        assert_eq!(data, vec![-7.0; 3]);
    }

    #[test]
    fn timing_attributes_reject_changes_while_running() {
        let sim = SimulatedInterpreter::new();
        let task = ai_task(&sim, "Dev1/ai0");
        finite(&sim, task, 1000.0, 10);
        sim.start_task(task).unwrap();
        let err = sim
            .set_attribute_f64(AttributeTarget::Timing(task), timing::SAMP_CLK_RATE.id, 2000.0)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PropertyNotSettableWhenTaskRunning);
        // Stream attributes remain settable.
        sim.set_attribute_i32(AttributeTarget::Read(task), read::OFFSET.id, 3).unwrap();
        sim.stop_task(task).unwrap();
        sim.reset_attribute(AttributeTarget::Timing(task), timing::SAMP_CLK_RATE.id)
            .unwrap();
        assert_eq!(
            sim.get_attribute_f64(AttributeTarget::Timing(task), timing::SAMP_CLK_RATE.id).unwrap(),
            1000.0
        );
    }

    #[test]
    fn overlapping_tasks_conflict_on_start() {
        let sim = SimulatedInterpreter::new();
        let first = ai_task(&sim, "Dev1/ai0:1");
        let second = ai_task(&sim, "Dev1/ai1");
        sim.start_task(first).unwrap();
        let err = sim.start_task(second).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResourceReserved);
        sim.stop_task(first).unwrap();
        sim.start_task(second).unwrap();
    }

    #[test]
    fn port_channel_counts() {
        let sim = SimulatedInterpreter::new();
        let (task, _) = sim.create_task("port", SessionInitializationBehavior::Auto).unwrap();
        sim.create_channel(
            task,
            &ChannelSpec::Di {
                lines: "Dev1/port0/line0:3".to_string(),
                name_to_assign: String::new(),
                line_grouping: LineGrouping::ChanForAllLines,
            },
        )
        .unwrap();
        let mut data = [0u8; 20];
        sim.read_digital_port(task, 20, 1.0, FillMode::GroupByChannel, PortBufferMut::U8(&mut data))
            .unwrap();
        let expected: Vec<u8> = (0..20u8).map(|k| k & 0x0F).collect();
        assert_eq!(data.to_vec(), expected);
    }

    #[test]
    fn stopping_an_unfinished_generation_warns() {
        let sim = SimulatedInterpreter::new();
        let (task, _) = sim.create_task("ao", SessionInitializationBehavior::Auto).unwrap();
        sim.create_channel(
            task,
            &ChannelSpec::AoVoltage {
                physical_channel: "Dev1/ao0".to_string(),
                name_to_assign: "out".to_string(),
                min_val: -10.0,
                max_val: 10.0,
                units: VoltageUnits::Volts,
                custom_scale_name: String::new(),
            },
        )
        .unwrap();
        finite(&sim, task, 1000.0, 100);
        sim.write_analog_f64(task, 3, true, 1.0, FillMode::GroupByChannel, &[0.5, 1.5, 2.5])
            .unwrap();
        assert_eq!(sim.written_samples(task, "out").unwrap(), vec![0.5, 1.5, 2.5]);
        sim.stop_task(task).unwrap();
        let warnings = sim.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, FINITE_STOPPED_EARLY);
        assert!(sim.take_warnings().is_empty());
    }

    #[test]
    fn sessions_follow_initialization_behavior() {
        let sim = SimulatedInterpreter::new().with_persisted_task("saved");
        let (first, created) = sim.create_task("shared", SessionInitializationBehavior::Auto).unwrap();
        assert!(created);
        let (again, created) = sim.create_task("shared", SessionInitializationBehavior::Auto).unwrap();
        assert_eq!((again, created), (first, false));
        assert!(matches!(
            sim.create_task("shared", SessionInitializationBehavior::InitializeServerSession),
            Err(DaqError::DuplicateTask { .. })
        ));
        assert!(sim
            .create_task("missing", SessionInitializationBehavior::AttachToServerSession)
            .is_err());
        assert!(sim
            .create_task("saved", SessionInitializationBehavior::AttachToServerSession)
            .unwrap()
            .1);
    }
}
