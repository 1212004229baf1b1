//! The dispatch seam between the typed binding and whatever executes driver operations.
//!
//! ## Overview
//!
//! Every driver operation the binding issues goes through the [`Interpreter`] trait. Two
//! implementations ship with the crate:
//!
//! - [`LibraryInterpreter`](crate::library_interpreter::LibraryInterpreter) forwards each operation
//!   to the NI-DAQmx shared library through the function table in [`nidaqmx`](crate::nidaqmx).
//! - [`SimulatedInterpreter`](crate::simulated::SimulatedInterpreter) executes the same operation
//!   set in-process against deterministic simulated devices.
//!
//! A remote (session-based) dispatcher only has to implement the same trait; the session choice a
//! task was created with is carried by [`SessionInitializationBehavior`].
//!
//! ## Vocabulary
//!
//! Channel creation, timing configuration and trigger configuration are each expressed as one
//! enum ([`ChannelSpec`], [`TimingSpec`], [`TriggerSpec`]) whose variants hold the arguments of
//! the corresponding `DAQmxCreate*Chan` / `DAQmxCfg*` call. Attribute access is addressed by an
//! [`AttributeTarget`] (scope plus the handle or name the scope needs) and a numeric id.
//!
//! Sample arrays cross the seam as plain slices. Families of entry points that only differ in
//! element type take a typed buffer enum ([`BinaryBufferMut`], [`PortBufferMut`], ...), so that
//! the element type selects the entry point.

use niwaveform_backend::ExtendedProperties;
use std::fmt;

use crate::constants::*;
use crate::error::{DaqWarning, Result};

/// Opaque driver task handle.
///
/// The value is pointer-sized. Drivers up to version 8.8 hand out 32-bit handles; those are
/// stored zero-extended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(usize);

impl TaskHandle {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// How a task name is resolved against the tasks already known to a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionInitializationBehavior {
    /// Attach to a task with the same name if one exists, otherwise create it.
    #[default]
    Auto,
    /// Always create a new task; an existing task with the same name is an error.
    InitializeServerSession,
    /// Attach to an existing task; a missing task is an error.
    AttachToServerSession,
}

/// Scope an attribute lives in, together with what the scope is addressed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeTarget<'a> {
    System,
    Task(TaskHandle),
    Channel(TaskHandle, &'a str),
    Timing(TaskHandle),
    Trigger(TaskHandle),
    Read(TaskHandle),
    Write(TaskHandle),
    Buffer(TaskHandle),
    ExportedSignal(TaskHandle),
    Device(&'a str),
    PhysicalChannel(&'a str),
}

impl AttributeTarget<'_> {
    /// Handle of the task the scope belongs to, if any.
    pub fn task(&self) -> Option<TaskHandle> {
        match *self {
            AttributeTarget::Task(h)
            | AttributeTarget::Channel(h, _)
            | AttributeTarget::Timing(h)
            | AttributeTarget::Trigger(h)
            | AttributeTarget::Read(h)
            | AttributeTarget::Write(h)
            | AttributeTarget::Buffer(h)
            | AttributeTarget::ExportedSignal(h) => Some(h),
            AttributeTarget::System | AttributeTarget::Device(_) | AttributeTarget::PhysicalChannel(_) => None,
        }
    }

    pub fn scope_name(&self) -> &'static str {
        match self {
            AttributeTarget::System => "system",
            AttributeTarget::Task(_) => "task",
            AttributeTarget::Channel(..) => "channel",
            AttributeTarget::Timing(_) => "timing",
            AttributeTarget::Trigger(_) => "trigger",
            AttributeTarget::Read(_) => "read",
            AttributeTarget::Write(_) => "write",
            AttributeTarget::Buffer(_) => "buffer",
            AttributeTarget::ExportedSignal(_) => "exported signal",
            AttributeTarget::Device(_) => "device",
            AttributeTarget::PhysicalChannel(_) => "physical channel",
        }
    }
}

/// Arguments of one `DAQmxCreate*Chan` call.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelSpec {
    AiVoltage {
        physical_channel: String,
        name_to_assign: String,
        terminal_config: TerminalConfiguration,
        min_val: f64,
        max_val: f64,
        units: VoltageUnits,
        custom_scale_name: String,
    },
    AiPower {
        physical_channel: String,
        name_to_assign: String,
        voltage_setpoint: f64,
        current_setpoint: f64,
        output_enable: bool,
    },
    AoVoltage {
        physical_channel: String,
        name_to_assign: String,
        min_val: f64,
        max_val: f64,
        units: VoltageUnits,
        custom_scale_name: String,
    },
    Di {
        lines: String,
        name_to_assign: String,
        line_grouping: LineGrouping,
    },
    Do {
        lines: String,
        name_to_assign: String,
        line_grouping: LineGrouping,
    },
    CiCountEdges {
        counter: String,
        name_to_assign: String,
        edge: Edge,
        initial_count: u32,
        count_direction: CountDirection,
    },
    CiFreq {
        counter: String,
        name_to_assign: String,
        min_val: f64,
        max_val: f64,
        units: FrequencyUnits,
        edge: Edge,
        meas_method: CounterFrequencyMethod,
        meas_time: f64,
        divisor: u32,
        custom_scale_name: String,
    },
    CiPeriod {
        counter: String,
        name_to_assign: String,
        min_val: f64,
        max_val: f64,
        units: TimeUnits,
        edge: Edge,
        meas_method: CounterFrequencyMethod,
        meas_time: f64,
        divisor: u32,
        custom_scale_name: String,
    },
    CiPulseFreq {
        counter: String,
        name_to_assign: String,
        min_val: f64,
        max_val: f64,
        units: FrequencyUnits,
    },
    CiPulseTime {
        counter: String,
        name_to_assign: String,
        min_val: f64,
        max_val: f64,
        units: TimeUnits,
    },
    CiPulseTicks {
        counter: String,
        name_to_assign: String,
        source_terminal: String,
        min_val: f64,
        max_val: f64,
    },
    CoPulseFreq {
        counter: String,
        name_to_assign: String,
        units: FrequencyUnits,
        idle_state: Level,
        initial_delay: f64,
        freq: f64,
        duty_cycle: f64,
    },
    CoPulseTime {
        counter: String,
        name_to_assign: String,
        units: TimeUnits,
        idle_state: Level,
        initial_delay: f64,
        low_time: f64,
        high_time: f64,
    },
    CoPulseTicks {
        counter: String,
        name_to_assign: String,
        source_terminal: String,
        idle_state: Level,
        initial_delay: i32,
        low_ticks: i32,
        high_ticks: i32,
    },
}

impl ChannelSpec {
    /// Channel type the driver assigns to channels created from this spec.
    pub fn channel_type(&self) -> ChannelType {
        match self {
            ChannelSpec::AiVoltage { .. } | ChannelSpec::AiPower { .. } => ChannelType::AnalogInput,
            ChannelSpec::AoVoltage { .. } => ChannelType::AnalogOutput,
            ChannelSpec::Di { .. } => ChannelType::DigitalInput,
            ChannelSpec::Do { .. } => ChannelType::DigitalOutput,
            ChannelSpec::CiCountEdges { .. }
            | ChannelSpec::CiFreq { .. }
            | ChannelSpec::CiPeriod { .. }
            | ChannelSpec::CiPulseFreq { .. }
            | ChannelSpec::CiPulseTime { .. }
            | ChannelSpec::CiPulseTicks { .. } => ChannelType::CounterInput,
            ChannelSpec::CoPulseFreq { .. } | ChannelSpec::CoPulseTime { .. } | ChannelSpec::CoPulseTicks { .. } => {
                ChannelType::CounterOutput
            }
        }
    }

    /// Physical channel (or line/counter list) string passed to the driver.
    pub fn physical_channel(&self) -> &str {
        match self {
            ChannelSpec::AiVoltage { physical_channel, .. }
            | ChannelSpec::AiPower { physical_channel, .. }
            | ChannelSpec::AoVoltage { physical_channel, .. } => physical_channel,
            ChannelSpec::Di { lines, .. } | ChannelSpec::Do { lines, .. } => lines,
            ChannelSpec::CiCountEdges { counter, .. }
            | ChannelSpec::CiFreq { counter, .. }
            | ChannelSpec::CiPeriod { counter, .. }
            | ChannelSpec::CiPulseFreq { counter, .. }
            | ChannelSpec::CiPulseTime { counter, .. }
            | ChannelSpec::CiPulseTicks { counter, .. }
            | ChannelSpec::CoPulseFreq { counter, .. }
            | ChannelSpec::CoPulseTime { counter, .. }
            | ChannelSpec::CoPulseTicks { counter, .. } => counter,
        }
    }

    pub fn name_to_assign(&self) -> &str {
        match self {
            ChannelSpec::AiVoltage { name_to_assign, .. }
            | ChannelSpec::AiPower { name_to_assign, .. }
            | ChannelSpec::AoVoltage { name_to_assign, .. }
            | ChannelSpec::Di { name_to_assign, .. }
            | ChannelSpec::Do { name_to_assign, .. }
            | ChannelSpec::CiCountEdges { name_to_assign, .. }
            | ChannelSpec::CiFreq { name_to_assign, .. }
            | ChannelSpec::CiPeriod { name_to_assign, .. }
            | ChannelSpec::CiPulseFreq { name_to_assign, .. }
            | ChannelSpec::CiPulseTime { name_to_assign, .. }
            | ChannelSpec::CiPulseTicks { name_to_assign, .. }
            | ChannelSpec::CoPulseFreq { name_to_assign, .. }
            | ChannelSpec::CoPulseTime { name_to_assign, .. }
            | ChannelSpec::CoPulseTicks { name_to_assign, .. } => name_to_assign,
        }
    }
}

/// Arguments of one `DAQmxCfg*Timing` call.
#[derive(Clone, Debug, PartialEq)]
pub enum TimingSpec {
    SampleClock {
        rate: f64,
        source: String,
        active_edge: Edge,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    },
    Implicit {
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    },
    ChangeDetection {
        rising_edge_chan: String,
        falling_edge_chan: String,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    },
    Handshaking {
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    },
    PipelinedSampleClock {
        rate: f64,
        source: String,
        active_edge: Edge,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    },
    BurstHandshakingImportClock {
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
        sample_clk_rate: f64,
        sample_clk_src: String,
        sample_clk_active_edge: Edge,
        pause_when: PauseWhen,
        ready_event_active_level: Polarity,
    },
    BurstHandshakingExportClock {
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
        sample_clk_rate: f64,
        sample_clk_outp_term: String,
        sample_clk_pulse_polarity: Polarity,
        pause_when: PauseWhen,
        ready_event_active_level: Polarity,
    },
}

impl TimingSpec {
    pub fn timing_type(&self) -> SampleTimingType {
        match self {
            TimingSpec::SampleClock { .. } => SampleTimingType::SampleClock,
            TimingSpec::Implicit { .. } => SampleTimingType::Implicit,
            TimingSpec::ChangeDetection { .. } => SampleTimingType::ChangeDetection,
            TimingSpec::Handshaking { .. } => SampleTimingType::Handshake,
            TimingSpec::PipelinedSampleClock { .. } => SampleTimingType::PipelinedSampleClock,
            TimingSpec::BurstHandshakingImportClock { .. } | TimingSpec::BurstHandshakingExportClock { .. } => {
                SampleTimingType::BurstHandshake
            }
        }
    }

    pub fn sample_mode(&self) -> AcquisitionType {
        match self {
            TimingSpec::SampleClock { sample_mode, .. }
            | TimingSpec::Implicit { sample_mode, .. }
            | TimingSpec::ChangeDetection { sample_mode, .. }
            | TimingSpec::Handshaking { sample_mode, .. }
            | TimingSpec::PipelinedSampleClock { sample_mode, .. }
            | TimingSpec::BurstHandshakingImportClock { sample_mode, .. }
            | TimingSpec::BurstHandshakingExportClock { sample_mode, .. } => *sample_mode,
        }
    }

    pub fn samps_per_chan(&self) -> u64 {
        match self {
            TimingSpec::SampleClock { samps_per_chan, .. }
            | TimingSpec::Implicit { samps_per_chan, .. }
            | TimingSpec::ChangeDetection { samps_per_chan, .. }
            | TimingSpec::Handshaking { samps_per_chan, .. }
            | TimingSpec::PipelinedSampleClock { samps_per_chan, .. }
            | TimingSpec::BurstHandshakingImportClock { samps_per_chan, .. }
            | TimingSpec::BurstHandshakingExportClock { samps_per_chan, .. } => *samps_per_chan,
        }
    }

    /// Sample clock rate, for the clocked variants.
    pub fn rate(&self) -> Option<f64> {
        match self {
            TimingSpec::SampleClock { rate, .. } | TimingSpec::PipelinedSampleClock { rate, .. } => Some(*rate),
            TimingSpec::BurstHandshakingImportClock { sample_clk_rate, .. }
            | TimingSpec::BurstHandshakingExportClock { sample_clk_rate, .. } => Some(*sample_clk_rate),
            _ => None,
        }
    }
}

/// Arguments of one trigger configuration call.
#[derive(Clone, Debug, PartialEq)]
pub enum TriggerSpec {
    DigitalEdgeStart {
        source: String,
        edge: Edge,
    },
    AnalogEdgeStart {
        source: String,
        slope: Slope,
        level: f64,
    },
    DisableStart,
    DigitalEdgeReference {
        source: String,
        edge: Edge,
        pretrigger_samples: u32,
    },
    DisableReference,
}

pub enum BinaryBufferMut<'a> {
    I16(&'a mut [i16]),
    U16(&'a mut [u16]),
    I32(&'a mut [i32]),
    U32(&'a mut [u32]),
}

pub enum BinaryBuffer<'a> {
    I16(&'a [i16]),
    U16(&'a [u16]),
    I32(&'a [i32]),
    U32(&'a [u32]),
}

pub enum PortBufferMut<'a> {
    U8(&'a mut [u8]),
    U16(&'a mut [u16]),
    U32(&'a mut [u32]),
}

pub enum PortBuffer<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
}

macro_rules! buffer_len {
    ($name:ident) => {
        impl $name<'_> {
            pub fn len(&self) -> usize {
                match self {
                    $name::I16(b) => b.len(),
                    $name::U16(b) => b.len(),
                    $name::I32(b) => b.len(),
                    $name::U32(b) => b.len(),
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }
    };
    (port $name:ident) => {
        impl $name<'_> {
            pub fn len(&self) -> usize {
                match self {
                    $name::U8(b) => b.len(),
                    $name::U16(b) => b.len(),
                    $name::U32(b) => b.len(),
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }
    };
}

buffer_len!(BinaryBufferMut);
buffer_len!(BinaryBuffer);
buffer_len!(port PortBufferMut);
buffer_len!(port PortBuffer);

/// Per-channel metadata reported by a waveform read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveformMetadata {
    /// Start time in driver ticks (100 ns since `0001-01-01T00:00:00Z`).
    pub t0_ticks: Option<i64>,
    /// Sample interval in seconds.
    pub sample_interval: Option<f64>,
    pub properties: ExtendedProperties,
}

/// Complete set of driver operations used by the binding.
///
/// Sample counts are per channel. `timeout` is in seconds, with `0.0` meaning "try once" and
/// [`WAIT_INFINITELY`] meaning "no limit". Read operations return the number of samples per
/// channel actually transferred; write operations return the number accepted.
pub trait Interpreter: Send + Sync + fmt::Debug {
    // Task lifecycle

    /// Creates (or attaches to) the task `name`. The flag is `true` when a new task was created.
    fn create_task(&self, name: &str, behavior: SessionInitializationBehavior) -> Result<(TaskHandle, bool)>;
    fn clear_task(&self, task: TaskHandle) -> Result<()>;
    fn start_task(&self, task: TaskHandle) -> Result<()>;
    fn stop_task(&self, task: TaskHandle) -> Result<()>;
    fn task_control(&self, task: TaskHandle, action: TaskMode) -> Result<()>;
    fn wait_until_task_done(&self, task: TaskHandle, timeout: f64) -> Result<()>;
    fn is_task_done(&self, task: TaskHandle) -> Result<bool>;

    // Configuration

    fn create_channel(&self, task: TaskHandle, spec: &ChannelSpec) -> Result<()>;
    fn configure_timing(&self, task: TaskHandle, spec: &TimingSpec) -> Result<()>;
    fn configure_trigger(&self, task: TaskHandle, spec: &TriggerSpec) -> Result<()>;
    fn export_signal(&self, task: TaskHandle, signal: Signal, output_terminal: &str) -> Result<()>;
    fn connect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()>;
    fn disconnect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()>;
    fn reset_device(&self, device_name: &str) -> Result<()>;

    // Attributes

    fn get_attribute_bool(&self, target: AttributeTarget<'_>, id: i32) -> Result<bool>;
    fn get_attribute_i32(&self, target: AttributeTarget<'_>, id: i32) -> Result<i32>;
    fn get_attribute_u32(&self, target: AttributeTarget<'_>, id: i32) -> Result<u32>;
    fn get_attribute_u64(&self, target: AttributeTarget<'_>, id: i32) -> Result<u64>;
    fn get_attribute_f64(&self, target: AttributeTarget<'_>, id: i32) -> Result<f64>;
    fn get_attribute_string(&self, target: AttributeTarget<'_>, id: i32) -> Result<String>;
    fn get_attribute_i32_list(&self, target: AttributeTarget<'_>, id: i32) -> Result<Vec<i32>>;
    fn set_attribute_bool(&self, target: AttributeTarget<'_>, id: i32, value: bool) -> Result<()>;
    fn set_attribute_i32(&self, target: AttributeTarget<'_>, id: i32, value: i32) -> Result<()>;
    fn set_attribute_u32(&self, target: AttributeTarget<'_>, id: i32, value: u32) -> Result<()>;
    fn set_attribute_u64(&self, target: AttributeTarget<'_>, id: i32, value: u64) -> Result<()>;
    fn set_attribute_f64(&self, target: AttributeTarget<'_>, id: i32, value: f64) -> Result<()>;
    fn set_attribute_string(&self, target: AttributeTarget<'_>, id: i32, value: &str) -> Result<()>;
    fn reset_attribute(&self, target: AttributeTarget<'_>, id: i32) -> Result<()>;

    // Reads

    fn read_analog_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: &mut [f64]) -> Result<usize>;
    fn read_analog_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<f64>;
    fn read_binary(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: BinaryBufferMut<'_>) -> Result<usize>;
    /// Reads one byte per line. Returns `(samples per channel read, bytes per sample)`.
    fn read_digital_lines(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: &mut [u8]) -> Result<(usize, usize)>;
    fn read_digital_port(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: PortBufferMut<'_>) -> Result<usize>;
    fn read_digital_scalar_u32(&self, task: TaskHandle, timeout: f64) -> Result<u32>;
    fn read_counter_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, data: &mut [f64]) -> Result<usize>;
    fn read_counter_u32(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, data: &mut [u32]) -> Result<usize>;
    fn read_counter_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<f64>;
    fn read_counter_scalar_u32(&self, task: TaskHandle, timeout: f64) -> Result<u32>;
    fn read_ctr_freq(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, frequency: &mut [f64], duty_cycle: &mut [f64]) -> Result<usize>;
    fn read_ctr_time(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, high_time: &mut [f64], low_time: &mut [f64]) -> Result<usize>;
    fn read_ctr_ticks(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, high_ticks: &mut [u32], low_ticks: &mut [u32]) -> Result<usize>;
    fn read_ctr_freq_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)>;
    fn read_ctr_time_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)>;
    fn read_ctr_ticks_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(u32, u32)>;
    fn read_power_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, voltage: &mut [f64], current: &mut [f64]) -> Result<usize>;
    fn read_power_binary_i16(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, voltage: &mut [i16], current: &mut [i16]) -> Result<usize>;
    fn read_power_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)>;

    /// Reads into one buffer per channel and reports per-channel metadata as selected by `mode`.
    fn read_analog_waveforms(
        &self,
        task: TaskHandle,
        num_samps_per_chan: i32,
        timeout: f64,
        mode: WaveformAttributeMode,
        buffers: &mut [&mut [f64]],
        metadata: &mut [WaveformMetadata],
    ) -> Result<usize>;

    /// Reads line states for every channel. Channel `c` owns a block of
    /// `num_samps_per_chan * bytes_per_chan[c]` bytes, sample-major, blocks laid out in channel
    /// order.
    fn read_digital_waveforms(
        &self,
        task: TaskHandle,
        num_samps_per_chan: i32,
        timeout: f64,
        mode: WaveformAttributeMode,
        bytes_per_chan: &[u32],
        data: &mut [u8],
        metadata: &mut [WaveformMetadata],
    ) -> Result<usize>;

    // Writes

    fn write_analog_f64(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: &[f64]) -> Result<usize>;
    fn write_analog_scalar_f64(&self, task: TaskHandle, auto_start: bool, timeout: f64, value: f64) -> Result<()>;
    fn write_binary(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: BinaryBuffer<'_>) -> Result<usize>;
    fn write_digital_lines(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: &[u8]) -> Result<usize>;
    fn write_digital_port(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: PortBuffer<'_>) -> Result<usize>;
    fn write_digital_scalar_u32(&self, task: TaskHandle, auto_start: bool, timeout: f64, value: u32) -> Result<()>;
    fn write_ctr_freq(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, frequency: &[f64], duty_cycle: &[f64]) -> Result<usize>;
    fn write_ctr_time(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, high_time: &[f64], low_time: &[f64]) -> Result<usize>;
    fn write_ctr_ticks(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, high_ticks: &[u32], low_ticks: &[u32]) -> Result<usize>;
    fn write_ctr_freq_scalar(&self, task: TaskHandle, auto_start: bool, timeout: f64, frequency: f64, duty_cycle: f64) -> Result<()>;
    fn write_ctr_time_scalar(&self, task: TaskHandle, auto_start: bool, timeout: f64, high_time: f64, low_time: f64) -> Result<()>;
    fn write_ctr_ticks_scalar(&self, task: TaskHandle, auto_start: bool, timeout: f64, high_ticks: u32, low_ticks: u32) -> Result<()>;

    /// Drains the warnings recorded since the last call.
    fn take_warnings(&self) -> Vec<DaqWarning>;
}
