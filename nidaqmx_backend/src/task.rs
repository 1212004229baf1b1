//! # Tasks
//!
//! A [`Task`] owns one driver task handle and everything configured on it: channels, timing,
//! triggers, exported signals and the two streams. Configuration objects ([`TaskTiming`],
//! [`Triggers`], [`ExportSignals`], [`Channel`], the channel collections and the streams) are
//! short-lived views that borrow the task; they hold no driver state of their own.
//!
//! ## Lifecycle
//!
//! ```text
//! create ─▶ add channels / configure ─▶ start ─▶ read / write ─▶ stop ─▶ close
//! ```
//!
//! Reads and writes advance the task implicitly: a read on a task that is not running starts it
//! (subject to the in-stream `auto_start` attribute), and a write with `auto_start` does the same.
//! [`Task::control`] requests the intermediate states (verify, reserve, commit, ...) explicitly.
//!
//! [`Task::close`] releases the handle and is idempotent. Dropping a task closes it; an error
//! during that implicit close is logged rather than propagated. Every operation on a closed task
//! fails with [`DaqError::InvalidHandle`].
//!
//! ## Errors
//!
//! Errors reported by the driver for a task carry the task's name (see
//! [`DaqError::task_name`]).
//!
//! ## Example
//!
//! ```no_run
//! use nidaqmx_backend::prelude::*;
//!
//! # fn main() -> nidaqmx_backend::error::Result<()> {
//! let task = Task::new("acquire")?;
//! task.ai_channels()
//!     .add_ai_voltage_chan("Dev1/ai0:2", "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)?;
//! task.timing().cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 100)?;
//! let reader = AnalogMultiChannelReader::new(task.in_stream());
//! let mut data = ndarray::Array2::<f64>::zeros((3, 100));
//! let read = reader.read_many_sample(&mut data, 100)?;
//! assert_eq!(read, 100);
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::attributes::{channel, exported_signal, read, task as task_attr, timing, trigger, Attribute, AttributeValue};
use crate::constants::*;
use crate::error::{DaqError, DaqWarning, Result};
use crate::interpreter::*;
use crate::library_interpreter::LibraryInterpreter;
use crate::stream::{InStream, InStreamSettings, OutStream, OutStreamSettings};
use crate::utils::{flatten_channel_string, unflatten_channel_string};

/// Session choice for tasks dispatched through a session-aware interpreter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrpcSessionOptions {
    pub session_name: String,
    pub initialization_behavior: SessionInitializationBehavior,
}

/// A driver task.
pub struct Task {
    interpreter: Arc<dyn Interpreter>,
    handle: Option<TaskHandle>,
    name: String,
    close_on_exit: bool,
    pub(crate) in_settings: Mutex<InStreamSettings>,
    pub(crate) out_settings: Mutex<OutStreamSettings>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("close_on_exit", &self.close_on_exit)
            .finish()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.handle.is_some() && self.handle == other.handle && Arc::ptr_eq(&self.interpreter, &other.interpreter)
    }
}

impl Task {
    /// Creates a task on the local NI-DAQmx driver. An empty `name` lets the driver pick one.
    pub fn new(name: &str) -> Result<Self> {
        let interpreter: Arc<dyn Interpreter> = Arc::new(LibraryInterpreter::new()?);
        Self::with_interpreter(interpreter, name)
    }

    /// Creates a new task through `interpreter`. A task with the same name must not exist.
    pub fn with_interpreter(interpreter: Arc<dyn Interpreter>, name: &str) -> Result<Self> {
        Self::create(interpreter, name, SessionInitializationBehavior::InitializeServerSession)
    }

    /// Creates or attaches to the task `name` as `options` request.
    ///
    /// A task that attached to an existing one is not cleared on close.
    pub fn with_session(interpreter: Arc<dyn Interpreter>, name: &str, options: &GrpcSessionOptions) -> Result<Self> {
        debug!(session = %options.session_name, behavior = ?options.initialization_behavior, "creating task in session");
        Self::create(interpreter, name, options.initialization_behavior)
    }

    fn create(interpreter: Arc<dyn Interpreter>, name: &str, behavior: SessionInitializationBehavior) -> Result<Self> {
        let (handle, created) = interpreter
            .create_task(name, behavior)
            .map_err(|e| e.with_task_name(name))?;
        let name = task_attr::NAME
            .get(interpreter.as_ref(), AttributeTarget::Task(handle))
            .map_err(|e| e.with_task_name(name))?;
        debug!(task = %name, %handle, created, "task ready");
        Ok(Self {
            interpreter,
            handle: Some(handle),
            name,
            close_on_exit: created,
            in_settings: Mutex::new(InStreamSettings::default()),
            out_settings: Mutex::new(OutStreamSettings::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The driver handle, or [`DaqError::InvalidHandle`] once the task is closed.
    pub fn handle(&self) -> Result<TaskHandle> {
        self.handle.ok_or_else(|| DaqError::InvalidHandle {
            task_name: self.name.clone(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn interpreter(&self) -> &Arc<dyn Interpreter> {
        &self.interpreter
    }

    /// Runs one driver operation against this task's handle, naming the task in any error.
    pub(crate) fn call<T>(&self, operation: impl FnOnce(&dyn Interpreter, TaskHandle) -> Result<T>) -> Result<T> {
        let handle = self.handle()?;
        operation(self.interpreter.as_ref(), handle).map_err(|e| e.with_task_name(&self.name))
    }

    pub(crate) fn get_property<'s, T: AttributeValue>(
        &self,
        attribute: &Attribute<T>,
        target: impl FnOnce(TaskHandle) -> AttributeTarget<'s>,
    ) -> Result<T> {
        self.call(|interpreter, handle| attribute.get(interpreter, target(handle)))
    }

    pub(crate) fn set_property<'s, T: AttributeValue>(
        &self,
        attribute: &Attribute<T>,
        target: impl FnOnce(TaskHandle) -> AttributeTarget<'s>,
        value: T,
    ) -> Result<()> {
        self.call(|interpreter, handle| {
            let target = target(handle);
            trace!(task = %self.name, scope = target.scope_name(), id = attribute.id, "set attribute");
            attribute.set(interpreter, target, value)
        })
    }

    pub(crate) fn reset_property<'s, T: AttributeValue>(
        &self,
        attribute: &Attribute<T>,
        target: impl FnOnce(TaskHandle) -> AttributeTarget<'s>,
    ) -> Result<()> {
        self.call(|interpreter, handle| attribute.reset(interpreter, target(handle)))
    }

    /// Releases the driver task. Closing a closed task does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            debug!(task = %self.name, "task already closed");
            return Ok(());
        };
        if self.close_on_exit {
            self.interpreter
                .clear_task(handle)
                .map_err(|e| e.with_task_name(&self.name))?;
        }
        debug!(task = %self.name, cleared = self.close_on_exit, "task closed");
        Ok(())
    }

    pub fn start(&self) -> Result<()> {
        debug!(task = %self.name, "start");
        self.call(|interpreter, handle| interpreter.start_task(handle))
    }

    pub fn stop(&self) -> Result<()> {
        debug!(task = %self.name, "stop");
        self.call(|interpreter, handle| interpreter.stop_task(handle))
    }

    /// Requests a state transition such as verify, reserve or commit.
    pub fn control(&self, action: TaskMode) -> Result<()> {
        debug!(task = %self.name, ?action, "control");
        self.call(|interpreter, handle| interpreter.task_control(handle, action))
    }

    /// Waits for a finite task to finish. `timeout` is in seconds; [`WAIT_INFINITELY`] waits
    /// without limit.
    pub fn wait_until_done(&self, timeout: f64) -> Result<()> {
        self.call(|interpreter, handle| interpreter.wait_until_task_done(handle, timeout))
    }

    pub fn is_task_done(&self) -> Result<bool> {
        self.call(|interpreter, handle| interpreter.is_task_done(handle))
    }

    /// Names of all virtual channels in the task, in task order.
    pub fn channel_names(&self) -> Result<Vec<String>> {
        self.get_property(&task_attr::CHANNELS, AttributeTarget::Task)
    }

    pub fn number_of_channels(&self) -> Result<u32> {
        self.get_property(&task_attr::NUM_CHANS, AttributeTarget::Task)
    }

    pub fn devices(&self) -> Result<Vec<String>> {
        self.get_property(&task_attr::DEVICES, AttributeTarget::Task)
    }

    pub fn number_of_devices(&self) -> Result<u32> {
        self.get_property(&task_attr::NUM_DEVICES, AttributeTarget::Task)
    }

    /// Every channel of the task as one [`Channel`].
    pub fn channels(&self) -> Result<Channel<'_>> {
        let names = self.channel_names()?;
        Ok(Channel::new(self, flatten_channel_string(&names)))
    }

    pub fn ai_channels(&self) -> ChannelCollection<'_, Ai> {
        ChannelCollection::new(self)
    }

    pub fn ao_channels(&self) -> ChannelCollection<'_, Ao> {
        ChannelCollection::new(self)
    }

    pub fn di_channels(&self) -> ChannelCollection<'_, Di> {
        ChannelCollection::new(self)
    }

    pub fn do_channels(&self) -> ChannelCollection<'_, Do> {
        ChannelCollection::new(self)
    }

    pub fn ci_channels(&self) -> ChannelCollection<'_, Ci> {
        ChannelCollection::new(self)
    }

    pub fn co_channels(&self) -> ChannelCollection<'_, Co> {
        ChannelCollection::new(self)
    }

    pub fn timing(&self) -> TaskTiming<'_> {
        TaskTiming { task: self }
    }

    pub fn triggers(&self) -> Triggers<'_> {
        Triggers { task: self }
    }

    pub fn export_signals(&self) -> ExportSignals<'_> {
        ExportSignals { task: self }
    }

    pub fn in_stream(&self) -> InStream<'_> {
        InStream::new(self)
    }

    pub fn out_stream(&self) -> OutStream<'_> {
        OutStream::new(self)
    }

    /// Resolves a requested per-channel sample count.
    ///
    /// [`READ_ALL_AVAILABLE`] becomes the number of samples currently buffered for continuous
    /// tasks (or when the in-stream reads all available samples), and the number of samples not
    /// yet read for finite tasks. Any other value is returned unchanged.
    pub fn calculate_num_samps_per_chan(&self, requested: i32) -> Result<i32> {
        if requested != READ_ALL_AVAILABLE {
            return Ok(requested);
        }
        let sample_mode = self.get_property(&timing::SAMP_QUANT_SAMP_MODE, AttributeTarget::Timing)?;
        let read_all = self.get_property(&read::READ_ALL_AVAIL_SAMP, AttributeTarget::Read)?;
        let samples = if sample_mode == AcquisitionType::Continuous || read_all {
            u64::from(self.get_property(&read::AVAIL_SAMP_PER_CHAN, AttributeTarget::Read)?)
        } else {
            let total = self.get_property(&timing::SAMP_QUANT_SAMP_PER_CHAN, AttributeTarget::Timing)?;
            let position = self.get_property(&read::CURR_READ_POS, AttributeTarget::Read)?;
            total.saturating_sub(position)
        };
        Ok(i32::try_from(samples).unwrap_or(i32::MAX))
    }

    /// Drains driver warnings recorded since the last call.
    pub fn take_warnings(&self) -> Vec<DaqWarning> {
        self.interpreter.take_warnings()
    }

    /// Adds channels through `spec` and returns them as one [`Channel`].
    pub fn add_channel(&self, spec: ChannelSpec) -> Result<Channel<'_>> {
        let before = self.channel_names()?;
        self.call(|interpreter, handle| interpreter.create_channel(handle, &spec))?;
        let added: Vec<String> = self
            .channel_names()?
            .into_iter()
            .filter(|name| !before.contains(name))
            .collect();
        debug!(task = %self.name, channels = ?added, "channels added");
        Ok(Channel::new(self, flatten_channel_string(&added)))
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.close() {
                warn!(task = %self.name, error = %err, "failed to close task on drop");
            }
        }
    }
}

/// One or more virtual channels of a task, addressed by a (possibly flattened) channel string.
#[derive(Clone)]
pub struct Channel<'a> {
    task: &'a Task,
    name: String,
}

impl fmt::Debug for Channel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").field("task", &self.task.name).field("name", &self.name).finish()
    }
}

impl PartialEq for Channel<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.task == other.task && self.name == other.name
    }
}

impl<'a> Channel<'a> {
    fn new(task: &'a Task, name: String) -> Self {
        Self { task, name }
    }

    /// The flattened channel string this object addresses.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Individual channel names.
    pub fn channel_names(&self) -> Result<Vec<String>> {
        unflatten_channel_string(&self.name)
    }

    fn target(&self, handle: TaskHandle) -> AttributeTarget<'_> {
        AttributeTarget::Channel(handle, &self.name)
    }

    properties! {
        get physical_channel, set set_physical_channel, reset reset_physical_channel: String = channel::PHYSICAL_CHAN_NAME;
        get chan_type: ChannelType = channel::CHAN_TYPE;
        get description, set set_description, reset reset_description: String = channel::DESCR;
        get ai_min, set set_ai_min, reset reset_ai_min: f64 = channel::AI_MIN;
        get ai_max, set set_ai_max, reset reset_ai_max: f64 = channel::AI_MAX;
        get ai_voltage_units, set set_ai_voltage_units, reset reset_ai_voltage_units: VoltageUnits = channel::AI_VOLTAGE_UNITS;
        get ai_term_cfg, set set_ai_term_cfg, reset reset_ai_term_cfg: TerminalConfiguration = channel::AI_TERM_CFG;
        get ao_min, set set_ao_min, reset reset_ao_min: f64 = channel::AO_MIN;
        get ao_max, set set_ao_max, reset reset_ao_max: f64 = channel::AO_MAX;
        /// Lines in a digital input channel; fixes the row width of multi-line reads.
        get di_num_lines: u32 = channel::DI_NUM_LINES;
        get do_num_lines: u32 = channel::DO_NUM_LINES;
        get ci_min, set set_ci_min, reset reset_ci_min: f64 = channel::CI_MIN;
        get ci_max, set set_ci_max, reset reset_ci_max: f64 = channel::CI_MAX;
        get ci_freq_units, set set_ci_freq_units, reset reset_ci_freq_units: FrequencyUnits = channel::CI_FREQ_UNITS;
        get ci_count: u32 = channel::CI_COUNT;
        get ci_count_edges_initial_cnt, set set_ci_count_edges_initial_cnt, reset reset_ci_count_edges_initial_cnt: u32 = channel::CI_COUNT_EDGES_INITIAL_CNT;
        get ci_count_edges_dir, set set_ci_count_edges_dir, reset reset_ci_count_edges_dir: CountDirection = channel::CI_COUNT_EDGES_DIR;
        get co_pulse_freq, set set_co_pulse_freq, reset reset_co_pulse_freq: f64 = channel::CO_PULSE_FREQ;
        get co_pulse_duty_cyc, set set_co_pulse_duty_cyc, reset reset_co_pulse_duty_cyc: f64 = channel::CO_PULSE_DUTY_CYC;
        get co_pulse_idle_state, set set_co_pulse_idle_state, reset reset_co_pulse_idle_state: Level = channel::CO_PULSE_IDLE_STATE;
    }
}

/// Channel collection markers.
pub trait ChannelKind {
    const CHANNEL_TYPE: ChannelType;
}

macro_rules! channel_kind {
    ($($(#[$meta:meta])* $name:ident => $ty:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug)]
            pub struct $name;

            impl ChannelKind for $name {
                const CHANNEL_TYPE: ChannelType = ChannelType::$ty;
            }
        )+
    };
}

channel_kind! {
    /// Analog input.
    Ai => AnalogInput,
    /// Analog output.
    Ao => AnalogOutput,
    /// Digital input.
    Di => DigitalInput,
    /// Digital output.
    Do => DigitalOutput,
    /// Counter input.
    Ci => CounterInput,
    /// Counter output.
    Co => CounterOutput,
}

/// The channels of one type in a task, and the methods that add them.
pub struct ChannelCollection<'a, K> {
    task: &'a Task,
    _kind: PhantomData<K>,
}

impl<'a, K: ChannelKind> ChannelCollection<'a, K> {
    fn new(task: &'a Task) -> Self {
        Self { task, _kind: PhantomData }
    }

    /// Names of the channels of this type, in task order.
    pub fn channel_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for name in self.task.channel_names()? {
            let kind = self
                .task
                .get_property(&channel::CHAN_TYPE, |handle| AttributeTarget::Channel(handle, &name))?;
            if kind == K::CHANNEL_TYPE {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.channel_names()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All channels of this type as one [`Channel`].
    pub fn all(&self) -> Result<Channel<'a>> {
        Ok(Channel::new(self.task, flatten_channel_string(&self.channel_names()?)))
    }

    /// The channel named `name`, which must be of this type.
    pub fn get(&self, name: &str) -> Result<Channel<'a>> {
        let wanted = unflatten_channel_string(name)?;
        let names = self.channel_names()?;
        match wanted.iter().find(|w| !names.contains(w)) {
            Some(missing) => Err(DaqError::Driver {
                code: crate::error::ErrorCode::Other(-200486),
                message: format!("Specified channel is not in the task.\n\nChannel Name: {}", missing),
                task_name: Some(self.task.name.clone()),
            }),
            None => Ok(Channel::new(self.task, name.to_string())),
        }
    }

    fn add(&self, spec: ChannelSpec) -> Result<Channel<'a>> {
        debug_assert_eq!(spec.channel_type(), K::CHANNEL_TYPE);
        self.task.add_channel(spec)
    }
}

impl<'a> ChannelCollection<'a, Ai> {
    pub fn add_ai_voltage_chan(
        &self,
        physical_channel: &str,
        name_to_assign: &str,
        terminal_config: TerminalConfiguration,
        min_val: f64,
        max_val: f64,
        units: VoltageUnits,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::AiVoltage {
            physical_channel: physical_channel.to_string(),
            name_to_assign: name_to_assign.to_string(),
            terminal_config,
            min_val,
            max_val,
            units,
            custom_scale_name: String::new(),
        })
    }

    /// Voltage channel scaled through the custom scale `custom_scale_name`.
    pub fn add_ai_voltage_chan_with_scale(
        &self,
        physical_channel: &str,
        name_to_assign: &str,
        terminal_config: TerminalConfiguration,
        min_val: f64,
        max_val: f64,
        custom_scale_name: &str,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::AiVoltage {
            physical_channel: physical_channel.to_string(),
            name_to_assign: name_to_assign.to_string(),
            terminal_config,
            min_val,
            max_val,
            units: VoltageUnits::FromCustomScale,
            custom_scale_name: custom_scale_name.to_string(),
        })
    }

    pub fn add_ai_power_chan(
        &self,
        physical_channel: &str,
        name_to_assign: &str,
        voltage_setpoint: f64,
        current_setpoint: f64,
        output_enable: bool,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::AiPower {
            physical_channel: physical_channel.to_string(),
            name_to_assign: name_to_assign.to_string(),
            voltage_setpoint,
            current_setpoint,
            output_enable,
        })
    }
}

impl<'a> ChannelCollection<'a, Ao> {
    pub fn add_ao_voltage_chan(
        &self,
        physical_channel: &str,
        name_to_assign: &str,
        min_val: f64,
        max_val: f64,
        units: VoltageUnits,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::AoVoltage {
            physical_channel: physical_channel.to_string(),
            name_to_assign: name_to_assign.to_string(),
            min_val,
            max_val,
            units,
            custom_scale_name: String::new(),
        })
    }
}

impl<'a> ChannelCollection<'a, Di> {
    /// Adds digital input lines. With [`LineGrouping::ChanPerLine`] every line becomes its own
    /// channel; with [`LineGrouping::ChanForAllLines`] the lines form one channel.
    pub fn add_di_chan(&self, lines: &str, name_to_assign: &str, line_grouping: LineGrouping) -> Result<Channel<'a>> {
        self.add(ChannelSpec::Di {
            lines: lines.to_string(),
            name_to_assign: name_to_assign.to_string(),
            line_grouping,
        })
    }
}

impl<'a> ChannelCollection<'a, Do> {
    pub fn add_do_chan(&self, lines: &str, name_to_assign: &str, line_grouping: LineGrouping) -> Result<Channel<'a>> {
        self.add(ChannelSpec::Do {
            lines: lines.to_string(),
            name_to_assign: name_to_assign.to_string(),
            line_grouping,
        })
    }
}

impl<'a> ChannelCollection<'a, Ci> {
    pub fn add_ci_count_edges_chan(
        &self,
        counter: &str,
        name_to_assign: &str,
        edge: Edge,
        initial_count: u32,
        count_direction: CountDirection,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CiCountEdges {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            edge,
            initial_count,
            count_direction,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_ci_freq_chan(
        &self,
        counter: &str,
        name_to_assign: &str,
        min_val: f64,
        max_val: f64,
        units: FrequencyUnits,
        edge: Edge,
        meas_method: CounterFrequencyMethod,
        meas_time: f64,
        divisor: u32,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CiFreq {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            min_val,
            max_val,
            units,
            edge,
            meas_method,
            meas_time,
            divisor,
            custom_scale_name: String::new(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_ci_period_chan(
        &self,
        counter: &str,
        name_to_assign: &str,
        min_val: f64,
        max_val: f64,
        units: TimeUnits,
        edge: Edge,
        meas_method: CounterFrequencyMethod,
        meas_time: f64,
        divisor: u32,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CiPeriod {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            min_val,
            max_val,
            units,
            edge,
            meas_method,
            meas_time,
            divisor,
            custom_scale_name: String::new(),
        })
    }

    pub fn add_ci_pulse_freq_chan(
        &self,
        counter: &str,
        name_to_assign: &str,
        min_val: f64,
        max_val: f64,
        units: FrequencyUnits,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CiPulseFreq {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            min_val,
            max_val,
            units,
        })
    }

    pub fn add_ci_pulse_time_chan(
        &self,
        counter: &str,
        name_to_assign: &str,
        min_val: f64,
        max_val: f64,
        units: TimeUnits,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CiPulseTime {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            min_val,
            max_val,
            units,
        })
    }

    pub fn add_ci_pulse_ticks_chan(
        &self,
        counter: &str,
        name_to_assign: &str,
        source_terminal: &str,
        min_val: f64,
        max_val: f64,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CiPulseTicks {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            source_terminal: source_terminal.to_string(),
            min_val,
            max_val,
        })
    }
}

impl<'a> ChannelCollection<'a, Co> {
    #[allow(clippy::too_many_arguments)]
    pub fn add_co_pulse_chan_freq(
        &self,
        counter: &str,
        name_to_assign: &str,
        units: FrequencyUnits,
        idle_state: Level,
        initial_delay: f64,
        freq: f64,
        duty_cycle: f64,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CoPulseFreq {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            units,
            idle_state,
            initial_delay,
            freq,
            duty_cycle,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_co_pulse_chan_time(
        &self,
        counter: &str,
        name_to_assign: &str,
        units: TimeUnits,
        idle_state: Level,
        initial_delay: f64,
        low_time: f64,
        high_time: f64,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CoPulseTime {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            units,
            idle_state,
            initial_delay,
            low_time,
            high_time,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_co_pulse_chan_ticks(
        &self,
        counter: &str,
        name_to_assign: &str,
        source_terminal: &str,
        idle_state: Level,
        initial_delay: i32,
        low_ticks: i32,
        high_ticks: i32,
    ) -> Result<Channel<'a>> {
        self.add(ChannelSpec::CoPulseTicks {
            counter: counter.to_string(),
            name_to_assign: name_to_assign.to_string(),
            source_terminal: source_terminal.to_string(),
            idle_state,
            initial_delay,
            low_ticks,
            high_ticks,
        })
    }
}

/// Timing configuration of a task.
pub struct TaskTiming<'a> {
    task: &'a Task,
}

impl TaskTiming<'_> {
    fn target(&self, handle: TaskHandle) -> AttributeTarget<'static> {
        AttributeTarget::Timing(handle)
    }

    fn configure(&self, spec: TimingSpec) -> Result<()> {
        debug!(task = %self.task.name, ?spec, "configure timing");
        self.task.call(|interpreter, handle| interpreter.configure_timing(handle, &spec))
    }

    /// Clocks samples with a sample clock of `rate` Hz. An empty `source` selects the onboard
    /// clock.
    pub fn cfg_samp_clk_timing(
        &self,
        rate: f64,
        source: &str,
        active_edge: Edge,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    ) -> Result<()> {
        self.configure(TimingSpec::SampleClock {
            rate,
            source: source.to_string(),
            active_edge,
            sample_mode,
            samps_per_chan,
        })
    }

    /// Lets the measurement itself pace the samples (period and pulse-width counter tasks).
    pub fn cfg_implicit_timing(&self, sample_mode: AcquisitionType, samps_per_chan: u64) -> Result<()> {
        self.configure(TimingSpec::Implicit {
            sample_mode,
            samps_per_chan,
        })
    }

    pub fn cfg_change_detection_timing(
        &self,
        rising_edge_chan: &str,
        falling_edge_chan: &str,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    ) -> Result<()> {
        self.configure(TimingSpec::ChangeDetection {
            rising_edge_chan: rising_edge_chan.to_string(),
            falling_edge_chan: falling_edge_chan.to_string(),
            sample_mode,
            samps_per_chan,
        })
    }

    pub fn cfg_handshaking_timing(&self, sample_mode: AcquisitionType, samps_per_chan: u64) -> Result<()> {
        self.configure(TimingSpec::Handshaking {
            sample_mode,
            samps_per_chan,
        })
    }

    pub fn cfg_pipelined_samp_clk_timing(
        &self,
        rate: f64,
        source: &str,
        active_edge: Edge,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
    ) -> Result<()> {
        self.configure(TimingSpec::PipelinedSampleClock {
            rate,
            source: source.to_string(),
            active_edge,
            sample_mode,
            samps_per_chan,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn cfg_burst_handshaking_timing_import_clock(
        &self,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
        sample_clk_rate: f64,
        sample_clk_src: &str,
        sample_clk_active_edge: Edge,
        pause_when: PauseWhen,
        ready_event_active_level: Polarity,
    ) -> Result<()> {
        self.configure(TimingSpec::BurstHandshakingImportClock {
            sample_mode,
            samps_per_chan,
            sample_clk_rate,
            sample_clk_src: sample_clk_src.to_string(),
            sample_clk_active_edge,
            pause_when,
            ready_event_active_level,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn cfg_burst_handshaking_timing_export_clock(
        &self,
        sample_mode: AcquisitionType,
        samps_per_chan: u64,
        sample_clk_rate: f64,
        sample_clk_outp_term: &str,
        sample_clk_pulse_polarity: Polarity,
        pause_when: PauseWhen,
        ready_event_active_level: Polarity,
    ) -> Result<()> {
        self.configure(TimingSpec::BurstHandshakingExportClock {
            sample_mode,
            samps_per_chan,
            sample_clk_rate,
            sample_clk_outp_term: sample_clk_outp_term.to_string(),
            sample_clk_pulse_polarity,
            pause_when,
            ready_event_active_level,
        })
    }

    properties! {
        get samp_clk_rate, set set_samp_clk_rate, reset reset_samp_clk_rate: f64 = timing::SAMP_CLK_RATE;
        get samp_clk_src, set set_samp_clk_src, reset reset_samp_clk_src: String = timing::SAMP_CLK_SRC;
        get samp_clk_active_edge, set set_samp_clk_active_edge, reset reset_samp_clk_active_edge: Edge = timing::SAMP_CLK_ACTIVE_EDGE;
        get samp_quant_samp_mode, set set_samp_quant_samp_mode, reset reset_samp_quant_samp_mode: AcquisitionType = timing::SAMP_QUANT_SAMP_MODE;
        get samp_quant_samp_per_chan, set set_samp_quant_samp_per_chan, reset reset_samp_quant_samp_per_chan: u64 = timing::SAMP_QUANT_SAMP_PER_CHAN;
        get samp_timing_type, set set_samp_timing_type, reset reset_samp_timing_type: SampleTimingType = timing::SAMP_TIMING_TYPE;
        /// Terminal of the reference clock the task's timing engine locks to.
        get ref_clk_src, set set_ref_clk_src, reset reset_ref_clk_src: String = timing::REF_CLK_SRC;
        get ref_clk_rate, set set_ref_clk_rate, reset reset_ref_clk_rate: f64 = timing::REF_CLK_RATE;
    }
}

/// Trigger configuration of a task.
pub struct Triggers<'a> {
    task: &'a Task,
}

impl<'a> Triggers<'a> {
    pub fn start_trigger(&self) -> StartTrigger<'a> {
        StartTrigger { task: self.task }
    }

    pub fn reference_trigger(&self) -> ReferenceTrigger<'a> {
        ReferenceTrigger { task: self.task }
    }
}

fn configure_trigger(task: &Task, spec: TriggerSpec) -> Result<()> {
    debug!(task = %task.name, ?spec, "configure trigger");
    task.call(|interpreter, handle| interpreter.configure_trigger(handle, &spec))
}

pub struct StartTrigger<'a> {
    task: &'a Task,
}

impl StartTrigger<'_> {
    fn target(&self, handle: TaskHandle) -> AttributeTarget<'static> {
        AttributeTarget::Trigger(handle)
    }

    pub fn cfg_dig_edge_start_trig(&self, trigger_source: &str, trigger_edge: Edge) -> Result<()> {
        configure_trigger(
            self.task,
            TriggerSpec::DigitalEdgeStart {
                source: trigger_source.to_string(),
                edge: trigger_edge,
            },
        )
    }

    pub fn cfg_anlg_edge_start_trig(&self, trigger_source: &str, trigger_slope: Slope, trigger_level: f64) -> Result<()> {
        configure_trigger(
            self.task,
            TriggerSpec::AnalogEdgeStart {
                source: trigger_source.to_string(),
                slope: trigger_slope,
                level: trigger_level,
            },
        )
    }

    pub fn disable_start_trig(&self) -> Result<()> {
        configure_trigger(self.task, TriggerSpec::DisableStart)
    }

    properties! {
        get trig_type, set set_trig_type, reset reset_trig_type: TriggerType = trigger::START_TRIG_TYPE;
        get dig_edge_src, set set_dig_edge_src, reset reset_dig_edge_src: String = trigger::DIG_EDGE_START_TRIG_SRC;
        get dig_edge_edge, set set_dig_edge_edge, reset reset_dig_edge_edge: Edge = trigger::DIG_EDGE_START_TRIG_EDGE;
        get anlg_edge_src, set set_anlg_edge_src, reset reset_anlg_edge_src: String = trigger::ANLG_EDGE_START_TRIG_SRC;
        get anlg_edge_slope, set set_anlg_edge_slope, reset reset_anlg_edge_slope: Slope = trigger::ANLG_EDGE_START_TRIG_SLOPE;
        get anlg_edge_lvl, set set_anlg_edge_lvl, reset reset_anlg_edge_lvl: f64 = trigger::ANLG_EDGE_START_TRIG_LVL;
    }
}

pub struct ReferenceTrigger<'a> {
    task: &'a Task,
}

impl ReferenceTrigger<'_> {
    fn target(&self, handle: TaskHandle) -> AttributeTarget<'static> {
        AttributeTarget::Trigger(handle)
    }

    /// Stops a finite acquisition `pretrigger_samples` short of the trigger plus the remaining
    /// samples per channel.
    pub fn cfg_dig_edge_ref_trig(&self, trigger_source: &str, pretrigger_samples: u32, trigger_edge: Edge) -> Result<()> {
        configure_trigger(
            self.task,
            TriggerSpec::DigitalEdgeReference {
                source: trigger_source.to_string(),
                edge: trigger_edge,
                pretrigger_samples,
            },
        )
    }

    pub fn disable_ref_trig(&self) -> Result<()> {
        configure_trigger(self.task, TriggerSpec::DisableReference)
    }

    properties! {
        get trig_type, set set_trig_type, reset reset_trig_type: TriggerType = trigger::REF_TRIG_TYPE;
        get dig_edge_src, set set_dig_edge_src, reset reset_dig_edge_src: String = trigger::DIG_EDGE_REF_TRIG_SRC;
        get dig_edge_edge, set set_dig_edge_edge, reset reset_dig_edge_edge: Edge = trigger::DIG_EDGE_REF_TRIG_EDGE;
        get pretrig_samples, set set_pretrig_samples, reset reset_pretrig_samples: u32 = trigger::REF_TRIG_PRETRIG_SAMPLES;
    }
}

/// Routing of task signals to output terminals.
pub struct ExportSignals<'a> {
    task: &'a Task,
}

impl ExportSignals<'_> {
    fn target(&self, handle: TaskHandle) -> AttributeTarget<'static> {
        AttributeTarget::ExportedSignal(handle)
    }

    /// Routes `signal` to `output_terminal`, e.g. `/Dev1/PFI0`.
    pub fn export_signal(&self, signal: Signal, output_terminal: &str) -> Result<()> {
        debug!(task = %self.task.name, ?signal, output_terminal, "export signal");
        self.task
            .call(|interpreter, handle| interpreter.export_signal(handle, signal, output_terminal))
    }

    properties! {
        get samp_clk_output_term, set set_samp_clk_output_term, reset reset_samp_clk_output_term: String = exported_signal::SAMP_CLK_OUTPUT_TERM;
        get start_trig_output_term, set set_start_trig_output_term, reset reset_start_trig_output_term: String = exported_signal::START_TRIG_OUTPUT_TERM;
        get ref_trig_output_term, set set_ref_trig_output_term, reset reset_ref_trig_output_term: String = exported_signal::REF_TRIG_OUTPUT_TERM;
        get ten_mhz_ref_clk_output_term, set set_ten_mhz_ref_clk_output_term, reset reset_ten_mhz_ref_clk_output_term: String = exported_signal::TEN_MHZ_REF_CLK_OUTPUT_TERM;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::simulated::SimulatedInterpreter;
    use tracing_test::traced_test;

    fn simulated() -> Arc<dyn Interpreter> {
        Arc::new(SimulatedInterpreter::new())
    }

    #[test]
    fn unnamed_tasks_get_driver_names() {
        let interpreter = simulated();
        let first = Task::with_interpreter(interpreter.clone(), "").unwrap();
        let second = Task::with_interpreter(interpreter, "").unwrap();
        assert!(!first.name().is_empty());
        assert_ne!(first.name(), second.name());
    }

    #[test]
    fn added_channel_reports_assigned_names() {
        let task = Task::with_interpreter(simulated(), "names").unwrap();
        let chans = task
            .ai_channels()
            .add_ai_voltage_chan("Dev1/ai0:2", "volt", TerminalConfiguration::Default, -5.0, 5.0, VoltageUnits::Volts)
            .unwrap();
        assert_eq!(chans.channel_names().unwrap(), vec!["volt0", "volt1", "volt2"]);
        assert_eq!(task.number_of_channels().unwrap(), 3);
        assert_eq!(task.ai_channels().len().unwrap(), 3);
        assert!(task.ci_channels().is_empty().unwrap());
        assert_eq!(chans.ai_max().unwrap(), 5.0);
    }

    #[test]
    fn channel_properties_set_and_reset() {
        let task = Task::with_interpreter(simulated(), "props").unwrap();
        let chan = task
            .ai_channels()
            .add_ai_voltage_chan("Dev1/ai1", "", TerminalConfiguration::Rse, -10.0, 10.0, VoltageUnits::Volts)
            .unwrap();
        assert_eq!(chan.name(), "Dev1/ai1");
        assert_eq!(chan.ai_term_cfg().unwrap(), TerminalConfiguration::Rse);
        chan.set_ai_min(-2.5).unwrap();
        assert_eq!(chan.ai_min().unwrap(), -2.5);
        chan.reset_ai_min().unwrap();
        assert_eq!(chan.ai_min().unwrap(), -10.0);
        assert_eq!(chan.chan_type().unwrap(), ChannelType::AnalogInput);
    }

    #[test]
    fn closed_task_rejects_operations() {
        let mut task = Task::with_interpreter(simulated(), "closing").unwrap();
        task.close().unwrap();
        task.close().unwrap();
        assert!(task.is_closed());
        match task.start() {
            Err(DaqError::InvalidHandle { task_name }) => assert_eq!(task_name, "closing"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_task_names_are_rejected() {
        let interpreter = simulated();
        let _first = Task::with_interpreter(interpreter.clone(), "dup").unwrap();
        let err = Task::with_interpreter(interpreter, "dup").unwrap_err();
        assert!(matches!(err, DaqError::DuplicateTask { ref task_name } if task_name == "dup"));
    }

    #[test]
    fn attached_task_survives_close() {
        let interpreter = simulated();
        let owner = Task::with_interpreter(interpreter.clone(), "shared").unwrap();
        owner
            .ai_channels()
            .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, -1.0, 1.0, VoltageUnits::Volts)
            .unwrap();
        let options = GrpcSessionOptions {
            session_name: "remote".to_string(),
            initialization_behavior: SessionInitializationBehavior::Auto,
        };
        let mut attached = Task::with_session(interpreter, "shared", &options).unwrap();
        assert_eq!(attached.channel_names().unwrap(), vec!["Dev1/ai0"]);
        attached.close().unwrap();
        assert_eq!(owner.channel_names().unwrap(), vec!["Dev1/ai0"]);
    }

    #[test]
    fn read_all_available_resolves_remaining_finite_samples() {
        let task = Task::with_interpreter(simulated(), "remaining").unwrap();
        task.ai_channels()
            .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, -1.0, 1.0, VoltageUnits::Volts)
            .unwrap();
        task.timing()
            .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 50)
            .unwrap();
        assert_eq!(task.calculate_num_samps_per_chan(7).unwrap(), 7);
        assert_eq!(task.calculate_num_samps_per_chan(READ_ALL_AVAILABLE).unwrap(), 50);
    }

    #[test]
    fn running_task_rejects_timing_changes() {
        let task = Task::with_interpreter(simulated(), "running").unwrap();
        task.ai_channels()
            .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, -1.0, 1.0, VoltageUnits::Volts)
            .unwrap();
        task.timing()
            .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Continuous, 100)
            .unwrap();
        task.start().unwrap();
        let err = task.timing().set_samp_clk_rate(500.0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PropertyNotSettableWhenTaskRunning);
        assert_eq!(err.task_name(), Some("running"));
        assert!(!task.is_task_done().unwrap());
        task.stop().unwrap();
        task.timing().set_samp_clk_rate(500.0).unwrap();
        assert_eq!(task.timing().samp_clk_rate().unwrap(), 500.0);
    }

    #[test]
    fn triggers_and_exports_are_recorded() {
        let task = Task::with_interpreter(simulated(), "trig").unwrap();
        task.ai_channels()
            .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, -1.0, 1.0, VoltageUnits::Volts)
            .unwrap();
        let start = task.triggers().start_trigger();
        start.cfg_dig_edge_start_trig("/Dev1/PFI0", Edge::Falling).unwrap();
        assert_eq!(start.trig_type().unwrap(), TriggerType::DigitalEdge);
        assert_eq!(start.dig_edge_src().unwrap(), "/Dev1/PFI0");
        assert_eq!(start.dig_edge_edge().unwrap(), Edge::Falling);
        start.disable_start_trig().unwrap();
        assert_eq!(start.trig_type().unwrap(), TriggerType::None);

        task.export_signals()
            .export_signal(Signal::StartTrigger, "/Dev1/PFI1")
            .unwrap();
        assert_eq!(task.export_signals().start_trig_output_term().unwrap(), "/Dev1/PFI1");
    }

    #[test]
    #[traced_test]
    fn driver_warnings_are_logged_and_collected() {
        let task = Task::with_interpreter(simulated(), "partial_generation").unwrap();
        task.ao_channels()
            .add_ao_voltage_chan("Dev1/ao0", "out", -10.0, 10.0, VoltageUnits::Volts)
            .unwrap();
        task.timing()
            .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 100)
            .unwrap();
        task.start().unwrap();
        task.stop().unwrap();

        assert!(logs_contain("Finite generation has been stopped"));
        let warnings = task.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("partial_generation"));
        assert!(task.take_warnings().is_empty());
    }
}
