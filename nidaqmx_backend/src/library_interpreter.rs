//! [`Interpreter`] implementation over the NI-DAQmx shared library.
//!
//! Every method converts its arguments to their C representation, calls one entry point of the
//! [`FunctionTable`](crate::nidaqmx::FunctionTable) through the `daqmx_call!` macro and turns the
//! returned status into a [`Result`]. Negative statuses become errors carrying the driver's
//! extended error text; positive statuses are logged and kept as [`DaqWarning`]s.

use parking_lot::Mutex;
use std::ffi::{CStr, CString};
use std::fmt;

use niwaveform_backend::PropertyValue;

use crate::attributes::system;
use crate::constants::*;
use crate::error::{DaqError, DaqWarning, ErrorCode, Result};
use crate::interpreter::*;
use crate::nidaqmx::*;

fn raw(task: TaskHandle) -> RawTaskHandle {
    task.as_raw() as RawTaskHandle
}

fn bool32(value: bool) -> CBool32 {
    CBool32::from(value)
}

fn fill32(fill_mode: FillMode) -> CBool32 {
    match fill_mode {
        FillMode::GroupByChannel => DAQMX_VAL_GROUPBYCHANNEL,
        FillMode::GroupByScanNumber => DAQMX_VAL_GROUPBYSCANNUMBER,
    }
}

// Empty strings are passed as NULL.
fn optional_cstring(value: &str) -> Result<Option<CString>> {
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(CString::new(value)?))
    }
}

fn optional_ptr(value: &Option<CString>) -> CConstStr {
    value.as_ref().map_or(std::ptr::null(), |s| s.as_ptr())
}

/// Calls a table entry and checks the returned status.
macro_rules! daqmx_call {
    ($self:ident, $func:ident ( $($arg:expr),* $(,)? )) => {{
        let f = $self.lib.require(stringify!($func), $self.lib.functions.$func)?;
        // SAFETY: the arguments follow the entry point's C signature and every pointer outlives
        // the call.
        let status = unsafe { f($($arg),*) };
        $self.check(stringify!($func), status)
    }};
}

/// Like `daqmx_call!` for reads: attaches the samples transferred to a timeout error.
macro_rules! daqmx_read {
    ($self:ident, $read:ident, $func:ident ( $($arg:expr),* $(,)? )) => {{
        let f = $self.lib.require(stringify!($func), $self.lib.functions.$func)?;
        // SAFETY: as in `daqmx_call!`; array sizes passed to the driver match the slices.
        let status = unsafe { f($($arg),*) };
        let read = $read.max(0) as usize;
        $self
            .check(stringify!($func), status)
            .map_err(|err| err.with_samples_transferred(read))
            .map(|()| read)
    }};
}

enum SetArg {
    U32(CUint32),
    I32(CInt32),
    U64(CUint64),
    F64(CFloat64),
    Str(CString),
}

struct CallbackData<'a> {
    metadata: &'a mut [WaveformMetadata],
}

/// Stores one extended property reported by a waveform read.
unsafe extern "C" fn set_wfm_attr_callback(
    channel_index: CUint32,
    attribute_name: CConstStr,
    attribute_type: CInt32,
    value: *const libc::c_void,
    value_size: CUint32,
    callback_data: CVoidPtr,
) -> CInt32 {
    if callback_data.is_null() || attribute_name.is_null() || value.is_null() {
        return -1;
    }
    let data = &mut *(callback_data as *mut CallbackData<'_>);
    let Some(metadata) = data.metadata.get_mut(channel_index as usize) else {
        return -1;
    };
    let name = CStr::from_ptr(attribute_name).to_string_lossy().into_owned();
    let property = match attribute_type {
        WFM_ATTR_BOOL32 => PropertyValue::Bool(*(value as *const CBool32) != 0),
        WFM_ATTR_INT32 => PropertyValue::Int32(*(value as *const CInt32)),
        WFM_ATTR_FLOAT64 => PropertyValue::Float64(*(value as *const CFloat64)),
        WFM_ATTR_STRING => {
            let bytes = std::slice::from_raw_parts(value as *const u8, value_size as usize);
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            PropertyValue::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        _ => return -1,
    };
    metadata.properties.insert(&name, property);
    0
}

/// Dispatches every operation to the installed NI-DAQmx driver.
pub struct LibraryInterpreter {
    lib: &'static DaqmxLibrary,
    warnings: Mutex<Vec<DaqWarning>>,
    legacy_task_handles: bool,
}

impl fmt::Debug for LibraryInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryInterpreter")
            .field("library", &self.lib.path())
            .field("legacy_task_handles", &self.legacy_task_handles)
            .finish()
    }
}

impl LibraryInterpreter {
    /// Opens the process-wide driver library and probes its version.
    pub fn new() -> Result<Self> {
        let lib = DaqmxLibrary::global()?;
        let mut interpreter = Self {
            lib,
            warnings: Mutex::new(Vec::new()),
            legacy_task_handles: false,
        };
        match interpreter.driver_version() {
            Ok((major, minor, update)) => {
                interpreter.legacy_task_handles = (major, minor) <= (8, 8);
                tracing::debug!(major, minor, update, "NI-DAQmx driver version");
            }
            Err(err) => tracing::debug!("Could not query the NI-DAQmx driver version: {}", err),
        }
        Ok(interpreter)
    }

    /// `(major, minor, update)` version of the installed driver.
    pub fn driver_version(&self) -> Result<(u32, u32, u32)> {
        let major = system::NIDAQ_MAJOR_VERSION.get(self, AttributeTarget::System)?;
        let minor = system::NIDAQ_MINOR_VERSION.get(self, AttributeTarget::System)?;
        // The update version attribute only exists from 17.x on.
        let update = system::NIDAQ_UPDATE_VERSION
            .get(self, AttributeTarget::System)
            .unwrap_or(0);
        Ok((major, minor, update))
    }

    /// Whether the driver hands out 32-bit task handles (NI-DAQmx 8.8 and earlier).
    pub fn uses_legacy_task_handles(&self) -> bool {
        self.legacy_task_handles
    }

    fn check(&self, function: &'static str, status: CInt32) -> Result<()> {
        tracing::trace!(function, status, "DAQmx call");
        if status < 0 {
            let message = self.lib.extended_error_info(status);
            return Err(DaqError::from_status(status, message));
        }
        if status > 0 {
            let warning = DaqWarning {
                code: status,
                message: self.lib.extended_error_info(status),
            };
            tracing::warn!(function, code = status, "{}", warning.message);
            self.warnings.lock().push(warning);
        }
        Ok(())
    }

    fn status_error(&self, status: CInt32) -> DaqError {
        DaqError::from_status(status, self.lib.extended_error_info(status))
    }

    // Returns the raw status so that size probes can see positive values.
    fn raw_get(&self, target: &AttributeTarget<'_>, id: CInt32, value: CVoidPtr, size: Option<CUint32>) -> Result<CInt32> {
        let lib = self.lib;
        macro_rules! get {
            ($func:ident $(, $lead:expr)*) => {{
                let f = lib.require(stringify!($func), lib.functions.$func)?;
                // SAFETY: `value` points to storage of the attribute's type, or to `size` elements.
                match size {
                    None => unsafe { f($($lead,)* id, value) },
                    Some(size) => unsafe { f($($lead,)* id, value, size) },
                }
            }};
        }
        let status = match *target {
            AttributeTarget::System => get!(DAQmxGetSystemInfoAttribute),
            AttributeTarget::Task(h) => get!(DAQmxGetTaskAttribute, raw(h)),
            AttributeTarget::Channel(h, channel) => {
                let channel = CString::new(channel)?;
                get!(DAQmxGetChanAttribute, raw(h), channel.as_ptr())
            }
            AttributeTarget::Timing(h) => get!(DAQmxGetTimingAttribute, raw(h)),
            AttributeTarget::Trigger(h) => get!(DAQmxGetTrigAttribute, raw(h)),
            AttributeTarget::Read(h) => get!(DAQmxGetReadAttribute, raw(h)),
            AttributeTarget::Write(h) => get!(DAQmxGetWriteAttribute, raw(h)),
            AttributeTarget::Buffer(h) => get!(DAQmxGetBufferAttribute, raw(h)),
            AttributeTarget::ExportedSignal(h) => get!(DAQmxGetExportedSignalAttribute, raw(h)),
            AttributeTarget::Device(device) => {
                let device = CString::new(device)?;
                get!(DAQmxGetDeviceAttribute, device.as_ptr())
            }
            AttributeTarget::PhysicalChannel(channel) => {
                let channel = CString::new(channel)?;
                get!(DAQmxGetPhysicalChanAttribute, channel.as_ptr())
            }
        };
        Ok(status)
    }

    fn get_scalar<T: Default>(&self, target: AttributeTarget<'_>, id: CInt32) -> Result<T> {
        let mut value = T::default();
        let status = self.raw_get(&target, id, &mut value as *mut T as CVoidPtr, None)?;
        self.check("DAQmxGet*Attribute", status)?;
        Ok(value)
    }

    fn raw_set(&self, target: &AttributeTarget<'_>, id: CInt32, value: SetArg) -> Result<()> {
        let lib = self.lib;
        macro_rules! set {
            ($func:ident $(, $lead:expr)*) => {{
                let f = lib.require(stringify!($func), lib.functions.$func)?;
                // SAFETY: the variadic value has the attribute's C type.
                let status = match &value {
                    SetArg::U32(v) => unsafe { f($($lead,)* id, *v) },
                    SetArg::I32(v) => unsafe { f($($lead,)* id, *v) },
                    SetArg::U64(v) => unsafe { f($($lead,)* id, *v) },
                    SetArg::F64(v) => unsafe { f($($lead,)* id, *v) },
                    SetArg::Str(v) => unsafe { f($($lead,)* id, v.as_ptr()) },
                };
                (stringify!($func), status)
            }};
        }
        let (function, status) = match *target {
            AttributeTarget::Channel(h, channel) => {
                let channel = CString::new(channel)?;
                set!(DAQmxSetChanAttribute, raw(h), channel.as_ptr())
            }
            AttributeTarget::Timing(h) => set!(DAQmxSetTimingAttribute, raw(h)),
            AttributeTarget::Trigger(h) => set!(DAQmxSetTrigAttribute, raw(h)),
            AttributeTarget::Read(h) => set!(DAQmxSetReadAttribute, raw(h)),
            AttributeTarget::Write(h) => set!(DAQmxSetWriteAttribute, raw(h)),
            AttributeTarget::Buffer(h) => set!(DAQmxSetBufferAttribute, raw(h)),
            AttributeTarget::ExportedSignal(h) => set!(DAQmxSetExportedSignalAttribute, raw(h)),
            AttributeTarget::System
            | AttributeTarget::Task(_)
            | AttributeTarget::Device(_)
            | AttributeTarget::PhysicalChannel(_) => return Err(read_only_scope(target)),
        };
        self.check(function, status)
    }
}

fn read_only_scope(target: &AttributeTarget<'_>) -> DaqError {
    DaqError::Driver {
        code: ErrorCode::Unknown,
        message: format!("Attributes of the {} scope are read-only.", target.scope_name()),
        task_name: None,
    }
}

impl Interpreter for LibraryInterpreter {
    fn create_task(&self, name: &str, behavior: SessionInitializationBehavior) -> Result<(TaskHandle, bool)> {
        let name_cstr = CString::new(name)?;
        // Zero-initialized so that 32-bit handles of old drivers are zero-extended.
        let mut handle: RawTaskHandle = std::ptr::null_mut();
        match behavior {
            SessionInitializationBehavior::AttachToServerSession => {
                daqmx_call!(self, DAQmxLoadTask(name_cstr.as_ptr(), &mut handle))?;
            }
            SessionInitializationBehavior::Auto | SessionInitializationBehavior::InitializeServerSession => {
                daqmx_call!(self, DAQmxCreateTask(name_cstr.as_ptr(), &mut handle))?;
            }
        }
        Ok((TaskHandle::from_raw(handle as usize), true))
    }

    fn clear_task(&self, task: TaskHandle) -> Result<()> {
        daqmx_call!(self, DAQmxClearTask(raw(task)))
    }

    fn start_task(&self, task: TaskHandle) -> Result<()> {
        daqmx_call!(self, DAQmxStartTask(raw(task)))
    }

    fn stop_task(&self, task: TaskHandle) -> Result<()> {
        daqmx_call!(self, DAQmxStopTask(raw(task)))
    }

    fn task_control(&self, task: TaskHandle, action: TaskMode) -> Result<()> {
        daqmx_call!(self, DAQmxTaskControl(raw(task), action.value()))
    }

    fn wait_until_task_done(&self, task: TaskHandle, timeout: f64) -> Result<()> {
        daqmx_call!(self, DAQmxWaitUntilTaskDone(raw(task), timeout))
    }

    fn is_task_done(&self, task: TaskHandle) -> Result<bool> {
        let mut done: CBool32 = 0;
        daqmx_call!(self, DAQmxIsTaskDone(raw(task), &mut done))?;
        Ok(done != 0)
    }

    fn create_channel(&self, task: TaskHandle, spec: &ChannelSpec) -> Result<()> {
        let h = raw(task);
        let physical = CString::new(spec.physical_channel())?;
        let name = CString::new(spec.name_to_assign())?;
        let (physical, name) = (physical.as_ptr(), name.as_ptr());
        match spec {
            ChannelSpec::AiVoltage {
                terminal_config,
                min_val,
                max_val,
                units,
                custom_scale_name,
                ..
            } => {
                let scale = optional_cstring(custom_scale_name)?;
                daqmx_call!(
                    self,
                    DAQmxCreateAIVoltageChan(h, physical, name, terminal_config.value(), *min_val, *max_val, units.value(), optional_ptr(&scale))
                )
            }
            ChannelSpec::AiPower {
                voltage_setpoint,
                current_setpoint,
                output_enable,
                ..
            } => daqmx_call!(
                self,
                DAQmxCreateAIPowerChan(h, physical, name, *voltage_setpoint, *current_setpoint, bool32(*output_enable))
            ),
            ChannelSpec::AoVoltage {
                min_val,
                max_val,
                units,
                custom_scale_name,
                ..
            } => {
                let scale = optional_cstring(custom_scale_name)?;
                daqmx_call!(
                    self,
                    DAQmxCreateAOVoltageChan(h, physical, name, *min_val, *max_val, units.value(), optional_ptr(&scale))
                )
            }
            ChannelSpec::Di { line_grouping, .. } => {
                daqmx_call!(self, DAQmxCreateDIChan(h, physical, name, line_grouping.value()))
            }
            ChannelSpec::Do { line_grouping, .. } => {
                daqmx_call!(self, DAQmxCreateDOChan(h, physical, name, line_grouping.value()))
            }
            ChannelSpec::CiCountEdges {
                edge,
                initial_count,
                count_direction,
                ..
            } => daqmx_call!(
                self,
                DAQmxCreateCICountEdgesChan(h, physical, name, edge.value(), *initial_count, count_direction.value())
            ),
            ChannelSpec::CiFreq {
                min_val,
                max_val,
                units,
                edge,
                meas_method,
                meas_time,
                divisor,
                custom_scale_name,
                ..
            } => {
                let scale = optional_cstring(custom_scale_name)?;
                daqmx_call!(
                    self,
                    DAQmxCreateCIFreqChan(
                        h,
                        physical,
                        name,
                        *min_val,
                        *max_val,
                        units.value(),
                        edge.value(),
                        meas_method.value(),
                        *meas_time,
                        *divisor,
                        optional_ptr(&scale),
                    )
                )
            }
            ChannelSpec::CiPeriod {
                min_val,
                max_val,
                units,
                edge,
                meas_method,
                meas_time,
                divisor,
                custom_scale_name,
                ..
            } => {
                let scale = optional_cstring(custom_scale_name)?;
                daqmx_call!(
                    self,
                    DAQmxCreateCIPeriodChan(
                        h,
                        physical,
                        name,
                        *min_val,
                        *max_val,
                        units.value(),
                        edge.value(),
                        meas_method.value(),
                        *meas_time,
                        *divisor,
                        optional_ptr(&scale),
                    )
                )
            }
            ChannelSpec::CiPulseFreq { min_val, max_val, units, .. } => daqmx_call!(
                self,
                DAQmxCreateCIPulseChanFreq(h, physical, name, *min_val, *max_val, units.value())
            ),
            ChannelSpec::CiPulseTime { min_val, max_val, units, .. } => daqmx_call!(
                self,
                DAQmxCreateCIPulseChanTime(h, physical, name, *min_val, *max_val, units.value())
            ),
            ChannelSpec::CiPulseTicks {
                source_terminal,
                min_val,
                max_val,
                ..
            } => {
                let source = optional_cstring(source_terminal)?;
                daqmx_call!(
                    self,
                    DAQmxCreateCIPulseChanTicks(h, physical, name, optional_ptr(&source), *min_val, *max_val)
                )
            }
            ChannelSpec::CoPulseFreq {
                units,
                idle_state,
                initial_delay,
                freq,
                duty_cycle,
                ..
            } => daqmx_call!(
                self,
                DAQmxCreateCOPulseChanFreq(h, physical, name, units.value(), idle_state.value(), *initial_delay, *freq, *duty_cycle)
            ),
            ChannelSpec::CoPulseTime {
                units,
                idle_state,
                initial_delay,
                low_time,
                high_time,
                ..
            } => daqmx_call!(
                self,
                DAQmxCreateCOPulseChanTime(h, physical, name, units.value(), idle_state.value(), *initial_delay, *low_time, *high_time)
            ),
            ChannelSpec::CoPulseTicks {
                source_terminal,
                idle_state,
                initial_delay,
                low_ticks,
                high_ticks,
                ..
            } => {
                let source = optional_cstring(source_terminal)?;
                daqmx_call!(
                    self,
                    DAQmxCreateCOPulseChanTicks(
                        h,
                        physical,
                        name,
                        optional_ptr(&source),
                        idle_state.value(),
                        *initial_delay,
                        *low_ticks,
                        *high_ticks,
                    )
                )
            }
        }
    }

    fn configure_timing(&self, task: TaskHandle, spec: &TimingSpec) -> Result<()> {
        let h = raw(task);
        match spec {
            TimingSpec::SampleClock {
                rate,
                source,
                active_edge,
                sample_mode,
                samps_per_chan,
            } => {
                let source = optional_cstring(source)?;
                daqmx_call!(
                    self,
                    DAQmxCfgSampClkTiming(h, optional_ptr(&source), *rate, active_edge.value(), sample_mode.value(), *samps_per_chan)
                )
            }
            TimingSpec::Implicit {
                sample_mode,
                samps_per_chan,
            } => daqmx_call!(self, DAQmxCfgImplicitTiming(h, sample_mode.value(), *samps_per_chan)),
            TimingSpec::ChangeDetection {
                rising_edge_chan,
                falling_edge_chan,
                sample_mode,
                samps_per_chan,
            } => {
                let rising = optional_cstring(rising_edge_chan)?;
                let falling = optional_cstring(falling_edge_chan)?;
                daqmx_call!(
                    self,
                    DAQmxCfgChangeDetectionTiming(h, optional_ptr(&rising), optional_ptr(&falling), sample_mode.value(), *samps_per_chan)
                )
            }
            TimingSpec::Handshaking {
                sample_mode,
                samps_per_chan,
            } => daqmx_call!(self, DAQmxCfgHandshakingTiming(h, sample_mode.value(), *samps_per_chan)),
            TimingSpec::PipelinedSampleClock {
                rate,
                source,
                active_edge,
                sample_mode,
                samps_per_chan,
            } => {
                let source = optional_cstring(source)?;
                daqmx_call!(
                    self,
                    DAQmxCfgPipelinedSampClkTiming(h, optional_ptr(&source), *rate, active_edge.value(), sample_mode.value(), *samps_per_chan)
                )
            }
            TimingSpec::BurstHandshakingImportClock {
                sample_mode,
                samps_per_chan,
                sample_clk_rate,
                sample_clk_src,
                sample_clk_active_edge,
                pause_when,
                ready_event_active_level,
            } => {
                let source = optional_cstring(sample_clk_src)?;
                daqmx_call!(
                    self,
                    DAQmxCfgBurstHandshakingTimingImportClock(
                        h,
                        sample_mode.value(),
                        *samps_per_chan,
                        *sample_clk_rate,
                        optional_ptr(&source),
                        sample_clk_active_edge.value(),
                        pause_when.value(),
                        ready_event_active_level.value(),
                    )
                )
            }
            TimingSpec::BurstHandshakingExportClock {
                sample_mode,
                samps_per_chan,
                sample_clk_rate,
                sample_clk_outp_term,
                sample_clk_pulse_polarity,
                pause_when,
                ready_event_active_level,
            } => {
                let terminal = CString::new(sample_clk_outp_term.as_str())?;
                daqmx_call!(
                    self,
                    DAQmxCfgBurstHandshakingTimingExportClock(
                        h,
                        sample_mode.value(),
                        *samps_per_chan,
                        *sample_clk_rate,
                        terminal.as_ptr(),
                        sample_clk_pulse_polarity.value(),
                        pause_when.value(),
                        ready_event_active_level.value(),
                    )
                )
            }
        }
    }

    fn configure_trigger(&self, task: TaskHandle, spec: &TriggerSpec) -> Result<()> {
        let h = raw(task);
        match spec {
            TriggerSpec::DigitalEdgeStart { source, edge } => {
                let source = CString::new(source.as_str())?;
                daqmx_call!(self, DAQmxCfgDigEdgeStartTrig(h, source.as_ptr(), edge.value()))
            }
            TriggerSpec::AnalogEdgeStart { source, slope, level } => {
                let source = CString::new(source.as_str())?;
                daqmx_call!(self, DAQmxCfgAnlgEdgeStartTrig(h, source.as_ptr(), slope.value(), *level))
            }
            TriggerSpec::DisableStart => daqmx_call!(self, DAQmxDisableStartTrig(h)),
            TriggerSpec::DigitalEdgeReference {
                source,
                edge,
                pretrigger_samples,
            } => {
                let source = CString::new(source.as_str())?;
                daqmx_call!(self, DAQmxCfgDigEdgeRefTrig(h, source.as_ptr(), edge.value(), *pretrigger_samples))
            }
            TriggerSpec::DisableReference => daqmx_call!(self, DAQmxDisableRefTrig(h)),
        }
    }

    fn export_signal(&self, task: TaskHandle, signal: Signal, output_terminal: &str) -> Result<()> {
        let terminal = CString::new(output_terminal)?;
        daqmx_call!(self, DAQmxExportSignal(raw(task), signal.value(), terminal.as_ptr()))
    }

    fn connect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()> {
        let source = CString::new(source_terminal)?;
        let destination = CString::new(destination_terminal)?;
        daqmx_call!(
            self,
            DAQmxConnectTerms(source.as_ptr(), destination.as_ptr(), DAQMX_VAL_DONOTINVERTPOLARITY)
        )
    }

    fn disconnect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()> {
        let source = CString::new(source_terminal)?;
        let destination = CString::new(destination_terminal)?;
        daqmx_call!(self, DAQmxDisconnectTerms(source.as_ptr(), destination.as_ptr()))
    }

    fn reset_device(&self, device_name: &str) -> Result<()> {
        let name = CString::new(device_name)?;
        daqmx_call!(self, DAQmxResetDevice(name.as_ptr()))
    }

    fn get_attribute_bool(&self, target: AttributeTarget<'_>, id: i32) -> Result<bool> {
        Ok(self.get_scalar::<CBool32>(target, id)? != 0)
    }

    fn get_attribute_i32(&self, target: AttributeTarget<'_>, id: i32) -> Result<i32> {
        self.get_scalar::<CInt32>(target, id)
    }

    fn get_attribute_u32(&self, target: AttributeTarget<'_>, id: i32) -> Result<u32> {
        self.get_scalar::<CUint32>(target, id)
    }

    fn get_attribute_u64(&self, target: AttributeTarget<'_>, id: i32) -> Result<u64> {
        self.get_scalar::<CUint64>(target, id)
    }

    fn get_attribute_f64(&self, target: AttributeTarget<'_>, id: i32) -> Result<f64> {
        self.get_scalar::<CFloat64>(target, id)
    }

    fn get_attribute_string(&self, target: AttributeTarget<'_>, id: i32) -> Result<String> {
        let mut failure = None;
        let result = read_string_with_probe(|buf, size| match self.raw_get(&target, id, buf as CVoidPtr, Some(size)) {
            Ok(status) => status,
            Err(err) => {
                failure = Some(err);
                0
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
        result.map_err(|status| self.status_error(status))
    }

    fn get_attribute_i32_list(&self, target: AttributeTarget<'_>, id: i32) -> Result<Vec<i32>> {
        loop {
            let size = self.raw_get(&target, id, std::ptr::null_mut(), Some(0))?;
            if size < 0 {
                return Err(self.status_error(size));
            }
            if size == 0 {
                return Ok(Vec::new());
            }
            let mut values = vec![0 as CInt32; size as usize];
            let status = self.raw_get(&target, id, values.as_mut_ptr() as CVoidPtr, Some(size as CUint32))?;
            if status == DAQMX_ERROR_BUFFER_TOO_SMALL_FOR_STRING || status == ErrorCode::ReadBufferTooSmall.code() {
                continue;
            }
            self.check("DAQmxGet*Attribute", status)?;
            return Ok(values);
        }
    }

    fn set_attribute_bool(&self, target: AttributeTarget<'_>, id: i32, value: bool) -> Result<()> {
        self.raw_set(&target, id, SetArg::U32(bool32(value)))
    }

    fn set_attribute_i32(&self, target: AttributeTarget<'_>, id: i32, value: i32) -> Result<()> {
        self.raw_set(&target, id, SetArg::I32(value))
    }

    fn set_attribute_u32(&self, target: AttributeTarget<'_>, id: i32, value: u32) -> Result<()> {
        self.raw_set(&target, id, SetArg::U32(value))
    }

    fn set_attribute_u64(&self, target: AttributeTarget<'_>, id: i32, value: u64) -> Result<()> {
        self.raw_set(&target, id, SetArg::U64(value))
    }

    fn set_attribute_f64(&self, target: AttributeTarget<'_>, id: i32, value: f64) -> Result<()> {
        self.raw_set(&target, id, SetArg::F64(value))
    }

    fn set_attribute_string(&self, target: AttributeTarget<'_>, id: i32, value: &str) -> Result<()> {
        self.raw_set(&target, id, SetArg::Str(CString::new(value)?))
    }

    fn reset_attribute(&self, target: AttributeTarget<'_>, id: i32) -> Result<()> {
        match target {
            AttributeTarget::Channel(h, channel) => {
                let channel = CString::new(channel)?;
                daqmx_call!(self, DAQmxResetChanAttribute(raw(h), channel.as_ptr(), id))
            }
            AttributeTarget::Timing(h) => daqmx_call!(self, DAQmxResetTimingAttribute(raw(h), id)),
            AttributeTarget::Trigger(h) => daqmx_call!(self, DAQmxResetTrigAttribute(raw(h), id)),
            AttributeTarget::Read(h) => daqmx_call!(self, DAQmxResetReadAttribute(raw(h), id)),
            AttributeTarget::Write(h) => daqmx_call!(self, DAQmxResetWriteAttribute(raw(h), id)),
            AttributeTarget::Buffer(h) => daqmx_call!(self, DAQmxResetBufferAttribute(raw(h), id)),
            AttributeTarget::ExportedSignal(h) => daqmx_call!(self, DAQmxResetExportedSignalAttribute(raw(h), id)),
            AttributeTarget::System
            | AttributeTarget::Task(_)
            | AttributeTarget::Device(_)
            | AttributeTarget::PhysicalChannel(_) => Err(read_only_scope(&target)),
        }
    }

    fn read_analog_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: &mut [f64]) -> Result<usize> {
        let mut read: CInt32 = 0;
        daqmx_read!(
            self,
            read,
            DAQmxReadAnalogF64(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill32(fill_mode),
                data.as_mut_ptr(),
                data.len() as CUint32,
                &mut read,
                std::ptr::null_mut(),
            )
        )
    }

    fn read_analog_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<f64> {
        let mut value: CFloat64 = 0.0;
        daqmx_call!(self, DAQmxReadAnalogScalarF64(raw(task), timeout, &mut value, std::ptr::null_mut()))?;
        Ok(value)
    }

    fn read_binary(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: BinaryBufferMut<'_>) -> Result<usize> {
        let mut read: CInt32 = 0;
        let (h, fill) = (raw(task), fill32(fill_mode));
        let reserved = std::ptr::null_mut();
        match data {
            BinaryBufferMut::I16(data) => daqmx_read!(
                self,
                read,
                DAQmxReadBinaryI16(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
            BinaryBufferMut::U16(data) => daqmx_read!(
                self,
                read,
                DAQmxReadBinaryU16(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
            BinaryBufferMut::I32(data) => daqmx_read!(
                self,
                read,
                DAQmxReadBinaryI32(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
            BinaryBufferMut::U32(data) => daqmx_read!(
                self,
                read,
                DAQmxReadBinaryU32(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
        }
    }

    fn read_digital_lines(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: &mut [u8]) -> Result<(usize, usize)> {
        let mut read: CInt32 = 0;
        let mut bytes_per_samp: CInt32 = 0;
        let samples = daqmx_read!(
            self,
            read,
            DAQmxReadDigitalLines(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill32(fill_mode),
                data.as_mut_ptr(),
                data.len() as CUint32,
                &mut read,
                &mut bytes_per_samp,
                std::ptr::null_mut(),
            )
        )?;
        Ok((samples, bytes_per_samp.max(0) as usize))
    }

    fn read_digital_port(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, data: PortBufferMut<'_>) -> Result<usize> {
        let mut read: CInt32 = 0;
        let (h, fill) = (raw(task), fill32(fill_mode));
        let reserved = std::ptr::null_mut();
        match data {
            PortBufferMut::U8(data) => daqmx_read!(
                self,
                read,
                DAQmxReadDigitalU8(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
            PortBufferMut::U16(data) => daqmx_read!(
                self,
                read,
                DAQmxReadDigitalU16(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
            PortBufferMut::U32(data) => daqmx_read!(
                self,
                read,
                DAQmxReadDigitalU32(h, num_samps_per_chan, timeout, fill, data.as_mut_ptr(), data.len() as CUint32, &mut read, reserved)
            ),
        }
    }

    fn read_digital_scalar_u32(&self, task: TaskHandle, timeout: f64) -> Result<u32> {
        let mut value: CUint32 = 0;
        daqmx_call!(self, DAQmxReadDigitalScalarU32(raw(task), timeout, &mut value, std::ptr::null_mut()))?;
        Ok(value)
    }

    fn read_counter_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, data: &mut [f64]) -> Result<usize> {
        let mut read: CInt32 = 0;
        daqmx_read!(
            self,
            read,
            DAQmxReadCounterF64(raw(task), num_samps_per_chan, timeout, data.as_mut_ptr(), data.len() as CUint32, &mut read, std::ptr::null_mut())
        )
    }

    fn read_counter_u32(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, data: &mut [u32]) -> Result<usize> {
        let mut read: CInt32 = 0;
        daqmx_read!(
            self,
            read,
            DAQmxReadCounterU32(raw(task), num_samps_per_chan, timeout, data.as_mut_ptr(), data.len() as CUint32, &mut read, std::ptr::null_mut())
        )
    }

    fn read_counter_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<f64> {
        let mut value: CFloat64 = 0.0;
        daqmx_call!(self, DAQmxReadCounterScalarF64(raw(task), timeout, &mut value, std::ptr::null_mut()))?;
        Ok(value)
    }

    fn read_counter_scalar_u32(&self, task: TaskHandle, timeout: f64) -> Result<u32> {
        let mut value: CUint32 = 0;
        daqmx_call!(self, DAQmxReadCounterScalarU32(raw(task), timeout, &mut value, std::ptr::null_mut()))?;
        Ok(value)
    }

    fn read_ctr_freq(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, frequency: &mut [f64], duty_cycle: &mut [f64]) -> Result<usize> {
        let mut read: CInt32 = 0;
        let size = frequency.len().min(duty_cycle.len()) as CUint32;
        daqmx_read!(
            self,
            read,
            DAQmxReadCtrFreq(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill_mode.value(),
                frequency.as_mut_ptr(),
                duty_cycle.as_mut_ptr(),
                size,
                &mut read,
                std::ptr::null_mut(),
            )
        )
    }

    fn read_ctr_time(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, high_time: &mut [f64], low_time: &mut [f64]) -> Result<usize> {
        let mut read: CInt32 = 0;
        let size = high_time.len().min(low_time.len()) as CUint32;
        daqmx_read!(
            self,
            read,
            DAQmxReadCtrTime(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill_mode.value(),
                high_time.as_mut_ptr(),
                low_time.as_mut_ptr(),
                size,
                &mut read,
                std::ptr::null_mut(),
            )
        )
    }

    fn read_ctr_ticks(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, high_ticks: &mut [u32], low_ticks: &mut [u32]) -> Result<usize> {
        let mut read: CInt32 = 0;
        let size = high_ticks.len().min(low_ticks.len()) as CUint32;
        daqmx_read!(
            self,
            read,
            DAQmxReadCtrTicks(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill_mode.value(),
                high_ticks.as_mut_ptr(),
                low_ticks.as_mut_ptr(),
                size,
                &mut read,
                std::ptr::null_mut(),
            )
        )
    }

    fn read_ctr_freq_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)> {
        let (mut frequency, mut duty_cycle): (CFloat64, CFloat64) = (0.0, 0.0);
        daqmx_call!(
            self,
            DAQmxReadCtrFreqScalar(raw(task), timeout, &mut frequency, &mut duty_cycle, std::ptr::null_mut())
        )?;
        Ok((frequency, duty_cycle))
    }

    fn read_ctr_time_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)> {
        let (mut high, mut low): (CFloat64, CFloat64) = (0.0, 0.0);
        daqmx_call!(self, DAQmxReadCtrTimeScalar(raw(task), timeout, &mut high, &mut low, std::ptr::null_mut()))?;
        Ok((high, low))
    }

    fn read_ctr_ticks_scalar(&self, task: TaskHandle, timeout: f64) -> Result<(u32, u32)> {
        let (mut high, mut low): (CUint32, CUint32) = (0, 0);
        daqmx_call!(self, DAQmxReadCtrTicksScalar(raw(task), timeout, &mut high, &mut low, std::ptr::null_mut()))?;
        Ok((high, low))
    }

    fn read_power_f64(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, voltage: &mut [f64], current: &mut [f64]) -> Result<usize> {
        let mut read: CInt32 = 0;
        let size = voltage.len().min(current.len()) as CUint32;
        daqmx_read!(
            self,
            read,
            DAQmxReadPowerF64(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill_mode.value(),
                voltage.as_mut_ptr(),
                current.as_mut_ptr(),
                size,
                &mut read,
                std::ptr::null_mut(),
            )
        )
    }

    fn read_power_binary_i16(&self, task: TaskHandle, num_samps_per_chan: i32, timeout: f64, fill_mode: FillMode, voltage: &mut [i16], current: &mut [i16]) -> Result<usize> {
        let mut read: CInt32 = 0;
        let size = voltage.len().min(current.len()) as CUint32;
        daqmx_read!(
            self,
            read,
            DAQmxReadPowerBinaryI16(
                raw(task),
                num_samps_per_chan,
                timeout,
                fill_mode.value(),
                voltage.as_mut_ptr(),
                current.as_mut_ptr(),
                size,
                &mut read,
                std::ptr::null_mut(),
            )
        )
    }

    fn read_power_scalar_f64(&self, task: TaskHandle, timeout: f64) -> Result<(f64, f64)> {
        let (mut voltage, mut current): (CFloat64, CFloat64) = (0.0, 0.0);
        daqmx_call!(
            self,
            DAQmxReadPowerScalarF64(raw(task), timeout, &mut voltage, &mut current, std::ptr::null_mut())
        )?;
        Ok((voltage, current))
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
        let channels = buffers.len();
        let array_size = buffers.iter().map(|b| b.len()).min().unwrap_or(0) as CUint32;
        let pointers: Vec<*mut CFloat64> = buffers.iter_mut().map(|b| b.as_mut_ptr()).collect();
        let timing = mode.contains(WaveformAttributeMode::TIMING);
        let mut t0 = vec![0 as CInt64; if timing { channels } else { 0 }];
        let mut dt = vec![0.0 as CFloat64; if timing { channels } else { 0 }];
        let mut callback_data = CallbackData { metadata: &mut *metadata };
        let (callback, data_ptr): (Option<SetWfmAttrCallback>, CVoidPtr) = if mode.contains(WaveformAttributeMode::EXTENDED_PROPERTIES) {
            (Some(set_wfm_attr_callback as SetWfmAttrCallback), &mut callback_data as *mut CallbackData<'_> as CVoidPtr)
        } else {
            (None, std::ptr::null_mut())
        };
        let mut read: CInt32 = 0;
        let samples = daqmx_read!(
            self,
            read,
            DAQmxInternalReadAnalogWaveformPerChan(
                raw(task),
                num_samps_per_chan,
                timeout,
                if timing { t0.as_mut_ptr() } else { std::ptr::null_mut() },
                t0.len() as CUint32,
                if timing { dt.as_mut_ptr() } else { std::ptr::null_mut() },
                dt.len() as CUint32,
                callback,
                data_ptr,
                pointers.as_ptr(),
                channels as CUint32,
                array_size,
                &mut read,
                std::ptr::null_mut(),
            )
        )?;
        if timing {
            for (meta, (&t0, &dt)) in metadata.iter_mut().zip(t0.iter().zip(dt.iter())) {
                meta.t0_ticks = Some(t0);
                meta.sample_interval = Some(dt);
            }
        }
        Ok(samples)
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
        let channels = bytes_per_chan.len();
        let timing = mode.contains(WaveformAttributeMode::TIMING);
        let mut t0 = vec![0 as CInt64; if timing { channels } else { 0 }];
        let mut dt = vec![0.0 as CFloat64; if timing { channels } else { 0 }];
        let mut callback_data = CallbackData { metadata: &mut *metadata };
        let (callback, data_ptr): (Option<SetWfmAttrCallback>, CVoidPtr) = if mode.contains(WaveformAttributeMode::EXTENDED_PROPERTIES) {
            (Some(set_wfm_attr_callback as SetWfmAttrCallback), &mut callback_data as *mut CallbackData<'_> as CVoidPtr)
        } else {
            (None, std::ptr::null_mut())
        };
        let mut read: CInt32 = 0;
        let samples = daqmx_read!(
            self,
            read,
            DAQmxInternalReadDigitalWaveform(
                raw(task),
                num_samps_per_chan,
                timeout,
                if timing { t0.as_mut_ptr() } else { std::ptr::null_mut() },
                t0.len() as CUint32,
                if timing { dt.as_mut_ptr() } else { std::ptr::null_mut() },
                dt.len() as CUint32,
                bytes_per_chan.as_ptr(),
                channels as CUint32,
                callback,
                data_ptr,
                data.as_mut_ptr(),
                data.len() as CUint32,
                &mut read,
                std::ptr::null_mut(),
            )
        )?;
        if timing {
            for (meta, (&t0, &dt)) in metadata.iter_mut().zip(t0.iter().zip(dt.iter())) {
                meta.t0_ticks = Some(t0);
                meta.sample_interval = Some(dt);
            }
        }
        Ok(samples)
    }

    fn write_analog_f64(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: &[f64]) -> Result<usize> {
        let mut written: CInt32 = 0;
        daqmx_read!(
            self,
            written,
            DAQmxWriteAnalogF64(
                raw(task),
                num_samps_per_chan,
                bool32(auto_start),
                timeout,
                fill32(fill_mode),
                data.as_ptr(),
                &mut written,
                std::ptr::null_mut(),
            )
        )
    }

    fn write_analog_scalar_f64(&self, task: TaskHandle, auto_start: bool, timeout: f64, value: f64) -> Result<()> {
        daqmx_call!(
            self,
            DAQmxWriteAnalogScalarF64(raw(task), bool32(auto_start), timeout, value, std::ptr::null_mut())
        )
    }

    fn write_binary(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: BinaryBuffer<'_>) -> Result<usize> {
        let mut written: CInt32 = 0;
        let (h, start, fill) = (raw(task), bool32(auto_start), fill32(fill_mode));
        let reserved = std::ptr::null_mut();
        match data {
            BinaryBuffer::I16(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteBinaryI16(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
            BinaryBuffer::U16(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteBinaryU16(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
            BinaryBuffer::I32(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteBinaryI32(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
            BinaryBuffer::U32(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteBinaryU32(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
        }
    }

    fn write_digital_lines(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: &[u8]) -> Result<usize> {
        let mut written: CInt32 = 0;
        daqmx_read!(
            self,
            written,
            DAQmxWriteDigitalLines(
                raw(task),
                num_samps_per_chan,
                bool32(auto_start),
                timeout,
                fill32(fill_mode),
                data.as_ptr(),
                &mut written,
                std::ptr::null_mut(),
            )
        )
    }

    fn write_digital_port(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, data: PortBuffer<'_>) -> Result<usize> {
        let mut written: CInt32 = 0;
        let (h, start, fill) = (raw(task), bool32(auto_start), fill32(fill_mode));
        let reserved = std::ptr::null_mut();
        match data {
            PortBuffer::U8(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteDigitalU8(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
            PortBuffer::U16(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteDigitalU16(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
            PortBuffer::U32(data) => daqmx_read!(
                self,
                written,
                DAQmxWriteDigitalU32(h, num_samps_per_chan, start, timeout, fill, data.as_ptr(), &mut written, reserved)
            ),
        }
    }

    fn write_digital_scalar_u32(&self, task: TaskHandle, auto_start: bool, timeout: f64, value: u32) -> Result<()> {
        daqmx_call!(
            self,
            DAQmxWriteDigitalScalarU32(raw(task), bool32(auto_start), timeout, value, std::ptr::null_mut())
        )
    }

    fn write_ctr_freq(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, frequency: &[f64], duty_cycle: &[f64]) -> Result<usize> {
        let mut written: CInt32 = 0;
        daqmx_read!(
            self,
            written,
            DAQmxWriteCtrFreq(
                raw(task),
                num_samps_per_chan,
                bool32(auto_start),
                timeout,
                fill32(fill_mode),
                frequency.as_ptr(),
                duty_cycle.as_ptr(),
                &mut written,
                std::ptr::null_mut(),
            )
        )
    }

    fn write_ctr_time(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, high_time: &[f64], low_time: &[f64]) -> Result<usize> {
        let mut written: CInt32 = 0;
        daqmx_read!(
            self,
            written,
            DAQmxWriteCtrTime(
                raw(task),
                num_samps_per_chan,
                bool32(auto_start),
                timeout,
                fill32(fill_mode),
                high_time.as_ptr(),
                low_time.as_ptr(),
                &mut written,
                std::ptr::null_mut(),
            )
        )
    }

    fn write_ctr_ticks(&self, task: TaskHandle, num_samps_per_chan: i32, auto_start: bool, timeout: f64, fill_mode: FillMode, high_ticks: &[u32], low_ticks: &[u32]) -> Result<usize> {
        let mut written: CInt32 = 0;
        daqmx_read!(
            self,
            written,
            DAQmxWriteCtrTicks(
                raw(task),
                num_samps_per_chan,
                bool32(auto_start),
                timeout,
                fill32(fill_mode),
                high_ticks.as_ptr(),
                low_ticks.as_ptr(),
                &mut written,
                std::ptr::null_mut(),
            )
        )
    }

    fn write_ctr_freq_scalar(&self, task: TaskHandle, auto_start: bool, timeout: f64, frequency: f64, duty_cycle: f64) -> Result<()> {
        daqmx_call!(
            self,
            DAQmxWriteCtrFreqScalar(raw(task), bool32(auto_start), timeout, frequency, duty_cycle, std::ptr::null_mut())
        )
    }

    fn write_ctr_time_scalar(&self, task: TaskHandle, auto_start: bool, timeout: f64, high_time: f64, low_time: f64) -> Result<()> {
        daqmx_call!(
            self,
            DAQmxWriteCtrTimeScalar(raw(task), bool32(auto_start), timeout, high_time, low_time, std::ptr::null_mut())
        )
    }

    fn write_ctr_ticks_scalar(&self, task: TaskHandle, auto_start: bool, timeout: f64, high_ticks: u32, low_ticks: u32) -> Result<()> {
        daqmx_call!(
            self,
            DAQmxWriteCtrTicksScalar(raw(task), bool32(auto_start), timeout, high_ticks, low_ticks, std::ptr::null_mut())
        )
    }

    fn take_warnings(&self) -> Vec<DaqWarning> {
        std::mem::take(&mut *self.warnings.lock())
    }
}
