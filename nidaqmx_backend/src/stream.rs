//! Read-side and write-side stream configuration of a task.
//!
//! [`InStream`] and [`OutStream`] are `Copy` views of a [`Task`]. Besides the driver attributes
//! of the read, write and buffer scopes they carry a few binding-side settings that the readers
//! and writers consult on every call: the timeout, the waveform attribute mode and the
//! writers' `auto_start` override. Those settings live in the task, so every view of the same
//! task sees the same values.

use tracing::debug;

use crate::attributes::{buffer, read, write};
use crate::constants::*;
use crate::error::Result;
use crate::interpreter::{AttributeTarget, TaskHandle};
use crate::task::Task;

/// Timeout, in seconds, used by readers and writers until one is set.
pub const DEFAULT_TIMEOUT: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct InStreamSettings {
    pub timeout: f64,
    pub waveform_attribute_mode: WaveformAttributeMode,
}

impl Default for InStreamSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            waveform_attribute_mode: WaveformAttributeMode::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct OutStreamSettings {
    pub timeout: f64,
    pub auto_start: Option<bool>,
}

impl Default for OutStreamSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            auto_start: None,
        }
    }
}

/// Read-side configuration of a task.
#[derive(Clone, Copy, Debug)]
pub struct InStream<'a> {
    task: &'a Task,
}

impl<'a> InStream<'a> {
    pub(crate) fn new(task: &'a Task) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &'a Task {
        self.task
    }

    fn target(&self, handle: TaskHandle) -> AttributeTarget<'static> {
        AttributeTarget::Read(handle)
    }

    /// Seconds a read waits for the requested samples. `0` reads whatever is available;
    /// [`WAIT_INFINITELY`] waits without limit.
    pub fn timeout(&self) -> f64 {
        self.task.in_settings.lock().timeout
    }

    pub fn set_timeout(&self, timeout: f64) {
        debug!(task = self.task.name(), timeout, "in-stream timeout");
        self.task.in_settings.lock().timeout = timeout;
    }

    /// Which metadata waveform reads harvest.
    pub fn waveform_attribute_mode(&self) -> WaveformAttributeMode {
        self.task.in_settings.lock().waveform_attribute_mode
    }

    pub fn set_waveform_attribute_mode(&self, mode: WaveformAttributeMode) {
        self.task.in_settings.lock().waveform_attribute_mode = mode;
    }

    /// Size of the input buffer in samples per channel.
    pub fn input_buf_size(&self) -> Result<u32> {
        self.task.get_property(&buffer::INPUT_BUF_SIZE, AttributeTarget::Buffer)
    }

    pub fn set_input_buf_size(&self, samples: u32) -> Result<()> {
        self.task.set_property(&buffer::INPUT_BUF_SIZE, AttributeTarget::Buffer, samples)
    }

    pub fn reset_input_buf_size(&self) -> Result<()> {
        self.task.reset_property(&buffer::INPUT_BUF_SIZE, AttributeTarget::Buffer)
    }

    properties! {
        get overwrite, set set_overwrite, reset reset_overwrite: OverwriteMode = read::OVERWRITE;
        /// Whether [`READ_ALL_AVAILABLE`] reads only what is buffered, even for finite tasks.
        get read_all_avail_samp, set set_read_all_avail_samp, reset reset_read_all_avail_samp: bool = read::READ_ALL_AVAIL_SAMP;
        /// Whether a read starts a task that is not running.
        get auto_start, set set_auto_start, reset reset_auto_start: bool = read::AUTO_START;
        get relative_to, set set_relative_to, reset reset_relative_to: ReadRelativeTo = read::RELATIVE_TO;
        get offset, set set_offset, reset reset_offset: i32 = read::OFFSET;
        get channels_to_read, set set_channels_to_read, reset reset_channels_to_read: Vec<String> = read::CHANNELS_TO_READ;
        get curr_read_pos: u64 = read::CURR_READ_POS;
        get avail_samp_per_chan: u32 = read::AVAIL_SAMP_PER_CHAN;
        get total_samp_per_chan_acquired: u64 = read::TOTAL_SAMP_PER_CHAN_ACQUIRED;
        /// Channels a read returns, after `channels_to_read` is applied.
        get num_chans: u32 = read::NUM_CHANS;
        get raw_data_width: u32 = read::RAW_DATA_WIDTH;
        /// Bytes per sample of a digital-lines read; the widest channel's line count.
        get di_num_booleans_per_chan: u32 = read::DIGITAL_LINES_BYTES_PER_CHAN;
        get wait_mode, set set_wait_mode, reset reset_wait_mode: WaitMode = read::WAIT_MODE;
        get sleep_time, set set_sleep_time, reset reset_sleep_time: f64 = read::SLEEP_TIME;
    }
}

/// Write-side configuration of a task.
#[derive(Clone, Copy, Debug)]
pub struct OutStream<'a> {
    task: &'a Task,
}

impl<'a> OutStream<'a> {
    pub(crate) fn new(task: &'a Task) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &'a Task {
        self.task
    }

    fn target(&self, handle: TaskHandle) -> AttributeTarget<'static> {
        AttributeTarget::Write(handle)
    }

    pub fn timeout(&self) -> f64 {
        self.task.out_settings.lock().timeout
    }

    pub fn set_timeout(&self, timeout: f64) {
        debug!(task = self.task.name(), timeout, "out-stream timeout");
        self.task.out_settings.lock().timeout = timeout;
    }

    /// Explicit `auto_start` for writes. `None` leaves the choice to each writer method:
    /// one-sample writes start the task, many-sample writes do not.
    pub fn auto_start(&self) -> Option<bool> {
        self.task.out_settings.lock().auto_start
    }

    pub fn set_auto_start(&self, auto_start: Option<bool>) {
        self.task.out_settings.lock().auto_start = auto_start;
    }

    pub fn output_buf_size(&self) -> Result<u32> {
        self.task.get_property(&buffer::OUTPUT_BUF_SIZE, AttributeTarget::Buffer)
    }

    pub fn set_output_buf_size(&self, samples: u32) -> Result<()> {
        self.task.set_property(&buffer::OUTPUT_BUF_SIZE, AttributeTarget::Buffer, samples)
    }

    pub fn reset_output_buf_size(&self) -> Result<()> {
        self.task.reset_property(&buffer::OUTPUT_BUF_SIZE, AttributeTarget::Buffer)
    }

    properties! {
        /// With [`RegenerationMode::DontAllowRegeneration`] a write waits until the previous
        /// samples have been generated.
        get regen_mode, set set_regen_mode, reset reset_regen_mode: RegenerationMode = write::REGEN_MODE;
        get relative_to, set set_relative_to, reset reset_relative_to: WriteRelativeTo = write::RELATIVE_TO;
        get offset, set set_offset, reset reset_offset: i32 = write::OFFSET;
        get curr_write_pos: u64 = write::CURR_WRITE_POS;
        get space_avail: u32 = write::SPACE_AVAIL;
        get total_samp_per_chan_generated: u64 = write::TOTAL_SAMP_PER_CHAN_GENERATED;
        get num_chans: u32 = write::NUM_CHANS;
        get raw_data_width: u32 = write::RAW_DATA_WIDTH;
        get do_num_booleans_per_chan: u32 = write::DIGITAL_LINES_BYTES_PER_CHAN;
        get wait_mode, set set_wait_mode, reset reset_wait_mode: WaitMode = write::WAIT_MODE;
        get sleep_time, set set_sleep_time, reset reset_sleep_time: f64 = write::SLEEP_TIME;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedInterpreter;
    use std::sync::Arc;

    fn ai_task(name: &str) -> Task {
        let task = Task::with_interpreter(Arc::new(SimulatedInterpreter::new()), name).unwrap();
        task.ai_channels()
            .add_ai_voltage_chan("Dev1/ai0:1", "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)
            .unwrap();
        task
    }

    #[test]
    fn settings_are_shared_between_views() {
        let task = ai_task("shared_settings");
        task.in_stream().set_timeout(0.5);
        assert_eq!(task.in_stream().timeout(), 0.5);
        assert_eq!(task.out_stream().timeout(), DEFAULT_TIMEOUT);
        task.in_stream().set_waveform_attribute_mode(WaveformAttributeMode::TIMING);
        assert_eq!(task.in_stream().waveform_attribute_mode(), WaveformAttributeMode::TIMING);
        assert_eq!(task.out_stream().auto_start(), None);
    }

    #[test]
    fn stream_attributes_round_trip() {
        let task = ai_task("stream_attrs");
        let stream = task.in_stream();
        assert!(stream.auto_start().unwrap());
        stream.set_read_all_avail_samp(true).unwrap();
        assert!(stream.read_all_avail_samp().unwrap());
        stream.reset_read_all_avail_samp().unwrap();
        assert!(!stream.read_all_avail_samp().unwrap());
        assert_eq!(stream.num_chans().unwrap(), 2);

        stream.set_channels_to_read(vec!["Dev1/ai1".to_string()]).unwrap();
        assert_eq!(stream.num_chans().unwrap(), 1);
        assert_eq!(stream.channels_to_read().unwrap(), vec!["Dev1/ai1"]);
    }

    #[test]
    fn read_stream_attributes_may_change_while_running() {
        let task = ai_task("running_stream");
        task.timing()
            .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Continuous, 1000)
            .unwrap();
        task.start().unwrap();
        task.in_stream().set_wait_mode(WaitMode::Poll).unwrap();
        assert_eq!(task.in_stream().wait_mode().unwrap(), WaitMode::Poll);
        assert!(task.in_stream().input_buf_size().unwrap() >= 10_000);
    }
}
