//! A Rust binding for the NI-DAQmx driver.
//!
//! A [`Task`] owns a driver task handle and groups channels, timing, triggers and the
//! [`InStream`]/[`OutStream`] buffer views. Readers and writers in [`stream_readers`] and
//! [`stream_writers`] move samples between the task's buffers and caller-owned `ndarray` arrays
//! or `niwaveform_backend` waveforms.
//!
//! Every driver call goes through the [`Interpreter`] trait. [`LibraryInterpreter`] loads the
//! NI-DAQmx shared library at runtime; [`SimulatedInterpreter`] is an in-process driver for tests
//! and machines without hardware.

#[macro_use]
pub mod attributes;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod installer;
pub mod interpreter;
pub mod library_interpreter;
pub mod nidaqmx;
pub mod simulated;
pub mod stream;
pub mod stream_readers;
pub mod stream_writers;
pub mod system;
pub mod task;
pub mod types;
pub mod utils;
pub mod waveforms;

pub use error::{DaqError, DaqWarning, ErrorCode, Result};
pub use interpreter::{Interpreter, SessionInitializationBehavior, TaskHandle};
pub use library_interpreter::LibraryInterpreter;
pub use simulated::{SimulatedDevice, SimulatedInterpreter};
pub use stream::{InStream, OutStream};
pub use system::{Device, PersistedTask, PersistedTaskCollection, System};
pub use task::{GrpcSessionOptions, Task};
pub use utils::{flatten_channel_string, unflatten_channel_string};

/// Everything needed to configure a task and move samples through it.
pub mod prelude {
    pub use crate::config::{set_feature, FeatureToggle};
    pub use crate::constants::*;
    pub use crate::error::{DaqError, Result};
    pub use crate::stream::{InStream, OutStream};
    pub use crate::stream_readers::{
        AnalogMultiChannelReader, AnalogSingleChannelReader, AnalogUnscaledReader, CounterReader,
        DigitalMultiChannelReader, DigitalSingleChannelReader, PowerBinaryReader, PowerMultiChannelReader,
        PowerSingleChannelReader,
    };
    pub use crate::stream_writers::{
        AnalogMultiChannelWriter, AnalogSingleChannelWriter, AnalogUnscaledWriter, CounterWriter,
        DigitalMultiChannelWriter, DigitalSingleChannelWriter,
    };
    pub use crate::system::System;
    pub use crate::task::Task;
    pub use crate::types::*;
    pub use niwaveform_backend::{AnalogWaveform, DigitalWaveform, ReallocationPolicy, Timing};
}
