//! Enumerated constants of the NI-DAQmx API.
//!
//! Each enum mirrors a group of `DAQmx_Val_*` values from the C header. The variants carry the
//! driver's numeric value as their discriminant; [`DaqEnum`] converts in both directions at the
//! attribute boundary, so enum-valued attributes are read and written through their `i32` form.
//!
//! Bitfield attributes ([`TriggerUsage`]) and the binding-side [`WaveformAttributeMode`] are
//! `bitflags` sets instead.

use bitflags::bitflags;

use crate::error::{DaqError, ErrorCode, Result};

/// Sentinel sample count: read every sample currently available (see
/// [`Task::calculate_num_samps_per_chan`](crate::task::Task::calculate_num_samps_per_chan)).
pub const READ_ALL_AVAILABLE: i32 = -1;
/// Sentinel timeout: wait for as long as the operation takes.
pub const WAIT_INFINITELY: f64 = -1.0;

/// Conversion between an enum and the driver's `int32` encoding of it.
pub trait DaqEnum: Copy + Sized {
    fn value(self) -> i32;
    fn from_value(value: i32) -> Result<Self>;
}

macro_rules! daqmx_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl DaqEnum for $name {
            fn value(self) -> i32 {
                self as i32
            }

            fn from_value(value: i32) -> Result<Self> {
                match value {
                    $( v if v == $value => Ok($name::$variant), )+
                    other => Err(DaqError::Driver {
                        code: ErrorCode::InvalidAttributeValue,
                        message: format!("{} is not a valid {} value", other, stringify!($name)),
                        task_name: None,
                    }),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = DaqError;

            fn try_from(value: i32) -> Result<Self> {
                <$name as DaqEnum>::from_value(value)
            }
        }
    };
}

daqmx_enum! {
    /// Whether a task acquires or generates a finite number of samples or runs continuously.
    pub enum AcquisitionType {
        Finite = 10178,
        Continuous = 10123,
        HwTimedSinglePoint = 12522,
    }
}

daqmx_enum! {
    pub enum Edge {
        Rising = 10280,
        Falling = 10171,
    }
}

daqmx_enum! {
    pub enum Slope {
        Rising = 10280,
        Falling = 10171,
    }
}

daqmx_enum! {
    /// How physical digital lines map onto virtual channels.
    pub enum LineGrouping {
        /// One channel per line.
        ChanPerLine = 0,
        /// One channel for all the lines in the list. Entire ports cannot be split.
        ChanForAllLines = 1,
    }
}

daqmx_enum! {
    pub enum TerminalConfiguration {
        Default = -1,
        Rse = 10083,
        Nrse = 10078,
        Differential = 10106,
        PseudoDifferential = 12529,
    }
}

daqmx_enum! {
    pub enum VoltageUnits {
        Volts = 10348,
        FromCustomScale = 10065,
    }
}

daqmx_enum! {
    pub enum FrequencyUnits {
        Hz = 10373,
        Ticks = 10304,
        FromCustomScale = 10065,
    }
}

daqmx_enum! {
    pub enum TimeUnits {
        Seconds = 10364,
        Ticks = 10304,
        FromCustomScale = 10065,
    }
}

daqmx_enum! {
    pub enum CountDirection {
        CountUp = 10128,
        CountDown = 10124,
        ExternalControl = 10326,
    }
}

daqmx_enum! {
    pub enum CounterFrequencyMethod {
        LowFrequency1Counter = 10105,
        HighFrequency2Counters = 10157,
        LargeRange2Counters = 10205,
    }
}

daqmx_enum! {
    pub enum Level {
        High = 10192,
        Low = 10214,
    }
}

daqmx_enum! {
    pub enum Polarity {
        ActiveHigh = 10095,
        ActiveLow = 10096,
    }
}

daqmx_enum! {
    /// Whether an output task may repeat buffer contents the application has not refreshed.
    pub enum RegenerationMode {
        AllowRegeneration = 10097,
        DontAllowRegeneration = 10158,
    }
}

daqmx_enum! {
    /// How the driver waits for samples to become available (or buffer space to free up).
    pub enum WaitMode {
        WaitForInterrupt = 12523,
        Poll = 12524,
        Yield = 12525,
        Sleep = 12547,
    }
}

daqmx_enum! {
    pub enum ReadRelativeTo {
        FirstSample = 10424,
        CurrentReadPosition = 10425,
        ReferenceTrigger = 10426,
        FirstPretriggerSample = 10427,
        MostRecentSample = 10428,
    }
}

daqmx_enum! {
    pub enum WriteRelativeTo {
        FirstSample = 10424,
        CurrentWritePosition = 10430,
    }
}

daqmx_enum! {
    pub enum OverwriteMode {
        OverwriteUnreadSamples = 10252,
        DoNotOverwriteUnreadSamples = 10159,
    }
}

daqmx_enum! {
    /// Layout of multi-channel sample arrays.
    pub enum FillMode {
        /// Channel-major: all samples of channel 0, then all samples of channel 1, ...
        GroupByChannel = 0,
        /// Sample-major: sample 0 of every channel, then sample 1 of every channel, ...
        GroupByScanNumber = 1,
    }
}

daqmx_enum! {
    pub enum ChannelType {
        AnalogInput = 10100,
        AnalogOutput = 10102,
        DigitalInput = 10151,
        DigitalOutput = 10153,
        CounterInput = 10131,
        CounterOutput = 10132,
    }
}

daqmx_enum! {
    /// State transitions requested through `DAQmxTaskControl`.
    pub enum TaskMode {
        Start = 0,
        Stop = 1,
        Verify = 2,
        Commit = 3,
        Reserve = 4,
        Unreserve = 5,
        Abort = 6,
    }
}

daqmx_enum! {
    pub enum SampleTimingType {
        SampleClock = 10388,
        Implicit = 10451,
        OnDemand = 10390,
        ChangeDetection = 12504,
        Handshake = 10389,
        PipelinedSampleClock = 14668,
        BurstHandshake = 12548,
    }
}

daqmx_enum! {
    pub enum TriggerType {
        DigitalEdge = 10150,
        AnalogEdge = 10099,
        None = 10230,
    }
}

daqmx_enum! {
    /// Signals that can be routed to an output terminal with `export_signal`.
    pub enum Signal {
        SampleClock = 12487,
        ReferenceTrigger = 12490,
        StartTrigger = 12491,
        TenMhzReferenceClock = 12536,
    }
}

daqmx_enum! {
    /// Where a burst-handshake task pauses.
    pub enum PauseWhen {
        High = 10192,
        Low = 10214,
    }
}

bitflags! {
    /// Which parts of the driver's waveform metadata a waveform read harvests.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WaveformAttributeMode: u32 {
        /// `t0`, sample interval and sample interval mode.
        const TIMING = 1 << 0;
        /// Channel name, unit description and digital line names.
        const EXTENDED_PROPERTIES = 1 << 1;
    }
}

impl WaveformAttributeMode {
    pub const NONE: Self = Self::empty();
}

impl Default for WaveformAttributeMode {
    fn default() -> Self {
        WaveformAttributeMode::TIMING | WaveformAttributeMode::EXTENDED_PROPERTIES
    }
}

bitflags! {
    /// Trigger types a device supports (`DAQmx_Dev_TrigUsage`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TriggerUsage: u32 {
        const ADVANCE = 1 << 0;
        const PAUSE = 1 << 1;
        const REFERENCE = 1 << 2;
        const START = 1 << 3;
        const HANDSHAKE = 1 << 4;
        const ARM_START = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_driver_values() {
        assert_eq!(AcquisitionType::Finite.value(), 10178);
        assert_eq!(AcquisitionType::from_value(10123).unwrap(), AcquisitionType::Continuous);
        assert_eq!(i32::from(TerminalConfiguration::Default), -1);
        assert_eq!(WaitMode::try_from(12547).unwrap(), WaitMode::Sleep);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = RegenerationMode::from_value(1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidAttributeValue);
        assert!(err.to_string().contains("RegenerationMode"));
    }

    #[test]
    fn waveform_attribute_mode_defaults_to_everything() {
        let mode = WaveformAttributeMode::default();
        assert!(mode.contains(WaveformAttributeMode::TIMING));
        assert!(mode.contains(WaveformAttributeMode::EXTENDED_PROPERTIES));
        assert!(WaveformAttributeMode::NONE.is_empty());
    }

    #[test]
    fn trigger_usage_decomposes_mask() {
        let usage = TriggerUsage::from_bits_truncate(0b1001 | 0x100);
        assert!(usage.contains(TriggerUsage::ADVANCE | TriggerUsage::START));
        assert!(!usage.contains(TriggerUsage::REFERENCE));
    }
}
