//! Adapts driver waveform reads to the caller-owned containers of `niwaveform_backend`.
//!
//! The waveform read entry points fill plain sample buffers and report per-channel metadata as
//! [`WaveformMetadata`]. This module sizes the caller's waveforms before a read (applying the
//! [`ReallocationPolicy`]), and afterwards converts start ticks and sample interval into a
//! [`Timing`] and moves the extended properties across.
//!
//! Digital waveforms read from a port channel place line 0 in the last column (MSB first). Line
//! channels place line 0 in the first column.

use niwaveform_backend::{
    fill_digital_rows, split_names, timestamp_from_ticks, AnalogWaveform, DigitalWaveform, LineOrder,
    ReallocationPolicy, Timing, WaveformError, LINE_NAMES,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use crate::error::{DaqError, Result};
use crate::interpreter::WaveformMetadata;

static PORT_CHANNEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"/port\d+$").expect("port channel pattern compiles"));

/// Whether `physical_channel` names a whole port rather than individual lines.
pub fn is_port_channel(physical_channel: &str) -> bool {
    PORT_CHANNEL.is_match(physical_channel.trim())
}

/// Column order of a digital waveform read from `physical_channel`.
pub fn line_order(physical_channel: &str) -> LineOrder {
    if is_port_channel(physical_channel) {
        LineOrder::MsbFirst
    } else {
        LineOrder::LsbFirst
    }
}

/// Converts a waveform sizing failure of waveform `index` into the binding's error kinds.
pub(crate) fn waveform_error(index: usize, err: WaveformError) -> DaqError {
    match err {
        WaveformError::InsufficientCapacity { required, available } => DaqError::read_buffer_too_small(format!(
            "The waveform at index {} does not have enough space ({}) to hold the requested number of samples ({}). The waveform is {} samples short. Use a larger waveform or allow reallocation.",
            index,
            available,
            required,
            required - available
        )),
        WaveformError::SignalCountMismatch { expected, actual } => DaqError::mismatched_sizes(format!(
            "The waveform at index {} has {} signals, but the channel has {} lines.",
            index, actual, expected
        )),
        other => DaqError::mismatched_sizes(format!("The waveform at index {} is invalid: {}", index, other)),
    }
}

/// Makes room for `samples` in every waveform, or fails before touching any of them.
pub(crate) fn prepare_analog<T: Copy + Default>(
    waveforms: &mut [AnalogWaveform<T>],
    samples: usize,
    policy: ReallocationPolicy,
) -> Result<()> {
    if policy == ReallocationPolicy::DoNotReallocate {
        if let Some((index, waveform)) = waveforms.iter().enumerate().find(|(_, w)| w.writable_len() < samples) {
            return Err(waveform_error(
                index,
                WaveformError::InsufficientCapacity {
                    required: samples,
                    available: waveform.writable_len(),
                },
            ));
        }
    }
    for (index, waveform) in waveforms.iter_mut().enumerate() {
        waveform
            .ensure_writable(samples, policy)
            .map_err(|e| waveform_error(index, e))?;
    }
    Ok(())
}

/// Checks the signal counts against `lines`, then makes room for `samples` in every waveform.
pub(crate) fn prepare_digital(
    waveforms: &mut [DigitalWaveform],
    lines: &[usize],
    samples: usize,
    policy: ReallocationPolicy,
) -> Result<()> {
    for (index, (waveform, &expected)) in waveforms.iter().zip(lines).enumerate() {
        waveform
            .check_signal_count(expected)
            .map_err(|e| waveform_error(index, e))?;
        if policy == ReallocationPolicy::DoNotReallocate && waveform.writable_len() < samples {
            return Err(waveform_error(
                index,
                WaveformError::InsufficientCapacity {
                    required: samples,
                    available: waveform.writable_len(),
                },
            ));
        }
    }
    for (index, waveform) in waveforms.iter_mut().enumerate() {
        waveform
            .ensure_writable(samples, policy)
            .map_err(|e| waveform_error(index, e))?;
    }
    Ok(())
}

/// Timing described by the driver metadata; empty when timing was not requested.
pub(crate) fn timing_from(metadata: &WaveformMetadata) -> Timing {
    let Some(t0) = metadata.t0_ticks.and_then(timestamp_from_ticks) else {
        return Timing::empty();
    };
    match metadata.sample_interval {
        Some(interval) if interval > 0.0 && interval.is_finite() => {
            Timing::create_with_regular_interval(Duration::from_secs_f64(interval), t0)
        }
        _ => Timing::create_with_no_interval(t0),
    }
}

pub(crate) fn apply_analog<T: Copy + Default>(
    waveform: &mut AnalogWaveform<T>,
    samples: usize,
    metadata: WaveformMetadata,
) -> Result<()> {
    waveform
        .set_sample_count(samples)
        .map_err(|e| waveform_error(0, e))?;
    waveform.set_timing(timing_from(&metadata));
    *waveform.extended_properties_mut() = metadata.properties;
    Ok(())
}

/// Copies one channel's block of line states into `waveform` and applies its metadata.
pub(crate) fn apply_digital(
    waveform: &mut DigitalWaveform,
    block: &[u8],
    bytes_per_sample: usize,
    order: LineOrder,
    samples: usize,
    metadata: WaveformMetadata,
) -> Result<()> {
    {
        let mut rows = waveform
            .writable_rows_mut(samples)
            .map_err(|e| waveform_error(0, e))?;
        fill_digital_rows(block, bytes_per_sample, order, &mut rows);
    }
    waveform
        .set_sample_count(samples)
        .map_err(|e| waveform_error(0, e))?;
    waveform.set_timing(timing_from(&metadata));
    waveform.set_signal_names(split_names(metadata.properties.get_str(LINE_NAMES)));
    *waveform.extended_properties_mut() = metadata.properties;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use niwaveform_backend::{timestamp_to_ticks, PropertyValue, SampleIntervalMode};

    #[test]
    fn port_channels_are_recognised() {
        assert!(is_port_channel("Dev1/port0"));
        assert!(is_port_channel("/Dev1/port12 "));
        assert!(!is_port_channel("Dev1/port0/line3"));
        assert!(!is_port_channel("Dev1/port0/line0:7"));
        assert_eq!(line_order("Dev1/port1"), LineOrder::MsbFirst);
        assert_eq!(line_order("Dev1/port1/line2"), LineOrder::LsbFirst);
    }

    #[test]
    fn do_not_reallocate_names_the_short_waveform() {
        let mut waveforms = vec![AnalogWaveform::<f64>::with_capacity(10), AnalogWaveform::with_capacity(9)];
        let before = waveforms.clone();
        let err = prepare_analog(&mut waveforms, 10, ReallocationPolicy::DoNotReallocate).unwrap_err();
        assert!(matches!(err, DaqError::ReadBufferTooSmall { .. }));
        let message = err.to_string();
        assert!(message.contains("index 1"), "{message}");
        assert!(message.contains("1 samples short"), "{message}");
        assert_eq!(waveforms, before);
    }

    #[test]
    fn metadata_becomes_regular_timing() {
        let t0 = chrono::Utc::now();
        let mut metadata = WaveformMetadata {
            t0_ticks: Some(timestamp_to_ticks(t0)),
            sample_interval: Some(0.001),
            ..Default::default()
        };
        metadata
            .properties
            .insert(LINE_NAMES, PropertyValue::String("Dev1/port0/line0, Dev1/port0/line1".to_string()));
        let timing = timing_from(&metadata);
        assert_eq!(timing.sample_interval_mode(), SampleIntervalMode::Regular);
        let interval = timing.sample_interval().unwrap().as_secs_f64();
        assert!((interval - 0.001).abs() < 1e-12, "{interval}");

        let mut waveform = DigitalWaveform::new(0, 2);
        waveform.ensure_writable(2, ReallocationPolicy::Reallocate).unwrap();
        apply_digital(&mut waveform, &[1, 0, 0, 1], 2, LineOrder::LsbFirst, 2, metadata).unwrap();
        assert_eq!(waveform.signal_names(), ["Dev1/port0/line0", "Dev1/port0/line1"]);
        assert_eq!(waveform.samples().row(0).to_vec(), vec![1, 0]);
        assert_eq!(waveform.samples().row(1).to_vec(), vec![0, 1]);
    }

    #[test]
    fn missing_timing_leaves_waveform_untimed() {
        let timing = timing_from(&WaveformMetadata::default());
        assert!(timing.is_empty());
        assert_eq!(timing.sample_interval_mode(), SampleIntervalMode::None);
    }
}
