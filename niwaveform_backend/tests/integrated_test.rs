use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::time::Duration;

use niwaveform_backend::*;

// Fills `waveform` the way a waveform read does: size the writable region, write, then publish.
fn fill(waveform: &mut AnalogWaveform<f64>, values: &[f64], policy: ReallocationPolicy) -> Result<(), WaveformError> {
    waveform.ensure_writable(values.len(), policy)?;
    waveform.writable_slice_mut(values.len())?.copy_from_slice(values);
    waveform.set_sample_count(values.len())
}

#[test]
fn analog_waveform_reuse_cycle() {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut waveform = AnalogWaveform::<f64>::with_capacity(4);

    fill(&mut waveform, &[0.5, 1.5, 2.5], ReallocationPolicy::DoNotReallocate).unwrap();
    waveform.set_timing(Timing::create_with_regular_interval(Duration::from_millis(2), t0));
    waveform.extended_properties_mut().set_channel_name("Dev1/ai0");
    waveform.extended_properties_mut().set_unit_description("Volts");
    assert_eq!(waveform.samples(), &[0.5, 1.5, 2.5]);
    assert_eq!(waveform.capacity(), 4);
    assert_eq!(waveform.timing().timestamp_of(2), Some(t0 + ChronoDuration::milliseconds(4)));
    assert_eq!(waveform.channel_name(), "Dev1/ai0");
    assert_eq!(waveform.units(), "Volts");

    // A larger read into the same waveform fails untouched, then succeeds after reallocation.
    let err = fill(&mut waveform, &[9.0; 6], ReallocationPolicy::DoNotReallocate).unwrap_err();
    assert_eq!(err, WaveformError::InsufficientCapacity { required: 6, available: 4 });
    assert_eq!(waveform.samples(), &[0.5, 1.5, 2.5]);

    fill(&mut waveform, &[9.0; 6], ReallocationPolicy::Reallocate).unwrap();
    assert_eq!(waveform.capacity(), 6);
    assert_eq!(waveform.sample_count(), 6);
}

#[test]
fn start_index_offsets_the_writable_region() {
    let mut waveform = AnalogWaveform::from_vec_with_range(vec![0i16; 8], 3, 2).unwrap();
    assert_eq!(waveform.writable_len(), 5);
    waveform.writable_slice_mut(5).unwrap().copy_from_slice(&[1, 2, 3, 4, 5]);
    waveform.set_sample_count(5).unwrap();
    assert_eq!(waveform.samples(), &[1, 2, 3, 4, 5]);
    assert!(waveform.set_sample_count(6).is_err());
    assert!(AnalogWaveform::from_vec_with_range(vec![0i16; 4], 3, 2).is_err());
}

#[test]
fn digital_waveform_from_driver_blocks() {
    // Two samples of a 4-line channel, one byte per line, with one padding byte per sample.
    let block = [1, 0, 0, 1, 9, 0, 1, 1, 0, 9];

    let mut lsb = DigitalWaveform::with_capacity(2, 4);
    {
        let mut rows = lsb.writable_rows_mut(2).unwrap();
        fill_digital_rows(&block, 5, LineOrder::LsbFirst, &mut rows);
    }
    lsb.set_sample_count(2).unwrap();
    assert_eq!(lsb.signal(0).unwrap().to_vec(), vec![1, 0]);
    assert_eq!(lsb.signal(3).unwrap().to_vec(), vec![1, 0]);
    assert_eq!(lines_to_port(lsb.samples().row(1).as_slice().unwrap()), 0b0110);

    let mut msb = DigitalWaveform::with_capacity(2, 4);
    {
        let mut rows = msb.writable_rows_mut(2).unwrap();
        fill_digital_rows(&block, 5, LineOrder::MsbFirst, &mut rows);
    }
    msb.set_sample_count(2).unwrap();
    assert_eq!(msb.signal(3).unwrap().to_vec(), lsb.signal(0).unwrap().to_vec());
    assert_eq!(msb.signal(0).unwrap().to_vec(), lsb.signal(3).unwrap().to_vec());

    assert!(msb.check_signal_count(8).is_err());
    msb.set_signal_names(split_names("Dev1/port0/line0, Dev1/port0/line1,, Dev1/port0/line2, Dev1/port0/line3"));
    assert_eq!(msb.signal_names().len(), 4);
}

#[test]
fn driver_ticks_convert_to_timestamps() {
    let t0 = Utc.with_ymd_and_hms(2023, 11, 5, 8, 30, 15).unwrap() + ChronoDuration::microseconds(250);
    let ticks = timestamp_to_ticks(t0);
    assert_eq!(ticks % 10, 0);
    assert_eq!(timestamp_from_ticks(ticks), Some(t0));
    assert_eq!(timestamp_from_ticks(ticks + TICKS_PER_SECOND), Some(t0 + ChronoDuration::seconds(1)));
}
