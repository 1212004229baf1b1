use std::sync::Arc;

use chrono::Utc;
use ndarray::{Array1, Array2};
use serial_test::serial;

use nidaqmx_backend::prelude::*;
use nidaqmx_backend::SimulatedInterpreter;

fn sim_task(name: &str) -> Task {
    Task::with_interpreter(Arc::new(SimulatedInterpreter::new()), name).unwrap()
}

#[test]
fn single_channel_analog_read() {
    let task = sim_task("single_channel_analog_read");
    task.ai_channels()
        .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, 0.0, 0.001, VoltageUnits::Volts)
        .unwrap();

    let reader = AnalogSingleChannelReader::new(task.in_stream());
    let mut data = Array1::<f64>::zeros(10);
    let read = reader.read_many_sample(&mut data, 10).unwrap();

    assert_eq!(read, 10);
    for value in data.iter() {
        assert!((value - 1.0).abs() <= 1e-3, "{value}");
    }
}

#[test]
#[serial]
fn multi_channel_analog_waveform_read() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = sim_task("multi_channel_analog_waveform_read");
    task.ai_channels()
        .add_ai_voltage_chan("Dev1/ai0:2", "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)
        .unwrap();
    task.timing()
        .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 10)
        .unwrap();

    let reader = AnalogMultiChannelReader::new(task.in_stream());
    let mut waveforms: Vec<AnalogWaveform<f64>> = (0..3).map(|_| AnalogWaveform::default()).collect();
    let read = reader
        .read_waveforms(&mut waveforms, 10, ReallocationPolicy::Reallocate)
        .unwrap();

    assert_eq!(read, 10);
    assert_eq!(waveforms.len(), 3);
    let names = task.channel_names().unwrap();
    let now = Utc::now();
    for (waveform, name) in waveforms.iter().zip(&names) {
        assert_eq!(waveform.sample_count(), 10);
        let interval = waveform.timing().sample_interval().unwrap();
        assert!((interval.as_secs_f64() - 1e-3).abs() < 1e-12);
        let t0 = waveform.timing().t0().unwrap();
        assert!((now - t0).num_milliseconds().abs() < 1000);
        assert_eq!(waveform.channel_name(), name);
        assert_eq!(waveform.units(), "Volts");
    }
}

#[test]
fn digital_port_uint32_read() {
    let task = sim_task("digital_port_uint32_read");
    task.di_channels()
        .add_di_chan("Dev1/port0", "", LineGrouping::ChanForAllLines)
        .unwrap();
    task.timing()
        .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 256)
        .unwrap();

    let reader = DigitalSingleChannelReader::new(task.in_stream());
    let mut data = Array1::<u32>::zeros(256);
    let read = reader.read_many_sample_port_uint32(&mut data, 256).unwrap();

    assert_eq!(read, 256);
    assert_eq!(data, Array1::from_iter(0..256u32));
}

#[test]
fn multi_line_single_channel_read() {
    let task = sim_task("multi_line_single_channel_read");
    task.di_channels()
        .add_di_chan("Dev1/port0/line0:7", "", LineGrouping::ChanForAllLines)
        .unwrap();
    task.timing()
        .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 256)
        .unwrap();

    let reader = DigitalSingleChannelReader::new(task.in_stream());
    let mut data = Array2::<bool>::default((256, 8));
    let read = reader.read_many_sample_multi_line(&mut data, 256).unwrap();

    assert_eq!(read, 256);
    for (i, row) in data.rows().into_iter().enumerate() {
        let expected: Vec<bool> = (0..8).map(|bit| (i >> bit) & 1 == 1).collect();
        assert_eq!(row.to_vec(), expected, "sample {i}");
    }
}

#[test]
#[serial]
fn undersized_waveform_without_reallocation() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = sim_task("undersized_waveform_without_reallocation");
    task.ai_channels()
        .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)
        .unwrap();

    let reader = AnalogSingleChannelReader::new(task.in_stream());
    let mut waveform = AnalogWaveform::from_vec(vec![-5.0; 9]);
    let err = reader
        .read_waveform(&mut waveform, 10, ReallocationPolicy::DoNotReallocate)
        .unwrap_err();

    assert!(matches!(err, DaqError::ReadBufferTooSmall { .. }), "{err:?}");
    assert!(err.to_string().contains("1 samples short"), "{err}");
    assert_eq!(waveform.capacity(), 9);
    assert_eq!(waveform.sample_count(), 9);
    assert_eq!(waveform.samples(), &[-5.0; 9]);
    assert!(waveform.timing().t0().is_none());
}

#[test]
fn dtype_mismatch_names_required_type() {
    let task = sim_task("dtype_mismatch_names_required_type");
    task.ai_channels()
        .add_ai_voltage_chan("Dev1/ai0", "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)
        .unwrap();

    let reader = AnalogUnscaledReader::new(task.in_stream());
    let mut data = Array2::<f64>::zeros((1, 10));
    let err = reader.read_int16(&mut data, 10).unwrap_err();

    assert!(matches!(err, DaqError::TypeError { .. }), "{err:?}");
    assert!(err.to_string().contains("int16"), "{err}");
}

#[test]
fn counter_pulse_frequency() {
    let task = sim_task("counter_pulse_frequency");
    task.ci_channels()
        .add_ci_pulse_freq_chan("Dev1/ctr0", "", 1000.0, 1_000_000.0, FrequencyUnits::Hz)
        .unwrap();
    task.timing().cfg_implicit_timing(AcquisitionType::Finite, 10).unwrap();

    let reader = CounterReader::new(task.in_stream());
    let mut frequencies = Array1::<f64>::zeros(10);
    let mut duty_cycles = Array1::<f64>::zeros(10);
    let read = reader
        .read_many_sample_pulse_frequency(&mut frequencies, &mut duty_cycles, 10)
        .unwrap();

    assert_eq!(read, 10);
    for (freq, duty) in frequencies.iter().zip(duty_cycles.iter()) {
        assert!((freq - 100_000.0).abs() <= 1e-6, "{freq}");
        assert!((duty - 0.5).abs() <= 1e-6, "{duty}");
    }
}
