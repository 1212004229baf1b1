use std::sync::Arc;

use ndarray::{Array1, Array2};
use serial_test::serial;

use nidaqmx_backend::prelude::*;
use nidaqmx_backend::{ErrorCode, Interpreter, SimulatedInterpreter};

fn ai_task(interpreter: Arc<dyn Interpreter>, name: &str, channels: &str) -> Task {
    let task = Task::with_interpreter(interpreter, name).unwrap();
    task.ai_channels()
        .add_ai_voltage_chan(channels, "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)
        .unwrap();
    task
}

fn simulated() -> Arc<dyn Interpreter> {
    Arc::new(SimulatedInterpreter::new())
}

#[test]
fn reads_never_return_more_than_requested() {
    let task = ai_task(simulated(), "bounded_reads", "Dev1/ai0:1");
    task.timing()
        .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 25)
        .unwrap();
    let reader = AnalogMultiChannelReader::new(task.in_stream());

    let mut data = Array2::<f64>::zeros((2, 10));
    let read = reader.read_many_sample(&mut data, 10).unwrap();
    assert!(read <= 10 && read <= data.shape()[1]);

    // The remaining 15 samples: READ_ALL_AVAILABLE resolves to what is left.
    let mut rest = Array2::<f64>::zeros((2, 15));
    let read = reader.read_many_sample(&mut rest, READ_ALL_AVAILABLE).unwrap();
    assert_eq!(read, 15);
}

#[test]
fn writes_without_regeneration_transfer_everything() {
    let sim = Arc::new(SimulatedInterpreter::new());
    let task = Task::with_interpreter(sim.clone(), "no_regeneration").unwrap();
    task.ao_channels()
        .add_ao_voltage_chan("Dev1/ao0:1", "", -10.0, 10.0, VoltageUnits::Volts)
        .unwrap();
    task.timing()
        .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 50)
        .unwrap();
    task.out_stream()
        .set_regen_mode(RegenerationMode::DontAllowRegeneration)
        .unwrap();
    task.out_stream().set_timeout(WAIT_INFINITELY);

    let writer = AnalogMultiChannelWriter::new(task.out_stream());
    let data = Array2::from_shape_fn((2, 50), |(c, i)| c as f64 + i as f64 / 100.0);
    let written = writer.write_many_sample(&data).unwrap();
    assert_eq!(written, data.shape()[1]);

    let handle = task.handle().unwrap();
    let second = sim.written_samples(handle, "Dev1/ao1").unwrap();
    assert_eq!(second.len(), 50);
    assert!((second[49] - 1.49).abs() < 1e-12);
}

#[test]
#[serial]
fn waveform_timing_matches_configured_rate() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = ai_task(simulated(), "waveform_timing", "Dev1/ai0");
    task.timing()
        .cfg_samp_clk_timing(250.0, "", Edge::Rising, AcquisitionType::Continuous, 1000)
        .unwrap();
    task.in_stream().set_waveform_attribute_mode(WaveformAttributeMode::TIMING);

    let reader = AnalogSingleChannelReader::new(task.in_stream());
    let mut waveform = AnalogWaveform::<f64>::default();
    reader
        .read_waveform(&mut waveform, 20, ReallocationPolicy::Reallocate)
        .unwrap();

    let interval = waveform.timing().sample_interval().unwrap();
    assert!((interval.as_secs_f64() - 1.0 / 250.0).abs() < 1e-12);
    let age = chrono::Utc::now() - waveform.timing().t0().unwrap();
    assert!(age.num_seconds().abs() < 1);
    // Extended properties were not requested.
    assert!(waveform.extended_properties().is_empty());
}

#[test]
fn analog_samples_stay_at_channel_offset() {
    let task = ai_task(simulated(), "offsets", "Dev1/ai2");
    let reader = AnalogSingleChannelReader::new(task.in_stream());
    let mut data = Array1::<f64>::zeros(50);
    reader.read_many_sample(&mut data, 50).unwrap();
    assert!(data.iter().all(|v| (v - 3.0).abs() <= 1e-3));
    assert!((reader.read_one_sample().unwrap() - 3.0).abs() <= 1e-3);
}

#[test]
fn dtype_mismatch_is_reported_for_every_encoding() {
    let sim = simulated();

    let ai = ai_task(sim.clone(), "dtype_ai", "Dev1/ai0");
    let err = AnalogSingleChannelReader::new(ai.in_stream())
        .read_many_sample(&mut Array1::<i32>::zeros(4), 4)
        .unwrap_err();
    assert!(err.to_string().contains("float64"), "{err}");
    for (result, dtype) in [
        (AnalogUnscaledReader::new(ai.in_stream()).read_uint16(&mut Array2::<i16>::zeros((1, 4)), 4), "uint16"),
        (AnalogUnscaledReader::new(ai.in_stream()).read_int32(&mut Array2::<u32>::zeros((1, 4)), 4), "int32"),
        (AnalogUnscaledReader::new(ai.in_stream()).read_uint32(&mut Array2::<i32>::zeros((1, 4)), 4), "uint32"),
    ] {
        let err = result.unwrap_err();
        assert!(matches!(err, DaqError::TypeError { .. }));
        assert!(err.to_string().contains(dtype), "{err}");
    }

    let di = Task::with_interpreter(sim.clone(), "dtype_di").unwrap();
    di.di_channels()
        .add_di_chan("Dev1/port1", "", LineGrouping::ChanForAllLines)
        .unwrap();
    let reader = DigitalSingleChannelReader::new(di.in_stream());
    let err = reader
        .read_many_sample_port_byte(&mut Array1::<u16>::zeros(4), 4)
        .unwrap_err();
    assert!(err.to_string().contains("uint8"), "{err}");
    let err = reader
        .read_many_sample_multi_line(&mut Array2::<u8>::zeros((4, 8)), 4)
        .unwrap_err();
    assert!(err.to_string().contains("bool"), "{err}");

    let ci = Task::with_interpreter(sim.clone(), "dtype_ci").unwrap();
    ci.ci_channels()
        .add_ci_pulse_freq_chan("Dev1/ctr1", "", 1000.0, 1_000_000.0, FrequencyUnits::Hz)
        .unwrap();
    let err = CounterReader::new(ci.in_stream())
        .read_many_sample_uint32(&mut Array1::<f64>::zeros(4), 4)
        .unwrap_err();
    assert!(err.to_string().contains("uint32"), "{err}");

    let co = Task::with_interpreter(sim, "dtype_co").unwrap();
    co.co_channels()
        .add_co_pulse_chan_freq("Dev1/ctr2", "", FrequencyUnits::Hz, Level::Low, 0.0, 1000.0, 0.5)
        .unwrap();
    let err = CounterWriter::new(co.out_stream())
        .write_many_sample_pulse_ticks(&Array1::<f64>::zeros(4), &Array1::<f64>::zeros(4))
        .unwrap_err();
    assert!(err.to_string().contains("uint32"), "{err}");
}

#[test]
fn undersized_array_is_left_untouched() {
    let task = ai_task(simulated(), "undersized_array", "Dev1/ai0:1");
    let reader = AnalogMultiChannelReader::new(task.in_stream());
    let mut data = Array2::<f64>::from_elem((2, 5), -1.0);
    let err = reader.read_many_sample(&mut data, 10).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ReadBufferTooSmall);
    assert!(data.iter().all(|&v| v == -1.0));
}

#[test]
#[serial]
fn undersized_waveforms_are_reallocated_by_default() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = ai_task(simulated(), "reallocate", "Dev1/ai0:1");
    let reader = AnalogMultiChannelReader::new(task.in_stream());
    let mut waveforms = vec![AnalogWaveform::<f64>::with_capacity(5), AnalogWaveform::<f64>::with_capacity(50)];
    reader
        .read_waveforms(&mut waveforms, 12, ReallocationPolicy::default())
        .unwrap();
    for waveform in &waveforms {
        assert_eq!(waveform.sample_count(), 12);
        assert!(waveform.capacity() >= 12);
    }
    assert_eq!(waveforms[1].capacity(), 50);
    assert_eq!(waveforms[0].samples(), &[1.0; 12]);
    assert_eq!(waveforms[1].samples(), &[2.0; 12]);
}

#[test]
#[serial]
fn reused_waveform_takes_each_tasks_timing() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let sim = simulated();
    let fast = ai_task(sim.clone(), "fast", "Dev1/ai0");
    fast.timing()
        .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 10)
        .unwrap();
    let slow = ai_task(sim, "slow", "Dev1/ai1");
    slow.timing()
        .cfg_samp_clk_timing(100.0, "", Edge::Rising, AcquisitionType::Finite, 10)
        .unwrap();

    let mut waveform = AnalogWaveform::<f64>::default();
    AnalogSingleChannelReader::new(fast.in_stream())
        .read_waveform(&mut waveform, 10, ReallocationPolicy::Reallocate)
        .unwrap();
    let first_t0 = waveform.timing().t0().unwrap();
    let first_interval = waveform.timing().sample_interval().unwrap();

    AnalogSingleChannelReader::new(slow.in_stream())
        .read_waveform(&mut waveform, 10, ReallocationPolicy::Reallocate)
        .unwrap();
    let second_t0 = waveform.timing().t0().unwrap();
    let second_interval = waveform.timing().sample_interval().unwrap();

    assert!(second_t0 > first_t0);
    assert!((first_interval.as_secs_f64() - 1e-3).abs() < 1e-12);
    assert!((second_interval.as_secs_f64() - 1e-2).abs() < 1e-12);
    assert_eq!(waveform.samples(), &[2.0; 10]);
}

#[test]
#[serial]
fn waveform_count_must_match_channel_count() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = ai_task(simulated(), "waveform_count", "Dev1/ai0:2");
    let reader = AnalogMultiChannelReader::new(task.in_stream());
    let mut waveforms = vec![AnalogWaveform::<f64>::new(10), AnalogWaveform::<f64>::new(10)];
    let err = reader
        .read_waveforms(&mut waveforms, 10, ReallocationPolicy::Reallocate)
        .unwrap_err();
    assert!(matches!(err, DaqError::MismatchedInputArraySizes { .. }), "{err:?}");
    assert_eq!(err.task_name(), Some("waveform_count"));
}

#[test]
#[serial]
fn digital_waveform_signal_count_must_match_lines() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = Task::with_interpreter(simulated(), "signal_count").unwrap();
    task.di_channels()
        .add_di_chan("Dev1/port0/line0:3", "lines", LineGrouping::ChanForAllLines)
        .unwrap();
    let reader = DigitalSingleChannelReader::new(task.in_stream());

    let mut wrong = DigitalWaveform::new(8, 3);
    let err = reader
        .read_waveform(&mut wrong, 8, ReallocationPolicy::Reallocate)
        .unwrap_err();
    assert!(matches!(err, DaqError::MismatchedInputArraySizes { .. }), "{err:?}");

    let mut waveform = DigitalWaveform::new(8, 4);
    reader
        .read_waveform(&mut waveform, 8, ReallocationPolicy::Reallocate)
        .unwrap();
    // Line channels keep line 0 in the first column.
    let expected: Vec<u8> = (0..8u8).map(|k| k & 1).collect();
    assert_eq!(waveform.signal(0).unwrap().to_vec(), expected);
    assert_eq!(waveform.signal_names().len(), 4);
}

#[test]
#[serial]
fn port_waveforms_place_line_zero_last() {
    set_feature(FeatureToggle::WaveformSupport, true);
    let task = Task::with_interpreter(simulated(), "port_waveform").unwrap();
    task.di_channels()
        .add_di_chan("Dev1/port0", "", LineGrouping::ChanForAllLines)
        .unwrap();
    let reader = DigitalSingleChannelReader::new(task.in_stream());
    let mut waveform = DigitalWaveform::new(4, 8);
    reader
        .read_waveform(&mut waveform, 4, ReallocationPolicy::Reallocate)
        .unwrap();
    assert_eq!(waveform.signal(7).unwrap().to_vec(), vec![0, 1, 0, 1]);
    assert_eq!(waveform.signal(6).unwrap().to_vec(), vec![0, 0, 1, 1]);
}

#[test]
#[serial]
fn waveform_reads_require_the_feature_toggle() {
    set_feature(FeatureToggle::WaveformSupport, false);
    let task = ai_task(simulated(), "toggle_off", "Dev1/ai0");
    let mut waveform = AnalogWaveform::<f64>::default();
    let err = AnalogSingleChannelReader::new(task.in_stream())
        .read_waveform(&mut waveform, 1, ReallocationPolicy::Reallocate)
        .unwrap_err();
    set_feature(FeatureToggle::WaveformSupport, true);
    match err {
        DaqError::FeatureNotSupported { env_var, .. } => assert_eq!(env_var, "NIDAQMX_ENABLE_WAVEFORM_SUPPORT"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn close_is_idempotent() {
    let mut task = ai_task(simulated(), "close_twice", "Dev1/ai0");
    task.close().unwrap();
    task.close().unwrap();
    assert!(task.is_closed());

    assert!(matches!(task.start(), Err(DaqError::InvalidHandle { .. })));
    let reader = AnalogSingleChannelReader::new(task.in_stream());
    let err = reader.read_one_sample().unwrap_err();
    assert!(matches!(err, DaqError::InvalidHandle { ref task_name } if task_name == "close_twice"));
}
