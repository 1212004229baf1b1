//! Writers: typed sample transfer from caller-owned arrays into a task's output buffer.
//!
//! The number of samples per channel is taken from the array shape. Multi-channel arrays are
//! `(channels, samples)` unless the writer's data layout is [`FillMode::GroupByScanNumber`].
//!
//! Whether a write starts the task follows the out-stream's `auto_start` override when one is
//! set; otherwise one-sample writes start the task and many-sample writes do not.

use ndarray::{ArrayBase, Data, Dimension, Ix1, Ix2};
use niwaveform_backend::{AnalogWaveform, DigitalWaveform};

use crate::constants::*;
use crate::encoding::{cast_slice, contiguous, require_dtype, BinarySample, PortSample, Sample};
use crate::error::{DaqError, Result};
use crate::stream::OutStream;
use crate::task::Task;

fn checked<U, S, D>(data: &ArrayBase<S, D>) -> Result<&[U]>
where
    U: Sample,
    S: Data,
    S::Elem: Sample,
    D: Dimension,
{
    require_dtype::<S::Elem, U>()?;
    cast_slice(contiguous(data)?)
}

fn samples_per_chan(samples: usize) -> Result<i32> {
    i32::try_from(samples).map_err(|_| {
        DaqError::mismatched_sizes(format!("{} samples per channel exceed the driver's limit of {}.", samples, i32::MAX))
    })
}

fn to_lines(states: &[bool]) -> Vec<u8> {
    states.iter().map(|&state| u8::from(state)).collect()
}

macro_rules! writer {
    (@common) => {
        pub fn out_stream(&self) -> OutStream<'a> {
            self.out_stream
        }

        /// Whether the array's channel dimension is checked against the task before each write.
        pub fn verify_array_shape(&self) -> bool {
            self.verify_array_shape
        }

        pub fn set_verify_array_shape(&mut self, verify: bool) {
            self.verify_array_shape = verify;
        }

        fn task(&self) -> &'a Task {
            self.out_stream.task()
        }

        fn auto_start(&self, default: bool) -> bool {
            self.out_stream.auto_start().unwrap_or(default)
        }

        #[allow(dead_code)]
        fn verify_channels(&self, provided: usize) -> Result<()> {
            if !self.verify_array_shape {
                return Ok(());
            }
            let required = self.out_stream.num_chans()? as usize;
            if provided == required {
                return Ok(());
            }
            Err(DaqError::mismatched_sizes(format!(
                "Write cannot be performed because the array passed into this function is not shaped correctly. \
                 The number of channels in the array must match the number of channels in the task.\n\n\
                 Number of channels in array: {}\nNumber of channels in task: {}",
                provided, required
            ))
            .with_task_name(self.task().name()))
        }
    };
    ($(#[$meta:meta])* multi $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            out_stream: OutStream<'a>,
            verify_array_shape: bool,
            data_layout: FillMode,
        }

        impl<'a> $name<'a> {
            pub fn new(task_out_stream: OutStream<'a>) -> Self {
                Self {
                    out_stream: task_out_stream,
                    verify_array_shape: true,
                    data_layout: FillMode::GroupByChannel,
                }
            }

            pub fn with_data_layout(mut self, layout: FillMode) -> Self {
                self.data_layout = layout;
                self
            }

            pub fn data_layout(&self) -> FillMode {
                self.data_layout
            }

            pub fn set_data_layout(&mut self, layout: FillMode) {
                self.data_layout = layout;
            }

            /// `(channels, samples)` of a many-sample array under the data layout.
            fn split_shape(&self, shape: &[usize]) -> (usize, usize) {
                match self.data_layout {
                    FillMode::GroupByChannel => (shape[0], shape[1]),
                    FillMode::GroupByScanNumber => (shape[1], shape[0]),
                }
            }

            writer!(@common);
        }
    };
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            out_stream: OutStream<'a>,
            verify_array_shape: bool,
        }

        impl<'a> $name<'a> {
            pub fn new(task_out_stream: OutStream<'a>) -> Self {
                Self {
                    out_stream: task_out_stream,
                    verify_array_shape: true,
                }
            }

            writer!(@common);
        }
    };
}

writer! {
    /// Writes scaled samples to a single analog output channel.
    AnalogSingleChannelWriter
}

impl AnalogSingleChannelWriter<'_> {
    /// Writes every sample of `data` and returns the number of samples accepted.
    pub fn write_many_sample<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        let samples = checked::<f64, _, _>(data)?;
        self.write_slice(samples, self.auto_start(false))
    }

    pub fn write_one_sample(&self, data: f64) -> Result<()> {
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.write_analog_scalar_f64(handle, auto_start, timeout, data))
    }

    /// Writes the samples of `waveform`; its timing and properties are not transferred.
    pub fn write_waveform(&self, waveform: &AnalogWaveform<f64>) -> Result<usize> {
        self.write_slice(waveform.samples(), self.auto_start(false))
    }

    fn write_slice(&self, samples: &[f64], auto_start: bool) -> Result<usize> {
        let n = samples_per_chan(samples.len())?;
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_analog_f64(handle, n, auto_start, timeout, FillMode::GroupByChannel, samples)
        })
    }
}

writer! {
    /// Writes scaled samples to one or more analog output channels.
    multi AnalogMultiChannelWriter
}

impl AnalogMultiChannelWriter<'_> {
    pub fn write_many_sample<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, f64>()?;
        let (channels, samples) = self.split_shape(data.shape());
        self.verify_channels(channels)?;
        let buffer = checked::<f64, _, _>(data)?;
        let n = samples_per_chan(samples)?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        let layout = self.data_layout;
        self.task()
            .call(|interpreter, handle| interpreter.write_analog_f64(handle, n, auto_start, timeout, layout, buffer))
    }

    /// Writes one sample per channel from `data`, shaped `(channels,)`.
    pub fn write_one_sample<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, f64>()?;
        self.verify_channels(data.len())?;
        let buffer = checked::<f64, _, _>(data)?;
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_analog_f64(handle, 1, auto_start, timeout, FillMode::GroupByChannel, buffer)
        })?;
        Ok(())
    }

    /// Writes one waveform per channel. All waveforms must hold the same number of samples.
    pub fn write_waveforms(&self, waveforms: &[AnalogWaveform<f64>]) -> Result<usize> {
        self.verify_channels(waveforms.len())?;
        let samples = waveforms.first().map_or(0, AnalogWaveform::sample_count);
        if let Some((index, waveform)) = waveforms.iter().enumerate().find(|(_, w)| w.sample_count() != samples) {
            return Err(DaqError::mismatched_sizes(format!(
                "The waveform at index {} has {} samples, but the waveform at index 0 has {} samples.",
                index,
                waveform.sample_count(),
                samples
            ))
            .with_task_name(self.task().name()));
        }
        let data: Vec<f64> = waveforms.iter().flat_map(|w| w.samples().iter().copied()).collect();
        let n = samples_per_chan(samples)?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_analog_f64(handle, n, auto_start, timeout, FillMode::GroupByChannel, &data)
        })
    }
}

writer! {
    /// Writes unscaled DAC codes to one or more analog output channels.
    multi AnalogUnscaledWriter
}

impl AnalogUnscaledWriter<'_> {
    fn write_binary<U, S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        U: BinarySample,
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        let (channels, samples) = self.split_shape(data.shape());
        self.verify_channels(channels)?;
        let buffer = checked::<U, _, _>(data)?;
        let n = samples_per_chan(samples)?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        let layout = self.data_layout;
        self.task().call(|interpreter, handle| {
            interpreter.write_binary(handle, n, auto_start, timeout, layout, <U as BinarySample>::buffer(buffer))
        })
    }

    pub fn write_int16<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_binary::<i16, S>(data)
    }

    pub fn write_uint16<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_binary::<u16, S>(data)
    }

    pub fn write_int32<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_binary::<i32, S>(data)
    }

    pub fn write_uint32<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_binary::<u32, S>(data)
    }
}

writer! {
    /// Writes line states or port values to a single digital output channel.
    DigitalSingleChannelWriter
}

impl DigitalSingleChannelWriter<'_> {
    fn write_lines(&self, lines: &[u8], samples: usize, auto_start: bool) -> Result<usize> {
        let n = samples_per_chan(samples)?;
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_lines(handle, n, auto_start, timeout, FillMode::GroupByChannel, lines)
        })
    }

    fn write_port<U, S>(&self, data: &ArrayBase<S, Ix1>) -> Result<usize>
    where
        U: PortSample,
        S: Data,
        S::Elem: Sample,
    {
        let buffer = checked::<U, _, _>(data)?;
        let n = samples_per_chan(buffer.len())?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_port(handle, n, auto_start, timeout, FillMode::GroupByChannel, <U as PortSample>::buffer(buffer))
        })
    }

    fn write_one_port<U: PortSample>(&self, value: U) -> Result<()> {
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_port(handle, 1, auto_start, timeout, FillMode::GroupByChannel, <U as PortSample>::buffer(&[value]))
        })?;
        Ok(())
    }

    /// Drives a single-line channel.
    pub fn write_one_sample_one_line(&self, data: bool) -> Result<()> {
        self.write_lines(&[u8::from(data)], 1, self.auto_start(true))?;
        Ok(())
    }

    /// Drives every line of the channel from `data`, shaped `(lines,)`.
    pub fn write_one_sample_multi_line<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        let states = checked::<bool, _, _>(data)?;
        self.write_lines(&to_lines(states), 1, self.auto_start(true))?;
        Ok(())
    }

    pub fn write_one_sample_port_byte(&self, data: u8) -> Result<()> {
        self.write_one_port(data)
    }

    pub fn write_one_sample_port_uint16(&self, data: u16) -> Result<()> {
        self.write_one_port(data)
    }

    pub fn write_one_sample_port_uint32(&self, data: u32) -> Result<()> {
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.write_digital_scalar_u32(handle, auto_start, timeout, data))
    }

    pub fn write_many_sample_port_byte<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_port::<u8, S>(data)
    }

    pub fn write_many_sample_port_uint16<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_port::<u16, S>(data)
    }

    pub fn write_many_sample_port_uint32<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_port::<u32, S>(data)
    }

    /// Writes the line states of `waveform`, one signal column per line.
    pub fn write_waveform(&self, waveform: &DigitalWaveform) -> Result<usize> {
        let rows = waveform.samples();
        let lines: Vec<u8> = rows.iter().copied().collect();
        self.write_lines(&lines, rows.nrows(), self.auto_start(false))
    }
}

writer! {
    /// Writes line states or port values to one or more digital output channels.
    multi DigitalMultiChannelWriter
}

impl DigitalMultiChannelWriter<'_> {
    fn write_port<U, S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        U: PortSample,
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        let (channels, samples) = self.split_shape(data.shape());
        self.verify_channels(channels)?;
        let buffer = checked::<U, _, _>(data)?;
        let n = samples_per_chan(samples)?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        let layout = self.data_layout;
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_port(handle, n, auto_start, timeout, layout, <U as PortSample>::buffer(buffer))
        })
    }

    fn write_one_port<U, S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        U: PortSample,
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        self.verify_channels(data.len())?;
        let buffer = checked::<U, _, _>(data)?;
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_port(handle, 1, auto_start, timeout, FillMode::GroupByChannel, <U as PortSample>::buffer(buffer))
        })?;
        Ok(())
    }

    /// Drives every single-line channel from `data`, shaped `(channels,)`.
    pub fn write_one_sample_one_line<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        self.verify_channels(data.len())?;
        let states = checked::<bool, _, _>(data)?;
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        let lines = to_lines(states);
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_lines(handle, 1, auto_start, timeout, FillMode::GroupByChannel, &lines)
        })?;
        Ok(())
    }

    /// Drives every line of every channel from `data`, shaped `(channels, lines)`.
    pub fn write_one_sample_multi_line<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        self.verify_channels(data.nrows())?;
        let states = checked::<bool, _, _>(data)?;
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        let lines = to_lines(states);
        self.task().call(|interpreter, handle| {
            interpreter.write_digital_lines(handle, 1, auto_start, timeout, FillMode::GroupByChannel, &lines)
        })?;
        Ok(())
    }

    pub fn write_one_sample_port_byte<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_one_port::<u8, S>(data)
    }

    pub fn write_one_sample_port_uint16<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_one_port::<u16, S>(data)
    }

    pub fn write_one_sample_port_uint32<S>(&self, data: &ArrayBase<S, Ix1>) -> Result<()>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_one_port::<u32, S>(data)
    }

    pub fn write_many_sample_port_byte<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_port::<u8, S>(data)
    }

    pub fn write_many_sample_port_uint16<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_port::<u16, S>(data)
    }

    pub fn write_many_sample_port_uint32<S>(&self, data: &ArrayBase<S, Ix2>) -> Result<usize>
    where
        S: Data,
        S::Elem: Sample,
    {
        self.write_port::<u32, S>(data)
    }
}

writer! {
    /// Writes pulse specifications to a single counter output channel.
    CounterWriter
}

impl CounterWriter<'_> {
    fn pair_len(&self, first: usize, second: usize) -> Result<i32> {
        if first != second {
            return Err(DaqError::mismatched_sizes(format!(
                "The two arrays passed to this function hold {} and {} samples; they must be the same length.",
                first, second
            ))
            .with_task_name(self.task().name()));
        }
        samples_per_chan(first)
    }

    pub fn write_one_sample_pulse_frequency(&self, frequency: f64, duty_cycle: f64) -> Result<()> {
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_ctr_freq_scalar(handle, auto_start, timeout, frequency, duty_cycle)
        })
    }

    pub fn write_one_sample_pulse_time(&self, high_time: f64, low_time: f64) -> Result<()> {
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_ctr_time_scalar(handle, auto_start, timeout, high_time, low_time)
        })
    }

    pub fn write_one_sample_pulse_ticks(&self, high_ticks: u32, low_ticks: u32) -> Result<()> {
        let auto_start = self.auto_start(true);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_ctr_ticks_scalar(handle, auto_start, timeout, high_ticks, low_ticks)
        })
    }

    pub fn write_many_sample_pulse_frequency<S1, S2>(&self, frequencies: &ArrayBase<S1, Ix1>, duty_cycles: &ArrayBase<S2, Ix1>) -> Result<usize>
    where
        S1: Data,
        S1::Elem: Sample,
        S2: Data,
        S2::Elem: Sample,
    {
        let frequencies = checked::<f64, _, _>(frequencies)?;
        let duty_cycles = checked::<f64, _, _>(duty_cycles)?;
        let n = self.pair_len(frequencies.len(), duty_cycles.len())?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_ctr_freq(handle, n, auto_start, timeout, FillMode::GroupByChannel, frequencies, duty_cycles)
        })
    }

    pub fn write_many_sample_pulse_time<S1, S2>(&self, high_times: &ArrayBase<S1, Ix1>, low_times: &ArrayBase<S2, Ix1>) -> Result<usize>
    where
        S1: Data,
        S1::Elem: Sample,
        S2: Data,
        S2::Elem: Sample,
    {
        let high_times = checked::<f64, _, _>(high_times)?;
        let low_times = checked::<f64, _, _>(low_times)?;
        let n = self.pair_len(high_times.len(), low_times.len())?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_ctr_time(handle, n, auto_start, timeout, FillMode::GroupByChannel, high_times, low_times)
        })
    }

    pub fn write_many_sample_pulse_ticks<S1, S2>(&self, high_ticks: &ArrayBase<S1, Ix1>, low_ticks: &ArrayBase<S2, Ix1>) -> Result<usize>
    where
        S1: Data,
        S1::Elem: Sample,
        S2: Data,
        S2::Elem: Sample,
    {
        let high_ticks = checked::<u32, _, _>(high_ticks)?;
        let low_ticks = checked::<u32, _, _>(low_ticks)?;
        let n = self.pair_len(high_ticks.len(), low_ticks.len())?;
        let auto_start = self.auto_start(false);
        let timeout = self.out_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.write_ctr_ticks(handle, n, auto_start, timeout, FillMode::GroupByChannel, high_ticks, low_ticks)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedInterpreter;
    use ndarray::{arr1, arr2, Array1};
    use std::sync::Arc;

    fn ao_task(sim: &Arc<SimulatedInterpreter>, name: &str, channels: &str) -> Task {
        let task = Task::with_interpreter(sim.clone(), name).unwrap();
        task.ao_channels()
            .add_ao_voltage_chan(channels, "", -10.0, 10.0, VoltageUnits::Volts)
            .unwrap();
        task
    }

    #[test]
    fn many_sample_write_does_not_start_by_default() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = ao_task(&sim, "ao_many", "Dev1/ao0");
        task.timing()
            .cfg_samp_clk_timing(1000.0, "", Edge::Rising, AcquisitionType::Finite, 4)
            .unwrap();
        let writer = AnalogSingleChannelWriter::new(task.out_stream());
        assert_eq!(writer.write_many_sample(&arr1(&[0.0, 1.0, 2.0, 3.0])).unwrap(), 4);
        assert_eq!(
            sim.written_samples(task.handle().unwrap(), "Dev1/ao0").unwrap(),
            vec![0.0, 1.0, 2.0, 3.0]
        );
        // Still idle, so an explicit start succeeds.
        task.start().unwrap();
    }

    #[test]
    fn one_sample_write_starts_unless_overridden() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = ao_task(&sim, "ao_one", "Dev1/ao0");
        let writer = AnalogSingleChannelWriter::new(task.out_stream());
        task.out_stream().set_auto_start(Some(false));
        writer.write_one_sample(1.5).unwrap();
        task.start().unwrap();
        task.stop().unwrap();

        task.out_stream().set_auto_start(None);
        writer.write_one_sample(2.5).unwrap();
        assert!(task.start().is_err());
        assert_eq!(sim.written_samples(task.handle().unwrap(), "Dev1/ao0").unwrap(), vec![1.5, 2.5]);
    }

    #[test]
    fn channel_count_is_verified() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = ao_task(&sim, "ao_channels", "Dev1/ao0:1");
        let writer = AnalogMultiChannelWriter::new(task.out_stream());
        let err = writer.write_many_sample(&arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])).unwrap_err();
        assert!(matches!(err, DaqError::MismatchedInputArraySizes { .. }));

        writer.write_many_sample(&arr2(&[[1.0, 2.0], [3.0, 4.0]])).unwrap();
        let handle = task.handle().unwrap();
        assert_eq!(sim.written_samples(handle, "Dev1/ao1").unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn scan_major_layout_interleaves_channels() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = ao_task(&sim, "ao_scans", "Dev1/ao0:1");
        let writer = AnalogMultiChannelWriter::new(task.out_stream()).with_data_layout(FillMode::GroupByScanNumber);
        writer.write_many_sample(&arr2(&[[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]])).unwrap();
        let handle = task.handle().unwrap();
        assert_eq!(sim.written_samples(handle, "Dev1/ao0").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(sim.written_samples(handle, "Dev1/ao1").unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn unscaled_write_requires_matching_dtype() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = ao_task(&sim, "ao_codes", "Dev1/ao0");
        let writer = AnalogUnscaledWriter::new(task.out_stream());
        let err = writer.write_uint16(&arr2(&[[1i16, 2]])).unwrap_err();
        assert!(err.to_string().contains("uint16"));
    }

    #[test]
    fn counter_pairs_must_match_in_length() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = Task::with_interpreter(sim.clone(), "co_pairs").unwrap();
        task.co_channels()
            .add_co_pulse_chan_freq("Dev1/ctr0", "", FrequencyUnits::Hz, Level::Low, 0.0, 1000.0, 0.5)
            .unwrap();
        let writer = CounterWriter::new(task.out_stream());
        let err = writer
            .write_many_sample_pulse_frequency(&Array1::<f64>::zeros(3), &Array1::<f64>::zeros(2))
            .unwrap_err();
        assert!(matches!(err, DaqError::MismatchedInputArraySizes { .. }));

        writer.write_one_sample_pulse_frequency(2000.0, 0.25).unwrap();
        assert_eq!(
            sim.written_pairs(task.handle().unwrap(), "Dev1/ctr0").unwrap(),
            vec![[2000.0, 0.25]]
        );
    }

    #[test]
    fn digital_line_states_are_packed() {
        let sim = Arc::new(SimulatedInterpreter::new());
        let task = Task::with_interpreter(sim.clone(), "do_lines").unwrap();
        task.do_channels()
            .add_do_chan("Dev1/port0/line0:3", "lines", LineGrouping::ChanForAllLines)
            .unwrap();
        let writer = DigitalSingleChannelWriter::new(task.out_stream());
        writer
            .write_one_sample_multi_line(&arr1(&[true, false, true, true]))
            .unwrap();
        assert_eq!(sim.written_samples(task.handle().unwrap(), "lines").unwrap(), vec![13.0]);
    }
}
