//! Readers: typed sample transfer from a task's input buffer into caller-owned arrays.
//!
//! Each reader is a thin adapter over an [`InStream`] and holds no driver state. A reader method
//! checks the caller's array in this order:
//!
//! 1. the element type must be the one the encoding requires (`TypeError` otherwise),
//! 2. the requested sample count is resolved ([`READ_ALL_AVAILABLE`] becomes a concrete count),
//! 3. with `verify_array_shape` on, the array shape must match exactly. An array that is too
//!    small in every dimension fails with `ReadBufferTooSmall`; any other mismatch fails with
//!    `MismatchedInputArraySizes`. In both cases the array is left untouched.
//!
//! Multi-channel arrays are `(channels, samples)` by default. Set the reader's data layout to
//! [`FillMode::GroupByScanNumber`] to read `(samples, channels)` arrays instead.
//!
//! Waveform reads (`read_waveform`, `read_waveforms`) require the waveform feature toggle
//! (see [`crate::config`]).
//!
//! ```no_run
//! use ndarray::Array2;
//! use nidaqmx_backend::prelude::*;
//!
//! # fn main() -> nidaqmx_backend::Result<()> {
//! let task = Task::new("ai")?;
//! task.ai_channels()
//!     .add_ai_voltage_chan("Dev1/ai0:3", "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)?;
//! let reader = AnalogMultiChannelReader::new(task.in_stream());
//! let mut data = Array2::<f64>::zeros((4, 100));
//! let read = reader.read_many_sample(&mut data, 100)?;
//! # let _ = read;
//! # Ok(())
//! # }
//! ```

use ndarray::{ArrayBase, DataMut, Dimension, Ix1, Ix2};
use niwaveform_backend::{AnalogWaveform, DigitalWaveform, ReallocationPolicy};

use crate::attributes::channel;
use crate::config::{requires_feature, FeatureToggle};
use crate::constants::*;
use crate::encoding::{cast_slice_mut, contiguous_mut, require_dtype, BinarySample, PortSample, Sample};
use crate::error::{DaqError, Result};
use crate::interpreter::{AttributeTarget, WaveformMetadata};
use crate::stream::InStream;
use crate::task::Task;
use crate::types::{CtrFreq, CtrTick, CtrTime, PowerMeasurement};
use crate::waveforms::{apply_analog, apply_digital, line_order, prepare_analog, prepare_digital, waveform_error};

/// Caller storage viewed as the element type `U` the encoding requires.
fn checked_mut<U, S, D>(data: &mut ArrayBase<S, D>) -> Result<&mut [U]>
where
    U: Sample,
    S: DataMut,
    S::Elem: Sample,
    D: Dimension,
{
    require_dtype::<S::Elem, U>()?;
    cast_slice_mut(contiguous_mut(data)?)
}

fn verify_shape(task: &Task, provided: &[usize], required: &[usize]) -> Result<()> {
    if provided == required {
        return Ok(());
    }
    let message = format!(
        "Read cannot be performed because the array passed into this function is not shaped correctly. \
         You must pass in an array of the correct shape based on the number of channels in task and the \
         number of samples per channel requested.\n\nShape of array provided: {:?}\nShape of array required: {:?}",
        provided, required
    );
    let undersized = provided.len() == required.len() && provided.iter().zip(required).all(|(p, r)| p <= r);
    let err = if undersized {
        DaqError::read_buffer_too_small(message)
    } else {
        DaqError::mismatched_sizes(message)
    };
    Err(err.with_task_name(task.name()))
}

fn sample_count(samples_per_chan: i32) -> usize {
    usize::try_from(samples_per_chan).unwrap_or(0)
}

fn layout_shape(layout: FillMode, channels: usize, samples: usize) -> [usize; 2] {
    match layout {
        FillMode::GroupByChannel => [channels, samples],
        FillMode::GroupByScanNumber => [samples, channels],
    }
}

/// Reads analog waveforms for every channel in `channels_to_read`.
fn read_analog_waveforms(
    stream: InStream<'_>,
    waveforms: &mut [AnalogWaveform<f64>],
    number_of_samples_per_channel: i32,
    reallocation_policy: ReallocationPolicy,
) -> Result<usize> {
    requires_feature(FeatureToggle::WaveformSupport)?;
    let task = stream.task();
    let channels = stream.num_chans()? as usize;
    if waveforms.len() != channels {
        return Err(DaqError::mismatched_sizes(format!(
            "The number of waveforms provided ({}) does not match the number of channels to read ({}).",
            waveforms.len(),
            channels
        ))
        .with_task_name(task.name()));
    }
    let n = task.calculate_num_samps_per_chan(number_of_samples_per_channel)?;
    let samples = sample_count(n);
    prepare_analog(waveforms, samples, reallocation_policy).map_err(|e| e.with_task_name(task.name()))?;

    let timeout = stream.timeout();
    let mode = stream.waveform_attribute_mode();
    let mut metadata = vec![WaveformMetadata::default(); channels];
    let read = {
        let mut buffers = waveforms
            .iter_mut()
            .enumerate()
            .map(|(index, waveform)| waveform.writable_slice_mut(samples).map_err(|e| waveform_error(index, e)))
            .collect::<Result<Vec<&mut [f64]>>>()?;
        task.call(|interpreter, handle| {
            interpreter.read_analog_waveforms(handle, n, timeout, mode, &mut buffers, &mut metadata)
        })?
    };
    for (waveform, metadata) in waveforms.iter_mut().zip(metadata) {
        apply_analog(waveform, read, metadata)?;
    }
    Ok(read)
}

/// Reads digital waveforms for every channel in `channels_to_read`, one signal column per line.
fn read_digital_waveforms(
    stream: InStream<'_>,
    waveforms: &mut [DigitalWaveform],
    number_of_samples_per_channel: i32,
    reallocation_policy: ReallocationPolicy,
) -> Result<usize> {
    requires_feature(FeatureToggle::WaveformSupport)?;
    let task = stream.task();
    let names = stream.channels_to_read()?;
    if waveforms.len() != names.len() {
        return Err(DaqError::mismatched_sizes(format!(
            "The number of waveforms provided ({}) does not match the number of channels to read ({}).",
            waveforms.len(),
            names.len()
        ))
        .with_task_name(task.name()));
    }
    let mut lines = Vec::with_capacity(names.len());
    let mut orders = Vec::with_capacity(names.len());
    for name in &names {
        lines.push(task.get_property(&channel::DI_NUM_LINES, |h| AttributeTarget::Channel(h, name))? as usize);
        let physical = task.get_property(&channel::PHYSICAL_CHAN_NAME, |h| AttributeTarget::Channel(h, name))?;
        orders.push(line_order(&physical));
    }

    let n = task.calculate_num_samps_per_chan(number_of_samples_per_channel)?;
    let samples = sample_count(n);
    prepare_digital(waveforms, &lines, samples, reallocation_policy).map_err(|e| e.with_task_name(task.name()))?;

    let timeout = stream.timeout();
    let mode = stream.waveform_attribute_mode();
    let bytes_per_chan: Vec<u32> = lines.iter().map(|&l| l as u32).collect();
    let mut data = vec![0u8; samples * lines.iter().sum::<usize>()];
    let mut metadata = vec![WaveformMetadata::default(); names.len()];
    let read = task.call(|interpreter, handle| {
        interpreter.read_digital_waveforms(handle, n, timeout, mode, &bytes_per_chan, &mut data, &mut metadata)
    })?;

    let mut offset = 0;
    for (((waveform, metadata), &lines), order) in waveforms.iter_mut().zip(metadata).zip(&lines).zip(orders) {
        let block = &data[offset..offset + samples * lines];
        apply_digital(waveform, block, lines, order, read, metadata)?;
        offset += samples * lines;
    }
    Ok(read)
}

macro_rules! reader {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            in_stream: InStream<'a>,
            verify_array_shape: bool,
        }

        impl<'a> $name<'a> {
            pub fn new(task_in_stream: InStream<'a>) -> Self {
                Self {
                    in_stream: task_in_stream,
                    verify_array_shape: true,
                }
            }

            reader!(@common);
        }
    };
    ($(#[$meta:meta])* multi $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            in_stream: InStream<'a>,
            verify_array_shape: bool,
            data_layout: FillMode,
        }

        impl<'a> $name<'a> {
            pub fn new(task_in_stream: InStream<'a>) -> Self {
                Self {
                    in_stream: task_in_stream,
                    verify_array_shape: true,
                    data_layout: FillMode::GroupByChannel,
                }
            }

            pub fn with_data_layout(mut self, layout: FillMode) -> Self {
                self.data_layout = layout;
                self
            }

            /// Layout of many-sample arrays: `(channels, samples)` for
            /// [`FillMode::GroupByChannel`], `(samples, channels)` for
            /// [`FillMode::GroupByScanNumber`].
            pub fn data_layout(&self) -> FillMode {
                self.data_layout
            }

            pub fn set_data_layout(&mut self, layout: FillMode) {
                self.data_layout = layout;
            }

            fn many_shape(&self, samples: usize) -> Result<[usize; 2]> {
                Ok(layout_shape(self.data_layout, self.channel_count()?, samples))
            }

            reader!(@common);
        }
    };
    (@common) => {
        pub fn in_stream(&self) -> InStream<'a> {
            self.in_stream
        }

        /// Whether array shapes are checked before each read.
        pub fn verify_array_shape(&self) -> bool {
            self.verify_array_shape
        }

        pub fn set_verify_array_shape(&mut self, verify: bool) {
            self.verify_array_shape = verify;
        }

        fn task(&self) -> &'a Task {
            self.in_stream.task()
        }

        fn samples(&self, requested: i32) -> Result<i32> {
            self.task().calculate_num_samps_per_chan(requested)
        }

        #[allow(dead_code)]
        fn channel_count(&self) -> Result<usize> {
            Ok(self.in_stream.num_chans()? as usize)
        }

        fn verify(&self, provided: &[usize], required: &[usize]) -> Result<()> {
            if self.verify_array_shape {
                verify_shape(self.task(), provided, required)
            } else {
                Ok(())
            }
        }
    };
}

reader! {
    /// Reads scaled samples from a single analog input channel.
    AnalogSingleChannelReader
}

impl AnalogSingleChannelReader<'_> {
    /// Reads `number_of_samples_per_channel` samples into `data`, shaped `(samples,)`.
    pub fn read_many_sample<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &[sample_count(n)])?;
        let buffer = checked_mut::<f64, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_analog_f64(handle, n, timeout, FillMode::GroupByChannel, buffer)
        })
    }

    pub fn read_one_sample(&self) -> Result<f64> {
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_analog_scalar_f64(handle, timeout))
    }

    /// Reads into `waveform` and fills its timing and extended properties as selected by the
    /// stream's waveform attribute mode.
    pub fn read_waveform(
        &self,
        waveform: &mut AnalogWaveform<f64>,
        number_of_samples_per_channel: i32,
        reallocation_policy: ReallocationPolicy,
    ) -> Result<usize> {
        read_analog_waveforms(
            self.in_stream,
            std::slice::from_mut(waveform),
            number_of_samples_per_channel,
            reallocation_policy,
        )
    }
}

reader! {
    /// Reads scaled samples from one or more analog input channels.
    multi AnalogMultiChannelReader
}

impl AnalogMultiChannelReader<'_> {
    pub fn read_many_sample<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &self.many_shape(sample_count(n))?)?;
        let buffer = checked_mut::<f64, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        let layout = self.data_layout;
        self.task()
            .call(|interpreter, handle| interpreter.read_analog_f64(handle, n, timeout, layout, buffer))
    }

    /// Reads one sample per channel into `data`, shaped `(channels,)`.
    pub fn read_one_sample<S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, f64>()?;
        self.verify(data.shape(), &[self.channel_count()?])?;
        let buffer = checked_mut::<f64, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_analog_f64(handle, 1, timeout, FillMode::GroupByChannel, buffer))?;
        Ok(())
    }

    /// Reads one waveform per channel. `waveforms` must have one entry per channel to read.
    pub fn read_waveforms(
        &self,
        waveforms: &mut [AnalogWaveform<f64>],
        number_of_samples_per_channel: i32,
        reallocation_policy: ReallocationPolicy,
    ) -> Result<usize> {
        read_analog_waveforms(self.in_stream, waveforms, number_of_samples_per_channel, reallocation_policy)
    }
}

reader! {
    /// Reads unscaled ADC codes from one or more analog input channels.
    multi AnalogUnscaledReader
}

impl AnalogUnscaledReader<'_> {
    fn read_binary<U, S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        U: BinarySample,
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &self.many_shape(sample_count(n))?)?;
        let buffer = checked_mut::<U, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        let layout = self.data_layout;
        self.task().call(|interpreter, handle| {
            interpreter.read_binary(handle, n, timeout, layout, <U as BinarySample>::buffer_mut(buffer))
        })
    }

    pub fn read_int16<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_binary::<i16, S>(data, number_of_samples_per_channel)
    }

    pub fn read_uint16<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_binary::<u16, S>(data, number_of_samples_per_channel)
    }

    pub fn read_int32<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_binary::<i32, S>(data, number_of_samples_per_channel)
    }

    pub fn read_uint32<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_binary::<u32, S>(data, number_of_samples_per_channel)
    }
}

reader! {
    /// Reads samples from a single counter input channel.
    CounterReader
}

impl CounterReader<'_> {
    /// Reads counts, frequencies, periods or edge separations as `f64`.
    pub fn read_many_sample_double<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &[sample_count(n)])?;
        let buffer = checked_mut::<f64, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_counter_f64(handle, n, timeout, buffer))
    }

    /// Reads edge counts as `u32`.
    pub fn read_many_sample_uint32<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, u32>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &[sample_count(n)])?;
        let buffer = checked_mut::<u32, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_counter_u32(handle, n, timeout, buffer))
    }

    pub fn read_many_sample_pulse_frequency<S1, S2>(
        &self,
        frequencies: &mut ArrayBase<S1, Ix1>,
        duty_cycles: &mut ArrayBase<S2, Ix1>,
        number_of_samples_per_channel: i32,
    ) -> Result<usize>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, f64>()?;
        require_dtype::<S2::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let required = [sample_count(n)];
        self.verify(frequencies.shape(), &required)?;
        self.verify(duty_cycles.shape(), &required)?;
        let frequencies = checked_mut::<f64, _, _>(frequencies)?;
        let duty_cycles = checked_mut::<f64, _, _>(duty_cycles)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_ctr_freq(handle, n, timeout, FillMode::GroupByChannel, frequencies, duty_cycles)
        })
    }

    pub fn read_many_sample_pulse_time<S1, S2>(
        &self,
        high_times: &mut ArrayBase<S1, Ix1>,
        low_times: &mut ArrayBase<S2, Ix1>,
        number_of_samples_per_channel: i32,
    ) -> Result<usize>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, f64>()?;
        require_dtype::<S2::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let required = [sample_count(n)];
        self.verify(high_times.shape(), &required)?;
        self.verify(low_times.shape(), &required)?;
        let high_times = checked_mut::<f64, _, _>(high_times)?;
        let low_times = checked_mut::<f64, _, _>(low_times)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_ctr_time(handle, n, timeout, FillMode::GroupByChannel, high_times, low_times)
        })
    }

    pub fn read_many_sample_pulse_ticks<S1, S2>(
        &self,
        high_ticks: &mut ArrayBase<S1, Ix1>,
        low_ticks: &mut ArrayBase<S2, Ix1>,
        number_of_samples_per_channel: i32,
    ) -> Result<usize>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, u32>()?;
        require_dtype::<S2::Elem, u32>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let required = [sample_count(n)];
        self.verify(high_ticks.shape(), &required)?;
        self.verify(low_ticks.shape(), &required)?;
        let high_ticks = checked_mut::<u32, _, _>(high_ticks)?;
        let low_ticks = checked_mut::<u32, _, _>(low_ticks)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_ctr_ticks(handle, n, timeout, FillMode::GroupByChannel, high_ticks, low_ticks)
        })
    }

    pub fn read_one_sample_double(&self) -> Result<f64> {
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_counter_scalar_f64(handle, timeout))
    }

    pub fn read_one_sample_uint32(&self) -> Result<u32> {
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_counter_scalar_u32(handle, timeout))
    }

    pub fn read_one_sample_pulse_frequency(&self) -> Result<CtrFreq> {
        let timeout = self.in_stream.timeout();
        let (freq, duty_cycle) = self
            .task()
            .call(|interpreter, handle| interpreter.read_ctr_freq_scalar(handle, timeout))?;
        Ok(CtrFreq { freq, duty_cycle })
    }

    pub fn read_one_sample_pulse_time(&self) -> Result<CtrTime> {
        let timeout = self.in_stream.timeout();
        let (high_time, low_time) = self
            .task()
            .call(|interpreter, handle| interpreter.read_ctr_time_scalar(handle, timeout))?;
        Ok(CtrTime { high_time, low_time })
    }

    pub fn read_one_sample_pulse_ticks(&self) -> Result<CtrTick> {
        let timeout = self.in_stream.timeout();
        let (high_tick, low_tick) = self
            .task()
            .call(|interpreter, handle| interpreter.read_ctr_ticks_scalar(handle, timeout))?;
        Ok(CtrTick { high_tick, low_tick })
    }
}

reader! {
    /// Reads line states or port values from a single digital input channel.
    DigitalSingleChannelReader
}

impl DigitalSingleChannelReader<'_> {
    fn bytes_per_sample(&self) -> Result<usize> {
        Ok(self.in_stream.di_num_booleans_per_chan()? as usize)
    }

    /// Reads `samples` samples of one byte per line, laid out `(samples, bytes per sample)`.
    fn read_lines(&self, samples: i32, bytes_per_sample: usize) -> Result<(usize, Vec<u8>)> {
        let mut raw = vec![0u8; sample_count(samples) * bytes_per_sample];
        let timeout = self.in_stream.timeout();
        let (read, _) = self.task().call(|interpreter, handle| {
            interpreter.read_digital_lines(handle, samples, timeout, FillMode::GroupByChannel, &mut raw)
        })?;
        Ok((read, raw))
    }

    fn read_port<U, S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        U: PortSample,
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &[sample_count(n)])?;
        let buffer = checked_mut::<U, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_digital_port(handle, n, timeout, FillMode::GroupByChannel, <U as PortSample>::buffer_mut(buffer))
        })
    }

    fn read_one_port<U: PortSample>(&self) -> Result<U> {
        let mut value = [U::default()];
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_digital_port(handle, 1, timeout, FillMode::GroupByChannel, <U as PortSample>::buffer_mut(&mut value))
        })?;
        Ok(value[0])
    }

    /// Reads the state of a single-line channel.
    pub fn read_one_sample_one_line(&self) -> Result<bool> {
        let bytes_per_sample = self.bytes_per_sample()?.max(1);
        let (_, raw) = self.read_lines(1, bytes_per_sample)?;
        Ok(raw[0] != 0)
    }

    /// Reads one sample of every line of the channel into `data`, shaped `(lines,)`.
    pub fn read_one_sample_multi_line<S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        let bytes_per_sample = self.bytes_per_sample()?;
        self.verify(data.shape(), &[bytes_per_sample])?;
        let (_, raw) = self.read_lines(1, bytes_per_sample)?;
        let out = checked_mut::<bool, _, _>(data)?;
        for (state, &byte) in out.iter_mut().zip(&raw) {
            *state = byte != 0;
        }
        Ok(())
    }

    /// Reads samples of a single-line channel into `data`, shaped `(samples,)`.
    pub fn read_many_sample_one_line<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &[sample_count(n)])?;
        let bytes_per_sample = self.bytes_per_sample()?.max(1);
        let (read, raw) = self.read_lines(n, bytes_per_sample)?;
        let out = checked_mut::<bool, _, _>(data)?;
        for (state, sample) in out.iter_mut().zip(raw.chunks(bytes_per_sample)).take(read) {
            *state = sample[0] != 0;
        }
        Ok(read)
    }

    /// Reads samples of every line into `data`, shaped `(samples, lines)`. Row `i` holds the
    /// line states of sample `i`, line 0 first.
    pub fn read_many_sample_multi_line<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let bytes_per_sample = self.bytes_per_sample()?;
        self.verify(data.shape(), &[sample_count(n), bytes_per_sample])?;
        let (read, raw) = self.read_lines(n, bytes_per_sample)?;
        let out = checked_mut::<bool, _, _>(data)?;
        for (state, &byte) in out.iter_mut().zip(&raw).take(read * bytes_per_sample) {
            *state = byte != 0;
        }
        Ok(read)
    }

    pub fn read_one_sample_port_byte(&self) -> Result<u8> {
        self.read_one_port::<u8>()
    }

    pub fn read_one_sample_port_uint16(&self) -> Result<u16> {
        self.read_one_port::<u16>()
    }

    pub fn read_one_sample_port_uint32(&self) -> Result<u32> {
        let timeout = self.in_stream.timeout();
        self.task()
            .call(|interpreter, handle| interpreter.read_digital_scalar_u32(handle, timeout))
    }

    pub fn read_many_sample_port_byte<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_port::<u8, S>(data, number_of_samples_per_channel)
    }

    pub fn read_many_sample_port_uint16<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_port::<u16, S>(data, number_of_samples_per_channel)
    }

    pub fn read_many_sample_port_uint32<S>(&self, data: &mut ArrayBase<S, Ix1>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_port::<u32, S>(data, number_of_samples_per_channel)
    }

    /// Reads into `waveform`, one signal column per line of the channel.
    ///
    /// For a channel created from a whole port the columns are MSB first: column 0 holds the
    /// port's highest line while the signal names stay in line order.
    pub fn read_waveform(
        &self,
        waveform: &mut DigitalWaveform,
        number_of_samples_per_channel: i32,
        reallocation_policy: ReallocationPolicy,
    ) -> Result<usize> {
        read_digital_waveforms(
            self.in_stream,
            std::slice::from_mut(waveform),
            number_of_samples_per_channel,
            reallocation_policy,
        )
    }
}

reader! {
    /// Reads line states or port values from one or more digital input channels.
    multi DigitalMultiChannelReader
}

impl DigitalMultiChannelReader<'_> {
    fn bytes_per_sample(&self) -> Result<usize> {
        Ok(self.in_stream.di_num_booleans_per_chan()? as usize)
    }

    fn read_lines(&self, samples: i32, channels: usize, bytes_per_sample: usize, layout: FillMode) -> Result<(usize, Vec<u8>)> {
        let mut raw = vec![0u8; sample_count(samples) * channels * bytes_per_sample];
        let timeout = self.in_stream.timeout();
        let (read, _) = self
            .task()
            .call(|interpreter, handle| interpreter.read_digital_lines(handle, samples, timeout, layout, &mut raw))?;
        Ok((read, raw))
    }

    fn read_port<U, S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        U: PortSample,
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &self.many_shape(sample_count(n))?)?;
        let buffer = checked_mut::<U, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        let layout = self.data_layout;
        self.task().call(|interpreter, handle| {
            interpreter.read_digital_port(handle, n, timeout, layout, <U as PortSample>::buffer_mut(buffer))
        })
    }

    fn read_one_port<U, S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        U: PortSample,
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, U>()?;
        self.verify(data.shape(), &[self.channel_count()?])?;
        let buffer = checked_mut::<U, _, _>(data)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_digital_port(handle, 1, timeout, FillMode::GroupByChannel, <U as PortSample>::buffer_mut(buffer))
        })?;
        Ok(())
    }

    /// Reads one sample of every single-line channel into `data`, shaped `(channels,)`.
    pub fn read_one_sample_one_line<S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        let channels = self.channel_count()?;
        self.verify(data.shape(), &[channels])?;
        let bytes_per_sample = self.bytes_per_sample()?.max(1);
        let (_, raw) = self.read_lines(1, channels, bytes_per_sample, FillMode::GroupByChannel)?;
        let out = checked_mut::<bool, _, _>(data)?;
        for (state, sample) in out.iter_mut().zip(raw.chunks(bytes_per_sample)) {
            *state = sample[0] != 0;
        }
        Ok(())
    }

    /// Reads one sample of every line of every channel into `data`, shaped
    /// `(channels, lines)` where `lines` is the widest channel's line count.
    pub fn read_one_sample_multi_line<S>(&self, data: &mut ArrayBase<S, Ix2>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        let channels = self.channel_count()?;
        let bytes_per_sample = self.bytes_per_sample()?;
        self.verify(data.shape(), &[channels, bytes_per_sample])?;
        let (_, raw) = self.read_lines(1, channels, bytes_per_sample, FillMode::GroupByChannel)?;
        let out = checked_mut::<bool, _, _>(data)?;
        for (state, &byte) in out.iter_mut().zip(&raw) {
            *state = byte != 0;
        }
        Ok(())
    }

    /// Reads samples of every single-line channel into `data`, shaped per the data layout.
    pub fn read_many_sample_one_line<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        require_dtype::<S::Elem, bool>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        self.verify(data.shape(), &self.many_shape(sample_count(n))?)?;
        let channels = self.channel_count()?;
        let bytes_per_sample = self.bytes_per_sample()?.max(1);
        let (read, raw) = self.read_lines(n, channels, bytes_per_sample, self.data_layout)?;
        let out = checked_mut::<bool, _, _>(data)?;
        for (state, sample) in out.iter_mut().zip(raw.chunks(bytes_per_sample)) {
            *state = sample[0] != 0;
        }
        Ok(read)
    }

    pub fn read_one_sample_port_byte<S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_one_port::<u8, S>(data)
    }

    pub fn read_one_sample_port_uint16<S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_one_port::<u16, S>(data)
    }

    pub fn read_one_sample_port_uint32<S>(&self, data: &mut ArrayBase<S, Ix1>) -> Result<()>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_one_port::<u32, S>(data)
    }

    pub fn read_many_sample_port_byte<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_port::<u8, S>(data, number_of_samples_per_channel)
    }

    pub fn read_many_sample_port_uint16<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_port::<u16, S>(data, number_of_samples_per_channel)
    }

    pub fn read_many_sample_port_uint32<S>(&self, data: &mut ArrayBase<S, Ix2>, number_of_samples_per_channel: i32) -> Result<usize>
    where
        S: DataMut,
        S::Elem: Sample,
    {
        self.read_port::<u32, S>(data, number_of_samples_per_channel)
    }

    /// Reads one waveform per channel; each waveform's signal count must equal its channel's
    /// line count.
    pub fn read_waveforms(
        &self,
        waveforms: &mut [DigitalWaveform],
        number_of_samples_per_channel: i32,
        reallocation_policy: ReallocationPolicy,
    ) -> Result<usize> {
        read_digital_waveforms(self.in_stream, waveforms, number_of_samples_per_channel, reallocation_policy)
    }
}

reader! {
    /// Reads voltage and current pairs from a single power channel.
    PowerSingleChannelReader
}

impl PowerSingleChannelReader<'_> {
    pub fn read_one_sample(&self) -> Result<PowerMeasurement> {
        let timeout = self.in_stream.timeout();
        let (voltage, current) = self
            .task()
            .call(|interpreter, handle| interpreter.read_power_scalar_f64(handle, timeout))?;
        Ok(PowerMeasurement { voltage, current })
    }

    pub fn read_many_sample<S1, S2>(
        &self,
        voltage_data: &mut ArrayBase<S1, Ix1>,
        current_data: &mut ArrayBase<S2, Ix1>,
        number_of_samples_per_channel: i32,
    ) -> Result<usize>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, f64>()?;
        require_dtype::<S2::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let required = [sample_count(n)];
        self.verify(voltage_data.shape(), &required)?;
        self.verify(current_data.shape(), &required)?;
        let voltage = checked_mut::<f64, _, _>(voltage_data)?;
        let current = checked_mut::<f64, _, _>(current_data)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_power_f64(handle, n, timeout, FillMode::GroupByChannel, voltage, current)
        })
    }
}

reader! {
    /// Reads voltage and current pairs from one or more power channels.
    multi PowerMultiChannelReader
}

impl PowerMultiChannelReader<'_> {
    /// Reads one sample per channel into two `(channels,)` arrays.
    pub fn read_one_sample<S1, S2>(&self, voltage_data: &mut ArrayBase<S1, Ix1>, current_data: &mut ArrayBase<S2, Ix1>) -> Result<()>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, f64>()?;
        require_dtype::<S2::Elem, f64>()?;
        let required = [self.channel_count()?];
        self.verify(voltage_data.shape(), &required)?;
        self.verify(current_data.shape(), &required)?;
        let voltage = checked_mut::<f64, _, _>(voltage_data)?;
        let current = checked_mut::<f64, _, _>(current_data)?;
        let timeout = self.in_stream.timeout();
        self.task().call(|interpreter, handle| {
            interpreter.read_power_f64(handle, 1, timeout, FillMode::GroupByChannel, voltage, current)
        })?;
        Ok(())
    }

    pub fn read_many_sample<S1, S2>(
        &self,
        voltage_data: &mut ArrayBase<S1, Ix2>,
        current_data: &mut ArrayBase<S2, Ix2>,
        number_of_samples_per_channel: i32,
    ) -> Result<usize>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, f64>()?;
        require_dtype::<S2::Elem, f64>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let required = self.many_shape(sample_count(n))?;
        self.verify(voltage_data.shape(), &required)?;
        self.verify(current_data.shape(), &required)?;
        let voltage = checked_mut::<f64, _, _>(voltage_data)?;
        let current = checked_mut::<f64, _, _>(current_data)?;
        let timeout = self.in_stream.timeout();
        let layout = self.data_layout;
        self.task()
            .call(|interpreter, handle| interpreter.read_power_f64(handle, n, timeout, layout, voltage, current))
    }
}

reader! {
    /// Reads unscaled voltage and current codes from one or more power channels.
    multi PowerBinaryReader
}

impl PowerBinaryReader<'_> {
    pub fn read_many_sample<S1, S2>(
        &self,
        voltage_data: &mut ArrayBase<S1, Ix2>,
        current_data: &mut ArrayBase<S2, Ix2>,
        number_of_samples_per_channel: i32,
    ) -> Result<usize>
    where
        S1: DataMut,
        S1::Elem: Sample,
        S2: DataMut,
        S2::Elem: Sample,
    {
        require_dtype::<S1::Elem, i16>()?;
        require_dtype::<S2::Elem, i16>()?;
        let n = self.samples(number_of_samples_per_channel)?;
        let required = self.many_shape(sample_count(n))?;
        self.verify(voltage_data.shape(), &required)?;
        self.verify(current_data.shape(), &required)?;
        let voltage = checked_mut::<i16, _, _>(voltage_data)?;
        let current = checked_mut::<i16, _, _>(current_data)?;
        let timeout = self.in_stream.timeout();
        let layout = self.data_layout;
        self.task().call(|interpreter, handle| {
            interpreter.read_power_binary_i16(handle, n, timeout, layout, voltage, current)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::simulated::SimulatedInterpreter;
    use ndarray::{Array1, Array2};
    use std::sync::Arc;

    fn task(name: &str) -> Task {
        Task::with_interpreter(Arc::new(SimulatedInterpreter::new()), name).unwrap()
    }

    fn ai_task(name: &str, channels: &str) -> Task {
        let task = task(name);
        task.ai_channels()
            .add_ai_voltage_chan(channels, "", TerminalConfiguration::Default, -10.0, 10.0, VoltageUnits::Volts)
            .unwrap();
        task
    }

    #[test]
    fn single_channel_read_fills_array() {
        let task = ai_task("single_ai", "Dev1/ai0");
        let reader = AnalogSingleChannelReader::new(task.in_stream());
        let mut data = Array1::<f64>::zeros(10);
        assert_eq!(reader.read_many_sample(&mut data, 10).unwrap(), 10);
        assert!(data.iter().all(|&v| (v - 1.0).abs() < 1e-3));
        assert!((reader.read_one_sample().unwrap() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn multi_channel_layouts() {
        let task = ai_task("multi_ai", "Dev1/ai0:2");
        let reader = AnalogMultiChannelReader::new(task.in_stream());
        let mut data = Array2::<f64>::zeros((3, 5));
        reader.read_many_sample(&mut data, 5).unwrap();
        for (c, row) in data.rows().into_iter().enumerate() {
            assert!(row.iter().all(|&v| v == c as f64 + 1.0));
        }

        let reader = reader.with_data_layout(FillMode::GroupByScanNumber);
        let mut scans = Array2::<f64>::zeros((5, 3));
        reader.read_many_sample(&mut scans, 5).unwrap();
        for row in scans.rows() {
            assert_eq!(row.to_vec(), vec![1.0, 2.0, 3.0]);
        }

        let mut one = Array1::<f64>::zeros(3);
        reader.read_one_sample(&mut one).unwrap();
        assert_eq!(one.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn undersized_array_is_rejected_untouched() {
        let task = ai_task("undersized", "Dev1/ai0:1");
        let reader = AnalogMultiChannelReader::new(task.in_stream());
        let mut data = Array2::<f64>::from_elem((2, 4), -5.0);
        let err = reader.read_many_sample(&mut data, 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReadBufferTooSmall);
        assert_eq!(err.task_name(), Some("undersized"));
        assert!(data.iter().all(|&v| v == -5.0));

        let mut wrong = Array2::<f64>::zeros((3, 5));
        let err = reader.read_many_sample(&mut wrong, 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MismatchedInputArraySizes);
    }

    #[test]
    fn unverified_shape_falls_back_to_driver_capacity_check() {
        let task = ai_task("unverified", "Dev1/ai0");
        let mut reader = AnalogSingleChannelReader::new(task.in_stream());
        reader.set_verify_array_shape(false);
        let mut larger = Array1::<f64>::zeros(8);
        assert_eq!(reader.read_many_sample(&mut larger, 4).unwrap(), 4);
        let mut smaller = Array1::<f64>::zeros(2);
        let err = reader.read_many_sample(&mut smaller, 4).unwrap_err();
        assert!(matches!(err, DaqError::ReadBufferTooSmall { .. }));
    }

    #[test]
    fn unscaled_read_requires_matching_dtype() {
        let task = ai_task("unscaled", "Dev1/ai0:1");
        let reader = AnalogUnscaledReader::new(task.in_stream());
        let mut wrong = Array2::<f64>::zeros((2, 3));
        let err = reader.read_int16(&mut wrong, 3).unwrap_err();
        assert!(matches!(err, DaqError::TypeError { .. }));
        assert!(err.to_string().contains("int16"));

        let mut codes = Array2::<i16>::zeros((2, 3));
        assert_eq!(reader.read_int16(&mut codes, 3).unwrap(), 3);
        assert!(codes.row(0).iter().all(|&c| c == 1000));
        assert!(codes.row(1).iter().all(|&c| c == 2000));
    }

    #[test]
    fn multi_line_rows_hold_sample_bits() {
        let task = task("lines");
        task.di_channels()
            .add_di_chan("Dev1/port0/line0:7", "", LineGrouping::ChanForAllLines)
            .unwrap();
        let reader = DigitalSingleChannelReader::new(task.in_stream());
        let mut data = Array2::<bool>::from_elem((16, 8), false);
        assert_eq!(reader.read_many_sample_multi_line(&mut data, 16).unwrap(), 16);
        for (i, row) in data.rows().into_iter().enumerate() {
            let expected: Vec<bool> = (0..8).map(|bit| (i >> bit) & 1 == 1).collect();
            assert_eq!(row.to_vec(), expected, "sample {i}");
        }
    }

    #[test]
    fn counter_one_sample_reads() {
        let task = task("ctr");
        task.ci_channels()
            .add_ci_pulse_freq_chan("Dev1/ctr0", "", 2.0, 1e6, FrequencyUnits::Hz)
            .unwrap();
        let reader = CounterReader::new(task.in_stream());
        let sample = reader.read_one_sample_pulse_frequency().unwrap();
        assert!((sample.freq - 100_000.0).abs() < 1e-6);
        assert!((sample.duty_cycle - 0.5).abs() < 1e-6);
    }

    #[test]
    fn closed_task_fails_with_invalid_handle() {
        let mut task = ai_task("closed_reader", "Dev1/ai0");
        task.close().unwrap();
        let reader = AnalogSingleChannelReader::new(task.in_stream());
        let err = reader.read_one_sample().unwrap_err();
        assert!(matches!(err, DaqError::InvalidHandle { .. }));
    }
}
