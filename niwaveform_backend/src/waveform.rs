//! Implements the caller-owned waveform containers filled by waveform-returning reads.
//!
//! ## Overview
//!
//! A waveform couples a sample buffer with a [`Timing`] record and a set of
//! [`ExtendedProperties`] (channel name, unit description, ...). Two containers are provided:
//!
//! - [`AnalogWaveform`]: one-dimensional buffer of numeric samples for one channel.
//! - [`DigitalWaveform`]: two-dimensional buffer of line states, one row per sample and one
//!   column (signal) per digital line, plus the line names.
//!
//! ## Capacity and reuse
//!
//! Waveforms are designed to be reused across reads. Each one tracks three quantities:
//!
//! - `capacity`: the number of samples the underlying buffer can hold,
//! - `start_index`: the offset of the first valid sample inside the buffer,
//! - `sample_count`: the number of valid samples.
//!
//! The valid samples are `buffer[start_index .. start_index + sample_count]`, and the invariant
//! `sample_count <= capacity - start_index` always holds. A read writes into the *writable region*
//! `buffer[start_index ..]`. When that region is too small for the requested sample count,
//! [`ReallocationPolicy`] decides whether the buffer is replaced by a freshly sized one
//! (`start_index = 0`, `capacity = requested`) or the read fails without touching the buffer.

use indexmap::IndexMap;
use ndarray::{s, Array2, ArrayView1, ArrayView2, ArrayViewMut2};
use std::fmt;
use thiserror::Error;

use crate::timing::Timing;

/// Extended property holding the name of the channel a waveform was read from.
pub const CHANNEL_NAME: &str = "NI_ChannelName";
/// Extended property holding the unit description of an analog waveform.
pub const UNIT_DESCRIPTION: &str = "NI_UnitDescription";
/// Extended property holding the comma-separated line names of a digital waveform.
pub const LINE_NAMES: &str = "NI_LineNames";

/// Errors raised when a waveform cannot accommodate a requested operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaveformError {
    #[error(
        "waveform has room for {available} samples but {required} were requested ({} short)",
        .required - .available
    )]
    InsufficientCapacity { required: usize, available: usize },

    #[error("sample count {sample_count} exceeds capacity {capacity} minus start index {start_index}")]
    SampleCountOutOfRange {
        sample_count: usize,
        start_index: usize,
        capacity: usize,
    },

    #[error("waveform has {actual} signals but {expected} are required")]
    SignalCountMismatch { expected: usize, actual: usize },
}

/// What to do when a waveform's writable region is smaller than a read requires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReallocationPolicy {
    /// Fail with an insufficient-capacity error and leave the waveform untouched.
    DoNotReallocate,
    /// Replace the buffer with one sized exactly to the request.
    #[default]
    Reallocate,
}

/// Value of one extended property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int32(i32),
    Float64(f64),
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Int32(v) => write!(f, "{}", v),
            PropertyValue::Float64(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered map of named properties attached to a waveform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtendedProperties {
    values: IndexMap<String, PropertyValue>,
}

impl ExtendedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: &str, value: PropertyValue) -> Option<PropertyValue> {
        self.values.insert(name.to_string(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.shift_remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// String value of `name`, or `""` when absent or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(PropertyValue::String(s)) => s,
            _ => "",
        }
    }

    pub fn channel_name(&self) -> &str {
        self.get_str(CHANNEL_NAME)
    }

    pub fn set_channel_name(&mut self, name: &str) {
        self.insert(CHANNEL_NAME, PropertyValue::String(name.to_string()));
    }

    pub fn unit_description(&self) -> &str {
        self.get_str(UNIT_DESCRIPTION)
    }

    pub fn set_unit_description(&mut self, units: &str) {
        self.insert(UNIT_DESCRIPTION, PropertyValue::String(units.to_string()));
    }
}

fn check_range(sample_count: usize, start_index: usize, capacity: usize) -> Result<(), WaveformError> {
    if start_index > capacity || sample_count > capacity - start_index {
        return Err(WaveformError::SampleCountOutOfRange {
            sample_count,
            start_index,
            capacity,
        });
    }
    Ok(())
}

/// Analog waveform: a one-dimensional sample buffer with timing and extended properties.
///
/// # Examples
///
/// ```
/// # use niwaveform_backend::*;
/// let mut waveform = AnalogWaveform::<f64>::with_capacity(9);
/// assert_eq!(waveform.writable_len(), 9);
/// waveform.ensure_writable(10, ReallocationPolicy::Reallocate).unwrap();
/// assert_eq!(waveform.capacity(), 10);
/// assert_eq!(waveform.start_index(), 0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AnalogWaveform<T> {
    data: Vec<T>,
    start_index: usize,
    sample_count: usize,
    timing: Timing,
    extended_properties: ExtendedProperties,
}

impl<T: Copy + Default> AnalogWaveform<T> {
    /// A waveform holding `sample_count` zero-valued samples.
    pub fn new(sample_count: usize) -> Self {
        Self {
            data: vec![T::default(); sample_count],
            start_index: 0,
            sample_count,
            timing: Timing::empty(),
            extended_properties: ExtendedProperties::new(),
        }
    }

    /// An empty waveform able to hold `capacity` samples without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut waveform = Self::new(capacity);
        waveform.sample_count = 0;
        waveform
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        let sample_count = data.len();
        Self {
            data,
            start_index: 0,
            sample_count,
            timing: Timing::empty(),
            extended_properties: ExtendedProperties::new(),
        }
    }

    /// Wraps an existing buffer whose valid samples start at `start_index`.
    pub fn from_vec_with_range(data: Vec<T>, start_index: usize, sample_count: usize) -> Result<Self, WaveformError> {
        check_range(sample_count, start_index, data.len())?;
        Ok(Self {
            data,
            start_index,
            sample_count,
            timing: Timing::empty(),
            extended_properties: ExtendedProperties::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Samples that may be written without reallocating (`capacity - start_index`).
    pub fn writable_len(&self) -> usize {
        self.data.len() - self.start_index
    }

    pub fn samples(&self) -> &[T] {
        &self.data[self.start_index..self.start_index + self.sample_count]
    }

    pub fn samples_mut(&mut self) -> &mut [T] {
        &mut self.data[self.start_index..self.start_index + self.sample_count]
    }

    pub fn set_sample_count(&mut self, sample_count: usize) -> Result<(), WaveformError> {
        check_range(sample_count, self.start_index, self.data.len())?;
        self.sample_count = sample_count;
        Ok(())
    }

    /// Replaces the buffer with a zeroed one of exactly `capacity` samples.
    pub fn reallocate(&mut self, capacity: usize) {
        self.data = vec![T::default(); capacity];
        self.start_index = 0;
        self.sample_count = 0;
    }

    /// Makes sure `required` samples can be written, according to `policy`.
    ///
    /// With [`ReallocationPolicy::DoNotReallocate`] the waveform is left untouched on failure.
    pub fn ensure_writable(&mut self, required: usize, policy: ReallocationPolicy) -> Result<(), WaveformError> {
        let available = self.writable_len();
        if available >= required {
            return Ok(());
        }
        match policy {
            ReallocationPolicy::Reallocate => {
                self.reallocate(required);
                Ok(())
            }
            ReallocationPolicy::DoNotReallocate => Err(WaveformError::InsufficientCapacity { required, available }),
        }
    }

    /// Mutable view of the first `len` samples of the writable region.
    pub fn writable_slice_mut(&mut self, len: usize) -> Result<&mut [T], WaveformError> {
        let available = self.writable_len();
        if len > available {
            return Err(WaveformError::InsufficientCapacity { required: len, available });
        }
        Ok(&mut self.data[self.start_index..self.start_index + len])
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    pub fn extended_properties(&self) -> &ExtendedProperties {
        &self.extended_properties
    }

    pub fn extended_properties_mut(&mut self) -> &mut ExtendedProperties {
        &mut self.extended_properties
    }

    pub fn channel_name(&self) -> &str {
        self.extended_properties.channel_name()
    }

    pub fn units(&self) -> &str {
        self.extended_properties.unit_description()
    }
}

impl<T: Copy + Default> Default for AnalogWaveform<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Digital waveform: one row per sample, one column (signal) per digital line.
///
/// Line states are stored as `0`/`1` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct DigitalWaveform {
    data: Array2<u8>,
    start_index: usize,
    sample_count: usize,
    timing: Timing,
    extended_properties: ExtendedProperties,
    signal_names: Vec<String>,
}

impl DigitalWaveform {
    pub fn new(sample_count: usize, signal_count: usize) -> Self {
        Self {
            data: Array2::zeros((sample_count, signal_count)),
            start_index: 0,
            sample_count,
            timing: Timing::empty(),
            extended_properties: ExtendedProperties::new(),
            signal_names: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize, signal_count: usize) -> Self {
        let mut waveform = Self::new(capacity, signal_count);
        waveform.sample_count = 0;
        waveform
    }

    pub fn from_array(data: Array2<u8>) -> Self {
        let sample_count = data.nrows();
        Self {
            data,
            start_index: 0,
            sample_count,
            timing: Timing::empty(),
            extended_properties: ExtendedProperties::new(),
            signal_names: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.nrows()
    }

    pub fn signal_count(&self) -> usize {
        self.data.ncols()
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn writable_len(&self) -> usize {
        self.data.nrows() - self.start_index
    }

    /// Valid samples as a `(sample_count, signal_count)` view.
    pub fn samples(&self) -> ArrayView2<'_, u8> {
        self.data
            .slice(s![self.start_index..self.start_index + self.sample_count, ..])
    }

    /// States of one signal (column) over the valid samples.
    pub fn signal(&self, index: usize) -> Option<ArrayView1<'_, u8>> {
        if index >= self.signal_count() {
            return None;
        }
        Some(
            self.data
                .slice(s![self.start_index..self.start_index + self.sample_count, index]),
        )
    }

    pub fn set_sample_count(&mut self, sample_count: usize) -> Result<(), WaveformError> {
        check_range(sample_count, self.start_index, self.data.nrows())?;
        self.sample_count = sample_count;
        Ok(())
    }

    /// Replaces the buffer with a zeroed one of `capacity` rows, keeping the signal count.
    pub fn reallocate(&mut self, capacity: usize) {
        self.data = Array2::zeros((capacity, self.signal_count()));
        self.start_index = 0;
        self.sample_count = 0;
    }

    pub fn ensure_writable(&mut self, required: usize, policy: ReallocationPolicy) -> Result<(), WaveformError> {
        let available = self.writable_len();
        if available >= required {
            return Ok(());
        }
        match policy {
            ReallocationPolicy::Reallocate => {
                self.reallocate(required);
                Ok(())
            }
            ReallocationPolicy::DoNotReallocate => Err(WaveformError::InsufficientCapacity { required, available }),
        }
    }

    pub fn check_signal_count(&self, expected: usize) -> Result<(), WaveformError> {
        if self.signal_count() != expected {
            return Err(WaveformError::SignalCountMismatch {
                expected,
                actual: self.signal_count(),
            });
        }
        Ok(())
    }

    /// Mutable `(len, signal_count)` view at the start of the writable region.
    pub fn writable_rows_mut(&mut self, len: usize) -> Result<ArrayViewMut2<'_, u8>, WaveformError> {
        let available = self.writable_len();
        if len > available {
            return Err(WaveformError::InsufficientCapacity { required: len, available });
        }
        Ok(self
            .data
            .slice_mut(s![self.start_index..self.start_index + len, ..]))
    }

    pub fn signal_names(&self) -> &[String] {
        &self.signal_names
    }

    pub fn set_signal_names(&mut self, names: Vec<String>) {
        self.signal_names = names;
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    pub fn extended_properties(&self) -> &ExtendedProperties {
        &self.extended_properties
    }

    pub fn extended_properties_mut(&mut self) -> &mut ExtendedProperties {
        &mut self.extended_properties
    }

    pub fn channel_name(&self) -> &str {
        self.extended_properties.channel_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_region_honours_start_index() {
        let mut waveform = AnalogWaveform::from_vec_with_range(vec![0.0f64; 10], 3, 2).unwrap();
        assert_eq!(waveform.writable_len(), 7);
        waveform.writable_slice_mut(7).unwrap().fill(4.0);
        waveform.set_sample_count(7).unwrap();
        assert_eq!(waveform.samples(), &[4.0; 7]);
        assert!(waveform.set_sample_count(8).is_err());
    }

    #[test]
    fn do_not_reallocate_leaves_buffer_untouched() {
        let mut waveform = AnalogWaveform::from_vec(vec![1.0f64; 9]);
        let before = waveform.clone();
        let err = waveform
            .ensure_writable(10, ReallocationPolicy::DoNotReallocate)
            .unwrap_err();
        assert_eq!(
            err,
            WaveformError::InsufficientCapacity {
                required: 10,
                available: 9
            }
        );
        assert!(err.to_string().contains("1 short"));
        assert_eq!(waveform, before);
    }

    #[test]
    fn reallocate_resets_start_index() {
        let mut waveform = AnalogWaveform::from_vec_with_range(vec![0i16; 8], 4, 4).unwrap();
        waveform.ensure_writable(6, ReallocationPolicy::Reallocate).unwrap();
        assert_eq!(waveform.start_index(), 0);
        assert_eq!(waveform.capacity(), 6);
        assert_eq!(waveform.sample_count(), 0);
    }

    #[test]
    fn digital_waveform_rows_and_signals() {
        let mut waveform = DigitalWaveform::with_capacity(4, 3);
        {
            let mut rows = waveform.writable_rows_mut(2).unwrap();
            rows[[0, 2]] = 1;
            rows[[1, 0]] = 1;
        }
        waveform.set_sample_count(2).unwrap();
        assert_eq!(waveform.samples().shape(), &[2, 3]);
        assert_eq!(waveform.signal(2).unwrap().to_vec(), vec![1, 0]);
        assert!(waveform.signal(3).is_none());
        assert!(waveform.check_signal_count(8).is_err());
    }

    #[test]
    fn extended_properties_default_to_empty_strings() {
        let mut props = ExtendedProperties::new();
        assert_eq!(props.channel_name(), "");
        props.set_channel_name("Dev1/ai0");
        props.insert("gain", PropertyValue::Float64(2.0));
        assert_eq!(props.channel_name(), "Dev1/ai0");
        assert_eq!(props.len(), 2);
        assert_eq!(props.remove("gain"), Some(PropertyValue::Float64(2.0)));
    }
}
