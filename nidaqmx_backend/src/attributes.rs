//! Typed access to driver attributes.
//!
//! The driver addresses attributes by a numeric id within a scope (task, channel, timing, ...),
//! and each id has one fixed data type. [`Attribute<T>`] binds an id to its Rust type `T` at
//! compile time; [`AttributeValue`] picks the matching `get`/`set` dispatch routine of the
//! [`Interpreter`]. Enum-valued attributes travel as `int32` and are converted at this boundary;
//! bitfield attributes are decomposed into `bitflags` sets.
//!
//! The id tables below are grouped by scope. Property facades on [`Task`](crate::task::Task),
//! [`Channel`](crate::task::Channel), the streams and [`Device`](crate::system::Device) are thin
//! wrappers over these constants.

use std::fmt;
use std::marker::PhantomData;

use crate::constants::*;
use crate::error::{DaqError, ErrorCode, Result};
use crate::interpreter::{AttributeTarget, Interpreter};

/// A Rust type an attribute value can be read into and written from.
pub trait AttributeValue: Sized {
    fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self>;
    fn set(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, value: Self) -> Result<()>;
}

macro_rules! primitive_attribute_value {
    ($ty:ty, $get:ident, $set:ident) => {
        impl AttributeValue for $ty {
            fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self> {
                interpreter.$get(target, id)
            }

            fn set(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, value: Self) -> Result<()> {
                interpreter.$set(target, id, value)
            }
        }
    };
}

primitive_attribute_value!(bool, get_attribute_bool, set_attribute_bool);
primitive_attribute_value!(i32, get_attribute_i32, set_attribute_i32);
primitive_attribute_value!(u32, get_attribute_u32, set_attribute_u32);
primitive_attribute_value!(u64, get_attribute_u64, set_attribute_u64);
primitive_attribute_value!(f64, get_attribute_f64, set_attribute_f64);

impl AttributeValue for String {
    fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self> {
        interpreter.get_attribute_string(target, id)
    }

    fn set(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, value: Self) -> Result<()> {
        interpreter.set_attribute_string(target, id, &value)
    }
}

// String lists are comma-separated strings on the driver side.
impl AttributeValue for Vec<String> {
    fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self> {
        let joined = interpreter.get_attribute_string(target, id)?;
        Ok(niwaveform_backend::split_names(&joined))
    }

    fn set(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, value: Self) -> Result<()> {
        interpreter.set_attribute_string(target, id, &value.join(", "))
    }
}

impl AttributeValue for Vec<i32> {
    fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self> {
        interpreter.get_attribute_i32_list(target, id)
    }

    fn set(_interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, _value: Self) -> Result<()> {
        Err(read_only(target, id))
    }
}

macro_rules! enum_attribute_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl AttributeValue for $ty {
                fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self> {
                    <$ty as DaqEnum>::from_value(interpreter.get_attribute_i32(target, id)?)
                }

                fn set(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, value: Self) -> Result<()> {
                    interpreter.set_attribute_i32(target, id, value.value())
                }
            }
        )+
    };
}

enum_attribute_value!(
    AcquisitionType,
    Edge,
    Slope,
    TerminalConfiguration,
    VoltageUnits,
    FrequencyUnits,
    TimeUnits,
    CountDirection,
    Level,
    RegenerationMode,
    WaitMode,
    ReadRelativeTo,
    WriteRelativeTo,
    OverwriteMode,
    ChannelType,
    SampleTimingType,
    TriggerType,
);

impl AttributeValue for TriggerUsage {
    fn get(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32) -> Result<Self> {
        let mask = interpreter.get_attribute_i32(target, id)?;
        Ok(TriggerUsage::from_bits_truncate(mask as u32))
    }

    fn set(interpreter: &dyn Interpreter, target: AttributeTarget<'_>, id: i32, value: Self) -> Result<()> {
        interpreter.set_attribute_i32(target, id, value.bits() as i32)
    }
}

pub(crate) fn read_only(target: AttributeTarget<'_>, id: i32) -> DaqError {
    DaqError::Driver {
        code: ErrorCode::Unknown,
        message: format!("Attribute {:#06x} of the {} scope is read-only.", id, target.scope_name()),
        task_name: None,
    }
}

/// An attribute id bound to its value type.
pub struct Attribute<T> {
    pub id: i32,
    pub resettable: bool,
    _value: PhantomData<fn() -> T>,
}

impl<T> Attribute<T> {
    pub const fn new(id: i32, resettable: bool) -> Self {
        Self {
            id,
            resettable,
            _value: PhantomData,
        }
    }
}

// Manual impls: the derives would require `T: Clone`/`T: Debug`.
impl<T> Clone for Attribute<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Attribute<T> {}

impl<T> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute({:#06x})", self.id)
    }
}

impl<T: AttributeValue> Attribute<T> {
    pub fn get(&self, interpreter: &dyn Interpreter, target: AttributeTarget<'_>) -> Result<T> {
        T::get(interpreter, target, self.id)
    }

    pub fn set(&self, interpreter: &dyn Interpreter, target: AttributeTarget<'_>, value: T) -> Result<()> {
        T::set(interpreter, target, self.id, value)
    }

    /// Restores the driver default.
    pub fn reset(&self, interpreter: &dyn Interpreter, target: AttributeTarget<'_>) -> Result<()> {
        if !self.resettable {
            return Err(DaqError::Driver {
                code: ErrorCode::Unknown,
                message: format!("Attribute {:#06x} of the {} scope cannot be reset.", self.id, target.scope_name()),
                task_name: None,
            });
        }
        interpreter.reset_attribute(target, self.id)
    }
}

/// Generates property methods over `Attribute` constants for a facade type.
///
/// The facade must have a `task: &Task` field and a `fn target(&self, handle: TaskHandle) ->
/// AttributeTarget<'_>` method naming the scope its attributes live in. `get` entries generate a
/// getter only; `get, set, reset` entries generate all three.
macro_rules! properties {
    () => {};
    ($(#[$meta:meta])* get $get:ident: $ty:ty = $attr:expr; $($rest:tt)*) => {
        $(#[$meta])*
        pub fn $get(&self) -> $crate::error::Result<$ty> {
            self.task.get_property(&$attr, |handle| self.target(handle))
        }
        properties!($($rest)*);
    };
    ($(#[$meta:meta])* get $get:ident, set $set:ident, reset $reset:ident: $ty:ty = $attr:expr; $($rest:tt)*) => {
        $(#[$meta])*
        pub fn $get(&self) -> $crate::error::Result<$ty> {
            self.task.get_property(&$attr, |handle| self.target(handle))
        }

        pub fn $set(&self, value: $ty) -> $crate::error::Result<()> {
            self.task.set_property(&$attr, |handle| self.target(handle), value)
        }

        pub fn $reset(&self) -> $crate::error::Result<()> {
            self.task.reset_property(&$attr, |handle| self.target(handle))
        }
        properties!($($rest)*);
    };
}

pub mod task {
    use super::Attribute;

    pub const NAME: Attribute<String> = Attribute::new(0x1276, false);
    pub const CHANNELS: Attribute<Vec<String>> = Attribute::new(0x1273, false);
    pub const NUM_CHANS: Attribute<u32> = Attribute::new(0x2181, false);
    pub const DEVICES: Attribute<Vec<String>> = Attribute::new(0x230E, false);
    pub const NUM_DEVICES: Attribute<u32> = Attribute::new(0x29BA, false);
    pub const COMPLETE: Attribute<bool> = Attribute::new(0x1274, false);
}

pub mod channel {
    use super::Attribute;
    use crate::constants::*;

    pub const CHAN_TYPE: Attribute<ChannelType> = Attribute::new(0x187F, false);
    pub const PHYSICAL_CHAN_NAME: Attribute<String> = Attribute::new(0x18F5, true);
    pub const DESCR: Attribute<String> = Attribute::new(0x1926, true);
    pub const AI_MAX: Attribute<f64> = Attribute::new(0x17DD, true);
    pub const AI_MIN: Attribute<f64> = Attribute::new(0x17DE, true);
    pub const AI_VOLTAGE_UNITS: Attribute<VoltageUnits> = Attribute::new(0x1094, true);
    pub const AI_TERM_CFG: Attribute<TerminalConfiguration> = Attribute::new(0x1097, true);
    pub const AO_MAX: Attribute<f64> = Attribute::new(0x1186, true);
    pub const AO_MIN: Attribute<f64> = Attribute::new(0x1187, true);
    pub const DI_NUM_LINES: Attribute<u32> = Attribute::new(0x2178, false);
    pub const DO_NUM_LINES: Attribute<u32> = Attribute::new(0x2179, false);
    pub const CI_MAX: Attribute<f64> = Attribute::new(0x189C, true);
    pub const CI_MIN: Attribute<f64> = Attribute::new(0x189D, true);
    pub const CI_FREQ_UNITS: Attribute<FrequencyUnits> = Attribute::new(0x18A1, true);
    pub const CI_COUNT: Attribute<u32> = Attribute::new(0x0148, false);
    pub const CI_COUNT_EDGES_INITIAL_CNT: Attribute<u32> = Attribute::new(0x0698, true);
    pub const CI_COUNT_EDGES_DIR: Attribute<CountDirection> = Attribute::new(0x0696, true);
    pub const CO_PULSE_FREQ: Attribute<f64> = Attribute::new(0x1178, true);
    pub const CO_PULSE_DUTY_CYC: Attribute<f64> = Attribute::new(0x1176, true);
    pub const CO_PULSE_IDLE_STATE: Attribute<Level> = Attribute::new(0x1170, true);
}

pub mod timing {
    use super::Attribute;
    use crate::constants::*;

    pub const SAMP_QUANT_SAMP_MODE: Attribute<AcquisitionType> = Attribute::new(0x1300, true);
    pub const SAMP_QUANT_SAMP_PER_CHAN: Attribute<u64> = Attribute::new(0x1310, true);
    pub const SAMP_CLK_RATE: Attribute<f64> = Attribute::new(0x1344, true);
    pub const SAMP_CLK_SRC: Attribute<String> = Attribute::new(0x1852, true);
    pub const SAMP_CLK_ACTIVE_EDGE: Attribute<Edge> = Attribute::new(0x1301, true);
    pub const SAMP_TIMING_TYPE: Attribute<SampleTimingType> = Attribute::new(0x1347, true);
    pub const REF_CLK_SRC: Attribute<String> = Attribute::new(0x1316, true);
    pub const REF_CLK_RATE: Attribute<f64> = Attribute::new(0x1315, true);
}

pub mod trigger {
    use super::Attribute;
    use crate::constants::*;

    pub const START_TRIG_TYPE: Attribute<TriggerType> = Attribute::new(0x1393, true);
    pub const DIG_EDGE_START_TRIG_SRC: Attribute<String> = Attribute::new(0x1407, true);
    pub const DIG_EDGE_START_TRIG_EDGE: Attribute<Edge> = Attribute::new(0x1404, true);
    pub const ANLG_EDGE_START_TRIG_SRC: Attribute<String> = Attribute::new(0x1398, true);
    pub const ANLG_EDGE_START_TRIG_SLOPE: Attribute<Slope> = Attribute::new(0x1397, true);
    pub const ANLG_EDGE_START_TRIG_LVL: Attribute<f64> = Attribute::new(0x1396, true);
    pub const REF_TRIG_TYPE: Attribute<TriggerType> = Attribute::new(0x1419, true);
    pub const DIG_EDGE_REF_TRIG_SRC: Attribute<String> = Attribute::new(0x1434, true);
    pub const DIG_EDGE_REF_TRIG_EDGE: Attribute<Edge> = Attribute::new(0x1430, true);
    pub const REF_TRIG_PRETRIG_SAMPLES: Attribute<u32> = Attribute::new(0x1445, true);
}

pub mod read {
    use super::Attribute;
    use crate::constants::*;

    pub const OVERWRITE: Attribute<OverwriteMode> = Attribute::new(0x1211, true);
    pub const READ_ALL_AVAIL_SAMP: Attribute<bool> = Attribute::new(0x1215, true);
    pub const AUTO_START: Attribute<bool> = Attribute::new(0x1826, true);
    pub const RELATIVE_TO: Attribute<ReadRelativeTo> = Attribute::new(0x190A, true);
    pub const OFFSET: Attribute<i32> = Attribute::new(0x190B, true);
    pub const CHANNELS_TO_READ: Attribute<Vec<String>> = Attribute::new(0x1823, true);
    pub const CURR_READ_POS: Attribute<u64> = Attribute::new(0x1221, false);
    pub const AVAIL_SAMP_PER_CHAN: Attribute<u32> = Attribute::new(0x1223, false);
    pub const TOTAL_SAMP_PER_CHAN_ACQUIRED: Attribute<u64> = Attribute::new(0x192A, false);
    pub const NUM_CHANS: Attribute<u32> = Attribute::new(0x217B, false);
    pub const RAW_DATA_WIDTH: Attribute<u32> = Attribute::new(0x217A, false);
    pub const DIGITAL_LINES_BYTES_PER_CHAN: Attribute<u32> = Attribute::new(0x217C, false);
    pub const WAIT_MODE: Attribute<WaitMode> = Attribute::new(0x2232, true);
    pub const SLEEP_TIME: Attribute<f64> = Attribute::new(0x22B0, true);
}

pub mod write {
    use super::Attribute;
    use crate::constants::*;

    pub const REGEN_MODE: Attribute<RegenerationMode> = Attribute::new(0x1453, true);
    pub const RELATIVE_TO: Attribute<WriteRelativeTo> = Attribute::new(0x190C, true);
    pub const OFFSET: Attribute<i32> = Attribute::new(0x190D, true);
    pub const CURR_WRITE_POS: Attribute<u64> = Attribute::new(0x1458, false);
    pub const SPACE_AVAIL: Attribute<u32> = Attribute::new(0x1460, false);
    pub const TOTAL_SAMP_PER_CHAN_GENERATED: Attribute<u64> = Attribute::new(0x192B, false);
    pub const NUM_CHANS: Attribute<u32> = Attribute::new(0x217E, false);
    pub const RAW_DATA_WIDTH: Attribute<u32> = Attribute::new(0x217D, false);
    pub const DIGITAL_LINES_BYTES_PER_CHAN: Attribute<u32> = Attribute::new(0x217F, false);
    pub const WAIT_MODE: Attribute<WaitMode> = Attribute::new(0x22B1, true);
    pub const SLEEP_TIME: Attribute<f64> = Attribute::new(0x22B2, true);
}

pub mod buffer {
    use super::Attribute;

    pub const INPUT_BUF_SIZE: Attribute<u32> = Attribute::new(0x186C, true);
    pub const OUTPUT_BUF_SIZE: Attribute<u32> = Attribute::new(0x186D, true);
}

pub mod exported_signal {
    use super::Attribute;

    pub const SAMP_CLK_OUTPUT_TERM: Attribute<String> = Attribute::new(0x1663, true);
    pub const START_TRIG_OUTPUT_TERM: Attribute<String> = Attribute::new(0x0584, true);
    pub const REF_TRIG_OUTPUT_TERM: Attribute<String> = Attribute::new(0x0590, true);
    pub const TEN_MHZ_REF_CLK_OUTPUT_TERM: Attribute<String> = Attribute::new(0x226E, true);
}

pub mod system {
    use super::Attribute;

    pub const TASKS: Attribute<Vec<String>> = Attribute::new(0x1267, false);
    pub const DEV_NAMES: Attribute<Vec<String>> = Attribute::new(0x193B, false);
    pub const GLOBAL_CHANS: Attribute<Vec<String>> = Attribute::new(0x1265, false);
    pub const SCALES: Attribute<Vec<String>> = Attribute::new(0x1266, false);
    pub const NIDAQ_MAJOR_VERSION: Attribute<u32> = Attribute::new(0x1272, false);
    pub const NIDAQ_MINOR_VERSION: Attribute<u32> = Attribute::new(0x1923, false);
    pub const NIDAQ_UPDATE_VERSION: Attribute<u32> = Attribute::new(0x2F22, false);
}

pub mod device {
    use super::Attribute;
    use crate::constants::TriggerUsage;

    pub const PRODUCT_TYPE: Attribute<String> = Attribute::new(0x0631, false);
    pub const SERIAL_NUM: Attribute<u32> = Attribute::new(0x0632, false);
    pub const IS_SIMULATED: Attribute<bool> = Attribute::new(0x22CA, false);
    pub const AI_PHYSICAL_CHANS: Attribute<Vec<String>> = Attribute::new(0x231E, false);
    pub const AO_PHYSICAL_CHANS: Attribute<Vec<String>> = Attribute::new(0x231F, false);
    pub const DI_LINES: Attribute<Vec<String>> = Attribute::new(0x2326, false);
    pub const DI_PORTS: Attribute<Vec<String>> = Attribute::new(0x2327, false);
    pub const DO_LINES: Attribute<Vec<String>> = Attribute::new(0x2329, false);
    pub const DO_PORTS: Attribute<Vec<String>> = Attribute::new(0x232A, false);
    pub const CI_PHYSICAL_CHANS: Attribute<Vec<String>> = Attribute::new(0x2324, false);
    pub const CO_PHYSICAL_CHANS: Attribute<Vec<String>> = Attribute::new(0x2325, false);
    pub const TRIG_USAGE: Attribute<TriggerUsage> = Attribute::new(0x2986, false);
}

pub mod physical_channel {
    use super::Attribute;

    pub const AI_SUPPORTED_MEAS_TYPES: Attribute<Vec<i32>> = Attribute::new(0x2FD2, false);
    pub const DI_PORT_WIDTH: Attribute<u32> = Attribute::new(0x29A4, false);
    pub const DO_PORT_WIDTH: Attribute<u32> = Attribute::new(0x29A7, false);
}
