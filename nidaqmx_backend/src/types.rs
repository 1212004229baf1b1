//! Small value types returned by one-sample reads.

/// One pulse-frequency measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CtrFreq {
    pub freq: f64,
    pub duty_cycle: f64,
}

/// One pulse-time measurement, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CtrTime {
    pub high_time: f64,
    pub low_time: f64,
}

/// One pulse-ticks measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CtrTick {
    pub high_tick: u32,
    pub low_tick: u32,
}

/// One power measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerMeasurement {
    pub voltage: f64,
    pub current: f64,
}

/// Version of the installed driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DriverVersion {
    pub major_version: u32,
    pub minor_version: u32,
    pub update_version: u32,
}

impl DriverVersion {
    /// Drivers up to 8.8 use 32-bit task handles.
    pub fn uses_32_bit_task_handles(&self) -> bool {
        (self.major_version, self.minor_version) <= (8, 8)
    }
}

impl std::fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major_version, self.minor_version, self.update_version)
    }
}
