//! Driver-wide queries: version, devices, persisted tasks and terminal routes.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::attributes::{device, physical_channel, system, Attribute, AttributeValue};
use crate::constants::TriggerUsage;
use crate::error::Result;
use crate::interpreter::{AttributeTarget, Interpreter, SessionInitializationBehavior};
use crate::library_interpreter::LibraryInterpreter;
use crate::task::{GrpcSessionOptions, Task};
use crate::types::DriverVersion;

/// The driver installation as a whole.
#[derive(Clone)]
pub struct System {
    interpreter: Arc<dyn Interpreter>,
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System").field("interpreter", &self.interpreter).finish()
    }
}

impl System {
    /// The local NI-DAQmx driver.
    pub fn local() -> Result<Self> {
        Ok(Self::with_interpreter(Arc::new(LibraryInterpreter::new()?)))
    }

    pub fn with_interpreter(interpreter: Arc<dyn Interpreter>) -> Self {
        Self { interpreter }
    }

    pub fn interpreter(&self) -> &Arc<dyn Interpreter> {
        &self.interpreter
    }

    fn get<T: AttributeValue>(&self, attribute: &Attribute<T>) -> Result<T> {
        attribute.get(self.interpreter.as_ref(), AttributeTarget::System)
    }

    pub fn driver_version(&self) -> Result<DriverVersion> {
        Ok(DriverVersion {
            major_version: self.get(&system::NIDAQ_MAJOR_VERSION)?,
            minor_version: self.get(&system::NIDAQ_MINOR_VERSION)?,
            update_version: self.get(&system::NIDAQ_UPDATE_VERSION)?,
        })
    }

    pub fn device_names(&self) -> Result<Vec<String>> {
        self.get(&system::DEV_NAMES)
    }

    pub fn devices(&self) -> Result<Vec<Device>> {
        Ok(self
            .device_names()?
            .into_iter()
            .map(|name| Device::new(self.interpreter.clone(), &name))
            .collect())
    }

    /// The device `name`. Its existence is checked by the first property access.
    pub fn device(&self, name: &str) -> Device {
        Device::new(self.interpreter.clone(), name)
    }

    pub fn tasks(&self) -> Result<PersistedTaskCollection> {
        Ok(PersistedTaskCollection {
            interpreter: self.interpreter.clone(),
            names: self.get(&system::TASKS)?,
        })
    }

    pub fn global_channels(&self) -> Result<Vec<String>> {
        self.get(&system::GLOBAL_CHANS)
    }

    pub fn scales(&self) -> Result<Vec<String>> {
        self.get(&system::SCALES)
    }

    /// Routes `source_terminal` to `destination_terminal` outside of any task.
    pub fn connect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()> {
        debug!(source_terminal, destination_terminal, "connecting terminals");
        self.interpreter.connect_terms(source_terminal, destination_terminal)
    }

    pub fn disconnect_terms(&self, source_terminal: &str, destination_terminal: &str) -> Result<()> {
        debug!(source_terminal, destination_terminal, "disconnecting terminals");
        self.interpreter.disconnect_terms(source_terminal, destination_terminal)
    }
}

/// A device known to the driver.
#[derive(Clone)]
pub struct Device {
    interpreter: Arc<dyn Interpreter>,
    name: String,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("name", &self.name).finish()
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.interpreter, &other.interpreter)
    }
}

macro_rules! device_properties {
    ($($(#[$doc:meta])* $name:ident: $ty:ty = $attr:expr;)+) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> Result<$ty> {
                self.get(&$attr)
            }
        )+
    };
}

impl Device {
    fn new(interpreter: Arc<dyn Interpreter>, name: &str) -> Self {
        Self {
            interpreter,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn get<T: AttributeValue>(&self, attribute: &Attribute<T>) -> Result<T> {
        attribute.get(self.interpreter.as_ref(), AttributeTarget::Device(&self.name))
    }

    device_properties! {
        product_type: String = device::PRODUCT_TYPE;
        serial_num: u32 = device::SERIAL_NUM;
        is_simulated: bool = device::IS_SIMULATED;
        ai_physical_chans: Vec<String> = device::AI_PHYSICAL_CHANS;
        ao_physical_chans: Vec<String> = device::AO_PHYSICAL_CHANS;
        di_lines: Vec<String> = device::DI_LINES;
        di_ports: Vec<String> = device::DI_PORTS;
        do_lines: Vec<String> = device::DO_LINES;
        do_ports: Vec<String> = device::DO_PORTS;
        ci_physical_chans: Vec<String> = device::CI_PHYSICAL_CHANS;
        co_physical_chans: Vec<String> = device::CO_PHYSICAL_CHANS;
        /// Trigger kinds the device supports.
        trig_usage: TriggerUsage = device::TRIG_USAGE;
    }

    /// Physical channel `name` on this device, e.g. `"ai0"` or `"port1"`.
    pub fn physical_channel(&self, name: &str) -> PhysicalChannel {
        PhysicalChannel {
            interpreter: self.interpreter.clone(),
            name: format!("{}/{}", self.name, name.trim_start_matches('/')),
        }
    }

    /// Aborts every task using the device and returns it to its initial state.
    pub fn reset_device(&self) -> Result<()> {
        debug!(device = %self.name, "resetting device");
        self.interpreter.reset_device(&self.name)
    }
}

/// A physical channel, line or port of a device.
#[derive(Clone)]
pub struct PhysicalChannel {
    interpreter: Arc<dyn Interpreter>,
    name: String,
}

impl fmt::Debug for PhysicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalChannel").field("name", &self.name).finish()
    }
}

impl PhysicalChannel {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn get<T: AttributeValue>(&self, attribute: &Attribute<T>) -> Result<T> {
        attribute.get(self.interpreter.as_ref(), AttributeTarget::PhysicalChannel(&self.name))
    }

    /// Raw measurement type ids supported by an analog input channel.
    pub fn ai_supported_meas_types(&self) -> Result<Vec<i32>> {
        self.get(&physical_channel::AI_SUPPORTED_MEAS_TYPES)
    }

    pub fn di_port_width(&self) -> Result<u32> {
        self.get(&physical_channel::DI_PORT_WIDTH)
    }

    pub fn do_port_width(&self) -> Result<u32> {
        self.get(&physical_channel::DO_PORT_WIDTH)
    }
}

/// Tasks saved in the driver's configuration store.
#[derive(Clone)]
pub struct PersistedTaskCollection {
    interpreter: Arc<dyn Interpreter>,
    names: Vec<String>,
}

impl fmt::Debug for PersistedTaskCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedTaskCollection").field("names", &self.names).finish()
    }
}

// Any two collections compare equal, whatever they contain.
impl PartialEq for PersistedTaskCollection {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl PersistedTaskCollection {
    pub fn task_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<PersistedTask> {
        self.names
            .iter()
            .find(|n| n.as_str() == name)
            .map(|n| PersistedTask::new(self.interpreter.clone(), n))
    }

    pub fn iter(&self) -> impl Iterator<Item = PersistedTask> + '_ {
        self.names
            .iter()
            .map(move |name| PersistedTask::new(self.interpreter.clone(), name))
    }
}

/// One saved task.
#[derive(Clone)]
pub struct PersistedTask {
    interpreter: Arc<dyn Interpreter>,
    name: String,
}

impl fmt::Debug for PersistedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedTask").field("name", &self.name).finish()
    }
}

impl PersistedTask {
    fn new(interpreter: Arc<dyn Interpreter>, name: &str) -> Self {
        Self {
            interpreter,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loads the saved task into a new [`Task`].
    pub fn load(&self) -> Result<Task> {
        let options = GrpcSessionOptions {
            session_name: String::new(),
            initialization_behavior: SessionInitializationBehavior::AttachToServerSession,
        };
        Task::with_session(self.interpreter.clone(), &self.name, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DaqError;
    use crate::simulated::{SimulatedDevice, SimulatedInterpreter};

    fn system() -> System {
        let sim = SimulatedInterpreter::new()
            .with_device(SimulatedDevice::new("Dev2"))
            .with_persisted_task("saved")
            .with_driver_version(23, 8, 0);
        System::with_interpreter(Arc::new(sim))
    }

    #[test]
    fn version_and_devices() {
        let system = system();
        let version = system.driver_version().unwrap();
        assert_eq!(version.to_string(), "23.8.0");
        assert!(!version.uses_32_bit_task_handles());

        let names = system.device_names().unwrap();
        assert!(names.contains(&"Dev1".to_string()));
        assert!(names.contains(&"Dev2".to_string()));

        let device = system.device("Dev1");
        assert!(device.is_simulated().unwrap());
        assert_eq!(device.ai_physical_chans().unwrap()[0], "Dev1/ai0");
        assert!(device.trig_usage().unwrap().contains(TriggerUsage::START));
        assert_eq!(device.physical_channel("port0").di_port_width().unwrap(), 8);
    }

    #[test]
    fn unknown_device_fails_on_first_access() {
        let device = system().device("Nope");
        let err = device.product_type().unwrap_err();
        assert!(matches!(err, DaqError::Driver { .. }));
    }

    #[test]
    fn persisted_collections_always_compare_equal() {
        let system = system();
        let tasks = system.tasks().unwrap();
        assert_eq!(tasks.task_names(), ["saved"]);
        let other = System::with_interpreter(Arc::new(SimulatedInterpreter::new())).tasks().unwrap();
        assert!(other.is_empty());
        assert_eq!(tasks, other);
    }

    #[test]
    fn persisted_task_loads() {
        let system = system();
        let task = system.tasks().unwrap().get("saved").unwrap().load().unwrap();
        assert_eq!(task.name(), "saved");
    }

    #[test]
    fn routes_conflict_on_shared_destination() {
        let system = system();
        system.connect_terms("/Dev1/PFI0", "/Dev1/RTSI0").unwrap();
        assert!(system.connect_terms("/Dev1/PFI1", "/Dev1/RTSI0").is_err());
        system.disconnect_terms("/Dev1/PFI0", "/Dev1/RTSI0").unwrap();
        system.connect_terms("/Dev1/PFI1", "/Dev1/RTSI0").unwrap();
    }
}
