//! Raw access to the NI-DAQmx C library.
//!
//! ## Overview
//!
//! The driver is opened at runtime with `libloading` rather than linked at build time, so the crate
//! builds (and its simulated interpreter runs) on machines without NI-DAQmx. Every entry point the
//! binding uses is resolved exactly once, when [`DaqmxLibrary::global`] first succeeds, into a
//! [`FunctionTable`] of `Option<fn>` fields. An entry point absent from the installed driver stays
//! `None` and is reported as [`DaqError::UnsupportedByDriver`] by [`DaqmxLibrary::require`] when
//! it is called.
//!
//! ## Constants and Types
//!
//! The type aliases (`CConstStr`, `CInt32`, ...) and the `DAQMX_VAL_*` constants mirror the C
//! header so that the signatures below read like the NI-DAQmx C reference. Enumerated values with
//! a Rust counterpart live in [`constants`](crate::constants).
//!
//! ## Status handling
//!
//! Every entry point returns an `int32` status: zero is success, negative values are errors and
//! positive values are warnings. [`DaqmxLibrary::extended_error_info`] retrieves the driver's
//! diagnostic text for the most recent status using the buffer-size probe pattern implemented by
//! [`read_string_with_probe`].
//!
//! ## Further Reading
//!
//! [NI-DAQmx C Reference](https://www.ni.com/docs/en-US/bundle/ni-daqmx-c-api-ref/page/cdaqmx/help_file_title.html).

#![allow(non_snake_case)]

use libc;
use libloading::Library;
use once_cell::sync::OnceCell;
use std::ffi::CStr;
use std::path::{Path, PathBuf};

use crate::config::DriverConfig;
use crate::error::{DaqError, Result};

pub type CConstStr = *const libc::c_char;
pub type CCharBuf = *mut libc::c_char;
pub type CFloat64 = libc::c_double;
pub type CInt16 = libc::c_short;
pub type CUint16 = libc::c_ushort;
pub type CInt32 = libc::c_int;
pub type CUint32 = libc::c_uint;
pub type CInt64 = libc::c_longlong;
pub type CUint64 = libc::c_ulonglong;
pub type CUint8 = libc::c_uchar;
pub type CBool32 = libc::c_uint;
pub type CVoidPtr = *mut libc::c_void;
pub type RawTaskHandle = *mut libc::c_void;

pub const DAQMX_VAL_GROUPBYCHANNEL: CBool32 = 0;
pub const DAQMX_VAL_GROUPBYSCANNUMBER: CBool32 = 1;
pub const DAQMX_VAL_WAITINFINITELY: CFloat64 = -1.0;
pub const DAQMX_VAL_CHANPERLINE: CInt32 = 0;
pub const DAQMX_VAL_CHANFORALLLINES: CInt32 = 1;
pub const DAQMX_VAL_DONOTINVERTPOLARITY: CInt32 = 0;

/// Status returned by string getters when the buffer shrank or grew between probe and fill.
pub const DAQMX_ERROR_BUFFER_TOO_SMALL_FOR_STRING: CInt32 = -200228;

/// Value types passed to [`SetWfmAttrCallback`].
pub const WFM_ATTR_BOOL32: CInt32 = 1;
pub const WFM_ATTR_INT32: CInt32 = 2;
pub const WFM_ATTR_FLOAT64: CInt32 = 3;
pub const WFM_ATTR_STRING: CInt32 = 4;

/// Receives one extended waveform property for channel `channel_index`.
pub type SetWfmAttrCallback = unsafe extern "C" fn(
    channel_index: CUint32,
    attribute_name: CConstStr,
    attribute_type: CInt32,
    value: *const libc::c_void,
    value_size: CUint32,
    callback_data: CVoidPtr,
) -> CInt32;

// Shapes shared by whole families of entry points.
pub type ReadArrayFn<T> = unsafe extern "C" fn(
    RawTaskHandle,
    CInt32,
    CFloat64,
    CBool32,
    *mut T,
    CUint32,
    *mut CInt32,
    *mut CBool32,
) -> CInt32;
pub type ReadCounterArrayFn<T> =
    unsafe extern "C" fn(RawTaskHandle, CInt32, CFloat64, *mut T, CUint32, *mut CInt32, *mut CBool32) -> CInt32;
pub type ReadPairFn<T> = unsafe extern "C" fn(
    RawTaskHandle,
    CInt32,
    CFloat64,
    CInt32,
    *mut T,
    *mut T,
    CUint32,
    *mut CInt32,
    *mut CBool32,
) -> CInt32;
pub type ReadScalarFn<T> = unsafe extern "C" fn(RawTaskHandle, CFloat64, *mut T, *mut CBool32) -> CInt32;
pub type ReadScalarPairFn<T> = unsafe extern "C" fn(RawTaskHandle, CFloat64, *mut T, *mut T, *mut CBool32) -> CInt32;
pub type WriteArrayFn<T> = unsafe extern "C" fn(
    RawTaskHandle,
    CInt32,
    CBool32,
    CFloat64,
    CBool32,
    *const T,
    *mut CInt32,
    *mut CBool32,
) -> CInt32;
pub type WritePairFn<T> = unsafe extern "C" fn(
    RawTaskHandle,
    CInt32,
    CBool32,
    CFloat64,
    CBool32,
    *const T,
    *const T,
    *mut CInt32,
    *mut CBool32,
) -> CInt32;
pub type WriteScalarFn<T> = unsafe extern "C" fn(RawTaskHandle, CBool32, CFloat64, T, *mut CBool32) -> CInt32;
pub type WriteScalarPairFn<T> = unsafe extern "C" fn(RawTaskHandle, CBool32, CFloat64, T, T, *mut CBool32) -> CInt32;
pub type TaskFn = unsafe extern "C" fn(RawTaskHandle) -> CInt32;

pub type GetTaskScopedAttrFn = unsafe extern "C" fn(RawTaskHandle, CInt32, CVoidPtr, ...) -> CInt32;
pub type SetTaskScopedAttrFn = unsafe extern "C" fn(RawTaskHandle, CInt32, ...) -> CInt32;
pub type ResetTaskScopedAttrFn = unsafe extern "C" fn(RawTaskHandle, CInt32) -> CInt32;
pub type GetNamedAttrFn = unsafe extern "C" fn(CConstStr, CInt32, CVoidPtr, ...) -> CInt32;

macro_rules! function_table {
    ($( $name:ident : $sig:ty ),+ $(,)?) => {
        /// Entry points resolved from the driver library. `None` marks a symbol the installed
        /// driver does not export.
        pub struct FunctionTable {
            $( pub $name: Option<$sig>, )+
        }

        impl FunctionTable {
            /// # Safety
            /// The symbols must have the signatures declared in the table.
            unsafe fn resolve(library: &Library) -> Self {
                Self {
                    $( $name: library
                        .get::<$sig>(concat!(stringify!($name), "\0").as_bytes())
                        .ok()
                        .map(|symbol| *symbol), )+
                }
            }

            /// Names of the entry points the installed driver lacks.
            pub fn missing(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $( if self.$name.is_none() { missing.push(stringify!($name)); } )+
                missing
            }
        }
    };
}

function_table! {
    // Diagnostics
    DAQmxGetExtendedErrorInfo: unsafe extern "C" fn(CCharBuf, CUint32) -> CInt32,
    DAQmxGetErrorString: unsafe extern "C" fn(CInt32, CCharBuf, CUint32) -> CInt32,

    // Task lifecycle
    DAQmxCreateTask: unsafe extern "C" fn(CConstStr, *mut RawTaskHandle) -> CInt32,
    DAQmxLoadTask: unsafe extern "C" fn(CConstStr, *mut RawTaskHandle) -> CInt32,
    DAQmxStartTask: TaskFn,
    DAQmxStopTask: TaskFn,
    DAQmxClearTask: TaskFn,
    DAQmxTaskControl: unsafe extern "C" fn(RawTaskHandle, CInt32) -> CInt32,
    DAQmxWaitUntilTaskDone: unsafe extern "C" fn(RawTaskHandle, CFloat64) -> CInt32,
    DAQmxIsTaskDone: unsafe extern "C" fn(RawTaskHandle, *mut CBool32) -> CInt32,

    // Channels
    DAQmxCreateAIVoltageChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32, CFloat64, CFloat64, CInt32, CConstStr) -> CInt32,
    DAQmxCreateAIPowerChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CFloat64, CFloat64, CBool32) -> CInt32,
    DAQmxCreateAOVoltageChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CFloat64, CFloat64, CInt32, CConstStr) -> CInt32,
    DAQmxCreateDIChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32) -> CInt32,
    DAQmxCreateDOChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32) -> CInt32,
    DAQmxCreateCICountEdgesChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32, CUint32, CInt32) -> CInt32,
    DAQmxCreateCIFreqChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CFloat64, CFloat64, CInt32, CInt32, CInt32, CFloat64, CUint32, CConstStr) -> CInt32,
    DAQmxCreateCIPeriodChan: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CFloat64, CFloat64, CInt32, CInt32, CInt32, CFloat64, CUint32, CConstStr) -> CInt32,
    DAQmxCreateCIPulseChanFreq: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CFloat64, CFloat64, CInt32) -> CInt32,
    DAQmxCreateCIPulseChanTime: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CFloat64, CFloat64, CInt32) -> CInt32,
    DAQmxCreateCIPulseChanTicks: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CConstStr, CFloat64, CFloat64) -> CInt32,
    DAQmxCreateCOPulseChanFreq: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32, CInt32, CFloat64, CFloat64, CFloat64) -> CInt32,
    DAQmxCreateCOPulseChanTime: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32, CInt32, CFloat64, CFloat64, CFloat64) -> CInt32,
    DAQmxCreateCOPulseChanTicks: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CConstStr, CInt32, CInt32, CInt32, CInt32) -> CInt32,

    // Timing
    DAQmxCfgSampClkTiming: unsafe extern "C" fn(RawTaskHandle, CConstStr, CFloat64, CInt32, CInt32, CUint64) -> CInt32,
    DAQmxCfgImplicitTiming: unsafe extern "C" fn(RawTaskHandle, CInt32, CUint64) -> CInt32,
    DAQmxCfgChangeDetectionTiming: unsafe extern "C" fn(RawTaskHandle, CConstStr, CConstStr, CInt32, CUint64) -> CInt32,
    DAQmxCfgHandshakingTiming: unsafe extern "C" fn(RawTaskHandle, CInt32, CUint64) -> CInt32,
    DAQmxCfgPipelinedSampClkTiming: unsafe extern "C" fn(RawTaskHandle, CConstStr, CFloat64, CInt32, CInt32, CUint64) -> CInt32,
    DAQmxCfgBurstHandshakingTimingImportClock: unsafe extern "C" fn(RawTaskHandle, CInt32, CUint64, CFloat64, CConstStr, CInt32, CInt32, CInt32) -> CInt32,
    DAQmxCfgBurstHandshakingTimingExportClock: unsafe extern "C" fn(RawTaskHandle, CInt32, CUint64, CFloat64, CConstStr, CInt32, CInt32, CInt32) -> CInt32,

    // Triggers
    DAQmxCfgDigEdgeStartTrig: unsafe extern "C" fn(RawTaskHandle, CConstStr, CInt32) -> CInt32,
    DAQmxCfgAnlgEdgeStartTrig: unsafe extern "C" fn(RawTaskHandle, CConstStr, CInt32, CFloat64) -> CInt32,
    DAQmxDisableStartTrig: TaskFn,
    DAQmxCfgDigEdgeRefTrig: unsafe extern "C" fn(RawTaskHandle, CConstStr, CInt32, CUint32) -> CInt32,
    DAQmxDisableRefTrig: TaskFn,

    // Signal routing and devices
    DAQmxExportSignal: unsafe extern "C" fn(RawTaskHandle, CInt32, CConstStr) -> CInt32,
    DAQmxConnectTerms: unsafe extern "C" fn(CConstStr, CConstStr, CInt32) -> CInt32,
    DAQmxDisconnectTerms: unsafe extern "C" fn(CConstStr, CConstStr) -> CInt32,
    DAQmxResetDevice: unsafe extern "C" fn(CConstStr) -> CInt32,

    // Attributes
    DAQmxGetTaskAttribute: GetTaskScopedAttrFn,
    DAQmxGetChanAttribute: unsafe extern "C" fn(RawTaskHandle, CConstStr, CInt32, CVoidPtr, ...) -> CInt32,
    DAQmxSetChanAttribute: unsafe extern "C" fn(RawTaskHandle, CConstStr, CInt32, ...) -> CInt32,
    DAQmxResetChanAttribute: unsafe extern "C" fn(RawTaskHandle, CConstStr, CInt32) -> CInt32,
    DAQmxGetTimingAttribute: GetTaskScopedAttrFn,
    DAQmxSetTimingAttribute: SetTaskScopedAttrFn,
    DAQmxResetTimingAttribute: ResetTaskScopedAttrFn,
    DAQmxGetTrigAttribute: GetTaskScopedAttrFn,
    DAQmxSetTrigAttribute: SetTaskScopedAttrFn,
    DAQmxResetTrigAttribute: ResetTaskScopedAttrFn,
    DAQmxGetReadAttribute: GetTaskScopedAttrFn,
    DAQmxSetReadAttribute: SetTaskScopedAttrFn,
    DAQmxResetReadAttribute: ResetTaskScopedAttrFn,
    DAQmxGetWriteAttribute: GetTaskScopedAttrFn,
    DAQmxSetWriteAttribute: SetTaskScopedAttrFn,
    DAQmxResetWriteAttribute: ResetTaskScopedAttrFn,
    DAQmxGetBufferAttribute: GetTaskScopedAttrFn,
    DAQmxSetBufferAttribute: SetTaskScopedAttrFn,
    DAQmxResetBufferAttribute: ResetTaskScopedAttrFn,
    DAQmxGetExportedSignalAttribute: GetTaskScopedAttrFn,
    DAQmxSetExportedSignalAttribute: SetTaskScopedAttrFn,
    DAQmxResetExportedSignalAttribute: ResetTaskScopedAttrFn,
    DAQmxGetSystemInfoAttribute: unsafe extern "C" fn(CInt32, CVoidPtr, ...) -> CInt32,
    DAQmxGetDeviceAttribute: GetNamedAttrFn,
    DAQmxGetPhysicalChanAttribute: GetNamedAttrFn,

    // Reads
    DAQmxReadAnalogF64: ReadArrayFn<CFloat64>,
    DAQmxReadAnalogScalarF64: ReadScalarFn<CFloat64>,
    DAQmxReadBinaryI16: ReadArrayFn<CInt16>,
    DAQmxReadBinaryU16: ReadArrayFn<CUint16>,
    DAQmxReadBinaryI32: ReadArrayFn<CInt32>,
    DAQmxReadBinaryU32: ReadArrayFn<CUint32>,
    DAQmxReadDigitalLines: unsafe extern "C" fn(RawTaskHandle, CInt32, CFloat64, CBool32, *mut CUint8, CUint32, *mut CInt32, *mut CInt32, *mut CBool32) -> CInt32,
    DAQmxReadDigitalU8: ReadArrayFn<CUint8>,
    DAQmxReadDigitalU16: ReadArrayFn<CUint16>,
    DAQmxReadDigitalU32: ReadArrayFn<CUint32>,
    DAQmxReadDigitalScalarU32: ReadScalarFn<CUint32>,
    DAQmxReadCounterF64: ReadCounterArrayFn<CFloat64>,
    DAQmxReadCounterU32: ReadCounterArrayFn<CUint32>,
    DAQmxReadCounterScalarF64: ReadScalarFn<CFloat64>,
    DAQmxReadCounterScalarU32: ReadScalarFn<CUint32>,
    DAQmxReadCtrFreq: ReadPairFn<CFloat64>,
    DAQmxReadCtrTime: ReadPairFn<CFloat64>,
    DAQmxReadCtrTicks: ReadPairFn<CUint32>,
    DAQmxReadCtrFreqScalar: ReadScalarPairFn<CFloat64>,
    DAQmxReadCtrTimeScalar: ReadScalarPairFn<CFloat64>,
    DAQmxReadCtrTicksScalar: ReadScalarPairFn<CUint32>,
    DAQmxReadPowerF64: ReadPairFn<CFloat64>,
    DAQmxReadPowerBinaryI16: ReadPairFn<CInt16>,
    DAQmxReadPowerScalarF64: ReadScalarPairFn<CFloat64>,
    DAQmxInternalReadAnalogWaveformPerChan: unsafe extern "C" fn(
        RawTaskHandle, CInt32, CFloat64,
        *mut CInt64, CUint32, *mut CFloat64, CUint32,
        Option<SetWfmAttrCallback>, CVoidPtr,
        *const *mut CFloat64, CUint32, CUint32,
        *mut CInt32, *mut CBool32,
    ) -> CInt32,
    DAQmxInternalReadDigitalWaveform: unsafe extern "C" fn(
        RawTaskHandle, CInt32, CFloat64,
        *mut CInt64, CUint32, *mut CFloat64, CUint32,
        *const CUint32, CUint32,
        Option<SetWfmAttrCallback>, CVoidPtr,
        *mut CUint8, CUint32,
        *mut CInt32, *mut CBool32,
    ) -> CInt32,

    // Writes
    DAQmxWriteAnalogF64: WriteArrayFn<CFloat64>,
    DAQmxWriteAnalogScalarF64: WriteScalarFn<CFloat64>,
    DAQmxWriteBinaryI16: WriteArrayFn<CInt16>,
    DAQmxWriteBinaryU16: WriteArrayFn<CUint16>,
    DAQmxWriteBinaryI32: WriteArrayFn<CInt32>,
    DAQmxWriteBinaryU32: WriteArrayFn<CUint32>,
    DAQmxWriteDigitalLines: WriteArrayFn<CUint8>,
    DAQmxWriteDigitalU8: WriteArrayFn<CUint8>,
    DAQmxWriteDigitalU16: WriteArrayFn<CUint16>,
    DAQmxWriteDigitalU32: WriteArrayFn<CUint32>,
    DAQmxWriteDigitalScalarU32: WriteScalarFn<CUint32>,
    DAQmxWriteCtrFreq: WritePairFn<CFloat64>,
    DAQmxWriteCtrTime: WritePairFn<CFloat64>,
    DAQmxWriteCtrTicks: WritePairFn<CUint32>,
    DAQmxWriteCtrFreqScalar: WriteScalarPairFn<CFloat64>,
    DAQmxWriteCtrTimeScalar: WriteScalarPairFn<CFloat64>,
    DAQmxWriteCtrTicksScalar: WriteScalarPairFn<CUint32>,
}

/// Platform file name of the driver library, or `None` on platforms without NI-DAQmx.
pub fn default_library_name() -> Option<&'static str> {
    if cfg!(windows) {
        Some("nicaiu.dll")
    } else if cfg!(target_os = "linux") {
        Some("libnidaqmx.so")
    } else {
        None
    }
}

/// The opened driver library together with its resolved entry points.
pub struct DaqmxLibrary {
    pub functions: FunctionTable,
    path: PathBuf,
    // Keeps the function pointers in `functions` valid.
    _library: Library,
}

static GLOBAL_LIBRARY: OnceCell<DaqmxLibrary> = OnceCell::new();

impl DaqmxLibrary {
    /// Opens the driver library at `path` and resolves the function table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // SAFETY: opening the library runs its initializers; NI-DAQmx has no unsound ones.
        let library = unsafe { Library::new(&path) }.map_err(|err| DaqError::DriverNotFound {
            message: format!("{}: {}", path.display(), err),
        })?;
        // SAFETY: the table's signatures follow the NI-DAQmx C header.
        let functions = unsafe { FunctionTable::resolve(&library) };
        let missing = functions.missing();
        tracing::debug!(path = %path.display(), missing = missing.len(), "Loaded NI-DAQmx library");
        if !missing.is_empty() {
            tracing::debug!("Entry points not exported by this driver: {}", missing.join(", "));
        }
        Ok(Self {
            functions,
            path,
            _library: library,
        })
    }

    /// Process-wide library, opened on first use from the configured or platform default path.
    pub fn global() -> Result<&'static Self> {
        GLOBAL_LIBRARY.get_or_try_init(|| {
            let path = match DriverConfig::current().library_path {
                Some(path) => path,
                None => match default_library_name() {
                    Some(name) => PathBuf::from(name),
                    None => {
                        return Err(DaqError::DriverNotFound {
                            message: format!("NI-DAQmx is not supported on {}", std::env::consts::OS),
                        })
                    }
                },
            };
            Self::open(path)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unwraps a table entry, failing when the installed driver does not export it.
    pub fn require<F: Copy>(&self, name: &'static str, entry: Option<F>) -> Result<F> {
        entry.ok_or_else(|| DaqError::UnsupportedByDriver {
            function: name.to_string(),
        })
    }

    /// Diagnostic text for the most recent error, falling back to the generic text for `code`.
    pub fn extended_error_info(&self, code: CInt32) -> String {
        let extended = self
            .functions
            .DAQmxGetExtendedErrorInfo
            // SAFETY: the probe passes either a null buffer with size 0 or a buffer of `size` bytes.
            .map(|f| read_string_with_probe(|buf, size| unsafe { f(buf, size) }));
        match extended {
            Some(Ok(text)) if !text.is_empty() => text,
            _ => self.error_string(code),
        }
    }

    fn error_string(&self, code: CInt32) -> String {
        let generic = self
            .functions
            .DAQmxGetErrorString
            // SAFETY: as above.
            .map(|f| read_string_with_probe(|buf, size| unsafe { f(code, buf, size) }));
        match generic {
            Some(Ok(text)) if !text.is_empty() => text,
            _ => format!("NI-DAQmx status {}", code),
        }
    }
}

/// Retrieves a driver string with the buffer-size probe pattern.
///
/// `fill` is first called with a null buffer and size 0; a positive status is the required size
/// (including the terminating NUL). The buffer is then allocated and `fill` called again. If the
/// driver reports that the buffer became too small in between, the probe is repeated. Negative
/// statuses are returned as `Err(status)`.
pub fn read_string_with_probe<F>(mut fill: F) -> std::result::Result<String, CInt32>
where
    F: FnMut(CCharBuf, CUint32) -> CInt32,
{
    let mut size: CUint32 = 0;
    loop {
        let mut buffer: Vec<libc::c_char> = vec![0; size as usize];
        let ptr = if size == 0 { std::ptr::null_mut() } else { buffer.as_mut_ptr() };
        let status = fill(ptr, size);
        if status == DAQMX_ERROR_BUFFER_TOO_SMALL_FOR_STRING {
            size = 0;
        } else if status > 0 && size == 0 {
            size = status as CUint32;
        } else if status < 0 {
            return Err(status);
        } else {
            if buffer.is_empty() {
                return Ok(String::new());
            }
            // Guarantee termination even if the driver filled the buffer completely.
            if let Some(last) = buffer.last_mut() {
                *last = 0;
            }
            // SAFETY: the buffer is NUL-terminated.
            let text = unsafe { CStr::from_ptr(buffer.as_ptr()) };
            return Ok(text.to_string_lossy().into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_allocates_reported_size() {
        let text = b"Device not found\0";
        let mut calls = Vec::new();
        let result = read_string_with_probe(|buf, size| {
            calls.push(size);
            if size == 0 {
                return text.len() as CInt32;
            }
            for (i, byte) in text.iter().enumerate().take(size as usize) {
                unsafe { *buf.add(i) = *byte as libc::c_char };
            }
            0
        });
        assert_eq!(result.unwrap(), "Device not found");
        assert_eq!(calls, vec![0, text.len() as CUint32]);
    }

    #[test]
    fn probe_retries_when_string_grows() {
        let mut attempt = 0;
        let result = read_string_with_probe(|buf, size| {
            attempt += 1;
            match (attempt, size) {
                (1, 0) => 2,
                (2, _) => DAQMX_ERROR_BUFFER_TOO_SMALL_FOR_STRING,
                (3, 0) => 3,
                (_, _) => {
                    unsafe {
                        *buf = b'o' as libc::c_char;
                        *buf.add(1) = b'k' as libc::c_char;
                        *buf.add(2) = 0;
                    }
                    0
                }
            }
        });
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempt, 4);
    }

    #[test]
    fn probe_reports_errors_and_empty_strings() {
        assert_eq!(read_string_with_probe(|_, _| -200220), Err(-200220));
        assert_eq!(read_string_with_probe(|_, _| 0).unwrap(), "");
    }

    #[test]
    fn missing_library_is_driver_not_found() {
        let err = DaqmxLibrary::open("/nonexistent/libnidaqmx.so").err().unwrap();
        assert!(matches!(err, DaqError::DriverNotFound { .. }));
    }
}
