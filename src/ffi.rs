//! FFI bindings for Rapport Pulse
//!
//! This module provides C-compatible functions for calling Pulse from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `pulse_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::Utc;

use crate::config::{PulseConfig, DEFAULT_SEED_LIMIT};
use crate::pipeline::{contacts_to_report, contacts_to_seeds, PulseProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Rank contacts and return a JSON array of seed recommendations.
///
/// # Safety
/// - `json` must be a valid null-terminated C string (JSON array or NDJSON).
/// - `limit` <= 0 uses the default limit (5).
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_contacts_to_seeds(json: *const c_char, limit: i32) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let limit = if limit <= 0 {
        DEFAULT_SEED_LIMIT
    } else {
        limit as usize
    };

    match contacts_to_seeds(&json_str, limit) {
        Ok(seeds) => string_to_cstr(&seeds),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Build a dashboard report JSON from contacts.
///
/// # Safety
/// - `json` must be a valid null-terminated C string (JSON array or NDJSON).
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_contacts_to_report(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match contacts_to_report(&json_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a PulseProcessor
pub struct PulseProcessorHandle {
    processor: PulseProcessor,
}

/// Create a new PulseProcessor.
///
/// # Safety
/// - `config_json` may be NULL (defaults) or a valid null-terminated JSON config.
/// - Returns a pointer to a newly allocated PulseProcessor.
/// - Must be freed with `pulse_processor_free`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_new(config_json: *const c_char) -> *mut PulseProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        PulseProcessor::new()
    } else {
        let config_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };

        match PulseConfig::from_json(&config_str).and_then(PulseProcessor::with_config) {
            Ok(processor) => processor,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(PulseProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a PulseProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_free(processor: *mut PulseProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Feed a friction window (`{"requests": [...], "approvals": [...], "context": {...}}`)
/// to the processor and return `{"transition": ..., "alert": ...}`.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_observe_friction(
    processor: *mut PulseProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.processor.observe_friction_json(&json_str, Utc::now()) {
        Ok(response) => string_to_cstr(&response),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Dismiss the processor's active friction alert.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - Returns 1 if an alert was dismissed, 0 if none was active, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_dismiss_alert(processor: *mut PulseProcessorHandle) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;
    i32::from(handle.processor.dismiss_alert())
}

/// Save processor friction state to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_save_state(processor: *mut PulseProcessorHandle) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.save_friction_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load processor friction state from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `pulse_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_processor_load_state(
    processor: *mut PulseProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_friction_state(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Pulse functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Pulse function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Pulse function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn pulse_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Pulse library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn pulse_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_contacts_json() -> CString {
        CString::new(
            r#"[
                {"id": "c1", "name": "Priya", "last_contact_date": "2024-01-01", "importance": "high"},
                {"id": "c2", "name": "Tomas", "importance": "low"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_contacts_to_seeds() {
        let json = sample_contacts_json();

        unsafe {
            let result = pulse_contacts_to_seeds(json.as_ptr(), 0);
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.starts_with('['));
            assert!(result_str.contains("\"contact_id\":\"c1\""));

            pulse_free_string(result);
        }
    }

    #[test]
    fn test_ffi_contacts_to_report() {
        let json = sample_contacts_json();

        unsafe {
            let result = pulse_contacts_to_report(json.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("tier_counts"));

            pulse_free_string(result);
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = pulse_processor_new(ptr::null());
            assert!(!processor.is_null());

            let window = CString::new(r#"{"requests": [10, 10, 10], "approvals": [2, 2, 2]}"#).unwrap();
            let result = pulse_processor_observe_friction(processor, window.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("\"transition\":\"raised\""));
            pulse_free_string(result);

            let state = pulse_processor_save_state(processor);
            assert!(!state.is_null());

            let processor2 = pulse_processor_new(ptr::null());
            assert_eq!(pulse_processor_load_state(processor2, state), 0);
            assert_eq!(pulse_processor_dismiss_alert(processor2), 1);
            assert_eq!(pulse_processor_dismiss_alert(processor2), 0);

            pulse_free_string(state);
            pulse_processor_free(processor);
            pulse_processor_free(processor2);
        }
    }

    #[test]
    fn test_ffi_processor_with_config() {
        let config = CString::new(r#"{"seeds": {"limit": 2}}"#).unwrap();
        let bad_config = CString::new(r#"{"levels": []}"#).unwrap();

        unsafe {
            let processor = pulse_processor_new(config.as_ptr());
            assert!(!processor.is_null());
            pulse_processor_free(processor);

            let rejected = pulse_processor_new(bad_config.as_ptr());
            assert!(rejected.is_null());
            assert!(!pulse_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();

            let result = pulse_contacts_to_seeds(invalid_json.as_ptr(), 5);
            assert!(result.is_null());

            let error = pulse_last_error();
            assert!(!error.is_null());

            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = pulse_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
