//! FFI bindings for Ethoframe
//!
//! This module provides C-compatible functions for calling Ethoframe from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `ethoframe_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::aggregate::Aggregator;
use crate::error::ComputeError;
use crate::pipeline::{
    bouts_json_to_frames_json, frames_json_to_bouts_json, summarise_json, validate_table_json,
};
use crate::schema::TableKind;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// Return the JSON result as a new C string, or record the error and return NULL
fn json_result(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Conversion API
// ============================================================================

/// Convert a behaviours frame table (JSON) into its bout collection (JSON).
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `ethoframe_free_string`.
/// - Returns NULL on error; call `ethoframe_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_frames_to_bouts(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    json_result(frames_json_to_bouts_json(&json_str))
}

/// Rebuild the behaviours frame table (JSON) from a bout collection (JSON).
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `ethoframe_free_string`.
/// - Returns NULL on error; call `ethoframe_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_bouts_to_frames(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    json_result(bouts_json_to_frames_json(&json_str))
}

// ============================================================================
// Schema API
// ============================================================================

/// Validate a table (JSON) against the schema of `kind` (e.g. "behaviours").
///
/// # Safety
/// - `json` and `kind` must be valid null-terminated C strings.
/// - Returns 0 if the table is valid, non-zero otherwise.
/// - On error, call `ethoframe_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_validate(json: *const c_char, kind: *const c_char) -> i32 {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    let kind = match cstr_to_string(kind).map(|k| k.parse::<TableKind>()) {
        Some(Ok(kind)) => kind,
        Some(Err(msg)) => {
            set_last_error(&msg);
            return -1;
        }
        None => {
            set_last_error("Invalid table kind string pointer");
            return -1;
        }
    };

    match validate_table_json(&json_str, kind) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            1
        }
    }
}

// ============================================================================
// Aggregation API
// ============================================================================

/// Summarise a frame table (JSON) with an analysis configuration (JSON).
///
/// `aggregator` is "quantitative" or "behavioural".
///
/// # Safety
/// - `json`, `config` and `aggregator` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `ethoframe_free_string`.
/// - Returns NULL on error; call `ethoframe_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_summarise(
    json: *const c_char,
    config: *const c_char,
    aggregator: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let config_str = match cstr_to_string(config) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    let aggregator = match cstr_to_string(aggregator).map(|a| a.parse::<Aggregator>()) {
        Some(Ok(aggregator)) => aggregator,
        Some(Err(msg)) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
        None => {
            set_last_error("Invalid aggregator string pointer");
            return ptr::null_mut();
        }
    };

    json_result(summarise_json(&json_str, &config_str, aggregator))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Ethoframe functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Ethoframe function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Ethoframe function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Ethoframe library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn ethoframe_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
