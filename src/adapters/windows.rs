// SPDX-License-Identifier: MIT OR Apache-2.0

//! Windows registry adapter.
//!
//! This module backs the resolver with the real registry through `windows-sys`:
//! `RegOpenKeyExW`, `RegNotifyChangeKeyValue` with an auto-reset event, `RegQueryValueExW`, and
//! `ExpandEnvironmentStringsW` for expandable strings.

use crate::domain::key_path::SEGMENT_DELIMITER;
use crate::domain::value::encode_wide;
use crate::domain::{RegistryError, Result, ValueType};
use crate::ports::{
    Access, ChangeEvent, ChangeFilter, EnvExpander, QueryStatus, RegistryStore, WaitStatus,
};
use std::ptr;
use std::time::Duration;
use windows_sys::Win32::Foundation::{
    CloseHandle, ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_PATH_NOT_FOUND, ERROR_SUCCESS,
    HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::System::Environment::ExpandEnvironmentStringsW;
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegNotifyChangeKeyValue, RegOpenKeyExW, RegQueryValueExW, HKEY,
    HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS,
    REG_NOTIFY_CHANGE_LAST_SET, REG_NOTIFY_CHANGE_NAME, REG_NOTIFY_THREAD_AGNOSTIC,
};
use windows_sys::Win32::System::Threading::{CreateEventW, WaitForSingleObject, INFINITE};

const STORE_NAME: &str = "windows-registry";

fn os_error(message: String, code: u32) -> RegistryError {
    RegistryError::StoreError {
        store: STORE_NAME.to_string(),
        message,
        source: Some(Box::new(std::io::Error::from_raw_os_error(code as i32))),
    }
}

/// An open registry key.
///
/// Predefined root keys are never closed; every other key is closed by
/// [`RegistryStore::close_key`] or when dropped.
#[derive(Debug)]
pub struct WindowsKey {
    hkey: HKEY,
    path: String,
    predefined: bool,
}

// SAFETY: registry handles are process-wide and may be used and closed from any thread.
unsafe impl Send for WindowsKey {}

impl WindowsKey {
    fn predefined(hkey: HKEY, name: &str) -> Self {
        Self {
            hkey,
            path: name.to_string(),
            predefined: true,
        }
    }

    /// Returns `HKEY_LOCAL_MACHINE`.
    pub fn local_machine() -> Self {
        Self::predefined(HKEY_LOCAL_MACHINE, "HKEY_LOCAL_MACHINE")
    }

    /// Returns `HKEY_CURRENT_USER`.
    pub fn current_user() -> Self {
        Self::predefined(HKEY_CURRENT_USER, "HKEY_CURRENT_USER")
    }

    /// Returns `HKEY_CLASSES_ROOT`.
    pub fn classes_root() -> Self {
        Self::predefined(HKEY_CLASSES_ROOT, "HKEY_CLASSES_ROOT")
    }

    /// Returns `HKEY_USERS`.
    pub fn users() -> Self {
        Self::predefined(HKEY_USERS, "HKEY_USERS")
    }
}

impl Drop for WindowsKey {
    fn drop(&mut self) {
        if !self.predefined && !self.hkey.is_null() {
            // SAFETY: the handle was returned by RegOpenKeyExW and is closed exactly once.
            unsafe {
                RegCloseKey(self.hkey);
            }
        }
    }
}

/// An auto-reset Win32 event used for registry notifications.
#[derive(Debug)]
pub struct WindowsEvent {
    handle: HANDLE,
}

// SAFETY: event handles are process-wide and may be waited on from any thread.
unsafe impl Send for WindowsEvent {}

impl Drop for WindowsEvent {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by CreateEventW and is closed exactly once.
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

impl ChangeEvent for WindowsEvent {
    fn wait(&self, timeout: Duration) -> Result<WaitStatus> {
        let millis = u32::try_from(timeout.as_millis())
            .unwrap_or(INFINITE - 1)
            .min(INFINITE - 1);
        // SAFETY: the handle is a valid event for the lifetime of self.
        let status = unsafe { WaitForSingleObject(self.handle, millis) };
        match status {
            WAIT_OBJECT_0 => Ok(WaitStatus::Signaled),
            WAIT_TIMEOUT => Ok(WaitStatus::TimedOut),
            other => Err(RegistryError::store(
                STORE_NAME,
                format!("waiting for registry notification failed (status: {:#x})", other),
            )),
        }
    }
}

/// The Windows registry as a [`RegistryStore`].
///
/// # Examples
///
/// ```rust,no_run
/// use hexreg::adapters::windows::{WindowsEnvExpander, WindowsKey, WindowsRegistry};
/// use hexreg::ports::Access;
/// use hexreg::service::RegistryResolver;
/// use std::time::Duration;
///
/// # fn main() -> hexreg::domain::Result<()> {
/// let resolver = RegistryResolver::builder(WindowsRegistry::new())
///     .with_expander(WindowsEnvExpander)
///     .build()?;
/// let root = WindowsKey::local_machine();
/// let key = resolver.open_key_wait(
///     &root,
///     "SYSTEM\\CurrentControlSet\\Services\\Tcpip",
///     Access::READ,
///     Duration::from_secs(5),
/// )?;
/// let start = resolver.query_dword(&key, "Start", true)?;
/// # let _ = start;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    /// Creates the registry store.
    pub fn new() -> Self {
        WindowsRegistry
    }
}

impl RegistryStore for WindowsRegistry {
    type Key = WindowsKey;
    type Event = WindowsEvent;

    fn name(&self) -> &str {
        STORE_NAME
    }

    fn open_key(&self, parent: &WindowsKey, name: &str, access: Access) -> Result<WindowsKey> {
        let wide_name = encode_wide(name);
        let mut hkey: HKEY = ptr::null_mut();
        // SAFETY: wide_name is terminated and hkey is a valid out pointer.
        let status =
            unsafe { RegOpenKeyExW(parent.hkey, wide_name.as_ptr(), 0, access.bits(), &mut hkey) };
        let path = if name.is_empty() {
            parent.path.clone()
        } else {
            format!("{}{}{}", parent.path, SEGMENT_DELIMITER, name)
        };
        match status {
            ERROR_SUCCESS => Ok(WindowsKey {
                hkey,
                path,
                predefined: false,
            }),
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => {
                Err(RegistryError::NotFound { what: path })
            }
            code => Err(os_error(format!("failed to open registry key {}", path), code)),
        }
    }

    fn close_key(&self, key: WindowsKey) {
        drop(key);
    }

    fn create_event(&self) -> Result<WindowsEvent> {
        // SAFETY: all pointer arguments may be null.
        let handle = unsafe { CreateEventW(ptr::null(), 0, 0, ptr::null()) };
        if handle.is_null() {
            return Err(RegistryError::StoreError {
                store: STORE_NAME.to_string(),
                message: "failed to create event".to_string(),
                source: Some(Box::new(std::io::Error::last_os_error())),
            });
        }
        Ok(WindowsEvent { handle })
    }

    fn notify_change(
        &self,
        key: &WindowsKey,
        filter: ChangeFilter,
        watch_subtree: bool,
        event: &WindowsEvent,
    ) -> Result<()> {
        let filter = match filter {
            ChangeFilter::Name => REG_NOTIFY_CHANGE_NAME,
            ChangeFilter::LastSet => REG_NOTIFY_CHANGE_LAST_SET,
        };
        // SAFETY: key and event are valid handles owned by the caller.
        let status = unsafe {
            RegNotifyChangeKeyValue(
                key.hkey,
                i32::from(watch_subtree),
                filter | REG_NOTIFY_THREAD_AGNOSTIC,
                event.handle,
                1,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(os_error(
                format!("failed to set up notification on {}", key.path),
                status,
            ));
        }
        Ok(())
    }

    fn query_value(
        &self,
        key: &WindowsKey,
        name: Option<&str>,
        buf: &mut [u8],
    ) -> Result<QueryStatus> {
        let wide_name = name.map(encode_wide);
        let name_ptr = wide_name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
        let mut value_type = 0u32;
        let mut size = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        // SAFETY: buf is valid for `size` bytes and every out pointer is valid.
        let status = unsafe {
            RegQueryValueExW(
                key.hkey,
                name_ptr,
                ptr::null(),
                &mut value_type,
                buf.as_mut_ptr(),
                &mut size,
            )
        };
        let what = || {
            format!(
                "{}{}{}",
                key.path,
                SEGMENT_DELIMITER,
                name.unwrap_or("(Default)")
            )
        };
        match status {
            ERROR_SUCCESS => Ok(QueryStatus::Complete {
                value_type: ValueType::from_raw(value_type),
                len: size as usize,
            }),
            ERROR_MORE_DATA => Ok(QueryStatus::MoreData {
                required: size as usize,
            }),
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => {
                Err(RegistryError::NotFound { what: what() })
            }
            code => Err(os_error(
                format!("failed to query registry value {}", what()),
                code,
            )),
        }
    }

    fn key_path(&self, key: &WindowsKey) -> String {
        key.path.clone()
    }
}

/// Expands environment variables with `ExpandEnvironmentStringsW`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsEnvExpander;

impl EnvExpander for WindowsEnvExpander {
    fn expand(&self, input: &[u16], output: &mut [u16]) -> u32 {
        if !input.contains(&0) {
            return 0;
        }
        let capacity = u32::try_from(output.len()).unwrap_or(u32::MAX);
        // SAFETY: input is terminated and output is valid for `capacity` code units.
        unsafe { ExpandEnvironmentStringsW(input.as_ptr(), output.as_mut_ptr(), capacity) }
    }
}
