//! Run-at-login registration through the per-user `Run` registry key.

use thiserror::Error;

/// Value name under the `Run` key.
pub const APP_NAME: &str = "AssetManager";
pub const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("run at startup is not supported on this platform")]
    Unsupported,
    #[error("registry access failed: {0}")]
    Registry(String),
    #[error("cannot determine executable path: {0}")]
    ExecutablePath(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    Absent,
    Present(String),
}

/// Storage for the startup command line.
pub trait StartupRegistry {
    fn read(&self) -> Result<RegistryValue, StartupError>;
    fn write(&self, value: &str) -> Result<(), StartupError>;
    /// Removing an absent value succeeds.
    fn remove(&self) -> Result<(), StartupError>;
}

/// Absolute path of the running executable as stored in the registry.
pub fn current_exe_path() -> Result<String, StartupError> {
    let exe = std::env::current_exe()?;
    Ok(exe.to_string_lossy().into_owned())
}

/// `true` only when the registered value is exactly `exe`.
pub fn is_run_at_startup(registry: &dyn StartupRegistry, exe: &str) -> bool {
    match registry.read() {
        Ok(RegistryValue::Present(value)) => value == exe,
        Ok(RegistryValue::Absent) => false,
        Err(e) => {
            tracing::warn!(error = %e, "failed to query startup registration");
            false
        }
    }
}

pub fn set_run_at_startup(
    registry: &dyn StartupRegistry,
    exe: &str,
    enable: bool,
) -> Result<(), StartupError> {
    if enable {
        registry.write(exe)?;
    } else {
        registry.remove()?;
    }
    tracing::info!(enable, exe, "startup registration updated");
    Ok(())
}

/// Platform default registry.
pub fn default_registry() -> Box<dyn StartupRegistry> {
    #[cfg(target_os = "windows")]
    {
        Box::new(RunKeyRegistry::new(APP_NAME))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(UnsupportedRegistry)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRegistry;

impl StartupRegistry for UnsupportedRegistry {
    fn read(&self) -> Result<RegistryValue, StartupError> {
        Ok(RegistryValue::Absent)
    }

    fn write(&self, _value: &str) -> Result<(), StartupError> {
        Err(StartupError::Unsupported)
    }

    fn remove(&self) -> Result<(), StartupError> {
        Ok(())
    }
}

#[cfg(target_os = "windows")]
pub use win::RunKeyRegistry;

#[cfg(target_os = "windows")]
mod win {
    use super::{RegistryValue, StartupError, StartupRegistry, RUN_KEY};
    use windows::core::HSTRING;
    use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, WIN32_ERROR};
    use windows::Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE, REG_SAM_FLAGS, REG_SZ,
        REG_VALUE_TYPE,
    };

    /// `HKCU\Software\Microsoft\Windows\CurrentVersion\Run\<name>`.
    pub struct RunKeyRegistry {
        name: HSTRING,
    }

    impl RunKeyRegistry {
        pub fn new(name: &str) -> Self {
            Self {
                name: HSTRING::from(name),
            }
        }
    }

    struct OpenKey(HKEY);

    impl Drop for OpenKey {
        fn drop(&mut self) {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }

    fn check(status: WIN32_ERROR, what: &str) -> Result<(), StartupError> {
        if status.is_ok() {
            Ok(())
        } else {
            Err(StartupError::Registry(format!("{what}: error {}", status.0)))
        }
    }

    fn open(access: REG_SAM_FLAGS) -> Result<OpenKey, StartupError> {
        let mut key = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                &HSTRING::from(RUN_KEY),
                0,
                access,
                &mut key,
            )
        };
        check(status, "open Run key")?;
        Ok(OpenKey(key))
    }

    impl StartupRegistry for RunKeyRegistry {
        fn read(&self) -> Result<RegistryValue, StartupError> {
            let key = match open(KEY_QUERY_VALUE) {
                Ok(key) => key,
                Err(_) => return Ok(RegistryValue::Absent),
            };
            let mut kind = REG_VALUE_TYPE::default();
            let mut len = 0u32;
            let status = unsafe {
                RegQueryValueExW(
                    key.0,
                    &self.name,
                    None,
                    Some(&mut kind as *mut _),
                    None,
                    Some(&mut len as *mut _),
                )
            };
            if status == ERROR_FILE_NOT_FOUND {
                return Ok(RegistryValue::Absent);
            }
            check(status, "query value size")?;
            if kind != REG_SZ {
                return Ok(RegistryValue::Absent);
            }

            let mut buf = vec![0u16; (len as usize).div_ceil(2)];
            let status = unsafe {
                RegQueryValueExW(
                    key.0,
                    &self.name,
                    None,
                    None,
                    Some(buf.as_mut_ptr().cast()),
                    Some(&mut len as *mut _),
                )
            };
            check(status, "query value")?;
            buf.truncate(len as usize / 2);
            while buf.last() == Some(&0) {
                buf.pop();
            }
            Ok(RegistryValue::Present(String::from_utf16_lossy(&buf)))
        }

        fn write(&self, value: &str) -> Result<(), StartupError> {
            let key = open(KEY_SET_VALUE)?;
            let wide: Vec<u16> = value.encode_utf16().chain(std::iter::once(0)).collect();
            let bytes: Vec<u8> = wide.iter().flat_map(|c| c.to_le_bytes()).collect();
            let status = unsafe { RegSetValueExW(key.0, &self.name, 0, REG_SZ, Some(&bytes)) };
            check(status, "set value")
        }

        fn remove(&self) -> Result<(), StartupError> {
            let key = open(KEY_SET_VALUE)?;
            let status = unsafe { RegDeleteValueW(key.0, &self.name) };
            if status == ERROR_FILE_NOT_FOUND {
                return Ok(());
            }
            check(status, "delete value")
        }
    }
}
