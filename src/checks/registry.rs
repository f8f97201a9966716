//! Registry value checks.
//!
//! Reading is behind [`RegistryReader`] so the comparison rules can be
//! exercised without a live registry. The Windows reader uses `winreg`.

use std::fmt;
use std::io;

use crate::issues::RegistryIssue;

/// Top-level registry hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ClassesRoot => "HKEY_CLASSES_ROOT",
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
            Self::Users => "HKEY_USERS",
            Self::CurrentConfig => "HKEY_CURRENT_CONFIG",
        };
        f.write_str(name)
    }
}

/// Split `HKLM\Software\Foo` into its hive and subkey.
///
/// Accepts long and short hive names in any case, with `\` or `/` separators.
pub fn split_hive(path: &str) -> Option<(Hive, &str)> {
    let path = path.trim_start_matches(['\\', '/']);
    let (head, tail) = match path.find(['\\', '/']) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (path, ""),
    };

    let hive = match head.to_ascii_uppercase().as_str() {
        "HKEY_CLASSES_ROOT" | "HKCR" => Hive::ClassesRoot,
        "HKEY_CURRENT_USER" | "HKCU" => Hive::CurrentUser,
        "HKEY_LOCAL_MACHINE" | "HKLM" => Hive::LocalMachine,
        "HKEY_USERS" | "HKU" => Hive::Users,
        "HKEY_CURRENT_CONFIG" | "HKCC" => Hive::CurrentConfig,
        _ => return None,
    };

    Some((hive, tail.trim_end_matches(['\\', '/'])))
}

/// A value read from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    String(String),
    ExpandString(String),
    MultiString(Vec<String>),
    Dword(u32),
    Qword(u64),
    Binary(Vec<u8>),
}

impl RegistryValue {
    /// String form used for comparison. Binary data becomes `0A,FF,...`.
    pub fn normalized(&self) -> String {
        match self {
            Self::String(s) | Self::ExpandString(s) => s.clone(),
            Self::MultiString(parts) => parts.join(","),
            Self::Dword(v) => v.to_string(),
            Self::Qword(v) => v.to_string(),
            Self::Binary(bytes) => bytes
                .iter()
                .map(|b| hex::encode_upper([*b]))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    pub fn matches(&self, expected: &str) -> bool {
        let actual = self.normalized();
        match self {
            Self::Binary(_) => actual == expected.to_ascii_uppercase(),
            _ => actual.to_lowercase() == expected.to_lowercase(),
        }
    }
}

/// Read access to named registry values.
pub trait RegistryReader: Send + Sync {
    /// `Ok(None)` when the key or value does not exist. Other failures,
    /// such as insufficient privilege, are `Err`.
    fn read_value(&self, hive: Hive, key: &str, name: &str) -> io::Result<Option<RegistryValue>>;
}

/// Compare the live value against an entry.
///
/// An absent value equals the empty/null sentinel; a present value is
/// compared against the expected text. Read failures are a non-match
/// regardless of `should_match`.
pub fn compare(reader: &dyn RegistryReader, issue: &RegistryIssue) -> bool {
    let Some((hive, key)) = split_hive(&issue.registry_path) else {
        tracing::warn!(path = %issue.registry_path, "unknown registry hive");
        return false;
    };

    let actual = match reader.read_value(hive, key, &issue.registry_name) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                hive = %hive,
                key,
                name = %issue.registry_name,
                error = %e,
                "registry read failed, treating as non-match"
            );
            return false;
        }
    };

    let equal = match (&actual, issue.expected()) {
        (None, _) => issue.expects_absent(),
        (Some(_), None) => false,
        (Some(value), Some(expected)) => value.matches(expected),
    };

    equal == issue.should_match
}

#[cfg(windows)]
pub use self::windows_impl::WindowsRegistry;

#[cfg(windows)]
mod windows_impl {
    use std::io;

    use winreg::enums::{
        RegType, HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE,
        HKEY_USERS, KEY_READ,
    };
    use winreg::types::FromRegValue;
    use winreg::{RegKey, RegValue};

    use super::{Hive, RegistryReader, RegistryValue};

    /// The live Windows registry.
    pub struct WindowsRegistry;

    impl RegistryReader for WindowsRegistry {
        fn read_value(
            &self,
            hive: Hive,
            key: &str,
            name: &str,
        ) -> io::Result<Option<RegistryValue>> {
            let root = RegKey::predef(match hive {
                Hive::ClassesRoot => HKEY_CLASSES_ROOT,
                Hive::CurrentUser => HKEY_CURRENT_USER,
                Hive::LocalMachine => HKEY_LOCAL_MACHINE,
                Hive::Users => HKEY_USERS,
                Hive::CurrentConfig => HKEY_CURRENT_CONFIG,
            });

            let subkey = match root.open_subkey_with_flags(key, KEY_READ) {
                Ok(k) => k,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e),
            };

            match subkey.get_raw_value(name) {
                Ok(raw) => decode(raw).map(Some),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        }
    }

    fn decode(raw: RegValue) -> io::Result<RegistryValue> {
        let value = match raw.vtype {
            RegType::REG_SZ => RegistryValue::String(String::from_reg_value(&raw)?),
            RegType::REG_EXPAND_SZ => RegistryValue::ExpandString(String::from_reg_value(&raw)?),
            RegType::REG_MULTI_SZ => RegistryValue::MultiString(Vec::<String>::from_reg_value(&raw)?),
            RegType::REG_DWORD => match <[u8; 4]>::try_from(raw.bytes.as_slice()) {
                Ok(b) => RegistryValue::Dword(u32::from_le_bytes(b)),
                Err(_) => RegistryValue::Binary(raw.bytes),
            },
            RegType::REG_DWORD_BIG_ENDIAN => match <[u8; 4]>::try_from(raw.bytes.as_slice()) {
                Ok(b) => RegistryValue::Dword(u32::from_be_bytes(b)),
                Err(_) => RegistryValue::Binary(raw.bytes),
            },
            RegType::REG_QWORD => match <[u8; 8]>::try_from(raw.bytes.as_slice()) {
                Ok(b) => RegistryValue::Qword(u64::from_le_bytes(b)),
                Err(_) => RegistryValue::Binary(raw.bytes),
            },
            _ => RegistryValue::Binary(raw.bytes),
        };
        Ok(value)
    }
}
