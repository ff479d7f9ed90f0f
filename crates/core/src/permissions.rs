//! Asset permission bitmasks.
//!
//! Permissions use unix-style octal classes: the high digit applies to the
//! owning user, the middle digit to members of the asset's group, and the low
//! digit to everyone else (including anonymous callers). Within a digit,
//! `4` grants read, `2` grants write and `1` is carried as execute.

use crate::asset::Action;
use serde::{Deserialize, Serialize};
use std::fmt;

const READ_BIT: u16 = 0o4;
const WRITE_BIT: u16 = 0o2;
const EXECUTE_BIT: u16 = 0o1;

/// Permission class a principal falls into for a given asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionClass {
    User,
    Group,
    Other,
}

impl PermissionClass {
    fn shift(self) -> u16 {
        match self {
            Self::User => 6,
            Self::Group => 3,
            Self::Other => 0,
        }
    }
}

/// A 9-bit permission mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions(u16);

impl Permissions {
    /// Largest valid mask (`777`).
    pub const MAX: u16 = 0o777;

    /// Create from a raw mask, rejecting bits outside the three classes.
    pub fn new(bits: u16) -> crate::Result<Self> {
        if bits > Self::MAX {
            return Err(crate::Error::InvalidPermissions(format!(
                "mask {bits:o} exceeds {:o}",
                Self::MAX
            )));
        }
        Ok(Self(bits))
    }

    /// Parse an octal numeral such as `"644"`.
    pub fn from_octal(s: &str) -> crate::Result<Self> {
        let bits = u16::from_str_radix(s, 8)
            .map_err(|e| crate::Error::InvalidPermissions(format!("{s:?}: {e}")))?;
        Self::new(bits)
    }

    /// Raw mask.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Compact octal rendering, without a leading zero (`0o644` renders as `"644"`).
    pub fn to_octal(self) -> String {
        format!("{:o}", self.0)
    }

    fn class_bits(self, class: PermissionClass) -> u16 {
        (self.0 >> class.shift()) & 0o7
    }

    /// Whether `class` is allowed to perform `action`.
    pub fn allows(self, class: PermissionClass, action: Action) -> bool {
        let bit = match action {
            Action::Read => READ_BIT,
            Action::Write => WRITE_BIT,
        };
        self.class_bits(class) & bit != 0
    }

    /// Structured decomposition of the mask.
    pub fn unpack(self) -> UnpackedPermissions {
        let class = |c| {
            let bits = self.class_bits(c);
            ClassPermissions {
                read: bits & READ_BIT != 0,
                write: bits & WRITE_BIT != 0,
                execute: bits & EXECUTE_BIT != 0,
            }
        };
        UnpackedPermissions {
            user: class(PermissionClass::User),
            group: class(PermissionClass::Group),
            other: class(PermissionClass::Other),
        }
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({:03o})", self.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_octal())
    }
}

/// Flags for a single permission class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPermissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

/// Structured form of a permission mask, returned for `permFormat=json`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackedPermissions {
    pub user: ClassPermissions,
    pub group: ClassPermissions,
    pub other: ClassPermissions,
}

/// Requested rendering of the `permissions` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermFormat {
    /// Compact octal numeral.
    #[default]
    Octal,
    /// Structured decomposition.
    Json,
}

impl PermFormat {
    /// Interpret the `permFormat` query parameter. Anything but `json` is octal.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("json") => Self::Json,
            _ => Self::Octal,
        }
    }
}
