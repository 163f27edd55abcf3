use core::ops::{BitOr, BitOrAssign};

/// WEP authentication mode (`AT+WAUTH`). Use [`WepAuth::None`] for WPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WepAuth {
    /// No WEP authentication.
    None = 0,
    /// Open system.
    Open = 1,
    /// Shared key.
    Shared = 2,
}

/// Accepted security modes (`AT+WSEC`).
///
/// [`Security::AUTO`] lets the module detect the mode. Any union of the other
/// flags restricts association to those modes.
///
/// # Examples
///
/// ```rust
/// use gs_wifi::profile::Security;
///
/// let sec = Security::WPA2_PSK | Security::WPA2_ENTERPRISE;
/// assert_eq!(sec.bits(), 40);
/// assert!(Security::WPA_PSK.contains(Security::WPA1_PSK));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Security(u8);

impl Security {
    /// Autodetect.
    pub const AUTO: Security = Security(0);
    /// Open network.
    pub const OPEN: Security = Security(1);
    /// WEP.
    pub const WEP: Security = Security(2);
    /// WPA personal.
    pub const WPA1_PSK: Security = Security(4);
    /// WPA2 personal.
    pub const WPA2_PSK: Security = Security(8);
    /// WPA enterprise.
    pub const WPA1_ENTERPRISE: Security = Security(16);
    /// WPA2 enterprise.
    pub const WPA2_ENTERPRISE: Security = Security(32);
    /// WPA2 with mixed AES and TKIP ciphers.
    pub const WPA2_AES_TKIP: Security = Security(64);

    /// WPA or WPA2 personal.
    pub const WPA_PSK: Security = Security(Self::WPA1_PSK.0 | Self::WPA2_PSK.0);
    /// WPA or WPA2 enterprise.
    pub const WPA_ENTERPRISE: Security =
        Security(Self::WPA1_ENTERPRISE.0 | Self::WPA2_ENTERPRISE.0);

    const ALL_BITS: u8 = 0x7F;

    /// Wire value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Rebuilds a bitset from its wire value. Unknown bits are refused.
    pub const fn from_bits(bits: u8) -> Option<Security> {
        if bits & !Self::ALL_BITS == 0 {
            Some(Security(bits))
        } else {
            None
        }
    }

    /// `true` when every flag of `other` is set in `self`.
    pub const fn contains(self, other: Security) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` for [`Security::AUTO`].
    pub const fn is_auto(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Security {
    type Output = Security;

    fn bitor(self, rhs: Security) -> Security {
        Security(self.0 | rhs.0)
    }
}

impl BitOrAssign for Security {
    fn bitor_assign(&mut self, rhs: Security) {
        self.0 |= rhs.0;
    }
}
