//! Network profile: association, security and addressing settings.
//!
//! The module keeps its configuration in a "current profile" that can be
//! saved to and loaded from one of two flash slots. The host keeps a
//! [`NetworkProfile`] mirror of what it staged, since the module offers no
//! cheap way to read settings back.
//!
//! # Staged versus applied addressing
//!
//! Static IP and DNS settings only take effect while associated with DHCP
//! off. The driver holds them back until then:
//!
//! ```text
//!                    │ DHCP on           │ DHCP off
//!   ─────────────────┼───────────────────┼──────────────────────
//!   associated       │ staged            │ sent now (NSET/DNSSET)
//!   not associated   │ staged            │ staged
//! ```
//!
//! Staged values are pushed as soon as they become effective: when DHCP is
//! switched off while associated, or right before an association
//! ([`Module::associate`] or enabling the connection manager) with DHCP off.
//!
//! Secrets (WPA passphrase, WEP key) are accepted by the setters but never
//! stored on the host.

#![deny(unsafe_code)]

use core::net::Ipv4Addr;
use core::str::FromStr;

use heapless::String;

use crate::command::{CommandEngine, OrEmpty, Reply};
use crate::error::Error;
use crate::module::Module;
use crate::ncm::{AutoAssociation, AutoTarget, NcmActivation, NcmParams, RetryLimits};

mod report;
mod security;
mod timing;

pub use security::{Security, WepAuth};
pub use timing::{TimingParam, TimingParams};

#[cfg(test)]
mod tests;

/// Longest SSID.
pub const MAX_SSID_LEN: usize = 32;

/// Longest WPA/WEP passphrase.
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Longest DHCP or auto-connect host name.
pub const MAX_HOSTNAME_LEN: usize = 64;

/// A network name.
pub type Ssid = String<MAX_SSID_LEN>;

/// A host name.
pub type HostName = String<MAX_HOSTNAME_LEN>;

pub(crate) fn to_ssid(text: &str) -> Result<Ssid, Error> {
    bounded(text)
}

pub(crate) fn to_host_name(text: &str) -> Result<HostName, Error> {
    bounded(text)
}

fn bounded<const N: usize>(text: &str) -> Result<String<N>, Error> {
    if text.is_empty() {
        return Err(Error::InvalidParameter);
    }
    String::try_from(text).map_err(|_| Error::InvalidParameter)
}

fn check_passphrase(text: &str) -> Result<(), Error> {
    if text.is_empty() || text.len() > MAX_PASSPHRASE_LEN {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// Access point MAC address, written `12:34:56:78:9a:bc` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bssid(pub [u8; 6]);

impl core::fmt::Display for Bssid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for Bssid {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let mut bytes = [0u8; 6];
        let mut parts = text.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or(Error::InvalidParameter)?;
            if part.len() != 2 {
                return Err(Error::InvalidParameter);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidParameter)?;
        }
        if parts.next().is_some() {
            return Err(Error::InvalidParameter);
        }
        Ok(Bssid(bytes))
    }
}

/// One of the two flash profile slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSlot {
    /// Slot 0.
    Zero = 0,
    /// Slot 1.
    One = 1,
}

impl TryFrom<u8> for ProfileSlot {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(ProfileSlot::Zero),
            1 => Ok(ProfileSlot::One),
            _ => Err(Error::InvalidParameter),
        }
    }
}

/// Address, netmask and gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpConfig {
    /// Interface address.
    pub address: Ipv4Addr,
    /// Subnet mask.
    pub netmask: Ipv4Addr,
    /// Default gateway.
    pub gateway: Ipv4Addr,
}

impl IpConfig {
    /// Picks the `a.b.c.d: m.m.m.m: g.g.g.g` line out of an association or
    /// DHCP reply.
    pub fn from_reply(reply: &Reply) -> Option<IpConfig> {
        reply.lines().find_map(|line| {
            let mut parts = line.split(':').map(str::trim);
            let address = parts.next()?.parse().ok()?;
            let netmask = parts.next()?.parse().ok()?;
            let gateway = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            Some(IpConfig {
                address,
                netmask,
                gateway,
            })
        })
    }
}

/// DNS servers used while DHCP is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsServers {
    /// Primary server.
    pub primary: Ipv4Addr,
    /// Optional fallback.
    pub secondary: Option<Ipv4Addr>,
}

/// Options for [`Module::associate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociateOptions {
    /// Only join this access point.
    pub bssid: Option<Bssid>,
    /// Only join on this channel. 0 means any channel.
    pub channel: u8,
    /// With several candidates, pick the strongest signal instead of an
    /// arbitrary one.
    pub best_rssi: bool,
}

impl Default for AssociateOptions {
    fn default() -> Self {
        Self {
            bssid: None,
            channel: 0,
            best_rssi: true,
        }
    }
}

/// The addressing configuration that applies on the next association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing<'a> {
    /// Lease from DHCP.
    Dhcp {
        /// Host name sent with the DHCP request.
        hostname: Option<&'a str>,
    },
    /// Static configuration, as far as it has been set.
    Static {
        /// Address, netmask and gateway.
        ip: Option<&'a IpConfig>,
        /// DNS servers.
        dns: Option<&'a DnsServers>,
    },
}

/// Host mirror of the staged module configuration.
#[derive(Debug, Clone, Default)]
pub struct NetworkProfile {
    pub(crate) wep_auth: Option<WepAuth>,
    pub(crate) security: Option<Security>,
    pub(crate) psk_ssid: Option<Ssid>,
    pub(crate) auto_association: Option<AutoAssociation>,
    pub(crate) dhcp: bool,
    pub(crate) hostname: Option<HostName>,
    pub(crate) static_ip: Option<IpConfig>,
    pub(crate) static_ip_pending: bool,
    pub(crate) dns: Option<DnsServers>,
    pub(crate) dns_pending: bool,
    pub(crate) auto_target: Option<AutoTarget>,
    pub(crate) ncm: NcmActivation,
    pub(crate) ncm_params: NcmParams,
    pub(crate) timing: TimingParams,
}

impl NetworkProfile {
    /// WEP authentication mode, if set through this driver.
    pub fn wep_auth(&self) -> Option<WepAuth> {
        self.wep_auth
    }

    /// Security restriction, if set through this driver.
    pub fn security(&self) -> Option<Security> {
        self.security
    }

    /// SSID the PSK was last precomputed for.
    pub fn psk_ssid(&self) -> Option<&str> {
        self.psk_ssid.as_deref()
    }

    /// Staged connection manager association target.
    pub fn auto_association(&self) -> Option<&AutoAssociation> {
        self.auto_association.as_ref()
    }

    /// Staged connection manager connection target.
    pub fn auto_target(&self) -> Option<&AutoTarget> {
        self.auto_target.as_ref()
    }

    /// `true` when DHCP is on.
    pub fn dhcp(&self) -> bool {
        self.dhcp
    }

    /// DHCP host name.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Staged static configuration.
    pub fn static_ip(&self) -> Option<&IpConfig> {
        self.static_ip.as_ref()
    }

    /// `true` when the static configuration has not reached the module yet.
    pub fn static_ip_pending(&self) -> bool {
        self.static_ip_pending
    }

    /// Staged DNS servers.
    pub fn dns(&self) -> Option<&DnsServers> {
        self.dns.as_ref()
    }

    /// `true` when the DNS servers have not reached the module yet.
    pub fn dns_pending(&self) -> bool {
        self.dns_pending
    }

    /// Last connection manager activation sent.
    pub fn ncm_activation(&self) -> &NcmActivation {
        &self.ncm
    }

    /// Connection manager parameter mirror.
    pub fn ncm_params(&self) -> &NcmParams {
        &self.ncm_params
    }

    /// `ATS` parameter mirror.
    pub fn timing(&self) -> &TimingParams {
        &self.timing
    }

    /// Which addressing configuration is in force. DHCP and static
    /// addressing are mutually exclusive.
    pub fn addressing(&self) -> Addressing<'_> {
        if self.dhcp {
            Addressing::Dhcp {
                hostname: self.hostname(),
            }
        } else {
            Addressing::Static {
                ip: self.static_ip.as_ref(),
                dns: self.dns.as_ref(),
            }
        }
    }

    /// Retry bounds for the connection manager mirror.
    pub fn retry_limits(&self) -> RetryLimits {
        RetryLimits::resolve(
            self.ncm_params.l3_connect_retry_count,
            self.timing.get(TimingParam::L4RetryCount),
            TimingParam::L4RetryCount.default_value(),
        )
    }

    pub(crate) fn check_ncm_ready(&self, associate_only: bool) -> Result<(), Error> {
        if self.auto_association.is_none() {
            return Err(Error::IncompleteProfile);
        }
        if !associate_only && self.auto_target.is_none() {
            return Err(Error::IncompleteProfile);
        }
        Ok(())
    }
}

impl<E: CommandEngine> Module<E> {
    /// Sets the WEP authentication mode.
    pub fn set_auth(&mut self, auth: WepAuth) -> Result<(), Error> {
        self.command(format_args!("AT+WAUTH={}", auth as u8))?;
        self.profile.wep_auth = Some(auth);
        Ok(())
    }

    /// Restricts the accepted security modes.
    pub fn set_security(&mut self, security: Security) -> Result<(), Error> {
        self.command(format_args!("AT+WSEC={}", security.bits()))?;
        self.profile.security = Some(security);
        Ok(())
    }

    /// Sets the WPA/WPA2 passphrase.
    ///
    /// The passphrase is sent unescaped; a `"` inside it breaks the request.
    pub fn set_wpa_passphrase(&mut self, passphrase: &str) -> Result<(), Error> {
        check_passphrase(passphrase)?;
        self.command_secret(format_args!("AT+WWPA=\"{}\"", passphrase))?;
        Ok(())
    }

    /// Sets the WEP key.
    pub fn set_wep_passphrase(&mut self, passphrase: &str) -> Result<(), Error> {
        check_passphrase(passphrase)?;
        self.command_secret(format_args!("AT+WWEP1={}", passphrase))?;
        Ok(())
    }

    /// Sets the WPA passphrase and precomputes the PSK for `ssid`.
    ///
    /// Associating with another SSID later recomputes the PSK in the module.
    pub fn set_psk_passphrase(&mut self, ssid: &str, passphrase: &str) -> Result<(), Error> {
        let ssid = to_ssid(ssid)?;
        check_passphrase(passphrase)?;
        self.command_secret(format_args!("AT+WPAPSK=\"{}\",\"{}\"", ssid, passphrase))?;
        self.profile.psk_ssid = Some(ssid);
        Ok(())
    }

    /// Joins a network.
    ///
    /// Staged static addressing is pushed first when DHCP is off. On
    /// success the address configuration reported by the module is
    /// available through [`Module::ip_config`].
    pub fn associate(&mut self, ssid: &str, options: AssociateOptions) -> Result<(), Error> {
        let ssid = to_ssid(ssid)?;
        self.push_staged_addressing()?;

        let reply = self.command(format_args!(
            "AT+WA=\"{}\",{},{},{}",
            ssid,
            OrEmpty(options.bssid),
            options.channel,
            options.best_rssi as u8
        ))?;

        self.associated = true;
        self.ip_config = IpConfig::from_reply(&reply).or(match self.profile.addressing() {
            Addressing::Static { ip, .. } => ip.copied(),
            Addressing::Dhcp { .. } => None,
        });
        info!("associated with {}", ssid.as_str());
        Ok(())
    }

    /// Leaves the current network. Every open connection is dropped.
    pub fn disassociate(&mut self) -> Result<(), Error> {
        self.command(format_args!("AT+WD"))?;
        self.link_down();
        Ok(())
    }

    /// Switches DHCP on or off and optionally sets the DHCP host name.
    ///
    /// The module forgets any current lease. When associated it requests a
    /// new lease right away (`enable`) or falls back to the static
    /// configuration, which is pushed first if staged.
    pub fn set_dhcp(&mut self, enable: bool, hostname: Option<&str>) -> Result<(), Error> {
        let hostname = hostname.map(to_host_name).transpose()?;
        let reply = match &hostname {
            Some(name) => self.command(format_args!("AT+NDHCP={},{}", enable as u8, name))?,
            None => self.command(format_args!("AT+NDHCP={}", enable as u8))?,
        };

        self.profile.dhcp = enable;
        if hostname.is_some() {
            self.profile.hostname = hostname;
        }
        if !self.associated {
            return Ok(());
        }

        if enable {
            self.ip_config = IpConfig::from_reply(&reply);
            debug!("dhcp lease requested");
        } else {
            self.push_staged_addressing()?;
            self.ip_config = self.profile.static_ip;
            debug!("static addressing applied");
        }
        Ok(())
    }

    /// Sets the static address configuration.
    ///
    /// Sent immediately only while associated with DHCP off; otherwise the
    /// value is staged and pushed once it becomes effective. A rejected
    /// immediate update leaves the previous configuration in place.
    pub fn set_static_ip(&mut self, config: IpConfig) -> Result<(), Error> {
        if self.associated && !self.profile.dhcp {
            self.push_static_ip(config)?;
            self.profile.static_ip = Some(config);
            self.ip_config = Some(config);
        } else {
            self.profile.static_ip = Some(config);
            self.profile.static_ip_pending = true;
            debug!("static ip staged");
        }
        Ok(())
    }

    /// Sets the DNS servers used while DHCP is off.
    ///
    /// Follows the same staging rule as [`Module::set_static_ip`].
    pub fn set_dns(&mut self, servers: DnsServers) -> Result<(), Error> {
        if self.associated && !self.profile.dhcp {
            self.push_dns(servers)?;
            self.profile.dns = Some(servers);
        } else {
            self.profile.dns = Some(servers);
            self.profile.dns_pending = true;
            debug!("dns staged");
        }
        Ok(())
    }

    /// Writes the current settings to a flash slot.
    pub fn save_profile(&mut self, slot: ProfileSlot) -> Result<(), Error> {
        self.command(format_args!("AT&W{}", slot as u8))?;
        Ok(())
    }

    /// Replaces the current settings with a flash slot.
    ///
    /// The host cannot see what was loaded, so the profile mirror goes back
    /// to its defaults.
    pub fn load_profile(&mut self, slot: ProfileSlot) -> Result<(), Error> {
        self.command(format_args!("ATZ{}", slot as u8))?;
        self.profile = NetworkProfile::default();
        self.ncm.set_limits(self.profile.retry_limits());
        warn!("profile {} loaded, host mirror reset", slot as u8);
        Ok(())
    }

    /// Picks the slot loaded on power-up and reset.
    pub fn set_default_profile(&mut self, slot: ProfileSlot) -> Result<(), Error> {
        self.command(format_args!("AT&Y{}", slot as u8))?;
        Ok(())
    }

    /// Sets a timeout or retry parameter.
    ///
    /// Values outside [`TimingParam::range`] fail with
    /// [`Error::InvalidParameter`] and are not sent.
    pub fn set_param(&mut self, param: TimingParam, value: u16) -> Result<(), Error> {
        if !param.range().contains(&value) {
            return Err(Error::InvalidParameter);
        }
        self.command(format_args!("ATS{}={}", param.id(), value))?;
        self.profile.timing.set(param, value);
        self.ncm.set_limits(self.profile.retry_limits());
        Ok(())
    }

    /// The staged configuration.
    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub(crate) fn push_staged_addressing(&mut self) -> Result<(), Error> {
        if self.profile.dhcp {
            return Ok(());
        }
        if let (true, Some(config)) = (self.profile.static_ip_pending, self.profile.static_ip) {
            self.push_static_ip(config)?;
        }
        if let (true, Some(servers)) = (self.profile.dns_pending, self.profile.dns) {
            self.push_dns(servers)?;
        }
        Ok(())
    }

    fn push_static_ip(&mut self, config: IpConfig) -> Result<(), Error> {
        self.command(format_args!(
            "AT+NSET={},{},{}",
            config.address, config.netmask, config.gateway
        ))?;
        self.profile.static_ip_pending = false;
        debug!("static ip pushed");
        Ok(())
    }

    fn push_dns(&mut self, servers: DnsServers) -> Result<(), Error> {
        match servers.secondary {
            Some(secondary) => {
                self.command(format_args!("AT+DNSSET={},{}", servers.primary, secondary))?
            }
            None => self.command(format_args!("AT+DNSSET={}", servers.primary))?,
        };
        self.profile.dns_pending = false;
        debug!("dns pushed");
        Ok(())
    }
}
