use serde::Serialize;

use crate::error::Error;

/// Connection manager tuning parameters (`AT+NCMAUTOCONF=<id>,<value>`).
///
/// Periods are in milliseconds and must be at least 1. Retry counts accept 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcmParam {
    /// How long the CPU waits between manager steps.
    CpuWaitPeriod = 0,
    /// Power save period. Not supported by the hardware.
    PowerSaveWaitPeriod = 1,
    /// Pause between scans of the last known channel.
    KnownChannelScanPeriod = 2,
    /// Pause between scans of a specific channel list. Not supported.
    SpecificChannelScanPeriod = 3,
    /// Pause between full channel scans.
    AllChannelScanPeriod = 4,
    /// Pause between L3 (address configuration) attempts.
    L3ConnectPeriod = 5,
    /// Scans of the last known channel before falling back to a full scan.
    KnownChannelScanRetryCount = 8,
    /// Scans of a specific channel list. Not supported.
    SpecificChannelScanRetryCount = 9,
    /// Full channel scans per association attempt.
    AllChannelScanRetryCount = 10,
    /// L3 attempts before the manager gives up on associating.
    L3ConnectRetryCount = 11,
}

impl NcmParam {
    /// Wire id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// `true` for the retry counts, which accept 0.
    pub const fn is_retry_count(self) -> bool {
        matches!(
            self,
            NcmParam::KnownChannelScanRetryCount
                | NcmParam::SpecificChannelScanRetryCount
                | NcmParam::AllChannelScanRetryCount
                | NcmParam::L3ConnectRetryCount
        )
    }

    pub(crate) fn validate(self, value: u16) -> Result<(), Error> {
        if value == 0 && !self.is_retry_count() {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}

/// Host mirror of the connection manager parameters, initialised with the
/// module defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
///
/// Each field mirrors the [`NcmParam`] of the same name.
pub struct NcmParams {
    /// [`NcmParam::CpuWaitPeriod`], in ms.
    pub cpu_wait_period: u16,
    /// [`NcmParam::PowerSaveWaitPeriod`], in ms.
    pub power_save_wait_period: u16,
    /// [`NcmParam::KnownChannelScanPeriod`], in ms.
    pub known_channel_scan_period: u16,
    /// [`NcmParam::SpecificChannelScanPeriod`], in ms.
    pub specific_channel_scan_period: u16,
    /// [`NcmParam::AllChannelScanPeriod`], in ms.
    pub all_channel_scan_period: u16,
    /// [`NcmParam::L3ConnectPeriod`], in ms.
    pub l3_connect_period: u16,
    /// [`NcmParam::KnownChannelScanRetryCount`].
    pub known_channel_scan_retry_count: u16,
    /// [`NcmParam::SpecificChannelScanRetryCount`].
    pub specific_channel_scan_retry_count: u16,
    /// [`NcmParam::AllChannelScanRetryCount`].
    pub all_channel_scan_retry_count: u16,
    /// [`NcmParam::L3ConnectRetryCount`].
    pub l3_connect_retry_count: u16,
}

impl NcmParams {
    /// Module default for [`NcmParam::L3ConnectRetryCount`].
    pub const DEFAULT_L3_CONNECT_RETRY_COUNT: u16 = 100;

    /// The staged value of `param`.
    pub fn get(&self, param: NcmParam) -> u16 {
        match param {
            NcmParam::CpuWaitPeriod => self.cpu_wait_period,
            NcmParam::PowerSaveWaitPeriod => self.power_save_wait_period,
            NcmParam::KnownChannelScanPeriod => self.known_channel_scan_period,
            NcmParam::SpecificChannelScanPeriod => self.specific_channel_scan_period,
            NcmParam::AllChannelScanPeriod => self.all_channel_scan_period,
            NcmParam::L3ConnectPeriod => self.l3_connect_period,
            NcmParam::KnownChannelScanRetryCount => self.known_channel_scan_retry_count,
            NcmParam::SpecificChannelScanRetryCount => self.specific_channel_scan_retry_count,
            NcmParam::AllChannelScanRetryCount => self.all_channel_scan_retry_count,
            NcmParam::L3ConnectRetryCount => self.l3_connect_retry_count,
        }
    }

    pub(crate) fn set(&mut self, param: NcmParam, value: u16) {
        let slot = match param {
            NcmParam::CpuWaitPeriod => &mut self.cpu_wait_period,
            NcmParam::PowerSaveWaitPeriod => &mut self.power_save_wait_period,
            NcmParam::KnownChannelScanPeriod => &mut self.known_channel_scan_period,
            NcmParam::SpecificChannelScanPeriod => &mut self.specific_channel_scan_period,
            NcmParam::AllChannelScanPeriod => &mut self.all_channel_scan_period,
            NcmParam::L3ConnectPeriod => &mut self.l3_connect_period,
            NcmParam::KnownChannelScanRetryCount => &mut self.known_channel_scan_retry_count,
            NcmParam::SpecificChannelScanRetryCount => &mut self.specific_channel_scan_retry_count,
            NcmParam::AllChannelScanRetryCount => &mut self.all_channel_scan_retry_count,
            NcmParam::L3ConnectRetryCount => &mut self.l3_connect_retry_count,
        };
        *slot = value;
    }
}

impl Default for NcmParams {
    fn default() -> Self {
        Self {
            cpu_wait_period: 1000,
            power_save_wait_period: 1000,
            known_channel_scan_period: 1000,
            specific_channel_scan_period: 1000,
            all_channel_scan_period: 1000,
            l3_connect_period: 1000,
            known_channel_scan_retry_count: 10,
            specific_channel_scan_retry_count: 10,
            all_channel_scan_retry_count: 10,
            l3_connect_retry_count: Self::DEFAULT_L3_CONNECT_RETRY_COUNT,
        }
    }
}

/// Retry bounds the host mirror applies to connection manager progress.
///
/// A configured count of 0 resolves to the module default, so both bounds
/// are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLimits {
    /// Failed association attempts before the manager stops.
    pub association: u16,
    /// Failed socket attempts before the manager settles for association.
    pub socket: u16,
}

impl RetryLimits {
    /// Builds the bounds from the configured L3 and L4 retry counts, with 0
    /// standing for the module default.
    pub fn resolve(l3_connect_retry_count: u16, l4_retry_count: u16, l4_default: u16) -> Self {
        let pick = |value: u16, default: u16| if value == 0 { default } else { value };
        Self {
            association: pick(
                l3_connect_retry_count,
                NcmParams::DEFAULT_L3_CONNECT_RETRY_COUNT,
            ),
            socket: pick(l4_retry_count, l4_default),
        }
    }
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self::resolve(0, 0, crate::profile::TimingParam::L4RetryCount.default_value())
    }
}
