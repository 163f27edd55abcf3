use core::ops::RangeInclusive;

/// Timeout and retry parameters set with `ATS<id>=<value>`.
///
/// Timeouts and periods are in units of 10 ms except [`TimingParam::ScanTime`],
/// which is in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingParam {
    /// Time allowed to establish the auto-connect network connection.
    AutoConnectTimeout = 0,
    /// Time allowed to associate in auto-connect mode.
    AutoAssociateTimeout = 1,
    /// Time allowed to establish a TCP client connection. 0 means the stack
    /// default of 75 s.
    TcpConnectTimeout = 2,
    /// Accepted but not implemented by the hardware.
    AssociationRetryCount = 3,
    /// How long auto-connect data is buffered before sending.
    NagleWaitTime = 4,
    /// Scan time per radio channel.
    ScanTime = 5,
    /// Pause between connection manager L4 retries.
    L4RetryPeriod = 6,
    /// Connection manager L4 retry count.
    L4RetryCount = 7,
}

impl TimingParam {
    /// Every parameter, in wire id order.
    pub const ALL: [TimingParam; 8] = [
        TimingParam::AutoConnectTimeout,
        TimingParam::AutoAssociateTimeout,
        TimingParam::TcpConnectTimeout,
        TimingParam::AssociationRetryCount,
        TimingParam::NagleWaitTime,
        TimingParam::ScanTime,
        TimingParam::L4RetryPeriod,
        TimingParam::L4RetryCount,
    ];

    /// Wire id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Values the module accepts.
    pub const fn range(self) -> RangeInclusive<u16> {
        match self {
            TimingParam::AutoConnectTimeout
            | TimingParam::NagleWaitTime
            | TimingParam::L4RetryPeriod => 1..=u16::MAX,
            TimingParam::ScanTime => 5..=16000,
            TimingParam::AutoAssociateTimeout
            | TimingParam::TcpConnectTimeout
            | TimingParam::AssociationRetryCount
            | TimingParam::L4RetryCount => 0..=u16::MAX,
        }
    }

    /// Factory value.
    pub const fn default_value(self) -> u16 {
        match self {
            TimingParam::AutoConnectTimeout => 1000,
            TimingParam::AutoAssociateTimeout => 500,
            TimingParam::TcpConnectTimeout => 500,
            TimingParam::AssociationRetryCount => 0,
            TimingParam::NagleWaitTime => 10,
            TimingParam::ScanTime => 150,
            TimingParam::L4RetryPeriod => 50,
            TimingParam::L4RetryCount => 20,
        }
    }
}

/// Host mirror of the `ATS` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingParams {
    values: [u16; TimingParam::ALL.len()],
}

impl TimingParams {
    /// The staged value of `param`.
    pub fn get(&self, param: TimingParam) -> u16 {
        self.values[param as usize]
    }

    pub(crate) fn set(&mut self, param: TimingParam, value: u16) {
        self.values[param as usize] = value;
    }
}

impl Default for TimingParams {
    fn default() -> Self {
        let mut values = [0; TimingParam::ALL.len()];
        for param in TimingParam::ALL {
            values[param as usize] = param.default_value();
        }
        Self { values }
    }
}
