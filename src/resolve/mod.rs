//! Clock synchronisation and name lookup.

#![deny(unsafe_code)]

use core::net::Ipv4Addr;
use core::num::NonZeroU32;

use crate::command::CommandEngine;
use crate::error::Error;
use crate::module::Module;

/// Options for [`Module::time_sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSyncOptions {
    /// Resync every `interval` seconds after the first sync. `None` syncs
    /// once.
    pub interval: Option<NonZeroU32>,
    /// Seconds to wait for the server. Defaults to 10.
    pub timeout_secs: u8,
}

impl Default for TimeSyncOptions {
    fn default() -> Self {
        Self {
            interval: None,
            timeout_secs: 10,
        }
    }
}

impl<E: CommandEngine> Module<E> {
    /// Sets the module clock from an NTP server.
    ///
    /// The first sync happens before this returns. Periodic resyncs run
    /// inside the module; no further requests are issued for them.
    pub fn time_sync(&mut self, server: Ipv4Addr, options: TimeSyncOptions) -> Result<(), Error> {
        if options.timeout_secs == 0 {
            return Err(Error::InvalidParameter);
        }

        match options.interval {
            Some(interval) => self.command(format_args!(
                "AT+NTIMESYNC=1,{},{},1,{}",
                server, options.timeout_secs, interval
            ))?,
            None => self.command(format_args!(
                "AT+NTIMESYNC=1,{},{},0",
                server, options.timeout_secs
            ))?,
        };

        self.time_synced = true;
        info!("clock synchronised");
        Ok(())
    }

    /// Stops periodic resyncs. The clock keeps its current value.
    pub fn stop_time_sync(&mut self) -> Result<(), Error> {
        self.command(format_args!("AT+NTIMESYNC=0"))?;
        Ok(())
    }

    /// Resolves `name` through the module's DNS client.
    ///
    /// A failed lookup returns `0.0.0.0`, which cannot be told apart from a
    /// server that really answered `0.0.0.0`. Losing the link is still an
    /// error.
    pub fn dns_lookup(&mut self, name: &str) -> Result<Ipv4Addr, Error> {
        if name.is_empty() {
            return Err(Error::InvalidParameter);
        }

        match self.command(format_args!("AT+DNSLOOKUP={}", name)) {
            Ok(reply) => reply
                .value("IP")
                .and_then(|ip| ip.parse().ok())
                .ok_or(Error::MalformedReply),
            Err(Error::Rejected(code)) => {
                debug!("lookup of {} failed ({})", name, code);
                Ok(Ipv4Addr::UNSPECIFIED)
            }
            Err(err) => Err(err),
        }
    }
}
