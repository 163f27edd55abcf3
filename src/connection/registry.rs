use heapless::FnvIndexMap;

use super::{Cid, Connection, MAX_CONNECTIONS, Owner};
use crate::error::Error;

/// Host-side mirror of the module's allocated connection slots.
///
/// Keyed by cid, so two live entries can never share one. The map holds as
/// many entries as the module has slots; capacity is enforced by the module
/// and never pre-checked here.
#[derive(Debug, Default)]
pub struct Registry {
    entries: FnvIndexMap<Cid, Connection, MAX_CONNECTIONS>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
        }
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no connection is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when `cid` is a tracked open connection.
    pub fn contains(&self, cid: Cid) -> bool {
        self.entries.contains_key(&cid)
    }

    /// Looks up a connection.
    pub fn get(&self, cid: Cid) -> Option<&Connection> {
        self.entries.get(&cid)
    }

    /// Iterates over open connections.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.entries.values()
    }

    /// The connection the connection manager currently owns, if any.
    pub fn ncm_connection(&self) -> Option<&Connection> {
        self.iter().find(|connection| connection.owner() == Owner::Ncm)
    }

    pub(crate) fn get_mut(&mut self, cid: Cid) -> Option<&mut Connection> {
        self.entries.get_mut(&cid)
    }

    /// Records an open connection. Returns the entry it replaced, if the
    /// module reused a slot that was still tracked.
    pub(crate) fn insert(&mut self, connection: Connection) -> Result<Option<Connection>, Error> {
        let cid = connection.cid();
        if !cid.is_valid() || !connection.is_open() {
            return Err(Error::InvalidHandle);
        }
        let replaced = self
            .entries
            .insert(cid, connection)
            .map_err(|_| Error::BufferOverflow)?;
        Ok(replaced.map(Connection::close))
    }

    /// Removes a connection and hands it back closed.
    pub(crate) fn remove(&mut self, cid: Cid) -> Option<Connection> {
        self.entries.remove(&cid).map(Connection::close)
    }

    /// Drops every entry. Returns how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
