//! TLS sessions and the CA certificate catalog.
//!
//! CA certificates live inside the module, either in flash (survives a
//! reset) or in RAM. The host uploads them once as DER blobs and afterwards
//! refers to them by name. The DER bytes are not kept on the host; the
//! [`CertificateStore`] only remembers what was uploaded through this driver.
//!
//! ```text
//!   add_cert("ca1", Flash, der) ──▶ AT+TCERTADD=ca1,0,<len>,0  + ESC W <der>
//!   enable_tls(cid, "ca1")      ──▶ AT+SSLOPEN=<cid>,ca1
//!                                     │
//!                          OK ◀───────┴───────▶ ERROR
//!                    cid now TLS          module closed the cid,
//!                                         Error::HandshakeFailed
//! ```
//!
//! The peer chain is validated against the named CA only. There is no
//! hostname check, and validity windows are only meaningful once the module
//! clock has been set (see [`Module::time_sync`]).

#![deny(unsafe_code)]

use heapless::{String, Vec};

use crate::command::CommandEngine;
use crate::connection::Cid;
use crate::error::Error;
use crate::module::Module;

/// Longest certificate name the module accepts.
pub const MAX_CERT_NAME_LEN: usize = 32;

/// Number of certificates the host-side catalog can track.
pub const MAX_CERTS: usize = 8;

/// Largest DER blob a single upload can carry.
pub const MAX_CERT_LEN: usize = u16::MAX as usize;

/// A certificate name.
pub type CertName = String<MAX_CERT_NAME_LEN>;

/// Where the module keeps a certificate. The discriminants are wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    /// Persistent storage.
    Flash = 0,
    /// Lost on reset.
    Ram = 1,
}

/// Catalog entry for an uploaded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    name: CertName,
    class: StorageClass,
    len: u16,
}

impl Certificate {
    /// Name the certificate was uploaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage class it was uploaded to.
    pub fn class(&self) -> StorageClass {
        self.class
    }

    /// Size of the DER blob in bytes.
    pub fn len(&self) -> u16 {
        self.len
    }

    /// Always `false`: empty uploads are refused.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Certificates uploaded through this driver.
#[derive(Debug, Default)]
pub struct CertificateStore {
    certs: Vec<Certificate, MAX_CERTS>,
}

impl CertificateStore {
    /// Creates an empty catalog.
    pub const fn new() -> Self {
        Self { certs: Vec::new() }
    }

    /// Number of tracked certificates.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// `true` when nothing was uploaded.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// Looks up a certificate by name.
    pub fn get(&self, name: &str) -> Option<&Certificate> {
        self.certs.iter().find(|cert| cert.name == name)
    }

    /// Iterates over the catalog.
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certs.iter()
    }

    fn has_room_for(&self, name: &str, class: StorageClass) -> bool {
        !self.certs.is_full() || self.position(name, class).is_some()
    }

    fn position(&self, name: &str, class: StorageClass) -> Option<usize> {
        self.certs
            .iter()
            .position(|cert| cert.name == name && cert.class == class)
    }

    fn upsert(&mut self, cert: Certificate) -> Result<(), Error> {
        match self.position(&cert.name, cert.class) {
            Some(index) => {
                self.certs[index] = cert;
                Ok(())
            }
            None => self.certs.push(cert).map_err(|_| Error::BufferOverflow),
        }
    }

    fn remove(&mut self, name: &str) {
        self.certs.retain(|cert| cert.name != name);
    }
}

fn cert_name(name: &str) -> Result<CertName, Error> {
    if name.is_empty() {
        return Err(Error::InvalidParameter);
    }
    CertName::try_from(name).map_err(|_| Error::InvalidParameter)
}

impl<E: CommandEngine> Module<E> {
    /// Uploads a CA certificate in DER form.
    ///
    /// Re-using a name replaces the previous certificate of the same class.
    /// Fails locally with [`Error::InvalidParameter`] for an empty or
    /// oversized blob or name, and with [`Error::BufferOverflow`] when the
    /// catalog is full.
    pub fn add_cert(&mut self, name: &str, class: StorageClass, der: &[u8]) -> Result<(), Error> {
        let name = cert_name(name)?;
        if der.is_empty() || der.len() > MAX_CERT_LEN {
            return Err(Error::InvalidParameter);
        }
        if !self.certs.has_room_for(&name, class) {
            warn!("certificate catalog full");
            return Err(Error::BufferOverflow);
        }

        self.command_with_payload(
            format_args!("AT+TCERTADD={},0,{},{}", name, der.len(), class as u8),
            der,
        )?;

        let len = der.len() as u16;
        debug!("certificate {} stored ({} bytes)", name.as_str(), len);
        self.certs.upsert(Certificate { name, class, len })
    }

    /// Deletes a certificate from the module.
    ///
    /// A certificate that validated a live TLS connection is refused with
    /// [`Error::CertificateInUse`]. An unknown name is the module's call and
    /// comes back as [`Error::Rejected`].
    pub fn del_cert(&mut self, name: &str) -> Result<(), Error> {
        let name = cert_name(name)?;
        if self
            .registry
            .iter()
            .any(|connection| connection.tls_certificate() == Some(name.as_str()))
        {
            return Err(Error::CertificateInUse);
        }

        self.command(format_args!("AT+TCERTDEL={}", name))?;
        self.certs.remove(&name);
        debug!("certificate {} deleted", name.as_str());
        Ok(())
    }

    /// Upgrades an open connection to TLS, validating the peer against the
    /// CA stored as `certificate`.
    ///
    /// The cid must be open and not already secured, otherwise
    /// [`Error::InvalidHandle`] is returned without a request. When the
    /// handshake fails the module closes the connection: the cid is dropped
    /// and [`Error::HandshakeFailed`] is returned.
    pub fn enable_tls(&mut self, cid: Cid, certificate: &str) -> Result<(), Error> {
        let name = cert_name(certificate)?;
        match self.registry.get(cid) {
            Some(connection) if connection.is_open() && connection.tls_certificate().is_none() => {}
            _ => return Err(Error::InvalidHandle),
        }
        if !self.time_synced {
            warn!("TLS on cid {} before time sync, certificate dates unchecked", cid);
        }

        match self.command(format_args!("AT+SSLOPEN={},{}", cid, name)) {
            Ok(_) => {
                if let Some(connection) = self.registry.get_mut(cid) {
                    connection.set_tls(name);
                }
                info!("cid {} secured", cid);
                Ok(())
            }
            Err(Error::Rejected(code)) => {
                self.registry.remove(cid);
                warn!("TLS handshake on cid {} failed ({})", cid, code);
                Err(Error::HandshakeFailed)
            }
            Err(err) => Err(err),
        }
    }
}
