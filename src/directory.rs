//! The address book: peers known in advance
//!
//! A small JSON file mapping addresses to display names and hostnames.
//! The dispatch loop consults it to name conversations; the UI lists its
//! contacts in the sidebar so the user can open a conversation before the
//! peer has ever sent anything.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// One address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Name shown in the sidebar and on conversation windows
    pub display_name: String,
    /// Hostname of the peer's machine
    pub hostname: String,
    /// Address messages to this contact are sent to
    pub address: IpAddr,
}

/// An address book backed by a JSON file.
///
/// The file holds a flat list of contacts:
///
/// ```json
/// [
///   { "display_name": "Alice", "hostname": "alice-desktop", "address": "10.0.0.5" }
/// ]
/// ```
#[derive(Debug, Default)]
pub struct ContactDirectory {
    path: Option<PathBuf>,
    contacts: Vec<Contact>,
}

impl ContactDirectory {
    /// Create an empty, purely in-memory directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the directory from `path`.
    ///
    /// A missing file yields an empty directory bound to that path, so a
    /// first run starts cleanly and `save` creates the file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Directory` if the file exists but cannot be read
    /// or does not parse as a contact list.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Ok(Self {
                path: Some(path),
                contacts: Vec::new(),
            });
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| Error::Directory {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let contacts = serde_json::from_str(&raw).map_err(|e| Error::Directory {
            path: path.clone(),
            reason: format!("invalid contact file: {}", e),
        })?;
        Ok(Self {
            path: Some(path),
            contacts,
        })
    }

    /// Write the contact list back to the file it was loaded from.
    ///
    /// A purely in-memory directory has nowhere to write and succeeds
    /// without doing anything.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::Directory {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }
        let raw = serde_json::to_string_pretty(&self.contacts).map_err(|e| Error::Directory {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| Error::Directory {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Add a contact. Call `save` to persist it.
    pub fn add(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// Find the contact registered for an address.
    pub fn lookup(&self, address: IpAddr) -> Option<&Contact> {
        self.contacts
            .iter()
            .find(|contact| contact.address == address)
    }

    /// Display name for a peer address, if it is in the book.
    ///
    /// Falls back to the hostname when the display name is empty.
    pub fn display_name_for(&self, address: IpAddr) -> Option<String> {
        self.lookup(address).map(|contact| {
            if contact.display_name.is_empty() {
                contact.hostname.clone()
            } else {
                contact.display_name.clone()
            }
        })
    }

    /// Every contact, in file order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the directory has no contacts.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
