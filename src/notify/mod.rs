//! Maintainer notifications
//!
//! Tells maintainers (or an administrator, for unmaintained packages) that a
//! newer upstream version of their package is available.
//!
//! # Modules
//!
//! - [`email`]: Recipient resolution and message composition
//! - [`hooks`]: Reconciliation hooks that send notifications
//! - [`transport`]: Mail transport trait and the SMTP implementation

pub mod email;
pub mod hooks;
pub mod transport;

use thiserror::Error;

use crate::store::error::StoreError;

pub use email::{EmailNotifier, PackageUpdate, resolve_recipient};
pub use hooks::NotifyingHooks;
pub use transport::{MailTransport, OutgoingMail, SmtpMailer, SmtpSettings};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid e-mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("failed to look up packages: {0}")]
    Store(#[from] StoreError),
}
