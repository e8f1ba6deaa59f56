//! Update notification e-mails

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::notify::NotifyError;
use crate::notify::transport::{MailTransport, OutgoingMail};

pub const DEFAULT_SENDER: &str = "noreply@localhost";
pub const DEFAULT_FALLBACK: &str = "admin@localhost";

const UNMAINTAINED_TAG: &str = "[UNMAINTAINED]";

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$")
            .expect("valid e-mail regex")
    })
}

/// Extract a deliverable address from a free-text maintainer field
///
/// Looks at the first `<...>` candidate if there is one, otherwise at the
/// first whitespace or comma separated token. Returns `None` when that
/// candidate is not a plausible address.
pub fn resolve_recipient(maintainer: Option<&str>) -> Option<String> {
    let maintainer = maintainer?.trim();

    let candidate = match maintainer.find('<') {
        Some(start) => {
            let rest = &maintainer[start + 1..];
            &rest[..rest.find('>')?]
        }
        None => maintainer
            .split(|c: char| c.is_whitespace() || c == ',')
            .find(|token| !token.is_empty())?,
    };

    let candidate = candidate.trim();
    email_pattern()
        .is_match(candidate)
        .then(|| candidate.to_string())
}

/// A package that fell behind its upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageUpdate<'a> {
    pub package: &'a str,
    pub source: &'a str,
    pub maintainer: Option<&'a str>,
    pub local_version: &'a str,
    pub upstream_version: &'a str,
    pub repository: &'a str,
}

/// Composes update notifications and hands them to a transport
pub struct EmailNotifier {
    transport: Arc<dyn MailTransport>,
    sender: String,
    fallback: String,
}

impl EmailNotifier {
    pub fn new(transport: Arc<dyn MailTransport>, sender: String, fallback: String) -> Self {
        Self {
            transport,
            sender,
            fallback,
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn compose(&self, update: &PackageUpdate<'_>) -> OutgoingMail {
        let recipient = resolve_recipient(update.maintainer);
        let unmaintained = recipient.is_none();

        let subject = format!("Package update available: {}", update.package);
        let (subject, greeting, note) = if unmaintained {
            (
                format!("{UNMAINTAINED_TAG} {subject}"),
                "Hello Administrator,",
                "Nobody with a reachable address maintains this package. \
                 Please consider assigning a maintainer.\n\n",
            )
        } else {
            (subject, "Hello Package Maintainer,", "")
        };

        let body = format!(
            "{greeting}\n\
             \n\
             A newer upstream version is available for a package you maintain:\n\
             \n\
             Package: {package}\n\
             Source: {source}\n\
             Current Version: {local}\n\
             New Version: {upstream}\n\
             Repository: {repository}\n\
             \n\
             {note}Please update the package to the latest version.\n\
             \n\
             -- \n\
             distro-tracker\n",
            package = update.package,
            source = update.source,
            local = update.local_version,
            upstream = update.upstream_version,
            repository = update.repository,
        );

        OutgoingMail {
            from: self.sender.clone(),
            to: recipient.unwrap_or_else(|| self.fallback.clone()),
            subject,
            body,
        }
    }

    pub async fn notify(&self, update: &PackageUpdate<'_>) -> Result<(), NotifyError> {
        let mail = self.compose(update);
        self.transport.send(&mail).await
    }
}
