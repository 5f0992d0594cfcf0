//! Subscriber setup for the `datastores` binary and embedding hosts.
//!
//! Every subscriber writes to stderr so command output on stdout stays
//! machine-readable. Filter directives target the `datastores` prefix, which
//! covers `datastores_core`, `datastores_store` and `datastores_cli`.

use std::sync::Once;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Which subscriber [`init`] installs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Pretty text, debug level
    Development,
    /// One JSON object per event, info level
    Production,
    /// No output; tests install `init_test_capture()` instead
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "datastores=debug",
            Profile::Production | Profile::Test => "datastores=info",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static SUBSCRIBER: Once = Once::new();

/// Install the global subscriber for `profile`.
///
/// Only the first call in a process has an effect.
pub fn init(profile: Profile) {
    SUBSCRIBER.call_once(|| match profile {
        Profile::Development => tracing_subscriber::fmt()
            .with_env_filter(profile.filter())
            .with_writer(std::io::stderr)
            .init(),
        Profile::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(profile.filter())
            .with_writer(std::io::stderr)
            .init(),
        Profile::Test => tracing_subscriber::registry().init(),
    });
}
