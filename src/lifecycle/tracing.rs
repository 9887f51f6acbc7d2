//! # Tracing setup
//!
//! [`setup_tracing`] installs the global subscriber once, at process start.
//! `RUST_LOG` wins over the level passed in, so a single module can be turned
//! up without touching the CLI flags:
//!
//! ```bash
//! RUST_LOG=oic_resource::server=debug oic-resource serve --ticks 5
//! ```
//!
//! Log lines carry structured fields rather than formatted text: `uri` and
//! `handle` on the server side, `observer` for observe registrations and a
//! `delivered` count for notification rounds, `stage` and `device` for
//! provisioning. Timestamps and span prefixes left out:
//!
//! ```text
//! INFO Resource registered uri=/a/light handle=res#1 resource_type=core.light
//! INFO Observer registered uri="/a/light" observer=obs#1 observers=1 changed=true
//! DEBUG Notified observers uri=/a/light delivered=1
//! INFO Entering stage stage=OWNERSHIP_TRANSFER
//! ```

use tracing_subscriber::EnvFilter;

/// Initializes the compact fmt subscriber. `default_level` applies when
/// `RUST_LOG` is unset or unparsable.
pub fn setup_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
