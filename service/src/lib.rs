//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod events;
pub mod infra;
pub mod query;
pub mod read;

#[cfg(doc)]
use infra::Database;
use infra::{notification, payment};

pub use self::{command::Command, events::Hub, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Payment provider configuration.
    ///
    /// [`None`] disables checkout and webhook handling.
    pub payment: Option<payment::Config>,

    /// Email notification channel configuration.
    ///
    /// [`None`] disables email confirmations.
    pub email: Option<notification::EmailConfig>,

    /// Messaging notification channel configuration.
    ///
    /// [`None`] disables messaging confirmations.
    pub messaging: Option<notification::MessagingConfig>,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`events::Hub`] broadcasting this [`Service`]'s [`events::Event`]s.
    events: Hub,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> Self {
        Self {
            config,
            database,
            events: Hub::default(),
        }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the [`events::Hub`] of this [`Service`].
    #[must_use]
    pub fn events(&self) -> &Hub {
        &self.events
    }
}
