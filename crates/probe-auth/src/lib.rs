//! # mssql-probe-auth
//!
//! Authentication strategies for SQL Server connectivity probes.
//!
//! This crate owns the credential-negotiation side of a probe, isolated from
//! connection logic for better modularity and testing.
//!
//! ## Supported Authentication Modes
//!
//! | Mode | Feature Flag | Description |
//! |------|--------------|-------------|
//! | Password + realm file | default | Kerberos ticket from an on-disk realm config |
//! | Password + config path | default | Kerberos ticket, realm and KDC validated up front |
//! | Explicit Kerberos login | `sspi-auth` | KDC login round trip before the database dial |
//!
//! Every mode produces a [`ConnectionDescriptor`]: the rendered connection
//! string plus the pool policy the probe applies to the single connection it
//! opens. The explicit-login mode additionally yields a [`TicketSession`]
//! that owns the ticket for the duration of the invocation.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod credentials;
pub mod error;
pub mod krb_login;
pub mod realm;
pub mod strategy;
pub mod ticket;

pub use credentials::{Credentials, Target};
pub use error::AuthError;
pub use krb_login::KdcTicketFactory;
pub use realm::RealmConfig;
pub use strategy::{AuthMode, ConnectionDescriptor, IdlePolicy, PoolPolicy};
pub use ticket::{TicketClient, TicketClientFactory, TicketSession};
