//! Maintenance routines behind the operational binaries.

pub mod auth_provider;
pub mod backup;
pub mod migrations;
pub mod purge;
pub mod r2;
pub mod superuser;
