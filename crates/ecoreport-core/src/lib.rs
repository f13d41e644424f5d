//! Domain library for the ecoreport crowdsourced litter-reporting system.
//!
//! Holds the canonical report entity, its enumerated fields, the error
//! taxonomy shared across services, and the dual-casing wire adapter that
//! keeps three generations of clients working against one API.

pub mod error;
pub mod model;
pub mod wire;

pub use error::{Error, Result};
pub use model::{
    guest_description, EnumPolicy, NewReport, Report, ReportStatus, Severity, SubmittedBy,
    TrashKind, User, GUEST_MARKER, ROLE_ADMIN, ROLE_USER,
};
pub use wire::{Coordinate, ReportDraft, ReportPatch, WireReport};
