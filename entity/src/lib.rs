//! Database entities for the HR suite.

use sea_orm::prelude::DateTimeWithTimeZone;

pub mod admin_session;
pub mod admin_user;
pub mod department;
pub mod employee;
pub mod job_title;

pub use employee::{EducationLevel, EmployeeStatus};

/// Audit timestamps applied by the unit of work when changes are saved.
pub trait Audited {
    fn stamp_created(&mut self, at: DateTimeWithTimeZone);
    fn stamp_updated(&mut self, at: DateTimeWithTimeZone);
}
