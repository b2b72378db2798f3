//! HR vertical slice: employee records, catalogs, self-service accounts,
//! spreadsheet import, printable resumes and the dashboard assistant.

pub mod ai;
pub mod auth;
pub mod catalog;
pub mod dto;
pub mod email;
pub mod employees;
pub mod error;
pub mod import;
pub mod pdf;
pub mod self_service;
mod validation;

pub use ai::{AiAnswer, AiAssistant, AiSettings};
pub use auth::{AccountError, AdminAccounts, CurrentAdmin, JwtConfig, JwtService};
pub use catalog::CatalogService;
pub use email::{EmailSender, SmtpSettings};
pub use employees::EmployeeService;
pub use error::{ServiceError, ServiceResult};
pub use import::{EmployeeImporter, ImportReport};
pub use pdf::PdfError;
pub use self_service::{LoginError, SelfService};
