pub mod admin;
pub mod jwt;

pub use admin::{AccountError, AdminAccounts, AdminLogin, AdminRegistration, CurrentAdmin};
pub use jwt::{Claims, IssuedToken, JwtConfig, JwtError, JwtService};
