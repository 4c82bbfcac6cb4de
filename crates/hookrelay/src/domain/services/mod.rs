//! Domain Services
//!
//! Stateless domain logic shared by the application layer.

pub mod dashboard;
pub mod secret;
pub mod template;

pub use dashboard::{summarize, DashboardStats, DayActivity, RecentActivity, StatusSlice};
pub use secret::{constant_time_eq, redact_headers, SECRET_HEADER};
pub use template::{build_forward_body, render, ForwardBody, TemplateContext};
