pub mod client;
pub mod config;
pub mod formatter;
pub mod provider;

pub use client::{ResendClient, SendReceipt};
pub use config::EmailConfig;
pub use formatter::{EmailAttachment, EmailFormatter, EmailPayload};
pub use provider::EmailProvider;
