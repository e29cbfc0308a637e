// Service exports
pub mod auth;
pub mod email;
pub mod postgres;
pub mod supabase;

pub use auth::{AuthError, Claims, TokenVerifier};
pub use email::{EmailError, EmailSender};
pub use postgres::{OtpStore, PostgresClient, PostgresError};
pub use supabase::{SupabaseClient, SupabaseError};
