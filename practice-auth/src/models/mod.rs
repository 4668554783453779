pub mod audit;
pub mod login_failure;
pub mod password_history;
pub mod user;
pub mod verification_token;

pub use audit::LoginAudit;
pub use login_failure::FailureRecord;
pub use password_history::PasswordHistoryEntry;
pub use user::{User, UserResponse, UserStatus};
pub use verification_token::VerificationToken;
