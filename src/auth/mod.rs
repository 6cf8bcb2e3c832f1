//! OAuth device-code login and token lifecycle.

pub mod device_code;
pub mod error;
pub mod login;
pub mod manager;
pub mod poller;
pub mod token;

pub use device_code::{DeviceAuthorization, DeviceCodeClient};
pub use error::{AuthError, AuthErrorKind, PollFailure, SaveFailure};
pub use login::{LoginError, LoginFlow};
pub use manager::{AdvisorySink, TokenManager};
pub use poller::{PollSchedule, PollStep, TokenPoller};
pub use token::TokenSet;
