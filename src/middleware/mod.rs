mod user_auth;

pub use user_auth::{AuthedUser, user_auth};
