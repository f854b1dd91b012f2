//! Authentication module for the ProConnect account service
//!
//! Registration, credential issuance and bearer-token identity resolution.

pub mod handlers;
pub mod password;
mod service;

pub use service::{
    bearer_token, AuthService, Claims, LoginRequest, LoginResponse, RegisterRequest,
    ACCOUNT_NOT_FOUND, EMAIL_TAKEN, INVALID_CATEGORY, MISSING_FIELDS,
};
