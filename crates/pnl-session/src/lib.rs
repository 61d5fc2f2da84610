#![forbid(unsafe_code)]

//! Session and entity layer for PayNetLink.
//!
//! Nothing here is global: an [`AuthSession`] is built once by the host and
//! passed to whatever needs the token. [`ApiClient`] applies the request and
//! response policy (base URL, JSON headers, bearer token, 401 handling) to
//! request descriptions; moving bytes is the host's job.

pub mod auth;
pub mod client;
pub mod mapper;
pub mod user;

pub use auth::{AuthSession, LoginPayload, LoginResponse, TOKEN_STORAGE_KEY, TokenPersistence};
pub use client::{ApiClient, ApiError, Method, PreparedRequest};
pub use mapper::Mapper;
pub use user::{User, UserDto, UserMapper};
