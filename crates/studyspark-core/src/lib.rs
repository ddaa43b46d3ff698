#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod auth;
pub mod constants;
pub mod guard;
pub mod oauth;
pub mod retry;

pub use crate::api::*;
pub use crate::auth::*;
pub use crate::constants::*;
pub use crate::guard::*;
pub use crate::oauth::*;
pub use crate::retry::*;
