/// Backend origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8081";

pub mod paths {
    pub const AUTH_ME: &str = "/auth/me";
    pub const AUTH_LOGIN: &str = "/auth/login";
    pub const AUTH_REGISTER: &str = "/auth/register";
    pub const AUTH_LOGOUT: &str = "/auth/logout";
    pub const OAUTH_LOGIN_GOOGLE: &str = "/oauth/login/google";
    pub const OAUTH_LOGIN_GITHUB: &str = "/oauth/login/github";

    /// Application-side login entry point used by the access guard.
    pub const LOGIN_ROUTE: &str = "/login";
    pub const APP_ROOT: &str = "/";
}
