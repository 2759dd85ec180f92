mod auth;
mod session;

pub use auth::DEFAULT_EXPIRES_IN_SECS;
pub use auth::DriveCredentials;
pub use auth::DriveTokenManager;
pub use auth::GOOGLE_TOKEN_URI;
pub use session::DEFAULT_LABEL;
pub use session::DEFAULT_SPOTIFY_ID;
pub use session::SESSION_COOKIE;
pub use session::SESSION_MAX_AGE_SECS;
pub use session::SessionData;
pub use session::SessionStore;
pub use session::cookie_from_headers;
pub use session::session_cookie_header;
