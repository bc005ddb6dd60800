/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

pub(crate) const AUTHORIZATION_SCHEME: &str = "Bearer";
pub(crate) const ACCEPT_JSON: &str = "application/json";

pub(crate) const DEFAULT_REST_BASE_URL: &str =
    "https://historical-artifacts-tracker-server-lovat.vercel.app";
pub(crate) const DEFAULT_REST_TIMEOUT: u64 = 30;
pub(crate) const DEFAULT_LIKE_TIMEOUT: u64 = 15;

pub const DEFAULT_DISPLAY_NAME: &str = "User Name";
pub const DEFAULT_AVATAR_URL: &str = "https://cdn-icons-png.flaticon.com/512/149/149071.png";

pub(crate) const DEFAULT_CACHE_PATH: &str = ".artifact-tracker/session.json";

pub(crate) const ARTIFACTS_ENDPOINT: &str = "/artifacts";
pub(crate) const FEATURED_ENDPOINT: &str = "/artifacts/featured";
pub(crate) const MY_ARTIFACTS_ENDPOINT: &str = "/my-artifacts";
pub(crate) const LIKED_ENDPOINT: &str = "/liked";
pub(crate) const LIKE_ENDPOINT: &str = "/like";
pub(crate) const USERS_ENDPOINT: &str = "/api/users";

/// Message the users endpoint answers with when the email is already registered.
pub(crate) const USER_EXISTS_MESSAGE: &str = "User already exists";

pub(crate) const MIN_PASSWORD_LENGTH: usize = 6;

/// Page sizes offered by the catalog, the first one is the default.
pub const PAGE_SIZES: [usize; 3] = [6, 9, 12];
/// Maximum number of page buttons shown around the current page.
pub const PAGE_WINDOW: usize = 5;
