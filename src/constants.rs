//! Application-wide constants

/// Display name used for visitors without a profile
pub const GUEST_USERNAME: &str = "Guest";

/// Body of the 400 returned when a fragment endpoint is hit without `HX-Request`
pub const FRAGMENT_ONLY_MESSAGE: &str = "This endpoint only accepts HTMX requests.";

/// The report form words its 400 differently
pub const REPORT_FRAGMENT_ONLY_MESSAGE: &str = "This endpoint only supports HTMX requests.";

/// Flash shown when a profile-less user opens a profile-only page
pub const PROFILE_REQUIRED_MESSAGE: &str =
    "You must create a profile first to access this feature!";

/// Maximum title length for ads, open mics, and feedback subjects
pub const MAX_TITLE_LENGTH: usize = 100;

/// Time zone assigned to new profiles
pub const DEFAULT_TIMEZONE: &str = "UTC";
