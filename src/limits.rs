/// Character limit for title, description, location, type, name, postal code and phone.
pub const SHORT_FIELD_LIMIT: usize = 50;

/// Character limit for address-like fields.
pub const ADDRESS_FIELD_LIMIT: usize = 100;

/// Lookahead used for the login notice.
pub const UPCOMING_HORIZON_MINUTES: i64 = 15;

/// Largest accepted lookahead: one year.
pub const MAX_UPCOMING_HORIZON_MINUTES: i64 = 365 * 24 * 60;

/// IANA name of the zone business hours are defined in.
pub const REFERENCE_ZONE: &str = "America/New_York";

/// Business opening time, minutes after midnight in the reference zone.
pub const BUSINESS_OPEN_MINUTE: u32 = 8 * 60;

/// Business closing time, minutes after midnight in the reference zone.
pub const BUSINESS_CLOSE_MINUTE: u32 = 22 * 60;

/// Id carried by an appointment that has not been persisted yet.
pub const UNSAVED_ID: i64 = 0;
