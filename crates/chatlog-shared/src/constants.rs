// Collections
pub const CHATS_COLLECTION: &str = "chats";
pub const CALLS_COLLECTION: &str = "calls";
pub const PROFILES_COLLECTION: &str = "profiles";

// Profile singleton
pub const PROFILE_USER_ID: &str = "current-user";
pub const DEFAULT_PROFILE_NAME: &str = "Your Name";
pub const DEFAULT_PROFILE_ABOUT: &str = "Hey there! I am using WhatsApp.";
pub const DEFAULT_PROFILE_AVATAR: &str = "😊";
pub const DEFAULT_PROFILE_PHONE: &str = "+1 234 567 8900";

// Telephone numbers in the user form are exactly this many digits
pub const TELEPHONE_DIGITS: usize = 10;

pub const MAX_AGE: u32 = 100;
