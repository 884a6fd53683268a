pub mod core;
pub mod grades;
pub mod guardians;
pub mod notifications;
pub mod prefs;
pub mod reports;
