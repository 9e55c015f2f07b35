pub mod prefs;

pub use prefs::PrefsAdapter;
