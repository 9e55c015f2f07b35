pub mod domain;
pub mod ports;
pub mod remote;
pub mod store;

pub use domain::{AttendanceRecord, Course, Profile, Role, SavedCredentials, User};
pub use ports::{CredentialStore, IdentityService, PortError, PortResult};
pub use remote::{AuthManager, AuthPhase};
pub use store::{
    seed_sample_data, DomainStore, ErrorKind, StateSnapshot, StoreConfig, StoreMessage,
};
