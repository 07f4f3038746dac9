//! Client-side manager for the remote users collection: a local mirror kept in step
//! with the service, filtered views over it, and one create/edit session at a time.

pub mod config;
pub mod confirm;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod session;
pub mod store;

pub use config::{load_settings, Settings};
pub use confirm::{AlwaysConfirm, Confirmation};
pub use error::GatewayError;
pub use filter::{FilterCriteria, GenderFilter};
pub use gateway::{HttpUserGateway, RemoteUserGateway};
pub use session::{EditSession, EditSessionController, SessionError, SessionMode, Submission};
pub use store::{DeleteOutcome, StoreError, SubmitOutcome, UserCollectionStore};
