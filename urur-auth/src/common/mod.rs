mod models;

pub use models::{
    AuthenticatedSession, DeviceAuthorization, DeviceFlowSession, PollOutcome, Session, User,
    UserMetadata,
};
