mod startup;

pub use startup::{initialize_session, SessionCheck};
