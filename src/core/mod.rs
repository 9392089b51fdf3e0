pub mod dispatcher;

pub use crate::domain::model::{DeliveryOutcome, ResultMapping, Submission};
pub use crate::domain::ports::{DeliveryChannel, UriOpener};
pub use crate::utils::error::Result;
pub use dispatcher::Dispatcher;
