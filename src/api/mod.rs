pub mod codes;
pub mod envelope;
pub mod reply;

pub use codes::ApiCode;
pub use envelope::ResponseEnvelope;
pub use reply::{HandlerResult, Reply};
