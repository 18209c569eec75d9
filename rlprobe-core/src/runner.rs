mod batch;
mod progress;
mod request;

pub use batch::BatchRunner;
pub use progress::{ProgressEvent, ProgressFn};
pub use request::perform_request;
