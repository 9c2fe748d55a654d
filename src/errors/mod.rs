pub mod scicoda_error;

pub use scicoda_error::{BoxError, ScicodaError};
