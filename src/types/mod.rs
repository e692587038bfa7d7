mod aliases;
mod error;

pub use aliases::{Domain, FxIndexMap, FxIndexSet};
pub use error::{Error, Result};
