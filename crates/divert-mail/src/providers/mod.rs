//! Provider abstractions and the SES implementation

mod ses;
mod traits;

#[cfg(test)]
pub mod mock;

pub use ses::{SesProvider, SesProviderFactory, SES_API_VERSION};
pub use traits::*;

#[cfg(test)]
pub use mock::{MockProviderFactory, MockRawProvider};
