// Core error taxonomy.
//
// Routine scraping variance never surfaces here -- pages degrade to
// empty/partial field maps. The collector only reports the overall poll
// deadline; setup-time failures pass through the api crate's transport
// vs authentication split.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The whole poll cycle exceeded its deadline. Recoverable -- the
    /// host should mark data stale and try again next tick.
    #[error("poll cycle exceeded {0:?}")]
    Timeout(Duration),

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Api(#[from] cudymon_api::Error),
}
