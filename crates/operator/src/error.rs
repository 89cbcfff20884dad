use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("owner reference unavailable for FrontendPage {0}")]
    MissingOwnerRef(String),
}
