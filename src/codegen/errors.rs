use thiserror::Error;

use crate::check::CheckError;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("stack capacity {0} must be a positive multiple of 8 bytes")]
    InvalidStackCapacity(usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
