use std::{io, path::PathBuf};

use thiserror::Error;

use crate::USAGE_EXIT;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("can not open Mozilla certificate data file {path:?}: {source}")]
    Input { path: PathBuf, source: io::Error },

    #[error("can not replace output file {path:?}: {source}")]
    Output { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Convert(#[from] certdata::Error),
}

impl Error {
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Error::Input { .. } | Error::Output { .. } => USAGE_EXIT,
            Error::Convert(e) => e.exit_code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
