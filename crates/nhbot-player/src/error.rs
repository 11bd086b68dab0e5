//! Errors that end a bot session

use std::io;
use std::path::PathBuf;

use nhbot_core::DispatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("could not start '{path}' on a pseudoterminal")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to send the startup keys")]
    Startup(#[source] io::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("could not read config file '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config file '{path}'")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not render config as TOML")]
    ConfigSerialize(#[source] toml::ser::Error),
}
