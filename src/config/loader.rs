//! Loads the quickplay parameters from the disc at startup.
//!
//! Loading is all or nothing. If anything about the file is wrong, every feature is disabled and
//! the game boots normally. There are no retries.

use std::{io, time::Duration};

use thiserror::Error;

use crate::meta::settings::Options;

use super::{
    disc::{AlignedBuffer, Completion, Disc, DiscFile, ReadSignal},
    format::{QuickplayParams, Revision, MAGIC},
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open dbgconfig file.")]
    OpenFailed(#[source] io::Error),

    #[error("dbgconfig file is too small.")]
    TooSmall { length: usize, needed: usize },

    #[error("Failed to read dbgconfig file.")]
    ReadFailed(#[source] io::Error),

    #[error("Timed out reading dbgconfig file.")]
    ReadTimedOut(Duration),

    #[error("Failed to read enough data from dbgconfig file.")]
    ShortRead { read: usize, needed: usize },

    #[error("Invalid dbgconfig magic.")]
    BadMagic(u32),

    #[error("Invalid quickplay version.")]
    BadVersion { found: u32, expected: u32 },
}

/// Checks the magic and then the version of a decoded record.
fn check_header(params: &QuickplayParams, revision: Revision) -> Result<(), LoadError> {
    if params.magic != MAGIC {
        return Err(LoadError::BadMagic(params.magic));
    }

    if params.version != revision.version() {
        return Err(LoadError::BadVersion {
            found: params.version,
            expected: revision.version(),
        });
    }

    Ok(())
}

/// Reads the record from an open file. The caller closes the file.
fn read_params(
    file: &mut impl DiscFile,
    revision: Revision,
    timeout: Option<Duration>,
) -> Result<QuickplayParams, LoadError> {
    let needed = revision.record_size();
    let length = file.length();

    if length < needed {
        return Err(LoadError::TooSmall { length, needed });
    }

    if length > needed {
        log::debug!(
            "dbgconfig is {length} bytes; only the first {needed} are used by {}",
            <&str>::from(revision)
        );
    }

    // The buffer covers the whole file rounded up to the read unit, and its usable window is
    // aligned for the disc.
    let signal = ReadSignal::new();
    file.read_async(AlignedBuffer::new(length), 0, signal.clone())
        .map_err(LoadError::ReadFailed)?;

    let read = match signal.wait(timeout) {
        Some(Completion::Read(read)) => read,

        Some(Completion::Failed) => {
            return Err(LoadError::ReadFailed(io::Error::new(
                io::ErrorKind::Other,
                "disc reported a failed read",
            )))
        }

        None => return Err(LoadError::ReadTimedOut(timeout.unwrap_or_default())),
    };

    let buffer = signal.take_buffer().ok_or_else(|| {
        LoadError::ReadFailed(io::Error::new(
            io::ErrorKind::Other,
            "read finished without returning its buffer",
        ))
    })?;

    let read = read.min(buffer.len());

    if read < needed {
        return Err(LoadError::ShortRead { read, needed });
    }

    let params = QuickplayParams::decode(&buffer.as_slice()[..read], revision)
        .map_err(|_| LoadError::ShortRead { read, needed })?;

    check_header(&params, revision)?;
    Ok(params)
}

/// Loads the parameters, returning the reason if they can't be used.
pub fn try_load_params(disc: &impl Disc, options: &Options) -> Result<QuickplayParams, LoadError> {
    let mut file = disc
        .open(&options.config_path)
        .map_err(LoadError::OpenFailed)?;

    let result = read_params(&mut file, options.revision, options.read_timeout());
    file.close();

    result
}

/// Loads the parameters. Any failure is logged and results in parameters with every feature
/// disabled.
pub fn load_params(disc: &impl Disc, options: &Options) -> QuickplayParams {
    match try_load_params(disc, options) {
        Ok(params) => {
            log::info!("Quickplay parameters loaded successfully!");
            log::info!("Enabled features: {}", params.feature_flags);
            params
        }

        Err(err) => {
            log::warn!("{err} Quickplay debug features will not be enabled.");
            log::debug!("Load error details: {err:?}");

            // Nothing from a rejected record is trusted, including the feature flags.
            QuickplayParams::disabled()
        }
    }
}
