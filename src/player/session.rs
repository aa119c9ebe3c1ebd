//! File lifecycle shared by both feeding engines
//!
//! A [`Session`] exists only between a successful header validation and the
//! end of playback. Opening it runs the `Opening` and `HeaderValidated`
//! steps; a failure in either leaves no file open.

use crate::config::PlayerConfig;
use crate::error::{IoErrorKind, PlayerError, Result};
use crate::hal::{AudioFile, Storage};
use crate::wav::{read_header, HeaderInfo, Sample, SampleSource, WavFormatDescriptor};
use log::{error, info, warn};

/// An open, validated file and its sample decoder
#[derive(Debug)]
pub struct Session<F> {
    source: SampleSource<F>,
    header: HeaderInfo,
    path: String,
}

impl<F: AudioFile> Session<F> {
    /// Open `path` and validate its header
    pub fn open<S>(storage: &mut S, path: &str, config: &PlayerConfig) -> Result<Self>
    where
        S: Storage<File = F>,
    {
        let mut file = storage.open(path).map_err(|e| {
            error!("Could not open {path}: {e}");
            PlayerError::Io(IoErrorKind::OpenFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })
        })?;
        info!("Opening file: {path} size: {}", file.size());

        let header = match read_header(&mut file, config.strict_bit_depth) {
            Ok(header) => header,
            Err(e) => {
                warn!("Rejected {path}: {e}");
                file.close();
                return Err(e);
            }
        };

        Ok(Session {
            source: SampleSource::new(file, &header.descriptor),
            header,
            path: path.to_string(),
        })
    }

    /// Decode the next sample, or `None` once the data runs out
    pub fn next_sample(&mut self) -> Option<Sample> {
        self.source.next()
    }

    /// Format of the open file
    pub fn descriptor(&self) -> WavFormatDescriptor {
        self.header.descriptor
    }

    /// All header fields
    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    /// Most recently decoded sample
    pub fn current(&self) -> Sample {
        self.source.current()
    }

    /// Path the session was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Close the file
    pub fn close(self) {
        self.source.into_inner().close();
    }
}
