//! Streaming decode pipeline for compressed snapshots.
//!
//! Network chunks flow through two independent stages: [`GzipStage`]
//! inflates whatever bytes have arrived, and [`Utf8Stage`] turns them into
//! text while holding back any multi-byte sequence split across chunks.
//! [`text_chunks`] composes both into a lazy stream of text pieces that
//! [`collect_text`] accumulates into the full document.

use std::io::Write;

use flate2::write::GzDecoder;
use futures::{Stream, TryStreamExt};

use crate::error::FeedError;

const TEXT_CONTEXT: &str = "snapshot text";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Push-based gzip decompressor.
pub struct GzipStage {
    decoder: GzDecoder<Vec<u8>>,
}

impl GzipStage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoder: GzDecoder::new(Vec::new()),
        }
    }

    /// Feeds one compressed chunk and returns the bytes inflated so far.
    ///
    /// Output can lag input by a chunk; [`GzipStage::finish`] drains the rest.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Decompression`] on a malformed header or deflate stream.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<u8>, FeedError> {
        self.decoder
            .write_all(chunk)
            .map_err(FeedError::Decompression)?;
        Ok(std::mem::take(self.decoder.get_mut()))
    }

    /// Signals end of input, verifies the gzip trailer, and returns any
    /// remaining inflated bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Decompression`] if the stream is truncated or its
    /// checksum does not match.
    pub fn finish(&mut self) -> Result<Vec<u8>, FeedError> {
        self.decoder
            .try_finish()
            .map_err(FeedError::Decompression)?;
        Ok(std::mem::take(self.decoder.get_mut()))
    }
}

impl Default for GzipStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental UTF-8 decoder.
///
/// A single leading byte-order mark is dropped, even when it arrives split
/// across chunks.
#[derive(Debug, Default)]
pub struct Utf8Stage {
    pending: Vec<u8>,
    consumed: usize,
    started: bool,
}

impl Utf8Stage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `bytes` (plus any held-back prefix) as forms
    /// complete characters. An incomplete trailing sequence is kept for the
    /// next call.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Parse`] on an invalid byte sequence.
    pub fn push(&mut self, bytes: &[u8]) -> Result<String, FeedError> {
        self.pending.extend_from_slice(bytes);

        let complete = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(FeedError::Parse {
                    context: TEXT_CONTEXT.to_owned(),
                    reason: format!("invalid UTF-8 at byte {}", self.consumed + e.valid_up_to()),
                });
            }
        };

        let rest = self.pending.split_off(complete);
        let head = std::mem::replace(&mut self.pending, rest);
        self.consumed += head.len();
        let mut text = String::from_utf8(head).map_err(|e| FeedError::Parse {
            context: TEXT_CONTEXT.to_owned(),
            reason: e.to_string(),
        })?;

        if !self.started && !text.is_empty() {
            self.started = true;
            if text.starts_with(BYTE_ORDER_MARK) {
                text.replace_range(..BYTE_ORDER_MARK.len_utf8(), "");
            }
        }
        Ok(text)
    }

    /// Fails if the stream ended in the middle of a multi-byte character.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Parse`] if bytes are still held back.
    pub fn finish(&self) -> Result<(), FeedError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(FeedError::Parse {
                context: TEXT_CONTEXT.to_owned(),
                reason: format!(
                    "truncated UTF-8 sequence of {} byte(s) at end of stream",
                    self.pending.len()
                ),
            })
        }
    }
}

struct Pipeline<S> {
    bytes: S,
    gzip: GzipStage,
    utf8: Utf8Stage,
    done: bool,
}

/// Lazily decompresses and decodes a stream of gzip chunks into text pieces.
///
/// The returned stream is finite and cannot be restarted. Chunks that
/// inflate to nothing are skipped rather than yielded as empty strings.
pub fn text_chunks<S, B>(bytes: S) -> impl Stream<Item = Result<String, FeedError>>
where
    S: Stream<Item = Result<B, FeedError>> + Unpin,
    B: AsRef<[u8]>,
{
    let pipeline = Pipeline {
        bytes,
        gzip: GzipStage::new(),
        utf8: Utf8Stage::new(),
        done: false,
    };

    futures::stream::try_unfold(pipeline, |mut pipeline| async move {
        loop {
            if pipeline.done {
                return Ok::<_, FeedError>(None);
            }

            if let Some(chunk) = pipeline.bytes.try_next().await? {
                let inflated = pipeline.gzip.push(chunk.as_ref())?;
                let text = pipeline.utf8.push(&inflated)?;
                if !text.is_empty() {
                    return Ok(Some((text, pipeline)));
                }
            } else {
                pipeline.done = true;
                let tail = pipeline.gzip.finish()?;
                let text = pipeline.utf8.push(&tail)?;
                pipeline.utf8.finish()?;
                if !text.is_empty() {
                    return Ok(Some((text, pipeline)));
                }
            }
        }
    })
}

/// Accumulates decoded text pieces into one document.
///
/// # Errors
///
/// Propagates the first error yielded by `chunks`.
pub async fn collect_text<S>(chunks: S) -> Result<String, FeedError>
where
    S: Stream<Item = Result<String, FeedError>>,
{
    chunks
        .try_fold(String::new(), |mut text, chunk| async move {
            text.push_str(&chunk);
            Ok(text)
        })
        .await
}
