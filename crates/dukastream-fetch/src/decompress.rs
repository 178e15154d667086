//! LZMA decompression for bi5 files.

use lzma_rs::lzma_decompress;
use std::io::{BufReader, Cursor};
use thiserror::Error;

/// Errors that can occur during decompression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressError {
    /// LZMA stream is corrupt or truncated.
    #[error("LZMA decompression failed: {0}")]
    Lzma(String),

    /// The blocking decompression task did not complete.
    #[error("Decompression task failed: {0}")]
    Task(String),
}

/// Decompresses an LZMA-compressed bi5 payload.
///
/// The archive serves some files with an empty body (no activity in the
/// period); those decompress to an empty buffer without invoking the
/// decoder.
///
/// # Errors
///
/// Returns an error if the payload is not a valid LZMA stream.
///
/// # Example
///
/// ```
/// use dukastream_fetch::decompress_bi5;
///
/// assert!(decompress_bi5(&[]).unwrap().is_empty());
/// ```
pub fn decompress_bi5(compressed: &[u8]) -> Result<Vec<u8>, DecompressError> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }

    let mut decompressed = Vec::new();
    let mut reader = BufReader::new(Cursor::new(compressed));

    lzma_decompress(&mut reader, &mut decompressed)
        .map_err(|e| DecompressError::Lzma(e.to_string()))?;

    Ok(decompressed)
}

/// Decompresses on the blocking thread pool so LZMA work does not stall the
/// async executor.
///
/// # Errors
///
/// Returns an error if decompression fails or the blocking task panics.
pub async fn decompress_bi5_blocking(compressed: bytes::Bytes) -> Result<Vec<u8>, DecompressError> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }
    tokio::task::spawn_blocking(move || decompress_bi5(&compressed))
        .await
        .map_err(|e| DecompressError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        lzma_rs::lzma_compress(&mut BufReader::new(Cursor::new(data)), &mut out).unwrap();
        out
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        assert_eq!(decompress_bi5(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_invalid_lzma() {
        let result = decompress_bi5(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecompressError::Lzma(_))));
    }

    #[test]
    fn test_decompresses_lzma_stream() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        assert_eq!(decompress_bi5(&compress(&payload)).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_blocking_variant() {
        let payload = vec![7u8; 40];
        let compressed = bytes::Bytes::from(compress(&payload));
        assert_eq!(decompress_bi5_blocking(compressed).await.unwrap(), payload);
        assert!(
            decompress_bi5_blocking(bytes::Bytes::new())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
