//! Size-bounded embedding of schema text.
//!
//! A blob no longer than the threshold is embedded whole. A longer blob is
//! cut into contiguous byte ranges of at most `threshold` bytes, all but
//! the last exactly `threshold` long. The cut points ignore the content, so
//! concatenating the chunks in index order always restores the input.

use bytes::Bytes;
use std::num::NonZeroUsize;

/// Default chunk threshold in bytes.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 16_000;

/// Returns the default threshold as a `NonZeroUsize`.
#[must_use]
pub const fn default_threshold() -> NonZeroUsize {
    match NonZeroUsize::new(DEFAULT_CHUNK_THRESHOLD) {
        Some(n) => n,
        None => NonZeroUsize::MIN,
    }
}

/// One slice of an oversized blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChunk {
    /// Position in reconstruction order, starting at zero.
    pub index: usize,
    /// The bytes of this slice.
    pub data: Bytes,
}

/// Splits `text` into chunks of at most `threshold` bytes.
///
/// Returns `ceil(len / threshold)` chunks; an empty input yields none.
#[must_use]
pub fn split_chunks(text: &Bytes, threshold: NonZeroUsize) -> Vec<SchemaChunk> {
    let step = threshold.get();
    (0..text.len())
        .step_by(step)
        .enumerate()
        .map(|(index, start)| SchemaChunk {
            index,
            data: text.slice(start..(start + step).min(text.len())),
        })
        .collect()
}

/// Concatenates chunks in index order.
#[must_use]
pub fn reassemble(chunks: &[SchemaChunk]) -> Bytes {
    let mut ordered: Vec<&SchemaChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);
    let total = ordered.iter().map(|c| c.data.len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in ordered {
        out.extend_from_slice(&chunk.data);
    }
    Bytes::from(out)
}

/// A named text blob ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedBlob {
    /// Held in a single constant.
    Whole {
        /// Constant name.
        name: String,
        /// Full text.
        data: Bytes,
    },
    /// Held in several part constants.
    Chunked {
        /// Base constant name.
        name: String,
        /// Parts in order.
        chunks: Vec<SchemaChunk>,
        /// Length of the reassembled text.
        total_len: usize,
    },
}

impl EmbeddedBlob {
    /// Encodes `data` under `name`, chunking it if it exceeds `threshold`.
    #[must_use]
    pub fn encode(name: impl Into<String>, data: impl Into<Bytes>, threshold: NonZeroUsize) -> Self {
        let name = name.into();
        let data = data.into();
        if data.len() <= threshold.get() {
            return Self::Whole { name, data };
        }
        let total_len = data.len();
        Self::Chunked {
            name,
            chunks: split_chunks(&data, threshold),
            total_len,
        }
    }

    /// Returns the base constant name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Whole { name, .. } | Self::Chunked { name, .. } => name,
        }
    }

    /// Returns the length of the full text.
    #[must_use]
    pub fn total_len(&self) -> usize {
        match self {
            Self::Whole { data, .. } => data.len(),
            Self::Chunked { total_len, .. } => *total_len,
        }
    }

    /// Returns the constant names holding the text, in order.
    #[must_use]
    pub fn part_names(&self) -> Vec<String> {
        match self {
            Self::Whole { name, .. } => vec![name.clone()],
            Self::Chunked { name, chunks, .. } => chunks
                .iter()
                .map(|c| format!("{name}_part{}", c.index))
                .collect(),
        }
    }

    /// Returns the parts in order.
    pub fn parts(&self) -> Box<dyn Iterator<Item = &Bytes> + '_> {
        match self {
            Self::Whole { data, .. } => Box::new(std::iter::once(data)),
            Self::Chunked { chunks, .. } => Box::new(chunks.iter().map(|c| &c.data)),
        }
    }

    /// Rebuilds the full text.
    #[must_use]
    pub fn reassemble(&self) -> Bytes {
        match self {
            Self::Whole { data, .. } => data.clone(),
            Self::Chunked { chunks, .. } => reassemble(chunks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    #[test]
    fn test_forty_thousand_bytes_at_sixteen_thousand() {
        let text = Bytes::from(vec![b'x'; 40_000]);
        let blob = EmbeddedBlob::encode("core", text.clone(), default_threshold());
        let EmbeddedBlob::Chunked {
            chunks, total_len, ..
        } = &blob
        else {
            panic!("expected chunked blob");
        };
        let sizes: Vec<usize> = chunks.iter().map(|c| c.data.len()).collect();
        assert_eq!(sizes, [16_000, 16_000, 8_000]);
        assert_eq!(*total_len, 40_000);
        assert_eq!(blob.part_names(), ["core_part0", "core_part1", "core_part2"]);
        assert_eq!(blob.reassemble(), text);
    }

    #[test]
    fn test_exact_threshold_is_whole() {
        let blob = EmbeddedBlob::encode("a", Bytes::from_static(b"abcd"), nz(4));
        assert!(matches!(blob, EmbeddedBlob::Whole { .. }));
        assert_eq!(blob.part_names(), ["a"]);
    }

    #[test]
    fn test_empty_input_has_no_chunks() {
        assert!(split_chunks(&Bytes::new(), nz(3)).is_empty());
        let blob = EmbeddedBlob::encode("e", Bytes::new(), nz(3));
        assert_eq!(blob.total_len(), 0);
    }

    #[test]
    fn test_reassemble_sorts_by_index() {
        let mut chunks = split_chunks(&Bytes::from_static(b"hello world"), nz(4));
        chunks.reverse();
        assert_eq!(reassemble(&chunks), Bytes::from_static(b"hello world"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_chunks_round_trip(data in proptest::collection::vec(any::<u8>(), 0..2048), t in 1usize..300) {
            let text = Bytes::from(data);
            let chunks = split_chunks(&text, nz(t));
            prop_assert_eq!(chunks.len(), text.len().div_ceil(t));
            if let Some((_, head)) = chunks.split_last() {
                prop_assert!(head.iter().all(|c| c.data.len() == t));
            }
            prop_assert!(chunks.iter().all(|c| c.data.len() <= t));
            prop_assert_eq!(reassemble(&chunks), text);
        }
    }
}
