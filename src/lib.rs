//! Greedy byte-pair-encoding tokenizer.
//!
//! Applies a learned merge vocabulary to text, producing `(piece, id)`
//! tokens that match sentencepiece-style scored vocabularies (higher score
//! merges first) and tiktoken-style ranked vocabularies (lower rank merges
//! first).
//!
//! ```no_run
//! use bpetok::{Tokenizer, TokenizerConfig, VocabFormat};
//!
//! let data = std::fs::read("tokenizer.bin")?;
//! let tok = Tokenizer::from_bytes(VocabFormat::FixedBinary, &data, TokenizerConfig::default())?;
//! let ids = tok.encode_ids("hello world")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod format;
pub mod queue;
pub mod sequence;
pub mod tokenizer;
pub mod vocab;

pub use error::{Error, Result};
pub use format::VocabFormat;
pub use queue::ScoreOrder;
pub use tokenizer::{EncodeStats, Granularity, Token, Tokenizer, TokenizerConfig};
pub use vocab::{Entry, Vocabulary};

pub type TokenId = u32;

/// ID reported for pieces that have no vocabulary entry.
pub const UNKNOWN_ID: TokenId = 0;
