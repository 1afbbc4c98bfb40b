/// Greedy BPE encoder over a [`Vocabulary`].
///
/// The input is split into atomic units (characters or bytes) which are laid
/// out in a [`Sequence`].  Every adjacent pair whose concatenation is itself
/// a vocabulary entry goes into a [`CandidateQueue`]; the best candidate is
/// merged, and the two pairs touching the merged node are re-evaluated.
///
/// Queue entries are never updated.  A popped candidate is stale when either
/// side has been unlinked, or when the current concatenation no longer has
/// the length recorded at push time.  Node content only ever grows by
/// absorbing its right neighbour, so a length match means the pair is
/// exactly the one that was scored.
use std::borrow::Cow;

use log::trace;

use crate::error::{Error, Result};
use crate::format::VocabFormat;
use crate::queue::{Candidate, CandidateQueue, ScoreOrder};
use crate::sequence::{Handle, Sequence};
use crate::vocab::Vocabulary;
use crate::{TokenId, UNKNOWN_ID};

/// Atomic unit the sequence is seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One node per Unicode scalar value (sentencepiece-style vocabularies).
    Char,
    /// One node per byte (tiktoken-style vocabularies).
    Byte,
}

impl Granularity {
    pub fn default_for(order: ScoreOrder) -> Self {
        match order {
            ScoreOrder::Descending => Granularity::Char,
            ScoreOrder::Ascending => Granularity::Byte,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenizerConfig {
    /// Defaults to [`Granularity::default_for`] the vocabulary's order.
    pub granularity: Option<Granularity>,
    pub bos: Option<String>,
    pub eos: Option<String>,
    /// Split characters missing from the vocabulary into `<0xNN>` byte
    /// tokens.  Only meaningful with [`Granularity::Char`].
    pub byte_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub piece: Vec<u8>,
    pub id: TokenId,
}

impl Token {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.piece)
    }
}

/// Counters from one encode call.  `units - merges` is the number of
/// tokens produced from the input, BOS/EOS excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub units: usize,
    pub merges: usize,
    pub stale: usize,
}

pub struct Tokenizer {
    vocab: Vocabulary,
    granularity: Granularity,
    bos: Option<String>,
    eos: Option<String>,
    byte_fallback: bool,
}

impl Tokenizer {
    pub fn new(vocab: Vocabulary, config: TokenizerConfig) -> Self {
        let granularity = config
            .granularity
            .unwrap_or_else(|| Granularity::default_for(vocab.order()));
        Tokenizer {
            vocab,
            granularity,
            bos: config.bos,
            eos: config.eos,
            byte_fallback: config.byte_fallback,
        }
    }

    pub fn from_bytes(format: VocabFormat, data: &[u8], config: TokenizerConfig) -> Result<Self> {
        Ok(Self::new(Vocabulary::load(format, data)?, config))
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Encodes with the configured BOS/EOS.
    pub fn encode(&self, input: &str) -> Result<Vec<Token>> {
        self.encode_with(input, self.bos.as_deref(), self.eos.as_deref())
    }

    pub fn encode_with(&self, input: &str, bos: Option<&str>, eos: Option<&str>) -> Result<Vec<Token>> {
        self.encode_with_stats(input, bos, eos).map(|(tokens, _)| tokens)
    }

    pub fn encode_ids(&self, input: &str) -> Result<Vec<TokenId>> {
        Ok(self.encode(input)?.into_iter().map(|t| t.id).collect())
    }

    pub fn count_tokens(&self, input: &str) -> Result<usize> {
        Ok(self.encode(input)?.len())
    }

    pub fn encode_with_stats(
        &self,
        input: &str,
        bos: Option<&str>,
        eos: Option<&str>,
    ) -> Result<(Vec<Token>, EncodeStats)> {
        let mut out = Vec::new();
        if let Some(tok) = bos.and_then(|s| self.special(s)) {
            out.push(tok);
        }

        let initial = self.initial_units(input);
        let mut stats = EncodeStats {
            units: initial.len(),
            ..Default::default()
        };
        let mut seq = Sequence::with_capacity(initial.len());
        let mut queue = CandidateQueue::with_capacity(self.vocab.order(), initial.len());
        // Reused for every candidate lookup so probing a pair never allocates.
        let mut scratch = Vec::new();

        let mut prev = None;
        for unit in initial {
            let h = seq.append(unit);
            if let Some(p) = prev {
                self.push_pair(&seq, &mut queue, &mut scratch, p, h)?;
            }
            prev = Some(h);
        }

        while !queue.is_empty() {
            let cand = queue.pop()?;
            if !seq.contains(cand.left) || !seq.contains(cand.right) {
                stats.stale += 1;
                continue;
            }
            let left = seq.get(cand.left)?;
            let right = seq.get(cand.right)?;
            if left.len() + right.len() != cand.checksum {
                stats.stale += 1;
                continue;
            }

            let mut merged = Vec::with_capacity(cand.checksum);
            merged.extend_from_slice(left);
            merged.extend_from_slice(right);

            let before = seq.prev(cand.left)?;
            let after = seq.next(cand.right)?;
            seq.set(cand.left, merged)?;
            seq.remove(cand.right)?;
            stats.merges += 1;

            if let Some(p) = before {
                self.push_pair(&seq, &mut queue, &mut scratch, p, cand.left)?;
            }
            if let Some(n) = after {
                self.push_pair(&seq, &mut queue, &mut scratch, cand.left, n)?;
            }
        }

        out.reserve(seq.len() + 1);
        for h in seq.handles() {
            let piece = seq.get(h)?.to_vec();
            let id = self.vocab.lookup(&piece).unwrap_or(UNKNOWN_ID);
            out.push(Token { piece, id });
        }

        if let Some(tok) = eos.and_then(|s| self.special(s)) {
            out.push(tok);
        }

        trace!(
            "encoded {} units into {} tokens ({} merges, {} stale candidates)",
            stats.units,
            out.len(),
            stats.merges,
            stats.stale
        );
        Ok((out, stats))
    }

    pub fn decode(&self, id: TokenId) -> Result<&[u8]> {
        self.vocab
            .entry(id)
            .map(|e| e.text.as_slice())
            .ok_or_else(|| Error::IdOutOfRange {
                id,
                len: self.vocab.len(),
            })
    }

    pub fn decode_ids(&self, ids: &[TokenId]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for &id in ids {
            out.extend_from_slice(self.decode(id)?);
        }
        Ok(out)
    }

    fn special(&self, text: &str) -> Option<Token> {
        self.vocab.lookup(text.as_bytes()).map(|id| Token {
            piece: text.as_bytes().to_vec(),
            id,
        })
    }

    fn initial_units(&self, input: &str) -> Vec<Vec<u8>> {
        match self.granularity {
            Granularity::Byte => input.bytes().map(|b| vec![b]).collect(),
            Granularity::Char => {
                let mut units = Vec::with_capacity(input.len());
                let mut buf = [0u8; 4];
                for ch in input.chars() {
                    let bytes = ch.encode_utf8(&mut buf).as_bytes();
                    if self.byte_fallback && self.vocab.lookup(bytes).is_none() {
                        for &b in bytes {
                            units.push(format!("<0x{:02X}>", b).into_bytes());
                        }
                    } else {
                        units.push(bytes.to_vec());
                    }
                }
                units
            }
        }
    }

    fn push_pair(
        &self,
        seq: &Sequence,
        queue: &mut CandidateQueue,
        scratch: &mut Vec<u8>,
        left: Handle,
        right: Handle,
    ) -> Result<()> {
        scratch.clear();
        scratch.extend_from_slice(seq.get(left)?);
        scratch.extend_from_slice(seq.get(right)?);
        if let Some(score) = self.vocab.score_of(scratch) {
            queue.push(Candidate {
                left,
                right,
                score,
                checksum: scratch.len(),
            });
        }
        Ok(())
    }
}
