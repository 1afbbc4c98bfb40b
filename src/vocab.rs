/// Ordered token table with a first-occurrence lookup map.
///
/// Entries keep insertion order and their index is the token ID.  When the
/// same text appears twice only the first copy is reachable through
/// [`Vocabulary::lookup`]; later copies stay in the table (and decode) but
/// are never produced by encoding.
use rustc_hash::FxHashMap;

use crate::queue::ScoreOrder;
use crate::TokenId;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub text: Vec<u8>,
    pub score: f64,
}

pub struct Vocabulary {
    entries: Vec<Entry>,
    token_ids: FxHashMap<Vec<u8>, TokenId>,
    order: ScoreOrder,
    max_token_length: u32,
}

impl Vocabulary {
    pub fn new(order: ScoreOrder) -> Self {
        Vocabulary {
            entries: Vec::new(),
            token_ids: FxHashMap::default(),
            order,
            max_token_length: 0,
        }
    }

    pub fn with_capacity(order: ScoreOrder, n: usize) -> Self {
        Vocabulary {
            entries: Vec::with_capacity(n),
            token_ids: FxHashMap::with_capacity_and_hasher(n, Default::default()),
            order,
            max_token_length: 0,
        }
    }

    pub fn add_entry(&mut self, text: impl Into<Vec<u8>>, score: f64) -> TokenId {
        let text = text.into();
        let id = self.entries.len() as TokenId;
        if !self.token_ids.contains_key(&text) {
            self.token_ids.insert(text.clone(), id);
        }
        self.entries.push(Entry { text, score });
        id
    }

    #[inline]
    pub fn lookup(&self, text: &[u8]) -> Option<TokenId> {
        self.token_ids.get(text).copied()
    }

    /// Score of the canonical entry for `text`.
    #[inline]
    pub fn score_of(&self, text: &[u8]) -> Option<f64> {
        self.lookup(text).map(|id| self.entries[id as usize].score)
    }

    pub fn entry(&self, id: TokenId) -> Option<&Entry> {
        self.entries.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries shadowed by an earlier entry with the same text.
    pub fn duplicates(&self) -> usize {
        self.entries.len() - self.token_ids.len()
    }

    pub fn order(&self) -> ScoreOrder {
        self.order
    }

    /// Header value of a fixed-binary source; informational only.
    pub fn max_token_length(&self) -> u32 {
        self.max_token_length
    }

    pub(crate) fn set_max_token_length(&mut self, n: u32) {
        self.max_token_length = n;
    }
}
