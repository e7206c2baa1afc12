//! Character-level vocabulary derived from the corpus itself.
//!
//! Ids are assigned by ascending Unicode scalar value over the *set* of
//! characters seen in the corpus, so the same text always yields the same
//! vocabulary regardless of platform or hash seed.

use crate::errors::{Error, Result};
use crate::types::TokenId;
use crate::validate::ensure_vocab_fits;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharVocab {
    itos: Vec<char>,
    stoi: HashMap<char, TokenId>,
}

impl CharVocab {
    /// Builds the vocabulary from every distinct character in `text`.
    pub fn build(text: &str) -> Result<Self> {
        let distinct: BTreeSet<char> = text.chars().collect();
        Self::from_symbols(distinct.into_iter().collect())
    }

    /// Assigns id `i` to `symbols[i]`. Symbols must be unique.
    pub(crate) fn from_symbols(symbols: Vec<char>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        ensure_vocab_fits(symbols.len())?;

        let mut stoi = HashMap::with_capacity(symbols.len());
        for (id, &symbol) in symbols.iter().enumerate() {
            if stoi.insert(symbol, id as TokenId).is_some() {
                return Err(Error::Validation(format!(
                    "symbol {symbol:?} is assigned more than one id"
                )));
            }
        }

        Ok(Self {
            itos: symbols,
            stoi,
        })
    }

    pub fn len(&self) -> usize {
        self.itos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itos.is_empty()
    }

    /// Symbols in id order.
    pub fn symbols(&self) -> &[char] {
        &self.itos
    }

    pub fn id_of(&self, symbol: char) -> Option<TokenId> {
        self.stoi.get(&symbol).copied()
    }

    pub fn symbol_of(&self, id: TokenId) -> Option<char> {
        self.itos.get(id as usize).copied()
    }

    pub fn itos(&self) -> BTreeMap<TokenId, char> {
        self.itos
            .iter()
            .enumerate()
            .map(|(id, &symbol)| (id as TokenId, symbol))
            .collect()
    }

    pub fn stoi(&self) -> BTreeMap<char, TokenId> {
        self.stoi.iter().map(|(&symbol, &id)| (symbol, id)).collect()
    }

    pub fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        text.chars()
            .enumerate()
            .map(|(position, symbol)| {
                self.id_of(symbol)
                    .ok_or(Error::UnknownSymbol { symbol, position })
            })
            .collect()
    }

    pub fn decode(&self, ids: &[TokenId]) -> Result<String> {
        ids.iter()
            .enumerate()
            .map(|(position, &id)| {
                self.symbol_of(id)
                    .ok_or(Error::UnknownId { id, position })
            })
            .collect()
    }
}
