//! Block summaries used by fork-choice scoring.
//!
//! A [`BlockSummary`] carries only what the weight calculations need. The
//! full block (transactions, AT states) lives with the block store.

use crate::{BlockSignature, Error, PublicKey, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary of a block for chain-weight and fork-choice purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block height (genesis is height 1)
    pub height: u32,
    /// Block signature, absent for summaries of blocks not yet signed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<BlockSignature>,
    /// Public key of the block's minter
    pub minter_public_key: PublicKey,
    /// Effective minting level of the minter; 0 means not yet resolved
    #[serde(default)]
    pub minter_level: u8,
    /// Number of online accounts attested in the block
    #[serde(default)]
    pub online_accounts_count: u32,
}

impl BlockSummary {
    /// Creates a signed block summary with an unresolved minter level.
    pub fn new(
        height: u32,
        signature: BlockSignature,
        minter_public_key: PublicKey,
        online_accounts_count: u32,
    ) -> Self {
        Self {
            height,
            signature: Some(signature),
            minter_public_key,
            minter_level: 0,
            online_accounts_count,
        }
    }

    /// Sets the resolved minter level.
    pub fn with_minter_level(mut self, level: u8) -> Self {
        self.minter_level = level;
        self
    }

    /// Bytes a child block uses as its parent reference.
    ///
    /// The block signature when present, otherwise the minter public key.
    pub fn reference_bytes(&self) -> &[u8] {
        match &self.signature {
            Some(signature) => signature.as_bytes(),
            None => self.minter_public_key.as_bytes(),
        }
    }

    /// Returns true once the minter level has been resolved.
    #[inline]
    pub fn has_minter_level(&self) -> bool {
        self.minter_level > 0
    }

    /// Validates the summary against basic rules.
    pub fn validate_basic(&self) -> Result<()> {
        if self.height == 0 {
            return Err(Error::InvalidBlock("height must be at least 1".into()));
        }
        Ok(())
    }
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block(height={}, minter={}, level={}, online={})",
            self.height, self.minter_public_key, self.minter_level, self.online_accounts_count
        )
    }
}
