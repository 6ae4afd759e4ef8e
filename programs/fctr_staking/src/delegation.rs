use std::io::{self, Write};

use anchor_lang::prelude::*;
use tinyvec::ArrayVec;

use crate::error::StakingError;

/// Hard cap on grantors (active plus pending) per confidant.
pub const MAX_GRANTORS: usize = 4;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrantorRecord {
    pub grantor: Pubkey,
    pub amount: u64,
    pub joined_at: u64,
    /// Seconds of the round this grantor takes part in.
    pub weight: u64,
}

impl GrantorRecord {
    pub const SPACE: usize = 32 + 8 + 8 + 8;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrantorHistoryRecord {
    pub grantor: Pubkey,
    pub amount: u64,
    pub grant_ts: u64,
}

impl GrantorHistoryRecord {
    pub const SPACE: usize = 32 + 8 + 8;
}

/// Fixed-capacity set of grantors. Serialized like a `Vec` so the account
/// layout stays readable by clients.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantorSet(ArrayVec<[GrantorRecord; MAX_GRANTORS]>);

impl GrantorSet {
    pub const SPACE: usize = 4 + MAX_GRANTORS * GrantorRecord::SPACE;

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[GrantorRecord] {
        self.0.as_slice()
    }

    pub fn contains(&self, grantor: &Pubkey) -> bool {
        self.0.iter().any(|g| g.grantor == *grantor)
    }

    pub fn push(&mut self, record: GrantorRecord) -> Result<()> {
        match self.0.try_push(record) {
            None => Ok(()),
            Some(_) => err!(StakingError::DelegationCapacityExceeded),
        }
    }

    pub fn remove(&mut self, grantor: &Pubkey) -> Option<GrantorRecord> {
        let index = self.0.iter().position(|g| g.grantor == *grantor)?;
        Some(self.0.remove(index))
    }

    pub fn take(&mut self) -> GrantorSet {
        GrantorSet(self.0.drain(..).collect())
    }
}

impl AnchorSerialize for GrantorSet {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        (self.0.len() as u32).serialize(writer)?;
        for record in self.0.iter() {
            record.serialize(writer)?;
        }
        Ok(())
    }
}

impl AnchorDeserialize for GrantorSet {
    fn deserialize(buf: &mut &[u8]) -> io::Result<Self> {
        let len = u32::deserialize(buf)? as usize;
        if len > MAX_GRANTORS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "grantor set exceeds capacity",
            ));
        }
        let mut records = ArrayVec::new();
        for _ in 0..len {
            records.push(GrantorRecord::deserialize(buf)?);
        }
        Ok(GrantorSet(records))
    }
}
