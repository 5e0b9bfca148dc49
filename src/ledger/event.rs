//! Ledger notifications
//!
//! Every successful mutation produces exactly one [`LedgerEvent`]. The ledger
//! also keeps a bounded journal of recent events.

use crate::ledger::address::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of records kept in the journal
pub const MAX_HISTORY: usize = 100;

/// A notification emitted by a successful ledger operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// Value moved. `from` is zero for mints, `to` is zero for burns.
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_string")]
        amount: u128,
    },
    /// Allowance set
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "amount_string")]
        amount: u128,
    },
    AddedToDenylist { account: Address },
    RemovedFromDenylist { account: Address },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

/// A journal entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the ledger's event sequence, starting at 0
    pub sequence: u64,
    pub event: LedgerEvent,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded event journal (keeps the last [`MAX_HISTORY`] records)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventJournal {
    records: VecDeque<EventRecord>,
    next_sequence: u64,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, evicting the oldest records when full
    pub fn record(&mut self, event: LedgerEvent) -> &EventRecord {
        while self.records.len() >= MAX_HISTORY {
            self.records.pop_front();
        }

        self.records.push_back(EventRecord {
            sequence: self.next_sequence,
            event,
            recorded_at: Utc::now(),
        });
        self.next_sequence += 1;

        &self.records[self.records.len() - 1]
    }

    /// Records from oldest to newest
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }
}

/// u128 amounts travel as decimal strings; JSON numbers cannot hold them.
pub(crate) mod amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Account -> amount maps with decimal-string values
pub(crate) mod amount_map {
    use crate::ledger::address::Address;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        amounts: &HashMap<Address, u128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        amounts
            .iter()
            .map(|(account, amount)| (account, amount.to_string()))
            .collect::<HashMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<Address, u128>, D::Error> {
        parse(HashMap::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }

    pub(crate) fn parse(
        raw: HashMap<Address, String>,
    ) -> Result<HashMap<Address, u128>, std::num::ParseIntError> {
        raw.into_iter()
            .map(|(account, amount)| amount.parse().map(|amount| (account, amount)))
            .collect()
    }
}

/// Owner -> spender -> amount maps with decimal-string values
pub(crate) mod nested_amount_map {
    use crate::ledger::address::Address;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        amounts: &HashMap<Address, HashMap<Address, u128>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        amounts
            .iter()
            .map(|(owner, spenders)| {
                let spenders: HashMap<_, _> = spenders
                    .iter()
                    .map(|(spender, amount)| (spender, amount.to_string()))
                    .collect();
                (owner, spenders)
            })
            .collect::<HashMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<Address, HashMap<Address, u128>>, D::Error> {
        HashMap::<Address, HashMap<Address, String>>::deserialize(deserializer)?
            .into_iter()
            .map(|(owner, spenders)| super::amount_map::parse(spenders).map(|s| (owner, s)))
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }
}
