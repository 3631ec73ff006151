use std::{collections::BTreeMap, fmt, fmt::Write as _};

use primitive_types::{H160, U256};

use crate::Host;

/// Canonical text dump of an account's persistent storage.
///
/// Slots are sorted by key and zero-valued slots are left out, so two accounts with the same
/// key/value pairs always produce the same text no matter in which order the host hands them out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorageSnapshot(String);

impl StorageSnapshot {
    /// Reads back the storage of `address`.
    pub fn capture<H: Host + ?Sized>(host: &H, address: H160) -> Self {
        Self::from_slots(host.storage_at(address))
    }

    /// Renders a set of slots.
    pub fn from_slots(slots: impl IntoIterator<Item = (U256, U256)>) -> Self {
        let sorted: BTreeMap<U256, U256> = slots
            .into_iter()
            .filter(|(_, value)| !value.is_zero())
            .collect();

        let mut text = String::new();
        for (key, value) in sorted {
            // Writing to a `String` cannot fail.
            let _ = writeln!(text, "0x{}: 0x{}", word_hex(key), word_hex(value));
        }
        Self(text)
    }

    /// The rendered dump.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no slot holds a non-zero value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StorageSnapshot {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

fn word_hex(word: U256) -> String {
    let mut bytes = [0; 32];
    word.to_big_endian(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn rendering() {
        let snapshot = StorageSnapshot::from_slots([(U256::from(1), U256::from(2))]);
        assert_eq!(snapshot.as_str(), format!("0x{:064x}: 0x{:064x}\n", 1, 2));
    }

    #[test]
    fn zero_slots_are_omitted() {
        let snapshot = StorageSnapshot::from_slots([
            (U256::from(1), U256::zero()),
            (U256::from(2), U256::one()),
        ]);
        assert_eq!(
            snapshot,
            StorageSnapshot::from_slots([(U256::from(2), U256::one())])
        );
        assert!(StorageSnapshot::from_slots([(U256::from(7), U256::zero())]).is_empty());
    }

    proptest! {
        #[test]
        fn snapshot_is_independent_of_write_order(
            slots in proptest::collection::btree_map(any::<u64>(), 1..u64::MAX, 0..32),
            seed in any::<u64>(),
        ) {
            let slots: Vec<_> = slots
                .into_iter()
                .map(|(key, value)| (U256::from(key), U256::from(value)))
                .collect();

            let mut shuffled = slots.clone();
            // Cheap deterministic permutation.
            let len = shuffled.len().max(1);
            shuffled.rotate_left(usize::try_from(seed).unwrap_or(0) % len);
            shuffled.reverse();

            prop_assert_eq!(
                StorageSnapshot::from_slots(slots.clone()),
                StorageSnapshot::from_slots(shuffled)
            );
            prop_assert_eq!(
                StorageSnapshot::from_slots(slots.clone()).as_str().lines().count(),
                slots.len()
            );
        }
    }
}
