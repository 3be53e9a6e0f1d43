// ABOUTME: Random host port allocation from per-service ranges.
// ABOUTME: PortRange draws uniformly; PortTable maps logical names to drawn ports.

use rand::Rng;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive range of host ports reserved for one kind of port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    pub fn pick(&self) -> u16 {
        if self.start >= self.end {
            return self.start;
        }
        rand::thread_rng().gen_range(self.start..=self.end)
    }

    /// Like [`pick`](Self::pick), but skips `taken`.
    ///
    /// Falls back to a plain draw when every port of the range is taken.
    pub fn pick_excluding(&self, taken: &BTreeSet<u16>) -> u16 {
        const DRAWS: usize = 16;
        for _ in 0..DRAWS {
            let port = self.pick();
            if !taken.contains(&port) {
                return port;
            }
        }
        (self.start..=self.end)
            .find(|port| !taken.contains(port))
            .unwrap_or_else(|| self.pick())
    }
}

/// A named port in a service's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSlot {
    pub name: &'static str,
    pub range: PortRange,
}

impl PortSlot {
    pub const fn new(name: &'static str, start: u16, end: u16) -> Self {
        Self {
            name,
            range: PortRange::new(start, end),
        }
    }
}

/// Logical port name to host port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortTable {
    ports: BTreeMap<String, u16>,
}

impl PortTable {
    /// Fill every slot of `layout`, taking `preferred` values where given.
    ///
    /// Drawn ports never repeat a value already in the table, so two slots
    /// sharing a range cannot end up on the same host port. Preferred values
    /// are placed first and taken as given.
    pub fn allocate(layout: &[PortSlot], preferred: &BTreeMap<String, u16>) -> Self {
        let mut ports: BTreeMap<String, u16> = layout
            .iter()
            .filter_map(|slot| {
                preferred
                    .get(slot.name)
                    .map(|port| (slot.name.to_string(), *port))
            })
            .collect();

        for slot in layout {
            if ports.contains_key(slot.name) {
                continue;
            }
            let taken: BTreeSet<u16> = ports.values().copied().collect();
            ports.insert(slot.name.to_string(), slot.range.pick_excluding(&taken));
        }
        Self { ports }
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.ports.get(name).copied()
    }

    /// Port for a slot of the layout this table was allocated from.
    ///
    /// Layouts are static, so a missing name is a profile bug; it renders
    /// as port 0, which the engine rejects on create.
    pub fn port(&self, name: &str) -> u16 {
        self.get(name).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.ports.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LAYOUT: &[PortSlot] = &[
        PortSlot::new("port", 20002, 29998),
        PortSlot::new("zmqport", 40002, 40998),
    ];

    #[test]
    fn allocates_every_slot() {
        let table = PortTable::allocate(LAYOUT, &BTreeMap::new());
        assert!(PortRange::new(20002, 29998).contains(table.port("port")));
        assert!(PortRange::new(40002, 40998).contains(table.port("zmqport")));
        assert_eq!(table.get("rpcport"), None);
    }

    #[test]
    fn preferred_values_are_used() {
        let preferred = BTreeMap::from([("port".to_string(), 1234)]);
        let table = PortTable::allocate(LAYOUT, &preferred);
        assert_eq!(table.port("port"), 1234);
    }

    #[test]
    fn degenerate_range_returns_its_only_port() {
        assert_eq!(PortRange::new(5001, 5001).pick(), 5001);
    }

    #[test]
    fn slots_sharing_a_range_get_distinct_ports() {
        const NARROW: &[PortSlot] = &[
            PortSlot::new("port", 20002, 20003),
            PortSlot::new("rpcport", 20002, 20003),
        ];
        for _ in 0..64 {
            let table = PortTable::allocate(NARROW, &BTreeMap::new());
            assert_ne!(table.port("port"), table.port("rpcport"));
        }
    }

    #[test]
    fn drawn_ports_avoid_preferred_values() {
        const SINGLE: &[PortSlot] = &[
            PortSlot::new("port", 20002, 20003),
            PortSlot::new("rpcport", 20002, 20003),
        ];
        let preferred = BTreeMap::from([("rpcport".to_string(), 20002)]);
        for _ in 0..32 {
            let table = PortTable::allocate(SINGLE, &preferred);
            assert_eq!(table.port("rpcport"), 20002);
            assert_eq!(table.port("port"), 20003);
        }
    }

    #[test]
    fn full_range_still_yields_a_port() {
        let range = PortRange::new(5001, 5001);
        assert_eq!(range.pick_excluding(&BTreeSet::from([5001])), 5001);
    }

    proptest! {
        #[test]
        fn pick_stays_in_range(start in 1024u16..60000, width in 0u16..5000) {
            let range = PortRange::new(start, start.saturating_add(width));
            prop_assert!(range.contains(range.pick()));
        }

        #[test]
        fn chain_node_layout_never_collides(_seed in 0u32..256) {
            const CHAIN: &[PortSlot] = &[
                PortSlot::new("port", 20002, 20004),
                PortSlot::new("rpcport", 20002, 20004),
                PortSlot::new("zmqport", 20002, 20004),
            ];
            let table = PortTable::allocate(CHAIN, &BTreeMap::new());
            let values: BTreeSet<u16> = table.iter().map(|(_, port)| port).collect();
            prop_assert_eq!(values.len(), 3);
        }
    }
}
