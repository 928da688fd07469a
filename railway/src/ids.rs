use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CarID(pub usize);

impl CheapID for StationID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}
impl CheapID for LineID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}

pub trait CheapID: Copy {
    fn new(x: usize) -> Self;
}

/// Maps the names used in the input files to cheap IDs. Only lives while the network is being
/// assembled; nothing looks things up by name afterwards.
pub struct IDMapping<V> {
    name_to_cheap: BTreeMap<String, V>,
    next: usize,
}

impl<V: CheapID> IDMapping<V> {
    pub fn new() -> Self {
        Self {
            name_to_cheap: BTreeMap::new(),
            next: 0,
        }
    }

    pub fn insert_new(&mut self, name: &str) -> Result<V> {
        if self.name_to_cheap.contains_key(name) {
            bail!("Duplicate name {name}");
        }
        let cheap = V::new(self.next);
        self.next += 1;
        self.name_to_cheap.insert(name.to_string(), cheap);
        Ok(cheap)
    }

    /// Another name for an existing object. Doesn't allocate a new ID.
    pub fn insert_alias(&mut self, alias: &str, existing: V) -> Result<()> {
        if self.name_to_cheap.contains_key(alias) {
            bail!("Alias {alias} is already used");
        }
        self.name_to_cheap.insert(alias.to_string(), existing);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<V> {
        match self.name_to_cheap.get(name) {
            Some(x) => Ok(*x),
            None => bail!("Unknown name {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_share_an_id() {
        let mut ids: IDMapping<StationID> = IDMapping::new();
        let tokyo = ids.insert_new("Tokyo").unwrap();
        let kanda = ids.insert_new("Kanda").unwrap();
        ids.insert_alias("Tōkyō", tokyo).unwrap();

        assert_eq!(tokyo, StationID(0));
        assert_eq!(kanda, StationID(1));
        assert_eq!(ids.lookup("Tōkyō").unwrap(), tokyo);
        assert_eq!(ids.insert_new("Yurakucho").unwrap(), StationID(2));
    }

    #[test]
    fn duplicates_and_unknowns_fail() {
        let mut ids: IDMapping<LineID> = IDMapping::new();
        ids.insert_new("JY").unwrap();
        assert!(ids.insert_new("JY").is_err());
        assert!(ids.insert_alias("JY", LineID(0)).is_err());
        assert!(ids.lookup("JK").is_err());
    }
}
