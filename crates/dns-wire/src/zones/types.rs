use std::collections::HashMap;

use crate::protocol::rdata::RecordData;
use crate::protocol::types::{DomainName, RecordType, ResourceRecord};

/// A two-level mapping: owner name, then record type, then the
/// records of that RRset.
///
/// Owner names compare and hash case-insensitively, so lookups do not
/// care about the case records were inserted with.  Records within an
/// RRset keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneIndex {
    entries: HashMap<DomainName, HashMap<RecordType, Vec<ResourceRecord>>>,
    size: usize,
}

impl ZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The total number of records.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Append a record to its RRset, creating it if needed.  The
    /// whole RRset's TTLs are normalised down to the minimum, so an
    /// RRset always has a single effective TTL.  An exact duplicate
    /// (ignoring TTL) is not added twice.
    pub fn insert(&mut self, rr: &ResourceRecord) {
        let rrset = self
            .entries
            .entry(rr.name.clone())
            .or_default()
            .entry(rr.rtype())
            .or_default();

        let mut min_ttl = rr.ttl;
        for existing in rrset.iter() {
            min_ttl = min_ttl.min(existing.ttl);
        }

        if !rrset
            .iter()
            .any(|existing| existing.data == rr.data && existing.rclass == rr.rclass)
        {
            rrset.push(rr.clone());
            self.size += 1;
        }

        for existing in rrset.iter_mut() {
            existing.ttl = min_ttl;
        }
    }

    /// Replace an entire RRset.  Records whose name or type disagree
    /// with the key are skipped.
    pub fn replace_rrset(
        &mut self,
        name: &DomainName,
        rtype: RecordType,
        rrs: Vec<ResourceRecord>,
    ) {
        self.remove(name, rtype);
        for rr in rrs {
            if rr.name == *name && rr.rtype() == rtype {
                self.insert(&rr);
            }
        }
    }

    pub fn remove(&mut self, name: &DomainName, rtype: RecordType) {
        if let Some(types) = self.entries.get_mut(name) {
            if let Some(rrset) = types.remove(&rtype) {
                self.size -= rrset.len();
            }
            if types.is_empty() {
                self.entries.remove(name);
            }
        }
    }

    /// The RRset for a name and type, if there is one.
    pub fn lookup(&self, name: &DomainName, rtype: RecordType) -> Option<&[ResourceRecord]> {
        self.entries
            .get(name)
            .and_then(|types| types.get(&rtype))
            .map(Vec::as_slice)
    }

    /// All RRsets at a name, for `ANY` queries.
    pub fn lookup_all(&self, name: &DomainName) -> Vec<&ResourceRecord> {
        match self.entries.get(name) {
            Some(types) => types.values().flatten().collect(),
            None => Vec::new(),
        }
    }

    /// The A and AAAA records this index holds for the targets of the
    /// given NS records: the glue which lets a referral be followed
    /// without another resolution.
    pub fn glue_for(&self, ns_rrs: &[ResourceRecord]) -> Vec<ResourceRecord> {
        let mut glue = Vec::new();
        for rr in ns_rrs {
            if let RecordData::Name {
                tag: RecordType::NS,
                name: target,
            } = &rr.data
            {
                for rtype in [RecordType::A, RecordType::AAAA] {
                    if let Some(rrset) = self.lookup(target, rtype) {
                        glue.extend(rrset.iter().cloned());
                    }
                }
            }
        }
        glue
    }

    /// Iterate over every record.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.entries.values().flat_map(HashMap::values).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    #[test]
    fn insert_and_lookup_is_case_insensitive() {
        let mut index = ZoneIndex::new();
        index.insert(&a_record("WWW.Example.COM.", Ipv4Addr::new(192, 0, 2, 1)));

        let found = index
            .lookup(&domain("www.example.com."), RecordType::A)
            .unwrap();
        assert_eq!(1, found.len());
        assert_eq!(1, index.len());
    }

    #[test]
    fn insert_normalises_ttl_to_minimum() {
        let mut index = ZoneIndex::new();
        let mut rr1 = a_record("example.com.", Ipv4Addr::new(1, 1, 1, 1));
        let mut rr2 = a_record("example.com.", Ipv4Addr::new(2, 2, 2, 2));
        rr1.ttl = 600;
        rr2.ttl = 60;

        index.insert(&rr1);
        index.insert(&rr2);

        let found = index.lookup(&domain("example.com."), RecordType::A).unwrap();
        assert_eq!(2, found.len());
        assert!(found.iter().all(|rr| rr.ttl == 60));
    }

    #[test]
    fn insert_deduplicates() {
        let mut index = ZoneIndex::new();
        let rr = a_record("example.com.", Ipv4Addr::new(1, 1, 1, 1));
        index.insert(&rr);
        index.insert(&rr);
        assert_eq!(1, index.len());
    }

    #[test]
    fn replace_rrset_replaces() {
        let mut index = ZoneIndex::new();
        index.insert(&a_record("example.com.", Ipv4Addr::new(1, 1, 1, 1)));
        index.replace_rrset(
            &domain("example.com."),
            RecordType::A,
            vec![
                a_record("example.com.", Ipv4Addr::new(2, 2, 2, 2)),
                // wrong name: skipped
                a_record("other.com.", Ipv4Addr::new(3, 3, 3, 3)),
            ],
        );

        let found = index.lookup(&domain("example.com."), RecordType::A).unwrap();
        assert_eq!(1, found.len());
        assert_eq!(
            RecordData::A {
                address: Ipv4Addr::new(2, 2, 2, 2)
            },
            found[0].data
        );
        assert!(index.lookup(&domain("other.com."), RecordType::A).is_none());
    }

    #[test]
    fn glue_covers_a_and_aaaa() {
        let mut index = ZoneIndex::new();
        index.insert(&a_record("ns1.example.com.", Ipv4Addr::new(192, 0, 2, 53)));
        index.insert(&aaaa_record("ns1.example.com.", "2001:db8::53".parse().unwrap()));
        index.insert(&a_record("unrelated.example.com.", Ipv4Addr::new(192, 0, 2, 99)));

        let ns = vec![ns_record("example.com.", "ns1.example.com.")];
        let glue = index.glue_for(&ns);
        assert_eq!(2, glue.len());
    }

    #[test]
    fn lookup_all_returns_every_type() {
        let mut index = ZoneIndex::new();
        index.insert(&a_record("example.com.", Ipv4Addr::new(1, 1, 1, 1)));
        index.insert(&mx_record("example.com.", 10, "mail.example.com."));
        assert_eq!(2, index.lookup_all(&domain("example.com.")).len());
    }
}
