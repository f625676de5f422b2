use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dns_wire::protocol::rdata::RecordData;
use dns_wire::protocol::types::*;

/// A convenience wrapper around a `Cache` which lets it be shared
/// between threads.
///
/// Invoking `clone` on a `SharedCache` gives a new instance which
/// refers to the same underlying `Cache` object.
#[derive(Debug, Clone)]
pub struct SharedCache {
    cache: Arc<Mutex<Cache>>,
}

const MUTEX_POISON_MESSAGE: &str =
    "[INTERNAL ERROR] cache mutex poisoned, cannot recover from this - aborting";

impl SharedCache {
    /// Make a new, empty, shared cache.
    pub fn new() -> Self {
        SharedCache {
            cache: Arc::new(Mutex::new(Cache::new())),
        }
    }

    /// Create a new cache with the given desired size.
    pub fn with_desired_size(desired_size: usize) -> Self {
        SharedCache {
            cache: Arc::new(Mutex::new(Cache::with_desired_size(desired_size))),
        }
    }

    /// Get an entry from the cache.
    ///
    /// The TTL in the returned `ResourceRecord` is relative to the
    /// current time - not when the record was inserted into the
    /// cache.
    pub fn get(&self, name: &DomainName, qtype: RecordType) -> Vec<ResourceRecord> {
        let mut rrs = self.get_without_checking_expiration(name, qtype);
        rrs.retain(|rr| rr.ttl > 0);
        rrs
    }

    /// Like `get`, but may return expired entries.
    ///
    /// Consumers MUST check that the TTL of a record is nonzero
    /// before using it!
    pub fn get_without_checking_expiration(
        &self,
        name: &DomainName,
        qtype: RecordType,
    ) -> Vec<ResourceRecord> {
        self.cache
            .lock()
            .expect(MUTEX_POISON_MESSAGE)
            .get_without_checking_expiration(name, qtype)
    }

    /// Get an unexpired negative entry, if there is one: the
    /// disposition and the SOA which justified it, with its remaining
    /// TTL.
    pub fn get_negative(
        &self,
        name: &DomainName,
        qtype: RecordType,
    ) -> Option<(NegativeKind, Option<ResourceRecord>)> {
        self.cache
            .lock()
            .expect(MUTEX_POISON_MESSAGE)
            .get_negative(name, qtype)
    }

    /// Insert an entry into the cache.
    ///
    /// It is not inserted if its TTL is zero.
    ///
    /// This may make the cache grow beyond the desired size.
    pub fn insert(&self, record: &ResourceRecord) {
        if record.ttl > 0 {
            let mut cache = self.cache.lock().expect(MUTEX_POISON_MESSAGE);
            cache.insert(record);
        }
    }

    /// Insert a whole RRset, first normalising every TTL down to the
    /// set's minimum.
    pub fn insert_rrset(&self, records: &[ResourceRecord]) {
        let Some(min_ttl) = records.iter().map(|rr| rr.ttl).min() else {
            return;
        };
        for rr in records {
            let mut rr = rr.clone();
            rr.ttl = min_ttl;
            self.insert(&rr);
        }
    }

    /// Insert a negative entry: NXDOMAIN or NODATA for a `(name,
    /// type)`, justified by an optional SOA.  The TTL is the SOA's
    /// TTL clamped to its MINIMUM field (RFC 2308 section 5), or
    /// `fallback_ttl` without an SOA.
    pub fn insert_negative(
        &self,
        name: &DomainName,
        qtype: RecordType,
        kind: NegativeKind,
        soa: Option<&ResourceRecord>,
        fallback_ttl: u32,
    ) {
        let ttl = match soa {
            Some(rr) => {
                if let RecordData::Soa { minimum, .. } = &rr.data {
                    rr.ttl.min(*minimum)
                } else {
                    rr.ttl
                }
            }
            None => fallback_ttl,
        };

        if ttl > 0 {
            let mut cache = self.cache.lock().expect(MUTEX_POISON_MESSAGE);
            cache.insert_negative(name, qtype, kind, soa.cloned(), ttl);
        }
    }

    /// Atomically clears expired entries and, if the cache has grown
    /// beyond its desired size, prunes entries to get down to size.
    ///
    /// Returns `(has overflowed?, current size, num expired, num pruned)`.
    pub fn prune(&self) -> (bool, usize, usize, usize) {
        self.cache.lock().expect(MUTEX_POISON_MESSAGE).prune()
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The disposition of a cached negative answer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NegativeKind {
    /// The name does not exist at all.
    NxDomain,
    /// The name exists but has no records of the asked-for type.
    NoData,
}

/// Caching for `ResourceRecord`s, positive and negative.
///
/// You probably want to use `SharedCache` instead.
#[derive(Debug, Clone)]
pub struct Cache {
    /// Cached records, indexed by domain name.
    entries: HashMap<DomainName, CachedDomainRecords>,

    /// Priority queue of domain names ordered by access times.
    ///
    /// When the cache is full and there are no expired records to
    /// prune, domains will instead be pruned in LRU order.
    ///
    /// INVARIANT: the domains in here are exactly the domains in
    /// `entries`.
    access_priority: PriorityQueue<DomainName, Reverse<Instant>>,

    /// Priority queue of domain names ordered by expiry time.
    ///
    /// When the cache is pruned, expired records are removed first.
    ///
    /// INVARIANT: the domains in here are exactly the domains in
    /// `entries`.
    expiry_priority: PriorityQueue<DomainName, Reverse<Instant>>,

    /// The number of records in the cache, negative entries included.
    ///
    /// INVARIANT: this is the sum of the `size()`s of the entries.
    current_size: usize,

    /// The desired maximum number of records in the cache.
    desired_size: usize,
}

/// The cached records for a domain.
#[derive(Debug, Clone)]
struct CachedDomainRecords {
    /// The time this record was last read at.
    last_read: Instant,

    /// When the next RR (or negative entry) expires.
    ///
    /// INVARIANT: this is the minimum of the expiry times.
    next_expiry: Instant,

    /// The positive records, divided by record type.
    ///
    /// INVARIANT: the `RecordType` key matches `RecordData::rtype()`.
    records: HashMap<RecordType, Vec<(RecordData, RecordClass, Instant)>>,

    /// Negative dispositions, by the query type they answer.  This is
    /// the sentinel-type side of the cache: a `(name, type)` known to
    /// have no records, with the SOA which proved it.
    negative: HashMap<RecordType, (NegativeKind, Option<ResourceRecord>, Instant)>,
}

impl CachedDomainRecords {
    fn size(&self) -> usize {
        self.records.values().map(Vec::len).sum::<usize>() + self.negative.len()
    }

    fn min_expiry(&self) -> Option<Instant> {
        let positive = self.records.values().flatten().map(|(_, _, expiry)| *expiry);
        let negative = self.negative.values().map(|(_, _, expiry)| *expiry);
        positive.chain(negative).min()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Create a new cache with a default desired size.
    pub fn new() -> Self {
        Self::with_desired_size(512)
    }

    /// Create a new cache with the given desired size.
    ///
    /// If the number of entries exceeds this, expired and
    /// least-recently-used items will be pruned.
    ///
    /// # Panics
    ///
    /// If called with a `desired_size` of 0.
    pub fn with_desired_size(desired_size: usize) -> Self {
        assert!(desired_size > 0, "cannot create a zero-size cache");

        Self {
            // `desired_size / 2` is a compromise: most domains will
            // have more than one record, so `desired_size` would be
            // too big for the `entries`.
            entries: HashMap::with_capacity(desired_size / 2),
            access_priority: PriorityQueue::with_capacity(desired_size),
            expiry_priority: PriorityQueue::with_capacity(desired_size),
            current_size: 0,
            desired_size,
        }
    }

    /// Get an entry from the cache.
    ///
    /// The TTL in the returned `ResourceRecord` is relative to the
    /// current time - not when the record was inserted into the
    /// cache.
    ///
    /// This entry may have expired: if so, the TTL will be 0.
    /// Consumers MUST check this before using the record!
    pub fn get_without_checking_expiration(
        &mut self,
        name: &DomainName,
        qtype: RecordType,
    ) -> Vec<ResourceRecord> {
        if let Some(entry) = self.entries.get_mut(name) {
            let now = Instant::now();
            let mut rrs = Vec::new();
            if qtype == RecordType::ANY {
                for tuples in entry.records.values() {
                    to_rrs(name, now, tuples, &mut rrs);
                }
            } else if let Some(tuples) = entry.records.get(&qtype) {
                to_rrs(name, now, tuples, &mut rrs);
            }
            if !rrs.is_empty() {
                entry.last_read = now;
                self.access_priority
                    .change_priority(name, Reverse(entry.last_read));
            }
            rrs
        } else {
            Vec::new()
        }
    }

    /// Get an unexpired negative entry.  An NXDOMAIN disposition
    /// answers any query type; a NODATA disposition only its own.
    pub fn get_negative(
        &mut self,
        name: &DomainName,
        qtype: RecordType,
    ) -> Option<(NegativeKind, Option<ResourceRecord>)> {
        let entry = self.entries.get_mut(name)?;
        let now = Instant::now();

        let (kind, soa, expires) = entry
            .negative
            .get(&qtype)
            .or_else(|| {
                entry
                    .negative
                    .values()
                    .find(|(kind, _, _)| *kind == NegativeKind::NxDomain)
            })?
            .clone();

        if expires <= now {
            return None;
        }

        entry.last_read = now;
        self.access_priority
            .change_priority(name, Reverse(entry.last_read));

        let soa = soa.map(|mut rr| {
            rr.ttl = remaining_ttl(expires, now);
            rr
        });
        Some((kind, soa))
    }

    /// Insert an entry into the cache.
    pub fn insert(&mut self, record: &ResourceRecord) {
        let now = Instant::now();
        let rtype = record.rtype();
        let expiry = now + Duration::from_secs(record.ttl.into());
        let tuple = (record.data.clone(), record.rclass, expiry);

        if let Some(entry) = self.entries.get_mut(&record.name) {
            let mut removed = 0;
            if let Some(tuples) = entry.records.get_mut(&rtype) {
                for i in 0..tuples.len() {
                    if tuples[i].0 == tuple.0 && tuples[i].1 == tuple.1 {
                        tuples.swap_remove(i);
                        removed += 1;
                        break;
                    }
                }
                tuples.push(tuple);
            } else {
                entry.records.insert(rtype, vec![tuple]);
            }

            // a real record supersedes a cached negative for its type
            if entry.negative.remove(&rtype).is_some() {
                removed += 1;
            }

            self.current_size -= removed;
            entry.last_read = now;
            self.access_priority
                .change_priority(&record.name, Reverse(entry.last_read));
            self.recompute_next_expiry(&record.name);
        } else {
            let mut records = HashMap::new();
            records.insert(rtype, vec![tuple]);
            let entry = CachedDomainRecords {
                last_read: now,
                next_expiry: expiry,
                records,
                negative: HashMap::new(),
            };
            self.access_priority
                .push(record.name.clone(), Reverse(entry.last_read));
            self.expiry_priority
                .push(record.name.clone(), Reverse(entry.next_expiry));
            self.entries.insert(record.name.clone(), entry);
        }

        self.current_size += 1;
    }

    /// Insert a negative entry, replacing any previous one for the
    /// same query type.
    pub fn insert_negative(
        &mut self,
        name: &DomainName,
        qtype: RecordType,
        kind: NegativeKind,
        soa: Option<ResourceRecord>,
        ttl: u32,
    ) {
        let now = Instant::now();
        let expiry = now + Duration::from_secs(ttl.into());

        if let Some(entry) = self.entries.get_mut(name) {
            if entry.negative.insert(qtype, (kind, soa, expiry)).is_some() {
                self.current_size -= 1;
            }
            entry.last_read = now;
            self.access_priority
                .change_priority(name, Reverse(entry.last_read));
            self.recompute_next_expiry(name);
        } else {
            let mut negative = HashMap::new();
            negative.insert(qtype, (kind, soa, expiry));
            let entry = CachedDomainRecords {
                last_read: now,
                next_expiry: expiry,
                records: HashMap::new(),
                negative,
            };
            self.access_priority
                .push(name.clone(), Reverse(entry.last_read));
            self.expiry_priority
                .push(name.clone(), Reverse(entry.next_expiry));
            self.entries.insert(name.clone(), entry);
        }

        self.current_size += 1;
    }

    /// Delete all expired records.
    ///
    /// Returns the number of records deleted.
    pub fn remove_expired(&mut self) -> usize {
        let mut pruned = 0;

        loop {
            let before = pruned;
            pruned += self.remove_expired_step();
            if before == pruned {
                break;
            }
        }

        pruned
    }

    /// Delete all expired records, and then enough
    /// least-recently-used records to reduce the cache to the desired
    /// size.
    ///
    /// Returns `(has overflowed?, current size, num expired, num pruned)`.
    pub fn prune(&mut self) -> (bool, usize, usize, usize) {
        let has_overflowed = self.current_size > self.desired_size;
        let num_expired = self.remove_expired();
        let mut num_pruned = 0;

        while self.current_size > self.desired_size {
            num_pruned += self.remove_least_recently_used();
        }

        (has_overflowed, self.current_size, num_expired, num_pruned)
    }

    /// Recompute an entry's next-expiry and keep the expiry queue in
    /// sync.
    fn recompute_next_expiry(&mut self, name: &DomainName) {
        if let Some(entry) = self.entries.get_mut(name) {
            if let Some(min) = entry.min_expiry() {
                entry.next_expiry = min;
                self.expiry_priority
                    .change_priority(name, Reverse(entry.next_expiry));
            }
        }
    }

    /// Helper for `remove_expired`: looks at the next-to-expire
    /// domain and cleans up expired records from it.  This may delete
    /// more than one record, and may even delete the whole domain.
    ///
    /// Returns the number of records removed.
    fn remove_expired_step(&mut self) -> usize {
        if let Some((name, Reverse(expiry))) = self.expiry_priority.pop() {
            let now = Instant::now();

            if expiry > now {
                self.expiry_priority.push(name, Reverse(expiry));
                return 0;
            }

            if let Some(entry) = self.entries.get_mut(&name) {
                let size_before = entry.size();

                for tuples in entry.records.values_mut() {
                    tuples.retain(|(_, _, expiry)| *expiry > now);
                }
                entry.records.retain(|_, tuples| !tuples.is_empty());
                entry.negative.retain(|_, (_, _, expiry)| *expiry > now);

                let pruned = size_before - entry.size();
                self.current_size -= pruned;

                if let Some(ne) = entry.min_expiry() {
                    entry.next_expiry = ne;
                    self.expiry_priority.push(name, Reverse(ne));
                } else {
                    self.entries.remove(&name);
                    self.access_priority.remove(&name);
                }

                pruned
            } else {
                self.access_priority.remove(&name);
                0
            }
        } else {
            0
        }
    }

    /// Helper for `prune`: deletes all records associated with the
    /// least recently used domain.
    ///
    /// Returns the number of records removed.
    fn remove_least_recently_used(&mut self) -> usize {
        if let Some((name, _)) = self.access_priority.pop() {
            self.expiry_priority.remove(&name);

            if let Some(entry) = self.entries.remove(&name) {
                let pruned = entry.size();
                self.current_size -= pruned;
                pruned
            } else {
                0
            }
        } else {
            0
        }
    }
}

/// Helper for `get_without_checking_expiration`: converts the cached
/// record tuples into RRs.
fn to_rrs(
    name: &DomainName,
    now: Instant,
    tuples: &[(RecordData, RecordClass, Instant)],
    rrs: &mut Vec<ResourceRecord>,
) {
    for (data, rclass, expires) in tuples {
        rrs.push(ResourceRecord {
            name: name.clone(),
            data: data.clone(),
            rclass: *rclass,
            ttl: remaining_ttl(*expires, now),
        });
    }
}

fn remaining_ttl(expires: Instant, now: Instant) -> u32 {
    match expires.saturating_duration_since(now).as_secs().try_into() {
        Ok(ttl) => ttl,
        Err(_) => u32::MAX,
    }
}

#[cfg(test)]
mod tests {
    use dns_wire::protocol::types::test_util::*;

    use super::test_util::*;
    use super::*;

    #[test]
    fn cache_put_can_get() {
        for _ in 0..100 {
            let mut cache = Cache::new();
            let rr = arbitrary_resourcerecord();
            cache.insert(&rr);

            assert_cache_response(
                &rr,
                cache.get_without_checking_expiration(&rr.name, rr.rtype()),
            );
            assert_cache_response(
                &rr,
                cache.get_without_checking_expiration(&rr.name, RecordType::ANY),
            );
        }
    }

    #[test]
    fn cache_put_deduplicates_and_maintains_invariants() {
        let mut cache = Cache::new();
        let rr = arbitrary_resourcerecord();

        cache.insert(&rr);
        cache.insert(&rr);

        assert_eq!(1, cache.current_size);
        assert_invariants(&cache);
    }

    #[test]
    fn cache_put_maintains_invariants() {
        let mut cache = Cache::new();

        for _ in 0..100 {
            cache.insert(&arbitrary_resourcerecord());
        }

        assert_invariants(&cache);
    }

    #[test]
    fn cache_put_then_get_maintains_invariants() {
        let mut cache = Cache::new();
        let mut queries = Vec::new();

        for _ in 0..100 {
            let rr = arbitrary_resourcerecord();
            cache.insert(&rr);
            queries.push((rr.name.clone(), rr.rtype()));
        }
        for (name, qtype) in queries {
            cache.get_without_checking_expiration(&name, qtype);
        }

        assert_invariants(&cache);
    }

    #[test]
    fn cache_put_then_prune_maintains_invariants() {
        let mut cache = Cache::with_desired_size(25);

        for _ in 0..100 {
            let mut rr = arbitrary_resourcerecord();
            rr.ttl = 300; // this case isn't testing expiration
            cache.insert(&rr);
        }

        // might be more than 75 because the size is measured in
        // records, but pruning is done on whole domains
        let (overflow, current_size, expired, pruned) = cache.prune();
        assert!(overflow);
        assert_eq!(0, expired);
        assert!(pruned >= 75);
        assert!(cache.current_size <= 25);
        assert_eq!(cache.current_size, current_size);
        assert_invariants(&cache);
    }

    #[test]
    fn cache_put_then_expire_maintains_invariants() {
        let mut cache = Cache::new();

        for i in 0..100 {
            let mut rr = arbitrary_resourcerecord();
            rr.ttl = if i > 0 && i % 2 == 0 { 0 } else { 300 };
            cache.insert(&rr);
        }

        assert_eq!(49, cache.remove_expired());
        assert_eq!(51, cache.current_size);
        assert_invariants(&cache);
    }

    #[test]
    fn cache_negative_put_can_get() {
        let mut cache = Cache::new();
        let soa = soa_record(
            "example.com.",
            "ns1.example.com.",
            "admin.example.com.",
            1,
            2,
            3,
            4,
            300,
        );

        cache.insert_negative(
            &domain("www.example.com."),
            RecordType::AAAA,
            NegativeKind::NoData,
            Some(soa.clone()),
            300,
        );

        let (kind, cached_soa) = cache
            .get_negative(&domain("www.example.com."), RecordType::AAAA)
            .unwrap();
        assert_eq!(NegativeKind::NoData, kind);
        assert_eq!(soa.data, cached_soa.unwrap().data);

        // NODATA for AAAA says nothing about A
        assert_eq!(
            None,
            cache.get_negative(&domain("www.example.com."), RecordType::A)
        );

        assert_invariants(&cache);
    }

    #[test]
    fn cache_nxdomain_answers_all_types() {
        let mut cache = Cache::new();
        cache.insert_negative(
            &domain("gone.example.com."),
            RecordType::A,
            NegativeKind::NxDomain,
            None,
            300,
        );

        for qtype in [RecordType::A, RecordType::AAAA, RecordType::MX] {
            let (kind, _) = cache
                .get_negative(&domain("gone.example.com."), qtype)
                .unwrap();
            assert_eq!(NegativeKind::NxDomain, kind);
        }
    }

    #[test]
    fn cache_positive_insert_clears_negative() {
        let mut cache = Cache::new();
        let name = domain("www.example.com.");

        cache.insert_negative(&name, RecordType::A, NegativeKind::NoData, None, 300);
        cache.insert(&a_record("www.example.com.", "192.0.2.1".parse().unwrap()));

        assert_eq!(None, cache.get_negative(&name, RecordType::A));
        assert_eq!(
            1,
            cache
                .get_without_checking_expiration(&name, RecordType::A)
                .len()
        );
        assert_eq!(1, cache.current_size);
        assert_invariants(&cache);
    }

    fn assert_invariants(cache: &Cache) {
        assert_eq!(
            cache.current_size,
            cache
                .entries
                .values()
                .map(CachedDomainRecords::size)
                .sum::<usize>()
        );

        assert_eq!(cache.entries.len(), cache.access_priority.len());
        assert_eq!(cache.entries.len(), cache.expiry_priority.len());

        for (name, entry) in &cache.entries {
            for (rtype, tuples) in &entry.records {
                assert!(!tuples.is_empty());
                for (data, _, _) in tuples {
                    assert_eq!(*rtype, data.rtype());
                }
            }

            assert_eq!(Some(entry.next_expiry), entry.min_expiry());

            assert!(cache.access_priority.get(name).is_some());
            assert!(cache.expiry_priority.get(name).is_some());
        }
    }
}

#[cfg(test)]
pub mod test_util {
    use super::*;

    /// Assert that the cache response has exactly one element and
    /// that it matches the original (all fields equal except TTL,
    /// where the original is >=).
    pub fn assert_cache_response(original: &ResourceRecord, response: Vec<ResourceRecord>) {
        assert_eq!(1, response.len());
        let cached = response[0].clone();

        assert_eq!(original.name, cached.name);
        assert_eq!(original.data, cached.data);
        assert_eq!(original.rclass, cached.rclass);
        assert!(original.ttl >= cached.ttl);
    }
}
