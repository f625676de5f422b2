//! The recursive descent itself: starting from the root hints, chase
//! referrals towards the query name, unroll CNAMEs, and fall back
//! between servers and transports as things fail.
//!
//! Each attempt against a server is an event loop over
//! `{Response, Timeout, Cancelled}`: datagrams which do not validate
//! against the request are dropped silently and the attempt keeps
//! waiting, which is what makes response forgery expensive.

use async_recursion::async_recursion;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::time::Instant;

use dns_wire::protocol::rdata::RecordData;
use dns_wire::protocol::types::*;
use dns_wire::zones::ZoneIndex;

use crate::cache::{NegativeKind, SharedCache};
use crate::cancel::CancelSignal;
use crate::hints::RootHints;
use crate::metrics::Metrics;
use crate::transport::{Protocol, Transport, TransportSocket};
use crate::util::nameserver::{get_nxdomain_nodata_soa, response_matches_request};
use crate::util::types::*;

/// Maximum number of referrals a single query may follow.
pub const MAX_REFERRAL_DEPTH: usize = 10;

/// Maximum length of a CNAME chain.
///
/// This is to protect against a maliciously-configured upstream
/// nameserver which returns an infinite stream of CNAME records when
/// trying to resolve some other record type.
pub const MAX_CNAME_CHAIN: usize = 10;

/// Attempts against one server before rotating to the next.
pub const SERVER_FAILURE_LIMIT: usize = 3;

pub const UDP_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);
pub const TCP_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for the recursion which resolving glueless nameservers can
/// trigger (resolving an NS target may itself hit a glueless
/// referral, and so on).
const RECURSION_LIMIT: usize = 32;

/// Recursive DNS resolution.
///
/// Local zone data and the cache are consulted first; after that this
/// descends from the root hints.  Since it may make network requests,
/// this function is async.
///
/// See section 5.3.3 of RFC 1034.
///
/// # Errors
///
/// See `ResolutionError`.
pub async fn resolve_recursive<T: Transport + Sync>(
    transport: &T,
    zones: &ZoneIndex,
    cache: &SharedCache,
    hints: &RootHints,
    metrics: &mut Metrics,
    question: &Question,
    cancel: &CancelSignal,
) -> Result<ResolvedAnswer, ResolutionError> {
    resolve_with_budget(
        transport,
        zones,
        cache,
        hints,
        metrics,
        question,
        cancel,
        RECURSION_LIMIT,
    )
    .await
}

#[async_recursion]
#[allow(clippy::too_many_arguments)]
async fn resolve_with_budget<T: Transport + Sync>(
    transport: &T,
    zones: &ZoneIndex,
    cache: &SharedCache,
    hints: &RootHints,
    metrics: &mut Metrics,
    question: &Question,
    cancel: &CancelSignal,
    budget: usize,
) -> Result<ResolvedAnswer, ResolutionError> {
    if budget == 0 {
        tracing::debug!("hit recursion limit");
        return Err(ResolutionError::DepthLimit);
    }

    let mut chain = 0;
    let mut collected = Vec::new();
    let mut current = question.clone();

    loop {
        if cancel.is_cancelled() {
            return Err(ResolutionError::Cancelled);
        }

        // local zone data answers without touching the network
        if let Some(rrs) = zones.lookup(&current.name, current.qtype) {
            let mut rrs: Vec<ResourceRecord> = rrs
                .iter()
                .filter(|rr| rr.rclass.matches(current.qclass))
                .cloned()
                .collect();
            if !rrs.is_empty() {
                tracing::trace!("got authoritative answer");
                metrics.zone_hit();
                collected.append(&mut rrs);
                return Ok(ResolvedAnswer::positive(collected));
            }
        }

        // then the cache, positive before negative
        let cached = cache.get(&current.name, current.qtype);
        if !cached.is_empty() {
            tracing::trace!("got cached answer");
            metrics.cache_hit();
            collected.extend(cached);
            return Ok(ResolvedAnswer::positive(collected));
        }

        if current.qtype != RecordType::CNAME {
            let link = zone_or_cache_cname(zones, cache, &current.name);
            if let Some((link, target)) = link {
                tracing::trace!(%target, "following cached CNAME");
                metrics.cache_hit();
                metrics.cname_link();
                collected.push(link);
                chain += 1;
                if chain > MAX_CNAME_CHAIN {
                    return Err(ResolutionError::ChainLimit);
                }
                current.name = target;
                continue;
            }
        }

        if let Some((kind, soa)) = cache.get_negative(&current.name, current.qtype) {
            tracing::trace!("got cached negative answer");
            metrics.cache_hit();
            let rcode = match kind {
                NegativeKind::NxDomain => Rcode::NameError,
                NegativeKind::NoData => Rcode::NoError,
            };
            return Ok(ResolvedAnswer {
                rcode,
                answers: collected,
                authority: soa.into_iter().collect(),
            });
        }

        metrics.cache_miss();

        match descend(
            transport, zones, cache, hints, metrics, &current, cancel, budget,
        )
        .await?
        {
            Descent::Answer { rrs } => {
                // the earlier chain links take precedence over
                // anything the final response repeats
                prioritising_merge(&mut collected, rrs);
                return Ok(ResolvedAnswer::positive(collected));
            }
            Descent::Cname { links, target } => {
                metrics.cname_link();
                prioritising_merge(&mut collected, links);
                chain += 1;
                if chain > MAX_CNAME_CHAIN {
                    return Err(ResolutionError::ChainLimit);
                }
                current.name = target;
            }
            Descent::Negative { rcode, authority } => {
                return Ok(ResolvedAnswer {
                    rcode,
                    answers: collected,
                    authority,
                });
            }
        }
    }
}

/// A CNAME link for a name, from local zones or the cache.
fn zone_or_cache_cname(
    zones: &ZoneIndex,
    cache: &SharedCache,
    name: &DomainName,
) -> Option<(ResourceRecord, DomainName)> {
    let link = match zones.lookup(name, RecordType::CNAME) {
        Some(rrs) => rrs.first().cloned(),
        None => cache.get(name, RecordType::CNAME).into_iter().next(),
    }?;

    if let RecordData::Name { name: target, .. } = &link.data {
        let target = target.clone();
        Some((link, target))
    } else {
        None
    }
}

/// What a full descent from the root produced.
enum Descent {
    Answer { rrs: Vec<ResourceRecord> },
    Cname {
        links: Vec<ResourceRecord>,
        target: DomainName,
    },
    Negative {
        rcode: Rcode,
        authority: Vec<ResourceRecord>,
    },
}

/// Chase referrals from the best-known starting set down to an
/// answer, a CNAME, or a negative.
#[allow(clippy::too_many_arguments)]
async fn descend<T: Transport + Sync>(
    transport: &T,
    zones: &ZoneIndex,
    cache: &SharedCache,
    hints: &RootHints,
    metrics: &mut Metrics,
    question: &Question,
    cancel: &CancelSignal,
    budget: usize,
) -> Result<Descent, ResolutionError> {
    let mut servers =
        candidate_nameservers(cache, &question.name).unwrap_or_else(|| root_nameservers(hints));
    let mut depth = 0;

    loop {
        if depth >= MAX_REFERRAL_DEPTH {
            tracing::debug!("hit referral depth limit");
            return Err(ResolutionError::DepthLimit);
        }
        depth += 1;

        let classification = query_server_set(
            transport, zones, cache, hints, metrics, question, &servers, cancel, budget,
        )
        .await?;

        match classification {
            Classification::Answer { rrs } => {
                tracing::trace!("got recursive answer");
                cache_rrsets(cache, &rrs);
                return Ok(Descent::Answer { rrs });
            }
            Classification::Cname { links, target } => {
                tracing::trace!(%target, "got recursive CNAME");
                cache_rrsets(cache, &links);
                return Ok(Descent::Cname { links, target });
            }
            Classification::Referral {
                zone,
                servers: new_servers,
                rrs,
            } => {
                tracing::trace!(%zone, "got referral");
                metrics.referral();
                cache_rrsets(cache, &rrs);
                servers = Nameservers {
                    servers: new_servers,
                    zone,
                };
            }
            Classification::Negative {
                kind,
                rcode,
                soa,
                authority,
            } => {
                tracing::trace!("got negative answer");
                cache.insert_negative(&question.name, question.qtype, kind, soa.as_ref(), 0);
                return Ok(Descent::Negative { rcode, authority });
            }
            Classification::Lame => {
                // `query_server_set` only surfaces this when every
                // server in the set was lame
                return Err(ResolutionError::DeadEnd {
                    question: question.clone(),
                });
            }
        }
    }
}

/// Group records into RRsets and cache each one with its minimum TTL.
fn cache_rrsets(cache: &SharedCache, rrs: &[ResourceRecord]) {
    let mut rrsets: HashMap<(DomainName, RecordType), Vec<ResourceRecord>> = HashMap::new();
    for rr in rrs {
        rrsets
            .entry((rr.name.clone(), rr.rtype()))
            .or_default()
            .push(rr.clone());
    }
    for rrset in rrsets.values() {
        cache.insert_rrset(rrset);
    }
}

/// The starting server set: the closest-enclosing NS RRset the cache
/// holds for the name or any of its ancestors.
fn candidate_nameservers(cache: &SharedCache, name: &DomainName) -> Option<Nameservers> {
    for i in 0..name.labels.len() {
        let Some(zone) = DomainName::from_labels(name.labels[i..name.labels.len() - 1].to_vec())
        else {
            continue;
        };

        let ns_rrs = cache.get(&zone, RecordType::NS);
        if ns_rrs.is_empty() {
            continue;
        }

        let mut servers = Vec::with_capacity(ns_rrs.len());
        for rr in &ns_rrs {
            if let RecordData::Name { name: target, .. } = &rr.data {
                let address = cache
                    .get(target, RecordType::A)
                    .into_iter()
                    .chain(cache.get(target, RecordType::AAAA))
                    .find_map(|rr| record_address(&rr));
                servers.push(Nameserver {
                    name: target.clone(),
                    address,
                });
            }
        }

        if !servers.is_empty() {
            return Some(Nameservers { servers, zone });
        }
    }

    None
}

fn root_nameservers(hints: &RootHints) -> Nameservers {
    Nameservers {
        servers: hints
            .servers
            .iter()
            .filter_map(|hint| {
                Some(Nameserver {
                    name: DomainName::from_dotted_string(&hint.name)?,
                    address: Some(hint.ip),
                })
            })
            .collect(),
        zone: DomainName::root_domain(),
    }
}

fn record_address(rr: &ResourceRecord) -> Option<IpAddr> {
    match &rr.data {
        RecordData::A { address } => Some(IpAddr::V4(*address)),
        RecordData::Aaaa { address } => Some(IpAddr::V6(*address)),
        _ => None,
    }
}

/// Ask the servers of one referral set, in glue-preferring shuffled
/// order, rotating past servers which time out repeatedly, error, or
/// give lame responses.
#[allow(clippy::too_many_arguments)]
async fn query_server_set<T: Transport + Sync>(
    transport: &T,
    zones: &ZoneIndex,
    cache: &SharedCache,
    hints: &RootHints,
    metrics: &mut Metrics,
    question: &Question,
    servers: &Nameservers,
    cancel: &CancelSignal,
    budget: usize,
) -> Result<Classification, ResolutionError> {
    let ordered = order_servers(&servers.servers);
    let mut every_failure_was_a_timeout = true;

    for server in ordered {
        if cancel.is_cancelled() {
            return Err(ResolutionError::Cancelled);
        }

        let address = match server.address {
            Some(address) => address,
            None => {
                // glueless: resolve the nameserver's own address,
                // which is where the recursion budget gets spent
                match resolve_nameserver_address(
                    transport,
                    zones,
                    cache,
                    hints,
                    metrics,
                    &server.name,
                    cancel,
                    budget - 1,
                )
                .await
                {
                    Some(address) => address,
                    None => {
                        every_failure_was_a_timeout = false;
                        continue;
                    }
                }
            }
        };

        let address = SocketAddr::new(address, DNS_PORT);
        tracing::trace!(%address, nameserver = %server.name, "trying nameserver");

        for _ in 0..SERVER_FAILURE_LIMIT {
            match exchange(transport, address, question, cancel).await? {
                Attempt::Response(response) => {
                    let classification =
                        classify_response(question, &response, servers.match_count());
                    if matches!(classification, Classification::Lame) {
                        tracing::debug!(%address, "lame or failing nameserver");
                        metrics.nameserver_miss();
                        every_failure_was_a_timeout = false;
                        break;
                    }
                    metrics.nameserver_hit();
                    return Ok(classification);
                }
                Attempt::Timeout => (),
                Attempt::TransportError => {
                    every_failure_was_a_timeout = false;
                    break;
                }
            }
        }
    }

    if every_failure_was_a_timeout {
        Err(ResolutionError::Timeout)
    } else {
        Err(ResolutionError::DeadEnd {
            question: question.clone(),
        })
    }
}

/// Glued servers first; pseudo-random order within each group so load
/// spreads across a zone's nameservers.
fn order_servers(servers: &[Nameserver]) -> Vec<Nameserver> {
    let mut glued: Vec<Nameserver> = servers
        .iter()
        .filter(|s| s.address.is_some())
        .cloned()
        .collect();
    let mut glueless: Vec<Nameserver> = servers
        .iter()
        .filter(|s| s.address.is_none())
        .cloned()
        .collect();

    let mut rng = rand::thread_rng();
    glued.shuffle(&mut rng);
    glueless.shuffle(&mut rng);

    glued.append(&mut glueless);
    glued
}

/// Resolve a nameserver's name to an address, recursively.
#[allow(clippy::too_many_arguments)]
async fn resolve_nameserver_address<T: Transport + Sync>(
    transport: &T,
    zones: &ZoneIndex,
    cache: &SharedCache,
    hints: &RootHints,
    metrics: &mut Metrics,
    name: &DomainName,
    cancel: &CancelSignal,
    budget: usize,
) -> Option<IpAddr> {
    for qtype in [RecordType::A, RecordType::AAAA] {
        let question = Question {
            name: name.clone(),
            qtype,
            qclass: RecordClass::IN,
        };
        if let Ok(answer) = resolve_with_budget(
            transport, zones, cache, hints, metrics, &question, cancel, budget,
        )
        .await
        {
            if let Some(address) = answer.answers.iter().find_map(record_address) {
                return Some(address);
            }
        }
    }

    None
}

/// The outcome of one attempt against one server.
enum Attempt {
    Response(Message),
    Timeout,
    TransportError,
}

/// One query attempt: UDP with the short timeout, upgrading to TCP
/// with the long one if the response came back truncated.
async fn exchange<T: Transport>(
    transport: &T,
    address: SocketAddr,
    question: &Question,
    cancel: &CancelSignal,
) -> Result<Attempt, ResolutionError> {
    let request = Message::make_query(rand::thread_rng().gen(), question.clone());

    let Ok(serialised) = request.to_octets_udp() else {
        return Ok(Attempt::TransportError);
    };

    match exchange_once(
        transport,
        address,
        Protocol::Udp,
        &serialised,
        &request,
        UDP_ATTEMPT_TIMEOUT,
        cancel,
    )
    .await?
    {
        Attempt::Response(response) if response.header.is_truncated => {
            tracing::trace!(%address, "truncated over UDP, retrying over TCP");
            let Ok(serialised) = request.to_octets() else {
                return Ok(Attempt::TransportError);
            };
            exchange_once(
                transport,
                address,
                Protocol::Tcp,
                &serialised,
                &request,
                TCP_ATTEMPT_TIMEOUT,
                cancel,
            )
            .await
        }
        attempt => Ok(attempt),
    }
}

/// Send the request and wait out the attempt window, driven by a
/// `{Response, Timeout, Cancelled}` event loop.  Responses which do
/// not match the request's id and question are dropped without ending
/// the attempt; a response which does not even parse burns the whole
/// attempt (the server is broken, not forged).
async fn exchange_once<T: Transport>(
    transport: &T,
    address: SocketAddr,
    protocol: Protocol,
    serialised: &[u8],
    request: &Message,
    attempt_timeout: Duration,
    cancel: &CancelSignal,
) -> Result<Attempt, ResolutionError> {
    enum Event {
        Response(bytes::BytesMut),
        Failed,
        Timeout,
        Cancelled,
    }

    let Ok(mut socket) = transport.connect(address, protocol).await else {
        return Ok(Attempt::TransportError);
    };
    if socket.send(serialised).await.is_err() {
        return Ok(Attempt::TransportError);
    }

    let deadline = Instant::now() + attempt_timeout;
    loop {
        let event = tokio::select! {
            received = socket.recv() => match received {
                Ok(bytes) => Event::Response(bytes),
                Err(_) => Event::Failed,
            },
            () = tokio::time::sleep_until(deadline) => Event::Timeout,
            () = cancel.cancelled() => Event::Cancelled,
        };

        match event {
            Event::Response(bytes) => match Message::from_octets(&bytes) {
                Ok(response) => {
                    if response_matches_request(request, &response) {
                        return Ok(Attempt::Response(response));
                    }
                    // wrong id or question: somebody else's datagram,
                    // or a forgery - keep waiting
                    tracing::debug!(%address, "dropping mismatched response");
                }
                Err(error) => {
                    tracing::debug!(%address, %error, "dropping unparseable response");
                    return Ok(Attempt::TransportError);
                }
            },
            Event::Failed => return Ok(Attempt::TransportError),
            Event::Timeout => return Ok(Attempt::Timeout),
            Event::Cancelled => return Err(ResolutionError::Cancelled),
        }
    }
}

/// What a validated response means for the query.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Classification {
    /// Records answering the question, CNAME links included.
    Answer { rrs: Vec<ResourceRecord> },
    /// A CNAME chain with no record of the queried type at its end.
    Cname {
        links: Vec<ResourceRecord>,
        target: DomainName,
    },
    /// Nameservers for a zone closer to the query name.
    Referral {
        zone: DomainName,
        servers: Vec<Nameserver>,
        rrs: Vec<ResourceRecord>,
    },
    /// NXDOMAIN or NODATA.
    Negative {
        kind: NegativeKind,
        rcode: Rcode,
        soa: Option<ResourceRecord>,
        authority: Vec<ResourceRecord>,
    },
    /// SERVFAIL, REFUSED, or an answer so unrelated it may as well
    /// be: try a different server.
    Lame,
}

/// Inspect a response and decide what it gives us.
pub(crate) fn classify_response(
    question: &Question,
    response: &Message,
    current_match_count: usize,
) -> Classification {
    match response.header.rcode {
        Rcode::NoError | Rcode::NameError => (),
        // SERVFAIL, FORMERR, REFUSED, NOTIMP, and the exotic ones:
        // nothing useful here, rotate
        _ => return Classification::Lame,
    }

    if response.header.rcode == Rcode::NameError {
        let soa = get_nxdomain_nodata_soa(question, response, current_match_count).cloned();
        return Classification::Negative {
            kind: NegativeKind::NxDomain,
            rcode: Rcode::NameError,
            soa,
            authority: response.authority.clone(),
        };
    }

    if let Some((final_name, cname_map)) =
        follow_cnames(&response.answers, &question.name, question.qtype)
    {
        // keep RRs matching the query name or the names it CNAMEs to
        let mut rrs_for_query = Vec::with_capacity(response.answers.len());
        let mut seen_final_record = false;
        for an in &response.answers {
            if an.is_unknown() {
                continue;
            }

            if an.rtype().matches(question.qtype) && an.name == final_name {
                rrs_for_query.push(an.clone());
                seen_final_record = true;
            } else if an.rtype() == RecordType::CNAME && cname_map.contains_key(&an.name) {
                rrs_for_query.push(an.clone());
            }
        }

        if rrs_for_query.is_empty() {
            return Classification::Lame;
        } else if seen_final_record {
            return Classification::Answer { rrs: rrs_for_query };
        } else {
            return Classification::Cname {
                links: rrs_for_query,
                target: final_name,
            };
        }
    }

    // NOTE: NS RRs may be in the ANSWER *or* AUTHORITY sections.
    let ns_from_answers =
        get_better_ns_names(&response.answers, &question.name, current_match_count);
    let ns_from_authority =
        get_better_ns_names(&response.authority, &question.name, current_match_count);
    let better_ns = match (ns_from_answers, ns_from_authority) {
        (Some((mn1, nss1)), Some((mn2, nss2))) => match mn1.labels.len().cmp(&mn2.labels.len()) {
            Ordering::Greater => Some((mn1, nss1)),
            Ordering::Equal => Some((mn1, nss1.union(&nss2).cloned().collect())),
            Ordering::Less => Some((mn2, nss2)),
        },
        (Some(found), None) | (None, Some(found)) => Some(found),
        (None, None) => None,
    };

    if let Some((zone, ns_names)) = better_ns {
        // glue: A/AAAA records for the chosen names, from the answer
        // and additional sections
        let mut glue: HashMap<DomainName, IpAddr> = HashMap::new();
        let mut rrs = Vec::new();
        for rr in response.answers.iter().chain(&response.additional) {
            if ns_names.contains(&rr.name) {
                if let Some(address) = record_address(rr) {
                    glue.entry(rr.name.clone()).or_insert(address);
                    rrs.push(rr.clone());
                }
            }
        }
        for rr in response.answers.iter().chain(&response.authority) {
            if let RecordData::Name {
                tag: RecordType::NS,
                name,
            } = &rr.data
            {
                if ns_names.contains(name) && rr.name == zone {
                    rrs.push(rr.clone());
                }
            }
        }

        let servers = ns_names
            .into_iter()
            .map(|name| {
                let address = glue.get(&name).copied();
                Nameserver { name, address }
            })
            .collect();

        return Classification::Referral {
            zone,
            servers,
            rrs,
        };
    }

    if response.answers.is_empty() {
        let soa = get_nxdomain_nodata_soa(question, response, current_match_count).cloned();

        // no answers, no SOA, but NS records which are not progress:
        // an upward referral, which is a server problem, not a NODATA
        let has_ns = response
            .authority
            .iter()
            .any(|rr| rr.rtype() == RecordType::NS);
        if soa.is_none() && has_ns {
            return Classification::Lame;
        }

        return Classification::Negative {
            kind: NegativeKind::NoData,
            rcode: Rcode::NoError,
            soa,
            authority: response.authority.clone(),
        };
    }

    Classification::Lame
}

/// Given a set of RRs and a domain name we're looking for, follow
/// `CNAME`s in the response and return the final name (which is the
/// name that will have the non-`CNAME` records associated with it).
///
/// Returns `None` if CNAMEs form a loop, or there is no RR which
/// matches the target name (a CNAME or one with the right type).
pub fn follow_cnames(
    rrs: &[ResourceRecord],
    target: &DomainName,
    qtype: RecordType,
) -> Option<(DomainName, HashMap<DomainName, DomainName>)> {
    let mut got_match = false;
    let mut cname_map = HashMap::<DomainName, DomainName>::new();
    for rr in rrs {
        if &rr.name == target && rr.rtype().matches(qtype) {
            got_match = true;
        }
        if let RecordData::Name {
            tag: RecordType::CNAME,
            name,
        } = &rr.data
        {
            cname_map.insert(rr.name.clone(), name.clone());
        }
    }

    let mut seen = HashSet::new();
    let mut final_name = target.clone();
    while let Some(target) = cname_map.get(&final_name) {
        if seen.contains(target) {
            return None;
        }
        seen.insert(target.clone());
        final_name = target.clone();
    }

    if got_match || !seen.is_empty() {
        Some((final_name, cname_map))
    } else {
        None
    }
}

/// Given a set of RRs and a domain name we're looking for, look for
/// better matching NS RRs (by comparing the current match count).
/// Returns the new matching superdomain and the nameserver hostnames.
pub fn get_better_ns_names(
    rrs: &[ResourceRecord],
    target: &DomainName,
    current_match_count: usize,
) -> Option<(DomainName, HashSet<DomainName>)> {
    let mut ns_names = HashSet::new();
    let mut match_count = current_match_count;
    let mut match_name = None;

    for rr in rrs {
        if let RecordData::Name {
            tag: RecordType::NS,
            name,
        } = &rr.data
        {
            if target.is_subdomain_of(&rr.name) {
                match (rr.name.labels.len() - 1).cmp(&match_count) {
                    Ordering::Greater => {
                        match_count = rr.name.labels.len() - 1;
                        match_name = Some(rr.name.clone());

                        ns_names.clear();
                        ns_names.insert(name.clone());
                    }
                    Ordering::Equal if match_name.as_ref() == Some(&rr.name) => {
                        ns_names.insert(name.clone());
                    }
                    _ => (),
                }
            }
        }
    }

    match_name.map(|mn| (mn, ns_names))
}

/// Given a set of RRs and a domain name we're looking for, follow any
/// `CNAME`s and get the address from the final `A` or `AAAA` record.
pub fn get_ip(rrs: &[ResourceRecord], target: &DomainName) -> Option<IpAddr> {
    let (final_name, _) = follow_cnames(rrs, target, RecordType::A)
        .or_else(|| follow_cnames(rrs, target, RecordType::AAAA))?;

    rrs.iter()
        .filter(|rr| rr.name == final_name)
        .find_map(record_address)
}

#[cfg(test)]
mod tests {
    use dns_wire::protocol::types::test_util::*;
    use std::io;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    use super::*;
    use crate::cancel::{cancellation, CancelSignal};
    use crate::util::nameserver::test_util::*;

    #[test]
    fn classify_returns_answer() {
        let (request, response) = nameserver_response(
            "www.example.com.",
            &[a_record("www.example.com.", Ipv4Addr::new(127, 0, 0, 1))],
            &[],
            &[],
        );

        assert_eq!(
            Classification::Answer {
                rrs: vec![a_record("www.example.com.", Ipv4Addr::new(127, 0, 0, 1))],
            },
            classify_response(&request.questions[0], &response, 0)
        );
    }

    #[test]
    fn classify_drops_unknown_rrs() {
        let (request, mut response) = nameserver_response(
            "www.example.com.",
            &[a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))],
            &[],
            &[],
        );
        response.answers.insert(
            0,
            unknown_record("www.example.com.", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
        );

        assert_eq!(
            Classification::Answer {
                rrs: vec![a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))],
            },
            classify_response(&request.questions[0], &response, 0)
        );
    }

    // the CNAME collection scenario: a CNAME plus the record at its
    // target answers the original question
    #[test]
    fn classify_follows_cnames_to_the_answer() {
        let (request, response) = nameserver_response(
            "example.com.",
            &[
                cname_record("example.com.", "www.example.com."),
                a_record("www.example.com.", "93.184.216.34".parse().unwrap()),
            ],
            &[],
            &[],
        );

        let classification = classify_response(&request.questions[0], &response, 0);
        let Classification::Answer { rrs } = classification else {
            panic!("expected answer, got {classification:?}");
        };

        assert!(rrs.contains(&a_record("www.example.com.", "93.184.216.34".parse().unwrap())));
        assert!(rrs.contains(&cname_record("example.com.", "www.example.com.")));
    }

    #[test]
    fn classify_returns_partial_cname_chain() {
        let (request, response) = nameserver_response(
            "www.example.com.",
            &[cname_record("www.example.com.", "cname-target.example.com.")],
            &[],
            &[],
        );

        assert_eq!(
            Classification::Cname {
                links: vec![cname_record("www.example.com.", "cname-target.example.com.")],
                target: domain("cname-target.example.com."),
            },
            classify_response(&request.questions[0], &response, 0)
        );
    }

    #[test]
    fn classify_returns_referral_with_glue() {
        let (request, response) = nameserver_response(
            "www.example.com.",
            &[],
            &[ns_record("example.com.", "ns1.example.net.")],
            &[a_record("ns1.example.net.", Ipv4Addr::new(192, 0, 2, 53))],
        );

        let classification = classify_response(&request.questions[0], &response, 0);
        let Classification::Referral { zone, servers, .. } = classification else {
            panic!("expected referral, got {classification:?}");
        };

        assert_eq!(domain("example.com."), zone);
        assert_eq!(
            vec![Nameserver {
                name: domain("ns1.example.net."),
                address: Some(IpAddr::from([192, 0, 2, 53])),
            }],
            servers
        );
    }

    #[test]
    fn classify_ignores_worse_ns() {
        let (request, response) = nameserver_response(
            "long.subdomain.example.com.",
            &[],
            &[ns_record("example.com.", "ns.example.net.")],
            &[],
        );

        // already delegated three labels deep: an example.com NS set
        // is an upward referral, not progress
        let classification = classify_response(&request.questions[0], &response, 3);
        assert_eq!(Classification::Lame, classification);
    }

    #[test]
    fn classify_returns_nxdomain_with_soa() {
        let (request, mut response) = nameserver_response("www.example.com.", &[], &[], &[]);
        response.header.rcode = Rcode::NameError;
        response.authority = vec![soa_record(
            "example.com.",
            "ns1.example.com.",
            "admin.example.com.",
            1,
            2,
            3,
            4,
            300,
        )];

        let classification = classify_response(&request.questions[0], &response, 0);
        let Classification::Negative {
            kind, rcode, soa, ..
        } = classification
        else {
            panic!("expected negative, got {classification:?}");
        };

        assert_eq!(NegativeKind::NxDomain, kind);
        assert_eq!(Rcode::NameError, rcode);
        assert!(soa.is_some());
    }

    #[test]
    fn classify_returns_lame_for_servfail() {
        let (request, mut response) = nameserver_response("www.example.com.", &[], &[], &[]);
        response.header.rcode = Rcode::ServerFailure;

        assert_eq!(
            Classification::Lame,
            classify_response(&request.questions[0], &response, 0)
        );
    }

    #[test]
    fn follow_cnames_chain() {
        let rr_cname1 = cname_record("www.example.com.", "www2.example.com.");
        let rr_cname2 = cname_record("www2.example.com.", "www3.example.com.");
        let rr_a = a_record("www3.example.com.", Ipv4Addr::new(127, 0, 0, 1));

        let mut expected_map = HashMap::new();
        expected_map.insert(domain("www.example.com."), domain("www2.example.com."));
        expected_map.insert(domain("www2.example.com."), domain("www3.example.com."));

        // order of records does not matter, so pick the "worst"
        // order: the records are in the opposite order to what we'd
        // expect
        assert_eq!(
            Some((domain("www3.example.com."), expected_map)),
            follow_cnames(
                &[rr_a, rr_cname2, rr_cname1],
                &domain("www.example.com."),
                RecordType::ANY
            )
        );
    }

    #[test]
    fn follow_cnames_loop() {
        let rr_cname1 = cname_record("www.example.com.", "bad.example.com.");
        let rr_cname2 = cname_record("bad.example.com.", "www.example.com.");

        assert_eq!(
            None,
            follow_cnames(
                &[rr_cname1, rr_cname2],
                &domain("www.example.com."),
                RecordType::ANY
            )
        );
    }

    #[test]
    fn get_better_ns_names_prefers_deeper() {
        let rr_ns1 = ns_record("example.com.", "ns2.icann.org.");
        let rr_ns2 = ns_record("www.example.com.", "ns3.icann.org.");
        assert_eq!(
            Some((
                domain("www.example.com."),
                [domain("ns3.icann.org.")].into_iter().collect()
            )),
            get_better_ns_names(&[rr_ns1, rr_ns2], &domain("www.example.com."), 0)
        );
    }

    #[test]
    fn get_ip_follows_cnames() {
        let cname_rr = cname_record("www.example.com.", "www.example.net.");
        let a_rr = a_record("www.example.net.", Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(
            Some(IpAddr::from([127, 0, 0, 1])),
            get_ip(&[cname_rr, a_rr], &domain("www.example.com."))
        );
    }

    // --- end-to-end tests against a scripted transport

    /// A transport whose responses come from a closure; `None` means
    /// the server never answers.
    #[derive(Clone)]
    struct TestTransport {
        respond: Arc<dyn Fn(SocketAddr, Protocol, &Message) -> Option<Message> + Send + Sync>,
        queries: Arc<AtomicUsize>,
    }

    impl TestTransport {
        fn new(
            respond: impl Fn(SocketAddr, Protocol, &Message) -> Option<Message>
                + Send
                + Sync
                + 'static,
        ) -> Self {
            Self {
                respond: Arc::new(respond),
                queries: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.load(AtomicOrdering::SeqCst)
        }
    }

    impl Transport for TestTransport {
        type Socket = TestSocket;

        async fn connect(&self, address: SocketAddr, protocol: Protocol) -> io::Result<TestSocket> {
            Ok(TestSocket {
                address,
                protocol,
                respond: Arc::clone(&self.respond),
                queries: Arc::clone(&self.queries),
                pending: None,
            })
        }
    }

    struct TestSocket {
        address: SocketAddr,
        protocol: Protocol,
        respond: Arc<dyn Fn(SocketAddr, Protocol, &Message) -> Option<Message> + Send + Sync>,
        queries: Arc<AtomicUsize>,
        pending: Option<bytes::BytesMut>,
    }

    impl TransportSocket for TestSocket {
        async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.queries.fetch_add(1, AtomicOrdering::SeqCst);
            let request = Message::from_octets(bytes).expect("test sent an invalid message");
            self.pending = (self.respond)(self.address, self.protocol, &request)
                .map(|response| response.to_octets().unwrap());
            Ok(())
        }

        async fn recv(&mut self) -> io::Result<bytes::BytesMut> {
            match self.pending.take() {
                Some(bytes) => Ok(bytes),
                None => std::future::pending().await,
            }
        }
    }

    fn test_hints() -> RootHints {
        RootHints {
            servers: vec![crate::hints::RootHint {
                name: "a.root-servers.net.".to_string(),
                ip: IpAddr::from([198, 41, 0, 4]),
            }],
        }
    }

    fn answer_a_question(query: &Message) -> Question {
        query.questions[0].clone()
    }

    async fn run<T: Transport + Sync>(
        transport: &T,
        question: &Question,
        cache: &SharedCache,
        cancel: &CancelSignal,
    ) -> Result<ResolvedAnswer, ResolutionError> {
        let zones = ZoneIndex::new();
        let mut metrics = Metrics::new();
        resolve_recursive(
            transport,
            &zones,
            cache,
            &test_hints(),
            &mut metrics,
            question,
            cancel,
        )
        .await
    }

    #[tokio::test]
    async fn resolves_through_referrals() {
        let root = IpAddr::from([198, 41, 0, 4]);
        let tld = IpAddr::from([192, 5, 6, 30]);
        let authoritative = IpAddr::from([192, 0, 2, 53]);

        let transport = TestTransport::new(move |address, _, query| {
            let mut response = query.make_response();

            if address.ip() == root {
                response.authority = vec![ns_record("com.", "a.gtld-servers.net.")];
                response.additional = vec![a_record("a.gtld-servers.net.", "192.5.6.30".parse().unwrap())];
            } else if address.ip() == tld {
                response.authority = vec![ns_record("example.com.", "ns1.example.com.")];
                response.additional = vec![a_record("ns1.example.com.", "192.0.2.53".parse().unwrap())];
            } else if address.ip() == authoritative {
                response.header.is_authoritative = true;
                response.answers = vec![a_record("www.example.com.", "93.184.216.34".parse().unwrap())];
            } else {
                panic!("unexpected address {address}");
            }

            Some(response)
        });

        let cache = SharedCache::new();
        let answer = run(
            &transport,
            &question("www.example.com.", RecordType::A),
            &cache,
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(
            vec![a_record("www.example.com.", "93.184.216.34".parse().unwrap())],
            answer.answers
        );
        assert_eq!(Rcode::NoError, answer.rcode);
        assert_eq!(3, transport.query_count());

        // intermediate results were cached: the next query skips the
        // root and TLD
        let answer = run(
            &transport,
            &question("www.example.com.", RecordType::A),
            &cache,
            &CancelSignal::never(),
        )
        .await
        .unwrap();
        assert_eq!(1, answer.answers.len());
        assert_eq!(3, transport.query_count());
    }

    #[tokio::test]
    async fn follows_cname_chains_across_queries() {
        let root = IpAddr::from([198, 41, 0, 4]);

        let transport = TestTransport::new(move |address, _, query| {
            assert_eq!(address.ip(), root);
            let question = answer_a_question(query);
            let mut response = query.make_response();

            if question.name == domain("example.com.") {
                response.answers = vec![cname_record("example.com.", "www.example.com.")];
            } else if question.name == domain("www.example.com.") {
                response.answers =
                    vec![a_record("www.example.com.", "93.184.216.34".parse().unwrap())];
            } else {
                panic!("unexpected question {question}");
            }

            Some(response)
        });

        let answer = run(
            &transport,
            &question("example.com.", RecordType::A),
            &SharedCache::new(),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(
            vec![
                cname_record("example.com.", "www.example.com."),
                a_record("www.example.com.", "93.184.216.34".parse().unwrap()),
            ],
            answer.answers
        );
    }

    #[tokio::test]
    async fn cname_loops_hit_the_chain_limit() {
        let transport = TestTransport::new(move |_, _, query| {
            let question = answer_a_question(query);
            let target = if question.name == domain("a.example.com.") {
                "b.example.com."
            } else {
                "a.example.com."
            };
            let mut response = query.make_response();
            response.answers = vec![cname_record(&question.name.to_dotted_string(), target)];
            Some(response)
        });

        let result = run(
            &transport,
            &question("a.example.com.", RecordType::A),
            &SharedCache::new(),
            &CancelSignal::never(),
        )
        .await;

        assert_eq!(Err(ResolutionError::ChainLimit), result);
    }

    #[tokio::test]
    async fn negative_answers_are_cached() {
        let transport = TestTransport::new(move |_, _, query| {
            let mut response = query.make_response();
            response.header.rcode = Rcode::NameError;
            response.authority = vec![soa_record(
                ".",
                "a.root-servers.net.",
                "nstld.verisign-grs.com.",
                2_018_080_200,
                1800,
                900,
                604_800,
                86400,
            )];
            Some(response)
        });

        let cache = SharedCache::new();
        let q = question("idontexist.", RecordType::A);

        let answer = run(&transport, &q, &cache, &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(Rcode::NameError, answer.rcode);
        assert!(answer.answers.is_empty());
        assert_eq!(1, answer.authority.len());
        let queries_before = transport.query_count();

        // the second query is answered from the negative cache
        let answer = run(&transport, &q, &cache, &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(Rcode::NameError, answer.rcode);
        assert_eq!(queries_before, transport.query_count());
    }

    #[tokio::test]
    async fn lame_servers_rotate_to_the_next() {
        let root = IpAddr::from([198, 41, 0, 4]);
        let bad = IpAddr::from([192, 0, 2, 1]);
        let good = IpAddr::from([192, 0, 2, 2]);

        let transport = TestTransport::new(move |address, _, query| {
            let mut response = query.make_response();

            if address.ip() == root {
                response.authority = vec![
                    ns_record("example.com.", "bad.example.net."),
                    ns_record("example.com.", "good.example.net."),
                ];
                response.additional = vec![
                    a_record("bad.example.net.", "192.0.2.1".parse().unwrap()),
                    a_record("good.example.net.", "192.0.2.2".parse().unwrap()),
                ];
            } else if address.ip() == bad {
                response.header.rcode = Rcode::ServerFailure;
            } else if address.ip() == good {
                response.answers = vec![a_record("www.example.com.", "93.184.216.34".parse().unwrap())];
            } else {
                panic!("unexpected address {address}");
            }

            Some(response)
        });

        let answer = run(
            &transport,
            &question("www.example.com.", RecordType::A),
            &SharedCache::new(),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(1, answer.answers.len());
    }

    #[tokio::test]
    async fn truncated_udp_retries_over_tcp() {
        let transport = TestTransport::new(move |_, protocol, query| {
            let mut response = query.make_response();
            match protocol {
                Protocol::Udp => response.header.is_truncated = true,
                Protocol::Tcp => {
                    response.answers =
                        vec![a_record("www.example.com.", "93.184.216.34".parse().unwrap())];
                }
            }
            Some(response)
        });

        let answer = run(
            &transport,
            &question("www.example.com.", RecordType::A),
            &SharedCache::new(),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(1, answer.answers.len());
        assert_eq!(2, transport.query_count());
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_servers_time_out() {
        let transport = TestTransport::new(|_, _, _| None);

        let result = run(
            &transport,
            &question("www.example.com.", RecordType::A),
            &SharedCache::new(),
            &CancelSignal::never(),
        )
        .await;

        assert_eq!(Err(ResolutionError::Timeout), result);
        // one server in the hints, three attempts against it
        assert_eq!(SERVER_FAILURE_LIMIT, transport.query_count());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let transport = TestTransport::new(|_, _, _| None);
        let (handle, signal) = cancellation();

        let task = {
            let transport = transport.clone();
            tokio::spawn(async move {
                run(
                    &transport,
                    &question("www.example.com.", RecordType::A),
                    &SharedCache::new(),
                    &signal,
                )
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();

        assert_eq!(Err(ResolutionError::Cancelled), task.await.unwrap());
    }
}
