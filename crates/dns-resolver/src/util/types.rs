use std::collections::HashSet;
use std::net::IpAddr;

use dns_wire::protocol::types::*;

/// The outcome of a successful resolution.  "Successful" includes
/// NXDOMAIN and NODATA: those carry an empty answer section and the
/// authority records which prove the negative.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedAnswer {
    pub rcode: Rcode,
    /// The answer records, including any CNAME chain links crossed on
    /// the way.
    pub answers: Vec<ResourceRecord>,
    /// For negative answers, the SOA (and friends) from the
    /// responding zone.
    pub authority: Vec<ResourceRecord>,
}

impl ResolvedAnswer {
    pub fn positive(answers: Vec<ResourceRecord>) -> Self {
        Self {
            rcode: Rcode::NoError,
            answers,
            authority: Vec::new(),
        }
    }

    pub fn negative(rcode: Rcode, authority: Vec<ResourceRecord>) -> Self {
        Self {
            rcode,
            answers: Vec::new(),
            authority,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.answers.is_empty()
    }
}

/// An error that can occur when trying to resolve a domain.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResolutionError {
    /// No response within the attempt budget, on any server.
    Timeout,
    /// The query's cancel signal fired.
    Cancelled,
    /// Followed too many referrals.
    DepthLimit,
    /// Followed too many CNAMEs.
    ChainLimit,
    /// Ran out of nameservers to ask.
    DeadEnd { question: Question },
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ResolutionError::Timeout => write!(f, "timed out"),
            ResolutionError::Cancelled => write!(f, "cancelled"),
            ResolutionError::DepthLimit => write!(f, "referral chain too long"),
            ResolutionError::ChainLimit => write!(f, "CNAME chain too long"),
            ResolutionError::DeadEnd { question } => {
                write!(f, "unable to answer '{question}'")
            }
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// The cache key of a query, for single-flight de-duplication.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct QueryFingerprint {
    pub name: DomainName,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl QueryFingerprint {
    pub fn from_question(question: &Question) -> Self {
        Self {
            name: question.name.clone(),
            qtype: question.qtype,
            qclass: question.qclass,
        }
    }
}

/// A nameserver from a referral: a name, and an address if glue was
/// available.  Glueless servers cost another resolution before they
/// can be asked anything.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Nameserver {
    pub name: DomainName,
    pub address: Option<IpAddr>,
}

/// A set of nameservers for a zone.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Nameservers {
    /// Guaranteed to be non-empty.
    pub servers: Vec<Nameserver>,
    /// The zone the servers are authoritative for.
    pub zone: DomainName,
}

impl Nameservers {
    /// How close this server set is to the query name: the number of
    /// labels in the zone name (not counting the root label).
    pub fn match_count(&self) -> usize {
        self.zone.labels.len() - 1
    }
}

/// Merge two sets of RRs, where records from the second set are
/// included if and only if there are no records of matching (name,
/// type) in the first set.  The first set acts as an override of the
/// second.
pub fn prioritising_merge(priority: &mut Vec<ResourceRecord>, new: Vec<ResourceRecord>) {
    let mut seen = HashSet::new();

    for rr in priority.iter() {
        seen.insert((rr.name.clone(), rr.rtype()));
    }

    for rr in new {
        if !seen.contains(&(rr.name.clone(), rr.rtype())) {
            priority.push(rr);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use dns_wire::protocol::types::test_util::*;

    use super::*;

    #[test]
    fn prioritised_merge_prioritises_by_name_and_type() {
        let mut priority = vec![
            a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)),
            a_record("www.example.com.", Ipv4Addr::new(2, 2, 2, 2)),
            cname_record("www.example.com.", "target.example.com."),
        ];
        let new = vec![
            a_record("www.example.com.", Ipv4Addr::new(3, 3, 3, 3)),
            a_record("www.example.net.", Ipv4Addr::new(4, 4, 4, 4)),
            cname_record("www.example.com.", "other-target.example.com."),
            ns_record("www.example.com.", "ns1.example.com."),
            ns_record("www.example.com.", "ns2.example.com."),
        ];

        prioritising_merge(&mut priority, new);
        priority.sort_by_key(ResourceRecord::to_zone_line);

        let mut expected = vec![
            a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)),
            a_record("www.example.com.", Ipv4Addr::new(2, 2, 2, 2)),
            cname_record("www.example.com.", "target.example.com."),
            a_record("www.example.net.", Ipv4Addr::new(4, 4, 4, 4)),
            ns_record("www.example.com.", "ns1.example.com."),
            ns_record("www.example.com.", "ns2.example.com."),
        ];
        expected.sort_by_key(ResourceRecord::to_zone_line);

        assert_eq!(expected, priority);
    }

    #[test]
    fn match_count_ignores_the_root_label() {
        let nameservers = Nameservers {
            servers: vec![Nameserver {
                name: domain("ns1.example.com."),
                address: None,
            }],
            zone: domain("example.com."),
        };
        assert_eq!(2, nameservers.match_count());

        let root = Nameservers {
            servers: vec![Nameserver {
                name: domain("a.root-servers.net."),
                address: Some(IpAddr::from([198, 41, 0, 4])),
            }],
            zone: domain("."),
        };
        assert_eq!(0, root.match_count());
    }
}
