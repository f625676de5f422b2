use std::cmp::Ordering;

use dns_wire::protocol::rdata::RecordData;
use dns_wire::protocol::types::*;

/// Very basic validation that a nameserver response belongs to a
/// request:
///
/// - Check the ID and opcode match.
///
/// - Check it is a response.
///
/// - Check the questions match.
///
/// Anything which fails this is silently dropped, as it may be a
/// stray or forged datagram rather than our answer.  The RCODE is
/// deliberately not checked here: classification wants to see
/// failures too.
pub fn response_matches_request(request: &Message, response: &Message) -> bool {
    if request.header.id != response.header.id {
        return false;
    }
    if !response.header.is_response {
        return false;
    }
    if request.header.opcode != response.header.opcode {
        return false;
    }
    if request.questions != response.questions {
        return false;
    }

    true
}

/// Check if this is an NXDOMAIN or NODATA response and return the SOA
/// if so.
///
/// Also sanity checks that the SOA record could be authoritative for
/// the query domain: the domain has to be a subdomain of the SOA, and
/// the SOA has to have at least the current match count.
pub fn get_nxdomain_nodata_soa<'a>(
    question: &Question,
    response: &'a Message,
    current_match_count: usize,
) -> Option<&'a ResourceRecord> {
    if !response.answers.is_empty() {
        return None;
    }
    if !(response.header.rcode == Rcode::NameError || response.header.rcode == Rcode::NoError) {
        return None;
    }

    let mut soa_rr = None;
    for rr in &response.authority {
        if let RecordData::Soa { .. } = &rr.data {
            // multiple SOAs: abort, abort!
            if soa_rr.is_some() {
                return None;
            }

            soa_rr = Some(rr);
        }
    }

    let rr = soa_rr?;
    if !question.name.is_subdomain_of(&rr.name) {
        return None;
    }

    if (rr.name.labels.len() - 1).cmp(&current_match_count) == Ordering::Less {
        return None;
    }

    Some(rr)
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use dns_wire::protocol::types::test_util::*;

    #[test]
    fn response_matches_request_accepts() {
        let (request, response) = matching_nameserver_response();

        assert!(response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_id() {
        let (request, mut response) = matching_nameserver_response();
        response.header.id += 1;

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_qr() {
        let (request, mut response) = matching_nameserver_response();
        response.header.is_response = false;

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_opcode() {
        let (request, mut response) = matching_nameserver_response();
        response.header.opcode = Opcode::Status;

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_question() {
        let (request, mut response) = matching_nameserver_response();
        response.questions[0].name = domain("other.example.com.");

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_does_not_check_aa() {
        let (request, mut response) = matching_nameserver_response();
        response.header.is_authoritative = !response.header.is_authoritative;

        assert!(response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_does_not_check_rcode() {
        let (request, mut response) = matching_nameserver_response();
        response.header.rcode = Rcode::ServerFailure;

        assert!(response_matches_request(&request, &response));
    }

    #[test]
    fn get_nxdomain_nodata_soa_finds_the_soa() {
        let (request, mut response) = matching_nameserver_response();
        response.answers.clear();
        response.header.rcode = Rcode::NameError;
        response.authority = vec![root_soa()];

        assert_eq!(
            Some(&root_soa()),
            get_nxdomain_nodata_soa(&request.questions[0], &response, 0)
        );
    }

    #[test]
    fn get_nxdomain_nodata_soa_rejects_multiple_soas() {
        let (request, mut response) = matching_nameserver_response();
        response.answers.clear();
        response.header.rcode = Rcode::NameError;
        response.authority = vec![root_soa(), root_soa()];

        assert_eq!(
            None,
            get_nxdomain_nodata_soa(&request.questions[0], &response, 0)
        );
    }

    #[test]
    fn get_nxdomain_nodata_soa_rejects_worse_match() {
        let (request, mut response) = matching_nameserver_response();
        response.answers.clear();
        response.header.rcode = Rcode::NameError;
        response.authority = vec![root_soa()];

        // a root SOA cannot speak for a question already delegated
        // two labels deep
        assert_eq!(
            None,
            get_nxdomain_nodata_soa(&request.questions[0], &response, 2)
        );
    }

    fn root_soa() -> ResourceRecord {
        soa_record(
            ".",
            "a.root-servers.net.",
            "nstld.verisign-grs.com.",
            2_018_080_200,
            1800,
            900,
            604_800,
            86400,
        )
    }
}

#[cfg(test)]
pub mod test_util {
    use dns_wire::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    use super::*;

    pub fn matching_nameserver_response() -> (Message, Message) {
        nameserver_response(
            "www.example.com.",
            &[a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1))],
            &[],
            &[],
        )
    }

    pub fn nameserver_response(
        name: &str,
        answers: &[ResourceRecord],
        authority: &[ResourceRecord],
        additional: &[ResourceRecord],
    ) -> (Message, Message) {
        let request = Message::make_query(1234, question(name, RecordType::A));

        let mut response = request.make_response();
        response.answers = answers.into();
        response.authority = authority.into();
        response.additional = additional.into();

        (request, response)
    }
}
