//! Serialisation of DNS messages to the wire format.  See the `types`
//! module for details of the format.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use crate::protocol::rdata::{compresses_rdata_names, Gateway, RecordData};
use crate::protocol::types::*;

impl Message {
    /// Serialise with no size bound, for TCP.
    ///
    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn to_octets(&self) -> Result<BytesMut, Error> {
        let (buffer, _) = self.serialise_with_plan(&SectionPlan::full(self))?;
        Ok(buffer.octets)
    }

    /// Serialise for UDP: bounded at 512 octets, or at the size the
    /// outgoing EDNS record advertises if there is one.
    pub fn to_octets_udp(&self) -> Result<BytesMut, Error> {
        let max_size = self
            .edns
            .as_ref()
            .map_or(MAX_UDP_SIZE, |edns| {
                usize::from(edns.udp_payload_size).max(MAX_UDP_SIZE)
            });
        self.to_octets_bounded(max_size)
    }

    /// Serialise, dropping records to fit within `max_size` octets.
    ///
    /// Serialisation is two-pass: the first pass computes sizes (by
    /// writing to a scratch buffer with its own compression map) and
    /// decides how many records fit, and the second pass starts from
    /// a cleared map and writes only those.  Since compression
    /// pointers only ever refer backwards, dropping a suffix of the
    /// record list leaves the remaining bytes identical, so the two
    /// passes agree.
    ///
    /// The answer and authority sections are prioritised record by
    /// record; the plain additional section is dropped en bloc; the
    /// OPT / SIG(0) / TSIG pseudo-records are kept if they still fit.
    /// If anything was dropped, the TC bit is set in what is written.
    pub fn to_octets_bounded(&self, max_size: usize) -> Result<BytesMut, Error> {
        let full = SectionPlan::full(self);
        let (buffer, _) = self.serialise_with_plan(&full)?;
        if buffer.octets.len() <= max_size {
            return Ok(buffer.octets);
        }

        // without the plain additional section, but with pseudo-records
        let mut plan = SectionPlan {
            truncated: true,
            additional: false,
            ..full
        };
        let (buffer, _) = self.serialise_with_plan(&plan)?;
        if buffer.octets.len() <= max_size {
            return Ok(buffer.octets);
        }

        // without the pseudo-records either; the offsets tell us how
        // many answer and authority records fit
        plan.pseudo = false;
        let (buffer, offsets) = self.serialise_with_plan(&plan)?;
        if buffer.octets.len() <= max_size {
            return Ok(buffer.octets);
        }

        plan.answers = offsets
            .answer_ends
            .iter()
            .take_while(|end| **end <= max_size)
            .count();
        plan.authority = if plan.answers == self.answers.len() {
            offsets
                .authority_ends
                .iter()
                .take_while(|end| **end <= max_size)
                .count()
        } else {
            0
        };

        let (buffer, _) = self.serialise_with_plan(&plan)?;
        Ok(buffer.octets)
    }

    fn serialise_with_plan(
        &self,
        plan: &SectionPlan,
    ) -> Result<(WritableBuffer, SectionOffsets), Error> {
        let mut buffer = WritableBuffer::default();
        let mut offsets = SectionOffsets::default();

        let pseudo_count = if plan.pseudo {
            usize::from(self.edns.is_some())
                + usize::from(self.sig0.is_some())
                + usize::from(self.tsig.is_some())
        } else {
            0
        };
        let arcount = if plan.additional {
            self.additional.len() + pseudo_count
        } else {
            pseudo_count
        };

        let qdcount = usize_to_u16(self.questions.len())?;
        let ancount = usize_to_u16(plan.answers)?;
        let nscount = usize_to_u16(plan.authority)?;
        let arcount = usize_to_u16(arcount)?;

        let mut header = self.header;
        header.is_truncated = header.is_truncated || plan.truncated;
        header.serialise(&mut buffer);
        buffer.write_u16(qdcount);
        buffer.write_u16(ancount);
        buffer.write_u16(nscount);
        buffer.write_u16(arcount);

        for question in &self.questions {
            question.serialise(&mut buffer);
        }
        for rr in &self.answers[..plan.answers] {
            rr.serialise(&mut buffer)?;
            offsets.answer_ends.push(buffer.index());
        }
        for rr in &self.authority[..plan.authority] {
            rr.serialise(&mut buffer)?;
            offsets.authority_ends.push(buffer.index());
        }
        // the OPT goes first so that re-decoding promotes the same
        // record the original decode did; TSIG and SIG(0) must be
        // the final records (RFC 8945 section 5.1, RFC 2931)
        if plan.pseudo {
            if let Some(edns) = &self.edns {
                edns.serialise(self.header.rcode.extended_bits(), &mut buffer)?;
            }
        }
        if plan.additional {
            for rr in &self.additional {
                rr.serialise(&mut buffer)?;
            }
        }
        if plan.pseudo {
            if let Some(rr) = &self.sig0 {
                rr.serialise(&mut buffer)?;
            }
            if let Some(rr) = &self.tsig {
                rr.serialise(&mut buffer)?;
            }
        }

        Ok((buffer, offsets))
    }
}

/// Which records a serialisation pass writes.
struct SectionPlan {
    answers: usize,
    authority: usize,
    additional: bool,
    pseudo: bool,
    truncated: bool,
}

impl SectionPlan {
    fn full(message: &Message) -> Self {
        Self {
            answers: message.answers.len(),
            authority: message.authority.len(),
            additional: true,
            pseudo: true,
            truncated: false,
        }
    }
}

#[derive(Default)]
struct SectionOffsets {
    answer_ends: Vec<usize>,
    authority_ends: Vec<usize>,
}

impl Header {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.id);
        buffer.write_u16(self.flags_word());
    }
}

impl Question {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        self.name.serialise(buffer, true);
        buffer.write_u16(u16::from(self.qtype));
        buffer.write_u16(u16::from(self.qclass));
    }
}

impl ResourceRecord {
    /// # Errors
    ///
    /// If the RDATA is too long.
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        self.name.serialise(buffer, true);
        buffer.write_u16(u16::from(self.rtype()));
        buffer.write_u16(u16::from(self.rclass));
        buffer.write_u32(self.ttl);

        // filled in below
        let rdlength_index = buffer.index();
        buffer.write_u16(0);

        self.data.serialise(buffer)?;

        // -2 so we don't also include the 2 octets for the rdlength
        let rdlength = usize_to_u16(buffer.index() - rdlength_index - 2)?;
        let [hi, lo] = rdlength.to_be_bytes();
        buffer.octets[rdlength_index] = hi;
        buffer.octets[rdlength_index + 1] = lo;

        Ok(())
    }
}

impl Edns {
    /// Reassemble the OPT record (RFC 6891 section 6.1.2), splicing
    /// the given extended-RCODE bits into the TTL field.
    pub fn serialise(
        &self,
        extended_rcode: u8,
        buffer: &mut WritableBuffer,
    ) -> Result<(), Error> {
        buffer.write_u8(0); // root owner name, never compressed
        buffer.write_u16(u16::from(RecordType::OPT));
        buffer.write_u16(self.udp_payload_size);
        buffer.write_u32(
            (u32::from(extended_rcode) << 24)
                | (u32::from(self.version) << 16)
                | u32::from(self.flags),
        );

        let mut rdata = Vec::new();
        for option in &self.options {
            option.to_octets(&mut rdata);
        }
        buffer.write_u16(usize_to_u16(rdata.len())?);
        buffer.write_octets(&rdata);
        Ok(())
    }
}

impl RecordData {
    /// Append the rdata octets.  Names compress only for the RFC
    /// 1035 types (see `compresses_rdata_names`); everything newer is
    /// written uncompressed, though still memoised as a pointer
    /// target.
    ///
    /// # Errors
    ///
    /// If a variable-length field overflows its length prefix.
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        let compress = compresses_rdata_names(self.rtype());

        match self {
            RecordData::A { address } => buffer.write_octets(&address.octets()),
            RecordData::Aaaa { address } => buffer.write_octets(&address.octets()),
            RecordData::Name { name, .. } => name.serialise(buffer, compress),
            RecordData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                mname.serialise(buffer, compress);
                rname.serialise(buffer, compress);
                buffer.write_u32(*serial);
                buffer.write_u32(*refresh);
                buffer.write_u32(*retry);
                buffer.write_u32(*expire);
                buffer.write_u32(*minimum);
            }
            RecordData::NamePair { first, second, .. } => {
                first.serialise(buffer, compress);
                second.serialise(buffer, compress);
            }
            RecordData::Exchange {
                preference,
                exchange,
                ..
            } => {
                buffer.write_u16(*preference);
                exchange.serialise(buffer, compress);
            }
            RecordData::Strings { strings, .. } => {
                for string in strings {
                    buffer.write_character_string(string)?;
                }
            }
            RecordData::Wks {
                address,
                protocol,
                bitmap,
            } => {
                buffer.write_octets(&address.octets());
                buffer.write_u8(*protocol);
                buffer.write_octets(bitmap);
            }
            RecordData::Opaque { octets, .. } | RecordData::Unknown { octets, .. } => {
                buffer.write_octets(octets);
            }
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                buffer.write_u16(*priority);
                buffer.write_u16(*weight);
                buffer.write_u16(*port);
                target.serialise(buffer, compress);
            }
            RecordData::Naptr {
                order,
                preference,
                flags,
                services,
                regexp,
                replacement,
            } => {
                buffer.write_u16(*order);
                buffer.write_u16(*preference);
                buffer.write_character_string(flags)?;
                buffer.write_character_string(services)?;
                buffer.write_character_string(regexp)?;
                replacement.serialise(buffer, compress);
            }
            RecordData::Px {
                preference,
                map822,
                mapx400,
            } => {
                buffer.write_u16(*preference);
                map822.serialise(buffer, compress);
                mapx400.serialise(buffer, compress);
            }
            RecordData::Loc {
                version,
                size,
                horizontal_precision,
                vertical_precision,
                latitude,
                longitude,
                altitude,
            } => {
                buffer.write_u8(*version);
                buffer.write_u8(*size);
                buffer.write_u8(*horizontal_precision);
                buffer.write_u8(*vertical_precision);
                buffer.write_u32(*latitude);
                buffer.write_u32(*longitude);
                buffer.write_u32(*altitude);
            }
            RecordData::Sig {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer,
                signature,
                ..
            } => {
                buffer.write_u16(u16::from(*type_covered));
                buffer.write_u8(*algorithm);
                buffer.write_u8(*labels);
                buffer.write_u32(*original_ttl);
                buffer.write_u32(*expiration);
                buffer.write_u32(*inception);
                buffer.write_u16(*key_tag);
                signer.serialise(buffer, compress);
                buffer.write_octets(signature);
            }
            RecordData::Key {
                flags,
                protocol,
                algorithm,
                public_key,
                ..
            } => {
                buffer.write_u16(*flags);
                buffer.write_u8(*protocol);
                buffer.write_u8(*algorithm);
                buffer.write_octets(public_key);
            }
            RecordData::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
                ..
            } => {
                buffer.write_u16(*key_tag);
                buffer.write_u8(*algorithm);
                buffer.write_u8(*digest_type);
                buffer.write_octets(digest);
            }
            RecordData::Nxt { next, bitmap } => {
                next.serialise(buffer, compress);
                buffer.write_octets(bitmap);
            }
            RecordData::Nsec { next, types } => {
                next.serialise(buffer, compress);
                let mut octets = Vec::with_capacity(types.wire_len());
                types.to_octets(&mut octets);
                buffer.write_octets(&octets);
            }
            RecordData::Nsec3 {
                hash_algorithm,
                flags,
                iterations,
                salt,
                next_hashed,
                types,
            } => {
                buffer.write_u8(*hash_algorithm);
                buffer.write_u8(*flags);
                buffer.write_u16(*iterations);
                buffer.write_character_string(salt)?;
                buffer.write_character_string(next_hashed)?;
                let mut octets = Vec::with_capacity(types.wire_len());
                types.to_octets(&mut octets);
                buffer.write_octets(&octets);
            }
            RecordData::Nsec3Param {
                hash_algorithm,
                flags,
                iterations,
                salt,
            } => {
                buffer.write_u8(*hash_algorithm);
                buffer.write_u8(*flags);
                buffer.write_u16(*iterations);
                buffer.write_character_string(salt)?;
            }
            RecordData::Cert {
                cert_type,
                key_tag,
                algorithm,
                certificate,
            } => {
                buffer.write_u16(*cert_type);
                buffer.write_u16(*key_tag);
                buffer.write_u8(*algorithm);
                buffer.write_octets(certificate);
            }
            RecordData::Sshfp {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => {
                buffer.write_u8(*algorithm);
                buffer.write_u8(*fingerprint_type);
                buffer.write_octets(fingerprint);
            }
            RecordData::Tlsa {
                usage,
                selector,
                matching_type,
                certificate_data,
                ..
            } => {
                buffer.write_u8(*usage);
                buffer.write_u8(*selector);
                buffer.write_u8(*matching_type);
                buffer.write_octets(certificate_data);
            }
            RecordData::Ipseckey {
                precedence,
                algorithm,
                gateway,
                public_key,
            } => {
                buffer.write_u8(*precedence);
                buffer.write_u8(gateway.gateway_type());
                buffer.write_u8(*algorithm);
                match gateway {
                    Gateway::None => (),
                    Gateway::Ipv4(address) => buffer.write_octets(&address.octets()),
                    Gateway::Ipv6(address) => buffer.write_octets(&address.octets()),
                    Gateway::Name(name) => name.serialise(buffer, false),
                }
                buffer.write_octets(public_key);
            }
            RecordData::Hip {
                algorithm,
                hit,
                public_key,
                servers,
            } => {
                buffer.write_u8(usize_to_u8(hit.len())?);
                buffer.write_u8(*algorithm);
                buffer.write_u16(usize_to_u16(public_key.len())?);
                buffer.write_octets(hit);
                buffer.write_octets(public_key);
                for server in servers {
                    server.serialise(buffer, false);
                }
            }
            RecordData::Csync {
                serial,
                flags,
                types,
            } => {
                buffer.write_u32(*serial);
                buffer.write_u16(*flags);
                let mut octets = Vec::with_capacity(types.wire_len());
                types.to_octets(&mut octets);
                buffer.write_octets(&octets);
            }
            RecordData::Caa {
                flags,
                tag_string,
                value,
            } => {
                buffer.write_u8(*flags);
                buffer.write_character_string(tag_string)?;
                buffer.write_octets(value);
            }
            RecordData::Uri {
                priority,
                weight,
                target,
            } => {
                buffer.write_u16(*priority);
                buffer.write_u16(*weight);
                buffer.write_octets(target);
            }
            RecordData::Nid {
                preference,
                node_id,
            } => {
                buffer.write_u16(*preference);
                buffer.write_octets(&node_id.to_be_bytes());
            }
            RecordData::L32 {
                preference,
                locator,
            } => {
                buffer.write_u16(*preference);
                buffer.write_octets(&locator.octets());
            }
            RecordData::L64 {
                preference,
                locator,
            } => {
                buffer.write_u16(*preference);
                buffer.write_octets(&locator.to_be_bytes());
            }
            RecordData::Lp { preference, fqdn } => {
                buffer.write_u16(*preference);
                fqdn.serialise(buffer, false);
            }
            RecordData::Eui48 { address } => buffer.write_octets(address),
            RecordData::Eui64 { address } => buffer.write_octets(address),
            RecordData::A6 {
                prefix_length,
                suffix,
                prefix_name,
            } => {
                buffer.write_u8(*prefix_length);
                let suffix_len = (128 - usize::from(*prefix_length)).div_ceil(8);
                buffer.write_octets(&suffix.octets()[16 - suffix_len..]);
                if let Some(name) = prefix_name {
                    name.serialise(buffer, false);
                }
            }
            RecordData::Apl { items } => {
                for item in items {
                    buffer.write_u16(item.family);
                    buffer.write_u8(item.prefix);
                    let length = usize_to_u8(item.address.len())?;
                    if length > 0b0111_1111 {
                        return Err(Error::CounterTooLarge {
                            counter: item.address.len(),
                            bits: 7,
                        });
                    }
                    buffer.write_u8(if item.negate { length | 0b1000_0000 } else { length });
                    buffer.write_octets(&item.address);
                }
            }
            RecordData::Opt { options } => {
                let mut octets = Vec::new();
                for option in options {
                    option.to_octets(&mut octets);
                }
                buffer.write_octets(&octets);
            }
            RecordData::Tsig {
                algorithm,
                time_signed,
                fudge,
                mac,
                original_id,
                error,
                other,
            } => {
                algorithm.serialise(buffer, false);
                buffer.write_u48(*time_signed);
                buffer.write_u16(*fudge);
                buffer.write_u16(usize_to_u16(mac.len())?);
                buffer.write_octets(mac);
                buffer.write_u16(*original_id);
                buffer.write_u16(*error);
                buffer.write_u16(usize_to_u16(other.len())?);
                buffer.write_octets(other);
            }
            RecordData::Tkey {
                algorithm,
                inception,
                expiration,
                mode,
                error,
                key,
                other,
            } => {
                algorithm.serialise(buffer, false);
                buffer.write_u32(*inception);
                buffer.write_u32(*expiration);
                buffer.write_u16(*mode);
                buffer.write_u16(*error);
                buffer.write_u16(usize_to_u16(key.len())?);
                buffer.write_octets(key);
                buffer.write_u16(usize_to_u16(other.len())?);
                buffer.write_octets(other);
            }
            RecordData::Doa {
                enterprise,
                doa_type,
                location,
                media_type,
                data,
            } => {
                buffer.write_u32(*enterprise);
                buffer.write_u32(*doa_type);
                buffer.write_u8(*location);
                buffer.write_character_string(media_type)?;
                buffer.write_octets(data);
            }
        }

        Ok(())
    }
}

impl DomainName {
    /// Write the name, using and extending the buffer's compression
    /// map.  Every label suffix already written is a candidate
    /// pointer target; whether a pointer may actually be emitted
    /// depends on `compress`.
    pub fn serialise(&self, buffer: &mut WritableBuffer, compress: bool) {
        for (i, label) in self.labels.iter().enumerate() {
            if label.is_empty() {
                buffer.write_u8(0);
                return;
            }

            let key = suffix_key(&self.labels[i..]);
            if compress {
                if let Some(pointer) = buffer.name_pointer(&key) {
                    buffer.write_u16(pointer);
                    return;
                }
            }
            buffer.memoise_suffix(key);

            buffer.write_u8(label.len() as u8);
            buffer.write_octets(label);
        }
    }
}

/// The compression-map key for a label suffix: the case-folded wire
/// encoding, so lookups are case-insensitive like everything else.
fn suffix_key(labels: &[Vec<u8>]) -> Vec<u8> {
    let mut key = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum());
    for label in labels {
        key.push(label.len() as u8);
        for octet in label {
            key.push(octet.to_ascii_lowercase());
        }
    }
    key
}

/// Errors encountered when serialising a message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// A counter does not fit in the desired width.
    CounterTooLarge { counter: usize, bits: u32 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CounterTooLarge { counter, bits } => {
                write!(f, "'{counter}' cannot be converted to a u{bits}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which can be written to, for serialisation purposes.
pub struct WritableBuffer {
    pub octets: BytesMut,
    name_pointers: HashMap<Vec<u8>, u16>,
}

impl Default for WritableBuffer {
    fn default() -> Self {
        Self {
            octets: BytesMut::with_capacity(512),
            name_pointers: HashMap::new(),
        }
    }
}

impl WritableBuffer {
    pub fn index(&self) -> usize {
        self.octets.len()
    }

    /// Record the current offset as a pointer target for the given
    /// suffix, if the offset fits in the 14 pointer bits and the
    /// suffix is not already memoised.
    fn memoise_suffix(&mut self, key: Vec<u8>) {
        if self.index() < 0b0100_0000_0000_0000 && !self.name_pointers.contains_key(&key) {
            let pointer = (self.index() as u16) | 0b1100_0000_0000_0000;
            self.name_pointers.insert(key, pointer);
        }
    }

    fn name_pointer(&self, key: &[u8]) -> Option<u16> {
        self.name_pointers.get(key).copied()
    }

    pub fn write_u8(&mut self, octet: u8) {
        self.octets.put_u8(octet);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.octets.put_u16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.octets.put_u32(value);
    }

    /// Write the low 48 bits, as used by the TSIG timestamp.
    pub fn write_u48(&mut self, value: u64) {
        self.octets.put_slice(&value.to_be_bytes()[2..]);
    }

    pub fn write_octets(&mut self, octets: &[u8]) {
        self.octets.put_slice(octets);
    }

    /// Write a length-prefixed character-string.
    ///
    /// # Errors
    ///
    /// If the string is over 255 octets.
    pub fn write_character_string(&mut self, octets: &[u8]) -> Result<(), Error> {
        self.octets.put_u8(usize_to_u8(octets.len())?);
        self.octets.put_slice(octets);
        Ok(())
    }
}

/// Helper function to convert a `usize` into a `u16` (or return an error).
///
/// # Errors
///
/// If the value cannot be converted.
fn usize_to_u16(counter: usize) -> Result<u16, Error> {
    if let Ok(t) = u16::try_from(counter) {
        Ok(t)
    } else {
        Err(Error::CounterTooLarge {
            counter,
            bits: u16::BITS,
        })
    }
}

fn usize_to_u8(counter: usize) -> Result<u8, Error> {
    if let Ok(t) = u8::try_from(counter) {
        Ok(t)
    } else {
        Err(Error::CounterTooLarge {
            counter,
            bits: u8::BITS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    #[rustfmt::skip]
    fn test_suffix_compression() {
        let mut buf = WritableBuffer::default();
        buf.write_u8(1);
        buf.write_u8(2);
        buf.write_u8(3);
        buf.write_u8(4);
        domain("www.example.com.").serialise(&mut buf, true);
        domain("mail.EXAMPLE.com.").serialise(&mut buf, true);

        assert_eq!(
            &[
                1, 2, 3, 4,
                // domain 1
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
                // domain 2: "mail" + pointer to "example.com." at 8
                4, 109, 97, 105, 108,
                0b1100_0000, 0b0000_1000,
            ][..],
            &buf.octets[..],
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_compression_opt_out() {
        let mut buf = WritableBuffer::default();
        domain("example.com.").serialise(&mut buf, true);
        domain("example.com.").serialise(&mut buf, false);

        assert_eq!(
            &[
                7, 101, 120, 97, 109, 112, 108, 101, 3, 99, 111, 109, 0,
                7, 101, 120, 97, 109, 112, 108, 101, 3, 99, 111, 109, 0,
            ][..],
            &buf.octets[..],
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_sets_rdlength() {
        let mut buf = WritableBuffer::default();
        buf.write_u8(1);
        buf.write_u8(2);
        buf.write_u8(3);
        buf.write_u8(4);

        let rr = mx_record("www.example.com.", 32, "mx.example.net.");
        rr.serialise(&mut buf).unwrap();

        assert_eq!(
            &[
                1, 2, 3, 4,
                // NAME
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
                // TYPE
                0b0000_0000, 0b0000_1111, // MX
                // CLASS
                0b0000_0000, 0b0000_0001, // IN
                // TTL
                0b0000_0000, 0b0000_0000, 0b0000_0001, 0b0010_1100, // 300
                // RDLENGTH
                0b0000_0000, 0b0001_0010, // 18 octets
                // RDATA
                0, 32, // preference
                2, 109, 120, // "mx"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 110, 101, 116, 0, // "net"
            ][..],
            &buf.octets[..],
        );
    }

    #[test]
    fn test_rdlength_uses_rdata_pointer() {
        // the MX exchange can compress against the owner name, and
        // the rdlength is the compressed length
        let mut buf = WritableBuffer::default();
        let rr = mx_record("example.com.", 10, "mail.example.com.");
        rr.serialise(&mut buf).unwrap();

        let rdlength = u16::from_be_bytes([buf.octets[21], buf.octets[22]]);
        assert_eq!(2 + 5 + 2, rdlength); // preference + "mail" + pointer
    }
}
