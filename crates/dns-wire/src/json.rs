//! JSON input and output for records and messages.
//!
//! The field names follow the rdata shapes: a shared shape uses the
//! same names for every type it covers.  Binary fields use the same
//! textual encodings as the presentation format - hex, base64, or
//! base32hex depending on the field - and type bitmaps are arrays of
//! type mnemonics.

use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::protocol::bitmap::TypeBitmap;
use crate::protocol::options::EdnsOption;
use crate::protocol::rdata::{shape_of, AplItem, Gateway, RecordData, Shape};
use crate::protocol::types::*;
use crate::text::serialise::quote_character_string;
use crate::text::{from_base32hex, from_base64, from_hex, to_base32hex, to_base64, to_hex};

/// Errors encountered when reading JSON.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    NotAnObject,
    MissingField { field: &'static str },
    BadField { field: &'static str },
    BadRdata { rtype: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::NotAnObject => write!(f, "expected a JSON object"),
            Error::MissingField { field } => write!(f, "missing field '{field}'"),
            Error::BadField { field } => write!(f, "malformed field '{field}'"),
            Error::BadRdata { rtype } => write!(f, "malformed {rtype} data"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl Message {
    pub fn to_json(&self) -> Value {
        let rrs = |section: &[ResourceRecord]| {
            section.iter().map(ResourceRecord::to_json).collect::<Vec<_>>()
        };

        let mut object = Map::new();
        object.insert(
            "header".to_string(),
            json!({
                "id": self.header.id,
                "qr": self.header.is_response,
                "opcode": self.header.opcode.to_string(),
                "aa": self.header.is_authoritative,
                "tc": self.header.is_truncated,
                "rd": self.header.recursion_desired,
                "ra": self.header.recursion_available,
                "z": self.header.z,
                "ad": self.header.authentic_data,
                "cd": self.header.checking_disabled,
                "rcode": self.header.rcode.to_string(),
            }),
        );
        object.insert(
            "question".to_string(),
            Value::Array(self.questions.iter().map(Question::to_json).collect()),
        );
        object.insert("answer".to_string(), Value::Array(rrs(&self.answers)));
        object.insert("authority".to_string(), Value::Array(rrs(&self.authority)));
        object.insert(
            "additional".to_string(),
            Value::Array(rrs(&self.additional)),
        );
        object.insert(
            "edns".to_string(),
            match &self.edns {
                Some(edns) => edns.to_json(),
                None => Value::Null,
            },
        );
        object.insert(
            "tsig".to_string(),
            match &self.tsig {
                Some(rr) => rr.to_json(),
                None => Value::Null,
            },
        );
        object.insert(
            "sig0".to_string(),
            match &self.sig0 {
                Some(rr) => rr.to_json(),
                None => Value::Null,
            },
        );
        Value::Object(object)
    }

    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let object = value.as_object().ok_or(Error::NotAnObject)?;
        let header = object.get("header").ok_or(Error::MissingField {
            field: "header",
        })?;
        let header = header.as_object().ok_or(Error::BadField { field: "header" })?;

        let flag = |field: &'static str| -> Result<bool, Error> {
            match header.get(field) {
                None => Ok(false),
                Some(value) => value.as_bool().ok_or(Error::BadField { field }),
            }
        };

        let section = |field: &'static str| -> Result<Vec<ResourceRecord>, Error> {
            match object.get(field) {
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Array(values)) => {
                    values.iter().map(ResourceRecord::from_json).collect()
                }
                Some(_) => Err(Error::BadField { field }),
            }
        };

        let optional_rr = |field: &'static str| -> Result<Option<ResourceRecord>, Error> {
            match object.get(field) {
                None | Some(Value::Null) => Ok(None),
                Some(value) => Ok(Some(ResourceRecord::from_json(value)?)),
            }
        };

        let questions = match object.get("question") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values
                .iter()
                .map(Question::from_json)
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(Error::BadField { field: "question" }),
        };

        let edns = match object.get("edns") {
            None | Some(Value::Null) => None,
            Some(value) => Some(Edns::from_json(value)?),
        };

        Ok(Self {
            header: Header {
                id: get_u16(header, "id")?,
                is_response: flag("qr")?,
                opcode: Opcode::from_str(get_str(header, "opcode")?)
                    .map_err(|()| Error::BadField { field: "opcode" })?,
                is_authoritative: flag("aa")?,
                is_truncated: flag("tc")?,
                recursion_desired: flag("rd")?,
                recursion_available: flag("ra")?,
                z: flag("z")?,
                authentic_data: flag("ad")?,
                checking_disabled: flag("cd")?,
                rcode: Rcode::from_str(get_str(header, "rcode")?)
                    .map_err(|()| Error::BadField { field: "rcode" })?,
            },
            questions,
            answers: section("answer")?,
            authority: section("authority")?,
            additional: section("additional")?,
            edns,
            tsig: optional_rr("tsig")?,
            sig0: optional_rr("sig0")?,
            size: 0,
            trailing: Vec::new(),
        })
    }
}

impl Question {
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name.to_dotted_string(),
            "type": self.qtype.to_string(),
            "class": self.qclass.to_string(),
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let object = value.as_object().ok_or(Error::NotAnObject)?;
        Ok(Self {
            name: get_domain(object, "name")?,
            qtype: RecordType::from_str(get_str(object, "type")?)
                .map_err(|()| Error::BadField { field: "type" })?,
            qclass: RecordClass::from_str(get_str(object, "class")?)
                .map_err(|()| Error::BadField { field: "class" })?,
        })
    }
}

impl Edns {
    /// The OPT pseudo-record, minus the extended-RCODE bits (those
    /// live in the header's `rcode`).
    pub fn to_json(&self) -> Value {
        json!({
            "udp_payload_size": self.udp_payload_size,
            "version": self.version,
            "dnssec_ok": self.dnssec_ok(),
            "flags": self.flags,
            "options": self.options.iter().map(|option| {
                let mut data = Vec::new();
                option.to_octets(&mut data);
                json!({
                    "code": option.code(),
                    "data": to_hex(&data[4..]),
                })
            }).collect::<Vec<_>>(),
        })
    }

    /// The `options` field must be an array of `{code, data}`
    /// objects; anything else is rejected rather than guessed at.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let object = value.as_object().ok_or(Error::NotAnObject)?;

        let mut options = Vec::new();
        match object.get("options") {
            None | Some(Value::Null) => (),
            Some(Value::Array(values)) => {
                for value in values {
                    let option = value.as_object().ok_or(Error::BadField {
                        field: "options",
                    })?;
                    let code = get_u16(option, "code")?;
                    let data = from_hex(get_str(option, "data")?)
                        .ok_or(Error::BadField { field: "data" })?;
                    options.push(EdnsOption::parse_one(code, &data));
                }
            }
            Some(_) => return Err(Error::BadField { field: "options" }),
        }

        let flags = match object.get("flags") {
            None => {
                if object.get("dnssec_ok").and_then(Value::as_bool) == Some(true) {
                    EDNS_FLAG_DO
                } else {
                    0
                }
            }
            Some(value) => u16_value(value).ok_or(Error::BadField { field: "flags" })?,
        };

        Ok(Self {
            udp_payload_size: get_u16(object, "udp_payload_size")?,
            version: get_u8(object, "version")?,
            flags,
            options,
        })
    }
}

impl ResourceRecord {
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name.to_dotted_string(),
            "type": self.rtype().to_string(),
            "class": self.rclass.to_string(),
            "ttl": self.ttl,
            "data": self.data.to_json(),
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let object = value.as_object().ok_or(Error::NotAnObject)?;
        let rtype = RecordType::from_str(get_str(object, "type")?)
            .map_err(|()| Error::BadField { field: "type" })?;
        let data = object.get("data").ok_or(Error::MissingField { field: "data" })?;

        Ok(Self {
            name: get_domain(object, "name")?,
            data: RecordData::from_json(rtype, data)?,
            rclass: RecordClass::from_str(get_str(object, "class")?)
                .map_err(|()| Error::BadField { field: "class" })?,
            ttl: get_u32(object, "ttl")?,
        })
    }
}

impl RecordData {
    pub fn to_json(&self) -> Value {
        match self {
            RecordData::A { address } => json!({"address": address.to_string()}),
            RecordData::Aaaa { address } => json!({"address": address.to_string()}),
            RecordData::Name { name, .. } => json!({"name": name.to_dotted_string()}),
            RecordData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => json!({
                "mname": mname.to_dotted_string(),
                "rname": rname.to_dotted_string(),
                "serial": serial,
                "refresh": refresh,
                "retry": retry,
                "expire": expire,
                "minimum": minimum,
            }),
            RecordData::NamePair { first, second, .. } => json!({
                "first": first.to_dotted_string(),
                "second": second.to_dotted_string(),
            }),
            RecordData::Exchange {
                preference,
                exchange,
                ..
            } => json!({
                "preference": preference,
                "exchange": exchange.to_dotted_string(),
            }),
            RecordData::Strings { strings, .. } => json!({
                "strings": strings.iter().map(|s| char_string_text(s)).collect::<Vec<_>>(),
            }),
            RecordData::Wks {
                address,
                protocol,
                bitmap,
            } => json!({
                "address": address.to_string(),
                "protocol": protocol,
                "bitmap": to_hex(bitmap),
            }),
            RecordData::Opaque { octets, .. } => json!({"octets": to_hex(octets)}),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => json!({
                "priority": priority,
                "weight": weight,
                "port": port,
                "target": target.to_dotted_string(),
            }),
            RecordData::Naptr {
                order,
                preference,
                flags,
                services,
                regexp,
                replacement,
            } => json!({
                "order": order,
                "preference": preference,
                "flags": char_string_text(flags),
                "services": char_string_text(services),
                "regexp": char_string_text(regexp),
                "replacement": replacement.to_dotted_string(),
            }),
            RecordData::Px {
                preference,
                map822,
                mapx400,
            } => json!({
                "preference": preference,
                "map822": map822.to_dotted_string(),
                "mapx400": mapx400.to_dotted_string(),
            }),
            RecordData::Loc {
                version,
                size,
                horizontal_precision,
                vertical_precision,
                latitude,
                longitude,
                altitude,
            } => json!({
                "version": version,
                "size": size,
                "horizontal_precision": horizontal_precision,
                "vertical_precision": vertical_precision,
                "latitude": latitude,
                "longitude": longitude,
                "altitude": altitude,
            }),
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
            } => json!({
                "type_covered": type_covered.to_string(),
                "algorithm": algorithm,
                "labels": labels,
                "original_ttl": original_ttl,
                "expiration": expiration,
                "inception": inception,
                "key_tag": key_tag,
                "signer": signer.to_dotted_string(),
                "signature": to_base64(signature),
            }),
            RecordData::Key {
                flags,
                protocol,
                algorithm,
                public_key,
                ..
            } => json!({
                "flags": flags,
                "protocol": protocol,
                "algorithm": algorithm,
                "public_key": to_base64(public_key),
            }),
            RecordData::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
                ..
            } => json!({
                "key_tag": key_tag,
                "algorithm": algorithm,
                "digest_type": digest_type,
                "digest": to_hex(digest),
            }),
            RecordData::Nxt { next, bitmap } => json!({
                "next": next.to_dotted_string(),
                "bitmap": to_hex(bitmap),
            }),
            RecordData::Nsec { next, types } => json!({
                "next": next.to_dotted_string(),
                "types": type_mnemonics(types),
            }),
            RecordData::Nsec3 {
                hash_algorithm,
                flags,
                iterations,
                salt,
                next_hashed,
                types,
            } => json!({
                "hash_algorithm": hash_algorithm,
                "flags": flags,
                "iterations": iterations,
                "salt": to_hex(salt),
                "next_hashed": to_base32hex(next_hashed),
                "types": type_mnemonics(types),
            }),
            RecordData::Nsec3Param {
                hash_algorithm,
                flags,
                iterations,
                salt,
            } => json!({
                "hash_algorithm": hash_algorithm,
                "flags": flags,
                "iterations": iterations,
                "salt": to_hex(salt),
            }),
            RecordData::Cert {
                cert_type,
                key_tag,
                algorithm,
                certificate,
            } => json!({
                "cert_type": cert_type,
                "key_tag": key_tag,
                "algorithm": algorithm,
                "certificate": to_base64(certificate),
            }),
            RecordData::Sshfp {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => json!({
                "algorithm": algorithm,
                "fingerprint_type": fingerprint_type,
                "fingerprint": to_hex(fingerprint),
            }),
            RecordData::Tlsa {
                usage,
                selector,
                matching_type,
                certificate_data,
                ..
            } => json!({
                "usage": usage,
                "selector": selector,
                "matching_type": matching_type,
                "certificate_data": to_hex(certificate_data),
            }),
            RecordData::Ipseckey {
                precedence,
                algorithm,
                gateway,
                public_key,
            } => json!({
                "precedence": precedence,
                "gateway_type": gateway.gateway_type(),
                "algorithm": algorithm,
                "gateway": match gateway {
                    Gateway::None => ".".to_string(),
                    Gateway::Ipv4(address) => address.to_string(),
                    Gateway::Ipv6(address) => address.to_string(),
                    Gateway::Name(name) => name.to_dotted_string(),
                },
                "public_key": to_base64(public_key),
            }),
            RecordData::Hip {
                algorithm,
                hit,
                public_key,
                servers,
            } => json!({
                "algorithm": algorithm,
                "hit": to_hex(hit),
                "public_key": to_base64(public_key),
                "servers": servers.iter().map(DomainName::to_dotted_string).collect::<Vec<_>>(),
            }),
            RecordData::Csync {
                serial,
                flags,
                types,
            } => json!({
                "serial": serial,
                "flags": flags,
                "types": type_mnemonics(types),
            }),
            RecordData::Caa {
                flags,
                tag_string,
                value,
            } => json!({
                "flags": flags,
                "tag": char_string_text(tag_string),
                "value": char_string_text(value),
            }),
            RecordData::Uri {
                priority,
                weight,
                target,
            } => json!({
                "priority": priority,
                "weight": weight,
                "target": char_string_text(target),
            }),
            RecordData::Nid {
                preference,
                node_id,
            } => json!({"preference": preference, "node_id": node_id}),
            RecordData::L32 {
                preference,
                locator,
            } => json!({"preference": preference, "locator": locator.to_string()}),
            RecordData::L64 {
                preference,
                locator,
            } => json!({"preference": preference, "locator": locator}),
            RecordData::Lp { preference, fqdn } => json!({
                "preference": preference,
                "fqdn": fqdn.to_dotted_string(),
            }),
            RecordData::Eui48 { address } => json!({"address": to_hex(address)}),
            RecordData::Eui64 { address } => json!({"address": to_hex(address)}),
            RecordData::A6 {
                prefix_length,
                suffix,
                prefix_name,
            } => json!({
                "prefix_length": prefix_length,
                "suffix": suffix.to_string(),
                "prefix_name": prefix_name.as_ref().map(DomainName::to_dotted_string),
            }),
            RecordData::Apl { items } => json!({
                "items": items.iter().map(|item| json!({
                    "family": item.family,
                    "prefix": item.prefix,
                    "negate": item.negate,
                    "address": to_hex(&item.address),
                })).collect::<Vec<_>>(),
            }),
            RecordData::Opt { options } => json!({
                "options": options.iter().map(|option| {
                    let mut data = Vec::new();
                    option.to_octets(&mut data);
                    json!({"code": option.code(), "data": to_hex(&data[4..])})
                }).collect::<Vec<_>>(),
            }),
            RecordData::Tsig {
                algorithm,
                time_signed,
                fudge,
                mac,
                original_id,
                error,
                other,
            } => json!({
                "algorithm": algorithm.to_dotted_string(),
                "time_signed": time_signed,
                "fudge": fudge,
                "mac": to_base64(mac),
                "original_id": original_id,
                "error": error,
                "other": to_base64(other),
            }),
            RecordData::Tkey {
                algorithm,
                inception,
                expiration,
                mode,
                error,
                key,
                other,
            } => json!({
                "algorithm": algorithm.to_dotted_string(),
                "inception": inception,
                "expiration": expiration,
                "mode": mode,
                "error": error,
                "key": to_base64(key),
                "other": to_base64(other),
            }),
            RecordData::Doa {
                enterprise,
                doa_type,
                location,
                media_type,
                data,
            } => json!({
                "enterprise": enterprise,
                "doa_type": doa_type,
                "location": location,
                "media_type": char_string_text(media_type),
                "data": to_base64(data),
            }),
            RecordData::Unknown { octets, .. } => json!({"octets": to_hex(octets)}),
        }
    }

    pub fn from_json(rtype: RecordType, value: &Value) -> Result<Self, Error> {
        let o = value.as_object().ok_or(Error::NotAnObject)?;
        let bad_rdata = || Error::BadRdata {
            rtype: rtype.to_string(),
        };

        let data = match shape_of(rtype) {
            Shape::A => RecordData::A {
                address: get_str(o, "address")?.parse().map_err(|_| bad_rdata())?,
            },
            Shape::Aaaa => RecordData::Aaaa {
                address: get_str(o, "address")?.parse().map_err(|_| bad_rdata())?,
            },
            Shape::Name => RecordData::Name {
                tag: rtype,
                name: get_domain(o, "name")?,
            },
            Shape::Soa => RecordData::Soa {
                mname: get_domain(o, "mname")?,
                rname: get_domain(o, "rname")?,
                serial: get_u32(o, "serial")?,
                refresh: get_u32(o, "refresh")?,
                retry: get_u32(o, "retry")?,
                expire: get_u32(o, "expire")?,
                minimum: get_u32(o, "minimum")?,
            },
            Shape::NamePair => RecordData::NamePair {
                tag: rtype,
                first: get_domain(o, "first")?,
                second: get_domain(o, "second")?,
            },
            Shape::Exchange => RecordData::Exchange {
                tag: rtype,
                preference: get_u16(o, "preference")?,
                exchange: get_domain(o, "exchange")?,
            },
            Shape::Strings => {
                let values = o
                    .get("strings")
                    .and_then(Value::as_array)
                    .ok_or(Error::BadField { field: "strings" })?;
                let mut strings = Vec::with_capacity(values.len());
                for value in values {
                    let text = value.as_str().ok_or(Error::BadField { field: "strings" })?;
                    strings.push(char_string_octets(text).ok_or_else(bad_rdata)?);
                }
                RecordData::Strings {
                    tag: rtype,
                    strings,
                }
            }
            Shape::Wks => RecordData::Wks {
                address: get_str(o, "address")?.parse().map_err(|_| bad_rdata())?,
                protocol: get_u8(o, "protocol")?,
                bitmap: get_hex(o, "bitmap")?,
            },
            Shape::Opaque => RecordData::Opaque {
                tag: rtype,
                octets: get_hex(o, "octets")?,
            },
            Shape::Srv => RecordData::Srv {
                priority: get_u16(o, "priority")?,
                weight: get_u16(o, "weight")?,
                port: get_u16(o, "port")?,
                target: get_domain(o, "target")?,
            },
            Shape::Naptr => RecordData::Naptr {
                order: get_u16(o, "order")?,
                preference: get_u16(o, "preference")?,
                flags: get_char_string(o, "flags")?,
                services: get_char_string(o, "services")?,
                regexp: get_char_string(o, "regexp")?,
                replacement: get_domain(o, "replacement")?,
            },
            Shape::Px => RecordData::Px {
                preference: get_u16(o, "preference")?,
                map822: get_domain(o, "map822")?,
                mapx400: get_domain(o, "mapx400")?,
            },
            Shape::Loc => RecordData::Loc {
                version: get_u8(o, "version")?,
                size: get_u8(o, "size")?,
                horizontal_precision: get_u8(o, "horizontal_precision")?,
                vertical_precision: get_u8(o, "vertical_precision")?,
                latitude: get_u32(o, "latitude")?,
                longitude: get_u32(o, "longitude")?,
                altitude: get_u32(o, "altitude")?,
            },
            Shape::Sig => RecordData::Sig {
                tag: rtype,
                type_covered: RecordType::from_str(get_str(o, "type_covered")?)
                    .map_err(|()| Error::BadField { field: "type_covered" })?,
                algorithm: get_u8(o, "algorithm")?,
                labels: get_u8(o, "labels")?,
                original_ttl: get_u32(o, "original_ttl")?,
                expiration: get_u32(o, "expiration")?,
                inception: get_u32(o, "inception")?,
                key_tag: get_u16(o, "key_tag")?,
                signer: get_domain(o, "signer")?,
                signature: get_base64(o, "signature")?,
            },
            Shape::Key => RecordData::Key {
                tag: rtype,
                flags: get_u16(o, "flags")?,
                protocol: get_u8(o, "protocol")?,
                algorithm: get_u8(o, "algorithm")?,
                public_key: get_base64(o, "public_key")?,
            },
            Shape::Ds => RecordData::Ds {
                tag: rtype,
                key_tag: get_u16(o, "key_tag")?,
                algorithm: get_u8(o, "algorithm")?,
                digest_type: get_u8(o, "digest_type")?,
                digest: get_hex(o, "digest")?,
            },
            Shape::Nxt => RecordData::Nxt {
                next: get_domain(o, "next")?,
                bitmap: get_hex(o, "bitmap")?,
            },
            Shape::Nsec => RecordData::Nsec {
                next: get_domain(o, "next")?,
                types: get_type_list(o, "types")?,
            },
            Shape::Nsec3 => RecordData::Nsec3 {
                hash_algorithm: get_u8(o, "hash_algorithm")?,
                flags: get_u8(o, "flags")?,
                iterations: get_u16(o, "iterations")?,
                salt: get_hex(o, "salt")?,
                next_hashed: from_base32hex(get_str(o, "next_hashed")?)
                    .ok_or(Error::BadField { field: "next_hashed" })?,
                types: get_type_list(o, "types")?,
            },
            Shape::Nsec3Param => RecordData::Nsec3Param {
                hash_algorithm: get_u8(o, "hash_algorithm")?,
                flags: get_u8(o, "flags")?,
                iterations: get_u16(o, "iterations")?,
                salt: get_hex(o, "salt")?,
            },
            Shape::Cert => RecordData::Cert {
                cert_type: get_u16(o, "cert_type")?,
                key_tag: get_u16(o, "key_tag")?,
                algorithm: get_u8(o, "algorithm")?,
                certificate: get_base64(o, "certificate")?,
            },
            Shape::Sshfp => RecordData::Sshfp {
                algorithm: get_u8(o, "algorithm")?,
                fingerprint_type: get_u8(o, "fingerprint_type")?,
                fingerprint: get_hex(o, "fingerprint")?,
            },
            Shape::Tlsa => RecordData::Tlsa {
                tag: rtype,
                usage: get_u8(o, "usage")?,
                selector: get_u8(o, "selector")?,
                matching_type: get_u8(o, "matching_type")?,
                certificate_data: get_hex(o, "certificate_data")?,
            },
            Shape::Ipseckey => {
                let gateway_type = get_u8(o, "gateway_type")?;
                let gateway_str = get_str(o, "gateway")?;
                let gateway = match gateway_type {
                    0 => Gateway::None,
                    1 => Gateway::Ipv4(gateway_str.parse().map_err(|_| bad_rdata())?),
                    2 => Gateway::Ipv6(gateway_str.parse().map_err(|_| bad_rdata())?),
                    3 => Gateway::Name(
                        DomainName::from_dotted_string(gateway_str).ok_or_else(bad_rdata)?,
                    ),
                    _ => return Err(bad_rdata()),
                };
                RecordData::Ipseckey {
                    precedence: get_u8(o, "precedence")?,
                    algorithm: get_u8(o, "algorithm")?,
                    gateway,
                    public_key: get_base64(o, "public_key")?,
                }
            }
            Shape::Hip => {
                let servers = o
                    .get("servers")
                    .and_then(Value::as_array)
                    .ok_or(Error::BadField { field: "servers" })?;
                RecordData::Hip {
                    algorithm: get_u8(o, "algorithm")?,
                    hit: get_hex(o, "hit")?,
                    public_key: get_base64(o, "public_key")?,
                    servers: servers
                        .iter()
                        .map(|v| {
                            v.as_str()
                                .and_then(DomainName::from_dotted_string)
                                .ok_or(Error::BadField { field: "servers" })
                        })
                        .collect::<Result<_, _>>()?,
                }
            }
            Shape::Csync => RecordData::Csync {
                serial: get_u32(o, "serial")?,
                flags: get_u16(o, "flags")?,
                types: get_type_list(o, "types")?,
            },
            Shape::Caa => RecordData::Caa {
                flags: get_u8(o, "flags")?,
                tag_string: get_char_string(o, "tag")?,
                value: get_char_string(o, "value")?,
            },
            Shape::Uri => RecordData::Uri {
                priority: get_u16(o, "priority")?,
                weight: get_u16(o, "weight")?,
                target: get_char_string(o, "target")?,
            },
            Shape::Nid => RecordData::Nid {
                preference: get_u16(o, "preference")?,
                node_id: get_u64(o, "node_id")?,
            },
            Shape::L32 => RecordData::L32 {
                preference: get_u16(o, "preference")?,
                locator: get_str(o, "locator")?.parse().map_err(|_| bad_rdata())?,
            },
            Shape::L64 => RecordData::L64 {
                preference: get_u16(o, "preference")?,
                locator: get_u64(o, "locator")?,
            },
            Shape::Lp => RecordData::Lp {
                preference: get_u16(o, "preference")?,
                fqdn: get_domain(o, "fqdn")?,
            },
            Shape::Eui48 => RecordData::Eui48 {
                address: get_hex(o, "address")?
                    .try_into()
                    .map_err(|_| bad_rdata())?,
            },
            Shape::Eui64 => RecordData::Eui64 {
                address: get_hex(o, "address")?
                    .try_into()
                    .map_err(|_| bad_rdata())?,
            },
            Shape::A6 => {
                let prefix_length = get_u8(o, "prefix_length")?;
                if prefix_length > 128 {
                    return Err(bad_rdata());
                }
                let prefix_name = match o.get("prefix_name") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(
                        value
                            .as_str()
                            .and_then(DomainName::from_dotted_string)
                            .ok_or(Error::BadField { field: "prefix_name" })?,
                    ),
                };
                RecordData::A6 {
                    prefix_length,
                    suffix: get_str(o, "suffix")?.parse().map_err(|_| bad_rdata())?,
                    prefix_name,
                }
            }
            Shape::Apl => {
                let values = o
                    .get("items")
                    .and_then(Value::as_array)
                    .ok_or(Error::BadField { field: "items" })?;
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    let item = value.as_object().ok_or(Error::BadField { field: "items" })?;
                    items.push(AplItem {
                        family: get_u16(item, "family")?,
                        prefix: get_u8(item, "prefix")?,
                        negate: item
                            .get("negate")
                            .and_then(Value::as_bool)
                            .ok_or(Error::BadField { field: "negate" })?,
                        address: get_hex(item, "address")?,
                    });
                }
                RecordData::Apl { items }
            }
            Shape::Opt => {
                let values = o
                    .get("options")
                    .and_then(Value::as_array)
                    .ok_or(Error::BadField { field: "options" })?;
                let mut options = Vec::with_capacity(values.len());
                for value in values {
                    let option = value.as_object().ok_or(Error::BadField { field: "options" })?;
                    let code = get_u16(option, "code")?;
                    let data = get_hex(option, "data")?;
                    options.push(EdnsOption::parse_one(code, &data));
                }
                RecordData::Opt { options }
            }
            Shape::Tsig => RecordData::Tsig {
                algorithm: get_domain(o, "algorithm")?,
                time_signed: get_u64(o, "time_signed")?,
                fudge: get_u16(o, "fudge")?,
                mac: get_base64(o, "mac")?,
                original_id: get_u16(o, "original_id")?,
                error: get_u16(o, "error")?,
                other: get_base64(o, "other")?,
            },
            Shape::Tkey => RecordData::Tkey {
                algorithm: get_domain(o, "algorithm")?,
                inception: get_u32(o, "inception")?,
                expiration: get_u32(o, "expiration")?,
                mode: get_u16(o, "mode")?,
                error: get_u16(o, "error")?,
                key: get_base64(o, "key")?,
                other: get_base64(o, "other")?,
            },
            Shape::Doa => RecordData::Doa {
                enterprise: get_u32(o, "enterprise")?,
                doa_type: get_u32(o, "doa_type")?,
                location: get_u8(o, "location")?,
                media_type: get_char_string(o, "media_type")?,
                data: get_base64(o, "data")?,
            },
            Shape::Unknown => RecordData::Unknown {
                tag: rtype,
                octets: get_hex(o, "octets")?,
            },
        };

        Ok(data)
    }
}

/// Character-string bytes as text, with `\DDD` escapes for anything
/// outside printable ASCII.  The quoting helper adds delimiters; here
/// only the escaping is wanted.
fn char_string_text(octets: &[u8]) -> String {
    let quoted = quote_character_string(octets);
    quoted[1..quoted.len() - 1].to_string()
}

fn char_string_octets(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let c1 = chars.next()?;
            if let Some(d1) = c1.to_digit(10) {
                let d2 = chars.next()?.to_digit(10)?;
                let d3 = chars.next()?.to_digit(10)?;
                out.push(u8::try_from(d1 * 100 + d2 * 10 + d3).ok()?);
            } else if c1.is_ascii() {
                out.push(c1 as u8);
            } else {
                return None;
            }
        } else if c.is_ascii() {
            out.push(c as u8);
        } else {
            return None;
        }
    }
    Some(out)
}

fn type_mnemonics(types: &TypeBitmap) -> Vec<String> {
    types.types().iter().map(ToString::to_string).collect()
}

fn get_str<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, Error> {
    object
        .get(field)
        .ok_or(Error::MissingField { field })?
        .as_str()
        .ok_or(Error::BadField { field })
}

fn get_domain(object: &Map<String, Value>, field: &'static str) -> Result<DomainName, Error> {
    DomainName::from_dotted_string(get_str(object, field)?).ok_or(Error::BadField { field })
}

fn u16_value(value: &Value) -> Option<u16> {
    value.as_u64().and_then(|v| u16::try_from(v).ok())
}

fn get_u8(object: &Map<String, Value>, field: &'static str) -> Result<u8, Error> {
    object
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or(Error::BadField { field })
}

fn get_u16(object: &Map<String, Value>, field: &'static str) -> Result<u16, Error> {
    object
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u16::try_from(v).ok())
        .ok_or(Error::BadField { field })
}

fn get_u32(object: &Map<String, Value>, field: &'static str) -> Result<u32, Error> {
    object
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(Error::BadField { field })
}

fn get_u64(object: &Map<String, Value>, field: &'static str) -> Result<u64, Error> {
    object
        .get(field)
        .and_then(Value::as_u64)
        .ok_or(Error::BadField { field })
}

fn get_hex(object: &Map<String, Value>, field: &'static str) -> Result<Vec<u8>, Error> {
    from_hex(get_str(object, field)?).ok_or(Error::BadField { field })
}

fn get_base64(object: &Map<String, Value>, field: &'static str) -> Result<Vec<u8>, Error> {
    from_base64(get_str(object, field)?).ok_or(Error::BadField { field })
}

fn get_char_string(object: &Map<String, Value>, field: &'static str) -> Result<Vec<u8>, Error> {
    char_string_octets(get_str(object, field)?).ok_or(Error::BadField { field })
}

fn get_type_list(object: &Map<String, Value>, field: &'static str) -> Result<TypeBitmap, Error> {
    let values = object
        .get(field)
        .and_then(Value::as_array)
        .ok_or(Error::BadField { field })?;
    let mut types = Vec::with_capacity(values.len());
    for value in values {
        let text = value.as_str().ok_or(Error::BadField { field })?;
        types.push(RecordType::from_str(text).map_err(|()| Error::BadField { field })?);
    }
    Ok(TypeBitmap::from_types(types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn record_json_roundtrip() {
        for _ in 0..100 {
            let rr = arbitrary_resourcerecord();
            let json = rr.to_json();
            assert_eq!(
                Ok(rr),
                ResourceRecord::from_json(&json),
                "json: {json}"
            );
        }
    }

    #[test]
    fn message_json_roundtrip() {
        let mut query = Message::make_query(77, question("example.com.", RecordType::MX));
        query.header.recursion_desired = true;
        let mut message = query.make_response();
        message.answers = vec![mx_record("example.com.", 10, "mail.example.com.")];
        message.edns = Some(Edns::default());

        let parsed = Message::from_json(&message.to_json()).unwrap();
        assert_eq!(message, parsed);
    }

    #[test]
    fn mx_json_shape() {
        let rr = mx_record("example.com.", 10, "mail.example.com.");
        assert_eq!(
            serde_json::json!({
                "name": "example.com.",
                "type": "MX",
                "class": "IN",
                "ttl": 300,
                "data": {"preference": 10, "exchange": "mail.example.com."},
            }),
            rr.to_json()
        );
    }

    #[test]
    fn malformed_edns_options_rejected() {
        let json = serde_json::json!({
            "udp_payload_size": 4096,
            "version": 0,
            "options": "not-an-array",
        });
        assert_eq!(
            Err(Error::BadField { field: "options" }),
            Edns::from_json(&json)
        );
    }
}
