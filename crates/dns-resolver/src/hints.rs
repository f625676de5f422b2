//! The root hint set: the names and addresses the recursive descent
//! starts from.  The compiled-in default is the IANA root server
//! list; deployments which mirror the roots can load their own from a
//! configuration file.

use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::net::IpAddr;

/// One root server.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct RootHint {
    pub name: String,
    pub ip: IpAddr,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct RootHints {
    pub servers: Vec<RootHint>,
}

impl RootHints {
    /// Load hints from a configuration file (YAML, or anything else
    /// the `config` crate recognises by extension).
    ///
    /// # Errors
    ///
    /// If the file cannot be read or parsed.
    pub fn from_file(filename: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(filename))
            .build()?
            .try_deserialize()
    }
}

impl Default for RootHints {
    fn default() -> Self {
        let roots: [(&str, [u8; 4]); 13] = [
            ("a.root-servers.net.", [198, 41, 0, 4]),
            ("b.root-servers.net.", [170, 247, 170, 2]),
            ("c.root-servers.net.", [192, 33, 4, 12]),
            ("d.root-servers.net.", [199, 7, 91, 13]),
            ("e.root-servers.net.", [192, 203, 230, 10]),
            ("f.root-servers.net.", [192, 5, 5, 241]),
            ("g.root-servers.net.", [192, 112, 36, 4]),
            ("h.root-servers.net.", [198, 97, 190, 53]),
            ("i.root-servers.net.", [192, 36, 148, 17]),
            ("j.root-servers.net.", [192, 58, 128, 30]),
            ("k.root-servers.net.", [193, 0, 14, 129]),
            ("l.root-servers.net.", [199, 7, 83, 42]),
            ("m.root-servers.net.", [202, 12, 27, 33]),
        ];

        Self {
            servers: roots
                .into_iter()
                .map(|(name, octets)| RootHint {
                    name: name.to_string(),
                    ip: IpAddr::from(octets),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_thirteen_roots() {
        let hints = RootHints::default();
        assert_eq!(13, hints.servers.len());
        assert!(hints
            .servers
            .iter()
            .all(|hint| hint.name.ends_with(".root-servers.net.")));
    }
}
