//! IP allow-list check (spec §4.L): individual addresses and CIDR ranges,
//! falling back to a prefix match only for entries that don't parse as
//! either. Ported from `api/dependencies.py`'s `_is_ip_whitelisted`.

use std::net::IpAddr;

/// A parsed `network/prefix_len` range, IPv4 or IPv6.
struct Cidr {
    network: IpAddr,
    prefix_len: u32,
}

impl Cidr {
    fn parse(raw: &str) -> Option<Self> {
        let (addr, len) = raw.split_once('/')?;
        let network: IpAddr = addr.parse().ok()?;
        let prefix_len: u32 = len.parse().ok()?;
        let max_len = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max_len {
            return None;
        }
        Some(Self { network, prefix_len })
    }

    fn contains(&self, addr: &IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = mask_u32(self.prefix_len);
                u32::from(net) & mask == u32::from(*addr) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = mask_u128(self.prefix_len);
                u128::from(net) & mask == u128::from(*addr) & mask
            }
            _ => false,
        }
    }
}

fn mask_u32(prefix_len: u32) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_len)
    }
}

fn mask_u128(prefix_len: u32) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        u128::MAX << (128 - prefix_len)
    }
}

/// An allow-list entry, pre-parsed where possible so a malformed entry is
/// recognized once at construction rather than on every request.
enum Entry {
    Cidr(Cidr),
    Address(IpAddr),
    /// Couldn't be parsed as either; matched by string prefix for
    /// backward compatibility with the original's fallback behavior.
    Prefix(String),
}

pub struct IpAllowlist {
    entries: Vec<Entry>,
}

impl IpAllowlist {
    pub fn new(raw: &[String]) -> Self {
        let entries = raw
            .iter()
            .map(|entry| {
                if entry.contains('/') {
                    match Cidr::parse(entry) {
                        Some(cidr) => Entry::Cidr(cidr),
                        None => Entry::Prefix(entry.clone()),
                    }
                } else {
                    match entry.parse::<IpAddr>() {
                        Ok(addr) => Entry::Address(addr),
                        Err(_) => Entry::Prefix(entry.clone()),
                    }
                }
            })
            .collect();
        Self { entries }
    }

    /// Returns whether `client_ip` matches any entry. An unparseable
    /// `client_ip` falls back to a plain prefix comparison against every
    /// entry's original text, mirroring the original's outer `except
    /// ValueError` branch.
    pub fn allows(&self, client_ip: &str) -> bool {
        match client_ip.parse::<IpAddr>() {
            Ok(addr) => self.entries.iter().any(|entry| match entry {
                Entry::Cidr(cidr) => cidr.contains(&addr),
                Entry::Address(allowed) => *allowed == addr,
                Entry::Prefix(prefix) => client_ip.starts_with(prefix.as_str()),
            }),
            Err(_) => self.entries.iter().any(|entry| matches!(entry, Entry::Prefix(prefix) if client_ip.starts_with(prefix.as_str()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_exact_address() {
        let allowlist = IpAllowlist::new(&["10.0.0.5".to_string()]);
        assert!(allowlist.allows("10.0.0.5"));
        assert!(!allowlist.allows("10.0.0.6"));
    }

    #[test]
    fn matches_cidr_range() {
        let allowlist = IpAllowlist::new(&["10.0.0.0/24".to_string()]);
        assert!(allowlist.allows("10.0.0.200"));
        assert!(!allowlist.allows("10.0.1.1"));
    }

    #[test]
    fn falls_back_to_prefix_match_for_malformed_entry() {
        let allowlist = IpAllowlist::new(&["10.0.".to_string()]);
        assert!(allowlist.allows("10.0.0.1"));
    }

    #[test]
    fn empty_allowlist_allows_nothing() {
        let allowlist = IpAllowlist::new(&[]);
        assert!(!allowlist.allows("127.0.0.1"));
    }
}
