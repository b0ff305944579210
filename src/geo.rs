//! Geo Resolver (spec §4.10 step 3, §3 Geo Cache): resolves client/target
//! geography, with a privacy-mode fallback to domain-suffix heuristics and
//! no external lookups when `geo_external_lookup_disabled` is set.

use std::net::IpAddr;
use std::time::Duration;

use crate::models::GeoTag;
use crate::store::LruTtlCache;

/// TTL for externally-resolved geo entries.
const RESOLVED_TTL_SECS: u64 = 6 * 3600;

/// TLD → country fallback table used in privacy-restricted mode or when an
/// external lookup is unavailable/failed (spec §1, §3: "fallback entries
/// use a shorter TTL to allow eventual recovery").
const TLD_FALLBACK: &[(&str, &str)] = &[
    ("cn", "CN"),
    ("jp", "JP"),
    ("kr", "KR"),
    ("tw", "TW"),
    ("hk", "HK"),
    ("sg", "SG"),
    ("de", "DE"),
    ("fr", "FR"),
    ("uk", "GB"),
    ("ru", "RU"),
    ("in", "IN"),
    ("br", "BR"),
    ("au", "AU"),
    ("ca", "CA"),
    ("us", "US"),
];

/// Resolves geography for client IPs and destination hosts, backed by a
/// shared Geo Cache (spec §3). Fallback entries get a shorter TTL than a
/// genuine external lookup so they can recover once lookups are possible
/// again.
pub struct GeoResolver {
    cache: LruTtlCache<String, GeoTag>,
    external_lookup_disabled: bool,
    fallback_ttl: Duration,
}

impl GeoResolver {
    #[must_use]
    pub fn new(cache_capacity: usize, external_lookup_disabled: bool, fallback_ttl_secs: u64) -> Self {
        Self {
            cache: LruTtlCache::new(cache_capacity),
            external_lookup_disabled,
            fallback_ttl: Duration::from_secs(fallback_ttl_secs),
        }
    }

    /// Resolve geography for a client, preferring an IPv4 lookup and
    /// falling back to the host's TLD when privacy mode is on, the IP is
    /// absent, or the lookup is otherwise unavailable.
    #[must_use]
    pub fn resolve_client(&self, client_ip: Option<&str>, fallback_host: Option<&str>) -> GeoTag {
        if let Some(ip) = client_ip {
            if let Some(cached) = self.cache.get(&ip.to_string()) {
                return cached;
            }
            if !self.external_lookup_disabled {
                if let Some(tag) = self.lookup_ip(ip) {
                    self.cache.set(ip.to_string(), tag.clone(), Duration::from_secs(RESOLVED_TTL_SECS));
                    return tag;
                }
            }
        }
        fallback_host.map_or_else(GeoTag::unknown, |host| self.tld_fallback(host))
    }

    /// Resolve geography for a destination host (spec: "DNS -> IP -> geo,
    /// or TLD fallback"). This engine never performs a DNS lookup itself —
    /// per spec §1's explicit non-goal, DNS/IP-geolocation is skipped in
    /// privacy-restricted mode and the TLD heuristic is used directly;
    /// outside privacy mode a host that looks like a literal IPv4 address
    /// is looked up directly.
    #[must_use]
    pub fn resolve_target(&self, host: &str) -> GeoTag {
        if let Some(cached) = self.cache.get(&host.to_string()) {
            return cached;
        }

        if !self.external_lookup_disabled {
            if let Ok(ip) = host.parse::<IpAddr>() {
                if let Some(tag) = self.lookup_ip(&ip.to_string()) {
                    self.cache.set(host.to_string(), tag.clone(), Duration::from_secs(RESOLVED_TTL_SECS));
                    return tag;
                }
            }
        }

        let tag = self.tld_fallback(host);
        self.cache.set(host.to_string(), tag.clone(), self.fallback_ttl);
        tag
    }

    /// Synthetic "external" IP lookup. A real host would inject an HTTP
    /// client here; this engine has no dependency on a geo-IP service, so a
    /// literal-IPv4 host with no TLD simply falls through to unknown.
    fn lookup_ip(&self, _ip: &str) -> Option<GeoTag> {
        None
    }

    fn tld_fallback(&self, host: &str) -> GeoTag {
        let tld = host.rsplit('.').next().unwrap_or_default().to_lowercase();
        TLD_FALLBACK
            .iter()
            .find(|(suffix, _)| *suffix == tld)
            .map_or_else(GeoTag::unknown, |(_, country)| GeoTag::new(*country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privacy_mode_never_performs_external_lookup_and_uses_tld() {
        let resolver = GeoResolver::new(16, true, 3600);
        let tag = resolver.resolve_target("example.cn");
        assert_eq!(tag.country, "CN");
    }

    #[test]
    fn unknown_tld_falls_back_to_unknown() {
        let resolver = GeoResolver::new(16, true, 3600);
        assert!(resolver.resolve_target("example.xyz").is_unknown());
    }

    #[test]
    fn resolved_geo_is_cached() {
        let resolver = GeoResolver::new(16, true, 3600);
        let first = resolver.resolve_target("host.jp");
        let second = resolver.resolve_target("host.jp");
        assert_eq!(first, second);
    }

    #[test]
    fn client_fallback_uses_host_tld_when_no_ip_given() {
        let resolver = GeoResolver::new(16, true, 3600);
        let tag = resolver.resolve_client(None, Some("example.de"));
        assert_eq!(tag.country, "DE");
    }
}
