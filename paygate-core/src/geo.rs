//! Geo-IP boundary

use std::collections::HashMap;
use std::net::IpAddr;

/// Resolves a payer IP to an ISO country code
pub trait GeoLookup: Send + Sync {
    /// `None` when the address cannot be classified
    fn resolve_country(&self, ip: IpAddr) -> Option<String>;
}

/// Lookup backed by a fixed address table
#[derive(Debug, Clone, Default)]
pub struct StaticGeoLookup {
    entries: HashMap<IpAddr, String>,
}

impl StaticGeoLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an address to a country
    pub fn with_entry(mut self, ip: IpAddr, country: impl Into<String>) -> Self {
        self.entries.insert(ip, country.into());
        self
    }
}

impl GeoLookup for StaticGeoLookup {
    fn resolve_country(&self, ip: IpAddr) -> Option<String> {
        self.entries.get(&ip).cloned()
    }
}
