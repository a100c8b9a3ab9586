//! Default `Resolver`, backed by the standard library's resolver.
//!
//! `std::net::ToSocketAddrs` calls `getaddrinfo(3)` on every Unix target
//! this crate builds for, which is reentrant on any libc worth using
//! today. The `legacy_resolver` feature exists for targets where that
//! isn't true; it changes nothing about this implementation, only how the
//! worker executor sequences its calls (see `worker::execute`).

use aio_core::resolver::Resolver;
use aio_core::task::{AddressFamily, GetAddrInfoRequest};

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

pub struct StdResolver;

impl Resolver for StdResolver {
    fn resolve(&self, family: AddressFamily, hostname: &str) -> Result<IpAddr, i32> {
        let lookup = format!("{hostname}:0");
        let addrs = lookup.to_socket_addrs().map_err(|e| {
            e.raw_os_error().unwrap_or(libc::EAI_NONAME)
        })?;

        let wanted = addrs.into_iter().find(|addr| match family {
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        });

        wanted.map(|addr| addr.ip()).ok_or(libc::EAI_NONAME)
    }

    fn getaddrinfo(&self, request: &mut GetAddrInfoRequest) -> i32 {
        let service = request.service.as_deref().unwrap_or("0");
        let lookup = format!("{}:{}", request.host, service);
        match lookup.to_socket_addrs() {
            Ok(addrs) => {
                request.results = addrs.collect::<Vec<SocketAddr>>();
                0
            }
            Err(e) => e.raw_os_error().unwrap_or(libc::EAI_NONAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_localhost_v4() {
        let resolver = StdResolver;
        let result = resolver.resolve(AddressFamily::V4, "localhost");
        assert!(result.is_ok());
        assert!(result.unwrap().is_ipv4());
    }

    #[test]
    fn getaddrinfo_populates_results() {
        let resolver = StdResolver;
        let mut request = GetAddrInfoRequest::new("localhost", Some("80".to_string()));
        let code = resolver.getaddrinfo(&mut request);
        assert_eq!(code, 0);
        assert!(!request.results.is_empty());
    }
}
