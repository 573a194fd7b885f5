use std::{net::IpAddr, str::FromStr, sync::OnceLock};

use actix_web::{dev::ServiceRequest, HttpRequest};
use log::{debug, trace};
use regex::Regex;

use crate::config::ServerOptions;

fn forwarded_for_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"for="?\[?(?P<ip>[^;,"\]]+)"#).ok()).as_ref()
}

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The first address in the `X-Forwarded-For` header, iif `use_x_forwarded_for` is set in the configuration.
/// 2. The `for=` directive of the `Forwarded` header, iif `use_forwarded` is set in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, options: ServerOptions) -> Option<IpAddr> {
    let mut result = None;
    if options.use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if options.use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {peer_addr:?}");
        peer_addr
    })
}

pub fn get_remote_ip_for_service(req: &ServiceRequest, options: ServerOptions) -> Option<IpAddr> {
    get_remote_ip(req.request(), options)
}

fn parse_forwarded_for(header: &str) -> Option<IpAddr> {
    forwarded_for_regex()
        .and_then(|re| re.captures(header))
        .and_then(|caps| caps.name("ip"))
        .and_then(|m| IpAddr::from_str(m.as_str()).ok())
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    fn options(use_x_forwarded_for: bool, use_forwarded: bool) -> ServerOptions {
        ServerOptions { use_x_forwarded_for, use_forwarded }
    }

    #[test]
    fn forwarded_header() {
        assert_eq!(parse_forwarded_for("for=192.0.2.60;proto=http"), Some("192.0.2.60".parse().unwrap()));
        assert_eq!(parse_forwarded_for(r#"for="[2001:db8:cafe::17]:4711""#), Some("2001:db8:cafe::17".parse().unwrap()));
        assert_eq!(parse_forwarded_for("proto=https"), None);
    }

    #[test]
    fn headers_are_ignored_unless_enabled() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.1:5000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "103.208.23.6, 10.0.0.2"))
            .insert_header(("Forwarded", "for=103.208.23.0"))
            .to_http_request();
        assert_eq!(get_remote_ip(&req, options(false, false)), Some("10.0.0.1".parse().unwrap()));
        assert_eq!(get_remote_ip(&req, options(true, false)), Some("103.208.23.6".parse().unwrap()));
        assert_eq!(get_remote_ip(&req, options(false, true)), Some("103.208.23.0".parse().unwrap()));
        assert_eq!(get_remote_ip(&req, options(true, true)), Some("103.208.23.6".parse().unwrap()));
    }
}
