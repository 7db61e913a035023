//! Webhook target URL validation (spec §4.E "URL policy").

use mediaforge_core::Error;

/// Validates a webhook target URL: scheme must be http/https, host required,
/// and, when `production` is true, loopback/private addresses are
/// rejected so a job can't be used to probe the deploying network.
pub fn validate(url: &str, production: bool) -> Result<(), Error> {
    let parsed = url::Url::parse(url).map_err(|e| Error::validation(format!("invalid webhook URL: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::validation("webhook URL must use http or https"));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| Error::validation("webhook URL must have a host"))?;

    if production && is_blocked_host(host) {
        return Err(Error::security(format!("webhook URL targets a blocked host: {host}")));
    }

    Ok(())
}

fn is_blocked_host(host: &str) -> bool {
    if host == "localhost" || host == "::1" {
        return true;
    }
    match host.parse::<std::net::Ipv4Addr>() {
        Ok(ip) => is_private_v4(ip),
        Err(_) => match host.parse::<std::net::Ipv6Addr>() {
            Ok(ip) => ip.is_loopback(),
            Err(_) => false,
        },
    }
}

fn is_private_v4(ip: std::net::Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || (ip.octets()[0] == 172 && (16..=31).contains(&ip.octets()[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_https_url() {
        assert!(validate("https://example.com/hook", true).is_ok());
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(validate("ftp://example.com/hook", true).is_err());
    }

    #[test]
    fn rejects_loopback_in_production() {
        assert!(validate("http://127.0.0.1/hook", true).is_err());
        assert!(validate("http://localhost/hook", true).is_err());
    }

    #[test]
    fn rejects_private_ranges_in_production() {
        assert!(validate("http://10.0.0.5/hook", true).is_err());
        assert!(validate("http://172.16.0.1/hook", true).is_err());
        assert!(validate("http://192.168.1.1/hook", true).is_err());
    }

    #[test]
    fn allows_private_ranges_outside_production() {
        assert!(validate("http://10.0.0.5/hook", false).is_ok());
    }
}
