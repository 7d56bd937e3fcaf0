// Connection string helpers shared by the analysis connection and the binary

pub const REDACTED_PASSWORD: &str = "*****";

/// Connection string safe for log lines: the password in the authority is masked.
///
/// Only the part before the first `/`, `?` or `#` is inspected, so an `@` inside
/// options such as `authMechanismProperties` is left alone.
pub fn redact_uri_password(uri: &str) -> String {
    let uri = uri.trim();
    let Some(scheme_end) = uri.find("://").map(|i| i + 3) else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_len];

    match authority.rsplit_once('@') {
        Some((credentials, hosts)) => match credentials.split_once(':') {
            Some((user, _)) => format!(
                "{}{user}:{REDACTED_PASSWORD}@{hosts}{}",
                &uri[..scheme_end],
                &rest[authority_len..]
            ),
            None => uri.to_string(),
        },
        None => uri.to_string(),
    }
}

/// Validate a MongoDB connection URI
pub fn validate_mongodb_uri(uri: &str) -> Result<(), String> {
    let uri = uri.trim();

    if uri.is_empty() {
        return Err("connection string is required".into());
    }

    let Some(after_scheme) =
        uri.strip_prefix("mongodb+srv://").or_else(|| uri.strip_prefix("mongodb://"))
    else {
        return Err("connection string must start with mongodb:// or mongodb+srv://".into());
    };

    if after_scheme.is_empty() || after_scheme.starts_with('/') {
        return Err("connection string must include a host".into());
    }

    Ok(())
}
