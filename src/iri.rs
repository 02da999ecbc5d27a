//! IRI helpers shared by the resolver, loader and coherence checks.

/// Scheme prefix of external decentralized identifiers resolved through fixtures.
pub const DID_WEB_PREFIX: &str = "did:web:";

/// Part after the last `#`, or after the last `/` when there is no `#`.
pub fn local_name(iri: &str) -> &str {
    match iri.rsplit_once('#') {
        Some((_, local)) => local,
        None => iri.rsplit_once('/').map(|(_, local)| local).unwrap_or(iri),
    }
}

/// Strips trailing `/` and `#` characters.
pub fn trim_terminators(iri: &str) -> &str {
    iri.trim_end_matches(['/', '#'])
}

/// True when `iri` lives under `namespace` with a `/` or `#` boundary.
///
/// `namespace` may be given with or without its terminator, so
/// `http://ex.org/ont` matches `http://ex.org/ont/Class` but never
/// `http://ex.org/ontology/Class`.
pub fn matches_namespace(iri: &str, namespace: &str) -> bool {
    let base = trim_terminators(namespace);
    if base.is_empty() {
        return false;
    }
    iri.strip_prefix(base)
        .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('#'))
}

/// Treats `http` and `https` as the same scheme for comparisons.
pub fn normalize_scheme(iri: &str) -> String {
    match iri.strip_prefix("https://") {
        Some(rest) => format!("http://{rest}"),
        None => iri.to_string(),
    }
}

pub fn is_did_web(iri: &str) -> bool {
    iri.starts_with(DID_WEB_PREFIX)
}
