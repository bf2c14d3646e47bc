/// Normalize a client-submitted scope parameter.
///
/// Scopes are split on whitespace and rejoined with a single space, keeping the
/// submitted order. An absent or blank parameter yields no scopes.
pub fn parse_scopes(raw: Option<&str>) -> Option<String> {
    let joined = raw?.split_whitespace().collect::<Vec<&str>>().join(" ");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_scope_yields_none() {
        assert_eq!(parse_scopes(None), None);
        assert_eq!(parse_scopes(Some("   ")), None);
    }

    #[test]
    fn preserves_submitted_order() {
        assert_eq!(
            parse_scopes(Some("write  read\tadmin")).as_deref(),
            Some("write read admin")
        );
    }
}
