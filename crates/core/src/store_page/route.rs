use reqwest::Url;

use super::FetchFailure;

const APP_SEGMENT: &str = "app";
const AGE_CHECK_SEGMENT: &str = "agecheck";

/// Classify the final address of a fetch for `requested_id`.
///
/// Returns the id the storefront re-pointed the request at, `None` when
/// the page belongs to the requested id, or the failure that ends the fetch.
pub fn classify_route(url: &Url, requested_id: u32) -> Result<Option<u32>, FetchFailure> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let Some(first) = segments.first() else {
        return Err(FetchFailure::RedirectedToRoot);
    };

    if *first == AGE_CHECK_SEGMENT {
        // agecheck/app/{id}
        return match segments.get(2) {
            None => Err(FetchFailure::AgeGateNoRedirect),
            Some(seg) => match alias_of(seg, requested_id)? {
                None => Err(FetchFailure::AgeGateNoRedirect),
                target => Ok(target),
            },
        };
    }

    if *first != APP_SEGMENT {
        return Err(FetchFailure::OutsideItemRoute {
            path: url.path().to_string(),
        });
    }

    match segments.get(1) {
        None => Err(FetchFailure::MissingIdSegment),
        Some(seg) => alias_of(seg, requested_id),
    }
}

fn alias_of(segment: &str, requested_id: u32) -> Result<Option<u32>, FetchFailure> {
    match segment.parse::<u32>() {
        Ok(id) if id == requested_id => Ok(None),
        Ok(id) => Ok(Some(id)),
        Err(_) => Err(FetchFailure::UnknownRedirectTarget(segment.to_string())),
    }
}

/// Whether `url` is the storefront root of `base`.
pub fn is_store_root(url: &Url, base: &Url) -> bool {
    url.host_str() == base.host_str()
        && url.path_segments().is_none_or(|mut s| s.all(|seg| seg.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_id_resolves_without_alias() {
        let result = classify_route(&url("https://store.example.com/app/440/Team_Fortress_2/"), 440);
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_numeric_alias() {
        let result = classify_route(&url("https://store.example.com/app/220/Half_Life_2/"), 219);
        assert_eq!(result, Ok(Some(220)));
    }

    #[test]
    fn test_non_numeric_id_segment() {
        let result = classify_route(&url("https://store.example.com/app/sale/"), 10);
        assert_eq!(
            result,
            Err(FetchFailure::UnknownRedirectTarget("sale".to_string()))
        );
    }

    #[test]
    fn test_root_and_missing_id() {
        assert_eq!(
            classify_route(&url("https://store.example.com/"), 400),
            Err(FetchFailure::RedirectedToRoot)
        );
        assert_eq!(
            classify_route(&url("https://store.example.com/app/"), 400),
            Err(FetchFailure::MissingIdSegment)
        );
    }

    #[test]
    fn test_outside_app_route() {
        let result = classify_route(&url("https://store.example.com/sub/12345/"), 12345);
        assert!(matches!(result, Err(FetchFailure::OutsideItemRoute { path }) if path == "/sub/12345/"));
    }

    #[test]
    fn test_age_check() {
        assert_eq!(
            classify_route(&url("https://store.example.com/agecheck/app/500/"), 500),
            Err(FetchFailure::AgeGateNoRedirect)
        );
        assert_eq!(
            classify_route(&url("https://store.example.com/agecheck/app/"), 500),
            Err(FetchFailure::AgeGateNoRedirect)
        );
        assert_eq!(
            classify_route(&url("https://store.example.com/agecheck/app/501/"), 500),
            Ok(Some(501))
        );
        assert_eq!(
            classify_route(&url("https://store.example.com/agecheck/app/abc/"), 500),
            Err(FetchFailure::UnknownRedirectTarget("abc".to_string()))
        );
    }

    #[test]
    fn test_is_store_root() {
        let base = url("https://store.example.com");
        assert!(is_store_root(&url("https://store.example.com/"), &base));
        assert!(is_store_root(&url("https://store.example.com"), &base));
        assert!(!is_store_root(&url("https://store.example.com/app/1/"), &base));
        assert!(!is_store_root(&url("https://other.example.com/"), &base));
    }
}
