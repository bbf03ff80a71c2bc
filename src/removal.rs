// Removal targets. A user may pass a content hash, a preview URL, an
// alias (subname) or an alias URL; all of them reduce to a hash or a
// subname before the request is made.

use std::fmt;

use regex::{Regex, RegexSet};
use tracing::info;

use crate::api::ApiClient;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalKind {
    Hash,
    Subname,
}

impl fmt::Display for RemovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalKind::Hash => f.write_str("hash"),
            RemovalKind::Subname => f.write_str("subname"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalTarget {
    pub kind: RemovalKind,
    pub value: String,
}

impl RemovalTarget {
    fn hash(value: &str) -> Self {
        RemovalTarget {
            kind: RemovalKind::Hash,
            value: value.to_string(),
        }
    }

    fn subname(value: &str) -> Self {
        RemovalTarget {
            kind: RemovalKind::Subname,
            value: value.to_string(),
        }
    }
}

/// Compiled forms of every recognised input shape.
struct Patterns {
    hashes: RegexSet,
    subname: Regex,
    preview_url: Regex,
    alias_url: Regex,
}

impl Patterns {
    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(Patterns {
            // CIDv0, then CIDv1 with a `bafy`/`bafk`/`bafybe` prefix.
            hashes: RegexSet::new([
                r"^Qm[1-9A-HJ-NP-Za-km-z]{44}$",
                r"^bafy[a-z2-7]{50,}$",
                r"^bafk[a-z2-7]{50,}$",
                r"^bafybe[a-z2-7]{50,}$",
            ])?,
            subname: Regex::new(r"^[a-zA-Z0-9]{6,12}$")?,
            preview_url: Regex::new(r"(?i)https?://([a-z0-9]{50,})\.pinme\.dev")?,
            alias_url: Regex::new(r"(?i)https?://([a-z0-9]{6,12})\.pinit\.eth\.limo")?,
        })
    }

    fn is_content_hash(&self, s: &str) -> bool {
        self.hashes.is_match(s)
    }

    fn is_subname(&self, s: &str) -> bool {
        self.subname.is_match(s)
    }

    fn parse(&self, input: &str) -> Option<RemovalTarget> {
        // https://<hash>.pinme.dev
        if let Some(caps) = self.preview_url.captures(input) {
            let hash = &caps[1];
            if self.is_content_hash(hash) {
                return Some(RemovalTarget::hash(hash));
            }
        }

        if self.is_content_hash(input) {
            return Some(RemovalTarget::hash(input));
        }

        // https://<subname>.pinit.eth.limo
        if let Some(caps) = self.alias_url.captures(input) {
            let subname = &caps[1];
            if self.is_subname(subname) {
                return Some(RemovalTarget::subname(subname));
            }
        }

        if self.is_subname(input) {
            return Some(RemovalTarget::subname(input));
        }

        None
    }
}

/// Recognise a removal target, `None` if the input matches no known shape.
pub fn parse_removal_input(raw: &str) -> Option<RemovalTarget> {
    Patterns::compile().ok()?.parse(raw.trim())
}

/// Parse `raw` and ask the service to unpin it. Local history is left as is.
pub fn remove(api: &ApiClient, raw: &str) -> Result<RemovalTarget> {
    let target = parse_removal_input(raw).ok_or_else(|| Error::InvalidInput(raw.trim().to_string()))?;
    api.remove(&target)?;
    info!(kind = %target.kind, value = %target.value, "content removed");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID_V1: &str = "bafybeigthbkdv2ufll47r7e7f5z4c3vubyggxwotl52parmy3d3abt6ztu";
    const CID_V0: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    #[test]
    fn bare_v1_hash() {
        assert_eq!(parse_removal_input(CID_V1), Some(RemovalTarget::hash(CID_V1)));
    }

    #[test]
    fn bare_v0_hash() {
        assert_eq!(parse_removal_input(CID_V0), Some(RemovalTarget::hash(CID_V0)));
    }

    #[test]
    fn preview_url() {
        let url = format!("https://{}.pinme.dev", CID_V1);
        assert_eq!(parse_removal_input(&url), Some(RemovalTarget::hash(CID_V1)));
    }

    #[test]
    fn bare_subname() {
        assert_eq!(
            parse_removal_input("3abt6ztu"),
            Some(RemovalTarget::subname("3abt6ztu"))
        );
    }

    #[test]
    fn twelve_character_alias_is_a_subname() {
        assert_eq!(
            parse_removal_input("bafyTOOSHORT"),
            Some(RemovalTarget::subname("bafyTOOSHORT"))
        );
    }

    #[test]
    fn patterns_compile() {
        let patterns = Patterns::compile().unwrap();
        assert!(patterns.is_content_hash(CID_V1));
        assert!(patterns.is_content_hash(CID_V0));
        assert!(patterns.is_subname("3abt6ztu"));
        assert!(!patterns.is_subname("3abt6"));
    }

    #[test]
    fn subname_url() {
        assert_eq!(
            parse_removal_input("  https://3abt6ztu.pinit.eth.limo  "),
            Some(RemovalTarget::subname("3abt6ztu"))
        );
    }

    #[test]
    fn rejects_everything_else() {
        for input in [
            "not a valid hash!!",
            "",
            "abc",
            "abcdefghijklm",
            "https://example.com",
            "bafyTOOSHORTX",
            "bafy-short",
        ] {
            assert_eq!(parse_removal_input(input), None, "accepted {input:?}");
        }
    }

    #[test]
    fn remove_rejects_invalid_input_before_any_request() {
        let api = ApiClient::new("http://127.0.0.1:9", "device").unwrap();
        let err = remove(&api, "not a valid hash!!").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.hint().is_some());
    }
}
