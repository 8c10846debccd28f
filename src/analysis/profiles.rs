//! Author profile resolution and submission counting.
//!
//! Group members arrive in mixed forms: canonical `~Name_Surname1` profile
//! ids next to emails and other references. The canonical ones pass through
//! untouched; the rest go through one batch profile lookup. Output is a
//! set, so resolution is idempotent and order-independent.

use crate::client::{ClientError, NoteQuery, OpenReviewClient};
use crate::models::Profile;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Canonical profile id pattern: `~Name_Surname1`.
static TILDE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^~.+\d+$").unwrap());

/// Whether a member reference is already a canonical profile id.
pub fn is_profile_id(member: &str) -> bool {
    TILDE_ID.is_match(member)
}

/// Split members into already-canonical ids and references needing lookup.
pub fn partition_members(members: &[String]) -> (HashSet<String>, Vec<String>) {
    let mut canonical = HashSet::new();
    let mut unknowns = Vec::new();

    for member in members {
        if is_profile_id(member) {
            canonical.insert(member.clone());
        } else {
            unknowns.push(member.clone());
        }
    }

    (canonical, unknowns)
}

/// Union resolved profile ids into the canonical set.
pub fn merge_resolved(mut canonical: HashSet<String>, profiles: &[Profile]) -> HashSet<String> {
    for profile in profiles {
        if !profile.id.is_empty() {
            canonical.insert(profile.id.clone());
        }
    }
    canonical
}

/// Resolve group members to canonical profile ids.
///
/// Members matching the tilde pattern are kept as-is; the rest are resolved
/// with one batch lookup and unioned in.
pub async fn resolve_profile_ids(
    client: &OpenReviewClient,
    members: &[String],
) -> Result<HashSet<String>, ClientError> {
    let (canonical, unknowns) = partition_members(members);
    if unknowns.is_empty() {
        return Ok(canonical);
    }

    let profiles = client.search_profiles(&unknowns).await?;
    Ok(merge_resolved(canonical, &profiles))
}

/// Count the submissions authored by a profile across all venues.
pub async fn count_submissions(
    client: &OpenReviewClient,
    profile_id: &str,
) -> Result<usize, ClientError> {
    let notes = client
        .get_all_notes(&NoteQuery::by_content("authorids", profile_id))
        .await?;
    Ok(notes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_profile_id() {
        assert!(is_profile_id("~Jane_Doe1"));
        assert!(is_profile_id("~J_van_der_Berg23"));
        assert!(!is_profile_id("jane@example.com"));
        assert!(!is_profile_id("~Jane_Doe"));
        assert!(!is_profile_id("Jane_Doe1"));
    }

    #[test]
    fn test_partition_members() {
        let members = strings(&["~Jane_Doe1", "jane@example.com", "~Alan_Turing2"]);
        let (canonical, unknowns) = partition_members(&members);

        assert_eq!(canonical.len(), 2);
        assert!(canonical.contains("~Jane_Doe1"));
        assert!(canonical.contains("~Alan_Turing2"));
        assert_eq!(unknowns, vec!["jane@example.com"]);
    }

    #[test]
    fn test_merge_resolved_unions_and_dedupes() {
        let members = strings(&["~Jane_Doe1", "jane@example.com"]);
        let (canonical, _) = partition_members(&members);

        let profiles = vec![
            Profile {
                id: "~Jane_Doe2".to_string(),
            },
            // Already present: set semantics absorb the duplicate.
            Profile {
                id: "~Jane_Doe1".to_string(),
            },
            Profile { id: String::new() },
        ];

        let resolved = merge_resolved(canonical, &profiles);
        let expected: HashSet<String> = strings(&["~Jane_Doe1", "~Jane_Doe2"]).into_iter().collect();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let forward = strings(&["~Jane_Doe1", "~Alan_Turing2"]);
        let backward = strings(&["~Alan_Turing2", "~Jane_Doe1"]);

        let (a, _) = partition_members(&forward);
        let (b, _) = partition_members(&backward);
        assert_eq!(a, b);
    }
}
