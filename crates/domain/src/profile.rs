use std::collections::BTreeSet;

/// Aggregated user profile assembled from several independent
/// identity-provider lookups.
///
/// A profile is only ever constructed with BOTH collections resolved;
/// callers that fail to fetch either roles or groups must fail the whole
/// read instead of returning a partial profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// Realm role names assigned to the user.
    pub roles: BTreeSet<String>,
    /// Group names the user is a member of.
    pub groups: BTreeSet<String>,
}
