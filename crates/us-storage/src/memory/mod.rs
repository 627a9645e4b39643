//! In-memory implementations of the storage capabilities.
//!
//! Everything lives in `DashMap`s and is lost on drop. The mapping store
//! counts reads so callers can verify cache write-through.

mod authz;
mod mapping;
mod user_store;

pub use authz::InMemoryAuthorizationManager;
pub use mapping::InMemoryDomainMappingStore;
pub use user_store::InMemoryUserStoreManager;

/// Matches `value` against a filter where `*` is a wildcard.
pub(crate) fn matches_filter(filter: &str, value: &str) -> bool {
    if filter.is_empty() || filter == "*" {
        return true;
    }
    let parts: Vec<&str> = filter.split('*').collect();
    if parts.len() == 1 {
        return value == filter;
    }
    let mut rest = value;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}
