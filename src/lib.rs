pub mod api;
pub mod app;
pub mod model;

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::api::ApiError;
use crate::model::{
    Action, Activity, BannerKind, Catalog, Category, SortMode, GENERIC_ERROR,
    MISSING_SIGNUP_FIELDS,
};

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}

/// Folds a name down to its base letters: canonical decomposition, combining marks dropped,
/// lowercased. "Éclair" and "eclair" share a key.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Orders activity names the way a browser's `localeCompare` does for Latin text: base letters
/// first, ignoring accents and case, then accents, then the exact string so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Returns true if `needle` (already trimmed and lowercased) appears in the activity's name or
/// description. An empty needle matches everything.
fn matches_search(needle: &str, name: &str, activity: &Activity) -> bool {
    needle.is_empty()
        || name.to_lowercase().contains(needle)
        || activity.description.to_lowercase().contains(needle)
}

/// Derives the list the board shows from the catalog and the toolbar state.
///
/// Search is a trimmed, case-insensitive substring match on name or description. The category
/// filter compares against the derived category, and `None` keeps everything. `Name` sorts
/// ascending with `compare_names`, `Spots` sorts by remaining capacity, most first, keeping
/// catalog order among ties, and `Default` leaves catalog order alone.
///
/// The catalog is never modified; the result holds clones of the matching entries.
pub fn compute_view(
    catalog: &Catalog,
    search: &str,
    category: Option<Category>,
    sort: SortMode,
) -> Vec<(String, Activity)> {
    let needle = search.trim().to_lowercase();

    let mut entries: Vec<(String, Activity)> = catalog
        .iter()
        .filter(|(name, activity)| matches_search(&needle, name, activity))
        .filter(|(name, _)| category.map_or(true, |c| Category::for_activity(name) == c))
        .map(|(name, activity)| (name.clone(), activity.clone()))
        .collect();

    match sort {
        SortMode::Name => entries.sort_by(|a, b| compare_names(&a.0, &b.0)),
        SortMode::Spots => entries.sort_by(|a, b| b.1.spots_left().cmp(&a.1.spots_left())),
        SortMode::Default => {}
    }

    entries
}

/// What the board does once a signup or unregister request settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub kind: BannerKind,
    pub text: String,
    /// Whether the catalog should be fetched again.
    pub refetch: bool,
}

/// Maps the result of a mutating request to the banner message and whether to refetch.
/// Only a successful reply triggers a refetch. A reply that is not JSON at all gets the same
/// text as a request that never reached the server.
pub fn resolve_mutation(action: Action, result: Result<String, ApiError>) -> MutationOutcome {
    match result {
        Ok(message) => MutationOutcome {
            kind: BannerKind::Success,
            text: message,
            refetch: true,
        },
        Err(ApiError::Rejected { detail, .. }) => MutationOutcome {
            kind: BannerKind::Error,
            text: detail.unwrap_or_else(|| GENERIC_ERROR.to_string()),
            refetch: false,
        },
        Err(ApiError::Decode(_)) | Err(ApiError::Network(_)) => MutationOutcome {
            kind: BannerKind::Error,
            text: action.network_failure_text().to_string(),
            refetch: false,
        },
    }
}

/// Shows the outcome of a mutating request through `show` and calls `reload` if the catalog
/// changed. Returns true if the request succeeded.
pub fn settle_mutation(
    action: Action,
    result: Result<String, ApiError>,
    mut show: impl FnMut(BannerKind, String),
    mut reload: impl FnMut(),
) -> bool {
    let outcome = resolve_mutation(action, result);
    show(outcome.kind, outcome.text);
    if outcome.refetch {
        reload();
    }
    outcome.refetch
}

/// Checks the signup form before anything is sent. Returns the activity and the trimmed email,
/// or the message to show when either is missing.
pub fn signup_fields(activity: &str, email: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if activity.is_empty() || email.is_empty() {
        return Err(MISSING_SIGNUP_FIELDS);
    }
    Ok((activity.to_string(), email.to_string()))
}
