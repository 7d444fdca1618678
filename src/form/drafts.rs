//! Open form drafts, keyed by channel and build token.
//!
//! Uses `thread_local!` + `RefCell` like the rest of the module state. The
//! catalogue and channel fetched when the form opened travel with the draft,
//! so form interactions re-render without another round trip.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::api::models::ChannelRecord;
use crate::form::catalogue::Catalogue;
use crate::form::state::BuildForm;

#[derive(Debug, Clone)]
pub struct Draft {
    pub form: BuildForm,
    pub catalogue: Catalogue,
    pub channel: ChannelRecord,
    pub submitter: String,
}

type DraftKey = (String, String);

thread_local! {
    static DRAFTS: RefCell<HashMap<DraftKey, Draft>> = RefCell::new(HashMap::new());
}

fn key(channel_id: &str, token: &str) -> DraftKey {
    (channel_id.to_string(), token.to_string())
}

/// Open a draft. A channel holds one draft at a time; opening another
/// build link for it drops the previous one.
pub fn insert_draft(channel_id: &str, token: &str, draft: Draft) {
    DRAFTS.with(|d| {
        let mut drafts = d.borrow_mut();
        drafts.retain(|(channel, _), _| channel != channel_id);
        drafts.insert(key(channel_id, token), draft);
    });
}

/// Execute a closure with mutable access to a draft, if one is open.
pub fn with_draft_mut<F, R>(channel_id: &str, token: &str, f: F) -> Option<R>
where
    F: FnOnce(&mut Draft) -> R,
{
    DRAFTS.with(|d| d.borrow_mut().get_mut(&key(channel_id, token)).map(f))
}

/// Copy of a draft, for use across an `.await`.
pub fn get_draft(channel_id: &str, token: &str) -> Option<Draft> {
    DRAFTS.with(|d| d.borrow().get(&key(channel_id, token)).cloned())
}

pub fn remove_draft(channel_id: &str, token: &str) -> Option<Draft> {
    DRAFTS.with(|d| d.borrow_mut().remove(&key(channel_id, token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::BuildType;
    use crate::form::catalogue::tests::sample_catalogue;

    fn draft() -> Draft {
        Draft {
            form: BuildForm::new(BuildType::Killer),
            catalogue: sample_catalogue(),
            channel: serde_json::from_str(r#"{"id":"1001","name":"streamer"}"#).unwrap(),
            submitter: "viewer".into(),
        }
    }

    #[test]
    fn drafts_are_keyed_by_channel_and_token() {
        insert_draft("1001", "t1", draft());
        assert!(get_draft("1001", "t1").is_some());
        assert!(get_draft("1001", "t2").is_none());
        assert!(get_draft("2002", "t1").is_none());
        remove_draft("1001", "t1");
    }

    #[test]
    fn mutation_persists() {
        insert_draft("1001", "t1", draft());
        with_draft_mut("1001", "t1", |d| d.form.notes = "hi".into());
        assert_eq!(get_draft("1001", "t1").unwrap().form.notes, "hi");
        assert!(remove_draft("1001", "t1").is_some());
        assert!(with_draft_mut("1001", "t1", |_| ()).is_none());
    }

    #[test]
    fn new_link_replaces_channel_draft() {
        insert_draft("1001", "t1", draft());
        insert_draft("2002", "t1", draft());
        insert_draft("1001", "t2", draft());
        assert!(get_draft("1001", "t1").is_none());
        assert!(get_draft("1001", "t2").is_some());
        assert!(get_draft("2002", "t1").is_some());
        DRAFTS.with(|d| assert_eq!(d.borrow().len(), 2));
        remove_draft("1001", "t2");
        remove_draft("2002", "t1");
    }
}
