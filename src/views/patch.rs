//! Pure rewrites of held feed pages and profiles.
//!
//! Every function here takes a snapshot and returns a new one. Entries that
//! do not match are cloned unchanged and keep their position, so applying a
//! patch to several views in any order yields the same final state.

use crate::application::pagination::CursorPage;
use crate::domain::entities::{FeedEntry, ProfileRecord};
use crate::domain::types::PostId;

/// Counter arithmetic shared by every patch; never drops below zero.
pub fn apply_delta(count: u64, delta: i64) -> u64 {
    count.saturating_add_signed(delta)
}

/// Rewrite the like state of `post_id` in every page of one view.
pub fn patch_like(
    pages: &[CursorPage<FeedEntry>],
    post_id: &PostId,
    delta: i64,
    liked: bool,
) -> Vec<CursorPage<FeedEntry>> {
    pages
        .iter()
        .map(|page| CursorPage {
            entries: page
                .entries
                .iter()
                .map(|entry| patch_entry(entry, post_id, delta, liked))
                .collect(),
            next_cursor: page.next_cursor.clone(),
        })
        .collect()
}

fn patch_entry(entry: &FeedEntry, post_id: &PostId, delta: i64, liked: bool) -> FeedEntry {
    if &entry.id != post_id {
        return entry.clone();
    }
    FeedEntry {
        like_count: apply_delta(entry.like_count, delta),
        liked_by_me: liked,
        ..entry.clone()
    }
}

/// Whether any held page contains `post_id`.
pub fn contains_post(pages: &[CursorPage<FeedEntry>], post_id: &PostId) -> bool {
    pages
        .iter()
        .any(|page| page.entries.iter().any(|entry| &entry.id == post_id))
}

/// Put a newly created entry at the head of the first page.
///
/// A view with no pages has nothing to show the entry in and stays empty.
/// The cursor of the first page keeps pointing at its old last entry, so the
/// next fetch continues where it would have anyway.
pub fn prepend_entry(
    pages: &[CursorPage<FeedEntry>],
    entry: &FeedEntry,
) -> Vec<CursorPage<FeedEntry>> {
    let mut patched = pages.to_vec();
    if let Some(first) = patched.first_mut() {
        if !first.entries.iter().any(|held| held.id == entry.id) {
            first.entries.insert(0, entry.clone());
        }
    }
    patched
}

/// Profile of the followed user after a follow toggle.
pub fn patch_followee(profile: &ProfileRecord, delta: i64, following: bool) -> ProfileRecord {
    ProfileRecord {
        followers_count: apply_delta(profile.followers_count, delta),
        is_following: following,
        ..profile.clone()
    }
}

/// Profile of the acting user after a follow toggle.
pub fn patch_follower(profile: &ProfileRecord, delta: i64) -> ProfileRecord {
    ProfileRecord {
        follows_count: apply_delta(profile.follows_count, delta),
        ..profile.clone()
    }
}

/// Profile of an author who just published.
pub fn patch_author(profile: &ProfileRecord) -> ProfileRecord {
    ProfileRecord {
        posts_count: apply_delta(profile.posts_count, 1),
        ..profile.clone()
    }
}
