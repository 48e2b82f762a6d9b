//! Shared proptest generators.
//!
//! Names never contain any of the separators produced by
//! [`separator_strategy`].

use proptest::prelude::*;
use std::time::Duration;

/// Separators the client accepts.
pub fn separator_strategy() -> impl Strategy<Value = char> {
    prop_oneof![Just('/'), Just('#'), Just('|'), Just('*'), Just('\\')]
}

/// Managed system names within the length limit.
pub fn system_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_.-]{0,40}"
}

/// Managed account names within the length limit.
pub fn account_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_.@-]{0,40}"
}

/// System names longer than 129 characters.
pub fn oversized_system_name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{130,200}"
}

/// `<system><sep><account>` paths with their parts.
pub fn managed_account_path_strategy() -> impl Strategy<Value = (String, String, char, String)> {
    (
        system_name_strategy(),
        account_name_strategy(),
        separator_strategy(),
    )
        .prop_map(|(system, account, sep)| {
            let path = format!("{system}{sep}{account}");
            (system, account, sep, path)
        })
}

/// Folder segments of a secret path.
pub fn folder_segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z][A-Za-z0-9 _-]{0,15}[A-Za-z0-9]", 1..4)
}

/// Secret titles within the length limit.
pub fn secret_title_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _.-]{0,30}[A-Za-z0-9]"
}

/// Statuses classified as technical.
pub fn technical_status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![500u16..600, Just(408u16), Just(429u16)]
}

/// Statuses classified as business.
pub fn business_status_strategy() -> impl Strategy<Value = u16> {
    (400u16..500).prop_filter("technical status", |s| *s != 408 && *s != 429)
}

/// Short backoff intervals.
pub fn interval_strategy() -> impl Strategy<Value = Duration> {
    (1u64..500).prop_map(Duration::from_millis)
}
