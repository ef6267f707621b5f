//! Properties the surrogate-key bank must hold regardless of which
//! dimension table or content is involved.

use std::collections::HashMap;

use energylabel_core::keybank::{content_key, hash_content_key, KeyBank};
use energylabel_core::schema::{fact_schema, Run, Schema, Table};

fn browser_nodes() -> Vec<Schema> {
    match &fact_schema()[4] {
        Schema::ForeignKey { schema, .. } => schema.clone(),
        _ => unreachable!(),
    }
}

fn run_with_browser(name: &str, version: &str) -> Run {
    Run {
        score: 1,
        status_code: 200,
        error_message: None,
        plugin_version: "1.0".to_string(),
        plugin_name: "DBTest".to_string(),
        extension_version: "0.0.1".to_string(),
        browser_version: version.to_string(),
        browser_name: name.to_string(),
        path: "/".to_string(),
        url: "https://example.com".to_string(),
    }
}

#[tokio::test]
async fn repeated_content_reuses_the_same_id() {
    let bank = KeyBank::new(HashMap::new());
    let raw = content_key(&browser_nodes(), &run_with_browser("Chrome", "120"));
    let hash = hash_content_key(&raw);
    let (first, first_hit) = bank.request_key(Table::Browser, &hash).await;
    let (second, second_hit) = bank.request_key(Table::Browser, &hash).await;
    assert!(!first_hit);
    assert!(second_hit);
    assert_eq!(first, second);
}

#[tokio::test]
async fn distinct_browsers_never_collide_on_id() {
    let bank = KeyBank::new(HashMap::new());
    let chrome_hash = hash_content_key(&content_key(&browser_nodes(), &run_with_browser("Chrome", "120")));
    let firefox_hash = hash_content_key(&content_key(&browser_nodes(), &run_with_browser("Firefox", "115")));
    let (chrome_id, _) = bank.request_key(Table::Browser, &chrome_hash).await;
    let (firefox_id, _) = bank.request_key(Table::Browser, &firefox_hash).await;
    assert_ne!(chrome_id, firefox_id);
}

#[tokio::test]
async fn ids_are_monotonically_increasing_per_table() {
    let bank = KeyBank::new(HashMap::new());
    let mut previous = 0;
    for i in 0..20 {
        let id = bank.next_id(Table::Url);
        assert!(id > previous || i == 0);
        previous = id;
    }
}

#[tokio::test]
async fn seeding_continues_a_previous_sequence() {
    let mut seeds = HashMap::new();
    seeds.insert(Table::Domain, 1000);
    let bank = KeyBank::new(seeds);
    assert_eq!(bank.next_id(Table::Domain), 1000);
    assert_eq!(bank.next_id(Table::Domain), 1001);
}
