#![cfg(feature = "collections")]

mod common;

use common::{create_test_context, unique_key};
use futures::TryStreamExt;
use quay::prelude::*;
use quay_core::Result;
use redis::AsyncCommands;
use std::collections::HashMap;

#[tokio::test]
async fn test_hash_basics() -> Result<()> {
    let hash: Hash<u64> = Hash::with_context(create_test_context(), unique_key("hash"));
    hash.set("a", &1).await?;
    hash.update([("b", 2), ("c", 3)]).await?;

    assert_eq!(hash.get("a").await?, Some(1));
    assert_eq!(hash.get("zzz").await?, None);
    assert_eq!(hash.get_or("zzz", 9).await?, 9);
    assert!(hash.get_item("zzz").await.unwrap_err().is_not_found());
    assert!(hash.contains("b").await?);
    assert_eq!(hash.len().await?, 3);

    let mut keys = hash.keys().await?;
    keys.sort();
    assert_eq!(keys, vec!["a", "b", "c"]);
    let mut values = hash.values().await?;
    values.sort();
    assert_eq!(values, vec![1, 2, 3]);

    assert!(hash.remove("a").await?);
    assert!(!hash.remove("a").await?);
    hash.clear().await?;
    assert!(hash.is_empty().await?);
    Ok(())
}

#[tokio::test]
async fn test_hash_items_skip_undecodable_fields() -> Result<()> {
    let context = create_test_context();
    let hash: Hash<u64> = Hash::with_context(context.clone(), unique_key("items"));
    hash.update([("a", 1), ("b", 2)]).await?;

    let mut conn = context.get_connection().await?;
    let _: () = conn.hset(hash.name(), "broken", "{not json").await?;

    let items: HashMap<String, u64> = hash.items().try_collect().await?;
    assert_eq!(items, HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));
    assert!(hash.get_item("broken").await.unwrap_err().is_not_found());

    hash.clear().await?;
    Ok(())
}

#[tokio::test]
async fn test_hash_pop() -> Result<()> {
    let hash: Hash<String> = Hash::with_context(create_test_context(), unique_key("pop"));
    hash.set("job", &"resize".to_string()).await?;

    assert_eq!(hash.pop("job").await?, Some("resize".to_string()));
    assert!(!hash.contains("job").await?);
    assert_eq!(hash.pop("job").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_set_membership() -> Result<()> {
    let set: Set<String> = Set::with_context(create_test_context(), unique_key("set"));
    let worker = "worker-1".to_string();

    assert!(set.add(&worker).await?);
    assert!(!set.add(&worker).await?);
    assert!(set.add(&"worker-2".to_string()).await?);
    assert!(set.contains(&worker).await?);
    assert_eq!(set.len().await?, 2);

    let mut members: Vec<String> = set.members().try_collect().await?;
    members.sort();
    assert_eq!(members, vec!["worker-1", "worker-2"]);

    assert_eq!(set.pop(&worker).await?, Some(worker.clone()));
    assert_eq!(set.pop(&worker).await?, None);
    assert!(!set.contains(&worker).await?);
    assert!(set.remove(&"worker-2".to_string()).await?);
    assert!(set.is_empty().await?);
    Ok(())
}

#[tokio::test]
async fn test_dict_over_prefixed_keys() -> Result<()> {
    let context = create_test_context();
    let prefix = format!("{}:", unique_key("dict"));
    let dict: Dict<String> = Dict::with_context(context.clone(), &prefix);

    dict.set("x", &"ex".to_string()).await?;
    dict.set("y", &"why".to_string()).await?;
    dict.set_with_ttl("z", &"zed".to_string(), 60).await?;

    let mut conn = context.get_connection().await?;
    let stored: Option<String> = conn.get(format!("{prefix}x")).await?;
    assert_eq!(stored.as_deref(), Some("\"ex\""));
    let ttl: i64 = conn.ttl(format!("{prefix}z")).await?;
    assert!(ttl > 0 && ttl <= 60);

    assert_eq!(dict.keys().await?, vec!["x", "y", "z"]);
    assert_eq!(dict.len().await?, 3);
    assert!(dict.contains("y").await?);
    assert!(dict.get_item("nope").await.unwrap_err().is_not_found());

    assert!(dict.remove("z").await?);
    let items: Vec<(String, String)> = dict.items().try_collect().await?;
    assert_eq!(
        items,
        vec![
            ("x".to_string(), "ex".to_string()),
            ("y".to_string(), "why".to_string())
        ]
    );

    dict.clear().await?;
    assert!(dict.is_empty().await?);
    Ok(())
}

#[tokio::test]
async fn test_dict_prefix_is_matched_literally() -> Result<()> {
    let context = create_test_context();
    let base = unique_key("glob");
    let starred: Dict<u32> = Dict::with_context(context.clone(), format!("{base}:*:"));
    let plain: Dict<u32> = Dict::with_context(context, format!("{base}:a:"));

    starred.set("one", &1).await?;
    plain.set("two", &2).await?;
    assert_eq!(starred.keys().await?, vec!["one"]);

    starred.clear().await?;
    plain.clear().await?;
    Ok(())
}

#[tokio::test]
async fn test_slot_holds_one_value() -> Result<()> {
    let slot: Slot<Vec<String>> = Slot::with_context(create_test_context(), unique_key("slot"));
    assert!(!slot.exists().await?);
    assert_eq!(slot.get_or(vec![]).await?, Vec::<String>::new());

    slot.set(&vec!["a".to_string()]).await?;
    assert_eq!(slot.get().await?, Some(vec!["a".to_string()]));
    assert!(slot.delete().await?);
    assert!(!slot.delete().await?);
    Ok(())
}

#[tokio::test]
async fn test_hash_items_skip_fields_deleted_mid_walk() -> Result<()> {
    let hash: Hash<u64> = Hash::with_context(create_test_context(), unique_key("midwalk"));
    hash.update([("a", 1), ("b", 2), ("c", 3)]).await?;

    let items = hash.items();
    futures::pin_mut!(items);
    let (first, _) = items.try_next().await?.expect("hash has fields");
    for field in ["a", "b", "c"] {
        if field != first {
            hash.remove(field).await?;
        }
    }

    let rest: Vec<(String, u64)> = items.try_collect().await?;
    assert!(rest.is_empty());
    hash.clear().await?;
    Ok(())
}

#[tokio::test]
async fn test_hash_skips_field_names_that_are_not_utf8() -> Result<()> {
    let context = create_test_context();
    let hash: Hash<u64> = Hash::with_context(context.clone(), unique_key("utf8"));
    hash.set("good", &1).await?;

    let mut conn = context.get_connection().await?;
    let _: () = conn.hset(hash.name(), vec![0xffu8, 0xfe], b"2".to_vec()).await?;

    assert_eq!(hash.keys().await?, vec!["good"]);
    let items: Vec<(String, u64)> = hash.items().try_collect().await?;
    assert_eq!(items, vec![("good".to_string(), 1)]);
    assert_eq!(hash.len().await?, 2);

    hash.clear().await?;
    Ok(())
}

#[tokio::test]
async fn test_dict_items_skip_undecodable_entries() -> Result<()> {
    let context = create_test_context();
    let prefix = format!("{}:", unique_key("dictbad"));
    let dict: Dict<u32> = Dict::with_context(context.clone(), &prefix);
    dict.set("a", &1).await?;

    let mut conn = context.get_connection().await?;
    let _: () = conn.set(format!("{prefix}b"), "{not json").await?;

    let items: Vec<(String, u32)> = dict.items().try_collect().await?;
    assert_eq!(items, vec![("a".to_string(), 1)]);
    assert_eq!(dict.get("b").await?, None);
    assert!(dict.get_item("b").await.unwrap_err().is_not_found());

    dict.clear().await?;
    assert!(dict.is_empty().await?);
    Ok(())
}

#[tokio::test]
async fn test_dict_items_skip_entries_deleted_mid_walk() -> Result<()> {
    let prefix = format!("{}:", unique_key("dictwalk"));
    let dict: Dict<u32> = Dict::with_context(create_test_context(), &prefix);
    for (field, value) in [("a", 1), ("b", 2), ("c", 3)] {
        dict.set(field, &value).await?;
    }

    let items = dict.items();
    futures::pin_mut!(items);
    assert_eq!(items.try_next().await?, Some(("a".to_string(), 1)));
    dict.remove("b").await?;

    let rest: Vec<(String, u32)> = items.try_collect().await?;
    assert_eq!(rest, vec![("c".to_string(), 3)]);
    dict.clear().await?;
    Ok(())
}

#[tokio::test]
async fn test_dict_skips_keys_that_are_not_utf8() -> Result<()> {
    let context = create_test_context();
    let prefix = format!("{}:", unique_key("dictutf8"));
    let dict: Dict<u32> = Dict::with_context(context.clone(), &prefix);
    dict.set("good", &1).await?;

    let mut bad_key = prefix.as_bytes().to_vec();
    bad_key.push(0xff);
    let mut conn = context.get_connection().await?;
    let _: () = conn.set(&bad_key, b"2".to_vec()).await?;

    assert_eq!(dict.keys().await?, vec!["good"]);
    assert_eq!(dict.len().await?, 1);

    dict.clear().await?;
    let _: () = conn.del(&bad_key).await?;
    Ok(())
}
