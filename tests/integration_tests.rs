//! Integration tests over the in-memory source
//!
//! Tests the full end-to-end flow: YAML registry → page engine →
//! connections, streams, and the capability modules around them.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use keyseek::slug::{SlugGenerator, SlugLookup};
use keyseek::{
    global_id, load_registry_from_str, touch, Error, Expr, JsonValue, MemorySource, Page,
    PageEngine, PageRequest, Result, Row,
};
use serde_json::json;

const REGISTRY_YAML: &str = r#"
default_sort_key: chrono
sort_keys:
  chrono:
    - column: created_at
      reversible: true
      kind: timestamp
    - column: id
      reversible: true
  by_id:
    - column: id
"#;

/// 25 posts, 5 per day, so `created_at` ties inside each day and `id`
/// carries the tie-break
fn sample_values() -> Vec<JsonValue> {
    (1..=25)
        .map(|id: i64| {
            let day = (id + 4) / 5;
            json!({
                "id": id,
                "created_at": format!("2024-01-{day:02}T08:00:00.000Z"),
                "status": if id % 4 == 0 { "archived" } else { "active" },
                "title": format!("Post {id}"),
            })
        })
        .collect()
}

fn engine() -> PageEngine<MemorySource> {
    let registry = load_registry_from_str(REGISTRY_YAML).unwrap();
    let source = MemorySource::from_values(sample_values());
    PageEngine::new(Arc::new(registry), Arc::new(source))
}

fn ids(page: &Page) -> Vec<i64> {
    page.nodes()
        .map(|node| node.get("id").and_then(JsonValue::as_i64).unwrap())
        .collect()
}

// ============================================================================
// Paging Walks
// ============================================================================

#[tokio::test]
async fn test_forward_walk_covers_all_rows() {
    let engine = engine();
    let mut request = PageRequest::new().with_first(10);
    let mut seen = Vec::new();
    let mut page_sizes = Vec::new();

    loop {
        let page = engine.get_page(&request).await.unwrap();
        page_sizes.push(page.edges.len());
        seen.extend(ids(&page));
        if !page.has_more {
            break;
        }
        let token = page.end_cursor().unwrap().to_string();
        request = PageRequest::new().with_first(10).with_after(token);
    }

    assert_eq!(page_sizes, vec![10, 10, 5]);
    assert_eq!(seen, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_backward_walk_retains_forward_order() {
    let engine = engine();
    let mut request = PageRequest::new().with_last(10);
    let mut pages = Vec::new();

    loop {
        let page = engine.get_page(&request).await.unwrap();
        let page_ids = ids(&page);
        assert!(
            page_ids.windows(2).all(|w| w[0] < w[1]),
            "each backward page comes out forward-oriented: {page_ids:?}"
        );
        let boundary = page.start_cursor().map(ToString::to_string);
        let more = page.has_more;
        pages.push(page_ids);
        if !more {
            break;
        }
        request = PageRequest::new().with_last(10).with_before(boundary.unwrap());
    }

    let all: Vec<i64> = pages.into_iter().rev().flatten().collect();
    assert_eq!(all, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_tied_timestamps_never_straddle_a_boundary() {
    // Rows 1-5 share one created_at; a page break at 3 must split the
    // tie on id, not drop or repeat a row.
    let engine = engine();

    let first = engine
        .get_page(&PageRequest::new().with_first(3))
        .await
        .unwrap();
    assert_eq!(ids(&first), vec![1, 2, 3]);

    let token = first.end_cursor().unwrap().to_string();
    let second = engine
        .get_page(&PageRequest::new().with_first(3).with_after(token))
        .await
        .unwrap();
    assert_eq!(ids(&second), vec![4, 5, 6]);
}

// ============================================================================
// Connections
// ============================================================================

#[tokio::test]
async fn test_connection_with_filter() {
    let engine = engine();
    let request = PageRequest::new()
        .with_first(5)
        .with_filter(Expr::eq("status", "active"));

    let connection = engine.get_connection(&request).await.unwrap();

    let edge_ids: Vec<i64> = connection
        .edges
        .iter()
        .map(|edge| edge.node.get("id").and_then(JsonValue::as_i64).unwrap())
        .collect();
    assert_eq!(edge_ids, vec![1, 2, 3, 5, 6]);

    // 25 rows minus the 6 archived ones
    assert_eq!(connection.total_count, 19);
    assert!(connection.page_info.has_next_page);
    assert!(!connection.page_info.has_previous_page);
    assert_eq!(
        connection.page_info.end_cursor.as_deref(),
        Some(connection.edges.last().unwrap().cursor.as_str())
    );
}

#[tokio::test]
async fn test_lazy_connection_matches_eager() {
    let engine = engine();
    let request = PageRequest::new().with_first(7).with_sort_key("by_id");

    let lazy = engine.get_lazy_connection(&request).unwrap();
    assert!(!lazy.has_previous_page());
    assert_eq!(lazy.edges().await.unwrap().len(), 7);
    assert!(lazy.has_next_page().await.unwrap());
    assert_eq!(lazy.total_count().await.unwrap(), 25);

    let eager = engine.get_connection(&request).await.unwrap();
    assert_eq!(lazy.into_connection().await.unwrap(), eager);
}

// ============================================================================
// Page Stream
// ============================================================================

#[tokio::test]
async fn test_page_stream_walks_every_page() {
    let engine = engine();
    let pages: Vec<Result<Page>> = engine
        .page_stream(PageRequest::new().with_first(8))
        .unwrap()
        .collect()
        .await;

    let pages: Vec<Page> = pages.into_iter().map(Result::unwrap).collect();
    assert_eq!(pages.len(), 4);

    let all: Vec<i64> = pages.iter().flat_map(ids).collect();
    assert_eq!(all, (1..=25).collect::<Vec<_>>());
}

// ============================================================================
// Validation Errors
// ============================================================================

#[tokio::test]
async fn test_request_validation_end_to_end() {
    let engine = engine();

    let negative = engine
        .get_page(&PageRequest::new().with_first(-2))
        .await
        .unwrap_err();
    assert!(matches!(negative, Error::NegativeLimit { limit: -2 }));

    let oversized = engine
        .get_page(&PageRequest::new().with_first(101))
        .await
        .unwrap_err();
    assert!(matches!(
        oversized,
        Error::LimitExceedsMax { limit: 101, max: 100 }
    ));

    let unknown = engine
        .get_page(&PageRequest::new().with_sort_key("nope"))
        .await
        .unwrap_err();
    assert!(matches!(unknown, Error::SortKeyNotFound { .. }));

    let garbage = engine
        .get_page(&PageRequest::new().with_after("not-a-cursor"))
        .await
        .unwrap_err();
    assert!(matches!(garbage, Error::InvalidCursor { .. }));
}

// ============================================================================
// Capability Modules
// ============================================================================

struct StoredSlugs(Vec<String>);

#[async_trait]
impl SlugLookup for StoredSlugs {
    async fn similar_slugs(&self, base: &str) -> Result<Vec<String>> {
        Ok(self
            .0
            .iter()
            .filter(|slug| slug.starts_with(base))
            .cloned()
            .collect())
    }
}

#[tokio::test]
async fn test_publish_flow_composes_capabilities() {
    // A new post picks up a slug, an updated_at stamp, and a global id
    // before it would be written back.
    let mut row: Row = match json!({ "id": 26, "title": "Launch Day" }) {
        JsonValue::Object(map) => map,
        _ => unreachable!(),
    };

    let generator = SlugGenerator::new("slug", vec!["title".to_string()]);
    let lookup = StoredSlugs(vec!["launch-day".to_string()]);
    let slug = generator.stamp(&mut row, &lookup).await.unwrap();
    assert_eq!(slug, "launch-day2");

    let stamp = touch::touch(&mut row);
    assert_eq!(row.get("updated_at"), Some(&json!(stamp)));

    let token = global_id::encode("posts", 26);
    assert_eq!(global_id::decode_expected(&token, "posts").unwrap(), "26");
    assert!(global_id::decode_expected(&token, "users").is_err());
}
