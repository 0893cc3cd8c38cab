use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use studio_atoms::blocks::{render_blocks, BlockSequence, ContentFamily};
use studio_atoms::{ContentError, ContentResult};

use crate::responses;
use crate::store::{self, put_optional, string_attr, Item};
use crate::types::{
    apply_optional, is_published, resolve_slug, sort_newest_published_first,
    validate_published_at, CreatePostPayload, Post, PostSummary, PostView, UpdatePostPayload,
};

const POST_PK: &str = "POST";
const POST_SK_PREFIX: &str = "POST#";

fn post_sk(post_id: &str) -> String {
    format!("{}{}", POST_SK_PREFIX, post_id)
}

/// Full DynamoDB item for a post, both content representations included
pub fn post_to_item(post: &Post) -> ContentResult<Item> {
    let mut item = HashMap::new();
    item.insert("PK".to_string(), AttributeValue::S(POST_PK.to_string()));
    item.insert("SK".to_string(), AttributeValue::S(post_sk(&post.post_id)));
    item.insert("title".to_string(), AttributeValue::S(post.title.clone()));
    item.insert("slug".to_string(), AttributeValue::S(post.slug.clone()));
    item.insert("content".to_string(), AttributeValue::S(post.content.clone()));
    item.insert(
        "content_blocks".to_string(),
        AttributeValue::S(post.content_blocks.to_json()?),
    );
    item.insert("created_at".to_string(), AttributeValue::S(post.created_at.clone()));

    put_optional(&mut item, "excerpt", &post.excerpt);
    put_optional(&mut item, "image_url", &post.image_url);
    put_optional(&mut item, "published_at", &post.published_at);
    put_optional(&mut item, "updated_at", &post.updated_at);
    Ok(item)
}

/// Rebuild a post from its item. Items written before blocks existed only
/// carry `content`, which becomes a single text block.
pub fn post_from_item(item: &Item) -> ContentResult<Post> {
    let post_id = item
        .get("SK")
        .and_then(|v| v.as_s().ok())
        .and_then(|sk| sk.strip_prefix(POST_SK_PREFIX))
        .map(|id| id.to_string())
        .ok_or_else(|| ContentError::Store("post item without a POST# sort key".to_string()))?;

    let content = string_attr(item, "content").unwrap_or_default();
    let blocks_json = string_attr(item, "content_blocks");
    let content_blocks = BlockSequence::from_persisted_json(blocks_json.as_deref(), &content)?;

    Ok(Post {
        post_id,
        title: string_attr(item, "title").unwrap_or_default(),
        slug: string_attr(item, "slug").unwrap_or_default(),
        excerpt: string_attr(item, "excerpt"),
        content,
        content_blocks,
        image_url: string_attr(item, "image_url"),
        published_at: string_attr(item, "published_at"),
        created_at: string_attr(item, "created_at").unwrap_or_default(),
        updated_at: string_attr(item, "updated_at"),
    })
}

/// Build a new post from a create payload
pub fn new_post(req: CreatePostPayload, post_id: String, now: &str) -> ContentResult<Post> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ContentError::Validation("title is required".to_string()));
    }
    validate_published_at(req.published_at.as_deref()).map_err(ContentError::Validation)?;

    let content_blocks = match req.content_blocks {
        Some(blocks) => blocks,
        None => BlockSequence::from_persisted(None, req.content.as_deref().unwrap_or_default()),
    };

    let mut post = Post {
        slug: resolve_slug(req.slug.as_deref(), &title, &post_id),
        post_id,
        title,
        excerpt: None,
        content: String::new(),
        content_blocks,
        image_url: None,
        published_at: None,
        created_at: now.to_string(),
        updated_at: None,
    };
    apply_optional(&mut post.excerpt, req.excerpt);
    apply_optional(&mut post.image_url, req.image_url);
    apply_optional(&mut post.published_at, req.published_at);
    Ok(post)
}

/// Merge a partial update into an existing post
pub fn apply_post_update(post: &mut Post, req: UpdatePostPayload, now: &str) -> ContentResult<()> {
    validate_published_at(req.published_at.as_deref()).map_err(ContentError::Validation)?;
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ContentError::Validation("title cannot be empty".to_string()));
    }

    if let Some(title) = req.title {
        post.title = title.trim().to_string();
    }

    if let Some(slug) = req.slug {
        post.slug = resolve_slug(Some(&slug), &post.title, &post.post_id);
    }
    if let Some(blocks) = req.content_blocks {
        post.content_blocks = blocks;
    }
    apply_optional(&mut post.excerpt, req.excerpt);
    apply_optional(&mut post.image_url, req.image_url);
    apply_optional(&mut post.published_at, req.published_at);
    post.updated_at = Some(now.to_string());
    Ok(())
}

/// Single write path: regenerate the flattened copy, then one put
async fn save_post(client: &DynamoClient, table_name: &str, post: &mut Post) -> ContentResult<()> {
    post.content = post.content_blocks.to_legacy_string();
    let item = post_to_item(post)?;
    store::put_item(client, table_name, item).await
}

async fn load_post(client: &DynamoClient, table_name: &str, post_id: &str) -> ContentResult<Post> {
    match store::get_item(client, table_name, POST_PK, post_sk(post_id)).await? {
        Some(item) => post_from_item(&item),
        None => Err(ContentError::NotFound("Post".to_string())),
    }
}

/// Every readable post, newest first by creation time
async fn load_posts(client: &DynamoClient, table_name: &str) -> ContentResult<Vec<Post>> {
    let items = store::query_prefix(client, table_name, POST_PK, POST_SK_PREFIX).await?;

    let mut posts = Vec::with_capacity(items.len());
    for item in &items {
        match post_from_item(item) {
            Ok(post) => posts.push(post),
            Err(e) => tracing::error!("Skipping unreadable post item: {}", e),
        }
    }

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

fn slug_taken(posts: &[Post], slug: &str, except_id: Option<&str>) -> bool {
    posts
        .iter()
        .any(|p| p.slug == slug && Some(p.post_id.as_str()) != except_id)
}

/// Published posts only, newest publish date first
pub fn published_posts(mut posts: Vec<Post>, now: chrono::DateTime<chrono::Utc>) -> Vec<Post> {
    posts.retain(|p| is_published(p.published_at.as_deref(), now));
    sort_newest_published_first(&mut posts, |p: &Post| p.published_at.as_deref());
    posts
}

pub fn post_view(post: &Post) -> PostView {
    PostView {
        summary: PostSummary::from(post),
        html: render_blocks(&post.content_blocks, ContentFamily::Blog),
    }
}

/// Create a new post:
/// PK = "POST"
/// SK = "POST#{post_id}"
pub async fn create_post(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreatePostPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return responses::bad_payload(e),
    };

    let post_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let mut post = match new_post(req, post_id, &now) {
        Ok(post) => post,
        Err(e) => return responses::content_error(e),
    };

    let existing = match load_posts(client, table_name).await {
        Ok(posts) => posts,
        Err(e) => return responses::content_error(e),
    };
    if slug_taken(&existing, &post.slug, None) {
        return responses::error(
            StatusCode::CONFLICT,
            &format!("Slug '{}' is already used by another post", post.slug),
        );
    }

    if let Err(e) = save_post(client, table_name, &mut post).await {
        return responses::content_error(e);
    }
    tracing::info!("📝 Created post {} ({})", post.post_id, post.slug);

    responses::json(StatusCode::CREATED, &post)
}

pub async fn get_post(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
) -> Result<Response<Body>, Error> {
    match load_post(client, table_name, post_id).await {
        Ok(post) => responses::json(StatusCode::OK, &post),
        Err(e) => responses::content_error(e),
    }
}

/// Admin listing: drafts and scheduled posts included
pub async fn list_posts(client: &DynamoClient, table_name: &str) -> Result<Response<Body>, Error> {
    match load_posts(client, table_name).await {
        Ok(posts) => responses::json(StatusCode::OK, &posts),
        Err(e) => responses::content_error(e),
    }
}

pub async fn update_post(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdatePostPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return responses::bad_payload(e),
    };

    let mut post = match load_post(client, table_name, post_id).await {
        Ok(post) => post,
        Err(e) => return responses::content_error(e),
    };

    let slug_changing = req.slug.is_some();
    let now = chrono::Utc::now().to_rfc3339();
    if let Err(e) = apply_post_update(&mut post, req, &now) {
        return responses::content_error(e);
    }

    if slug_changing {
        let existing = match load_posts(client, table_name).await {
            Ok(posts) => posts,
            Err(e) => return responses::content_error(e),
        };
        if slug_taken(&existing, &post.slug, Some(post_id)) {
            return responses::error(
                StatusCode::CONFLICT,
                &format!("Slug '{}' is already used by another post", post.slug),
            );
        }
    }

    if let Err(e) = save_post(client, table_name, &mut post).await {
        return responses::content_error(e);
    }
    tracing::info!("📝 Updated post {} ({} blocks)", post.post_id, post.content_blocks.len());

    responses::json(StatusCode::OK, &post)
}

pub async fn delete_post(
    client: &DynamoClient,
    table_name: &str,
    post_id: &str,
) -> Result<Response<Body>, Error> {
    if let Err(e) = store::delete_item(client, table_name, POST_PK, post_sk(post_id)).await {
        return responses::content_error(e);
    }

    tracing::info!("🗑️ Deleted post {}", post_id);
    responses::no_content()
}

/// Public listing of live posts
pub async fn list_published_posts(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, Error> {
    let posts = match load_posts(client, table_name).await {
        Ok(posts) => posts,
        Err(e) => return responses::content_error(e),
    };

    let summaries: Vec<PostSummary> = published_posts(posts, chrono::Utc::now())
        .iter()
        .map(PostSummary::from)
        .collect();
    responses::json(StatusCode::OK, &summaries)
}

/// Public single post by slug; drafts read as not found
pub async fn get_published_post(
    client: &DynamoClient,
    table_name: &str,
    slug: &str,
) -> Result<Response<Body>, Error> {
    let posts = match load_posts(client, table_name).await {
        Ok(posts) => posts,
        Err(e) => return responses::content_error(e),
    };

    match published_posts(posts, chrono::Utc::now())
        .iter()
        .find(|p| p.slug == slug)
    {
        Some(post) => responses::json(StatusCode::OK, &post_view(post)),
        None => responses::error(StatusCode::NOT_FOUND, "Post not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use studio_atoms::blocks::{BlockField, BlockKind, ContentBlock};

    const NOW: &str = "2026-04-02T10:00:00+00:00";

    fn payload(json: &str) -> CreatePostPayload {
        serde_json::from_str(json).unwrap()
    }

    fn sample_post() -> Post {
        new_post(
            payload(r#"{"title":"Behind the Scenes","content_blocks":[{"type":"text","body":"Hello"}]}"#),
            "p1".to_string(),
            NOW,
        )
        .unwrap()
    }

    #[test]
    fn create_derives_slug_and_keeps_blocks() {
        let post = sample_post();
        assert_eq!(post.slug, "behind-the-scenes");
        assert_eq!(post.content_blocks.get(0), Some(&ContentBlock::text("Hello")));
        assert_eq!(post.created_at, NOW);
    }

    #[test]
    fn create_without_blocks_wraps_plain_content() {
        let post = new_post(payload(r#"{"title":"Old style","content":"Just text"}"#), "p2".into(), NOW).unwrap();
        assert_eq!(post.content_blocks.len(), 1);
        assert_eq!(post.content_blocks.get(0), Some(&ContentBlock::text("Just text")));
    }

    #[test]
    fn create_validates_title_and_dates() {
        let blank = new_post(payload(r#"{"title":"   "}"#), "p".into(), NOW);
        assert!(matches!(blank, Err(ContentError::Validation(_))));

        let bad_date = new_post(payload(r#"{"title":"t","published_at":"next week"}"#), "p".into(), NOW);
        assert!(matches!(bad_date, Err(ContentError::Validation(_))));
    }

    #[test]
    fn item_round_trip_keeps_both_representations() {
        let mut post = sample_post();
        let idx = post.content_blocks.append(BlockKind::Image);
        post.content_blocks
            .update_field(idx, BlockField::Url("https://x/y.webp".into()))
            .unwrap();
        post.content_blocks
            .update_field(idx, BlockField::Caption(Some("Team photo".into())))
            .unwrap();
        post.content = post.content_blocks.to_legacy_string();

        let item = post_to_item(&post).unwrap();
        assert_eq!(item.get("SK").unwrap().as_s().unwrap(), "POST#p1");
        assert_eq!(
            item.get("content").unwrap().as_s().unwrap(),
            "Hello\n\n[IMAGE: https://x/y.webp - Team photo]"
        );
        assert!(item.get("image_url").is_none());

        assert_eq!(post_from_item(&item).unwrap(), post);
    }

    #[test]
    fn legacy_item_without_blocks_loads_as_one_text_block() {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S("POST".into()));
        item.insert("SK".to_string(), AttributeValue::S("POST#old".into()));
        item.insert("title".to_string(), AttributeValue::S("Old".into()));
        item.insert("content".to_string(), AttributeValue::S("# Heading\n\nBody".into()));

        let post = post_from_item(&item).unwrap();
        assert_eq!(post.post_id, "old");
        assert_eq!(post.content_blocks.blocks(), &[ContentBlock::text("# Heading\n\nBody")]);
    }

    #[test]
    fn corrupt_blocks_are_reported() {
        let mut item = post_to_item(&sample_post()).unwrap();
        item.insert("content_blocks".to_string(), AttributeValue::S(r#"[{"type":"audio"}]"#.into()));
        assert!(matches!(post_from_item(&item), Err(ContentError::InvalidBlocks(_))));
    }

    #[test]
    fn update_merges_and_clears() {
        let mut post = sample_post();
        post.image_url = Some("https://x/cover.webp".into());

        let req: UpdatePostPayload = serde_json::from_str(
            r#"{"slug":"New Slug","image_url":"","excerpt":"Short","content_blocks":[{"type":"text","body":"Edited"}]}"#,
        )
        .unwrap();
        apply_post_update(&mut post, req, "2026-04-03T00:00:00+00:00").unwrap();

        assert_eq!(post.slug, "new-slug");
        assert_eq!(post.image_url, None);
        assert_eq!(post.excerpt.as_deref(), Some("Short"));
        assert_eq!(post.content_blocks.get(0), Some(&ContentBlock::text("Edited")));
        assert_eq!(post.updated_at.as_deref(), Some("2026-04-03T00:00:00+00:00"));
        assert_eq!(post.title, "Behind the Scenes");
    }

    #[test]
    fn public_listing_filters_and_orders() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0).unwrap();
        let mk = |id: &str, published_at: Option<&str>| Post {
            post_id: id.to_string(),
            slug: id.to_string(),
            published_at: published_at.map(str::to_string),
            ..sample_post()
        };
        let posts = vec![
            mk("draft", None),
            mk("old", Some("2026-01-01T00:00:00Z")),
            mk("future", Some("2027-01-01T00:00:00Z")),
            mk("new", Some("2026-04-01T00:00:00Z")),
        ];

        let ids: Vec<_> = published_posts(posts, now).into_iter().map(|p| p.post_id).collect();
        assert_eq!(ids, ["new", "old"]);
    }

    #[test]
    fn view_renders_markdown_and_figures() {
        let mut post = sample_post();
        post.content_blocks = BlockSequence::try_from(vec![
            ContentBlock::text("**Bold** intro"),
            ContentBlock::image("", None, None),
            ContentBlock::image("https://x/a.webp", Some("Crew".into()), None),
        ])
        .unwrap();

        let view = post_view(&post);
        assert!(view.html.contains("<strong>Bold</strong>"));
        assert_eq!(view.html.matches("<figure").count(), 1);
        assert!(view.html.contains("<figcaption>Crew</figcaption>"));
    }

    #[test]
    fn slug_conflicts_ignore_self() {
        let post = sample_post();
        let posts = vec![post.clone()];
        assert!(slug_taken(&posts, "behind-the-scenes", None));
        assert!(!slug_taken(&posts, "behind-the-scenes", Some("p1")));
    }
}
