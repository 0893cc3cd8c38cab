use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use studio_atoms::blocks::{render_blocks, BlockSequence, ContentBlock, ContentFamily};
use studio_atoms::sections::CaseStudySections;
use studio_atoms::{ContentError, ContentResult};

use crate::responses;
use crate::store::{self, put_optional, string_attr, Item};
use crate::types::{
    apply_optional, is_published, resolve_slug, sort_newest_published_first,
    validate_published_at, CaseStudy, CaseStudySummary, CaseStudyView, CreateCaseStudyPayload,
    UpdateCaseStudyPayload,
};

const CASE_STUDY_PK: &str = "CASE_STUDY";
const CASE_STUDY_SK_PREFIX: &str = "CASE_STUDY#";

fn case_study_sk(case_study_id: &str) -> String {
    format!("{}{}", CASE_STUDY_SK_PREFIX, case_study_id)
}

/// Sections go into `content` as one JSON string
pub fn case_study_to_item(case_study: &CaseStudy) -> ContentResult<Item> {
    let mut item = HashMap::new();
    item.insert("PK".to_string(), AttributeValue::S(CASE_STUDY_PK.to_string()));
    item.insert(
        "SK".to_string(),
        AttributeValue::S(case_study_sk(&case_study.case_study_id)),
    );
    item.insert("title".to_string(), AttributeValue::S(case_study.title.clone()));
    item.insert("slug".to_string(), AttributeValue::S(case_study.slug.clone()));
    item.insert(
        "content".to_string(),
        AttributeValue::S(case_study.sections.to_persisted()?),
    );
    if let Some(blocks) = &case_study.content_blocks {
        item.insert("content_blocks".to_string(), AttributeValue::S(blocks.to_json()?));
    }
    item.insert(
        "gallery_images".to_string(),
        AttributeValue::L(
            case_study
                .gallery_images
                .iter()
                .map(|url| AttributeValue::S(url.clone()))
                .collect(),
        ),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(case_study.created_at.clone()),
    );

    put_optional(&mut item, "client", &case_study.client);
    put_optional(&mut item, "category", &case_study.category);
    put_optional(&mut item, "image_url", &case_study.image_url);
    put_optional(&mut item, "published_at", &case_study.published_at);
    put_optional(&mut item, "updated_at", &case_study.updated_at);
    Ok(item)
}

/// `content` that is not sections JSON is older free-form text and lands in
/// the project summary.
pub fn case_study_from_item(item: &Item) -> ContentResult<CaseStudy> {
    let case_study_id = item
        .get("SK")
        .and_then(|v| v.as_s().ok())
        .and_then(|sk| sk.strip_prefix(CASE_STUDY_SK_PREFIX))
        .map(|id| id.to_string())
        .ok_or_else(|| {
            ContentError::Store("case study item without a CASE_STUDY# sort key".to_string())
        })?;

    let sections = string_attr(item, "content")
        .map(|raw| CaseStudySections::parse(&raw))
        .unwrap_or_default();

    let content_blocks = match string_attr(item, "content_blocks") {
        Some(raw) if !raw.trim().is_empty() => {
            let blocks: Vec<ContentBlock> = serde_json::from_str(&raw)
                .map_err(|e| ContentError::InvalidBlocks(e.to_string()))?;
            optional_blocks(blocks)
        }
        _ => None,
    };

    let gallery_images = item
        .get("gallery_images")
        .and_then(|v| v.as_l().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_s().ok())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(CaseStudy {
        case_study_id,
        title: string_attr(item, "title").unwrap_or_default(),
        slug: string_attr(item, "slug").unwrap_or_default(),
        client: string_attr(item, "client"),
        category: string_attr(item, "category"),
        sections,
        content_blocks,
        image_url: string_attr(item, "image_url"),
        gallery_images,
        published_at: string_attr(item, "published_at"),
        created_at: string_attr(item, "created_at").unwrap_or_default(),
        updated_at: string_attr(item, "updated_at"),
    })
}

pub fn new_case_study(
    req: CreateCaseStudyPayload,
    case_study_id: String,
    now: &str,
) -> ContentResult<CaseStudy> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ContentError::Validation("title is required".to_string()));
    }
    validate_published_at(req.published_at.as_deref()).map_err(ContentError::Validation)?;

    let mut case_study = CaseStudy {
        slug: resolve_slug(req.slug.as_deref(), &title, &case_study_id),
        case_study_id,
        title,
        client: None,
        category: None,
        sections: req.sections,
        content_blocks: optional_blocks(req.content_blocks),
        image_url: None,
        gallery_images: clean_gallery(req.gallery_images),
        published_at: None,
        created_at: now.to_string(),
        updated_at: None,
    };
    apply_optional(&mut case_study.client, req.client);
    apply_optional(&mut case_study.category, req.category);
    apply_optional(&mut case_study.image_url, req.image_url);
    apply_optional(&mut case_study.published_at, req.published_at);
    Ok(case_study)
}

pub fn apply_case_study_update(
    case_study: &mut CaseStudy,
    req: UpdateCaseStudyPayload,
    now: &str,
) -> ContentResult<()> {
    validate_published_at(req.published_at.as_deref()).map_err(ContentError::Validation)?;
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ContentError::Validation("title cannot be empty".to_string()));
    }

    if let Some(title) = req.title {
        case_study.title = title.trim().to_string();
    }
    if let Some(slug) = req.slug {
        case_study.slug = resolve_slug(Some(&slug), &case_study.title, &case_study.case_study_id);
    }
    if let Some(sections) = req.sections {
        case_study.sections = sections;
    }
    if let Some(blocks) = req.content_blocks {
        case_study.content_blocks = optional_blocks(blocks);
    }
    if let Some(gallery) = req.gallery_images {
        case_study.gallery_images = clean_gallery(gallery);
    }
    apply_optional(&mut case_study.client, req.client);
    apply_optional(&mut case_study.category, req.category);
    apply_optional(&mut case_study.image_url, req.image_url);
    apply_optional(&mut case_study.published_at, req.published_at);
    case_study.updated_at = Some(now.to_string());
    Ok(())
}

/// No blocks means no block body
fn optional_blocks(blocks: Vec<ContentBlock>) -> Option<BlockSequence> {
    BlockSequence::try_from(blocks).ok()
}

fn clean_gallery(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

pub fn published_case_studies(
    mut case_studies: Vec<CaseStudy>,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<CaseStudy> {
    case_studies.retain(|c| is_published(c.published_at.as_deref(), now));
    sort_newest_published_first(&mut case_studies, |c: &CaseStudy| c.published_at.as_deref());
    case_studies
}

pub fn case_study_view(case_study: &CaseStudy) -> CaseStudyView {
    CaseStudyView {
        summary: CaseStudySummary::from(case_study),
        sections: case_study.sections.render(),
        body_html: case_study
            .content_blocks
            .as_ref()
            .map(|blocks| render_blocks(blocks, ContentFamily::CaseStudy)),
        gallery_images: case_study.gallery_images.clone(),
    }
}

async fn save_case_study(
    client: &DynamoClient,
    table_name: &str,
    case_study: &CaseStudy,
) -> ContentResult<()> {
    let item = case_study_to_item(case_study)?;
    store::put_item(client, table_name, item).await
}

async fn load_case_study(
    client: &DynamoClient,
    table_name: &str,
    case_study_id: &str,
) -> ContentResult<CaseStudy> {
    match store::get_item(client, table_name, CASE_STUDY_PK, case_study_sk(case_study_id)).await? {
        Some(item) => case_study_from_item(&item),
        None => Err(ContentError::NotFound("Case study".to_string())),
    }
}

async fn load_case_studies(client: &DynamoClient, table_name: &str) -> ContentResult<Vec<CaseStudy>> {
    let items = store::query_prefix(client, table_name, CASE_STUDY_PK, CASE_STUDY_SK_PREFIX).await?;

    let mut case_studies = Vec::with_capacity(items.len());
    for item in &items {
        match case_study_from_item(item) {
            Ok(case_study) => case_studies.push(case_study),
            Err(e) => tracing::error!("Skipping unreadable case study item: {}", e),
        }
    }

    case_studies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(case_studies)
}

fn slug_taken(case_studies: &[CaseStudy], slug: &str, except_id: Option<&str>) -> bool {
    case_studies
        .iter()
        .any(|c| c.slug == slug && Some(c.case_study_id.as_str()) != except_id)
}

fn slug_conflict(slug: &str) -> Result<Response<Body>, Error> {
    responses::error(
        StatusCode::CONFLICT,
        &format!("Slug '{}' is already used by another case study", slug),
    )
}

/// Create a new case study:
/// PK = "CASE_STUDY"
/// SK = "CASE_STUDY#{case_study_id}"
pub async fn create_case_study(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateCaseStudyPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return responses::bad_payload(e),
    };

    let case_study_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let case_study = match new_case_study(req, case_study_id, &now) {
        Ok(case_study) => case_study,
        Err(e) => return responses::content_error(e),
    };

    let existing = match load_case_studies(client, table_name).await {
        Ok(existing) => existing,
        Err(e) => return responses::content_error(e),
    };
    if slug_taken(&existing, &case_study.slug, None) {
        return slug_conflict(&case_study.slug);
    }

    if let Err(e) = save_case_study(client, table_name, &case_study).await {
        return responses::content_error(e);
    }
    tracing::info!(
        "📝 Created case study {} ({})",
        case_study.case_study_id,
        case_study.slug
    );

    responses::json(StatusCode::CREATED, &case_study)
}

pub async fn get_case_study(
    client: &DynamoClient,
    table_name: &str,
    case_study_id: &str,
) -> Result<Response<Body>, Error> {
    match load_case_study(client, table_name, case_study_id).await {
        Ok(case_study) => responses::json(StatusCode::OK, &case_study),
        Err(e) => responses::content_error(e),
    }
}

pub async fn list_case_studies(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, Error> {
    match load_case_studies(client, table_name).await {
        Ok(case_studies) => responses::json(StatusCode::OK, &case_studies),
        Err(e) => responses::content_error(e),
    }
}

pub async fn update_case_study(
    client: &DynamoClient,
    table_name: &str,
    case_study_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateCaseStudyPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return responses::bad_payload(e),
    };

    let mut case_study = match load_case_study(client, table_name, case_study_id).await {
        Ok(case_study) => case_study,
        Err(e) => return responses::content_error(e),
    };

    let slug_changing = req.slug.is_some();
    let now = chrono::Utc::now().to_rfc3339();
    if let Err(e) = apply_case_study_update(&mut case_study, req, &now) {
        return responses::content_error(e);
    }

    if slug_changing {
        let existing = match load_case_studies(client, table_name).await {
            Ok(existing) => existing,
            Err(e) => return responses::content_error(e),
        };
        if slug_taken(&existing, &case_study.slug, Some(case_study_id)) {
            return slug_conflict(&case_study.slug);
        }
    }

    if let Err(e) = save_case_study(client, table_name, &case_study).await {
        return responses::content_error(e);
    }
    tracing::info!("📝 Updated case study {}", case_study.case_study_id);

    responses::json(StatusCode::OK, &case_study)
}

pub async fn delete_case_study(
    client: &DynamoClient,
    table_name: &str,
    case_study_id: &str,
) -> Result<Response<Body>, Error> {
    if let Err(e) = store::delete_item(client, table_name, CASE_STUDY_PK, case_study_sk(case_study_id)).await {
        return responses::content_error(e);
    }

    tracing::info!("🗑️ Deleted case study {}", case_study_id);
    responses::no_content()
}

pub async fn list_published_case_studies(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, Error> {
    let case_studies = match load_case_studies(client, table_name).await {
        Ok(case_studies) => case_studies,
        Err(e) => return responses::content_error(e),
    };

    let summaries: Vec<CaseStudySummary> = published_case_studies(case_studies, chrono::Utc::now())
        .iter()
        .map(CaseStudySummary::from)
        .collect();
    responses::json(StatusCode::OK, &summaries)
}

pub async fn get_published_case_study(
    client: &DynamoClient,
    table_name: &str,
    slug: &str,
) -> Result<Response<Body>, Error> {
    let case_studies = match load_case_studies(client, table_name).await {
        Ok(case_studies) => case_studies,
        Err(e) => return responses::content_error(e),
    };

    match published_case_studies(case_studies, chrono::Utc::now())
        .iter()
        .find(|c| c.slug == slug)
    {
        Some(case_study) => responses::json(StatusCode::OK, &case_study_view(case_study)),
        None => responses::error(StatusCode::NOT_FOUND, "Case study not found"),
    }
}
