//! Scenarios and checks shared by the role suites.

use cadastre_application::{ScenarioContext, ScenarioError, ScenarioResult};
use cadastre_domain::cadastre::{
    self, CADASTRE_PATH, CadastreAction, CadastreDocument, CadastrePage, CadastreQuery,
    ScreenshotMeta,
};
use cadastre_domain::{
    ApiResponse, Assertion, AuthScheme, HttpMethod, JsonKind, Query, RequestBody, Resource,
    StatusExpectation,
};
use cadastre_infrastructure::fixtures;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// An item ID no deployment assigns.
pub const UNKNOWN_ID: &str = "999999999";

/// A well-formed bearer token no deployment issues.
pub const FORGED_TOKEN: &str = "invalid_token_12345";

/// Region used by the region filter scenarios.
pub const REGION_SOATO: &str = "1726";

/// Statuses the workflow answers with when a mutation is not allowed for
/// the item's current state or the caller's role.
pub const WORKFLOW_REJECTIONS: &[u16] = &[400, 403, 404, 409, 422];

/// Statuses that refuse a malformed payload, including workflow refusals
/// that may be checked before the payload.
pub const PAYLOAD_REJECTIONS: &[u16] = &[400, 403, 404, 409, 422, 500];

/// First item of the collection and its ID.
///
/// # Errors
///
/// Skips when the collection is empty.
pub async fn sample_item(ctx: &ScenarioContext) -> ScenarioResult<(Resource, String)> {
    sample_item_in(ctx, CadastreQuery::new()).await
}

/// First item matching `query` and its ID.
///
/// # Errors
///
/// Skips when nothing matches; fails when the item has no ID.
pub async fn sample_item_in(
    ctx: &ScenarioContext,
    query: CadastreQuery,
) -> ScenarioResult<(Resource, String)> {
    let item = ctx.sample(CADASTRE_PATH, &query.to_query()).await?;
    with_id(item)
}

fn with_id(item: Resource) -> ScenarioResult<(Resource, String)> {
    let id = item
        .id()
        .ok_or_else(|| ScenarioError::fail("sample item has no id"))?;
    Ok((item, id))
}

/// Reads a list response.
///
/// # Errors
///
/// Fails when the body lacks `data` or a complete `meta`.
pub fn page(ctx: &ScenarioContext, response: &ApiResponse) -> ScenarioResult<CadastrePage> {
    let body = ctx.json(response)?;
    CadastrePage::from_json(&body)
        .ok_or_else(|| ScenarioError::fail("list response lacks data or paging meta"))
}

/// Lists items; when `query` names a page, the reported page must match.
///
/// # Errors
///
/// Fails unless the list answers 200 with `data` and `meta`.
pub async fn list(ctx: ScenarioContext, query: CadastreQuery) -> ScenarioResult {
    let response = ctx
        .client()
        .get(CADASTRE_PATH, Some(&query.to_query()))
        .await?;
    ctx.expect(
        &response,
        &[
            Assertion::status(200),
            Assertion::field_kind("data", JsonKind::Array),
            Assertion::field_kind("meta", JsonKind::Object),
        ],
    )
    .await?;
    let page = page(&ctx, &response)?;
    if let Some(expected) = query.page {
        ScenarioContext::ensure(
            page.meta.page == expected,
            format!("asked for page {expected}, got {}", page.meta.page),
        )?;
    }
    info!(
        scenario = ctx.name(),
        total = page.meta.total,
        returned = page.items.len(),
        "listed"
    );
    Ok(())
}

/// Walks the first `pages` pages.
///
/// # Errors
///
/// Fails on the first page that does not report its own number.
pub async fn walk_pages(ctx: ScenarioContext, pages: i64, page_size: i64) -> ScenarioResult {
    for number in 1..=pages {
        let query = CadastreQuery::new().page(number).page_size(page_size);
        list(ctx.clone(), query).await?;
    }
    Ok(())
}

/// `GET path` must answer with a status in `expected`.
///
/// # Errors
///
/// Fails when the status is not expected.
pub async fn expect_get(
    ctx: ScenarioContext,
    path: String,
    query: Option<Query>,
    expected: StatusExpectation,
) -> ScenarioResult {
    let response = ctx.client().get(&path, query.as_ref()).await?;
    ctx.expect(&response, &[Assertion::status_matches(expected)])
        .await?;
    Ok(())
}

/// Fetches the sample item by ID and checks the ID round-trips.
///
/// # Errors
///
/// Skips without a sample; fails unless the item answers 200 with its ID.
pub async fn get_by_id(ctx: ScenarioContext) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let response = ctx.client().get(&cadastre::item_path(&id), None).await?;
    ctx.expect(
        &response,
        &[Assertion::status(200), Assertion::field_equals("id", Value::String(id))],
    )
    .await?;
    Ok(())
}

/// Fetches the sample item by cadastre number.
///
/// # Errors
///
/// Skips when the sample carries no cadastre number.
pub async fn get_by_cadastre_number(ctx: ScenarioContext) -> ScenarioResult {
    let (item, _) = sample_item(&ctx).await?;
    let number = item
        .field_string("cadastre_id")
        .ok_or_else(|| ScenarioError::skip("sample item has no cadastre_id"))?;
    let response = ctx
        .client()
        .get(&cadastre::cadastre_number_path(&number), None)
        .await?;
    ctx.expect(
        &response,
        &[
            Assertion::status(200),
            Assertion::field_equals("cadastre_id", Value::String(number)),
        ],
    )
    .await?;
    Ok(())
}

/// A request without `Authorization` must be answered with 401.
///
/// # Errors
///
/// Fails on any other status.
pub async fn without_token(ctx: ScenarioContext) -> ScenarioResult {
    let response = ctx
        .client()
        .request_unauthenticated(HttpMethod::Get, CADASTRE_PATH, RequestBody::None)
        .await?;
    ctx.expect(&response, &[Assertion::status(401)]).await?;
    Ok(())
}

/// A forged bearer token must be refused with a status in `expected`.
///
/// # Errors
///
/// Fails on any other status.
pub async fn forged_token(ctx: ScenarioContext, expected: StatusExpectation) -> ScenarioResult {
    let response = ctx
        .client()
        .request_with_authorization(
            HttpMethod::Get,
            CADASTRE_PATH,
            &AuthScheme::bearer(FORGED_TOKEN),
        )
        .await?;
    ctx.expect(&response, &[Assertion::status_matches(expected)])
        .await?;
    Ok(())
}

/// The default list page must arrive within `max_ms`.
///
/// # Errors
///
/// Fails when the list is slow or not 200.
pub async fn list_performance(ctx: ScenarioContext, max_ms: u64) -> ScenarioResult {
    let response = ctx.client().get(CADASTRE_PATH, None).await?;
    ctx.expect(&response, &[Assertion::status(200), Assertion::within_ms(max_ms)])
        .await?;
    Ok(())
}

/// The sample item must arrive within `max_ms`.
///
/// # Errors
///
/// Skips without a sample; fails when the item is slow or not 200.
pub async fn item_performance(ctx: ScenarioContext, max_ms: u64) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let response = ctx.client().get(&cadastre::item_path(&id), None).await?;
    ctx.expect(&response, &[Assertion::status(200), Assertion::within_ms(max_ms)])
        .await?;
    Ok(())
}

/// Checks the answer to a workflow-gated mutation.
///
/// A 200 must satisfy `on_success`; a 202 is accepted as is. A refusal in
/// [`WORKFLOW_REJECTIONS`] also passes, since whether the mutation is
/// allowed depends on the item's state on a shared deployment.
///
/// # Errors
///
/// Fails on any other status, or when a 200 body misses a check.
pub async fn expect_mutation(
    ctx: &ScenarioContext,
    response: &ApiResponse,
    on_success: &[Assertion],
) -> ScenarioResult {
    match response.status {
        200 => {
            ctx.expect(response, on_success).await?;
        }
        202 => ctx.record(response).await,
        status => {
            ctx.expect(response, &[Assertion::status_in(WORKFLOW_REJECTIONS)])
                .await?;
            info!(scenario = ctx.name(), status, "mutation refused by workflow");
        }
    }
    Ok(())
}

/// Patches `action` on the sample item and checks it with [`expect_mutation`].
///
/// # Errors
///
/// Skips without a sample; otherwise see [`expect_mutation`].
pub async fn mutate<T: Serialize + Sync>(
    ctx: ScenarioContext,
    action: CadastreAction,
    payload: T,
    on_success: Vec<Assertion>,
) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let response = ctx.client().patch(&action.path(&id), &payload).await?;
    expect_mutation(&ctx, &response, &on_success).await
}

/// Patches `action` on the sample item; the status must be in `expected`.
///
/// # Errors
///
/// Skips without a sample; fails on an unexpected status.
pub async fn patch_expecting<T: Serialize + Sync>(
    ctx: ScenarioContext,
    action: CadastreAction,
    payload: T,
    expected: &[u16],
) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let response = ctx.client().patch(&action.path(&id), &payload).await?;
    ctx.expect(&response, &[Assertion::status_in(expected)]).await?;
    Ok(())
}

/// Sends unparsable JSON to `action` on the sample item.
///
/// # Errors
///
/// Skips without a sample; fails unless the status is in `expected`.
pub async fn malformed_json(
    ctx: ScenarioContext,
    action: CadastreAction,
    content: &'static str,
    expected: &[u16],
) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let response = ctx
        .client()
        .send_raw(HttpMethod::Patch, &action.path(&id), content, "application/json")
        .await?;
    ctx.expect(&response, &[Assertion::status_in(expected)]).await?;
    Ok(())
}

/// Sets the building presence flag of the sample item.
///
/// # Errors
///
/// See [`mutate`].
pub async fn building_presence(ctx: ScenarioContext, present: bool) -> ScenarioResult {
    mutate(
        ctx,
        CadastreAction::BuildingPresence,
        serde_json::json!({ "building_presence": present }),
        vec![Assertion::field_equals("building_presence", Value::Bool(present))],
    )
    .await
}

/// Uploads the built-in PNG as the sample item's screenshot.
///
/// # Errors
///
/// Skips without a sample; see [`expect_mutation`].
pub async fn upload_screenshot(ctx: ScenarioContext, meta: ScreenshotMeta) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let form = meta.to_form(Some(fixtures::png_part("screenshot")));
    let response = ctx
        .client()
        .post_form(&cadastre::screenshot_upload_path(&id), form)
        .await?;
    expect_mutation(
        &ctx,
        &response,
        &[
            Assertion::field_kind("screenshot", JsonKind::NonEmptyString),
            Assertion::field_equals("space_image_id", Value::String(meta.space_image_id)),
        ],
    )
    .await
}

/// Uploads screenshot metadata without the image.
///
/// # Errors
///
/// Skips without a sample; fails unless the upload is refused.
pub async fn upload_without_file(ctx: ScenarioContext, meta: ScreenshotMeta) -> ScenarioResult {
    let (_, id) = sample_item(&ctx).await?;
    let response = ctx
        .client()
        .post_form(&cadastre::screenshot_upload_path(&id), meta.to_form(None))
        .await?;
    ctx.expect(&response, &[Assertion::status_in(&[400, 500])])
        .await?;
    Ok(())
}

/// Downloads `document` from the first item of a page of 100 that has one.
///
/// # Errors
///
/// Skips when no item on the page carries the document; fails unless the
/// download is a non-empty 200 or a 404 for a dangling reference.
pub async fn download(ctx: ScenarioContext, document: CadastreDocument) -> ScenarioResult {
    let item = ctx
        .sample_with(CADASTRE_PATH, &Query::new(), document.presence_field())
        .await?;
    let (_, id) = with_id(item)?;
    let response = ctx.client().get(&document.path(&id), None).await?;
    ctx.expect(&response, &[Assertion::status_in(&[200, 404])])
        .await?;
    if response.status == 200 {
        ctx.expect(&response, &[Assertion::non_empty_body()]).await?;
        info!(
            scenario = ctx.name(),
            bytes = response.body_bytes.len(),
            content_type = response.get_header("content-type").map_or("", String::as_str),
            "downloaded"
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejection_sets() {
        assert!(!WORKFLOW_REJECTIONS.contains(&200));
        assert!(!WORKFLOW_REJECTIONS.contains(&500));
        assert!(PAYLOAD_REJECTIONS.contains(&500));
        assert_eq!(PAYLOAD_REJECTIONS.len(), WORKFLOW_REJECTIONS.len() + 1);
    }

    #[test]
    fn test_with_id_requires_an_id() {
        let (_, id) = with_id(Resource::new(serde_json::json!({"ID": 7}))).unwrap();
        assert_eq!(id, "7");
        let err = with_id(Resource::new(serde_json::json!({"status": "edit"}))).unwrap_err();
        assert!(!err.is_skip());
    }
}
