//! Cadastre endpoints, queries and payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields;
use crate::request::{FormPart, MultipartForm, Query};
use crate::resource::Resource;

/// Cadastre collection path.
pub const CADASTRE_PATH: &str = "/cadastre";

/// Integration push path.
pub const INTEGRATION_PUSH_PATH: &str = "/cadastre/integration/push";

/// Filters and paging for `GET /cadastre`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CadastreQuery {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Items per page.
    pub page_size: Option<i64>,
    /// Workflow status filter.
    pub status: Option<String>,
    /// Region SOATO code filter.
    pub region_soato: Option<String>,
}

impl CadastreQuery {
    /// Empty query: server defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page.
    #[must_use]
    pub const fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the status filter.
    #[must_use]
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the region filter.
    #[must_use]
    pub fn region(mut self, region_soato: impl Into<String>) -> Self {
        self.region_soato = Some(region_soato.into());
        self
    }

    /// Renders the query parameters.
    #[must_use]
    pub fn to_query(&self) -> Query {
        Query::new()
            .param_opt("page", self.page)
            .param_opt("page_size", self.page_size)
            .param_opt("status", self.status.as_deref())
            .param_opt("region_soato", self.region_soato.as_deref())
    }
}

/// Paging metadata of a list response.
///
/// The service uses `pageSize` or `page_size`, and `totalPages` or
/// `total_pages`, depending on the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Current page.
    pub page: i64,
    /// Page size reported by the server.
    pub page_size: i64,
    /// Total number of items.
    pub total: i64,
    /// Total number of pages.
    pub total_pages: i64,
}

impl PageMeta {
    /// Reads the `meta` object; `None` if any of the four fields is missing.
    #[must_use]
    pub fn from_json(meta: &Value) -> Option<Self> {
        let int = |name: &str| fields::field(meta, name).and_then(Value::as_i64);
        Some(Self {
            page: int("page")?,
            page_size: int("page_size")?,
            total: int("total")?,
            total_pages: int("total_pages")?,
        })
    }
}

/// One page of `GET /cadastre`.
#[derive(Debug, Clone, PartialEq)]
pub struct CadastrePage {
    /// Items on this page.
    pub items: Vec<Resource>,
    /// Paging metadata.
    pub meta: PageMeta,
}

impl CadastrePage {
    /// Reads `{data: [...], meta: {...}}`.
    #[must_use]
    pub fn from_json(body: &Value) -> Option<Self> {
        let items = fields::field(body, "data")?
            .as_array()?
            .iter()
            .cloned()
            .map(Resource::new)
            .collect();
        let meta = PageMeta::from_json(fields::field(body, "meta")?)?;
        Some(Self { items, meta })
    }
}

/// Role-gated partial updates under `/cadastre/{id}/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadastreAction {
    /// Geometry correction.
    GeometryFix,
    /// Move into (or edit within) the `edit` status.
    Edit,
    /// Mark whether a building is present on the plot.
    BuildingPresence,
    /// Record a cadastre error.
    CadastreError,
    /// Send to moderation.
    IntoModeration,
    /// Verifier decision.
    Verification,
    /// Agency decision.
    AgencyVerification,
}

impl CadastreAction {
    /// Path segment of the action.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::GeometryFix => "geometry-fix",
            Self::Edit => "edit",
            Self::BuildingPresence => "building-presence",
            Self::CadastreError => "cadastre_error",
            Self::IntoModeration => "into_moderation",
            Self::Verification => "verification",
            Self::AgencyVerification => "agency_verification",
        }
    }

    /// Full path for the item `id`.
    #[must_use]
    pub fn path(self, id: &str) -> String {
        format!("{CADASTRE_PATH}/{id}/{}", self.segment())
    }
}

/// Binary attachments downloadable under `/cadastre/{id}/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadastreDocument {
    /// Satellite screenshot.
    Screenshot,
    /// Land plan PDF.
    LandPlan,
    /// Governor decree PDF.
    GovernorDecree,
}

impl CadastreDocument {
    /// Path segment of the download.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::LandPlan => "land_plan",
            Self::GovernorDecree => "governor_decree",
        }
    }

    /// Item field that is non-empty when the document exists.
    #[must_use]
    pub const fn presence_field(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::LandPlan => "land_plan",
            Self::GovernorDecree => "governor_decree",
        }
    }

    /// Full path for the item `id`.
    #[must_use]
    pub fn path(self, id: &str) -> String {
        format!("{CADASTRE_PATH}/{id}/{}", self.segment())
    }
}

/// Path of a single item by numeric ID.
#[must_use]
pub fn item_path(id: &str) -> String {
    format!("{CADASTRE_PATH}/{id}")
}

/// Path of a single item by cadastre number.
#[must_use]
pub fn cadastre_number_path(cadastre_id: &str) -> String {
    format!("{CADASTRE_PATH}/cadastre-id/{cadastre_id}")
}

/// Path of the screenshot upload for item `id`.
#[must_use]
pub fn screenshot_upload_path(id: &str) -> String {
    CadastreDocument::Screenshot.path(id)
}

/// A GeoJSON polygon with a single outer ring of `[lon, lat]` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPolygon {
    #[serde(rename = "type")]
    kind: String,
    /// Rings; the first is the outer boundary.
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl GeoJsonPolygon {
    /// Creates a polygon from an outer ring, closing it if needed.
    #[must_use]
    pub fn from_ring(mut ring: Vec<[f64; 2]>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self {
            kind: "Polygon".to_string(),
            coordinates: vec![ring],
        }
    }

    /// Axis-aligned square with its south-west corner at `(lon, lat)`.
    #[must_use]
    pub fn square(lon: f64, lat: f64, side: f64) -> Self {
        Self::from_ring(vec![
            [lon, lat],
            [lon + side, lat],
            [lon + side, lat + side],
            [lon, lat + side],
        ])
    }

    /// The polygon as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({"type": self.kind, "coordinates": self.coordinates})
    }

    /// The polygon as a JSON-encoded string, the form `fixed_geojson` takes.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// `PATCH geometry-fix|edit` body with a string-encoded polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryFix {
    /// Polygon encoded as a JSON string.
    pub fixed_geojson: String,
    /// Shift distance in metres.
    pub move_distance: f64,
}

impl GeometryFix {
    /// Creates the payload, encoding the polygon.
    #[must_use]
    pub fn new(polygon: &GeoJsonPolygon, move_distance: f64) -> Self {
        Self {
            fixed_geojson: polygon.to_json_string(),
            move_distance,
        }
    }
}

/// `PATCH geometry-fix` body with an inline polygon and an editor note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationEdit {
    /// New outline.
    pub location: GeoJsonPolygon,
    /// Free-text explanation of the change.
    pub edit_note: String,
}

/// `PATCH verification|agency_verification` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationDecision {
    /// Approve or reject.
    pub verified: bool,
    /// Optional reviewer comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// `PATCH cadastre_error` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CadastreErrorReport {
    /// Description of the problem.
    pub error_description: String,
    /// Error category.
    pub error_type: String,
}

/// Metadata sent with a screenshot upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotMeta {
    /// Identifier of the satellite image.
    pub space_image_id: String,
    /// Capture date, ISO date or RFC3339.
    pub space_image_date: String,
}

impl ScreenshotMeta {
    /// Metadata with a plain ISO date.
    #[must_use]
    pub fn on_date(space_image_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            space_image_id: space_image_id.into(),
            space_image_date: date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Metadata with an RFC3339 timestamp.
    #[must_use]
    pub fn at(space_image_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            space_image_id: space_image_id.into(),
            space_image_date: timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }

    /// Builds the multipart form; `image` is omitted to exercise validation.
    #[must_use]
    pub fn to_form(&self, image: Option<FormPart>) -> MultipartForm {
        let form = MultipartForm::new()
            .text("spaceImageId", self.space_image_id.clone())
            .text("spaceImageDate", self.space_image_date.clone());
        match image {
            Some(part) => form.part(part),
            None => form,
        }
    }
}

/// One owner entry of `mulk_egalari`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Owner name.
    pub mulk_egasi: String,
    /// Owner taxpayer number.
    pub mulk_egasi_stir: String,
}

impl Owner {
    /// Creates an owner entry.
    #[must_use]
    pub fn new(name: impl Into<String>, stir: impl Into<String>) -> Self {
        Self {
            mulk_egasi: name.into(),
            mulk_egasi_stir: stir.into(),
        }
    }
}

/// A record pushed by an external registry through the integration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationSubmission {
    /// Unique id of the registry unit.
    #[serde(rename = "uidSPUnit")]
    pub uid_sp_unit: String,
    /// Cadastral number.
    pub cadastral_number: String,
    /// Postal address.
    pub address: String,
    /// Land fund type code.
    pub land_fund_type_code: String,
    /// Land use type code.
    pub land_use_type_code: String,
    /// Kind of use.
    pub vid: String,
    /// Region SOATO.
    pub region_soato: String,
    /// District SOATO.
    pub district_soato: String,
    /// Neighborhood SOATO.
    pub neighborhood_soato: String,
    /// Legal basis id.
    pub law_accordance_id: String,
    /// Selection timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub selected_at: String,
    /// Deadline timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub step_deadline: String,
    /// Plot outline.
    pub location: GeoJsonPolygon,
    /// Owners.
    pub mulk_egalari: Vec<Owner>,
    /// Note explaining a re-upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reupload_note: Option<String>,
    /// Note explaining an edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_note: Option<String>,
}

impl IntegrationSubmission {
    /// Multipart field carrying the land plan PDF.
    pub const LAND_PLAN_FIELD: &'static str = "building_land_cad_plan";
    /// Multipart field carrying the governor decree PDF.
    pub const DECREE_FIELD: &'static str = "governor_decree";

    /// Builds the multipart form with both attachments.
    ///
    /// `location` and `mulk_egalari` are sent as JSON strings.
    #[must_use]
    pub fn to_form(&self, land_plan: Option<FormPart>, decree: Option<FormPart>) -> MultipartForm {
        let fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        let files = [land_plan, decree].into_iter().flatten().collect();
        MultipartForm::from_fields(&fields, files)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_query_rendering() {
        let query = CadastreQuery::new().status("geometry_fix").page_size(1).to_query();
        assert_eq!(query.pairs(), vec![("page_size", "1"), ("status", "geometry_fix")]);
        assert!(CadastreQuery::new().to_query().is_empty());
    }

    #[test]
    fn test_page_meta_either_spelling() {
        let camel = json!({"page": 1, "pageSize": 10, "total": 31, "totalPages": 4});
        let snake = json!({"page": 2, "page_size": 5, "total": 31, "total_pages": 7});

        assert_eq!(
            PageMeta::from_json(&camel),
            Some(PageMeta { page: 1, page_size: 10, total: 31, total_pages: 4 })
        );
        assert_eq!(PageMeta::from_json(&snake).map(|m| m.total_pages), Some(7));
        assert_eq!(PageMeta::from_json(&json!({"page": 1})), None);
    }

    #[test]
    fn test_page_parsing() {
        let body = json!({
            "data": [{"ID": 1, "Screenshot": ""}, {"ID": 2, "Screenshot": "s.png"}],
            "meta": {"page": 1, "pageSize": 2, "total": 2, "totalPages": 1}
        });
        let page = CadastrePage::from_json(&body).unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].id().as_deref(), Some("2"));
        assert!(!page.items[0].has(CadastreDocument::Screenshot.presence_field()));
        assert_eq!(page.meta.total_pages, 1);
    }

    #[test]
    fn test_action_paths() {
        assert_eq!(CadastreAction::GeometryFix.path("7"), "/cadastre/7/geometry-fix");
        assert_eq!(CadastreAction::CadastreError.path("7"), "/cadastre/7/cadastre_error");
        assert_eq!(CadastreDocument::GovernorDecree.path("7"), "/cadastre/7/governor_decree");
        assert_eq!(cadastre_number_path("17:26"), "/cadastre/cadastre-id/17:26");
    }

    #[test]
    fn test_polygon_is_closed() {
        let polygon = GeoJsonPolygon::square(69.0, 41.0, 0.5);
        let ring = &polygon.coordinates[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(polygon.to_json()["type"], json!("Polygon"));
    }

    #[test]
    fn test_geometry_fix_encodes_polygon_as_string() {
        let polygon = GeoJsonPolygon::square(69.0, 41.0, 1.0);
        let body = serde_json::to_value(GeometryFix::new(&polygon, 15.5)).unwrap();
        let encoded = body["fixed_geojson"].as_str().unwrap();
        let decoded: Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded, polygon.to_json());
        assert_eq!(body["move_distance"], json!(15.5));
    }

    #[test]
    fn test_verification_omits_missing_comment() {
        let body = serde_json::to_value(VerificationDecision { verified: true, comment: None }).unwrap();
        assert_eq!(body, json!({"verified": true}));
    }

    #[test]
    fn test_screenshot_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(ScreenshotMeta::on_date("IMG", date).space_image_date, "2024-12-01");

        let ts = DateTime::parse_from_rfc3339("2024-12-01T12:00:00Z").unwrap().with_timezone(&Utc);
        let meta = ScreenshotMeta::at("IMG", ts);
        assert_eq!(meta.space_image_date, "2024-12-01T12:00:00Z");

        let form = meta.to_form(None);
        assert_eq!(form.text_value("spaceImageId"), Some("IMG"));
        assert!(!form.has_files());
    }

    #[test]
    fn test_integration_form() {
        let submission = IntegrationSubmission {
            uid_sp_unit: "uid-1".to_string(),
            cadastral_number: "cad-1".to_string(),
            address: "test address".to_string(),
            land_fund_type_code: "10".to_string(),
            land_use_type_code: "20".to_string(),
            vid: "foo".to_string(),
            region_soato: "1726".to_string(),
            district_soato: "1726264".to_string(),
            neighborhood_soato: "1726264".to_string(),
            law_accordance_id: "1".to_string(),
            selected_at: "2024-03-06 12:00:00".to_string(),
            step_deadline: "2024-03-10 12:00:00".to_string(),
            location: GeoJsonPolygon::square(70.97, 40.74, 0.001),
            mulk_egalari: vec![Owner::new("A", "111")],
            reupload_note: None,
            edit_note: Some("fixed".to_string()),
        };

        let form = submission.to_form(
            Some(FormPart::File {
                name: IntegrationSubmission::LAND_PLAN_FIELD.to_string(),
                file_name: "land_plan.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                content: b"%PDF".to_vec(),
            }),
            None,
        );

        assert_eq!(form.text_value("uidSPUnit"), Some("uid-1"));
        assert_eq!(form.text_value("edit_note"), Some("fixed"));
        assert_eq!(form.text_value("reupload_note"), None);
        assert_eq!(
            form.text_value("mulk_egalari"),
            Some(r#"[{"mulk_egasi":"A","mulk_egasi_stir":"111"}]"#)
        );
        let location: Value = serde_json::from_str(form.text_value("location").unwrap()).unwrap();
        assert_eq!(location["type"], json!("Polygon"));
        assert!(form.has_files());
    }
}
