//! Request and response types for the HTTP API.
//!
//! Every derived field in a response (age, age group, ADL category) is
//! computed against the request's reference date, which callers pass as
//! a `date=YYYY-MM-DD` query parameter. When absent, today is used.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    NewDailyLiving, NewKesehatan, NewKesejahteraan, NewLansia, NewPendamping, User,
};

// =============================================================================
// Reference date
// =============================================================================

/// The `date` query parameter shared by every read endpoint that
/// derives ages.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReferenceDate {
    pub date: Option<NaiveDate>,
}

impl ReferenceDate {
    /// The selected reference date, defaulting to today.
    pub fn or_today(self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user account, sent back on login and auth checks.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

// =============================================================================
// Resident listing
// =============================================================================

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

fn default_sort_by() -> String {
    "nama_lengkap".to_string()
}

fn default_sort_order() -> String {
    "asc".to_string()
}

/// Query parameters of `GET /api/lansia`.
#[derive(Debug, Deserialize)]
pub struct LansiaListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub rw: Option<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl LansiaListQuery {
    pub fn reference(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Clamped pagination window.
    pub fn window(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, 100);
        let page = self.page.max(1);
        (per_page, (page - 1) * per_page)
    }
}

/// One row of the resident list.
#[derive(Debug, Serialize)]
pub struct LansiaSummary {
    pub id: i32,
    pub nama_lengkap: String,
    pub nik: String,
    pub jenis_kelamin: Option<String>,
    pub usia: Option<i32>,
    pub rt: Option<String>,
    pub rw: Option<String>,
    pub kelompok_usia: Option<&'static str>,
    pub nilai_adl: Option<&'static str>,
    pub status_perkawinan: Option<String>,
    pub koordinat: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LansiaListResponse {
    pub data: Vec<LansiaSummary>,
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub per_page: i64,
}

// =============================================================================
// Resident mutation payloads
// =============================================================================

/// Flat creation payload: resident fields plus any child fields at the
/// top level, as entered on the registration form.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLansiaRequest {
    #[serde(flatten)]
    pub lansia: NewLansia,
    #[serde(flatten)]
    pub kesehatan: NewKesehatan,
    #[serde(flatten)]
    pub kesejahteraan: NewKesejahteraan,
    #[serde(flatten)]
    pub pendamping: NewPendamping,
    #[serde(flatten)]
    pub daily_living: NewDailyLiving,
}

/// Update payload: resident fields at the top level, child records
/// nested. Each present child record replaces the stored one wholesale.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLansiaRequest {
    #[serde(flatten)]
    pub lansia: NewLansia,
    #[serde(default)]
    pub kesehatan: NewKesehatan,
    #[serde(default)]
    pub kesejahteraan: NewKesejahteraan,
    #[serde(default)]
    pub keluarga: NewPendamping,
    #[serde(default)]
    pub daily_living: NewDailyLiving,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i32>,
}

// =============================================================================
// Upload
// =============================================================================

/// Import summary returned by `POST /api/upload-excel`.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub message: String,
    pub count: usize,
    pub errors: Vec<String>,
}

// =============================================================================
// Filters and map
// =============================================================================

#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub genders: Vec<String>,
    pub age_groups: Vec<&'static str>,
    pub rws: Vec<String>,
}

/// A point on the distribution map. Residents without coordinates get a
/// random point inside their RW polygon.
#[derive(Debug, Serialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let q: LansiaListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 10);
        assert_eq!(q.sort_by, "nama_lengkap");
        assert_eq!(q.sort_order, "asc");
        assert!(q.search.is_none());
    }

    #[test]
    fn test_window_clamps() {
        let q: LansiaListQuery =
            serde_json::from_str(r#"{"page": 0, "per_page": 5000}"#).unwrap();
        let (per_page, offset) = q.window();
        assert_eq!(per_page, 100);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_window_offset() {
        let q: LansiaListQuery =
            serde_json::from_str(r#"{"page": 3, "per_page": 10}"#).unwrap();
        assert_eq!(q.window(), (10, 20));
    }

    #[test]
    fn test_create_request_is_flat() {
        let req: CreateLansiaRequest = serde_json::from_str(
            r#"{
                "nama_lengkap": "Siti Aminah",
                "nik": "3273211234560001",
                "status_gizi": "Baik",
                "kondisi_rumah": "Layak Huni",
                "nama_pendamping": "Budi",
                "makan": 10
            }"#,
        )
        .unwrap();
        assert_eq!(req.lansia.nama_lengkap.as_deref(), Some("Siti Aminah"));
        assert_eq!(req.kesehatan.status_gizi.as_deref(), Some("Baik"));
        assert_eq!(req.kesejahteraan.kondisi_rumah.as_deref(), Some("Layak Huni"));
        assert_eq!(req.pendamping.nama_pendamping.as_deref(), Some("Budi"));
        assert_eq!(req.daily_living.makan, Some(10));
    }

    #[test]
    fn test_update_request_nested_children() {
        let req: UpdateLansiaRequest = serde_json::from_str(
            r#"{
                "nama_lengkap": "Siti Aminah",
                "nik": "3273211234560001",
                "kesehatan": {"status_gizi": "Kurang"},
                "daily_living": {"makan": 5, "mandi": 5}
            }"#,
        )
        .unwrap();
        assert_eq!(req.kesehatan.status_gizi.as_deref(), Some("Kurang"));
        assert_eq!(req.daily_living.total(), 10);
        assert!(req.keluarga.nama_pendamping.is_none());
    }
}
