//! Domain models for the lansia registry.
//!
//! One [`Lansia`] (elderly resident) owns at most one of each child record:
//! [`Kesehatan`] (health), [`Kesejahteraan`] (social welfare),
//! [`Pendamping`] (accompanying family member) and [`DailyLiving`] (ADL
//! score sheet). Children are deleted with their resident (`ON DELETE
//! CASCADE` in the schema).
//!
//! Age and age group are never stored: they are derived from the birth
//! date against an explicit reference date so that every view of the data
//! is consistent with whatever "as of" date the caller selected.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// =============================================================================
// Age derivation
// =============================================================================

/// Age-group labels, in bucket order. Also served by `/api/filter-options`.
pub const AGE_GROUPS: [&str; 4] = [
    "Belum Lansia",
    "Lansia Muda",
    "Lansia Madya",
    "Lansia Tua",
];

/// Whole years between `birth` and `reference`, minus one when the
/// birthday has not yet occurred in the reference year.
pub fn usia(birth: NaiveDate, reference: NaiveDate) -> i32 {
    let mut years = reference.year() - birth.year();
    if (reference.month(), reference.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

/// Categorical age bucket for a derived age.
pub fn kelompok_usia(usia: i32) -> &'static str {
    match usia {
        i32::MIN..=59 => "Belum Lansia",
        60..=69 => "Lansia Muda",
        70..=79 => "Lansia Madya",
        _ => "Lansia Tua",
    }
}

// =============================================================================
// ADL scoring
// =============================================================================

/// Functional-independence category for a Barthel-style ADL total.
pub fn kategori_adl(total: i32) -> &'static str {
    match total {
        100.. => "Mandiri",
        91..=99 => "Ketergantungan Ringan",
        62..=90 => "Ketergantungan Sedang",
        21..=61 => "Ketergantungan Berat",
        _ => "Ketergantungan Total",
    }
}

// =============================================================================
// Persisted rows
// =============================================================================

/// A user account. The `role` string is either an elevated role name or
/// the RW the account is scoped to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// A registered elderly resident.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Lansia {
    pub id: i32,
    pub nama_lengkap: String,
    pub nik: String,
    pub jenis_kelamin: Option<String>,
    pub tanggal_lahir: Option<NaiveDate>,
    pub alamat_lengkap: Option<String>,
    pub koordinat: Option<String>,
    pub rt: Option<String>,
    pub rw: Option<String>,
    pub status_perkawinan: Option<String>,
    pub agama: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub pekerjaan_terakhir: Option<String>,
    pub sumber_penghasilan: Option<String>,
}

impl Lansia {
    /// Derived age against a reference date, if the birth date is known.
    pub fn usia(&self, reference: NaiveDate) -> Option<i32> {
        self.tanggal_lahir.map(|b| usia(b, reference))
    }

    /// Derived age group against a reference date.
    pub fn kelompok_usia(&self, reference: NaiveDate) -> Option<&'static str> {
        self.usia(reference).map(kelompok_usia)
    }
}

/// Health status snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Kesehatan {
    pub kondisi_kesehatan_umum: Option<String>,
    pub riwayat_penyakit_kronis: Option<Vec<String>>,
    pub penggunaan_obat_rutin: Option<String>,
    pub alat_bantu: Option<Vec<String>>,
    pub aktivitas_fisik: Option<String>,
    pub status_gizi: Option<String>,
    pub riwayat_imunisasi: Option<String>,
}

/// Social welfare snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Kesejahteraan {
    pub dukungan_keluarga: Option<String>,
    pub kondisi_rumah: Option<String>,
    pub kebutuhan_mendesak: Option<Vec<String>>,
    pub hobi_minat: Option<String>,
    pub kondisi_psikologis: Option<String>,
}

/// Accompanying family member.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pendamping {
    pub nama_pendamping: Option<String>,
    pub hubungan_dengan_lansia: Option<String>,
    pub tanggal_lahir_pendamping: Option<NaiveDate>,
    pub pendidikan_pendamping: Option<String>,
    pub ketersediaan_waktu: Option<String>,
    pub partisipasi_program_bkl: Option<String>,
    pub riwayat_partisipasi_bkl: Option<String>,
    pub keterlibatan_data: Option<String>,
}

impl Pendamping {
    pub fn usia(&self, reference: NaiveDate) -> Option<i32> {
        self.tanggal_lahir_pendamping.map(|b| usia(b, reference))
    }
}

/// Activities-of-daily-living score sheet.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyLiving {
    pub bab: Option<i32>,
    pub bak: Option<i32>,
    pub membersihkan_diri: Option<i32>,
    pub toilet: Option<i32>,
    pub makan: Option<i32>,
    pub pindah_tempat: Option<i32>,
    pub mobilitas: Option<i32>,
    pub berpakaian: Option<i32>,
    pub naik_turun_tangga: Option<i32>,
    pub mandi: Option<i32>,
    pub total: Option<i32>,
}

impl DailyLiving {
    /// Category label for the stored total.
    pub fn kategori(&self) -> Option<&'static str> {
        self.total.map(kategori_adl)
    }
}

// =============================================================================
// Insert payloads
// =============================================================================
//
// Statically declared field sets shared by direct creation, update and the
// spreadsheet import. The ADL total is always recomputed here; a total in
// the inbound payload is ignored.

/// New resident fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLansia {
    pub nama_lengkap: Option<String>,
    pub nik: Option<String>,
    pub jenis_kelamin: Option<String>,
    pub tanggal_lahir: Option<NaiveDate>,
    pub alamat_lengkap: Option<String>,
    pub koordinat: Option<String>,
    pub rt: Option<String>,
    pub rw: Option<String>,
    pub status_perkawinan: Option<String>,
    pub agama: Option<String>,
    pub pendidikan_terakhir: Option<String>,
    pub pekerjaan_terakhir: Option<String>,
    pub sumber_penghasilan: Option<String>,
}

/// New health record fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewKesehatan {
    pub kondisi_kesehatan_umum: Option<String>,
    pub riwayat_penyakit_kronis: Option<Vec<String>>,
    pub penggunaan_obat_rutin: Option<String>,
    pub alat_bantu: Option<Vec<String>>,
    pub aktivitas_fisik: Option<String>,
    pub status_gizi: Option<String>,
    pub riwayat_imunisasi: Option<String>,
}

/// New welfare record fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewKesejahteraan {
    pub dukungan_keluarga: Option<String>,
    pub kondisi_rumah: Option<String>,
    pub kebutuhan_mendesak: Option<Vec<String>>,
    pub hobi_minat: Option<String>,
    pub kondisi_psikologis: Option<String>,
}

/// New caregiver record fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPendamping {
    pub nama_pendamping: Option<String>,
    pub hubungan_dengan_lansia: Option<String>,
    pub tanggal_lahir_pendamping: Option<NaiveDate>,
    pub pendidikan_pendamping: Option<String>,
    pub ketersediaan_waktu: Option<String>,
    pub partisipasi_program_bkl: Option<String>,
    pub riwayat_partisipasi_bkl: Option<String>,
    pub keterlibatan_data: Option<String>,
}

/// New ADL score sheet. `total` is computed, never accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDailyLiving {
    pub bab: Option<i32>,
    pub bak: Option<i32>,
    pub membersihkan_diri: Option<i32>,
    pub toilet: Option<i32>,
    pub makan: Option<i32>,
    pub pindah_tempat: Option<i32>,
    pub mobilitas: Option<i32>,
    pub berpakaian: Option<i32>,
    pub naik_turun_tangga: Option<i32>,
    pub mandi: Option<i32>,
}

impl NewDailyLiving {
    /// Sum of every present sub-score.
    pub fn total(&self) -> i32 {
        [
            self.bab,
            self.bak,
            self.membersihkan_diri,
            self.toilet,
            self.makan,
            self.pindah_tempat,
            self.mobilitas,
            self.berpakaian,
            self.naik_turun_tangga,
            self.mandi,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_usia_before_birthday() {
        assert_eq!(usia(d(1960, 6, 15), d(2024, 6, 14)), 63);
    }

    #[test]
    fn test_usia_on_birthday() {
        assert_eq!(usia(d(1960, 6, 15), d(2024, 6, 15)), 64);
    }

    #[test]
    fn test_usia_after_birthday() {
        assert_eq!(usia(d(1960, 6, 15), d(2024, 12, 1)), 64);
    }

    #[test]
    fn test_usia_month_boundary() {
        // Same day number, earlier month
        assert_eq!(usia(d(1950, 3, 10), d(2020, 2, 10)), 69);
        assert_eq!(usia(d(1950, 3, 10), d(2020, 3, 10)), 70);
    }

    #[test]
    fn test_kelompok_usia_buckets() {
        assert_eq!(kelompok_usia(59), "Belum Lansia");
        assert_eq!(kelompok_usia(60), "Lansia Muda");
        assert_eq!(kelompok_usia(69), "Lansia Muda");
        assert_eq!(kelompok_usia(70), "Lansia Madya");
        assert_eq!(kelompok_usia(79), "Lansia Madya");
        assert_eq!(kelompok_usia(80), "Lansia Tua");
        assert_eq!(kelompok_usia(101), "Lansia Tua");
    }

    #[test]
    fn test_adl_total_nine_ones() {
        let adl = NewDailyLiving {
            bab: Some(1),
            bak: Some(1),
            membersihkan_diri: Some(1),
            toilet: Some(1),
            makan: Some(1),
            pindah_tempat: Some(1),
            mobilitas: Some(1),
            berpakaian: Some(1),
            naik_turun_tangga: Some(1),
            mandi: None,
        };
        assert_eq!(adl.total(), 9);
    }

    #[test]
    fn test_adl_total_ignores_missing() {
        let adl = NewDailyLiving {
            makan: Some(10),
            mobilitas: Some(5),
            ..Default::default()
        };
        assert_eq!(adl.total(), 15);
    }

    #[test]
    fn test_kategori_adl_bands() {
        assert_eq!(kategori_adl(100), "Mandiri");
        assert_eq!(kategori_adl(99), "Ketergantungan Ringan");
        assert_eq!(kategori_adl(91), "Ketergantungan Ringan");
        assert_eq!(kategori_adl(90), "Ketergantungan Sedang");
        assert_eq!(kategori_adl(62), "Ketergantungan Sedang");
        assert_eq!(kategori_adl(61), "Ketergantungan Berat");
        assert_eq!(kategori_adl(21), "Ketergantungan Berat");
        assert_eq!(kategori_adl(20), "Ketergantungan Total");
        assert_eq!(kategori_adl(0), "Ketergantungan Total");
    }
}
