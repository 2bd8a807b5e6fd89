//! Import pipeline: validate, transform and stage spreadsheet records.
//!
//! Each record passes through, in order: per-field emptiness checks
//! (non-fatal, every problem is reported), date parsing and a NIK
//! uniqueness check (either aborts the record), then construction of
//! the resident and its four child records through the static field
//! mapping, staged inside a per-record savepoint of one batch
//! transaction.
//!
//! The batch is all-or-nothing: any collected error, field- or
//! record-level, rolls the whole transaction back and the report counts
//! zero imported records. Only a fully clean file commits.

use sqlx::{Acquire, PgPool};
use tracing::{debug, info, warn};

use crate::db;
use crate::error::ImportResult;
use crate::importer::sheet::SheetRow;
use crate::importer::{cell_date, cell_list, cell_score, cell_text, FIELDS};
use crate::models::{
    NewDailyLiving, NewKesehatan, NewKesejahteraan, NewLansia, NewPendamping,
};

/// How many error messages the upload report carries.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// Result of one import batch.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Records that passed validation and staged cleanly.
    pub staged: usize,
    /// Records committed. Zero whenever any error occurred.
    pub committed: usize,
    /// Every collected error message, in encounter order.
    pub errors: Vec<String>,
}

impl ImportOutcome {
    /// The batch verdict: staged records survive into `committed` only
    /// when the error list is empty.
    pub fn from_batch(staged: usize, errors: Vec<String>) -> Self {
        let committed = if errors.is_empty() { staged } else { 0 };
        Self {
            staged,
            committed,
            errors,
        }
    }

    /// Human-readable summary line for the upload report. Counts the
    /// staged records, so a vetoed batch still reports how many rows
    /// were clean.
    pub fn message(&self) -> String {
        let mut msg = format!("Successfully imported {} records", self.staged);
        if !self.errors.is_empty() {
            msg.push_str(&format!(", {} errors occurred", self.errors.len()));
        }
        msg
    }

    /// At most the first [`MAX_REPORTED_ERRORS`] messages.
    pub fn reported_errors(&self) -> &[String] {
        &self.errors[..self.errors.len().min(MAX_REPORTED_ERRORS)]
    }
}

/// Run the import batch over transformed sheet records.
///
/// Uniqueness is checked against *committed* residents only: two records
/// of the same batch carrying the same NIK both pass this check, and the
/// second fails inside its savepoint on the unique constraint instead.
pub async fn import_rows(pool: &PgPool, rows: &[SheetRow]) -> ImportResult<ImportOutcome> {
    let mut errors: Vec<String> = Vec::new();
    let mut staged = 0usize;

    let mut txn = pool.begin().await?;

    for row in rows {
        // 1. Emptiness: report every blank field, keep going.
        for def in &FIELDS {
            if def.kind.is_empty(row.cell(def.name)) {
                errors.push(format!(
                    "Data {} Kolom {}: Data Kosong",
                    def.label, row.row
                ));
            }
        }

        // 2. Dates: a malformed date aborts this record.
        let tanggal_lahir = match cell_date(row.cell("tanggal_lahir")) {
            Ok(d) => d,
            Err(e) => {
                errors.push(format!("Kolom {}: {}", row.row, e));
                continue;
            }
        };
        let tanggal_lahir_pendamping = match cell_date(row.cell("tanggal_lahir_pendamping")) {
            Ok(d) => d,
            Err(e) => {
                errors.push(format!("Kolom {}: {}", row.row, e));
                continue;
            }
        };

        // 3. Uniqueness against committed residents (pool, not the
        //    batch transaction).
        let nik = cell_text(row.cell("nik"));
        if let Some(ref nik) = nik {
            if db::nik_exists(pool, nik).await? {
                errors.push(format!("Kolom {}: NIK {} sudah terdaftar", row.row, nik));
                continue;
            }
        }

        // 4./5. Build the five records through the static mapping.
        let lansia = lansia_from_row(row, nik, tanggal_lahir);
        let kesehatan = kesehatan_from_row(row);
        let kesejahteraan = kesejahteraan_from_row(row);
        let pendamping = pendamping_from_row(row, tanggal_lahir_pendamping);
        let daily_living = daily_living_from_row(row);

        // 6. Stage inside a savepoint so one bad record cannot poison
        //    the batch transaction.
        let savepoint = txn.begin().await?;
        match stage(savepoint, &lansia, &kesehatan, &kesejahteraan, &pendamping, &daily_living)
            .await
        {
            Ok(()) => staged += 1,
            Err(e) => {
                debug!(row = row.row, error = %e, "record staging failed");
                errors.push(format!("Kolom {}: {}", row.row, e));
            }
        }
    }

    let outcome = ImportOutcome::from_batch(staged, errors);
    if outcome.errors.is_empty() {
        txn.commit().await?;
        info!(committed = outcome.committed, "import batch committed");
    } else {
        txn.rollback().await?;
        warn!(
            staged = outcome.staged,
            error_count = outcome.errors.len(),
            "import batch discarded"
        );
    }
    Ok(outcome)
}

/// Insert one resident and its children; commit the savepoint on
/// success, roll it back on the first failure.
async fn stage(
    mut savepoint: sqlx::Transaction<'_, sqlx::Postgres>,
    lansia: &NewLansia,
    kesehatan: &NewKesehatan,
    kesejahteraan: &NewKesejahteraan,
    pendamping: &NewPendamping,
    daily_living: &NewDailyLiving,
) -> sqlx::Result<()> {
    let result = async {
        let id = db::insert_lansia(&mut *savepoint, lansia).await?;
        db::upsert_kesehatan(&mut *savepoint, id, kesehatan).await?;
        db::upsert_kesejahteraan(&mut *savepoint, id, kesejahteraan).await?;
        db::upsert_pendamping(&mut *savepoint, id, pendamping).await?;
        db::upsert_daily_living(&mut *savepoint, id, daily_living).await?;
        sqlx::Result::Ok(())
    }
    .await;

    match result {
        Ok(()) => savepoint.commit().await,
        Err(e) => {
            savepoint.rollback().await?;
            Err(e)
        }
    }
}

// =============================================================================
// Static field mapping
// =============================================================================
//
// Each record type names the template fields it consumes; a renamed or
// dropped field shows up here instead of silently vanishing.

fn lansia_from_row(
    row: &SheetRow,
    nik: Option<String>,
    tanggal_lahir: Option<chrono::NaiveDate>,
) -> NewLansia {
    let t = |name: &str| cell_text(row.cell(name));
    NewLansia {
        nama_lengkap: t("nama_lengkap"),
        nik,
        jenis_kelamin: t("jenis_kelamin"),
        tanggal_lahir,
        alamat_lengkap: t("alamat_lengkap"),
        koordinat: t("koordinat"),
        rt: t("rt"),
        rw: t("rw"),
        status_perkawinan: t("status_perkawinan"),
        agama: t("agama"),
        pendidikan_terakhir: t("pendidikan_terakhir"),
        pekerjaan_terakhir: t("pekerjaan_terakhir"),
        sumber_penghasilan: t("sumber_penghasilan"),
    }
}

fn kesehatan_from_row(row: &SheetRow) -> NewKesehatan {
    let t = |name: &str| cell_text(row.cell(name));
    NewKesehatan {
        kondisi_kesehatan_umum: t("kondisi_kesehatan_umum"),
        riwayat_penyakit_kronis: cell_list(row.cell("riwayat_penyakit_kronis")),
        penggunaan_obat_rutin: t("penggunaan_obat_rutin"),
        alat_bantu: cell_list(row.cell("alat_bantu")),
        aktivitas_fisik: t("aktivitas_fisik"),
        status_gizi: t("status_gizi"),
        riwayat_imunisasi: t("riwayat_imunisasi"),
    }
}

fn kesejahteraan_from_row(row: &SheetRow) -> NewKesejahteraan {
    let t = |name: &str| cell_text(row.cell(name));
    NewKesejahteraan {
        dukungan_keluarga: t("dukungan_keluarga"),
        kondisi_rumah: t("kondisi_rumah"),
        kebutuhan_mendesak: cell_list(row.cell("kebutuhan_mendesak")),
        hobi_minat: t("hobi_minat"),
        kondisi_psikologis: t("kondisi_psikologis"),
    }
}

fn pendamping_from_row(
    row: &SheetRow,
    tanggal_lahir_pendamping: Option<chrono::NaiveDate>,
) -> NewPendamping {
    let t = |name: &str| cell_text(row.cell(name));
    NewPendamping {
        nama_pendamping: t("nama_pendamping"),
        hubungan_dengan_lansia: t("hubungan_dengan_lansia"),
        tanggal_lahir_pendamping,
        pendidikan_pendamping: t("pendidikan_pendamping"),
        ketersediaan_waktu: t("ketersediaan_waktu"),
        partisipasi_program_bkl: t("partisipasi_program_bkl"),
        riwayat_partisipasi_bkl: t("riwayat_partisipasi_bkl"),
        keterlibatan_data: t("keterlibatan_data"),
    }
}

fn daily_living_from_row(row: &SheetRow) -> NewDailyLiving {
    let s = |name: &str| cell_score(row.cell(name));
    NewDailyLiving {
        bab: s("bab"),
        bak: s("bak"),
        membersihkan_diri: s("membersihkan_diri"),
        toilet: s("toilet"),
        makan: s("makan"),
        pindah_tempat: s("pindah_tempat"),
        mobilitas: s("mobilitas"),
        berpakaian: s("berpakaian"),
        naik_turun_tangga: s("naik_turun_tangga"),
        mandi: s("mandi"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;
    use std::collections::HashMap;

    fn row_with(cells: &[(&'static str, Data)]) -> SheetRow {
        let mut fields = HashMap::new();
        for (name, cell) in cells {
            fields.insert(*name, cell.clone());
        }
        SheetRow { row: 2, fields }
    }

    #[test]
    fn test_urgent_needs_split_to_list() {
        let row = row_with(&[(
            "kebutuhan_mendesak",
            Data::String("Pangan,Obat-obatan".into()),
        )]);
        let record = kesejahteraan_from_row(&row);
        assert_eq!(
            record.kebutuhan_mendesak,
            Some(vec!["Pangan".to_string(), "Obat-obatan".to_string()])
        );
    }

    #[test]
    fn test_single_value_becomes_one_element_list() {
        let row = row_with(&[("kebutuhan_mendesak", Data::String("Pangan".into()))]);
        let record = kesejahteraan_from_row(&row);
        assert_eq!(record.kebutuhan_mendesak, Some(vec!["Pangan".to_string()]));
    }

    #[test]
    fn test_health_lists_split_but_immunization_stays_text() {
        let row = row_with(&[
            (
                "riwayat_penyakit_kronis",
                Data::String("Diabetes,Hipertensi".into()),
            ),
            ("alat_bantu", Data::String("Tongkat".into())),
            (
                "riwayat_imunisasi",
                Data::String("Covid 2021, booster 2022".into()),
            ),
        ]);
        let record = kesehatan_from_row(&row);
        assert_eq!(
            record.riwayat_penyakit_kronis,
            Some(vec!["Diabetes".to_string(), "Hipertensi".to_string()])
        );
        assert_eq!(record.alat_bantu, Some(vec!["Tongkat".to_string()]));
        assert_eq!(
            record.riwayat_imunisasi,
            Some("Covid 2021, booster 2022".to_string())
        );
    }

    #[test]
    fn test_adl_scores_mapped_total_recomputed() {
        let row = row_with(&[
            ("bab", Data::Int(1)),
            ("bak", Data::Float(1.0)),
            ("membersihkan_diri", Data::String("1".into())),
            ("toilet", Data::Int(1)),
            ("makan", Data::Int(1)),
            ("pindah_tempat", Data::Int(1)),
            ("mobilitas", Data::Int(1)),
            ("berpakaian", Data::Int(1)),
            ("naik_turun_tangga", Data::Int(1)),
        ]);
        let record = daily_living_from_row(&row);
        assert_eq!(record.total(), 9);
        assert_eq!(record.mandi, None);
    }

    #[test]
    fn test_unmatched_fields_ignored_and_blanks_stay_unset() {
        let row = row_with(&[("nama_lengkap", Data::String("Siti".into()))]);
        let record = lansia_from_row(&row, None, None);
        assert_eq!(record.nama_lengkap, Some("Siti".to_string()));
        assert_eq!(record.alamat_lengkap, None);
        assert_eq!(record.rw, None);
    }

    #[test]
    fn test_clean_batch_commits_every_staged_record() {
        let outcome = ImportOutcome::from_batch(4, vec![]);
        assert_eq!(outcome.committed, 4);
        assert_eq!(outcome.staged, 4);
    }

    #[test]
    fn test_single_error_vetoes_whole_batch() {
        // One bad record keeps every other staged record out of the
        // database, however many were clean.
        let outcome = ImportOutcome::from_batch(99, vec!["Kolom 7: Data Kosong".into()]);
        assert_eq!(outcome.committed, 0);
        assert_eq!(outcome.staged, 99);
    }

    #[test]
    fn test_field_errors_alone_veto_the_batch() {
        // Field-level emptiness reports never block staging, but they
        // still count as errors for the batch verdict.
        let errors = vec![
            "Data Alamat Lengkap Kolom 2: Data Kosong".to_string(),
            "Data RT Kolom 3: Data Kosong".to_string(),
        ];
        let outcome = ImportOutcome::from_batch(2, errors);
        assert_eq!(outcome.committed, 0);
        assert_eq!(outcome.errors.len(), 2);
    }

    #[test]
    fn test_outcome_message_counts() {
        let clean = ImportOutcome::from_batch(4, vec![]);
        assert_eq!(clean.message(), "Successfully imported 4 records");

        // A vetoed batch reports the pre-veto clean-row count in the
        // message while committing nothing.
        let dirty = ImportOutcome::from_batch(3, vec!["a".into(), "b".into()]);
        assert_eq!(
            dirty.message(),
            "Successfully imported 3 records, 2 errors occurred"
        );
        assert_eq!(dirty.committed, 0);
    }

    #[test]
    fn test_reported_errors_capped_at_ten() {
        let outcome =
            ImportOutcome::from_batch(0, (0..25).map(|i| format!("err {i}")).collect());
        assert_eq!(outcome.reported_errors().len(), MAX_REPORTED_ERRORS);
        assert_eq!(outcome.reported_errors()[0], "err 0");
        assert_eq!(outcome.errors.len(), 25);
    }
}
