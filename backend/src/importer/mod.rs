//! Spreadsheet bulk import.
//!
//! Two stages:
//!
//! - [`sheet`] - turns the uploaded workbook (transposed layout: field
//!   rows, record columns) into per-record field maps with original
//!   row numbers for error reporting.
//! - [`pipeline`] - validates and stages each record inside one batch
//!   transaction, committing only when every record is clean.
//!
//! The field table below is the single source of truth for the import:
//! field order inside the template, the human-readable labels used in
//! error messages, and the per-kind emptiness rules.

pub mod pipeline;
pub mod sheet;

use calamine::Data;
use chrono::NaiveDate;

/// Spreadsheet date cells that arrive as text use this format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Field table
// =============================================================================

/// How a field's cell is interpreted, and what "empty" means for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// `YYYY-MM-DD` text or a native spreadsheet date.
    Date,
    /// Integer ADL sub-score.
    Score,
    /// Comma-delimited multi-value text.
    List,
}

impl FieldKind {
    /// Per-kind emptiness predicate. A blank or whitespace-only cell is
    /// empty for every kind; numeric zero is a value, not an absence.
    pub fn is_empty(self, cell: &Data) -> bool {
        match cell {
            Data::Empty | Data::Error(_) => true,
            Data::String(s) => s.trim().is_empty(),
            Data::Float(_) | Data::Int(_) => false,
            Data::DateTime(_) => !matches!(self, FieldKind::Date | FieldKind::Text),
            Data::Bool(_) => matches!(self, FieldKind::Date),
            _ => true,
        }
    }
}

/// One column of the import template.
pub struct FieldDef {
    /// Internal field name (also the template row key and DB column).
    pub name: &'static str,
    /// Human-readable label used in error messages.
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn f(name: &'static str, label: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, label, kind }
}

/// Every data field of the import template, in template order.
pub const FIELDS: [FieldDef; 43] = [
    // Lansia
    f("nama_lengkap", "Nama Lengkap", FieldKind::Text),
    f("nik", "NIK", FieldKind::Text),
    f("jenis_kelamin", "Jenis Kelamin", FieldKind::Text),
    f("tanggal_lahir", "Tanggal Lahir", FieldKind::Date),
    f("alamat_lengkap", "Alamat Lengkap", FieldKind::Text),
    f("koordinat", "Koordinat", FieldKind::Text),
    f("rt", "RT", FieldKind::Text),
    f("rw", "RW", FieldKind::Text),
    f("status_perkawinan", "Status Perkawinan", FieldKind::Text),
    f("agama", "Agama", FieldKind::Text),
    f("pendidikan_terakhir", "Pendidikan Terakhir", FieldKind::Text),
    f("pekerjaan_terakhir", "Pekerjaan Terakhir", FieldKind::Text),
    f("sumber_penghasilan", "Sumber Penghasilan", FieldKind::Text),
    // Kesehatan
    f("kondisi_kesehatan_umum", "Kondisi Kesehatan Umum", FieldKind::Text),
    f("riwayat_penyakit_kronis", "Riwayat Penyakit Kronis", FieldKind::List),
    f("penggunaan_obat_rutin", "Penggunaan Obat Rutin", FieldKind::Text),
    f("alat_bantu", "Alat Bantu", FieldKind::List),
    f("aktivitas_fisik", "Aktivitas Fisik", FieldKind::Text),
    f("status_gizi", "Status Gizi", FieldKind::Text),
    f("riwayat_imunisasi", "Riwayat Imunisasi", FieldKind::Text),
    // Kesejahteraan
    f("dukungan_keluarga", "Dukungan Keluarga", FieldKind::Text),
    f("kondisi_rumah", "Kondisi Rumah", FieldKind::Text),
    f("kebutuhan_mendesak", "Kebutuhan Mendesak", FieldKind::List),
    f("hobi_minat", "Hobi dan Minat", FieldKind::Text),
    f("kondisi_psikologis", "Kondisi Psikologis", FieldKind::Text),
    // Pendamping
    f("nama_pendamping", "Nama Pendamping", FieldKind::Text),
    f("hubungan_dengan_lansia", "Hubungan dengan Lansia", FieldKind::Text),
    f("tanggal_lahir_pendamping", "Tanggal Lahir Pendamping", FieldKind::Date),
    f("pendidikan_pendamping", "Pendidikan Pendamping", FieldKind::Text),
    f("ketersediaan_waktu", "Ketersediaan Waktu", FieldKind::Text),
    f("partisipasi_program_bkl", "Partisipasi Program BKL", FieldKind::Text),
    f("riwayat_partisipasi_bkl", "Riwayat Partisipasi BKL", FieldKind::Text),
    f("keterlibatan_data", "Keterlibatan Data", FieldKind::Text),
    // Daily living
    f("bab", "BAB", FieldKind::Score),
    f("bak", "BAK", FieldKind::Score),
    f("membersihkan_diri", "Membersihkan Diri", FieldKind::Score),
    f("toilet", "Penggunaan Toilet", FieldKind::Score),
    f("makan", "Makan", FieldKind::Score),
    f("pindah_tempat", "Pindah Tempat", FieldKind::Score),
    f("mobilitas", "Mobilitas", FieldKind::Score),
    f("berpakaian", "Berpakaian", FieldKind::Score),
    f("naik_turun_tangga", "Naik Turun Tangga", FieldKind::Score),
    f("mandi", "Mandi", FieldKind::Score),
];

// =============================================================================
// Cell coercion
// =============================================================================

/// Cell as trimmed text, `None` when blank.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(v) => {
            if v.fract() == 0.0 {
                Some(format!("{}", *v as i64))
            } else {
                Some(v.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Cell as a date. Text cells must match [`DATE_FORMAT`]; native date
/// cells pass through; a blank is `None`. An unparseable text cell is an
/// error carrying the offending value.
pub fn cell_date(cell: &Data) -> Result<Option<NaiveDate>, String> {
    match cell {
        Data::DateTime(dt) => Ok(dt.as_datetime().map(|d| d.date())),
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Some)
                .map_err(|_| format!("Tanggal '{s}' tidak sesuai format YYYY-MM-DD"))
        }
        _ => Ok(None),
    }
}

/// Cell as an integer score, `None` when blank or non-numeric.
pub fn cell_score(cell: &Data) -> Option<i32> {
    match cell {
        Data::Int(i) => Some(*i as i32),
        Data::Float(v) => Some(*v as i32),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Cell as a comma-delimited list. A cell with no delimiter yields a
/// one-element list; a blank yields `None`.
pub fn cell_list(cell: &Data) -> Option<Vec<String>> {
    cell_text(cell).map(|s| split_list(&s))
}

/// Split a multi-value cell on commas, trimming each element.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|p| p.trim().to_string()).collect()
}

/// Human-readable label for an internal field name.
pub fn field_label(name: &str) -> &'static str {
    FIELDS
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.label)
        .unwrap_or("(tidak dikenal)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_two_elements() {
        assert_eq!(
            split_list("Pangan,Obat-obatan"),
            vec!["Pangan".to_string(), "Obat-obatan".to_string()]
        );
    }

    #[test]
    fn test_split_list_no_delimiter() {
        assert_eq!(split_list("Pangan"), vec!["Pangan".to_string()]);
    }

    #[test]
    fn test_split_list_trims_elements() {
        assert_eq!(
            split_list("Pangan , Obat-obatan"),
            vec!["Pangan".to_string(), "Obat-obatan".to_string()]
        );
    }

    #[test]
    fn test_text_emptiness() {
        assert!(FieldKind::Text.is_empty(&Data::Empty));
        assert!(FieldKind::Text.is_empty(&Data::String("   ".into())));
        assert!(!FieldKind::Text.is_empty(&Data::String("x".into())));
        // Numeric zero is a value
        assert!(!FieldKind::Score.is_empty(&Data::Int(0)));
        assert!(!FieldKind::Score.is_empty(&Data::Float(0.0)));
    }

    #[test]
    fn test_date_emptiness_accepts_text_and_native() {
        assert!(FieldKind::Date.is_empty(&Data::Empty));
        assert!(!FieldKind::Date.is_empty(&Data::String("1960-06-15".into())));
    }

    #[test]
    fn test_cell_date_parses_iso_text() {
        let d = cell_date(&Data::String("1960-06-15".into())).unwrap();
        assert_eq!(d, Some(NaiveDate::from_ymd_opt(1960, 6, 15).unwrap()));
    }

    #[test]
    fn test_cell_date_rejects_other_formats() {
        let err = cell_date(&Data::String("15/06/1960".into())).unwrap_err();
        assert!(err.contains("15/06/1960"));
    }

    #[test]
    fn test_cell_date_blank_is_none() {
        assert_eq!(cell_date(&Data::Empty).unwrap(), None);
        assert_eq!(cell_date(&Data::String("  ".into())).unwrap(), None);
    }

    #[test]
    fn test_cell_text_formats_integral_float() {
        // NIK-style values sometimes arrive as numeric cells
        assert_eq!(cell_text(&Data::Float(12.0)), Some("12".to_string()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".to_string()));
    }

    #[test]
    fn test_cell_score_coercions() {
        assert_eq!(cell_score(&Data::Int(2)), Some(2));
        assert_eq!(cell_score(&Data::Float(3.0)), Some(3));
        assert_eq!(cell_score(&Data::String("4".into())), Some(4));
        assert_eq!(cell_score(&Data::String("abc".into())), None);
        assert_eq!(cell_score(&Data::Empty), None);
    }

    #[test]
    fn test_field_label_lookup() {
        assert_eq!(field_label("nama_lengkap"), "Nama Lengkap");
        assert_eq!(field_label("kebutuhan_mendesak"), "Kebutuhan Mendesak");
        assert_eq!(field_label("nope"), "(tidak dikenal)");
    }

    #[test]
    fn test_field_table_has_no_duplicates() {
        let mut names: Vec<_> = FIELDS.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FIELDS.len());
    }
}
