//! Row transformer for the import template workbook.
//!
//! The template stores one *field per sheet row* and one *record per
//! sheet column*: the first sheet row labels the record columns, the
//! first record column is a filled-in example, and four marker rows
//! (`pass1`..`pass4`) visually separate the field groups. This module
//! transposes that layout into one field map per resident and numbers
//! each record the way a person reading the original file would
//! (starting at 2, after the label row), so that error messages point
//! at the right place.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::{SheetError, SheetResult};
use crate::importer::FIELDS;

/// Marker rows used purely as visual separators in the template.
const SEPARATORS: [&str; 4] = ["pass1", "pass2", "pass3", "pass4"];

/// Template field order, separators included. The sheet must carry
/// exactly this many field rows below the label row.
pub const SHEET_HEADER: [&str; 47] = [
    "nama_lengkap",
    "nik",
    "jenis_kelamin",
    "tanggal_lahir",
    "alamat_lengkap",
    "koordinat",
    "rt",
    "rw",
    "status_perkawinan",
    "agama",
    "pendidikan_terakhir",
    "pekerjaan_terakhir",
    "sumber_penghasilan",
    "pass1",
    "kondisi_kesehatan_umum",
    "riwayat_penyakit_kronis",
    "penggunaan_obat_rutin",
    "alat_bantu",
    "aktivitas_fisik",
    "status_gizi",
    "riwayat_imunisasi",
    "pass2",
    "dukungan_keluarga",
    "kondisi_rumah",
    "kebutuhan_mendesak",
    "hobi_minat",
    "kondisi_psikologis",
    "pass3",
    "nama_pendamping",
    "hubungan_dengan_lansia",
    "tanggal_lahir_pendamping",
    "pendidikan_pendamping",
    "ketersediaan_waktu",
    "partisipasi_program_bkl",
    "riwayat_partisipasi_bkl",
    "keterlibatan_data",
    "pass4",
    "bab",
    "bak",
    "membersihkan_diri",
    "toilet",
    "makan",
    "pindah_tempat",
    "mobilitas",
    "berpakaian",
    "naik_turun_tangga",
    "mandi",
];

/// One resident record lifted out of the sheet.
#[derive(Debug, Clone)]
pub struct SheetRow {
    /// Record number as a reader of the original file would count it
    /// (1-based, label row included).
    pub row: usize,
    /// Field name to raw cell, separators stripped.
    pub fields: HashMap<&'static str, Data>,
}

impl SheetRow {
    /// Cell for a field, `Data::Empty` when the column is short.
    pub fn cell(&self, name: &str) -> &Data {
        static EMPTY: Data = Data::Empty;
        self.fields.get(name).unwrap_or(&EMPTY)
    }
}

/// Read the first worksheet of an uploaded workbook into records.
pub fn rows_from_workbook(bytes: &[u8]) -> SheetResult<Vec<SheetRow>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| SheetError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SheetError::Workbook(e.to_string()))?;

    rows_from_range(&range)
}

/// Transpose a sheet range into records.
///
/// Fatal when the field-row count below the label row differs from the
/// template header; this fails the whole file before any record is
/// examined.
pub fn rows_from_range(range: &Range<Data>) -> SheetResult<Vec<SheetRow>> {
    let height = range.height();
    let width = range.width();
    if height == 0 || width == 0 {
        return Err(SheetError::Empty);
    }

    // Row 0 labels the record columns; the rest must line up with the
    // template field list exactly.
    let field_rows = height - 1;
    if field_rows != SHEET_HEADER.len() {
        return Err(SheetError::ColumnCount {
            expected: SHEET_HEADER.len(),
            found: field_rows,
        });
    }

    let mut records = Vec::new();
    // Column 0 is the example record shipped with the template; real
    // records start at column 1, which a reader counts as 2.
    for col in 1..width {
        let mut fields = HashMap::with_capacity(FIELDS.len());
        for (idx, name) in SHEET_HEADER.iter().enumerate() {
            if SEPARATORS.contains(name) {
                continue;
            }
            let cell = range
                .get((idx + 1, col))
                .cloned()
                .unwrap_or(Data::Empty);
            fields.insert(*name, cell);
        }
        records.push(SheetRow {
            row: col + 1,
            fields,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a template-shaped range: label row, then one sheet row per
    /// header field; records in columns starting at 1 (column 0 is the
    /// example record).
    fn template_range(records: &[Vec<(&str, Data)>]) -> Range<Data> {
        let width = (records.len() + 1) as u32;
        let mut range = Range::new((0, 0), (SHEET_HEADER.len() as u32, width - 1));
        range.set_value((0, 0), Data::String("Field".into()));
        for (idx, name) in SHEET_HEADER.iter().enumerate() {
            let r = (idx + 1) as u32;
            range.set_value((r, 0), Data::String(format!("contoh {name}")));
            for (ri, record) in records.iter().enumerate() {
                if let Some((_, cell)) = record.iter().find(|(n, _)| n == name) {
                    range.set_value((r, (ri + 1) as u32), cell.clone());
                }
            }
        }
        range
    }

    #[test]
    fn test_example_column_skipped_and_reindexed_from_two() {
        let rows = rows_from_range(&template_range(&[
            vec![("nama_lengkap", Data::String("Siti".into()))],
            vec![("nama_lengkap", Data::String("Budi".into()))],
        ]))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[1].row, 3);
        assert_eq!(rows[0].cell("nama_lengkap"), &Data::String("Siti".into()));
        assert_eq!(rows[1].cell("nama_lengkap"), &Data::String("Budi".into()));
    }

    #[test]
    fn test_separator_rows_dropped() {
        let rows = rows_from_range(&template_range(&[vec![(
            "nama_lengkap",
            Data::String("Siti".into()),
        )]]))
        .unwrap();

        assert!(!rows[0].fields.contains_key("pass1"));
        assert!(!rows[0].fields.contains_key("pass4"));
        assert_eq!(rows[0].fields.len(), FIELDS.len());
    }

    #[test]
    fn test_missing_cells_read_as_empty() {
        let rows = rows_from_range(&template_range(&[vec![(
            "nama_lengkap",
            Data::String("Siti".into()),
        )]]))
        .unwrap();

        assert_eq!(rows[0].cell("nik"), &Data::Empty);
        assert_eq!(rows[0].cell("mandi"), &Data::Empty);
    }

    #[test]
    fn test_wrong_shape_is_fatal() {
        // A sheet with too few field rows
        let mut range = Range::new((0, 0), (3, 2));
        range.set_value((0, 0), Data::String("Field".into()));
        range.set_value((1, 0), Data::String("nama_lengkap".into()));

        match rows_from_range(&range) {
            Err(SheetError::ColumnCount { expected, found }) => {
                assert_eq!(expected, SHEET_HEADER.len());
                assert_eq!(found, 3);
            }
            other => panic!("expected ColumnCount error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_sheet_is_fatal() {
        let range: Range<Data> = Range::empty();
        assert!(matches!(rows_from_range(&range), Err(SheetError::Empty)));
    }

    #[test]
    fn test_header_matches_field_table() {
        let data_fields: Vec<_> = SHEET_HEADER
            .iter()
            .filter(|n| !SEPARATORS.contains(n))
            .copied()
            .collect();
        assert_eq!(data_fields.len(), FIELDS.len());
        for (header_name, def) in data_fields.iter().zip(FIELDS.iter()) {
            assert_eq!(*header_name, def.name);
        }
    }
}
