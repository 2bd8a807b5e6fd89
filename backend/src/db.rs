//! Database access helpers shared by direct creation, update and the
//! import pipeline.
//!
//! All statements run on any `PgExecutor`, so the same helpers serve
//! both pool-level calls and statements staged inside a transaction.
//! Child tables have a unique `lansia_id`, which makes wholesale child
//! replacement a plain upsert.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgExecutor, PgPool};

use crate::models::{
    NewDailyLiving, NewKesehatan, NewKesejahteraan, NewLansia, NewPendamping,
};

/// Connect a pool and run pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Whether a NIK is already registered.
pub async fn nik_exists(ex: impl PgExecutor<'_>, nik: &str) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lansia WHERE nik = $1)")
        .bind(nik)
        .fetch_one(ex)
        .await
}

/// Insert a resident and return its new id.
pub async fn insert_lansia(ex: impl PgExecutor<'_>, new: &NewLansia) -> sqlx::Result<i32> {
    sqlx::query_scalar(
        r#"
        INSERT INTO lansia (
            nama_lengkap, nik, jenis_kelamin, tanggal_lahir, alamat_lengkap,
            koordinat, rt, rw, status_perkawinan, agama,
            pendidikan_terakhir, pekerjaan_terakhir, sumber_penghasilan
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(&new.nama_lengkap)
    .bind(&new.nik)
    .bind(&new.jenis_kelamin)
    .bind(new.tanggal_lahir)
    .bind(&new.alamat_lengkap)
    .bind(&new.koordinat)
    .bind(&new.rt)
    .bind(&new.rw)
    .bind(&new.status_perkawinan)
    .bind(&new.agama)
    .bind(&new.pendidikan_terakhir)
    .bind(&new.pekerjaan_terakhir)
    .bind(&new.sumber_penghasilan)
    .fetch_one(ex)
    .await
}

/// Overwrite every resident field. Returns `false` when the id does not
/// exist.
pub async fn update_lansia(
    ex: impl PgExecutor<'_>,
    id: i32,
    new: &NewLansia,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE lansia SET
            nama_lengkap        = $2,
            nik                 = $3,
            jenis_kelamin       = $4,
            tanggal_lahir       = $5,
            alamat_lengkap      = $6,
            koordinat           = $7,
            rt                  = $8,
            rw                  = $9,
            status_perkawinan   = $10,
            agama               = $11,
            pendidikan_terakhir = $12,
            pekerjaan_terakhir  = $13,
            sumber_penghasilan  = $14,
            updated_at          = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&new.nama_lengkap)
    .bind(&new.nik)
    .bind(&new.jenis_kelamin)
    .bind(new.tanggal_lahir)
    .bind(&new.alamat_lengkap)
    .bind(&new.koordinat)
    .bind(&new.rt)
    .bind(&new.rw)
    .bind(&new.status_perkawinan)
    .bind(&new.agama)
    .bind(&new.pendidikan_terakhir)
    .bind(&new.pekerjaan_terakhir)
    .bind(&new.sumber_penghasilan)
    .execute(ex)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert or wholesale-replace a resident's health record.
pub async fn upsert_kesehatan(
    ex: impl PgExecutor<'_>,
    lansia_id: i32,
    new: &NewKesehatan,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kesehatan_lansia (
            lansia_id, kondisi_kesehatan_umum, riwayat_penyakit_kronis,
            penggunaan_obat_rutin, alat_bantu, aktivitas_fisik,
            status_gizi, riwayat_imunisasi
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (lansia_id) DO UPDATE SET
            kondisi_kesehatan_umum  = EXCLUDED.kondisi_kesehatan_umum,
            riwayat_penyakit_kronis = EXCLUDED.riwayat_penyakit_kronis,
            penggunaan_obat_rutin   = EXCLUDED.penggunaan_obat_rutin,
            alat_bantu              = EXCLUDED.alat_bantu,
            aktivitas_fisik         = EXCLUDED.aktivitas_fisik,
            status_gizi             = EXCLUDED.status_gizi,
            riwayat_imunisasi       = EXCLUDED.riwayat_imunisasi
        "#,
    )
    .bind(lansia_id)
    .bind(&new.kondisi_kesehatan_umum)
    .bind(&new.riwayat_penyakit_kronis)
    .bind(&new.penggunaan_obat_rutin)
    .bind(&new.alat_bantu)
    .bind(&new.aktivitas_fisik)
    .bind(&new.status_gizi)
    .bind(&new.riwayat_imunisasi)
    .execute(ex)
    .await?;
    Ok(())
}

/// Insert or wholesale-replace a resident's welfare record.
pub async fn upsert_kesejahteraan(
    ex: impl PgExecutor<'_>,
    lansia_id: i32,
    new: &NewKesejahteraan,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kesejahteraan_sosial (
            lansia_id, dukungan_keluarga, kondisi_rumah,
            kebutuhan_mendesak, hobi_minat, kondisi_psikologis
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (lansia_id) DO UPDATE SET
            dukungan_keluarga  = EXCLUDED.dukungan_keluarga,
            kondisi_rumah      = EXCLUDED.kondisi_rumah,
            kebutuhan_mendesak = EXCLUDED.kebutuhan_mendesak,
            hobi_minat         = EXCLUDED.hobi_minat,
            kondisi_psikologis = EXCLUDED.kondisi_psikologis
        "#,
    )
    .bind(lansia_id)
    .bind(&new.dukungan_keluarga)
    .bind(&new.kondisi_rumah)
    .bind(&new.kebutuhan_mendesak)
    .bind(&new.hobi_minat)
    .bind(&new.kondisi_psikologis)
    .execute(ex)
    .await?;
    Ok(())
}

/// Insert or wholesale-replace a resident's caregiver record.
pub async fn upsert_pendamping(
    ex: impl PgExecutor<'_>,
    lansia_id: i32,
    new: &NewPendamping,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO keluarga_pendamping (
            lansia_id, nama_pendamping, hubungan_dengan_lansia,
            tanggal_lahir_pendamping, pendidikan_pendamping,
            ketersediaan_waktu, partisipasi_program_bkl,
            riwayat_partisipasi_bkl, keterlibatan_data
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (lansia_id) DO UPDATE SET
            nama_pendamping          = EXCLUDED.nama_pendamping,
            hubungan_dengan_lansia   = EXCLUDED.hubungan_dengan_lansia,
            tanggal_lahir_pendamping = EXCLUDED.tanggal_lahir_pendamping,
            pendidikan_pendamping    = EXCLUDED.pendidikan_pendamping,
            ketersediaan_waktu       = EXCLUDED.ketersediaan_waktu,
            partisipasi_program_bkl  = EXCLUDED.partisipasi_program_bkl,
            riwayat_partisipasi_bkl  = EXCLUDED.riwayat_partisipasi_bkl,
            keterlibatan_data        = EXCLUDED.keterlibatan_data
        "#,
    )
    .bind(lansia_id)
    .bind(&new.nama_pendamping)
    .bind(&new.hubungan_dengan_lansia)
    .bind(new.tanggal_lahir_pendamping)
    .bind(&new.pendidikan_pendamping)
    .bind(&new.ketersediaan_waktu)
    .bind(&new.partisipasi_program_bkl)
    .bind(&new.riwayat_partisipasi_bkl)
    .bind(&new.keterlibatan_data)
    .execute(ex)
    .await?;
    Ok(())
}

/// Insert or wholesale-replace a resident's ADL sheet. The stored total
/// is always recomputed from the sub-scores.
pub async fn upsert_daily_living(
    ex: impl PgExecutor<'_>,
    lansia_id: i32,
    new: &NewDailyLiving,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_living (
            lansia_id, bab, bak, membersihkan_diri, toilet, makan,
            pindah_tempat, mobilitas, berpakaian, naik_turun_tangga,
            mandi, total
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (lansia_id) DO UPDATE SET
            bab               = EXCLUDED.bab,
            bak               = EXCLUDED.bak,
            membersihkan_diri = EXCLUDED.membersihkan_diri,
            toilet            = EXCLUDED.toilet,
            makan             = EXCLUDED.makan,
            pindah_tempat     = EXCLUDED.pindah_tempat,
            mobilitas         = EXCLUDED.mobilitas,
            berpakaian        = EXCLUDED.berpakaian,
            naik_turun_tangga = EXCLUDED.naik_turun_tangga,
            mandi             = EXCLUDED.mandi,
            total             = EXCLUDED.total
        "#,
    )
    .bind(lansia_id)
    .bind(new.bab)
    .bind(new.bak)
    .bind(new.membersihkan_diri)
    .bind(new.toilet)
    .bind(new.makan)
    .bind(new.pindah_tempat)
    .bind(new.mobilitas)
    .bind(new.berpakaian)
    .bind(new.naik_turun_tangga)
    .bind(new.mandi)
    .bind(new.total())
    .execute(ex)
    .await?;
    Ok(())
}
