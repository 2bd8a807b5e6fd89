//! Development data seeding.
//!
//! Fills the registry with plausible fake residents for local testing
//! and demos, plus a default admin account when none exists.

use chrono::{Duration, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use tracing::info;

use crate::auth::hash_password;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    NewDailyLiving, NewKesehatan, NewKesejahteraan, NewLansia, NewPendamping,
};

const FIRST_NAMES_MALE: [&str; 10] = [
    "Agus", "Budi", "Dedi", "Eko", "Hadi", "Joko", "Slamet", "Tono", "Usman", "Wahyu",
];
const FIRST_NAMES_FEMALE: [&str; 10] = [
    "Ani", "Dewi", "Euis", "Ika", "Lilis", "Nani", "Ratna", "Siti", "Tuti", "Yati",
];
const LAST_NAMES: [&str; 10] = [
    "Santoso",
    "Wijaya",
    "Saputra",
    "Hidayat",
    "Nugraha",
    "Kusuma",
    "Permana",
    "Setiawan",
    "Rahayu",
    "Lestari",
];

const STATUS_PERKAWINAN: [&str; 3] = ["Menikah", "Janda/Duda", "Belum Menikah"];
const AGAMA: [&str; 6] = ["Islam", "Kristen", "Katolik", "Hindu", "Buddha", "Konghucu"];
const PENDIDIKAN: [&str; 6] = ["Tidak Sekolah", "SD", "SMP", "SMA", "Diploma", "Sarjana"];
const PEKERJAAN: [&str; 5] = ["Petani", "Pedagang", "Buruh", "Guru", "Pegawai Swasta"];
const PENGHASILAN: [&str; 4] = [
    "Pensiunan",
    "Wiraswasta",
    "Bantuan Pemerintah",
    "Anak/Keluarga",
];
const KONDISI_UMUM: [&str; 3] = ["Baik", "Cukup Baik", "Kurang Baik"];
const PENYAKIT_KRONIS: [&str; 6] = [
    "Diabetes",
    "Hipertensi",
    "Jantung",
    "Stroke",
    "Asma",
    "Rematik",
];
const ALAT_BANTU: [&str; 5] = [
    "Tidak ada",
    "Tongkat",
    "Kursi Roda",
    "Alat Dengar",
    "Kacamata",
];
const AKTIVITAS: [&str; 4] = ["Aktif", "Cukup Aktif", "Kurang Aktif", "Tidak Aktif"];
const STATUS_GIZI: [&str; 3] = ["Baik", "Kurang Gizi", "Gizi Berlebih"];
const DUKUNGAN: [&str; 4] = ["Sangat Baik", "Baik", "Cukup", "Kurang"];
const KONDISI_RUMAH: [&str; 3] = ["Layak Huni", "Cukup Layak", "Kurang Layak"];
const KEBUTUHAN: [&str; 5] = [
    "Pangan",
    "Pakaian",
    "Obat-obatan",
    "Perawatan Medis",
    "Tempat Tinggal",
];
const PSIKOLOGIS: [&str; 5] = ["Stabil", "Cemas", "Depresi", "Sedih", "Bahagia"];
const HUBUNGAN: [&str; 6] = ["Anak", "Cucu", "Pasangan", "Saudara", "Tetangga", "Lainnya"];
const KETERSEDIAAN: [&str; 3] = ["Setiap Hari", "Beberapa Kali Seminggu", "Jarang"];

fn pick<'a>(rng: &mut impl Rng, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

fn pick_some(rng: &mut impl Rng, values: &[&str], max: usize) -> Vec<String> {
    let count = rng.gen_range(0..=max);
    let mut pool: Vec<&str> = values.to_vec();
    pool.shuffle(rng);
    pool.truncate(count);
    pool.into_iter().map(String::from).collect()
}

fn birth_date(rng: &mut impl Rng, min_age: i64, max_age: i64) -> NaiveDate {
    let today = Utc::now().date_naive();
    // 366-day years keep the derived age at or above min_age even
    // across leap days
    let years = rng.gen_range(min_age..max_age);
    today - Duration::days(years * 366 + rng.gen_range(0..300))
}

fn fake_resident(rng: &mut impl Rng, index: usize) -> NewLansia {
    let male = rng.gen_bool(0.5);
    let first = if male {
        pick(rng, &FIRST_NAMES_MALE)
    } else {
        pick(rng, &FIRST_NAMES_FEMALE)
    };
    let last = pick(rng, &LAST_NAMES);
    let rt = rng.gen_range(1..=20);
    let rw = rng.gen_range(1..=15);

    NewLansia {
        nama_lengkap: Some(format!("{first} {last}")),
        // Sequential suffix keeps generated NIKs unique across runs
        nik: Some(format!("3273{:06}{:06}", rng.gen_range(0..1_000_000), index)),
        jenis_kelamin: Some(if male { "Laki-laki" } else { "Perempuan" }.to_string()),
        tanggal_lahir: Some(birth_date(rng, 60, 100)),
        alamat_lengkap: Some(format!("Jl. Cipamokolan No. {} RT {rt}/RW {rw}", index + 1)),
        koordinat: None,
        rt: Some(rt.to_string()),
        rw: Some(rw.to_string()),
        status_perkawinan: Some(pick(rng, &STATUS_PERKAWINAN).to_string()),
        agama: Some(pick(rng, &AGAMA).to_string()),
        pendidikan_terakhir: Some(pick(rng, &PENDIDIKAN).to_string()),
        pekerjaan_terakhir: Some(pick(rng, &PEKERJAAN).to_string()),
        sumber_penghasilan: Some(pick(rng, &PENGHASILAN).to_string()),
    }
}

/// Seed `count` fake residents with full child records, plus the
/// default `admin` account if it is missing.
pub async fn seed(pool: &PgPool, count: usize) -> ApiResult<()> {
    ensure_admin(pool).await?;

    let mut rng = rand::thread_rng();
    for index in 0..count {
        let lansia = fake_resident(&mut rng, index);

        let kesehatan = NewKesehatan {
            kondisi_kesehatan_umum: Some(pick(&mut rng, &KONDISI_UMUM).to_string()),
            riwayat_penyakit_kronis: Some(pick_some(&mut rng, &PENYAKIT_KRONIS, 3)),
            penggunaan_obat_rutin: rng
                .gen_bool(0.5)
                .then(|| "Obat rutin dari puskesmas".to_string()),
            alat_bantu: Some(vec![pick(&mut rng, &ALAT_BANTU).to_string()]),
            aktivitas_fisik: Some(pick(&mut rng, &AKTIVITAS).to_string()),
            status_gizi: Some(pick(&mut rng, &STATUS_GIZI).to_string()),
            riwayat_imunisasi: rng.gen_bool(0.5).then(|| "Lengkap".to_string()),
        };

        let kesejahteraan = NewKesejahteraan {
            dukungan_keluarga: Some(pick(&mut rng, &DUKUNGAN).to_string()),
            kondisi_rumah: Some(pick(&mut rng, &KONDISI_RUMAH).to_string()),
            kebutuhan_mendesak: Some(pick_some(&mut rng, &KEBUTUHAN, 3)),
            hobi_minat: rng.gen_bool(0.5).then(|| "Berkebun".to_string()),
            kondisi_psikologis: Some(pick(&mut rng, &PSIKOLOGIS).to_string()),
        };

        let pendamping = NewPendamping {
            nama_pendamping: Some(format!(
                "{} {}",
                pick(&mut rng, &FIRST_NAMES_FEMALE),
                pick(&mut rng, &LAST_NAMES)
            )),
            hubungan_dengan_lansia: Some(pick(&mut rng, &HUBUNGAN).to_string()),
            tanggal_lahir_pendamping: Some(birth_date(&mut rng, 18, 60)),
            pendidikan_pendamping: Some(pick(&mut rng, &PENDIDIKAN[1..]).to_string()),
            ketersediaan_waktu: Some(pick(&mut rng, &KETERSEDIAAN).to_string()),
            partisipasi_program_bkl: Some(
                if rng.gen_bool(0.5) { "Ya" } else { "Tidak" }.to_string(),
            ),
            riwayat_partisipasi_bkl: rng.gen_bool(0.5).then(|| "Pernah ikut BKL".to_string()),
            keterlibatan_data: rng.gen_bool(0.5).then(|| "Aktif".to_string()),
        };

        let daily_living = NewDailyLiving {
            bab: Some(rng.gen_range(0..=10)),
            bak: Some(rng.gen_range(0..=10)),
            membersihkan_diri: Some(rng.gen_range(0..=10)),
            toilet: Some(rng.gen_range(0..=10)),
            makan: Some(rng.gen_range(0..=10)),
            pindah_tempat: Some(rng.gen_range(0..=10)),
            mobilitas: Some(rng.gen_range(0..=10)),
            berpakaian: Some(rng.gen_range(0..=10)),
            naik_turun_tangga: Some(rng.gen_range(0..=10)),
            mandi: Some(rng.gen_range(0..=10)),
        };

        let mut txn = pool.begin().await.map_err(ApiError::Db)?;
        let id = db::insert_lansia(&mut *txn, &lansia).await?;
        db::upsert_kesehatan(&mut *txn, id, &kesehatan).await?;
        db::upsert_kesejahteraan(&mut *txn, id, &kesejahteraan).await?;
        db::upsert_pendamping(&mut *txn, id, &pendamping).await?;
        db::upsert_daily_living(&mut *txn, id, &daily_living).await?;
        txn.commit().await.map_err(ApiError::Db)?;

        if (index + 1) % 100 == 0 {
            info!(generated = index + 1, "seeding");
        }
    }

    info!(count, "seed complete");
    Ok(())
}

/// Create the default `admin` / `admin123` account if no admin exists.
async fn ensure_admin(pool: &PgPool) -> ApiResult<()> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = 'admin')")
            .fetch_one(pool)
            .await?;
    if exists {
        return Ok(());
    }

    let hash = hash_password("admin123")?;
    sqlx::query(
        "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4)",
    )
    .bind("admin")
    .bind("admin@cipamokolan.local")
    .bind(&hash)
    .bind("admin")
    .execute(pool)
    .await?;

    info!("default admin account created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_resident_is_elderly() {
        let mut rng = rand::thread_rng();
        let today = Utc::now().date_naive();
        for index in 0..20 {
            let resident = fake_resident(&mut rng, index);
            let birth = resident.tanggal_lahir.unwrap();
            let age = crate::models::usia(birth, today);
            assert!((60..=100).contains(&age), "age {age} out of range");
            assert_eq!(resident.nik.as_ref().unwrap().len(), 16);
        }
    }

    #[test]
    fn test_pick_some_bounds() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let chosen = pick_some(&mut rng, &KEBUTUHAN, 3);
            assert!(chosen.len() <= 3);
        }
    }
}
