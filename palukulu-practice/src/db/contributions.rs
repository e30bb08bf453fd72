//! User, contributed proverb and tongue twister queries
//!
//! Contributions always name an existing user; a missing contributor is
//! reported as `NotFound` before anything is inserted.

use chrono::{DateTime, Utc};
use palukulu_common::db::models::{
    ContributedProverb, NewProverb, NewTongueTwister, NewUser, TongueTwister, User,
};
use palukulu_common::db::JsonList;
use palukulu_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const MAX_NAME_LEN: usize = 128;

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn limit_len(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(Error::InvalidInput(format!(
                "{} is longer than {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

/// Create a user and return it with its id
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    require_text("display_name", &user.display_name)?;
    limit_len("display_name", Some(&user.display_name), MAX_NAME_LEN)?;
    limit_len("email", user.email.as_deref(), MAX_NAME_LEN)?;

    let id = sqlx::query("INSERT INTO users (display_name, email) VALUES (?, ?)")
        .bind(&user.display_name)
        .bind(&user.email)
        .execute(pool)
        .await?
        .last_insert_rowid();

    tracing::info!(user_id = id, "User created");

    Ok(User {
        id,
        display_name: user.display_name.clone(),
        email: user.email.clone(),
    })
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    let row = sqlx::query("SELECT id, display_name, email FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", id)))?;

    Ok(User {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
    })
}

async fn ensure_user_exists(pool: &SqlitePool, id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    if !exists {
        return Err(Error::NotFound(format!("User {}", id)));
    }
    Ok(())
}

pub async fn add_proverb(pool: &SqlitePool, proverb: &NewProverb) -> Result<ContributedProverb> {
    require_text("text", &proverb.text)?;
    limit_len("region", proverb.region.as_deref(), MAX_NAME_LEN)?;
    ensure_user_exists(pool, proverb.contributor_id).await?;

    let tags = JsonList::new(proverb.tags.clone().unwrap_or_default());
    let created_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO proverbs (text, contributor_id, meaning, region, tags, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&proverb.text)
    .bind(proverb.contributor_id)
    .bind(&proverb.meaning)
    .bind(&proverb.region)
    .bind(&tags)
    .bind(created_at)
    .execute(pool)
    .await?
    .last_insert_rowid();

    tracing::info!(
        proverb_id = id,
        contributor_id = proverb.contributor_id,
        tags = tags.as_slice().len(),
        "Proverb contributed"
    );

    Ok(ContributedProverb {
        id,
        text: proverb.text.clone(),
        contributor_id: proverb.contributor_id,
        meaning: proverb.meaning.clone(),
        region: proverb.region.clone(),
        tags,
        created_at,
    })
}

pub async fn add_tongue_twister(
    pool: &SqlitePool,
    twister: &NewTongueTwister,
) -> Result<TongueTwister> {
    require_text("text", &twister.text)?;
    limit_len("region", twister.region.as_deref(), MAX_NAME_LEN)?;
    limit_len("audio_url", twister.audio_url.as_deref(), 256)?;
    limit_len("difficulty", twister.difficulty.as_deref(), 32)?;
    ensure_user_exists(pool, twister.contributor_id).await?;

    let created_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO tongue_twisters (text, contributor_id, region, audio_url, difficulty, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&twister.text)
    .bind(twister.contributor_id)
    .bind(&twister.region)
    .bind(&twister.audio_url)
    .bind(&twister.difficulty)
    .bind(created_at)
    .execute(pool)
    .await?
    .last_insert_rowid();

    tracing::info!(
        tongue_twister_id = id,
        contributor_id = twister.contributor_id,
        "Tongue twister contributed"
    );

    Ok(TongueTwister {
        id,
        text: twister.text.clone(),
        contributor_id: twister.contributor_id,
        region: twister.region.clone(),
        audio_url: twister.audio_url.clone(),
        difficulty: twister.difficulty.clone(),
        created_at,
    })
}

/// Proverbs contributed by one user, oldest first
pub async fn proverbs_by_contributor(
    pool: &SqlitePool,
    contributor_id: i64,
) -> Result<Vec<ContributedProverb>> {
    ensure_user_exists(pool, contributor_id).await?;

    let rows = sqlx::query(
        r#"
        SELECT id, text, contributor_id, meaning, region, tags, created_at
        FROM proverbs
        WHERE contributor_id = ?
        ORDER BY id
        "#,
    )
    .bind(contributor_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(proverb_from_row).collect()
}

/// Tongue twisters contributed by one user, oldest first
pub async fn tongue_twisters_by_contributor(
    pool: &SqlitePool,
    contributor_id: i64,
) -> Result<Vec<TongueTwister>> {
    ensure_user_exists(pool, contributor_id).await?;

    let rows = sqlx::query(
        r#"
        SELECT id, text, contributor_id, region, audio_url, difficulty, created_at
        FROM tongue_twisters
        WHERE contributor_id = ?
        ORDER BY id
        "#,
    )
    .bind(contributor_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(tongue_twister_from_row).collect()
}

fn proverb_from_row(row: &SqliteRow) -> Result<ContributedProverb> {
    let tags: Option<String> = row.try_get("tags")?;
    let tags = JsonList::from_column(tags.as_deref())
        .map_err(|e| Error::Internal(format!("Malformed tags column: {}", e)))?;

    Ok(ContributedProverb {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        contributor_id: row.try_get("contributor_id")?,
        meaning: row.try_get("meaning")?,
        region: row.try_get("region")?,
        tags,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn tongue_twister_from_row(row: &SqliteRow) -> Result<TongueTwister> {
    Ok(TongueTwister {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        contributor_id: row.try_get("contributor_id")?,
        region: row.try_get("region")?,
        audio_url: row.try_get("audio_url")?,
        difficulty: row.try_get("difficulty")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
