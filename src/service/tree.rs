//! Tab → sections → files families: read the tree, replace a tab's subtree in one
//! transaction, delete a tab.
//!
//! Synchronizing is split in two steps. [`SyncPlan::build`] is pure: it decides whether
//! the tab is new, resolves each file's URL against the request's uploaded attachments,
//! and drops files that end up without a URL. [`TreeService::apply`] then writes the plan:
//! create or retitle the tab, delete all of its sections (files cascade), and insert the
//! incoming sections and files. Uploads happen before `apply`, so a rollback leaves the
//! uploaded objects in media storage.

use crate::config::ResolvedFamily;
use crate::error::AppError;
use crate::service::validation::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};

/// Client ids longer than this many digits are clock values (`Date.now()`), not row ids.
pub const MAX_ROW_ID_DIGITS: usize = 10;

/// Tab id as sent by the admin UI: a row id, a client clock value, or either as a string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TabIdRef {
    Number(i64),
    Text(String),
}

impl TabIdRef {
    fn as_text(&self) -> String {
        match self {
            TabIdRef::Number(n) => n.to_string(),
            TabIdRef::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPayload {
    #[serde(default)]
    pub id: Option<TabIdRef>,
    /// Explicit new/existing marker. When absent the id length decides.
    #[serde(default)]
    pub is_new: Option<bool>,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionPayload>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPayload {
    #[serde(alias = "title")]
    pub section_title: String,
    #[serde(default)]
    pub files: Vec<FilePayload>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub temporary_id: Option<String>,
    #[serde(default)]
    pub uploaded_date: Option<String>,
}

/// An uploaded binary from the same request, keyed by its multipart field name.
#[derive(Clone, Debug)]
pub struct ReceivedAttachment {
    pub url: String,
    pub file_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabTarget {
    Create,
    Update(i64),
}

/// Decide whether a payload creates a tab or updates an existing one.
pub fn classify(id: Option<&TabIdRef>, is_new: Option<bool>) -> Result<TabTarget, AppError> {
    let text = id.map(TabIdRef::as_text).filter(|s| !s.is_empty());
    let parse = |s: &str| {
        s.parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("invalid tab id '{}'", s)))
    };
    match (is_new, text) {
        (Some(true), _) => Ok(TabTarget::Create),
        (Some(false), Some(s)) => Ok(TabTarget::Update(parse(&s)?)),
        (Some(false), None) => Err(AppError::BadRequest("isNew=false requires an id".into())),
        (None, None) => Ok(TabTarget::Create),
        (None, Some(s)) if s.chars().count() > MAX_ROW_ID_DIGITS => Ok(TabTarget::Create),
        (None, Some(s)) => Ok(TabTarget::Update(parse(&s)?)),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedFile {
    pub name: String,
    pub url: String,
    pub uploaded_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedSection {
    pub title: String,
    pub files: Vec<PlannedFile>,
}

#[derive(Clone, Debug)]
pub struct SyncPlan {
    pub target: TabTarget,
    pub title: String,
    pub sections: Vec<PlannedSection>,
    /// Descriptors dropped for lack of a URL.
    pub skipped_files: usize,
    /// Attachment field names some descriptor claimed.
    pub matched_attachments: HashSet<String>,
}

impl SyncPlan {
    pub fn build(
        payload: TabPayload,
        target: TabTarget,
        attachments: &HashMap<String, ReceivedAttachment>,
        today: NaiveDate,
    ) -> Result<SyncPlan, AppError> {
        let title = payload.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        let mut skipped_files = 0;
        let mut matched_attachments = HashSet::new();
        let mut sections = Vec::with_capacity(payload.sections.len());

        for section in payload.sections {
            let mut files = Vec::with_capacity(section.files.len());
            for file in section.files {
                let mut url = file.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
                let mut fallback_name = None;
                if let Some(tid) = file.temporary_id.as_deref().filter(|t| !t.is_empty()) {
                    if let Some(att) = attachments.get(tid) {
                        url = Some(att.url.clone());
                        fallback_name = Some(att.file_name.clone());
                        matched_attachments.insert(tid.to_string());
                    }
                }
                let Some(url) = url else {
                    skipped_files += 1;
                    continue;
                };
                let name = match file.name.trim() {
                    "" => fallback_name.unwrap_or_else(|| url.rsplit('/').next().unwrap_or("file").to_string()),
                    n => n.to_string(),
                };
                let uploaded_date = file.uploaded_date.as_deref().and_then(parse_date).unwrap_or(today);
                files.push(PlannedFile { name, url, uploaded_date });
            }
            sections.push(PlannedSection {
                title: section.section_title.trim().to_string(),
                files,
            });
        }

        Ok(SyncPlan {
            target,
            title,
            sections,
            skipped_files,
            matched_attachments,
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub id: i64,
    pub created: bool,
    pub sections: usize,
    pub files: usize,
    pub skipped_files: usize,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TabFile {
    pub id: i64,
    pub section_id: i64,
    pub name: String,
    pub url: String,
    pub uploaded_date: NaiveDate,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TabSection {
    pub id: i64,
    pub tab_id: i64,
    pub title: String,
    #[sqlx(skip)]
    pub files: Vec<TabFile>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: i64,
    pub title: String,
    #[sqlx(skip)]
    pub sections: Vec<TabSection>,
}

pub struct TreeService;

impl TreeService {
    /// Write a plan in one transaction. Any error rolls everything back.
    pub async fn apply(pool: &PgPool, family: &ResolvedFamily, plan: &SyncPlan) -> Result<SyncOutcome, AppError> {
        let mut tx = pool.begin().await?;

        let (tab_id, created) = match plan.target {
            TabTarget::Create => {
                let (id,): (i64,) = sqlx::query_as(&format!(
                    "INSERT INTO {} (\"title\") VALUES ($1) RETURNING \"id\"",
                    family.tabs()
                ))
                .bind(&plan.title)
                .fetch_one(&mut *tx)
                .await?;
                (id, true)
            }
            TabTarget::Update(id) => {
                let res = sqlx::query(&format!(
                    "UPDATE {} SET \"title\" = $1, \"updated_at\" = NOW() WHERE \"id\" = $2",
                    family.tabs()
                ))
                .bind(&plan.title)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                if res.rows_affected() == 0 {
                    return Err(AppError::NotFound(format!("{} tab {}", family.key, id)));
                }
                // Whole subtree is replaced; files go with their sections.
                let removed = sqlx::query(&format!("DELETE FROM {} WHERE \"tab_id\" = $1", family.sections()))
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                tracing::debug!(family = %family.key, tab_id = id, sections = removed.rows_affected(), "sections cleared");
                (id, false)
            }
        };

        let insert_section = format!(
            "INSERT INTO {} (\"tab_id\", \"title\") VALUES ($1, $2) RETURNING \"id\"",
            family.sections()
        );
        let insert_file = format!(
            "INSERT INTO {} (\"section_id\", \"name\", \"url\", \"uploaded_date\") VALUES ($1, $2, $3, $4)",
            family.files()
        );
        let mut file_count = 0;
        for section in &plan.sections {
            let (section_id,): (i64,) = sqlx::query_as(&insert_section)
                .bind(tab_id)
                .bind(&section.title)
                .fetch_one(&mut *tx)
                .await?;
            for file in &section.files {
                sqlx::query(&insert_file)
                    .bind(section_id)
                    .bind(&file.name)
                    .bind(&file.url)
                    .bind(file.uploaded_date)
                    .execute(&mut *tx)
                    .await?;
                file_count += 1;
            }
        }

        tx.commit().await?;
        tracing::info!(
            family = %family.key,
            tab_id,
            created,
            sections = plan.sections.len(),
            files = file_count,
            skipped = plan.skipped_files,
            "tab synchronized"
        );
        Ok(SyncOutcome {
            id: tab_id,
            created,
            sections: plan.sections.len(),
            files: file_count,
            skipped_files: plan.skipped_files,
        })
    }

    /// Every tab of the family with its sections and files, all ascending by id.
    pub async fn list(pool: &PgPool, family: &ResolvedFamily) -> Result<Vec<Tab>, AppError> {
        let tabs: Vec<Tab> = sqlx::query_as(&format!(
            "SELECT \"id\", \"title\" FROM {} ORDER BY \"id\"",
            family.tabs()
        ))
        .fetch_all(pool)
        .await?;
        Self::attach_children(pool, family, tabs).await
    }

    pub async fn read(pool: &PgPool, family: &ResolvedFamily, id: i64) -> Result<Option<Tab>, AppError> {
        let tabs: Vec<Tab> = sqlx::query_as(&format!(
            "SELECT \"id\", \"title\" FROM {} WHERE \"id\" = $1",
            family.tabs()
        ))
        .bind(id)
        .fetch_all(pool)
        .await?;
        Ok(Self::attach_children(pool, family, tabs).await?.into_iter().next())
    }

    /// Delete a tab; sections and files go with it through the foreign keys.
    pub async fn delete(pool: &PgPool, family: &ResolvedFamily, id: i64) -> Result<(), AppError> {
        let res = sqlx::query(&format!("DELETE FROM {} WHERE \"id\" = $1", family.tabs()))
            .bind(id)
            .execute(pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} tab {}", family.key, id)));
        }
        tracing::info!(family = %family.key, tab_id = id, "tab deleted");
        Ok(())
    }

    async fn attach_children(pool: &PgPool, family: &ResolvedFamily, tabs: Vec<Tab>) -> Result<Vec<Tab>, AppError> {
        if tabs.is_empty() {
            return Ok(tabs);
        }
        let tab_ids: Vec<i64> = tabs.iter().map(|t| t.id).collect();
        let sections: Vec<TabSection> = sqlx::query_as(&format!(
            "SELECT \"id\", \"tab_id\", \"title\" FROM {} WHERE \"tab_id\" = ANY($1) ORDER BY \"id\"",
            family.sections()
        ))
        .bind(&tab_ids)
        .fetch_all(pool)
        .await?;

        let section_ids: Vec<i64> = sections.iter().map(|s| s.id).collect();
        let files: Vec<TabFile> = if section_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as(&format!(
                "SELECT \"id\", \"section_id\", \"name\", \"url\", \"uploaded_date\" FROM {} WHERE \"section_id\" = ANY($1) ORDER BY \"id\"",
                family.files()
            ))
            .bind(&section_ids)
            .fetch_all(pool)
            .await?
        };

        Ok(assemble(tabs, sections, files))
    }
}

/// Nest rows into tabs. Inputs are already ordered; order is kept.
fn assemble(mut tabs: Vec<Tab>, sections: Vec<TabSection>, files: Vec<TabFile>) -> Vec<Tab> {
    let mut files_by_section: HashMap<i64, Vec<TabFile>> = HashMap::new();
    for f in files {
        files_by_section.entry(f.section_id).or_default().push(f);
    }
    let mut sections_by_tab: HashMap<i64, Vec<TabSection>> = HashMap::new();
    for mut s in sections {
        s.files = files_by_section.remove(&s.id).unwrap_or_default();
        sections_by_tab.entry(s.tab_id).or_default().push(s);
    }
    for tab in tabs.iter_mut() {
        tab.sections = sections_by_tab.remove(&tab.id).unwrap_or_default();
    }
    tabs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn payload(v: serde_json::Value) -> TabPayload {
        serde_json::from_value(v).unwrap()
    }

    fn attachments(pairs: &[(&str, &str)]) -> HashMap<String, ReceivedAttachment> {
        pairs
            .iter()
            .map(|(tid, url)| {
                (
                    tid.to_string(),
                    ReceivedAttachment {
                        url: url.to_string(),
                        file_name: format!("{}.pdf", tid),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn short_ids_update_in_place() {
        assert_eq!(classify(Some(&TabIdRef::Number(42)), None).unwrap(), TabTarget::Update(42));
        assert_eq!(classify(Some(&TabIdRef::Text("9999999999".into())), None).unwrap(), TabTarget::Update(9_999_999_999));
    }

    #[test]
    fn clock_ids_and_null_create() {
        assert_eq!(classify(Some(&TabIdRef::Number(1_700_000_000_000)), None).unwrap(), TabTarget::Create);
        assert_eq!(classify(Some(&TabIdRef::Text("17000000000".into())), None).unwrap(), TabTarget::Create);
        assert_eq!(classify(None, None).unwrap(), TabTarget::Create);
        assert_eq!(classify(Some(&TabIdRef::Text("  ".into())), None).unwrap(), TabTarget::Create);
    }

    #[test]
    fn explicit_flag_wins() {
        assert_eq!(classify(Some(&TabIdRef::Number(7)), Some(true)).unwrap(), TabTarget::Create);
        assert_eq!(
            classify(Some(&TabIdRef::Number(1_700_000_000_000)), Some(false)).unwrap(),
            TabTarget::Update(1_700_000_000_000)
        );
        assert!(matches!(classify(None, Some(false)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn non_numeric_short_id_is_rejected() {
        assert!(matches!(classify(Some(&TabIdRef::Text("abc".into())), None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn payload_accepts_null_id_and_string_id() {
        let p = payload(json!({ "id": null, "title": "t", "sections": [] }));
        assert!(p.id.is_none());
        let p = payload(json!({ "id": "12", "title": "t" }));
        assert_eq!(p.id, Some(TabIdRef::Text("12".into())));
        let p = payload(json!({ "id": 1700000000000i64, "isNew": true, "title": "t" }));
        assert_eq!(p.is_new, Some(true));
    }

    #[test]
    fn attachment_url_replaces_client_url() {
        let p = payload(json!({
            "title": "2025 Notices",
            "sections": [{ "sectionTitle": "Circulars", "files": [
                { "name": "doc1", "url": "blob:http://localhost/abc", "temporaryId": "file_abc" }
            ]}]
        }));
        let plan = SyncPlan::build(
            p,
            TabTarget::Create,
            &attachments(&[("file_abc", "https://cdn/ncism/1-doc1.pdf")]),
            today(),
        )
        .unwrap();
        let file = &plan.sections[0].files[0];
        assert_eq!(file.url, "https://cdn/ncism/1-doc1.pdf");
        assert_eq!(file.name, "doc1");
        assert_eq!(file.uploaded_date, today());
        assert!(plan.matched_attachments.contains("file_abc"));
    }

    #[test]
    fn unmatched_descriptor_without_url_is_dropped() {
        let p = payload(json!({
            "title": "Notices",
            "sections": [
                { "sectionTitle": "A", "files": [
                    { "name": "ghost", "temporaryId": "file_missing" },
                    { "name": "empty", "url": "  " },
                    { "name": "kept", "url": "https://cdn/kept.pdf", "uploadedDate": "2024-02-03" }
                ]},
                { "sectionTitle": "B", "files": [] }
            ]
        }));
        let plan = SyncPlan::build(p, TabTarget::Update(3), &HashMap::new(), today()).unwrap();
        assert_eq!(plan.skipped_files, 2);
        assert_eq!(plan.sections.len(), 2);
        assert_eq!(plan.sections[0].files.len(), 1);
        assert_eq!(plan.sections[0].files[0].name, "kept");
        assert_eq!(plan.sections[0].files[0].uploaded_date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert!(plan.sections[1].files.is_empty());
    }

    #[test]
    fn nameless_file_takes_attachment_name() {
        let p = payload(json!({
            "title": "T",
            "sections": [{ "title": "S", "files": [{ "temporaryId": "f1" }] }]
        }));
        let plan = SyncPlan::build(p, TabTarget::Create, &attachments(&[("f1", "https://cdn/x")]), today()).unwrap();
        assert_eq!(plan.sections[0].title, "S");
        assert_eq!(plan.sections[0].files[0].name, "f1.pdf");
    }

    #[test]
    fn blank_title_is_invalid() {
        let p = payload(json!({ "title": " ", "sections": [] }));
        assert!(matches!(
            SyncPlan::build(p, TabTarget::Create, &HashMap::new(), today()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn assemble_nests_in_order() {
        let tabs = vec![
            Tab { id: 1, title: "a".into(), sections: vec![] },
            Tab { id: 2, title: "b".into(), sections: vec![] },
        ];
        let sections = vec![
            TabSection { id: 10, tab_id: 2, title: "s10".into(), files: vec![] },
            TabSection { id: 11, tab_id: 2, title: "s11".into(), files: vec![] },
        ];
        let files = vec![TabFile {
            id: 100,
            section_id: 11,
            name: "f".into(),
            url: "u".into(),
            uploaded_date: today(),
        }];
        let out = assemble(tabs, sections, files);
        assert!(out[0].sections.is_empty());
        assert_eq!(out[1].sections.iter().map(|s| s.id).collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(out[1].sections[1].files[0].id, 100);
        let v = serde_json::to_value(&out[1]).unwrap();
        assert_eq!(v["sections"][1]["files"][0]["uploadedDate"], json!("2025-06-01"));
        assert_eq!(v["sections"][0]["tabId"], json!(2));
    }
}
