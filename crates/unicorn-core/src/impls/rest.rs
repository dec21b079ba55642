//! PostgREST クライアント（Supabase 互換）
//!
//! # テーブル
//! - `startup_pitches`: デッキの供給元（id 降順で `limit` 件取得してからシャッフル）
//! - `swipe_sessions`: セッション本体。完了時に結果を PATCH する
//! - `swipe_decisions`: 判定 1 件 = 1 行（`position` は 0 始まり）
//! - `swipe_events`: 分析イベント
//!
//! すべてのリクエストに `apikey` と `Authorization: Bearer` を付ける。
//!
//! # スキーマの前提
//! - `startup_pitches` と `swipe_sessions` は Web 版と共有する（`swipe_sessions.id` は `uuid` 列）
//! - `swipe_decisions(session_id uuid, position int, pitch_id int, direction text, timestamp timestamptz)`
//!   と `swipe_events(session_id uuid, event text, payload jsonb)` はこのクライアントが追加で使う
//! - セッション id はローカルでは ULID。ワイヤ上では同じ 128 bit を UUID 表記で送る

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;
use uuid::Uuid;

use super::shuffle::Shuffler;
use crate::config::StoreConfig;
use crate::domain::{
    AnalyticsEvent, Archetype, ClassificationResult, Decision, DeckError, Direction, Item, ItemId,
    MirrorError, Pack, SessionId,
};
use crate::ports::{DeckProvider, EventSink, SessionStore, StoredSession};

const SESSIONS: &str = "swipe_sessions";
const DECISIONS: &str = "swipe_decisions";
const PITCHES: &str = "startup_pitches";
const EVENTS: &str = "swipe_events";

/// Shared HTTP plumbing for the REST collaborators.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Insert/update without reading the row back.
    fn write(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", "return=minimal")
    }
}

/// Session id as stored in the `uuid` columns.
fn wire_id(id: SessionId) -> Uuid {
    Uuid::from(id.as_ulid())
}

fn eq(id: SessionId) -> String {
    format!("eq.{}", wire_id(id))
}

async fn mirror_status(response: Response) -> Result<Response, MirrorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MirrorError::Rejected(format!("HTTP {}: {body}", status.as_u16())))
}

fn transport(err: reqwest::Error) -> MirrorError {
    MirrorError::Transport(err.to_string())
}

/// Direction as stored by the web client (`left` / `right`).
fn wire_direction(direction: Direction) -> &'static str {
    match direction {
        Direction::Reject => "left",
        Direction::Invest => "right",
    }
}

#[derive(Debug, Serialize)]
struct NewSessionRow {
    id: Uuid,
    swipes: Vec<Decision>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct DecisionRow {
    session_id: Uuid,
    position: usize,
    pitch_id: ItemId,
    direction: &'static str,
    timestamp: DateTime<Utc>,
}

impl DecisionRow {
    fn new(session_id: SessionId, decision: &Decision, position: usize) -> Self {
        Self {
            session_id: wire_id(session_id),
            position,
            pitch_id: decision.item_id,
            direction: wire_direction(decision.direction),
            timestamp: decision.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionPatch<'a> {
    founder_archetype: &'a Archetype,
    startup_pack: &'a Pack,
    result: &'a ClassificationResult,
    completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    result: Option<ClassificationResult>,
}

impl SessionRow {
    fn into_stored(self, decisions: Vec<Decision>) -> StoredSession {
        StoredSession {
            id: SessionId::from_ulid(Ulid::from(self.id)),
            decisions,
            result: self.result,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct EventRow {
    session_id: Uuid,
    event: &'static str,
    payload: serde_json::Value,
}

impl EventRow {
    fn new(event: &AnalyticsEvent) -> Self {
        Self {
            session_id: wire_id(event.session_id()),
            event: event.name(),
            payload: event.payload(),
        }
    }
}

/// `SessionStore` over the `swipe_sessions` / `swipe_decisions` tables.
#[derive(Clone)]
pub struct RestSessionStore {
    client: RestClient,
}

impl RestSessionStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionStore for RestSessionStore {
    async fn create_session(
        &self,
        id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), MirrorError> {
        let row = NewSessionRow {
            id: wire_id(id),
            swipes: Vec::new(),
            created_at,
        };
        let response = self
            .client
            .write(Method::POST, SESSIONS)
            .json(&row)
            .send()
            .await
            .map_err(transport)?;
        mirror_status(response).await?;
        Ok(())
    }

    async fn record_decision(
        &self,
        id: SessionId,
        decision: &Decision,
        order: usize,
    ) -> Result<(), MirrorError> {
        let response = self
            .client
            .write(Method::POST, DECISIONS)
            .json(&DecisionRow::new(id, decision, order))
            .send()
            .await
            .map_err(transport)?;
        mirror_status(response).await?;
        Ok(())
    }

    async fn complete_session(
        &self,
        id: SessionId,
        result: &ClassificationResult,
        completed_at: DateTime<Utc>,
    ) -> Result<(), MirrorError> {
        let patch = CompletionPatch {
            founder_archetype: &result.archetype,
            startup_pack: &result.pack,
            result,
            completed_at,
        };
        let response = self
            .client
            .write(Method::PATCH, SESSIONS)
            .query(&[("id", eq(id))])
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        mirror_status(response).await?;
        Ok(())
    }

    async fn fetch_session(&self, id: SessionId) -> Result<StoredSession, MirrorError> {
        let response = self
            .client
            .request(Method::GET, SESSIONS)
            .query(&[("id", eq(id)), ("select", "*".to_string())])
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<SessionRow> = mirror_status(response)
            .await?
            .json()
            .await
            .map_err(transport)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| MirrorError::NotFound(id.to_string()))?;

        let response = self
            .client
            .request(Method::GET, DECISIONS)
            .query(&[
                ("session_id", eq(id)),
                ("select", "pitch_id,direction,timestamp".to_string()),
                ("order", "position.asc".to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;
        let decisions: Vec<Decision> = mirror_status(response)
            .await?
            .json()
            .await
            .map_err(transport)?;

        debug!(session_id = %id, decisions = decisions.len(), "session fetched");
        Ok(row.into_stored(decisions))
    }
}

/// `EventSink` over the `swipe_events` table.
#[derive(Clone)]
pub struct RestEventSink {
    client: RestClient,
}

impl RestEventSink {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSink for RestEventSink {
    async fn track(&self, event: &AnalyticsEvent) -> Result<(), MirrorError> {
        let response = self
            .client
            .write(Method::POST, EVENTS)
            .json(&EventRow::new(event))
            .send()
            .await
            .map_err(transport)?;
        mirror_status(response).await?;
        Ok(())
    }
}

/// `DeckProvider` over the `startup_pitches` table.
pub struct RestDeckProvider {
    client: RestClient,
    shuffler: Shuffler,
}

impl RestDeckProvider {
    pub fn new(client: RestClient, shuffler: Shuffler) -> Self {
        Self { client, shuffler }
    }
}

#[async_trait]
impl DeckProvider for RestDeckProvider {
    async fn fetch_deck(&self, count: usize) -> Result<Vec<Item>, DeckError> {
        let response = self
            .client
            .request(Method::GET, PITCHES)
            .query(&[
                ("select", "id,pitch,is_seed".to_string()),
                ("order", "id.desc".to_string()),
                ("limit", count.to_string()),
            ])
            .send()
            .await
            .map_err(|err| DeckError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeckError::Transport(format!("HTTP {}", status.as_u16())));
        }
        let body = response
            .text()
            .await
            .map_err(|err| DeckError::Transport(err.to_string()))?;
        let mut deck = decode_deck(&body)?;

        self.shuffler.shuffle(&mut deck);
        deck.truncate(count);
        debug!(items = deck.len(), "deck fetched");
        Ok(deck)
    }
}

fn decode_deck(body: &str) -> Result<Vec<Item>, DeckError> {
    serde_json::from_str(body).map_err(|err| DeckError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bucket, SwipeSummary};
    use chrono::TimeZone;

    fn client() -> RestClient {
        RestClient::new(&StoreConfig {
            url: "https://demo.supabase.co/".to_string(),
            api_key: "anon".to_string(),
        })
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn table_urls_drop_the_trailing_slash() {
        assert_eq!(
            client().table_url(SESSIONS),
            "https://demo.supabase.co/rest/v1/swipe_sessions"
        );
    }

    #[test]
    fn decision_rows_use_the_web_direction_names() {
        let id = SessionId::from_ulid(Ulid::nil());
        let decision = Decision::new(ItemId(3), Direction::Reject, at());

        let row = serde_json::to_value(DecisionRow::new(id, &decision, 4)).unwrap();

        assert_eq!(row["session_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(row["position"], 4);
        assert_eq!(row["pitch_id"], 3);
        assert_eq!(row["direction"], "left");
    }

    #[test]
    fn stored_decision_rows_read_back_as_decisions() {
        let raw = r#"[
            {"pitch_id": 3, "direction": "left", "timestamp": "2024-05-01T09:30:00Z"},
            {"pitch_id": 8, "direction": "right", "timestamp": "2024-05-01T09:30:00Z"}
        ]"#;

        let decisions: Vec<Decision> = serde_json::from_str(raw).unwrap();

        assert_eq!(
            decisions,
            vec![
                Decision::new(ItemId(3), Direction::Reject, at()),
                Decision::new(ItemId(8), Direction::Invest, at()),
            ]
        );
    }

    #[test]
    fn session_row_keeps_the_result() {
        let id = SessionId::from_ulid(Ulid::nil());
        let result = ClassificationResult::fixed(
            Bucket::Low,
            SwipeSummary {
                total_swipes: 10,
                invested_count: 1,
                rejected_count: 9,
                investment_rate: 10.0,
            },
        );
        let raw = serde_json::json!({
            "id": wire_id(id),
            "swipes": [],
            "created_at": at(),
            "completed_at": at(),
            "founder_archetype": result.archetype,
            "result": result,
        });

        let row: SessionRow = serde_json::from_value(raw).unwrap();
        let stored = row.into_stored(Vec::new());

        assert_eq!(stored.id, id);
        assert_eq!(stored.completed_at, Some(at()));
        assert_eq!(stored.result, Some(result));
    }

    #[test]
    fn open_session_row_has_no_result() {
        let raw = serde_json::json!({
            "id": Uuid::nil(),
            "created_at": at(),
            "completed_at": null,
        });

        let row: SessionRow = serde_json::from_value(raw).unwrap();

        assert!(row.result.is_none());
        assert!(row.completed_at.is_none());
    }

    #[test]
    fn pitch_rows_decode_into_items() {
        let deck = decode_deck(
            r#"[{"id": 12, "pitch": "Tinder for houseplants", "is_seed": false, "created_at": "2024-01-01"}]"#,
        )
        .unwrap();

        assert_eq!(deck, vec![Item::new(12, "Tinder for houseplants")]);
        assert!(matches!(decode_deck("{}"), Err(DeckError::Decode(_))));
    }

    #[test]
    fn event_rows_carry_name_and_payload() {
        let event = AnalyticsEvent::ResultShared {
            session_id: SessionId::from_ulid(Ulid::nil()),
            platform: "twitter".to_string(),
        };

        let row = serde_json::to_value(EventRow::new(&event)).unwrap();

        assert_eq!(row["event"], "result_shared");
        assert_eq!(row["payload"], serde_json::json!({"platform": "twitter"}));
    }

    #[test]
    fn session_ids_go_over_the_wire_as_uuids() {
        let ulid: Ulid = "01ARZ3NDEKTSV4RRFFQ69G5FAV".parse().unwrap();
        let id = SessionId::from_ulid(ulid);

        let row = serde_json::to_value(NewSessionRow {
            id: wire_id(id),
            swipes: Vec::new(),
            created_at: at(),
        })
        .unwrap();

        let text = row["id"].as_str().unwrap();
        let parsed = Uuid::parse_str(text).unwrap();
        assert_eq!(text.len(), 36);
        assert_eq!(Ulid::from(parsed), ulid);
        assert_eq!(row["swipes"], serde_json::json!([]));
        assert_eq!(eq(id), format!("eq.{text}"));
    }
}
