//! # Vending Platform Client
//!
//! The only code that talks to the vending platform.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Platform Calls                                  │
//! │                                                                         │
//! │  fetch_types(shop)                                                     │
//! │    POST {base}/machineModel/nearByList       shopId                    │
//! │                                                                         │
//! │  fetch_machines(shop, type, pageSize, page)                            │
//! │    POST {base}/machineModel/near/machines    shopId, machineTypeId,    │
//! │                                              pageSize, page            │
//! │  fetch_detail(machine)                                                 │
//! │    POST {base}/goods/normal/details          goodsId                   │
//! │                                                                         │
//! │  Every body is application/x-www-form-urlencoded. Every reply is       │
//! │  { "code": 0, "msg": "", "data": {...}, "t": 1700000000000 }           │
//! │  and a non-zero code is an application error carrying `msg`.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sync engine depends on the [`VendingApi`] trait, not on
//! [`QiekjClient`], so tests can script the platform.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::ApiSettings;
use crate::error::{SyncError, SyncResult};
use washwise_core::{MachineDetail, MachineListItem, MachineType};

const TYPES_PATH: &str = "machineModel/nearByList";
const MACHINES_PATH: &str = "machineModel/near/machines";
const DETAIL_PATH: &str = "goods/normal/details";

/// The platform only answers clients that look like its mini-program shell.
const USER_AGENT: &str = "BUPTGateWay Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

// =============================================================================
// Trait
// =============================================================================

/// Read access to the vending platform.
#[async_trait]
pub trait VendingApi: Send + Sync {
    /// Machine types offered by a shop.
    async fn fetch_types(&self, shop_id: &str) -> SyncResult<Vec<MachineType>>;

    /// One page of a shop's machines of one type.
    async fn fetch_machines(
        &self,
        shop_id: &str,
        machine_type_id: &str,
        page_size: u32,
        page: u32,
    ) -> SyncResult<Vec<MachineListItem>>;

    /// Current state of one machine.
    async fn fetch_detail(&self, machine_id: i64) -> SyncResult<MachineDetail>;
}

// =============================================================================
// Wire Format
// =============================================================================

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> SyncResult<Option<T>> {
        if self.code != 0 {
            return Err(SyncError::Api {
                code: self.code,
                message: self.msg,
            });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeItem {
    machine_type_id: String,
    #[serde(default)]
    machine_type_name: String,
}

#[derive(Debug, Deserialize)]
struct MachineItem {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    shop_id: String,
    #[serde(default)]
    device_error_code: i32,
    #[serde(default)]
    device_error_msg: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TypesForm<'a> {
    shop_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MachinesForm<'a> {
    shop_id: &'a str,
    machine_type_id: &'a str,
    page_size: u32,
    page: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailForm {
    goods_id: i64,
}

// =============================================================================
// reqwest Implementation
// =============================================================================

/// HTTP client for the qiekj vending platform.
#[derive(Debug, Clone)]
pub struct QiekjClient {
    http: reqwest::Client,
    base_url: Url,
}

impl QiekjClient {
    /// Builds a client from the `[api]` settings.
    pub fn new(settings: &ApiSettings) -> SyncResult<Self> {
        let mut base_url = Url::parse(&settings.base_url)?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(USER_AGENT)
            .default_headers(default_headers())
            .build()?;

        Ok(QiekjClient { http, base_url })
    }

    async fn post<T, F>(&self, path: &str, form: &F) -> SyncResult<Option<T>>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;
        debug!(url = %url, "Calling vending platform");

        let response = self.http.post(url).form(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }

        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data()
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
    for (name, value) in [
        ("channel", "wechat"),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "cross-site"),
        ("uid", "undefined"),
        ("xweb_xhr", "1"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

#[async_trait]
impl VendingApi for QiekjClient {
    async fn fetch_types(&self, shop_id: &str) -> SyncResult<Vec<MachineType>> {
        let data: Option<Items<TypeItem>> =
            self.post(TYPES_PATH, &TypesForm { shop_id }).await?;

        Ok(data
            .map(|d| d.items)
            .unwrap_or_default()
            .into_iter()
            .map(|t| MachineType::new(t.machine_type_id, t.machine_type_name))
            .collect())
    }

    async fn fetch_machines(
        &self,
        shop_id: &str,
        machine_type_id: &str,
        page_size: u32,
        page: u32,
    ) -> SyncResult<Vec<MachineListItem>> {
        let form = MachinesForm {
            shop_id,
            machine_type_id,
            page_size,
            page,
        };
        let data: Option<Items<MachineItem>> = self.post(MACHINES_PATH, &form).await?;

        Ok(data
            .map(|d| d.items)
            .unwrap_or_default()
            .into_iter()
            .map(|m| MachineListItem {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    async fn fetch_detail(&self, machine_id: i64) -> SyncResult<MachineDetail> {
        let data: Option<DetailData> = self
            .post(DETAIL_PATH, &DetailForm { goods_id: machine_id })
            .await?;

        let data = data.ok_or_else(|| SyncError::MissingData(format!("machine {machine_id}")))?;

        Ok(MachineDetail {
            name: data.name,
            shop_id: data.shop_id,
            error_code: data.device_error_code,
            error_message: data.device_error_msg,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    // -------------------------------------------------------------------------
    // Envelope decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_envelope_error_code_surfaces_message() {
        let envelope: Envelope<Items<TypeItem>> =
            serde_json::from_str(r#"{"code":1001,"msg":"门店不存在","data":null,"t":1}"#).unwrap();
        match envelope.into_data() {
            Err(SyncError::Api { code, message }) => {
                assert_eq!(code, 1001);
                assert_eq!(message, "门店不存在");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<Items<TypeItem>> =
            serde_json::from_str(r#"{"code":0,"msg":"","t":1}"#).unwrap();
        assert!(envelope.into_data().unwrap().is_none());
    }

    #[test]
    fn test_detail_null_message() {
        let detail: DetailData = serde_json::from_str(
            r#"{"goodsId":42,"name":"Dryer 3","shopId":"S1","deviceErrorCode":2,"deviceErrorMsg":null,"remainTime":12}"#,
        )
        .unwrap();
        assert_eq!(detail.device_error_code, 2);
        assert!(detail.device_error_msg.is_none());
    }

    // -------------------------------------------------------------------------
    // Against a local stand-in for the platform
    // -------------------------------------------------------------------------

    fn reply(data: serde_json::Value) -> Response {
        Json(json!({ "code": 0, "msg": "", "data": data, "t": 1700000000000i64 })).into_response()
    }

    fn refuse(code: i64, msg: &str) -> Response {
        Json(json!({ "code": code, "msg": msg, "t": 1700000000000i64 })).into_response()
    }

    async fn types(headers: AxumHeaders, Form(form): Form<HashMap<String, String>>) -> Response {
        if headers.get("channel").map(|v| v.as_bytes()) != Some(b"wechat".as_slice()) {
            return refuse(401, "bad channel");
        }
        match form.get("shopId").map(String::as_str) {
            Some("S1") => reply(json!({
                "items": [
                    { "machineTypeId": "T1", "machineTypeName": "Dryer" },
                    { "machineTypeId": "T2", "machineTypeName": "Washer" }
                ]
            })),
            _ => refuse(1001, "门店不存在"),
        }
    }

    async fn machines(Form(form): Form<HashMap<String, String>>) -> Response {
        if form.get("pageSize").map(String::as_str) != Some("1000")
            || form.get("page").map(String::as_str) != Some("1")
        {
            return refuse(400, "bad paging");
        }
        reply(json!({
            "items": [
                { "id": "42", "type": 1, "name": "Dryer 3", "status": 0 },
                { "id": "43", "type": 1, "name": "Dryer 4", "status": 2 }
            ],
            "goodsPage": 1
        }))
    }

    async fn detail(Form(form): Form<HashMap<String, String>>) -> Response {
        match form.get("goodsId").map(String::as_str) {
            Some("42") => reply(json!({
                "goodsId": 42,
                "name": "Dryer 3",
                "deviceId": 9,
                "remainTime": 0,
                "machineId": "m-42",
                "shopId": "S1",
                "deviceErrorCode": 2,
                "deviceErrorMsg": "running",
                "announcementContent": null
            })),
            Some("7") => reply(serde_json::Value::Null),
            Some("8") => (StatusCode::OK, "<html>maintenance</html>").into_response(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        }
    }

    async fn spawn_platform() -> String {
        let app = Router::new()
            .route("/machineModel/nearByList", post(types))
            .route("/machineModel/near/machines", post(machines))
            .route("/goods/normal/details", post(detail));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn client() -> QiekjClient {
        let settings = ApiSettings {
            base_url: spawn_platform().await,
            ..Default::default()
        };
        QiekjClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_types() {
        let client = client().await;
        let types = client.fetch_types("S1").await.unwrap();
        assert_eq!(
            types,
            vec![MachineType::new("T1", "Dryer"), MachineType::new("T2", "Washer")]
        );
    }

    #[tokio::test]
    async fn test_fetch_types_application_error() {
        let client = client().await;
        let err = client.fetch_types("S9").await.unwrap_err();
        assert!(matches!(err, SyncError::Api { code: 1001, .. }));
        assert!(err.is_remote_error());
    }

    #[tokio::test]
    async fn test_fetch_machines_sends_paging() {
        let client = client().await;
        let items = client.fetch_machines("S1", "T1", 1000, 1).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "42");
        assert_eq!(items[0].name, "Dryer 3");

        let err = client.fetch_machines("S1", "T1", 10, 1).await.unwrap_err();
        assert!(matches!(err, SyncError::Api { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_fetch_detail() {
        let client = client().await;
        let detail = client.fetch_detail(42).await.unwrap();
        assert_eq!(detail.name, "Dryer 3");
        assert_eq!(detail.shop_id, "S1");
        assert_eq!(detail.error_code, 2);
        assert_eq!(detail.error_message.as_deref(), Some("running"));
    }

    #[tokio::test]
    async fn test_fetch_detail_missing_data_and_http_error() {
        let client = client().await;
        assert!(matches!(
            client.fetch_detail(7).await.unwrap_err(),
            SyncError::MissingData(_)
        ));
        let err = client.fetch_detail(500).await.unwrap_err();
        assert!(matches!(err, SyncError::HttpStatus(500)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_non_json_body_is_deserialization_error() {
        let client = client().await;
        let err = client.fetch_detail(8).await.unwrap_err();
        assert!(matches!(err, SyncError::DeserializationFailed(_)));
        assert!(err.is_remote_error());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_platform_is_connection_error() {
        let settings = ApiSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let client = QiekjClient::new(&settings).unwrap();
        let err = client.fetch_types("S1").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_base_url_with_path_keeps_prefix() {
        let settings = ApiSettings {
            base_url: "http://proxy.local/qiekj".to_string(),
            ..Default::default()
        };
        let client = QiekjClient::new(&settings).unwrap();
        assert_eq!(
            client.base_url.join(TYPES_PATH).unwrap().as_str(),
            "http://proxy.local/qiekj/machineModel/nearByList"
        );
    }
}
