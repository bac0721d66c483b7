//! Table API HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). One method per
//! endpoint; bodies and responses are the wire types from
//! `gridbase_protocol`.

use std::time::Duration;

use gridbase_config::Settings;
use gridbase_model::ColumnType;
use gridbase_protocol::{
    ColumnRecord, CreateColumnRequest, CreateRowRequest, RenameColumnRequest, RowRecord,
    TableSnapshot, UpsertCellsRequest, UpsertCellsResponse,
};

/// Table API client (blocking).
#[derive(Clone)]
pub struct TableClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

/// Error type for table API operations.
#[derive(Debug)]
pub enum ApiError {
    /// No auth token configured
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Server returned a validation error (4xx with message)
    Validation(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotAuthenticated => write!(f, "Not authenticated — no API token configured"),
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl TableClient {
    /// Create a client from loaded settings. Fails if no token is set.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let token = settings
            .token
            .clone()
            .ok_or(ApiError::NotAuthenticated)?;
        Ok(Self::new(&settings.api_base, &token))
    }

    /// Create a client with explicit credentials.
    pub fn new(api_base: &str, token: &str) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("gridbase/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Fetch the full table: rows, columns, and non-empty cells.
    pub fn fetch_table(&self, table_id: &str) -> Result<TableSnapshot, ApiError> {
        let url = format!("{}/api/tables/{}", self.api_base, table_id);
        let resp = self.get(&url)?;
        resp.json::<TableSnapshot>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Create a row; the server mints and returns the canonical record.
    pub fn create_row(&self, table_id: &str, order: i64) -> Result<RowRecord, ApiError> {
        let url = format!("{}/api/tables/{}/rows", self.api_base, table_id);
        let body = serde_json::to_value(CreateRowRequest { order })
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let resp = self.post_json(&url, &body)?;
        resp.json::<RowRecord>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub fn delete_row(&self, table_id: &str, row_id: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/tables/{}/rows/{}", self.api_base, table_id, row_id);
        self.delete(&url)?;
        Ok(())
    }

    /// Create a column; the server mints and returns the canonical record.
    pub fn create_column(
        &self,
        table_id: &str,
        label: &str,
        column_type: ColumnType,
        order: i64,
    ) -> Result<ColumnRecord, ApiError> {
        let url = format!("{}/api/tables/{}/columns", self.api_base, table_id);
        let body = serde_json::to_value(CreateColumnRequest {
            label: label.to_string(),
            column_type,
            order,
        })
        .map_err(|e| ApiError::Parse(e.to_string()))?;
        let resp = self.post_json(&url, &body)?;
        resp.json::<ColumnRecord>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub fn delete_column(&self, table_id: &str, column_id: &str) -> Result<(), ApiError> {
        let url = format!(
            "{}/api/tables/{}/columns/{}",
            self.api_base, table_id, column_id
        );
        self.delete(&url)?;
        Ok(())
    }

    /// Rename a column; returns the server's (possibly normalized) record.
    pub fn rename_column(
        &self,
        table_id: &str,
        column_id: &str,
        new_label: &str,
    ) -> Result<ColumnRecord, ApiError> {
        let url = format!(
            "{}/api/tables/{}/columns/{}",
            self.api_base, table_id, column_id
        );
        let body = serde_json::to_value(RenameColumnRequest {
            new_label: new_label.to_string(),
        })
        .map_err(|e| ApiError::Parse(e.to_string()))?;
        let resp = self.patch_json(&url, &body)?;
        resp.json::<ColumnRecord>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Flush a batch of cell writes in one request. Writes addressed to
    /// ids the server does not know are skipped server-side, so
    /// `updated_count` may be lower than the batch size.
    pub fn upsert_cells(
        &self,
        table_id: &str,
        request: &UpsertCellsRequest,
    ) -> Result<UpsertCellsResponse, ApiError> {
        let url = format!("{}/api/tables/{}/cells", self.api_base, table_id);
        let body = serde_json::to_value(request).map_err(|e| ApiError::Parse(e.to_string()))?;
        let resp = self.post_json(&url, &body)?;
        resp.json::<UpsertCellsResponse>()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response)
    }

    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response)
    }

    fn patch_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .http
            .patch(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response)
    }

    fn delete(&self, url: &str) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response)
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            if status == 422 || status == 400 {
                return Err(ApiError::Validation(body));
            }
            return Err(ApiError::Http(status, body));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbase_protocol::CellRecord;
    use httpmock::prelude::*;

    #[test]
    fn test_fetch_table_parses_snapshot() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/tables/tbl_1")
                .header("authorization", "Bearer tok");
            then.status(200).json_body(serde_json::json!({
                "rows": [{ "id": "r1", "order": 1 }],
                "columns": [
                    { "id": "c1", "name": "Name", "columnType": "text", "order": 1 }
                ],
                "cells": [{ "rowId": "r1", "columnId": "c1", "value": "Alice" }]
            }));
        });

        let client = TableClient::new(&server.base_url(), "tok");
        let snapshot = client.fetch_table("tbl_1").unwrap();

        mock.assert();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.columns[0].name, "Name");
        assert_eq!(snapshot.cells[0].value, "Alice");
    }

    #[test]
    fn test_create_row_sends_order_and_parses_record() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/tables/tbl_1/rows")
                .json_body(serde_json::json!({ "order": 3 }));
            then.status(200)
                .json_body(serde_json::json!({ "id": "r3", "order": 3 }));
        });

        let client = TableClient::new(&server.base_url(), "tok");
        let record = client.create_row("tbl_1", 3).unwrap();

        mock.assert();
        assert_eq!(record.id, "r3");
        assert_eq!(record.order, 3);
    }

    #[test]
    fn test_rename_column_uses_patch() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/api/tables/tbl_1/columns/c1")
                .json_body(serde_json::json!({ "newLabel": "Renamed" }));
            then.status(200).json_body(serde_json::json!({
                "id": "c1", "name": "Renamed", "columnType": "text", "order": 1
            }));
        });

        let client = TableClient::new(&server.base_url(), "tok");
        let record = client.rename_column("tbl_1", "c1", "Renamed").unwrap();

        mock.assert();
        assert_eq!(record.name, "Renamed");
    }

    #[test]
    fn test_upsert_cells_posts_batch() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/tables/tbl_1/cells")
                .json_body(serde_json::json!({
                    "writes": [
                        { "rowId": "r1", "columnId": "c1", "value": "Alice" }
                    ]
                }));
            then.status(200)
                .json_body(serde_json::json!({ "updatedCount": 1 }));
        });

        let client = TableClient::new(&server.base_url(), "tok");
        let response = client
            .upsert_cells(
                "tbl_1",
                &UpsertCellsRequest {
                    writes: vec![CellRecord {
                        row_id: "r1".into(),
                        column_id: "c1".into(),
                        value: "Alice".into(),
                    }],
                },
            )
            .unwrap();

        mock.assert();
        assert_eq!(response.updated_count, 1);
    }

    #[test]
    fn test_validation_errors_map_to_their_own_variant() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/tables/tbl_1/rows");
            then.status(422).body("order must be positive");
        });

        let client = TableClient::new(&server.base_url(), "tok");
        match client.create_row("tbl_1", -1) {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "order must be positive"),
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_server_errors_carry_status_code() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(DELETE).path("/api/tables/tbl_1/rows/r1");
            then.status(500).body("boom");
        });

        let client = TableClient::new(&server.base_url(), "tok");
        match client.delete_row("tbl_1", "r1") {
            Err(ApiError::Http(500, body)) => assert_eq!(body, "boom"),
            other => panic!("expected HTTP 500, got {:?}", other),
        }
    }
}
