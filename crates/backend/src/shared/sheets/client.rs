use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::shared::config::SheetsConfig;

use super::{cell_map, CellWrite, SheetsError, SpreadsheetClient};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// JWT сервисного аккаунта для обмена на access token
#[derive(Debug, Serialize)]
struct ServiceAccountClaims {
    iss: String,
    scope: &'static str,
    aud: String,
    iat: usize,
    exp: usize,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreateSpreadsheetResponse {
    #[serde(rename = "spreadsheetId")]
    spreadsheet_id: String,
    #[serde(rename = "spreadsheetUrl")]
    spreadsheet_url: String,
}

/// Клиент Google Sheets API (сервисный аккаунт)
pub struct GoogleSheetsClient {
    config: SheetsConfig,
    http: reqwest::Client,
}

impl GoogleSheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { config, http })
    }

    /// Обменять подписанный JWT сервисного аккаунта на OAuth access token
    async fn access_token(&self) -> Result<String, SheetsError> {
        let key_pem = std::fs::read_to_string(&self.config.private_key_path).map_err(|e| {
            SheetsError::Auth(format!(
                "cannot read private key '{}': {}",
                self.config.private_key_path, e
            ))
        })?;
        let encoding_key = EncodingKey::from_rsa_pem(key_pem.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid private key: {}", e)))?;

        let now = Utc::now().timestamp() as usize;
        let claims = ServiceAccountClaims {
            iss: self.config.client_email.clone(),
            scope: SHEETS_SCOPE,
            aud: self.config.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| SheetsError::Auth(format!("cannot sign JWT: {}", e)))?;

        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl SpreadsheetClient for GoogleSheetsClient {
    async fn create_specification_sheet(
        &self,
        title: &str,
        master: &[CellWrite],
        detail_block: Vec<Vec<String>>,
    ) -> Result<String, SheetsError> {
        let token = self.access_token().await?;

        // Новый документ по имени; форматирование шаблона вне зоны
        // ответственности сервиса
        let response = self
            .http
            .post(SHEETS_API_BASE)
            .bearer_auth(&token)
            .json(&json!({ "properties": { "title": title } }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api(format!(
                "spreadsheet create returned {}: {}",
                status, body
            )));
        }
        let created: CreateSpreadsheetResponse = response.json().await?;

        // Одиночные ячейки мастер-полей + один блок состава, одним batch-запросом
        let mut data: Vec<serde_json::Value> = master
            .iter()
            .map(|w| {
                json!({
                    "range": format!("Sheet1!{}", w.cell),
                    "values": [[w.value]],
                })
            })
            .collect();
        data.push(json!({
            "range": format!("Sheet1!{}", cell_map::DETAIL_BLOCK_ORIGIN),
            "values": detail_block,
        }));

        let url = format!("{}/{}/values:batchUpdate", SHEETS_API_BASE, created.spreadsheet_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({
                "valueInputOption": "USER_ENTERED",
                "data": data,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api(format!(
                "values batchUpdate returned {}: {}",
                status, body
            )));
        }

        tracing::info!("Specification sheet created: {}", created.spreadsheet_url);
        Ok(created.spreadsheet_url)
    }
}
