use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DatabaseError;

pub type DbResult<T> = Result<T, DatabaseError>;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> DbResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> DbResult<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> DbResult<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(DatabaseError::from_status(status.as_u16(), error_text));
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GET a filtered table path and decode every row.
    pub async fn select<T>(&self, path: &str, auth_token: Option<&str>) -> DbResult<Vec<T>>
    where T: DeserializeOwned {
        let rows: Vec<Value> = self.request(Method::GET, path, auth_token, None).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(DatabaseError::from))
            .collect()
    }

    /// GET a filtered table path and decode the first row, if any.
    pub async fn select_one<T>(&self, path: &str, auth_token: Option<&str>) -> DbResult<Option<T>>
    where T: DeserializeOwned {
        let mut rows = self.select::<T>(path, auth_token).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    /// POST a row to `table` and return the stored representation.
    pub async fn insert<T>(&self, table: &str, row: Value, auth_token: Option<&str>) -> DbResult<T>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}", table);
        let mut result: Vec<Value> = self.request_with_headers(
            Method::POST,
            &path,
            auth_token,
            Some(row),
            Some(Self::return_representation()),
        ).await?;

        if result.is_empty() {
            return Err(DatabaseError::EmptyResponse(table.to_string()));
        }

        Ok(serde_json::from_value(result.swap_remove(0))?)
    }

    /// PATCH every row matched by `path` and return the updated rows.
    pub async fn update<T>(&self, path: &str, changes: Value, auth_token: Option<&str>) -> DbResult<Vec<T>>
    where T: DeserializeOwned {
        let rows: Vec<Value> = self.request_with_headers(
            Method::PATCH,
            path,
            auth_token,
            Some(changes),
            Some(Self::return_representation()),
        ).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(DatabaseError::from))
            .collect()
    }

    /// DELETE every row matched by `path` and return the removed rows.
    pub async fn delete<T>(&self, path: &str, auth_token: Option<&str>) -> DbResult<Vec<T>>
    where T: DeserializeOwned {
        let rows: Vec<Value> = self.request_with_headers(
            Method::DELETE,
            path,
            auth_token,
            None,
            Some(Self::return_representation()),
        ).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(DatabaseError::from))
            .collect()
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
