//! Azure Cosmos DB NoSQL API over REST.
//!
//! Requests are authorized with the account master key: an HMAC-SHA256 over
//! verb, resource type, resource link and date, sent url-encoded in the
//! `authorization` header. Every container is partitioned on
//! `/partitionKey`; items and cache entries share one logical partition per
//! container so that `TOP`/`ORDER BY` queries are served by the gateway.

pub mod cache_repo;
pub mod history_repo;
pub mod vector_store;

use crate::domain::error::DomainError;
use crate::infrastructure::http;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2018-12-31";
pub const PARTITION_KEY: &str = "partitionKey";

pub struct CosmosNoSqlClient {
    client: Client,
    endpoint: String,
    key: Vec<u8>,
}

#[derive(Deserialize)]
struct QueryPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

impl CosmosNoSqlClient {
    pub fn new(endpoint: &str, master_key: &str) -> Result<Self, DomainError> {
        let key = BASE64
            .decode(master_key.trim())
            .map_err(|e| DomainError::Config(format!("COSMOS_NOSQL_KEY is not base64: {e}")))?;
        Ok(Self {
            client: http::client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key,
        })
    }

    pub async fn create_database_if_missing(&self, database: &str) -> Result<(), DomainError> {
        let resp = self
            .send(Method::POST, "dbs", "", "dbs", &[], Some(json!({ "id": database })))
            .await?;
        self.accept_conflict(resp, "database", database).await
    }

    pub async fn create_container_if_missing(&self, database: &str, definition: Value) -> Result<(), DomainError> {
        let name = definition["id"].as_str().unwrap_or_default().to_string();
        let link = format!("dbs/{database}");
        let resp = self
            .send(Method::POST, "colls", &link, &format!("{link}/colls"), &[], Some(definition))
            .await?;
        self.accept_conflict(resp, "container", &name).await
    }

    pub async fn upsert_document(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        document: Value,
    ) -> Result<(), DomainError> {
        let link = format!("dbs/{database}/colls/{container}");
        let pk = json!([partition_key]).to_string();
        let headers = [
            ("x-ms-documentdb-is-upsert", "True"),
            ("x-ms-documentdb-partitionkey", pk.as_str()),
        ];
        let resp = self
            .send(Method::POST, "docs", &link, &format!("{link}/docs"), &headers, Some(document))
            .await?;
        http::check_status(resp, "Cosmos NoSQL upsert", DomainError::Database).await?;
        Ok(())
    }

    pub async fn delete_document(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        id: &str,
    ) -> Result<(), DomainError> {
        let link = format!("dbs/{database}/colls/{container}/docs/{id}");
        let pk = json!([partition_key]).to_string();
        let headers = [("x-ms-documentdb-partitionkey", pk.as_str())];
        let resp = self.send(Method::DELETE, "docs", &link, &link, &headers, None).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        http::check_status(resp, "Cosmos NoSQL delete", DomainError::Database).await?;
        Ok(())
    }

    /// Run a parameterised SQL query inside one logical partition, following
    /// continuation tokens until the result set is exhausted.
    pub async fn query(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        query: Value,
    ) -> Result<Vec<Value>, DomainError> {
        let link = format!("dbs/{database}/colls/{container}");
        let path = format!("{link}/docs");
        let pk = json!([partition_key]).to_string();
        let mut continuation: Option<String> = None;
        let mut documents = Vec::new();

        loop {
            let mut headers = vec![
                ("x-ms-documentdb-isquery", "True"),
                ("x-ms-documentdb-partitionkey", pk.as_str()),
            ];
            if let Some(token) = continuation.as_deref() {
                headers.push(("x-ms-continuation", token));
            }
            let resp = self
                .send(Method::POST, "docs", &link, &path, &headers, Some(query.clone()))
                .await?;
            let resp = http::check_status(resp, "Cosmos NoSQL query", DomainError::Database).await?;
            let next = resp
                .headers()
                .get("x-ms-continuation")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let page: QueryPage = resp
                .json()
                .await
                .map_err(|e| DomainError::Parse(format!("query response: {e}")))?;
            documents.extend(page.documents);

            match next {
                Some(token) if !token.is_empty() => continuation = Some(token),
                _ => return Ok(documents),
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        resource_type: &str,
        resource_link: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<reqwest::Response, DomainError> {
        let date = rfc1123(Utc::now());
        let token = auth_token(&self.key, method.as_str(), resource_type, resource_link, &date)?;
        let mut request = self
            .client
            .request(method.clone(), format!("{}/{path}", self.endpoint))
            .header("authorization", token)
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(body) = body {
            let is_query = headers.iter().any(|(n, _)| *n == "x-ms-documentdb-isquery");
            let content_type = if is_query { "application/query+json" } else { "application/json" };
            request = request.header("content-type", content_type).body(body.to_string());
        }
        tracing::debug!(%method, path, "cosmos nosql request");
        request
            .send()
            .await
            .map_err(|e| http::send_error(e, "Cosmos NoSQL", DomainError::Database))
    }

    async fn accept_conflict(&self, resp: reqwest::Response, kind: &str, name: &str) -> Result<(), DomainError> {
        if resp.status() == StatusCode::CONFLICT {
            tracing::debug!(kind, name, "already exists");
            return Ok(());
        }
        http::check_status(resp, "Cosmos NoSQL create", DomainError::Database).await?;
        tracing::info!(kind, name, "created");
        Ok(())
    }
}

fn rfc1123(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Master-key authorization header value.
pub(crate) fn auth_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String, DomainError> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| DomainError::Config(format!("COSMOS_NOSQL_KEY: {e}")))?;
    mac.update(payload.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());
    let token = format!("type=master&ver=1.0&sig={signature}");
    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}

/// Vector fields are spliced into SQL text, so only plain identifiers are allowed.
pub(crate) fn validate_field(field: &str) -> Result<(), DomainError> {
    let ok = !field.is_empty()
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !field.starts_with(|c: char| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(DomainError::Config(format!("invalid vector field name: {field}")))
    }
}

/// Container definition with an optional vector embedding policy on `vector_path`.
pub(crate) fn container_definition(
    name: &str,
    vector: Option<(&str, &str, &str, usize)>,
) -> Value {
    let mut definition = json!({
        "id": name,
        "partitionKey": { "paths": [format!("/{PARTITION_KEY}")], "kind": "Hash", "version": 2 },
    });
    if let Some((field, index_type, distance, dimensions)) = vector {
        definition["indexingPolicy"] = json!({
            "indexingMode": "consistent",
            "automatic": true,
            "includedPaths": [{ "path": "/*" }],
            "excludedPaths": [{ "path": "/\"_etag\"/?" }, { "path": format!("/{field}/*") }],
            "vectorIndexes": [{ "path": format!("/{field}"), "type": index_type }],
        });
        definition["vectorEmbeddingPolicy"] = json!({
            "vectorEmbeddings": [{
                "path": format!("/{field}"),
                "dataType": "float32",
                "distanceFunction": distance,
                "dimensions": dimensions,
            }],
        });
    }
    definition
}

/// Nearest-neighbour query returning `{ document, similarityScore }` rows.
pub(crate) fn vector_query(field: &str, vector: &[f32], k: usize) -> Value {
    json!({
        "query": format!(
            "SELECT TOP @k c AS document, VectorDistance(c.{field}, @embedding) AS similarityScore \
             FROM c ORDER BY VectorDistance(c.{field}, @embedding)"
        ),
        "parameters": [
            { "name": "@k", "value": k },
            { "name": "@embedding", "value": vector },
        ],
    })
}

pub(crate) fn strip_system_fields(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|k, _| !k.starts_with('_') && k != PARTITION_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_token_is_url_encoded_master_token() {
        let key = BASE64.decode("dGVzdC1rZXk=").unwrap();
        let token = auth_token(&key, "POST", "docs", "dbs/rag/colls/items", "Fri, 16 Oct 2026 08:00:00 GMT").unwrap();
        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(!token.contains('+') && !token.contains('/'));
        let again = auth_token(&key, "post", "DOCS", "dbs/rag/colls/items", "fri, 16 oct 2026 08:00:00 gmt").unwrap();
        assert_eq!(token, again);
        let other = auth_token(&key, "GET", "docs", "dbs/rag/colls/items", "Fri, 16 Oct 2026 08:00:00 GMT").unwrap();
        assert_ne!(token, other);
    }

    #[test]
    fn rfc1123_format() {
        let dt = DateTime::parse_from_rfc3339("2026-10-16T08:05:09Z").unwrap().with_timezone(&Utc);
        assert_eq!(rfc1123(dt), "Fri, 16 Oct 2026 08:05:09 GMT");
    }

    #[test]
    fn rejects_non_identifier_fields() {
        assert!(validate_field("contentVector").is_ok());
        assert!(validate_field("content_vector2").is_ok());
        assert!(validate_field("a.b").is_err());
        assert!(validate_field("x) OR 1=1").is_err());
        assert!(validate_field("1abc").is_err());
        assert!(validate_field("").is_err());
    }

    #[test]
    fn vector_container_has_embedding_policy() {
        let def = container_definition("items", Some(("contentVector", "diskANN", "cosine", 1536)));
        assert_eq!(def["partitionKey"]["paths"][0], "/partitionKey");
        assert_eq!(def["indexingPolicy"]["vectorIndexes"][0]["type"], "diskANN");
        let embedding = &def["vectorEmbeddingPolicy"]["vectorEmbeddings"][0];
        assert_eq!(embedding["path"], "/contentVector");
        assert_eq!(embedding["dimensions"], 1536);

        let plain = container_definition("history", None);
        assert!(plain.get("vectorEmbeddingPolicy").is_none());
    }

    #[test]
    fn vector_query_orders_by_distance() {
        let q = vector_query("contentVector", &[0.5], 4);
        let text = q["query"].as_str().unwrap();
        assert!(text.starts_with("SELECT TOP @k c AS document"));
        assert!(text.ends_with("ORDER BY VectorDistance(c.contentVector, @embedding)"));
        assert_eq!(q["parameters"][0]["value"], 4);
    }
}
