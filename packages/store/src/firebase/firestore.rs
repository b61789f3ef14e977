//! Firestore implementation of [`DocumentStore`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::value::{decode_fields, encode, encode_fields};
use super::{decode, network_error, FirebaseBackend, Service, FIRESTORE_URL};
use crate::error::Result;
use crate::models::{Document, Fields, Query};
use crate::service::{DocumentStore, SnapshotCallback};
use crate::subscription::Subscription;

#[derive(Deserialize)]
struct RawDocument {
    /// Full resource name; the document id is its last segment.
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RawDocument {
    fn into_document(self) -> Document {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        Document {
            id,
            fields: decode_fields(&self.fields),
        }
    }
}

/// One element of a `runQuery` response stream. Entries without a document
/// only carry progress information.
#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

impl FirebaseBackend {
    fn documents_url(&self) -> String {
        format!(
            "{FIRESTORE_URL}/projects/{}/databases/(default)/documents",
            self.inner.config.project_id
        )
    }

    fn structured_query(query: &Query) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": query.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": query.field },
                        "op": "EQUAL",
                        "value": encode(&query.value),
                    }
                }
            }
        })
    }
}

#[async_trait]
impl DocumentStore for FirebaseBackend {
    async fn query(&self, query: &Query) -> Result<Vec<Document>> {
        let token = self.id_token().await?;
        let response = self
            .inner
            .http
            .post(format!("{}:runQuery", self.documents_url()))
            .bearer_auth(token)
            .json(&Self::structured_query(query))
            .send()
            .await
            .map_err(network_error)?;
        let items: Vec<RunQueryItem> = decode(response, Service::Firestore).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RawDocument::into_document)
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let token = self.id_token().await?;
        let response = self
            .inner
            .http
            .get(format!("{}/{collection}/{id}", self.documents_url()))
            .bearer_auth(token)
            .send()
            .await
            .map_err(network_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = decode(response, Service::Firestore).await?;
        Ok(Some(raw.into_document()))
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String> {
        let token = self.id_token().await?;
        let response = self
            .inner
            .http
            .post(format!("{}/{collection}", self.documents_url()))
            .bearer_auth(token)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await
            .map_err(network_error)?;
        let raw: RawDocument = decode(response, Service::Firestore).await?;
        let document = raw.into_document();
        tracing::debug!(collection, id = %document.id, "Document created");
        Ok(document.id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let token = self.id_token().await?;
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let response = self
            .inner
            .http
            .patch(format!("{}/{collection}/{id}", self.documents_url()))
            .query(&params)
            .bearer_auth(token)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await
            .map_err(network_error)?;
        let _: Value = decode(response, Service::Firestore).await?;
        tracing::debug!(collection, id, "Document updated");
        Ok(())
    }

    fn subscribe(&self, query: Query, callback: SnapshotCallback) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!("Cannot subscribe to documents outside a tokio runtime");
            return Subscription::noop();
        };
        let backend = self.clone();
        let interval = self.inner.poll_interval;

        let task = runtime.spawn(async move {
            let mut last: Option<Result<Vec<Document>>> = None;
            loop {
                let result = backend.query(&query).await;
                if last.as_ref() != Some(&result) {
                    callback(result.clone());
                    last = Some(result);
                }
                match interval {
                    Some(period) => tokio::time::sleep(period).await,
                    None => break,
                }
            }
        });
        Subscription::new(move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fields, PROFILES_COLLECTION};

    #[test]
    fn test_structured_query_shape() {
        let query = Query::eq(PROFILES_COLLECTION, fields::UID, "u1");
        let body = FirebaseBackend::structured_query(&query);
        assert_eq!(
            body["structuredQuery"]["from"][0]["collectionId"],
            json!("usuarios")
        );
        assert_eq!(
            body["structuredQuery"]["where"]["fieldFilter"]["value"],
            json!({ "stringValue": "u1" })
        );
    }

    #[test]
    fn test_run_query_skips_progress_entries() {
        let items: Vec<RunQueryItem> = serde_json::from_str(
            r#"[
                { "readTime": "2024-01-01T00:00:00Z" },
                { "document": {
                    "name": "projects/p/databases/(default)/documents/usuarios/abc123",
                    "fields": { "nombre": { "stringValue": "Ana" } }
                  },
                  "readTime": "2024-01-01T00:00:00Z" }
            ]"#,
        )
        .unwrap();

        let docs: Vec<Document> = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RawDocument::into_document)
            .collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "abc123");
        assert_eq!(docs[0].fields.get("nombre"), Some(&json!("Ana")));
    }
}
