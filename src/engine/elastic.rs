//! Elasticsearch engine over the REST API (blocking `reqwest` client)

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::mapping::Mapping;
use super::{
    BulkItem, BulkOperation, BulkResponse, EngineClient, EngineError, EngineInfo, EngineResult,
    Hit, IndexInfo, SearchHits,
};
use crate::model::{Fields, SearchTarget};
use crate::query::QueryNode;

/// Client for one Elasticsearch node
pub struct ElasticEngine {
    client: Client,
    base_url: Url,
    /// Ask the engine to make writes searchable before answering
    refresh: bool,
}

impl ElasticEngine {
    pub fn new(base_url: &str, refresh: bool) -> EngineResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| EngineError::Transport(format!("invalid engine url [{base_url}]: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::Transport(format!(
                "invalid engine url [{base_url}]: not a base url"
            )));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            refresh,
        })
    }

    /// Base url extended by `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> EngineResult<Url> {
        let mut url = self.base_url.clone();
        if segments.is_empty() {
            return Ok(url);
        }
        url.path_segments_mut()
            .map_err(|_| EngineError::Transport(format!("[{}] cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> EngineResult<RequestBuilder> {
        let url = self.url(segments)?;
        debug!(%method, %url, "Engine request");
        Ok(self.client.request(method, url))
    }

    /// Like `request`, for document writes that should be visible on return.
    fn write(&self, method: Method, segments: &[&str]) -> EngineResult<RequestBuilder> {
        let builder = self.request(method, segments)?;
        Ok(if self.refresh {
            builder.query(&[("refresh", "wait_for")])
        } else {
            builder
        })
    }

    fn send(&self, builder: RequestBuilder) -> EngineResult<Response> {
        builder
            .send()
            .map_err(|e| EngineError::Transport(e.to_string()))
    }

    /// Parse a successful JSON body or classify an error response.
    fn json(&self, response: Response) -> EngineResult<Value> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        let value: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body)
                .map_err(|e| EngineError::Transport(format!("malformed engine response: {e}")))?
        };
        if status.is_success() {
            Ok(value)
        } else {
            Err(classify_error(status, &value))
        }
    }
}

/// Map an Elasticsearch error body onto an `EngineError`
fn classify_error(status: StatusCode, body: &Value) -> EngineError {
    let error = &body["error"];
    let kind = error["type"].as_str().unwrap_or_default();
    let reason = error["reason"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("engine returned {status}"));
    let index = error["index"].as_str().unwrap_or_default().to_string();

    match kind {
        "index_not_found_exception" => EngineError::IndexNotFound(index),
        "resource_already_exists_exception" => EngineError::IndexAlreadyExists(index),
        "document_missing_exception" => EngineError::DocumentNotFound {
            index,
            id: error["id"].as_str().unwrap_or_default().to_string(),
        },
        _ if status.is_server_error() => EngineError::Transport(reason),
        _ => EngineError::Rejected(reason),
    }
}

#[derive(Debug, Deserialize)]
struct MappingEnvelope {
    #[serde(default)]
    mappings: Mapping,
}

#[derive(Debug, Deserialize)]
struct CatIndex {
    index: Option<String>,
    #[serde(rename = "docs.count")]
    docs_count: Option<String>,
    #[serde(rename = "store.size")]
    store_size: Option<String>,
}

impl EngineClient for ElasticEngine {
    fn info(&self) -> EngineResult<EngineInfo> {
        let body = self.json(self.send(self.request(Method::GET, &[])?)?)?;
        Ok(EngineInfo {
            name: body["cluster_name"].as_str().unwrap_or("unknown").to_string(),
            version: body["version"]["number"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
        })
    }

    fn index_exists(&self, index: &str) -> EngineResult<bool> {
        let response = self.send(self.request(Method::HEAD, &[index])?)?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(EngineError::Transport(format!(
                "unexpected status {status} checking index [{index}]"
            ))),
        }
    }

    fn create_index(&self, index: &str, mapping: &Mapping) -> EngineResult<()> {
        let body = json!({ "mappings": mapping });
        self.json(self.send(self.request(Method::PUT, &[index])?.json(&body))?)?;
        Ok(())
    }

    fn get_mapping(&self, index: &str) -> EngineResult<Mapping> {
        let body = self.json(self.send(self.request(Method::GET, &[index, "_mapping"])?)?)?;
        // { "<index>": { "mappings": { "properties": ... } } }
        let entry = body
            .get(index)
            .cloned()
            .or_else(|| body.as_object().and_then(|o| o.values().next().cloned()))
            .ok_or_else(|| EngineError::IndexNotFound(index.to_string()))?;
        let envelope: MappingEnvelope = serde_json::from_value(entry)
            .map_err(|e| EngineError::Transport(format!("malformed mapping: {e}")))?;
        Ok(envelope.mappings)
    }

    fn put_mapping(&self, index: &str, mapping: &Mapping) -> EngineResult<()> {
        let request = self
            .request(Method::PUT, &[index, "_mapping"])?
            .json(mapping);
        self.json(self.send(request)?)?;
        Ok(())
    }

    fn bulk_write(&self, operations: &[BulkOperation]) -> EngineResult<BulkResponse> {
        let mut ndjson = String::new();
        for operation in operations {
            match operation {
                BulkOperation::Index { index, document } => {
                    ndjson.push_str(&json!({ "index": { "_index": index } }).to_string());
                    ndjson.push('\n');
                    ndjson.push_str(&serde_json::to_string(document)?);
                    ndjson.push('\n');
                }
            }
        }

        let request = self
            .write(Method::POST, &["_bulk"])?
            .header("Content-Type", "application/x-ndjson")
            .body(ndjson);
        let body = self.json(self.send(request)?)?;

        let items = body["items"]
            .as_array()
            .map(|items| items.iter().map(parse_bulk_item).collect())
            .unwrap_or_default();
        Ok(BulkResponse { items })
    }

    fn search(
        &self,
        target: &SearchTarget,
        query: &QueryNode,
        size: usize,
    ) -> EngineResult<SearchHits> {
        let body = json!({
            "query": query,
            "size": size,
            "_source": true,
            "track_total_hits": true,
        });
        let request = self
            .request(Method::POST, &[target.as_path(), "_search"])?
            .json(&body);
        let response = self.send(request)?;
        let body = self.json(response)?;

        let total = match &body["hits"]["total"] {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            other => other["value"].as_u64().unwrap_or(0),
        };
        let hits = body["hits"]["hits"]
            .as_array()
            .map(|hits| hits.iter().map(parse_hit).collect())
            .unwrap_or_default();

        Ok(SearchHits { total, hits })
    }

    fn update(&self, index: &str, id: &str, partial: &Fields) -> EngineResult<()> {
        let request = self
            .write(Method::POST, &[index, "_update", id])?
            .json(&json!({ "doc": partial }));
        match self.json(self.send(request)?) {
            Ok(_) => Ok(()),
            Err(EngineError::DocumentNotFound { .. }) => Err(EngineError::DocumentNotFound {
                index: index.to_string(),
                id: id.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    fn delete(&self, index: &str, id: &str) -> EngineResult<()> {
        let response = self.send(self.write(Method::DELETE, &[index, "_doc", id])?)?;
        if response.status() == StatusCode::NOT_FOUND {
            let body = self.json(response).err();
            return match body {
                Some(EngineError::IndexNotFound(name)) => Err(EngineError::IndexNotFound(name)),
                _ => Err(EngineError::DocumentNotFound {
                    index: index.to_string(),
                    id: id.to_string(),
                }),
            };
        }
        self.json(response)?;
        Ok(())
    }

    fn list_indices(&self) -> EngineResult<Vec<IndexInfo>> {
        let body = self.json(self.send(
            self.request(Method::GET, &["_cat", "indices"])?
                .query(&[("format", "json")]),
        )?)?;
        let rows: Vec<CatIndex> = serde_json::from_value(body)
            .map_err(|e| EngineError::Transport(format!("malformed index listing: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name = row.index?;
                Some(IndexInfo {
                    name,
                    docs_count: row
                        .docs_count
                        .and_then(|c| c.parse().ok())
                        .unwrap_or(0),
                    store_size: row.store_size.unwrap_or_else(|| "0b".to_string()),
                })
            })
            .collect())
    }
}

fn parse_bulk_item(item: &Value) -> BulkItem {
    // Each item is keyed by its action: { "index": { ... } }
    let result = item
        .as_object()
        .and_then(|o| o.values().next())
        .cloned()
        .unwrap_or(Value::Null);
    BulkItem {
        index: result["_index"].as_str().unwrap_or_default().to_string(),
        id: result["_id"].as_str().map(str::to_string),
        error: result
            .get("error")
            .filter(|e| !e.is_null())
            .map(|e| e["reason"].as_str().unwrap_or("unknown error").to_string()),
    }
}

fn parse_hit(hit: &Value) -> Hit {
    Hit {
        id: hit["_id"].as_str().unwrap_or_default().to_string(),
        index: hit["_index"].as_str().unwrap_or_default().to_string(),
        score: hit["_score"].as_f64().unwrap_or(0.0) as f32,
        source: hit["_source"].as_object().cloned().unwrap_or_default(),
    }
}
